use flower_api::{HttpApi, serve};
use flower_model::{Host, Labels, MetricDesc, MetricUpdate, ResetPolicy};
use flower_prometheus::SeriesRegistry;
use tokio::net::TcpListener;

const WORKERS: MetricDesc = MetricDesc {
    name: "celery_workers",
    help: "Number of alive workers",
    labels: &[],
};

async fn start(registry: SeriesRegistry) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(serve(listener, HttpApi::new(registry).router()));
    base
}

#[tokio::test]
async fn metrics_exposes_published_series() {
    let registry = SeriesRegistry::new();
    registry.register(&WORKERS).unwrap();
    let host = Host::new("http://flower:5555").unwrap();
    registry
        .publish(
            &host,
            &WORKERS,
            &[
                MetricUpdate::set(WORKERS.name, Labels::new(), 0.0),
                MetricUpdate::increment(WORKERS.name, Labels::new()),
                MetricUpdate::increment(WORKERS.name, Labels::new()),
            ],
            ResetPolicy::ZeroStale,
        )
        .unwrap();

    let base = start(registry).await;
    let response = reqwest::get(format!("{base}/metrics")).await.unwrap();

    assert_eq!(response.status(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");

    let body = response.text().await.unwrap();
    assert!(body.contains("# HELP celery_workers Number of alive workers"));
    assert!(body.contains("celery_workers{flower=\"http://flower:5555\"} 2"));
}

#[tokio::test]
async fn empty_registry_scrapes_cleanly() {
    let base = start(SeriesRegistry::new()).await;
    let response = reqwest::get(format!("{base}/metrics")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn health_answers_ok() {
    let base = start(SeriesRegistry::new()).await;
    let response = reqwest::get(format!("{base}/health")).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let base = start(SeriesRegistry::new()).await;
    let response = reqwest::get(format!("{base}/api/tasks")).await.unwrap();

    assert_eq!(response.status(), 404);
}
