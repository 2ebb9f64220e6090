use thiserror::Error;

use flower_prometheus::RegistryError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("unknown collector: {0} (expected: task-types|tasks-by-name|task-duration|workers)")]
    UnknownCollector(String),

    #[error("nothing to supervise: {0}")]
    Empty(&'static str),
}
