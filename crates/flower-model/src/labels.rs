/// Ordered label set identifying one series under a metric name.
///
/// Order matters: it must match the label names declared by the metric's [`crate::MetricDesc`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Labels(Vec<(&'static str, String)>);

impl Labels {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Create a label set containing a single pair.
    pub fn single<V>(key: &'static str, value: V) -> Self
    where
        V: Into<String>,
    {
        Self(vec![(key, value.into())])
    }

    /// Append a pair, builder style.
    pub fn with<V>(mut self, key: &'static str, value: V) -> Self
    where
        V: Into<String>,
    {
        self.push(key, value);
        self
    }

    /// Append a pair.
    pub fn push<V>(&mut self, key: &'static str, value: V)
    where
        V: Into<String>,
    {
        self.0.push((key, value.into()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the first pair with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl FromIterator<(&'static str, String)> for Labels {
    fn from_iter<I: IntoIterator<Item = (&'static str, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
