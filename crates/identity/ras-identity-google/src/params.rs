//! Extra authorization-URL parameters.

/// Ordered list of `key=value` pairs appended to the authorization URL.
///
/// Pairs are only ever appended. A key set twice shows up twice in the URL,
/// in the order it was added; the authorization server decides which wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthParams {
    pairs: Vec<(String, String)>,
}

impl AuthParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every value recorded for `key`, oldest first.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
