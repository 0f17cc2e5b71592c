//! Request target assembly: escaped path segments and ordered query parameters.

use std::borrow::Cow;

use crate::errors::Error;

pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Ordered, unescaped path segments. Each one is escaped on its own, so a segment
/// containing `/` never introduces an extra path level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSegments(Vec<String>);

impl PathSegments {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, segment: impl Into<String>) -> &mut Self {
        self.0.push(segment.into());
        self
    }

    pub fn with(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Rejects `.` and `..`. URL parsing collapses them, escaped or not, which
    /// would drop path levels.
    pub fn validate(&self) -> Result<(), Error> {
        match self.0.iter().find(|s| matches!(s.as_str(), "." | "..")) {
            Some(segment) => Err(Error::InvalidPath(segment.clone())),
            None => Ok(()),
        }
    }

    pub fn to_path(&self) -> String {
        self.0
            .iter()
            .map(|segment| escape(segment))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl<S: Into<String>> FromIterator<S> for PathSegments {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Ordered key/value parameters. Keys are emitted verbatim, values are escaped.
/// Empty values are kept as `key=`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn extend<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.push(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the value of the first parameter named `key` without moving it.
    /// Returns false when no such parameter exists.
    pub fn replace(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => {
                pair.1 = value.into();
                true
            }
            None => false,
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{}={}", key, escape(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// `{base}/{segments...}`, with any trailing slash on `base` dropped.
pub fn build_url(base: &str, segments: &PathSegments) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segments.to_path())
}

/// Appends an encoded query string, leaving the URL untouched when there is none.
pub fn with_query(url: String, params: &QueryParams) -> String {
    if params.is_empty() {
        url
    } else {
        format!("{}?{}", url, params.encode())
    }
}

fn escape(raw: &str) -> Cow<'_, str> {
    urlencoding::encode(raw)
}
