use crate::common::HttpMethod;
use axum::http::{HeaderMap, HeaderName, HeaderValue, request::Parts};

/// Query string parameters in their original order
///
/// Keys may repeat; [`get_first`](Self::get_first) returns the first value
/// for a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string (without the
    /// leading `?`). Undecodable input yields an empty set.
    pub fn parse(query: &str) -> Self {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => Self { pairs },
            Err(e) => {
                tracing::warn!("Ignoring malformed query string '{}': {}", query, e);
                Self::default()
            }
        }
    }

    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(key, _)| key == name)
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Everything a dispatch may read about the current request.
///
/// Built once per request and only ever borrowed immutably by triggers,
/// processors and handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: HttpMethod,
    path: String,
    query: QueryParams,
    headers: HeaderMap,
}

impl RequestContext {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Build a context from a request target such as `/search?q=rust`.
    ///
    /// # Example
    /// ```
    /// use paramflow::{HttpMethod, RequestContext};
    ///
    /// let ctx = RequestContext::from_target(HttpMethod::Get, "/?q=hoge&q=fuga");
    /// assert_eq!(ctx.path(), "/");
    /// assert_eq!(ctx.query().get_first("q"), Some("hoge"));
    /// ```
    pub fn from_target(method: HttpMethod, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, QueryParams::parse(query)),
            None => (target, QueryParams::new()),
        };
        Self::new(method, path).with_query(query)
    }

    /// Build a context from the head of an HTTP request, `None` if the method
    /// cannot be routed.
    pub fn from_parts(parts: &Parts) -> Option<Self> {
        let method = HttpMethod::from_http(&parts.method)?;
        let query = parts
            .uri
            .query()
            .map(QueryParams::parse)
            .unwrap_or_default();
        Some(Self {
            method,
            path: parts.uri.path().to_string(),
            query,
            headers: parts.headers.clone(),
        })
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of header `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
