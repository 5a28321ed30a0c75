use bytes::Bytes;
use http::{header, HeaderMap, Method};
use tracing::debug;

/// Raw request data handed to the binder.
///
/// Repeated query keys, header values, and cookies are kept in arrival order so that
/// list-valued parameters can collect every occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Query string pairs, percent-decoded, in order
    pub query: Vec<(String, String)>,
    /// HTTP headers (multi-valued)
    pub headers: HeaderMap,
    /// Cookies from every `Cookie` header, percent-decoded, in order
    pub cookies: Vec<(String, String)>,
    /// Raw request body
    pub body: Bytes,
}

impl RawRequest {
    /// Start a request from a method and a request target such as `/items?skip=5`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query_params(query)),
            None => (target, Vec::new()),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query,
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Replace the headers; cookies are re-parsed from them.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.cookies = parse_cookies(&headers);
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Convert an `http::Request` into binder input.
    pub fn from_http<B: Into<Bytes>>(request: http::Request<B>) -> Self {
        let (parts, body) = request.into_parts();
        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
        let parsed = Self::new(parts.method, &target)
            .with_headers(parts.headers)
            .with_body(body);

        debug!(
            method = %parsed.method,
            path = %parsed.path,
            header_count = parsed.headers.len(),
            query_count = parsed.query.len(),
            cookie_count = parsed.cookies.len(),
            body_bytes = parsed.body.len(),
            "Request parsed"
        );
        parsed
    }

    /// Every value of a query key, in order.
    pub fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Last value of a query key.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First cookie with the given name.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Media type of the body, lowercased, parameters included.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase())
    }
}

/// Parse every `Cookie` header into ordered `(name, value)` pairs.
///
/// Values are percent-decoded; pairs without a name are skipped.
#[must_use]
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some((name.to_string(), decoded))
        })
        .collect()
}

/// Parse a raw query string (without the `?`) into ordered, percent-decoded pairs.
///
/// # Arguments
///
/// * `query` - The query string, e.g. `limit=10&tag=a&tag=b`
#[must_use]
pub fn parse_query_params(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
