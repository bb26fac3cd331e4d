//! Thin request builder over `reqwest` whose responses are plain data.
//!
//! Commands return `Send` futures and hand results across threads, so a response is
//! collected into [`Response`] (status, lowercased headers, body bytes) before it
//! leaves this module.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A response reduced to Send-safe data.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Failure before any HTTP status was received.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

pub type HttpResult<T> = Result<T, HttpError>;

/// Builds the `?a=1&b=2` suffix for `pairs`, skipping empty values.
pub fn query_string<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let encoded: Vec<String> = pairs
        .into_iter()
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key.as_ref()),
                urlencoding::encode(value.as_ref())
            )
        })
        .collect();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{}", encoded.join("&"))
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    fn new(client: reqwest::Client, method: Method, url: impl Into<String>) -> Self {
        Self {
            client,
            method,
            url: url.into(),
            headers: HashMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Header names are stored lowercased so later writes replace earlier ones.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {token}"))
    }

    /// Appends query pairs. Empty values are dropped when the url is built.
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json<T: serde::Serialize + ?Sized>(mut self, value: &T) -> HttpResult<Self> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self.header("content-type", "application/json"))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Final url including the encoded query string.
    pub fn url(&self) -> String {
        let query = query_string(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        format!("{}{query}", self.url)
    }

    pub async fn send(self) -> HttpResult<Response> {
        let url = self.url();
        let mut request = self.client.request(self.method.as_reqwest(), &url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = self.body {
            request = request.body(body);
        }

        let response = request.send().await?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), v.to_owned());
            }
        }
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Cheaply cloneable HTTP client sharing one connection pool.
#[derive(Debug, Clone, Default)]
pub struct Client {
    inner: reqwest::Client,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(self.inner.clone(), method, url)
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::Get, url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::Post, url)
    }

    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::Put, url)
    }

    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::Patch, url)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.request(Method::Delete, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &[u8]) -> Response {
        Response {
            status,
            headers: HashMap::from([("content-type".to_owned(), "application/json".to_owned())]),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_response_is_success() {
        assert!(response(204, b"").is_success());
        assert!(!response(422, b"").is_success());
    }

    #[test]
    fn test_response_header_case_insensitive() {
        let response = response(200, b"");
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_response_json() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Body {
            message: String,
        }

        let body: Body = response(200, br#"{"message": "ok"}"#).json().unwrap();
        assert_eq!(body.message, "ok");
    }

    #[test]
    fn query_string_skips_empty_and_encodes() {
        let query = query_string([("page", "1"), ("search", ""), ("name", "son môi & kem")]);
        assert_eq!(query, "?page=1&name=son%20m%C3%B4i%20%26%20kem");
        assert_eq!(query_string(Vec::<(&str, &str)>::new()), "");
    }

    #[test]
    fn builder_lowercases_headers_and_sets_bearer() {
        let builder = Client::new()
            .get("http://api.test/users")
            .header("Accept", "application/json")
            .bearer("abc");

        assert_eq!(
            builder.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(
            builder.headers.get("authorization").map(String::as_str),
            Some("Bearer abc")
        );
    }

    #[test]
    fn builder_json_sets_content_type() {
        let builder = Client::new()
            .patch("http://api.test/v2/roles/1/status")
            .json(&serde_json::json!({ "status": "active" }))
            .unwrap();

        assert_eq!(builder.method(), Method::Patch);
        assert_eq!(
            builder.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert!(builder.body.is_some());
    }

    #[test]
    fn url_appends_query_pairs() {
        let builder = Client::new()
            .get("http://api.test/users")
            .query([("page", "2"), ("limit", "20"), ("sort", "")]);
        assert_eq!(builder.url(), "http://api.test/users?page=2&limit=20");
    }
}
