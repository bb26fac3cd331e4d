//! Remote data client: base url, bearer token, timeout and error classification.

use std::sync::Arc;

use beaute_states::State;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api_error::ApiError;
use crate::auth::TokenStore;
use crate::config::BusinessConfig;
use crate::http::{Client, Method, RequestBuilder, Response};

/// `{ data, message? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: usize,
    #[serde(alias = "current_page")]
    pub page: usize,
    #[serde(alias = "last_page")]
    pub page_count: usize,
    #[serde(default)]
    pub per_page: usize,
}

/// `{ data: [...], meta: {...} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Cheaply cloneable; registered as a state so commands receive it in their snapshot.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: BusinessConfig,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.api_url())
            .field("signed_in", &self.tokens.token().is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: BusinessConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            http: Client::new(),
            config,
            tokens,
        }
    }

    pub fn config(&self) -> &BusinessConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Request for `path` with json headers, timeout and the current bearer token.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.config.endpoint(path))
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .timeout(self.config.request_timeout());
        match self.tokens.token() {
            Some(token) => builder.bearer(&token),
            None => builder,
        }
    }

    /// Sends `builder` and classifies anything but 2xx.
    ///
    /// A 401 clears the token store; callers raise the login redirect.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let method = builder.method();
        let url = builder.url();
        debug!("{method:?} {url}");

        let response = builder.send().await?;
        if response.is_success() {
            return Ok(response);
        }

        let err = ApiError::from_response(&response);
        debug!("{method:?} {url} failed: {err}");
        if err.is_unauthorized() {
            info!("Received 401, clearing stored session token");
            self.tokens.clear();
        }
        Err(err)
    }

    pub async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.execute(builder).await?;
        response.json().map_err(|err| {
            ApiError::new(
                response.status,
                format!("Failed to parse server response: {err}"),
            )
        })
    }

    pub async fn get<T, K, V>(
        &self,
        path: &str,
        query: impl IntoIterator<Item = (K, V)>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        K: Into<String>,
        V: Into<String>,
    {
        let builder = self.request(Method::Get, path).query(query);
        self.fetch(builder).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::Post, path).json(body)?;
        self.fetch(builder).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::Put, path).json(body)?;
        self.fetch(builder).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::Patch, path).json(body)?;
        self.fetch(builder).await
    }

    /// Sends `body` and ignores the response body, for endpoints that may answer 204.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let builder = self.request(method, path).json(body)?;
        self.execute(builder).await.map(|_| ())
    }

    /// DELETE with an optional json body; the response body is ignored.
    pub async fn delete<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let mut builder = self.request(Method::Delete, path);
        if let Some(body) = body {
            builder = builder.json(body)?;
        }
        self.execute(builder).await.map(|_| ())
    }
}

impl State for ApiClient {
    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}
