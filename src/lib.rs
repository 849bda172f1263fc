//!
//! Library for exporting Docker Swarm inventory from a Portainer instance.
//!
//! ## Portainer Client
//! The first interaction is to login into the system
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), portainer_report::Error> {
//!     use portainer_report::{Category, ClientBuilder};
//!
//!     // Username and password authentication, the JWT is reused for every request
//!     let client = ClientBuilder::new()
//!         .login("https://portainer.example.com", "admin", "secret")
//!         .await?;
//!
//!     for endpoint in client.endpoints().await? {
//!         let services = client.fetch(Category::Services, endpoint.id).await?;
//!         println!("{}: {} services", endpoint.name, services.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Report
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), portainer_report::Error> {
//!     use portainer_report::{collect, ClientBuilder, CollectOptions};
//!
//!     let client = ClientBuilder::new()
//!         .login("portainer.example.com", "admin", "secret")
//!         .await?;
//!
//!     let report = collect(&client, &CollectOptions::default()).await;
//!     report.save("portainer_data_portainer.xlsx")?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
use serde::Deserialize;
use serde_json::json;

pub mod collect;
pub mod config;
pub mod extract;
pub mod report;
pub mod types;

pub use collect::{collect, run, CollectOptions, RequestError};
pub use config::Config;
pub use extract::{Cell, ResourceRecord};
pub use report::Report;

/// Number of endpoints requested per page
pub const ENDPOINT_PAGE_SIZE: usize = 100;

/// Default timeout for a single request
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

const MAX_ERROR_BODY: usize = 512;

/// Error returned by client functions
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required environment variable is missing or empty
    #[error("Missing environment variable '{0}'")]
    MissingEnv(String),

    /// Configuration value could not be used
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Login failed
    #[error("Login failed: {0}")]
    LoginFailure(String),

    /// A request against the Portainer API failed. `status` is set when the
    /// server answered.
    #[error("API request to {url} failed: {message}")]
    Api {
        /// Requested URL
        url: String,
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Failure description, includes the response body for non-2xx answers
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL: {0}")]
    URL(#[from] url::ParseError),

    /// HTTP client error
    #[error("Reqwest: {0}")]
    HTTPClient(#[from] reqwest::Error),

    /// IO Errors
    #[error("IO error {0}")]
    IO(#[from] std::io::Error),

    /// Spreadsheet could not be produced
    #[error("Spreadsheet error: {0}")]
    Report(rust_xlsxwriter::XlsxError),
}

impl Error {
    fn api(url: &url::Url, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            url: url.to_string(),
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by an API error
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::HTTPClient(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        match err {
            rust_xlsxwriter::XlsxError::IoError(e) => Self::IO(e),
            e => Self::Report(e),
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Resource categories read from an endpoint's Docker API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Swarm services
    Services,
    /// Swarm secrets
    Secrets,
    /// Swarm nodes
    Nodes,
    /// Containers, each one later annotated with its stats
    ContainerStats,
}

impl Category {
    /// All categories, in report order
    pub const ALL: [Self; 4] = [
        Self::Services,
        Self::Secrets,
        Self::Nodes,
        Self::ContainerStats,
    ];

    /// Name of the sheet holding this category
    #[must_use]
    pub const fn sheet_name(self) -> &'static str {
        match self {
            Self::Services => "Services",
            Self::Secrets => "Secrets",
            Self::Nodes => "Nodes",
            Self::ContainerStats => "Container Statistics",
        }
    }

    fn docker_path(self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Secrets => "secrets",
            Self::Nodes => "nodes",
            Self::ContainerStats => "containers/json",
        }
    }

    fn query(self) -> &'static [(&'static str, &'static str)] {
        match self {
            // Adds ServiceStatus with running/desired task counts
            Self::Services => &[("status", "true")],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sheet_name())
    }
}

#[derive(Deserialize)]
pub(crate) struct LoginToken {
    pub jwt: String,
}

impl std::fmt::Debug for LoginToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginToken").finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct ClientState {
    login_token: LoginToken,
}

/// Builder for a Portainer [`Client`]
#[derive(Clone)]
pub struct ClientBuilder {
    reqwest_ca: Vec<reqwest::Certificate>,
    disable_cert_verification: bool,
    timeout: std::time::Duration,
    endpoint_page_size: usize,
}

impl ClientBuilder {
    /// Create a new builder instance
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reqwest_ca: Vec::new(),
            disable_cert_verification: false,
            timeout: DEFAULT_TIMEOUT,
            endpoint_page_size: ENDPOINT_PAGE_SIZE,
        }
    }

    /// Add a root certificate for API certificate verification
    pub fn add_root_certificate(mut self, cert: &[u8]) -> Result<Self> {
        let ca = reqwest::Certificate::from_pem(cert)?;
        self.reqwest_ca.push(ca);
        Ok(self)
    }

    /// Disable certificate verification
    #[must_use]
    pub fn danger_accept_invalid_certs(self) -> Self {
        Self {
            disable_cert_verification: true,
            ..self
        }
    }

    /// Timeout applied to every request, login included
    #[must_use]
    pub fn timeout(self, timeout: std::time::Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Number of endpoints requested per page when listing endpoints
    #[must_use]
    pub fn endpoint_page_size(self, endpoint_page_size: usize) -> Self {
        Self {
            endpoint_page_size: endpoint_page_size.max(1),
            ..self
        }
    }

    /// Login to a Portainer instance. `host` may omit the scheme, `https` is assumed.
    pub async fn login(&self, host: &str, username: &str, password: &str) -> Result<Client> {
        let base_url = base_url(host)?;
        let url = base_url.join("api/auth")?;

        let data = json!({
            "Username": username,
            "Password": password,
        });
        Client::do_login(self, base_url, url, data).await
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a Portainer host into the base URL every API path is joined to.
/// A missing scheme defaults to `https`, and the path always ends with `/`.
pub fn base_url(host: &str) -> Result<url::Url> {
    let host = host.trim();
    let mut url = if host.starts_with("http://") || host.starts_with("https://") {
        url::Url::parse(host)?
    } else {
        url::Url::parse(&format!("https://{host}"))?
    };

    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::URL(url::ParseError::EmptyHost));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// The `Client` is used for all interaction with a Portainer instance.
/// Use [`ClientBuilder::login`] to create an instance.
#[derive(Clone)]
pub struct Client {
    base_url: url::Url,
    state: std::sync::Arc<ClientState>,
    client: reqwest::Client,
    endpoint_page_size: usize,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("state", &self.state)
            .field("client", &self.client)
            .field("endpoint_page_size", &self.endpoint_page_size)
            .finish()
    }
}

impl Client {
    /// Create a Client builder
    #[must_use]
    pub const fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    async fn do_login(
        builder: &ClientBuilder,
        base_url: url::Url,
        url: url::Url,
        payload: serde_json::Value,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(builder.timeout);

        // Add CA certificates
        let client = builder
            .reqwest_ca
            .iter()
            .fold(client, |client, ca| client.add_root_certificate(ca.clone()));

        let client = client.danger_accept_invalid_certs(builder.disable_cert_verification);

        let client = client.build()?;
        tracing::debug!("POST {}", url);
        let result = client.post(url).json(&payload).send().await?;

        if result.status().is_success() {
            let text = result.text().await?;
            let login_token = serde_json::from_str::<LoginToken>(&text)?;
            tracing::info!("Logged in to {}", base_url);
            Ok(Self {
                base_url,
                state: std::sync::Arc::new(ClientState { login_token }),
                client,
                endpoint_page_size: builder.endpoint_page_size,
            })
        } else {
            let status = result.status();
            let text = result.text().await?;
            tracing::debug!("login returned {}", text);
            Err(Error::LoginFailure(format!("{status}: {}", truncate(&text))))
        }
    }

    /// Base URL every API path is joined to
    #[must_use]
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    /// Returns the login bearer token
    #[must_use]
    pub fn bearer_token(&self) -> &str {
        &self.state.login_token.jwt
    }

    async fn get(
        &self,
        path: &str,
        query_params: &[(&str, &str)],
    ) -> Result<(url::Url, reqwest::Response)> {
        let mut url = self.base_url.join(path)?;
        if !query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(query_params);
        }
        tracing::debug!("GET {}", url);

        let result = self
            .client
            .get(url.clone())
            .bearer_auth(self.bearer_token())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, "request failed: {}", e);
                Error::api(&url, None, e.to_string())
            })?;

        let status = result.status();
        if status.is_success() {
            Ok((url, result))
        } else {
            let text = result.text().await.unwrap_or_default();
            tracing::warn!(url = %url, status = status.as_u16(), body = %truncate(&text), "request failed");
            Err(Error::api(
                &url,
                Some(status.as_u16()),
                format!("HTTP {status}: {}", truncate(&text)),
            ))
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        url: &url::Url,
        result: reqwest::Response,
    ) -> Result<T> {
        let status = result.status().as_u16();
        let bytes = result.bytes().await.map_err(|e| {
            tracing::warn!(url = %url, "reading response failed: {}", e);
            Error::api(url, Some(status), e.to_string())
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(url = %url, "malformed JSON: {}", e);
            Error::api(url, Some(status), format!("malformed JSON: {e}"))
        })
    }

    /// GET a json payload from the REST API.
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<T> {
        let (url, result) = self.get(path, query_params.unwrap_or_default()).await?;
        Self::decode(&url, result).await
    }

    /// List the raw objects of a category on an endpoint, in the order the API returned them.
    pub async fn fetch(
        &self,
        category: Category,
        endpoint_id: u64,
    ) -> Result<Vec<serde_json::Value>> {
        let path = format!("api/endpoints/{endpoint_id}/docker/{}", category.docker_path());
        let (url, result) = self.get(&path, category.query()).await?;
        let payload: serde_json::Value = Self::decode(&url, result).await?;
        match payload {
            serde_json::Value::Array(items) => Ok(items),
            // Docker answers `null` for an empty list on some versions
            serde_json::Value::Null => Ok(Vec::new()),
            other => {
                let payload = other.to_string();
                tracing::warn!(url = %url, "expected a JSON array, got {}", truncate(&payload));
                Err(Error::api(&url, Some(200), "expected a JSON array"))
            }
        }
    }

    /// One-shot stats for a container
    pub async fn container_stats(
        &self,
        endpoint_id: u64,
        container_id: &str,
    ) -> Result<serde_json::Value> {
        let path = format!("api/endpoints/{endpoint_id}/docker/containers/{container_id}/stats");
        self.get_json(&path, Some(&[("stream", "false")])).await
    }

    /// List endpoint groups
    pub async fn endpoint_groups(&self) -> Result<Vec<types::EndpointGroup>> {
        self.get_json("api/endpoint_groups", None).await
    }

    /// List all endpoints, following `X-Total-Count` pagination when the server provides it
    pub async fn endpoints(&self) -> Result<Vec<types::Endpoint>> {
        let mut endpoints: Vec<types::Endpoint> = Vec::new();
        let limit = self.endpoint_page_size.to_string();

        loop {
            let start = endpoints.len().to_string();
            let query = [("start", start.as_str()), ("limit", limit.as_str())];
            let (url, result) = self.get("api/endpoints", &query).await?;
            let total = total_count(result.headers());
            let page: Vec<types::Endpoint> = Self::decode(&url, result).await?;
            let received = page.len();
            endpoints.extend(page);

            match total {
                Some(total) if received > 0 && endpoints.len() < total => {
                    tracing::debug!("fetched {} of {} endpoints", endpoints.len(), total);
                }
                _ => break,
            }
        }
        Ok(endpoints)
    }
}

fn total_count(headers: &reqwest::header::HeaderMap) -> Option<usize> {
    headers
        .get("x-total-count")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
