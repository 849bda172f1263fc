//!
//! Run configuration read from the environment
//!
//! * `PORTAINER_HOST` - Portainer URL, `https://` is assumed without a scheme
//! * `PORTAINER_USER` / `PORTAINER_PASSWORD` - credentials
//!
//! Optional:
//! * `PORTAINER_REPORT_PATH` - output file, defaults to `portainer_data_{slug}.xlsx`
//! * `PORTAINER_CA_CERT` - PEM file with the CA of the Portainer certificate
//! * `PORTAINER_INSECURE` - `true` disables certificate verification
//! * `PORTAINER_TIMEOUT_SECS` - per-request timeout
//! * `PORTAINER_SKIP_STATS` - `true` skips the container stats requests
//!
use crate::{CollectOptions, Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Portainer URL or host name
pub const HOST: &str = "PORTAINER_HOST";
/// Login user
pub const USER: &str = "PORTAINER_USER";
/// Login password
pub const PASSWORD: &str = "PORTAINER_PASSWORD";
/// Output file, overrides the host based default
pub const REPORT_PATH: &str = "PORTAINER_REPORT_PATH";
/// PEM file with an extra CA certificate
pub const CA_CERT: &str = "PORTAINER_CA_CERT";
/// Skip TLS certificate verification
pub const INSECURE: &str = "PORTAINER_INSECURE";
/// Per-request timeout in seconds
pub const TIMEOUT_SECS: &str = "PORTAINER_TIMEOUT_SECS";
/// Skip the per-container stats requests
pub const SKIP_STATS: &str = "PORTAINER_SKIP_STATS";

/// Everything a run needs, read once at startup
#[derive(Clone)]
pub struct Config {
    /// Portainer host or URL
    pub host: String,
    /// Login user
    pub username: String,
    /// Login password
    pub password: String,
    /// Where the workbook is written
    pub output_path: PathBuf,
    /// Extra CA certificate
    pub ca_cert: Option<PathBuf>,
    /// Skip certificate verification
    pub insecure: bool,
    /// Per-request timeout
    pub timeout: Duration,
    /// Read stats for every container
    pub container_stats: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("output_path", &self.output_path)
            .field("ca_cert", &self.ca_cert)
            .field("insecure", &self.insecure)
            .field("timeout", &self.timeout)
            .field("container_stats", &self.container_stats)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).ok_or_else(|| Error::MissingEnv(key.to_string()));

        let host = required(HOST)?;
        let username = required(USER)?;
        let password = required(PASSWORD)?;
        let slug = domain_slug(&host)?;

        let output_path = get(REPORT_PATH).map_or_else(
            || PathBuf::from(format!("portainer_data_{slug}.xlsx")),
            PathBuf::from,
        );

        let timeout = match get(TIMEOUT_SECS) {
            Some(secs) => match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::Config(format!(
                        "{TIMEOUT_SECS} must be a positive number of seconds, got '{secs}'"
                    )))
                }
            },
            None => crate::DEFAULT_TIMEOUT,
        };

        let insecure = get(INSECURE).map_or(Ok(false), |v| parse_flag(INSECURE, &v))?;
        let skip_stats = get(SKIP_STATS).map_or(Ok(false), |v| parse_flag(SKIP_STATS, &v))?;

        Ok(Self {
            host,
            username,
            password,
            output_path,
            ca_cert: get(CA_CERT).map(PathBuf::from),
            insecure,
            timeout,
            container_stats: !skip_stats,
        })
    }

    /// Client builder with the TLS and timeout settings applied
    pub async fn client_builder(&self) -> Result<crate::ClientBuilder> {
        let builder = crate::ClientBuilder::new().timeout(self.timeout);

        let builder = match &self.ca_cert {
            Some(path) => {
                tracing::info!("Using CA certificate {}", path.display());
                let pem = tokio::fs::read(path).await?;
                builder.add_root_certificate(&pem)?
            }
            None => builder,
        };

        Ok(if self.insecure {
            tracing::warn!("TLS certificate verification disabled");
            builder.danger_accept_invalid_certs()
        } else {
            builder
        })
    }

    /// Collection settings
    #[must_use]
    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            container_stats: self.container_stats,
        }
    }
}

/// First label of the host name: `portainer.example.com` -> `portainer`
pub fn domain_slug(host: &str) -> Result<String> {
    let url = crate::base_url(host)
        .map_err(|e| Error::Config(format!("invalid {HOST} '{host}': {e}")))?;
    let host = url.host_str().unwrap_or_default();
    Ok(host.split('.').next().unwrap_or(host).to_string())
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{key} must be true or false, got '{value}'"
        ))),
    }
}
