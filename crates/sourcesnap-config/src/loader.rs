//! Environment parsing.
//!
//! # Design
//! - Variables are read through a lookup closure so tests never touch process state.
//! - Blank values count as unset.
//! - Each invalid variable reports its name, a static reason and the raw value.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sourcesnap_telemetry::LogFormat;
use tracing::debug;
use url::Url;

use crate::defaults::{
    DEFAULT_BIND_ADDR, DEFAULT_BLOB_TIMEOUT, DEFAULT_BUILD_SHA, DEFAULT_GITHUB_API_URL,
    DEFAULT_LIST_TIMEOUT, DEFAULT_MAX_IN_FLIGHT, DEFAULT_ORIGIN_MAX_RETRIES,
    DEFAULT_ORIGIN_RETRY_BASE, DEFAULT_STORE_ROOT, ENV_BIND_ADDR, ENV_BLOB_TIMEOUT_SECS,
    ENV_BUCKET, ENV_BUILD_SHA, ENV_GITHUB_API_URL, ENV_LIST_TIMEOUT_SECS, ENV_LOG_FORMAT,
    ENV_LOG_LEVEL, ENV_MAX_IN_FLIGHT, ENV_ORIGIN_MAX_RETRIES, ENV_ORIGIN_RETRY_BASE_MS,
    ENV_SNAPSHOT_DEADLINE_SECS, ENV_STORE_BACKEND, ENV_STORE_ENDPOINT, ENV_STORE_ROOT,
    ENV_STORE_TOKEN,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    EngineSettings, LogSettings, OriginConfig, ServerConfig, SnapshotConfig, StoreBackend,
    StoreConfig,
};

impl SnapshotConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for the first variable that fails to parse.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for the first variable that fails to parse.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let config = Self {
            store: load_store(&env)?,
            origin: load_origin(&env)?,
            engine: load_engine(&env)?,
            server: load_server(&env)?,
            logging: load_logging(&env)?,
        };
        debug!(
            store = config.store.as_ref().map(|store| store.backend.kind()),
            max_in_flight = config.engine.max_in_flight,
            bind_addr = %config.server.bind_addr,
            "configuration loaded"
        );
        Ok(config)
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parsed<T: FromStr>(
        &self,
        name: &'static str,
        reason: &'static str,
    ) -> ConfigResult<Option<T>> {
        self.get(name)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| ConfigError::invalid(name, reason, &raw))
            })
            .transpose()
    }

    fn url(&self, name: &'static str) -> ConfigResult<Option<Url>> {
        self.get(name)
            .map(|raw| parse_url(name, &raw))
            .transpose()
    }

    fn secs(&self, name: &'static str) -> ConfigResult<Option<Duration>> {
        match self.parsed::<u64>(name, "not_an_integer")? {
            Some(0) => Err(ConfigError::invalid(name, "must_be_positive", "0")),
            other => Ok(other.map(Duration::from_secs)),
        }
    }
}

fn parse_url(name: &'static str, raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw).map_err(|_| ConfigError::invalid(name, "invalid_url", raw))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::invalid(name, "cannot_be_a_base", raw));
    }
    Ok(url)
}

fn load_server<F>(env: &Env<F>) -> ConfigResult<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = env
        .get(ENV_BIND_ADDR)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let bind_addr = raw
        .parse::<SocketAddr>()
        .map_err(|_| ConfigError::invalid(ENV_BIND_ADDR, "invalid_socket_addr", &raw))?;
    Ok(ServerConfig { bind_addr })
}

fn load_store<F>(env: &Env<F>) -> ConfigResult<Option<StoreConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(container) = env.get(ENV_BUCKET) else {
        return Ok(None);
    };
    if container.contains('/') || container == "." || container == ".." {
        return Err(ConfigError::invalid(
            ENV_BUCKET,
            "invalid_container",
            &container,
        ));
    }
    let kind = env
        .get(ENV_STORE_BACKEND)
        .map_or_else(|| "filesystem".to_string(), |raw| raw.to_ascii_lowercase());
    let backend = match kind.as_str() {
        "filesystem" => StoreBackend::Filesystem {
            root: PathBuf::from(
                env.get(ENV_STORE_ROOT)
                    .unwrap_or_else(|| DEFAULT_STORE_ROOT.to_string()),
            ),
        },
        "http" => StoreBackend::Http {
            endpoint: env
                .url(ENV_STORE_ENDPOINT)?
                .ok_or_else(|| ConfigError::required(ENV_STORE_ENDPOINT))?,
            token: env.get(ENV_STORE_TOKEN),
        },
        _ => {
            return Err(ConfigError::invalid(
                ENV_STORE_BACKEND,
                "unknown_backend",
                &kind,
            ));
        }
    };
    Ok(Some(StoreConfig { container, backend }))
}

fn load_origin<F>(env: &Env<F>) -> ConfigResult<OriginConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let api_url = match env.url(ENV_GITHUB_API_URL)? {
        Some(url) => url,
        None => parse_url(ENV_GITHUB_API_URL, DEFAULT_GITHUB_API_URL)?,
    };
    Ok(OriginConfig {
        api_url,
        list_timeout: env
            .secs(ENV_LIST_TIMEOUT_SECS)?
            .unwrap_or(DEFAULT_LIST_TIMEOUT),
        blob_timeout: env
            .secs(ENV_BLOB_TIMEOUT_SECS)?
            .unwrap_or(DEFAULT_BLOB_TIMEOUT),
        max_retries: env
            .parsed(ENV_ORIGIN_MAX_RETRIES, "not_an_integer")?
            .unwrap_or(DEFAULT_ORIGIN_MAX_RETRIES),
        retry_base_delay: env
            .parsed::<u64>(ENV_ORIGIN_RETRY_BASE_MS, "not_an_integer")?
            .map_or(DEFAULT_ORIGIN_RETRY_BASE, Duration::from_millis),
    })
}

fn load_engine<F>(env: &Env<F>) -> ConfigResult<EngineSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let max_in_flight = match env.parsed::<usize>(ENV_MAX_IN_FLIGHT, "not_an_integer")? {
        Some(0) => {
            return Err(ConfigError::invalid(
                ENV_MAX_IN_FLIGHT,
                "must_be_positive",
                "0",
            ));
        }
        Some(value) => value,
        None => DEFAULT_MAX_IN_FLIGHT,
    };
    Ok(EngineSettings {
        max_in_flight,
        deadline: env.secs(ENV_SNAPSHOT_DEADLINE_SECS)?,
    })
}

fn load_logging<F>(env: &Env<F>) -> ConfigResult<LogSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let format = match env.get(ENV_LOG_FORMAT) {
        Some(raw) => LogFormat::parse(&raw)
            .ok_or_else(|| ConfigError::invalid(ENV_LOG_FORMAT, "unknown_format", &raw))?,
        None => LogFormat::infer(),
    };
    Ok(LogSettings {
        level: env
            .get(ENV_LOG_LEVEL)
            .unwrap_or_else(|| sourcesnap_telemetry::DEFAULT_LOG_LEVEL.to_string()),
        format,
        build_sha: env
            .get(ENV_BUILD_SHA)
            .unwrap_or_else(|| DEFAULT_BUILD_SHA.to_string()),
    })
}
