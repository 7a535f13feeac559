use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Error, Result};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";
pub const DEFAULT_LINK_UPLOAD_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbzpGZGKymxkAq0k2vS3gmTraiQntx_aYQ5D91IEM0j-14vszGt9OXsdIGQYEOwPnU3K/exec";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "https://script.google.com/macros/s/AKfycbw2hIDLwLJ-Q8ZbLB8OFSZL8mlElUweGi6WQmlZmBCBqiDTOD501405YqKgPrGxErWuNQ/exec";
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Runtime settings for the web front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the server listens on
    pub bind_addr: String,

    /// Base URL of the notes backend (listing, delete and file upload routes)
    pub api_base_url: String,

    /// Spreadsheet-backed script that stores link uploads
    pub link_upload_endpoint: String,

    /// Script that resolves a user id into a role and name
    pub login_endpoint: String,

    pub session_ttl: Duration,
    pub request_timeout: Duration,

    /// Largest multipart body the upload route accepts
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
            link_upload_endpoint: DEFAULT_LINK_UPLOAD_ENDPOINT.to_string(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load from `NOTES_*` environment variables, defaulting anything unset.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url: String = try_load(&lookup, "NOTES_API_BASE", DEFAULT_API_BASE)?;

        Ok(Config {
            bind_addr: try_load(&lookup, "NOTES_BIND_ADDR", DEFAULT_BIND_ADDR)?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            link_upload_endpoint: try_load(
                &lookup,
                "NOTES_LINK_UPLOAD_ENDPOINT",
                DEFAULT_LINK_UPLOAD_ENDPOINT,
            )?,
            login_endpoint: try_load(&lookup, "NOTES_LOGIN_ENDPOINT", DEFAULT_LOGIN_ENDPOINT)?,
            session_ttl: Duration::from_secs(try_load(
                &lookup,
                "NOTES_SESSION_TTL_SECS",
                &DEFAULT_SESSION_TTL_SECS.to_string(),
            )?),
            request_timeout: Duration::from_secs(try_load(
                &lookup,
                "NOTES_HTTP_TIMEOUT_SECS",
                &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
            )?),
            max_upload_bytes: try_load(
                &lookup,
                "NOTES_MAX_UPLOAD_BYTES",
                &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
            )?,
        })
    }

    /// Absolute URL of a backend route
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        Error::Config {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup(&[
            ("NOTES_API_BASE", "https://notes.example.com/"),
            ("NOTES_SESSION_TTL_SECS", "60"),
            ("NOTES_BIND_ADDR", "0.0.0.0:8000"),
            ("NOTES_MAX_UPLOAD_BYTES", "1048576"),
        ]))
        .unwrap();
        assert_eq!(config.max_upload_bytes, 1024 * 1024);
        assert_eq!(config.api_base_url, "https://notes.example.com");
        assert_eq!(
            config.api_url("/api/educator/notes"),
            "https://notes.example.com/api/educator/notes"
        );
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("NOTES_HTTP_TIMEOUT_SECS", "soon")])).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key, "NOTES_HTTP_TIMEOUT_SECS"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
