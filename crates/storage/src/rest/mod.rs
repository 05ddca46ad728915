//! Gateway to the hosted backend's auto-generated REST API (PostgREST dialect).
//!
//! Tables mirror the backend schema: `courses`, `course_sections`,
//! `course_lessons`, `user_courses` and `lesson_progress`. Filters use the
//! `column=op.value` query syntax and writes ask for `return=representation`
//! so every write answers with the stored row.

use std::env;
use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::repository::{StorageError, Storage};

mod catalog;
mod progress;
mod rows;

pub use rows::{CourseRow, LessonRow, ProgressRow, SectionRow};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RestGatewayError {
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("backend returned no row")]
    EmptyRepresentation,
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<RestGatewayError> for StorageError {
    fn from(err: RestGatewayError) -> Self {
        match err {
            RestGatewayError::Status { status, .. } if status == StatusCode::CONFLICT => {
                StorageError::Conflict
            }
            RestGatewayError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                StorageError::NotFound
            }
            RestGatewayError::EmptyRepresentation => StorageError::NotFound,
            RestGatewayError::InvalidRow(msg) => StorageError::Serialization(msg),
            RestGatewayError::Http(e) if e.is_decode() => StorageError::Serialization(e.to_string()),
            other => StorageError::Connection(other.to_string()),
        }
    }
}

/// Connection settings for the hosted backend.
#[derive(Clone, Debug)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: String,
    /// Signed-in user's access token; the anon key is used when absent.
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl RestConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            access_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Reads `LEARN_BACKEND_URL`, `LEARN_BACKEND_KEY`, and optionally
    /// `LEARN_BACKEND_TOKEN` / `LEARN_BACKEND_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("LEARN_BACKEND_URL").ok()?;
        let api_key = env::var("LEARN_BACKEND_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        let access_token = env::var("LEARN_BACKEND_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let timeout = env::var("LEARN_BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(Duration::from_secs(10), Duration::from_secs);
        Some(Self {
            base_url,
            api_key,
            access_token,
            timeout,
        })
    }

    #[must_use]
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }
}

/// REST-backed implementation of the storage repositories.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    config: RestConfig,
}

impl RestGateway {
    /// # Errors
    ///
    /// Returns `RestGatewayError::Http` if the HTTP client cannot be built.
    pub fn new(config: RestConfig) -> Result<Self, RestGatewayError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let token = self
            .config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key);
        self.client
            .request(method, self.config.table_url(table))
            .header("apikey", &self.config.api_key)
            .bearer_auth(token)
    }

    fn write(&self, method: Method, table: &str, prefer: &'static str) -> RequestBuilder {
        self.request(method, table)
            .header("Prefer", HeaderValue::from_static(prefer))
    }

    async fn fetch<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T, RestGatewayError> {
        let response = rb.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, %body, "backend request failed");
            return Err(RestGatewayError::Status { status, body });
        }
        Ok(response.json().await?)
    }

    async fn fetch_one<T: DeserializeOwned>(rb: RequestBuilder) -> Result<T, RestGatewayError> {
        let rows: Vec<T> = Self::fetch(rb).await?;
        rows.into_iter()
            .next()
            .ok_or(RestGatewayError::EmptyRepresentation)
    }

    async fn execute(rb: RequestBuilder) -> Result<(), RestGatewayError> {
        let response = rb.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestGatewayError::Status { status, body });
        }
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by the hosted REST backend.
    ///
    /// # Errors
    ///
    /// Returns `RestGatewayError` if the HTTP client cannot be built.
    pub fn rest(config: RestConfig) -> Result<Self, RestGatewayError> {
        Ok(Self::from_backend(RestGateway::new(config)?))
    }
}

/// `column=eq.value`
pub(crate) fn eq(value: impl Display) -> String {
    format!("eq.{value}")
}

/// `column=in.(a,b,c)`
pub(crate) fn in_list<T: Display>(values: &[T]) -> String {
    let joined = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::model::LessonId;

    #[test]
    fn table_url_trims_trailing_slash() {
        let cfg = RestConfig::new("https://example.supabase.co/", "anon");
        assert_eq!(
            cfg.table_url("lesson_progress"),
            "https://example.supabase.co/rest/v1/lesson_progress"
        );
    }

    #[test]
    fn filters_use_postgrest_syntax() {
        let a: LessonId = "6f1c2a4e-3b7d-4c8e-9a0b-1d2e3f405162".parse().unwrap();
        let b: LessonId = "00000000-0000-4000-8000-000000000001".parse().unwrap();
        assert_eq!(eq(a), "eq.6f1c2a4e-3b7d-4c8e-9a0b-1d2e3f405162");
        assert_eq!(
            in_list(&[a, b]),
            "in.(6f1c2a4e-3b7d-4c8e-9a0b-1d2e3f405162,00000000-0000-4000-8000-000000000001)"
        );
    }

    #[test]
    fn status_errors_map_to_storage_errors() {
        let conflict = RestGatewayError::Status {
            status: StatusCode::CONFLICT,
            body: String::new(),
        };
        assert!(matches!(StorageError::from(conflict), StorageError::Conflict));

        let unavailable = RestGatewayError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "down".into(),
        };
        assert!(matches!(
            StorageError::from(unavailable),
            StorageError::Connection(_)
        ));

        assert!(matches!(
            StorageError::from(RestGatewayError::EmptyRepresentation),
            StorageError::NotFound
        ));
    }

    #[test]
    fn gateway_builds_with_default_timeout() {
        let gateway = RestGateway::new(RestConfig::new("http://localhost:54321", "anon")).unwrap();
        assert_eq!(gateway.config().timeout, Duration::from_secs(10));
    }
}
