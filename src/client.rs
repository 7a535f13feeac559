use std::sync::Arc;

use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::listing::{is_truthy, notes_from_payload};
use crate::login::LoginLookup;
use crate::note::NoteRecord;
use crate::upload::{UploadError, UploadSubmission};

/// HTTP client for the notes backend and the two script endpoints
#[derive(Clone)]
pub struct NotesClient {
    http: Client,
    config: Arc<Config>,
}

impl NotesClient {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(NotesClient { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Backend {
            status: status.as_u16(),
            body,
        })
    }

    /// Fetch the notes visible to `user_id`.
    ///
    /// The payload is normalised by [`notes_from_payload`], so an
    /// unexpected shape is an empty listing rather than an error.
    pub async fn fetch_notes(&self, user_id: &str) -> Result<Vec<NoteRecord>> {
        let url = format!(
            "{}?userId={}",
            self.config.api_url("/api/educator/notes"),
            urlencoding::encode(user_id)
        );

        let response = self.http.get(&url).send().await?;
        let response = Self::ensure_success(response).await?;
        let payload: Value = response.json().await?;
        let notes = notes_from_payload(payload);
        tracing::debug!("Fetched {} notes for {}", notes.len(), user_id);
        Ok(notes)
    }

    pub async fn delete_note(&self, id: &str) -> Result<()> {
        let url = self
            .config
            .api_url(&format!("/api/educator/delete/{}", urlencoding::encode(id)));

        let response = self.http.delete(&url).send().await?;
        Self::ensure_success(response).await?;
        tracing::info!("Deleted note {}", id);
        Ok(())
    }

    /// Post an upload to the endpoint its method routes to.
    ///
    /// Counts as stored when the status is 2xx or the script answers
    /// `{"success": true}`. A reply that is not JSON is a failure.
    pub async fn submit_upload(&self, submission: UploadSubmission) -> Result<()> {
        let endpoint = submission.endpoint(&self.config);
        let method = submission.payload.method();
        let form = submission.into_multipart()?;

        let response = self.http.post(&endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let result: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("Upload endpoint {} replied with non-JSON body: {}", endpoint, e);
            UploadError::Failed
        })?;

        let reported = result.get("success").is_some_and(is_truthy);
        if reported || status.is_success() {
            tracing::info!("Stored {} upload via {}", method, endpoint);
            Ok(())
        } else {
            Err(Error::Backend {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Resolve a user id through the login script
    pub async fn lookup_user(&self, user_id: &str) -> Result<LoginLookup> {
        let url = format!(
            "{}?userId={}",
            self.config.login_endpoint,
            urlencoding::encode(user_id)
        );

        let response = self.http.get(&url).send().await?;
        let lookup = response.json::<LoginLookup>().await?;
        Ok(lookup)
    }
}
