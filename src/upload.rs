//! Upload form logic: link validation, required fields, and the
//! multipart submission sent to whichever endpoint the method routes to.

use crate::config::Config;
use crate::preview::{draft_preview_link, validate_share_link};
use crate::session::Session;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const UPLOADING_FILE_MESSAGE: &str = "⏳ Uploading file...";
pub const SAVING_LINK_MESSAGE: &str = "⏳ Saving link...";
pub const SUCCESS_MESSAGE: &str = "✅ Success!";
pub const UPLOADED_MESSAGE: &str = "✅ Note uploaded successfully!";

/// Reasons an upload is refused or fails
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("⚠️ Educator and Batch names are required.")]
    MissingNames,

    #[error("🚨 Please provide a valid Google Drive share link.")]
    InvalidLink,

    #[error("🚨 Please select a file to upload.")]
    MissingFile,

    #[error("🚨 Upload failed. Please try again.")]
    Failed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    #[default]
    Link,
    File,
}

impl UploadMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMethod::Link => "link",
            UploadMethod::File => "file",
        }
    }

    /// Progress message shown while the request is in flight
    pub fn progress_message(&self) -> &'static str {
        match self {
            UploadMethod::Link => SAVING_LINK_MESSAGE,
            UploadMethod::File => UPLOADING_FILE_MESSAGE,
        }
    }
}

impl fmt::Display for UploadMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(UploadMethod::Link),
            "file" => Ok(UploadMethod::File),
            other => Err(format!("Unknown upload method: {}", other)),
        }
    }
}

/// A local file picked for upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// State of the link field's ✅/❌ indicator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Unchecked,
    Valid,
    Invalid,
}

impl LinkStatus {
    pub fn of(url: &str) -> LinkStatus {
        if validate_share_link(url) {
            LinkStatus::Valid
        } else {
            LinkStatus::Invalid
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            LinkStatus::Valid => "✅",
            LinkStatus::Unchecked | LinkStatus::Invalid => "❌",
        }
    }
}

/// What the upload form currently holds
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadDraft {
    pub educator_name: String,
    pub batch_name: String,
    pub method: UploadMethod,
    pub file_url: String,
    pub file: Option<FileAttachment>,
}

impl UploadDraft {
    pub fn link_status(&self) -> LinkStatus {
        if self.file_url.is_empty() {
            LinkStatus::Unchecked
        } else {
            LinkStatus::of(&self.file_url)
        }
    }

    /// Inline preview of the link being entered; only for valid links
    pub fn inline_preview(&self) -> Option<String> {
        match self.link_status() {
            LinkStatus::Valid => draft_preview_link(&self.file_url),
            _ => None,
        }
    }

    /// Check the draft in the order the form reports problems: names
    /// first, then the method-specific payload.
    pub fn validate(self) -> Result<ValidatedUpload, UploadError> {
        if self.educator_name.is_empty() || self.batch_name.is_empty() {
            return Err(UploadError::MissingNames);
        }

        let payload = match self.method {
            UploadMethod::Link => {
                if self.file_url.is_empty() || !validate_share_link(&self.file_url) {
                    return Err(UploadError::InvalidLink);
                }
                UploadPayload::Link(self.file_url)
            }
            UploadMethod::File => match self.file {
                Some(file) => UploadPayload::File(file),
                None => return Err(UploadError::MissingFile),
            },
        };

        Ok(ValidatedUpload {
            educator_name: self.educator_name,
            batch_name: self.batch_name,
            payload,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadPayload {
    Link(String),
    File(FileAttachment),
}

impl UploadPayload {
    pub fn method(&self) -> UploadMethod {
        match self {
            UploadPayload::Link(_) => UploadMethod::Link,
            UploadPayload::File(_) => UploadMethod::File,
        }
    }
}

/// A draft that passed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub educator_name: String,
    pub batch_name: String,
    pub payload: UploadPayload,
}

impl ValidatedUpload {
    /// Stamp the upload with the uploader's id and the upload time.
    pub fn into_submission(self, session: &Session, uploaded_at: DateTime<Utc>) -> UploadSubmission {
        UploadSubmission {
            educator_name: self.educator_name,
            batch_name: self.batch_name,
            user_id: session.user_id.clone(),
            upload_time: uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            payload: self.payload,
        }
    }
}

/// Everything sent to the upload endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSubmission {
    pub educator_name: String,
    pub batch_name: String,
    pub user_id: String,
    pub upload_time: String,
    pub payload: UploadPayload,
}

impl UploadSubmission {
    /// Links go to the spreadsheet-backed script, files to the first-party
    /// upload route.
    pub fn endpoint(&self, config: &Config) -> String {
        match self.payload {
            UploadPayload::Link(_) => config.link_upload_endpoint.clone(),
            UploadPayload::File(_) => config.api_url("/api/educator/upload"),
        }
    }

    /// Text fields of the multipart form, in submission order
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("educatorName", self.educator_name.clone()),
            ("batchName", self.batch_name.clone()),
            ("userId", self.user_id.clone()),
            ("uploadTime", self.upload_time.clone()),
        ];
        if let UploadPayload::Link(url) = &self.payload {
            fields.push(("fileUrl", url.clone()));
        }
        fields
    }

    #[cfg(feature = "web")]
    pub fn into_multipart(self) -> crate::Result<reqwest::multipart::Form> {
        use reqwest::multipart::{Form, Part};

        let mut form = Form::new();
        for (name, value) in self.text_fields() {
            form = form.text(name, value);
        }

        if let UploadPayload::File(file) = self.payload {
            let mut part = Part::bytes(file.bytes).file_name(file.name);
            if let Some(content_type) = file.content_type {
                part = part.mime_str(&content_type)?;
            }
            form = form.part("file", part);
        }

        Ok(form)
    }
}

/// Phases of the upload form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Editing,
    Submitting { message: &'static str },
    Succeeded,
    Failed { message: String },
}

impl UploadPhase {
    pub fn submit(&mut self, method: UploadMethod) {
        *self = UploadPhase::Submitting {
            message: method.progress_message(),
        };
    }

    pub fn finish(&mut self, result: &Result<(), UploadError>) {
        *self = match result {
            Ok(()) => UploadPhase::Succeeded,
            Err(e) => UploadPhase::Failed {
                message: e.to_string(),
            },
        };
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            UploadPhase::Editing => None,
            UploadPhase::Submitting { message } => Some(message),
            UploadPhase::Succeeded => Some(SUCCESS_MESSAGE),
            UploadPhase::Failed { message } => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use chrono::TimeZone;

    fn draft() -> UploadDraft {
        UploadDraft {
            educator_name: "Raj".into(),
            batch_name: "Algebra".into(),
            method: UploadMethod::Link,
            file_url: "https://drive.google.com/file/d/abc/view".into(),
            file: None,
        }
    }

    #[test]
    fn names_are_checked_first() {
        let mut missing = draft();
        missing.batch_name.clear();
        missing.file_url.clear();
        assert_eq!(missing.validate(), Err(UploadError::MissingNames));
    }

    #[test]
    fn link_method_needs_a_share_link() {
        let mut bad = draft();
        bad.file_url = "https://example.com/x".into();
        assert_eq!(bad.clone().validate(), Err(UploadError::InvalidLink));
        bad.file_url.clear();
        assert_eq!(bad.validate(), Err(UploadError::InvalidLink));
    }

    #[test]
    fn file_method_needs_a_file() {
        let mut file = draft();
        file.method = UploadMethod::File;
        assert_eq!(file.clone().validate(), Err(UploadError::MissingFile));

        file.file = Some(FileAttachment {
            name: "notes.pdf".into(),
            content_type: Some("application/pdf".into()),
            bytes: vec![1, 2, 3],
        });
        let valid = file.validate().unwrap();
        assert_eq!(valid.payload.method(), UploadMethod::File);
    }

    #[test]
    fn submission_carries_session_and_timestamp() {
        let session = Session::new("E-7", None, Role::Educator);
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap();
        let submission = draft().validate().unwrap().into_submission(&session, at);

        assert_eq!(
            submission.text_fields(),
            vec![
                ("educatorName", "Raj".to_string()),
                ("batchName", "Algebra".to_string()),
                ("userId", "E-7".to_string()),
                ("uploadTime", "2024-06-01T10:30:00.000Z".to_string()),
                ("fileUrl", "https://drive.google.com/file/d/abc/view".to_string()),
            ]
        );
    }

    #[test]
    fn endpoint_depends_on_method() {
        let config = Config::default();
        let session = Session::new("E-7", None, Role::Educator);
        let at = Utc::now();

        let link = draft().validate().unwrap().into_submission(&session, at);
        assert_eq!(link.endpoint(&config), config.link_upload_endpoint);

        let mut file = draft();
        file.method = UploadMethod::File;
        file.file = Some(FileAttachment {
            name: "a.txt".into(),
            content_type: None,
            bytes: Vec::new(),
        });
        let file = file.validate().unwrap().into_submission(&session, at);
        assert_eq!(
            file.endpoint(&config),
            format!("{}/api/educator/upload", config.api_base_url)
        );
        assert!(file.text_fields().iter().all(|(name, _)| *name != "fileUrl"));
    }

    #[test]
    fn link_status_and_inline_preview() {
        let mut d = draft();
        assert_eq!(d.link_status(), LinkStatus::Valid);
        assert_eq!(
            d.inline_preview().as_deref(),
            Some("https://drive.google.com/file/d/abc/preview")
        );

        d.file_url = "https://drive.google.com/open?id=abc".into();
        assert_eq!(d.link_status(), LinkStatus::Invalid);
        assert_eq!(d.link_status().indicator(), "❌");
        assert_eq!(d.inline_preview(), None);

        d.file_url.clear();
        assert_eq!(d.link_status(), LinkStatus::Unchecked);
    }

    #[test]
    fn phase_transitions() {
        let mut phase = UploadPhase::default();
        phase.submit(UploadMethod::File);
        assert_eq!(phase.message(), Some(UPLOADING_FILE_MESSAGE));

        phase.finish(&Err(UploadError::Failed));
        assert_eq!(phase.message(), Some("🚨 Upload failed. Please try again."));

        phase.submit(UploadMethod::Link);
        assert_eq!(phase.message(), Some(SAVING_LINK_MESSAGE));
        phase.finish(&Ok(()));
        assert_eq!(phase, UploadPhase::Succeeded);
        assert_eq!(phase.message(), Some(SUCCESS_MESSAGE));
    }
}
