use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a note as handed out by the notes backend.
///
/// Backends disagree on whether ids are numbers or strings, so both are
/// accepted and the value is otherwise treated as opaque.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum NoteId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteId::Number(n) => write!(f, "{}", n),
            NoteId::Text(s) => f.write_str(s),
        }
    }
}

/// A single uploaded note as returned by the listing endpoint.
///
/// Every field is optional: the listing must render whatever the backend
/// returns without rejecting partially filled rows.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<String>,
}

impl NoteRecord {
    /// Stable key used by the rendering surface. Falls back to the record's
    /// position in the snapshot when the backend sent no id.
    pub fn key(&self, position: usize) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => position.to_string(),
        }
    }

    pub fn file_type(&self) -> FileType {
        FileType::classify(self.file_url.as_deref())
    }

    pub fn parsed_upload_time(&self) -> Option<DateTime<Utc>> {
        self.upload_time.as_deref().and_then(parse_upload_time)
    }

    /// Upload time formatted for display, or `"Invalid Date"` when the
    /// timestamp is missing or unparseable.
    pub fn display_upload_time(&self) -> String {
        match self.parsed_upload_time() {
            Some(time) => time.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            None => INVALID_DATE.to_string(),
        }
    }
}

pub const INVALID_DATE: &str = "Invalid Date";

/// Parse an ISO-8601 upload timestamp.
///
/// Accepts full RFC 3339 timestamps, zone-less date-times (read as UTC)
/// and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_upload_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Closed classification of a note's link.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Doc,
    Sheet,
    Slide,
    Other,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Pdf,
        FileType::Doc,
        FileType::Sheet,
        FileType::Slide,
        FileType::Other,
    ];

    /// Classify a link by its share pattern.
    ///
    /// Patterns are checked in priority order. Path keywords are matched
    /// case-sensitively, the `.pdf` check is case-insensitive. Absent or
    /// empty links are `Other`.
    pub fn classify(url: Option<&str>) -> FileType {
        let url = match url {
            Some(url) if !url.is_empty() => url,
            _ => return FileType::Other,
        };

        if url.contains("drive.google.com/file") && url.to_lowercase().contains(".pdf") {
            FileType::Pdf
        } else if url.contains("docs.google.com/document") {
            FileType::Doc
        } else if url.contains("docs.google.com/spreadsheets") {
            FileType::Sheet
        } else if url.contains("docs.google.com/presentation") {
            FileType::Slide
        } else {
            FileType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Doc => "doc",
            FileType::Sheet => "sheet",
            FileType::Slide => "slide",
            FileType::Other => "other",
        }
    }

    /// Display glyph for the card title.
    pub fn icon(&self) -> &'static str {
        match self {
            FileType::Pdf => "📕",
            FileType::Doc => "📄",
            FileType::Sheet => "📊",
            FileType::Slide => "📽️",
            FileType::Other => "📎",
        }
    }

    /// True for shares Google serves as embeddable editors.
    pub fn is_google_editor(&self) -> bool {
        matches!(self, FileType::Doc | FileType::Sheet | FileType::Slide)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("Unknown file type: {}", s))
    }
}

/// Classify a link. Shorthand for [`FileType::classify`].
pub fn classify(url: Option<&str>) -> FileType {
    FileType::classify(url)
}

/// Glyph for a link, `📎` for anything unclassifiable.
pub fn classify_icon(url: Option<&str>) -> &'static str {
    FileType::classify(url).icon()
}
