use crate::note::FileType;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref DRIVE_VIEW_REGEX: Regex = Regex::new(r"/file/d/(.*)/view").unwrap();
    static ref SHARE_LINK_REGEXES: [Regex; 4] = [
        Regex::new(r"/file/d/[a-zA-Z0-9_-]+/view").unwrap(),
        Regex::new(r"/document/d/[a-zA-Z0-9_-]+").unwrap(),
        Regex::new(r"/spreadsheets/d/[a-zA-Z0-9_-]+").unwrap(),
        Regex::new(r"/presentation/d/[a-zA-Z0-9_-]+").unwrap(),
    ];
}

const DRIVE_PREVIEW_PREFIX: &str = "https://drive.google.com/file/d/";

fn drive_preview(url: &str) -> Option<String> {
    let captures = DRIVE_VIEW_REGEX.captures(url)?;
    let file_id = captures.get(1)?.as_str();
    if file_id.is_empty() {
        return None;
    }
    Some(format!("{}{}/preview", DRIVE_PREVIEW_PREFIX, file_id))
}

/// Derive an iframe-embeddable link for a note.
///
/// Drive `/file/d/<id>/view` links are rewritten to their `/preview`
/// form. Docs, Sheets and Slides shares embed as-is. Anything else has no
/// preview and the preview action should be disabled.
pub fn derive_preview_link(file_url: Option<&str>) -> Option<String> {
    let url = file_url.filter(|url| !url.is_empty())?;

    if let Some(preview) = drive_preview(url) {
        return Some(preview);
    }

    if FileType::classify(Some(url)).is_google_editor() {
        return Some(url.to_string());
    }

    None
}

/// Preview used by the upload form while a link is being typed in.
///
/// Looser than [`derive_preview_link`]: any `docs.google.com` link is
/// embedded unchanged.
pub fn draft_preview_link(file_url: &str) -> Option<String> {
    if file_url.is_empty() {
        return None;
    }
    if let Some(preview) = drive_preview(file_url) {
        return Some(preview);
    }
    if file_url.contains("docs.google.com") {
        return Some(file_url.to_string());
    }
    None
}

/// True when the link looks like a Drive file, Doc, Sheet or Slides share.
pub fn validate_share_link(url: &str) -> bool {
    SHARE_LINK_REGEXES.iter().any(|regex| regex.is_match(url))
}

/// Preview overlay of the listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PreviewState {
    #[default]
    Closed,
    Open { url: String },
}

impl PreviewState {
    /// Open the overlay for a note's link. Returns `false` and stays as is
    /// when the link has no embeddable preview.
    pub fn open(&mut self, file_url: Option<&str>) -> bool {
        match derive_preview_link(file_url) {
            Some(url) => {
                *self = PreviewState::Open { url };
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        *self = PreviewState::Closed;
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            PreviewState::Open { url } => Some(url),
            PreviewState::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_view_link_becomes_preview() {
        assert_eq!(
            derive_preview_link(Some("https://drive.google.com/file/d/XYZ/view")).as_deref(),
            Some("https://drive.google.com/file/d/XYZ/preview")
        );
        assert_eq!(
            derive_preview_link(Some("https://drive.google.com/file/d/XYZ/view?usp=sharing"))
                .as_deref(),
            Some("https://drive.google.com/file/d/XYZ/preview")
        );
    }

    #[test]
    fn editor_links_embed_unchanged() {
        let doc = "https://docs.google.com/document/d/abc/edit";
        assert_eq!(derive_preview_link(Some(doc)).as_deref(), Some(doc));
        let slides = "https://docs.google.com/presentation/d/abc/edit";
        assert_eq!(derive_preview_link(Some(slides)).as_deref(), Some(slides));
    }

    #[test]
    fn unknown_links_have_no_preview() {
        assert_eq!(derive_preview_link(Some("https://example.com/notes.pdf")), None);
        assert_eq!(derive_preview_link(Some("https://drive.google.com/file/d//view")), None);
        assert_eq!(derive_preview_link(Some("")), None);
        assert_eq!(derive_preview_link(None), None);
    }

    #[test]
    fn draft_preview_accepts_any_docs_host_link() {
        assert_eq!(
            draft_preview_link("https://docs.google.com/forms/d/abc").as_deref(),
            Some("https://docs.google.com/forms/d/abc")
        );
        assert_eq!(derive_preview_link(Some("https://docs.google.com/forms/d/abc")), None);
        assert_eq!(draft_preview_link("https://example.com"), None);
    }

    #[test]
    fn share_link_validation() {
        assert!(validate_share_link("https://drive.google.com/file/d/A-b_9/view"));
        assert!(validate_share_link("https://docs.google.com/document/d/abc"));
        assert!(validate_share_link("https://docs.google.com/spreadsheets/d/abc/edit"));
        assert!(validate_share_link("https://docs.google.com/presentation/d/abc"));
        assert!(!validate_share_link("https://drive.google.com/file/d/abc"));
        assert!(!validate_share_link("https://example.com/document/d/"));
        assert!(!validate_share_link(""));
    }

    #[test]
    fn preview_state_transitions() {
        let mut preview = PreviewState::default();
        assert_eq!(preview.url(), None);

        assert!(!preview.open(Some("https://example.com")));
        assert_eq!(preview, PreviewState::Closed);

        assert!(preview.open(Some("https://drive.google.com/file/d/Q/view")));
        assert_eq!(preview.url(), Some("https://drive.google.com/file/d/Q/preview"));

        preview.close();
        assert_eq!(preview, PreviewState::Closed);
    }
}
