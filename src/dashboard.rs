use serde::{Deserialize, Serialize};

use crate::listing::{
    FileTypeFilter, ListingPage, PageSize, SortOption, ViewState, compute_listing, total_pages,
};
use crate::note::NoteRecord;
use crate::preview::PreviewState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStep {
    Next,
    Prev,
}

/// Partial change to a listing's view, as sent by the toolbar and the
/// pagination buttons.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ViewUpdate {
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub sort_option: Option<SortOption>,
    #[serde(default)]
    pub file_type_filter: Option<FileTypeFilter>,
    #[serde(default)]
    pub page_size: Option<PageSize>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub step: Option<PageStep>,
}

/// One open listing: the fetched snapshot plus what the user did to it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingSession {
    notes: Vec<NoteRecord>,
    view: ViewState,
    preview: PreviewState,
}

impl ListingSession {
    /// Fresh listing over a new snapshot with a default view
    pub fn new(notes: Vec<NoteRecord>) -> Self {
        ListingSession {
            notes,
            view: ViewState::new(),
            preview: PreviewState::Closed,
        }
    }

    pub fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    pub fn page(&mut self) -> ListingPage {
        compute_listing(&self.notes, &mut self.view)
    }

    /// Swap in a re-fetched snapshot. The view is kept and its page is
    /// clamped against the new data.
    pub fn replace_notes(&mut self, notes: Vec<NoteRecord>) -> ListingPage {
        self.notes = notes;
        self.page()
    }

    /// Apply a view change. A new search, type filter or page size always
    /// lands on page 1, so any page move sent alongside one is dropped.
    pub fn apply(&mut self, update: ViewUpdate) -> ListingPage {
        let resets_page = update.search_query.is_some()
            || update.file_type_filter.is_some()
            || update.page_size.is_some();

        if let Some(query) = update.search_query {
            self.view.set_search_query(query);
        }
        if let Some(filter) = update.file_type_filter {
            self.view.set_file_type_filter(filter);
        }
        if let Some(size) = update.page_size {
            self.view.set_page_size(size);
        }
        if let Some(option) = update.sort_option {
            self.view.set_sort_option(option);
        }
        if resets_page {
            return self.page();
        }

        if let Some(page) = update.page {
            self.view.go_to_page(page);
        }

        match update.step {
            Some(PageStep::Next) => {
                let matching = self.page().matching_notes;
                self.view
                    .next_page(total_pages(matching, self.view.page_size()));
            }
            Some(PageStep::Prev) => self.view.prev_page(),
            None => {}
        }

        self.page()
    }

    /// Open the preview for the entry with `key`.
    ///
    /// `None` when no note has that key; `Some(false)` when it exists but
    /// has no embeddable link.
    pub fn open_preview(&mut self, key: &str) -> Option<bool> {
        let (position, note) = self
            .notes
            .iter()
            .enumerate()
            .find(|(position, note)| note.key(*position) == key)?;
        tracing::debug!("Opening preview for note {} at {}", key, position);
        Some(self.preview.open(note.file_url.as_deref()))
    }

    pub fn close_preview(&mut self) {
        self.preview.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteId;

    fn notes(count: usize) -> Vec<NoteRecord> {
        (0..count)
            .map(|i| NoteRecord {
                id: Some(NoteId::Number((i as i64).into())),
                batch_name: Some(format!("Batch {:02}", i)),
                educator_name: Some(if i % 2 == 0 { "Raj" } else { "Sam" }.to_string()),
                file_url: Some(format!("https://drive.google.com/file/d/F{}/view", i)),
                upload_time: Some(format!("2024-01-{:02}", i + 1)),
            })
            .collect()
    }

    #[test]
    fn steps_move_within_bounds() {
        let mut listing = ListingSession::new(notes(13));
        assert_eq!(listing.page().total_pages, 3);

        for _ in 0..5 {
            listing.apply(ViewUpdate {
                step: Some(PageStep::Next),
                ..Default::default()
            });
        }
        assert_eq!(listing.view().current_page(), 3);

        let page = listing.apply(ViewUpdate {
            step: Some(PageStep::Prev),
            ..Default::default()
        });
        assert_eq!(page.current_page, 2);
    }

    #[test]
    fn search_resets_page_but_sort_does_not() {
        let mut listing = ListingSession::new(notes(13));
        listing.apply(ViewUpdate {
            page: Some(2),
            ..Default::default()
        });
        let page = listing.apply(ViewUpdate {
            sort_option: Some(SortOption::BatchAz),
            ..Default::default()
        });
        assert_eq!(page.current_page, 2);

        let page = listing.apply(ViewUpdate {
            search_query: Some("sam".into()),
            ..Default::default()
        });
        assert_eq!(page.current_page, 1);
        assert_eq!(page.matching_notes, 6);
    }

    #[test]
    fn page_moves_do_not_override_a_reset() {
        let mut listing = ListingSession::new(notes(13));
        let page = listing.apply(ViewUpdate {
            search_query: Some("batch".into()),
            page: Some(3),
            ..Default::default()
        });
        assert_eq!(page.current_page, 1);

        let page = listing.apply(ViewUpdate {
            file_type_filter: Some(FileTypeFilter::All),
            step: Some(PageStep::Next),
            ..Default::default()
        });
        assert_eq!(page.current_page, 1);

        let page = listing.apply(ViewUpdate {
            sort_option: Some(SortOption::Oldest),
            page: Some(2),
            ..Default::default()
        });
        assert_eq!(page.current_page, 2, "Sorting alone keeps the page move");
    }

    #[test]
    fn page_jump_is_clamped() {
        let mut listing = ListingSession::new(notes(7));
        let page = listing.apply(ViewUpdate {
            page: Some(40),
            ..Default::default()
        });
        assert_eq!(page.current_page, 2);
        assert_eq!(page.entries.len(), 1);
    }

    #[test]
    fn refresh_keeps_view_and_clamps() {
        let mut listing = ListingSession::new(notes(13));
        listing.apply(ViewUpdate {
            page: Some(3),
            sort_option: Some(SortOption::Oldest),
            ..Default::default()
        });
        let page = listing.replace_notes(notes(5));
        assert_eq!(page.current_page, 1);
        assert_eq!(listing.view().sort_option(), SortOption::Oldest);
    }

    #[test]
    fn preview_opens_only_for_known_keys_with_links() {
        let mut snapshot = notes(2);
        snapshot[1].file_url = Some("https://example.com/file".into());
        let mut listing = ListingSession::new(snapshot);

        assert_eq!(listing.open_preview("9"), None);
        assert_eq!(listing.open_preview("1"), Some(false));
        assert_eq!(listing.preview(), &PreviewState::Closed);

        assert_eq!(listing.open_preview("0"), Some(true));
        assert_eq!(
            listing.preview().url(),
            Some("https://drive.google.com/file/d/F0/preview")
        );
        listing.close_preview();
        assert_eq!(listing.preview(), &PreviewState::Closed);
    }

    #[test]
    fn update_rejects_unknown_values() {
        assert!(serde_json::from_str::<ViewUpdate>(r#"{"sortOption": "size"}"#).is_err());
        assert!(serde_json::from_str::<ViewUpdate>(r#"{"pageSize": 10}"#).is_err());
        assert!(serde_json::from_str::<ViewUpdate>(r#"{"colour": "red"}"#).is_err());
        let update: ViewUpdate =
            serde_json::from_str(r#"{"fileTypeFilter": "sheet", "step": "next"}"#).unwrap();
        assert_eq!(update.file_type_filter, Some(FileTypeFilter::Sheet));
        assert_eq!(update.step, Some(PageStep::Next));
    }
}
