//! Note listing engine.
//!
//! Takes an immutable snapshot of [`NoteRecord`]s and a [`ViewState`] and
//! produces the page of notes to render. The pipeline is filter, then
//! sort, then paginate; it is pure and is re-run on every view or data
//! change.

use crate::note::{FileType, NoteRecord};
use crate::preview::derive_preview_link;
use chrono::{DateTime, Utc};
use icu_collator::{Collator, CollatorOptions, Strength};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const NO_NOTES_MESSAGE: &str = "📂 No notes have been uploaded yet.";
pub const NO_MATCHES_MESSAGE: &str = "No matching results found.";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub enum SortOption {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
    #[serde(rename = "batchAZ")]
    BatchAz,
    #[serde(rename = "batchZA")]
    BatchZa,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::Newest,
        SortOption::Oldest,
        SortOption::BatchAz,
        SortOption::BatchZa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
            SortOption::BatchAz => "batchAZ",
            SortOption::BatchZa => "batchZA",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .iter()
            .copied()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| format!("Unknown sort option: {}", s))
    }
}

/// Type filter of the listing toolbar. `Other` links can only be reached
/// through `All`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileTypeFilter {
    #[default]
    All,
    Pdf,
    Doc,
    Sheet,
    Slide,
}

impl FileTypeFilter {
    pub const ALL: [FileTypeFilter; 5] = [
        FileTypeFilter::All,
        FileTypeFilter::Pdf,
        FileTypeFilter::Doc,
        FileTypeFilter::Sheet,
        FileTypeFilter::Slide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileTypeFilter::All => "all",
            FileTypeFilter::Pdf => "pdf",
            FileTypeFilter::Doc => "doc",
            FileTypeFilter::Sheet => "sheet",
            FileTypeFilter::Slide => "slide",
        }
    }

    pub fn matches(&self, file_type: FileType) -> bool {
        match self {
            FileTypeFilter::All => true,
            FileTypeFilter::Pdf => file_type == FileType::Pdf,
            FileTypeFilter::Doc => file_type == FileType::Doc,
            FileTypeFilter::Sheet => file_type == FileType::Sheet,
            FileTypeFilter::Slide => file_type == FileType::Slide,
        }
    }
}

impl fmt::Display for FileTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileTypeFilter::ALL
            .iter()
            .copied()
            .find(|filter| filter.as_str() == s)
            .ok_or_else(|| format!("Unknown file type filter: {}", s))
    }
}

/// Number of cards per page. Only the sizes offered by the toolbar exist.
#[derive(Clone, Copy, Serialize, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(into = "usize")]
pub struct PageSize(usize);

impl PageSize {
    pub const ALLOWED: [usize; 3] = [6, 12, 24];

    pub fn new(size: usize) -> Option<Self> {
        if Self::ALLOWED.contains(&size) {
            Some(PageSize(size))
        } else {
            None
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(Self::ALLOWED[0])
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.0
    }
}

impl TryFrom<usize> for PageSize {
    type Error = String;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        PageSize::new(size).ok_or_else(|| {
            format!("Unsupported page size {}; expected one of {:?}", size, Self::ALLOWED)
        })
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let size = usize::deserialize(deserializer)?;
        PageSize::try_from(size).map_err(serde::de::Error::custom)
    }
}

/// User-controlled parameters of one listing session.
///
/// The setters carry the page-reset rules: a new search, type filter or
/// page size always starts again at page 1. Sorting keeps the page.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    search_query: String,
    sort_option: SortOption,
    file_type_filter: FileTypeFilter,
    current_page: usize,
    page_size: PageSize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            search_query: String::new(),
            sort_option: SortOption::default(),
            file_type_filter: FileTypeFilter::default(),
            current_page: 1,
            page_size: PageSize::default(),
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort_option(&self) -> SortOption {
        self.sort_option
    }

    pub fn file_type_filter(&self) -> FileTypeFilter {
        self.file_type_filter
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.current_page = 1;
    }

    pub fn set_file_type_filter(&mut self, filter: FileTypeFilter) {
        self.file_type_filter = filter;
        self.current_page = 1;
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.page_size = size;
        self.current_page = 1;
    }

    pub fn set_sort_option(&mut self, option: SortOption) {
        self.sort_option = option;
    }

    /// Jump to a page. The value is clamped on the next recomputation, so
    /// only the lower bound is enforced here.
    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        if self.current_page < total_pages {
            self.current_page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    /// Pull the current page back into `[1, total_pages]`.
    pub fn clamp_page(&mut self, total_pages: usize) {
        self.current_page = self.current_page.clamp(1, total_pages.max(1));
    }
}

/// Search and type predicate of the listing.
///
/// An empty query matches every note. Otherwise the batch name or the
/// educator name must contain the query, ignoring case; missing names
/// never match.
pub fn matches_filter(note: &NoteRecord, search_query: &str, filter: FileTypeFilter) -> bool {
    let matches_search = if search_query.is_empty() {
        true
    } else {
        let needle = search_query.to_lowercase();
        let contains = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|value| value.to_lowercase().contains(&needle))
        };
        contains(&note.batch_name) || contains(&note.educator_name)
    };

    matches_search && filter.matches(note.file_type())
}

// Missing and unparseable timestamps go after every valid one, whichever
// direction is requested.
fn compare_upload_times(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    newest_first: bool,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if newest_first => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

thread_local! {
    // Root collation at secondary strength: accents count, case does not.
    static BATCH_COLLATOR: Option<Collator> = {
        let mut options = CollatorOptions::new();
        options.strength = Some(Strength::Secondary);
        Collator::try_new(&Default::default(), options)
            .map_err(|e| tracing::warn!("Batch collation unavailable, falling back to case folding: {}", e))
            .ok()
    };
}

/// Locale-aware collation of batch names, so "Économie" sorts with the E's.
/// Names that differ only in case compare equal and keep their input order.
pub fn compare_batch_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    BATCH_COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    })
}

/// Stable sort of a filtered listing.
pub fn sort_notes(notes: &mut [&NoteRecord], option: SortOption) {
    sort_by_option(notes, option, |note| note);
}

fn sort_by_option<'a, T: Copy>(
    items: &mut [T],
    option: SortOption,
    note_of: impl Fn(T) -> &'a NoteRecord,
) {
    match option {
        SortOption::Newest | SortOption::Oldest => {
            let newest_first = option == SortOption::Newest;
            // Parse once per note, not once per comparison.
            let mut keyed: Vec<(Option<DateTime<Utc>>, T)> = items
                .iter()
                .map(|item| (note_of(*item).parsed_upload_time(), *item))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| compare_upload_times(*a, *b, newest_first));
            for (slot, (_, item)) in items.iter_mut().zip(keyed) {
                *slot = item;
            }
        }
        SortOption::BatchAz => items.sort_by(|a, b| {
            compare_batch_names(
                note_of(*a).batch_name.as_deref(),
                note_of(*b).batch_name.as_deref(),
            )
        }),
        SortOption::BatchZa => items.sort_by(|a, b| {
            compare_batch_names(
                note_of(*b).batch_name.as_deref(),
                note_of(*a).batch_name.as_deref(),
            )
        }),
    }
}

/// One page cut out of a sorted listing.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub current_page: usize,
    pub total_pages: usize,
}

pub fn total_pages(len: usize, page_size: PageSize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

/// Slice out one page. The requested page is clamped into
/// `[1, total_pages]` first, so this never fails; an empty input is a
/// single empty page.
pub fn paginate<T>(sorted: &[T], page_size: PageSize, current_page: usize) -> Page<'_, T> {
    let total_pages = total_pages(sorted.len(), page_size);
    let current_page = current_page.clamp(1, total_pages);
    let start = ((current_page - 1) * page_size.get()).min(sorted.len());
    let end = (start + page_size.get()).min(sorted.len());

    Page {
        items: &sorted[start..end],
        current_page,
        total_pages,
    }
}

/// A note on the rendered page with everything the card needs.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    pub key: String,
    pub note: NoteRecord,
    pub file_type: FileType,
    pub icon: &'static str,
    pub preview_url: Option<String>,
    pub uploaded_at: String,
}

impl ListingEntry {
    fn new(note: &NoteRecord, position: usize) -> Self {
        let file_type = note.file_type();
        ListingEntry {
            key: note.key(position),
            note: note.clone(),
            file_type,
            icon: file_type.icon(),
            preview_url: derive_preview_link(note.file_url.as_deref()),
            uploaded_at: note.display_upload_time(),
        }
    }
}

/// Output of one run of the engine.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub entries: Vec<ListingEntry>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_notes: usize,
    pub matching_notes: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub empty_message: Option<&'static str>,
    pub view: ViewState,
}

/// Run filter, sort and paginate over a snapshot.
///
/// The view's current page is clamped in place, so the stored view never
/// points past the end of a shrunken result set.
pub fn compute_listing(notes: &[NoteRecord], view: &mut ViewState) -> ListingPage {
    // Keys are positions in the snapshot, not in the filtered list.
    let mut positioned: Vec<(usize, &NoteRecord)> = notes
        .iter()
        .enumerate()
        .filter(|(_, note)| matches_filter(note, &view.search_query, view.file_type_filter))
        .collect();
    sort_by_option(&mut positioned, view.sort_option, |(_, note)| note);

    let page = paginate(&positioned, view.page_size, view.current_page);
    view.current_page = page.current_page;

    let empty_message = if notes.is_empty() {
        Some(NO_NOTES_MESSAGE)
    } else if positioned.is_empty() {
        Some(NO_MATCHES_MESSAGE)
    } else {
        None
    };

    ListingPage {
        entries: page
            .items
            .iter()
            .map(|(position, note)| ListingEntry::new(note, *position))
            .collect(),
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_notes: notes.len(),
        matching_notes: positioned.len(),
        has_prev: page.current_page > 1,
        has_next: page.current_page < page.total_pages,
        empty_message,
        view: view.clone(),
    }
}

/// Pull the record list out of a listing payload.
///
/// Backends wrap the list as `{"notes": [...]}`, `{"files": [...]}` or
/// send the bare array. Anything else is an empty listing; elements that
/// are not note-shaped are skipped.
pub fn notes_from_payload(payload: Value) -> Vec<NoteRecord> {
    let list = match payload {
        Value::Object(mut map) => match map.remove("notes").filter(is_truthy) {
            Some(notes) => notes,
            None => map.remove("files").filter(is_truthy).unwrap_or(Value::Null),
        },
        other => other,
    };

    let Value::Array(items) = list else {
        tracing::warn!("Listing payload is not an array; treating it as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(note) => Some(note),
            Err(e) => {
                tracing::warn!("Skipping malformed note at index {}: {}", index, e);
                None
            }
        })
        .collect()
}

/// Load a saved listing payload, in any shape [`notes_from_payload`] accepts.
pub fn read_notes_file(path: impl AsRef<Path>) -> crate::Result<Vec<NoteRecord>> {
    let raw = fs::read_to_string(path)?;
    let payload: Value = serde_json::from_str(&raw)?;
    Ok(notes_from_payload(payload))
}

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn note(batch: &str, educator: &str, time: &str) -> NoteRecord {
        NoteRecord {
            batch_name: Some(batch.to_string()),
            educator_name: Some(educator.to_string()),
            upload_time: Some(time.to_string()),
            ..Default::default()
        }
    }

    fn batches(notes: &[&NoteRecord]) -> Vec<String> {
        notes
            .iter()
            .map(|n| n.batch_name.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn search_is_case_insensitive_over_both_names() {
        let biology = note("Biology", "Sam", "2024-06-01");
        assert!(matches_filter(&biology, "BIO", FileTypeFilter::All));
        assert!(matches_filter(&biology, "sa", FileTypeFilter::All));
        assert!(!matches_filter(&biology, "raj", FileTypeFilter::All));
    }

    #[test]
    fn missing_names_only_match_empty_query() {
        let bare = NoteRecord::default();
        assert!(matches_filter(&bare, "", FileTypeFilter::All));
        assert!(!matches_filter(&bare, "a", FileTypeFilter::All));
    }

    #[test]
    fn type_filter_is_anded_with_search() {
        let mut sheet = note("Stats", "Ana", "2024-01-01");
        sheet.file_url = Some("https://docs.google.com/spreadsheets/d/1".into());
        assert!(matches_filter(&sheet, "stat", FileTypeFilter::Sheet));
        assert!(!matches_filter(&sheet, "stat", FileTypeFilter::Doc));
        assert!(!matches_filter(&sheet, "zzz", FileTypeFilter::Sheet));
        assert!(!matches_filter(&NoteRecord::default(), "", FileTypeFilter::Pdf));
    }

    #[test]
    fn newest_first_orders_by_upload_time() {
        let algebra = note("Algebra", "Raj", "2024-01-01");
        let biology = note("Biology", "Sam", "2024-06-01");
        let mut notes = vec![&algebra, &biology];
        sort_notes(&mut notes, SortOption::Newest);
        assert_eq!(batches(&notes), ["Biology", "Algebra"]);
        sort_notes(&mut notes, SortOption::Oldest);
        assert_eq!(batches(&notes), ["Algebra", "Biology"]);
    }

    #[test]
    fn invalid_times_sort_last_in_both_directions() {
        let broken = note("Broken", "X", "soon");
        let missing = NoteRecord {
            batch_name: Some("Missing".into()),
            ..Default::default()
        };
        let early = note("Early", "X", "2023-01-01");
        let late = note("Late", "X", "2025-01-01");

        let mut notes = vec![&broken, &early, &missing, &late];
        sort_notes(&mut notes, SortOption::Newest);
        assert_eq!(batches(&notes), ["Late", "Early", "Broken", "Missing"]);

        let mut notes = vec![&broken, &early, &missing, &late];
        sort_notes(&mut notes, SortOption::Oldest);
        assert_eq!(batches(&notes), ["Early", "Late", "Broken", "Missing"]);
    }

    #[test]
    fn batch_sort_ignores_case_and_treats_missing_as_empty() {
        let zoology = note("zoology", "A", "2024-01-01");
        let algebra = note("Algebra", "B", "2024-01-01");
        let nameless = NoteRecord::default();
        let mut notes = vec![&zoology, &algebra, &nameless];
        sort_notes(&mut notes, SortOption::BatchAz);
        assert_eq!(batches(&notes), ["", "Algebra", "zoology"]);
        sort_notes(&mut notes, SortOption::BatchZa);
        assert_eq!(batches(&notes), ["zoology", "Algebra", ""]);
    }

    #[test]
    fn batch_sort_places_accented_names_by_letter() {
        let zoologie = note("Zoologie", "A", "2024-01-01");
        let economie = note("Économie", "B", "2024-01-01");
        let droit = note("droit", "C", "2024-01-01");
        let mut notes = vec![&zoologie, &economie, &droit];
        sort_notes(&mut notes, SortOption::BatchAz);
        assert_eq!(batches(&notes), ["droit", "Économie", "Zoologie"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let first = note("Same", "first", "2024-01-01");
        let second = note("same", "second", "2024-01-01");
        let mut notes = vec![&first, &second];
        for option in SortOption::ALL {
            sort_notes(&mut notes, option);
            assert_eq!(notes[0].educator_name.as_deref(), Some("first"), "{}", option);
        }
    }

    #[test]
    fn paginate_clamps_and_clips() {
        let items: Vec<u32> = (0..7).collect();
        let size = PageSize::new(6).unwrap();

        let page = paginate(&items, size, 2);
        assert_eq!(page.items, &[6]);
        assert_eq!(page.total_pages, 2);

        let page = paginate(&items, size, 9);
        assert_eq!(page.current_page, 2);

        let page = paginate(&items, size, 0);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.items.len(), 6);

        let empty: Vec<u32> = Vec::new();
        let page = paginate(&empty, size, 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn page_size_only_accepts_toolbar_values() {
        assert_eq!(PageSize::default().get(), 6);
        assert!(PageSize::new(12).is_some());
        assert!(PageSize::new(7).is_none());
        assert!(serde_json::from_value::<PageSize>(json!(24)).is_ok());
        assert!(serde_json::from_value::<PageSize>(json!(5)).is_err());
    }

    #[test]
    fn view_setters_reset_page_except_sort() {
        let mut view = ViewState::new();
        view.go_to_page(3);
        view.set_sort_option(SortOption::BatchAz);
        assert_eq!(view.current_page(), 3);

        view.set_search_query("bio");
        assert_eq!(view.current_page(), 1);

        view.go_to_page(2);
        view.set_file_type_filter(FileTypeFilter::Pdf);
        assert_eq!(view.current_page(), 1);

        view.go_to_page(2);
        view.set_page_size(PageSize::new(24).unwrap());
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn next_and_prev_stay_in_range() {
        let mut view = ViewState::new();
        view.prev_page();
        assert_eq!(view.current_page(), 1);
        view.next_page(2);
        view.next_page(2);
        assert_eq!(view.current_page(), 2);
        view.prev_page();
        assert_eq!(view.current_page(), 1);
    }

    #[test]
    fn compute_listing_clamps_stored_page() {
        let notes: Vec<NoteRecord> = (0..13)
            .map(|i| note(&format!("Batch {}", i), "Ed", "2024-01-01"))
            .collect();
        let mut view = ViewState::new();
        view.go_to_page(3);
        let page = compute_listing(&notes, &mut view);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.entries.len(), 1);

        let shrunk = &notes[..4];
        let page = compute_listing(shrunk, &mut view);
        assert_eq!(page.total_pages, 1);
        assert_eq!(view.current_page(), 1);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn entry_keys_are_snapshot_positions() {
        let algebra = note("Algebra", "Raj", "2024-01-01");
        let biology = note("Biology", "Sam", "2024-06-01");
        let notes = vec![algebra, biology];
        let page = compute_listing(&notes, &mut ViewState::new());
        let keys: Vec<&str> = page.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["1", "0"]);
    }

    #[test]
    fn empty_messages_distinguish_no_data_from_no_match() {
        let page = compute_listing(&[], &mut ViewState::new());
        assert_eq!(page.empty_message, Some(NO_NOTES_MESSAGE));

        let notes = vec![note("Algebra", "Raj", "2024-01-01")];
        let mut view = ViewState::new();
        view.set_search_query("chemistry");
        let page = compute_listing(&notes, &mut view);
        assert_eq!(page.empty_message, Some(NO_MATCHES_MESSAGE));
        assert_eq!(page.total_notes, 1);
        assert_eq!(page.matching_notes, 0);
    }

    #[test]
    fn payload_shapes_are_normalised() {
        let bare = notes_from_payload(json!([{ "batchName": "A" }]));
        assert_eq!(bare.len(), 1);

        let wrapped = notes_from_payload(json!({ "notes": [{ "batchName": "A" }, {}] }));
        assert_eq!(wrapped.len(), 2);

        let files = notes_from_payload(json!({ "notes": null, "files": [{ "batchName": "F" }] }));
        assert_eq!(files[0].batch_name.as_deref(), Some("F"));

        assert!(notes_from_payload(json!({ "status": "ok" })).is_empty());
        assert!(notes_from_payload(json!("nope")).is_empty());
        assert!(notes_from_payload(Value::Null).is_empty());
    }

    #[test]
    fn malformed_elements_are_skipped() {
        let notes = notes_from_payload(json!([{ "batchName": 5 }, { "batchName": "ok" }, 3]));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].batch_name.as_deref(), Some("ok"));
    }
}
