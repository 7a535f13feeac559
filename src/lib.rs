/*!
# Notes Share

A small notes-sharing site for a tutoring institution, built in Rust.

## Overview

Educators publish study material, either a Google Drive/Docs/Sheets/Slides
share link or an uploaded file, tagged with their name and a batch name.
Students and educators browse the material through a listing that can be
searched, filtered by file type, sorted and paginated, and open an inline
preview of any note that has an embeddable link.

## Architecture

### Listing Engine
- **Modules**: `note`, `preview`, `listing`
- Pure functions over a snapshot of note records: file type classification,
  preview link derivation, search filter, sort and pagination.
- A view state that resets to page 1 whenever the result set changes shape.

### Sessions and Routing
- **Modules**: `session`, `login`
- Role-tagged sessions created from a login lookup, kept server side and
  keyed by a `session` cookie.
- A route guard sending anyone without the right role back to the landing page.

### Web Layer (feature `web`)
- **Technologies**: axum, reqwest
- **Modules**: `app`, `client`, `dashboard`, `upload`
- One listing session per signed-in user, driven through a small JSON API.
- Educator-only upload and delete, forwarded to the notes backend.

## Modules

- **note**: Note records, upload time parsing and file type classification
- **preview**: Embeddable preview links and the preview overlay
- **listing**: Search, filter, sort and pagination of a snapshot
- **dashboard**: A listing snapshot together with its view and preview
- **session**: Roles, sessions, routes and the route guard
- **login**: Login lookup resolution and the login handlers
- **upload**: Upload form validation and submission
- **config**: Environment configuration
- **error**: Crate error type
- **client**: HTTP client for the notes backend
- **app**: Routing and handlers

## REST API Endpoints

- `GET /api/listing` - Current page of the caller's listing
- `POST /api/listing/view` - Change search, filter, sort, page size or page
- `POST /api/listing/refresh` - Re-fetch the snapshot, keeping the view
- `POST /api/listing/preview`, `DELETE /api/listing/preview` - Open or close the preview
- `DELETE /api/notes/{id}` - Delete a note (educators)
- `POST /api/upload` - Upload a link or a file (educators)
*/

pub mod config;
pub mod dashboard;
pub mod error;
pub mod listing;
pub mod login;
pub mod note;
pub mod preview;
pub mod session;
pub mod upload;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod client;

pub use config::Config;
pub use dashboard::{ListingSession, PageStep, ViewUpdate};
pub use error::{Error, Result};
pub use listing::{
    FileTypeFilter, ListingEntry, ListingPage, PageSize, SortOption, ViewState, compute_listing,
    notes_from_payload, read_notes_file,
};
pub use note::{FileType, NoteId, NoteRecord};
pub use preview::{PreviewState, derive_preview_link, validate_share_link};
pub use session::{Role, Route, Session};
