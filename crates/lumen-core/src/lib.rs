//! Core shared types for Lumen.
//!
//! This crate is intentionally small: text-edit primitives, the per-file
//! edit collection exchanged between the resolver and its collaborators,
//! and the request identity token.

mod edit;
mod request;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, EditSet, TextEdit};
pub use request::RequestId;

pub use text_size::{TextRange, TextSize};
