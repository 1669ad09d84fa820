//! Deferred-resolution request coordinator.
//!
//! Completion-style suggestions are offered cheaply, with the expensive
//! part — computing the exact edits that make the suggestion valid, imports
//! included — deferred until the caller explicitly asks to finalize one.
//! By that point the shared code model may have been invalidated by
//! background re-analysis any number of times, and a fast-typing caller may
//! have already asked to finalize a *newer* suggestion, making this one
//! moot.
//!
//! [`Resolver`] drives one such request to a terminal outcome:
//!
//! - every attempt first re-checks "am I still the latest request" and
//!   "am I still within budget", so stale requests fail fast without
//!   touching the code model;
//! - snapshot invalidation is absorbed by immediate retry, bounded only by
//!   the wall-clock budget;
//! - a successful attempt's edits are split into same-file inline edits and
//!   a [`DeferredCommand`] bundling edits to other files.
//!
//! Supersession is cooperative: registering a new request flips a single
//! last-write-wins slot, and older in-flight requests notice at their next
//! check. Nothing is preempted mid-call.

mod assemble;
mod context;
mod latest;
mod resolve;

pub use context::{RequestContext, ResolverConfig};
pub use latest::LatestRequest;
pub use lumen_core::RequestId;
pub use resolve::Resolver;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use lumen_core::{EditSet, TextEdit, TextSize};
use lumen_model::ModuleId;

/// Command name used for [`DeferredCommand`]s carrying import edits.
pub const APPLY_IMPORT_EDITS_COMMAND: &str = "lumen.applyImportEdits";

/// The deferred payload attached to a suggestion when it was offered:
/// everything needed to finalize it later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveData {
    /// Absolute path of the file the suggestion inserts into.
    pub file: PathBuf,
    /// Insertion offset within `file`.
    pub offset: TextSize,
    /// The module (library) the suggestion was drawn from.
    pub module: ModuleId,
    /// Requested symbol name. May be dotted (`Enum.member`), in which case
    /// only the leading segment names the symbol to import.
    pub symbol: String,
}

impl ResolveData {
    /// The exported symbol the import must bring in: the leading segment of
    /// a dotted name, or the whole name otherwise.
    pub fn import_target(&self) -> &str {
        match self.symbol.split_once('.') {
            Some((head, _)) => head,
            None => &self.symbol,
        }
    }
}

/// A suggestion as previously offered to the caller, possibly carrying a
/// deferred payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedSuggestion {
    pub label: String,
    pub insert_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Auxiliary documentation noting where the suggestion is imported
    /// from, when the host recorded one at offer time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_note: Option<String>,
    /// `None` means there is nothing to resolve; the suggestion passes
    /// through unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResolveData>,
}

/// A named, serializable bundle of edits the caller applies as a separate
/// follow-up action. Plain data; the transport layer decides how to turn it
/// into a client directive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeferredCommand {
    pub name: String,
    pub payload: EditSet,
}

impl DeferredCommand {
    pub fn apply_import_edits(payload: EditSet) -> Self {
        Self {
            name: APPLY_IMPORT_EDITS_COMMAND.to_string(),
            payload,
        }
    }
}

/// A finalized suggestion: the shape returned to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSuggestion {
    pub label: String,
    pub insert_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Edits within the request's primary file, applied with the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inline_edits: Vec<TextEdit>,
    /// Edits to other files, if any, packaged for deferred application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferred_command: Option<DeferredCommand>,
}

impl EnrichedSuggestion {
    /// A suggestion with no deferred payload needs no work; it is returned
    /// as offered.
    pub(crate) fn passthrough(suggestion: UnresolvedSuggestion) -> Self {
        Self {
            label: suggestion.label,
            insert_text: suggestion.insert_text,
            detail: suggestion.detail,
            inline_edits: Vec::new(),
            deferred_command: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The request's module id does not resolve against the current code
    /// model. Never retried.
    #[error("unknown module `{0}`")]
    UnknownModule(ModuleId),
    /// The module exists but does not export the requested symbol. Never
    /// retried.
    #[error("module `{module}` does not export `{symbol}`")]
    UnknownSymbol { module: ModuleId, symbol: String },
    /// The request was superseded by a newer one, or its budget ran out
    /// while retrying under invalidation. The caller cannot distinguish the
    /// two and is expected to have moved on.
    #[error("request superseded or timed out")]
    Superseded,
    /// Infrastructure failure in the code model, e.g. no analysis context
    /// for the file.
    #[error("code model unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
