//! Collaborator contracts consumed by the Lumen resolver.
//!
//! The resolver never computes analysis results itself; it reads them
//! through the traits defined here:
//!
//! - [`CodeModel`] hands out read-only [`ModelSnapshot`]s of the analysis
//!   state. A snapshot is only consistent for as long as the underlying
//!   model does not change; any operation against a stale snapshot fails
//!   with [`ModelError::Invalidated`].
//! - [`EditSynthesis`] computes the text edits needed to reference a
//!   resolved symbol at an insertion point (including whatever import that
//!   requires, and possibly a disambiguating qualifier).
//!
//! The [`memory`] module provides a versioned in-memory implementation of
//! both, used by embedders without a full analysis backend and by the
//! resolver's own tests.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lumen_core::{EditSet, TextSize};

pub mod memory;

/// Stable identifier of a module (library) in the code model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A module resolved against a specific snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleHandle {
    pub id: ModuleId,
    /// Dotted name used in source text (`lumen.util`), which may differ
    /// from the opaque id the host assigned to the library.
    pub name: String,
}

/// A declared element found in a module's public export surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolHandle {
    pub name: String,
}

/// The module plus the exported element a resolution request denotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub module: ModuleHandle,
    pub symbol: SymbolHandle,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The snapshot observed a concurrent mutation of the underlying model.
    ///
    /// Transient: the caller is expected to acquire a fresh snapshot and
    /// retry the read.
    #[error("code model snapshot invalidated by a concurrent change")]
    Invalidated,
    /// The model cannot serve the request at all, e.g. there is no analysis
    /// context for the file. Not retryable.
    #[error("code model unavailable: {0}")]
    Unavailable(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Source of read-only snapshots of the analysis state.
#[async_trait]
pub trait CodeModel: Send + Sync {
    async fn snapshot(&self) -> ModelResult<Arc<dyn ModelSnapshot>>;
}

/// A point-in-time view of the code model.
///
/// Every operation may fail with [`ModelError::Invalidated`] if the model
/// changed since the snapshot was acquired; `Ok(None)` from the lookups
/// means the identifier genuinely does not resolve.
#[async_trait]
pub trait ModelSnapshot: Send + Sync {
    async fn find_module(&self, id: &ModuleId) -> ModelResult<Option<ModuleHandle>>;

    async fn find_exported_symbol(
        &self,
        module: &ModuleHandle,
        name: &str,
    ) -> ModelResult<Option<SymbolHandle>>;

    /// Content of a file as the snapshot sees it, or `None` when the file
    /// is not part of the analyzed workspace.
    async fn file_text(&self, file: &Path) -> ModelResult<Option<Arc<String>>>;
}

/// Output of one edit-synthesis call: the edits needed to reference the
/// target, plus an optional disambiguating qualifier the caller must
/// prepend to the inserted name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Synthesized {
    pub edits: EditSet,
    pub prefix: Option<String>,
}

/// Computes the edits needed to reference a resolved symbol at a given
/// insertion point.
#[async_trait]
pub trait EditSynthesis: Send + Sync {
    async fn synthesize(
        &self,
        target: &ResolvedTarget,
        snapshot: &dyn ModelSnapshot,
        file: &Path,
        offset: TextSize,
    ) -> ModelResult<Synthesized>;
}
