//! Versioned in-memory code model.
//!
//! [`InMemoryModel`] is the reference implementation of the collaborator
//! contracts: a snapshot captures the model's version at acquisition time,
//! and every read re-checks it, so any mutation published after the
//! snapshot was taken surfaces as [`ModelError::Invalidated`] — the same
//! contract a query-engine-backed model provides via cancellation, made
//! explicit.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use lumen_core::{EditSet, TextEdit, TextSize};

use crate::{
    CodeModel, EditSynthesis, ModelError, ModelResult, ModelSnapshot, ModuleHandle, ModuleId,
    ResolvedTarget, SymbolHandle, Synthesized,
};

#[derive(Debug, Default)]
struct ModuleData {
    name: String,
    exports: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    version: u64,
    modules: BTreeMap<ModuleId, ModuleData>,
    files: BTreeMap<PathBuf, Arc<String>>,
}

impl State {
    fn bump(&mut self) {
        self.version += 1;
    }
}

/// In-memory [`CodeModel`] whose snapshots observe invalidation on every
/// mutation.
#[derive(Clone, Default)]
pub struct InMemoryModel {
    state: Arc<RwLock<State>>,
}

impl InMemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a module with the given source name and
    /// exported symbol names. Invalidates outstanding snapshots.
    pub fn publish_module<I, S>(&self, id: impl Into<ModuleId>, name: impl Into<String>, exports: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let mut state = self.state.write();
        state.bump();
        tracing::trace!(module = %id, version = state.version, "publish module");
        state.modules.insert(
            id,
            ModuleData {
                name: name.into(),
                exports: exports.into_iter().map(Into::into).collect(),
            },
        );
    }

    pub fn remove_module(&self, id: &ModuleId) {
        let mut state = self.state.write();
        state.bump();
        state.modules.remove(id);
    }

    /// Set the analyzed content of a file. Invalidates outstanding snapshots.
    pub fn set_file_text(&self, file: impl Into<PathBuf>, text: impl Into<String>) {
        let mut state = self.state.write();
        state.bump();
        state.files.insert(file.into(), Arc::new(text.into()));
    }

    /// Bump the version without changing content, as background re-analysis
    /// does.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        state.bump();
        tracing::trace!(version = state.version, "model invalidated");
    }
}

#[async_trait]
impl CodeModel for InMemoryModel {
    async fn snapshot(&self) -> ModelResult<Arc<dyn ModelSnapshot>> {
        let version = self.state.read().version;
        Ok(Arc::new(MemorySnapshot {
            state: Arc::clone(&self.state),
            version,
        }))
    }
}

struct MemorySnapshot {
    state: Arc<RwLock<State>>,
    version: u64,
}

impl MemorySnapshot {
    fn read(&self) -> ModelResult<parking_lot::RwLockReadGuard<'_, State>> {
        let state = self.state.read();
        if state.version != self.version {
            return Err(ModelError::Invalidated);
        }
        Ok(state)
    }
}

#[async_trait]
impl ModelSnapshot for MemorySnapshot {
    async fn find_module(&self, id: &ModuleId) -> ModelResult<Option<ModuleHandle>> {
        let state = self.read()?;
        Ok(state.modules.get(id).map(|data| ModuleHandle {
            id: id.clone(),
            name: data.name.clone(),
        }))
    }

    async fn find_exported_symbol(
        &self,
        module: &ModuleHandle,
        name: &str,
    ) -> ModelResult<Option<SymbolHandle>> {
        let state = self.read()?;
        let Some(data) = state.modules.get(&module.id) else {
            return Ok(None);
        };
        Ok(data
            .exports
            .contains(name)
            .then(|| SymbolHandle { name: name.into() }))
    }

    async fn file_text(&self, file: &Path) -> ModelResult<Option<Arc<String>>> {
        let state = self.read()?;
        Ok(state.files.get(file).cloned())
    }
}

/// Reference [`EditSynthesis`] that references a symbol by inserting an
/// `import <module>.<symbol>;` line into the target file.
///
/// Placement follows the usual conventions: after the last existing import,
/// else after the `module ...;` header, else at the top of the file. Line
/// endings of the source are preserved. When the bare symbol name is
/// already imported from a different module, no import is added and the
/// target's module name is reported as a disambiguating qualifier instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImportInserter;

#[async_trait]
impl EditSynthesis for ImportInserter {
    async fn synthesize(
        &self,
        target: &ResolvedTarget,
        snapshot: &dyn ModelSnapshot,
        file: &Path,
        _offset: TextSize,
    ) -> ModelResult<Synthesized> {
        let text = snapshot.file_text(file).await?.ok_or_else(|| {
            ModelError::Unavailable(format!("no analysis context for `{}`", file.display()))
        })?;

        let qualified = format!("{}.{}", target.module.name, target.symbol.name);
        let mut edits = EditSet::new();

        match plan_import(&text, &qualified, &target.symbol.name) {
            ImportPlan::AlreadyImported => Ok(Synthesized::default()),
            ImportPlan::NeedsQualifier => Ok(Synthesized {
                edits,
                prefix: Some(target.module.name.clone()),
            }),
            ImportPlan::InsertAt(offset) => {
                let line_ending = if text.contains("\r\n") { "\r\n" } else { "\n" };
                let needs_break = offset > 0 && text.as_bytes()[offset - 1] != b'\n';
                let lead = if needs_break { line_ending } else { "" };
                edits.push(
                    file,
                    TextEdit::insert(
                        TextSize::from(offset as u32),
                        format!("{lead}import {qualified};{line_ending}"),
                    ),
                );
                Ok(Synthesized {
                    edits,
                    prefix: None,
                })
            }
        }
    }
}

enum ImportPlan {
    AlreadyImported,
    NeedsQualifier,
    InsertAt(usize),
}

fn plan_import(text: &str, qualified: &str, bare: &str) -> ImportPlan {
    let mut header_end: Option<usize> = None;
    let mut last_import_end: Option<usize> = None;
    let mut conflict = false;

    let mut offset = 0usize;
    for segment in text.split_inclusive('\n') {
        let line_end = offset + segment.len();
        let line = segment.trim_end_matches(['\n', '\r']);

        if header_end.is_none() && is_module_header(line) {
            header_end = Some(line_end);
        }

        if let Some(path) = parse_import_path(line) {
            if path == qualified {
                return ImportPlan::AlreadyImported;
            }
            if path.rsplit('.').next() == Some(bare) {
                conflict = true;
            }
            last_import_end = Some(line_end);
        }

        offset = line_end;
    }

    if conflict {
        return ImportPlan::NeedsQualifier;
    }

    ImportPlan::InsertAt(last_import_end.or(header_end).unwrap_or(0))
}

fn is_module_header(line: &str) -> bool {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix("module") {
        Some(rest) => rest.starts_with(char::is_whitespace) && trimmed.contains(';'),
        None => false,
    }
}

fn parse_import_path(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("import")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let semi = rest.find(';')?;
    Some(rest[..semi].trim())
}
