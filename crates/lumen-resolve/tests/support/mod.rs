//! Instrumented collaborator fakes shared by the integration suite.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lumen_core::{EditSet, TextEdit, TextSize};
use lumen_model::{
    memory::InMemoryModel, CodeModel, EditSynthesis, ModelError, ModelResult, ModelSnapshot,
    ResolvedTarget, Synthesized,
};
use lumen_resolve::{ResolveData, UnresolvedSuggestion};

pub const PRIMARY_FILE: &str = "/ws/main.lum";
pub const MANIFEST_FILE: &str = "/ws/manifest.lum";

/// Wraps an [`InMemoryModel`] and counts snapshot acquisitions, so tests
/// can assert a superseded request never touched the code model.
pub struct CountingModel {
    pub model: InMemoryModel,
    snapshots: AtomicUsize,
}

impl CountingModel {
    pub fn new(model: InMemoryModel) -> Self {
        Self {
            model,
            snapshots: AtomicUsize::new(0),
        }
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeModel for CountingModel {
    async fn snapshot(&self) -> ModelResult<Arc<dyn ModelSnapshot>> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.model.snapshot().await
    }
}

pub enum Step {
    Invalidated,
    InvalidatedAfter(Duration),
    Succeed(Synthesized),
}

/// Edit synthesis driven by a script of outcomes; counts calls. Once the
/// script runs dry every call succeeds with an empty result.
#[derive(Default)]
pub struct ScriptedSynthesis {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedSynthesis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_invalidated(&self, count: usize) {
        let mut steps = self.steps.lock().unwrap();
        for _ in 0..count {
            steps.push_back(Step::Invalidated);
        }
    }

    pub fn push_invalidated_after(&self, delay: Duration, count: usize) {
        let mut steps = self.steps.lock().unwrap();
        for _ in 0..count {
            steps.push_back(Step::InvalidatedAfter(delay));
        }
    }

    pub fn push_success(&self, synthesized: Synthesized) {
        self.steps.lock().unwrap().push_back(Step::Succeed(synthesized));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EditSynthesis for ScriptedSynthesis {
    async fn synthesize(
        &self,
        _target: &ResolvedTarget,
        _snapshot: &dyn ModelSnapshot,
        _file: &Path,
        _offset: TextSize,
    ) -> ModelResult<Synthesized> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            None => Ok(Synthesized::default()),
            Some(Step::Invalidated) => Err(ModelError::Invalidated),
            Some(Step::InvalidatedAfter(delay)) => {
                tokio::time::sleep(delay).await;
                Err(ModelError::Invalidated)
            }
            Some(Step::Succeed(synthesized)) => Ok(synthesized),
        }
    }
}

/// A model whose first N snapshots go stale immediately: the snapshot is
/// handed out, then the model is invalidated behind it, so the snapshot's
/// own lookups fail. Models invalidation landing between acquisition and
/// use.
pub struct StaleOnceModel {
    inner: InMemoryModel,
    stale_snapshots: AtomicUsize,
}

impl StaleOnceModel {
    pub fn new(inner: InMemoryModel, stale_snapshots: usize) -> Self {
        Self {
            inner,
            stale_snapshots: AtomicUsize::new(stale_snapshots),
        }
    }
}

#[async_trait]
impl CodeModel for StaleOnceModel {
    async fn snapshot(&self) -> ModelResult<Arc<dyn ModelSnapshot>> {
        let snapshot = self.inner.snapshot().await?;
        if self.stale_snapshots.load(Ordering::SeqCst) > 0 {
            self.stale_snapshots.fetch_sub(1, Ordering::SeqCst);
            self.inner.invalidate();
        }
        Ok(snapshot)
    }
}

/// A model pre-populated with the `util` module exporting `List` and a
/// primary file the suggestion inserts into.
pub fn util_model() -> InMemoryModel {
    let model = InMemoryModel::new();
    model.publish_module("lib:util", "util", ["List"]);
    model.set_file_text(PRIMARY_FILE, "module app;\n\nfn main() {}\n");
    model
}

pub fn suggestion(label: &str, module: &str, symbol: &str) -> UnresolvedSuggestion {
    UnresolvedSuggestion {
        label: label.to_string(),
        insert_text: label.to_string(),
        detail: None,
        import_note: None,
        data: Some(ResolveData {
            file: PRIMARY_FILE.into(),
            offset: TextSize::from(13),
            module: module.into(),
            symbol: symbol.to_string(),
        }),
    }
}

/// A synthesis result touching the primary file and the manifest: the
/// shape of "adding this import also requires declaring the dependency".
pub fn cross_file_synthesized(prefix: Option<&str>) -> Synthesized {
    let mut edits = EditSet::new();
    edits.push(PRIMARY_FILE, TextEdit::insert(TextSize::from(13), "Color.RED"));
    edits.push(
        MANIFEST_FILE,
        TextEdit::insert(TextSize::from(0), "dep paint;\n"),
    );
    Synthesized {
        edits,
        prefix: prefix.map(Into::into),
    }
}
