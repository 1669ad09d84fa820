//! The resolution attempt loop.

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use lumen_model::{CodeModel, EditSynthesis, ModelError, ResolvedTarget, Synthesized};

use crate::{
    assemble, context::RequestContext, latest::LatestRequest, EnrichedSuggestion, ResolveData,
    ResolveError, ResolverConfig, Result, UnresolvedSuggestion,
};

/// Drives deferred-resolution requests to a terminal outcome.
///
/// One resolver instance serves one suggestion stream: every new request it
/// accepts supersedes the previous one. Requests for independent streams
/// belong on independent resolvers.
pub struct Resolver {
    model: Arc<dyn CodeModel>,
    synthesis: Arc<dyn EditSynthesis>,
    latest: LatestRequest,
    config: ResolverConfig,
}

enum AttemptError {
    /// Snapshot went stale mid-attempt; retry from the top.
    Invalidated,
    Fatal(ResolveError),
}

impl From<ModelError> for AttemptError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Invalidated => AttemptError::Invalidated,
            ModelError::Unavailable(msg) => AttemptError::Fatal(ResolveError::Unavailable(msg)),
        }
    }
}

impl Resolver {
    pub fn new(model: Arc<dyn CodeModel>, synthesis: Arc<dyn EditSynthesis>) -> Self {
        Self::with_config(model, synthesis, ResolverConfig::default())
    }

    pub fn with_config(
        model: Arc<dyn CodeModel>,
        synthesis: Arc<dyn EditSynthesis>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            model,
            synthesis,
            latest: LatestRequest::new(),
            config,
        }
    }

    /// Accept a new request: mint its id, register it as the latest (which
    /// supersedes any in-flight request), and start its budget clock.
    pub fn begin(&self) -> RequestContext {
        let id = self.latest.begin();
        tracing::debug!(request = %id, budget = ?self.config.budget, "resolution request registered");
        RequestContext::new(
            id,
            CancellationToken::new(),
            Instant::now() + self.config.budget,
        )
    }

    /// Finalize a suggestion.
    ///
    /// A suggestion with no deferred payload passes through unchanged and
    /// does not supersede in-flight requests. Otherwise this is
    /// [`Resolver::begin`] followed by [`Resolver::resolve_with_context`].
    pub async fn resolve(&self, suggestion: UnresolvedSuggestion) -> Result<EnrichedSuggestion> {
        if suggestion.data.is_none() {
            return Ok(EnrichedSuggestion::passthrough(suggestion));
        }
        let ctx = self.begin();
        self.resolve_with_context(&ctx, suggestion).await
    }

    /// Run an already-registered request to a terminal outcome.
    pub async fn resolve_with_context(
        &self,
        ctx: &RequestContext,
        suggestion: UnresolvedSuggestion,
    ) -> Result<EnrichedSuggestion> {
        let Some(data) = suggestion.data.clone() else {
            return Ok(EnrichedSuggestion::passthrough(suggestion));
        };
        let synthesized = self.attempt_loop(ctx, &data).await?;
        Ok(assemble::assemble(&suggestion, &data, synthesized))
    }

    /// Retry until success, supersession, deadline, or a fatal input error.
    ///
    /// "Still latest" and "still within budget" are re-checked at the top
    /// of every attempt, the first included, so a request superseded before
    /// its first attempt never touches the code model. Invalidation is
    /// expected background churn and retries immediately, without backoff.
    async fn attempt_loop(&self, ctx: &RequestContext, data: &ResolveData) -> Result<Synthesized> {
        let mut attempts = 0u32;
        loop {
            if !self.latest.is_latest(ctx.request_id()) || ctx.is_cancelled() {
                tracing::debug!(
                    request = %ctx.request_id(),
                    outcome = "superseded",
                    attempts,
                    "resolution abandoned"
                );
                return Err(ResolveError::Superseded);
            }
            if ctx.deadline_exceeded() {
                tracing::debug!(
                    request = %ctx.request_id(),
                    outcome = "deadline",
                    attempts,
                    "resolution abandoned"
                );
                return Err(ResolveError::Superseded);
            }

            attempts += 1;
            match self.attempt(data).await {
                Ok(synthesized) => {
                    tracing::debug!(
                        request = %ctx.request_id(),
                        attempts,
                        files = synthesized.edits.file_count(),
                        "resolution succeeded"
                    );
                    return Ok(synthesized);
                }
                Err(AttemptError::Invalidated) => {
                    tracing::trace!(
                        request = %ctx.request_id(),
                        attempts,
                        "snapshot invalidated, retrying"
                    );
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
            }
        }
    }

    /// One pass against one snapshot. Any `Invalidated` bubbles out for the
    /// loop to retry; a missing module or symbol is a property of the
    /// request and terminal.
    async fn attempt(
        &self,
        data: &ResolveData,
    ) -> std::result::Result<Synthesized, AttemptError> {
        let snapshot = self.model.snapshot().await?;

        let module = snapshot
            .find_module(&data.module)
            .await?
            .ok_or_else(|| AttemptError::Fatal(ResolveError::UnknownModule(data.module.clone())))?;

        let name = data.import_target();
        let symbol = snapshot
            .find_exported_symbol(&module, name)
            .await?
            .ok_or_else(|| {
                AttemptError::Fatal(ResolveError::UnknownSymbol {
                    module: data.module.clone(),
                    symbol: name.to_string(),
                })
            })?;

        let target = ResolvedTarget { module, symbol };
        let synthesized = self
            .synthesis
            .synthesize(&target, snapshot.as_ref(), &data.file, data.offset)
            .await?;
        Ok(synthesized)
    }
}
