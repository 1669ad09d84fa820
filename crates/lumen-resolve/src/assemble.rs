//! Turning a successful attempt's edits into the caller-facing response.

use lumen_core::EditSet;
use lumen_model::Synthesized;

use crate::{DeferredCommand, EnrichedSuggestion, ResolveData, UnresolvedSuggestion};

/// Assemble the response for a successful attempt.
///
/// Edits touching the request's primary file are returned inline; edits to
/// any other file are wrapped in a [`DeferredCommand`], omitted entirely
/// when empty. Together they are exactly the synthesized edit set; nothing
/// is dropped or duplicated.
pub(crate) fn assemble(
    suggestion: &UnresolvedSuggestion,
    data: &ResolveData,
    synthesized: Synthesized,
) -> EnrichedSuggestion {
    let Synthesized { edits, prefix } = synthesized;

    let (label, insert_text) = match prefix {
        Some(prefix) => (
            format!("{prefix}.{}", suggestion.label),
            format!("{prefix}.{}", suggestion.insert_text),
        ),
        None => (suggestion.label.clone(), suggestion.insert_text.clone()),
    };

    let mut inline_edits = Vec::new();
    let mut other_files = EditSet::new();
    for (file, edits) in edits {
        if file == data.file {
            inline_edits.extend(edits);
        } else {
            for edit in edits {
                other_files.push(file.clone(), edit);
            }
        }
    }
    let deferred_command =
        (!other_files.is_empty()).then(|| DeferredCommand::apply_import_edits(other_files));

    let detail = match (&suggestion.import_note, &suggestion.detail) {
        (Some(note), Some(detail)) => Some(format!("{note}\n{detail}")),
        (Some(note), None) => Some(note.clone()),
        (None, detail) => detail.clone(),
    };

    EnrichedSuggestion {
        label,
        insert_text,
        detail,
        inline_edits,
        deferred_command,
    }
}
