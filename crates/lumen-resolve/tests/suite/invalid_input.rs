use std::sync::Arc;

use pretty_assertions::assert_eq;

use lumen_model::{memory::ImportInserter, ModuleId};
use lumen_resolve::{ResolveError, Resolver};

use crate::support::{suggestion, util_model, CountingModel, ScriptedSynthesis};

#[tokio::test]
async fn unknown_module_fails_immediately_naming_the_id() {
    let counting = Arc::new(CountingModel::new(util_model()));
    let synthesis = Arc::new(ScriptedSynthesis::new());
    let resolver = Resolver::new(counting.clone(), synthesis.clone());

    let result = resolver
        .resolve(suggestion("Gone", "lib:missing", "Gone"))
        .await;

    assert_eq!(
        result,
        Err(ResolveError::UnknownModule(ModuleId::new("lib:missing")))
    );
    // Never retried, never synthesized.
    assert_eq!(counting.snapshot_calls(), 1);
    assert_eq!(synthesis.calls(), 0);
}

#[tokio::test]
async fn unknown_symbol_fails_immediately_naming_the_offender() {
    let counting = Arc::new(CountingModel::new(util_model()));
    let synthesis = Arc::new(ScriptedSynthesis::new());
    let resolver = Resolver::new(counting.clone(), synthesis.clone());

    let result = resolver.resolve(suggestion("Set", "lib:util", "Set")).await;

    assert_eq!(
        result,
        Err(ResolveError::UnknownSymbol {
            module: ModuleId::new("lib:util"),
            symbol: "Set".to_string(),
        })
    );
    assert_eq!(synthesis.calls(), 0);
}

#[tokio::test]
async fn dotted_symbol_resolves_its_leading_segment() {
    let counting = Arc::new(CountingModel::new(util_model()));
    counting.model.publish_module("lib:paint", "paint", ["Color"]);
    let synthesis = Arc::new(ScriptedSynthesis::new());
    let resolver = Resolver::new(counting.clone(), synthesis.clone());

    // `Color.RED` imports `Color`; only an unknown leading segment is an
    // input error.
    let ok = resolver
        .resolve(suggestion("Color.RED", "lib:paint", "Color.RED"))
        .await;
    assert!(ok.is_ok());

    let err = resolver
        .resolve(suggestion("Hue.RED", "lib:paint", "Hue.RED"))
        .await;
    assert_eq!(
        err,
        Err(ResolveError::UnknownSymbol {
            module: ModuleId::new("lib:paint"),
            symbol: "Hue".to_string(),
        })
    );
}

#[tokio::test]
async fn missing_analysis_context_is_an_infrastructure_error() {
    // The module resolves, but the file the request points at is not part
    // of the analyzed workspace.
    let model = util_model();
    let resolver = Resolver::new(Arc::new(model), Arc::new(ImportInserter));

    let mut sugg = suggestion("List", "lib:util", "List");
    if let Some(data) = sugg.data.as_mut() {
        data.file = "/ws/unknown.lum".into();
    }
    let result = resolver.resolve(sugg).await;

    match result {
        Err(ResolveError::Unavailable(msg)) => assert!(msg.contains("/ws/unknown.lum")),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}
