//! Staged pipeline integration tests
//!
//! Pre-analysis → precision-critical selection → refined run, driven
//! through [`StagedPipeline`] with programs built in memory or read from JSON.

mod common;

use codegraph_pta::config::{ConfigError, ContextKind, Preset, PtaConfig};
use codegraph_pta::features::points_to::domain::{Context, Local, TypeName};
use codegraph_pta::features::points_to::{CancellationToken, Program, StagedPipeline};
use codegraph_pta::PtaError;
use common::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn call_site_config() -> PtaConfig {
    main_config()
        .context_kind(ContextKind::CallSite)
        .k(1)
        .hk(0)
}

// ═══════════════════════════════════════════════════════════════════════════
// Precision-critical selection
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_only_polymorphic_caller_is_precision_critical() {
    let fx = fixture_polymorphic();
    let outcome = StagedPipeline::for_program(main_config(), fx.program.clone())
        .run()
        .unwrap();

    assert_eq!(outcome.pcm.len(), 1);
    assert!(outcome.pcm.contains(&fx.poly));
    assert!(outcome.precision.is_precision_critical(&fx.poly));
    assert!(!outcome.precision.is_precision_critical(&fx.mono));
    assert!(!outcome.precision.is_precision_critical(&fx.main));

    let polymorphic: Vec<_> = outcome.precision.polymorphic_sites().collect();
    assert_eq!(polymorphic.len(), 1);
    assert_eq!(polymorphic[0].method, fx.poly);
    assert_eq!(polymorphic[0].targets, 2);
    assert_eq!(polymorphic[0].receiver_types, 2);
}

#[test]
fn test_raised_threshold_selects_nothing() {
    let fx = fixture_polymorphic();
    let config = main_config().pcm_fanout_threshold(2);
    let outcome = StagedPipeline::for_program(config, fx.program.clone())
        .run()
        .unwrap();
    assert!(outcome.pcm.is_empty());
}

#[test]
fn test_pcm_is_subset_of_pre_analysis_reachable_methods() {
    let fx = fixture_polymorphic();
    let outcome = StagedPipeline::for_program(main_config(), fx.program.clone())
        .run()
        .unwrap();

    assert!(outcome.pcm.len() <= outcome.stats.reachable_methods);
    for method in outcome.pcm.iter() {
        assert!(outcome.solver.is_reachable(method).unwrap());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Refined run
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_refined_run_separates_calls_of_precision_critical_method() {
    let fx = fixture_polymorphic();
    let outcome = StagedPipeline::for_program(call_site_config(), fx.program.clone())
        .run()
        .unwrap();
    let solver = &outcome.solver;

    assert_points_to_sites(solver, &fx.main, fx.from_cat, &[&fx.cat]);
    assert_points_to_sites(solver, &fx.main, fx.from_dog, &[&fx.dog]);
}

#[test]
fn test_non_critical_methods_only_get_the_empty_context() {
    let fx = fixture_polymorphic();
    let outcome = StagedPipeline::for_program(call_site_config(), fx.program.clone())
        .run()
        .unwrap();

    for (method, context) in outcome.solver.reachable_contexts().unwrap() {
        if !outcome.pcm.contains(&method) {
            assert_eq!(context, Context::empty(), "{method} got a context");
        }
    }
    let poly_contexts = outcome
        .solver
        .reachable_contexts()
        .unwrap()
        .into_iter()
        .filter(|(m, _)| m == &fx.poly)
        .count();
    assert_eq!(poly_contexts, 2);
}

#[test]
fn test_refined_run_keeps_call_graph_of_pre_analysis() {
    let fx = fixture_polymorphic();
    let outcome = StagedPipeline::for_program(call_site_config(), fx.program.clone())
        .run()
        .unwrap();

    assert_eq!(
        outcome.solver.reachable_methods().unwrap().len(),
        outcome.pre_analysis.reachable_methods
    );
    assert_eq!(
        outcome.solver.callee_methods(&fx.poly).unwrap(),
        vec![sig("Cat", "speak()"), sig("Dog", "speak()")]
    );
    assert_eq!(
        outcome.solver.callee_methods(&fx.mono).unwrap(),
        vec![sig("Cat", "speak()")]
    );
}

#[test]
fn test_heap_merge_collapses_types_above_threshold() {
    let fx = fixture_mergeable();
    let config = main_config().heap_merge(true).heap_merge_threshold(1);
    let outcome = StagedPipeline::for_program(config, fx.program.clone())
        .run()
        .unwrap();
    let solver = &outcome.solver;

    assert!(solver.may_alias(&fx.main, fx.tokens.0, fx.tokens.1).unwrap());
    assert!(solver.may_alias(&fx.main, fx.points.0, fx.points.1).unwrap());
    assert!(!solver.may_alias(&fx.main, fx.tokens.0, fx.points.0).unwrap());
    assert!(solver.merged_object(&TypeName::new("Single")).unwrap().is_none());
    assert_eq!(solver.stats().objects, 3);
}

#[test]
fn test_heap_merge_off_keeps_one_object_per_site() {
    let fx = fixture_mergeable();
    let config = main_config().heap_merge(false);
    let outcome = StagedPipeline::for_program(config, fx.program.clone())
        .run()
        .unwrap();
    assert_eq!(outcome.solver.stats().objects, 5);
}

// ═══════════════════════════════════════════════════════════════════════════
// Statistics
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_pipeline_stats() {
    let fx = fixture_polymorphic();
    let outcome = StagedPipeline::for_program(main_config(), fx.program.clone())
        .run()
        .unwrap();
    let stats = &outcome.stats;

    assert_eq!(stats.reachable_methods, 5);
    assert_eq!(stats.precision_critical_methods, 1);
    assert_eq!(stats.context_insensitive_methods, 4);
    assert_eq!(stats.total_nodes, stats.cs_nodes + stats.ci_nodes);
    assert_eq!(stats.per_method_nodes.len(), 5);
    assert!(stats.per_method_nodes[&fx.poly.to_string()] > 0);
    assert!(stats.refined.is_some());

    let json = stats.to_json().unwrap();
    assert!(json.contains("\"precision_critical_methods\": 1"));
}

// ═══════════════════════════════════════════════════════════════════════════
// Inputs and failures
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_program_loaded_from_json() {
    let program = Arc::new(Program::from_json(fixture_json_program()).unwrap());
    let outcome = StagedPipeline::for_program(main_config(), program)
        .run()
        .unwrap();

    let main = sig("Main", "main()");
    let solver = &outcome.solver;
    assert!(solver.may_alias(&main, Local(0), Local(1)).unwrap());
    assert_eq!(
        solver.callee_methods(&main).unwrap(),
        vec![sig("Id", "id(A)")]
    );
}

#[test]
fn test_unknown_entry_point_is_reported() {
    let fx = fixture_dispatch();
    let config = PtaConfig::default().entry_points(["Main.absent()"]);
    let result = StagedPipeline::for_program(config, fx.program.clone()).run();
    assert!(matches!(result, Err(PtaError::UnknownEntryPoint(name)) if name == "Main.absent()"));
}

#[test]
fn test_invalid_config_is_rejected_before_analysis() {
    let fx = fixture_dispatch();
    let config = PtaConfig::from_preset(Preset::Precise)
        .k(9)
        .entry_points(["Main.main()"]);
    let result = StagedPipeline::for_program(config, fx.program.clone()).run();
    assert!(matches!(result, Err(PtaError::Config(ConfigError::Range { .. }))));
}

#[test]
fn test_cancelled_pipeline_returns_incomplete() {
    let fx = fixture_dispatch();
    let token = CancellationToken::new();
    token.cancel();
    let result = StagedPipeline::for_program(main_config(), fx.program.clone())
        .with_cancellation(token)
        .run();
    assert!(matches!(result, Err(PtaError::Incomplete(_))));
}
