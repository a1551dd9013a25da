//! Unit tests for the loading pipeline.

use std::collections::BTreeSet;
use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::boundary::MockBoundaryOpener;
use crate::error::{FailureKind, LookupError};
use crate::resolver::MockNameResolver;
use crate::strategy::{MockInstantiationStrategy, WithArguments};
use crate::tests::{Greeter, GreeterCapability, declarations_scope, greeter_scope};

fn names(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn resolving(values: &[&str]) -> MockNameResolver {
    let candidates = names(values);
    let mut resolver = MockNameResolver::new();
    resolver
        .expect_resolve()
        .returning(move |_, _| Ok(candidates.clone()));
    resolver
}

fn opening_declarations() -> MockBoundaryOpener {
    let mut opener = MockBoundaryOpener::new();
    opener
        .expect_open()
        .times(1)
        .returning(|_| Ok(Boundary::delegating(Arc::new(declarations_scope("loader")))));
    opener
}

fn scope_source() -> Source {
    Source::scope(declarations_scope("source"))
}

fn greetings(result: &LoadResult<Box<dyn Greeter>>) -> Vec<String> {
    result
        .instances()
        .map(|plugin| plugin.get().expect("live").greet())
        .collect()
}

// ---------------------------------------------------------------------------
// Boundary policy
// ---------------------------------------------------------------------------

#[test]
fn sources_without_candidates_never_open_a_boundary() {
    let mut opener = MockBoundaryOpener::new();
    opener.expect_open().times(0);
    let loader = PluginLoader::new(resolving(&[]), opener, DefaultConstructor);

    let result = loader
        .load::<GreeterCapability>(&scope_source())
        .expect("load succeeds");

    assert!(result.is_empty());
    assert!(result.boundaries().is_empty());
}

#[test]
fn resolver_errors_escalate() {
    let mut resolver = MockNameResolver::new();
    resolver
        .expect_resolve()
        .returning(|_, _| Err(LoadError::malformed("broken.plugin", "unreadable manifest")));
    let mut opener = MockBoundaryOpener::new();
    opener.expect_open().times(0);
    let loader = PluginLoader::new(resolver, opener, DefaultConstructor);

    let error = loader
        .load::<GreeterCapability>(&Source::archive("broken.plugin"))
        .expect_err("resolution fails");
    assert!(error.is_per_source());
}

#[test]
fn opener_errors_escalate() {
    let mut opener = MockBoundaryOpener::new();
    opener
        .expect_open()
        .returning(|_| Err(LoadError::malformed("broken.plugin", "not a library")));
    let loader = PluginLoader::new(resolving(&["ENGLISH"]), opener, DefaultConstructor);

    let error = loader
        .load::<GreeterCapability>(&Source::archive("broken.plugin"))
        .expect_err("opening fails");
    assert!(error.to_string().contains("not a library"), "{error}");
}

#[test]
fn each_load_owns_one_boundary() {
    let loader = PluginLoader::new(
        resolving(&["ENGLISH"]),
        opening_declarations(),
        DefaultConstructor,
    );

    let result = loader
        .load::<GreeterCapability>(&scope_source())
        .expect("load succeeds");

    assert_eq!(result.boundaries().len(), 1);
    let boundary = result.boundaries().first().expect("one boundary");
    let plugin = result.instances().next().expect("one instance");
    assert_eq!(plugin.boundary_id(), Some(boundary.id()));
    assert_eq!(plugin.origin(), Some(boundary.origin()));
}

// ---------------------------------------------------------------------------
// Candidate outcomes
// ---------------------------------------------------------------------------

#[test]
fn single_valid_candidate_loads() {
    let loader = PluginLoader::new(
        resolving(&["ENGLISH"]),
        opening_declarations(),
        DefaultConstructor,
    );

    let result = loader
        .load::<GreeterCapability>(&scope_source())
        .expect("load succeeds");

    assert_eq!(result.success_count(), 1);
    assert_eq!(result.failure_count(), 0);
    assert_eq!(greetings(&result), vec!["hello"]);
}

#[rstest]
#[case::unknown_symbol("MISSING", FailureKind::SymbolNotFound)]
#[case::other_capability("SORTER", FailureKind::TypeMismatch)]
#[case::constructor_error("FAILING", FailureKind::Instantiation)]
#[case::constructor_panic("PANICKING", FailureKind::Instantiation)]
#[case::wrong_instance("WRONG_TYPE", FailureKind::Instantiation)]
#[case::no_constructor("ABSTRACT", FailureKind::Instantiation)]
fn bad_candidates_are_recorded_beside_good_ones(
    #[case] bad: &'static str,
    #[case] expected: FailureKind,
) {
    let loader = PluginLoader::new(
        resolving(&["ENGLISH", bad]),
        opening_declarations(),
        DefaultConstructor,
    );

    let result = loader
        .load::<GreeterCapability>(&scope_source())
        .expect("load succeeds");

    assert_eq!(result.success_count(), 1);
    let failure = result.failures().next().expect("one failure");
    assert_eq!(failure.kind(), expected);
    assert_eq!(failure.name(), Some(bad));
}

#[test]
fn wrong_instance_type_names_the_expected_type() {
    let loader = PluginLoader::new(
        resolving(&["WRONG_TYPE"]),
        opening_declarations(),
        DefaultConstructor,
    );

    let result = loader
        .load::<GreeterCapability>(&scope_source())
        .expect("load succeeds");

    let failure = result.failures().next().expect("one failure");
    assert!(matches!(
        failure,
        PluginFailure::Instantiation {
            cause: InstantiationError::WrongInstanceType { .. },
            ..
        }
    ));
}

#[test]
fn archive_failures_carry_the_archive_path() {
    let loader = PluginLoader::new(
        resolving(&["MISSING"]),
        opening_declarations(),
        DefaultConstructor,
    );

    let result = loader
        .load::<GreeterCapability>(&Source::archive("/plugins/greeters.plugin"))
        .expect("load succeeds");

    let failure = result.failures().next().expect("one failure");
    assert_eq!(failure.path(), Some(Path::new("/plugins/greeters.plugin")));
    assert!(matches!(
        failure,
        PluginFailure::SymbolNotFound {
            cause: LookupError::NotFound { .. },
            ..
        }
    ));
}

#[test]
fn strategy_receives_resolved_types() {
    let mut strategy = MockInstantiationStrategy::new();
    strategy
        .expect_instantiate()
        .withf(|plugin| plugin.name() == "ENGLISH")
        .times(1)
        .returning(|plugin| {
            plugin
                .constructor()
                .ok_or_else(|| InstantiationError::MissingConstructor {
                    name: plugin.name().to_owned(),
                })
                .and_then(|constructor| {
                    constructor().map_err(|message| InstantiationError::ConstructorFailed {
                        name: plugin.name().to_owned(),
                        message,
                    })
                })
        });
    let loader = PluginLoader::new(resolving(&["ENGLISH"]), opening_declarations(), strategy);

    let result = loader
        .load::<GreeterCapability>(&scope_source())
        .expect("load succeeds");
    assert_eq!(greetings(&result), vec!["hello"]);
}

#[test]
fn argument_strategy_reaches_argument_constructors() {
    let loader = PluginLoader::new(
        resolving(&["NAMED"]),
        opening_declarations(),
        WithArguments::new("Grace".to_owned()),
    );

    let result = loader
        .load::<GreeterCapability>(&scope_source())
        .expect("load succeeds");
    assert_eq!(greetings(&result), vec!["hello Grace"]);
}

// ---------------------------------------------------------------------------
// Default wiring
// ---------------------------------------------------------------------------

#[test]
fn scope_loader_reads_service_descriptors() {
    let loader = PluginLoader::for_scopes();
    let source = Source::scope(greeter_scope(&["ENGLISH", "SORTER"]));

    let result = loader
        .load::<GreeterCapability>(&source)
        .expect("load succeeds");

    assert_eq!(greetings(&result), vec!["hello"]);
    assert_eq!(
        result.failures().map(PluginFailure::kind).collect::<Vec<_>>(),
        vec![FailureKind::TypeMismatch]
    );
    assert!(!result.boundaries().iter().any(Boundary::is_isolated));
}

#[test]
fn releasing_the_result_stales_its_instances() {
    let loader = PluginLoader::for_scopes();
    let source = Source::scope(greeter_scope(&["ENGLISH"]));
    let mut result = loader
        .load::<GreeterCapability>(&source)
        .expect("load succeeds");

    result.release();

    let plugin = result.instances().next().expect("one instance");
    assert!(!plugin.is_live());
    assert!(plugin.get().is_err());
}
