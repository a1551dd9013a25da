//! End-to-end loading through code scopes, results, and the registry.

use rstest::{fixture, rstest};

use super::{Greeter, GreeterCapability, NAMED, declarations_scope, greeter_scope, memory_url};
use crate::error::FailureKind;
use crate::loader::PluginLoader;
use crate::plugin::Plugin;
use crate::registry::PluginRegistry;
use crate::resolver::ServiceDescriptorResolver;
use crate::result::{LoadResult, PluginRecord};
use crate::scope::{MergedScope, Source, StaticScope};
use crate::strategy::WithArguments;

#[derive(Debug)]
struct Builtin;

impl Greeter for Builtin {
    fn greet(&self) -> String {
        "hello from the host".to_owned()
    }
}

/// A host root listing `ENGLISH` and a vendor root listing `NAMED`.
#[fixture]
fn merged() -> Source {
    let vendor = StaticScope::new(memory_url("vendor"))
        .with_declaration(&NAMED)
        .with_resource("META-INF/services/greeter", "NAMED\n");
    Source::scope(
        MergedScope::new(memory_url("merged"))
            .with_root(greeter_scope(&["ENGLISH"]))
            .with_root(vendor),
    )
}

fn greetings(result: &LoadResult<Box<dyn Greeter>>) -> Vec<String> {
    result
        .instances()
        .map(|plugin| plugin.get().expect("live").greet())
        .collect()
}

#[rstest]
fn descriptors_from_every_root_are_candidates(merged: Source) {
    let result = PluginLoader::for_scopes()
        .load::<GreeterCapability>(&merged)
        .expect("load succeeds");

    assert_eq!(greetings(&result), vec!["hello"]);
    let failure = result.failures().next().expect("NAMED fails");
    assert_eq!(failure.name(), Some("NAMED"));
    assert_eq!(failure.kind(), FailureKind::Instantiation);
}

#[rstest]
fn origin_filters_hide_foreign_descriptors(merged: Source) {
    let resolver = ServiceDescriptorResolver::default()
        .with_origin_filter(|origin| !origin.path().starts_with("/vendor/"));
    let result = PluginLoader::for_scopes()
        .with_resolver(resolver)
        .load::<GreeterCapability>(&merged)
        .expect("load succeeds");

    assert_eq!(result.records().len(), 1);
    assert_eq!(greetings(&result), vec!["hello"]);
}

#[test]
fn merged_results_release_together() {
    let loader = PluginLoader::for_scopes();
    let mut combined = loader
        .load::<GreeterCapability>(&Source::scope(greeter_scope(&["ENGLISH"])))
        .expect("first load");
    let named = PluginLoader::for_scopes()
        .with_strategy(WithArguments::new("Lin".to_owned()))
        .load::<GreeterCapability>(&Source::scope(greeter_scope(&["NAMED"])))
        .expect("second load");
    combined.merge(named);
    combined.add_instance("BUILTIN", Box::new(Builtin) as Box<dyn Greeter>);

    assert_eq!(
        greetings(&combined),
        vec!["hello", "hello Lin", "hello from the host"]
    );
    assert_eq!(combined.boundaries().len(), 2);

    combined.release();
    let live: Vec<&str> = combined
        .instances()
        .filter(|plugin| plugin.is_live())
        .map(Plugin::name)
        .collect();
    assert_eq!(live, vec!["BUILTIN"]);
}

#[test]
fn loaded_instances_feed_the_registry() {
    let result = PluginLoader::for_scopes()
        .load::<GreeterCapability>(&Source::scope(greeter_scope(&["ENGLISH", "FAILING"])))
        .expect("load succeeds");
    let (records, boundaries) = result.into_parts();

    let mut registry: PluginRegistry<Plugin<Box<dyn Greeter>>> = PluginRegistry::by_name();
    let added = registry.register_all(records.into_iter().filter_map(|record| match record {
        PluginRecord::Instance(plugin) => Some(plugin),
        PluginRecord::Failure(_) => None,
    }));
    registry.register(Plugin::unbound("BUILTIN", Box::new(Builtin) as Box<dyn Greeter>));

    assert_eq!(added, vec!["ENGLISH"]);
    assert_eq!(registry.missing(["ENGLISH", "FAILING", "BUILTIN"]), vec!["FAILING"]);
    let english = registry.get("ENGLISH").expect("registered");
    assert_eq!(english.get().expect("live").greet(), "hello");
    assert!(english.origin().is_some());

    drop(boundaries);
    let stale = registry.get("ENGLISH").expect("still registered");
    assert!(stale.get().is_err());
    let builtin = registry.get("BUILTIN").expect("registered");
    assert!(builtin.is_live());
}

#[test]
fn scopes_without_descriptors_load_nothing() {
    let result = PluginLoader::for_scopes()
        .load::<GreeterCapability>(&Source::scope(declarations_scope("bare")))
        .expect("load succeeds");
    assert!(result.is_empty());
    assert!(result.boundaries().is_empty());
}
