//! End-to-end tests for the compile pipeline and the resolution surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wirebox::{ContainerBuilder, CoreError};

#[derive(Debug)]
struct Config {
    url: String,
}

#[derive(Debug)]
struct Database {
    url: String,
}

struct Cache;

trait Storage: Send + Sync {
    fn backend(&self) -> &'static str;
}

struct PgStore;
impl Storage for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}

struct MemStore;
impl Storage for MemStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[test]
fn test_independent_bindings_resolve() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|| Config {
        url: "db://a".into(),
    });
    builder.provide(|| Cache);

    let container = builder.build().unwrap();
    assert_eq!(container.binding_count(), 2);
    assert!(container.contains::<Config>());
    assert!(container.contains::<Cache>());

    assert_eq!(container.resolve::<Config>().unwrap().url, "db://a");
    assert!(container.resolve::<Cache>().is_ok());
}

#[test]
fn test_duplicate_binding_is_rejected() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|| Cache);
    builder.provide(|| Cache);

    let err = builder.build().unwrap_err();
    assert!(err.is_duplicate_binding());
    assert!(err.to_string().ends_with("already provided"));
}

#[test]
fn test_missing_dependency_is_rejected() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|config: Arc<Config>| Database {
        url: config.url.clone(),
    });

    let err = builder.build().unwrap_err();
    assert!(err.is_binding_not_found());
    assert!(err.to_string().starts_with("type "));
}

#[test]
fn test_dependency_chain_resolves_transitively() {
    struct Service {
        database: Arc<Database>,
    }

    let mut builder = ContainerBuilder::new();
    builder.provide(|| Config {
        url: "db://chain".into(),
    });
    builder.provide(|config: Arc<Config>| Database {
        url: config.url.clone(),
    });
    builder.provide(|database: Arc<Database>| Service { database });

    let container = builder.build().unwrap();
    let service = container.resolve::<Service>().unwrap();
    assert_eq!(service.database.url, "db://chain");

    // The dependency shares the memoized instance.
    let database = container.resolve::<Database>().unwrap();
    assert!(Arc::ptr_eq(&service.database, &database));
}

#[test]
fn test_indirect_cycle_fails_compilation() {
    struct A;
    struct B;
    struct C;

    let mut builder = ContainerBuilder::new();
    builder.provide(|_b: Arc<B>| A);
    builder.provide(|_c: Arc<C>| B);
    builder.provide(|_a: Arc<A>| C);

    let err = builder.build().unwrap_err();
    assert!(err.is_circular_dependency());
}

#[test]
fn test_self_cycle_fails_compilation() {
    struct Recursive;

    let mut builder = ContainerBuilder::new();
    builder.provide(|_self_dep: Arc<Recursive>| Recursive);

    assert!(builder.build().unwrap_err().is_circular_dependency());
}

#[test]
fn test_resolution_is_memoized_and_constructed_once() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = constructions.clone();

    let mut builder = ContainerBuilder::new();
    builder.provide(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Cache
    });

    let container = builder.build().unwrap();
    assert_eq!(constructions.load(Ordering::SeqCst), 0);

    let first = container.resolve::<Cache>().unwrap();
    let second = container.resolve::<Cache>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_construction_is_not_cached() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let mut builder = ContainerBuilder::new();
    builder.try_provide(move || -> Result<Database, std::io::Error> {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))
    });

    let container = builder.build().unwrap();

    let err = container.resolve::<Database>().unwrap_err();
    assert!(matches!(err, CoreError::ConstructionFailed { .. }));
    assert!(err.to_string().contains("connection refused"));

    // The failure is reported again rather than served from cache.
    assert!(container.resolve::<Database>().is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_fallible_constructor_success_path() {
    let mut builder = ContainerBuilder::new();
    builder.try_provide(|| -> Result<Config, std::io::Error> {
        Ok(Config {
            url: "db://ok".into(),
        })
    });

    let container = builder.build().unwrap();
    assert_eq!(container.resolve::<Config>().unwrap().url, "db://ok");
}

#[test]
fn test_modifiers_run_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut builder = ContainerBuilder::new();
    builder.provide(|| Cache);

    let first = order.clone();
    builder.modify(move |_cache: Arc<Cache>| {
        first.lock().unwrap().push(1);
    });
    let second = order.clone();
    builder.modify(move || {
        second.lock().unwrap().push(2);
    });

    builder.build().unwrap();
    assert_eq!(*order.lock().unwrap(), vec![1, 2]);
}

#[test]
fn test_modifier_shares_memoized_instances() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = constructions.clone();
    let seen = Arc::new(Mutex::new(None));

    let mut builder = ContainerBuilder::new();
    builder.provide(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Cache
    });

    let slot = seen.clone();
    builder.modify(move |cache: Arc<Cache>| {
        *slot.lock().unwrap() = Some(cache);
    });

    let container = builder.build().unwrap();
    let resolved = container.resolve::<Cache>().unwrap();
    let modifier_copy = seen.lock().unwrap().take().unwrap();

    assert!(Arc::ptr_eq(&resolved, &modifier_copy));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_modifier_aborts_compilation() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|| Cache);
    builder.modify(|_cache: Arc<Cache>| {});
    builder.try_modify(|| -> Result<(), std::io::Error> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "setup failed"))
    });

    let err = builder.build().unwrap_err();
    match err {
        CoreError::ModifierFailed { index, source } => {
            assert_eq!(index, 1);
            assert!(source.to_string().contains("setup failed"));
        }
        other => panic!("expected ModifierFailed, got {other}"),
    }
}

#[test]
fn test_value_provider_is_unimplemented() {
    let mut builder = ContainerBuilder::new();
    builder.provide_value(Config {
        url: "db://literal".into(),
    });

    assert!(matches!(
        builder.build(),
        Err(CoreError::UnimplementedProviderKind)
    ));
}

#[test]
fn test_named_bindings_resolve_by_name_only() {
    let mut builder = ContainerBuilder::new();
    builder
        .provide(|| Config {
            url: "db://replica".into(),
        })
        .named("replica");

    let container = builder.build().unwrap();
    assert!(container.contains_named::<Config>("replica"));
    assert!(!container.contains::<Config>());

    let replica = container.resolve_named::<Config>("replica").unwrap();
    assert_eq!(replica.url, "db://replica");

    assert!(container.resolve::<Config>().unwrap_err().is_binding_not_found());
}

#[test]
fn test_named_and_unnamed_bindings_coexist() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|| Config {
        url: "db://primary".into(),
    });
    builder
        .provide(|| Config {
            url: "db://replica".into(),
        })
        .named("replica");

    let container = builder.build().unwrap();
    assert_eq!(container.resolve::<Config>().unwrap().url, "db://primary");
    assert_eq!(
        container.resolve_named::<Config>("replica").unwrap().url,
        "db://replica"
    );
}

#[test]
fn test_capability_lookup_prefers_first_claimant() {
    let mut builder = ContainerBuilder::new();
    builder
        .provide(|| PgStore)
        .implements(|store: Arc<PgStore>| store as Arc<dyn Storage>);
    builder
        .provide(|| MemStore)
        .implements(|store: Arc<MemStore>| store as Arc<dyn Storage>);

    let container = builder.build().unwrap();
    assert!(container.contains::<dyn Storage>());

    let storage = container.resolve::<dyn Storage>().unwrap();
    assert_eq!(storage.backend(), "postgres");
}

#[test]
fn test_capability_dependency_is_wired() {
    struct Repo {
        storage: Arc<dyn Storage>,
    }

    let mut builder = ContainerBuilder::new();
    builder
        .provide(|| MemStore)
        .implements(|store: Arc<MemStore>| store as Arc<dyn Storage>);
    builder.provide(|storage: Arc<dyn Storage>| Repo { storage });

    let container = builder.build().unwrap();
    let repo = container.resolve::<Repo>().unwrap();
    assert_eq!(repo.storage.backend(), "memory");

    // The capability view and the concrete binding share one instance.
    let concrete = container.resolve::<MemStore>().unwrap();
    let via_capability = container.resolve::<dyn Storage>().unwrap();
    assert_eq!(via_capability.backend(), "memory");
    assert!(Arc::ptr_eq(&repo.storage, &via_capability));
    drop(concrete);
}

#[test]
fn test_populate_writes_resolved_instance() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|| Config {
        url: "db://populated".into(),
    });

    let container = builder.build().unwrap();
    let mut slot: Option<Arc<Config>> = None;
    container.populate(&mut slot).unwrap();

    assert_eq!(slot.unwrap().url, "db://populated");
}

#[test]
fn test_populate_named() {
    let mut builder = ContainerBuilder::new();
    builder
        .provide(|| Config {
            url: "db://replica".into(),
        })
        .named("replica");

    let container = builder.build().unwrap();
    let mut slot: Option<Arc<Config>> = None;
    container.populate_named("replica", &mut slot).unwrap();

    assert_eq!(slot.unwrap().url, "db://replica");
}

#[test]
fn test_populate_capability_slot() {
    let mut builder = ContainerBuilder::new();
    builder
        .provide(|| PgStore)
        .implements(|store: Arc<PgStore>| store as Arc<dyn Storage>);

    let container = builder.build().unwrap();
    let mut slot: Option<Arc<dyn Storage>> = None;
    container.populate(&mut slot).unwrap();

    assert_eq!(slot.unwrap().backend(), "postgres");
}

#[test]
fn test_populate_any_fills_erased_slot() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|| Config {
        url: "db://erased".into(),
    });

    let container = builder.build().unwrap();
    let mut slot: Option<Arc<Config>> = None;
    container.populate_any(&mut slot).unwrap();

    assert_eq!(slot.unwrap().url, "db://erased");
}

#[test]
fn test_populate_any_rejects_unknown_target_without_mutation() {
    let mut builder = ContainerBuilder::new();
    builder.provide(|| Cache);

    let container = builder.build().unwrap();

    let mut unregistered: Option<Arc<Config>> = None;
    let err = container.populate_any(&mut unregistered).unwrap_err();
    assert!(matches!(err, CoreError::InvalidPopulateTarget { .. }));
    assert!(unregistered.is_none());

    let mut not_a_slot = String::from("untouched");
    let err = container.populate_any(&mut not_a_slot).unwrap_err();
    assert!(matches!(err, CoreError::InvalidPopulateTarget { .. }));
    assert_eq!(not_a_slot, "untouched");
}

#[test]
fn test_compilation_failure_produces_no_container() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let mut builder = ContainerBuilder::new();
    builder.provide(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Cache
    });
    builder.provide(|| Cache);

    assert!(builder.build().is_err());
    // Nothing was instantiated on the way down.
    assert_eq!(built.load(Ordering::SeqCst), 0);
}
