//! 分阶段容器与入口调用器的集成测试

use di_abstractions::{
    Binder, BinderExt, Binding, ContainerStage, DeferredSlot, DependencyKey, EntryPoint, Module,
    Resolver, ResolverExt, Runnable, SlotProvider, StagePolicy,
};
use di_impl::{invoke_entry_point, StageContainer};
use infrastructure_common::{
    ConfigurationError, DependencyError, InfrastructureError, SlotKind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn module<F>(f: F) -> Arc<dyn Module>
where
    F: Fn(&mut dyn Binder) -> Result<(), ConfigurationError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Debug, PartialEq)]
struct Greeting(String);

#[test]
fn test_child_binding_shadows_parent() {
    let init = StageContainer::root(
        StagePolicy::Development,
        &[module(|b| b.bind_instance(Greeting("init".into())))],
    )
    .unwrap();
    let env = init
        .create_child(
            ContainerStage::Environment,
            &[module(|b| b.bind_instance(Greeting("environment".into())))],
        )
        .unwrap();

    assert_eq!(*env.get::<Greeting>().unwrap(), Greeting("environment".into()));
    assert_eq!(*init.get::<Greeting>().unwrap(), Greeting("init".into()));
}

#[test]
fn test_lookup_falls_back_to_parent() {
    let init = StageContainer::root(
        StagePolicy::Development,
        &[module(|b| b.bind_named_instance("port", 8080_u16))],
    )
    .unwrap();
    let env = init.create_child(ContainerStage::Environment, &[]).unwrap();
    let modules = env.create_child(ContainerStage::Module, &[]).unwrap();

    assert_eq!(*modules.get_named::<u16>("port").unwrap(), 8080);
    assert!(modules.contains(&DependencyKey::named::<u16>("port")));
    assert!(!modules.binds_locally(&DependencyKey::named::<u16>("port")));

    let err = modules.get::<u16>().unwrap_err();
    assert!(matches!(err, DependencyError::BindingNotFound { .. }));
}

#[test]
fn test_duplicate_binding_in_one_stage_is_rejected() {
    let err = StageContainer::root(
        StagePolicy::Development,
        &[
            module(|b| b.bind_instance(1_u8)),
            module(|b| b.bind_instance(2_u8)),
        ],
    )
    .unwrap_err();

    assert!(matches!(err, ConfigurationError::DuplicateBinding { .. }));
}

#[test]
fn test_stage_order_is_enforced() {
    let init = StageContainer::root(StagePolicy::Development, &[]).unwrap();

    let err = init.create_child(ContainerStage::Module, &[]).unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidStageTransition { .. }));
}

#[test]
fn test_production_creates_eager_singletons_at_build() {
    for (policy, expected) in [
        (StagePolicy::Production, 1),
        (StagePolicy::Development, 0),
        (StagePolicy::Tool, 0),
    ] {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let container = StageContainer::root(
            policy,
            &[module(move |b| {
                let counter = Arc::clone(&counter);
                b.bind_eager_singleton(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Greeting("eager".into()))
                })
            })],
        )
        .unwrap();

        assert_eq!(created.load(Ordering::SeqCst), expected, "{policy:?}");
        container.get::<Greeting>().unwrap();
        container.get::<Greeting>().unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1, "{policy:?}");
    }
}

#[test]
fn test_deferred_slot_binding_reports_not_yet_available() {
    let slot = Arc::new(DeferredSlot::<String>::new(SlotKind::Environment));
    let provider = Arc::clone(&slot);
    let container = StageContainer::root(
        StagePolicy::Production,
        &[module(move |b| {
            b.bind(Binding::new(
                DependencyKey::of::<String>(),
                Arc::new(SlotProvider::new(Arc::clone(&provider))),
            ))
        })],
    )
    .unwrap();

    let err = container.get::<String>().unwrap_err();
    assert!(err.is_not_yet_available());

    slot.set(Arc::new("ready".to_string())).unwrap();
    assert_eq!(container.get::<String>().unwrap().as_str(), "ready");
}

#[test]
fn test_module_can_read_parent_stage() {
    let init = StageContainer::root(
        StagePolicy::Development,
        &[module(|b| b.bind_named_instance("workers", 4_usize))],
    )
    .unwrap();
    let env = init
        .create_child(
            ContainerStage::Environment,
            &[module(|b| {
                let workers = b
                    .parent()
                    .and_then(|p| p.get_named::<usize>("workers").ok())
                    .map_or(1, |w| *w);
                b.bind_instance(Greeting(format!("{workers} workers")))
            })],
        )
        .unwrap();

    assert_eq!(env.get::<Greeting>().unwrap().0, "4 workers");
}

struct BaseCommand {
    seen: Mutex<Vec<String>>,
}

impl Runnable for BaseCommand {
    fn entry_point(&self) -> Option<EntryPoint<'_>> {
        Some(
            EntryPoint::builder("base")
                .named::<String>("db.host")
                .optional_named::<u16>("db.port")
                .invoke(move |args| {
                    let host = args.get::<String>(0)?;
                    let port = args.optional::<u16>(1)?.map_or(0, |p| *p);
                    self.seen
                        .lock()
                        .unwrap()
                        .push(format!("{}:{}", host.as_str(), port));
                    Ok(())
                }),
        )
    }
}

struct DerivedCommand {
    base: BaseCommand,
}

impl Runnable for DerivedCommand {
    fn parent(&self) -> Option<&dyn Runnable> {
        Some(&self.base)
    }
}

struct NoEntryCommand;

impl Runnable for NoEntryCommand {}

struct CountingResolver {
    calls: AtomicUsize,
}

impl Resolver for CountingResolver {
    fn resolve(
        &self,
        key: &DependencyKey,
    ) -> Result<di_abstractions::Provided, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DependencyError::BindingNotFound {
            key: key.to_string(),
        })
    }

    fn contains(&self, _key: &DependencyKey) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        false
    }
}

#[test]
fn test_entry_point_is_found_on_parent_command() {
    let container = StageContainer::root(
        StagePolicy::Development,
        &[module(|b| b.bind_named_instance("db.host", "db.local".to_string()))],
    )
    .unwrap();
    let command = DerivedCommand {
        base: BaseCommand {
            seen: Mutex::new(Vec::new()),
        },
    };

    invoke_entry_point(&command, &*container).unwrap();

    assert_eq!(*command.base.seen.lock().unwrap(), vec!["db.local:0".to_string()]);
}

#[test]
fn test_missing_entry_point_fails_before_resolution() {
    let resolver = CountingResolver {
        calls: AtomicUsize::new(0),
    };

    let err = invoke_entry_point(&NoEntryCommand, &resolver).unwrap_err();

    match err {
        InfrastructureError::ConfigurationError {
            source: ConfigurationError::EntryPointNotFound { type_name },
        } => assert!(type_name.ends_with("NoEntryCommand")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

struct WideCommand;

impl Runnable for WideCommand {
    fn entry_point(&self) -> Option<EntryPoint<'_>> {
        Some(
            EntryPoint::builder("wide")
                .named::<String>("db.host")
                .named::<String>(" ")
                .param::<u64>()
                .optional::<u32>()
                .invoke(|_| panic!("入口不应被调用")),
        )
    }
}

#[test]
fn test_all_parameter_failures_are_reported_together() {
    let container = StageContainer::root(StagePolicy::Development, &[]).unwrap();

    let err = invoke_entry_point(&WideCommand, &*container).unwrap_err();

    match err {
        InfrastructureError::ResolutionError { source } => {
            let indices: Vec<usize> = source.failures.iter().map(|f| f.index).collect();
            assert_eq!(indices, vec![1, 0, 2]);
            assert!(matches!(
                source.failures[0].error,
                DependencyError::InvalidQualifier { .. }
            ));
            assert_eq!(source.entry_point, "wide");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_not_yet_available_is_not_a_resolution_error() {
    let slot = Arc::new(DeferredSlot::<String>::new(SlotKind::Configuration));
    let provider = Arc::clone(&slot);
    let container = StageContainer::root(
        StagePolicy::Development,
        &[module(move |b| {
            b.bind(Binding::new(
                DependencyKey::named::<String>("db.host"),
                Arc::new(SlotProvider::new(Arc::clone(&provider))),
            ))
        })],
    )
    .unwrap();
    let command = BaseCommand {
        seen: Mutex::new(Vec::new()),
    };

    let err = invoke_entry_point(&command, &*container).unwrap_err();

    assert!(matches!(
        err,
        InfrastructureError::DependencyError {
            source: DependencyError::NotYetAvailable {
                slot: SlotKind::Configuration
            }
        }
    ));
}
