//! 配置路径绑定测试

use super::super::*;
use config_abstractions::ConfigNode;
use di_abstractions::{Binder, DeferredSlot, Module, ResolverExt, StagePolicy};
use di_impl::StageContainer;
use infrastructure_common::{ConfigurationError, DependencyError, SlotKind};
use std::sync::Arc;

mod app {
    use super::vendor::VendorConfig;
    use config_abstractions::ConfigNode;
    use serde::Deserialize;

    #[derive(ConfigNode, Deserialize)]
    pub struct CommonConfig {
        pub region: String,
    }

    #[derive(ConfigNode, Deserialize)]
    pub struct DbConfig {
        pub host: String,
        pub port: u16,
    }

    #[derive(ConfigNode, Deserialize)]
    pub struct CacheConfig {
        pub ttl_secs: u64,
    }

    #[derive(ConfigNode, Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum Mode {
        Fast,
        Safe,
    }

    #[derive(ConfigNode, Deserialize)]
    pub struct AppConfig {
        #[config(base)]
        #[serde(flatten)]
        pub common: CommonConfig,
        pub name: String,
        #[config(nested)]
        pub db: DbConfig,
        #[config(nested)]
        pub replica: DbConfig,
        #[config(nested)]
        pub cache: Option<CacheConfig>,
        #[config(nested)]
        pub mode: Mode,
        #[config(nested)]
        pub vendor: VendorConfig,
    }
}

mod vendor {
    use config_abstractions::ConfigNode;
    use serde::Deserialize;

    #[derive(ConfigNode, Deserialize)]
    pub struct VendorConfig {
        pub endpoint: String,
    }
}

mod graph {
    use config_abstractions::ConfigNode;

    #[derive(ConfigNode)]
    pub struct Left {
        pub label: String,
        #[config(nested)]
        pub right: Option<Box<Right>>,
    }

    #[derive(ConfigNode)]
    pub struct Right {
        pub weight: u32,
        #[config(nested)]
        pub left: Option<Box<Left>>,
    }

    #[derive(ConfigNode)]
    pub struct Chain {
        pub name: String,
        #[config(nested)]
        pub next: Option<Box<Chain>>,
    }
}

use app::*;

fn sample(cache: Option<CacheConfig>) -> AppConfig {
    AppConfig {
        common: CommonConfig {
            region: "cn-north".into(),
        },
        name: "wiring".into(),
        db: DbConfig {
            host: "db.local".into(),
            port: 5432,
        },
        replica: DbConfig {
            host: "replica.local".into(),
            port: 5433,
        },
        cache,
        mode: Mode::Fast,
        vendor: vendor::VendorConfig {
            endpoint: "https://vendor".into(),
        },
    }
}

fn app_packages() -> Vec<String> {
    vec![std::any::type_name::<AppConfig>()
        .rsplit_once("::")
        .map(|(package, _)| package.to_string())
        .unwrap_or_default()]
}

fn names(binder: &ConfigPathBinder) -> Vec<&str> {
    binder.paths().iter().map(|path| path.name()).collect()
}

fn build_container(
    binder: Arc<ConfigPathBinder>,
    slot: Arc<DeferredSlot<AppConfig>>,
) -> Arc<StageContainer> {
    let module: Arc<dyn Module> = Arc::new(move |b: &mut dyn Binder| {
        binder.install(b, slot.clone())
    });
    StageContainer::root(StagePolicy::Development, &[module]).unwrap()
}

#[test]
fn test_paths_follow_field_order_and_package_filter() {
    let binder = ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap();

    assert_eq!(
        names(&binder),
        vec![
            "region",
            "name",
            "db",
            "db.host",
            "db.port",
            "replica",
            "cache",
            "cache.ttl_secs",
            "mode",
            "vendor",
        ]
    );
}

#[test]
fn test_repeated_type_is_bound_but_expanded_once() {
    let binder = ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap();

    let replica = binder.path("replica").unwrap();
    assert!(replica.leaf_type().is::<DbConfig>());
    assert!(binder.path("replica.host").is_none());
}

#[test]
fn test_out_of_package_and_enum_fields_are_leaves() {
    let binder = ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap();

    assert!(binder.path("vendor").is_some());
    assert!(binder.path("vendor.endpoint").is_none());
    assert!(binder.path("mode").unwrap().leaf_type().is::<Mode>());
}

#[test]
fn test_default_package_is_root_package() {
    let binder = ConfigPathBinder::new::<AppConfig>(&[]).unwrap();

    assert_eq!(binder.packages(), app_packages().as_slice());
    assert!(binder.path("vendor.endpoint").is_none());
}

#[test]
fn test_broader_package_expands_vendor_types() {
    let packages = vec!["config_impl::tests".to_string()];
    let binder = ConfigPathBinder::new::<AppConfig>(&packages).unwrap();

    assert!(binder.path("vendor.endpoint").is_some());
}

#[test]
fn test_cyclic_graphs_terminate() {
    let chain = ConfigPathBinder::new::<graph::Chain>(&[]).unwrap();
    assert_eq!(names(&chain), vec!["name", "next"]);

    let mutual = ConfigPathBinder::new::<graph::Left>(&[]).unwrap();
    assert_eq!(
        names(&mutual),
        vec!["label", "right", "right.weight", "right.left"]
    );
}

#[test]
fn test_binding_path_records_declaring_types() {
    let binder = ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap();

    let host = binder.path("db.host").unwrap();
    assert_eq!(host.segments(), vec!["db", "host"]);
    let declaring = host.declaring_types();
    assert!(declaring[0].is::<AppConfig>());
    assert!(declaring[1].is::<DbConfig>());
    assert!(host.leaf_type().is::<String>());

    let region = binder.path("region").unwrap();
    assert!(region.declaring_types()[0].is::<CommonConfig>());
}

#[test]
fn test_accessor_rejects_unknown_fields() {
    let binder = ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap();

    let err = binder.accessor("db.hots").unwrap_err();
    match err {
        ConfigurationError::FieldNotFound { field, type_name } => {
            assert_eq!(field, "hots");
            assert!(type_name.ends_with("DbConfig"));
        }
        other => panic!("意外的错误: {other}"),
    }

    assert!(matches!(
        binder.accessor("db.port.value"),
        Err(ConfigurationError::FieldNotFound { .. })
    ));
    assert!(matches!(
        binder.accessor("db..host"),
        Err(ConfigurationError::InvalidPath { .. })
    ));
    assert!(binder.accessor("replica.host").is_ok());
}

#[test]
fn test_path_binding_reads_live_configuration() {
    let binder = Arc::new(ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap());
    let slot = Arc::new(DeferredSlot::new(SlotKind::Configuration));
    let container = build_container(binder, Arc::clone(&slot));

    slot.set(Arc::new(sample(None))).unwrap();
    let config = slot.get().unwrap();

    let host = container.get_named::<String>("db.host").unwrap();
    assert_eq!(&*host, "db.local");
    assert!(std::ptr::eq(&*host, &config.db.host));

    let db = container.get_named::<DbConfig>("db").unwrap();
    assert!(std::ptr::eq(&*db, &config.db));

    let port = container.get_named::<u16>("db.port").unwrap();
    assert_eq!(*port, 5432);

    let region = container.get_named::<String>("region").unwrap();
    assert_eq!(&*region, "cn-north");

    let mode = container.get_named::<Mode>("mode").unwrap();
    assert_eq!(*mode, Mode::Fast);
}

#[test]
fn test_path_binding_before_configuration_is_not_yet_available() {
    let binder = Arc::new(ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap());
    let slot = Arc::new(DeferredSlot::new(SlotKind::Configuration));
    let container = build_container(binder, slot);

    let err = container.get_named::<String>("db.host").unwrap_err();
    assert!(err.is_not_yet_available());
}

#[test]
fn test_absent_intermediate_is_value_absent() {
    let binder = Arc::new(ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap());
    let slot = Arc::new(DeferredSlot::new(SlotKind::Configuration));
    let container = build_container(binder, Arc::clone(&slot));
    slot.set(Arc::new(sample(None))).unwrap();

    let err = container.get_named::<u64>("cache.ttl_secs").unwrap_err();
    assert!(matches!(err, DependencyError::ValueAbsent { .. }));

    let key = di_abstractions::DependencyKey::named::<u64>("cache.ttl_secs");
    assert!(container.get_optional::<u64>(&key).unwrap().is_none());
}

#[test]
fn test_present_optional_section_is_bound() {
    let binder = Arc::new(ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap());
    let slot = Arc::new(DeferredSlot::new(SlotKind::Configuration));
    let container = build_container(binder, Arc::clone(&slot));
    slot.set(Arc::new(sample(Some(CacheConfig { ttl_secs: 30 }))))
        .unwrap();

    let ttl = container.get_named::<u64>("cache.ttl_secs").unwrap();
    assert_eq!(*ttl, 30);
}

#[test]
fn test_wrong_type_is_rejected() {
    let binder = Arc::new(ConfigPathBinder::new::<AppConfig>(&app_packages()).unwrap());
    let slot = Arc::new(DeferredSlot::new(SlotKind::Configuration));
    let container = build_container(binder, Arc::clone(&slot));
    slot.set(Arc::new(sample(None))).unwrap();

    let key = di_abstractions::DependencyKey::named::<String>("db.port");
    assert!(matches!(
        container.get_key::<String>(&key),
        Err(DependencyError::BindingNotFound { .. })
    ));
}

#[test]
fn test_schema_root_type_is_recorded() {
    let binder = ConfigPathBinder::from_schema(AppConfig::schema(), app_packages()).unwrap();

    assert!(binder.root_type().is::<AppConfig>());
    assert_eq!(binder.paths().len(), 10);
}
