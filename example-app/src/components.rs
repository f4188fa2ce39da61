//! 示例组件
//!
//! 组件全部在 [`manifest`] 中声明，由自动配置按包前缀发现。

use crate::settings::AppConfig;
use async_trait::async_trait;
use di_abstractions::{Binder, BinderExt, EntryPoint, Module, Resolver, ResolverExt, Runnable};
use infrastructure_common::{
    ConfigurationError, HealthCheck, HealthStatus, InjectedShape, LifecycleError, Managed, Task,
};
use infrastructure_composition::{
    ApplicationContext, Bootstrap, ComponentManifest, ConfiguredExecutor, ContextListener,
    Namespace,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{info, warn};

/// 构建信息，绑定在 Init 阶段
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// 版本号
    pub version: &'static str,
}

impl BuildInfo {
    /// 当前构建
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// 服务信息，由 Module 阶段根据配置创建
#[derive(Debug)]
pub struct ServiceInfo {
    /// 服务名称
    pub name: String,
    /// 监听地址
    pub address: String,
}

/// Module 阶段的应用模块
pub struct ServiceModule;

impl Module for ServiceModule {
    fn name(&self) -> &str {
        "ServiceModule"
    }

    fn configure(&self, binder: &mut dyn Binder) -> Result<(), ConfigurationError> {
        binder.bind_singleton(|resolver: &dyn Resolver| {
            let config = resolver.get::<AppConfig>()?;
            Ok(ServiceInfo {
                name: config.name.clone(),
                address: format!("0.0.0.0:{}", config.port),
            })
        })
    }
}

/// 数据库健康检查
pub struct DatabaseHealth {
    endpoint: String,
}

#[async_trait]
impl HealthCheck for DatabaseHealth {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        if self.endpoint.is_empty() {
            HealthStatus::unhealthy("数据库地址为空")
        } else {
            HealthStatus::healthy()
        }
    }
}

/// JSON 消息体提供者
pub struct JsonBodyProvider;

/// 状态资源
pub struct StatusResource {
    /// 服务信息
    pub service: String,
}

/// 连接池
pub struct ConnectionPool {
    endpoint: String,
    max_connections: u32,
    open: AtomicBool,
}

#[async_trait]
impl Managed for ConnectionPool {
    async fn start(&self) -> Result<(), LifecycleError> {
        self.open.store(true, Ordering::SeqCst);
        info!(
            "连接池已打开: {} (最多 {} 个连接)",
            self.endpoint, self.max_connections
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            warn!("连接池未打开: {}", self.endpoint);
        }
        info!("连接池已关闭: {}", self.endpoint);
        Ok(())
    }
}

/// 重建索引任务
#[derive(Default)]
pub struct ReindexTask {
    runs: AtomicU64,
}

#[async_trait]
impl Task for ReindexTask {
    fn name(&self) -> &str {
        "reindex"
    }

    async fn execute(&self) -> Result<(), LifecycleError> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        info!("重建索引: 第 {} 次", run);
        Ok(())
    }
}

/// 启动横幅
pub struct StartupBanner {
    /// 服务名称
    pub service: String,
}

impl ContextListener for StartupBanner {
    fn name(&self) -> &str {
        "startup-banner"
    }

    fn context_initialized(&self, context: &ApplicationContext) {
        info!("{} 已挂载到 {}", self.service, context.context_path());
    }
}

/// `version` 命令
pub struct VersionCommand;

impl Runnable for VersionCommand {
    fn entry_point(&self) -> Option<EntryPoint<'_>> {
        Some(
            EntryPoint::builder("print_version")
                .param::<Bootstrap<AppConfig>>()
                .param::<BuildInfo>()
                .param::<Namespace>()
                .invoke(|args| {
                    let bootstrap = args.get::<Bootstrap<AppConfig>>(0)?;
                    let build = args.get::<BuildInfo>(1)?;
                    let namespace = args.get::<Namespace>(2)?;
                    println!("{} {}", bootstrap.application(), build.version);
                    if namespace.get("verbose") == Some("true") {
                        let commands: Vec<_> =
                            bootstrap.commands().iter().map(|c| c.name()).collect();
                        println!("commands: {}", commands.join(", "));
                    }
                    Ok(())
                }),
        )
    }
}

/// `check` 命令
pub struct CheckCommand;

impl Runnable for CheckCommand {
    fn entry_point(&self) -> Option<EntryPoint<'_>> {
        Some(
            EntryPoint::builder("check")
                .param::<ServiceInfo>()
                .named::<String>("database.host")
                .named::<u16>("database.port")
                .named::<u32>("database.max_connections")
                .invoke(|args| {
                    let service = args.get::<ServiceInfo>(0)?;
                    let host = args.get::<String>(1)?;
                    let port = args.get::<u16>(2)?;
                    let max_connections = args.get::<u32>(3)?;
                    if *max_connections == 0 {
                        anyhow::bail!("database.max_connections 必须大于 0");
                    }
                    println!("service:  {} ({})", service.name, service.address);
                    println!("database: {}:{} (max {})", *host, *port, *max_connections);
                    Ok(())
                }),
        )
    }
}

/// `describe` 命令的执行器
pub struct DescribeConfig {
    service: String,
}

impl ConfiguredExecutor<AppConfig> for DescribeConfig {
    fn execute(
        &self,
        bootstrap: &Bootstrap<AppConfig>,
        namespace: &Namespace,
        configuration: &AppConfig,
    ) -> anyhow::Result<()> {
        let section = namespace.get("section").unwrap_or("all");
        println!("{} ({})", bootstrap.application(), self.service);
        if matches!(section, "all" | "server") {
            println!("server:   {}:{}", configuration.name, configuration.port);
        }
        if matches!(section, "all" | "database") {
            let database = &configuration.database;
            println!(
                "database: {}:{}/{} (max {})",
                database.host, database.port, database.database, database.max_connections
            );
        }
        Ok(())
    }
}

/// 组件清单
pub fn manifest() -> ComponentManifest<AppConfig> {
    ComponentManifest::new()
        .health_check(|resolver: &dyn Resolver| {
            let host = resolver.get_named::<String>("database.host")?;
            let port = resolver.get_named::<u16>("database.port")?;
            Ok(DatabaseHealth {
                endpoint: format!("{}:{}", *host, *port),
            })
        })
        .provider(|_resolver: &dyn Resolver| Ok(JsonBodyProvider))
        .resource("/status", |resolver: &dyn Resolver| {
            let service = resolver.get::<ServiceInfo>()?;
            Ok(StatusResource {
                service: service.name.clone(),
            })
        })
        .task(|_resolver: &dyn Resolver| Ok(ReindexTask::default()))
        .managed(|resolver: &dyn Resolver| {
            let config = resolver.get::<AppConfig>()?;
            Ok(ConnectionPool {
                endpoint: format!(
                    "{}:{}/{}",
                    config.database.host, config.database.port, config.database.database
                ),
                max_connections: config.database.max_connections,
                open: AtomicBool::new(false),
            })
        })
        .configured_command(
            "describe",
            "输出当前配置",
            |resolver: &dyn Resolver| {
                let service = resolver.get::<ServiceInfo>()?;
                Ok(DescribeConfig {
                    service: service.address.clone(),
                })
            },
        )
        .injected_command(
            InjectedShape::Injected,
            "version",
            "输出版本信息",
            |_resolver: &dyn Resolver| Ok(VersionCommand),
        )
        .injected_command(
            InjectedShape::InjectedConfigured,
            "check",
            "检查配置并输出连接参数",
            |_resolver: &dyn Resolver| Ok(CheckCommand),
        )
}
