//! # 示例应用程序
//!
//! 演示分阶段组合器、组件自动配置和配置路径注入

mod components;
mod settings;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use components::{BuildInfo, ServiceInfo, ServiceModule, StartupBanner};
use config_impl::ConfigurationLoader;
use di_abstractions::{Binder, BinderExt, Resolver, ResolverExt};
use infrastructure_composition::{
    init_logging, Bootstrap, Composer, ContextListener, Environment, Invocation, LoggingConfig,
    Namespace,
};
use settings::AppConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// 自动配置扫描的包前缀
const COMPONENT_PACKAGE: &str = "example_app::components";

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn Wiring 示例应用")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/app.toml")]
    config: PathBuf,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 日志
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// 启动服务
    Server,
    /// 检查配置
    Check,
    /// 输出当前配置
    Describe {
        /// 只输出某一段: server 或 database
        #[arg(long, default_value = "all")]
        section: String,
    },
    /// 输出版本信息
    Version {
        /// 同时列出全部命令
        #[arg(long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default().with_level(parse_log_level(&cli.log_level));
    logging.json_format = cli.json_logs;
    init_logging(&logging)?;

    let composer = build_composer()?;
    let mut bootstrap = Bootstrap::new("example-app");
    bootstrap.add_bundle(Arc::new(composer))?;
    let bootstrap = Arc::new(bootstrap);

    match cli.command {
        CliCommand::Server => serve(&cli.config, &bootstrap).await,
        CliCommand::Check => {
            let config = load_config(&cli.config)?;
            run_command(&bootstrap, "check", Namespace::new(), Some(config))
        }
        CliCommand::Describe { section } => {
            let config = load_config(&cli.config)?;
            run_command(
                &bootstrap,
                "describe",
                Namespace::new().with("section", section),
                Some(config),
            )
        }
        CliCommand::Version { verbose } => run_command(
            &bootstrap,
            "version",
            Namespace::new().with("verbose", verbose.to_string()),
            None,
        ),
    }
}

/// 构建组合器
fn build_composer() -> anyhow::Result<Composer<AppConfig>> {
    let composer = Composer::<AppConfig>::builder()
        .add_init_module(Arc::new(|binder: &mut dyn Binder| {
            binder.bind_instance(BuildInfo::current())
        }))
        .add_module(Arc::new(ServiceModule))
        .add_context_listener(|resolver: &dyn Resolver| {
            let service = resolver.get::<ServiceInfo>()?;
            Ok(Arc::new(StartupBanner {
                service: service.name.clone(),
            }) as Arc<dyn ContextListener>)
        })
        .enable_auto_config(components::manifest(), [COMPONENT_PACKAGE])?
        .build()?;
    Ok(composer)
}

/// 加载配置，文件不存在时使用默认值和环境变量
fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    ConfigurationLoader::new()
        .optional_file(path)
        .env_prefix("EXAMPLE")
        .load::<AppConfig>()
        .with_context(|| format!("加载配置失败: {}", path.display()))
}

/// 服务运行，直到收到退出信号
async fn serve(path: &Path, bootstrap: &Bootstrap<AppConfig>) -> anyhow::Result<()> {
    let config = Arc::new(load_config(path)?);
    let environment = Arc::new(Environment::new(config.name.clone()));

    bootstrap.run_bundles(&config, &environment)?;
    environment
        .servlets()
        .notify_initialized(environment.application_context());
    environment.lifecycle().start_all().await?;

    let statuses = environment.health_checks().run_all().await;
    info!("健康检查结果: {}", serde_json::to_string(&statuses)?);
    info!(
        "服务 {} 已就绪: 资源 {:?}, 管理任务 {:?}",
        environment.name(),
        environment.dispatch().resource_paths(),
        environment.admin().task_names()
    );

    tokio::signal::ctrl_c().await?;
    info!("收到退出信号，正在关闭应用");

    environment.lifecycle().stop_all().await?;
    info!("应用已关闭");
    Ok(())
}

/// 执行命令
fn run_command(
    bootstrap: &Arc<Bootstrap<AppConfig>>,
    name: &str,
    namespace: Namespace,
    configuration: Option<AppConfig>,
) -> anyhow::Result<()> {
    let command = bootstrap
        .command(name)
        .ok_or_else(|| anyhow!("未知命令: {}", name))?;

    let mut invocation = Invocation::new(Arc::clone(bootstrap), namespace);
    if let Some(configuration) = configuration {
        invocation = invocation.with_configuration(Arc::new(configuration));
    }
    command.run(&invocation)?;
    Ok(())
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
