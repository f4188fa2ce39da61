//! # 基础设施组合层
//!
//! 把发现到的组件接入宿主生命周期，并把配置树展开为分阶段容器中
//! 按路径寻址的可注入值。
//!
//! ## 主要功能
//!
//! - **自动配置**: 按包前缀过滤组件清单，分阶段登记到宿主
//! - **分阶段组合器**: Init、Environment、Module 三层容器
//! - **注入式命令**: 命令运行时解析入口参数
//! - **配置式命令**: 执行器在 Module 阶段创建，接收引导对象、命令行参数和配置
//! - **日志初始化**: 基于 tracing-subscriber
//!
//! ## 基本使用
//!
//! ```rust,ignore
//! use infrastructure_composition::{Bootstrap, Composer, ComponentManifest};
//! use std::sync::Arc;
//!
//! let composer = Composer::<AppConfig>::builder()
//!     .add_module(Arc::new(AppModule))
//!     .enable_auto_config(manifest(), ["my_app::components"])?
//!     .build()?;
//!
//! let mut bootstrap = Bootstrap::new("my-app");
//! bootstrap.add_bundle(Arc::new(composer.clone()))?;
//! ```

pub mod auto_config;
pub mod commands;
pub mod composer;
pub mod environment_module;
pub mod host;
pub mod logging;
pub mod manifest;

// 重新导出主要类型
pub use auto_config::AutoConfig;
pub use commands::{ConfiguredCommand, ConfiguredExecutor, InjectedCommand};
pub use composer::{
    Composer, ComposerBuilder, ContainerHandle, ListenerGenerator, REQUEST_SCOPE_FILTER,
};
pub use environment_module::{EnvironmentModule, RunContext, APPLICATION_CONTEXT};
pub use host::*;
pub use logging::{init_logging, LoggingConfig};
pub use manifest::{ComponentFactory, ComponentManifest, Factory, ManifestEntry};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
