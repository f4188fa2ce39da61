//! 宿主模型
//!
//! 组合器只依赖宿主的注册和生命周期回调，不关心请求路由、过滤器行为、
//! 健康检查逻辑和命令行解析。

pub mod bootstrap;
pub mod command;
pub mod environment;

pub use bootstrap::Bootstrap;
pub use command::{Command, ConfiguredBundle, Invocation, Namespace};
pub use environment::{
    AdminRegistry, ApplicationContext, ContextListener, DispatchRegistry, Environment,
    FilterRegistration, HealthCheckRegistry, LifecycleRegistry, ResourceRegistration,
    ServletRegistry,
};
