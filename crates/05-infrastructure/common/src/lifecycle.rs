//! 宿主生命周期契约

use crate::errors::LifecycleError;
use crate::metadata::TypeInfo;
use async_trait::async_trait;

/// 托管对象，随宿主启动和停止
#[async_trait]
pub trait Managed: Send + Sync {
    /// 启动
    async fn start(&self) -> Result<(), LifecycleError>;

    /// 停止
    async fn stop(&self) -> Result<(), LifecycleError>;
}

/// 管理任务
#[async_trait]
pub trait Task: Send + Sync {
    /// 任务名称
    fn name(&self) -> &str;

    /// 执行任务
    async fn execute(&self) -> Result<(), LifecycleError>;
}

/// 可注入提供者，为请求分发层提供某个类型的值
pub trait InjectableProvider: Send + Sync {
    /// 提供的类型
    fn provided_type(&self) -> TypeInfo;
}
