//! 运行期上下文与 Environment 阶段模块

use crate::host::{ApplicationContext, Bootstrap, Environment, Namespace};
use chrono::{DateTime, Utc};
use config_impl::ConfigPathBinder;
use di_abstractions::{
    Binder, Binding, DeferredSlot, DependencyKey, InstanceProvider, Instance, Module,
    ReplaceableSlot, SlotProvider,
};
use infrastructure_common::{ConfigurationError, SlotKind};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 应用上下文绑定使用的限定名
pub const APPLICATION_CONTEXT: &str = "application";

/// 一次运行的延迟槽位
///
/// 每次运行重新创建。命令行参数可以在同一次运行内被后续命令替换，
/// 其余槽位只能写入一次。
pub struct RunContext<C> {
    id: Uuid,
    started_at: DateTime<Utc>,
    configuration: Arc<DeferredSlot<C>>,
    environment: Arc<DeferredSlot<Environment>>,
    namespace: Arc<ReplaceableSlot<Namespace>>,
    bootstrap: Arc<DeferredSlot<Bootstrap<C>>>,
}

impl<C: Any + Send + Sync> RunContext<C> {
    /// 创建空的运行上下文
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            configuration: Arc::new(DeferredSlot::new(SlotKind::Configuration)),
            environment: Arc::new(DeferredSlot::new(SlotKind::Environment)),
            namespace: Arc::new(ReplaceableSlot::new(SlotKind::Namespace)),
            bootstrap: Arc::new(DeferredSlot::new(SlotKind::Bootstrap)),
        }
    }

    /// 运行 ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 开始时间
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// 配置槽位
    pub fn configuration(&self) -> &Arc<DeferredSlot<C>> {
        &self.configuration
    }

    /// 运行环境槽位
    pub fn environment(&self) -> &Arc<DeferredSlot<Environment>> {
        &self.environment
    }

    /// 命令行参数槽位
    pub fn namespace(&self) -> &Arc<ReplaceableSlot<Namespace>> {
        &self.namespace
    }

    /// 引导对象槽位
    pub fn bootstrap(&self) -> &Arc<DeferredSlot<Bootstrap<C>>> {
        &self.bootstrap
    }
}

impl<C: Any + Send + Sync> Default for RunContext<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment 阶段模块
///
/// 绑定配置类型本身、配置路径、运行环境、命令行参数、引导对象，
/// 以及运行环境存在时限定名为 `"application"` 的应用上下文。
pub struct EnvironmentModule<C> {
    run: Arc<RunContext<C>>,
    paths: Arc<ConfigPathBinder>,
    context: Option<Arc<ApplicationContext>>,
}

impl<C> EnvironmentModule<C> {
    /// 创建模块
    pub fn new(
        run: Arc<RunContext<C>>,
        paths: Arc<ConfigPathBinder>,
        context: Option<Arc<ApplicationContext>>,
    ) -> Self {
        Self {
            run,
            paths,
            context,
        }
    }
}

impl<C: Any + Send + Sync> Module for EnvironmentModule<C> {
    fn name(&self) -> &str {
        "EnvironmentModule"
    }

    fn configure(&self, binder: &mut dyn Binder) -> Result<(), ConfigurationError> {
        binder.bind(Binding::new(
            DependencyKey::of::<C>(),
            Arc::new(SlotProvider::new(Arc::clone(&self.run.configuration))),
        ))?;
        self.paths
            .install(binder, Arc::clone(&self.run.configuration) as _)?;

        binder.bind(Binding::new(
            DependencyKey::of::<Environment>(),
            Arc::new(SlotProvider::new(Arc::clone(&self.run.environment))),
        ))?;
        binder.bind(Binding::new(
            DependencyKey::of::<Namespace>(),
            Arc::new(SlotProvider::new(Arc::clone(&self.run.namespace))),
        ))?;
        binder.bind(Binding::new(
            DependencyKey::of::<Bootstrap<C>>(),
            Arc::new(SlotProvider::new(Arc::clone(&self.run.bootstrap))),
        ))?;

        if let Some(context) = &self.context {
            let instance = Arc::clone(context) as Instance;
            binder.bind(Binding::new(
                DependencyKey::named::<ApplicationContext>(APPLICATION_CONTEXT),
                Arc::new(InstanceProvider::shared(instance)),
            ))?;
            debug!("绑定应用上下文: {}", context.context_path());
        }

        debug!(
            "运行 {} 的 Environment 模块已安装: {} 条配置路径",
            self.run.id,
            self.paths.paths().len()
        );
        Ok(())
    }
}
