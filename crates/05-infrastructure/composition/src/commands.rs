//! 注入式命令与配置式命令
//!
//! 命令运行时先让组合器准备好对应的阶段。注入式命令再通过入口调用器解析参数并执行
//! 命令对象声明的入口；配置式命令从 Module 阶段创建执行器，把引导对象、
//! 命令行参数和配置交给它。

use crate::composer::Composer;
use crate::host::{Bootstrap, Command, Invocation, Namespace};
use crate::manifest::ComponentFactory;
use config_abstractions::ConfigNode;
use di_abstractions::{Resolver, Runnable};
use di_impl::invoke_entry_point;
use infrastructure_common::{
    CommandShape, DependencyError, InfrastructureError, InjectedShape, LifecycleError, TypeInfo,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 注入式命令
///
/// - `Injected`: 只创建 Environment 阶段，可注入引导对象和命令行参数
/// - `InjectedConfigured`: 需要配置，额外创建 Module 阶段
/// - `InjectedEnvironment`: 服务运行已经由宿主完成，只写入命令行参数
pub struct InjectedCommand<C, R> {
    name: String,
    description: String,
    shape: InjectedShape,
    runnable: R,
    composer: RwLock<Option<Composer<C>>>,
}

impl<C: ConfigNode, R: Runnable + Send + Sync + 'static> InjectedCommand<C, R> {
    /// 不需要配置的命令
    pub fn injected(name: impl Into<String>, description: impl Into<String>, runnable: R) -> Self {
        Self::with_shape(InjectedShape::Injected, name, description, runnable)
    }

    /// 需要配置的命令
    pub fn configured(
        name: impl Into<String>,
        description: impl Into<String>,
        runnable: R,
    ) -> Self {
        Self::with_shape(InjectedShape::InjectedConfigured, name, description, runnable)
    }

    /// 在服务运行环境中执行的命令
    pub fn environment(
        name: impl Into<String>,
        description: impl Into<String>,
        runnable: R,
    ) -> Self {
        Self::with_shape(InjectedShape::InjectedEnvironment, name, description, runnable)
    }

    pub(crate) fn with_shape(
        shape: InjectedShape,
        name: impl Into<String>,
        description: impl Into<String>,
        runnable: R,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            shape,
            runnable,
            composer: RwLock::new(None),
        }
    }

    /// 命令对象
    pub fn runnable(&self) -> &R {
        &self.runnable
    }

    /// 是否已经拿到组合器
    pub fn has_composer(&self) -> bool {
        self.composer.read().is_some()
    }
}

impl<C: ConfigNode, R: Runnable + Send + Sync + 'static> Command<C> for InjectedCommand<C, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn shape(&self) -> CommandShape {
        self.shape.into()
    }

    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<R>()
    }

    fn set_composer(&self, composer: Composer<C>) {
        debug!("命令 {} 已关联组合器", self.name);
        *self.composer.write() = Some(composer);
    }

    fn run(&self, invocation: &Invocation<C>) -> Result<(), InfrastructureError> {
        let composer =
            self.composer
                .read()
                .clone()
                .ok_or_else(|| LifecycleError::ComposerMissing {
                    command: self.name.clone(),
                })?;

        if self.shape.requires_configuration() && invocation.configuration.is_none() {
            return Err(LifecycleError::MissingConfiguration {
                command: self.name.clone(),
            }
            .into());
        }

        match self.shape {
            InjectedShape::InjectedEnvironment => {}
            InjectedShape::InjectedConfigured => {
                composer.run_command(invocation)?;
            }
            InjectedShape::Injected => {
                composer.run_command(&invocation.bare())?;
            }
        }
        composer.set_namespace(invocation.namespace.clone())?;

        let container = composer.injector().get()?;
        info!("执行命令 {} ({} 阶段)", self.name, container.stage());
        invoke_entry_point(&self.runnable, &*container)
    }
}

impl<C, R> fmt::Debug for InjectedCommand<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedCommand")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("runnable", &std::any::type_name::<R>())
            .finish_non_exhaustive()
    }
}

/// 配置式命令的执行器
///
/// 执行器在 Module 阶段创建，可以从容器注入自己的依赖。
pub trait ConfiguredExecutor<C>: Send + Sync + 'static {
    fn execute(
        &self,
        bootstrap: &Bootstrap<C>,
        namespace: &Namespace,
        configuration: &C,
    ) -> anyhow::Result<()>;
}

/// 配置式命令
///
/// 运行时先创建 Environment 和 Module 阶段并写入命令行参数，再从最具体的阶段
/// 创建执行器，最后把引导对象、命令行参数和配置交给执行器。
pub struct ConfiguredCommand<C, E> {
    name: String,
    description: String,
    factory: ComponentFactory<E>,
    composer: RwLock<Option<Composer<C>>>,
}

impl<C: ConfigNode, E: ConfiguredExecutor<C>> ConfiguredCommand<C, E> {
    /// 创建命令，执行器每次运行都重新创建
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Result<E, DependencyError> + Send + Sync + 'static,
    {
        Self::with_factory(name, description, Arc::new(factory))
    }

    pub(crate) fn with_factory(
        name: impl Into<String>,
        description: impl Into<String>,
        factory: ComponentFactory<E>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            factory,
            composer: RwLock::new(None),
        }
    }

    /// 是否已经拿到组合器
    pub fn has_composer(&self) -> bool {
        self.composer.read().is_some()
    }
}

impl<C: ConfigNode, E: ConfiguredExecutor<C>> Command<C> for ConfiguredCommand<C, E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn shape(&self) -> CommandShape {
        CommandShape::Configured
    }

    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<E>()
    }

    fn set_composer(&self, composer: Composer<C>) {
        debug!("命令 {} 已关联组合器", self.name);
        *self.composer.write() = Some(composer);
    }

    fn run(&self, invocation: &Invocation<C>) -> Result<(), InfrastructureError> {
        let composer =
            self.composer
                .read()
                .clone()
                .ok_or_else(|| LifecycleError::ComposerMissing {
                    command: self.name.clone(),
                })?;
        let configuration = invocation.configuration.clone().ok_or_else(|| {
            LifecycleError::MissingConfiguration {
                command: self.name.clone(),
            }
        })?;

        composer.run_command(invocation)?;
        composer.set_namespace(invocation.namespace.clone())?;

        let container = composer.injector().get()?;
        let executor = (self.factory)(&*container)?;
        info!("执行命令 {} ({} 阶段)", self.name, container.stage());
        executor
            .execute(&invocation.bootstrap, &invocation.namespace, &configuration)
            .map_err(|err| InfrastructureError::CommandFailed {
                command: self.name.clone(),
                message: format!("{err:#}"),
            })
    }
}

impl<C, E> fmt::Debug for ConfiguredCommand<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredCommand")
            .field("name", &self.name)
            .field("executor", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}
