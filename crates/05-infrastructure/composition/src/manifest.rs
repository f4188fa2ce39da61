//! 组件清单
//!
//! 组件在编译期通过清单声明类型、能力类别和创建方式。注册表在构造时按包前缀
//! 过滤清单条目，之后只通过容器创建实例。

use crate::commands::{ConfiguredCommand, ConfiguredExecutor, InjectedCommand};
use crate::host::command::{Command, ConfiguredBundle};
use config_abstractions::ConfigNode;
use di_abstractions::{Instance, Resolver, Runnable};
use infrastructure_common::{
    Capability, Classifier, CommandShape, ComponentDescriptor, DependencyError, HealthCheck,
    InjectableProvider, InjectedShape, Managed, Marker, Supertype, Task, TypeInfo,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 通过容器创建组件的工厂
pub type ComponentFactory<T> =
    Arc<dyn Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync>;

/// 按能力类别区分的工厂
pub enum Factory<C> {
    HealthCheck(ComponentFactory<Arc<dyn HealthCheck>>),
    Provider(ComponentFactory<Instance>),
    InjectableProvider(ComponentFactory<Arc<dyn InjectableProvider>>),
    Resource(ComponentFactory<Instance>),
    Task(ComponentFactory<Arc<dyn Task>>),
    Managed(ComponentFactory<Arc<dyn Managed>>),
    Bundle(ComponentFactory<Arc<dyn ConfiguredBundle<C>>>),
    Command(ComponentFactory<Arc<dyn Command<C>>>),
}

impl<C> Factory<C> {
    /// 工厂创建的能力类别
    pub fn capability(&self) -> Capability {
        match self {
            Self::HealthCheck(_) => Capability::HealthCheck,
            Self::Provider(_) => Capability::Provider,
            Self::InjectableProvider(_) => Capability::InjectableProvider,
            Self::Resource(_) => Capability::Resource,
            Self::Task(_) => Capability::Task,
            Self::Managed(_) => Capability::Managed,
            Self::Bundle(_) => Capability::Bundle,
            Self::Command(_) => Capability::Command,
        }
    }
}

/// 清单条目
pub struct ManifestEntry<C> {
    /// 组件描述
    pub descriptor: ComponentDescriptor,
    /// 创建方式
    pub factory: Factory<C>,
}

impl<C> fmt::Debug for ManifestEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestEntry")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// 组件清单
pub struct ComponentManifest<C> {
    entries: Vec<ManifestEntry<C>>,
}

impl<C> Default for ComponentManifest<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C: Send + Sync + 'static> ComponentManifest<C> {
    /// 创建空清单
    pub fn new() -> Self {
        Self::default()
    }

    /// 声明可注入的健康检查
    pub fn health_check<T, F>(self, factory: F) -> Self
    where
        T: HealthCheck + 'static,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(
                TypeInfo::of::<T>(),
                Classifier::SubtypeOf(Supertype::InjectableHealthCheck),
            ),
            Factory::HealthCheck(Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|check| Arc::new(check) as Arc<dyn HealthCheck>)
            })),
        )
    }

    /// 声明带提供者标记的类型
    pub fn provider<T, F>(self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(
                TypeInfo::of::<T>(),
                Classifier::AnnotatedWith(Marker::Provider),
            ),
            Factory::Provider(instance_factory(factory)),
        )
    }

    /// 声明可注入提供者
    pub fn injectable_provider<T, F>(self, factory: F) -> Self
    where
        T: InjectableProvider + 'static,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(
                TypeInfo::of::<T>(),
                Classifier::SubtypeOf(Supertype::InjectableProvider),
            ),
            Factory::InjectableProvider(Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|p| Arc::new(p) as Arc<dyn InjectableProvider>)
            })),
        )
    }

    /// 声明带路径标记的资源
    pub fn resource<T, F>(self, path: &str, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(TypeInfo::of::<T>(), Classifier::AnnotatedWith(Marker::Path))
                .with_attribute("path", path),
            Factory::Resource(instance_factory(factory)),
        )
    }

    /// 声明管理任务
    pub fn task<T, F>(self, factory: F) -> Self
    where
        T: Task + 'static,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(TypeInfo::of::<T>(), Classifier::SubtypeOf(Supertype::Task)),
            Factory::Task(Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|task| Arc::new(task) as Arc<dyn Task>)
            })),
        )
    }

    /// 声明托管对象
    pub fn managed<T, F>(self, factory: F) -> Self
    where
        T: Managed + 'static,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(
                TypeInfo::of::<T>(),
                Classifier::SubtypeOf(Supertype::Managed),
            ),
            Factory::Managed(Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|managed| Arc::new(managed) as Arc<dyn Managed>)
            })),
        )
    }

    /// 声明扩展包
    pub fn bundle<T, F>(self, factory: F) -> Self
    where
        T: ConfiguredBundle<C>,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(TypeInfo::of::<T>(), Classifier::SubtypeOf(Supertype::Bundle)),
            Factory::Bundle(Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|bundle| Arc::new(bundle) as Arc<dyn ConfiguredBundle<C>>)
            })),
        )
    }

    /// 声明命令
    pub fn command<T, F>(self, shape: CommandShape, factory: F) -> Self
    where
        T: Command<C>,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.push(
            ComponentDescriptor::new(
                TypeInfo::of::<T>(),
                Classifier::SubtypeOf(Supertype::Command(shape)),
            ),
            Factory::Command(Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|command| Arc::new(command) as Arc<dyn Command<C>>)
            })),
        )
    }

    /// 声明注入式命令，按命令对象类型去重和过滤
    pub fn injected_command<R, F>(
        self,
        shape: InjectedShape,
        name: &str,
        description: &str,
        factory: F,
    ) -> Self
    where
        C: ConfigNode,
        R: Runnable + Send + Sync + 'static,
        F: Fn(&dyn Resolver) -> Result<R, DependencyError> + Send + Sync + 'static,
    {
        let name = name.to_string();
        let description = description.to_string();
        self.push(
            ComponentDescriptor::new(
                TypeInfo::of::<R>(),
                Classifier::SubtypeOf(Supertype::Command(shape.into())),
            )
            .with_attribute("name", name.as_str()),
            Factory::Command(Arc::new(move |resolver: &dyn Resolver| {
                factory(resolver).map(|runnable| {
                    Arc::new(InjectedCommand::with_shape(
                        shape,
                        name.clone(),
                        description.clone(),
                        runnable,
                    )) as Arc<dyn Command<C>>
                })
            })),
        )
    }

    /// 声明配置式命令，按执行器类型去重和过滤
    pub fn configured_command<E, F>(self, name: &str, description: &str, factory: F) -> Self
    where
        C: ConfigNode,
        E: ConfiguredExecutor<C>,
        F: Fn(&dyn Resolver) -> Result<E, DependencyError> + Send + Sync + 'static,
    {
        let name = name.to_string();
        let description = description.to_string();
        let factory: ComponentFactory<E> = Arc::new(factory);
        self.push(
            ComponentDescriptor::new(
                TypeInfo::of::<E>(),
                Classifier::SubtypeOf(Supertype::Command(CommandShape::Configured)),
            )
            .with_attribute("name", name.as_str()),
            Factory::Command(Arc::new(move |_resolver: &dyn Resolver| {
                Ok(Arc::new(ConfiguredCommand::<C, E>::with_factory(
                    name.clone(),
                    description.clone(),
                    Arc::clone(&factory),
                )) as Arc<dyn Command<C>>)
            })),
        )
    }

    /// 追加自定义条目
    ///
    /// 描述符的分类必须与工厂类别一致，否则启用自动配置时报错。
    pub fn with_entry(self, entry: ManifestEntry<C>) -> Self {
        self.push(entry.descriptor, entry.factory)
    }

    /// 全部条目，保持声明顺序
    pub fn entries(&self) -> &[ManifestEntry<C>] {
        &self.entries
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<ManifestEntry<C>> {
        self.entries
    }

    fn push(mut self, descriptor: ComponentDescriptor, factory: Factory<C>) -> Self {
        self.entries.push(ManifestEntry {
            descriptor,
            factory,
        });
        self
    }
}

fn instance_factory<T, F>(factory: F) -> ComponentFactory<Instance>
where
    T: Any + Send + Sync,
    F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
{
    Arc::new(move |resolver: &dyn Resolver| {
        factory(resolver).map(|value| Arc::new(value) as Instance)
    })
}
