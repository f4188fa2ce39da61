//! 模块与绑定
//!
//! 模块在容器阶段构建时通过 [`Binder`] 安装绑定。阶段构建完成后绑定集合
//! 不再变化，只有延迟槽位背后的值可能在首次读取前被写入。

use crate::container::Resolver;
use crate::key::DependencyKey;
use crate::provider::{FactoryProvider, InstanceProvider, Provided, Provider};
use crate::stage::{ContainerStage, StagePolicy};
use infrastructure_common::{ConfigurationError, DependencyError};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 绑定作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingScope {
    /// 每次解析都调用提供者
    #[default]
    Unscoped,
    /// 首次解析后缓存
    Singleton,
    /// 缓存，并且在生产策略下于阶段构建时创建
    EagerSingleton,
}

/// 一条绑定
pub struct Binding {
    key: DependencyKey,
    provider: Arc<dyn Provider>,
    scope: BindingScope,
    cache: OnceCell<Provided>,
}

impl Binding {
    /// 创建绑定
    pub fn new(key: DependencyKey, provider: Arc<dyn Provider>) -> Self {
        Self {
            key,
            provider,
            scope: BindingScope::Unscoped,
            cache: OnceCell::new(),
        }
    }

    /// 设置作用域
    pub fn in_scope(mut self, scope: BindingScope) -> Self {
        self.scope = scope;
        self
    }

    /// 绑定的键
    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    /// 绑定的作用域
    pub fn scope(&self) -> BindingScope {
        self.scope
    }

    /// 在给定解析器上解析绑定
    pub fn resolve(&self, resolver: &dyn Resolver) -> Result<Provided, DependencyError> {
        match self.scope {
            BindingScope::Unscoped => self.provider.provide(resolver),
            BindingScope::Singleton | BindingScope::EagerSingleton => self
                .cache
                .get_or_try_init(|| self.provider.provide(resolver))
                .cloned(),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("cached", &self.cache.get().is_some())
            .finish()
    }
}

/// 绑定安装器
pub trait Binder {
    /// 正在构建的阶段
    fn stage(&self) -> ContainerStage;

    /// 阶段策略
    fn policy(&self) -> StagePolicy;

    /// 父阶段解析器，模块可以在安装时读取上一阶段已经可用的值
    fn parent(&self) -> Option<&dyn Resolver>;

    /// 安装一条绑定，同一阶段内重复的键是配置错误
    fn bind(&mut self, binding: Binding) -> Result<(), ConfigurationError>;
}

/// 类型化绑定的便捷方法
pub trait BinderExt: Binder {
    /// 绑定固定实例
    fn bind_instance<T: Any + Send + Sync>(&mut self, value: T) -> Result<(), ConfigurationError> {
        self.bind(Binding::new(
            DependencyKey::of::<T>(),
            Arc::new(InstanceProvider::new(value)),
        ))
    }

    /// 绑定带限定名的固定实例
    fn bind_named_instance<T: Any + Send + Sync>(
        &mut self,
        qualifier: &str,
        value: T,
    ) -> Result<(), ConfigurationError> {
        self.bind(Binding::new(
            DependencyKey::named::<T>(qualifier),
            Arc::new(InstanceProvider::new(value)),
        ))
    }

    /// 绑定工厂，每次解析都重新创建
    fn bind_factory<T, F>(&mut self, factory: F) -> Result<(), ConfigurationError>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.bind(Binding::new(
            DependencyKey::of::<T>(),
            Arc::new(FactoryProvider::new(factory)),
        ))
    }

    /// 绑定单例工厂
    fn bind_singleton<T, F>(&mut self, factory: F) -> Result<(), ConfigurationError>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.bind(
            Binding::new(DependencyKey::of::<T>(), Arc::new(FactoryProvider::new(factory)))
                .in_scope(BindingScope::Singleton),
        )
    }

    /// 绑定急切单例工厂
    fn bind_eager_singleton<T, F>(&mut self, factory: F) -> Result<(), ConfigurationError>
    where
        T: Any + Send + Sync,
        F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync + 'static,
    {
        self.bind(
            Binding::new(DependencyKey::of::<T>(), Arc::new(FactoryProvider::new(factory)))
                .in_scope(BindingScope::EagerSingleton),
        )
    }
}

impl<B: Binder + ?Sized> BinderExt for B {}

/// 模块 trait
pub trait Module: Send + Sync {
    /// 模块名称，用于日志和错误信息
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 安装绑定
    fn configure(&self, binder: &mut dyn Binder) -> Result<(), ConfigurationError>;
}

impl<F> Module for F
where
    F: Fn(&mut dyn Binder) -> Result<(), ConfigurationError> + Send + Sync,
{
    fn configure(&self, binder: &mut dyn Binder) -> Result<(), ConfigurationError> {
        self(binder)
    }
}
