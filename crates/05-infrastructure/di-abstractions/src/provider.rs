//! 值提供者
//!
//! 绑定解析的结果是 [`Provided`]：要么是一个共享实例，要么是指向某个
//! 共享根对象内部的投影。投影不复制数据，读取到的就是根对象里的那个值。

use crate::container::Resolver;
use crate::key::DependencyKey;
use infrastructure_common::DependencyError;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// 容器中的共享实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 从根对象投影到其内部某个值
pub type Projection = Arc<dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync>;

/// 解析结果
#[derive(Clone)]
pub enum Provided {
    /// 共享实例
    Shared(Instance),
    /// 根对象内部的投影
    Projected {
        root: Instance,
        projection: Projection,
    },
}

impl Provided {
    /// 包装一个值
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::Shared(Arc::new(value))
    }

    /// 包装一个已共享的值
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self::Shared(value)
    }

    /// 创建投影，闭包签名由约束推导
    pub fn projected<F>(root: Instance, projection: F) -> Self
    where
        F: Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync + 'static,
    {
        Self::Projected {
            root,
            projection: Arc::new(projection),
        }
    }

    /// 被引用的值；投影在中间值缺失时返回 `None`
    pub fn value(&self) -> Option<&dyn Any> {
        match self {
            Self::Shared(instance) => {
                let any: &dyn Any = instance.as_ref();
                Some(any)
            }
            Self::Projected { root, projection } => {
                let root: &dyn Any = &**root;
                projection(root)
            }
        }
    }

    /// 转换为类型化的注入值
    pub fn typed<T: Any>(self, key: &DependencyKey) -> Result<Injected<T>, DependencyError> {
        Injected::new(self, key)
    }
}

impl fmt::Debug for Provided {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared(_) => f.write_str("Provided::Shared"),
            Self::Projected { .. } => f.write_str("Provided::Projected"),
        }
    }
}

/// 类型化的注入值
///
/// 构造时已检查底层值存在且类型匹配。
pub struct Injected<T: ?Sized> {
    provided: Provided,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: Any> Injected<T> {
    /// 检查并包装解析结果
    pub fn new(provided: Provided, key: &DependencyKey) -> Result<Self, DependencyError> {
        let checked = match provided.value() {
            Some(value) if value.is::<T>() => Ok(()),
            Some(_) => Err(DependencyError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>().to_string(),
            }),
            None => Err(DependencyError::ValueAbsent {
                key: key.to_string(),
            }),
        };
        checked.map(|()| Self {
            provided,
            _marker: PhantomData,
        })
    }

    /// 共享实例形式的值，投影值没有独立的 `Arc`
    pub fn shared(&self) -> Option<Arc<T>>
    where
        T: Send + Sync,
    {
        match &self.provided {
            Provided::Shared(instance) => Arc::clone(instance).downcast::<T>().ok(),
            Provided::Projected { .. } => None,
        }
    }

    /// 底层解析结果
    pub fn provided(&self) -> &Provided {
        &self.provided
    }
}

impl<T: Any> Deref for Injected<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.provided
            .value()
            .and_then(|value| value.downcast_ref::<T>())
            .expect("注入值在构造时已校验类型")
    }
}

impl<T: Any> Clone for Injected<T> {
    fn clone(&self) -> Self {
        Self {
            provided: self.provided.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Any + fmt::Debug> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// 值提供者
pub trait Provider: Send + Sync {
    /// 使用给定解析器提供值
    fn provide(&self, resolver: &dyn Resolver) -> Result<Provided, DependencyError>;
}

impl<F> Provider for F
where
    F: Fn(&dyn Resolver) -> Result<Provided, DependencyError> + Send + Sync,
{
    fn provide(&self, resolver: &dyn Resolver) -> Result<Provided, DependencyError> {
        self(resolver)
    }
}

/// 固定实例提供者
pub struct InstanceProvider {
    instance: Instance,
}

impl InstanceProvider {
    /// 创建固定实例提供者
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            instance: Arc::new(value),
        }
    }

    /// 使用已共享的实例
    pub fn shared(instance: Instance) -> Self {
        Self { instance }
    }
}

impl Provider for InstanceProvider {
    fn provide(&self, _resolver: &dyn Resolver) -> Result<Provided, DependencyError> {
        Ok(Provided::Shared(Arc::clone(&self.instance)))
    }
}

/// 工厂提供者，每次解析调用一次工厂
pub struct FactoryProvider<T, F> {
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> FactoryProvider<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync,
{
    /// 创建工厂提供者
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _marker: PhantomData,
        }
    }
}

impl<T, F> Provider for FactoryProvider<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&dyn Resolver) -> Result<T, DependencyError> + Send + Sync,
{
    fn provide(&self, resolver: &dyn Resolver) -> Result<Provided, DependencyError> {
        (self.factory)(resolver).map(Provided::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Settings {
        host: String,
    }

    fn host_of(value: &dyn Any) -> Option<&dyn Any> {
        value
            .downcast_ref::<Settings>()
            .map(|s| &s.host as &dyn Any)
    }

    #[test]
    fn projection_points_into_the_root() {
        let root: Instance = Arc::new(Settings {
            host: "db.local".into(),
        });
        let provided = Provided::projected(Arc::clone(&root), host_of);

        let host: Injected<String> = provided.typed(&DependencyKey::named::<String>("host")).unwrap();
        let expected = &root.downcast_ref::<Settings>().unwrap().host;

        assert!(std::ptr::eq(&*host, expected));
        assert!(host.shared().is_none());
    }

    #[test]
    fn wrong_type_is_a_mismatch() {
        let provided = Provided::new(7_u16);
        let err = provided.typed::<String>(&DependencyKey::of::<String>()).unwrap_err();

        assert!(matches!(err, DependencyError::TypeMismatch { .. }));
    }
}
