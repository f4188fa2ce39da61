//! 依赖解析接口
//!
//! [`Resolver`] 保持对象安全，类型化的便捷方法放在 [`ResolverExt`] 中。

use crate::key::DependencyKey;
use crate::provider::{Injected, Provided};
use infrastructure_common::DependencyError;
use std::any::Any;

/// 依赖解析器 trait
pub trait Resolver: Send + Sync {
    /// 按键解析
    fn resolve(&self, key: &DependencyKey) -> Result<Provided, DependencyError>;

    /// 是否能找到该键的绑定（包括父级）
    fn contains(&self, key: &DependencyKey) -> bool;
}

/// 类型化解析的便捷方法
pub trait ResolverExt: Resolver {
    /// 解析无限定名的类型
    fn get<T: Any>(&self) -> Result<Injected<T>, DependencyError> {
        self.get_key(&DependencyKey::of::<T>())
    }

    /// 解析带限定名的类型
    fn get_named<T: Any>(&self, qualifier: &str) -> Result<Injected<T>, DependencyError> {
        self.get_key(&DependencyKey::named::<T>(qualifier))
    }

    /// 按键解析并检查类型
    fn get_key<T: Any>(&self, key: &DependencyKey) -> Result<Injected<T>, DependencyError> {
        self.resolve(key)?.typed(key)
    }

    /// 可选解析：绑定不存在或值缺失时返回 `None`，其他错误照常返回
    fn get_optional<T: Any>(&self, key: &DependencyKey) -> Result<Option<Injected<T>>, DependencyError> {
        match self.get_key(key) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_missing() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}
