//! 延迟槽位
//!
//! 配置、运行环境、命令行参数和引导对象都在容器阶段构建之后才由外部写入。
//! [`DeferredSlot`] 在一次运行内只能写入一次，[`ReplaceableSlot`] 可以反复替换；
//! 写入前读取都返回 [`DependencyError::NotYetAvailable`]。

use crate::container::Resolver;
use crate::provider::{Instance, Provided, Provider};
use infrastructure_common::{ConfigurationError, DependencyError, SlotKind};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 写入一次的延迟槽位
pub struct DeferredSlot<T> {
    kind: SlotKind,
    cell: OnceCell<Arc<T>>,
}

impl<T: Any + Send + Sync> DeferredSlot<T> {
    /// 创建空槽位
    pub fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            cell: OnceCell::new(),
        }
    }

    /// 槽位种类
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// 写入值
    pub fn set(&self, value: Arc<T>) -> Result<(), ConfigurationError> {
        self.cell
            .set(value)
            .map_err(|_| ConfigurationError::SlotAlreadySet { slot: self.kind })?;
        debug!("{}槽位已设置: {}", self.kind, std::any::type_name::<T>());
        Ok(())
    }

    /// 读取值
    pub fn get(&self) -> Result<Arc<T>, DependencyError> {
        self.cell
            .get()
            .cloned()
            .ok_or(DependencyError::NotYetAvailable { slot: self.kind })
    }

    /// 是否已写入
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }

    /// 以共享实例形式读取
    pub fn instance(&self) -> Result<Instance, DependencyError> {
        let value: Instance = self.get()?;
        Ok(value)
    }
}

impl<T> fmt::Debug for DeferredSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredSlot")
            .field("kind", &self.kind)
            .field("set", &self.cell.get().is_some())
            .finish()
    }
}

/// 可替换的延迟槽位，后一次写入覆盖前一次
pub struct ReplaceableSlot<T> {
    kind: SlotKind,
    value: RwLock<Option<Arc<T>>>,
}

impl<T: Any + Send + Sync> ReplaceableSlot<T> {
    /// 创建空槽位
    pub fn new(kind: SlotKind) -> Self {
        Self {
            kind,
            value: RwLock::new(None),
        }
    }

    /// 槽位种类
    pub fn kind(&self) -> SlotKind {
        self.kind
    }

    /// 写入值，返回被替换的旧值
    pub fn replace(&self, value: Arc<T>) -> Option<Arc<T>> {
        let previous = self.value.write().replace(value);
        debug!(
            "{}槽位已{}: {}",
            self.kind,
            if previous.is_some() { "替换" } else { "设置" },
            std::any::type_name::<T>()
        );
        previous
    }

    /// 读取值
    pub fn get(&self) -> Result<Arc<T>, DependencyError> {
        self.value
            .read()
            .clone()
            .ok_or(DependencyError::NotYetAvailable { slot: self.kind })
    }

    /// 是否已写入
    pub fn is_set(&self) -> bool {
        self.value.read().is_some()
    }
}

impl<T> fmt::Debug for ReplaceableSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplaceableSlot")
            .field("kind", &self.kind)
            .field("set", &self.value.read().is_some())
            .finish()
    }
}

/// 可以被 [`SlotProvider`] 读取的槽位
pub trait SlotSource: Send + Sync + 'static {
    /// 以共享实例形式读取当前值
    fn current(&self) -> Result<Instance, DependencyError>;
}

impl<T: Any + Send + Sync> SlotSource for DeferredSlot<T> {
    fn current(&self) -> Result<Instance, DependencyError> {
        self.instance()
    }
}

impl<T: Any + Send + Sync> SlotSource for ReplaceableSlot<T> {
    fn current(&self) -> Result<Instance, DependencyError> {
        let value: Instance = self.get()?;
        Ok(value)
    }
}

/// 读取槽位的提供者，每次解析都读取槽位的当前值
pub struct SlotProvider<S> {
    slot: Arc<S>,
}

impl<S> SlotProvider<S> {
    /// 创建槽位提供者
    pub fn new(slot: Arc<S>) -> Self {
        Self { slot }
    }
}

impl<S: SlotSource> Provider for SlotProvider<S> {
    fn provide(&self, _resolver: &dyn Resolver) -> Result<Provided, DependencyError> {
        self.slot.current().map(Provided::Shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_slot_is_not_yet_available() {
        let slot = DeferredSlot::<String>::new(SlotKind::Namespace);

        let err = slot.get().unwrap_err();
        assert!(matches!(
            err,
            DependencyError::NotYetAvailable {
                slot: SlotKind::Namespace
            }
        ));
    }

    #[test]
    fn slot_is_written_once() {
        let slot = DeferredSlot::new(SlotKind::Configuration);
        slot.set(Arc::new(42_u32)).unwrap();

        let err = slot.set(Arc::new(7)).unwrap_err();
        assert!(matches!(err, ConfigurationError::SlotAlreadySet { .. }));
        assert_eq!(*slot.get().unwrap(), 42);
    }

    #[test]
    fn replaceable_slot_keeps_latest_value() {
        let slot = ReplaceableSlot::new(SlotKind::Namespace);
        assert!(!slot.is_set());

        assert!(slot.replace(Arc::new("first".to_string())).is_none());
        let previous = slot.replace(Arc::new("second".to_string())).unwrap();

        assert_eq!(previous.as_str(), "first");
        assert_eq!(slot.get().unwrap().as_str(), "second");
    }

    #[test]
    fn unset_replaceable_slot_is_not_yet_available() {
        let slot = ReplaceableSlot::<String>::new(SlotKind::Namespace);

        let err = slot.current().unwrap_err();
        assert!(matches!(
            err,
            DependencyError::NotYetAvailable {
                slot: SlotKind::Namespace
            }
        ));
    }
}
