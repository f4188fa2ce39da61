//! 依赖键

use infrastructure_common::{DependencyError, TypeInfo};
use std::fmt;

/// 依赖键：目标类型加可选限定名
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DependencyKey {
    /// 目标类型
    pub type_info: TypeInfo,
    /// 限定名
    pub qualifier: Option<String>,
}

impl DependencyKey {
    /// 无限定名的键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: None,
        }
    }

    /// 带限定名的键
    pub fn named<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// 从类型信息和限定名推导键，空白限定名视为无效
    pub fn derive(type_info: TypeInfo, qualifier: Option<&str>) -> Result<Self, DependencyError> {
        match qualifier {
            Some(q) if q.trim().is_empty() => Err(DependencyError::InvalidQualifier {
                qualifier: q.to_string(),
            }),
            Some(q) => Ok(Self {
                type_info,
                qualifier: Some(q.to_string()),
            }),
            None => Ok(Self {
                type_info,
                qualifier: None,
            }),
        }
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}@{}", self.type_info.short_name(), q),
            None => f.write_str(self.type_info.short_name()),
        }
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "Key<{}>(\"{}\")", self.type_info.name, q),
            None => write!(f, "Key<{}>", self.type_info.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifier_distinguishes_keys() {
        assert_ne!(DependencyKey::of::<String>(), DependencyKey::named::<String>("db.host"));
        assert_eq!(DependencyKey::named::<String>("db.host").to_string(), "String@db.host");
    }

    #[test]
    fn blank_qualifier_is_rejected() {
        let err = DependencyKey::derive(TypeInfo::of::<u16>(), Some("  ")).unwrap_err();
        assert!(matches!(err, DependencyError::InvalidQualifier { .. }));
    }
}
