//! 元数据定义
//!
//! 提供类型身份和包路径信息。自动发现与配置绑定都以完整类型路径
//! (`std::any::type_name`) 的前缀来判断一个类型属于哪个包。

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型信息
#[derive(Clone, Copy)]
pub struct TypeInfo {
    /// 完整类型名称，包含模块路径与泛型参数
    pub name: &'static str,
    /// 类型ID
    pub id: TypeId,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// 是否为类型 `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// 去掉泛型参数之后的完整路径
    pub fn path(&self) -> &'static str {
        self.name.split('<').next().unwrap_or(self.name)
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        let path = self.path();
        path.rsplit("::").next().unwrap_or(path)
    }

    /// 类型所在的包（模块路径）
    pub fn package(&self) -> &'static str {
        let path = self.path();
        path.rfind("::").map_or("", |idx| &path[..idx])
    }

    /// 完整类型路径是否以任一前缀开头
    pub fn in_any_package<S: AsRef<str>>(&self, prefixes: &[S]) -> bool {
        prefixes
            .iter()
            .any(|prefix| self.name.starts_with(prefix.as_ref()))
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod settings {
        pub struct DbConfig;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn names_are_split_from_the_full_path() {
        let info = TypeInfo::of::<settings::DbConfig>();

        assert_eq!(info.short_name(), "DbConfig");
        assert!(info.package().ends_with("metadata::tests::settings"));
        assert!(info.is::<settings::DbConfig>());
    }

    #[test]
    fn generic_arguments_do_not_leak_into_the_package() {
        let info = TypeInfo::of::<settings::Wrapper<String>>();

        assert_eq!(info.short_name(), "Wrapper");
        assert!(info.package().ends_with("settings"));
    }

    #[test]
    fn package_prefix_matching() {
        let info = TypeInfo::of::<settings::DbConfig>();
        let own = info.package().to_string();

        assert!(info.in_any_package(&[own]));
        assert!(!info.in_any_package(&["alloc::"]));
        assert!(!info.in_any_package::<&str>(&[]));
    }
}
