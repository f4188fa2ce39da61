//! 组件分类
//!
//! 发现注册表按能力类别把组件登记到宿主的不同生命周期阶段。
//! 类别由两类判定得出：是否为某个超类型的子类型，或者是否带有某个标记。

use crate::metadata::TypeInfo;
use std::collections::BTreeMap;
use std::fmt;

/// 能力类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    HealthCheck,
    Provider,
    InjectableProvider,
    Resource,
    Task,
    Managed,
    Bundle,
    Command,
}

impl Capability {
    /// 运行阶段的登记顺序
    pub const RUN_PHASE: [Self; 6] = [
        Self::HealthCheck,
        Self::Provider,
        Self::InjectableProvider,
        Self::Resource,
        Self::Task,
        Self::Managed,
    ];

    /// 初始化阶段的登记顺序
    pub const INIT_PHASE: [Self; 2] = [Self::Bundle, Self::Command];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HealthCheck => "健康检查",
            Self::Provider => "提供者",
            Self::InjectableProvider => "可注入提供者",
            Self::Resource => "资源",
            Self::Task => "管理任务",
            Self::Managed => "托管对象",
            Self::Bundle => "扩展包",
            Self::Command => "命令",
        };
        f.write_str(name)
    }
}

/// 命令形态
///
/// 基础命令加上五种派生形态，自动发现会取它们子类型的并集。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandShape {
    /// 普通命令，只拿到引导对象和命令行参数
    Plain,
    /// 需要配置文件的命令
    Configured,
    /// 需要完整运行环境的命令
    Environment,
    /// 由容器解析入口参数的普通命令
    Injected,
    /// 由容器解析入口参数的配置命令
    InjectedConfigured,
    /// 由容器解析入口参数的运行环境命令
    InjectedEnvironment,
}

impl CommandShape {
    /// 所有可识别的命令形态
    pub const ALL: [Self; 6] = [
        Self::Plain,
        Self::Configured,
        Self::Environment,
        Self::Injected,
        Self::InjectedConfigured,
        Self::InjectedEnvironment,
    ];

    /// 是否需要配置
    pub fn requires_configuration(self) -> bool {
        !matches!(self, Self::Plain | Self::Injected)
    }

    /// 是否由组合器完成注入
    pub fn is_injected(self) -> bool {
        matches!(
            self,
            Self::Injected | Self::InjectedConfigured | Self::InjectedEnvironment
        )
    }

    /// 对应的注入形态，非注入形态返回 `None`
    pub fn injected(self) -> Option<InjectedShape> {
        match self {
            Self::Injected => Some(InjectedShape::Injected),
            Self::InjectedConfigured => Some(InjectedShape::InjectedConfigured),
            Self::InjectedEnvironment => Some(InjectedShape::InjectedEnvironment),
            Self::Plain | Self::Configured | Self::Environment => None,
        }
    }
}

/// 由组合器完成注入的三种命令形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectedShape {
    /// 只创建 Environment 阶段
    Injected,
    /// 需要配置，额外创建 Module 阶段
    InjectedConfigured,
    /// 复用服务运行已经创建的阶段
    InjectedEnvironment,
}

impl InjectedShape {
    /// 是否需要配置
    pub fn requires_configuration(self) -> bool {
        CommandShape::from(self).requires_configuration()
    }
}

impl From<InjectedShape> for CommandShape {
    fn from(shape: InjectedShape) -> Self {
        match shape {
            InjectedShape::Injected => Self::Injected,
            InjectedShape::InjectedConfigured => Self::InjectedConfigured,
            InjectedShape::InjectedEnvironment => Self::InjectedEnvironment,
        }
    }
}

/// 可被子类型判定的超类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Supertype {
    InjectableHealthCheck,
    InjectableProvider,
    Task,
    Managed,
    Bundle,
    Command(CommandShape),
}

/// 类型标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// 请求分发提供者
    Provider,
    /// 带路由路径的资源
    Path,
}

/// 分类依据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classifier {
    SubtypeOf(Supertype),
    AnnotatedWith(Marker),
}

impl Classifier {
    /// 分类依据对应的能力类别
    pub fn capability(self) -> Capability {
        match self {
            Self::SubtypeOf(Supertype::InjectableHealthCheck) => Capability::HealthCheck,
            Self::SubtypeOf(Supertype::InjectableProvider) => Capability::InjectableProvider,
            Self::SubtypeOf(Supertype::Task) => Capability::Task,
            Self::SubtypeOf(Supertype::Managed) => Capability::Managed,
            Self::SubtypeOf(Supertype::Bundle) => Capability::Bundle,
            Self::SubtypeOf(Supertype::Command(_)) => Capability::Command,
            Self::AnnotatedWith(Marker::Provider) => Capability::Provider,
            Self::AnnotatedWith(Marker::Path) => Capability::Resource,
        }
    }
}

/// 组件描述符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    /// 类型信息
    pub type_info: TypeInfo,
    /// 能力类别
    pub category: Capability,
    /// 分类依据
    pub classifier: Classifier,
    /// 附加属性，例如资源的路由路径
    pub attributes: BTreeMap<String, String>,
}

impl ComponentDescriptor {
    /// 创建新的组件描述符
    pub fn new(type_info: TypeInfo, classifier: Classifier) -> Self {
        Self {
            type_info,
            category: classifier.capability(),
            classifier,
            attributes: BTreeMap::new(),
        }
    }

    /// 添加属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// 获取属性
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// 命令形态（仅命令组件有值）
    pub fn command_shape(&self) -> Option<CommandShape> {
        match self.classifier {
            Classifier::SubtypeOf(Supertype::Command(shape)) => Some(shape),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReportsResource;

    #[test]
    fn classifier_maps_to_category() {
        let descriptor = ComponentDescriptor::new(
            TypeInfo::of::<ReportsResource>(),
            Classifier::AnnotatedWith(Marker::Path),
        )
        .with_attribute("path", "/reports");

        assert_eq!(descriptor.category, Capability::Resource);
        assert_eq!(descriptor.attribute("path"), Some("/reports"));
        assert_eq!(descriptor.command_shape(), None);
    }

    #[test]
    fn command_shapes_report_configuration_needs() {
        assert!(!CommandShape::Injected.requires_configuration());
        assert!(CommandShape::InjectedConfigured.requires_configuration());
        assert!(CommandShape::InjectedEnvironment.is_injected());
        assert!(!CommandShape::Configured.is_injected());
    }

    #[test]
    fn only_injected_shapes_convert() {
        for shape in CommandShape::ALL {
            match shape.injected() {
                Some(injected) => {
                    assert!(shape.is_injected());
                    assert_eq!(CommandShape::from(injected), shape);
                    assert_eq!(
                        injected.requires_configuration(),
                        shape.requires_configuration()
                    );
                }
                None => assert!(!shape.is_injected()),
            }
        }
        assert_eq!(CommandShape::Configured.injected(), None);
        assert_eq!(CommandShape::Environment.injected(), None);
    }
}
