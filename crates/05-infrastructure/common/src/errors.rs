//! 错误类型定义

use crate::component::Capability;
use std::fmt;
use thiserror::Error;

/// 由外部在运行期写入的槽位种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// 配置实例
    Configuration,
    /// 宿主运行环境
    Environment,
    /// 命令行参数命名空间
    Namespace,
    /// 引导对象
    Bootstrap,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "配置",
            Self::Environment => "运行环境",
            Self::Namespace => "命令行参数",
            Self::Bootstrap => "引导对象",
        };
        f.write_str(name)
    }
}

/// 启动期配置错误，出现即中止启动
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("自动配置至少需要一个基础包前缀")]
    EmptyBasePackages,

    #[error("基础包前缀不能为空字符串")]
    BlankBasePackage,

    #[error("自动配置已经启用，不能重复启用")]
    AutoConfigAlreadyEnabled,

    #[error("模块列表为空，至少需要添加一个模块")]
    EmptyModuleList,

    #[error("无法在 {type_name} 上找到字段 {field}")]
    FieldNotFound { field: String, type_name: String },

    #[error("配置路径无效: {path}")]
    InvalidPath { path: String },

    #[error("{type_name} 及其父命令均未声明入口，命令必须声明一个入口")]
    EntryPointNotFound { type_name: String },

    #[error("同一容器阶段内存在重复绑定: {key}")]
    DuplicateBinding { key: String },

    #[error("容器阶段顺序无效: 不能在 {parent} 之上创建 {child}")]
    InvalidStageTransition { parent: String, child: String },

    #[error("{slot}槽位在本次运行中已经设置过")]
    SlotAlreadySet { slot: SlotKind },

    #[error("急切单例创建失败: {key}, 原因: {source}")]
    EagerSingletonFailed {
        key: String,
        source: Box<DependencyError>,
    },

    #[error("模块安装失败: {module}, 原因: {message}")]
    ModuleFailed { module: String, message: String },

    #[error("{type_name} 被分类为{declared}，但清单提供的是{factory}工厂")]
    FactoryMismatch {
        type_name: String,
        declared: Capability,
        factory: Capability,
    },
}

/// 依赖解析错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("{slot}尚未设置。这通常是因为在引导阶段访问了运行环境")]
    NotYetAvailable { slot: SlotKind },

    #[error("绑定不存在: {key}")]
    BindingNotFound { key: String },

    #[error("值不存在: {key}，路径上的某个中间值为空")]
    ValueAbsent { key: String },

    #[error("类型不匹配: {key}, 期望 {expected}")]
    TypeMismatch { key: String, expected: String },

    #[error("限定名无效: {qualifier:?}")]
    InvalidQualifier { qualifier: String },

    #[error("组件创建失败: {type_name}, 原因: {message}")]
    ComponentCreationFailed { type_name: String, message: String },
}

impl DependencyError {
    /// 是否属于 "调用时机过早" 类错误
    pub fn is_not_yet_available(&self) -> bool {
        matches!(self, Self::NotYetAvailable { .. })
    }

    /// 是否可被可选依赖吸收
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::BindingNotFound { .. } | Self::ValueAbsent { .. })
    }

    /// 创建组件创建失败错误
    pub fn creation_failed(type_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            message: message.to_string(),
        }
    }
}

/// 单个入口参数的解析失败
#[derive(Debug)]
pub struct ParameterFailure {
    /// 参数位置，从 0 开始
    pub index: usize,
    /// 参数描述（类型与限定名）
    pub parameter: String,
    /// 失败原因
    pub error: DependencyError,
}

impl fmt::Display for ParameterFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.index, self.parameter, self.error)
    }
}

/// 入口参数解析的聚合错误
#[derive(Error, Debug)]
#[error("入口 {entry_point} 有 {} 个参数无法解析: {}", .failures.len(), join_failures(.failures))]
pub struct ResolutionError {
    /// 入口名称
    pub entry_point: String,
    /// 所有失败的参数
    pub failures: Vec<ParameterFailure>,
}

fn join_failures(failures: &[ParameterFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// 配置加载错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 生命周期管理错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("容器尚未初始化，必须先执行 initialize")]
    NotInitialized,

    #[error("当前没有进行中的运行")]
    NoActiveRun,

    #[error("注入命令 {command} 在没有组合器的情况下运行，应用是否正确初始化?")]
    ComposerMissing { command: String },

    #[error("命令 {command} 需要配置，但调用未提供配置")]
    MissingConfiguration { command: String },

    #[error("托管对象 {name} 失败: {message}")]
    ManagedFailed { name: String, message: String },

    #[error("管理任务不存在: {name}")]
    TaskNotFound { name: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigurationError {
        #[from]
        source: ConfigurationError,
    },

    #[error("配置加载错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("参数解析错误: {source}")]
    ResolutionError {
        #[from]
        source: ResolutionError,
    },

    #[error("生命周期错误: {source}")]
    LifecycleError {
        #[from]
        source: LifecycleError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("命令执行失败: {command}, 原因: {message}")]
    CommandFailed { command: String, message: String },
}

/// 结果类型别名
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
