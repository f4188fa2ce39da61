//! 容器阶段与阶段策略

use std::fmt;

/// 容器阶段，按 Init → Environment → Module 单向创建
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerStage {
    /// 初始化阶段，不依赖配置和运行环境
    Init,
    /// 运行环境阶段，配置和运行环境在此可用
    Environment,
    /// 模块阶段，次级模块在此安装
    Module,
}

impl ContainerStage {
    /// 该阶段的父阶段
    pub fn parent(self) -> Option<Self> {
        match self {
            Self::Init => None,
            Self::Environment => Some(Self::Init),
            Self::Module => Some(Self::Environment),
        }
    }

    /// 能否作为 `parent` 的子阶段创建
    pub fn follows(self, parent: Self) -> bool {
        self.parent() == Some(parent)
    }
}

impl fmt::Display for ContainerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Environment => "Environment",
            Self::Module => "Module",
        };
        f.write_str(name)
    }
}

/// 阶段策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StagePolicy {
    /// 开发模式，单例延迟创建
    Development,
    /// 生产模式，急切单例在阶段构建时创建
    #[default]
    Production,
    /// 工具模式，与开发模式一样不创建急切单例，单例在首次解析时创建
    Tool,
}

impl StagePolicy {
    /// 是否在阶段构建时创建急切单例
    pub fn eager_singletons(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_follow_in_one_direction() {
        assert!(ContainerStage::Environment.follows(ContainerStage::Init));
        assert!(ContainerStage::Module.follows(ContainerStage::Environment));
        assert!(!ContainerStage::Module.follows(ContainerStage::Init));
        assert!(!ContainerStage::Init.follows(ContainerStage::Module));
    }

    #[test]
    fn only_production_is_eager() {
        assert!(StagePolicy::default().eager_singletons());
        assert!(!StagePolicy::Development.eager_singletons());
        assert!(!StagePolicy::Tool.eager_singletons());
    }
}
