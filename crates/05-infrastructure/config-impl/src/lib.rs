//! # Configuration Implementation
//!
//! 配置的具体实现。
//!
//! ## 主要组件
//!
//! - [`ConfigPathBinder`] - 把配置树展开为按路径寻址的延迟绑定
//! - [`BindingPath`] - 一条绑定路径及其访问步骤
//! - [`ConfigurationLoader`] - 从文件和环境变量加载配置

pub mod binder;
pub mod loader;

pub use binder::*;
pub use loader::*;

#[cfg(test)]
mod tests;
