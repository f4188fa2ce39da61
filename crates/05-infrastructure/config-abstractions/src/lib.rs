//! # Configuration Abstractions
//!
//! 配置抽象层，定义配置树的类型化访问表。
//!
//! ## 核心接口
//!
//! - [`ConfigNode`] - 可被路径绑定的配置节点
//! - [`ConfigSchema`] - 节点的字段表与父配置链
//! - [`FieldSchema`] - 单个字段：名称、类型、读取函数
//!
//! 访问表通常由 `#[derive(ConfigNode)]` 生成，不在运行时做字段反射。

extern crate self as config_abstractions;

pub mod schema;

pub use config_macros::ConfigNode;
pub use infrastructure_common::TypeInfo;
pub use schema::*;
