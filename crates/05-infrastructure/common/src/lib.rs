//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn Wiring 基础设施层的公共类型和契约。
//!
//! ## 核心组件
//!
//! - [`TypeInfo`] - 类型身份与包路径
//! - [`ComponentDescriptor`] - 组件发现后的分类结果
//! - [`HealthCheck`] / [`Managed`] / [`Task`] - 宿主生命周期契约
//! - [`InfrastructureError`] - 统一错误分类
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 静态声明的组件清单取代运行时扫描
//! - 错误按阶段区分，"尚未可用" 与 "不存在" 是不同的错误

pub mod component;
pub mod errors;
pub mod health;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use errors::*;
pub use health::*;
pub use lifecycle::*;
pub use metadata::*;
