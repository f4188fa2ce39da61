//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义分阶段容器的绑定、解析与入口声明接口。
//!
//! ## 核心接口
//!
//! - [`DependencyKey`] - 目标类型加可选限定名
//! - [`Provider`] / [`Binding`] - 绑定的值来源与作用域
//! - [`Module`] / [`Binder`] - 模块向容器阶段安装绑定
//! - [`Resolver`] - 按键解析依赖
//! - [`DeferredSlot`] - 运行期才写入的槽位
//! - [`EntryPoint`] / [`Runnable`] - 显式声明的入口与参数列表

pub mod container;
pub mod deferred;
pub mod entry_point;
pub mod key;
pub mod module;
pub mod provider;
pub mod stage;

pub use container::*;
pub use deferred::*;
pub use entry_point::*;
pub use key::*;
pub use module::*;
pub use provider::*;
pub use stage::*;
