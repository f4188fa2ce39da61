//! # 依赖注入具体实现
//!
//! 提供分层的阶段容器和入口调用器。
//!
//! 每个 [`StageContainer`] 是一层独立的绑定映射，查找时先查自身，再逐级查父层。
//! 子层中的键会遮蔽父层中相同的键。

pub mod container;
pub mod invoker;

pub use container::StageContainer;
pub use invoker::{find_entry_point, invoke_entry_point, resolve_arguments};
