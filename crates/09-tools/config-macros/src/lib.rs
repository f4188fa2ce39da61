//! # Config Macros
//!
//! 这个 crate 提供生成配置访问表的过程宏。
//!
//! ## 核心宏
//!
//! - [`ConfigNode`](macro@ConfigNode) - 为配置结构体或枚举生成 `ConfigNode` 实现
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use config_abstractions::ConfigNode;
//!
//! #[derive(ConfigNode)]
//! pub struct DbConfig {
//!     pub host: String,
//!     pub port: Option<u16>,
//! }
//!
//! #[derive(ConfigNode)]
//! pub struct AppConfig {
//!     #[config(nested)]
//!     pub db: DbConfig,
//! }
//! ```

use proc_macro::TokenStream;

mod attrs;
mod config_node;

// Re-exports are not allowed in proc-macro crates

/// 生成配置访问表
///
/// # 字段属性
///
/// - `#[config(nested)]` - 字段类型也实现了 `ConfigNode`，可继续展开
/// - `#[config(base)]` - 内嵌的父配置，其字段视为当前类型的字段
/// - `#[config(skip)]` - 不出现在访问表中
///
/// 字段类型外层的 `Option`、`Box`、`Arc` 会被剥离，`Option` 字段允许为空。
#[proc_macro_derive(ConfigNode, attributes(config))]
pub fn derive_config_node(input: TokenStream) -> TokenStream {
    config_node::config_node_impl(input)
}
