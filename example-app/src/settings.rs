//! 示例应用配置

use config_abstractions::ConfigNode;
use serde::Deserialize;

/// 应用配置
#[derive(Debug, ConfigNode, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务名称
    pub name: String,
    /// 监听端口
    pub port: u16,
    /// 数据库配置
    #[config(nested)]
    pub database: DatabaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "example-app".to_string(),
            port: 8080,
            database: DatabaseConfig::default(),
        }
    }
}

/// 数据库配置
#[derive(Debug, ConfigNode, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库主机
    pub host: String,
    /// 数据库端口
    pub port: u16,
    /// 数据库名称
    pub database: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "example".to_string(),
            max_connections: 10,
        }
    }
}
