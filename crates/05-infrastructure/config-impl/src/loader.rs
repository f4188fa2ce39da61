//! 配置加载器

use infrastructure_common::ConfigError;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// 从配置文件和环境变量加载根配置
///
/// 后添加的来源覆盖先添加的来源，环境变量最后生效。嵌套键在环境变量中用 `__` 分隔，
/// 例如 `APP_DATABASE__HOST` 对应 `database.host`。
#[derive(Debug, Clone, Default)]
pub struct ConfigurationLoader {
    files: Vec<(PathBuf, bool)>,
    env_prefix: Option<String>,
}

impl ConfigurationLoader {
    /// 创建空的加载器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加必须存在的配置文件
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), true));
        self
    }

    /// 添加可选的配置文件
    pub fn optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push((path.into(), false));
        self
    }

    /// 设置环境变量前缀
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// 加载并反序列化为配置类型
    pub fn load<C: DeserializeOwned>(&self) -> Result<C, ConfigError> {
        let mut builder = config::Config::builder();

        for (path, required) in &self.files {
            if *required && !path.exists() {
                error!("配置文件不存在: {}", path.display());
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("添加配置文件: {} (必需: {})", path.display(), required);
            builder = builder.add_source(config::File::from(path.clone()).required(*required));
        }

        if let Some(prefix) = &self.env_prefix {
            debug!("添加环境变量来源: {}_*", prefix);
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        let loaded = settings.try_deserialize::<C>().map_err(|e| {
            error!("配置反序列化失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

        info!(
            "配置已加载: {} ({} 个文件)",
            std::any::type_name::<C>(),
            self.files.len()
        );
        Ok(loaded)
    }
}
