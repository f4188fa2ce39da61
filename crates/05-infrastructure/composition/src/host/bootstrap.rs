//! 引导阶段

use crate::host::command::{Command, ConfiguredBundle};
use crate::host::environment::Environment;
use infrastructure_common::{InfrastructureError, TypeInfo};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// 引导对象，持有扩展包和命令
pub struct Bootstrap<C> {
    application: String,
    bundles: Vec<Arc<dyn ConfiguredBundle<C>>>,
    commands: Vec<Arc<dyn Command<C>>>,
}

impl<C: Send + Sync + 'static> Bootstrap<C> {
    /// 创建引导对象
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            bundles: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// 应用名称
    pub fn application(&self) -> &str {
        &self.application
    }

    /// 添加扩展包，扩展包立即初始化
    pub fn add_bundle(
        &mut self,
        bundle: Arc<dyn ConfiguredBundle<C>>,
    ) -> Result<(), InfrastructureError> {
        bundle.initialize(self)?;
        info!("扩展包已初始化: {}", bundle.name());
        self.bundles.push(bundle);
        Ok(())
    }

    /// 添加命令
    pub fn add_command(&mut self, command: Arc<dyn Command<C>>) {
        info!("添加命令: {} ({:?})", command.name(), command.shape());
        self.commands.push(command);
    }

    /// 已添加的命令
    pub fn commands(&self) -> &[Arc<dyn Command<C>>] {
        &self.commands
    }

    /// 已添加命令的具体类型
    pub fn command_types(&self) -> Vec<TypeInfo> {
        self.commands
            .iter()
            .map(|command| command.type_info())
            .collect()
    }

    /// 按名称查找命令
    pub fn command(&self, name: &str) -> Option<Arc<dyn Command<C>>> {
        self.commands
            .iter()
            .find(|command| command.name() == name)
            .cloned()
    }

    /// 扩展包数量
    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    /// 按添加顺序运行全部扩展包
    pub fn run_bundles(
        &self,
        configuration: &Arc<C>,
        environment: &Arc<Environment>,
    ) -> Result<(), InfrastructureError> {
        for bundle in &self.bundles {
            bundle.run(configuration, environment)?;
        }
        Ok(())
    }
}

impl<C: 'static> fmt::Debug for Bootstrap<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("application", &self.application)
            .field("bundles", &self.bundles.len())
            .field(
                "commands",
                &self.commands.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
