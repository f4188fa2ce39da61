//! 命令与扩展包契约

use crate::composer::Composer;
use crate::host::bootstrap::Bootstrap;
use crate::host::environment::Environment;
use infrastructure_common::{CommandShape, InfrastructureError, TypeInfo};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 解析后的命令行参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    values: BTreeMap<String, String>,
}

impl Namespace {
    /// 创建空的参数集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置参数
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// 设置参数
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// 读取参数
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// 参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 一次命令调用携带的数据
pub struct Invocation<C> {
    /// 引导对象
    pub bootstrap: Arc<Bootstrap<C>>,
    /// 命令行参数
    pub namespace: Namespace,
    /// 已加载的配置
    pub configuration: Option<Arc<C>>,
    /// 已创建的运行环境
    pub environment: Option<Arc<Environment>>,
}

impl<C> Invocation<C> {
    /// 只带引导对象和参数的调用
    pub fn new(bootstrap: Arc<Bootstrap<C>>, namespace: Namespace) -> Self {
        Self {
            bootstrap,
            namespace,
            configuration: None,
            environment: None,
        }
    }

    /// 附带配置
    pub fn with_configuration(mut self, configuration: Arc<C>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// 附带运行环境
    pub fn with_environment(mut self, environment: Arc<Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// 去掉配置和运行环境的副本
    pub fn bare(&self) -> Self {
        Self::new(Arc::clone(&self.bootstrap), self.namespace.clone())
    }
}

/// 命令
pub trait Command<C>: Send + Sync + 'static {
    /// 命令名称
    fn name(&self) -> &str;

    /// 命令说明
    fn description(&self) -> &str {
        ""
    }

    /// 命令形态
    fn shape(&self) -> CommandShape;

    /// 具体类型，用于去重
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<Self>()
    }

    /// 初始化阶段结束后由组合器调用
    fn set_composer(&self, _composer: Composer<C>) {}

    /// 执行命令
    fn run(&self, invocation: &Invocation<C>) -> Result<(), InfrastructureError>;
}

/// 带配置的扩展包
pub trait ConfiguredBundle<C>: Send + Sync + 'static {
    /// 扩展包名称
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 引导阶段初始化
    fn initialize(&self, bootstrap: &mut Bootstrap<C>) -> Result<(), InfrastructureError>;

    /// 服务运行
    fn run(
        &self,
        configuration: &Arc<C>,
        environment: &Arc<Environment>,
    ) -> Result<(), InfrastructureError>;
}
