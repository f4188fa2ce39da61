//! 分阶段容器组合器
//!
//! 组合器持有阶段层级和每次运行的槽位。Init 阶段在引导时创建一次，
//! Environment 和 Module 阶段每次运行重新创建。

use crate::auto_config::AutoConfig;
use crate::environment_module::{EnvironmentModule, RunContext};
use crate::host::{
    ApplicationContext, Bootstrap, ConfiguredBundle, ContextListener, Environment, Invocation,
    Namespace,
};
use crate::manifest::ComponentManifest;
use config_abstractions::ConfigNode;
use config_impl::ConfigPathBinder;
use di_abstractions::{ContainerStage, Module, Resolver, StagePolicy};
use di_impl::StageContainer;
use infrastructure_common::{
    ConfigurationError, DependencyError, InfrastructureError, LifecycleError,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, info_span};

/// 请求作用域过滤器名称
pub const REQUEST_SCOPE_FILTER: &str = "RequestScopeFilter";

/// 由容器生成上下文监听器
pub type ListenerGenerator =
    Arc<dyn Fn(&dyn Resolver) -> Result<Arc<dyn ContextListener>, DependencyError> + Send + Sync>;

/// 组合器构建器
pub struct ComposerBuilder<C> {
    auto_config: Option<AutoConfig<C>>,
    modules: Vec<Arc<dyn Module>>,
    init_modules: Vec<Arc<dyn Module>>,
    listeners: Vec<ListenerGenerator>,
    config_packages: Vec<String>,
}

impl<C: ConfigNode> ComposerBuilder<C> {
    /// 创建构建器
    pub fn new() -> Self {
        Self {
            auto_config: None,
            modules: Vec::new(),
            init_modules: Vec::new(),
            listeners: Vec::new(),
            config_packages: Vec::new(),
        }
    }

    /// 添加 Module 阶段模块，安装时可以读取配置和运行环境
    pub fn add_module(mut self, module: Arc<dyn Module>) -> Self {
        debug!("添加模块: {}", module.name());
        self.modules.push(module);
        self
    }

    /// 添加 Init 阶段模块，对扩展包和命令可见
    pub fn add_init_module(mut self, module: Arc<dyn Module>) -> Self {
        debug!("添加初始化模块: {}", module.name());
        self.init_modules.push(module);
        self
    }

    /// 添加上下文监听器生成器
    pub fn add_context_listener<F>(mut self, generator: F) -> Self
    where
        F: Fn(&dyn Resolver) -> Result<Arc<dyn ContextListener>, DependencyError>
            + Send
            + Sync
            + 'static,
    {
        self.listeners.push(Arc::new(generator));
        self
    }

    /// 设置配置包前缀，路径绑定只展开这些包内的配置类型
    pub fn config_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// 启用自动配置
    pub fn enable_auto_config<I, S>(
        mut self,
        manifest: ComponentManifest<C>,
        base_packages: I,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.auto_config.is_some() {
            return Err(ConfigurationError::AutoConfigAlreadyEnabled);
        }
        self.auto_config = Some(AutoConfig::new(manifest, base_packages)?);
        Ok(self)
    }

    /// 使用 Production 策略构建
    pub fn build(self) -> Result<Composer<C>, ConfigurationError> {
        self.build_with(StagePolicy::Production)
    }

    /// 使用指定策略构建
    pub fn build_with(self, policy: StagePolicy) -> Result<Composer<C>, ConfigurationError> {
        if self.modules.is_empty() {
            return Err(ConfigurationError::EmptyModuleList);
        }
        let paths = ConfigPathBinder::new::<C>(&self.config_packages)?;

        info!(
            "组合器已构建: 策略 {:?}, {} 个模块, {} 个初始化模块, 自动配置 {}",
            policy,
            self.modules.len(),
            self.init_modules.len(),
            self.auto_config.is_some()
        );
        Ok(Composer {
            inner: Arc::new(ComposerInner {
                policy,
                auto_config: self.auto_config,
                modules: self.modules,
                init_modules: self.init_modules,
                listeners: self.listeners,
                paths: Arc::new(paths),
                stages: Arc::new(StageTracker::default()),
                run: RwLock::new(None),
            }),
        })
    }
}

impl<C: ConfigNode> Default for ComposerBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ComposerBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposerBuilder")
            .field("auto_config", &self.auto_config)
            .field("modules", &self.modules.len())
            .field("init_modules", &self.init_modules.len())
            .field("listeners", &self.listeners.len())
            .field("config_packages", &self.config_packages)
            .finish()
    }
}

#[derive(Default)]
struct StageTracker {
    init: RwLock<Option<Arc<StageContainer>>>,
    current: RwLock<Option<Arc<StageContainer>>>,
}

impl StageTracker {
    fn most_specific(&self) -> Option<Arc<StageContainer>> {
        self.current
            .read()
            .clone()
            .or_else(|| self.init.read().clone())
    }
}

struct ComposerInner<C> {
    policy: StagePolicy,
    auto_config: Option<AutoConfig<C>>,
    modules: Vec<Arc<dyn Module>>,
    init_modules: Vec<Arc<dyn Module>>,
    listeners: Vec<ListenerGenerator>,
    paths: Arc<ConfigPathBinder>,
    stages: Arc<StageTracker>,
    run: RwLock<Option<Arc<RunContext<C>>>>,
}

/// 分阶段容器组合器
pub struct Composer<C> {
    inner: Arc<ComposerInner<C>>,
}

impl<C> Clone for Composer<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ConfigNode> Composer<C> {
    /// 创建构建器
    pub fn builder() -> ComposerBuilder<C> {
        ComposerBuilder::new()
    }

    /// 阶段策略
    pub fn policy(&self) -> StagePolicy {
        self.inner.policy
    }

    /// 配置路径绑定器
    pub fn path_binder(&self) -> &ConfigPathBinder {
        &self.inner.paths
    }

    /// 自动配置
    pub fn auto_config(&self) -> Option<&AutoConfig<C>> {
        self.inner.auto_config.as_ref()
    }

    /// 当前运行上下文
    pub fn run_context(&self) -> Option<Arc<RunContext<C>>> {
        self.inner.run.read().clone()
    }

    /// 引导阶段：创建 Init 阶段，登记扩展包和命令，再把组合器交给每个命令
    pub fn initialize(&self, bootstrap: &mut Bootstrap<C>) -> Result<(), InfrastructureError> {
        let init = StageContainer::root(self.inner.policy, &self.inner.init_modules)?;
        *self.inner.stages.init.write() = Some(Arc::clone(&init));
        *self.inner.stages.current.write() = None;

        if let Some(auto_config) = &self.inner.auto_config {
            auto_config.initialize(bootstrap, &*init)?;
        }

        for command in bootstrap.commands() {
            command.set_composer(self.clone());
        }
        info!(
            "组合器初始化完成: {} 个命令, {} 个扩展包",
            bootstrap.commands().len(),
            bootstrap.bundle_count()
        );
        Ok(())
    }

    /// 服务运行：创建 Environment 和 Module 阶段并登记到宿主
    pub fn run(
        &self,
        configuration: Arc<C>,
        environment: Arc<Environment>,
    ) -> Result<Arc<StageContainer>, InfrastructureError> {
        let run = self.begin_run();
        let span = info_span!("composer_run", run_id = %run.id(), mode = "serve");
        let _entered = span.enter();

        run.configuration().set(configuration)?;
        run.environment().set(Arc::clone(&environment))?;

        let context = Arc::clone(environment.application_context());
        let container = self.create_stages(&run, Some(Arc::clone(&context)), true)?;

        environment
            .dispatch()
            .replace_container(Arc::clone(&container) as Arc<dyn Resolver>);
        environment
            .servlets()
            .add_filter(REQUEST_SCOPE_FILTER, format!("{}*", context.context_path()));

        for generator in &self.inner.listeners {
            let listener = generator(&*container)?;
            environment.servlets().add_listener(listener);
        }

        if let Some(auto_config) = &self.inner.auto_config {
            auto_config.run(&environment, &*container)?;
        }

        self.install(&container);
        info!("服务运行已装配: {} 阶段", container.stage());
        Ok(container)
    }

    /// 命令运行：有配置时才创建 Module 阶段
    pub fn run_command(
        &self,
        invocation: &Invocation<C>,
    ) -> Result<Arc<StageContainer>, InfrastructureError> {
        let run = self.begin_run();
        let span = info_span!("composer_run", run_id = %run.id(), mode = "command");
        let _entered = span.enter();

        run.bootstrap().set(Arc::clone(&invocation.bootstrap))?;
        if let Some(configuration) = &invocation.configuration {
            run.configuration().set(Arc::clone(configuration))?;
        }
        if let Some(environment) = &invocation.environment {
            run.environment().set(Arc::clone(environment))?;
        }

        let context = invocation
            .environment
            .as_ref()
            .map(|environment| Arc::clone(environment.application_context()));
        let container =
            self.create_stages(&run, context, invocation.configuration.is_some())?;

        self.install(&container);
        info!("命令运行已装配: {} 阶段", container.stage());
        Ok(container)
    }

    /// 写入当前运行的命令行参数，已有的参数被替换
    pub fn set_namespace(&self, namespace: Namespace) -> Result<(), InfrastructureError> {
        let run = self.run_context().ok_or(LifecycleError::NoActiveRun)?;
        if run.namespace().replace(Arc::new(namespace)).is_some() {
            debug!("运行 {} 的命令行参数已替换", run.id());
        }
        Ok(())
    }

    /// 当前最具体阶段的句柄
    pub fn injector(&self) -> ContainerHandle {
        ContainerHandle {
            stages: Arc::clone(&self.inner.stages),
        }
    }

    fn begin_run(&self) -> Arc<RunContext<C>> {
        let run = Arc::new(RunContext::new());
        *self.inner.run.write() = Some(Arc::clone(&run));
        *self.inner.stages.current.write() = None;
        debug!("新的运行上下文: {}", run.id());
        run
    }

    fn create_stages(
        &self,
        run: &Arc<RunContext<C>>,
        context: Option<Arc<ApplicationContext>>,
        with_modules: bool,
    ) -> Result<Arc<StageContainer>, InfrastructureError> {
        let init = self
            .inner
            .stages
            .init
            .read()
            .clone()
            .ok_or(LifecycleError::NotInitialized)?;

        let environment_module: Arc<dyn Module> = Arc::new(EnvironmentModule::new(
            Arc::clone(run),
            Arc::clone(&self.inner.paths),
            context,
        ));
        let environment_stage =
            init.create_child(ContainerStage::Environment, &[environment_module])?;
        if !with_modules {
            return Ok(environment_stage);
        }

        let module_stage =
            environment_stage.create_child(ContainerStage::Module, &self.inner.modules)?;
        Ok(module_stage)
    }

    /// 运行装配完成后才成为最具体的阶段
    fn install(&self, container: &Arc<StageContainer>) {
        *self.inner.stages.current.write() = Some(Arc::clone(container));
    }
}

impl<C: ConfigNode> ConfiguredBundle<C> for Composer<C> {
    fn name(&self) -> &str {
        "Composer"
    }

    fn initialize(&self, bootstrap: &mut Bootstrap<C>) -> Result<(), InfrastructureError> {
        Composer::initialize(self, bootstrap)
    }

    fn run(
        &self,
        configuration: &Arc<C>,
        environment: &Arc<Environment>,
    ) -> Result<(), InfrastructureError> {
        Composer::run(self, Arc::clone(configuration), Arc::clone(environment)).map(|_| ())
    }
}

impl<C> fmt::Debug for Composer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("policy", &self.inner.policy)
            .field("modules", &self.inner.modules.len())
            .field("init_modules", &self.inner.init_modules.len())
            .field("paths", &self.inner.paths.paths().len())
            .finish_non_exhaustive()
    }
}

/// 组合器的容器句柄
///
/// 每次调用 [`ContainerHandle::get`] 都返回当时最具体的阶段。
#[derive(Clone)]
pub struct ContainerHandle {
    stages: Arc<StageTracker>,
}

impl ContainerHandle {
    /// 最具体的阶段：Module，其次 Environment，最后 Init
    pub fn get(&self) -> Result<Arc<StageContainer>, LifecycleError> {
        self.stages
            .most_specific()
            .ok_or(LifecycleError::NotInitialized)
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("stage", &self.stages.most_specific().map(|s| s.stage()))
            .finish()
    }
}
