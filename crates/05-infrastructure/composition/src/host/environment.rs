//! 宿主运行环境
//!
//! 运行环境持有宿主的各个注册表。注册表在一次运行中只追加，不删除，
//! 注册顺序即为生命周期回调的执行顺序。

use di_abstractions::{Instance, Resolver};
use infrastructure_common::{
    HealthCheck, HealthStatus, InjectableProvider, LifecycleError, Managed, Task, TypeInfo,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 应用上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationContext {
    context_path: String,
}

impl ApplicationContext {
    /// 创建应用上下文
    pub fn new(context_path: impl Into<String>) -> Self {
        Self {
            context_path: context_path.into(),
        }
    }

    /// 上下文路径，以 `/` 结尾
    pub fn context_path(&self) -> &str {
        &self.context_path
    }
}

/// 上下文监听器
pub trait ContextListener: Send + Sync {
    /// 监听器名称
    fn name(&self) -> &str;

    /// 上下文初始化完成
    fn context_initialized(&self, context: &ApplicationContext);
}

/// 宿主运行环境
pub struct Environment {
    name: String,
    application_context: Arc<ApplicationContext>,
    health_checks: HealthCheckRegistry,
    dispatch: DispatchRegistry,
    admin: AdminRegistry,
    lifecycle: LifecycleRegistry,
    servlets: ServletRegistry,
}

impl Environment {
    /// 创建运行环境，上下文路径默认为 `/`
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_context_path(name, "/")
    }

    /// 使用指定上下文路径创建运行环境
    pub fn with_context_path(name: impl Into<String>, context_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application_context: Arc::new(ApplicationContext::new(context_path)),
            health_checks: HealthCheckRegistry::default(),
            dispatch: DispatchRegistry::default(),
            admin: AdminRegistry::default(),
            lifecycle: LifecycleRegistry::default(),
            servlets: ServletRegistry::default(),
        }
    }

    /// 应用名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 应用上下文
    pub fn application_context(&self) -> &Arc<ApplicationContext> {
        &self.application_context
    }

    /// 健康检查注册表
    pub fn health_checks(&self) -> &HealthCheckRegistry {
        &self.health_checks
    }

    /// 请求分发注册表
    pub fn dispatch(&self) -> &DispatchRegistry {
        &self.dispatch
    }

    /// 管理任务注册表
    pub fn admin(&self) -> &AdminRegistry {
        &self.admin
    }

    /// 托管对象注册表
    pub fn lifecycle(&self) -> &LifecycleRegistry {
        &self.lifecycle
    }

    /// 过滤器与监听器注册表
    pub fn servlets(&self) -> &ServletRegistry {
        &self.servlets
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("name", &self.name)
            .field("context_path", &self.application_context.context_path)
            .field("health_checks", &self.health_checks.len())
            .field("resources", &self.dispatch.resource_paths())
            .field("tasks", &self.admin.task_names())
            .field("managed", &self.lifecycle.names())
            .finish_non_exhaustive()
    }
}

/// 健康检查注册表
#[derive(Default)]
pub struct HealthCheckRegistry {
    checks: RwLock<Vec<Arc<dyn HealthCheck>>>,
}

impl HealthCheckRegistry {
    /// 登记健康检查
    pub fn register(&self, check: Arc<dyn HealthCheck>) {
        debug!("登记健康检查: {}", check.name());
        self.checks.write().push(check);
    }

    /// 已登记的名称
    pub fn names(&self) -> Vec<String> {
        self.checks
            .read()
            .iter()
            .map(|check| check.name().to_string())
            .collect()
    }

    /// 已登记数量
    pub fn len(&self) -> usize {
        self.checks.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.checks.read().is_empty()
    }

    /// 按登记顺序执行全部健康检查
    pub async fn run_all(&self) -> BTreeMap<String, HealthStatus> {
        let checks: Vec<Arc<dyn HealthCheck>> = self.checks.read().clone();
        let mut results = BTreeMap::new();
        for check in checks {
            let status = check.check().await;
            if !status.is_healthy() {
                warn!("健康检查 {} 未通过: {:?}", check.name(), status);
            }
            results.insert(check.name().to_string(), status);
        }
        results
    }
}

/// 已登记的资源
#[derive(Clone)]
pub struct ResourceRegistration {
    /// 资源路径
    pub path: String,
    /// 资源类型
    pub type_info: TypeInfo,
    /// 资源实例
    pub instance: Instance,
}

impl fmt::Debug for ResourceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistration")
            .field("path", &self.path)
            .field("type_info", &self.type_info)
            .finish_non_exhaustive()
    }
}

/// 请求分发注册表
#[derive(Default)]
pub struct DispatchRegistry {
    providers: RwLock<Vec<(TypeInfo, Instance)>>,
    injectable_providers: RwLock<Vec<Arc<dyn InjectableProvider>>>,
    resources: RwLock<Vec<ResourceRegistration>>,
    container: RwLock<Option<Arc<dyn Resolver>>>,
}

impl DispatchRegistry {
    /// 登记提供者
    pub fn register_provider(&self, type_info: TypeInfo, instance: Instance) {
        debug!("登记提供者: {}", type_info);
        self.providers.write().push((type_info, instance));
    }

    /// 登记可注入提供者
    pub fn register_injectable_provider(&self, provider: Arc<dyn InjectableProvider>) {
        debug!("登记可注入提供者: {}", provider.provided_type());
        self.injectable_providers.write().push(provider);
    }

    /// 登记资源
    pub fn register_resource(&self, path: impl Into<String>, type_info: TypeInfo, instance: Instance) {
        let path = path.into();
        debug!("登记资源: {} -> {}", path, type_info);
        self.resources.write().push(ResourceRegistration {
            path,
            type_info,
            instance,
        });
    }

    /// 替换请求分发使用的容器
    pub fn replace_container(&self, container: Arc<dyn Resolver>) {
        info!("请求分发容器已替换");
        *self.container.write() = Some(container);
    }

    /// 当前请求分发容器
    pub fn container(&self) -> Option<Arc<dyn Resolver>> {
        self.container.read().clone()
    }

    /// 已登记的提供者类型
    pub fn provider_types(&self) -> Vec<TypeInfo> {
        self.providers.read().iter().map(|(ty, _)| *ty).collect()
    }

    /// 可注入提供者提供的类型
    pub fn injectable_provider_types(&self) -> Vec<TypeInfo> {
        self.injectable_providers
            .read()
            .iter()
            .map(|provider| provider.provided_type())
            .collect()
    }

    /// 已登记的资源路径
    pub fn resource_paths(&self) -> Vec<String> {
        self.resources
            .read()
            .iter()
            .map(|resource| resource.path.clone())
            .collect()
    }

    /// 按路径查找资源
    pub fn resource(&self, path: &str) -> Option<ResourceRegistration> {
        self.resources
            .read()
            .iter()
            .find(|resource| resource.path == path)
            .cloned()
    }
}

/// 管理任务注册表
#[derive(Default)]
pub struct AdminRegistry {
    tasks: RwLock<Vec<Arc<dyn Task>>>,
}

impl AdminRegistry {
    /// 登记任务
    pub fn add_task(&self, task: Arc<dyn Task>) {
        debug!("登记管理任务: {}", task.name());
        self.tasks.write().push(task);
    }

    /// 已登记的任务名称
    pub fn task_names(&self) -> Vec<String> {
        self.tasks
            .read()
            .iter()
            .map(|task| task.name().to_string())
            .collect()
    }

    /// 按名称执行任务
    pub async fn execute(&self, name: &str) -> Result<(), LifecycleError> {
        let task = self
            .tasks
            .read()
            .iter()
            .find(|task| task.name() == name)
            .cloned()
            .ok_or_else(|| LifecycleError::TaskNotFound {
                name: name.to_string(),
            })?;
        info!("执行管理任务: {}", name);
        task.execute().await
    }
}

/// 托管对象注册表
#[derive(Default)]
pub struct LifecycleRegistry {
    managed: RwLock<Vec<(String, Arc<dyn Managed>)>>,
}

impl LifecycleRegistry {
    /// 登记托管对象
    pub fn manage(&self, name: impl Into<String>, managed: Arc<dyn Managed>) {
        let name = name.into();
        debug!("登记托管对象: {}", name);
        self.managed.write().push((name, managed));
    }

    /// 已登记的名称
    pub fn names(&self) -> Vec<String> {
        self.managed
            .read()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// 按登记顺序启动全部托管对象
    pub async fn start_all(&self) -> Result<(), LifecycleError> {
        let managed = self.managed.read().clone();
        for (name, object) in managed {
            object
                .start()
                .await
                .map_err(|err| LifecycleError::ManagedFailed {
                    name: name.clone(),
                    message: err.to_string(),
                })?;
            info!("托管对象已启动: {}", name);
        }
        Ok(())
    }

    /// 按登记的相反顺序停止全部托管对象，返回第一个错误
    pub async fn stop_all(&self) -> Result<(), LifecycleError> {
        let managed = self.managed.read().clone();
        let mut first_error = None;
        for (name, object) in managed.into_iter().rev() {
            match object.stop().await {
                Ok(()) => info!("托管对象已停止: {}", name),
                Err(err) => {
                    warn!("托管对象停止失败: {}: {}", name, err);
                    first_error.get_or_insert(LifecycleError::ManagedFailed {
                        name,
                        message: err.to_string(),
                    });
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// 已登记的过滤器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRegistration {
    /// 过滤器名称
    pub name: String,
    /// URL 匹配模式
    pub url_pattern: String,
}

/// 过滤器与监听器注册表
#[derive(Default)]
pub struct ServletRegistry {
    filters: RwLock<Vec<FilterRegistration>>,
    listeners: RwLock<Vec<Arc<dyn ContextListener>>>,
}

impl ServletRegistry {
    /// 登记过滤器
    pub fn add_filter(&self, name: impl Into<String>, url_pattern: impl Into<String>) {
        let registration = FilterRegistration {
            name: name.into(),
            url_pattern: url_pattern.into(),
        };
        debug!("登记过滤器: {} -> {}", registration.name, registration.url_pattern);
        self.filters.write().push(registration);
    }

    /// 已登记的过滤器
    pub fn filters(&self) -> Vec<FilterRegistration> {
        self.filters.read().clone()
    }

    /// 登记上下文监听器
    pub fn add_listener(&self, listener: Arc<dyn ContextListener>) {
        debug!("登记上下文监听器: {}", listener.name());
        self.listeners.write().push(listener);
    }

    /// 已登记的监听器名称
    pub fn listener_names(&self) -> Vec<String> {
        self.listeners
            .read()
            .iter()
            .map(|listener| listener.name().to_string())
            .collect()
    }

    /// 通知全部监听器上下文已初始化
    pub fn notify_initialized(&self, context: &ApplicationContext) {
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.context_initialized(context);
        }
    }
}
