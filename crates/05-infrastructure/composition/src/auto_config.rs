//! 自动配置
//!
//! 发现注册表：按包前缀过滤组件清单，按类别分组后在两个阶段登记到宿主。
//! 初始化阶段登记扩展包和命令，运行阶段依次登记健康检查、提供者、
//! 可注入提供者、资源、管理任务和托管对象。

use crate::host::{Bootstrap, Environment};
use crate::manifest::{ComponentManifest, Factory, ManifestEntry};
use di_abstractions::Resolver;
use infrastructure_common::{
    Classifier, CommandShape, ComponentDescriptor, ConfigurationError, InfrastructureError,
    Marker, Supertype, TypeInfo,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

/// 发现注册表
pub struct AutoConfig<C> {
    base_packages: Vec<String>,
    entries: Vec<ManifestEntry<C>>,
    index: HashMap<Classifier, Vec<usize>>,
}

impl<C: Send + Sync + 'static> AutoConfig<C> {
    /// 按包前缀过滤清单
    pub fn new<I, S>(manifest: ComponentManifest<C>, base_packages: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base_packages: Vec<String> = base_packages.into_iter().map(Into::into).collect();
        if base_packages.is_empty() {
            return Err(ConfigurationError::EmptyBasePackages);
        }
        if base_packages.iter().any(|package| package.trim().is_empty()) {
            return Err(ConfigurationError::BlankBasePackage);
        }

        let declared = manifest.len();
        let entries: Vec<ManifestEntry<C>> = manifest
            .into_entries()
            .into_iter()
            .filter(|entry| entry.descriptor.type_info.in_any_package(&base_packages))
            .collect();

        for entry in &entries {
            let category = entry.descriptor.classifier.capability();
            let factory = entry.factory.capability();
            if category != factory {
                return Err(ConfigurationError::FactoryMismatch {
                    type_name: entry.descriptor.type_info.to_string(),
                    declared: category,
                    factory,
                });
            }
        }

        let mut index: HashMap<Classifier, Vec<usize>> = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            index
                .entry(entry.descriptor.classifier)
                .or_default()
                .push(position);
        }

        info!(
            "自动配置已创建: 包 {:?}, 清单 {} 个组件, 匹配 {} 个",
            base_packages,
            declared,
            entries.len()
        );
        Ok(Self {
            base_packages,
            entries,
            index,
        })
    }

    /// 包前缀
    pub fn base_packages(&self) -> &[String] {
        &self.base_packages
    }

    /// 全部匹配的组件描述
    pub fn descriptors(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor)
    }

    /// 某个超类型的子类型，保持清单声明顺序
    pub fn subtypes_of(&self, supertype: Supertype) -> Vec<&ComponentDescriptor> {
        self.classified(Classifier::SubtypeOf(supertype))
            .map(|entry| &entry.descriptor)
            .collect()
    }

    /// 带某个标记的类型，保持清单声明顺序
    pub fn annotated_with(&self, marker: Marker) -> Vec<&ComponentDescriptor> {
        self.classified(Classifier::AnnotatedWith(marker))
            .map(|entry| &entry.descriptor)
            .collect()
    }

    /// 初始化阶段：登记扩展包，然后登记命令
    pub fn initialize(
        &self,
        bootstrap: &mut Bootstrap<C>,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        self.add_bundles(bootstrap, container)?;
        self.add_commands(bootstrap, container)?;
        Ok(())
    }

    /// 运行阶段
    pub fn run(
        &self,
        environment: &Environment,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        self.add_health_checks(environment, container)?;
        self.add_providers(environment, container)?;
        self.add_injectable_providers(environment, container)?;
        self.add_resources(environment, container)?;
        self.add_tasks(environment, container)?;
        self.add_managed(environment, container)?;
        Ok(())
    }

    fn classified(&self, classifier: Classifier) -> impl Iterator<Item = &ManifestEntry<C>> {
        self.index
            .get(&classifier)
            .into_iter()
            .flatten()
            .map(|&position| &self.entries[position])
    }

    fn add_bundles(
        &self,
        bootstrap: &mut Bootstrap<C>,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        for entry in self.classified(Classifier::SubtypeOf(Supertype::Bundle)) {
            if let Factory::Bundle(factory) = &entry.factory {
                let bundle = factory(container)?;
                bootstrap.add_bundle(bundle)?;
                info!("添加扩展包: {}", entry.descriptor.type_info);
            }
        }
        Ok(())
    }

    fn add_commands(
        &self,
        bootstrap: &mut Bootstrap<C>,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        let mut seen: HashSet<TypeInfo> = bootstrap.command_types().into_iter().collect();

        for shape in CommandShape::ALL {
            for entry in self.classified(Classifier::SubtypeOf(Supertype::Command(shape))) {
                let type_info = entry.descriptor.type_info;
                if !seen.insert(type_info) {
                    warn!("命令已存在，跳过: {}", type_info);
                    continue;
                }
                if let Factory::Command(factory) = &entry.factory {
                    let command = factory(container)?;
                    bootstrap.add_command(command);
                    info!("添加命令: {} ({:?})", type_info, shape);
                }
            }
        }
        Ok(())
    }

    fn add_health_checks(
        &self,
        environment: &Environment,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        for entry in self.classified(Classifier::SubtypeOf(Supertype::InjectableHealthCheck)) {
            if let Factory::HealthCheck(factory) = &entry.factory {
                let check = factory(container)?;
                environment.health_checks().register(check);
                info!("添加健康检查: {}", entry.descriptor.type_info);
            }
        }
        Ok(())
    }

    fn add_providers(
        &self,
        environment: &Environment,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        for entry in self.classified(Classifier::AnnotatedWith(Marker::Provider)) {
            if let Factory::Provider(factory) = &entry.factory {
                let instance = factory(container)?;
                environment
                    .dispatch()
                    .register_provider(entry.descriptor.type_info, instance);
                info!("添加提供者: {}", entry.descriptor.type_info);
            }
        }
        Ok(())
    }

    fn add_injectable_providers(
        &self,
        environment: &Environment,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        for entry in self.classified(Classifier::SubtypeOf(Supertype::InjectableProvider)) {
            if let Factory::InjectableProvider(factory) = &entry.factory {
                let provider = factory(container)?;
                environment.dispatch().register_injectable_provider(provider);
                info!("添加可注入提供者: {}", entry.descriptor.type_info);
            }
        }
        Ok(())
    }

    fn add_resources(
        &self,
        environment: &Environment,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        for entry in self.classified(Classifier::AnnotatedWith(Marker::Path)) {
            if let Factory::Resource(factory) = &entry.factory {
                let path = entry.descriptor.attribute("path").unwrap_or("/");
                let instance = factory(container)?;
                environment
                    .dispatch()
                    .register_resource(path, entry.descriptor.type_info, instance);
                info!("添加资源: {} -> {}", path, entry.descriptor.type_info);
            }
        }
        Ok(())
    }

    fn add_tasks(
        &self,
        environment: &Environment,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        for entry in self.classified(Classifier::SubtypeOf(Supertype::Task)) {
            if let Factory::Task(factory) = &entry.factory {
                let task = factory(container)?;
                debug!("管理任务 {} 由 {} 提供", task.name(), entry.descriptor.type_info);
                environment.admin().add_task(task);
                info!("添加管理任务: {}", entry.descriptor.type_info);
            }
        }
        Ok(())
    }

    fn add_managed(
        &self,
        environment: &Environment,
        container: &dyn Resolver,
    ) -> Result<(), InfrastructureError> {
        for entry in self.classified(Classifier::SubtypeOf(Supertype::Managed)) {
            if let Factory::Managed(factory) = &entry.factory {
                let managed = factory(container)?;
                environment
                    .lifecycle()
                    .manage(entry.descriptor.type_info.short_name(), managed);
                info!("添加托管对象: {}", entry.descriptor.type_info);
            }
        }
        Ok(())
    }
}

impl<C> fmt::Debug for AutoConfig<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoConfig")
            .field("base_packages", &self.base_packages)
            .field("components", &self.entries.len())
            .finish()
    }
}
