//! 分阶段容器

use di_abstractions::{
    Binder, Binding, BindingScope, ContainerStage, DependencyKey, Module, Provided, Resolver,
    StagePolicy,
};
use infrastructure_common::{ConfigurationError, DependencyError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 一层容器阶段，构建完成后绑定集合不再变化
pub struct StageContainer {
    stage: ContainerStage,
    policy: StagePolicy,
    bindings: HashMap<DependencyKey, Binding>,
    parent: Option<Arc<StageContainer>>,
}

impl StageContainer {
    /// 创建 Init 阶段
    pub fn root(
        policy: StagePolicy,
        modules: &[Arc<dyn Module>],
    ) -> Result<Arc<Self>, ConfigurationError> {
        Self::build(ContainerStage::Init, policy, None, modules)
    }

    /// 在当前阶段之上创建子阶段
    pub fn create_child(
        self: &Arc<Self>,
        stage: ContainerStage,
        modules: &[Arc<dyn Module>],
    ) -> Result<Arc<Self>, ConfigurationError> {
        if !stage.follows(self.stage) {
            return Err(ConfigurationError::InvalidStageTransition {
                parent: self.stage.to_string(),
                child: stage.to_string(),
            });
        }
        Self::build(stage, self.policy, Some(Arc::clone(self)), modules)
    }

    fn build(
        stage: ContainerStage,
        policy: StagePolicy,
        parent: Option<Arc<Self>>,
        modules: &[Arc<dyn Module>],
    ) -> Result<Arc<Self>, ConfigurationError> {
        let mut binder = StageBinder {
            stage,
            policy,
            parent: parent.as_deref(),
            bindings: HashMap::new(),
        };
        for module in modules {
            debug!("安装模块 {} 到 {} 阶段", module.name(), stage);
            module.configure(&mut binder)?;
        }
        let bindings = binder.bindings;

        let container = Arc::new(Self {
            stage,
            policy,
            bindings,
            parent,
        });
        if policy.eager_singletons() {
            container.instantiate_eager_singletons()?;
        }

        info!(
            "{} 阶段容器已创建: {} 个模块, {} 条绑定",
            stage,
            modules.len(),
            container.bindings.len()
        );
        Ok(container)
    }

    fn instantiate_eager_singletons(&self) -> Result<(), ConfigurationError> {
        for binding in self.bindings.values() {
            if binding.scope() != BindingScope::EagerSingleton {
                continue;
            }
            binding
                .resolve(self)
                .map_err(|err| ConfigurationError::EagerSingletonFailed {
                    key: binding.key().to_string(),
                    source: Box::new(err),
                })?;
            debug!("急切单例已创建: {}", binding.key());
        }
        Ok(())
    }

    /// 阶段
    pub fn stage(&self) -> ContainerStage {
        self.stage
    }

    /// 阶段策略
    pub fn policy(&self) -> StagePolicy {
        self.policy
    }

    /// 父阶段
    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// 本层绑定数量
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// 本层是否直接持有该键
    pub fn binds_locally(&self, key: &DependencyKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// 本层所有键
    pub fn local_keys(&self) -> impl Iterator<Item = &DependencyKey> {
        self.bindings.keys()
    }
}

impl Resolver for StageContainer {
    fn resolve(&self, key: &DependencyKey) -> Result<Provided, DependencyError> {
        match self.bindings.get(key) {
            Some(binding) => binding.resolve(self),
            None => match &self.parent {
                Some(parent) => parent.resolve(key),
                None => Err(DependencyError::BindingNotFound {
                    key: key.to_string(),
                }),
            },
        }
    }

    fn contains(&self, key: &DependencyKey) -> bool {
        self.bindings.contains_key(key)
            || self.parent.as_ref().is_some_and(|parent| parent.contains(key))
    }
}

impl fmt::Debug for StageContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContainer")
            .field("stage", &self.stage)
            .field("policy", &self.policy)
            .field("bindings", &self.bindings.len())
            .field("parent", &self.parent.as_ref().map(|p| p.stage))
            .finish()
    }
}

struct StageBinder<'a> {
    stage: ContainerStage,
    policy: StagePolicy,
    parent: Option<&'a StageContainer>,
    bindings: HashMap<DependencyKey, Binding>,
}

impl Binder for StageBinder<'_> {
    fn stage(&self) -> ContainerStage {
        self.stage
    }

    fn policy(&self) -> StagePolicy {
        self.policy
    }

    fn parent(&self) -> Option<&dyn Resolver> {
        self.parent.map(|parent| parent as &dyn Resolver)
    }

    fn bind(&mut self, binding: Binding) -> Result<(), ConfigurationError> {
        if self.bindings.contains_key(binding.key()) {
            return Err(ConfigurationError::DuplicateBinding {
                key: binding.key().to_string(),
            });
        }
        debug!("{} 阶段绑定: {:?} ({:?})", self.stage, binding.key(), binding.scope());
        self.bindings.insert(binding.key().clone(), binding);
        Ok(())
    }
}
