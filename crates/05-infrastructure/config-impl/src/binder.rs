//! 配置路径绑定器
//!
//! 从根配置类型出发展开字段图，为每个可达字段生成一条以点号路径为限定名的
//! 延迟绑定。只有类型路径落在配置包前缀内的嵌套节点才会继续展开，枚举不展开，
//! 已展开过的类型不再展开。

use config_abstractions::{ConfigNode, ConfigSchema, ResolvedField, TypeInfo};
use di_abstractions::{
    Binder, Binding, DeferredSlot, DependencyKey, Instance, Provided, Provider, Resolver,
};
use infrastructure_common::{ConfigurationError, DependencyError};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 绑定路径读取的根配置
pub trait ConfigRoot: Send + Sync {
    /// 当前的根配置实例
    fn root(&self) -> Result<Instance, DependencyError>;
}

impl<T: Any + Send + Sync> ConfigRoot for DeferredSlot<T> {
    fn root(&self) -> Result<Instance, DependencyError> {
        self.instance()
    }
}

/// 一条绑定路径
#[derive(Clone)]
pub struct BindingPath {
    name: String,
    leaf: TypeInfo,
    steps: Arc<[ResolvedField]>,
}

impl BindingPath {
    /// 点号连接的路径，同时作为限定名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 路径上的字段名
    pub fn segments(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.field.name).collect()
    }

    /// 每一步声明字段的类型
    pub fn declaring_types(&self) -> Vec<TypeInfo> {
        self.steps.iter().map(|step| step.declaring).collect()
    }

    /// 叶子类型
    pub fn leaf_type(&self) -> TypeInfo {
        self.leaf
    }

    /// 路径上是否有可为空的字段
    pub fn may_be_absent(&self) -> bool {
        self.steps.iter().any(|step| step.field.optional)
    }

    /// 绑定键：叶子类型加路径限定名
    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            type_info: self.leaf,
            qualifier: Some(self.name.clone()),
        }
    }

    /// 沿路径读取，中间值为空时返回 `None`
    pub fn read<'a>(&self, root: &'a dyn Any) -> Option<&'a dyn Any> {
        let mut current = root;
        for step in self.steps.iter() {
            current = step.read(current)?;
        }
        Some(current)
    }
}

impl fmt::Debug for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingPath")
            .field("name", &self.name)
            .field("leaf", &self.leaf)
            .field("declaring", &self.declaring_types())
            .finish()
    }
}

/// 配置路径绑定器
pub struct ConfigPathBinder {
    root: ConfigSchema,
    packages: Vec<String>,
    paths: Vec<BindingPath>,
}

impl ConfigPathBinder {
    /// 为根配置类型创建绑定器，未指定配置包时使用根类型所在的包
    pub fn new<C: ConfigNode>(packages: &[String]) -> Result<Self, ConfigurationError> {
        Self::from_schema(C::schema(), packages.to_vec())
    }

    /// 从访问表创建绑定器
    pub fn from_schema(
        root: ConfigSchema,
        mut packages: Vec<String>,
    ) -> Result<Self, ConfigurationError> {
        if packages.is_empty() {
            packages.push(root.type_info.package().to_string());
        }

        let mut discovered = Vec::new();
        let mut visited = HashSet::from([root.type_info]);
        collect(&root, &mut Vec::new(), &packages, &mut visited, &mut discovered);

        let mut binder = Self {
            root,
            packages,
            paths: Vec::new(),
        };
        binder.paths = discovered
            .iter()
            .map(|segments| binder.resolve(segments.as_slice()))
            .collect::<Result<_, _>>()?;

        info!(
            "配置路径绑定器已创建: 根类型 {}, 配置包 {:?}, {} 条路径",
            binder.root.type_info.short_name(),
            binder.packages,
            binder.paths.len()
        );
        Ok(binder)
    }

    /// 根配置类型
    pub fn root_type(&self) -> TypeInfo {
        self.root.type_info
    }

    /// 配置包前缀
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// 所有绑定路径
    pub fn paths(&self) -> &[BindingPath] {
        &self.paths
    }

    /// 按名称查找已生成的路径
    pub fn path(&self, name: &str) -> Option<&BindingPath> {
        self.paths.iter().find(|path| path.name == name)
    }

    /// 解析一条显式给出的点号路径
    pub fn accessor(&self, path: &str) -> Result<BindingPath, ConfigurationError> {
        let segments: Vec<&str> = path.split('.').collect();
        self.resolve(segments.as_slice())
    }

    /// 把所有路径绑定安装到容器阶段
    pub fn install(
        &self,
        binder: &mut dyn Binder,
        root: Arc<dyn ConfigRoot>,
    ) -> Result<(), ConfigurationError> {
        for path in &self.paths {
            binder.bind(Binding::new(
                path.key(),
                Arc::new(PathProvider {
                    root: Arc::clone(&root),
                    path: path.clone(),
                }),
            ))?;
            debug!("绑定配置路径: {} -> {}", path.name, path.leaf);
        }
        Ok(())
    }

    fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<BindingPath, ConfigurationError> {
        let joined = segments
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(".");
        if segments.is_empty() || segments.iter().any(|s| s.as_ref().is_empty()) {
            return Err(ConfigurationError::InvalidPath { path: joined });
        }

        let mut node = Some(self.root.clone());
        let mut current = self.root.type_info;
        let mut steps = Vec::with_capacity(segments.len());
        for segment in segments {
            let segment = segment.as_ref();
            let not_found = || ConfigurationError::FieldNotFound {
                field: segment.to_string(),
                type_name: current.name.to_string(),
            };
            let schema = node.take().ok_or_else(not_found)?;
            let resolved = schema.find_field(segment).ok_or_else(not_found)?;
            current = resolved.field.type_info;
            node = resolved.field.node_schema();
            steps.push(resolved);
        }

        Ok(BindingPath {
            name: joined,
            leaf: current,
            steps: steps.into(),
        })
    }
}

impl fmt::Debug for ConfigPathBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigPathBinder")
            .field("root", &self.root.type_info)
            .field("packages", &self.packages)
            .field("paths", &self.paths.len())
            .finish()
    }
}

fn collect(
    schema: &ConfigSchema,
    prefix: &mut Vec<&'static str>,
    packages: &[String],
    visited: &mut HashSet<TypeInfo>,
    out: &mut Vec<Vec<&'static str>>,
) {
    for resolved in schema.all_fields() {
        prefix.push(resolved.field.name);
        out.push(prefix.clone());

        if let Some(child) = resolved.field.node_schema() {
            let field_type = resolved.field.type_info;
            if !child.is_enumeration()
                && field_type.in_any_package(packages)
                && visited.insert(field_type)
            {
                collect(&child, prefix, packages, visited, out);
            }
        }

        prefix.pop();
    }
}

struct PathProvider {
    root: Arc<dyn ConfigRoot>,
    path: BindingPath,
}

impl Provider for PathProvider {
    fn provide(&self, _resolver: &dyn Resolver) -> Result<Provided, DependencyError> {
        let root = self.root.root()?;
        if self.path.read(&*root).is_none() {
            return Err(DependencyError::ValueAbsent {
                key: self.path.key().to_string(),
            });
        }
        let path = self.path.clone();
        Ok(Provided::projected(root, move |value| path.read(value)))
    }
}
