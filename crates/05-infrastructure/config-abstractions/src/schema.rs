//! 配置访问表

use infrastructure_common::TypeInfo;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;

/// 字段读取函数：从所属节点读取字段值，`Option` 字段为空时返回 `None`
pub type Getter = fn(&dyn Any) -> Option<&dyn Any>;

/// 可被路径绑定的配置节点
pub trait ConfigNode: Any + Send + Sync {
    /// 节点的访问表
    fn schema() -> ConfigSchema;
}

/// 节点形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaShape {
    /// 结构体，字段可继续展开
    Structure,
    /// 枚举，只作为叶子值绑定
    Enumeration,
}

/// 字段种类
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// 叶子值
    Leaf,
    /// 嵌套配置节点
    Node(fn() -> ConfigSchema),
}

/// 字段描述
#[derive(Clone, Copy)]
pub struct FieldSchema {
    /// 字段名
    pub name: &'static str,
    /// 去掉 `Option` / `Box` / `Arc` 包装后的字段类型
    pub type_info: TypeInfo,
    /// 字段种类
    pub kind: FieldKind,
    /// 读取函数
    pub getter: Getter,
    /// 字段是否可能为空
    pub optional: bool,
}

impl FieldSchema {
    /// 嵌套节点的访问表
    pub fn node_schema(&self) -> Option<ConfigSchema> {
        match self.kind {
            FieldKind::Node(schema) => Some(schema()),
            FieldKind::Leaf => None,
        }
    }
}

impl fmt::Debug for FieldSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field("type_info", &self.type_info)
            .field("node", &matches!(self.kind, FieldKind::Node(_)))
            .field("optional", &self.optional)
            .finish()
    }
}

/// 内嵌的父配置
#[derive(Clone, Copy)]
pub struct BaseSchema {
    /// 内嵌字段名，不出现在绑定路径中
    pub field: &'static str,
    /// 父配置的访问表
    pub schema: fn() -> ConfigSchema,
    /// 从当前节点读取父配置
    pub getter: Getter,
}

impl fmt::Debug for BaseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseSchema")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

/// 节点访问表
#[derive(Debug, Clone)]
pub struct ConfigSchema {
    /// 节点类型
    pub type_info: TypeInfo,
    /// 节点形态
    pub shape: SchemaShape,
    /// 节点自身声明的字段
    pub fields: Vec<FieldSchema>,
    /// 内嵌的父配置
    pub base: Option<BaseSchema>,
}

/// 在节点及其父配置链上找到的字段
#[derive(Clone)]
pub struct ResolvedField {
    /// 声明该字段的类型
    pub declaring: TypeInfo,
    /// 字段描述
    pub field: FieldSchema,
    via: Vec<Getter>,
}

impl fmt::Debug for ResolvedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedField")
            .field("declaring", &self.declaring)
            .field("field", &self.field)
            .field("depth", &self.via.len())
            .finish()
    }
}

impl ResolvedField {
    /// 从节点读取字段值
    pub fn read<'a>(&self, node: &'a dyn Any) -> Option<&'a dyn Any> {
        let mut current = node;
        for step in &self.via {
            current = step(current)?;
        }
        (self.field.getter)(current)
    }
}

impl ConfigSchema {
    /// 叶子节点的访问表，用于手写实现
    pub fn leaf<T: Any>(shape: SchemaShape) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            shape,
            fields: Vec::new(),
            base: None,
        }
    }

    /// 是否为枚举
    pub fn is_enumeration(&self) -> bool {
        self.shape == SchemaShape::Enumeration
    }

    /// 父配置链，由近及远
    pub fn ancestors(&self) -> Vec<(ConfigSchema, Vec<Getter>)> {
        let mut chain = Vec::new();
        let mut via = Vec::new();
        let mut next = self.base;
        while let Some(base) = next {
            via.push(base.getter);
            let schema = (base.schema)();
            next = schema.base;
            chain.push((schema, via.clone()));
        }
        chain
    }

    /// 所有字段：最远的父配置在前，自身字段在后
    ///
    /// 父配置中被更近一层同名字段遮蔽的字段不会出现，与 [`Self::find_field`] 一致。
    pub fn all_fields(&self) -> Vec<ResolvedField> {
        let mut layers = vec![(self.clone(), Vec::new())];
        layers.extend(self.ancestors());

        let mut seen = HashSet::new();
        let mut grouped = Vec::with_capacity(layers.len());
        for (schema, via) in &layers {
            let visible: Vec<ResolvedField> = schema
                .fields
                .iter()
                .filter(|field| seen.insert(field.name))
                .map(|field| ResolvedField {
                    declaring: schema.type_info,
                    field: *field,
                    via: via.clone(),
                })
                .collect();
            grouped.push(visible);
        }

        grouped.into_iter().rev().flatten().collect()
    }

    /// 按名称查找字段：先查自身声明的字段，再沿父配置链向上查找
    pub fn find_field(&self, name: &str) -> Option<ResolvedField> {
        if let Some(field) = self.fields.iter().find(|f| f.name == name) {
            return Some(ResolvedField {
                declaring: self.type_info,
                field: *field,
                via: Vec::new(),
            });
        }
        self.ancestors().into_iter().find_map(|(schema, via)| {
            schema
                .fields
                .iter()
                .find(|f| f.name == name)
                .map(|field| ResolvedField {
                    declaring: schema.type_info,
                    field: *field,
                    via,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigNode;
    use std::sync::Arc;

    #[derive(ConfigNode)]
    struct BaseSettings {
        log_level: String,
    }

    #[derive(ConfigNode)]
    struct PoolSettings {
        size: u32,
    }

    #[derive(ConfigNode)]
    #[allow(dead_code)]
    enum Mode {
        Fast,
        Safe,
    }

    #[derive(ConfigNode)]
    struct AppSettings {
        #[config(base)]
        base: BaseSettings,
        name: String,
        #[config(nested)]
        pool: Option<PoolSettings>,
        #[config(nested)]
        shared: Arc<PoolSettings>,
        #[config(nested)]
        mode: Mode,
        #[config(skip)]
        #[allow(dead_code)]
        cache: Vec<u8>,
    }

    fn settings(pool: Option<PoolSettings>) -> AppSettings {
        AppSettings {
            base: BaseSettings {
                log_level: "debug".into(),
            },
            name: "demo".into(),
            pool,
            shared: Arc::new(PoolSettings { size: 2 }),
            mode: Mode::Safe,
            cache: Vec::new(),
        }
    }

    #[test]
    fn fields_are_listed_ancestors_first() {
        let names: Vec<&str> = AppSettings::schema()
            .all_fields()
            .iter()
            .map(|f| f.field.name)
            .collect();

        assert_eq!(names, vec!["log_level", "name", "pool", "shared", "mode"]);
    }

    #[test]
    fn wrappers_are_peeled() {
        let schema = AppSettings::schema();
        let pool = schema.find_field("pool").unwrap();
        let shared = schema.find_field("shared").unwrap();

        assert!(pool.field.type_info.is::<PoolSettings>());
        assert!(pool.field.optional);
        assert!(shared.field.type_info.is::<PoolSettings>());
        assert!(!shared.field.optional);
    }

    #[test]
    fn enumerations_are_marked() {
        let mode = AppSettings::schema().find_field("mode").unwrap();

        assert!(mode.field.node_schema().unwrap().is_enumeration());
    }

    #[test]
    fn base_fields_are_read_through_the_base() {
        let value = settings(None);
        let field = AppSettings::schema().find_field("log_level").unwrap();

        assert!(field.declaring.is::<BaseSettings>());
        let level = field.read(&value).and_then(|v| v.downcast_ref::<String>());
        assert!(std::ptr::eq(level.unwrap(), &value.base.log_level));
    }

    #[test]
    fn empty_option_reads_as_none() {
        let schema = AppSettings::schema();
        let pool = schema.find_field("pool").unwrap();

        assert!(pool.read(&settings(None)).is_none());
        let present = settings(Some(PoolSettings { size: 8 }));
        let size = pool
            .read(&present)
            .and_then(|v| v.downcast_ref::<PoolSettings>())
            .map(|p| p.size);
        assert_eq!(size, Some(8));
    }

    #[test]
    fn unknown_field_is_not_found() {
        assert!(AppSettings::schema().find_field("nmae").is_none());
    }
}
