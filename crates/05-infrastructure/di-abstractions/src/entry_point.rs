//! 入口声明
//!
//! 命令通过 [`Runnable::entry_point`] 显式声明唯一的入口以及它的参数列表，
//! 参数由容器解析后按声明顺序交给入口闭包。

use crate::key::DependencyKey;
use crate::provider::{Injected, Provided};
use infrastructure_common::{DependencyError, TypeInfo};
use std::any::Any;
use std::fmt;

/// 入口参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// 参数类型
    pub type_info: TypeInfo,
    /// 限定名
    pub qualifier: Option<String>,
    /// 是否可选
    pub optional: bool,
}

impl Parameter {
    /// 推导依赖键
    pub fn key(&self) -> Result<DependencyKey, DependencyError> {
        DependencyKey::derive(self.type_info, self.qualifier.as_deref())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}@{}", self.type_info.short_name(), q)?,
            None => f.write_str(self.type_info.short_name())?,
        }
        if self.optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// 已解析的入口参数
#[derive(Debug)]
pub struct Arguments {
    values: Vec<(DependencyKey, Option<Provided>)>,
}

impl Arguments {
    /// 由解析结果构造
    pub fn new(values: Vec<(DependencyKey, Option<Provided>)>) -> Self {
        Self { values }
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 读取必需参数
    pub fn get<T: Any>(&self, index: usize) -> Result<Injected<T>, DependencyError> {
        self.optional(index)?.ok_or_else(|| DependencyError::ValueAbsent {
            key: self.describe(index),
        })
    }

    /// 读取可选参数
    pub fn optional<T: Any>(&self, index: usize) -> Result<Option<Injected<T>>, DependencyError> {
        let (key, value) = self.values.get(index).ok_or_else(|| DependencyError::BindingNotFound {
            key: format!("#{index}"),
        })?;
        value.clone().map(|provided| provided.typed(key)).transpose()
    }

    fn describe(&self, index: usize) -> String {
        self.values
            .get(index)
            .map_or_else(|| format!("#{index}"), |(key, _)| key.to_string())
    }
}

type Body<'a> = Box<dyn FnOnce(Arguments) -> anyhow::Result<()> + 'a>;

/// 入口：名称、参数列表和入口闭包
pub struct EntryPoint<'a> {
    name: String,
    parameters: Vec<Parameter>,
    body: Body<'a>,
}

impl<'a> EntryPoint<'a> {
    /// 开始声明入口
    pub fn builder(name: impl Into<String>) -> EntryPointBuilder {
        EntryPointBuilder {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// 入口名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 参数列表
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// 使用已解析参数调用入口
    pub fn invoke(self, arguments: Arguments) -> anyhow::Result<()> {
        (self.body)(arguments)
    }
}

impl fmt::Debug for EntryPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// 入口构建器
#[derive(Debug)]
pub struct EntryPointBuilder {
    name: String,
    parameters: Vec<Parameter>,
}

impl EntryPointBuilder {
    /// 无限定名参数
    pub fn param<T: ?Sized + 'static>(self) -> Self {
        self.push(TypeInfo::of::<T>(), None, false)
    }

    /// 带限定名参数
    pub fn named<T: ?Sized + 'static>(self, qualifier: impl Into<String>) -> Self {
        self.push(TypeInfo::of::<T>(), Some(qualifier.into()), false)
    }

    /// 可选的无限定名参数
    pub fn optional<T: ?Sized + 'static>(self) -> Self {
        self.push(TypeInfo::of::<T>(), None, true)
    }

    /// 可选的带限定名参数
    pub fn optional_named<T: ?Sized + 'static>(self, qualifier: impl Into<String>) -> Self {
        self.push(TypeInfo::of::<T>(), Some(qualifier.into()), true)
    }

    /// 追加自定义参数
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// 结束声明并给出入口闭包
    pub fn invoke<'a, F>(self, body: F) -> EntryPoint<'a>
    where
        F: FnOnce(Arguments) -> anyhow::Result<()> + 'a,
    {
        EntryPoint {
            name: self.name,
            parameters: self.parameters,
            body: Box::new(body),
        }
    }

    fn push(self, type_info: TypeInfo, qualifier: Option<String>, optional: bool) -> Self {
        self.parameter(Parameter {
            type_info,
            qualifier,
            optional,
        })
    }
}

/// 带入口的对象
///
/// 先在对象自身上查找入口，找不到时沿 [`Runnable::parent`] 逐级向上查找。
pub trait Runnable {
    /// 对象自身声明的入口
    fn entry_point(&self) -> Option<EntryPoint<'_>> {
        None
    }

    /// 内嵌的父命令
    fn parent(&self) -> Option<&dyn Runnable> {
        None
    }

    /// 具体类型名称
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
