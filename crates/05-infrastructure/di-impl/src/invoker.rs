//! 入口调用器
//!
//! 沿对象及其父命令查找入口，解析全部参数后调用。参数失败会全部收集，
//! 不在第一个失败处停止。

use di_abstractions::{Arguments, DependencyKey, EntryPoint, Provided, Resolver, Runnable};
use infrastructure_common::{
    ConfigurationError, DependencyError, InfrastructureError, ParameterFailure, ResolutionError,
};
use std::any::Any;
use tracing::{debug, info};

/// 在对象自身和父命令链上查找入口
pub fn find_entry_point(target: &dyn Runnable) -> Option<EntryPoint<'_>> {
    let mut current = Some(target);
    while let Some(runnable) = current {
        if let Some(entry_point) = runnable.entry_point() {
            debug!("在 {} 上找到入口 {}", runnable.type_name(), entry_point.name());
            return Some(entry_point);
        }
        current = runnable.parent();
    }
    None
}

/// 查找入口、解析参数并调用
///
/// 找不到入口时在访问容器之前返回 [`ConfigurationError::EntryPointNotFound`]。
/// 任一参数的槽位尚未设置时返回 [`DependencyError::NotYetAvailable`]，
/// 其余参数失败汇总为一个 [`ResolutionError`]。
pub fn invoke_entry_point(
    target: &dyn Runnable,
    resolver: &dyn Resolver,
) -> Result<(), InfrastructureError> {
    let entry_point =
        find_entry_point(target).ok_or_else(|| ConfigurationError::EntryPointNotFound {
            type_name: target.type_name().to_string(),
        })?;

    let arguments = match resolve_arguments(&entry_point, resolver) {
        Ok(arguments) => arguments,
        Err(mut err) => {
            if let Some(pos) = err
                .failures
                .iter()
                .position(|failure| failure.error.is_not_yet_available())
            {
                return Err(err.failures.swap_remove(pos).error.into());
            }
            return Err(err.into());
        }
    };

    let name = entry_point.name().to_string();
    info!("调用 {} 的入口 {}: {} 个参数", target.type_name(), name, arguments.len());
    entry_point
        .invoke(arguments)
        .map_err(|err| InfrastructureError::CommandFailed {
            command: name,
            message: format!("{err:#}"),
        })
}

/// 按声明顺序解析入口参数
pub fn resolve_arguments(
    entry_point: &EntryPoint<'_>,
    resolver: &dyn Resolver,
) -> Result<Arguments, ResolutionError> {
    let parameters = entry_point.parameters();
    let mut failures = Vec::new();

    let mut keys = Vec::with_capacity(parameters.len());
    for (index, parameter) in parameters.iter().enumerate() {
        match parameter.key() {
            Ok(key) => keys.push(Some(key)),
            Err(error) => {
                failures.push(ParameterFailure {
                    index,
                    parameter: parameter.to_string(),
                    error,
                });
                keys.push(None);
            }
        }
    }

    let mut values = Vec::with_capacity(parameters.len());
    for (index, (parameter, key)) in parameters.iter().zip(keys).enumerate() {
        let Some(key) = key else { continue };
        match resolve_checked(resolver, &key, parameter.type_info.id) {
            Ok(provided) => values.push((key, Some(provided))),
            Err(error) if parameter.optional && error.is_missing() => values.push((key, None)),
            Err(error) => failures.push(ParameterFailure {
                index,
                parameter: parameter.to_string(),
                error,
            }),
        }
    }

    if failures.is_empty() {
        Ok(Arguments::new(values))
    } else {
        Err(ResolutionError {
            entry_point: entry_point.name().to_string(),
            failures,
        })
    }
}

fn resolve_checked(
    resolver: &dyn Resolver,
    key: &DependencyKey,
    expected: std::any::TypeId,
) -> Result<Provided, DependencyError> {
    let provided = resolver.resolve(key)?;
    let checked = match provided.value() {
        None => Err(DependencyError::ValueAbsent {
            key: key.to_string(),
        }),
        Some(value) if Any::type_id(value) != expected => Err(DependencyError::TypeMismatch {
            key: key.to_string(),
            expected: key.type_info.name.to_string(),
        }),
        Some(_) => Ok(()),
    };
    checked.map(|()| provided)
}
