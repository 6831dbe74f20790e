//! Bean 工厂抽象接口

use crate::invokable::BeanHandle;
use infrastructure_common::{ContainerError, ContainerResult};
use std::any::{type_name, Any};
use std::sync::Arc;

/// Bean 工厂 trait
///
/// 提供按名称、按类型解析 Bean 的核心接口
pub trait BeanFactory: Send + Sync {
    /// 按名称解析 Bean
    fn resolve(&self, name: &str) -> ContainerResult<BeanHandle>;

    /// 按名称解析并校验目标类型可赋值给 `type_name`
    fn resolve_typed(&self, name: &str, type_name: &str) -> ContainerResult<BeanHandle> {
        let handle = self.resolve(name)?;
        if handle.class().is_assignable_to(type_name) {
            return Ok(handle);
        }
        Err(ContainerError::TypeMismatch {
            name: name.to_string(),
            expected: type_name.to_string(),
            actual: handle.class().name().to_string(),
        })
    }

    /// 查找唯一可赋值给 `type_name` 的 Bean 名称
    ///
    /// 没有候选返回 `None`，多于一个返回 [`ContainerError::AmbiguousCandidate`]
    fn find_candidate_name(&self, type_name: &str) -> ContainerResult<Option<String>>;

    /// 查找并解析唯一候选
    fn find_candidate(&self, type_name: &str) -> ContainerResult<Option<BeanHandle>> {
        match self.find_candidate_name(type_name)? {
            Some(name) => self.resolve(&name).map(Some),
            None => Ok(None),
        }
    }

    /// 检查 Bean 是否已注册
    fn contains_bean(&self, name: &str) -> bool;

    /// 获取所有已注册的 Bean 名称
    fn bean_names(&self) -> Vec<String>;

    /// 解析并取出目标实例的强类型引用
    fn resolve_as<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>>
    where
        Self: Sized,
    {
        let handle = self.resolve(name)?;
        handle.downcast::<T>().ok_or_else(|| ContainerError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>().to_string(),
            actual: handle.target().type_name().to_string(),
        })
    }
}
