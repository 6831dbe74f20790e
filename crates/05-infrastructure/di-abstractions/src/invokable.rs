//! 可调用 Bean
//!
//! 容器对外交付的 Bean 统一为 [`BeanHandle`]，可能是直接调用目标实例，
//! 也可能是经过切面织入的代理。

use crate::reflect::{ClassRef, MethodInfo};
use infrastructure_common::{ContainerError, ContainerResult, Value};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// 可调用的 Bean
pub trait Invokable: Send + Sync + fmt::Debug {
    /// Bean 名称
    fn bean_name(&self) -> &str;

    /// 目标类型描述
    fn class(&self) -> &ClassRef;

    /// 被包装的目标实例；代理返回其最内层目标
    fn target(&self) -> &Value;

    fn is_proxy(&self) -> bool {
        false
    }

    /// 调用已选定的方法
    fn invoke_method(&self, method: &Arc<MethodInfo>, args: Vec<Value>) -> ContainerResult<Value>;
}

/// 容器交付的 Bean 句柄
pub type BeanHandle = Arc<dyn Invokable>;

impl dyn Invokable {
    /// 按名称与实参类型选择重载
    ///
    /// 优先匹配参数类型完全一致的重载，否则在同名同参数个数的候选唯一时选中它。
    pub fn find_method(&self, name: &str, args: &[Value]) -> ContainerResult<Arc<MethodInfo>> {
        let arg_types: Vec<&str> = args.iter().map(Value::type_name).collect();
        let candidates: Vec<&Arc<MethodInfo>> = self
            .class()
            .methods()
            .iter()
            .filter(|method| method.name() == name && !method.is_exclusive())
            .collect();

        if let Some(exact) = candidates.iter().find(|method| method.has_signature(name, &arg_types)) {
            return Ok(Arc::clone(exact));
        }

        let mut same_arity = candidates
            .iter()
            .filter(|method| method.param_types().len() == args.len());
        match (same_arity.next(), same_arity.next()) {
            (Some(only), None) => Ok(Arc::clone(only)),
            _ => Err(ContainerError::MethodNotFound {
                type_name: self.class().name().to_string(),
                method: name.to_string(),
                params: arg_types.join(","),
            }),
        }
    }

    /// 按名称调用
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> ContainerResult<Value> {
        let method = self.find_method(name, &args)?;
        self.invoke_method(&method, args)
    }

    /// 按名称调用并取出强类型返回值
    pub fn call<R: Any + Clone>(&self, name: &str, args: Vec<Value>) -> ContainerResult<R> {
        let result = self.invoke(name, args)?;
        result.extract::<R>().ok_or_else(|| ContainerError::TypeMismatch {
            name: format!("{}.{}", self.bean_name(), name),
            expected: type_name::<R>().to_string(),
            actual: result.type_name().to_string(),
        })
    }

    /// 目标实例的强类型引用
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.target().downcast::<T>()
    }

    /// 两个句柄是否指向同一个目标实例
    pub fn same_instance(&self, other: &dyn Invokable) -> bool {
        self.target().ptr_eq(other.target())
    }
}

/// 代理模板
///
/// 织入阶段挂到 Bean 定义上，实例化完成后用它包装目标。
pub trait ProxyTemplate: Send + Sync + fmt::Debug {
    fn wrap(&self, target: BeanHandle) -> BeanHandle;

    fn describe(&self) -> String;
}
