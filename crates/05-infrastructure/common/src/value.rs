//! 动态值
//!
//! 容器在方法参数、返回值、注入值和 Bean 实例之间传递的类型擦除值。

use crate::errors::{ContainerError, ContainerResult};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// 类型擦除的共享值
///
/// 克隆只增加引用计数，`type_name` 记录原始 Rust 类型名，用于重载匹配。
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// 包装一个值；传入的若本身就是 `Value` 则原样返回，不会嵌套
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let mut slot = Some(value);
        if let Some(existing) = (&mut slot as &mut dyn Any).downcast_mut::<Option<Value>>() {
            if let Some(value) = existing.take() {
                return value;
            }
        }
        match slot {
            Some(value) => Self {
                inner: Arc::new(value),
                type_name: type_name::<T>(),
            },
            None => Self::unit(),
        }
    }

    /// 从已有的 `Arc` 构造，保留指针身份
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: type_name::<T>(),
        }
    }

    /// 从构造函数产出的实例构造
    pub fn from_boxed(value: Box<dyn Any + Send + Sync>, type_name: &'static str) -> Self {
        Self {
            inner: Arc::from(value),
            type_name,
        }
    }

    /// 空值 `()`
    pub fn unit() -> Self {
        Self {
            inner: Arc::new(()),
            type_name: type_name::<()>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_unit(&self) -> bool {
        self.inner.is::<()>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self.inner.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// 取得共享的强类型引用，指针与容器内实例一致
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// 克隆出具体类型；`T = Value` 时返回自身
    pub fn extract<T: Any + Clone>(&self) -> Option<T> {
        if let Some(value) = (self as &dyn Any).downcast_ref::<T>() {
            return Some(value.clone());
        }
        self.inner.downcast_ref::<T>().cloned()
    }

    /// 指针相等
    pub fn ptr_eq(&self, other: &Value) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner) as *const (),
            Arc::as_ptr(&other.inner) as *const (),
        )
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// 构造参数列表
///
/// ```
/// use infrastructure_common::args;
/// let args = args![2, 3];
/// assert_eq!(args.len(), 2);
/// assert_eq!(args[0].type_name(), "i32");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::new($arg)),+]
    };
}

/// Bean 属性值
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// 字面量，按目标字段声明类型转换
    Literal(String),
    /// 已构造好的值，原样赋值
    Value(Value),
}

impl PropertyValue {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Self::Value(Value::new(value))
    }

    /// 解析为最终要写入字段的值
    pub fn resolve_for(&self, field: &str, declared_type: &str) -> ContainerResult<Value> {
        match self {
            Self::Literal(text) => coerce_literal(field, text, declared_type),
            Self::Value(value) => Ok(value.clone()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// 类型名别名转换为 Rust 类型名
///
/// 属性转换与切点参数列表共用同一张别名表。
pub fn canonical_type_name(name: &str) -> &str {
    match name {
        "boolean" => "bool",
        "int" => "i32",
        "long" => "i64",
        "short" => "i16",
        "byte" => "i8",
        "float" => "f32",
        "double" => "f64",
        "String" | "string" => "alloc::string::String",
        other => other,
    }
}

/// 字面量可转换的基础类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    Byte,
    UnsignedByte,
    Text,
}

impl PrimitiveKind {
    /// 根据声明类型名识别，先经过 [`canonical_type_name`]
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        let kind = match canonical_type_name(type_name) {
            "bool" => Self::Bool,
            "i16" => Self::Short,
            "i32" => Self::Int,
            "i64" => Self::Long,
            "f32" => Self::Float,
            "f64" => Self::Double,
            "char" => Self::Char,
            "i8" => Self::Byte,
            "u8" => Self::UnsignedByte,
            "alloc::string::String" => Self::Text,
            _ => return None,
        };
        Some(kind)
    }
}

/// 将字面量转换为声明类型的值
pub fn coerce_literal(field: &str, text: &str, declared_type: &str) -> ContainerResult<Value> {
    let failure = || ContainerError::PropertyCoercion {
        field: field.to_string(),
        value: text.to_string(),
        target_type: declared_type.to_string(),
    };

    let kind = PrimitiveKind::from_type_name(declared_type).ok_or_else(failure)?;
    let trimmed = text.trim();
    let value = match kind {
        PrimitiveKind::Bool => Value::new(trimmed.parse::<bool>().map_err(|_| failure())?),
        PrimitiveKind::Short => Value::new(trimmed.parse::<i16>().map_err(|_| failure())?),
        PrimitiveKind::Int => Value::new(trimmed.parse::<i32>().map_err(|_| failure())?),
        PrimitiveKind::Long => Value::new(trimmed.parse::<i64>().map_err(|_| failure())?),
        PrimitiveKind::Float => Value::new(trimmed.parse::<f32>().map_err(|_| failure())?),
        PrimitiveKind::Double => Value::new(trimmed.parse::<f64>().map_err(|_| failure())?),
        PrimitiveKind::Byte => Value::new(trimmed.parse::<i8>().map_err(|_| failure())?),
        PrimitiveKind::UnsignedByte => Value::new(trimmed.parse::<u8>().map_err(|_| failure())?),
        PrimitiveKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::new(c),
                _ => return Err(failure()),
            }
        }
        PrimitiveKind::Text => Value::new(text.to_string()),
    };
    Ok(value)
}
