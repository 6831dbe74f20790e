//! # Infrastructure Common
//!
//! 容器各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`ContainerError`] - 容器错误分类
//! - [`Value`] - 类型擦除的共享值
//! - [`PropertyValue`] - Bean 属性值及字面量转换
//! - [`BeanScope`] - Bean 作用域
//! - [`LifecycleState`] - 应用上下文生命周期状态

pub mod errors;
pub mod lifecycle;
pub mod value;

pub use errors::*;
pub use lifecycle::*;
pub use value::*;
