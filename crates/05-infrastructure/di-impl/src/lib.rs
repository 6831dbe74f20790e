//! # 依赖注入具体实现
//!
//! 提供 Bean 定义、Bean 注册表、自动装配后处理器和直接调用句柄

pub mod autowire;
pub mod definition;
pub mod invoker;
pub mod registry;

pub use autowire::{AutowiringPostProcessor, BeanDefinitionPostProcessor};
pub use definition::{BeanDefinition, FieldInjection, SetterInjection};
pub use invoker::DirectInvoker;
pub use registry::BeanRegistry;
