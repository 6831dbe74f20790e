//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义反射访问、Bean 解析和声明来源的核心接口。
//!
//! ## 核心接口
//!
//! - [`ReflectionFacade`] - 反射访问接口
//! - [`ClassBuilder`] - 类型描述构建器
//! - [`Invokable`] - 可调用的 Bean
//! - [`BeanFactory`] - Bean 工厂接口
//! - [`ProxyTemplate`] - 代理模板
//! - [`DeclarationSource`] - 声明来源接口

pub mod declaration;
pub mod discovery;
pub mod invokable;
pub mod reflect;
pub mod registry;
pub mod resolver;

pub use declaration::*;
pub use discovery::*;
pub use invokable::*;
pub use reflect::*;
pub use registry::*;
pub use resolver::*;
