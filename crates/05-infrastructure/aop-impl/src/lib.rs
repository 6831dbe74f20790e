//! # 切面织入实现
//!
//! 把通知声明编译成切点，并在 Bean 定义上挂载拦截代理。
//!
//! ## 核心类型
//!
//! - [`JoinPoint`] / [`ProceedingJoinPoint`] - 通知方法收到的连接点
//! - [`Pointcut`] - 一个 Bean 上的全部连接点
//! - [`AspectWeaver`] - 织入器，同时也是定义后处理器
//! - [`ProxyFactory`] / [`AopProxy`] - 代理工厂与拦截代理

pub mod expression;
pub mod join_point;
pub mod pointcut;
pub mod proxy;
pub mod weaver;

pub use expression::{parse_bean_reference, BeanReference, MethodTarget};
pub use join_point::{Advisor, JoinPoint, ProceedingJoinPoint};
pub use pointcut::Pointcut;
pub use proxy::{AopProxy, AopProxyTemplate, ProxyFactory, ProxyKind};
pub use weaver::{weave, AspectWeaver};
