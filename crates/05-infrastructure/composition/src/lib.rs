//! # 基础设施组合层
//!
//! 这个 crate 负责把类型描述、Bean 声明与通知声明组合成一个完整可用的
//! 应用上下文：注册定义、运行自动装配与切面织入，并按配置初始化日志。
//!
//! ## 主要功能
//!
//! - **上下文构建器**: 使用建造者模式收集类型描述与声明来源
//! - **容器配置**: 从 TOML 文件与环境变量读取容器选项
//! - **生命周期管理**: 构建完成的上下文处于就绪状态，关闭后拒绝解析
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_abstractions::{AdviceDeclaration, BeanDeclaration, BeanFactory, ClassInfo};
//! use infrastructure_common::args;
//! use infrastructure_composition::ApplicationContextBuilder;
//!
//! #[derive(Default)]
//! struct Calculator;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let calculator = ClassInfo::builder::<Calculator>("demo.Calculator")
//!         .constructor(Calculator::default)
//!         .method2("add", |_: &Calculator, a: i32, b: i32| Ok(a + b))
//!         .build();
//!
//!     let context = ApplicationContextBuilder::new()
//!         .register_class(calculator)
//!         .add_bean(BeanDeclaration::new("calc", "demo.Calculator"))
//!         .build()?;
//!
//!     let calc = context.resolve("calc")?;
//!     let sum: i32 = calc.call("add", args![2, 3])?;
//!     println!("2 + 3 = {}", sum);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod context;
pub mod settings;

// 重新导出主要类型
pub use builder::ApplicationContextBuilder;
pub use context::{ApplicationContext, ContextStats};
pub use settings::{ContainerSettings, LoggingSettings, ENV_PREFIX};

pub use infrastructure_common::{InfrastructureError, InfrastructureResult};

#[cfg(test)]
mod tests;
