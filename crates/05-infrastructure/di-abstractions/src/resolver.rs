//! 解析上下文
//!
//! 记录一次解析过程中正在构造的 Bean 名称链，用于检测循环依赖

use infrastructure_common::{ContainerError, ContainerResult};

/// 解析上下文
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前解析链
    pub resolution_chain: Vec<String>,
    /// 解析选项
    pub options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            resolution_chain: Vec::new(),
            options,
        }
    }

    /// 添加 Bean 到解析链
    pub fn push_bean(&mut self, name: &str) -> ContainerResult<()> {
        if self.resolution_chain.iter().any(|entry| entry == name) {
            return Err(ContainerError::CircularDependency {
                chain: self.describe_with(name),
            });
        }
        if self.resolution_chain.len() >= self.options.max_depth {
            return Err(ContainerError::CircularDependency {
                chain: format!(
                    "{} (超过最大解析深度 {})",
                    self.describe_with(name),
                    self.options.max_depth
                ),
            });
        }
        self.resolution_chain.push(name.to_string());
        Ok(())
    }

    /// 从解析链中移除 Bean
    pub fn pop_bean(&mut self) {
        self.resolution_chain.pop();
    }

    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    fn describe_with(&self, name: &str) -> String {
        let mut chain = self.resolution_chain.clone();
        chain.push(name.to_string());
        chain.join(" -> ")
    }
}

/// 解析选项
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// 最大递归深度
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}
