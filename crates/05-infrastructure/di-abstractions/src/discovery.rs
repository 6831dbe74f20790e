//! 声明来源抽象接口
//!
//! 容器启动时从一个或多个来源收集 Bean 与通知声明

use crate::declaration::{AdviceDeclaration, BeanDeclaration};
use infrastructure_common::ContainerResult;

/// 声明来源 trait
pub trait DeclarationSource: Send + Sync {
    /// 获取来源名称
    fn name(&self) -> &str;

    /// 提供 Bean 声明
    fn bean_declarations(&self) -> ContainerResult<Vec<BeanDeclaration>>;

    /// 提供通知声明
    fn advice_declarations(&self) -> ContainerResult<Vec<AdviceDeclaration>> {
        Ok(Vec::new())
    }
}

/// 内存中的声明来源
#[derive(Debug, Clone, Default)]
pub struct StaticDeclarationSource {
    name: String,
    beans: Vec<BeanDeclaration>,
    advice: Vec<AdviceDeclaration>,
}

impl StaticDeclarationSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_bean(mut self, declaration: BeanDeclaration) -> Self {
        self.beans.push(declaration);
        self
    }

    pub fn with_advice(mut self, declaration: AdviceDeclaration) -> Self {
        self.advice.push(declaration);
        self
    }

    pub fn add_bean(&mut self, declaration: BeanDeclaration) {
        self.beans.push(declaration);
    }

    pub fn add_advice(&mut self, declaration: AdviceDeclaration) {
        self.advice.push(declaration);
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty() && self.advice.is_empty()
    }
}

impl DeclarationSource for StaticDeclarationSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn bean_declarations(&self) -> ContainerResult<Vec<BeanDeclaration>> {
        Ok(self.beans.clone())
    }

    fn advice_declarations(&self) -> ContainerResult<Vec<AdviceDeclaration>> {
        Ok(self.advice.clone())
    }
}
