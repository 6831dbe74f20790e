//! Bean 注册表

use crate::definition::BeanDefinition;
use di_abstractions::{
    BeanFactory, BeanHandle, DescriptorReflection, ReflectionFacade, ResolveContext, ResolveOptions,
};
use infrastructure_common::{ContainerError, ContainerResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Default)]
struct Definitions {
    by_name: HashMap<String, Arc<BeanDefinition>>,
    /// 注册顺序
    order: Vec<String>,
}

/// Bean 注册表
///
/// 按名称保存 Bean 定义；解析时不持有锁，依赖解析可以递归进入注册表。
pub struct BeanRegistry {
    definitions: RwLock<Definitions>,
    reflection: Arc<dyn ReflectionFacade>,
    options: ResolveOptions,
}

impl BeanRegistry {
    /// 创建使用默认反射实现的注册表
    pub fn new() -> Self {
        Self::with_reflection(DescriptorReflection::shared())
    }

    pub fn with_reflection(reflection: Arc<dyn ReflectionFacade>) -> Self {
        Self {
            definitions: RwLock::new(Definitions::default()),
            reflection,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn reflection(&self) -> &Arc<dyn ReflectionFacade> {
        &self.reflection
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// 注册或替换同名定义，返回被替换的定义
    pub fn register(&self, definition: BeanDefinition) -> Option<Arc<BeanDefinition>> {
        let name = definition.name().to_string();
        info!(
            "注册 Bean: {} ({}, {})",
            name,
            definition.class().name(),
            definition.scope()
        );

        let mut definitions = self.definitions.write();
        let replaced = definitions.by_name.insert(name.clone(), Arc::new(definition));
        if replaced.is_some() {
            warn!("Bean 定义被替换: {}", name);
        } else {
            definitions.order.push(name);
        }
        replaced
    }

    pub fn definition(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.definitions.read().by_name.get(name).cloned()
    }

    /// 按注册顺序返回所有定义
    pub fn definitions(&self) -> Vec<Arc<BeanDefinition>> {
        let definitions = self.definitions.read();
        definitions
            .order
            .iter()
            .filter_map(|name| definitions.by_name.get(name).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 在已有解析上下文中按名称解析
    pub fn resolve_in(&self, name: &str, ctx: &mut ResolveContext) -> ContainerResult<BeanHandle> {
        let definition = self.definition(name).ok_or_else(|| ContainerError::UnresolvedBean {
            name: name.to_string(),
        })?;
        definition.instance(self, ctx)
    }

    /// 按名称解析 Bean 自身的实例，不经过挂载的代理
    pub fn resolve_unproxied(&self, name: &str) -> ContainerResult<BeanHandle> {
        let definition = self.definition(name).ok_or_else(|| ContainerError::UnresolvedBean {
            name: name.to_string(),
        })?;
        definition.unproxied_instance(self, &mut self.context())
    }

    /// 唯一可赋值给 `type_name` 的定义
    pub fn candidate_definition(&self, type_name: &str) -> ContainerResult<Option<Arc<BeanDefinition>>> {
        let mut candidates: Vec<Arc<BeanDefinition>> = self
            .definitions()
            .into_iter()
            .filter(|definition| definition.class().is_assignable_to(type_name))
            .collect();
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(candidates.pop()),
            _ => Err(ContainerError::AmbiguousCandidate {
                type_name: type_name.to_string(),
                candidates: candidates
                    .iter()
                    .map(|definition| definition.name().to_string())
                    .collect(),
            }),
        }
    }

    /// 在已有解析上下文中按类型查找并解析唯一候选
    pub fn find_candidate_in(
        &self,
        type_name: &str,
        ctx: &mut ResolveContext,
    ) -> ContainerResult<Option<BeanHandle>> {
        match self.candidate_definition(type_name)? {
            Some(definition) => definition.instance(self, ctx).map(Some),
            None => Ok(None),
        }
    }

    fn context(&self) -> ResolveContext {
        ResolveContext::with_options(self.options.clone())
    }
}

impl Default for BeanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanRegistry")
            .field("beans", &self.definitions.read().order)
            .field("reflection", &self.reflection)
            .finish()
    }
}

impl BeanFactory for BeanRegistry {
    fn resolve(&self, name: &str) -> ContainerResult<BeanHandle> {
        self.resolve_in(name, &mut self.context())
    }

    fn find_candidate_name(&self, type_name: &str) -> ContainerResult<Option<String>> {
        Ok(self
            .candidate_definition(type_name)?
            .map(|definition| definition.name().to_string()))
    }

    fn find_candidate(&self, type_name: &str) -> ContainerResult<Option<BeanHandle>> {
        self.find_candidate_in(type_name, &mut self.context())
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.definitions.read().by_name.contains_key(name)
    }

    fn bean_names(&self) -> Vec<String> {
        self.definitions.read().order.clone()
    }
}
