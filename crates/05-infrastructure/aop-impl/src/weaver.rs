//! 切面织入

use crate::expression::{parse_bean_reference, MethodTarget};
use crate::join_point::{Advisor, JoinPoint, ProceedingJoinPoint};
use crate::pointcut::Pointcut;
use crate::proxy::ProxyFactory;
use di_abstractions::{AdviceDeclaration, AdviceKind, AdviceTargets, MethodInfo, ProxyTemplate};
use di_impl::{BeanDefinition, BeanDefinitionPostProcessor, BeanRegistry};
use infrastructure_common::{ContainerError, ContainerResult};
use std::any::type_name;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// 切面织入器
///
/// 分三步：为全部通知声明构建切点（不创建切面实例），把代理挂到定义上，
/// 最后创建切面实例并绑定到连接点。任一步出错时撤下本次挂载的全部代理。
#[derive(Debug, Clone, Default)]
pub struct AspectWeaver {
    declarations: Vec<AdviceDeclaration>,
    factory: ProxyFactory,
}

impl AspectWeaver {
    pub fn new(declarations: Vec<AdviceDeclaration>) -> Self {
        Self {
            declarations,
            factory: ProxyFactory::new(),
        }
    }

    pub fn declarations(&self) -> &[AdviceDeclaration] {
        &self.declarations
    }

    /// 按首次涉及的顺序返回每个被通知 Bean 的切点
    pub fn build_pointcuts(&self, registry: &BeanRegistry) -> ContainerResult<Vec<Pointcut>> {
        self.plan(registry).map(|(pointcuts, _)| pointcuts)
    }

    fn plan(&self, registry: &BeanRegistry) -> ContainerResult<(Vec<Pointcut>, Vec<Arc<Advisor>>)> {
        let aspects: HashSet<&str> = self
            .declarations
            .iter()
            .map(|declaration| declaration.aspect.as_str())
            .collect();
        let mut advisors: Vec<Arc<Advisor>> = Vec::new();
        let mut pointcuts: Vec<Pointcut> = Vec::new();

        for declaration in &self.declarations {
            let advisor = match advisors
                .iter()
                .find(|advisor| advisor.aspect() == declaration.aspect)
            {
                Some(existing) => Arc::clone(existing),
                None => {
                    let created = Arc::new(Advisor::new(declaration.aspect.clone()));
                    advisors.push(Arc::clone(&created));
                    created
                }
            };
            let advice = self.advice_join_point(registry, declaration, advisor)?;

            match &declaration.targets {
                AdviceTargets::Beans(references) => {
                    for reference in references {
                        let parsed = parse_bean_reference(&declaration.aspect, reference)?;
                        let definition = registry.definition(&parsed.bean).ok_or_else(|| {
                            ContainerError::UnresolvedBean {
                                name: parsed.bean.clone(),
                            }
                        })?;
                        for join_point in self.bind(registry, &definition, &advice, &parsed.target)? {
                            pointcut_for(&mut pointcuts, &definition).add(join_point);
                        }
                    }
                }
                AdviceTargets::Within(prefixes) => {
                    for definition in registry.definitions() {
                        if aspects.contains(definition.name()) {
                            continue;
                        }
                        let class_name = definition.class().name();
                        if prefixes.iter().any(|prefix| class_name.starts_with(prefix.as_str())) {
                            let join_point = advice.for_class(definition.name());
                            pointcut_for(&mut pointcuts, &definition).add(join_point);
                        }
                    }
                }
            }
        }

        Ok((pointcuts, advisors))
    }

    /// 织入并返回被代理的 Bean 数量
    pub fn weave(&self, registry: &BeanRegistry) -> ContainerResult<usize> {
        let (pointcuts, advisors) = self.plan(registry)?;
        let woven = pointcuts.len();

        let mut attached: Vec<(Arc<BeanDefinition>, Arc<dyn ProxyTemplate>)> = Vec::with_capacity(woven);
        for pointcut in pointcuts {
            let Some(definition) = registry.definition(pointcut.bean_name()) else {
                continue;
            };
            let template: Arc<dyn ProxyTemplate> = self.factory.create_template(pointcut, definition.class());
            if let Err(e) = definition.attach_proxy(Arc::clone(&template)) {
                rollback(&attached);
                return Err(e);
            }
            attached.push((definition, template));
        }

        // 切面自身不经过代理调用通知方法
        for advisor in &advisors {
            match registry.resolve_unproxied(advisor.aspect()) {
                Ok(handle) => {
                    advisor.bind(handle);
                }
                Err(e) => {
                    rollback(&attached);
                    return Err(e);
                }
            }
        }

        info!("切面织入完成: {} 个通知声明, {} 个 Bean 被代理", self.declarations.len(), woven);
        Ok(woven)
    }

    fn advice_join_point(
        &self,
        registry: &BeanRegistry,
        declaration: &AdviceDeclaration,
        advisor: Arc<Advisor>,
    ) -> ContainerResult<JoinPoint> {
        let aspect = registry
            .definition(&declaration.aspect)
            .ok_or_else(|| ContainerError::UnresolvedBean {
                name: declaration.aspect.clone(),
            })?;
        let expected = match declaration.kind {
            AdviceKind::Around => type_name::<ProceedingJoinPoint>(),
            AdviceKind::Before | AdviceKind::After => type_name::<JoinPoint>(),
        };
        let advice_method = registry
            .reflection()
            .method_by_signature(aspect.class(), &declaration.advice_method, &[expected.to_string()])
            .ok_or_else(|| ContainerError::MethodNotFound {
                type_name: aspect.class().name().to_string(),
                method: declaration.advice_method.clone(),
                params: expected.to_string(),
            })?;
        debug!(
            "{}通知: {}.{} (order = {})",
            declaration.kind.as_str(),
            declaration.aspect,
            declaration.advice_method,
            declaration.order
        );
        Ok(JoinPoint::new(advisor, advice_method, declaration.kind).with_order(declaration.order))
    }

    fn bind(
        &self,
        registry: &BeanRegistry,
        definition: &BeanDefinition,
        advice: &JoinPoint,
        target: &MethodTarget,
    ) -> ContainerResult<Vec<JoinPoint>> {
        let reflection = registry.reflection();
        let class = definition.class();
        let bean_name = definition.name();

        match target {
            MethodTarget::Class => Ok(vec![advice.for_class(bean_name)]),
            MethodTarget::Method { name, params } => {
                let method = reflection
                    .method_by_signature(class, name, params)
                    .filter(|method| !method.is_exclusive())
                    .ok_or_else(|| ContainerError::MethodNotFound {
                        type_name: class.name().to_string(),
                        method: name.clone(),
                        params: params.join(","),
                    })?;
                Ok(vec![advice.for_method(bean_name, method)])
            }
            MethodTarget::AllOverloads { name } => {
                let overloads: Vec<Arc<MethodInfo>> = reflection
                    .methods_named(class, name)
                    .into_iter()
                    .filter(|method| !method.is_exclusive())
                    .collect();
                if overloads.is_empty() {
                    return Err(ContainerError::MethodNotFound {
                        type_name: class.name().to_string(),
                        method: name.clone(),
                        params: "*".to_string(),
                    });
                }
                Ok(overloads
                    .into_iter()
                    .map(|method| advice.for_method(bean_name, method))
                    .collect())
            }
        }
    }
}

fn rollback(attached: &[(Arc<BeanDefinition>, Arc<dyn ProxyTemplate>)]) {
    for (definition, template) in attached.iter().rev() {
        definition.detach_proxy(template);
    }
}

fn pointcut_for<'a>(pointcuts: &'a mut Vec<Pointcut>, definition: &BeanDefinition) -> &'a mut Pointcut {
    let index = match pointcuts
        .iter()
        .position(|pointcut| pointcut.bean_name() == definition.name())
    {
        Some(index) => index,
        None => {
            pointcuts.push(Pointcut::new(definition.name(), definition.class().name()));
            pointcuts.len() - 1
        }
    };
    &mut pointcuts[index]
}

impl BeanDefinitionPostProcessor for AspectWeaver {
    fn name(&self) -> &str {
        "aspect-weaver"
    }

    fn order(&self) -> i32 {
        100
    }

    fn post_process(&self, registry: &BeanRegistry) -> ContainerResult<()> {
        self.weave(registry).map(|_| ())
    }
}

/// 对注册表织入一组通知声明
pub fn weave(registry: &BeanRegistry, declarations: &[AdviceDeclaration]) -> ContainerResult<usize> {
    AspectWeaver::new(declarations.to_vec()).weave(registry)
}
