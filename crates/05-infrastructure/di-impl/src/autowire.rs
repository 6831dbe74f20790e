//! 定义后处理与自动装配

use crate::definition::{
    post_construct_method, select_constructor, BeanDefinition, FieldInjection, SetterInjection,
};
use crate::registry::BeanRegistry;
use di_abstractions::{Autowired, BeanFactory};
use infrastructure_common::{ContainerError, ContainerResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Bean 定义后处理器
///
/// 所有定义注册完成后按 `order` 从小到大依次运行
pub trait BeanDefinitionPostProcessor: Send + Sync {
    fn name(&self) -> &str;

    fn order(&self) -> i32 {
        0
    }

    fn post_process(&self, registry: &BeanRegistry) -> ContainerResult<()>;
}

/// 自动装配后处理器
///
/// 校验构造函数与初始化方法，并把每个自动装配字段和 setter
/// 绑定到唯一的候选定义上。重复运行结果相同。
#[derive(Debug, Default, Clone, Copy)]
pub struct AutowiringPostProcessor;

impl AutowiringPostProcessor {
    pub fn new() -> Self {
        Self
    }

    fn wire(&self, registry: &BeanRegistry, definition: &BeanDefinition) -> ContainerResult<()> {
        let reflection = registry.reflection();
        let class = definition.class();

        let constructor = select_constructor(class, reflection.as_ref())?;
        post_construct_method(class, reflection.as_ref())?;
        if constructor.is_autowired() {
            for param_type in constructor.param_types() {
                if registry.find_candidate_name(param_type)?.is_none() {
                    return Err(ContainerError::UnsatisfiedDependency {
                        bean_name: definition.name().to_string(),
                        requirement: param_type.clone(),
                    });
                }
            }
        }

        let mut fields = Vec::new();
        for field in reflection.all_fields(class) {
            let Some(autowired) = field.autowired() else {
                continue;
            };
            let dependency = self.dependency_for(registry, definition, autowired, field.type_name())?;
            debug!("字段注入: {}.{} <- {}", definition.name(), field.name(), dependency.name());
            fields.push(FieldInjection {
                field: Arc::clone(&field),
                dependency,
            });
        }

        let mut setters = Vec::new();
        for method in reflection.all_methods(class) {
            let Some(autowired) = method.autowired() else {
                continue;
            };
            if method.param_types().len() != 1 {
                return Err(ContainerError::InvalidSetter {
                    type_name: class.name().to_string(),
                    method: method.name().to_string(),
                    reason: format!("需要 1 个参数, 实际 {} 个", method.param_types().len()),
                });
            }
            let dependency = self.dependency_for(registry, definition, autowired, &method.param_types()[0])?;
            debug!("setter 注入: {}.{} <- {}", definition.name(), method.name(), dependency.name());
            setters.push(SetterInjection {
                method: Arc::clone(&method),
                dependency,
            });
        }

        definition.set_field_injections(fields);
        definition.set_setter_injections(setters);
        Ok(())
    }

    fn dependency_for(
        &self,
        registry: &BeanRegistry,
        definition: &BeanDefinition,
        autowired: &Autowired,
        declared_type: &str,
    ) -> ContainerResult<Arc<BeanDefinition>> {
        let found = match &autowired.qualifier {
            Some(qualifier) => registry.definition(qualifier),
            None => registry.candidate_definition(declared_type)?,
        };
        found.ok_or_else(|| ContainerError::UnsatisfiedDependency {
            bean_name: definition.name().to_string(),
            requirement: match &autowired.qualifier {
                Some(qualifier) => format!("名称为 {} 的 Bean", qualifier),
                None => declared_type.to_string(),
            },
        })
    }
}

impl BeanDefinitionPostProcessor for AutowiringPostProcessor {
    fn name(&self) -> &str {
        "autowiring"
    }

    fn post_process(&self, registry: &BeanRegistry) -> ContainerResult<()> {
        let definitions = registry.definitions();
        for definition in &definitions {
            self.wire(registry, definition)?;
        }
        info!("自动装配完成: {} 个 Bean", definitions.len());
        Ok(())
    }
}
