//! 直接调用目标实例的 Bean 句柄

use di_abstractions::{ClassRef, Invokable, MethodInfo, ReflectionFacade};
use infrastructure_common::{ContainerResult, Value};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// 未经代理的 Bean
pub struct DirectInvoker {
    bean_name: String,
    class: ClassRef,
    target: Value,
    reflection: Arc<dyn ReflectionFacade>,
}

impl DirectInvoker {
    pub fn new(
        bean_name: impl Into<String>,
        class: ClassRef,
        target: Value,
        reflection: Arc<dyn ReflectionFacade>,
    ) -> Self {
        Self {
            bean_name: bean_name.into(),
            class,
            target,
            reflection,
        }
    }
}

impl fmt::Debug for DirectInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectInvoker")
            .field("bean_name", &self.bean_name)
            .field("class", &self.class.name())
            .finish()
    }
}

impl Invokable for DirectInvoker {
    fn bean_name(&self) -> &str {
        &self.bean_name
    }

    fn class(&self) -> &ClassRef {
        &self.class
    }

    fn target(&self) -> &Value {
        &self.target
    }

    fn invoke_method(&self, method: &Arc<MethodInfo>, args: Vec<Value>) -> ContainerResult<Value> {
        trace!("直接调用: {}.{}", self.bean_name, method.signature());
        self.reflection.invoke(method, self.target.as_any(), &args)
    }
}
