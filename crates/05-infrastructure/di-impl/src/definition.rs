//! Bean 定义与实例化

use crate::invoker::DirectInvoker;
use crate::registry::BeanRegistry;
use di_abstractions::{
    BeanDeclaration, BeanHandle, ClassCatalog, ClassInfo, ClassRef, ConstructorInfo, FieldInfo,
    MethodInfo, ProxyTemplate, ReflectionFacade, ResolveContext,
};
use infrastructure_common::{BeanScope, ContainerError, ContainerResult, PropertyValue, Value};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 字段注入绑定
#[derive(Clone)]
pub struct FieldInjection {
    pub field: Arc<FieldInfo>,
    pub dependency: Arc<BeanDefinition>,
}

/// setter 注入绑定
#[derive(Clone)]
pub struct SetterInjection {
    pub method: Arc<MethodInfo>,
    pub dependency: Arc<BeanDefinition>,
}

impl fmt::Debug for FieldInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInjection")
            .field("field", &self.field.name())
            .field("dependency", &self.dependency.name())
            .finish()
    }
}

impl fmt::Debug for SetterInjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetterInjection")
            .field("method", &self.method.signature())
            .field("dependency", &self.dependency.name())
            .finish()
    }
}

/// Bean 定义
///
/// 注入绑定与代理模板由后处理阶段写入；单例的原始实例与代理实例分别缓存。
/// 代理模板按挂载顺序逐层包装，后挂载的在外层。单例一旦创建就不再接受新的模板。
#[derive(Debug)]
pub struct BeanDefinition {
    name: String,
    class: ClassRef,
    scope: BeanScope,
    lazy: bool,
    properties: BTreeMap<String, PropertyValue>,
    field_injections: RwLock<Vec<FieldInjection>>,
    setter_injections: RwLock<Vec<SetterInjection>>,
    proxies: RwLock<Vec<Arc<dyn ProxyTemplate>>>,
    raw_singleton: OnceCell<BeanHandle>,
    proxied_singleton: RwLock<Option<BeanHandle>>,
}

impl BeanDefinition {
    pub fn new(name: impl Into<String>, class: ClassRef) -> Self {
        Self {
            name: name.into(),
            class,
            scope: BeanScope::Singleton,
            lazy: false,
            properties: BTreeMap::new(),
            field_injections: RwLock::new(Vec::new()),
            setter_injections: RwLock::new(Vec::new()),
            proxies: RwLock::new(Vec::new()),
            raw_singleton: OnceCell::new(),
            proxied_singleton: RwLock::new(None),
        }
    }

    /// 从声明构造，类型名在目录中查找
    pub fn from_declaration(declaration: &BeanDeclaration, catalog: &ClassCatalog) -> ContainerResult<Self> {
        let class = catalog.lookup(&declaration.name, &declaration.type_name)?;
        let mut definition = Self::new(declaration.name.clone(), class)
            .with_scope(declaration.scope)
            .with_lazy(declaration.lazy);
        definition.properties = declaration.properties.clone();
        Ok(definition)
    }

    pub fn with_scope(mut self, scope: BeanScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_property(mut self, field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(field.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn scope(&self) -> BeanScope {
        self.scope
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn field_injections(&self) -> Vec<FieldInjection> {
        self.field_injections.read().clone()
    }

    pub fn setter_injections(&self) -> Vec<SetterInjection> {
        self.setter_injections.read().clone()
    }

    pub fn set_field_injections(&self, injections: Vec<FieldInjection>) {
        *self.field_injections.write() = injections;
    }

    pub fn set_setter_injections(&self, injections: Vec<SetterInjection>) {
        *self.setter_injections.write() = injections;
    }

    /// 挂载代理模板，之后解析得到的是代理
    ///
    /// 单例已经创建时返回 [`ContainerError::ProxyAfterInstantiation`]。
    pub fn attach_proxy(&self, template: Arc<dyn ProxyTemplate>) -> ContainerResult<()> {
        let mut proxies = self.proxies.write();
        if self.scope.is_singleton() && self.is_instantiated() {
            return Err(ContainerError::ProxyAfterInstantiation {
                name: self.name.clone(),
            });
        }
        debug!("挂载代理: {} -> {} (第 {} 层)", self.name, template.describe(), proxies.len() + 1);
        proxies.push(template);
        Ok(())
    }

    /// 撤下一个模板，并丢弃已缓存的代理实例
    pub fn detach_proxy(&self, template: &Arc<dyn ProxyTemplate>) {
        let mut proxies = self.proxies.write();
        proxies.retain(|attached| !same_template(attached, template));
        *self.proxied_singleton.write() = None;
        debug!("撤下代理: {} -> {}", self.name, template.describe());
    }

    /// 按挂载顺序返回代理模板
    pub fn proxies(&self) -> Vec<Arc<dyn ProxyTemplate>> {
        self.proxies.read().clone()
    }

    pub fn is_proxied(&self) -> bool {
        !self.proxies.read().is_empty()
    }

    /// 单例是否已实例化
    pub fn is_instantiated(&self) -> bool {
        self.raw_singleton.get().is_some()
    }

    /// 按作用域取得实例
    pub fn instance(&self, registry: &BeanRegistry, ctx: &mut ResolveContext) -> ContainerResult<BeanHandle> {
        if self.scope.is_singleton() {
            if let Some(ready) = self.memoized() {
                return Ok(ready);
            }
        }

        ctx.push_bean(&self.name)?;
        let result = match self.scope {
            BeanScope::Singleton => self.singleton(registry, ctx),
            BeanScope::Prototype => self.prototype(registry, ctx),
        };
        ctx.pop_bean();
        result
    }

    /// 取得不经过代理的实例；单例与 [`Self::instance`] 共享同一个原始实例
    pub fn unproxied_instance(&self, registry: &BeanRegistry, ctx: &mut ResolveContext) -> ContainerResult<BeanHandle> {
        if let Some(raw) = self.raw_singleton.get() {
            return Ok(Arc::clone(raw));
        }

        ctx.push_bean(&self.name)?;
        let result = match self.scope {
            BeanScope::Singleton => self.raw(registry, ctx),
            BeanScope::Prototype => self.create(registry, ctx),
        };
        ctx.pop_bean();
        result
    }

    fn memoized(&self) -> Option<BeanHandle> {
        if self.is_proxied() {
            self.proxied_singleton.read().clone()
        } else {
            self.raw_singleton.get().cloned()
        }
    }

    fn raw(&self, registry: &BeanRegistry, ctx: &mut ResolveContext) -> ContainerResult<BeanHandle> {
        self.raw_singleton
            .get_or_try_init(|| self.create(registry, ctx))
            .cloned()
    }

    fn singleton(&self, registry: &BeanRegistry, ctx: &mut ResolveContext) -> ContainerResult<BeanHandle> {
        let raw = self.raw(registry, ctx)?;
        let proxies = self.proxies();
        if proxies.is_empty() {
            return Ok(raw);
        }

        let mut cached = self.proxied_singleton.write();
        if let Some(proxied) = cached.as_ref() {
            return Ok(Arc::clone(proxied));
        }
        let proxied = wrap_all(&proxies, raw);
        *cached = Some(Arc::clone(&proxied));
        Ok(proxied)
    }

    fn prototype(&self, registry: &BeanRegistry, ctx: &mut ResolveContext) -> ContainerResult<BeanHandle> {
        let raw = self.create(registry, ctx)?;
        Ok(wrap_all(&self.proxies(), raw))
    }

    fn create(&self, registry: &BeanRegistry, ctx: &mut ResolveContext) -> ContainerResult<BeanHandle> {
        let reflection = registry.reflection();
        debug!("实例化 Bean: {} ({})", self.name, self.class.name());

        let constructor = select_constructor(&self.class, reflection.as_ref())?;
        let mut args = Vec::with_capacity(constructor.param_types().len());
        if constructor.is_autowired() {
            for param_type in constructor.param_types() {
                let dependency = registry.find_candidate_in(param_type, ctx)?.ok_or_else(|| {
                    ContainerError::UnsatisfiedDependency {
                        bean_name: self.name.clone(),
                        requirement: param_type.clone(),
                    }
                })?;
                args.push(Value::new(dependency));
            }
        }
        let mut instance = reflection.new_instance(&constructor, args)?;

        for injection in self.field_injections() {
            let dependency = injection.dependency.instance(registry, ctx)?;
            reflection.set_field(&injection.field, instance.as_mut(), Value::new(dependency))?;
        }
        for injection in self.setter_injections() {
            let dependency = injection.dependency.instance(registry, ctx)?;
            reflection.invoke_mut(&injection.method, instance.as_mut(), &[Value::new(dependency)])?;
        }

        for (field_name, property) in &self.properties {
            let field = self
                .class
                .field(field_name)
                .ok_or_else(|| ContainerError::FieldNotFound {
                    type_name: self.class.name().to_string(),
                    field: field_name.clone(),
                })?;
            let value = property.resolve_for(field_name, field.type_name())?;
            reflection.set_field(field, instance.as_mut(), value)?;
        }

        if let Some(init) = post_construct_method(&self.class, reflection.as_ref())? {
            debug!("调用初始化方法: {}.{}", self.name, init.name());
            reflection.invoke_mut(&init, instance.as_mut(), &[])?;
        }

        let target = Value::from_boxed(instance, self.class.rust_type());
        Ok(Arc::new(DirectInvoker::new(
            self.name.clone(),
            Arc::clone(&self.class),
            target,
            Arc::clone(reflection),
        )))
    }
}

fn wrap_all(proxies: &[Arc<dyn ProxyTemplate>], raw: BeanHandle) -> BeanHandle {
    proxies
        .iter()
        .fold(raw, |handle, template| template.wrap(handle))
}

fn same_template(a: &Arc<dyn ProxyTemplate>, b: &Arc<dyn ProxyTemplate>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// 选择构造函数：唯一的自动装配构造函数，否则无参构造函数
pub fn select_constructor(
    class: &ClassInfo,
    reflection: &dyn ReflectionFacade,
) -> ContainerResult<Arc<ConstructorInfo>> {
    let constructors = reflection.all_constructors(class);
    let mut autowired = constructors.iter().filter(|ctor| ctor.is_autowired());
    match (autowired.next(), autowired.next()) {
        (Some(_), Some(_)) => Err(ContainerError::MultipleAutowiredConstructors {
            type_name: class.name().to_string(),
        }),
        (Some(only), None) => Ok(Arc::clone(only)),
        (None, _) => constructors
            .iter()
            .find(|ctor| ctor.is_default())
            .cloned()
            .ok_or_else(|| ContainerError::NoUsableConstructor {
                type_name: class.name().to_string(),
            }),
    }
}

/// 查找唯一的初始化方法
pub fn post_construct_method(
    class: &ClassInfo,
    reflection: &dyn ReflectionFacade,
) -> ContainerResult<Option<Arc<MethodInfo>>> {
    let mut marked: Vec<Arc<MethodInfo>> = reflection
        .all_methods(class)
        .into_iter()
        .filter(|method| method.is_post_construct())
        .collect();
    if marked.len() > 1 {
        return Err(ContainerError::MultiplePostConstruct {
            type_name: class.name().to_string(),
            methods: marked.iter().map(|method| method.name().to_string()).collect(),
        });
    }
    Ok(marked.pop())
}
