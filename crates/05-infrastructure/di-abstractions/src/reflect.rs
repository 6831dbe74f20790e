//! 反射抽象
//!
//! Rust 没有运行时反射，每个组件类型通过 [`ClassBuilder`] 显式声明一次
//! 构造函数、字段与方法，容器只通过 [`ReflectionFacade`] 访问这些描述。

use crate::invokable::BeanHandle;
use infrastructure_common::{ContainerError, ContainerResult, Value};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// 构造函数产出的实例，注入完成前可变
pub type Instance = Box<dyn Any + Send + Sync>;

/// 字段写入函数类型
pub type FieldSetter =
    Arc<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> ContainerResult<()> + Send + Sync>;

/// 字段读取函数类型
pub type FieldGetter = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> ContainerResult<Value> + Send + Sync>;

/// 构造函数类型
pub type ConstructorFn = Arc<dyn Fn(Vec<Value>) -> ContainerResult<Instance> + Send + Sync>;

type SharedFn = dyn Fn(&(dyn Any + Send + Sync), &[Value]) -> ContainerResult<Value> + Send + Sync;
type ExclusiveFn =
    dyn Fn(&mut (dyn Any + Send + Sync), &[Value]) -> ContainerResult<Value> + Send + Sync;

/// 自动装配标记
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autowired {
    /// 显式指定的候选 Bean 名称
    pub qualifier: Option<String>,
}

impl Autowired {
    pub fn by_type() -> Self {
        Self { qualifier: None }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(name.into()),
        }
    }
}

/// 方法体
#[derive(Clone)]
pub enum MethodBody {
    /// 在共享实例上调用
    Shared(Arc<SharedFn>),
    /// 只能在构造阶段的独占实例上调用（setter、post-construct）
    Exclusive(Arc<ExclusiveFn>),
}

/// 字段描述
pub struct FieldInfo {
    declaring_type: String,
    name: String,
    type_name: String,
    autowired: Option<Autowired>,
    setter: FieldSetter,
    getter: Option<FieldGetter>,
}

impl FieldInfo {
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 声明类型名；自动装配字段为 Bean 类型名，其余为 Rust 类型名
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn autowired(&self) -> Option<&Autowired> {
        self.autowired.as_ref()
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("declaring_type", &self.declaring_type)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("autowired", &self.autowired)
            .field("setter", &"<function>")
            .finish()
    }
}

/// 方法描述
pub struct MethodInfo {
    declaring_type: String,
    name: String,
    param_types: Vec<String>,
    autowired: Option<Autowired>,
    post_construct: bool,
    body: MethodBody,
}

impl MethodInfo {
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_types(&self) -> &[String] {
        &self.param_types
    }

    pub fn autowired(&self) -> Option<&Autowired> {
        self.autowired.as_ref()
    }

    pub fn is_post_construct(&self) -> bool {
        self.post_construct
    }

    pub fn is_exclusive(&self) -> bool {
        matches!(self.body, MethodBody::Exclusive(_))
    }

    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    /// 形如 `add(i32,i32)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.param_types.join(","))
    }

    pub fn has_signature<S: AsRef<str>>(&self, name: &str, param_types: &[S]) -> bool {
        self.name == name
            && self.param_types.len() == param_types.len()
            && self
                .param_types
                .iter()
                .zip(param_types)
                .all(|(declared, wanted)| declared == wanted.as_ref())
    }

    /// 名称与参数类型列表都相同
    pub fn same_signature(&self, other: &MethodInfo) -> bool {
        self.has_signature(&other.name, &other.param_types)
    }

    fn qualified(&self) -> String {
        format!("{}.{}", self.declaring_type, self.signature())
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("declaring_type", &self.declaring_type)
            .field("signature", &self.signature())
            .field("autowired", &self.autowired)
            .field("post_construct", &self.post_construct)
            .field("exclusive", &self.is_exclusive())
            .finish()
    }
}

/// 构造函数描述
pub struct ConstructorInfo {
    declaring_type: String,
    param_types: Vec<String>,
    autowired: bool,
    factory: ConstructorFn,
}

impl ConstructorInfo {
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn param_types(&self) -> &[String] {
        &self.param_types
    }

    pub fn is_autowired(&self) -> bool {
        self.autowired
    }

    pub fn is_default(&self) -> bool {
        self.param_types.is_empty()
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("declaring_type", &self.declaring_type)
            .field("param_types", &self.param_types)
            .field("autowired", &self.autowired)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 类型描述
pub struct ClassInfo {
    name: String,
    rust_type: &'static str,
    interfaces: Vec<String>,
    supertypes: Vec<String>,
    fields: Vec<Arc<FieldInfo>>,
    methods: Vec<Arc<MethodInfo>>,
    constructors: Vec<Arc<ConstructorInfo>>,
}

/// 共享的类型描述引用
pub type ClassRef = Arc<ClassInfo>;

impl ClassInfo {
    /// 为类型 `T` 创建描述构建器，`name` 为全限定名，如 `demo.service.Calculator`
    pub fn builder<T: Any + Send + Sync>(name: impl Into<String>) -> ClassBuilder<T> {
        ClassBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 底层 Rust 类型名
    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    /// 包名，即最后一个 `.` 之前的部分
    pub fn package(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(package, _)| package)
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn fields(&self) -> &[Arc<FieldInfo>] {
        &self.fields
    }

    pub fn methods(&self) -> &[Arc<MethodInfo>] {
        &self.methods
    }

    pub fn constructors(&self) -> &[Arc<ConstructorInfo>] {
        &self.constructors
    }

    pub fn field(&self, name: &str) -> Option<&Arc<FieldInfo>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// 自身、任一接口或任一父类型与 `type_name` 相同
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.name == type_name
            || self.interfaces.iter().any(|i| i == type_name)
            || self.supertypes.iter().any(|s| s == type_name)
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type)
            .field("interfaces", &self.interfaces)
            .field("supertypes", &self.supertypes)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

fn this_ref<'a, T: Any>(instance: &'a (dyn Any + Send + Sync), member: &str) -> ContainerResult<&'a T> {
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| ContainerError::IllegalInvocation {
            method: member.to_string(),
            reason: format!("实例类型不是 {}", type_name::<T>()),
        })
}

fn this_mut<'a, T: Any>(
    instance: &'a mut (dyn Any + Send + Sync),
    member: &str,
) -> ContainerResult<&'a mut T> {
    instance
        .downcast_mut::<T>()
        .ok_or_else(|| ContainerError::IllegalInvocation {
            method: member.to_string(),
            reason: format!("实例类型不是 {}", type_name::<T>()),
        })
}

/// 按位置取出强类型参数
pub fn arg<A: Any + Clone>(args: &[Value], index: usize, member: &str) -> ContainerResult<A> {
    let value = args.get(index).ok_or_else(|| ContainerError::ArgumentMismatch {
        method: member.to_string(),
        expected: type_name::<A>().to_string(),
        actual: "<missing>".to_string(),
    })?;
    value.extract::<A>().ok_or_else(|| ContainerError::ArgumentMismatch {
        method: member.to_string(),
        expected: type_name::<A>().to_string(),
        actual: value.type_name().to_string(),
    })
}

fn handles(args: Vec<Value>, member: &str) -> ContainerResult<Vec<BeanHandle>> {
    (0..args.len())
        .map(|index| arg::<BeanHandle>(&args, index, member))
        .collect()
}

/// 类型描述构建器
pub struct ClassBuilder<T> {
    info: ClassInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            info: ClassInfo {
                name: name.into(),
                rust_type: type_name::<T>(),
                interfaces: Vec::new(),
                supertypes: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    fn member(&self, name: &str) -> String {
        format!("{}.{}", self.info.name, name)
    }

    /// 声明实现的接口
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.info.interfaces.push(interface.into());
        self
    }

    /// 声明父类型
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.info.supertypes.push(supertype.into());
        self
    }

    /// 无参构造函数
    pub fn constructor<F>(mut self, create: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: ConstructorFn =
            Arc::new(move |_args: Vec<Value>| -> ContainerResult<Instance> { Ok(Box::new(create())) });
        self.push_constructor(Vec::new(), false, factory);
        self
    }

    /// 带参数但不参与自动装配的构造函数
    pub fn constructor_with<F>(mut self, param_types: &[&str], create: F) -> Self
    where
        F: Fn(Vec<Value>) -> ContainerResult<T> + Send + Sync + 'static,
    {
        let factory: ConstructorFn = Arc::new(move |args: Vec<Value>| -> ContainerResult<Instance> {
            Ok(Box::new(create(args)?))
        });
        self.push_constructor(owned(param_types), false, factory);
        self
    }

    /// 自动装配构造函数，每个参数按 Bean 类型查找唯一候选
    pub fn autowired_constructor<F>(mut self, param_types: &[&str], create: F) -> Self
    where
        F: Fn(Vec<BeanHandle>) -> ContainerResult<T> + Send + Sync + 'static,
    {
        let member = self.member("<init>");
        let factory: ConstructorFn = Arc::new(move |args: Vec<Value>| -> ContainerResult<Instance> {
            let deps = handles(args, &member)?;
            Ok(Box::new(create(deps)?))
        });
        self.push_constructor(owned(param_types), true, factory);
        self
    }

    fn push_constructor(&mut self, param_types: Vec<String>, autowired: bool, factory: ConstructorFn) {
        self.info.constructors.push(Arc::new(ConstructorInfo {
            declaring_type: self.info.name.clone(),
            param_types,
            autowired,
            factory,
        }));
    }

    /// 可写字段
    pub fn field<V, F>(mut self, name: &str, set: F) -> Self
    where
        V: Any + Clone + Send + Sync,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let setter = typed_setter::<T, V, F>(self.member(name), set);
        self.push_field(name, type_name::<V>().to_string(), None, setter, None);
        self
    }

    /// 可读写字段
    pub fn property<V, G, S>(mut self, name: &str, get: G, set: S) -> Self
    where
        V: Any + Clone + Send + Sync,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let member = self.member(name);
        let setter = typed_setter::<T, V, S>(member.clone(), set);
        let getter: FieldGetter = Arc::new(move |instance: &(dyn Any + Send + Sync)| {
            let this = this_ref::<T>(instance, &member)?;
            Ok(Value::new(get(this)))
        });
        self.push_field(name, type_name::<V>().to_string(), None, setter, Some(getter));
        self
    }

    /// 按类型自动装配的字段
    pub fn autowired_field<F>(self, name: &str, bean_type: &str, set: F) -> Self
    where
        F: Fn(&mut T, BeanHandle) + Send + Sync + 'static,
    {
        self.injected_field(name, bean_type, Autowired::by_type(), set)
    }

    /// 按名称自动装配的字段
    pub fn qualified_field<F>(self, name: &str, bean_type: &str, qualifier: &str, set: F) -> Self
    where
        F: Fn(&mut T, BeanHandle) + Send + Sync + 'static,
    {
        self.injected_field(name, bean_type, Autowired::by_name(qualifier), set)
    }

    fn injected_field<F>(mut self, name: &str, bean_type: &str, autowired: Autowired, set: F) -> Self
    where
        F: Fn(&mut T, BeanHandle) + Send + Sync + 'static,
    {
        let setter = typed_setter::<T, BeanHandle, F>(self.member(name), set);
        self.push_field(name, bean_type.to_string(), Some(autowired), setter, None);
        self
    }

    fn push_field(
        &mut self,
        name: &str,
        type_name: String,
        autowired: Option<Autowired>,
        setter: FieldSetter,
        getter: Option<FieldGetter>,
    ) {
        self.info.fields.push(Arc::new(FieldInfo {
            declaring_type: self.info.name.clone(),
            name: name.to_string(),
            type_name,
            autowired,
            setter,
            getter,
        }));
    }

    pub fn method0<R, F>(mut self, name: &str, body: F) -> Self
    where
        R: Any + Send + Sync,
        F: Fn(&T) -> ContainerResult<R> + Send + Sync + 'static,
    {
        let member = self.member(name);
        self.push_shared(name, Vec::new(), move |instance, _args| {
            let this = this_ref::<T>(instance, &member)?;
            body(this).map(Value::new)
        });
        self
    }

    pub fn method1<A, R, F>(mut self, name: &str, body: F) -> Self
    where
        A: Any + Clone + Send + Sync,
        R: Any + Send + Sync,
        F: Fn(&T, A) -> ContainerResult<R> + Send + Sync + 'static,
    {
        let member = self.member(name);
        let params = vec![type_name::<A>().to_string()];
        self.push_shared(name, params, move |instance, args| {
            let this = this_ref::<T>(instance, &member)?;
            body(this, arg::<A>(args, 0, &member)?).map(Value::new)
        });
        self
    }

    pub fn method2<A, B, R, F>(mut self, name: &str, body: F) -> Self
    where
        A: Any + Clone + Send + Sync,
        B: Any + Clone + Send + Sync,
        R: Any + Send + Sync,
        F: Fn(&T, A, B) -> ContainerResult<R> + Send + Sync + 'static,
    {
        let member = self.member(name);
        let params = vec![type_name::<A>().to_string(), type_name::<B>().to_string()];
        self.push_shared(name, params, move |instance, args| {
            let this = this_ref::<T>(instance, &member)?;
            let a = arg::<A>(args, 0, &member)?;
            let b = arg::<B>(args, 1, &member)?;
            body(this, a, b).map(Value::new)
        });
        self
    }

    pub fn method3<A, B, C, R, F>(mut self, name: &str, body: F) -> Self
    where
        A: Any + Clone + Send + Sync,
        B: Any + Clone + Send + Sync,
        C: Any + Clone + Send + Sync,
        R: Any + Send + Sync,
        F: Fn(&T, A, B, C) -> ContainerResult<R> + Send + Sync + 'static,
    {
        let member = self.member(name);
        let params = vec![
            type_name::<A>().to_string(),
            type_name::<B>().to_string(),
            type_name::<C>().to_string(),
        ];
        self.push_shared(name, params, move |instance, args| {
            let this = this_ref::<T>(instance, &member)?;
            let a = arg::<A>(args, 0, &member)?;
            let b = arg::<B>(args, 1, &member)?;
            let c = arg::<C>(args, 2, &member)?;
            body(this, a, b, c).map(Value::new)
        });
        self
    }

    /// 按类型自动装配的 setter
    pub fn autowired_setter<F>(self, name: &str, bean_type: &str, set: F) -> Self
    where
        F: Fn(&mut T, BeanHandle) + Send + Sync + 'static,
    {
        self.injected_setter(name, bean_type, Autowired::by_type(), set)
    }

    /// 按名称自动装配的 setter
    pub fn qualified_setter<F>(self, name: &str, bean_type: &str, qualifier: &str, set: F) -> Self
    where
        F: Fn(&mut T, BeanHandle) + Send + Sync + 'static,
    {
        self.injected_setter(name, bean_type, Autowired::by_name(qualifier), set)
    }

    fn injected_setter<F>(mut self, name: &str, bean_type: &str, autowired: Autowired, set: F) -> Self
    where
        F: Fn(&mut T, BeanHandle) + Send + Sync + 'static,
    {
        let member = self.member(name);
        self.push_exclusive(
            name,
            vec![bean_type.to_string()],
            Some(autowired),
            false,
            move |instance, args| {
                let this = this_mut::<T>(instance, &member)?;
                set(this, arg::<BeanHandle>(args, 0, &member)?);
                Ok(Value::unit())
            },
        );
        self
    }

    /// 任意参数个数的自动装配方法；参数个数不为 1 时在装配阶段报错
    pub fn autowired_method<F>(mut self, name: &str, param_types: &[&str], body: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> ContainerResult<()> + Send + Sync + 'static,
    {
        let member = self.member(name);
        self.push_exclusive(
            name,
            owned(param_types),
            Some(Autowired::by_type()),
            false,
            move |instance, args| {
                body(this_mut::<T>(instance, &member)?, args)?;
                Ok(Value::unit())
            },
        );
        self
    }

    /// 构造完成后的回调
    pub fn post_construct<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&mut T) -> ContainerResult<()> + Send + Sync + 'static,
    {
        let member = self.member(name);
        self.push_exclusive(name, Vec::new(), None, true, move |instance, _args| {
            body(this_mut::<T>(instance, &member)?)?;
            Ok(Value::unit())
        });
        self
    }

    fn push_shared<F>(&mut self, name: &str, param_types: Vec<String>, body: F)
    where
        F: Fn(&(dyn Any + Send + Sync), &[Value]) -> ContainerResult<Value> + Send + Sync + 'static,
    {
        self.info.methods.push(Arc::new(MethodInfo {
            declaring_type: self.info.name.clone(),
            name: name.to_string(),
            param_types,
            autowired: None,
            post_construct: false,
            body: MethodBody::Shared(Arc::new(body)),
        }));
    }

    fn push_exclusive<F>(
        &mut self,
        name: &str,
        param_types: Vec<String>,
        autowired: Option<Autowired>,
        post_construct: bool,
        body: F,
    ) where
        F: Fn(&mut (dyn Any + Send + Sync), &[Value]) -> ContainerResult<Value> + Send + Sync + 'static,
    {
        self.info.methods.push(Arc::new(MethodInfo {
            declaring_type: self.info.name.clone(),
            name: name.to_string(),
            param_types,
            autowired,
            post_construct,
            body: MethodBody::Exclusive(Arc::new(body)),
        }));
    }

    pub fn build(self) -> ClassRef {
        debug!(
            "构建类型描述: {} ({} 个字段, {} 个方法, {} 个构造函数)",
            self.info.name,
            self.info.fields.len(),
            self.info.methods.len(),
            self.info.constructors.len()
        );
        Arc::new(self.info)
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn typed_setter<T, V, F>(member: String, set: F) -> FieldSetter
where
    T: Any,
    V: Any + Clone + Send + Sync,
    F: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |instance: &mut (dyn Any + Send + Sync), value: Value| {
        let typed = value.extract::<V>().ok_or_else(|| ContainerError::ArgumentMismatch {
            method: member.clone(),
            expected: type_name::<V>().to_string(),
            actual: value.type_name().to_string(),
        })?;
        set(this_mut::<T>(instance, &member)?, typed);
        Ok(())
    })
}

/// 反射访问接口
///
/// 容器只通过此接口枚举成员、读写字段与调用方法。
pub trait ReflectionFacade: Send + Sync + fmt::Debug {
    fn all_fields(&self, class: &ClassInfo) -> Vec<Arc<FieldInfo>>;

    fn all_methods(&self, class: &ClassInfo) -> Vec<Arc<MethodInfo>>;

    fn methods_named(&self, class: &ClassInfo, name: &str) -> Vec<Arc<MethodInfo>>;

    fn method_by_signature(
        &self,
        class: &ClassInfo,
        name: &str,
        param_types: &[String],
    ) -> Option<Arc<MethodInfo>>;

    fn all_constructors(&self, class: &ClassInfo) -> Vec<Arc<ConstructorInfo>>;

    fn get_field(&self, field: &FieldInfo, instance: &(dyn Any + Send + Sync)) -> ContainerResult<Value>;

    fn set_field(
        &self,
        field: &FieldInfo,
        instance: &mut (dyn Any + Send + Sync),
        value: Value,
    ) -> ContainerResult<()>;

    /// 在共享实例上调用
    fn invoke(
        &self,
        method: &MethodInfo,
        instance: &(dyn Any + Send + Sync),
        args: &[Value],
    ) -> ContainerResult<Value>;

    /// 在构造阶段的独占实例上调用
    fn invoke_mut(
        &self,
        method: &MethodInfo,
        instance: &mut (dyn Any + Send + Sync),
        args: &[Value],
    ) -> ContainerResult<Value>;

    fn new_instance(&self, constructor: &ConstructorInfo, args: Vec<Value>) -> ContainerResult<Instance>;
}

/// 基于 [`ClassInfo`] 描述表的默认反射实现
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptorReflection;

impl DescriptorReflection {
    pub fn shared() -> Arc<dyn ReflectionFacade> {
        Arc::new(Self)
    }

    fn check_arity(method: &MethodInfo, args: &[Value]) -> ContainerResult<()> {
        if method.param_types.len() == args.len() {
            return Ok(());
        }
        Err(ContainerError::ArgumentMismatch {
            method: method.qualified(),
            expected: format!("{} 个参数", method.param_types.len()),
            actual: format!("{} 个参数", args.len()),
        })
    }
}

impl ReflectionFacade for DescriptorReflection {
    fn all_fields(&self, class: &ClassInfo) -> Vec<Arc<FieldInfo>> {
        class.fields.clone()
    }

    fn all_methods(&self, class: &ClassInfo) -> Vec<Arc<MethodInfo>> {
        class.methods.clone()
    }

    fn methods_named(&self, class: &ClassInfo, name: &str) -> Vec<Arc<MethodInfo>> {
        class
            .methods
            .iter()
            .filter(|method| method.name == name)
            .cloned()
            .collect()
    }

    fn method_by_signature(
        &self,
        class: &ClassInfo,
        name: &str,
        param_types: &[String],
    ) -> Option<Arc<MethodInfo>> {
        class
            .methods
            .iter()
            .find(|method| method.has_signature(name, param_types))
            .cloned()
    }

    fn all_constructors(&self, class: &ClassInfo) -> Vec<Arc<ConstructorInfo>> {
        class.constructors.clone()
    }

    fn get_field(&self, field: &FieldInfo, instance: &(dyn Any + Send + Sync)) -> ContainerResult<Value> {
        match &field.getter {
            Some(getter) => getter(instance),
            None => Err(ContainerError::IllegalInvocation {
                method: format!("{}.{}", field.declaring_type, field.name),
                reason: "字段不可读".to_string(),
            }),
        }
    }

    fn set_field(
        &self,
        field: &FieldInfo,
        instance: &mut (dyn Any + Send + Sync),
        value: Value,
    ) -> ContainerResult<()> {
        (field.setter)(instance, value)
    }

    fn invoke(
        &self,
        method: &MethodInfo,
        instance: &(dyn Any + Send + Sync),
        args: &[Value],
    ) -> ContainerResult<Value> {
        Self::check_arity(method, args)?;
        match &method.body {
            MethodBody::Shared(body) => body(instance, args),
            MethodBody::Exclusive(_) => Err(ContainerError::IllegalInvocation {
                method: method.qualified(),
                reason: "该方法只能在构造阶段调用".to_string(),
            }),
        }
    }

    fn invoke_mut(
        &self,
        method: &MethodInfo,
        instance: &mut (dyn Any + Send + Sync),
        args: &[Value],
    ) -> ContainerResult<Value> {
        Self::check_arity(method, args)?;
        match &method.body {
            MethodBody::Shared(body) => body(&*instance, args),
            MethodBody::Exclusive(body) => body(instance, args),
        }
    }

    fn new_instance(&self, constructor: &ConstructorInfo, args: Vec<Value>) -> ContainerResult<Instance> {
        if constructor.param_types.len() != args.len() {
            return Err(ContainerError::ArgumentMismatch {
                method: format!("{}.<init>", constructor.declaring_type),
                expected: format!("{} 个参数", constructor.param_types.len()),
                actual: format!("{} 个参数", args.len()),
            });
        }
        (constructor.factory)(args)
    }
}

/// 类型目录，声明中的类型名到描述的映射
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    classes: HashMap<String, ClassRef>,
}

impl ClassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassRef) -> Option<ClassRef> {
        self.classes.insert(class.name.clone(), class)
    }

    pub fn with_class(mut self, class: ClassRef) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&ClassRef> {
        self.classes.get(type_name)
    }

    /// 为 Bean 声明查找类型描述
    pub fn lookup(&self, bean_name: &str, type_name: &str) -> ContainerResult<ClassRef> {
        self.classes
            .get(type_name)
            .cloned()
            .ok_or_else(|| ContainerError::UnknownType {
                type_name: type_name.to_string(),
                bean_name: bean_name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        step: i32,
        label: String,
    }

    fn counter_class() -> ClassRef {
        ClassInfo::builder::<Counter>("demo.Counter")
            .implements("demo.Steppable")
            .constructor(Counter::default)
            .property("step", |c: &Counter| c.step, |c: &mut Counter, v: i32| c.step = v)
            .field("label", |c: &mut Counter, v: String| c.label = v)
            .method1("advance", |c: &Counter, from: i32| Ok(from + c.step))
            .method2("advance", |c: &Counter, from: i32, times: i32| Ok(from + c.step * times))
            .method0("label", |c: &Counter| Ok(c.label.clone()))
            .post_construct("init", |c: &mut Counter| {
                c.step += 1;
                Ok(())
            })
            .build()
    }

    #[test]
    fn test_overloads_are_distinct() {
        let class = counter_class();
        let reflection = DescriptorReflection;
        assert_eq!(reflection.methods_named(&class, "advance").len(), 2);
        let two = reflection
            .method_by_signature(&class, "advance", &["i32".to_string(), "i32".to_string()])
            .unwrap();
        assert_eq!(two.signature(), "advance(i32,i32)");
        assert!(reflection
            .method_by_signature(&class, "advance", &["i64".to_string()])
            .is_none());
    }

    #[test]
    fn test_construct_set_and_invoke() {
        let class = counter_class();
        let reflection = DescriptorReflection;
        let ctor = reflection.all_constructors(&class).remove(0);
        let mut instance = reflection.new_instance(&ctor, Vec::new()).unwrap();

        let step = class.field("step").unwrap();
        reflection.set_field(step, instance.as_mut(), Value::new(3i32)).unwrap();
        let init = class.methods().iter().find(|m| m.is_post_construct()).unwrap();
        reflection.invoke_mut(init, instance.as_mut(), &[]).unwrap();

        assert_eq!(reflection.get_field(step, instance.as_ref()).unwrap().extract::<i32>(), Some(4));
        let advance = reflection.methods_named(&class, "advance").remove(0);
        let result = reflection.invoke(&advance, instance.as_ref(), &[Value::new(10i32)]).unwrap();
        assert_eq!(result.extract::<i32>(), Some(14));
    }

    #[test]
    fn test_exclusive_method_rejected_on_shared_instance() {
        let class = counter_class();
        let reflection = DescriptorReflection;
        let instance: Instance = Box::new(Counter::default());
        let init = class.methods().iter().find(|m| m.is_post_construct()).unwrap();
        let err = reflection.invoke(init, instance.as_ref(), &[]).unwrap_err();
        assert!(matches!(err, ContainerError::IllegalInvocation { .. }));
    }

    #[test]
    fn test_wrong_argument_type() {
        let class = counter_class();
        let reflection = DescriptorReflection;
        let instance: Instance = Box::new(Counter::default());
        let advance = reflection.methods_named(&class, "advance").remove(0);
        let err = reflection
            .invoke(&advance, instance.as_ref(), &[Value::new("ten".to_string())])
            .unwrap_err();
        assert!(matches!(err, ContainerError::ArgumentMismatch { .. }));
    }

    #[test]
    fn test_assignability_and_catalog() {
        let class = counter_class();
        assert!(class.is_assignable_to("demo.Counter"));
        assert!(class.is_assignable_to("demo.Steppable"));
        assert!(!class.is_assignable_to("demo.Other"));
        assert_eq!(class.package(), "demo");

        let catalog = ClassCatalog::new().with_class(class);
        assert!(catalog.lookup("counter", "demo.Counter").is_ok());
        assert!(matches!(
            catalog.lookup("counter", "demo.Missing"),
            Err(ContainerError::UnknownType { .. })
        ));
    }
}
