//! 连接点

use di_abstractions::{AdviceKind, BeanHandle, MethodInfo, LOWEST_PRECEDENCE};
use infrastructure_common::{ContainerError, ContainerResult, Value};
use once_cell::sync::OnceCell;
use std::ops::Deref;
use std::sync::Arc;
use tracing::trace;

/// 执行通知的切面实例
///
/// 织入时只记录切面名称，全部代理挂载完成后才绑定实例。
#[derive(Debug)]
pub struct Advisor {
    aspect: String,
    handle: OnceCell<BeanHandle>,
}

impl Advisor {
    pub fn new(aspect: impl Into<String>) -> Self {
        Self {
            aspect: aspect.into(),
            handle: OnceCell::new(),
        }
    }

    pub fn aspect(&self) -> &str {
        &self.aspect
    }

    /// 绑定切面实例，已绑定时返回 `false`
    pub fn bind(&self, handle: BeanHandle) -> bool {
        self.handle.set(handle).is_ok()
    }

    pub fn handle(&self) -> Option<&BeanHandle> {
        self.handle.get()
    }
}

/// 一条通知在某个 Bean（或其某个方法）上的挂载点
///
/// 织入阶段只绑定切面、通知方法与目标方法；每次调用时复制一份，
/// 再填入目标实例、实际调用的方法与参数。
#[derive(Debug, Clone)]
pub struct JoinPoint {
    advisor: Arc<Advisor>,
    advice_method: Arc<MethodInfo>,
    location: AdviceKind,
    order: i32,
    bean_name: String,
    class_scope: bool,
    method: Option<Arc<MethodInfo>>,
    target: Option<BeanHandle>,
    arguments: Vec<Value>,
    next: Option<Box<JoinPoint>>,
}

impl JoinPoint {
    pub fn new(advisor: Arc<Advisor>, advice_method: Arc<MethodInfo>, location: AdviceKind) -> Self {
        Self {
            advisor,
            advice_method,
            location,
            order: LOWEST_PRECEDENCE,
            bean_name: String::new(),
            class_scope: false,
            method: None,
            target: None,
            arguments: Vec::new(),
            next: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 绑定到整个类
    pub fn for_class(&self, bean_name: &str) -> Self {
        let mut bound = self.clone();
        bound.bean_name = bean_name.to_string();
        bound.class_scope = true;
        bound.method = None;
        bound
    }

    /// 绑定到单个方法
    pub fn for_method(&self, bean_name: &str, method: Arc<MethodInfo>) -> Self {
        let mut bound = self.clone();
        bound.bean_name = bean_name.to_string();
        bound.class_scope = false;
        bound.method = Some(method);
        bound
    }

    /// 为一次具体调用复制，填入目标、方法与参数
    pub fn with_call(&self, target: BeanHandle, method: Arc<MethodInfo>, arguments: Vec<Value>) -> Self {
        let mut call = self.clone();
        call.target = Some(target);
        call.method = Some(method);
        call.arguments = arguments;
        call.next = None;
        call
    }

    pub(crate) fn link(&mut self, next: Option<JoinPoint>) {
        self.next = next.map(Box::new);
    }

    /// 类作用域对所有方法适用；否则要求方法名与参数类型列表一致
    pub fn applies(&self, method: &MethodInfo) -> bool {
        if self.class_scope {
            return true;
        }
        self.method
            .as_ref()
            .is_some_and(|bound| bound.same_signature(method))
    }

    /// 以自身为唯一参数调用通知方法
    pub fn invoke(&self) -> ContainerResult<Value> {
        let advisor = self.advisor.handle().ok_or_else(|| ContainerError::IllegalInvocation {
            method: self.advice_method.name().to_string(),
            reason: format!("切面 {} 尚未绑定实例", self.advisor.aspect()),
        })?;
        trace!(
            "执行{}通知: {}.{} -> {}",
            self.location.as_str(),
            self.advisor.aspect(),
            self.advice_method.name(),
            self.bean_name
        );
        let argument = match self.location {
            AdviceKind::Around => Value::new(ProceedingJoinPoint(self.clone())),
            AdviceKind::Before | AdviceKind::After => Value::new(self.clone()),
        };
        advisor.invoke_method(&self.advice_method, vec![argument])
    }

    pub fn advisor(&self) -> &Advisor {
        &self.advisor
    }

    pub fn advice_method(&self) -> &Arc<MethodInfo> {
        &self.advice_method
    }

    pub fn location(&self) -> AdviceKind {
        self.location
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn is_class_scope(&self) -> bool {
        self.class_scope
    }

    /// 绑定或正在调用的方法
    pub fn method(&self) -> Option<&Arc<MethodInfo>> {
        self.method.as_ref()
    }

    pub fn method_name(&self) -> Option<&str> {
        self.method.as_ref().map(|method| method.name())
    }

    pub fn target(&self) -> Option<&BeanHandle> {
        self.target.as_ref()
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn next(&self) -> Option<&JoinPoint> {
        self.next.as_deref()
    }
}

/// 环绕通知收到的连接点，可以决定是否继续调用
#[derive(Debug, Clone)]
pub struct ProceedingJoinPoint(JoinPoint);

impl ProceedingJoinPoint {
    /// 以原参数继续
    pub fn proceed(&self) -> ContainerResult<Value> {
        self.proceed_with(self.0.arguments.clone())
    }

    /// 以替换后的参数继续：有下一个环绕通知则交给它，否则调用目标方法
    pub fn proceed_with(&self, arguments: Vec<Value>) -> ContainerResult<Value> {
        if let Some(next) = &self.0.next {
            let mut next = next.as_ref().clone();
            next.arguments = arguments;
            return next.invoke();
        }

        let (Some(target), Some(method)) = (&self.0.target, &self.0.method) else {
            return Err(ContainerError::IllegalInvocation {
                method: self.0.advice_method.name().to_string(),
                reason: "连接点没有绑定调用目标".to_string(),
            });
        };
        target.invoke_method(method, arguments)
    }

    pub fn join_point(&self) -> &JoinPoint {
        &self.0
    }
}

impl Deref for ProceedingJoinPoint {
    type Target = JoinPoint;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
