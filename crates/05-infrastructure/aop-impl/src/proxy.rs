//! 代理工厂与拦截代理

use crate::join_point::JoinPoint;
use crate::pointcut::Pointcut;
use di_abstractions::{BeanHandle, ClassInfo, ClassRef, Invokable, MethodInfo, ProxyTemplate};
use infrastructure_common::{ContainerResult, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// 代理方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyKind {
    /// 目标类型声明了接口
    Interface { interfaces: Vec<String> },
    /// 以目标类型为父类型
    Subclass { supertype: String },
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interface { interfaces } => write!(f, "接口代理[{}]", interfaces.join(", ")),
            Self::Subclass { supertype } => write!(f, "子类代理[{}]", supertype),
        }
    }
}

/// 代理工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxyFactory;

impl ProxyFactory {
    pub fn new() -> Self {
        Self
    }

    /// 目标声明了接口时使用接口代理，否则使用子类代理
    pub fn proxy_kind(&self, class: &ClassInfo) -> ProxyKind {
        if class.interfaces().is_empty() {
            ProxyKind::Subclass {
                supertype: class.name().to_string(),
            }
        } else {
            ProxyKind::Interface {
                interfaces: class.interfaces().to_vec(),
            }
        }
    }

    /// 消费切点，生成可挂到 Bean 定义上的代理模板
    pub fn create_template(&self, pointcut: Pointcut, class: &ClassInfo) -> Arc<AopProxyTemplate> {
        let kind = self.proxy_kind(class);
        debug!(
            "创建代理模板: {} ({}, {} 个连接点)",
            pointcut.bean_name(),
            kind,
            pointcut.len()
        );
        Arc::new(AopProxyTemplate {
            kind,
            pointcut: Arc::new(pointcut),
        })
    }
}

/// 代理模板，原型 Bean 每个新实例共享同一个模板
#[derive(Debug)]
pub struct AopProxyTemplate {
    kind: ProxyKind,
    pointcut: Arc<Pointcut>,
}

impl AopProxyTemplate {
    pub fn kind(&self) -> &ProxyKind {
        &self.kind
    }

    pub fn pointcut(&self) -> &Pointcut {
        &self.pointcut
    }
}

impl ProxyTemplate for AopProxyTemplate {
    fn wrap(&self, target: BeanHandle) -> BeanHandle {
        Arc::new(AopProxy {
            kind: self.kind.clone(),
            pointcut: Arc::clone(&self.pointcut),
            target,
        })
    }

    fn describe(&self) -> String {
        format!("{} on {}", self.kind, self.pointcut.type_name())
    }
}

/// 拦截代理
pub struct AopProxy {
    kind: ProxyKind,
    pointcut: Arc<Pointcut>,
    target: BeanHandle,
}

impl AopProxy {
    pub fn kind(&self) -> &ProxyKind {
        &self.kind
    }

    /// 被包装的句柄
    pub fn inner(&self) -> &BeanHandle {
        &self.target
    }

    fn around_chain(&self, method: &Arc<MethodInfo>, args: &[Value]) -> Option<JoinPoint> {
        let applicable: Vec<&JoinPoint> = self
            .pointcut
            .around()
            .iter()
            .filter(|jp| jp.applies(method))
            .collect();

        let mut chain: Option<JoinPoint> = None;
        for join_point in applicable.into_iter().rev() {
            let mut node = join_point.with_call(Arc::clone(&self.target), Arc::clone(method), args.to_vec());
            node.link(chain.take());
            chain = Some(node);
        }
        chain
    }
}

impl fmt::Debug for AopProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AopProxy")
            .field("bean_name", &self.pointcut.bean_name())
            .field("kind", &self.kind)
            .field("join_points", &self.pointcut.len())
            .finish()
    }
}

impl Invokable for AopProxy {
    fn bean_name(&self) -> &str {
        self.target.bean_name()
    }

    fn class(&self) -> &ClassRef {
        self.target.class()
    }

    fn target(&self) -> &Value {
        self.target.target()
    }

    fn is_proxy(&self) -> bool {
        true
    }

    fn invoke_method(&self, method: &Arc<MethodInfo>, args: Vec<Value>) -> ContainerResult<Value> {
        trace!("拦截调用: {}.{}", self.pointcut.bean_name(), method.signature());

        for join_point in self.pointcut.before().iter().filter(|jp| jp.applies(method)) {
            join_point
                .with_call(Arc::clone(&self.target), Arc::clone(method), args.clone())
                .invoke()?;
        }

        let result = match self.around_chain(method, &args) {
            Some(head) => head.invoke()?,
            None => self.target.invoke_method(method, args.clone())?,
        };

        for join_point in self.pointcut.after().iter().filter(|jp| jp.applies(method)) {
            join_point
                .with_call(Arc::clone(&self.target), Arc::clone(method), args.clone())
                .invoke()?;
        }

        Ok(result)
    }
}
