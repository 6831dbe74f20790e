//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 容器错误类型
///
/// 除 [`ContainerError::Invocation`] 外均为配置或编程错误，不会重试。
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Bean 未注册: {name}")]
    UnresolvedBean { name: String },

    #[error("Bean 类型不匹配: {name}, 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("自动装配候选不唯一: 类型 {type_name}, 候选 {candidates:?}")]
    AmbiguousCandidate {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("依赖无法满足: {bean_name} 需要 {requirement}")]
    UnsatisfiedDependency {
        bean_name: String,
        requirement: String,
    },

    #[error("类型 {type_name} 存在多个 autowired 构造函数")]
    MultipleAutowiredConstructors { type_name: String },

    #[error("类型 {type_name} 存在多个 post-construct 方法: {methods:?}")]
    MultiplePostConstruct {
        type_name: String,
        methods: Vec<String>,
    },

    #[error("类型 {type_name} 没有可用的构造函数")]
    NoUsableConstructor { type_name: String },

    #[error("切面 {aspect} 的切点表达式无效: '{expression}', 原因: {reason}")]
    MalformedPointcut {
        aspect: String,
        expression: String,
        reason: String,
    },

    #[error("方法不存在: {type_name}.{method}({params})")]
    MethodNotFound {
        type_name: String,
        method: String,
        params: String,
    },

    #[error("字段不存在: {type_name}.{field}")]
    FieldNotFound { type_name: String, field: String },

    #[error("setter 注入配置错误: {type_name}.{method}, 原因: {reason}")]
    InvalidSetter {
        type_name: String,
        method: String,
        reason: String,
    },

    #[error("属性值转换失败: {field}, 值 '{value}' 无法转换为 {target_type}")]
    PropertyCoercion {
        field: String,
        value: String,
        target_type: String,
    },

    #[error("参数类型不匹配: {method}, 期望 {expected}, 实际 {actual}")]
    ArgumentMismatch {
        method: String,
        expected: String,
        actual: String,
    },

    #[error("非法调用: {method}, 原因: {reason}")]
    IllegalInvocation { method: String, reason: String },

    #[error("未知的组件类型: {type_name} (Bean: {bean_name})")]
    UnknownType { type_name: String, bean_name: String },

    #[error("Bean {name} 的单例已经创建，不能再挂载代理")]
    ProxyAfterInstantiation { name: String },

    #[error("检测到循环依赖: {chain}")]
    CircularDependency { chain: String },

    #[error("{source}")]
    Invocation {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ContainerError {
    /// 由目标方法或通知代码抛出的业务错误
    pub fn raised(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Invocation {
            source: source.into(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("容器错误: {source}")]
    Container {
        #[from]
        source: ContainerError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type ContainerResult<T> = Result<T, ContainerError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
