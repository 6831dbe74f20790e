//! Bean 作用域与应用上下文生命周期

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bean 作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanScope {
    /// 单例 - 注册表生命周期内只创建一个实例
    #[default]
    Singleton,
    /// 原型 - 每次解析都创建新实例
    Prototype,
}

impl BeanScope {
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl fmt::Display for BeanScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => f.write_str("singleton"),
            Self::Prototype => f.write_str("prototype"),
        }
    }
}

impl FromStr for BeanScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "prototype" => Ok(Self::Prototype),
            other => Err(format!("未知的作用域: {}", other)),
        }
    }
}

/// 应用上下文生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// 可对外提供 Bean
    Ready,
    /// 已关闭，不再解析 Bean
    Closed,
}

impl LifecycleState {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => f.write_str("ready"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parse() {
        assert_eq!("Prototype".parse::<BeanScope>(), Ok(BeanScope::Prototype));
        assert_eq!(" singleton ".parse::<BeanScope>(), Ok(BeanScope::Singleton));
        assert!("request".parse::<BeanScope>().is_err());
        assert_eq!(BeanScope::default(), BeanScope::Singleton);
    }

    #[test]
    fn test_lifecycle_state() {
        assert!(LifecycleState::Ready.is_ready());
        assert!(!LifecycleState::Closed.is_ready());
        assert_eq!(LifecycleState::Closed.to_string(), "closed");
    }
}
