//! Bean 与切面声明

use infrastructure_common::{BeanScope, PropertyValue};
use std::collections::BTreeMap;

/// 最低优先级，未指定顺序的通知使用此值
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Bean 声明
#[derive(Debug, Clone)]
pub struct BeanDeclaration {
    pub name: String,
    /// 类型全限定名，在类型目录中查找描述
    pub type_name: String,
    pub scope: BeanScope,
    pub lazy: bool,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl BeanDeclaration {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            scope: BeanScope::Singleton,
            lazy: false,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_scope(mut self, scope: BeanScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn prototype(self) -> Self {
        self.with_scope(BeanScope::Prototype)
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdviceKind {
    Before,
    After,
    Around,
}

impl AdviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Around => "around",
        }
    }
}

/// 通知目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdviceTargets {
    /// `beanName[.method(args|*)]` 形式的引用
    Beans(Vec<String>),
    /// 类型名前缀
    Within(Vec<String>),
}

/// 通知声明
#[derive(Debug, Clone)]
pub struct AdviceDeclaration {
    /// 切面 Bean 名称
    pub aspect: String,
    pub advice_method: String,
    pub kind: AdviceKind,
    pub order: i32,
    pub targets: AdviceTargets,
}

impl AdviceDeclaration {
    pub fn new(aspect: impl Into<String>, advice_method: impl Into<String>, kind: AdviceKind) -> Self {
        Self {
            aspect: aspect.into(),
            advice_method: advice_method.into(),
            kind,
            order: LOWEST_PRECEDENCE,
            targets: AdviceTargets::Beans(Vec::new()),
        }
    }

    pub fn before(aspect: impl Into<String>, advice_method: impl Into<String>) -> Self {
        Self::new(aspect, advice_method, AdviceKind::Before)
    }

    pub fn after(aspect: impl Into<String>, advice_method: impl Into<String>) -> Self {
        Self::new(aspect, advice_method, AdviceKind::After)
    }

    pub fn around(aspect: impl Into<String>, advice_method: impl Into<String>) -> Self {
        Self::new(aspect, advice_method, AdviceKind::Around)
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// 追加 Bean 引用目标；之前若是 `within` 目标则被替换
    pub fn on(mut self, reference: impl Into<String>) -> Self {
        match &mut self.targets {
            AdviceTargets::Beans(references) => references.push(reference.into()),
            AdviceTargets::Within(_) => self.targets = AdviceTargets::Beans(vec![reference.into()]),
        }
        self
    }

    /// 追加类型名前缀目标；之前若是 Bean 引用目标则被替换
    pub fn within(mut self, prefix: impl Into<String>) -> Self {
        match &mut self.targets {
            AdviceTargets::Within(prefixes) => prefixes.push(prefix.into()),
            AdviceTargets::Beans(_) => self.targets = AdviceTargets::Within(vec![prefix.into()]),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advice_builder() {
        let decl = AdviceDeclaration::around("tracer", "wrap")
            .on("calc.add(*)")
            .on("calc")
            .with_order(5);
        assert_eq!(decl.kind, AdviceKind::Around);
        assert_eq!(decl.order, 5);
        assert_eq!(
            decl.targets,
            AdviceTargets::Beans(vec!["calc.add(*)".to_string(), "calc".to_string()])
        );

        let decl = AdviceDeclaration::before("audit", "log").within("demo.service");
        assert_eq!(decl.order, LOWEST_PRECEDENCE);
        assert_eq!(decl.targets, AdviceTargets::Within(vec!["demo.service".to_string()]));
    }

    #[test]
    fn test_bean_declaration_defaults() {
        let decl = BeanDeclaration::new("calc", "demo.Calculator").with_property("base", "3");
        assert_eq!(decl.scope, BeanScope::Singleton);
        assert!(!decl.lazy);
        assert!(decl.properties.contains_key("base"));
        assert_eq!(decl.prototype().scope, BeanScope::Prototype);
    }
}
