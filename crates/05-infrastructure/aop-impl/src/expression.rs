//! Bean 引用表达式
//!
//! 语法为 `beanName[.method(args|*)]`：
//!
//! - `calc` 类作用域，拦截所有方法
//! - `calc.add(i32,i32)` 指定重载
//! - `calc.add(*)` 同名的所有重载
//! - `calc.reset()` 无参方法

use infrastructure_common::{canonical_type_name, ContainerError, ContainerResult};

/// 引用的方法范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodTarget {
    /// 整个类
    Class,
    /// 参数类型完全匹配的单个方法
    Method { name: String, params: Vec<String> },
    /// 同名的所有重载
    AllOverloads { name: String },
}

/// 解析后的 Bean 引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanReference {
    pub bean: String,
    pub target: MethodTarget,
}

/// 解析 Bean 引用，`aspect` 用于错误信息
pub fn parse_bean_reference(aspect: &str, expression: &str) -> ContainerResult<BeanReference> {
    let malformed = |reason: &str| ContainerError::MalformedPointcut {
        aspect: aspect.to_string(),
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    let text = expression.trim();
    if text.is_empty() {
        return Err(malformed("表达式为空"));
    }

    let Some(open) = text.find('(') else {
        if text.contains(')') {
            return Err(malformed("多余的右括号"));
        }
        return Ok(BeanReference {
            bean: text.to_string(),
            target: MethodTarget::Class,
        });
    };

    if !text.ends_with(')') {
        return Err(malformed("缺少右括号"));
    }
    let inner = &text[open + 1..text.len() - 1];
    if inner.contains('(') || inner.contains(')') {
        return Err(malformed("括号不匹配"));
    }

    let head = &text[..open];
    let Some((bean, method)) = head.rsplit_once('.') else {
        return Err(malformed("方法引用缺少 Bean 名称"));
    };
    let (bean, method) = (bean.trim(), method.trim());
    if bean.is_empty() {
        return Err(malformed("Bean 名称为空"));
    }
    if method.is_empty() {
        return Err(malformed("方法名为空"));
    }
    if !is_identifier(method) {
        return Err(malformed("方法名无效"));
    }

    let inner = inner.trim();
    let target = if inner == "*" {
        MethodTarget::AllOverloads {
            name: method.to_string(),
        }
    } else if inner.is_empty() {
        MethodTarget::Method {
            name: method.to_string(),
            params: Vec::new(),
        }
    } else {
        let mut params = Vec::new();
        for segment in inner.split(',') {
            let segment = segment.trim();
            if segment.is_empty() || segment.contains('*') || segment.contains(char::is_whitespace) {
                return Err(malformed("参数列表无法解析"));
            }
            params.push(canonical_type_name(segment).to_string());
        }
        MethodTarget::Method {
            name: method.to_string(),
            params,
        }
    };

    Ok(BeanReference {
        bean: bean.to_string(),
        target,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_of(result: ContainerResult<BeanReference>) -> String {
        match result {
            Err(ContainerError::MalformedPointcut { reason, .. }) => reason,
            other => panic!("expected malformed pointcut, got {other:?}"),
        }
    }

    #[test]
    fn test_class_scope() {
        let parsed = parse_bean_reference("audit", " calc ").unwrap();
        assert_eq!(parsed.bean, "calc");
        assert_eq!(parsed.target, MethodTarget::Class);
    }

    #[test]
    fn test_explicit_overload_with_aliases() {
        let parsed = parse_bean_reference("audit", "calc.add(int, long,String)").unwrap();
        assert_eq!(parsed.bean, "calc");
        assert_eq!(
            parsed.target,
            MethodTarget::Method {
                name: "add".to_string(),
                params: vec![
                    "i32".to_string(),
                    "i64".to_string(),
                    "alloc::string::String".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_short_and_lowercase_string_aliases() {
        let parsed = parse_bean_reference("audit", "calc.scale(short,string)").unwrap();
        assert_eq!(
            parsed.target,
            MethodTarget::Method {
                name: "scale".to_string(),
                params: vec!["i16".to_string(), "alloc::string::String".to_string()],
            }
        );
    }

    #[test]
    fn test_all_overloads_and_no_arg() {
        assert_eq!(
            parse_bean_reference("a", "calc.add(*)").unwrap().target,
            MethodTarget::AllOverloads { name: "add".to_string() }
        );
        assert_eq!(
            parse_bean_reference("a", "calc.reset()").unwrap().target,
            MethodTarget::Method { name: "reset".to_string(), params: Vec::new() }
        );
    }

    #[test]
    fn test_dotted_bean_names_split_at_last_dot() {
        let parsed = parse_bean_reference("a", "billing.calc.add(i32)").unwrap();
        assert_eq!(parsed.bean, "billing.calc");
    }

    #[test]
    fn test_unbalanced_parenthesis_names_aspect_and_literal() {
        let err = parse_bean_reference("tracer", "bean.method(").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("tracer"));
        assert!(message.contains("bean.method("));
        match err {
            ContainerError::MalformedPointcut { aspect, expression, .. } => {
                assert_eq!(aspect, "tracer");
                assert_eq!(expression, "bean.method(");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_variants() {
        assert_eq!(reason_of(parse_bean_reference("a", "")), "表达式为空");
        assert_eq!(reason_of(parse_bean_reference("a", "calc)")), "多余的右括号");
        assert_eq!(reason_of(parse_bean_reference("a", "calc.(i32)")), "方法名为空");
        assert_eq!(reason_of(parse_bean_reference("a", ".add(i32)")), "Bean 名称为空");
        assert_eq!(reason_of(parse_bean_reference("a", "add(i32)")), "方法引用缺少 Bean 名称");
        assert_eq!(reason_of(parse_bean_reference("a", "calc.add((i32))")), "括号不匹配");
        assert_eq!(reason_of(parse_bean_reference("a", "calc.add(i32,)")), "参数列表无法解析");
        assert_eq!(reason_of(parse_bean_reference("a", "calc.add(i32 i32)")), "参数列表无法解析");
        assert_eq!(reason_of(parse_bean_reference("a", "calc.a-b()")), "方法名无效");
    }
}
