//! 切点

use crate::join_point::JoinPoint;
use di_abstractions::AdviceKind;

/// 一个 Bean 上的全部连接点
///
/// 前置与后置连接点按 `order` 从小到大排列，相同时保持声明顺序。
/// 环绕连接点从链头开始存放：`order` 小的在前，相同时后声明的在前。
#[derive(Debug, Clone)]
pub struct Pointcut {
    bean_name: String,
    type_name: String,
    before: Vec<JoinPoint>,
    after: Vec<JoinPoint>,
    around: Vec<JoinPoint>,
}

impl Pointcut {
    pub fn new(bean_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            bean_name: bean_name.into(),
            type_name: type_name.into(),
            before: Vec::new(),
            after: Vec::new(),
            around: Vec::new(),
        }
    }

    pub fn add(&mut self, join_point: JoinPoint) {
        let order = join_point.order();
        match join_point.location() {
            AdviceKind::Before => {
                let at = self.before.partition_point(|jp| jp.order() <= order);
                self.before.insert(at, join_point);
            }
            AdviceKind::After => {
                let at = self.after.partition_point(|jp| jp.order() <= order);
                self.after.insert(at, join_point);
            }
            AdviceKind::Around => {
                let at = self.around.partition_point(|jp| jp.order() < order);
                self.around.insert(at, join_point);
            }
        }
    }

    pub fn bean_name(&self) -> &str {
        &self.bean_name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn before(&self) -> &[JoinPoint] {
        &self.before
    }

    pub fn after(&self) -> &[JoinPoint] {
        &self.after
    }

    /// 环绕链，第一个元素为链头
    pub fn around(&self) -> &[JoinPoint] {
        &self.around
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len() + self.around.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
