//! 应用上下文

use crate::builder::ApplicationContextBuilder;
use crate::settings::ContainerSettings;
use chrono::{DateTime, Utc};
use di_abstractions::{BeanFactory, BeanHandle, ClassCatalog};
use di_impl::{BeanDefinition, BeanRegistry};
use infrastructure_common::{ContainerError, ContainerResult, LifecycleState};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 启动统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStats {
    /// 已注册的 Bean 数量
    pub bean_count: usize,
    /// 挂载了代理的 Bean 数量
    pub proxied_count: usize,
    /// 通知声明数量
    pub advice_count: usize,
    /// 启动时预先实例化的单例数量
    pub eager_instantiated: usize,
}

/// 应用上下文
///
/// 注册、装配与织入全部完成后才会交给调用方。关闭后的上下文拒绝解析 Bean，
/// 名称与候选查询仍然可用。
#[derive(Debug)]
pub struct ApplicationContext {
    id: Uuid,
    started_at: DateTime<Utc>,
    state: LifecycleState,
    registry: BeanRegistry,
    catalog: ClassCatalog,
    settings: ContainerSettings,
    stats: ContextStats,
}

impl ApplicationContext {
    /// 创建应用上下文构建器
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    pub(crate) fn new(
        id: Uuid,
        started_at: DateTime<Utc>,
        registry: BeanRegistry,
        catalog: ClassCatalog,
        settings: ContainerSettings,
        stats: ContextStats,
    ) -> Self {
        Self {
            id,
            started_at,
            state: LifecycleState::Ready,
            registry,
            catalog,
            settings,
            stats,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn stats(&self) -> &ContextStats {
        &self.stats
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &BeanRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    pub fn definition(&self, name: &str) -> Option<Arc<BeanDefinition>> {
        self.registry.definition(name)
    }

    /// 关闭上下文
    pub fn close(&mut self) {
        if self.state.is_ready() {
            self.state = LifecycleState::Closed;
            info!("应用上下文已关闭: {} (运行 {} 秒)", self.id, (Utc::now() - self.started_at).num_seconds());
        }
    }

    fn ensure_ready(&self, operation: &str) -> ContainerResult<()> {
        if self.state.is_ready() {
            return Ok(());
        }
        Err(ContainerError::IllegalInvocation {
            method: operation.to_string(),
            reason: format!("应用上下文 {} 已关闭", self.id),
        })
    }
}

impl BeanFactory for ApplicationContext {
    fn resolve(&self, name: &str) -> ContainerResult<BeanHandle> {
        self.ensure_ready("resolve")?;
        self.registry.resolve(name)
    }

    fn resolve_typed(&self, name: &str, type_name: &str) -> ContainerResult<BeanHandle> {
        self.ensure_ready("resolve_typed")?;
        self.registry.resolve_typed(name, type_name)
    }

    fn find_candidate_name(&self, type_name: &str) -> ContainerResult<Option<String>> {
        self.registry.find_candidate_name(type_name)
    }

    fn find_candidate(&self, type_name: &str) -> ContainerResult<Option<BeanHandle>> {
        self.ensure_ready("find_candidate")?;
        self.registry.find_candidate(type_name)
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.registry.contains_bean(name)
    }

    fn bean_names(&self) -> Vec<String> {
        self.registry.bean_names()
    }
}
