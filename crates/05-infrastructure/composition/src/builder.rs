//! 应用上下文构建器

use crate::context::{ApplicationContext, ContextStats};
use crate::settings::{ContainerSettings, LoggingSettings};
use aop_impl::AspectWeaver;
use chrono::Utc;
use di_abstractions::{
    AdviceDeclaration, BeanDeclaration, BeanFactory, ClassCatalog, ClassRef, DeclarationSource,
    DescriptorReflection, ReflectionFacade, StaticDeclarationSource,
};
use di_impl::{AutowiringPostProcessor, BeanDefinition, BeanDefinitionPostProcessor, BeanRegistry};
use infrastructure_common::{InfrastructureError, InfrastructureResult};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// 应用上下文构建器
///
/// 使用建造者模式收集类型描述、声明来源和配置，`build` 时完成注册、装配与织入
pub struct ApplicationContextBuilder {
    /// 类型目录
    catalog: ClassCatalog,
    /// 声明来源列表
    sources: Vec<Box<dyn DeclarationSource>>,
    /// 直接添加的声明
    inline: StaticDeclarationSource,
    /// 额外的定义后处理器
    post_processors: Vec<Box<dyn BeanDefinitionPostProcessor>>,
    /// 反射实现
    reflection: Arc<dyn ReflectionFacade>,
    /// 容器配置
    settings: ContainerSettings,
    /// 显式指定的日志配置，优先于容器配置中的 `[logging]`
    logging: Option<LoggingSettings>,
}

impl ApplicationContextBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            catalog: ClassCatalog::new(),
            sources: Vec::new(),
            inline: StaticDeclarationSource::new("inline"),
            post_processors: Vec::new(),
            reflection: DescriptorReflection::shared(),
            settings: ContainerSettings::default(),
            logging: None,
        }
    }

    /// 注册类型描述
    pub fn register_class(mut self, class: ClassRef) -> Self {
        debug!("注册类型描述: {}", class.name());
        self.catalog.register(class);
        self
    }

    /// 添加声明来源
    pub fn add_source<S: DeclarationSource + 'static>(mut self, source: S) -> Self {
        info!("添加声明来源: {}", source.name());
        self.sources.push(Box::new(source));
        self
    }

    /// 添加 Bean 声明
    pub fn add_bean(mut self, declaration: BeanDeclaration) -> Self {
        self.inline.add_bean(declaration);
        self
    }

    /// 添加通知声明
    pub fn add_advice(mut self, declaration: AdviceDeclaration) -> Self {
        self.inline.add_advice(declaration);
        self
    }

    /// 添加自定义定义后处理器
    pub fn add_post_processor<P: BeanDefinitionPostProcessor + 'static>(mut self, processor: P) -> Self {
        info!("添加定义后处理器: {} (order = {})", processor.name(), processor.order());
        self.post_processors.push(Box::new(processor));
        self
    }

    /// 替换反射实现
    pub fn with_reflection(mut self, reflection: Arc<dyn ReflectionFacade>) -> Self {
        self.reflection = reflection;
        self
    }

    /// 设置容器配置
    pub fn with_settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 从 TOML 配置文件与环境变量加载容器配置
    pub fn with_settings_file<P: AsRef<Path>>(self, path: P) -> InfrastructureResult<Self> {
        let path = path.as_ref();
        info!("加载容器配置: {}", path.display());
        let settings = ContainerSettings::load(Some(path))?;
        Ok(self.with_settings(settings))
    }

    /// 配置日志，`enabled` 为假时不安装 subscriber
    pub fn with_logging(mut self, logging: LoggingSettings) -> Self {
        self.logging = Some(logging);
        self
    }

    /// 本次构建使用的日志配置
    pub fn logging(&self) -> &LoggingSettings {
        self.logging.as_ref().unwrap_or(&self.settings.logging)
    }

    /// 构建应用上下文
    pub fn build(mut self) -> InfrastructureResult<ApplicationContext> {
        let logging = self.logging();
        if logging.enabled {
            initialize_logging(logging)?;
        }

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("开始构建应用上下文: {}", id);

        match self.refresh() {
            Ok((registry, stats)) => {
                info!(
                    "应用上下文构建完成: {} ({} 个 Bean, {} 个代理)",
                    id, stats.bean_count, stats.proxied_count
                );
                Ok(ApplicationContext::new(
                    id,
                    started_at,
                    registry,
                    self.catalog,
                    self.settings,
                    stats,
                ))
            }
            Err(e) => {
                error!("应用上下文构建失败: {}: {}", id, e);
                Err(e)
            }
        }
    }

    fn refresh(&mut self) -> InfrastructureResult<(BeanRegistry, ContextStats)> {
        let mut beans = Vec::new();
        let mut advice = Vec::new();
        let sources = self
            .sources
            .iter()
            .map(|source| source.as_ref())
            .chain([&self.inline as &dyn DeclarationSource]);
        for source in sources {
            let declared = source.bean_declarations()?;
            let advised = source.advice_declarations()?;
            debug!(
                "读取声明来源: {} ({} 个 Bean, {} 个通知)",
                source.name(),
                declared.len(),
                advised.len()
            );
            beans.extend(declared);
            advice.extend(advised);
        }

        let registry = BeanRegistry::with_reflection(Arc::clone(&self.reflection))
            .with_options(self.settings.resolve_options());
        for declaration in &beans {
            if !self.settings.allow_definition_overriding && registry.contains_bean(&declaration.name) {
                return Err(InfrastructureError::BootstrapFailed {
                    message: format!("Bean 名称重复且不允许覆盖: {}", declaration.name),
                });
            }
            registry.register(BeanDefinition::from_declaration(declaration, &self.catalog)?);
        }

        let advice_count = advice.len();
        let mut processors: Vec<Box<dyn BeanDefinitionPostProcessor>> = vec![
            Box::new(AutowiringPostProcessor::new()),
            Box::new(AspectWeaver::new(advice)),
        ];
        processors.append(&mut self.post_processors);
        processors.sort_by_key(|processor| processor.order());
        for processor in &processors {
            debug!("运行定义后处理器: {}", processor.name());
            processor.post_process(&registry)?;
        }

        let mut eager_instantiated = 0;
        if self.settings.eager_singletons {
            for definition in registry.definitions() {
                if definition.scope().is_singleton() && !definition.is_lazy() {
                    registry.resolve(definition.name())?;
                    eager_instantiated += 1;
                }
            }
            info!("预先实例化单例: {} 个", eager_instantiated);
        }

        let definitions = registry.definitions();
        let stats = ContextStats {
            bean_count: definitions.len(),
            proxied_count: definitions.iter().filter(|d| d.is_proxied()).count(),
            advice_count,
            eager_instantiated,
        };
        Ok((registry, stats))
    }
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 按日志配置安装全局 subscriber
fn initialize_logging(logging: &LoggingSettings) -> InfrastructureResult<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(logging.filter()?)
        .with_target(logging.show_target)
        .with_thread_ids(logging.show_thread_ids)
        .with_file(logging.show_file)
        .with_line_number(logging.show_line_number);
    let installed = if logging.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| InfrastructureError::BootstrapFailed {
        message: format!("日志初始化失败: {}", e),
    })?;

    info!("日志系统初始化完成: level = {}, json = {}", logging.level, logging.json);
    Ok(())
}
