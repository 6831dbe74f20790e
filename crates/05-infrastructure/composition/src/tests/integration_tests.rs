//! 应用上下文构建集成测试

use super::super::builder::ApplicationContextBuilder;
use super::super::settings::{ContainerSettings, LoggingSettings};
use aop_impl::JoinPoint;
use di_abstractions::{
    AdviceDeclaration, BeanDeclaration, BeanFactory, BeanHandle, ClassInfo, ClassRef,
    StaticDeclarationSource,
};
use di_impl::{BeanDefinitionPostProcessor, BeanRegistry};
use infrastructure_common::{
    args, ContainerError, ContainerResult, InfrastructureError, LifecycleState,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tempfile::NamedTempFile;

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init()
            .ok(); // 忽略初始化失败的错误
    });
}

#[derive(Debug, Default)]
struct Greeter {
    greeting: String,
}

fn greeter_class() -> ClassRef {
    ClassInfo::builder::<Greeter>("demo.app.Greeter")
        .constructor(Greeter::default)
        .field("greeting", |g: &mut Greeter, v: String| g.greeting = v)
        .method1("greet", |g: &Greeter, name: String| Ok(format!("{}, {}", g.greeting, name)))
        .build()
}

#[derive(Debug, Default)]
struct Frontdesk {
    greeter: Option<BeanHandle>,
}

fn frontdesk_class() -> ClassRef {
    ClassInfo::builder::<Frontdesk>("demo.app.Frontdesk")
        .constructor(Frontdesk::default)
        .autowired_field("greeter", "demo.app.Greeter", |f: &mut Frontdesk, h| f.greeter = Some(h))
        .method1("welcome", |f: &Frontdesk, name: String| match &f.greeter {
            Some(greeter) => greeter.call::<String>("greet", args![name]),
            None => Err(ContainerError::raised("greeter 未注入")),
        })
        .build()
}

#[derive(Debug, Default)]
struct Hits {
    count: AtomicUsize,
}

fn hits_class() -> ClassRef {
    ClassInfo::builder::<Hits>("demo.aspect.Hits")
        .constructor(Hits::default)
        .method1("count", |h: &Hits, _: JoinPoint| {
            h.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build()
}

fn base_builder() -> ApplicationContextBuilder {
    ApplicationContextBuilder::new()
        .register_class(greeter_class())
        .register_class(frontdesk_class())
        .register_class(hits_class())
}

#[test]
fn test_context_wires_and_weaves() {
    init_test_logger();

    let context = base_builder()
        .add_bean(BeanDeclaration::new("greeter", "demo.app.Greeter").with_property("greeting", "Hello"))
        .add_bean(BeanDeclaration::new("frontdesk", "demo.app.Frontdesk"))
        .add_bean(BeanDeclaration::new("hits", "demo.aspect.Hits"))
        .add_advice(AdviceDeclaration::before("hits", "count").on("greeter.greet(String)"))
        .build()
        .unwrap();

    assert_eq!(context.state(), LifecycleState::Ready);
    assert!(!context.id().is_nil());
    assert_eq!(context.stats().bean_count, 3);
    assert_eq!(context.stats().proxied_count, 1);
    assert_eq!(context.stats().advice_count, 1);

    let frontdesk = context.resolve("frontdesk").unwrap();
    assert_eq!(frontdesk.call::<String>("welcome", args!["Ada".to_string()]).unwrap(), "Hello, Ada");

    let hits = context.resolve_as::<Hits>("hits").unwrap();
    assert_eq!(hits.count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_declarations_from_sources() {
    let source = StaticDeclarationSource::new("static")
        .with_bean(BeanDeclaration::new("greeter", "demo.app.Greeter").with_property("greeting", "Hi"))
        .with_bean(BeanDeclaration::new("hits", "demo.aspect.Hits"))
        .with_advice(AdviceDeclaration::before("hits", "count").within("demo.app"));

    let context = base_builder().add_source(source).build().unwrap();
    assert_eq!(context.bean_names(), vec!["greeter".to_string(), "hits".to_string()]);
    assert!(context.definition("greeter").unwrap().is_proxied());
    assert!(!context.definition("hits").unwrap().is_proxied());
}

#[test]
fn test_eager_singletons() {
    static CREATED: AtomicUsize = AtomicUsize::new(0);
    let counted = ClassInfo::builder::<Greeter>("demo.app.Counted")
        .constructor(|| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Greeter::default()
        })
        .build();

    let settings = ContainerSettings {
        eager_singletons: true,
        ..ContainerSettings::default()
    };
    let context = ApplicationContextBuilder::new()
        .register_class(counted)
        .register_class(greeter_class())
        .add_bean(BeanDeclaration::new("counted", "demo.app.Counted"))
        .add_bean(BeanDeclaration::new("later", "demo.app.Greeter").with_lazy(true))
        .add_bean(BeanDeclaration::new("each", "demo.app.Greeter").prototype())
        .with_settings(settings)
        .build()
        .unwrap();

    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    assert_eq!(context.stats().eager_instantiated, 1);
    assert!(context.definition("counted").unwrap().is_instantiated());
    assert!(!context.definition("later").unwrap().is_instantiated());
}

#[test]
fn test_definition_overriding_guard() {
    let duplicated = || {
        base_builder()
            .add_bean(BeanDeclaration::new("greeter", "demo.app.Greeter").with_property("greeting", "A"))
            .add_bean(BeanDeclaration::new("greeter", "demo.app.Greeter").with_property("greeting", "B"))
    };

    let context = duplicated().build().unwrap();
    let greeter = context.resolve_as::<Greeter>("greeter").unwrap();
    assert_eq!(greeter.greeting, "B");

    let strict = ContainerSettings {
        allow_definition_overriding: false,
        ..ContainerSettings::default()
    };
    let err = duplicated().with_settings(strict).build().unwrap_err();
    assert!(matches!(err, InfrastructureError::BootstrapFailed { .. }));
}

#[test]
fn test_bootstrap_errors_are_wrapped() {
    let err = base_builder()
        .add_bean(BeanDeclaration::new("ghost", "demo.Missing"))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        InfrastructureError::Container {
            source: ContainerError::UnknownType { .. }
        }
    ));

    let err = base_builder()
        .add_bean(BeanDeclaration::new("greeter", "demo.app.Greeter"))
        .add_bean(BeanDeclaration::new("hits", "demo.aspect.Hits"))
        .add_advice(AdviceDeclaration::before("hits", "count").on("greeter.greet("))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        InfrastructureError::Container {
            source: ContainerError::MalformedPointcut { .. }
        }
    ));
}

struct Probe {
    seen: Arc<Mutex<Vec<String>>>,
}

impl BeanDefinitionPostProcessor for Probe {
    fn name(&self) -> &str {
        "probe"
    }

    fn order(&self) -> i32 {
        50
    }

    fn post_process(&self, registry: &BeanRegistry) -> ContainerResult<()> {
        let mut seen = self.seen.lock().unwrap();
        for definition in registry.definitions() {
            seen.push(format!(
                "{}:{}:{}",
                definition.name(),
                definition.field_injections().len(),
                definition.is_proxied()
            ));
        }
        Ok(())
    }
}

#[test]
fn test_post_processors_run_by_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let context = base_builder()
        .add_bean(BeanDeclaration::new("greeter", "demo.app.Greeter"))
        .add_bean(BeanDeclaration::new("frontdesk", "demo.app.Frontdesk"))
        .add_bean(BeanDeclaration::new("hits", "demo.aspect.Hits"))
        .add_advice(AdviceDeclaration::before("hits", "count").on("frontdesk"))
        .add_post_processor(Probe { seen: seen.clone() })
        .build()
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["greeter:0:false", "frontdesk:1:false", "hits:0:false"]
    );
    assert!(context.definition("frontdesk").unwrap().is_proxied());
}

#[test]
fn test_settings_file_configures_context() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "max_resolution_depth = 1").unwrap();

    let context = base_builder()
        .with_settings_file(file.path())
        .unwrap()
        .add_bean(BeanDeclaration::new("greeter", "demo.app.Greeter"))
        .add_bean(BeanDeclaration::new("frontdesk", "demo.app.Frontdesk"))
        .build()
        .unwrap();

    assert_eq!(context.settings().max_resolution_depth, 1);
    assert!(context.resolve("greeter").is_ok());
    assert!(matches!(
        context.resolve("frontdesk"),
        Err(ContainerError::CircularDependency { .. })
    ));
}

#[test]
fn test_missing_settings_file() {
    let result = ApplicationContextBuilder::new().with_settings_file("/nonexistent/beans.toml");
    assert!(matches!(result, Err(InfrastructureError::Config { .. })));
}

#[test]
fn test_logging_presets() {
    let development = LoggingSettings::development();
    assert!(development.enabled);
    assert_eq!(development.level().unwrap(), tracing::Level::DEBUG);
    assert!(development.show_line_number);

    let production = LoggingSettings::production();
    assert!(production.json);
    assert!(!production.show_target);
    assert_eq!(production.level().unwrap(), tracing::Level::INFO);
}

#[test]
fn test_explicit_logging_overrides_settings() {
    let settings = ContainerSettings {
        logging: LoggingSettings::production(),
        ..ContainerSettings::default()
    };
    let builder = base_builder().with_settings(settings);
    assert!(builder.logging().json);

    let disabled = LoggingSettings {
        level: "warn".to_string(),
        ..LoggingSettings::default()
    };
    let builder = builder.with_logging(disabled);
    assert!(!builder.logging().enabled);
    assert_eq!(builder.logging().level, "warn");

    let context = builder.build().unwrap();
    assert!(context.settings().logging.json);
}

#[test]
fn test_closed_context_refuses_resolution() {
    let mut context = base_builder()
        .add_bean(BeanDeclaration::new("greeter", "demo.app.Greeter"))
        .build()
        .unwrap();
    assert!(context.resolve("greeter").is_ok());

    context.close();
    assert_eq!(context.state(), LifecycleState::Closed);
    assert!(matches!(
        context.resolve("greeter"),
        Err(ContainerError::IllegalInvocation { .. })
    ));
    assert!(context.resolve_typed("greeter", "demo.app.Greeter").is_err());
    assert!(context.contains_bean("greeter"));
    assert_eq!(context.find_candidate_name("demo.app.Greeter").unwrap().as_deref(), Some("greeter"));
}
