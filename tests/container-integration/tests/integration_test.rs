//! 端到端测试：声明 -> 上下文构建 -> 解析与调用
use aop_impl::{JoinPoint, ProceedingJoinPoint};
use di_abstractions::{
    AdviceDeclaration, BeanDeclaration, BeanFactory, BeanHandle, ClassInfo, ClassRef,
    StaticDeclarationSource,
};
use infrastructure_common::{args, ContainerError, InfrastructureError, Value};
use infrastructure_composition::{ApplicationContext, ApplicationContextBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

/// 测试组件：仓储
#[derive(Debug, Default)]
struct MemoryRepository {
    prefix: String,
}

fn repository_class(name: &str) -> ClassRef {
    ClassInfo::builder::<MemoryRepository>(name)
        .implements("shop.store.Repository")
        .constructor(MemoryRepository::default)
        .field("prefix", |r: &mut MemoryRepository, v: String| r.prefix = v)
        .method1("find", |r: &MemoryRepository, id: i64| Ok(format!("{}-{}", r.prefix, id)))
        .build()
}

/// 测试组件：两个字段注入 + 一个 setter 注入
#[derive(Debug, Default)]
struct OrderService {
    orders: Option<BeanHandle>,
    customers: Option<BeanHandle>,
    clock: Option<BeanHandle>,
}

fn order_service_class() -> ClassRef {
    ClassInfo::builder::<OrderService>("shop.service.OrderService")
        .constructor(OrderService::default)
        .qualified_field("orders", "shop.store.Repository", "orders", |s: &mut OrderService, h| {
            s.orders = Some(h)
        })
        .qualified_field("customers", "shop.store.Repository", "customers", |s: &mut OrderService, h| {
            s.customers = Some(h)
        })
        .autowired_setter("set_clock", "shop.infra.Clock", |s: &mut OrderService, h| s.clock = Some(h))
        .method1("describe", |s: &OrderService, id: i64| {
            let lookup = |handle: &Option<BeanHandle>| -> Result<String, ContainerError> {
                match handle {
                    Some(repository) => repository.call::<String>("find", args![id]),
                    None => Err(ContainerError::raised("仓储未注入")),
                }
            };
            Ok(format!("{}/{}", lookup(&s.orders)?, lookup(&s.customers)?))
        })
        .build()
}

#[derive(Debug, Default)]
struct Clock;

fn clock_class() -> ClassRef {
    ClassInfo::builder::<Clock>("shop.infra.Clock")
        .constructor(|| Clock)
        .method0("now", |_: &Clock| Ok(42i64))
        .build()
}

#[derive(Debug, Default)]
struct Calculator {
    calls: AtomicUsize,
}

fn calculator_class() -> ClassRef {
    ClassInfo::builder::<Calculator>("shop.math.Calculator")
        .constructor(Calculator::default)
        .method2("add", |c: &Calculator, a: i32, b: i32| {
            c.calls.fetch_add(1, Ordering::SeqCst);
            Ok(a + b)
        })
        .method2("add", |c: &Calculator, a: f64, b: f64| {
            c.calls.fetch_add(1, Ordering::SeqCst);
            Ok(a + b)
        })
        .method1("fail", |_: &Calculator, reason: String| -> Result<i32, ContainerError> {
            Err(ContainerError::raised(reason))
        })
        .build()
}

struct Tracer {
    log: Log,
}

impl Tracer {
    fn push(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }
}

fn tracer_class(log: Log) -> ClassRef {
    ClassInfo::builder::<Tracer>("shop.aspect.Tracer")
        .constructor(move || Tracer { log: log.clone() })
        .method1("note", |t: &Tracer, jp: JoinPoint| {
            t.push(format!("note:{}", jp.method_name().unwrap_or("?")));
            Ok(())
        })
        .method1("outer", |t: &Tracer, pjp: ProceedingJoinPoint| {
            t.push("outer-pre");
            let result = pjp.proceed()?;
            t.push("outer-post");
            Ok(result)
        })
        .method1("inner", |t: &Tracer, pjp: ProceedingJoinPoint| {
            t.push("inner-pre");
            let result = pjp.proceed()?;
            t.push("inner-post");
            Ok(result)
        })
        .method1("block", |t: &Tracer, _: ProceedingJoinPoint| {
            t.push("blocked");
            Ok(Value::new(0i32))
        })
        .build()
}

fn shop_builder(log: &Log) -> ApplicationContextBuilder {
    ApplicationContextBuilder::new()
        .register_class(repository_class("shop.store.OrderRepository"))
        .register_class(repository_class("shop.store.CustomerRepository"))
        .register_class(order_service_class())
        .register_class(clock_class())
        .register_class(calculator_class())
        .register_class(tracer_class(log.clone()))
}

fn shop_source() -> StaticDeclarationSource {
    StaticDeclarationSource::new("shop")
        .with_bean(BeanDeclaration::new("orders", "shop.store.OrderRepository").with_property("prefix", "order"))
        .with_bean(
            BeanDeclaration::new("customers", "shop.store.CustomerRepository").with_property("prefix", "customer"),
        )
        .with_bean(BeanDeclaration::new("clock", "shop.infra.Clock"))
        .with_bean(BeanDeclaration::new("service", "shop.service.OrderService"))
        .with_bean(BeanDeclaration::new("report", "shop.service.OrderService").prototype())
        .with_bean(BeanDeclaration::new("calc", "shop.math.Calculator"))
        .with_bean(BeanDeclaration::new("tracer", "shop.aspect.Tracer"))
}

fn build(log: &Log, advice: Vec<AdviceDeclaration>) -> ApplicationContext {
    let mut source = shop_source();
    for declaration in advice {
        source.add_advice(declaration);
    }
    shop_builder(log).add_source(source).build().unwrap()
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_singleton_identity() {
    let context = build(&Log::default(), Vec::new());
    let first = context.resolve("service").unwrap();
    let second = context.resolve("service").unwrap();
    assert!(first.same_instance(second.as_ref()));
}

#[test]
fn test_prototype_instances_share_dependencies() {
    let context = build(&Log::default(), Vec::new());
    let first = context.resolve_as::<OrderService>("report").unwrap();
    let second = context.resolve_as::<OrderService>("report").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    let orders = context.resolve("orders").unwrap();
    for report in [&first, &second] {
        assert!(report.orders.as_ref().unwrap().same_instance(orders.as_ref()));
    }
}

#[test]
fn test_injected_members_are_registry_instances() {
    let context = build(&Log::default(), Vec::new());
    let service = context.resolve_as::<OrderService>("service").unwrap();

    let expected = [("orders", &service.orders), ("customers", &service.customers), ("clock", &service.clock)];
    for (name, injected) in expected {
        let registered = context.resolve(name).unwrap();
        assert!(injected.as_ref().unwrap().same_instance(registered.as_ref()), "{name}");
    }

    let handle = context.resolve("service").unwrap();
    assert_eq!(
        handle.call::<String>("describe", args![7i64]).unwrap(),
        "order-7/customer-7"
    );
}

#[test]
fn test_ambiguous_autowiring_fails_at_bootstrap() {
    static CACHES_BUILT: AtomicUsize = AtomicUsize::new(0);
    let cache_class = |name: &str| {
        ClassInfo::builder::<Clock>(name)
            .implements("shop.cache.Cache")
            .constructor(|| {
                CACHES_BUILT.fetch_add(1, Ordering::SeqCst);
                Clock
            })
            .build()
    };
    let consumer = ClassInfo::builder::<OrderService>("shop.service.Cached")
        .constructor(OrderService::default)
        .autowired_field("cache", "shop.cache.Cache", |s: &mut OrderService, h| s.orders = Some(h))
        .build();

    let err = shop_builder(&Log::default())
        .register_class(cache_class("shop.cache.Redis"))
        .register_class(cache_class("shop.cache.Local"))
        .register_class(consumer)
        .add_source(shop_source())
        .add_bean(BeanDeclaration::new("redis", "shop.cache.Redis"))
        .add_bean(BeanDeclaration::new("local", "shop.cache.Local"))
        .add_bean(BeanDeclaration::new("cached", "shop.service.Cached"))
        .build()
        .unwrap_err();

    match err {
        InfrastructureError::Container {
            source: ContainerError::AmbiguousCandidate { type_name, candidates },
        } => {
            assert_eq!(type_name, "shop.cache.Cache");
            assert_eq!(candidates, vec!["redis".to_string(), "local".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(CACHES_BUILT.load(Ordering::SeqCst), 0);
}

#[test]
fn test_before_advice_on_every_add_overload() {
    let log = Log::default();
    let context = build(&log, vec![AdviceDeclaration::before("tracer", "note").on("calc.add(*)")]);

    let calc = context.resolve("calc").unwrap();
    assert_eq!(calc.call::<i32>("add", args![2, 3]).unwrap(), 5);
    assert_eq!(entries(&log), vec!["note:add"]);

    assert_eq!(calc.call::<f64>("add", args![0.5f64, 0.25f64]).unwrap(), 0.75);
    assert_eq!(entries(&log).len(), 2);
}

#[test]
fn test_around_advice_can_skip_target() {
    let log = Log::default();
    let context = build(&log, vec![AdviceDeclaration::around("tracer", "block").on("calc")]);

    let calc = context.resolve("calc").unwrap();
    assert_eq!(calc.call::<i32>("add", args![2, 3]).unwrap(), 0);
    assert_eq!(entries(&log), vec!["blocked"]);

    let target = context.resolve_as::<Calculator>("calc").unwrap();
    assert_eq!(target.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_chained_around_advice_nests_by_order() {
    let log = Log::default();
    let context = build(
        &log,
        vec![
            AdviceDeclaration::around("tracer", "inner").with_order(2).on("calc.add(i32,i32)"),
            AdviceDeclaration::around("tracer", "outer").with_order(1).on("calc.add(i32,i32)"),
            AdviceDeclaration::before("tracer", "note").on("calc.add(i32,i32)"),
        ],
    );

    let calc = context.resolve("calc").unwrap();
    assert_eq!(calc.call::<i32>("add", args![1, 1]).unwrap(), 2);
    assert_eq!(
        entries(&log),
        vec!["note:add", "outer-pre", "inner-pre", "inner-post", "outer-post"]
    );
}

#[test]
fn test_malformed_reference_names_aspect_and_expression() {
    let log = Log::default();
    let mut source = shop_source();
    source.add_advice(AdviceDeclaration::before("tracer", "note").on("calc.add("));

    let err = shop_builder(&log).add_source(source).build().unwrap_err();
    match err {
        InfrastructureError::Container {
            source: ContainerError::MalformedPointcut { aspect, expression, .. },
        } => {
            assert_eq!(aspect, "tracer");
            assert_eq!(expression, "calc.add(");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_target_errors_pass_through_proxy() -> anyhow::Result<()> {
    let log = Log::default();
    let context = build(&log, vec![AdviceDeclaration::around("tracer", "outer").on("calc")]);

    let calc = context.resolve("calc")?;
    let err = calc.call::<i32>("fail", args!["磁盘已满".to_string()]).unwrap_err();
    assert!(matches!(err, ContainerError::Invocation { .. }));
    assert_eq!(err.to_string(), "磁盘已满");
    assert_eq!(entries(&log), vec!["outer-pre"]);
    Ok(())
}

#[test]
fn test_unknown_bean_after_bootstrap() {
    let context = build(&Log::default(), Vec::new());
    assert!(matches!(
        context.resolve("missing"),
        Err(ContainerError::UnresolvedBean { .. })
    ));
}
