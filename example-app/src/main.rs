//! # 示例应用程序
//!
//! 演示如何声明 Bean、自动装配依赖并通过切面拦截方法调用

use aop_impl::{JoinPoint, ProceedingJoinPoint};
use clap::Parser;
use di_abstractions::{
    AdviceDeclaration, BeanDeclaration, BeanFactory, BeanHandle, ClassInfo, ClassRef,
    StaticDeclarationSource,
};
use infrastructure_common::{args, ContainerError, ContainerResult};
use infrastructure_composition::{
    ApplicationContext, ApplicationContextBuilder, ContainerSettings, LoggingSettings,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Bean 容器与切面织入示例应用")]
struct Args {
    /// 容器配置文件路径 (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 启动时预先实例化单例
    #[arg(long)]
    eager: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// 计算服务
#[derive(Debug, Default)]
struct Calculator;

/// 报价服务，依赖计算服务
#[derive(Debug, Default)]
struct PriceQuoter {
    calculator: Option<BeanHandle>,
    currency: String,
}

impl PriceQuoter {
    fn quote(&self, base: f64, fee: f64) -> ContainerResult<String> {
        let calculator = self
            .calculator
            .as_ref()
            .ok_or_else(|| ContainerError::raised("calculator 未注入"))?;
        let total: f64 = calculator.call("add", args![base, fee])?;
        Ok(format!("{:.2} {}", total, self.currency))
    }
}

/// 审计切面
#[derive(Debug, Default)]
struct AuditAspect {
    calls: AtomicUsize,
}

/// 计时切面
#[derive(Debug, Default)]
struct TimingAspect;

fn classes() -> Vec<ClassRef> {
    vec![
        ClassInfo::builder::<Calculator>("demo.pricing.Calculator")
            .implements("demo.pricing.Arithmetic")
            .constructor(Calculator::default)
            .method2("add", |_: &Calculator, a: i32, b: i32| Ok(a + b))
            .method2("add", |_: &Calculator, a: f64, b: f64| Ok(a + b))
            .method2("divide", |_: &Calculator, a: i32, b: i32| {
                if b == 0 {
                    return Err(ContainerError::raised("除数不能为 0"));
                }
                Ok(a / b)
            })
            .build(),
        ClassInfo::builder::<PriceQuoter>("demo.pricing.PriceQuoter")
            .constructor(PriceQuoter::default)
            .autowired_field("calculator", "demo.pricing.Arithmetic", |q: &mut PriceQuoter, h| {
                q.calculator = Some(h)
            })
            .field("currency", |q: &mut PriceQuoter, v: String| q.currency = v)
            .method2("quote", |q: &PriceQuoter, base: f64, fee: f64| q.quote(base, fee))
            .build(),
        ClassInfo::builder::<AuditAspect>("demo.aspect.AuditAspect")
            .constructor(AuditAspect::default)
            .method1("record", |a: &AuditAspect, jp: JoinPoint| {
                let seq = a.calls.fetch_add(1, Ordering::SeqCst) + 1;
                info!(
                    "[{} #{}] {}.{} 参数 {}",
                    jp.advisor().aspect(),
                    seq,
                    jp.bean_name(),
                    jp.method_name().unwrap_or("?"),
                    jp.arguments().len()
                );
                Ok(())
            })
            .build(),
        ClassInfo::builder::<TimingAspect>("demo.aspect.TimingAspect")
            .constructor(|| TimingAspect)
            .method1("time", |_: &TimingAspect, pjp: ProceedingJoinPoint| {
                let started = Instant::now();
                let result = pjp.proceed();
                info!(
                    "[计时] {}.{} 耗时 {:?}",
                    pjp.bean_name(),
                    pjp.method_name().unwrap_or("?"),
                    started.elapsed()
                );
                result
            })
            .build(),
    ]
}

fn declarations() -> StaticDeclarationSource {
    StaticDeclarationSource::new("demo")
        .with_bean(BeanDeclaration::new("calculator", "demo.pricing.Calculator"))
        .with_bean(BeanDeclaration::new("quoter", "demo.pricing.PriceQuoter").with_property("currency", "CNY"))
        .with_bean(BeanDeclaration::new("audit", "demo.aspect.AuditAspect"))
        .with_bean(BeanDeclaration::new("timing", "demo.aspect.TimingAspect"))
        .with_advice(AdviceDeclaration::before("audit", "record").on("calculator.add(*)"))
        .with_advice(AdviceDeclaration::around("timing", "time").within("demo.pricing"))
}

fn build_context(args: &Args) -> anyhow::Result<ApplicationContext> {
    let mut settings = ContainerSettings::load(args.config.as_deref())?;
    settings.eager_singletons |= args.eager;

    let mut builder = ApplicationContextBuilder::new();
    for class in classes() {
        builder = builder.register_class(class);
    }
    if !settings.logging.enabled {
        builder = builder.with_logging(LoggingSettings {
            enabled: true,
            level: args.log_level.clone(),
            ..LoggingSettings::default()
        });
    }

    Ok(builder.with_settings(settings).add_source(declarations()).build()?)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let context = build_context(&args)?;

    info!(
        "上下文 {} 已就绪: {} 个 Bean, {} 个代理",
        context.id(),
        context.stats().bean_count,
        context.stats().proxied_count
    );

    let calculator = context.resolve("calculator")?;
    let sum: i32 = calculator.call("add", args![2, 3])?;
    info!("2 + 3 = {}", sum);

    let quoter = context.resolve("quoter")?;
    let quote: String = quoter.call("quote", args![99.5f64, 0.5f64])?;
    info!("报价: {}", quote);

    match calculator.call::<i32>("divide", args![1, 0]) {
        Ok(value) => info!("1 / 0 = {}", value),
        Err(e) => warn!("调用失败: {}", e),
    }

    let audit = context.resolve_as::<AuditAspect>("audit")?;
    info!("审计记录次数: {}", audit.calls.load(Ordering::SeqCst));
    Ok(())
}
