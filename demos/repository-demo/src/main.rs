use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use weave_aop::prelude::*;
use weave_core::prelude::*;
use weave_core::reflect::get_global_class_registry;
use weave_core::{EnvironmentPropertySource, TomlPropertySource};
use weave_dao::prelude::*;
use weave_macros::Annotation;
use weave_proxy::{ClassGenerator, ProxySettings};

const CONFIG: &str = r#"
[weave.logging]
level = "debug"
format = "compact"

[weave.proxy]
cache-enabled = true

[weave.dao]
repository-annotation = "Repository"

[weave.dao.translation]
enabled = true
"#;

// ==================== 注解 ====================

#[derive(Annotation)]
pub struct Repository;

#[derive(Annotation)]
pub struct Audited;

// ==================== 仓储 ====================

#[derive(Default)]
struct OrderDao {
    orders: Mutex<HashMap<u64, String>>,
}

/// @Repository class OrderDao { save(u64, String); find(u64) -> String }
fn order_dao_class() -> anyhow::Result<Class> {
    let class = ClassMeta::builder("demo.OrderDao")
        .with_annotation(Repository::class()?)
        .with_method(
            MethodMeta::new("save")
                .with_params(["u64", "String"])
                .with_invoker(|target, args| {
                    let dao = receiver::<OrderDao>(target)?;
                    let id = arg::<u64>(args, 0)?;
                    let mut orders = dao.orders.lock();
                    if orders.contains_key(&id) {
                        return Err(Box::new(SqlError::new(
                            "23505",
                            0,
                            format!("Key (id)=({id}) already exists"),
                        )));
                    }
                    orders.insert(id, arg::<String>(args, 1)?);
                    Ok(void())
                }),
        )
        .with_method(
            MethodMeta::new("find")
                .with_params(["u64"])
                .with_return_type("String")
                .with_invoker(|target, args| {
                    let dao = receiver::<OrderDao>(target)?;
                    let id = arg::<u64>(args, 0)?;
                    dao.orders
                        .lock()
                        .get(&id)
                        .cloned()
                        .map(instance)
                        .ok_or_else(|| -> Throwable {
                            Box::new(DataAccessError::EmptyResultDataAccess { expected: 1 })
                        })
                }),
        )
        .build()?;
    Ok(class)
}

// ==================== 业务服务 ====================

struct OrderService {
    orders: Arc<AopProxy>,
}

/// class OrderService { @Audited place(u64, String) }
fn order_service_class() -> anyhow::Result<Class> {
    let class = ClassMeta::builder("demo.OrderService")
        .with_method(
            MethodMeta::new("place")
                .with_params(["u64", "String"])
                .with_annotation(Audited::class()?)
                .with_invoker(|target, args| {
                    let service = receiver::<OrderService>(target)?;
                    service
                        .orders
                        .invoke("save", &["u64", "String"], args)
                        .map_err(InvocationError::into_cause)
                }),
        )
        .build()?;
    Ok(class)
}

fn audited_order_service(
    generator: Arc<ClassGenerator>,
    orders: Arc<AopProxy>,
) -> anyhow::Result<AopProxy> {
    let audit = interceptor("audit", |invocation| {
        let result = invocation.proceed();
        match &result {
            Ok(_) => tracing::info!("AUDIT {} succeeded", invocation),
            Err(e) => tracing::warn!("AUDIT {} failed: {}", invocation, e),
        }
        result
    });
    let pointcut = AnnotationMatchingPointcut::for_method_annotation(&Audited::class()?)?;

    let mut factory = ProxyFactory::with_generator(
        generator,
        instance(OrderService { orders }),
        order_service_class()?,
    );
    factory.add_advisor(Arc::new(DefaultPointcutAdvisor::with_pointcut(
        Arc::new(pointcut),
        audit,
    )));
    Ok(factory.get_proxy()?)
}

fn main() -> anyhow::Result<()> {
    let environment = Environment::new();
    environment.add_property_source(Box::new(TomlPropertySource::from_toml(CONFIG, "demo.toml")?));
    // WEAVE_DAO_TRANSLATION_ENABLED=false 覆盖文件配置
    environment.add_property_source(Box::new(EnvironmentPropertySource::new("")));

    LoggingConfig::from_environment(&environment)?.init()?;

    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║     Weave - Repository Exception Translation       ║");
    println!("╚════════════════════════════════════════════════════╝\n");

    let generator = Arc::new(ClassGenerator::new(ProxySettings::from_environment(&environment)));

    let factory = Arc::new(DefaultListableBeanFactory::new());
    factory.register_singleton(
        "sqlStateTranslator",
        Arc::new(SqlStateExceptionTranslator) as Arc<dyn PersistenceExceptionTranslator>,
    )?;
    factory.add_bean_post_processor(Arc::new(
        PersistenceExceptionTranslationPostProcessor::from_environment(
            &factory,
            &environment,
            get_global_class_registry(),
        )?
        .with_generator(Arc::clone(&generator)),
    ));

    factory.register_bean("orderDao", order_dao_class()?, instance(OrderDao::default()))?;
    let order_dao = factory.get_typed_bean::<AopProxy>("orderDao")?;
    println!("📦 orderDao proxied as {}", order_dao.proxy_class().name());

    let service = audited_order_service(Arc::clone(&generator), Arc::clone(&order_dao))?;

    let place = |id: u64, item: &str| {
        service.invoke(
            "place",
            &["u64", "String"],
            &[instance(id), instance(item.to_string())],
        )
    };

    place(1, "keyboard")?;
    place(2, "monitor")?;

    match place(1, "mouse") {
        Ok(_) => println!("❌ duplicate order accepted"),
        Err(e) => match e.into_cause().downcast::<DataAccessError>() {
            Ok(translated) => println!(
                "✅ duplicate order rejected ({:?}): {}",
                translated.category(),
                translated
            ),
            Err(other) => println!("❌ untranslated error: {}", other),
        },
    }

    let found = order_dao.invoke("find", &["u64"], &[instance(2_u64)])?;
    if let Some(item) = found.downcast_ref::<String>() {
        println!("🔍 order 2 -> {}", item);
    }

    if let Err(e) = order_dao.invoke("find", &["u64"], &[instance(42_u64)]) {
        println!("🔍 order 42 -> {}", e.into_cause());
    }

    println!(
        "\n✅ Demo finished ({} classes generated)",
        generator.generation_count()
    );
    Ok(())
}
