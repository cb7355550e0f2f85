//! 仓储 Bean 自动代理与异常翻译的集成测试

use std::sync::Arc;

use parking_lot::Mutex;
use weave_aop::AopProxy;
use weave_core::prelude::*;
use weave_core::reflect::get_global_class_registry;
use weave_dao::prelude::*;
use weave_macros::Annotation;

#[derive(Annotation)]
pub struct Repository;

#[derive(Annotation)]
#[meta("Repository")]
pub struct JdbcRepository;

#[derive(Debug, thiserror::Error)]
#[error("lock wait timeout on {0}")]
struct LockTimeout(String);

#[derive(Default)]
struct UserDao {
    users: Mutex<Vec<String>>,
}

fn user_dao_class(annotation: Class) -> Class {
    ClassMeta::builder("it.UserDao")
        .with_annotation(annotation)
        .with_method(
            MethodMeta::new("insert")
                .with_params(["String"])
                .with_invoker(|target, args| {
                    let dao = receiver::<UserDao>(target)?;
                    let name = arg::<String>(args, 0)?;
                    let mut users = dao.users.lock();
                    if users.contains(&name) {
                        return Err(Box::new(SqlError::new(
                            "23505",
                            0,
                            format!("duplicate key value violates unique constraint: {name}"),
                        )));
                    }
                    users.push(name);
                    Ok(void())
                }),
        )
        .with_method(MethodMeta::new("count").with_invoker(|target, _| {
            let dao = receiver::<UserDao>(target)?;
            Ok(instance(dao.users.lock().len()))
        }))
        .with_method(
            MethodMeta::new("lock")
                .with_params(["String"])
                .with_invoker(|_, args| Err(Box::new(LockTimeout(arg::<String>(args, 0)?)))),
        )
        .build()
        .unwrap()
}

fn lock_timeout_translator(err: Throwable) -> Result<DataAccessError, Throwable> {
    if err.is::<LockTimeout>() {
        return Ok(DataAccessError::ConcurrencyFailure {
            message: err.to_string(),
            cause: err,
        });
    }
    Err(err)
}

fn factory_with_processor() -> Arc<DefaultListableBeanFactory> {
    let factory = Arc::new(DefaultListableBeanFactory::new());
    let processor = PersistenceExceptionTranslationPostProcessor::from_environment(
        &factory,
        &Environment::new(),
        get_global_class_registry(),
    )
    .unwrap();
    factory.add_bean_post_processor(Arc::new(processor));
    factory
}

fn string(value: &str) -> Instance {
    instance(value.to_string())
}

#[test]
fn test_repository_bean_errors_are_translated() {
    let factory = factory_with_processor();
    factory
        .register_singleton(
            "sqlStateTranslator",
            Arc::new(SqlStateExceptionTranslator) as Arc<dyn PersistenceExceptionTranslator>,
        )
        .unwrap();
    factory
        .register_singleton(
            "lockTimeoutTranslator",
            Arc::new(lock_timeout_translator) as Arc<dyn PersistenceExceptionTranslator>,
        )
        .unwrap();

    let class = user_dao_class(Repository::class().unwrap());
    factory
        .register_bean("userDao", class, instance(UserDao::default()))
        .unwrap();
    let dao = factory.get_typed_bean::<AopProxy>("userDao").unwrap();

    dao.call("insert", &[string("alice")]).unwrap();
    let err = dao.call("insert", &[string("alice")]).unwrap_err().into_cause();
    let translated = err.downcast_ref::<DataAccessError>().unwrap();
    assert!(matches!(translated, DataAccessError::DuplicateKey { .. }));
    assert_eq!(translated.category(), DataAccessCategory::NonTransient);
    assert!(translated.original_cause().is_some_and(|c| c.is::<SqlError>()));

    let err = dao.call("lock", &[string("users")]).unwrap_err().into_cause();
    let translated = err.downcast_ref::<DataAccessError>().unwrap();
    assert!(matches!(translated, DataAccessError::ConcurrencyFailure { .. }));
    assert_eq!(translated.category(), DataAccessCategory::Transient);

    let count = dao.call("count", &[]).unwrap();
    assert_eq!(count.downcast_ref::<usize>(), Some(&1));
}

#[test]
fn test_meta_annotated_repository_is_proxied() {
    let factory = factory_with_processor();
    factory
        .register_singleton(
            "sqlStateTranslator",
            Arc::new(SqlStateExceptionTranslator) as Arc<dyn PersistenceExceptionTranslator>,
        )
        .unwrap();

    let class = user_dao_class(JdbcRepository::class().unwrap());
    let bean = factory
        .register_bean("jdbcUserDao", class, instance(UserDao::default()))
        .unwrap();
    assert!(bean.is::<AopProxy>());

    // 只注册了 SQL state 翻译器，LockTimeout 原样传播
    let dao = factory.get_typed_bean::<AopProxy>("jdbcUserDao").unwrap();
    let err = dao.call("lock", &[string("users")]).unwrap_err().into_cause();
    assert!(err.is::<LockTimeout>());
}

#[test]
fn test_missing_translators_is_illegal_state() {
    let factory = factory_with_processor();
    let class = user_dao_class(Repository::class().unwrap());
    factory
        .register_bean("userDao", class, instance(UserDao::default()))
        .unwrap();
    let dao = factory.get_typed_bean::<AopProxy>("userDao").unwrap();

    // 正常返回时不需要翻译器
    dao.call("insert", &[string("bob")]).unwrap();

    let err = dao.call("insert", &[string("bob")]).unwrap_err().into_cause();
    assert!(matches!(
        err.downcast_ref::<DaoError>(),
        Some(DaoError::IllegalState(_))
    ));
}

#[test]
fn test_plain_beans_are_left_alone() {
    let factory = factory_with_processor();
    let class = ClassMeta::builder("it.Clock")
        .with_method(MethodMeta::new("now").with_invoker(|_, _| Ok(instance(0_u64))))
        .build()
        .unwrap();

    let bean = factory.register_bean("clock", class, instance(())).unwrap();
    assert!(!bean.is::<AopProxy>());
}
