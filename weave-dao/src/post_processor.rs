//! 持久化异常翻译 BeanPostProcessor
//!
//! Bean 注册时检查其类型是否带有仓储注解，带有时包装为 `AopProxy`，
//! 仓储方法抛出的错误经过翻译后再传给调用方。
//!
//! ```ignore
//! let factory = Arc::new(DefaultListableBeanFactory::new());
//! factory.register_singleton(
//!     "sqlStateTranslator",
//!     Arc::new(SqlStateExceptionTranslator) as Arc<dyn PersistenceExceptionTranslator>,
//! )?;
//! factory.add_bean_post_processor(Arc::new(
//!     PersistenceExceptionTranslationPostProcessor::from_environment(&factory, &env, registry)?,
//! ));
//! let user_dao = factory.register_bean("userDao", user_dao_class, instance(UserDao::new()))?;
//! ```

use std::sync::Arc;

use weave_aop::{can_apply, PointcutAdvisor, ProxyFactory};
use weave_core::constants::{
    DAO_REPOSITORY_ANNOTATION_KEY, DAO_TRANSLATION_ENABLED_KEY, DEFAULT_REPOSITORY_ANNOTATION,
};
use weave_core::reflect::instance;
use weave_core::{
    BeanPostProcessor, Class, ClassRegistry, ContainerError, ContainerResult, Environment, Instance,
    ListableBeanFactory,
};
use weave_proxy::{get_global_class_generator, ClassGenerator};

use crate::advisor::PersistenceExceptionTranslationAdvisor;
use crate::error::DaoResult;
use crate::interceptor::PersistenceExceptionTranslationInterceptor;

pub struct PersistenceExceptionTranslationPostProcessor {
    advisor: Arc<PersistenceExceptionTranslationAdvisor>,
    generator: Arc<ClassGenerator>,
    enabled: bool,
}

impl PersistenceExceptionTranslationPostProcessor {
    /// 翻译器从 `bean_factory` 中延迟查找
    pub fn new<F>(bean_factory: &Arc<F>, repository_annotation: &Class) -> DaoResult<Self>
    where
        F: ListableBeanFactory + 'static,
    {
        let bean_factory: Arc<dyn ListableBeanFactory> = bean_factory.clone();
        let interceptor = PersistenceExceptionTranslationInterceptor::with_bean_factory(
            Arc::downgrade(&bean_factory),
        );
        Ok(Self {
            advisor: Arc::new(PersistenceExceptionTranslationAdvisor::new(
                repository_annotation,
                interceptor,
            )?),
            generator: Arc::clone(get_global_class_generator()),
            enabled: true,
        })
    }

    /// 读取 `weave.dao.translation.enabled` 与 `weave.dao.repository-annotation`，
    /// 注解名称从 `registry` 解析，默认 `Repository`
    pub fn from_environment<F>(
        bean_factory: &Arc<F>,
        environment: &Environment,
        registry: &ClassRegistry,
    ) -> DaoResult<Self>
    where
        F: ListableBeanFactory + 'static,
    {
        let annotation_name =
            environment.get_string_or(DAO_REPOSITORY_ANNOTATION_KEY, DEFAULT_REPOSITORY_ANNOTATION);
        let annotation = registry.for_name(&annotation_name)?;
        let enabled = environment.get_bool_or(DAO_TRANSLATION_ENABLED_KEY, true);

        tracing::debug!(
            "Persistence exception translation for @{}: {}",
            annotation_name,
            if enabled { "enabled" } else { "disabled" }
        );

        Ok(Self::new(bean_factory, &annotation)?.with_enabled(enabled))
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_generator(mut self, generator: Arc<ClassGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn advisor(&self) -> &Arc<PersistenceExceptionTranslationAdvisor> {
        &self.advisor
    }
}

impl BeanPostProcessor for PersistenceExceptionTranslationPostProcessor {
    fn name(&self) -> &str {
        "PersistenceExceptionTranslationPostProcessor"
    }

    fn order(&self) -> i32 {
        // 在其他处理器之后包装代理
        2000
    }

    fn post_process_after_initialization(
        &self,
        bean: Instance,
        bean_name: &str,
        bean_class: Option<&Class>,
    ) -> ContainerResult<Instance> {
        let Some(bean_class) = bean_class.filter(|_| self.enabled) else {
            return Ok(bean);
        };

        if !can_apply(self.advisor.pointcut(), bean_class) {
            tracing::trace!("Bean '{}' is not a repository, skipping", bean_name);
            return Ok(bean);
        }

        let advisor: Arc<dyn PointcutAdvisor> = self.advisor.clone();
        let mut factory =
            ProxyFactory::with_generator(Arc::clone(&self.generator), bean, Arc::clone(bean_class));
        factory.add_advisor(advisor);
        let proxy = factory
            .get_proxy()
            .map_err(|e| ContainerError::BeanPostProcessingFailed {
                name: bean_name.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Repository bean '{}' ({}) proxied for exception translation",
            bean_name,
            bean_class.name()
        );
        Ok(instance(proxy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_aop::AopProxy;
    use weave_core::reflect::void;
    use weave_core::{
        ClassMeta, ConfigValue, DefaultListableBeanFactory, ListableBeanFactoryExt,
        MapPropertySource, MethodMeta,
    };

    fn classes() -> (Class, Class, Class) {
        let repository = ClassMeta::annotation("Repository").build().unwrap();
        let dao = ClassMeta::builder("test.OrderDao")
            .with_annotation(repository.clone())
            .with_method(MethodMeta::new("save").with_invoker(|_, _| Ok(void())))
            .build()
            .unwrap();
        let service = ClassMeta::builder("test.OrderService")
            .with_method(MethodMeta::new("place").with_invoker(|_, _| Ok(void())))
            .build()
            .unwrap();
        (repository, dao, service)
    }

    #[test]
    fn test_wraps_repository_beans_only() {
        let (repository, dao, service) = classes();
        let factory = Arc::new(DefaultListableBeanFactory::new());
        let processor = PersistenceExceptionTranslationPostProcessor::new(&factory, &repository)
            .unwrap()
            .with_generator(Arc::new(ClassGenerator::default()));
        factory.add_bean_post_processor(Arc::new(processor));

        let registered_dao = factory.register_bean("orderDao", dao, instance(())).unwrap();
        let registered_service = factory
            .register_bean("orderService", service, instance(()))
            .unwrap();

        assert!(registered_dao.is::<AopProxy>());
        assert!(!registered_service.is::<AopProxy>());
        assert!(factory.get_typed_bean::<AopProxy>("orderDao").is_ok());
    }

    #[test]
    fn test_environment_can_disable_translation() {
        let (repository, dao, _) = classes();
        let registry = ClassRegistry::new();
        registry.register(repository).unwrap();

        let environment = Environment::new();
        environment.add_property_source(Box::new(
            MapPropertySource::new("test")
                .with_property(DAO_TRANSLATION_ENABLED_KEY, ConfigValue::Bool(false)),
        ));

        let factory = Arc::new(DefaultListableBeanFactory::new());
        let processor = PersistenceExceptionTranslationPostProcessor::from_environment(
            &factory,
            &environment,
            &registry,
        )
        .unwrap();
        assert!(!processor.is_enabled());

        let bean = processor
            .post_process_after_initialization(instance(()), "orderDao", Some(&dao))
            .unwrap();
        assert!(!bean.is::<AopProxy>());
    }

    #[test]
    fn test_unknown_annotation_name_fails() {
        let registry = ClassRegistry::new();
        let environment = Environment::new();
        environment.add_property_source(Box::new(MapPropertySource::new("test").with_property(
            DAO_REPOSITORY_ANNOTATION_KEY,
            ConfigValue::String("Dao".to_string()),
        )));

        let factory = Arc::new(DefaultListableBeanFactory::new());
        assert!(PersistenceExceptionTranslationPostProcessor::from_environment(
            &factory,
            &environment,
            &registry
        )
        .is_err());
    }
}
