//! 持久化异常翻译拦截器
//!
//! 目标方法失败时把错误交给翻译器。翻译器可以显式指定，
//! 也可以在第一次需要时从 Bean 工厂中查找所有 `Arc<dyn PersistenceExceptionTranslator>`
//! 类型的 Bean，按注册顺序串联。

use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use weave_aop::{Advice, MethodInterceptor, MethodInvocation};
use weave_core::{Instance, ListableBeanFactory, ListableBeanFactoryExt, Throwable};

use crate::error::{DaoError, DaoResult, DataAccessError};
use crate::translator::{
    translate_if_necessary, ChainedPersistenceExceptionTranslator, PersistenceExceptionTranslator,
};

pub struct PersistenceExceptionTranslationInterceptor {
    translator: OnceCell<Arc<dyn PersistenceExceptionTranslator>>,
    bean_factory: Option<Weak<dyn ListableBeanFactory>>,
}

impl PersistenceExceptionTranslationInterceptor {
    /// 使用给定的翻译器
    pub fn new(translator: Arc<dyn PersistenceExceptionTranslator>) -> Self {
        Self {
            translator: OnceCell::with_value(translator),
            bean_factory: None,
        }
    }

    /// 第一次翻译时从 Bean 工厂中查找翻译器
    pub fn with_bean_factory(bean_factory: Weak<dyn ListableBeanFactory>) -> Self {
        Self {
            translator: OnceCell::new(),
            bean_factory: Some(bean_factory),
        }
    }

    fn translator(&self) -> DaoResult<&Arc<dyn PersistenceExceptionTranslator>> {
        self.translator.get_or_try_init(|| self.detect_translators())
    }

    fn detect_translators(&self) -> DaoResult<Arc<dyn PersistenceExceptionTranslator>> {
        let bean_factory = self
            .bean_factory
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| {
                DaoError::IllegalState(
                    "no PersistenceExceptionTranslator set and no bean factory available"
                        .to_string(),
                )
            })?;

        let translators =
            bean_factory.get_beans_of_type::<Arc<dyn PersistenceExceptionTranslator>>();
        if translators.is_empty() {
            return Err(DaoError::IllegalState(
                "no PersistenceExceptionTranslators found in bean factory, \
                 cannot perform exception translation"
                    .to_string(),
            ));
        }

        tracing::info!(
            "Detected persistence exception translators: {:?}",
            translators.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>()
        );

        let chain: ChainedPersistenceExceptionTranslator = translators
            .into_iter()
            .map(|(_, translator)| translator)
            .collect();
        Ok(Arc::new(chain))
    }
}

impl Advice for PersistenceExceptionTranslationInterceptor {
    fn name(&self) -> &str {
        "PersistenceExceptionTranslationInterceptor"
    }
}

impl MethodInterceptor for PersistenceExceptionTranslationInterceptor {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Instance, Throwable> {
        let err = match invocation.proceed() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if err.is::<DataAccessError>() {
            return Err(err);
        }

        let translator = self.translator().map_err(|e| {
            tracing::error!("Cannot translate error from {}: {}", invocation, e);
            Box::new(e) as Throwable
        })?;
        Err(translate_if_necessary(err, translator.as_ref()))
    }
}

impl fmt::Debug for PersistenceExceptionTranslationInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceExceptionTranslationInterceptor")
            .field("translator_resolved", &self.translator.get().is_some())
            .field("bean_factory", &self.bean_factory.is_some())
            .finish()
    }
}
