//! 持久化异常翻译 Advisor
//!
//! 切点只看类型：类型（或其父类、接口、元注解）带有仓储注解时，所有方法都被拦截。

use std::fmt;
use std::sync::Arc;

use weave_aop::{Advisor, AnnotationMatchingPointcut, MethodInterceptor, Pointcut, PointcutAdvisor};
use weave_core::Class;

use crate::error::DaoResult;
use crate::interceptor::PersistenceExceptionTranslationInterceptor;

pub struct PersistenceExceptionTranslationAdvisor {
    pointcut: AnnotationMatchingPointcut,
    interceptor: Arc<PersistenceExceptionTranslationInterceptor>,
}

impl PersistenceExceptionTranslationAdvisor {
    pub fn new(
        repository_annotation: &Class,
        interceptor: PersistenceExceptionTranslationInterceptor,
    ) -> DaoResult<Self> {
        Ok(Self {
            pointcut: AnnotationMatchingPointcut::class_annotation_only(
                repository_annotation,
                true,
            )?,
            interceptor: Arc::new(interceptor),
        })
    }

    pub fn interceptor(&self) -> &Arc<PersistenceExceptionTranslationInterceptor> {
        &self.interceptor
    }
}

impl Advisor for PersistenceExceptionTranslationAdvisor {
    fn advice(&self) -> Arc<dyn MethodInterceptor> {
        self.interceptor.clone()
    }
}

impl PointcutAdvisor for PersistenceExceptionTranslationAdvisor {
    fn pointcut(&self) -> &dyn Pointcut {
        &self.pointcut
    }
}

impl fmt::Debug for PersistenceExceptionTranslationAdvisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceExceptionTranslationAdvisor")
            .field("pointcut", &self.pointcut)
            .finish()
    }
}
