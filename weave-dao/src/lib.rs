//! Weave DAO - 持久化异常翻译
//!
//! 带有仓储注解的 Bean 在注册时被包装为 AOP 代理，
//! 仓储方法返回的底层错误被翻译为统一的 `DataAccessError`：
//! - `PersistenceExceptionTranslator` 及其链式组合
//! - 按 SQL state 分类的默认翻译器
//! - 拦截器、Advisor 与自动代理的 BeanPostProcessor

pub mod advisor;
pub mod error;
pub mod interceptor;
pub mod post_processor;
pub mod sql_state;
pub mod translator;

pub use advisor::PersistenceExceptionTranslationAdvisor;
pub use error::{DaoError, DaoResult, DataAccessCategory, DataAccessError};
pub use interceptor::PersistenceExceptionTranslationInterceptor;
pub use post_processor::PersistenceExceptionTranslationPostProcessor;
pub use sql_state::{SqlError, SqlStateExceptionTranslator};
pub use translator::{
    translate_if_necessary, ChainedPersistenceExceptionTranslator, PersistenceExceptionTranslator,
};

/// 预导入模块
pub mod prelude {
    pub use crate::error::{DaoError, DaoResult, DataAccessCategory, DataAccessError};
    pub use crate::post_processor::PersistenceExceptionTranslationPostProcessor;
    pub use crate::sql_state::{SqlError, SqlStateExceptionTranslator};
    pub use crate::translator::{
        ChainedPersistenceExceptionTranslator, PersistenceExceptionTranslator,
    };
}
