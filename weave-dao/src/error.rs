//! 数据访问错误
//!
//! `DataAccessError` 是与具体存储技术无关的错误层次，翻译后的错误保留原始错误作为 source。

use thiserror::Error;
use weave_aop::AopError;
use weave_core::{ContainerError, Throwable};

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataAccessCategory {
    /// 重试同一个操作可能成功
    Transient,
    /// 不修正原因就不会成功
    NonTransient,
    /// 执行恢复步骤（例如重连）后可能成功
    Recoverable,
}

#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("Data integrity violation: {message}")]
    DataIntegrityViolation {
        message: String,
        #[source]
        cause: Throwable,
    },

    #[error("Duplicate key: {message}")]
    DuplicateKey {
        message: String,
        #[source]
        cause: Throwable,
    },

    #[error("Data access resource failure: {message}")]
    DataAccessResourceFailure {
        message: String,
        #[source]
        cause: Throwable,
    },

    #[error("Transient data access resource failure: {message}")]
    TransientDataAccessResource {
        message: String,
        #[source]
        cause: Throwable,
    },

    #[error("Concurrency failure: {message}")]
    ConcurrencyFailure {
        message: String,
        #[source]
        cause: Throwable,
    },

    #[error("Bad SQL grammar: {message}")]
    BadSqlGrammar {
        message: String,
        #[source]
        cause: Throwable,
    },

    #[error("Uncategorized data access error: {message}")]
    Uncategorized {
        message: String,
        #[source]
        cause: Throwable,
    },

    #[error("Empty result: expected {expected} rows, got none")]
    EmptyResultDataAccess { expected: usize },

    #[error("Incorrect result size: expected {expected}, got {actual}")]
    IncorrectResultSize { expected: usize, actual: usize },

    #[error("Invalid data access API usage: {0}")]
    InvalidDataAccessApiUsage(String),
}

impl DataAccessError {
    pub fn category(&self) -> DataAccessCategory {
        match self {
            DataAccessError::TransientDataAccessResource { .. }
            | DataAccessError::ConcurrencyFailure { .. } => DataAccessCategory::Transient,
            DataAccessError::DataAccessResourceFailure { .. } => DataAccessCategory::Recoverable,
            _ => DataAccessCategory::NonTransient,
        }
    }

    /// 翻译前的原始错误
    pub fn original_cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            DataAccessError::DataIntegrityViolation { cause, .. }
            | DataAccessError::DuplicateKey { cause, .. }
            | DataAccessError::DataAccessResourceFailure { cause, .. }
            | DataAccessError::TransientDataAccessResource { cause, .. }
            | DataAccessError::ConcurrencyFailure { cause, .. }
            | DataAccessError::BadSqlGrammar { cause, .. }
            | DataAccessError::Uncategorized { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// 持久化模块自身的配置与装配错误
#[derive(Debug, Error)]
pub enum DaoError {
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error(transparent)]
    Aop(#[from] AopError),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

pub type DaoResult<T> = Result<T, DaoError>;
