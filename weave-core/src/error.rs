//! 统一的错误处理类型
//!
//! 框架内部的基础设施错误使用 `ContainerError`，
//! 反射调用相关的错误使用 `InvocationError`。
//! 通过 `anyhow` 包装的错误统一落在 `ContainerError::Other` 中。

use std::error::Error as StdError;
use thiserror::Error;

pub use anyhow::Result;

/// 被调用代码抛出的“异常”
///
/// 目标方法、构造器、拦截器之间传递的错误都使用这个类型，
/// 调用方可以通过 `downcast_ref` 还原具体的错误类型。
pub type Throwable = Box<dyn StdError + Send + Sync + 'static>;

/// 容器与元数据注册表错误
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Bean not found: {0}")]
    BeanNotFound(String),

    #[error("Bean already exists: {0}")]
    BeanAlreadyExists(String),

    #[error("Bean '{name}' is not of type {expected}")]
    TypeMismatch { name: String, expected: String },

    #[error("Bean post processing failed for '{name}': {reason}")]
    BeanPostProcessingFailed { name: String, reason: String },

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Class already registered: {0}")]
    ClassAlreadyRegistered(String),

    #[error("Invalid class definition '{class}': {reason}")]
    InvalidClassDefinition { class: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// 反射调用错误
///
/// 区分“找不到成员”（调用方与索引不一致）和“目标成员本身失败”两种情况，
/// 后者保留原始错误作为 source。
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("No such member {signature} on {class}")]
    NoSuchMember { class: String, signature: String },

    #[error("Invocation of {member} failed: {cause}")]
    Target {
        member: String,
        #[source]
        cause: Throwable,
    },
}

impl InvocationError {
    /// 包装目标成员抛出的错误
    pub fn target(member: impl Into<String>, cause: Throwable) -> Self {
        InvocationError::Target {
            member: member.into(),
            cause,
        }
    }

    /// 构造“找不到成员”错误
    pub fn no_such_member(class: impl Into<String>, signature: impl Into<String>) -> Self {
        InvocationError::NoSuchMember {
            class: class.into(),
            signature: signature.into(),
        }
    }

    /// 是否为目标成员抛出的错误
    pub fn is_target(&self) -> bool {
        matches!(self, InvocationError::Target { .. })
    }

    /// 获取目标成员抛出的原始错误
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            InvocationError::Target { cause, .. } => Some(cause.as_ref()),
            InvocationError::NoSuchMember { .. } => None,
        }
    }

    /// 解包为 Throwable
    ///
    /// `Target` 返回原始错误，其余情况返回自身。
    pub fn into_cause(self) -> Throwable {
        match self {
            InvocationError::Target { cause, .. } => cause,
            other => Box::new(other),
        }
    }
}

/// 参数或目标对象类型不匹配
///
/// 由 `reflect::arg` / `reflect::receiver` 等辅助函数产生，
/// 一般作为目标成员抛出的 Throwable 向上传递。
#[derive(Debug, Clone, Error)]
pub enum ArgumentError {
    #[error("Expected {expected} arguments, got {actual}")]
    Count { expected: usize, actual: usize },

    #[error("Argument {index} is not of type {expected}")]
    Type { index: usize, expected: &'static str },

    #[error("Receiver is not of type {expected}")]
    Receiver { expected: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_error_keeps_cause() {
        let cause: Throwable = Box::new(ArgumentError::Count {
            expected: 1,
            actual: 0,
        });
        let err = InvocationError::target("Person::greet()", cause);

        assert!(err.is_target());
        assert!(err.source().is_some());
        let cause = err.cause().and_then(|c| c.downcast_ref::<ArgumentError>());
        assert!(matches!(cause, Some(ArgumentError::Count { expected: 1, actual: 0 })));
    }

    #[test]
    fn test_no_such_member_into_cause() {
        let err = InvocationError::no_such_member("Person", "fly()");
        assert!(!err.is_target());
        assert!(err.cause().is_none());

        let thrown = err.into_cause();
        assert!(thrown.downcast_ref::<InvocationError>().is_some());
    }
}
