//! AOP 错误

use thiserror::Error;
use weave_core::ContainerError;
use weave_proxy::ProxyError;

#[derive(Debug, Error)]
pub enum AopError {
    /// 配置错误，在构造时立即报告
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl AopError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AopError::InvalidArgument(message.into())
    }
}

pub type AopResult<T> = Result<T, AopError>;
