//! 代理生成错误

use thiserror::Error;
use weave_core::{ContainerError, InvocationError};

#[derive(Debug, Error)]
pub enum ProxyError {
    /// 配置错误，在创建时立即报告
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// FastClass 索引中找不到成员，说明调用方与索引不一致
    #[error("Cannot find {member} in {class} (parameter types: [{parameter_types}])")]
    MemberNotIndexed {
        class: String,
        member: String,
        parameter_types: String,
    },

    #[error("Callback index {index} is out of range for {class} ({count} callback(s))")]
    CallbackIndexOutOfRange {
        class: String,
        index: usize,
        count: usize,
    },

    #[error("Bean is immutable: cannot invoke {0}")]
    ImmutableBean(String),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl ProxyError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ProxyError::InvalidArgument(message.into())
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;
