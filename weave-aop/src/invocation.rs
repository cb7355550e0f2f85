//! 方法调用（连接点）
//!
//! 一次代理方法调用的上下文，按顺序驱动拦截器链，链走完后调用目标方法。

use std::fmt;
use std::sync::Arc;

use weave_core::{Class, Instance, Method, Throwable};
use weave_proxy::{EnhancedObject, MethodProxy};

use crate::advice::MethodInterceptor;
use crate::advisor::PointcutAdvisor;

/// 拦截器链中的一项
#[derive(Clone)]
pub enum ChainEntry {
    /// 静态匹配已通过，总是执行
    Static(Arc<dyn MethodInterceptor>),

    /// 需要在每次调用时结合参数再匹配一次
    Dynamic {
        advisor: Arc<dyn PointcutAdvisor>,
        interceptor: Arc<dyn MethodInterceptor>,
    },
}

impl fmt::Debug for ChainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainEntry::Static(i) => write!(f, "Static({})", i.name()),
            ChainEntry::Dynamic { interceptor, .. } => write!(f, "Dynamic({})", interceptor.name()),
        }
    }
}

pub struct MethodInvocation<'a> {
    proxy: &'a EnhancedObject,
    method: &'a Method,
    arguments: Vec<Instance>,
    target_class: &'a Class,
    chain: &'a [ChainEntry],
    index: usize,
    method_proxy: &'a MethodProxy,
}

impl<'a> MethodInvocation<'a> {
    pub(crate) fn new(
        proxy: &'a EnhancedObject,
        method: &'a Method,
        arguments: Vec<Instance>,
        target_class: &'a Class,
        chain: &'a [ChainEntry],
        method_proxy: &'a MethodProxy,
    ) -> Self {
        Self {
            proxy,
            method,
            arguments,
            target_class,
            chain,
            index: 0,
            method_proxy,
        }
    }

    /// 执行链中的下一个拦截器，链结束时调用目标方法
    pub fn proceed(&mut self) -> Result<Instance, Throwable> {
        let chain = self.chain;
        while let Some(entry) = chain.get(self.index) {
            self.index += 1;
            match entry {
                ChainEntry::Static(interceptor) => return interceptor.invoke(self),
                ChainEntry::Dynamic {
                    advisor,
                    interceptor,
                } => {
                    let matched = advisor.pointcut().method_matcher().matches_with_args(
                        self.method,
                        self.target_class,
                        &self.arguments,
                    );
                    if matched {
                        return interceptor.invoke(self);
                    }
                    tracing::trace!(
                        "Skipping {} for {}: runtime match failed",
                        interceptor.name(),
                        self.method
                    );
                }
            }
        }

        self.method_proxy.invoke(self.proxy.target(), &self.arguments)
    }

    pub fn arguments(&self) -> &[Instance] {
        &self.arguments
    }

    /// 替换参数，之后的拦截器和目标方法看到新参数
    pub fn set_arguments(&mut self, arguments: Vec<Instance>) {
        self.arguments = arguments;
    }

    /// 代理对象
    pub fn this(&self) -> &EnhancedObject {
        self.proxy
    }

    /// 目标对象
    pub fn target(&self) -> &Instance {
        self.proxy.target()
    }

    pub fn method(&self) -> &Method {
        self.method
    }

    pub fn target_class(&self) -> &Class {
        self.target_class
    }
}

impl fmt::Debug for MethodInvocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("method", &self.method.to_string())
            .field("target_class", &self.target_class.name())
            .field("index", &self.index)
            .field("chain", &self.chain)
            .finish()
    }
}

impl fmt::Display for MethodInvocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.target_class.name(), self.method.signature())
    }
}
