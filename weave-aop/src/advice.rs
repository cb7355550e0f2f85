//! 通知（Advice）定义
//!
//! 只有一种通知形态：环绕拦截器。前置/后置/异常通知都可以用它表达。

use std::fmt;
use std::sync::Arc;

use weave_core::{Instance, Throwable};

use crate::invocation::MethodInvocation;

/// 通知 Trait
pub trait Advice: Send + Sync {
    /// 获取通知名称
    fn name(&self) -> &str;
}

/// 环绕拦截器
///
/// 调用 `invocation.proceed()` 继续执行拦截器链，直至目标方法；
/// 不调用则短路，返回值直接作为方法结果。
pub trait MethodInterceptor: Advice {
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Instance, Throwable>;
}

/// 由闭包实现的拦截器
pub struct FnInterceptor<F> {
    name: String,
    f: F,
}

impl<F> Advice for FnInterceptor<F>
where
    F: Fn(&mut MethodInvocation<'_>) -> Result<Instance, Throwable> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> MethodInterceptor for FnInterceptor<F>
where
    F: Fn(&mut MethodInvocation<'_>) -> Result<Instance, Throwable> + Send + Sync,
{
    fn invoke(&self, invocation: &mut MethodInvocation<'_>) -> Result<Instance, Throwable> {
        (self.f)(invocation)
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor").field("name", &self.name).finish()
    }
}

/// 用闭包创建拦截器
///
/// ```ignore
/// let timing = interceptor("timing", |invocation| {
///     let start = Instant::now();
///     let result = invocation.proceed();
///     tracing::info!("{} took {:?}", invocation.method(), start.elapsed());
///     result
/// });
/// ```
pub fn interceptor<F>(name: impl Into<String>, f: F) -> Arc<dyn MethodInterceptor>
where
    F: Fn(&mut MethodInvocation<'_>) -> Result<Instance, Throwable> + Send + Sync + 'static,
{
    Arc::new(FnInterceptor {
        name: name.into(),
        f,
    })
}
