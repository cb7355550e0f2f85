//! Weave AOP - 注解驱动的切点与代理
//!
//! 提供类似 Spring AOP 的匹配与织入能力：
//! - 类型过滤器、方法匹配器、切点，支持注解/元注解/继承查找
//! - 可组合切点（并、交）
//! - Advisor + 环绕拦截器链
//! - 基于 `weave-proxy` 运行时代理类的 ProxyFactory

pub mod advice;
pub mod advisor;
pub mod aop_utils;
pub mod class_filter;
pub mod error;
pub mod invocation;
pub mod method_matcher;
pub mod pointcut;
pub mod proxy_factory;

// 重新导出核心类型
pub use advice::{interceptor, Advice, FnInterceptor, MethodInterceptor};
pub use advisor::{Advisor, DefaultPointcutAdvisor, PointcutAdvisor};
pub use aop_utils::{can_apply, find_advisors_that_can_apply};
pub use class_filter::{
    AnnotationClassFilter, ClassFilter, IntersectionClassFilter, TrueClassFilter,
    UnionClassFilter,
};
pub use error::{AopError, AopResult};
pub use invocation::{ChainEntry, MethodInvocation};
pub use method_matcher::{
    AnnotationMethodMatcher, IntersectionMethodMatcher, MethodMatcher, NameMatchMethodMatcher,
    TrueMethodMatcher, UnionMethodMatcher,
};
pub use pointcut::{
    AnnotationMatchingPointcut, ComposablePointcut, NameMatchMethodPointcut, Pointcut,
    TruePointcut,
};
pub use proxy_factory::{AopProxy, ProxyFactory};

/// 预导入模块
pub mod prelude {
    pub use crate::advice::*;
    pub use crate::advisor::{Advisor, DefaultPointcutAdvisor, PointcutAdvisor};
    pub use crate::class_filter::{AnnotationClassFilter, ClassFilter};
    pub use crate::error::{AopError, AopResult};
    pub use crate::invocation::MethodInvocation;
    pub use crate::method_matcher::{AnnotationMethodMatcher, MethodMatcher};
    pub use crate::pointcut::{AnnotationMatchingPointcut, ComposablePointcut, Pointcut};
    pub use crate::proxy_factory::{AopProxy, ProxyFactory};
}
