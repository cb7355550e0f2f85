//! 增强类的回调
//!
//! 生成类的每个方法都分派到一个回调：
//! - `NoOp`：直接调用父类实现
//! - `FixedValue`：忽略参数，返回固定值
//! - `MethodInterceptor`：拦截调用，可以通过 `MethodProxy` 继续调用父类实现
//! - `Dispatcher`：每次调用时加载一个委托对象，在它上面调用同签名方法

use std::fmt;
use std::sync::Arc;

use weave_core::{Instance, Method, Throwable};

use crate::enhancer::{EnhancedObject, MethodProxy};

/// 返回固定值的回调
pub trait FixedValue: Send + Sync {
    fn load_object(&self) -> Result<Instance, Throwable>;
}

/// 方法拦截回调
pub trait MethodInterceptor: Send + Sync {
    fn intercept(
        &self,
        obj: &EnhancedObject,
        method: &Method,
        args: &[Instance],
        proxy: &MethodProxy,
    ) -> Result<Instance, Throwable>;
}

/// 延迟加载委托对象的回调，每次调用都会重新加载
pub trait Dispatcher: Send + Sync {
    fn load_object(&self) -> Result<Instance, Throwable>;
}

struct FnFixedValue<F>(F);

impl<F> FixedValue for FnFixedValue<F>
where
    F: Fn() -> Result<Instance, Throwable> + Send + Sync,
{
    fn load_object(&self) -> Result<Instance, Throwable> {
        (self.0)()
    }
}

struct FnDispatcher<F>(F);

impl<F> Dispatcher for FnDispatcher<F>
where
    F: Fn() -> Result<Instance, Throwable> + Send + Sync,
{
    fn load_object(&self) -> Result<Instance, Throwable> {
        (self.0)()
    }
}

impl<F> MethodInterceptor for F
where
    F: Fn(&EnhancedObject, &Method, &[Instance], &MethodProxy) -> Result<Instance, Throwable>
        + Send
        + Sync,
{
    fn intercept(
        &self,
        obj: &EnhancedObject,
        method: &Method,
        args: &[Instance],
        proxy: &MethodProxy,
    ) -> Result<Instance, Throwable> {
        self(obj, method, args, proxy)
    }
}

/// 回调种类，参与生成类的缓存键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    NoOp,
    FixedValue,
    MethodInterceptor,
    Dispatcher,
}

#[derive(Clone)]
pub enum Callback {
    NoOp,
    FixedValue(Arc<dyn FixedValue>),
    MethodInterceptor(Arc<dyn MethodInterceptor>),
    Dispatcher(Arc<dyn Dispatcher>),
}

impl Callback {
    /// 每次调用都返回同一个值
    pub fn fixed(value: Instance) -> Self {
        Self::fixed_value(move || Ok(Arc::clone(&value)))
    }

    pub fn fixed_value<F>(load: F) -> Self
    where
        F: Fn() -> Result<Instance, Throwable> + Send + Sync + 'static,
    {
        Callback::FixedValue(Arc::new(FnFixedValue(load)))
    }

    pub fn interceptor<F>(intercept: F) -> Self
    where
        F: Fn(&EnhancedObject, &Method, &[Instance], &MethodProxy) -> Result<Instance, Throwable>
            + Send
            + Sync
            + 'static,
    {
        Callback::MethodInterceptor(Arc::new(intercept))
    }

    pub fn dispatcher<F>(load: F) -> Self
    where
        F: Fn() -> Result<Instance, Throwable> + Send + Sync + 'static,
    {
        Callback::Dispatcher(Arc::new(FnDispatcher(load)))
    }

    pub fn kind(&self) -> CallbackKind {
        match self {
            Callback::NoOp => CallbackKind::NoOp,
            Callback::FixedValue(_) => CallbackKind::FixedValue,
            Callback::MethodInterceptor(_) => CallbackKind::MethodInterceptor,
            Callback::Dispatcher(_) => CallbackKind::Dispatcher,
        }
    }

    /// 是否为同一个回调对象
    pub fn same(&self, other: &Callback) -> bool {
        match (self, other) {
            (Callback::NoOp, Callback::NoOp) => true,
            (Callback::FixedValue(a), Callback::FixedValue(b)) => Arc::ptr_eq(a, b),
            (Callback::MethodInterceptor(a), Callback::MethodInterceptor(b)) => Arc::ptr_eq(a, b),
            (Callback::Dispatcher(a), Callback::Dispatcher(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback::{:?}", self.kind())
    }
}

/// 为每个方法选择回调的索引
pub trait CallbackFilter: Send + Sync {
    fn accept(&self, method: &Method) -> usize;
}

impl<F> CallbackFilter for F
where
    F: Fn(&Method) -> usize + Send + Sync,
{
    fn accept(&self, method: &Method) -> usize {
        self(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::reflect::instance;

    #[test]
    fn test_callback_identity() {
        let noop = Callback::NoOp;
        assert!(noop.same(&Callback::NoOp));

        let fixed = Callback::fixed(instance(1_u8));
        let copy = fixed.clone();
        assert!(fixed.same(&copy));
        assert!(!fixed.same(&Callback::fixed(instance(1_u8))));
        assert_eq!(fixed.kind(), CallbackKind::FixedValue);
    }

    #[test]
    fn test_fixed_value_loads() {
        let Callback::FixedValue(fixed) = Callback::fixed(instance("v".to_string())) else {
            panic!("expected fixed value");
        };
        let value = fixed.load_object().unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("v"));
    }
}
