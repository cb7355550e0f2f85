//! Advisor：通知 + 适用条件

use std::fmt;
use std::sync::Arc;

use crate::advice::MethodInterceptor;
use crate::pointcut::{Pointcut, TruePointcut};

pub trait Advisor: Send + Sync {
    fn advice(&self) -> Arc<dyn MethodInterceptor>;

    /// 通知是否按实例持有状态
    fn is_per_instance(&self) -> bool {
        true
    }

    /// 顺序，数值越小越靠外层
    fn order(&self) -> i32 {
        0
    }
}

/// 由切点决定适用范围的 Advisor
pub trait PointcutAdvisor: Advisor {
    fn pointcut(&self) -> &dyn Pointcut;
}

#[derive(Clone)]
pub struct DefaultPointcutAdvisor {
    pointcut: Arc<dyn Pointcut>,
    advice: Arc<dyn MethodInterceptor>,
    order: i32,
}

impl DefaultPointcutAdvisor {
    /// 适用于所有方法
    pub fn new(advice: Arc<dyn MethodInterceptor>) -> Self {
        Self::with_pointcut(Arc::new(TruePointcut), advice)
    }

    pub fn with_pointcut(pointcut: Arc<dyn Pointcut>, advice: Arc<dyn MethodInterceptor>) -> Self {
        Self {
            pointcut,
            advice,
            order: 0,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

impl Advisor for DefaultPointcutAdvisor {
    fn advice(&self) -> Arc<dyn MethodInterceptor> {
        Arc::clone(&self.advice)
    }

    fn order(&self) -> i32 {
        self.order
    }
}

impl PointcutAdvisor for DefaultPointcutAdvisor {
    fn pointcut(&self) -> &dyn Pointcut {
        self.pointcut.as_ref()
    }
}

impl fmt::Debug for DefaultPointcutAdvisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultPointcutAdvisor")
            .field("advice", &self.advice.name())
            .field("order", &self.order)
            .finish()
    }
}
