//! BeanPostProcessor - Bean 注册扩展机制
//!
//! 在 Bean 注册到工厂前后提供钩子，允许替换 Bean 实例（例如包装为代理）

use crate::error::ContainerResult;
use crate::reflect::{Class, Instance};

/// BeanPostProcessor trait
///
/// # 示例
///
/// ```ignore
/// impl BeanPostProcessor for LoggingBeanPostProcessor {
///     fn post_process_after_initialization(
///         &self,
///         bean: Instance,
///         bean_name: &str,
///         bean_class: Option<&Class>,
///     ) -> ContainerResult<Instance> {
///         tracing::info!("After initialization: {}", bean_name);
///         Ok(bean)
///     }
/// }
/// ```
pub trait BeanPostProcessor: Send + Sync {
    /// 处理器名称（用于日志）
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 执行顺序，数字越小越先执行
    fn order(&self) -> i32 {
        0
    }

    /// 初始化前回调
    fn post_process_before_initialization(
        &self,
        bean: Instance,
        _bean_name: &str,
        _bean_class: Option<&Class>,
    ) -> ContainerResult<Instance> {
        Ok(bean)
    }

    /// 初始化后回调
    fn post_process_after_initialization(
        &self,
        bean: Instance,
        _bean_name: &str,
        _bean_class: Option<&Class>,
    ) -> ContainerResult<Instance> {
        Ok(bean)
    }
}
