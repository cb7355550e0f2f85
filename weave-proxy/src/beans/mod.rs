//! 基于生成类的 Bean 工具
//!
//! - `ImmutableBean`：拒绝 setter 调用的只读视图
//! - `BeanCopier`：在两个类型之间按属性复制
//! - `BulkBean`：按名称列表批量读写属性

pub mod bean_copier;
pub mod bulk_bean;
pub mod immutable_bean;

pub use bean_copier::{BeanCopier, BeanCopierClass, Converter};
pub use bulk_bean::{BulkBean, BulkBeanClass};
pub use immutable_bean::ImmutableBean;

use weave_core::utils::naming::{is_setter_name, property_name};
use weave_core::reflect::VOID;
use weave_core::Method;

/// `getX()` / `isX()`：无参数、有返回值
pub(crate) fn is_getter(method: &Method) -> bool {
    !method.is_static()
        && method.parameter_types().is_empty()
        && method.return_type() != VOID
        && !is_setter_name(method.name())
        && property_name(method.name()).is_some()
}

/// `setX(value)`：一个参数
pub(crate) fn is_setter(method: &Method) -> bool {
    !method.is_static() && method.parameter_types().len() == 1 && is_setter_name(method.name())
}
