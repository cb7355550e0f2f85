//! 只读 Bean 视图

use std::sync::Arc;

use weave_core::{Class, Instance, Method};

use crate::beans::is_setter;
use crate::callback::Callback;
use crate::enhancer::{EnhancedObject, Enhancer};
use crate::error::{ProxyError, ProxyResult};
use crate::generator::{get_global_class_generator, ClassGenerator};

/// 包装一个 Bean，setter 调用返回 `ProxyError::ImmutableBean`，其它方法直接委托
pub struct ImmutableBean;

impl ImmutableBean {
    pub fn create(bean: Instance, class: &Class) -> ProxyResult<EnhancedObject> {
        Self::create_with(Arc::clone(get_global_class_generator()), bean, class)
    }

    pub fn create_with(
        generator: Arc<ClassGenerator>,
        bean: Instance,
        class: &Class,
    ) -> ProxyResult<EnhancedObject> {
        let mut enhancer = Enhancer::with_generator(generator);
        enhancer
            .set_superclass(class)
            .set_callbacks(vec![
                Callback::NoOp,
                Callback::interceptor(|_, method, _, _| {
                    Err(Box::new(ProxyError::ImmutableBean(method.to_string())))
                }),
            ])
            .set_callback_filter(|method: &Method| usize::from(is_setter(method)));
        enhancer.create_with_target(bean)
    }
}
