//! 按方法计算回调
//!
//! 对将被代理的每个方法调用一次 `callback_for`，把结果去重后得到回调列表，
//! 同时记录每个方法对应的索引，作为 `CallbackFilter` 使用。

use std::collections::HashMap;
use std::sync::Arc;

use weave_core::{Class, Method, Signature};

use crate::callback::{Callback, CallbackFilter};
use crate::enhancer::proxied_methods;

#[derive(Clone)]
pub struct CallbackHelper {
    callbacks: Vec<Callback>,
    assignment: Arc<HashMap<Signature, usize>>,
}

impl CallbackHelper {
    pub fn new<F>(superclass: Option<&Class>, interfaces: &[Class], callback_for: F) -> Self
    where
        F: Fn(&Method) -> Callback,
    {
        let mut callbacks: Vec<Callback> = Vec::new();
        let mut assignment = HashMap::new();

        for method in proxied_methods(superclass, interfaces) {
            let callback = callback_for(&method);
            let index = match callbacks.iter().position(|c| c.same(&callback)) {
                Some(index) => index,
                None => {
                    callbacks.push(callback);
                    callbacks.len() - 1
                }
            };
            assignment.insert(method.signature().clone(), index);
        }

        if callbacks.is_empty() {
            callbacks.push(Callback::NoOp);
        }

        tracing::debug!(
            "CallbackHelper resolved {} method(s) to {} callback(s)",
            assignment.len(),
            callbacks.len()
        );

        Self {
            callbacks,
            assignment: Arc::new(assignment),
        }
    }

    /// 去重后的回调
    pub fn callbacks(&self) -> &[Callback] {
        &self.callbacks
    }

    pub fn index_of(&self, signature: &Signature) -> Option<usize> {
        self.assignment.get(signature).copied()
    }
}

impl CallbackFilter for CallbackHelper {
    fn accept(&self, method: &Method) -> usize {
        self.index_of(method.signature()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhancer::Enhancer;
    use crate::generator::ClassGenerator;
    use weave_core::reflect::{instance, void};
    use weave_core::{ClassMeta, MethodMeta};

    fn service_class() -> Class {
        ClassMeta::builder("test.Service")
            .with_method(MethodMeta::new("getName").with_return_type("String").with_invoker(
                |_, _| Ok(instance("service".to_string())),
            ))
            .with_method(MethodMeta::new("getId").with_return_type("i64").with_invoker(
                |_, _| Ok(instance(7_i64)),
            ))
            .with_method(MethodMeta::new("run").with_invoker(|_, _| Ok(void())))
            .build()
            .unwrap()
    }

    #[test]
    fn test_deduplicates_callbacks() {
        let class = service_class();
        let fixed = Callback::fixed(instance("fixed".to_string()));

        let helper = CallbackHelper::new(Some(&class), &[], |m| {
            if m.name().starts_with("get") {
                fixed.clone()
            } else {
                Callback::NoOp
            }
        });

        assert_eq!(helper.callbacks().len(), 2);
        let get_name = helper.index_of(&Signature::new("getName", Vec::<String>::new()));
        let get_id = helper.index_of(&Signature::new("getId", Vec::<String>::new()));
        assert_eq!(get_name, get_id);
        assert_ne!(get_name, helper.index_of(&Signature::new("run", Vec::<String>::new())));
    }

    #[test]
    fn test_drives_enhancer() {
        let class = service_class();
        let fixed = Callback::fixed(instance("fixed".to_string()));
        let helper = CallbackHelper::new(Some(&class), &[], |m| {
            if m.name() == "getName" {
                fixed.clone()
            } else {
                Callback::NoOp
            }
        });

        let mut enhancer = Enhancer::with_generator(Arc::new(ClassGenerator::default()));
        enhancer
            .set_superclass(&class)
            .set_callbacks(helper.callbacks().to_vec())
            .set_callback_filter(helper.clone());
        let proxy = enhancer.create().unwrap();

        let name = proxy.call("getName", &[]).unwrap();
        assert_eq!(name.downcast_ref::<String>().map(String::as_str), Some("fixed"));
        let id = proxy.call("getId", &[]).unwrap();
        assert_eq!(id.downcast_ref::<i64>(), Some(&7));
    }
}
