//! FastClass：按索引调用
//!
//! 为一个类型的所有公共方法和构造器分配稠密的整数索引。
//! 按签名查找只在解析时发生一次，之后的调用直接按索引分派。
//! 索引在 FastClass 的生命周期内不变，同一签名总是得到同一个索引。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use weave_core::reflect::class_utils::all_public_methods;
use weave_core::{Class, Constructor, Instance, InvocationError, Method, Signature};

use crate::error::ProxyResult;
use crate::generator::{get_global_class_generator, ClassGenerator};
use crate::naming::generated_class_name;

pub struct FastClass {
    class: Class,
    name: String,
    methods: Vec<Method>,
    method_index: HashMap<Signature, usize>,
    constructors: Vec<Constructor>,
    constructor_index: HashMap<Vec<String>, usize>,
}

impl FastClass {
    /// 获取（必要时生成）类型的 FastClass，使用全局生成器
    pub fn create(class: &Class) -> ProxyResult<Arc<FastClass>> {
        Self::create_with(get_global_class_generator(), class)
    }

    /// 使用指定的生成器
    pub fn create_with(generator: &ClassGenerator, class: &Class) -> ProxyResult<Arc<FastClass>> {
        generator.generate(
            generator.fast_class_cache(),
            &class.id(),
            generator.settings().cache_enabled,
            || Ok(Self::generate(class)),
        )
    }

    fn generate(class: &Class) -> FastClass {
        let methods: Vec<Method> = all_public_methods(class)
            .into_iter()
            .filter(|m| m.is_public())
            .collect();
        let method_index = methods
            .iter()
            .enumerate()
            .map(|(i, m)| (m.signature().clone(), i))
            .collect();

        let constructors: Vec<Constructor> = class
            .declared_constructors()
            .iter()
            .filter(|c| c.is_public())
            .cloned()
            .collect();
        let constructor_index = constructors
            .iter()
            .enumerate()
            .map(|(i, c)| (c.parameter_types().to_vec(), i))
            .collect();

        let name = generated_class_name(class.name(), "FastClass", &class.id().to_string());
        tracing::info!(
            "Generated {} ({} methods, {} constructors)",
            name,
            methods.len(),
            constructors.len()
        );

        FastClass {
            class: Arc::clone(class),
            name,
            methods,
            method_index,
            constructors,
            constructor_index,
        }
    }

    /// 被索引的类型
    pub fn class(&self) -> &Class {
        &self.class
    }

    /// 生成的类名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 按签名查找方法索引
    pub fn get_index(&self, signature: &Signature) -> Option<usize> {
        self.method_index.get(signature).copied()
    }

    /// 按名称和参数类型查找方法索引
    pub fn get_index_by_name(&self, name: &str, parameter_types: &[&str]) -> Option<usize> {
        self.get_index(&Signature::new(name, parameter_types.iter().copied()))
    }

    /// 按参数类型查找构造器索引
    pub fn get_constructor_index(&self, parameter_types: &[String]) -> Option<usize> {
        self.constructor_index.get(parameter_types).copied()
    }

    pub fn method(&self, index: usize) -> Option<&Method> {
        self.methods.get(index)
    }

    pub fn constructor(&self, index: usize) -> Option<&Constructor> {
        self.constructors.get(index)
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }

    /// 按索引调用方法
    pub fn invoke(
        &self,
        index: usize,
        target: &Instance,
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        let method = self.methods.get(index).ok_or_else(|| {
            InvocationError::no_such_member(self.class.name(), format!("method #{index}"))
        })?;

        method
            .invoke(target, args)
            .map_err(|cause| InvocationError::target(method.to_string(), cause))
    }

    /// 按索引调用构造器
    pub fn new_instance(
        &self,
        index: usize,
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        let constructor = self.constructors.get(index).ok_or_else(|| {
            InvocationError::no_such_member(self.class.name(), format!("constructor #{index}"))
        })?;

        constructor
            .new_instance(args)
            .map_err(|cause| InvocationError::target(constructor.to_string(), cause))
    }

    /// 按签名调用，找不到时返回 `NoSuchMember`
    pub fn invoke_by_signature(
        &self,
        signature: &Signature,
        target: &Instance,
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        let index = self.get_index(signature).ok_or_else(|| {
            InvocationError::no_such_member(self.class.name(), signature.to_string())
        })?;
        self.invoke(index, target, args)
    }
}

impl fmt::Debug for FastClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastClass")
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::reflect::{arg, instance, receiver};
    use weave_core::{ClassMeta, ConstructorMeta, MethodMeta};

    struct Counter {
        start: i64,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("negative step")]
    struct NegativeStep;

    fn counter_class() -> Class {
        let base = ClassMeta::abstract_class("test.Base")
            .with_method(
                MethodMeta::new("describe")
                    .with_return_type("String")
                    .with_invoker(|_, _| Ok(instance("base".to_string()))),
            )
            .build()
            .unwrap();

        ClassMeta::builder("test.Counter")
            .with_superclass(base)
            .with_method(
                MethodMeta::new("add")
                    .with_params(["i64"])
                    .with_return_type("i64")
                    .with_invoker(|target, args| {
                        let counter = receiver::<Counter>(target)?;
                        let step = arg::<i64>(args, 0)?;
                        if step < 0 {
                            return Err(Box::new(NegativeStep));
                        }
                        Ok(instance(counter.start + step))
                    }),
            )
            .with_method(MethodMeta::new("hidden").with_public(false))
            .with_constructor(ConstructorMeta::new(["i64"], |args| {
                Ok(instance(Counter {
                    start: arg::<i64>(args, 0)?,
                }))
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_indexes_public_members() {
        let generator = ClassGenerator::default();
        let fast = FastClass::create_with(&generator, &counter_class()).unwrap();

        assert_eq!(fast.method_count(), 2);
        assert!(fast.get_index_by_name("add", &["i64"]).is_some());
        assert!(fast.get_index_by_name("describe", &[]).is_some());
        assert!(fast.get_index_by_name("hidden", &[]).is_none());
        assert_eq!(fast.get_constructor_index(&["i64".to_string()]), Some(0));
        assert!(fast.name().starts_with("test.Counter$$FastClassByWeave$$"));
    }

    #[test]
    fn test_index_is_stable_and_cached() {
        let generator = ClassGenerator::default();
        let class = counter_class();
        let a = FastClass::create_with(&generator, &class).unwrap();
        let b = FastClass::create_with(&generator, &class).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            a.get_index_by_name("add", &["i64"]),
            b.get_index_by_name("add", &["i64"])
        );
        assert_eq!(generator.fast_class_cache().generation_count(), 1);
    }

    #[test]
    fn test_invoke_by_index() {
        let generator = ClassGenerator::default();
        let fast = FastClass::create_with(&generator, &counter_class()).unwrap();

        let ctor = fast.get_constructor_index(&["i64".to_string()]).unwrap();
        let counter = fast.new_instance(ctor, &[instance(10_i64)]).unwrap();

        let add = fast.get_index_by_name("add", &["i64"]).unwrap();
        let result = fast.invoke(add, &counter, &[instance(5_i64)]).unwrap();
        assert_eq!(result.downcast_ref::<i64>(), Some(&15));

        let describe = fast.get_index_by_name("describe", &[]).unwrap();
        let result = fast.invoke(describe, &counter, &[]).unwrap();
        assert_eq!(result.downcast_ref::<String>().map(String::as_str), Some("base"));
    }

    #[test]
    fn test_target_failure_is_distinguished_from_resolution() {
        let generator = ClassGenerator::default();
        let fast = FastClass::create_with(&generator, &counter_class()).unwrap();
        let counter = instance(Counter { start: 0 });

        let add = fast.get_index_by_name("add", &["i64"]).unwrap();
        let err = fast.invoke(add, &counter, &[instance(-1_i64)]).unwrap_err();
        assert!(err.is_target());
        assert!(err.cause().and_then(|c| c.downcast_ref::<NegativeStep>()).is_some());

        let err = fast.invoke(99, &counter, &[]).unwrap_err();
        assert!(matches!(err, InvocationError::NoSuchMember { .. }));
    }
}
