//! BulkBean：按名称列表批量读写属性
//!
//! 三个列表按位置对应：getter 名、setter 名、属性类型。
//! 空字符串表示该位置没有对应的 getter 或 setter。

use std::fmt;
use std::sync::Arc;

use weave_core::reflect::class_utils::find_method;
use weave_core::{Class, Instance, Signature};

use crate::error::{ProxyError, ProxyResult};
use crate::fast_class::FastClass;
use crate::fast_member::FastMethod;
use crate::generator::{get_global_class_generator, ClassGenerator};

pub struct BulkBeanClass {
    class: Class,
    getters: Vec<Option<FastMethod>>,
    setters: Vec<Option<FastMethod>>,
    types: Vec<String>,
}

impl BulkBeanClass {
    fn generate(
        generator: &ClassGenerator,
        class: &Class,
        getters: &[String],
        setters: &[String],
        types: &[String],
    ) -> ProxyResult<Self> {
        if getters.len() != types.len() || setters.len() != types.len() {
            return Err(ProxyError::invalid_argument(format!(
                "accessor lists must have the same length (getters: {}, setters: {}, types: {})",
                getters.len(),
                setters.len(),
                types.len()
            )));
        }

        let fast_class = FastClass::create_with(generator, class)?;
        let resolve = |signature: Signature, expected: Option<&str>| -> ProxyResult<FastMethod> {
            let method = find_method(class, &signature).ok_or_else(|| {
                ProxyError::invalid_argument(format!(
                    "no such accessor {} on {}",
                    signature,
                    class.name()
                ))
            })?;
            if let Some(expected) = expected {
                if method.return_type() != expected {
                    return Err(ProxyError::invalid_argument(format!(
                        "declared type mismatch for {}: expected {}, found {}",
                        method,
                        expected,
                        method.return_type()
                    )));
                }
            }
            FastMethod::new(Arc::clone(&fast_class), method)
        };

        let mut resolved_getters = Vec::with_capacity(types.len());
        let mut resolved_setters = Vec::with_capacity(types.len());
        for ((getter, setter), ty) in getters.iter().zip(setters).zip(types) {
            resolved_getters.push(if getter.is_empty() {
                None
            } else {
                Some(resolve(
                    Signature::new(getter.as_str(), Vec::<String>::new()),
                    Some(ty.as_str()),
                )?)
            });
            resolved_setters.push(if setter.is_empty() {
                None
            } else {
                Some(resolve(Signature::new(setter.as_str(), [ty.as_str()]), None)?)
            });
        }

        tracing::info!(
            "Generated BulkBean for {} ({} properties)",
            class.name(),
            types.len()
        );

        Ok(Self {
            class: Arc::clone(class),
            getters: resolved_getters,
            setters: resolved_setters,
            types: types.to_vec(),
        })
    }

    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn property_types(&self) -> &[String] {
        &self.types
    }
}

impl fmt::Debug for BulkBeanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkBeanClass")
            .field("class", &self.class.name())
            .field("types", &self.types)
            .finish()
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[derive(Clone, Debug)]
pub struct BulkBean {
    class: Arc<BulkBeanClass>,
}

impl BulkBean {
    pub fn create(
        class: &Class,
        getters: &[&str],
        setters: &[&str],
        types: &[&str],
    ) -> ProxyResult<Self> {
        Self::create_with(get_global_class_generator(), class, getters, setters, types)
    }

    pub fn create_with(
        generator: &ClassGenerator,
        class: &Class,
        getters: &[&str],
        setters: &[&str],
        types: &[&str],
    ) -> ProxyResult<Self> {
        let key = (class.id(), owned(getters), owned(setters), owned(types));

        let bulk = generator.generate(
            generator.bulk_bean_cache(),
            &key,
            generator.settings().cache_enabled,
            || BulkBeanClass::generate(generator, class, &key.1, &key.2, &key.3),
        )?;
        Ok(Self { class: bulk })
    }

    pub fn generated_class(&self) -> &Arc<BulkBeanClass> {
        &self.class
    }

    /// 读取所有属性，没有 getter 的位置为 `None`
    pub fn get_property_values(&self, bean: &Instance) -> ProxyResult<Vec<Option<Instance>>> {
        let mut values = Vec::with_capacity(self.class.getters.len());
        for getter in &self.class.getters {
            values.push(match getter {
                Some(getter) => Some(getter.invoke(bean, &[])?),
                None => None,
            });
        }
        Ok(values)
    }

    /// 写入所有属性，没有 setter 的位置被忽略
    pub fn set_property_values(&self, bean: &Instance, values: &[Instance]) -> ProxyResult<()> {
        if values.len() != self.class.setters.len() {
            return Err(ProxyError::invalid_argument(format!(
                "expected {} values, got {}",
                self.class.setters.len(),
                values.len()
            )));
        }

        for (setter, value) in self.class.setters.iter().zip(values) {
            if let Some(setter) = setter {
                setter.invoke(bean, &[Arc::clone(value)])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use weave_core::reflect::{arg, instance, receiver, void};
    use weave_core::{ClassMeta, MethodMeta};

    #[derive(Default)]
    struct Item {
        title: Mutex<String>,
        stock: Mutex<i64>,
    }

    fn item_class() -> Class {
        ClassMeta::builder("test.Item")
            .with_method(
                MethodMeta::new("getTitle")
                    .with_return_type("String")
                    .with_invoker(|t, _| Ok(instance(receiver::<Item>(t)?.title.lock().clone()))),
            )
            .with_method(
                MethodMeta::new("setTitle")
                    .with_params(["String"])
                    .with_invoker(|t, args| {
                        *receiver::<Item>(t)?.title.lock() = arg::<String>(args, 0)?;
                        Ok(void())
                    }),
            )
            .with_method(
                MethodMeta::new("getStock")
                    .with_return_type("i64")
                    .with_invoker(|t, _| Ok(instance(*receiver::<Item>(t)?.stock.lock()))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_bulk_read_and_write() {
        let generator = ClassGenerator::default();
        let bulk = BulkBean::create_with(
            &generator,
            &item_class(),
            &["getTitle", "getStock"],
            &["setTitle", ""],
            &["String", "i64"],
        )
        .unwrap();

        let item = instance(Item::default());
        bulk.set_property_values(&item, &[instance("lamp".to_string()), instance(3_i64)])
            .unwrap();

        let values = bulk.get_property_values(&item).unwrap();
        assert_eq!(
            values[0].as_ref().and_then(|v| v.downcast_ref::<String>()).map(String::as_str),
            Some("lamp")
        );
        assert_eq!(values[1].as_ref().and_then(|v| v.downcast_ref::<i64>()), Some(&0));
    }

    #[test]
    fn test_validation_at_creation() {
        let generator = ClassGenerator::default();
        let class = item_class();

        let mismatch =
            BulkBean::create_with(&generator, &class, &["getTitle"], &[""], &["i64"]).unwrap_err();
        assert!(mismatch.to_string().contains("declared type mismatch"));

        let missing =
            BulkBean::create_with(&generator, &class, &[""], &["setStock"], &["i64"]).unwrap_err();
        assert!(missing.to_string().contains("no such accessor"));

        let lengths = BulkBean::create_with(&generator, &class, &["getTitle"], &[], &["String"]);
        assert!(lengths.is_err());

        assert_eq!(generator.bulk_bean_cache().generation_count(), 0);
    }

    #[test]
    fn test_value_count_checked() {
        let generator = ClassGenerator::default();
        let bulk = BulkBean::create_with(
            &generator,
            &item_class(),
            &["getTitle"],
            &["setTitle"],
            &["String"],
        )
        .unwrap();
        let item = instance(Item::default());
        assert!(matches!(
            bulk.set_property_values(&item, &[]),
            Err(ProxyError::InvalidArgument(_))
        ));
    }
}
