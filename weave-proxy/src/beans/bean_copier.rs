//! BeanCopier
//!
//! 按属性名把源对象的 getter 结果写入目标对象的 setter。
//! 不使用转换器时只复制类型一致的属性；使用转换器时所有同名属性都会复制，
//! 值先交给转换器处理。

use std::fmt;
use std::sync::Arc;

use weave_core::reflect::class_utils::all_public_methods;
use weave_core::utils::naming::property_name;
use weave_core::{Class, Instance, InvocationError, Throwable};

use crate::beans::{is_getter, is_setter};
use crate::error::{ProxyError, ProxyResult};
use crate::fast_class::FastClass;
use crate::fast_member::FastMethod;
use crate::generator::{get_global_class_generator, ClassGenerator};

/// 属性值转换器
pub trait Converter: Send + Sync {
    /// `target_type` 是 setter 的参数类型
    fn convert(
        &self,
        value: Instance,
        target_type: &str,
        setter: &str,
    ) -> Result<Instance, Throwable>;
}

impl<F> Converter for F
where
    F: Fn(Instance, &str, &str) -> Result<Instance, Throwable> + Send + Sync,
{
    fn convert(
        &self,
        value: Instance,
        target_type: &str,
        setter: &str,
    ) -> Result<Instance, Throwable> {
        self(value, target_type, setter)
    }
}

struct PropertyCopy {
    property: String,
    getter: FastMethod,
    setter: FastMethod,
}

/// 生成的复制器
pub struct BeanCopierClass {
    source: Class,
    target: Class,
    use_converter: bool,
    properties: Vec<PropertyCopy>,
}

impl BeanCopierClass {
    fn generate(
        generator: &ClassGenerator,
        source: &Class,
        target: &Class,
        use_converter: bool,
    ) -> ProxyResult<Self> {
        let source_fast = FastClass::create_with(generator, source)?;
        let target_fast = FastClass::create_with(generator, target)?;

        let getters: Vec<_> = all_public_methods(source)
            .into_iter()
            .filter(is_getter)
            .collect();

        let mut properties = Vec::new();
        for setter in all_public_methods(target).into_iter().filter(is_setter) {
            let Some(property) = property_name(setter.name()) else {
                continue;
            };
            let Some(getter) = getters
                .iter()
                .find(|g| property_name(g.name()).as_deref() == Some(property.as_str()))
            else {
                continue;
            };

            if !use_converter && getter.return_type() != setter.parameter_types()[0] {
                tracing::trace!(
                    "Skipping property {}: {} != {}",
                    property,
                    getter.return_type(),
                    setter.parameter_types()[0]
                );
                continue;
            }

            properties.push(PropertyCopy {
                property,
                getter: FastMethod::new(Arc::clone(&source_fast), Arc::clone(getter))?,
                setter: FastMethod::new(Arc::clone(&target_fast), setter)?,
            });
        }

        tracing::info!(
            "Generated BeanCopier {} -> {} ({} properties)",
            source.name(),
            target.name(),
            properties.len()
        );

        Ok(Self {
            source: Arc::clone(source),
            target: Arc::clone(target),
            use_converter,
            properties,
        })
    }

    /// 会被复制的属性名
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(|p| p.property.as_str()).collect()
    }
}

impl fmt::Debug for BeanCopierClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanCopierClass")
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .field("use_converter", &self.use_converter)
            .field("properties", &self.property_names())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct BeanCopier {
    class: Arc<BeanCopierClass>,
}

impl BeanCopier {
    pub fn create(source: &Class, target: &Class, use_converter: bool) -> ProxyResult<Self> {
        Self::create_with(get_global_class_generator(), source, target, use_converter)
    }

    pub fn create_with(
        generator: &ClassGenerator,
        source: &Class,
        target: &Class,
        use_converter: bool,
    ) -> ProxyResult<Self> {
        let key = (source.id(), target.id(), use_converter);
        let class = generator.generate(
            generator.bean_copier_cache(),
            &key,
            generator.settings().cache_enabled,
            || BeanCopierClass::generate(generator, source, target, use_converter),
        )?;
        Ok(Self { class })
    }

    pub fn generated_class(&self) -> &Arc<BeanCopierClass> {
        &self.class
    }

    /// 复制属性
    ///
    /// 以 `use_converter = true` 创建的复制器必须传入转换器。
    pub fn copy(
        &self,
        from: &Instance,
        to: &Instance,
        converter: Option<&dyn Converter>,
    ) -> ProxyResult<()> {
        if self.class.use_converter && converter.is_none() {
            return Err(ProxyError::invalid_argument(format!(
                "BeanCopier {} -> {} requires a converter",
                self.class.source.name(),
                self.class.target.name()
            )));
        }

        for property in &self.class.properties {
            let mut value = property.getter.invoke(from, &[])?;

            if let Some(converter) = converter.filter(|_| self.class.use_converter) {
                let setter = property.setter.method();
                value = converter
                    .convert(value, &setter.parameter_types()[0], setter.name())
                    .map_err(|cause| InvocationError::target(setter.to_string(), cause))?;
            }

            property.setter.invoke(to, &[value])?;
        }
        Ok(())
    }
}
