//! 构造器委托
//!
//! 给定目标类和只有一个方法的工厂接口，生成一个实现该接口的类，
//! 其唯一的方法调用目标类参数类型完全一致的构造器并返回新实例。
//!
//! ```ignore
//! // interface PersonFactory { Person make_person(String); }
//! let delegate = ConstructorDelegate::create(&person, &person_factory)?;
//! let bob = delegate.new_instance(&[instance("bob".to_string())])?;
//! ```

use std::fmt;
use std::sync::Arc;

use weave_core::reflect::class_utils::{all_public_methods, is_assignable_to_name};
use weave_core::{
    Class, ClassMeta, Constructor, Instance, InvocationError, Method, MethodMeta, Signature,
};

use crate::error::{ProxyError, ProxyResult};
use crate::generator::{get_global_class_generator, ClassGenerator};
use crate::naming::generated_class_name;

/// 生成的委托类
pub struct DelegateClass {
    class: Class,
    interface: Class,
    target: Class,
    factory_method: Method,
    constructor: Constructor,
}

impl DelegateClass {
    /// 生成类的元数据，实现工厂接口
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn interface(&self) -> &Class {
        &self.interface
    }

    pub fn target(&self) -> &Class {
        &self.target
    }

    /// 接口上声明的工厂方法
    pub fn factory_method(&self) -> &Method {
        &self.factory_method
    }

    /// 工厂方法委托的构造器
    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }
}

impl fmt::Debug for DelegateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateClass")
            .field("name", &self.class.name())
            .field("interface", &self.interface.name())
            .field("constructor", &self.constructor.to_string())
            .finish()
    }
}

/// 构造器委托实例
#[derive(Clone)]
pub struct ConstructorDelegate {
    class: Arc<DelegateClass>,
}

impl ConstructorDelegate {
    /// 使用全局生成器创建
    pub fn create(target: &Class, factory_interface: &Class) -> ProxyResult<Self> {
        Self::create_with(get_global_class_generator(), target, factory_interface)
    }

    pub fn create_with(
        generator: &ClassGenerator,
        target: &Class,
        factory_interface: &Class,
    ) -> ProxyResult<Self> {
        let key = (factory_interface.id(), target.id());
        let class = generator.generate(
            generator.delegate_cache(),
            &key,
            generator.settings().cache_enabled,
            || generate(target, factory_interface),
        )?;
        Ok(Self { class })
    }

    pub fn generated_class(&self) -> &Arc<DelegateClass> {
        &self.class
    }

    /// 调用工厂方法
    pub fn new_instance(&self, args: &[Instance]) -> Result<Instance, InvocationError> {
        let constructor = &self.class.constructor;
        constructor
            .new_instance(args)
            .map_err(|cause| InvocationError::target(constructor.to_string(), cause))
    }

    /// 按签名调用工厂方法
    ///
    /// 签名必须与工厂方法的声明完全一致，参数个数也必须与签名一致，否则返回
    /// `NoSuchMember`。参数值本身是类型擦除的：值与声明类型不符时由构造器取参失败，
    /// 以 `Target` 错误返回，原因是 `ArgumentError::Type`。
    pub fn invoke(
        &self,
        signature: &Signature,
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        if self.class.factory_method.signature() != signature
            || signature.parameter_count() != args.len()
        {
            return Err(InvocationError::no_such_member(
                self.class.name(),
                signature.to_string(),
            ));
        }
        self.new_instance(args)
    }

    /// 按方法名和参数个数调用，不比较参数类型
    pub fn call(&self, method_name: &str, args: &[Instance]) -> Result<Instance, InvocationError> {
        let factory_method = &self.class.factory_method;
        let arity = factory_method.parameter_types().len();
        if factory_method.name() != method_name || arity != args.len() {
            return Err(InvocationError::no_such_member(
                self.class.name(),
                format!("{method_name}/{}", args.len()),
            ));
        }
        self.new_instance(args)
    }
}

impl fmt::Debug for ConstructorDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstructorDelegate")
            .field(&self.class.name())
            .finish()
    }
}

fn generate(target: &Class, interface: &Class) -> ProxyResult<DelegateClass> {
    if !interface.is_interface() {
        return Err(ProxyError::invalid_argument(format!(
            "{} is not an interface",
            interface.name()
        )));
    }

    let abstract_methods: Vec<Method> = all_public_methods(interface)
        .into_iter()
        .filter(|m| !m.is_static() && m.is_abstract())
        .collect();
    let factory_method = match abstract_methods.as_slice() {
        [method] => Arc::clone(method),
        methods => {
            return Err(ProxyError::invalid_argument(format!(
                "expecting exactly 1 method in {}, found {}",
                interface.name(),
                methods.len()
            )))
        }
    };

    if !is_assignable_to_name(target, factory_method.return_type()) {
        return Err(ProxyError::invalid_argument(format!(
            "incompatible return type: {} cannot be returned as {}",
            target.name(),
            factory_method.return_type()
        )));
    }

    if target.is_abstract() {
        return Err(ProxyError::invalid_argument(format!(
            "{} cannot be instantiated",
            target.name()
        )));
    }

    let constructor = target
        .get_declared_constructor(factory_method.parameter_types())
        .cloned()
        .ok_or_else(|| {
            ProxyError::invalid_argument(format!(
                "interface {} does not match any known constructor of {}: ({})",
                interface.name(),
                target.name(),
                factory_method.parameter_types().join(", ")
            ))
        })?;

    let name = generated_class_name(
        target.name(),
        "ConstructorDelegate",
        &format!("{}|{}", interface.name(), target.name()),
    );

    let ctor = Arc::clone(&constructor);
    let class = ClassMeta::builder(name.as_str())
        .with_interface(Arc::clone(interface))
        .with_method(
            MethodMeta::new(factory_method.name())
                .with_params(factory_method.parameter_types().iter().cloned())
                .with_return_type(factory_method.return_type())
                .with_invoker(move |_, args| ctor.new_instance(args)),
        )
        .build()?;

    tracing::info!(
        "Generated {} delegating {}::{} to {}",
        name,
        interface.name(),
        factory_method.signature(),
        constructor
    );

    Ok(DelegateClass {
        class,
        interface: Arc::clone(interface),
        target: Arc::clone(target),
        factory_method,
        constructor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use weave_core::reflect::class_utils::is_assignable_from;
    use weave_core::reflect::{arg, instance};
    use weave_core::{ArgumentError, ConstructorMeta};

    #[derive(Debug)]
    struct Person {
        name: String,
    }

    fn person_class(name: &str) -> Class {
        ClassMeta::builder(name)
            .with_constructor(ConstructorMeta::new(["String"], |args| {
                Ok(instance(Person {
                    name: arg::<String>(args, 0)?,
                }))
            }))
            .build()
            .unwrap()
    }

    fn factory(name: &str, method: MethodMeta) -> Class {
        ClassMeta::interface(name).with_method(method).build().unwrap()
    }

    #[test]
    fn test_creates_working_delegate() {
        let generator = ClassGenerator::default();
        let person = person_class("test.Person");
        let greeter = factory(
            "test.Greeter",
            MethodMeta::new("make_person")
                .with_params(["String"])
                .with_return_type("test.Person"),
        );

        let delegate = ConstructorDelegate::create_with(&generator, &person, &greeter).unwrap();
        let bob = delegate.new_instance(&[instance("bob".to_string())]).unwrap();
        assert_eq!(bob.downcast_ref::<Person>().map(|p| p.name.as_str()), Some("bob"));

        let alice = delegate
            .call("make_person", &[instance("alice".to_string())])
            .unwrap();
        assert_eq!(alice.downcast_ref::<Person>().map(|p| p.name.as_str()), Some("alice"));

        let carol = delegate
            .invoke(
                &Signature::new("make_person", ["String"]),
                &[instance("carol".to_string())],
            )
            .unwrap();
        assert_eq!(carol.downcast_ref::<Person>().map(|p| p.name.as_str()), Some("carol"));

        let generated = delegate.generated_class();
        assert!(generated
            .name()
            .starts_with("test.Person$$ConstructorDelegateByWeave$$"));
        assert!(is_assignable_from(&greeter, generated.class()));
    }

    #[test]
    fn test_invoke_checks_signature_before_constructing() {
        let generator = ClassGenerator::default();
        let person = person_class("test.Person");
        let greeter = factory(
            "test.Greeter",
            MethodMeta::new("make_person")
                .with_params(["String"])
                .with_return_type("test.Person"),
        );
        let delegate = ConstructorDelegate::create_with(&generator, &person, &greeter).unwrap();

        let err = delegate
            .invoke(&Signature::new("make_person", ["u64"]), &[instance(7_u64)])
            .unwrap_err();
        assert!(matches!(err, InvocationError::NoSuchMember { .. }));

        let err = delegate
            .invoke(&Signature::new("make_person", ["String"]), &[])
            .unwrap_err();
        assert!(matches!(err, InvocationError::NoSuchMember { .. }));

        let err = delegate.call("make", &[instance("bob".to_string())]).unwrap_err();
        assert!(matches!(err, InvocationError::NoSuchMember { .. }));

        // 名称与个数相符但值类型不符：构造器取参失败
        let err = delegate.call("make_person", &[instance(7_u64)]).unwrap_err();
        assert!(err.is_target());
        assert!(matches!(
            err.cause().and_then(|c| c.downcast_ref::<ArgumentError>()),
            Some(ArgumentError::Type { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_interface_without_matching_factory_method() {
        let generator = ClassGenerator::default();
        let person = person_class("test.Person");

        // 只有 greet()，返回 String
        let greeter = factory(
            "test.Greeter",
            MethodMeta::new("greet").with_return_type("String"),
        );
        let err = ConstructorDelegate::create_with(&generator, &person, &greeter).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidArgument(_)));

        // 返回类型正确，但没有无参构造器
        let no_arg = factory(
            "test.NoArgFactory",
            MethodMeta::new("make").with_return_type("test.Person"),
        );
        let err = ConstructorDelegate::create_with(&generator, &person, &no_arg).unwrap_err();
        assert!(err.to_string().contains("does not match any known constructor"));

        assert_eq!(generator.delegate_cache().generation_count(), 0);
    }

    #[test]
    fn test_return_type_may_be_supertype() {
        let generator = ClassGenerator::default();
        let named = ClassMeta::interface("test.Named").build().unwrap();
        let person = ClassMeta::builder("test.Person")
            .with_interface(named)
            .with_constructor(ConstructorMeta::new(["String"], |args| {
                Ok(instance(Person {
                    name: arg::<String>(args, 0)?,
                }))
            }))
            .build()
            .unwrap();
        let factory = factory(
            "test.NamedFactory",
            MethodMeta::new("create")
                .with_params(["String"])
                .with_return_type("test.Named"),
        );

        assert!(ConstructorDelegate::create_with(&generator, &person, &factory).is_ok());
    }

    #[test]
    fn test_rejects_non_interface_and_multi_method_interface() {
        let generator = ClassGenerator::default();
        let person = person_class("test.Person");
        let other = person_class("test.Other");
        assert!(ConstructorDelegate::create_with(&generator, &person, &other).is_err());

        let wide = ClassMeta::interface("test.Wide")
            .with_method(MethodMeta::new("a").with_return_type("test.Person"))
            .with_method(MethodMeta::new("b").with_return_type("test.Person"))
            .build()
            .unwrap();
        let err = ConstructorDelegate::create_with(&generator, &person, &wide).unwrap_err();
        assert!(err.to_string().contains("expecting exactly 1 method"));
    }

    #[test]
    fn test_same_pairing_reuses_generated_class() {
        let generator = ClassGenerator::default();
        let person = person_class("test.Person");
        let greeter = factory(
            "test.Greeter",
            MethodMeta::new("make_person")
                .with_params(["String"])
                .with_return_type("test.Person"),
        );

        let a = ConstructorDelegate::create_with(&generator, &person, &greeter).unwrap();
        let b = ConstructorDelegate::create_with(&generator, &person, &greeter).unwrap();
        assert!(Arc::ptr_eq(a.generated_class(), b.generated_class()));
        assert_eq!(a.generated_class().name(), b.generated_class().name());
        assert_eq!(generator.delegate_cache().generation_count(), 1);
    }

    #[test]
    fn test_concurrent_creation_generates_once() {
        let generator = Arc::new(ClassGenerator::default());
        let person = person_class("test.Person");
        let greeter = factory(
            "test.Greeter",
            MethodMeta::new("make_person")
                .with_params(["String"])
                .with_return_type("test.Person"),
        );
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let generator = Arc::clone(&generator);
                let person = Arc::clone(&person);
                let greeter = Arc::clone(&greeter);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ConstructorDelegate::create_with(&generator, &person, &greeter).unwrap()
                })
            })
            .collect();

        let delegates: Vec<ConstructorDelegate> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(generator.delegate_cache().generation_count(), 1);
        assert!(delegates
            .iter()
            .all(|d| Arc::ptr_eq(d.generated_class(), delegates[0].generated_class())));
    }
}
