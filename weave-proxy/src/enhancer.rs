//! Enhancer：运行时代理类
//!
//! 为父类和/或一组接口生成一个代理类。生成类的每个公共方法按 `CallbackFilter`
//! 分配一个回调，调用时分派到对应实例上的回调。生成结果按
//! (父类, 接口, 命名前缀, 回调种类, 方法回调分配) 缓存，同一个键只生成一次。
//!
//! ```ignore
//! let mut enhancer = Enhancer::new();
//! enhancer
//!     .set_superclass(&person)
//!     .set_callbacks(vec![Callback::NoOp, Callback::fixed(instance("hi".to_string()))])
//!     .set_callback_filter(|m: &Method| usize::from(m.name() == "greet"));
//! let proxy = enhancer.create()?;
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use weave_core::reflect::class_utils::{all_public_methods, is_assignable_from};
use weave_core::reflect::void;
use weave_core::{Class, ClassMeta, Instance, InvocationError, Method, Signature, Throwable};

use crate::callback::{Callback, CallbackFilter, CallbackKind};
use crate::error::{ProxyError, ProxyResult};
use crate::fast_class::FastClass;
use crate::generator::{get_global_class_generator, ClassGenerator};
use crate::naming::generated_class_name;

/// 生成类缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnhancerKey {
    superclass: Option<u64>,
    interfaces: Vec<u64>,
    target_class: Option<u64>,
    naming_prefix: Option<String>,
    callback_kinds: Vec<CallbackKind>,
    assignment: Vec<usize>,
}

/// 生成类会覆盖的方法：父类的公共方法，再加上接口中未被覆盖的方法
pub(crate) fn proxied_methods(superclass: Option<&Class>, interfaces: &[Class]) -> Vec<Method> {
    let mut seen = HashSet::new();
    superclass
        .map(|s| all_public_methods(s))
        .unwrap_or_default()
        .into_iter()
        .chain(interfaces.iter().flat_map(|i| all_public_methods(i)))
        .filter(|m| !m.is_static())
        .filter(|m| seen.insert(m.signature().clone()))
        .collect()
}

pub struct Enhancer {
    generator: Arc<ClassGenerator>,
    superclass: Option<Class>,
    interfaces: Vec<Class>,
    target_class: Option<Class>,
    callbacks: Vec<Callback>,
    filter: Option<Arc<dyn CallbackFilter>>,
    naming_prefix: Option<String>,
    use_cache: bool,
}

impl Enhancer {
    pub fn new() -> Self {
        Self::with_generator(Arc::clone(get_global_class_generator()))
    }

    pub fn with_generator(generator: Arc<ClassGenerator>) -> Self {
        let use_cache = generator.settings().cache_enabled;
        let naming_prefix = generator.settings().naming_prefix.clone();
        Self {
            generator,
            superclass: None,
            interfaces: Vec::new(),
            target_class: None,
            callbacks: Vec::new(),
            filter: None,
            naming_prefix,
            use_cache,
        }
    }

    /// 设置父类；传入接口时等同于 `set_interfaces(vec![class])`
    pub fn set_superclass(&mut self, class: &Class) -> &mut Self {
        if class.is_interface() {
            self.superclass = None;
            self.interfaces = vec![Arc::clone(class)];
        } else {
            self.superclass = Some(Arc::clone(class));
        }
        self
    }

    pub fn set_interfaces(&mut self, interfaces: Vec<Class>) -> &mut Self {
        self.interfaces = interfaces;
        self
    }

    /// 只代理接口时，`MethodProxy` 绑定到目标对象的实际类型
    ///
    /// 该类型必须实现所有接口，且不能与父类同时设置。
    pub fn set_target_class(&mut self, class: &Class) -> &mut Self {
        self.target_class = Some(Arc::clone(class));
        self
    }

    pub fn set_callback(&mut self, callback: Callback) -> &mut Self {
        self.callbacks = vec![callback];
        self
    }

    pub fn set_callbacks(&mut self, callbacks: Vec<Callback>) -> &mut Self {
        self.callbacks = callbacks;
        self
    }

    pub fn set_callback_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: CallbackFilter + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn set_naming_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.naming_prefix = Some(prefix.into());
        self
    }

    pub fn set_use_cache(&mut self, use_cache: bool) -> &mut Self {
        self.use_cache = use_cache;
        self
    }

    /// 生成（或从缓存获取）代理类
    pub fn create_class(&self) -> ProxyResult<Arc<EnhancedClass>> {
        let display_name = self
            .superclass
            .as_ref()
            .or_else(|| self.interfaces.first())
            .map(|c| c.name().to_string())
            .unwrap_or_default();

        if self.callbacks.is_empty() {
            return Err(ProxyError::invalid_argument(format!(
                "callbacks are required to enhance {display_name}"
            )));
        }
        if self.filter.is_none() && self.callbacks.len() > 1 {
            return Err(ProxyError::invalid_argument(
                "multiple callback types possible but no filter specified",
            ));
        }
        if let Some(bad) = self.interfaces.iter().find(|i| !i.is_interface()) {
            return Err(ProxyError::invalid_argument(format!(
                "{} is not an interface",
                bad.name()
            )));
        }

        if let Some(target_class) = &self.target_class {
            self.check_target_class(target_class)?;
        }

        let methods = proxied_methods(self.superclass.as_ref(), &self.interfaces);
        let mut assignment = Vec::with_capacity(methods.len());
        for method in &methods {
            let index = self.filter.as_ref().map(|f| f.accept(method)).unwrap_or(0);
            if index >= self.callbacks.len() {
                return Err(ProxyError::CallbackIndexOutOfRange {
                    class: display_name,
                    index,
                    count: self.callbacks.len(),
                });
            }
            assignment.push(index);
        }

        let key = EnhancerKey {
            superclass: self.superclass.as_ref().map(|c| c.id()),
            interfaces: self.interfaces.iter().map(|c| c.id()).collect(),
            target_class: self.target_class.as_ref().map(|c| c.id()),
            naming_prefix: self.naming_prefix.clone(),
            callback_kinds: self.callbacks.iter().map(Callback::kind).collect(),
            assignment,
        };

        self.generator
            .generate(self.generator.enhancer_cache(), &key, self.use_cache, || {
                EnhancedClass::generate(
                    &self.generator,
                    &key,
                    self.superclass.as_ref(),
                    &self.interfaces,
                    self.target_class.as_ref(),
                    methods,
                )
            })
    }

    fn check_target_class(&self, target_class: &Class) -> ProxyResult<()> {
        if self.superclass.is_some() {
            return Err(ProxyError::invalid_argument(
                "target class applies to interface proxies only, a superclass is already set",
            ));
        }
        if target_class.is_interface() || target_class.is_annotation() {
            return Err(ProxyError::invalid_argument(format!(
                "target class {} must be a concrete class",
                target_class.name()
            )));
        }
        if let Some(missing) = self
            .interfaces
            .iter()
            .find(|i| !is_assignable_from(i, target_class))
        {
            return Err(ProxyError::invalid_argument(format!(
                "target class {} does not implement {}",
                target_class.name(),
                missing.name()
            )));
        }
        Ok(())
    }

    /// 使用父类的无参构造器创建代理实例
    pub fn create(&self) -> ProxyResult<EnhancedObject> {
        self.create_with_args(&[], &[])
    }

    /// 使用父类参数类型匹配的构造器创建代理实例
    pub fn create_with_args(
        &self,
        parameter_types: &[&str],
        args: &[Instance],
    ) -> ProxyResult<EnhancedObject> {
        let class = self.create_class()?;
        let target = class.construct_target(parameter_types, args)?;
        class.new_instance(self.callbacks.clone(), target)
    }

    /// 以已有对象作为父类状态创建代理实例
    pub fn create_with_target(&self, target: Instance) -> ProxyResult<EnhancedObject> {
        let class = self.create_class()?;
        class.new_instance(self.callbacks.clone(), target)
    }
}

impl Default for Enhancer {
    fn default() -> Self {
        Self::new()
    }
}

/// 代理方法对父类实现的调用入口
pub struct MethodProxy {
    method: Method,
    fast: Option<(Arc<FastClass>, usize)>,
}

impl MethodProxy {
    /// 被代理的方法
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn signature(&self) -> &Signature {
        self.method.signature()
    }

    /// 在代理对象的父类状态上调用父类实现
    pub fn invoke_super(
        &self,
        obj: &EnhancedObject,
        args: &[Instance],
    ) -> Result<Instance, Throwable> {
        self.invoke(obj.target(), args)
    }

    /// 在另一个父类类型的对象上调用同签名方法
    pub fn invoke(&self, target: &Instance, args: &[Instance]) -> Result<Instance, Throwable> {
        self.call(target, args).map_err(InvocationError::into_cause)
    }

    pub(crate) fn call(
        &self,
        target: &Instance,
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        match &self.fast {
            Some((fast_class, index)) => fast_class.invoke(*index, target, args),
            None => self
                .method
                .invoke(target, args)
                .map_err(|cause| InvocationError::target(self.method.to_string(), cause)),
        }
    }
}

impl fmt::Debug for MethodProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodProxy")
            .field("method", &self.method.to_string())
            .field("fast_index", &self.fast.as_ref().map(|(_, i)| *i))
            .finish()
    }
}

struct ProxiedMethod {
    proxy: MethodProxy,
    callback_index: usize,
}

/// 生成的代理类
pub struct EnhancedClass {
    class: Class,
    superclass: Option<Class>,
    fast_class: Option<Arc<FastClass>>,
    methods: Vec<ProxiedMethod>,
    index: HashMap<Signature, usize>,
    callback_kinds: Vec<CallbackKind>,
}

impl EnhancedClass {
    fn generate(
        generator: &ClassGenerator,
        key: &EnhancerKey,
        superclass: Option<&Class>,
        interfaces: &[Class],
        target_class: Option<&Class>,
        methods: Vec<Method>,
    ) -> ProxyResult<EnhancedClass> {
        // 父类实现优先，纯接口代理绑定到目标对象的实际类型
        let fast_class = superclass
            .or(target_class)
            .map(|c| FastClass::create_with(generator, c))
            .transpose()?;

        let proxied: Vec<ProxiedMethod> = methods
            .into_iter()
            .zip(&key.assignment)
            .map(|(method, &callback_index)| {
                let fast = fast_class.as_ref().and_then(|fc| {
                    fc.get_index(method.signature())
                        .map(|index| (Arc::clone(fc), index))
                });
                ProxiedMethod {
                    proxy: MethodProxy { method, fast },
                    callback_index,
                }
            })
            .collect();

        let index = proxied
            .iter()
            .enumerate()
            .map(|(i, m)| (m.proxy.signature().clone(), i))
            .collect();

        let prefix = key
            .naming_prefix
            .as_deref()
            .or_else(|| superclass.map(|s| s.name()))
            .or_else(|| interfaces.first().map(|i| i.name()))
            .unwrap_or_default();
        let name = generated_class_name(prefix, "Enhancer", &format!("{key:?}"));

        let mut builder =
            ClassMeta::builder(name.as_str()).with_interfaces(interfaces.iter().cloned());
        if let Some(superclass) = superclass {
            builder = builder.with_superclass(Arc::clone(superclass));
        }
        let class = builder.build()?;

        tracing::info!(
            "Generated {} ({} proxied methods, callbacks {:?})",
            name,
            proxied.len(),
            key.callback_kinds
        );

        Ok(EnhancedClass {
            class,
            superclass: superclass.cloned(),
            fast_class,
            methods: proxied,
            index,
            callback_kinds: key.callback_kinds.clone(),
        })
    }

    /// 生成类的元数据，父类与接口同用户类型一致
    pub fn class(&self) -> &Class {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn superclass(&self) -> Option<&Class> {
        self.superclass.as_ref()
    }

    pub fn callback_kinds(&self) -> &[CallbackKind] {
        &self.callback_kinds
    }

    /// 被代理的方法
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().map(|m| m.proxy.method())
    }

    /// 方法被分配的回调索引
    pub fn callback_index(&self, signature: &Signature) -> Option<usize> {
        self.index
            .get(signature)
            .map(|&i| self.methods[i].callback_index)
    }

    fn construct_target(
        &self,
        parameter_types: &[&str],
        args: &[Instance],
    ) -> ProxyResult<Instance> {
        let (Some(superclass), Some(fast_class)) = (&self.superclass, &self.fast_class) else {
            return Ok(void());
        };

        if superclass.declared_constructors().is_empty() && parameter_types.is_empty() {
            return Ok(void());
        }

        let parameter_types: Vec<String> = parameter_types.iter().map(|t| t.to_string()).collect();
        let index = fast_class
            .get_constructor_index(&parameter_types)
            .ok_or_else(|| {
                ProxyError::invalid_argument(format!(
                    "{} has no constructor with parameter types ({})",
                    superclass.name(),
                    parameter_types.join(", ")
                ))
            })?;

        Ok(fast_class.new_instance(index, args)?)
    }

    /// 用给定的回调和父类状态创建实例
    pub fn new_instance(
        self: &Arc<Self>,
        callbacks: Vec<Callback>,
        target: Instance,
    ) -> ProxyResult<EnhancedObject> {
        let kinds: Vec<CallbackKind> = callbacks.iter().map(Callback::kind).collect();
        if kinds != self.callback_kinds {
            return Err(ProxyError::invalid_argument(format!(
                "{} expects callbacks {:?}, got {:?}",
                self.name(),
                self.callback_kinds,
                kinds
            )));
        }

        Ok(EnhancedObject {
            class: Arc::clone(self),
            callbacks: callbacks.into(),
            target,
        })
    }
}

impl fmt::Debug for EnhancedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancedClass")
            .field("name", &self.class.name())
            .field("methods", &self.methods.len())
            .field("callback_kinds", &self.callback_kinds)
            .finish()
    }
}

/// 代理实例
#[derive(Clone)]
pub struct EnhancedObject {
    class: Arc<EnhancedClass>,
    callbacks: Arc<[Callback]>,
    target: Instance,
}

impl EnhancedObject {
    pub fn enhanced_class(&self) -> &Arc<EnhancedClass> {
        &self.class
    }

    /// 生成类的元数据
    pub fn class(&self) -> &Class {
        self.class.class()
    }

    /// 父类状态
    pub fn target(&self) -> &Instance {
        &self.target
    }

    pub fn callbacks(&self) -> &[Callback] {
        &self.callbacks
    }

    pub fn callback(&self, index: usize) -> Option<&Callback> {
        self.callbacks.get(index)
    }

    /// 同一个生成类、同一个父类状态，替换回调
    pub fn with_callbacks(&self, callbacks: Vec<Callback>) -> ProxyResult<EnhancedObject> {
        self.class.new_instance(callbacks, Arc::clone(&self.target))
    }

    /// 按签名调用
    pub fn invoke(
        &self,
        signature: &Signature,
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        let index = self
            .class
            .index
            .get(signature)
            .copied()
            .ok_or_else(|| {
                InvocationError::no_such_member(self.class.name(), signature.to_string())
            })?;
        self.dispatch(index, args)
    }

    /// 按方法名和参数个数调用，名称有重载歧义时返回 `NoSuchMember`
    pub fn call(&self, name: &str, args: &[Instance]) -> Result<Instance, InvocationError> {
        let mut candidates = self
            .class
            .methods
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                let method = m.proxy.method();
                method.name() == name && method.parameter_types().len() == args.len()
            })
            .map(|(i, _)| i);

        match (candidates.next(), candidates.next()) {
            (Some(index), None) => self.dispatch(index, args),
            _ => Err(InvocationError::no_such_member(
                self.class.name(),
                format!("{name}/{}", args.len()),
            )),
        }
    }

    fn dispatch(&self, index: usize, args: &[Instance]) -> Result<Instance, InvocationError> {
        let proxied = &self.class.methods[index];
        let member = || format!("{}::{}", self.class.name(), proxied.proxy.signature());

        let callback = self
            .callbacks
            .get(proxied.callback_index)
            .ok_or_else(|| InvocationError::no_such_member(self.class.name(), member()))?;

        match callback {
            Callback::NoOp => proxied.proxy.call(&self.target, args),
            Callback::FixedValue(fixed) => fixed
                .load_object()
                .map_err(|cause| InvocationError::target(member(), cause)),
            Callback::MethodInterceptor(interceptor) => interceptor
                .intercept(self, proxied.proxy.method(), args, &proxied.proxy)
                .map_err(|cause| InvocationError::target(member(), cause)),
            Callback::Dispatcher(dispatcher) => {
                let delegate = dispatcher
                    .load_object()
                    .map_err(|cause| InvocationError::target(member(), cause))?;
                proxied.proxy.call(&delegate, args)
            }
        }
    }
}

impl fmt::Debug for EnhancedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancedObject")
            .field("class", &self.class.name())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
