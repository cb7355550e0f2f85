//! 类型元数据
//!
//! `ClassMeta` 描述一个可被匹配、代理的类型：继承关系、注解、方法与构造器。
//! 元数据构建完成后不可变，通过 `Class`（即 `Arc<ClassMeta>`）共享。

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{ContainerError, ContainerResult};
use crate::reflect::member::{Constructor, ConstructorMeta, Method, MethodMeta, Signature};

/// 共享的类型句柄
pub type Class = Arc<ClassMeta>;

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    AbstractClass,
    Interface,
    Annotation,
}

/// 类型 ID 计数器，每次 build 分配一个新 ID
static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// 类型元数据
pub struct ClassMeta {
    id: u64,
    name: String,
    kind: ClassKind,
    superclass: Option<Class>,
    interfaces: Vec<Class>,
    annotations: Vec<Class>,
    methods: Vec<Method>,
    constructors: Vec<Constructor>,
}

impl ClassMeta {
    /// 普通类
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Class)
    }

    /// 抽象类
    pub fn abstract_class(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::AbstractClass)
    }

    /// 接口
    pub fn interface(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Interface)
    }

    /// 注解类型
    pub fn annotation(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Annotation)
    }

    /// 进程内唯一的 ID，用作生成缓存的键
    ///
    /// 同名类型在不同注册表中可以各自构建，ID 能区分它们
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 不带路径的类型名
    pub fn simple_name(&self) -> &str {
        let name = self.name.rsplit("::").next().unwrap_or(&self.name);
        name.rsplit('.').next().unwrap_or(name)
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == ClassKind::Annotation
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, ClassKind::AbstractClass | ClassKind::Interface)
    }

    pub fn superclass(&self) -> Option<&Class> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[Class] {
        &self.interfaces
    }

    /// 直接声明在该类型上的注解
    pub fn annotations(&self) -> &[Class] {
        &self.annotations
    }

    pub fn declared_methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn declared_constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// 按签名查找本类型声明的方法
    pub fn get_declared_method(&self, signature: &Signature) -> Option<&Method> {
        self.methods.iter().find(|m| m.signature() == signature)
    }

    /// 按参数类型查找本类型声明的构造器
    pub fn get_declared_constructor(&self, parameter_types: &[String]) -> Option<&Constructor> {
        self.constructors
            .iter()
            .find(|c| c.parameter_types() == parameter_types)
    }
}

impl PartialEq for ClassMeta {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassMeta {}

impl std::hash::Hash for ClassMeta {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for ClassMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMeta")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass.as_ref().map(|c| c.name()))
            .field(
                "interfaces",
                &self.interfaces.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field(
                "annotations",
                &self.annotations.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

impl fmt::Display for ClassMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// ClassMeta 构建器
pub struct ClassBuilder {
    name: String,
    kind: ClassKind,
    superclass: Option<Class>,
    interfaces: Vec<Class>,
    annotations: Vec<Class>,
    methods: Vec<MethodMeta>,
    constructors: Vec<ConstructorMeta>,
}

impl ClassBuilder {
    fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn with_superclass(mut self, superclass: Class) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: Class) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = Class>) -> Self {
        self.interfaces.extend(interfaces);
        self
    }

    pub fn with_annotation(mut self, annotation: Class) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_method(mut self, method: MethodMeta) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorMeta) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// 校验并构建
    pub fn build(self) -> ContainerResult<Class> {
        let invalid = |reason: String| ContainerError::InvalidClassDefinition {
            class: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("class name must not be empty".to_string()));
        }

        if let Some(superclass) = &self.superclass {
            if self.kind == ClassKind::Interface || self.kind == ClassKind::Annotation {
                return Err(invalid(format!(
                    "{:?} types cannot extend {}",
                    self.kind,
                    superclass.name()
                )));
            }
            if superclass.is_interface() || superclass.is_annotation() {
                return Err(invalid(format!("{} is not a class", superclass.name())));
            }
        }

        if let Some(bad) = self.interfaces.iter().find(|i| !i.is_interface()) {
            return Err(invalid(format!("{} is not an interface", bad.name())));
        }

        if let Some(bad) = self.annotations.iter().find(|a| !a.is_annotation()) {
            return Err(invalid(format!("{} is not an annotation type", bad.name())));
        }

        if matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
            && !self.constructors.is_empty()
        {
            return Err(invalid("interfaces cannot declare constructors".to_string()));
        }

        let mut seen = HashSet::new();
        for method in &self.methods {
            if !seen.insert(method.signature().clone()) {
                return Err(invalid(format!("duplicate method {}", method.signature())));
            }
        }

        let mut seen = HashSet::new();
        for ctor in &self.constructors {
            if !seen.insert(ctor.signature().clone()) {
                return Err(invalid(format!("duplicate constructor {}", ctor.signature())));
            }
        }

        let name = self.name;
        let methods = self
            .methods
            .into_iter()
            .map(|m| Arc::new(m.bind(&name)))
            .collect();
        let constructors = self
            .constructors
            .into_iter()
            .map(|c| Arc::new(c.bind(&name)))
            .collect();

        Ok(Arc::new(ClassMeta {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name,
            kind: self.kind,
            superclass: self.superclass,
            interfaces: self.interfaces,
            annotations: self.annotations,
            methods,
            constructors,
        }))
    }
}
