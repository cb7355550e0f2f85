//! 方法与构造器元数据

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{ArgumentError, Throwable};
use crate::reflect::Class;

/// 运行时对象
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 方法调用函数：(目标对象, 参数) -> 返回值
pub type MethodInvoker =
    Arc<dyn Fn(&Instance, &[Instance]) -> Result<Instance, Throwable> + Send + Sync>;

/// 构造函数：参数 -> 新实例
pub type ConstructorFactory = Arc<dyn Fn(&[Instance]) -> Result<Instance, Throwable> + Send + Sync>;

/// 共享的方法句柄，句柄的同一性即 `Arc` 指针同一性
pub type Method = Arc<MethodMeta>;

/// 共享的构造器句柄
pub type Constructor = Arc<ConstructorMeta>;

/// 构造器在签名中使用的名称
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// 无返回值方法的返回类型名称
pub const VOID: &str = "()";

/// 成员签名：名称 + 参数类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    name: String,
    parameter_types: Vec<String>,
}

impl Signature {
    pub fn new<I, S>(name: impl Into<String>, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_types.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameter_types.join(","))
    }
}

/// 成员修饰符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub public: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    /// 编译器生成的桥接方法
    pub bridge: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            public: true,
            is_static: false,
            is_abstract: false,
            bridge: false,
        }
    }
}

/// 方法元数据
pub struct MethodMeta {
    declaring_class: String,
    signature: Signature,
    return_type: String,
    modifiers: Modifiers,
    annotations: Vec<Class>,
    invoker: Option<MethodInvoker>,
}

impl MethodMeta {
    /// 创建无参、无返回值的公共方法
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            declaring_class: String::new(),
            signature: Signature::new(name, Vec::<String>::new()),
            return_type: VOID.to_string(),
            modifiers: Modifiers::default(),
            annotations: Vec::new(),
            invoker: None,
        }
    }

    /// 设置参数类型
    pub fn with_params<I, S>(mut self, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signature = Signature::new(self.signature.name.clone(), parameter_types);
        self
    }

    /// 设置返回类型
    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: Class) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// 设置方法实现
    pub fn with_invoker<F>(mut self, invoker: F) -> Self
    where
        F: Fn(&Instance, &[Instance]) -> Result<Instance, Throwable> + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(invoker));
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.modifiers.is_static = is_static;
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.modifiers.public = public;
        self
    }

    pub fn with_bridge(mut self, bridge: bool) -> Self {
        self.modifiers.bridge = bridge;
        self
    }

    /// 由 ClassBuilder 在构建时调用
    pub(crate) fn bind(mut self, declaring_class: &str) -> Self {
        self.declaring_class = declaring_class.to_string();
        self.modifiers.is_abstract = self.invoker.is_none();
        self
    }

    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn parameter_types(&self) -> &[String] {
        self.signature.parameter_types()
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.public
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract
    }

    pub fn is_bridge(&self) -> bool {
        self.modifiers.bridge
    }

    pub fn annotations(&self) -> &[Class] {
        &self.annotations
    }

    pub fn invoker(&self) -> Option<&MethodInvoker> {
        self.invoker.as_ref()
    }

    /// 直接调用方法实现
    ///
    /// 抽象方法返回 `AbstractMethodError`。
    pub fn invoke(&self, target: &Instance, args: &[Instance]) -> Result<Instance, Throwable> {
        match &self.invoker {
            Some(invoker) => invoker(target, args),
            None => Err(Box::new(AbstractMethodError(self.to_string()))),
        }
    }
}

impl fmt::Debug for MethodMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodMeta")
            .field("declaring_class", &self.declaring_class)
            .field("signature", &self.signature.to_string())
            .field("return_type", &self.return_type)
            .field("modifiers", &self.modifiers)
            .field(
                "annotations",
                &self.annotations.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for MethodMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_class, self.signature)
    }
}

/// 调用了没有实现的方法
#[derive(Debug, Clone, thiserror::Error)]
#[error("Abstract method invoked: {0}")]
pub struct AbstractMethodError(pub String);

/// 构造器元数据
pub struct ConstructorMeta {
    declaring_class: String,
    signature: Signature,
    public: bool,
    factory: ConstructorFactory,
}

impl ConstructorMeta {
    pub fn new<I, S, F>(parameter_types: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[Instance]) -> Result<Instance, Throwable> + Send + Sync + 'static,
    {
        Self {
            declaring_class: String::new(),
            signature: Signature::new(CONSTRUCTOR_NAME, parameter_types),
            public: true,
            factory: Arc::new(factory),
        }
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub(crate) fn bind(mut self, declaring_class: &str) -> Self {
        self.declaring_class = declaring_class.to_string();
        self
    }

    pub fn declaring_class(&self) -> &str {
        &self.declaring_class
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn parameter_types(&self) -> &[String] {
        self.signature.parameter_types()
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn new_instance(&self, args: &[Instance]) -> Result<Instance, Throwable> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ConstructorMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorMeta")
            .field("declaring_class", &self.declaring_class)
            .field("parameter_types", &self.signature.parameter_types)
            .field("public", &self.public)
            .finish()
    }
}

impl fmt::Display for ConstructorMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_class, self.signature)
    }
}

// ============================================================================
// 调用实现里常用的参数辅助函数
// ============================================================================

/// 检查参数个数
pub fn expect_args(args: &[Instance], expected: usize) -> Result<(), Throwable> {
    if args.len() != expected {
        return Err(Box::new(ArgumentError::Count {
            expected,
            actual: args.len(),
        }));
    }
    Ok(())
}

/// 取出第 `index` 个参数的克隆值
pub fn arg<T: Any + Clone>(args: &[Instance], index: usize) -> Result<T, Throwable> {
    let value = args.get(index).ok_or_else(|| -> Throwable {
        Box::new(ArgumentError::Count {
            expected: index + 1,
            actual: args.len(),
        })
    })?;

    value.downcast_ref::<T>().cloned().ok_or_else(|| -> Throwable {
        Box::new(ArgumentError::Type {
            index,
            expected: std::any::type_name::<T>(),
        })
    })
}

/// 将目标对象还原为具体类型
pub fn receiver<T: Any>(target: &Instance) -> Result<&T, Throwable> {
    target.downcast_ref::<T>().ok_or_else(|| -> Throwable {
        Box::new(ArgumentError::Receiver {
            expected: std::any::type_name::<T>(),
        })
    })
}

/// 包装返回值
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// 无返回值
pub fn void() -> Instance {
    Arc::new(())
}
