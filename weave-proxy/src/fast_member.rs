//! FastMethod / FastConstructor
//!
//! 把一个方法或构造器与它在 FastClass 中的索引绑定。
//! 构造时解析索引，解析失败说明调用方与索引不一致，直接报错。

use std::fmt;
use std::sync::Arc;

use weave_core::{Class, Constructor, Instance, InvocationError, Method};

use crate::error::{ProxyError, ProxyResult};
use crate::fast_class::FastClass;

/// FastMethod 与 FastConstructor 的公共访问器
pub trait FastMember {
    fn index(&self) -> usize;

    fn name(&self) -> &str;

    fn parameter_types(&self) -> &[String];

    fn declaring_class(&self) -> &Class;
}

fn not_indexed(fast_class: &FastClass, member: String, parameter_types: &[String]) -> ProxyError {
    let parameter_types = parameter_types.join(", ");
    tracing::error!(
        "Member {} is not indexed by {} (parameter types: [{}])",
        member,
        fast_class.name(),
        parameter_types
    );
    ProxyError::MemberNotIndexed {
        class: fast_class.class().name().to_string(),
        member,
        parameter_types,
    }
}

/// 按索引调用的方法
#[derive(Clone)]
pub struct FastMethod {
    fast_class: Arc<FastClass>,
    method: Method,
    index: usize,
}

impl FastMethod {
    pub fn new(fast_class: Arc<FastClass>, method: Method) -> ProxyResult<Self> {
        let index = fast_class
            .get_index(method.signature())
            .ok_or_else(|| not_indexed(&fast_class, method.to_string(), method.parameter_types()))?;

        Ok(Self {
            fast_class,
            method,
            index,
        })
    }

    /// 使用全局生成器获取 `class` 的 FastClass 后构造
    pub fn create(class: &Class, method: Method) -> ProxyResult<Self> {
        Self::new(FastClass::create(class)?, method)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn fast_class(&self) -> &Arc<FastClass> {
        &self.fast_class
    }

    pub fn return_type(&self) -> &str {
        self.method.return_type()
    }

    pub fn invoke(
        &self,
        target: &Instance,
        args: &[Instance],
    ) -> Result<Instance, InvocationError> {
        self.fast_class.invoke(self.index, target, args)
    }
}

impl FastMember for FastMethod {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        self.method.name()
    }

    fn parameter_types(&self) -> &[String] {
        self.method.parameter_types()
    }

    fn declaring_class(&self) -> &Class {
        self.fast_class.class()
    }
}

impl PartialEq for FastMethod {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fast_class, &other.fast_class) && self.index == other.index
    }
}

impl Eq for FastMethod {}

impl fmt::Debug for FastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastMethod")
            .field("method", &self.method.to_string())
            .field("index", &self.index)
            .finish()
    }
}

impl fmt::Display for FastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.method, f)
    }
}

/// 按索引调用的构造器
#[derive(Clone)]
pub struct FastConstructor {
    fast_class: Arc<FastClass>,
    constructor: Constructor,
    index: usize,
}

impl FastConstructor {
    pub fn new(fast_class: Arc<FastClass>, constructor: Constructor) -> ProxyResult<Self> {
        let index = fast_class
            .get_constructor_index(constructor.parameter_types())
            .ok_or_else(|| {
                not_indexed(
                    &fast_class,
                    constructor.to_string(),
                    constructor.parameter_types(),
                )
            })?;

        Ok(Self {
            fast_class,
            constructor,
            index,
        })
    }

    pub fn create(class: &Class, constructor: Constructor) -> ProxyResult<Self> {
        Self::new(FastClass::create(class)?, constructor)
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    pub fn new_instance(&self, args: &[Instance]) -> Result<Instance, InvocationError> {
        self.fast_class.new_instance(self.index, args)
    }
}

impl FastMember for FastConstructor {
    fn index(&self) -> usize {
        self.index
    }

    fn name(&self) -> &str {
        self.constructor.signature().name()
    }

    fn parameter_types(&self) -> &[String] {
        self.constructor.parameter_types()
    }

    fn declaring_class(&self) -> &Class {
        self.fast_class.class()
    }
}

impl PartialEq for FastConstructor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fast_class, &other.fast_class) && self.index == other.index
    }
}

impl Eq for FastConstructor {}

impl fmt::Debug for FastConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastConstructor")
            .field("constructor", &self.constructor.to_string())
            .field("index", &self.index)
            .finish()
    }
}
