//! 类型过滤器
//!
//! 判断一个横切行为是否适用于某个类型。过滤器构造后不可变，
//! 可以在多个线程间无同步地并发使用。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use weave_core::reflect::annotation_utils::{has_annotation, is_annotation_present};
use weave_core::{Class, ClassRegistry};

use crate::error::{AopError, AopResult};

pub trait ClassFilter: Send + Sync {
    fn matches(&self, class: &Class) -> bool;
}

/// 匹配所有类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrueClassFilter;

impl ClassFilter for TrueClassFilter {
    fn matches(&self, _class: &Class) -> bool {
        true
    }
}

impl fmt::Display for TrueClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClassFilter.TRUE")
    }
}

/// 按注解匹配类型
///
/// - `check_inherited == false`：注解必须直接声明在类型上
/// - `check_inherited == true`：沿元注解、接口、父类查找，命中即停
#[derive(Clone)]
pub struct AnnotationClassFilter {
    annotation: Class,
    check_inherited: bool,
}

impl AnnotationClassFilter {
    pub fn new(annotation: &Class) -> AopResult<Self> {
        Self::with_inherited(annotation, false)
    }

    pub fn with_inherited(annotation: &Class, check_inherited: bool) -> AopResult<Self> {
        if !annotation.is_annotation() {
            return Err(AopError::invalid_argument(format!(
                "{} is not an annotation type",
                annotation.name()
            )));
        }
        Ok(Self {
            annotation: Arc::clone(annotation),
            check_inherited,
        })
    }

    /// 按名称从注册表解析注解类型
    pub fn for_name(
        registry: &ClassRegistry,
        name: &str,
        check_inherited: bool,
    ) -> AopResult<Self> {
        let annotation = registry.get(name).ok_or_else(|| {
            AopError::invalid_argument(format!("annotation type {name} is not registered"))
        })?;
        Self::with_inherited(&annotation, check_inherited)
    }

    pub fn annotation_type(&self) -> &Class {
        &self.annotation
    }

    pub fn check_inherited(&self) -> bool {
        self.check_inherited
    }
}

impl ClassFilter for AnnotationClassFilter {
    fn matches(&self, class: &Class) -> bool {
        let matched = if self.check_inherited {
            has_annotation(class, &self.annotation)
        } else {
            is_annotation_present(class, &self.annotation)
        };
        tracing::trace!("{} matches {}: {}", self, class.name(), matched);
        matched
    }
}

impl PartialEq for AnnotationClassFilter {
    fn eq(&self, other: &Self) -> bool {
        self.annotation.name() == other.annotation.name()
            && self.check_inherited == other.check_inherited
    }
}

impl Eq for AnnotationClassFilter {}

impl Hash for AnnotationClassFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.annotation.name().hash(state);
        self.check_inherited.hash(state);
    }
}

impl fmt::Debug for AnnotationClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationClassFilter")
            .field("annotation", &self.annotation.name())
            .field("check_inherited", &self.check_inherited)
            .finish()
    }
}

impl fmt::Display for AnnotationClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationClassFilter: @{}", self.annotation.name())
    }
}

/// 任意一个过滤器匹配即匹配
#[derive(Clone)]
pub struct UnionClassFilter {
    filters: Vec<Arc<dyn ClassFilter>>,
}

impl UnionClassFilter {
    pub fn new(filters: Vec<Arc<dyn ClassFilter>>) -> Self {
        Self { filters }
    }
}

impl ClassFilter for UnionClassFilter {
    fn matches(&self, class: &Class) -> bool {
        self.filters.iter().any(|f| f.matches(class))
    }
}

/// 所有过滤器都匹配才匹配
#[derive(Clone)]
pub struct IntersectionClassFilter {
    filters: Vec<Arc<dyn ClassFilter>>,
}

impl IntersectionClassFilter {
    pub fn new(filters: Vec<Arc<dyn ClassFilter>>) -> Self {
        Self { filters }
    }
}

impl ClassFilter for IntersectionClassFilter {
    fn matches(&self, class: &Class) -> bool {
        self.filters.iter().all(|f| f.matches(class))
    }
}
