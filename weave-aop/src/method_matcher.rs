//! 方法匹配器
//!
//! 判断一个横切行为是否适用于某个类型上的某个方法。
//! 静态匹配器（`is_runtime() == false`）的结果只取决于 (方法, 目标类型)，
//! 调用方可以缓存匹配结果。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use regex::Regex;
use weave_core::reflect::annotation_utils::{has_method_annotation, is_method_annotation_present};
use weave_core::reflect::class_utils::get_most_specific_method;
use weave_core::{Class, Instance, Method};

use crate::class_filter::ClassFilter;
use crate::error::{AopError, AopResult};

pub trait MethodMatcher: Send + Sync {
    /// 静态匹配
    fn matches(&self, method: &Method, target_class: &Class) -> bool;

    /// 是否需要在每次调用时结合参数再次匹配
    fn is_runtime(&self) -> bool {
        false
    }

    /// 运行时匹配，只在 `is_runtime()` 为 true 且静态匹配通过后调用
    fn matches_with_args(&self, method: &Method, target_class: &Class, _args: &[Instance]) -> bool {
        self.matches(method, target_class)
    }

    /// 是否匹配任何方法，为 true 时调用方可以跳过逐个方法的检查
    fn matches_every_method(&self) -> bool {
        false
    }
}

/// 匹配所有方法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrueMethodMatcher;

impl MethodMatcher for TrueMethodMatcher {
    fn matches(&self, _method: &Method, _target_class: &Class) -> bool {
        true
    }

    fn matches_every_method(&self) -> bool {
        true
    }
}

impl fmt::Display for TrueMethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MethodMatcher.TRUE")
    }
}

/// 按注解匹配方法
///
/// 先检查给定的方法句柄；没有命中时解析目标类型上最具体的实现，
/// 只有解析结果是另一个句柄时才再检查一次。
#[derive(Clone)]
pub struct AnnotationMethodMatcher {
    annotation: Class,
    check_inherited: bool,
}

impl AnnotationMethodMatcher {
    pub fn new(annotation: &Class) -> AopResult<Self> {
        Self::with_inherited(annotation, false)
    }

    /// `check_inherited` 为 true 时同时查找元注解，以及目标类型层次上同签名方法的注解
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

    pub fn annotation_type(&self) -> &Class {
        &self.annotation
    }

    pub fn check_inherited(&self) -> bool {
        self.check_inherited
    }

    fn matches_method(&self, method: &Method, target_class: &Class) -> bool {
        if self.check_inherited {
            has_method_annotation(method, target_class, &self.annotation)
        } else {
            is_method_annotation_present(method, &self.annotation)
        }
    }
}

impl MethodMatcher for AnnotationMethodMatcher {
    fn matches(&self, method: &Method, target_class: &Class) -> bool {
        if self.matches_method(method, target_class) {
            return true;
        }

        let specific = get_most_specific_method(method, target_class);
        if Arc::ptr_eq(&specific, method) {
            return false;
        }

        let matched = self.matches_method(&specific, target_class);
        tracing::trace!(
            "{} resolved {} to {} on {}: {}",
            self,
            method,
            specific,
            target_class.name(),
            matched
        );
        matched
    }
}

impl PartialEq for AnnotationMethodMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.annotation.name() == other.annotation.name()
            && self.check_inherited == other.check_inherited
    }
}

impl Eq for AnnotationMethodMatcher {}

impl Hash for AnnotationMethodMatcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.annotation.name().hash(state);
        self.check_inherited.hash(state);
    }
}

impl fmt::Debug for AnnotationMethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationMethodMatcher")
            .field("annotation", &self.annotation.name())
            .field("check_inherited", &self.check_inherited)
            .finish()
    }
}

impl fmt::Display for AnnotationMethodMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationMethodMatcher: @{}", self.annotation.name())
    }
}

/// 按方法名匹配，支持 `*` 通配符
///
/// - `*` - 匹配任意名称
/// - `get*` - 以 get 开头
/// - `*Service` - 以 Service 结尾
/// - `*User*` - 包含 User
#[derive(Clone, Debug)]
pub struct NameMatchMethodMatcher {
    patterns: Vec<(String, Option<Regex>)>,
}

impl NameMatchMethodMatcher {
    pub fn new<I, S>(patterns: I) -> AopResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern: String = pattern.into();
                if !pattern.contains('*') {
                    return Ok((pattern, None));
                }
                let regex = pattern
                    .split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                let regex = Regex::new(&format!("^{regex}$")).map_err(|e| {
                    AopError::invalid_argument(format!("invalid name pattern {pattern}: {e}"))
                })?;
                Ok((pattern, Some(regex)))
            })
            .collect::<AopResult<Vec<_>>>()?;

        if patterns.is_empty() {
            return Err(AopError::invalid_argument(
                "at least one method name pattern is required",
            ));
        }
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(p, _)| p.as_str())
    }

    fn is_match(&self, name: &str) -> bool {
        self.patterns.iter().any(|(pattern, regex)| match regex {
            Some(regex) => regex.is_match(name),
            None => pattern == name,
        })
    }
}

impl MethodMatcher for NameMatchMethodMatcher {
    fn matches(&self, method: &Method, _target_class: &Class) -> bool {
        self.is_match(method.name())
    }
}

/// 任意一个匹配器匹配即匹配；每个匹配器可以带一个类型过滤器，
/// 用于合并两个切点时保留各自的类型条件
#[derive(Clone)]
pub struct UnionMethodMatcher {
    members: Vec<(Arc<dyn MethodMatcher>, Option<Arc<dyn ClassFilter>>)>,
}

impl UnionMethodMatcher {
    pub fn new(matchers: Vec<Arc<dyn MethodMatcher>>) -> Self {
        Self {
            members: matchers.into_iter().map(|m| (m, None)).collect(),
        }
    }

    /// 带类型过滤器的合并
    pub fn class_aware(members: Vec<(Arc<dyn MethodMatcher>, Arc<dyn ClassFilter>)>) -> Self {
        Self {
            members: members.into_iter().map(|(m, f)| (m, Some(f))).collect(),
        }
    }

    fn applies(filter: &Option<Arc<dyn ClassFilter>>, target_class: &Class) -> bool {
        filter.as_ref().map_or(true, |f| f.matches(target_class))
    }
}

impl MethodMatcher for UnionMethodMatcher {
    fn matches(&self, method: &Method, target_class: &Class) -> bool {
        self.members
            .iter()
            .any(|(m, f)| Self::applies(f, target_class) && m.matches(method, target_class))
    }

    fn is_runtime(&self) -> bool {
        self.members.iter().any(|(m, _)| m.is_runtime())
    }

    fn matches_with_args(&self, method: &Method, target_class: &Class, args: &[Instance]) -> bool {
        self.members.iter().any(|(m, f)| {
            Self::applies(f, target_class)
                && m.matches(method, target_class)
                && (!m.is_runtime() || m.matches_with_args(method, target_class, args))
        })
    }

    fn matches_every_method(&self) -> bool {
        self.members
            .iter()
            .any(|(m, f)| f.is_none() && m.matches_every_method())
    }
}

/// 所有匹配器都匹配才匹配
#[derive(Clone)]
pub struct IntersectionMethodMatcher {
    matchers: Vec<Arc<dyn MethodMatcher>>,
}

impl IntersectionMethodMatcher {
    pub fn new(matchers: Vec<Arc<dyn MethodMatcher>>) -> Self {
        Self { matchers }
    }
}

impl MethodMatcher for IntersectionMethodMatcher {
    fn matches(&self, method: &Method, target_class: &Class) -> bool {
        self.matchers.iter().all(|m| m.matches(method, target_class))
    }

    fn is_runtime(&self) -> bool {
        self.matchers.iter().any(|m| m.is_runtime())
    }

    fn matches_with_args(&self, method: &Method, target_class: &Class, args: &[Instance]) -> bool {
        self.matchers
            .iter()
            .all(|m| !m.is_runtime() || m.matches_with_args(method, target_class, args))
    }

    fn matches_every_method(&self) -> bool {
        self.matchers.iter().all(|m| m.matches_every_method())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::reflect::{instance, void};
    use weave_core::{ClassMeta, MethodMeta};

    struct Fixture {
        cacheable: Class,
        service: Class,
        concrete: Class,
    }

    /// interface Service { find(); count(); }
    /// class ConcreteService implements Service { @Cacheable find(); count(); }
    fn fixture() -> Fixture {
        let cacheable = ClassMeta::annotation("Cacheable").build().unwrap();
        let service = ClassMeta::interface("test.Service")
            .with_method(MethodMeta::new("find").with_return_type("String"))
            .with_method(MethodMeta::new("count").with_return_type("i64"))
            .build()
            .unwrap();
        let concrete = ClassMeta::builder("test.ConcreteService")
            .with_interface(service.clone())
            .with_method(
                MethodMeta::new("find")
                    .with_return_type("String")
                    .with_annotation(cacheable.clone())
                    .with_invoker(|_, _| Ok(instance("found".to_string()))),
            )
            .with_method(
                MethodMeta::new("count")
                    .with_return_type("i64")
                    .with_invoker(|_, _| Ok(instance(0_i64))),
            )
            .build()
            .unwrap();

        Fixture {
            cacheable,
            service,
            concrete,
        }
    }

    fn interface_method(f: &Fixture, name: &str) -> Method {
        f.service
            .declared_methods()
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_matches_annotation_on_override() {
        let f = fixture();
        let matcher = AnnotationMethodMatcher::new(&f.cacheable).unwrap();
        let find = interface_method(&f, "find");

        assert!(!is_method_annotation_present(&find, &f.cacheable));
        assert!(matcher.matches(&find, &f.concrete));
        assert!(!matcher.matches(&interface_method(&f, "count"), &f.concrete));
        assert!(!matcher.is_runtime());
    }

    #[test]
    fn test_same_handle_is_not_rechecked() {
        let f = fixture();
        let matcher = AnnotationMethodMatcher::new(&f.cacheable).unwrap();

        // 接口本身没有实现，解析结果就是原句柄
        let find = interface_method(&f, "find");
        assert!(!matcher.matches(&find, &f.service));

        let direct = f.concrete.declared_methods()[0].clone();
        assert!(matcher.matches(&direct, &f.concrete));
    }

    #[test]
    fn test_inherited_mode_sees_meta_annotations() {
        let cacheable = ClassMeta::annotation("Cacheable").build().unwrap();
        let cached_read = ClassMeta::annotation("CachedRead")
            .with_annotation(cacheable.clone())
            .build()
            .unwrap();
        let class = ClassMeta::builder("test.Reader")
            .with_method(
                MethodMeta::new("read")
                    .with_annotation(cached_read)
                    .with_invoker(|_, _| Ok(void())),
            )
            .build()
            .unwrap();
        let read = class.declared_methods()[0].clone();

        assert!(!AnnotationMethodMatcher::new(&cacheable)
            .unwrap()
            .matches(&read, &class));
        assert!(AnnotationMethodMatcher::with_inherited(&cacheable, true)
            .unwrap()
            .matches(&read, &class));
    }

    #[test]
    fn test_equality() {
        let f = fixture();
        let a = AnnotationMethodMatcher::new(&f.cacheable).unwrap();
        let b = AnnotationMethodMatcher::new(&f.cacheable).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, AnnotationMethodMatcher::with_inherited(&f.cacheable, true).unwrap());
        assert!(AnnotationMethodMatcher::new(&f.service).is_err());
    }

    #[test]
    fn test_name_match_patterns() {
        let f = fixture();
        let matcher = NameMatchMethodMatcher::new(["fi*", "total"]).unwrap();
        assert!(matcher.matches(&interface_method(&f, "find"), &f.concrete));
        assert!(!matcher.matches(&interface_method(&f, "count"), &f.concrete));

        let dotted = NameMatchMethodMatcher::new(["a.*"]).unwrap();
        assert!(dotted.is_match("a.b"));
        assert!(!dotted.is_match("ab"));

        assert!(NameMatchMethodMatcher::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_union_and_intersection() {
        let f = fixture();
        let annotated: Arc<dyn MethodMatcher> =
            Arc::new(AnnotationMethodMatcher::new(&f.cacheable).unwrap());
        let named: Arc<dyn MethodMatcher> =
            Arc::new(NameMatchMethodMatcher::new(["count"]).unwrap());

        let union = UnionMethodMatcher::new(vec![annotated.clone(), named.clone()]);
        let intersection = IntersectionMethodMatcher::new(vec![annotated, named]);

        let find = interface_method(&f, "find");
        let count = interface_method(&f, "count");
        assert!(union.matches(&find, &f.concrete));
        assert!(union.matches(&count, &f.concrete));
        assert!(!intersection.matches(&find, &f.concrete));
        assert!(!intersection.matches(&count, &f.concrete));
    }
}
