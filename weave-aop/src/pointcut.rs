//! 切点
//!
//! 切点 = 类型过滤器 + 方法匹配器。调用点只有在两者都通过时才被通知。

use std::fmt;
use std::sync::Arc;

use weave_core::{Class, Instance, Method};

use crate::class_filter::{
    AnnotationClassFilter, ClassFilter, IntersectionClassFilter, TrueClassFilter,
    UnionClassFilter,
};
use crate::error::{AopError, AopResult};
use crate::method_matcher::{
    AnnotationMethodMatcher, IntersectionMethodMatcher, MethodMatcher, NameMatchMethodMatcher,
    TrueMethodMatcher, UnionMethodMatcher,
};

pub trait Pointcut: Send + Sync {
    fn class_filter(&self) -> &dyn ClassFilter;

    fn method_matcher(&self) -> &dyn MethodMatcher;
}

/// 匹配所有调用点
#[derive(Debug, Clone, Copy, Default)]
pub struct TruePointcut;

impl Pointcut for TruePointcut {
    fn class_filter(&self) -> &dyn ClassFilter {
        &TrueClassFilter
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        &TrueMethodMatcher
    }
}

/// 按类型注解和/或方法注解匹配
///
/// 未指定的一侧匹配一切。两侧都未指定是配置错误。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AnnotationMatchingPointcut {
    class_filter: Option<AnnotationClassFilter>,
    method_matcher: Option<AnnotationMethodMatcher>,
}

impl AnnotationMatchingPointcut {
    pub fn new(
        class_annotation: Option<&Class>,
        method_annotation: Option<&Class>,
    ) -> AopResult<Self> {
        Self::with_inherited(class_annotation, method_annotation, false)
    }

    pub fn with_inherited(
        class_annotation: Option<&Class>,
        method_annotation: Option<&Class>,
        check_inherited: bool,
    ) -> AopResult<Self> {
        if class_annotation.is_none() && method_annotation.is_none() {
            return Err(AopError::invalid_argument(
                "either class annotation or method annotation must be specified",
            ));
        }

        Ok(Self {
            class_filter: class_annotation
                .map(|a| AnnotationClassFilter::with_inherited(a, check_inherited))
                .transpose()?,
            method_matcher: method_annotation
                .map(|a| AnnotationMethodMatcher::with_inherited(a, check_inherited))
                .transpose()?,
        })
    }

    /// 只按类型注解匹配
    pub fn class_annotation_only(annotation: &Class, check_inherited: bool) -> AopResult<Self> {
        Self::with_inherited(Some(annotation), None, check_inherited)
    }

    /// 类型上声明了注解的所有方法
    pub fn for_class_annotation(annotation: &Class) -> AopResult<Self> {
        Self::new(Some(annotation), None)
    }

    /// 声明了注解的方法，不限类型
    pub fn for_method_annotation(annotation: &Class) -> AopResult<Self> {
        Self::new(None, Some(annotation))
    }
}

impl Pointcut for AnnotationMatchingPointcut {
    fn class_filter(&self) -> &dyn ClassFilter {
        match &self.class_filter {
            Some(filter) => filter as &dyn ClassFilter,
            None => &TrueClassFilter,
        }
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        match &self.method_matcher {
            Some(matcher) => matcher as &dyn MethodMatcher,
            None => &TrueMethodMatcher,
        }
    }
}

impl fmt::Debug for AnnotationMatchingPointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationMatchingPointcut")
            .field("class_filter", &self.class_filter)
            .field("method_matcher", &self.method_matcher)
            .finish()
    }
}

impl fmt::Display for AnnotationMatchingPointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnnotationMatchingPointcut: ")?;
        match &self.class_filter {
            Some(filter) => write!(f, "{filter}")?,
            None => write!(f, "{}", TrueClassFilter)?,
        }
        f.write_str(", ")?;
        match &self.method_matcher {
            Some(matcher) => write!(f, "{matcher}"),
            None => write!(f, "{}", TrueMethodMatcher),
        }
    }
}

/// 按方法名匹配，不限类型
#[derive(Clone, Debug)]
pub struct NameMatchMethodPointcut {
    matcher: NameMatchMethodMatcher,
}

impl NameMatchMethodPointcut {
    pub fn new<I, S>(patterns: I) -> AopResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            matcher: NameMatchMethodMatcher::new(patterns)?,
        })
    }
}

impl Pointcut for NameMatchMethodPointcut {
    fn class_filter(&self) -> &dyn ClassFilter {
        &TrueClassFilter
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        &self.matcher
    }
}

/// 可组合切点
///
/// 每次组合都产生新的过滤器/匹配器，原切点不变。
#[derive(Clone)]
pub struct ComposablePointcut {
    class_filter: Arc<dyn ClassFilter>,
    method_matcher: Arc<dyn MethodMatcher>,
}

impl ComposablePointcut {
    pub fn new() -> Self {
        Self {
            class_filter: Arc::new(TrueClassFilter),
            method_matcher: Arc::new(TrueMethodMatcher),
        }
    }

    pub fn from_parts(
        class_filter: Arc<dyn ClassFilter>,
        method_matcher: Arc<dyn MethodMatcher>,
    ) -> Self {
        Self {
            class_filter,
            method_matcher,
        }
    }

    /// 以已有切点为起点
    pub fn of<P: Pointcut + 'static>(pointcut: P) -> Self {
        let pointcut = Arc::new(pointcut);
        Self {
            class_filter: Arc::new(PointcutClassFilter(Arc::clone(&pointcut))),
            method_matcher: Arc::new(PointcutMethodMatcher(pointcut)),
        }
    }

    pub fn union_class_filter(mut self, other: Arc<dyn ClassFilter>) -> Self {
        self.class_filter = Arc::new(UnionClassFilter::new(vec![self.class_filter, other]));
        self
    }

    pub fn intersection_class_filter(mut self, other: Arc<dyn ClassFilter>) -> Self {
        self.class_filter = Arc::new(IntersectionClassFilter::new(vec![self.class_filter, other]));
        self
    }

    pub fn union_method_matcher(mut self, other: Arc<dyn MethodMatcher>) -> Self {
        self.method_matcher = Arc::new(UnionMethodMatcher::new(vec![self.method_matcher, other]));
        self
    }

    pub fn intersection_method_matcher(mut self, other: Arc<dyn MethodMatcher>) -> Self {
        self.method_matcher =
            Arc::new(IntersectionMethodMatcher::new(vec![self.method_matcher, other]));
        self
    }

    /// 与另一个切点求并：任一切点匹配即匹配，各自的类型条件只约束各自的方法匹配器
    pub fn union(self, other: &ComposablePointcut) -> Self {
        let method_matcher = UnionMethodMatcher::class_aware(vec![
            (self.method_matcher, Arc::clone(&self.class_filter)),
            (Arc::clone(&other.method_matcher), Arc::clone(&other.class_filter)),
        ]);
        Self {
            class_filter: Arc::new(UnionClassFilter::new(vec![
                self.class_filter,
                Arc::clone(&other.class_filter),
            ])),
            method_matcher: Arc::new(method_matcher),
        }
    }

    /// 与另一个切点求交
    pub fn intersection(self, other: &ComposablePointcut) -> Self {
        self.intersection_class_filter(Arc::clone(&other.class_filter))
            .intersection_method_matcher(Arc::clone(&other.method_matcher))
    }
}

impl Default for ComposablePointcut {
    fn default() -> Self {
        Self::new()
    }
}

impl Pointcut for ComposablePointcut {
    fn class_filter(&self) -> &dyn ClassFilter {
        self.class_filter.as_ref()
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        self.method_matcher.as_ref()
    }
}

struct PointcutClassFilter<P>(Arc<P>);

impl<P: Pointcut> ClassFilter for PointcutClassFilter<P> {
    fn matches(&self, class: &Class) -> bool {
        self.0.class_filter().matches(class)
    }
}

struct PointcutMethodMatcher<P>(Arc<P>);

impl<P: Pointcut> MethodMatcher for PointcutMethodMatcher<P> {
    fn matches(&self, method: &Method, target_class: &Class) -> bool {
        self.0.method_matcher().matches(method, target_class)
    }

    fn is_runtime(&self) -> bool {
        self.0.method_matcher().is_runtime()
    }

    fn matches_with_args(
        &self,
        method: &Method,
        target_class: &Class,
        args: &[Instance],
    ) -> bool {
        self.0
            .method_matcher()
            .matches_with_args(method, target_class, args)
    }

    fn matches_every_method(&self) -> bool {
        self.0.method_matcher().matches_every_method()
    }
}

impl<T: Pointcut + ?Sized> Pointcut for Arc<T> {
    fn class_filter(&self) -> &dyn ClassFilter {
        (**self).class_filter()
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        (**self).method_matcher()
    }
}

/// 切点与 (方法, 类型) 是否静态匹配
pub fn matches(pointcut: &dyn Pointcut, method: &Method, target_class: &Class) -> bool {
    pointcut.class_filter().matches(target_class)
        && pointcut.method_matcher().matches(method, target_class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::reflect::void;
    use weave_core::{ClassMeta, MethodMeta};

    struct Fixture {
        repository: Class,
        transactional: Class,
        annotated_dao: Class,
        plain_dao: Class,
    }

    fn fixture() -> Fixture {
        let repository = ClassMeta::annotation("Repository").build().unwrap();
        let transactional = ClassMeta::annotation("Transactional").build().unwrap();

        let annotated_dao = ClassMeta::builder("test.AnnotatedDao")
            .with_annotation(repository.clone())
            .with_method(
                MethodMeta::new("save")
                    .with_annotation(transactional.clone())
                    .with_invoker(|_, _| Ok(void())),
            )
            .with_method(MethodMeta::new("load").with_invoker(|_, _| Ok(void())))
            .build()
            .unwrap();
        let plain_dao = ClassMeta::builder("test.PlainDao")
            .with_method(
                MethodMeta::new("save")
                    .with_annotation(transactional.clone())
                    .with_invoker(|_, _| Ok(void())),
            )
            .build()
            .unwrap();

        Fixture {
            repository,
            transactional,
            annotated_dao,
            plain_dao,
        }
    }

    fn method(class: &Class, name: &str) -> Method {
        class
            .declared_methods()
            .iter()
            .find(|m| m.name() == name)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_requires_at_least_one_annotation() {
        let err = AnnotationMatchingPointcut::new(None, None).unwrap_err();
        assert!(matches!(err, AopError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_side_matches_everything() {
        let f = fixture();
        let by_class = AnnotationMatchingPointcut::for_class_annotation(&f.repository).unwrap();
        assert!(by_class.method_matcher().matches_every_method());
        assert!(matches(&by_class, &method(&f.annotated_dao, "load"), &f.annotated_dao));
        assert!(!matches(&by_class, &method(&f.plain_dao, "save"), &f.plain_dao));

        let by_method =
            AnnotationMatchingPointcut::for_method_annotation(&f.transactional).unwrap();
        assert!(by_method.class_filter().matches(&f.plain_dao));
        assert!(matches(&by_method, &method(&f.plain_dao, "save"), &f.plain_dao));
        assert!(!matches(&by_method, &method(&f.annotated_dao, "load"), &f.annotated_dao));
    }

    #[test]
    fn test_both_sides_must_match() {
        let f = fixture();
        let pointcut =
            AnnotationMatchingPointcut::new(Some(&f.repository), Some(&f.transactional)).unwrap();

        assert!(matches(&pointcut, &method(&f.annotated_dao, "save"), &f.annotated_dao));
        assert!(!matches(&pointcut, &method(&f.annotated_dao, "load"), &f.annotated_dao));
        assert!(!matches(&pointcut, &method(&f.plain_dao, "save"), &f.plain_dao));
    }

    #[test]
    fn test_equality_and_display() {
        let f = fixture();
        let a = AnnotationMatchingPointcut::class_annotation_only(&f.repository, true).unwrap();
        let b = AnnotationMatchingPointcut::class_annotation_only(&f.repository, true).unwrap();
        let c = AnnotationMatchingPointcut::class_annotation_only(&f.repository, false).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            a.to_string(),
            "AnnotationMatchingPointcut: AnnotationClassFilter: @Repository, MethodMatcher.TRUE"
        );
    }

    #[test]
    fn test_composable_union_keeps_class_conditions() {
        let f = fixture();
        let repository_loads = ComposablePointcut::of(
            AnnotationMatchingPointcut::for_class_annotation(&f.repository).unwrap(),
        )
        .intersection_method_matcher(Arc::new(NameMatchMethodMatcher::new(["load"]).unwrap()));
        let saves = ComposablePointcut::of(NameMatchMethodPointcut::new(["save"]).unwrap());

        let union = repository_loads.union(&saves);
        assert!(matches(&union, &method(&f.annotated_dao, "load"), &f.annotated_dao));
        assert!(matches(&union, &method(&f.plain_dao, "save"), &f.plain_dao));

        let load_on_plain = MethodMeta::new("load").with_invoker(|_, _| Ok(void()));
        let plain_with_load = ClassMeta::builder("test.PlainWithLoad")
            .with_method(load_on_plain)
            .build()
            .unwrap();
        assert!(!matches(
            &union,
            &method(&plain_with_load, "load"),
            &plain_with_load
        ));
    }

    #[test]
    fn test_composable_intersection() {
        let f = fixture();
        let pointcut = ComposablePointcut::new()
            .intersection(&ComposablePointcut::of(
                AnnotationMatchingPointcut::for_method_annotation(&f.transactional).unwrap(),
            ))
            .intersection_class_filter(Arc::new(
                AnnotationClassFilter::new(&f.repository).unwrap(),
            ));

        assert!(matches(&pointcut, &method(&f.annotated_dao, "save"), &f.annotated_dao));
        assert!(!matches(&pointcut, &method(&f.plain_dao, "save"), &f.plain_dao));
    }
}
