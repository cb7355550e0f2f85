//! 切点适用性判断

use std::sync::Arc;

use weave_core::reflect::class_utils::all_public_methods;
use weave_core::Class;

use crate::advisor::PointcutAdvisor;
use crate::pointcut::Pointcut;

/// 切点能否适用于类型上的至少一个方法
pub fn can_apply(pointcut: &dyn Pointcut, target_class: &Class) -> bool {
    if !pointcut.class_filter().matches(target_class) {
        return false;
    }

    let matcher = pointcut.method_matcher();
    if matcher.matches_every_method() {
        return true;
    }

    all_public_methods(target_class)
        .iter()
        .filter(|m| !m.is_static())
        .any(|m| matcher.matches(m, target_class))
}

/// 过滤出能适用于类型的 Advisor，保持原有顺序
pub fn find_advisors_that_can_apply(
    candidates: &[Arc<dyn PointcutAdvisor>],
    target_class: &Class,
) -> Vec<Arc<dyn PointcutAdvisor>> {
    candidates
        .iter()
        .filter(|advisor| can_apply(advisor.pointcut(), target_class))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::interceptor;
    use crate::advisor::DefaultPointcutAdvisor;
    use crate::pointcut::AnnotationMatchingPointcut;
    use weave_core::reflect::void;
    use weave_core::{ClassMeta, MethodMeta};

    #[test]
    fn test_can_apply_checks_methods() {
        let audited = ClassMeta::annotation("Audited").build().unwrap();
        let with_audit = ClassMeta::builder("test.Ledger")
            .with_method(
                MethodMeta::new("post")
                    .with_annotation(audited.clone())
                    .with_invoker(|_, _| Ok(void())),
            )
            .build()
            .unwrap();
        let without = ClassMeta::builder("test.Notes")
            .with_method(MethodMeta::new("post").with_invoker(|_, _| Ok(void())))
            .build()
            .unwrap();

        let pointcut = AnnotationMatchingPointcut::for_method_annotation(&audited).unwrap();
        assert!(can_apply(&pointcut, &with_audit));
        assert!(!can_apply(&pointcut, &without));

        let advisor: Arc<dyn PointcutAdvisor> = Arc::new(DefaultPointcutAdvisor::with_pointcut(
            Arc::new(pointcut),
            interceptor("noop", |invocation| invocation.proceed()),
        ));
        assert_eq!(find_advisors_that_can_apply(&[advisor.clone()], &with_audit).len(), 1);
        assert!(find_advisors_that_can_apply(&[advisor], &without).is_empty());
    }
}
