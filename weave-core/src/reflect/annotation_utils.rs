//! 注解查找
//!
//! 两种语义：
//! - `is_annotation_present`：只看直接声明
//! - `has_annotation`：感知元注解，并沿接口、父类向上查找，命中即停

use std::collections::HashSet;

use crate::reflect::class_utils::all_supertypes;
use crate::reflect::{Class, ClassMeta, MethodMeta};

/// 注解是否直接声明在类型上
pub fn is_annotation_present(class: &ClassMeta, annotation: &ClassMeta) -> bool {
    class.annotations().iter().any(|a| a.name() == annotation.name())
}

/// 注解是否直接声明在方法上
pub fn is_method_annotation_present(method: &MethodMeta, annotation: &ClassMeta) -> bool {
    method
        .annotations()
        .iter()
        .any(|a| a.name() == annotation.name())
}

/// 在类型、元注解、接口、父类上查找注解
pub fn has_annotation(class: &ClassMeta, annotation: &ClassMeta) -> bool {
    let mut visited = HashSet::new();
    search_class(class, annotation, &mut visited)
}

fn search_class(class: &ClassMeta, annotation: &ClassMeta, visited: &mut HashSet<String>) -> bool {
    if search_annotations(class.annotations(), annotation, visited) {
        return true;
    }
    if class
        .interfaces()
        .iter()
        .any(|i| search_class(i, annotation, visited))
    {
        return true;
    }
    class
        .superclass()
        .is_some_and(|s| search_class(s, annotation, visited))
}

/// 在一组注解及其元注解中查找，`visited` 防止元注解循环
fn search_annotations(
    declared: &[Class],
    annotation: &ClassMeta,
    visited: &mut HashSet<String>,
) -> bool {
    if declared.iter().any(|a| a.name() == annotation.name()) {
        return true;
    }
    for declared_annotation in declared {
        if visited.insert(declared_annotation.name().to_string())
            && search_annotations(declared_annotation.annotations(), annotation, visited)
        {
            return true;
        }
    }
    false
}

/// 沿父类链查找直接声明了注解的第一个类型
pub fn find_annotation_declaring_class(class: &Class, annotation: &ClassMeta) -> Option<Class> {
    let mut current = Some(class);
    while let Some(candidate) = current {
        if is_annotation_present(candidate, annotation) {
            return Some(candidate.clone());
        }
        current = candidate.superclass();
    }
    None
}

/// 在方法及其被覆盖的方法上查找注解
///
/// 先看方法本身（含元注解），再看 `target_class` 类型层次上同签名的声明。
pub fn has_method_annotation(
    method: &MethodMeta,
    target_class: &Class,
    annotation: &ClassMeta,
) -> bool {
    let mut visited = HashSet::new();
    if search_annotations(method.annotations(), annotation, &mut visited) {
        return true;
    }

    all_supertypes(target_class).iter().any(|class| {
        class
            .get_declared_method(method.signature())
            .is_some_and(|m| search_annotations(m.annotations(), annotation, &mut visited))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::MethodMeta;

    #[test]
    fn test_direct_and_inherited_lookup() {
        let marker = ClassMeta::annotation("Marker").build().unwrap();
        let base = ClassMeta::builder("Base")
            .with_annotation(marker.clone())
            .build()
            .unwrap();
        let child = ClassMeta::builder("Child")
            .with_superclass(base.clone())
            .build()
            .unwrap();

        assert!(is_annotation_present(&base, &marker));
        assert!(!is_annotation_present(&child, &marker));
        assert!(has_annotation(&child, &marker));
        assert_eq!(
            find_annotation_declaring_class(&child, &marker).map(|c| c.name().to_string()),
            Some("Base".to_string())
        );
    }

    #[test]
    fn test_meta_annotation_and_interface_lookup() {
        let component = ClassMeta::annotation("Component").build().unwrap();
        let repository = ClassMeta::annotation("Repository")
            .with_annotation(component.clone())
            .build()
            .unwrap();
        let api = ClassMeta::interface("UserRepository")
            .with_annotation(repository.clone())
            .build()
            .unwrap();
        let imp = ClassMeta::builder("JdbcUserRepository")
            .with_interface(api)
            .build()
            .unwrap();

        assert!(has_annotation(&imp, &repository));
        assert!(has_annotation(&imp, &component));
        assert!(!is_annotation_present(&imp, &repository));
    }

    #[test]
    fn test_method_annotation_on_interface_declaration() {
        let cacheable = ClassMeta::annotation("Cacheable").build().unwrap();
        let api = ClassMeta::interface("Api")
            .with_method(MethodMeta::new("load").with_annotation(cacheable.clone()))
            .build()
            .unwrap();
        let imp = ClassMeta::builder("Impl")
            .with_interface(api)
            .with_method(MethodMeta::new("load").with_invoker(|_, _| Ok(crate::reflect::void())))
            .build()
            .unwrap();

        let method = imp.declared_methods()[0].clone();
        assert!(!is_method_annotation_present(&method, &cacheable));
        assert!(has_method_annotation(&method, &imp, &cacheable));
    }
}
