//! 类型层次相关的工具函数

use std::collections::HashSet;
use std::sync::Arc;

use crate::reflect::{Class, ClassMeta, Method, MethodMeta, Signature};

/// 生成类名中的分隔符，例如 `Person$$EnhancerByWeave$$1a2b`
pub const GENERATED_CLASS_SEPARATOR: &str = "$$";

/// `b` 是否可以赋值给 `a`：同一类型，或 `a` 是 `b` 的父类/接口（传递）
pub fn is_assignable_from(a: &ClassMeta, b: &ClassMeta) -> bool {
    is_assignable_to_name(b, a.name())
}

/// `class` 的类型层次中是否包含名为 `type_name` 的类型
pub fn is_assignable_to_name(class: &ClassMeta, type_name: &str) -> bool {
    if class.name() == type_name {
        return true;
    }
    if class
        .interfaces()
        .iter()
        .any(|i| is_assignable_to_name(i, type_name))
    {
        return true;
    }
    class
        .superclass()
        .is_some_and(|s| is_assignable_to_name(s, type_name))
}

/// 方法能否在子类中被覆盖
pub fn is_overridable(method: &MethodMeta) -> bool {
    !method.is_static() && method.is_public()
}

/// 获取最具体的方法
///
/// 给定一个方法句柄（可能来自接口或父类）和目标类，返回目标类层次上对应的覆盖实现。
/// 找不到覆盖、方法不可覆盖、或方法本身就声明在目标类上时返回原句柄。
/// 桥接方法永远不会被返回。
pub fn get_most_specific_method(method: &Method, target_class: &ClassMeta) -> Method {
    if !is_overridable(method) || method.declaring_class() == target_class.name() {
        return Arc::clone(method);
    }

    let mut current = Some(target_class);
    while let Some(class) = current {
        if let Some(found) = class
            .get_declared_method(method.signature())
            .filter(|m| !m.is_bridge())
        {
            return Arc::clone(found);
        }
        current = class.superclass().map(|c| c.as_ref());
    }

    Arc::clone(method)
}

/// 所有公共方法（本类声明 + 继承），子类覆盖会遮蔽父类型的同签名方法
///
/// 顺序：本类声明 -> 父类链 -> 接口（深度优先）。桥接方法被忽略。
pub fn all_public_methods(class: &ClassMeta) -> Vec<Method> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    collect_public_methods(class, &mut seen, &mut result);
    result
}

fn collect_public_methods(
    class: &ClassMeta,
    seen: &mut HashSet<Signature>,
    result: &mut Vec<Method>,
) {
    for method in class.declared_methods() {
        if method.is_public() && !method.is_bridge() && seen.insert(method.signature().clone()) {
            result.push(Arc::clone(method));
        }
    }
    if let Some(superclass) = class.superclass() {
        collect_public_methods(superclass, seen, result);
    }
    for interface in class.interfaces() {
        collect_public_methods(interface, seen, result);
    }
}

/// 按签名查找公共方法（包括继承的）
pub fn find_method(class: &ClassMeta, signature: &Signature) -> Option<Method> {
    all_public_methods(class)
        .into_iter()
        .find(|m| m.signature() == signature)
}

/// 类型层次上的所有类型（含自身），父类优先于接口，去重
pub fn all_supertypes(class: &Class) -> Vec<Class> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    collect_supertypes(class, &mut seen, &mut result);
    result
}

fn collect_supertypes(class: &Class, seen: &mut HashSet<String>, result: &mut Vec<Class>) {
    if !seen.insert(class.name().to_string()) {
        return;
    }
    result.push(Arc::clone(class));
    if let Some(superclass) = class.superclass() {
        collect_supertypes(superclass, seen, result);
    }
    for interface in class.interfaces() {
        collect_supertypes(interface, seen, result);
    }
}

/// 是否为运行时生成的类
pub fn is_generated_class(class: &ClassMeta) -> bool {
    class.name().contains(GENERATED_CLASS_SEPARATOR)
}

/// 对生成的类返回用户定义的父类，否则返回自身
pub fn get_user_class(class: &Class) -> Class {
    if is_generated_class(class) {
        if let Some(superclass) = class.superclass() {
            return Arc::clone(superclass);
        }
    }
    Arc::clone(class)
}
