//! 反射能力层
//!
//! 以显式注册的元数据替代运行时反射：类型、方法、构造器、注解都是普通的 Rust 值，
//! 在启动阶段构建并注册，之后只读共享。

pub mod annotation_utils;
pub mod class;
pub mod class_utils;
pub mod member;
pub mod registry;

pub use class::{Class, ClassBuilder, ClassKind, ClassMeta};
pub use member::{
    arg, expect_args, instance, receiver, void, AbstractMethodError, Constructor,
    ConstructorFactory, ConstructorMeta, Instance, Method, MethodInvoker, MethodMeta, Modifiers,
    Signature, CONSTRUCTOR_NAME, VOID,
};
pub use registry::{
    build_annotation, get_global_class_registry, ClassRegistration, ClassRegistry,
};
