//! 类型注册表
//!
//! 运行时没有类加载器，类型元数据在启动阶段显式注册：
//! - 手动调用 `ClassRegistry::register`
//! - 通过 `inventory::submit!` 提交 `ClassRegistration`（`#[derive(Annotation)]` 会自动生成），
//!   再由 `auto_load` 统一构建

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::{ContainerError, ContainerResult};
use crate::reflect::{Class, ClassMeta};

/// 类型构建函数
pub type ClassBuilderFn = fn(&ClassRegistry) -> ContainerResult<Class>;

/// 类型注册器
///
/// 用于 inventory 自动收集，`depends_on` 中的类型会先于本类型构建
pub struct ClassRegistration {
    pub name: &'static str,
    pub depends_on: &'static [&'static str],
    pub build: ClassBuilderFn,
}

impl ClassRegistration {
    pub const fn new(
        name: &'static str,
        depends_on: &'static [&'static str],
        build: ClassBuilderFn,
    ) -> Self {
        Self {
            name,
            depends_on,
            build,
        }
    }
}

inventory::collect!(ClassRegistration);

/// 获取所有通过 inventory 提交的类型注册器
pub fn get_all_class_registrations() -> impl Iterator<Item = &'static ClassRegistration> {
    inventory::iter::<ClassRegistration>()
}

/// 构建一个注解类型，元注解从注册表中解析
pub fn build_annotation(
    registry: &ClassRegistry,
    name: &str,
    meta_annotations: &[&str],
) -> ContainerResult<Class> {
    let mut builder = ClassMeta::annotation(name);
    for meta in meta_annotations {
        builder = builder.with_annotation(registry.for_name(meta)?);
    }
    builder.build()
}

/// 全局类型注册表
///
/// 第一次访问时从 inventory 自动加载
static GLOBAL_CLASS_REGISTRY: Lazy<Arc<ClassRegistry>> = Lazy::new(|| {
    let registry = ClassRegistry::new();
    if let Err(e) = registry.auto_load() {
        tracing::error!("Failed to auto-load class registrations: {}", e);
    }
    Arc::new(registry)
});

/// 获取全局类型注册表
pub fn get_global_class_registry() -> &'static Arc<ClassRegistry> {
    &GLOBAL_CLASS_REGISTRY
}

/// 类型注册表：名称 -> 类型元数据
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Class>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册类型
    ///
    /// 同名类型只能注册一次；重复注册同一个句柄是幂等的。
    pub fn register(&self, class: Class) -> ContainerResult<Class> {
        let mut classes = self.classes.write();
        if let Some(existing) = classes.get(class.name()) {
            if Arc::ptr_eq(existing, &class) {
                return Ok(class);
            }
            return Err(ContainerError::ClassAlreadyRegistered(class.name().to_string()));
        }
        tracing::debug!("Registering class: {}", class.name());
        classes.insert(class.name().to_string(), Arc::clone(&class));
        Ok(class)
    }

    /// 按名称查找类型
    pub fn for_name(&self, name: &str) -> ContainerResult<Class> {
        self.get(name)
            .ok_or_else(|| ContainerError::ClassNotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Class> {
        self.classes.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// 从 inventory 加载所有类型注册器
    ///
    /// 按依赖关系多轮构建，直到没有新的类型可以构建。
    /// 仍有未解析的依赖时返回 `InvalidClassDefinition`。
    pub fn auto_load(&self) -> ContainerResult<usize> {
        self.load_registrations(get_all_class_registrations())
    }

    /// 加载一组注册器（测试与自定义启动流程使用）
    pub fn load_registrations<'a>(
        &self,
        registrations: impl IntoIterator<Item = &'a ClassRegistration>,
    ) -> ContainerResult<usize> {
        let mut pending: Vec<&ClassRegistration> = registrations
            .into_iter()
            .filter(|r| !self.contains(r.name))
            .collect();
        tracing::info!("Auto-loading {} class registration(s)", pending.len());

        let mut loaded = 0;
        while !pending.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|r| r.depends_on.iter().all(|d| self.contains(d)));

            if ready.is_empty() {
                let unresolved: Vec<_> = blocked.iter().map(|r| r.name).collect();
                return Err(ContainerError::InvalidClassDefinition {
                    class: unresolved.join(", "),
                    reason: "unresolved dependencies".to_string(),
                });
            }

            for registration in ready {
                tracing::debug!("  ├─ Loading class: {}", registration.name);
                let class = (registration.build)(self)?;
                self.register(class)?;
                loaded += 1;
            }
            pending = blocked;
        }

        tracing::info!("Auto-loaded {} class(es)", loaded);
        Ok(loaded)
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.class_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static REGISTRATIONS: &[ClassRegistration] = &[
        ClassRegistration::new("Repository", &["Component"], |r| {
            build_annotation(r, "Repository", &["Component"])
        }),
        ClassRegistration::new("Component", &[], |r| build_annotation(r, "Component", &[])),
    ];

    #[test]
    fn test_register_and_lookup() {
        let registry = ClassRegistry::new();
        let class = ClassMeta::builder("Person").build().unwrap();
        registry.register(class.clone()).unwrap();

        assert!(Arc::ptr_eq(&registry.for_name("Person").unwrap(), &class));
        assert!(registry.register(class).is_ok());
        assert!(matches!(
            registry.for_name("Missing"),
            Err(ContainerError::ClassNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = ClassRegistry::new();
        registry
            .register(ClassMeta::builder("Person").build().unwrap())
            .unwrap();
        let err = registry
            .register(ClassMeta::builder("Person").build().unwrap())
            .unwrap_err();
        assert!(matches!(err, ContainerError::ClassAlreadyRegistered(_)));
    }

    #[test]
    fn test_load_registrations_resolves_dependencies() {
        let registry = ClassRegistry::new();
        let loaded = registry.load_registrations(REGISTRATIONS).unwrap();
        assert_eq!(loaded, 2);

        let repository = registry.for_name("Repository").unwrap();
        assert_eq!(repository.annotations()[0].name(), "Component");
    }

    #[test]
    fn test_load_registrations_reports_unresolved() {
        static BROKEN: &[ClassRegistration] = &[ClassRegistration::new(
            "Service",
            &["Missing"],
            |r| build_annotation(r, "Service", &["Missing"]),
        )];
        let registry = ClassRegistry::new();
        assert!(registry.load_registrations(BROKEN).is_err());
    }
}
