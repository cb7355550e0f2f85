//! weave-core: 元数据与基础设施
//!
//! 提供匹配与代理子系统依赖的基础能力：
//! - 显式注册的反射元数据（类型、方法、构造器、注解）
//! - 可列举的 Bean 注册表与 BeanPostProcessor
//! - 配置（Environment + PropertySource）与日志初始化
//! - 统一的错误类型

pub mod bean_factory;
pub mod bean_post_processor;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod reflect;
pub mod utils;

// 重新导出常用类型
pub use bean_factory::{
    BeanFactory, DefaultListableBeanFactory, ListableBeanFactory, ListableBeanFactoryExt,
};
pub use bean_post_processor::BeanPostProcessor;
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use error::{ArgumentError, ContainerError, ContainerResult, InvocationError, Throwable};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use reflect::{
    Class, ClassKind, ClassMeta, ClassRegistration, ClassRegistry, Constructor, ConstructorMeta,
    Instance, Method, MethodMeta, Signature,
};

// 导出 inventory，供宏使用
pub use inventory;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::bean_factory::{
        BeanFactory, DefaultListableBeanFactory, ListableBeanFactory, ListableBeanFactoryExt,
    };
    pub use crate::bean_post_processor::BeanPostProcessor;
    pub use crate::config::{ConfigValue, Environment, MapPropertySource, PropertySource};
    pub use crate::error::{ContainerError, ContainerResult, InvocationError, Throwable};
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::reflect::annotation_utils;
    pub use crate::reflect::class_utils;
    pub use crate::reflect::{
        arg, expect_args, instance, receiver, void, Class, ClassMeta, ClassRegistry,
        ConstructorMeta, Instance, Method, MethodMeta, Signature,
    };
}
