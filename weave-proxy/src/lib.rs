//! weave-proxy: 快速调用与运行时代理类
//!
//! 在没有运行时类生成的前提下，以“元数据 + 分派表”的方式提供：
//! - `FastClass` / `FastMethod` / `FastConstructor`：按稠密索引调用方法与构造器
//! - `ConstructorDelegate`：把单方法工厂接口桥接到目标类的构造器
//! - `Enhancer`：为父类/接口生成代理类，方法分派到可插拔的回调
//! - `ImmutableBean` / `BeanCopier` / `BulkBean`：基于生成类的 Bean 工具
//!
//! 所有生成结果都缓存在 `ClassGenerator` 中，同一个键在并发首次访问时也只生成一次。

pub mod beans;
pub mod callback;
pub mod callback_helper;
pub mod constructor_delegate;
pub mod enhancer;
pub mod error;
pub mod fast_class;
pub mod fast_member;
pub mod generator;
pub mod naming;
pub mod settings;

pub use beans::{BeanCopier, BulkBean, Converter, ImmutableBean};
pub use callback::{
    Callback, CallbackFilter, CallbackKind, Dispatcher, FixedValue, MethodInterceptor,
};
pub use callback_helper::CallbackHelper;
pub use constructor_delegate::{ConstructorDelegate, DelegateClass};
pub use enhancer::{EnhancedClass, EnhancedObject, Enhancer, MethodProxy};
pub use error::{ProxyError, ProxyResult};
pub use fast_class::FastClass;
pub use fast_member::{FastConstructor, FastMember, FastMethod};
pub use generator::{get_global_class_generator, ClassGenerator, GenerationCache};
pub use settings::ProxySettings;
