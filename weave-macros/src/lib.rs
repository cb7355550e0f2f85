//! Weave 过程宏
//!
//! - `#[derive(Annotation)]` - 把一个单元结构体声明为注解类型，并在编译时注册到类型注册表

extern crate proc_macro;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod annotation;

/// `#[derive(Annotation)]` 宏
///
/// 生成 `ANNOTATION_NAME` 常量与 `class()` 查找函数，
/// 并通过 inventory 提交 `ClassRegistration`，由 `ClassRegistry::auto_load` 构建。
///
/// 使用示例：
/// ```ignore
/// use weave_macros::Annotation;
///
/// #[derive(Annotation)]
/// pub struct Component;
///
/// #[derive(Annotation)]
/// #[annotation("Repository")]   // 可选：注解名称，默认使用结构体名
/// #[meta("Component")]          // 可选：元注解，可以写多个
/// pub struct Repository;
/// ```
#[proc_macro_derive(Annotation, attributes(annotation, meta))]
pub fn derive_annotation(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    annotation::impl_annotation_derive(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
