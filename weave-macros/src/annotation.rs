//! Annotation 宏实现

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Error, Fields, LitStr, Result, Token};

pub fn impl_annotation_derive(input: &DeriveInput) -> Result<TokenStream> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "#[derive(Annotation)] does not support generic types",
        ));
    }

    match &input.data {
        Data::Struct(data) if matches!(data.fields, Fields::Unit) => {}
        _ => {
            return Err(Error::new_spanned(
                input,
                "#[derive(Annotation)] can only be applied to unit structs",
            ))
        }
    }

    let name = extract_name(input)?.unwrap_or_else(|| ident.to_string());
    let metas = extract_metas(input)?;

    let expanded = quote! {
        impl #ident {
            /// 注解类型名称
            pub const ANNOTATION_NAME: &'static str = #name;

            /// 从全局类型注册表获取注解类型
            pub fn class() -> ::weave_core::ContainerResult<::weave_core::Class> {
                ::weave_core::reflect::get_global_class_registry().for_name(#name)
            }
        }

        ::weave_core::inventory::submit! {
            ::weave_core::reflect::ClassRegistration::new(
                #name,
                &[#(#metas),*],
                |registry| ::weave_core::reflect::build_annotation(registry, #name, &[#(#metas),*])
            )
        }
    };

    Ok(expanded)
}

/// 解析 `#[annotation("Name")]`
fn extract_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if attr.path().is_ident("annotation") {
            let name: LitStr = attr.parse_args()?;
            if name.value().is_empty() {
                return Err(Error::new_spanned(name, "annotation name must not be empty"));
            }
            return Ok(Some(name.value()));
        }
    }
    Ok(None)
}

/// 收集所有 `#[meta("A", "B")]`
fn extract_metas(input: &DeriveInput) -> Result<Vec<String>> {
    let mut metas = Vec::new();
    for attr in &input.attrs {
        if attr.path().is_ident("meta") {
            let names =
                attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
            metas.extend(names.iter().map(LitStr::value));
        }
    }
    Ok(metas)
}
