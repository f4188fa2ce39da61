//! `#[derive(ConfigNode)]` 实现

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt, parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident,
    PathArguments, Result, Type,
};

use crate::attrs::FieldArgs;

/// 字段类型外层的包装
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrapper {
    Optional,
    Pointer,
}

/// 实现 #[derive(ConfigNode)]
pub fn config_node_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ConfigNode 不支持泛型类型",
        ));
    }

    let ident = &input.ident;
    match &input.data {
        Data::Enum(_) => Ok(quote! {
            impl ::config_abstractions::ConfigNode for #ident {
                fn schema() -> ::config_abstractions::ConfigSchema {
                    ::config_abstractions::ConfigSchema::leaf::<#ident>(
                        ::config_abstractions::SchemaShape::Enumeration,
                    )
                }
            }
        }),
        Data::Struct(data) => expand_struct(ident, &data.fields),
        Data::Union(_) => Err(syn::Error::new_spanned(
            ident,
            "ConfigNode 只能用于结构体或枚举",
        )),
    }
}

fn expand_struct(ident: &Ident, fields: &Fields) -> Result<TokenStream2> {
    let named = match fields {
        Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                ident,
                "ConfigNode 需要具名字段，元组结构体没有可寻址的路径",
            ))
        }
    };

    let mut getters = Vec::new();
    let mut entries = Vec::new();
    let mut base = None;

    for field in named {
        let args = FieldArgs::from_attributes(&field.attrs)?;
        if args.skip {
            continue;
        }
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let name = field_ident.unraw().to_string();
        let getter = format_ident!("__config_get_{}", name);

        if args.base {
            if base.is_some() {
                return Err(syn::Error::new_spanned(
                    field_ident,
                    "每个配置类型最多只能有一个 base 字段",
                ));
            }
            let base_ty = &field.ty;
            getters.push(quote! {
                fn #getter(value: &dyn ::std::any::Any) -> ::std::option::Option<&dyn ::std::any::Any> {
                    let this = value.downcast_ref::<#ident>()?;
                    ::std::option::Option::Some(&this.#field_ident as &dyn ::std::any::Any)
                }
            });
            base = Some(quote! {
                ::config_abstractions::BaseSchema {
                    field: #name,
                    schema: <#base_ty as ::config_abstractions::ConfigNode>::schema,
                    getter: #getter,
                }
            });
            continue;
        }

        let (wrappers, inner) = peel(&field.ty);
        let mut access = quote! { ::std::option::Option::Some(&this.#field_ident) };
        for wrapper in &wrappers {
            access = match wrapper {
                Wrapper::Optional => quote! { #access.and_then(|v| v.as_ref()) },
                Wrapper::Pointer => quote! { #access.map(|v| &**v) },
            };
        }
        getters.push(quote! {
            fn #getter(value: &dyn ::std::any::Any) -> ::std::option::Option<&dyn ::std::any::Any> {
                let this = value.downcast_ref::<#ident>()?;
                #access.map(|v| v as &dyn ::std::any::Any)
            }
        });

        let kind = if args.nested {
            quote! {
                ::config_abstractions::FieldKind::Node(
                    <#inner as ::config_abstractions::ConfigNode>::schema,
                )
            }
        } else {
            quote! { ::config_abstractions::FieldKind::Leaf }
        };
        let optional = wrappers.contains(&Wrapper::Optional);
        entries.push(quote! {
            ::config_abstractions::FieldSchema {
                name: #name,
                type_info: ::config_abstractions::TypeInfo::of::<#inner>(),
                kind: #kind,
                getter: #getter,
                optional: #optional,
            }
        });
    }

    let base = match base {
        Some(base) => quote! { ::std::option::Option::Some(#base) },
        None => quote! { ::std::option::Option::None },
    };

    Ok(quote! {
        impl ::config_abstractions::ConfigNode for #ident {
            fn schema() -> ::config_abstractions::ConfigSchema {
                #(#getters)*

                ::config_abstractions::ConfigSchema {
                    type_info: ::config_abstractions::TypeInfo::of::<#ident>(),
                    shape: ::config_abstractions::SchemaShape::Structure,
                    fields: ::std::vec![#(#entries),*],
                    base: #base,
                }
            }
        }
    })
}

/// 剥离外层的 `Option` / `Box` / `Arc`
fn peel(ty: &Type) -> (Vec<Wrapper>, &Type) {
    let mut wrappers = Vec::new();
    let mut current = ty;

    while let Some((wrapper, inner)) = single_wrapper(current) {
        wrappers.push(wrapper);
        current = inner;
    }

    (wrappers, current)
}

fn single_wrapper(ty: &Type) -> Option<(Wrapper, &Type)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    let wrapper = match segment.ident.to_string().as_str() {
        "Option" => Wrapper::Optional,
        "Box" | "Arc" => Wrapper::Pointer,
        _ => return None,
    };
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some((wrapper, inner)),
        _ => None,
    }
}
