//! 字段属性解析

use syn::{punctuated::Punctuated, Attribute, Meta, Result, Token};

/// 字段上的 `#[config(...)]` 参数
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldArgs {
    pub nested: bool,
    pub base: bool,
    pub skip: bool,
}

impl FieldArgs {
    /// 从字段属性解析
    pub fn from_attributes(attrs: &[Attribute]) -> Result<Self> {
        let mut args = Self::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("config")) {
            let parsed = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
            for meta in parsed {
                match meta {
                    Meta::Path(path) if path.is_ident("nested") => args.nested = true,
                    Meta::Path(path) if path.is_ident("base") => args.base = true,
                    Meta::Path(path) if path.is_ident("skip") => args.skip = true,
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "未知的 config 参数，可用的参数为 nested、base、skip",
                        ))
                    }
                }
            }
        }

        if args.base && args.nested {
            return Err(syn::Error::new_spanned(
                &attrs[0],
                "base 与 nested 不能同时使用",
            ));
        }

        Ok(args)
    }
}
