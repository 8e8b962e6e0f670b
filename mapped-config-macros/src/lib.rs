//! Proc macros for the mapped-config crate.
//!
//! This crate provides the `#[derive(Mapped)]` and `#[derive(MappedEnum)]`
//! macros.

use heck::ToShoutySnakeCase;
use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Expr, Fields, Lit, LitStr, parse_macro_input, spanned::Spanned,
    ext::IdentExt,
};

fn string_value(meta: &syn::meta::ParseNestedMeta, what: &str) -> syn::Result<LitStr> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(expr_lit) = &value
        && let Lit::Str(lit_str) = &expr_lit.lit
    {
        return Ok(lit_str.clone());
    }
    Err(syn::Error::new(value.span(), format!("{what} must be a string literal")))
}

fn unknown_attribute(meta: &syn::meta::ParseNestedMeta) -> syn::Error {
    let name = meta
        .path
        .get_ident()
        .map(ToString::to_string)
        .unwrap_or_default();
    syn::Error::new(meta.path.span(), format!("unknown config attribute: {name}"))
}

/// Type level options parsed from `#[config(...)]`.
#[derive(Default)]
struct ContainerOptions {
    skip_failed: bool,
    preserve_static: bool,
    preprocess: Option<syn::Path>,
}

impl ContainerOptions {
    fn from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();

        for attr in attrs {
            if attr.path().is_ident("config") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("skip_failed") {
                        options.skip_failed = true;
                    } else if meta.path.is_ident("preserve_static") {
                        options.preserve_static = true;
                    } else if meta.path.is_ident("preprocess") {
                        options.preprocess = Some(meta.value()?.parse()?);
                    } else {
                        return Err(unknown_attribute(&meta));
                    }
                    Ok(())
                })?;
            }
        }

        Ok(options)
    }
}

/// Member options parsed from `#[config(...)]`.
#[derive(Default)]
struct FieldOptions {
    path: Option<LitStr>,
    comments: Vec<LitStr>,
    skip: bool,
    immutable: bool,
    flatten: bool,
}

impl FieldOptions {
    fn from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();

        for attr in attrs {
            if attr.path().is_ident("config") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("path") {
                        let path = string_value(&meta, "path")?;
                        validate_path(&path)?;
                        options.path = Some(path);
                    } else if meta.path.is_ident("comment") {
                        options.comments.push(string_value(&meta, "comment")?);
                    } else if meta.path.is_ident("skip") {
                        options.skip = true;
                    } else if meta.path.is_ident("immutable") {
                        options.immutable = true;
                    } else if meta.path.is_ident("flatten") {
                        options.flatten = true;
                    } else {
                        return Err(unknown_attribute(&meta));
                    }
                    Ok(())
                })?;
            }
        }

        if options.flatten && (options.path.is_some() || !options.comments.is_empty()) {
            return Err(syn::Error::new(
                attrs[0].span(),
                "flattened members take their paths and comments from the embedded type",
            ));
        }

        Ok(options)
    }
}

fn validate_path(path: &LitStr) -> syn::Result<()> {
    if path.value().split('.').any(str::is_empty) {
        return Err(syn::Error::new(
            path.span(),
            "path must be non-empty dot separated segments",
        ));
    }
    Ok(())
}

/// Derive macro for the `Mapped` trait.
///
/// Every named member is stored at its name with `_` replaced by `.`. The
/// type must implement `Default` and `Clone`, and every stored member type
/// must implement `Reflect`.
///
/// Type level attributes:
/// - `#[config(skip_failed)]`: skip members that fail to convert while saving
///   or filling defaults;
/// - `#[config(preserve_static)]`: include static members;
/// - `#[config(preprocess = path::to::fn)]`: `fn(&mut ConfigTree)` run on the
///   parsed tree before loading.
///
/// Member attributes:
/// - `#[config(path = "a.b")]`: explicit document path;
/// - `#[config(comment = "...")]`: a comment line, repeatable;
/// - `#[config(skip)]`: never stored;
/// - `#[config(immutable)]`: never stored;
/// - `#[config(flatten)]`: splice in the members of an embedded mapped type,
///   ahead of this type's own members.
///
/// # Example
///
/// ```rust,ignore
/// use mapped_config::Mapped;
///
/// #[derive(Mapped, Debug, Default, Clone)]
/// struct Server {
///     #[config(comment = "Port to listen on")]
///     port: u16,
///     max_players: u32,
/// }
/// ```
#[proc_macro_derive(Mapped, attributes(config))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_mapped_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_mapped_impl(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "Mapped cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    name.span(),
                    "Mapped can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                name.span(),
                "Mapped can only be derived for structs; use MappedEnum for enums",
            ));
        }
    };

    let options = ContainerOptions::from_attrs(&input.attrs)?;

    let mut steps = Vec::new();
    for field in fields {
        let field_options = FieldOptions::from_attrs(&field.attrs)?;
        if field_options.skip {
            continue;
        }

        let Some(ident) = &field.ident else { continue };
        let member = ident.unraw().to_string();

        if field_options.flatten {
            steps.push(quote! {
                .flatten(|s: &#name| &s.#ident, |s: &mut #name| &mut s.#ident)
            });
            continue;
        }

        let path = field_options.path.iter();
        let comments = field_options.comments.iter();
        let immutable = field_options.immutable.then(|| quote!(.immutable()));

        steps.push(quote! {
            .field(
                ::mapped_config::FieldSpec::new(
                    #member,
                    |s: &#name| &s.#ident,
                    |s: &mut #name| &mut s.#ident,
                )
                #(.path(#path))*
                #(.comment(#comments))*
                #immutable
            )
        });
    }

    let skip_failed = options.skip_failed;
    let preserve_static = options.preserve_static;
    let preprocess = options.preprocess.map(|path| {
        quote! {
            fn preprocess(tree: &mut ::mapped_config::ConfigTree) {
                #path(tree)
            }
        }
    });

    Ok(quote! {
        impl ::mapped_config::Mapped for #name {
            const SKIP_FAILED: bool = #skip_failed;
            const PRESERVE_STATIC: bool = #preserve_static;

            fn schema() -> &'static ::mapped_config::Schema<Self> {
                static SCHEMA: ::std::sync::OnceLock<::mapped_config::Schema<#name>> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    ::mapped_config::Schema::<#name>::builder()
                        #(#steps)*
                        .build()
                })
            }

            #preprocess
        }

        impl ::mapped_config::Reflect for #name {
            fn type_tag() -> ::mapped_config::TypeTag {
                ::mapped_config::TypeTag::Object(::mapped_config::ObjectTag::of::<Self>())
            }

            fn to_dynamic(
                &self,
            ) -> ::core::result::Result<::mapped_config::Dynamic, ::mapped_config::ConvertError> {
                ::core::result::Result::Ok(::mapped_config::mapped::object_to_dynamic(self))
            }

            fn from_dynamic(
                value: ::mapped_config::Dynamic,
            ) -> ::core::result::Result<Self, ::mapped_config::ConvertError> {
                ::mapped_config::mapped::object_from_dynamic(value)
            }
        }
    })
}

/// Variant options parsed from `#[config(...)]`.
#[derive(Default)]
struct VariantOptions {
    rename: Option<LitStr>,
    aliases: Vec<LitStr>,
}

impl VariantOptions {
    fn from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();

        for attr in attrs {
            if attr.path().is_ident("config") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        options.rename = Some(string_value(&meta, "rename")?);
                    } else if meta.path.is_ident("alias") {
                        options.aliases.push(string_value(&meta, "alias")?);
                    } else {
                        return Err(unknown_attribute(&meta));
                    }
                    Ok(())
                })?;
            }
        }

        Ok(options)
    }
}

/// Derive macro for the `MappedEnum` trait.
///
/// Each unit variant is stored as a symbol, by default its name in
/// `SCREAMING_SNAKE_CASE`. Reading ignores case, spaces and underscores.
///
/// Variant attributes:
/// - `#[config(rename = "...")]`: explicit symbol;
/// - `#[config(alias = "...")]`: another accepted spelling, repeatable.
///
/// # Example
///
/// ```rust,ignore
/// use mapped_config::MappedEnum;
///
/// #[derive(MappedEnum, Debug, Clone, Copy, PartialEq)]
/// enum Effect {
///     #[config(alias = "haste")]
///     FastDigging,
///     Slow,
/// }
/// ```
#[proc_macro_derive(MappedEnum, attributes(config))]
pub fn derive_mapped_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_mapped_enum_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_mapped_enum_impl(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "MappedEnum cannot be derived for generic types",
        ));
    }

    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            name.span(),
            "MappedEnum can only be derived for enums",
        ));
    };

    if data.variants.is_empty() {
        return Err(syn::Error::new(
            name.span(),
            "MappedEnum needs at least one variant",
        ));
    }

    let mut variants = Vec::new();
    let mut symbols = Vec::new();
    let mut aliases = Vec::new();

    for (index, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "MappedEnum variants cannot carry data",
            ));
        }

        let options = VariantOptions::from_attrs(&variant.attrs)?;
        let symbol = options
            .rename
            .map(|rename| rename.value())
            .unwrap_or_else(|| variant.ident.unraw().to_string().to_shouty_snake_case());

        variants.push(&variant.ident);
        symbols.push(symbol);
        for alias in options.aliases {
            aliases.push(quote!((#alias, #index)));
        }
    }

    let enum_name = name.to_string();
    let indices = 0..variants.len();
    let from_indices = 0..variants.len();

    Ok(quote! {
        impl ::mapped_config::MappedEnum for #name {
            const DESCRIPTOR: &'static ::mapped_config::EnumDescriptor =
                &::mapped_config::EnumDescriptor {
                    name: #enum_name,
                    symbols: &[#(#symbols),*],
                    aliases: &[#(#aliases),*],
                };

            fn index(&self) -> usize {
                match self {
                    #(Self::#variants => #indices,)*
                }
            }

            fn from_index(index: usize) -> ::core::option::Option<Self> {
                match index {
                    #(#from_indices => ::core::option::Option::Some(Self::#variants),)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::mapped_config::Reflect for #name {
            fn type_tag() -> ::mapped_config::TypeTag {
                ::mapped_config::TypeTag::Enum(
                    <Self as ::mapped_config::MappedEnum>::DESCRIPTOR,
                )
            }

            fn to_dynamic(
                &self,
            ) -> ::core::result::Result<::mapped_config::Dynamic, ::mapped_config::ConvertError> {
                ::core::result::Result::Ok(::mapped_config::mapped::enum_to_dynamic(self))
            }

            fn from_dynamic(
                value: ::mapped_config::Dynamic,
            ) -> ::core::result::Result<Self, ::mapped_config::ConvertError> {
                ::mapped_config::mapped::enum_from_dynamic(value)
            }
        }
    })
}
