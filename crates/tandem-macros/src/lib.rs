//! Procedural macros for tandem.
//!
//! This crate provides `#[derive(Resolvable)]`, which implements
//! `tandem_core::Resolvable` (and optionally `tandem_core::Notify`) for a
//! struct so its properties can be looked up by name at runtime.
//!
//! # Attributes
//!
//! ## `#[property]`
//!
//! Exposes a field as a named property. Only fields carrying the attribute are
//! exposed. The field type must implement `tandem_core::IntoPropertyValue`, or
//! be a `Property<T>` whose `T` does.
//!
//! ```ignore
//! #[derive(Resolvable)]
//! #[resolvable(notify = "changed")]
//! struct Person {
//!     #[property(name = "Address")]
//!     address: Property<Option<Arc<Address>>>,
//!
//!     #[property]
//!     age: u32,
//!
//!     changed: Signal<&'static str>,
//! }
//! ```
//!
//! Property attributes:
//! - `name = "Name"`: The name used for lookups (defaults to the field name)
//! - `skip`: Keeps the field out of the generated lookup
//!
//! ## `#[resolvable]`
//!
//! Struct-level configuration:
//! - `notify = "field"`: A `Signal<&'static str>` field announcing property
//!   changes. Also generates the `Notify` impl and makes `change_signal`
//!   return it.
//! - `name = "TypeName"`: The reported type name (defaults to the struct name)

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, Ident, LitStr, Type, parse_macro_input,
};

/// Derive `tandem_core::Resolvable` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use tandem_core::{Property, Signal};
/// use tandem_macros::Resolvable;
///
/// #[derive(Resolvable)]
/// #[resolvable(notify = "changed")]
/// struct Region {
///     #[property(name = "Name")]
///     name: Property<String>,
///
///     changed: Signal<&'static str>,
/// }
/// ```
#[proc_macro_derive(Resolvable, attributes(resolvable, property))]
pub fn derive_resolvable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_resolvable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed property information.
struct PropertyInfo {
    field_name: Ident,
    lookup_name: String,
    is_property_wrapper: bool,
}

/// Parsed struct-level attributes.
struct ResolvableAttrs {
    notify: Option<Ident>,
    type_name: Option<String>,
}

fn impl_derive_resolvable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let attrs = parse_resolvable_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Resolvable derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Resolvable derive only supports structs",
            ));
        }
    };

    if let Some(notify) = &attrs.notify
        && !fields
            .iter()
            .any(|f| f.ident.as_ref().is_some_and(|i| i == notify))
    {
        return Err(syn::Error::new_spanned(
            notify,
            format!("no field named `{}` for the notify signal", notify),
        ));
    }

    let mut properties: Vec<PropertyInfo> = Vec::new();
    for field in fields.iter() {
        if let Some(info) = parse_property_field(field)? {
            if properties.iter().any(|p| p.lookup_name == info.lookup_name) {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("duplicate property name `{}`", info.lookup_name),
                ));
            }
            properties.push(info);
        }
    }

    let type_name = attrs
        .type_name
        .clone()
        .unwrap_or_else(|| struct_name.to_string());
    let lookup_names: Vec<&str> = properties.iter().map(|p| p.lookup_name.as_str()).collect();
    let match_arms = generate_match_arms(&properties);

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let change_signal = match &attrs.notify {
        Some(notify) => quote! {
            fn change_signal(&self) -> ::core::option::Option<&::tandem_core::Signal<&'static str>> {
                ::core::option::Option::Some(&self.#notify)
            }
        },
        None => quote! {},
    };

    let notify_impl = match &attrs.notify {
        Some(notify) => quote! {
            impl #impl_generics ::tandem_core::Notify for #struct_name #ty_generics #where_clause {
                fn property_changed(&self) -> &::tandem_core::Signal<&'static str> {
                    &self.#notify
                }
            }
        },
        None => quote! {},
    };

    Ok(quote! {
        impl #impl_generics ::tandem_core::Resolvable for #struct_name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #type_name
            }

            fn property(&self, name: &str) -> ::core::option::Option<::tandem_core::PropertyValue> {
                match name {
                    #(#match_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn property_names(&self) -> &'static [&'static str] {
                &[#(#lookup_names),*]
            }

            #change_signal
        }

        #notify_impl
    })
}

/// Parse struct-level #[resolvable(...)] attributes.
fn parse_resolvable_attrs(attrs: &[Attribute]) -> syn::Result<ResolvableAttrs> {
    let mut result = ResolvableAttrs {
        notify: None,
        type_name: None,
    };

    for attr in attrs {
        if !attr.path().is_ident("resolvable") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("notify") {
                let value: LitStr = meta.value()?.parse()?;
                result.notify = Some(Ident::new(&value.value(), value.span()));
                Ok(())
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                result.type_name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported resolvable attribute, expected `notify` or `name`"))
            }
        })?;
    }

    Ok(result)
}

/// Parse a field with a #[property] attribute.
fn parse_property_field(field: &Field) -> syn::Result<Option<PropertyInfo>> {
    let field_name = match &field.ident {
        Some(name) => name.clone(),
        None => return Ok(None),
    };

    let mut has_property_attr = false;
    let mut lookup_name = None;
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("property") {
            continue;
        }
        has_property_attr = true;

        // Bare #[property] has no nested meta to parse.
        if matches!(attr.meta, syn::Meta::Path(_)) {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() || value.value().contains('.') {
                    return Err(syn::Error::new_spanned(
                        &value,
                        "property names must be non-empty and must not contain `.`",
                    ));
                }
                lookup_name = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported property attribute, expected `name` or `skip`"))
            }
        })?;
    }

    if !has_property_attr || skip {
        return Ok(None);
    }

    Ok(Some(PropertyInfo {
        lookup_name: lookup_name.unwrap_or_else(|| field_name.to_string()),
        is_property_wrapper: is_property_wrapper(&field.ty),
        field_name,
    }))
}

/// Returns `true` if the type is `Property<T>`.
fn is_property_wrapper(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return segment.ident == "Property"
            && matches!(segment.arguments, syn::PathArguments::AngleBracketed(_));
    }
    false
}

/// Generate one match arm per exposed property.
fn generate_match_arms(properties: &[PropertyInfo]) -> Vec<TokenStream2> {
    properties
        .iter()
        .map(|prop| {
            let field_name = &prop.field_name;
            let lookup_name = &prop.lookup_name;
            let read = if prop.is_property_wrapper {
                quote! { self.#field_name.get() }
            } else {
                quote! { ::core::clone::Clone::clone(&self.#field_name) }
            };
            quote! {
                #lookup_name => ::core::option::Option::Some(
                    ::tandem_core::IntoPropertyValue::into_property_value(#read)
                ),
            }
        })
        .collect()
}
