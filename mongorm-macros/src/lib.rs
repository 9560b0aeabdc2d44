//! Procedural macros for the mongorm project.
//!
//! This crate provides `#[derive(Model)]`, which writes the `mongorm::model::Model`
//! impl for a struct carrying `id` and `created` fields.
//!
//! ```ignore
//! use mongorm::prelude::*;
//!
//! fn widget_indexes() -> Vec<Index> {
//!     vec![Index::new("name").unique(true)]
//! }
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Model)]
//! #[model(collection = "widgets", indexes = widget_indexes)]
//! pub struct Widget {
//!     #[serde(rename = "_id")]
//!     pub id: Oid,
//!     pub created: bson::DateTime,
//!     pub name: String,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongorm_macros;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Path, parse_macro_input, spanned::Spanned};

/// Derives `mongorm::model::Model`.
///
/// # Attributes
///
/// - `#[model(collection = "name")]` (required): the collection the model is stored in.
/// - `#[model(indexes = path::to_fn)]`: a `fn() -> Vec<Index>` returning the declared indexes.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_model(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct ModelAttrs {
    collection: Option<LitStr>,
    indexes: Option<Path>,
}

fn parse_attrs(input: &DeriveInput) -> syn::Result<ModelAttrs> {
    let mut attrs = ModelAttrs::default();

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("model")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                attrs.collection = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("indexes") {
                attrs.indexes = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported model attribute, expected `collection` or `indexes`"))
            }
        })?;
    }

    Ok(attrs)
}

fn expand_model(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(input.span(), "Model can only be derived for structs"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(input.span(), "Model requires named fields"));
    };

    for required in ["id", "created"] {
        let present = fields
            .named
            .iter()
            .any(|field| field.ident.as_ref().is_some_and(|ident| ident == required));

        if !present {
            return Err(syn::Error::new(
                input.ident.span(),
                format!("Model requires a field named `{required}`"),
            ));
        }
    }

    let attrs = parse_attrs(&input)?;
    let collection = attrs.collection.ok_or_else(|| {
        syn::Error::new(input.ident.span(), "missing #[model(collection = \"...\")]")
    })?;
    if collection.value().trim().is_empty() {
        return Err(syn::Error::new(collection.span(), "collection name must not be empty"));
    }

    let indexes = attrs.indexes.map(|path| {
        quote! {
            fn indexes() -> ::std::vec::Vec<::mongorm::index::Index> {
                #path()
            }
        }
    });

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::mongorm::model::Model for #name #ty_generics #where_clause {
            fn id(&self) -> ::mongorm::id::Oid {
                ::std::convert::Into::into(::std::clone::Clone::clone(&self.id))
            }

            fn created(&self) -> ::mongorm::bson::DateTime {
                ::std::convert::Into::into(::std::clone::Clone::clone(&self.created))
            }

            fn collection_name() -> &'static str {
                #collection
            }

            #indexes
        }
    })
}
