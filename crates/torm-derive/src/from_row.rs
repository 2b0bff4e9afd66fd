//! FromRow derive macro implementation

use crate::common::attrs::{column_fields, field_attr, named_fields, table_name};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // Records may be selected with a column subset: tagged fields missing
    // from the row and untagged fields fall back to Default.
    let field_extracts: Vec<_> = if table_name(&input)?.is_some() {
        let columns = column_fields(&input, "FromRow")?;
        named_fields(&input, "FromRow")?
            .iter()
            .filter_map(|field| field.ident.as_ref())
            .map(|ident| match columns.iter().find(|c| c.ident == ident) {
                Some(c) => {
                    let column = &c.column;
                    quote! { #ident: row.try_get_column_or_default(#column)? }
                }
                None => quote! { #ident: ::core::default::Default::default() },
            })
            .collect()
    } else {
        let mut extracts = Vec::new();
        for field in named_fields(&input, "FromRow")? {
            let Some(ident) = field.ident.as_ref() else {
                continue;
            };
            let column = field_attr(field)?
                .and_then(|a| a.column)
                .unwrap_or_else(|| ident.to_string());
            extracts.push(quote! { #ident: row.try_get_column(#column)? });
        }
        extracts
    };

    Ok(quote! {
        impl #impl_generics torm::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &torm::__private::Row) -> torm::OrmResult<Self> {
                use torm::RowExt;
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
