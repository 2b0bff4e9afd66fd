//! Record derive macro implementation

use crate::common::attrs::{Behavior, column_fields, table_name};
use crate::common::syn_types::TimestampSlot;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let table = table_name(&input)?.ok_or_else(|| {
        syn::Error::new_spanned(
            &input,
            "Record requires #[orm(table = \"table_name\")] attribute",
        )
    })?;
    let fields = column_fields(&input, "Record")?;

    let field_defs = fields.iter().map(|f| {
        let field = f.ident.to_string();
        let column = &f.column;
        let behavior = match f.behavior {
            Behavior::Plain => quote!(torm::Behavior::Plain),
            Behavior::AutoIncrement => quote!(torm::Behavior::AutoIncrement),
            Behavior::AutoCreateTime => quote!(torm::Behavior::AutoCreateTime),
            Behavior::AutoUpdateTime => quote!(torm::Behavior::AutoUpdateTime),
        };
        quote! { torm::FieldDef::new(#field, #column, #behavior) }
    });

    let bindings = fields.iter().map(|f| {
        let ident = f.ident;
        let column = &f.column;
        quote! {
            #column => ::core::option::Option::Some(torm::Binding::One(
                &self.#ident as &(dyn torm::__private::ToSql + ::core::marker::Sync)
            )),
        }
    });

    let stamps = fields.iter().filter_map(|f| {
        let ident = f.ident;
        let column = &f.column;
        let value = match f.slot? {
            TimestampSlot::DateTimeUtc => quote!(at),
            TimestampSlot::NaiveDateTime => quote!(at.naive_utc()),
            TimestampSlot::OptionDateTimeUtc => quote!(::core::option::Option::Some(at)),
            TimestampSlot::OptionNaiveDateTime => {
                quote!(::core::option::Option::Some(at.naive_utc()))
            }
        };
        Some(quote! {
            #column => {
                self.#ident = #value;
                true
            }
        })
    });

    Ok(quote! {
        impl torm::Record for #name {
            fn table_name() -> &'static str {
                #table
            }

            fn fields() -> &'static [torm::FieldDef] {
                const FIELDS: &[torm::FieldDef] = &[#(#field_defs),*];
                FIELDS
            }

            #[allow(unused_variables)]
            fn set_timestamp(
                &mut self,
                column: &str,
                at: torm::__private::DateTime<torm::__private::Utc>,
            ) -> bool {
                match column {
                    #(#stamps)*
                    _ => false,
                }
            }
        }

        impl torm::NamedSource for #name {
            fn binding(&self, name: &str) -> ::core::option::Option<torm::Binding<'_>> {
                match name {
                    #(#bindings)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl torm::Destination for #name {
            type Record = Self;
            const MANY: bool = false;

            fn store(&mut self, records: ::std::vec::Vec<Self>) {
                if let ::core::option::Option::Some(record) = records.into_iter().next() {
                    *self = record;
                }
            }
        }

        torm::inventory::submit! {
            torm::RecordRegistration {
                register_fn: |registry: &mut torm::RegistryBuilder| {
                    registry.register::<#name>();
                }
            }
        }
    })
}
