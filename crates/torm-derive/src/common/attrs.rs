//! Attribute parsing for the `Record` and `FromRow` derives.
//!
//! Struct level: `#[orm(table = "name")]`.
//! Field level: `#[orm(column)]` or `#[orm(column = "name")]`, optionally
//! followed by one of `auto_increment`, `auto_create_time`, `auto_update_time`.

use super::syn_types::{TimestampSlot, detect_timestamp_slot};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Plain,
    AutoIncrement,
    AutoCreateTime,
    AutoUpdateTime,
}

/// Parsed contents of one field-level `#[orm(...)]`.
#[derive(Debug, Default)]
pub struct FieldAttr {
    /// `column` was present.
    pub tagged: bool,
    /// Explicit name from `column = "..."`.
    pub column: Option<String>,
    pub behavior: Option<Behavior>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            let behavior = match ident.to_string().as_str() {
                "column" => {
                    attr.tagged = true;
                    if input.peek(syn::Token![=]) {
                        let _: syn::Token![=] = input.parse()?;
                        let value: syn::LitStr = input.parse()?;
                        if !is_plain_ident(&value.value()) {
                            return Err(syn::Error::new_spanned(
                                &value,
                                "column name must be a plain identifier ([A-Za-z_][A-Za-z0-9_]*)",
                            ));
                        }
                        attr.column = Some(value.value());
                    }
                    None
                }
                "auto_increment" => Some(Behavior::AutoIncrement),
                "auto_create_time" => Some(Behavior::AutoCreateTime),
                "auto_update_time" => Some(Behavior::AutoUpdateTime),
                other => {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        format!("unknown orm field attribute `{other}`"),
                    ));
                }
            };

            if let Some(b) = behavior {
                if attr.behavior.is_some() {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        "a field can have only one of auto_increment, auto_create_time, auto_update_time",
                    ));
                }
                attr.behavior = Some(b);
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if attr.behavior.is_some() && !attr.tagged {
            return Err(input.error("auto_* behaviors require `column`"));
        }

        Ok(attr)
    }
}

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A persisted field of a record.
pub struct ColumnField<'a> {
    pub ident: &'a syn::Ident,
    pub column: String,
    pub behavior: Behavior,
    /// Set for auto-time fields whose type can take a timestamp.
    pub slot: Option<TimestampSlot>,
}

/// Named fields of a struct, or an error naming the derive.
pub fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> Result<&'a syn::punctuated::Punctuated<syn::Field, syn::Token![,]>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs"),
        )),
    }
}

/// Parse the field-level attribute, if any.
pub fn field_attr(field: &syn::Field) -> Result<Option<FieldAttr>> {
    let mut found = None;
    for attr in &field.attrs {
        if attr.path().is_ident("orm") {
            if found.is_some() {
                return Err(syn::Error::new_spanned(
                    attr,
                    "duplicate #[orm(...)] attribute on field",
                ));
            }
            found = Some(attr.parse_args::<FieldAttr>()?);
        }
    }
    Ok(found)
}

/// Persisted fields in declaration order; untagged fields are skipped.
pub fn column_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<ColumnField<'a>>> {
    let mut out = Vec::new();
    for field in named_fields(input, derive)? {
        let Some(attr) = field_attr(field)? else {
            continue;
        };
        if !attr.tagged {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let behavior = attr.behavior.unwrap_or(Behavior::Plain);
        let slot = match behavior {
            Behavior::AutoCreateTime | Behavior::AutoUpdateTime => {
                detect_timestamp_slot(&field.ty)
            }
            _ => None,
        };
        out.push(ColumnField {
            ident,
            column: attr.column.unwrap_or_else(|| ident.unraw().to_string()),
            behavior,
            slot,
        });
    }
    Ok(out)
}

/// Table name from struct-level `#[orm(table = "...")]`, if present.
pub fn table_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "expected #[orm(table = \"table_name\")]",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return Ok(Some(lit.value()));
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "table name must be a string literal",
        ));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn parse_field(field: syn::Field) -> Result<Option<FieldAttr>> {
        field_attr(&field)
    }

    #[test]
    fn column_with_name_and_behavior() {
        let field: syn::Field = parse_quote! {
            #[orm(column = "created_at", auto_create_time)]
            created: DateTime<Utc>
        };
        let attr = parse_field(field).unwrap().unwrap();
        assert!(attr.tagged);
        assert_eq!(attr.column.as_deref(), Some("created_at"));
        assert_eq!(attr.behavior, Some(Behavior::AutoCreateTime));
    }

    #[test]
    fn bare_column_uses_field_name() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "test")]
            struct TestRecord {
                #[orm(column, auto_increment)]
                id: i64,
                #[orm(column = "foo")]
                foo: i32,
                bar: i32,
            }
        };
        let fields = column_fields(&input, "Record").unwrap();
        let columns: Vec<_> = fields.iter().map(|f| f.column.as_str()).collect();
        assert_eq!(columns, ["id", "foo"]);
        assert_eq!(fields[0].behavior, Behavior::AutoIncrement);
        assert_eq!(table_name(&input).unwrap().as_deref(), Some("test"));
    }

    #[test]
    fn timestamp_slot_only_for_time_types() {
        let input: DeriveInput = parse_quote! {
            #[orm(table = "test")]
            struct TestRecord {
                #[orm(column = "created_at", auto_create_time)]
                created_at: Option<NaiveDateTime>,
                #[orm(column = "updated_at", auto_update_time)]
                updated_at: String,
            }
        };
        let fields = column_fields(&input, "Record").unwrap();
        assert_eq!(fields[0].slot, Some(TimestampSlot::OptionNaiveDateTime));
        assert_eq!(fields[1].slot, None);
    }

    #[test]
    fn rejects_unknown_and_conflicting_attributes() {
        let field: syn::Field = parse_quote! {
            #[orm(column, primary)]
            id: i64
        };
        assert!(parse_field(field).is_err());

        let field: syn::Field = parse_quote! {
            #[orm(column, auto_create_time, auto_update_time)]
            at: DateTime<Utc>
        };
        assert!(parse_field(field).is_err());

        let field: syn::Field = parse_quote! {
            #[orm(auto_increment)]
            id: i64
        };
        assert!(parse_field(field).is_err());
    }

    #[test]
    fn column_name_must_be_plain_identifier() {
        for name in ["user-name", "t.foo", "\"foo\"", "1st", ""] {
            let field: syn::Field = parse_quote! {
                #[orm(column = #name)]
                user_name: String
            };
            let err = parse_field(field).unwrap_err();
            assert!(err.to_string().contains("plain identifier"), "{name}");
        }

        let field: syn::Field = parse_quote! {
            #[orm(column = "_user_name2")]
            user_name: String
        };
        assert!(parse_field(field).is_ok());
    }

    #[test]
    fn missing_table_is_none() {
        let input: DeriveInput = parse_quote! {
            struct Plain { id: i64 }
        };
        assert_eq!(table_name(&input).unwrap(), None);
    }
}
