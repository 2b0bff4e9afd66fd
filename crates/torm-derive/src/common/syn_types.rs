//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Shape of a field that can receive an automatic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSlot {
    /// `DateTime<Utc>`
    DateTimeUtc,
    /// `NaiveDateTime`, written as UTC
    NaiveDateTime,
    /// `Option<DateTime<Utc>>`
    OptionDateTimeUtc,
    /// `Option<NaiveDateTime>`
    OptionNaiveDateTime,
}

/// Classify a field type as a timestamp slot.
///
/// Matching is syntactic on the last path segment, so `chrono::DateTime<chrono::Utc>`
/// and `DateTime<Utc>` are both recognized. Anything else returns `None`.
pub fn detect_timestamp_slot(ty: &syn::Type) -> Option<TimestampSlot> {
    if let Some(inner) = option_inner(ty) {
        return match bare_timestamp(inner)? {
            TimestampSlot::DateTimeUtc => Some(TimestampSlot::OptionDateTimeUtc),
            TimestampSlot::NaiveDateTime => Some(TimestampSlot::OptionNaiveDateTime),
            _ => None,
        };
    }
    bare_timestamp(ty)
}

fn bare_timestamp(ty: &syn::Type) -> Option<TimestampSlot> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };

    let seg = type_path.path.segments.last()?;
    match seg.ident.to_string().as_str() {
        "DateTime" => {
            let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
                return None;
            };
            if args.args.len() != 1 {
                return None;
            }
            let syn::GenericArgument::Type(syn::Type::Path(inner_path)) = args.args.first()? else {
                return None;
            };
            let inner_seg = inner_path.path.segments.last()?;
            (inner_seg.ident == "Utc").then_some(TimestampSlot::DateTimeUtc)
        }
        "NaiveDateTime" => Some(TimestampSlot::NaiveDateTime),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_option_inner() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(String);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_detect_timestamp_slot() {
        let ty: syn::Type = parse_quote!(DateTime<Utc>);
        assert_eq!(detect_timestamp_slot(&ty), Some(TimestampSlot::DateTimeUtc));

        let ty: syn::Type = parse_quote!(chrono::DateTime<chrono::Utc>);
        assert_eq!(detect_timestamp_slot(&ty), Some(TimestampSlot::DateTimeUtc));

        let ty: syn::Type = parse_quote!(NaiveDateTime);
        assert_eq!(detect_timestamp_slot(&ty), Some(TimestampSlot::NaiveDateTime));

        let ty: syn::Type = parse_quote!(Option<DateTime<Utc>>);
        assert_eq!(
            detect_timestamp_slot(&ty),
            Some(TimestampSlot::OptionDateTimeUtc)
        );

        let ty: syn::Type = parse_quote!(Option<chrono::NaiveDateTime>);
        assert_eq!(
            detect_timestamp_slot(&ty),
            Some(TimestampSlot::OptionNaiveDateTime)
        );
    }

    #[test]
    fn test_non_timestamp_types() {
        let ty: syn::Type = parse_quote!(String);
        assert_eq!(detect_timestamp_slot(&ty), None);

        let ty: syn::Type = parse_quote!(Option<String>);
        assert_eq!(detect_timestamp_slot(&ty), None);

        let ty: syn::Type = parse_quote!(DateTime<FixedOffset>);
        assert_eq!(detect_timestamp_slot(&ty), None);

        let ty: syn::Type = parse_quote!(Option<Option<DateTime<Utc>>>);
        assert_eq!(detect_timestamp_slot(&ty), None);
    }
}
