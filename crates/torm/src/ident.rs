//! Validation of caller-supplied column names.
//!
//! Column names end up spliced into SQL text (identifiers cannot be bound as
//! parameters), so explicit field lists are checked before assembly:
//!
//! - Unquoted parts must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL and escape `"` as `""`
//! - Parts may be joined with `.` (`t.foo`, `"Org"."name"`)
//!
//! Insert and update lists also name the record field each value binds from,
//! so they take only plain identifiers ([`check_plain_columns`]).

use crate::error::{OrmError, OrmResult};

/// Check a single column name, returning it unchanged when it is safe to splice.
pub fn check_column(name: &str) -> OrmResult<&str> {
    if name.is_empty() {
        return Err(OrmError::validation("Column name cannot be empty"));
    }
    if name.contains('\0') {
        return Err(OrmError::validation(
            "Column name cannot contain NUL character",
        ));
    }

    let mut chars = name.chars().peekable();
    let mut first_part = true;

    while chars.peek().is_some() {
        if !first_part {
            match chars.next() {
                Some('.') if chars.peek().is_some() => {}
                Some('.') => {
                    return Err(OrmError::validation(format!(
                        "Trailing '.' in column name `{name}`"
                    )));
                }
                Some(c) => {
                    return Err(OrmError::validation(format!(
                        "Expected '.' between identifier parts in `{name}`, got '{c}'"
                    )));
                }
                None => break,
            }
        }
        first_part = false;

        if chars.peek() == Some(&'"') {
            chars.next();
            let mut len = 0usize;
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        len += 1;
                    }
                    Some('"') => break,
                    Some(_) => len += 1,
                    None => {
                        return Err(OrmError::validation(format!(
                            "Unclosed quoted identifier in `{name}`"
                        )));
                    }
                }
            }
            if len == 0 {
                return Err(OrmError::validation("Empty quoted identifier"));
            }
            continue;
        }

        let mut len = 0usize;
        while let Some(&c) = chars.peek() {
            if c == '.' {
                break;
            }
            let ok = if len == 0 {
                c == '_' || c.is_ascii_alphabetic()
            } else {
                c == '_' || c == '$' || c.is_ascii_alphanumeric()
            };
            if !ok {
                return Err(OrmError::validation(format!(
                    "Invalid character '{c}' in column name `{name}`"
                )));
            }
            len += 1;
            chars.next();
        }
        if len == 0 {
            return Err(OrmError::validation(format!(
                "Empty identifier segment in `{name}`"
            )));
        }
    }

    Ok(name)
}

/// Check every name of an explicit field list and take owned copies.
pub fn check_columns<S: AsRef<str>>(names: &[S]) -> OrmResult<Vec<String>> {
    names
        .iter()
        .map(|n| check_column(n.as_ref()).map(str::to_string))
        .collect()
}

/// Check names that double as `:name` bind placeholders: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn check_plain_columns<S: AsRef<str>>(names: &[S]) -> OrmResult<Vec<String>> {
    names
        .iter()
        .map(|n| {
            let name = n.as_ref();
            let mut chars = name.chars();
            let plain = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
            if plain {
                Ok(name.to_string())
            } else {
                Err(OrmError::validation(format!(
                    "Column `{name}` must be a plain identifier in an insert or update field list"
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_dotted() {
        assert!(check_column("foo").is_ok());
        assert!(check_column("t.created_at").is_ok());
        assert!(check_column("my_var$1").is_ok());
    }

    #[test]
    fn accepts_quoted() {
        assert!(check_column(r#""CamelCase""#).is_ok());
        assert!(check_column(r#""has""quote""#).is_ok());
        assert!(check_column(r#"public."Org".name"#).is_ok());
    }

    #[test]
    fn rejects_injection_attempts() {
        assert!(check_column("foo; DROP TABLE test; --").is_err());
        assert!(check_column("foo bar").is_err());
        assert!(check_column("1foo").is_err());
        assert!(check_column("").is_err());
    }

    #[test]
    fn rejects_broken_dots_and_quotes() {
        assert!(check_column("a..b").is_err());
        assert!(check_column("a.").is_err());
        assert!(check_column(r#""unclosed"#).is_err());
        assert!(check_column(r#""""#).is_err());
    }

    #[test]
    fn check_columns_preserves_order() {
        let cols = check_columns(&["foo", "bar"]).unwrap();
        assert_eq!(cols, vec!["foo".to_string(), "bar".to_string()]);
        assert!(check_columns(&["foo", "bad name"]).is_err());
    }

    #[test]
    fn plain_columns_reject_quotes_and_dots() {
        assert_eq!(check_plain_columns(&["foo", "_bar1"]).unwrap(), ["foo", "_bar1"]);
        for name in [r#""foo""#, "t.foo", "my$var", "1foo", ""] {
            let err = check_plain_columns(&[name]).unwrap_err();
            assert!(matches!(err, OrmError::Validation(_)), "{name}");
        }
    }
}
