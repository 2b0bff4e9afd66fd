//! Named parameter binding.
//!
//! Assembled statements use `:name` placeholders. Before execution they go
//! through one pipeline:
//!
//! 1. every `:name` is resolved against a [`NamedSource`] (a record or [`Params`]),
//! 2. the query is rewritten to the normalized `?` form; a name resolved to a
//!    list becomes `?, ?, ...` with one mark per element (`IN (:ids)`), and a
//!    literal `?` already in the text (jsonb `?`, `?|`, `?&`) is escaped as `??`,
//! 3. the normalized form is rebound to the backend's placeholder syntax.
//!
//! Step 2 has to see the resolved values, and step 3 has to see the expanded
//! marks, so the steps only exist together in [`bind`].
//!
//! ```ignore
//! let params = Params::new().bind("status", "active").bind_list("ids", vec![1_i64, 2, 3]);
//! let sql = bind("SELECT * FROM users WHERE status = :status AND id IN (:ids)", &params, rebind)?;
//! assert_eq!(sql.query, "SELECT * FROM users WHERE status = $1 AND id IN ($2, $3, $4)");
//! ```

use crate::error::{OrmError, OrmResult};
use crate::schema::{Binding, NamedSource};
use std::collections::BTreeMap;
use tokio_postgres::types::ToSql;

/// A bound value owned by [`Params`].
pub type Param = Box<dyn ToSql + Sync + Send>;

/// An assembled statement with its positional arguments.
pub struct Sql<'a> {
    pub query: String,
    pub args: Vec<&'a (dyn ToSql + Sync)>,
}

impl Sql<'_> {
    /// Arguments rendered with `Debug`, for tracing and assertions.
    pub fn args_debug(&self) -> Vec<String> {
        self.args.iter().map(|a| format!("{a:?}")).collect()
    }
}

impl std::fmt::Debug for Sql<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sql")
            .field("query", &self.query)
            .field("args", &self.args)
            .finish()
    }
}

enum Arg {
    One(Param),
    List(Vec<Param>),
}

/// Key/value parameters for filter clauses.
#[derive(Default)]
#[must_use]
pub struct Params {
    entries: BTreeMap<String, Arg>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a single value to `:name`.
    pub fn bind<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        self.entries.insert(name.into(), Arg::One(Box::new(value)));
        self
    }

    /// Bind a collection to `:name`; the placeholder expands to one mark per element.
    pub fn bind_list<T>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        let values = values
            .into_iter()
            .map(|v| Box::new(v) as Param)
            .collect();
        self.entries.insert(name.into(), Arg::List(values));
        self
    }

    /// Build parameters from a JSON object.
    ///
    /// Arrays become lists, numbers become `i64` (or `f64` when fractional),
    /// strings and booleans map directly, `null` binds a typed NULL, and
    /// nested objects are bound as JSON.
    pub fn from_json(value: serde_json::Value) -> OrmResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(OrmError::bind("parameters must be a JSON object"));
        };
        let mut entries = BTreeMap::new();
        for (name, v) in map {
            let arg = match v {
                serde_json::Value::Array(items) => Arg::List(
                    items
                        .into_iter()
                        .map(json_param)
                        .collect::<OrmResult<Vec<_>>>()?,
                ),
                other => Arg::One(json_param(other)?),
            };
            entries.insert(name, arg);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn json_param(value: serde_json::Value) -> OrmResult<Param> {
    use serde_json::Value;
    Ok(match value {
        Value::Null => Box::new(None::<String>),
        Value::Bool(b) => Box::new(b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Box::new(i),
            (None, Some(f)) => Box::new(f),
            _ => return Err(OrmError::bind(format!("unsupported number {n}"))),
        },
        Value::String(s) => Box::new(s),
        Value::Array(_) => {
            return Err(OrmError::bind("nested arrays cannot be bound"));
        }
        obj @ Value::Object(_) => Box::new(obj),
    })
}

impl NamedSource for Params {
    fn binding(&self, name: &str) -> Option<Binding<'_>> {
        self.entries.get(name).map(|arg| match arg {
            Arg::One(v) => Binding::One(v.as_ref() as &(dyn ToSql + Sync)),
            Arg::List(vs) => Binding::List(
                vs.iter()
                    .map(|v| v.as_ref() as &(dyn ToSql + Sync))
                    .collect(),
            ),
        })
    }
}

impl std::fmt::Debug for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in &self.entries {
            match v {
                Arg::One(p) => map.entry(k, p),
                Arg::List(ps) => map.entry(k, ps),
            };
        }
        map.finish()
    }
}

/// A piece of a parsed named query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Part {
    Raw(String),
    Param(String),
}

/// A query split into raw text and `:name` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    parts: Vec<Part>,
}

impl NamedQuery {
    /// Split a query on its `:name` placeholders.
    ///
    /// `::` (a cast), and anything inside `'...'` or `"..."`, is left as text.
    pub fn parse(query: &str) -> Self {
        fn push_raw(parts: &mut Vec<Part>, s: &str) {
            if s.is_empty() {
                return;
            }
            match parts.last_mut() {
                Some(Part::Raw(last)) => last.push_str(s),
                _ => parts.push(Part::Raw(s.to_string())),
            }
        }

        let bytes = query.as_bytes();
        let mut parts = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                q @ (b'\'' | b'"') => {
                    i += 1;
                    while i < bytes.len() {
                        if bytes[i] == q {
                            if bytes.get(i + 1) == Some(&q) {
                                i += 2;
                                continue;
                            }
                            break;
                        }
                        i += 1;
                    }
                    i += 1;
                }
                b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
                b':' if bytes
                    .get(i + 1)
                    .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') =>
                {
                    push_raw(&mut parts, &query[start..i]);
                    let name_start = i + 1;
                    let mut end = name_start;
                    while end < bytes.len()
                        && (bytes[end].is_ascii_alphanumeric()
                            || bytes[end] == b'_'
                            || bytes[end] == b'.')
                    {
                        end += 1;
                    }
                    parts.push(Part::Param(query[name_start..end].to_string()));
                    start = end;
                    i = end;
                }
                _ => i += 1,
            }
        }
        push_raw(&mut parts, &query[start.min(query.len())..]);

        Self { parts }
    }

    /// Placeholder names in order of appearance (repeats included).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            Part::Param(name) => Some(name.as_str()),
            Part::Raw(_) => None,
        })
    }

    /// Render the query with one `?` per placeholder and literal `?` doubled.
    pub fn to_normalized(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Raw(s) => push_escaped(&mut out, s),
                Part::Param(_) => out.push('?'),
            }
        }
        out
    }
}

/// Append raw query text, doubling every `?` outside quotes.
///
/// Placeholders never sit inside a quoted section, so each quoted section
/// starts and ends within one raw part.
fn push_escaped(out: &mut String, raw: &str) {
    let mut quote: Option<char> = None;
    for c in raw.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '?' => out.push('?'),
            None => {}
        }
        out.push(c);
    }
}

/// Resolve every name of `query` from `source`, expand list bindings and rebind.
pub fn bind<'s, S>(
    query: &str,
    source: &'s S,
    rebind: impl FnOnce(&str) -> String,
) -> OrmResult<Sql<'s>>
where
    S: NamedSource + ?Sized,
{
    let named = NamedQuery::parse(query);

    let mut resolved = Vec::new();
    for name in named.names() {
        let binding = source
            .binding(name)
            .ok_or_else(|| OrmError::bind(format!("could not find name `{name}` in source")))?;
        resolved.push((name, binding));
    }

    let mut normalized = String::with_capacity(query.len());
    let mut args = Vec::with_capacity(resolved.len());
    let mut resolved = resolved.into_iter();
    for part in &named.parts {
        match part {
            Part::Raw(s) => push_escaped(&mut normalized, s),
            Part::Param(_) => match resolved.next() {
                Some((_, Binding::One(v))) => {
                    normalized.push('?');
                    args.push(v);
                }
                Some((name, Binding::List(vs))) => {
                    if vs.is_empty() {
                        return Err(OrmError::bind(format!(
                            "empty list bound to `{name}` in an IN clause"
                        )));
                    }
                    for (i, v) in vs.into_iter().enumerate() {
                        if i > 0 {
                            normalized.push_str(", ");
                        }
                        normalized.push('?');
                        args.push(v);
                    }
                }
                None => return Err(OrmError::bind("placeholder count changed while binding")),
            },
        }
    }

    Ok(Sql {
        query: rebind(&normalized),
        args,
    })
}

/// Rewrite `?` marks as `$1, $2, ...`, leaving quoted text alone.
///
/// `??` is an escaped literal and becomes a single `?`.
pub fn rebind(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 8);
    let mut n = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    out.push(c);
                }
                '?' if chars.peek() == Some(&'?') => {
                    chars.next();
                    out.push('?');
                }
                '?' => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                }
                _ => out.push(c),
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(q: &str) -> String {
        q.to_string()
    }

    #[test]
    fn parse_splits_names() {
        let q = NamedQuery::parse("foo = :foo AND bar = :bar_1");
        assert_eq!(q.names().collect::<Vec<_>>(), vec!["foo", "bar_1"]);
        assert_eq!(q.to_normalized(), "foo = ? AND bar = ?");
    }

    #[test]
    fn parse_name_at_end_and_dotted() {
        let q = NamedQuery::parse("id=:o.id");
        assert_eq!(q.names().collect::<Vec<_>>(), vec!["o.id"]);
        assert_eq!(q.to_normalized(), "id=?");
    }

    #[test]
    fn parse_skips_casts_and_literals() {
        let q = NamedQuery::parse("SELECT ':nope', \"a:b\", x::int FROM t WHERE id = :id");
        assert_eq!(q.names().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(
            q.to_normalized(),
            "SELECT ':nope', \"a:b\", x::int FROM t WHERE id = ?"
        );
    }

    #[test]
    fn parse_leaves_lone_colon() {
        let q = NamedQuery::parse("a := 1 AND b = ': '");
        assert_eq!(q.names().count(), 0);
        assert_eq!(q.to_normalized(), "a := 1 AND b = ': '");
    }

    #[test]
    fn bind_scalar_params() {
        let params = Params::new().bind("foo", 1_i32);
        let sql = bind("foo = :foo", &params, identity).unwrap();
        assert_eq!(sql.query, "foo = ?");
        assert_eq!(sql.args_debug(), vec!["1"]);
    }

    #[test]
    fn bind_expands_lists() {
        let params = Params::new()
            .bind("status", "on")
            .bind_list("ids", vec![7_i64, 8, 9]);
        let sql = bind("status = :status AND id IN (:ids)", &params, rebind).unwrap();
        assert_eq!(sql.query, "status = $1 AND id IN ($2, $3, $4)");
        assert_eq!(sql.args_debug(), vec!["\"on\"", "7", "8", "9"]);
    }

    #[test]
    fn bind_repeated_name_binds_twice() {
        let params = Params::new().bind("v", 3_i32);
        let sql = bind("a = :v OR b = :v", &params, rebind).unwrap();
        assert_eq!(sql.query, "a = $1 OR b = $2");
        assert_eq!(sql.args.len(), 2);
    }

    #[test]
    fn bind_missing_name_fails() {
        let params = Params::new();
        let err = bind("id = :id", &params, identity).unwrap_err();
        assert!(matches!(err, OrmError::Bind(_)));
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn bind_empty_list_fails() {
        let params = Params::new().bind_list("ids", Vec::<i64>::new());
        let err = bind("id IN (:ids)", &params, identity).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn rebind_numbers_marks_outside_quotes() {
        assert_eq!(
            rebind("a = ? AND b = '?' AND c = ?"),
            "a = $1 AND b = '?' AND c = $2"
        );
        assert_eq!(rebind("no params"), "no params");
        assert_eq!(rebind("tags ?? 'x' AND id = ?"), "tags ? 'x' AND id = $1");
    }

    #[test]
    fn bind_keeps_literal_question_marks() {
        let params = Params::new()
            .bind("foo", 1_i32)
            .bind_list("ids", vec![2_i64, 3]);
        let sql = bind(
            "tags ? 'x' AND tags ?| array[:ids] AND note = 'why?' AND foo = :foo",
            &params,
            rebind,
        )
        .unwrap();
        assert_eq!(
            sql.query,
            "tags ? 'x' AND tags ?| array[$1, $2] AND note = 'why?' AND foo = $3"
        );
        assert_eq!(sql.args.len(), 3);

        let keys = Params::new().bind("keys", "a");
        let sql = bind("data ?& :keys", &keys, identity).unwrap();
        assert_eq!(sql.query, "data ??& ?");
    }

    #[test]
    fn params_from_json() {
        let params = Params::from_json(serde_json::json!({
            "name": "alice",
            "age": 30,
            "ids": [1, 2],
            "score": 1.5,
        }))
        .unwrap();
        assert_eq!(params.len(), 4);
        let sql = bind(
            "name = :name AND age = :age AND id IN (:ids) AND score > :score",
            &params,
            rebind,
        )
        .unwrap();
        assert_eq!(
            sql.query,
            "name = $1 AND age = $2 AND id IN ($3, $4) AND score > $5"
        );
        assert_eq!(sql.args_debug(), vec!["\"alice\"", "30", "1", "2", "1.5"]);
    }

    #[test]
    fn params_from_json_rejects_non_object() {
        assert!(Params::from_json(serde_json::json!([1, 2])).is_err());
        assert!(Params::from_json(serde_json::json!({"a": [[1]]})).is_err());
    }
}
