//! Method dispatch by name.
//!
//! A `Method` operation carries the method name as data; dispatch happens
//! here against the evaluated base value on every replay. `supports` is the
//! companion test used by attribute access to decide whether a name extends
//! the pipeline.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::{Table, Value};

/// Method names understood per value kind.
const STR_METHODS: &[&str] = &[
    "upper",
    "lower",
    "title",
    "strip",
    "split",
    "replace",
    "startswith",
    "endswith",
    "join",
];
const LIST_METHODS: &[&str] = &["count", "index"];
const MAP_METHODS: &[&str] = &["get", "keys", "values", "items"];
const TABLE_METHODS: &[&str] = &["head", "tail", "select", "sort_values", "plot"];

/// Whether `name` is a callable method of `value`.
pub fn supports(value: &Value, name: &str) -> bool {
    let names: &[&str] = match value {
        Value::Str(_) => STR_METHODS,
        Value::List(_) => LIST_METHODS,
        Value::Map(_) => MAP_METHODS,
        Value::Table(_) => TABLE_METHODS,
        _ => &[],
    };
    names.contains(&name)
}

/// Invoke `base.name(args, kwargs)`.
pub fn call(
    base: &Value,
    name: &str,
    args: &[Value],
    kwargs: &IndexMap<String, Value>,
) -> Result<Value> {
    match base {
        Value::Str(s) => str_method(s, name, args),
        Value::List(items) => list_method(items, name, args),
        Value::Map(m) => map_method(m, name, args),
        Value::Table(t) => table_method(t, name, args, kwargs),
        _ => Err(Error::UnknownMethod {
            name: name.to_string(),
            kind: base.kind(),
        }),
    }
}

fn arity(name: &str, expected: usize, got: usize) -> Error {
    Error::Arity {
        name: name.to_string(),
        expected,
        got,
    }
}

fn expect_str<'a>(_name: &str, v: &'a Value) -> Result<&'a str> {
    match v {
        Value::Str(s) => Ok(s),
        other => Err(Error::TypeMismatch {
            op: "method argument",
            lhs: "str",
            rhs: other.kind(),
        }),
    }
}

// =============================================================================
// Per-kind dispatch
// =============================================================================

fn str_method(s: &str, name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "upper" => Ok(Value::Str(s.to_uppercase())),
        "lower" => Ok(Value::Str(s.to_lowercase())),
        "strip" => Ok(Value::Str(s.trim().to_string())),
        "title" => {
            let mut out = String::with_capacity(s.len());
            let mut at_word_start = true;
            for c in s.chars() {
                if c.is_alphanumeric() {
                    if at_word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    at_word_start = false;
                } else {
                    out.push(c);
                    at_word_start = true;
                }
            }
            Ok(Value::Str(out))
        }
        "split" => {
            let parts: Vec<Value> = match args {
                [] => s.split_whitespace().map(|p| Value::Str(p.into())).collect(),
                [sep] => {
                    let sep = expect_str(name, sep)?;
                    s.split(sep).map(|p| Value::Str(p.into())).collect()
                }
                _ => return Err(arity(name, 1, args.len())),
            };
            Ok(Value::List(parts))
        }
        "replace" => match args {
            [from, to] => {
                let from = expect_str(name, from)?;
                let to = expect_str(name, to)?;
                Ok(Value::Str(s.replace(from, to)))
            }
            _ => Err(arity(name, 2, args.len())),
        },
        "startswith" => match args {
            [prefix] => Ok(Value::Bool(s.starts_with(expect_str(name, prefix)?))),
            _ => Err(arity(name, 1, args.len())),
        },
        "endswith" => match args {
            [suffix] => Ok(Value::Bool(s.ends_with(expect_str(name, suffix)?))),
            _ => Err(arity(name, 1, args.len())),
        },
        "join" => match args {
            [Value::List(items)] => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                Ok(Value::Str(parts.join(s)))
            }
            [other] => Err(Error::TypeMismatch {
                op: "join",
                lhs: "list",
                rhs: other.kind(),
            }),
            _ => Err(arity(name, 1, args.len())),
        },
        _ => Err(Error::UnknownMethod {
            name: name.to_string(),
            kind: "str",
        }),
    }
}

fn list_method(items: &[Value], name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "count" => match args {
            [needle] => Ok(Value::Int(items.iter().filter(|v| *v == needle).count() as i64)),
            _ => Err(arity(name, 1, args.len())),
        },
        "index" => match args {
            [needle] => items
                .iter()
                .position(|v| v == needle)
                .map(|i| Value::Int(i as i64))
                .ok_or_else(|| Error::MissingKey(needle.to_string())),
            _ => Err(arity(name, 1, args.len())),
        },
        _ => Err(Error::UnknownMethod {
            name: name.to_string(),
            kind: "list",
        }),
    }
}

fn map_method(m: &IndexMap<String, Value>, name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "get" => match args {
            [key] => {
                let key = expect_str(name, key)?;
                Ok(m.get(key).cloned().unwrap_or(Value::None))
            }
            [key, default] => {
                let key = expect_str(name, key)?;
                Ok(m.get(key).cloned().unwrap_or_else(|| default.clone()))
            }
            _ => Err(arity(name, 1, args.len())),
        },
        "keys" => Ok(Value::List(
            m.keys().map(|k| Value::Str(k.clone())).collect(),
        )),
        "values" => Ok(Value::List(m.values().cloned().collect())),
        "items" => Ok(Value::List(
            m.iter()
                .map(|(k, v)| Value::List(vec![Value::Str(k.clone()), v.clone()]))
                .collect(),
        )),
        _ => Err(Error::UnknownMethod {
            name: name.to_string(),
            kind: "map",
        }),
    }
}

fn table_method(
    t: &Table,
    name: &str,
    args: &[Value],
    kwargs: &IndexMap<String, Value>,
) -> Result<Value> {
    // `n` may come positionally or as a keyword, matching the original API.
    let row_count = |default: i64| -> Result<usize> {
        let n = match (args.first(), kwargs.get("n")) {
            (Some(Value::Int(n)), _) | (None, Some(Value::Int(n))) => *n,
            (None, None) => default,
            _ => {
                return Err(Error::TypeMismatch {
                    op: "method argument",
                    lhs: "int",
                    rhs: "other",
                });
            }
        };
        Ok(n.max(0) as usize)
    };

    match name {
        "head" => Ok(Value::Table(t.head(row_count(5)?))),
        "tail" => Ok(Value::Table(t.tail(row_count(5)?))),
        "select" => match args {
            [Value::List(cols)] => {
                let names = cols
                    .iter()
                    .map(|c| match c {
                        Value::Str(s) => Ok(s.clone()),
                        other => Err(Error::TypeMismatch {
                            op: "select",
                            lhs: "str",
                            rhs: other.kind(),
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Table(t.select(&names)?))
            }
            _ => Err(arity(name, 1, args.len())),
        },
        "sort_values" => {
            let by = match (args.first(), kwargs.get("by")) {
                (Some(v), _) | (None, Some(v)) => expect_str(name, v)?,
                (None, None) => return Err(arity(name, 1, 0)),
            };
            let ascending = kwargs
                .get("ascending")
                .map(Value::is_truthy)
                .unwrap_or(true);
            Ok(Value::Table(t.sort_by_column(by, ascending)?))
        }
        // Plotting itself belongs to a rendering collaborator; the core
        // records the call (with its injected kwargs) and summarizes it.
        "plot" => {
            let mut spec: IndexMap<String, Value> = IndexMap::new();
            spec.insert("kind".into(), Value::Str("plot".into()));
            spec.insert("rows".into(), Value::Int(t.len() as i64));
            for (k, v) in kwargs {
                spec.insert(k.clone(), v.clone());
            }
            Ok(Value::Map(spec))
        }
        _ => Err(Error::UnknownMethod {
            name: name.to_string(),
            kind: "table",
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kw() -> IndexMap<String, Value> {
        IndexMap::new()
    }

    #[test]
    fn test_str_methods() {
        let s = Value::Str("  hello world  ".into());
        assert_eq!(
            call(&s, "strip", &[], &kw()).unwrap(),
            Value::Str("hello world".into())
        );
        let s = Value::Str("a,b,c".into());
        assert_eq!(
            call(&s, "split", &[Value::Str(",".into())], &kw()).unwrap(),
            Value::List(vec![
                Value::Str("a".into()),
                Value::Str("b".into()),
                Value::Str("c".into())
            ])
        );
        let s = Value::Str("hello world".into());
        assert_eq!(
            call(&s, "title", &[], &kw()).unwrap(),
            Value::Str("Hello World".into())
        );
    }

    #[test]
    fn test_arity_error() {
        let s = Value::Str("x".into());
        assert_eq!(
            call(&s, "replace", &[Value::Str("a".into())], &kw()),
            Err(Error::Arity {
                name: "replace".into(),
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_map_get_default() {
        let mut m = IndexMap::new();
        m.insert("x".to_string(), Value::Int(1));
        let v = Value::Map(m);
        assert_eq!(
            call(&v, "get", &[Value::Str("y".into()), Value::Int(9)], &kw()).unwrap(),
            Value::Int(9)
        );
        assert_eq!(
            call(&v, "get", &[Value::Str("y".into())], &kw()).unwrap(),
            Value::None
        );
    }

    #[test]
    fn test_table_head_kwarg() {
        let t = Table::from_columns([("a", (0..10).map(Value::Int).collect::<Vec<_>>())]).unwrap();
        let v = Value::Table(t);

        let mut kwargs = IndexMap::new();
        kwargs.insert("n".to_string(), Value::Int(3));
        match call(&v, "head", &[], &kwargs).unwrap() {
            Value::Table(t) => assert_eq!(t.len(), 3),
            other => panic!("expected table, got {other:?}"),
        }
        // Default row count.
        match call(&v, "head", &[], &kw()).unwrap() {
            Value::Table(t) => assert_eq!(t.len(), 5),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_method() {
        assert!(matches!(
            call(&Value::Int(1), "head", &[], &kw()),
            Err(Error::UnknownMethod { .. })
        ));
    }

    #[test]
    fn test_supports() {
        assert!(supports(&Value::Str(String::new()), "upper"));
        assert!(!supports(&Value::Str(String::new()), "head"));
        assert!(supports(&Value::Table(Table::default()), "head"));
    }
}
