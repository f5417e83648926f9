//! The pure built-in function library (§4.5).
//!
//! Grounded on the source interpreter's `library.py`: a fixed table of
//! free functions, always present in a fresh namespace regardless of what
//! tools get injected. Every built-in is a [`Callable::Builtin`] wrapping a
//! native closure; [`Callable::call`] still runs its side-effect guard, so a
//! built-in that tried to mutate one of its arguments would be caught the
//! same way a misbehaving tool would.
//!
//! Per-type methods (`str.upper`, `list.append`, `dict.get`, ...) are kept in
//! [`method`] rather than this module's top-level table, mirroring
//! `SUPPORTED_BUILT_IN_METHODS`'s split from `BUILT_IN_FUNCTIONS`.

use std::rc::Rc;

use camel_types::{Capabilities, ExceptionKind};

use crate::value::callable::{Callable, NativeFn};
use crate::value::{collection, numeric, string, Raw, Value};

fn builtin(name: &str, func: NativeFn) -> Value {
    Value::new(
        Raw::Callable(Callable::Builtin {
            name: name.to_string(),
            func,
        }),
        Capabilities::camel(),
        vec![],
    )
}

fn method(name: &str, receiver: Value, func: NativeFn) -> Value {
    Value::new(
        Raw::Callable(Callable::BuiltinMethod {
            name: name.to_string(),
            receiver: Box::new(receiver),
            func,
        }),
        Capabilities::camel(),
        vec![],
    )
}

fn arg(args: &[Value], i: usize) -> Result<&Value, ExceptionKind> {
    args.get(i)
        .ok_or_else(|| ExceptionKind::TypeError(format!("missing argument at position {i}")))
}

fn truthy(v: &Value) -> bool {
    match v.raw() {
        Raw::None => false,
        Raw::Bool(b) => *b,
        Raw::Int(i) => *i != 0,
        Raw::Float(f) => *f != 0.0,
        Raw::Str(cs) => !cs.is_empty(),
        Raw::Tuple(items) => !items.is_empty(),
        Raw::List(items) => !items.borrow().is_empty(),
        Raw::Set(items) => !items.borrow().is_empty(),
        Raw::Dict(entries) => !entries.borrow().is_empty(),
        _ => true,
    }
}

/// The fixed set of names visible in a brand-new namespace (§4.5).
#[must_use]
pub fn all() -> Vec<(String, Value)> {
    let mut names = Vec::new();

    names.push((
        "abs".to_string(),
        builtin(
            "abs",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                match v.raw() {
                    Raw::Int(i) => Ok(Value::int(i.abs(), Capabilities::camel(), vec![v.clone()])),
                    Raw::Float(f) => {
                        Ok(Value::float(f.abs(), Capabilities::camel(), vec![v.clone()]))
                    }
                    _ => Err(ExceptionKind::TypeError(format!(
                        "bad operand type for abs(): '{}'",
                        v.type_name()
                    ))),
                }
            }),
        ),
    ));

    names.push((
        "bool".to_string(),
        builtin(
            "bool",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                Ok(Value::bool(truthy(v), Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "any".to_string(),
        builtin(
            "any",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                let items = collection::elements(v);
                let found = items.iter().any(truthy);
                Ok(Value::bool(found, Capabilities::camel(), items))
            }),
        ),
    ));

    names.push((
        "all".to_string(),
        builtin(
            "all",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                let items = collection::elements(v);
                let ok = items.iter().all(truthy);
                Ok(Value::bool(ok, Capabilities::camel(), items))
            }),
        ),
    ));

    names.push((
        "len".to_string(),
        builtin(
            "len",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                let n = match v.raw() {
                    Raw::Str(_) | Raw::Char(_) => string::len(v) as i64,
                    _ => collection::len(v)? as i64,
                };
                Ok(Value::int(n, Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "int".to_string(),
        builtin(
            "int",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                let parsed = match v.raw() {
                    Raw::Int(i) => *i,
                    Raw::Float(f) => *f as i64,
                    Raw::Bool(b) => i64::from(*b),
                    Raw::Str(_) => string::native(v)
                        .trim()
                        .parse()
                        .map_err(|_| ExceptionKind::ValueError(format!(
                            "invalid literal for int() with base 10: '{}'",
                            string::native(v)
                        )))?,
                    _ => {
                        return Err(ExceptionKind::TypeError(format!(
                            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
                            v.type_name()
                        )))
                    }
                };
                Ok(Value::int(parsed, Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "float".to_string(),
        builtin(
            "float",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                let parsed = match v.raw() {
                    Raw::Int(i) => *i as f64,
                    Raw::Float(f) => *f,
                    Raw::Bool(b) => f64::from(*b),
                    Raw::Str(_) => string::native(v).trim().parse().map_err(|_| {
                        ExceptionKind::ValueError(format!(
                            "could not convert string to float: '{}'",
                            string::native(v)
                        ))
                    })?,
                    _ => {
                        return Err(ExceptionKind::TypeError(format!(
                            "float() argument must be a string or a real number, not '{}'",
                            v.type_name()
                        )))
                    }
                };
                Ok(Value::float(parsed, Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "str".to_string(),
        builtin(
            "str",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                Ok(Value::str(&display(v), Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "repr".to_string(),
        builtin(
            "repr",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                Ok(Value::str(&display(v), Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "type".to_string(),
        builtin(
            "type",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                Ok(Value::str(&v.type_name(), Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "list".to_string(),
        builtin(
            "list",
            Rc::new(|args, _kw, _ns| {
                let items = args.first().map(collection::elements).unwrap_or_default();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }),
        ),
    ));

    names.push((
        "tuple".to_string(),
        builtin(
            "tuple",
            Rc::new(|args, _kw, _ns| {
                let items = args.first().map(collection::elements).unwrap_or_default();
                Ok(Value::new(Raw::Tuple(items.clone()), Capabilities::camel(), items))
            }),
        ),
    ));

    names.push((
        "set".to_string(),
        builtin(
            "set",
            Rc::new(|args, _kw, _ns| {
                let mut items: Vec<Value> = Vec::new();
                for item in args.first().map(collection::elements).unwrap_or_default() {
                    if !items.iter().any(|i| i.raw_eq(&item)) {
                        items.push(item);
                    }
                }
                Ok(Value::new(
                    Raw::Set(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }),
        ),
    ));

    names.push((
        "range".to_string(),
        builtin(
            "range",
            Rc::new(|args, _kw, _ns| {
                let ints: Result<Vec<i64>, ExceptionKind> = args
                    .iter()
                    .map(|a| match a.raw() {
                        Raw::Int(i) => Ok(*i),
                        _ => Err(ExceptionKind::TypeError(
                            "'str' object cannot be interpreted as an integer".to_string(),
                        )),
                    })
                    .collect();
                let ints = ints?;
                let (start, stop, step) = match ints.as_slice() {
                    [stop] => (0, *stop, 1),
                    [start, stop] => (*start, *stop, 1),
                    [start, stop, step] => (*start, *stop, *step),
                    _ => {
                        return Err(ExceptionKind::TypeError(
                            "range expected at most 3 arguments".to_string(),
                        ))
                    }
                };
                if step == 0 {
                    return Err(ExceptionKind::ValueError(
                        "range() arg 3 must not be zero".to_string(),
                    ));
                }
                let mut items = Vec::new();
                let mut i = start;
                while (step > 0 && i < stop) || (step < 0 && i > stop) {
                    items.push(Value::int(i, Capabilities::camel(), vec![]));
                    i += step;
                }
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    args.to_vec(),
                ))
            }),
        ),
    ));

    names.push((
        "sum".to_string(),
        builtin(
            "sum",
            Rc::new(|args, _kw, _ns| {
                let items = collection::elements(arg(args, 0)?);
                let mut acc = Value::int(0, Capabilities::camel(), vec![]);
                for item in &items {
                    acc = numeric::binary_numeric(numeric::BinOp::Add, &acc, item)?;
                }
                Ok(acc)
            }),
        ),
    ));

    names.push((
        "max".to_string(),
        builtin("max", Rc::new(|args, _kw, ns| extremum(args, ns, true))),
    ));
    names.push((
        "min".to_string(),
        builtin("min", Rc::new(|args, _kw, ns| extremum(args, ns, false))),
    ));

    names.push((
        "sorted".to_string(),
        builtin(
            "sorted",
            Rc::new(|args, _kw, _ns| {
                let mut items = collection::elements(arg(args, 0)?);
                items.sort_by(|a, b| {
                    numeric::compare_numeric(a, b).unwrap_or(std::cmp::Ordering::Equal)
                });
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }),
        ),
    ));

    names.push((
        "reversed".to_string(),
        builtin(
            "reversed",
            Rc::new(|args, _kw, _ns| {
                let mut items = collection::elements(arg(args, 0)?);
                items.reverse();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }),
        ),
    ));

    names.push((
        "enumerate".to_string(),
        builtin(
            "enumerate",
            Rc::new(|args, _kw, _ns| {
                let items = collection::elements(arg(args, 0)?);
                let start = match args.get(1).map(Value::raw) {
                    Some(Raw::Int(i)) => *i,
                    _ => 0,
                };
                let pairs: Vec<Value> = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let idx = Value::int(start + i as i64, Capabilities::camel(), vec![]);
                        Value::new(
                            Raw::Tuple(vec![idx, v.clone()]),
                            Capabilities::camel(),
                            vec![v],
                        )
                    })
                    .collect();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(pairs.clone())),
                    Capabilities::camel(),
                    pairs,
                ))
            }),
        ),
    ));

    names.push((
        "zip".to_string(),
        builtin(
            "zip",
            Rc::new(|args, _kw, _ns| {
                let columns: Vec<Vec<Value>> = args.iter().map(collection::elements).collect();
                let shortest = columns.iter().map(Vec::len).min().unwrap_or(0);
                let mut rows = Vec::with_capacity(shortest);
                for i in 0..shortest {
                    let row: Vec<Value> = columns.iter().map(|c| c[i].clone()).collect();
                    rows.push(Value::new(Raw::Tuple(row.clone()), Capabilities::camel(), row));
                }
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(rows.clone())),
                    Capabilities::camel(),
                    rows,
                ))
            }),
        ),
    ));

    names.push((
        "divmod".to_string(),
        builtin(
            "divmod",
            Rc::new(|args, _kw, _ns| {
                let a = arg(args, 0)?;
                let b = arg(args, 1)?;
                let q = numeric::binary_numeric(numeric::BinOp::FloorDiv, a, b)?;
                let r = numeric::binary_numeric(numeric::BinOp::Mod, a, b)?;
                Ok(Value::new(
                    Raw::Tuple(vec![q.clone(), r.clone()]),
                    Capabilities::camel(),
                    vec![q, r],
                ))
            }),
        ),
    ));

    names.push((
        "hash".to_string(),
        builtin(
            "hash",
            Rc::new(|args, _kw, _ns| {
                use std::collections::hash_map::DefaultHasher;
                use std::hash::{Hash, Hasher};
                let v = arg(args, 0)?;
                let plain = format!("{:?}", v.to_plain());
                let mut hasher = DefaultHasher::new();
                plain.hash(&mut hasher);
                Ok(Value::int(hasher.finish() as i64, Capabilities::camel(), vec![v.clone()]))
            }),
        ),
    ));

    names.push((
        "dir".to_string(),
        builtin(
            "dir",
            Rc::new(|args, _kw, _ns| {
                let v = arg(args, 0)?;
                let names: Vec<Value> = match v.raw() {
                    Raw::ClassInstance(inst) => inst
                        .class
                        .attr_names()
                        .into_iter()
                        .map(|n| Value::str(&n, Capabilities::camel(), vec![]))
                        .collect(),
                    _ => vec![],
                };
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(names.clone())),
                    Capabilities::camel(),
                    names,
                ))
            }),
        ),
    ));

    names.push((
        "print".to_string(),
        builtin(
            "print",
            Rc::new(|_args, _kw, _ns| Ok(Value::none(Capabilities::camel(), vec![]))),
        ),
    ));

    names.extend(crate::builtin_classes::all());

    names
}

fn extremum(args: &[Value], _ns: &crate::namespace::Namespace, want_max: bool) -> Result<Value, ExceptionKind> {
    let items = if args.len() == 1 {
        collection::elements(&args[0])
    } else {
        args.to_vec()
    };
    let mut best: Option<&Value> = None;
    for item in &items {
        best = Some(match best {
            None => item,
            Some(b) => {
                let ord = numeric::compare_numeric(item, b).unwrap_or(std::cmp::Ordering::Equal);
                if (want_max && ord == std::cmp::Ordering::Greater)
                    || (!want_max && ord == std::cmp::Ordering::Less)
                {
                    item
                } else {
                    b
                }
            }
        });
    }
    best.cloned()
        .ok_or_else(|| ExceptionKind::ValueError(format!(
            "{}() arg is an empty sequence",
            if want_max { "max" } else { "min" }
        )))
}

/// `str()`/`repr()` rendering; shared with interpreter-level `print`.
#[must_use]
pub fn display(v: &Value) -> String {
    match v.raw() {
        Raw::None => "None".to_string(),
        Raw::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
        Raw::Char(c) => c.to_string(),
        Raw::Str(_) => string::native(v),
        Raw::Tuple(items) => format!(
            "({})",
            items.iter().map(display).collect::<Vec<_>>().join(", ")
        ),
        Raw::List(items) => format!(
            "[{}]",
            items.borrow().iter().map(display).collect::<Vec<_>>().join(", ")
        ),
        Raw::Set(items) => format!(
            "{{{}}}",
            items.borrow().iter().map(display).collect::<Vec<_>>().join(", ")
        ),
        Raw::Dict(entries) => format!(
            "{{{}}}",
            entries
                .borrow()
                .iter()
                .map(|(k, v)| format!("{}: {}", display(k), display(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Raw::Class(c) => format!("<class '{}'>", c.name),
        Raw::ClassInstance(i) => format!("<{} object>", i.class.name),
        Raw::Callable(c) => format!("<built-in function {}>", c.name()),
        Raw::Iterator(_) => "<iterator>".to_string(),
        Raw::Exception(e) => e.to_string(),
    }
}

/// Per-type method lookup (`"abc".upper`, `[1].append`, `d.get`, ...), mirroring
/// `SUPPORTED_BUILT_IN_METHODS`.
#[must_use]
pub fn method_for(receiver: &Value, name: &str) -> Option<Value> {
    match (receiver.raw(), name) {
        (Raw::Str(_), "upper") => Some(method(
            "upper",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                Ok(Value::str(
                    &string::native(&args[0]).to_uppercase(),
                    Capabilities::camel(),
                    vec![args[0].clone()],
                ))
            }),
        )),
        (Raw::Str(_), "lower") => Some(method(
            "lower",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                Ok(Value::str(
                    &string::native(&args[0]).to_lowercase(),
                    Capabilities::camel(),
                    vec![args[0].clone()],
                ))
            }),
        )),
        (Raw::Str(_), "strip") => Some(method(
            "strip",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                Ok(Value::str(
                    string::native(&args[0]).trim(),
                    Capabilities::camel(),
                    vec![args[0].clone()],
                ))
            }),
        )),
        (Raw::Str(_), "split") => Some(method(
            "split",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                let sep = args.get(1).map(string::native);
                let text = string::native(&args[0]);
                let parts: Vec<Value> = match &sep {
                    Some(sep) if !sep.is_empty() => text
                        .split(sep.as_str())
                        .map(|p| Value::str(p, Capabilities::camel(), vec![args[0].clone()]))
                        .collect(),
                    _ => text
                        .split_whitespace()
                        .map(|p| Value::str(p, Capabilities::camel(), vec![args[0].clone()]))
                        .collect(),
                };
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(parts.clone())),
                    Capabilities::camel(),
                    parts,
                ))
            }),
        )),
        (Raw::Str(_), "join") => Some(method(
            "join",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                let sep = string::native(&args[0]);
                let parts: Vec<String> = collection::elements(&args[1]).iter().map(string::native).collect();
                Ok(Value::str(
                    &parts.join(&sep),
                    Capabilities::camel(),
                    vec![args[0].clone(), args[1].clone()],
                ))
            }),
        )),
        (Raw::List(_), "append") => Some(method(
            "append",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                collection::append(&args[0], args[1].clone())?;
                Ok(Value::none(Capabilities::camel(), vec![]))
            }),
        )),
        (Raw::Dict(_), "get") => Some(method(
            "get",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                let found = collection::dict_get(&args[0], &args[1])?;
                Ok(found.unwrap_or_else(|| {
                    args.get(2)
                        .cloned()
                        .unwrap_or_else(|| Value::none(Capabilities::camel(), vec![]))
                }))
            }),
        )),
        (Raw::Dict(_), "items") => Some(method(
            "items",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                let items: Vec<Value> = collection::dict_items(&args[0])?
                    .into_iter()
                    .map(|(k, v)| Value::new(Raw::Tuple(vec![k.clone(), v.clone()]), Capabilities::camel(), vec![k, v]))
                    .collect();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }),
        )),
        (Raw::Dict(_), "keys") => Some(method(
            "keys",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                let items: Vec<Value> = collection::dict_items(&args[0])?.into_iter().map(|(k, _)| k).collect();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }),
        )),
        (Raw::Dict(_), "values") => Some(method(
            "values",
            receiver.clone(),
            Rc::new(|args, _kw, _ns| {
                let items: Vec<Value> = collection::dict_items(&args[0])?.into_iter().map(|(_, v)| v).collect();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }),
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    fn int(i: i64) -> Value {
        Value::int(i, Capabilities::camel(), vec![])
    }

    #[test]
    fn len_builtin_reports_list_length() {
        let ns = Namespace::with_builtins();
        let len_fn = ns.get("len").unwrap();
        let Raw::Callable(c) = len_fn.raw() else { panic!("not callable") };
        let list = Value::new(
            Raw::List(std::cell::RefCell::new(vec![int(1), int(2)])),
            Capabilities::camel(),
            vec![],
        );
        let out = c.call(&[list], &[], &ns).unwrap();
        assert!(matches!(out.raw(), Raw::Int(2)));
        assert!(out
            .metadata()
            .sources
            .iter()
            .any(|s| matches!(s, camel_types::Source::Tool { name, .. } if name == "len")));
    }

    #[test]
    fn sum_builtin_adds_ints() {
        let ns = Namespace::with_builtins();
        let Raw::Callable(c) = ns.get("sum").unwrap().raw() else { panic!() };
        let list = Value::new(
            Raw::List(std::cell::RefCell::new(vec![int(1), int(2), int(3)])),
            Capabilities::camel(),
            vec![],
        );
        let out = c.call(&[list], &[], &ns).unwrap();
        assert!(matches!(out.raw(), Raw::Int(6)));
    }

    #[test]
    fn max_builtin_picks_largest() {
        let ns = Namespace::with_builtins();
        let Raw::Callable(c) = ns.get("max").unwrap().raw() else { panic!() };
        let list = Value::new(
            Raw::List(std::cell::RefCell::new(vec![int(1), int(9), int(3)])),
            Capabilities::camel(),
            vec![],
        );
        let out = c.call(&[list], &[], &ns).unwrap();
        assert!(matches!(out.raw(), Raw::Int(9)));
    }

    #[test]
    fn str_method_upper_uppercases() {
        let s = Value::str("abc", Capabilities::camel(), vec![]);
        let m = method_for(&s, "upper").unwrap();
        let Raw::Callable(c) = m.raw() else { panic!() };
        let ns = Namespace::with_builtins();
        let out = c.call(&[s], &[], &ns).unwrap();
        assert_eq!(string::native(&out), "ABC");
    }
}
