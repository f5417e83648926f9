//! Sequence, mapping, and iterator operations (§3.4, §4.2).

use std::collections::VecDeque;

use camel_types::{Capabilities, ExceptionKind};

use super::{Raw, Value};

/// Elements of a `Tuple`/`List`/`Set`, regardless of mutability wrapper.
#[must_use]
pub fn elements(v: &Value) -> Vec<Value> {
    match v.raw() {
        Raw::Tuple(items) => items.clone(),
        Raw::List(items) => items.borrow().clone(),
        Raw::Set(items) => items.borrow().clone(),
        _ => vec![],
    }
}

pub fn len(v: &Value) -> Result<usize, ExceptionKind> {
    match v.raw() {
        Raw::Tuple(items) => Ok(items.len()),
        Raw::List(items) => Ok(items.borrow().len()),
        Raw::Set(items) => Ok(items.borrow().len()),
        Raw::Dict(entries) => Ok(entries.borrow().len()),
        Raw::Str(cs) => Ok(cs.len()),
        _ => Err(ExceptionKind::TypeError(format!(
            "object of type '{}' has no len()",
            v.type_name()
        ))),
    }
}

/// `x in c` for list/tuple/set: true depends on `(c, x, matched_element)`;
/// false depends on `x` plus every element of `c` (§4.2).
pub fn contains(container: &Value, needle: &Value) -> Result<Value, ExceptionKind> {
    let items = elements(container);
    for item in &items {
        if item.raw_eq(needle) {
            return Ok(Value::bool(
                true,
                Capabilities::camel(),
                vec![container.clone(), needle.clone(), item.clone()],
            ));
        }
    }
    let mut deps = items;
    deps.push(needle.clone());
    Ok(Value::bool(false, Capabilities::camel(), deps))
}

/// Negative-index subscript, matching Python semantics.
pub fn index(container: &Value, i: i64) -> Result<Value, ExceptionKind> {
    let items = elements(container);
    let len = items.len() as i64;
    let idx = if i < 0 { len + i } else { i };
    if idx < 0 || idx >= len {
        return Err(ExceptionKind::IndexError);
    }
    let item = items[idx as usize].clone();
    // Subscript read propagates receiver and key into dependencies (§4.2).
    Ok(Value::new(
        clone_raw(&item),
        item.metadata().clone(),
        vec![container.clone(), item.clone()],
    ))
}

fn clone_raw(v: &Value) -> Raw {
    match v.raw() {
        Raw::None => Raw::None,
        Raw::Bool(b) => Raw::Bool(*b),
        Raw::Int(i) => Raw::Int(*i),
        Raw::Float(f) => Raw::Float(*f),
        Raw::Char(c) => Raw::Char(*c),
        Raw::Str(cs) => Raw::Str(cs.clone()),
        Raw::Tuple(items) => Raw::Tuple(items.clone()),
        Raw::List(items) => Raw::List(items.clone()),
        Raw::Set(items) => Raw::Set(items.clone()),
        Raw::Dict(entries) => Raw::Dict(entries.clone()),
        Raw::Iterator(items) => Raw::Iterator(items.clone()),
        Raw::Class(c) => Raw::Class(c.clone()),
        Raw::ClassInstance(i) => Raw::ClassInstance(i.clone()),
        Raw::Callable(c) => Raw::Callable(c.clone()),
        Raw::Exception(e) => Raw::Exception(e.clone()),
    }
}

/// `container[index] = value` for a `List`; mutates in place (interpreter-only, §3.4).
pub fn set_index(container: &Value, i: i64, value: Value) -> Result<(), ExceptionKind> {
    let Raw::List(items) = container.raw() else {
        return Err(ExceptionKind::TypeError(
            "object does not support item assignment".to_string(),
        ));
    };
    let mut items = items.borrow_mut();
    let len = items.len() as i64;
    let idx = if i < 0 { len + i } else { i };
    if idx < 0 || idx >= len {
        return Err(ExceptionKind::IndexError);
    }
    items[idx as usize] = value;
    Ok(())
}

pub fn append(container: &Value, value: Value) -> Result<(), ExceptionKind> {
    let Raw::List(items) = container.raw() else {
        return Err(ExceptionKind::AttributeError {
            type_name: container.type_name(),
            attr: "append".to_string(),
        });
    };
    items.borrow_mut().push(value);
    Ok(())
}

pub fn iterate(v: &Value) -> Value {
    let items: VecDeque<Value> = match v.raw() {
        Raw::Tuple(items) => items.iter().cloned().collect(),
        Raw::List(items) => items.borrow().iter().cloned().collect(),
        Raw::Set(items) => items.borrow().iter().cloned().collect(),
        Raw::Str(cs) => cs.iter().cloned().collect(),
        Raw::Dict(entries) => entries.borrow().iter().map(|(k, _)| k.clone()).collect(),
        _ => VecDeque::new(),
    };
    Value::new(
        Raw::Iterator(std::cell::RefCell::new(items)),
        Capabilities::camel(),
        vec![v.clone()],
    )
}

pub fn iterator_next(it: &Value) -> Option<Value> {
    let Raw::Iterator(items) = it.raw() else {
        return None;
    };
    let next = items.borrow_mut().pop_front();
    next.map(|v| {
        Value::new(
            clone_raw(&v),
            v.metadata().clone(),
            vec![it.clone(), v.clone()],
        )
    })
}

/// `dict.get(key)`: `KeyError` on miss via `[]`, `None` default via `.get`.
pub fn dict_get(dict: &Value, key: &Value) -> Result<Option<Value>, ExceptionKind> {
    let Raw::Dict(entries) = dict.raw() else {
        return Err(ExceptionKind::TypeError("not a dict".to_string()));
    };
    for (k, v) in entries.borrow().iter() {
        if k.raw_eq(key) {
            return Ok(Some(Value::new(
                clone_raw(v),
                v.metadata().clone(),
                vec![dict.clone(), key.clone()],
            )));
        }
    }
    Ok(None)
}

pub fn dict_index(dict: &Value, key: &Value) -> Result<Value, ExceptionKind> {
    dict_get(dict, key)?.ok_or_else(|| {
        ExceptionKind::KeyError(format!("{:?}", key.to_plain()))
    })
}

pub fn dict_set(dict: &Value, key: Value, value: Value) -> Result<(), ExceptionKind> {
    let Raw::Dict(entries) = dict.raw() else {
        return Err(ExceptionKind::TypeError("not a dict".to_string()));
    };
    let mut entries = entries.borrow_mut();
    if let Some(slot) = entries.iter_mut().find(|(k, _)| k.raw_eq(&key)) {
        slot.1 = value;
    } else {
        entries.push((key, value));
    }
    Ok(())
}

pub fn dict_items(dict: &Value) -> Result<Vec<(Value, Value)>, ExceptionKind> {
    let Raw::Dict(entries) = dict.raw() else {
        return Err(ExceptionKind::TypeError("not a dict".to_string()));
    };
    Ok(entries.borrow().clone())
}

/// Python-style slice over a `List`/`Tuple`: `c[start:stop:step]`.
pub fn slice(
    c: &Value,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<Value, ExceptionKind> {
    let items = elements(c);
    let len = items.len() as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(ExceptionKind::ValueError("slice step cannot be zero".to_string()));
    }
    let normalize_fwd = |idx: i64| -> i64 {
        if idx < 0 {
            (len + idx).max(0)
        } else {
            idx.min(len)
        }
    };
    let (mut i, stop) = if step > 0 {
        (start.map_or(0, normalize_fwd), stop.map_or(len, normalize_fwd))
    } else {
        (
            start.map_or(len - 1, |v| if v < 0 { (len + v).max(-1) } else { v.min(len - 1) }),
            stop.map_or(-1, |v| if v < 0 { len + v } else { v }),
        )
    };
    let mut result = Vec::new();
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if i >= 0 && i < len {
            result.push(items[i as usize].clone());
        }
        i += step;
    }
    let deps = result.clone();
    Ok(match c.raw() {
        Raw::Tuple(_) => Value::new(Raw::Tuple(result), Capabilities::camel(), deps),
        _ => Value::new(
            Raw::List(std::cell::RefCell::new(result)),
            Capabilities::camel(),
            deps,
        ),
    })
}

/// `a + b` for list/tuple.
pub fn concat(lhs: &Value, rhs: &Value) -> Result<Value, ExceptionKind> {
    let deps = vec![lhs.clone(), rhs.clone()];
    match (lhs.raw(), rhs.raw()) {
        (Raw::List(a), Raw::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::new(
                Raw::List(std::cell::RefCell::new(items)),
                Capabilities::camel(),
                deps,
            ))
        }
        (Raw::Tuple(a), Raw::Tuple(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            Ok(Value::new(Raw::Tuple(items), Capabilities::camel(), deps))
        }
        _ => Err(ExceptionKind::TypeError(format!(
            "can only concatenate {} (not \"{}\") to {0}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: Vec<Value>) -> Value {
        Value::new(
            Raw::List(std::cell::RefCell::new(items)),
            Capabilities::camel(),
            vec![],
        )
    }

    fn int(i: i64) -> Value {
        Value::int(i, Capabilities::camel(), vec![])
    }

    #[test]
    fn len_of_list() {
        let l = list(vec![int(1), int(2), int(3)]);
        assert_eq!(len(&l).unwrap(), 3);
    }

    #[test]
    fn contains_true_minimal_deps() {
        let l = list(vec![int(1), int(2)]);
        let r = contains(&l, &int(2)).unwrap();
        assert!(matches!(r.raw(), Raw::Bool(true)));
        assert_eq!(r.dependencies().len(), 3);
    }

    #[test]
    fn contains_false_depends_on_all_elements() {
        let l = list(vec![int(1), int(2), int(3)]);
        let r = contains(&l, &int(9)).unwrap();
        assert!(matches!(r.raw(), Raw::Bool(false)));
        assert_eq!(r.dependencies().len(), 4);
    }

    #[test]
    fn negative_index_matches_python() {
        let l = list(vec![int(1), int(2), int(3)]);
        let r = index(&l, -1).unwrap();
        assert!(matches!(r.raw(), Raw::Int(3)));
    }

    #[test]
    fn set_index_mutates_in_place() {
        let l = list(vec![int(1), int(2)]);
        set_index(&l, 0, int(9)).unwrap();
        assert!(matches!(elements(&l)[0].raw(), Raw::Int(9)));
    }

    #[test]
    fn dict_round_trip() {
        let d = Value::new(
            Raw::Dict(std::cell::RefCell::new(vec![])),
            Capabilities::camel(),
            vec![],
        );
        dict_set(&d, Value::str("k", Capabilities::camel(), vec![]), int(1)).unwrap();
        let got = dict_index(&d, &Value::str("k", Capabilities::camel(), vec![])).unwrap();
        assert!(matches!(got.raw(), Raw::Int(1)));
    }

    #[test]
    fn slice_basic_range() {
        let l = list(vec![int(1), int(2), int(3), int(4)]);
        let r = slice(&l, Some(1), Some(3), None).unwrap();
        assert_eq!(elements(&r).len(), 2);
    }

    #[test]
    fn dict_missing_key_errors() {
        let d = Value::new(
            Raw::Dict(std::cell::RefCell::new(vec![])),
            Capabilities::camel(),
            vec![],
        );
        assert!(dict_index(&d, &int(1)).is_err());
    }
}
