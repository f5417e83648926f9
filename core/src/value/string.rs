//! String operations at character granularity (§3.4).
//!
//! A `Str` value's `raw` is a `Vec<Value>` of single-`Char` values, each
//! individually capability-tracked, so that splicing one untrusted character
//! into an otherwise public string taints only that character's span when
//! `raw()` is recombined — the string *as a whole* still folds in every
//! character's metadata through `all_readers`/`all_sources` because each
//! char appears in the enclosing `Str` value's dependency-free raw slot, but
//! per-character reads (indexing) see only that character's own label.

use camel_types::{Capabilities, ExceptionKind};

use super::{Raw, Value};

#[must_use]
pub fn chars(v: &Value) -> Vec<Value> {
    match v.raw() {
        Raw::Str(cs) => cs.clone(),
        Raw::Char(_) => vec![v.clone()],
        _ => vec![],
    }
}

#[must_use]
pub fn native(v: &Value) -> String {
    match v.raw() {
        Raw::Str(cs) => cs
            .iter()
            .filter_map(|c| match c.raw() {
                Raw::Char(ch) => Some(*ch),
                _ => None,
            })
            .collect(),
        Raw::Char(ch) => ch.to_string(),
        _ => String::new(),
    }
}

/// `lhs + rhs`: concatenation, dependencies `(lhs, rhs)`.
pub fn concat(lhs: &Value, rhs: &Value) -> Result<Value, ExceptionKind> {
    if !matches!(lhs.raw(), Raw::Str(_)) || !matches!(rhs.raw(), Raw::Str(_)) {
        return Err(ExceptionKind::TypeError(format!(
            "can only concatenate str (not \"{}\") to str",
            rhs.type_name()
        )));
    }
    let s = format!("{}{}", native(lhs), native(rhs));
    Ok(Value::str(&s, Capabilities::camel(), vec![lhs.clone(), rhs.clone()]))
}

/// `s * n`: repetition.
pub fn repeat(s: &Value, n: &Value) -> Result<Value, ExceptionKind> {
    let Raw::Int(count) = n.raw() else {
        return Err(ExceptionKind::TypeError(
            "can't multiply sequence by non-int".to_string(),
        ));
    };
    let repeated = native(s).repeat((*count).max(0) as usize);
    Ok(Value::str(
        &repeated,
        Capabilities::camel(),
        vec![s.clone(), n.clone()],
    ))
}

/// `x in s`: containment at substring granularity (§4.2).
///
/// True: dependencies `{s, x}`. False: dependencies `{x, every char of s}`
/// (negative evidence depends on the whole string).
pub fn contains(haystack: &Value, needle: &Value) -> Result<Value, ExceptionKind> {
    if !matches!(haystack.raw(), Raw::Str(_)) {
        return Err(ExceptionKind::TypeError(
            "argument should be a str".to_string(),
        ));
    }
    let needle_str = native(needle);
    let hay_str = native(haystack);
    if hay_str.contains(&needle_str) {
        Ok(Value::bool(
            true,
            Capabilities::camel(),
            vec![haystack.clone(), needle.clone()],
        ))
    } else {
        let mut deps = chars(haystack);
        deps.push(needle.clone());
        Ok(Value::bool(false, Capabilities::camel(), deps))
    }
}

/// Negative indices follow Python semantics; out-of-range raises `IndexError`.
pub fn index(s: &Value, i: i64) -> Result<Value, ExceptionKind> {
    let cs = chars(s);
    let len = cs.len() as i64;
    let idx = if i < 0 { len + i } else { i };
    if idx < 0 || idx >= len {
        return Err(ExceptionKind::IndexError);
    }
    let c = &cs[idx as usize];
    Ok(Value::new(
        Raw::Char(match c.raw() {
            Raw::Char(ch) => *ch,
            _ => unreachable!(),
        }),
        c.metadata().clone(),
        vec![s.clone()],
    ))
}

/// Python-style slice: `s[start:stop:step]`, each bound defaulting per Python rules.
pub fn slice(
    s: &Value,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<Value, ExceptionKind> {
    let cs = chars(s);
    let len = cs.len() as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(ExceptionKind::ValueError("slice step cannot be zero".to_string()));
    }
    let normalize = |idx: i64| -> i64 {
        if idx < 0 {
            (len + idx).max(0)
        } else {
            idx.min(len)
        }
    };
    let (mut i, stop) = if step > 0 {
        (
            start.map_or(0, normalize),
            stop.map_or(len, normalize),
        )
    } else {
        (
            start.map_or(len - 1, |v| {
                if v < 0 {
                    (len + v).max(-1)
                } else {
                    v.min(len - 1)
                }
            }),
            stop.map_or(-1, |v| if v < 0 { len + v } else { v }),
        )
    };
    let mut result = String::new();
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if i >= 0 && i < len {
            if let Raw::Char(ch) = cs[i as usize].raw() {
                result.push(*ch);
            }
        }
        i += step;
    }
    Ok(Value::str(&result, Capabilities::camel(), vec![s.clone()]))
}

pub fn len(s: &Value) -> usize {
    chars(s).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::str(text, Capabilities::camel(), vec![])
    }

    #[test]
    fn concat_joins_native_strings() {
        let r = concat(&s("foo"), &s("bar")).unwrap();
        assert_eq!(native(&r), "foobar");
        assert_eq!(r.dependencies().len(), 2);
    }

    #[test]
    fn contains_true_has_minimal_dependencies() {
        let r = contains(&s("abc"), &s("a")).unwrap();
        assert!(matches!(r.raw(), Raw::Bool(true)));
        assert_eq!(r.dependencies().len(), 2);
    }

    #[test]
    fn contains_false_depends_on_every_char() {
        let r = contains(&s("bcd"), &s("a")).unwrap();
        assert!(matches!(r.raw(), Raw::Bool(false)));
        assert_eq!(r.dependencies().len(), 4); // 3 chars + needle
    }

    #[test]
    fn negative_index_matches_python() {
        let r = index(&s("hello"), -1).unwrap();
        assert!(matches!(r.raw(), Raw::Char('o')));
    }

    #[test]
    fn index_out_of_range_errors() {
        assert!(index(&s("hi"), 5).is_err());
    }

    #[test]
    fn slice_basic_range() {
        let r = slice(&s("hello"), Some(1), Some(4), None).unwrap();
        assert_eq!(native(&r), "ell");
    }

    #[test]
    fn slice_negative_step_reverses() {
        let r = slice(&s("hello"), None, None, Some(-1)).unwrap();
        assert_eq!(native(&r), "olleh");
    }
}
