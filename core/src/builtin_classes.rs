//! Built-in classes: the datetime family, a pydantic-like `BaseModel`
//! wrapper, and `Enum` (§3.4, §4.3).
//!
//! Grounded on `library.py`'s `BUILT_IN_CLASSES` table, which wraps Python's
//! own `datetime`/`pydantic` types one built-in method at a time. There is
//! no native value shape for an opaque `datetime.datetime`, so each instance
//! here is an ordinary `ClassInstance` whose fields are its date/time
//! components; `chrono` (already the teacher's own date/time crate) does
//! the calendar arithmetic and formatting at the boundary of every method.
//! Every class's own methods close over a `Weak<ClassDef>` pointing back at
//! itself (via `Rc::new_cyclic`) so a method can build another instance of
//! its own class without the class needing to know its own `Rc` ahead of
//! construction.

use std::rc::{Rc, Weak};

use camel_types::{Capabilities, ExceptionKind};
use chrono::{Datelike, Timelike};

use crate::value::callable::{Callable, NativeFn};
use crate::value::class::{ClassDef, ClassInstance};
use crate::value::{Raw, Value};

fn builtin_fn(name: &str, func: NativeFn) -> Callable {
    Callable::Builtin {
        name: name.to_string(),
        func,
    }
}

fn class_value(def: Rc<ClassDef>) -> Value {
    Value::new(Raw::Class(def), Capabilities::camel(), vec![])
}

fn make_instance(def: &Rc<ClassDef>, fields: Vec<(&str, Value)>) -> Value {
    let fields = fields.into_iter().map(|(n, v)| (n.to_string(), v)).collect();
    Value::new(
        Raw::ClassInstance(ClassInstance::new(def.clone(), fields)),
        Capabilities::camel(),
        vec![],
    )
}

fn iv(n: i64) -> Value {
    Value::int(n, Capabilities::camel(), vec![])
}

fn sv(s: &str) -> Value {
    Value::str(s, Capabilities::camel(), vec![])
}

fn as_i64(v: &Value) -> Result<i64, ExceptionKind> {
    match v.raw() {
        Raw::Int(i) => Ok(*i),
        Raw::Bool(b) => Ok(i64::from(*b)),
        _ => Err(ExceptionKind::TypeError(format!("expected int, got {}", v.type_name()))),
    }
}

/// Bind one positional-or-keyword argument by Python signature position,
/// falling back to `default` when neither is supplied.
fn bind_int(
    positional: &[Value],
    keyword: &[(String, Value)],
    index: usize,
    name: &str,
    default: Option<i64>,
) -> Result<i64, ExceptionKind> {
    if let Some(v) = positional.get(index) {
        return as_i64(v);
    }
    if let Some((_, v)) = keyword.iter().find(|(k, _)| k == name) {
        return as_i64(v);
    }
    default.ok_or_else(|| ExceptionKind::TypeError(format!("missing required argument: '{name}'")))
}

fn instance_of<'a>(v: &'a Value, class_name: &str) -> Result<&'a ClassInstance, ExceptionKind> {
    match v.raw() {
        Raw::ClassInstance(inst) if inst.class.name == class_name => Ok(inst),
        _ => Err(ExceptionKind::TypeError(format!(
            "expected {class_name}, got {}",
            v.type_name()
        ))),
    }
}

fn field(inst: &ClassInstance, name: &str) -> i64 {
    inst.get_field(name).and_then(|v| as_i64(&v).ok()).unwrap_or(0)
}

fn field_str(inst: &ClassInstance, name: &str) -> String {
    inst.get_field(name).map(|v| crate::value::string::native(&v)).unwrap_or_default()
}

fn upgrade(weak: &Weak<ClassDef>) -> Rc<ClassDef> {
    weak.upgrade().expect("a class outlives any call made through its own value")
}

/// `replace(field=value, ...)`: start from `inst`'s own fields, in the order
/// of `names`, overriding any field named as a keyword argument.
fn replace_fields(inst: &ClassInstance, keyword: &[(String, Value)], names: &[&str]) -> Vec<i64> {
    names
        .iter()
        .map(|name| {
            keyword
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| as_i64(v).unwrap_or_else(|_| field(inst, name)))
                .unwrap_or_else(|| field(inst, name))
        })
        .collect()
}

fn normalize_timedelta(total_micros: i128) -> (i64, i64, i64) {
    const MICROS_PER_DAY: i128 = 86_400_000_000;
    let days = total_micros.div_euclid(MICROS_PER_DAY);
    let rem = total_micros.rem_euclid(MICROS_PER_DAY);
    (
        i64::try_from(days).unwrap_or(0),
        i64::try_from(rem / 1_000_000).unwrap_or(0),
        i64::try_from(rem % 1_000_000).unwrap_or(0),
    )
}

fn timedelta_total_micros(inst: &ClassInstance) -> i128 {
    i128::from(field(inst, "days")) * 86_400_000_000
        + i128::from(field(inst, "seconds")) * 1_000_000
        + i128::from(field(inst, "microseconds"))
}

fn timedelta_value(def: &Rc<ClassDef>, total_micros: i128) -> Value {
    let (days, seconds, microseconds) = normalize_timedelta(total_micros);
    make_instance(
        def,
        vec![("days", iv(days)), ("seconds", iv(seconds)), ("microseconds", iv(microseconds))],
    )
}

fn to_naive_date(year: i64, month: i64, day: i64) -> Result<chrono::NaiveDate, ExceptionKind> {
    let (y, m, d) = (
        i32::try_from(year).map_err(|_| ExceptionKind::ValueError("year out of range".to_string()))?,
        u32::try_from(month).map_err(|_| ExceptionKind::ValueError("month out of range".to_string()))?,
        u32::try_from(day).map_err(|_| ExceptionKind::ValueError("day out of range".to_string()))?,
    );
    chrono::NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| ExceptionKind::ValueError("day is out of range for month".to_string()))
}

fn to_naive_time(hour: i64, minute: i64, second: i64, microsecond: i64) -> Result<chrono::NaiveTime, ExceptionKind> {
    let (h, mi, s, us) = (
        u32::try_from(hour).map_err(|_| ExceptionKind::ValueError("hour out of range".to_string()))?,
        u32::try_from(minute).map_err(|_| ExceptionKind::ValueError("minute out of range".to_string()))?,
        u32::try_from(second).map_err(|_| ExceptionKind::ValueError("second out of range".to_string()))?,
        u32::try_from(microsecond).map_err(|_| ExceptionKind::ValueError("microsecond out of range".to_string()))?,
    );
    chrono::NaiveTime::from_hms_micro_opt(h, mi, s, us)
        .ok_or_else(|| ExceptionKind::ValueError("time field out of range".to_string()))
}

fn date_fields(date: chrono::NaiveDate) -> Vec<(&'static str, Value)> {
    vec![
        ("year", iv(i64::from(date.year()))),
        ("month", iv(i64::from(date.month()))),
        ("day", iv(i64::from(date.day()))),
    ]
}

fn time_fields(time: chrono::NaiveTime) -> Vec<(&'static str, Value)> {
    vec![
        ("hour", iv(i64::from(time.hour()))),
        ("minute", iv(i64::from(time.minute()))),
        ("second", iv(i64::from(time.second()))),
        ("microsecond", iv(i64::from(time.nanosecond() / 1_000))),
    ]
}

/// `ValueError`/`NotEnoughInformationError`: raising `ValueError("msg")`
/// builds an ordinary exception value through a constructor override
/// instead of the generic field-zip path, since these classes are not
/// data containers (§4.7).
fn error_class(name: &'static str, kind_ctor: fn(String) -> ExceptionKind) -> Value {
    let func: NativeFn = Rc::new(move |args, _kw, _ns| {
        let message = args.first().map(crate::value::string::native).unwrap_or_default();
        Ok(crate::exception::make(kind_ctor(message), None, None, args.to_vec()))
    });
    class_value(Rc::new(ClassDef {
        name: name.to_string(),
        fields: Vec::new(),
        field_types: Vec::new(),
        methods: Vec::new(),
        class_methods: Vec::new(),
        class_attrs: std::cell::RefCell::new(Vec::new()),
        base_classes: Vec::new(),
        constructor: Some(func),
        is_builtin: true,
    }))
}

fn marker_class(name: &'static str, methods: Vec<(String, Callable)>) -> Value {
    class_value(Rc::new(ClassDef {
        name: name.to_string(),
        fields: Vec::new(),
        field_types: Vec::new(),
        methods,
        class_methods: Vec::new(),
        class_attrs: std::cell::RefCell::new(Vec::new()),
        base_classes: Vec::new(),
        constructor: None,
        is_builtin: true,
    }))
}

fn base_model_class() -> Value {
    let model_dump: NativeFn = Rc::new(|args, _kw, _ns| {
        let Raw::ClassInstance(inst) = args[0].raw() else {
            return Err(ExceptionKind::TypeError("model_dump() requires a model instance".to_string()));
        };
        let entries: Vec<(Value, Value)> = inst
            .class
            .fields
            .iter()
            .filter_map(|name| inst.get_field(name).map(|v| (sv(name), v)))
            .collect();
        Ok(Value::new(Raw::Dict(std::cell::RefCell::new(entries)), Capabilities::camel(), vec![]))
    });
    marker_class("BaseModel", vec![("model_dump".to_string(), builtin_fn("model_dump", model_dump))])
}

fn timedelta_class() -> Rc<ClassDef> {
    Rc::new_cyclic(|weak: &Weak<ClassDef>| {
        let ctor_weak = weak.clone();
        let constructor: NativeFn = Rc::new(move |positional, keyword, _ns| {
            let days = bind_int(positional, keyword, 0, "days", Some(0))?;
            let seconds = bind_int(positional, keyword, 1, "seconds", Some(0))?;
            let microseconds = bind_int(positional, keyword, 2, "microseconds", Some(0))?;
            let milliseconds = bind_int(positional, keyword, 3, "milliseconds", Some(0))?;
            let minutes = bind_int(positional, keyword, 4, "minutes", Some(0))?;
            let hours = bind_int(positional, keyword, 5, "hours", Some(0))?;
            let weeks = bind_int(positional, keyword, 6, "weeks", Some(0))?;
            let total = i128::from(days + weeks * 7) * 86_400_000_000
                + i128::from(hours * 3600 + minutes * 60 + seconds) * 1_000_000
                + i128::from(microseconds + milliseconds * 1_000);
            Ok(timedelta_value(&upgrade(&ctor_weak), total))
        });

        let total_seconds: NativeFn = Rc::new(move |args, _kw, _ns| {
            let inst = instance_of(&args[0], "timedelta")?;
            let micros = timedelta_total_micros(inst);
            Ok(Value::float(micros as f64 / 1_000_000.0, Capabilities::camel(), vec![]))
        });

        let add_weak = weak.clone();
        let add: NativeFn = Rc::new(move |args, _kw, _ns| {
            let lhs = instance_of(&args[0], "timedelta")?;
            let rhs = instance_of(&args[1], "timedelta")?;
            let total = timedelta_total_micros(lhs) + timedelta_total_micros(rhs);
            Ok(timedelta_value(&upgrade(&add_weak), total))
        });

        let sub_weak = weak.clone();
        let sub: NativeFn = Rc::new(move |args, _kw, _ns| {
            let lhs = instance_of(&args[0], "timedelta")?;
            let rhs = instance_of(&args[1], "timedelta")?;
            let total = timedelta_total_micros(lhs) - timedelta_total_micros(rhs);
            Ok(timedelta_value(&upgrade(&sub_weak), total))
        });

        let mul_weak = weak.clone();
        let mul: NativeFn = Rc::new(move |args, _kw, _ns| {
            let lhs = instance_of(&args[0], "timedelta")?;
            let factor = as_i64(&args[1])?;
            Ok(timedelta_value(&upgrade(&mul_weak), timedelta_total_micros(lhs) * i128::from(factor)))
        });

        let truediv_weak = weak.clone();
        let truediv: NativeFn = Rc::new(move |args, _kw, _ns| {
            let lhs = instance_of(&args[0], "timedelta")?;
            let divisor = as_i64(&args[1])?;
            if divisor == 0 {
                return Err(ExceptionKind::ZeroDivisionError);
            }
            Ok(timedelta_value(&upgrade(&truediv_weak), timedelta_total_micros(lhs) / i128::from(divisor)))
        });

        ClassDef {
            name: "timedelta".to_string(),
            fields: vec!["days".to_string(), "seconds".to_string(), "microseconds".to_string()],
            field_types: vec![
                ("days".to_string(), "int".to_string()),
                ("seconds".to_string(), "int".to_string()),
                ("microseconds".to_string(), "int".to_string()),
            ],
            methods: vec![
                ("total_seconds".to_string(), builtin_fn("total_seconds", total_seconds)),
                ("__add__".to_string(), builtin_fn("__add__", add.clone())),
                ("__radd__".to_string(), builtin_fn("__radd__", add)),
                ("__sub__".to_string(), builtin_fn("__sub__", sub)),
                ("__mul__".to_string(), builtin_fn("__mul__", mul.clone())),
                ("__rmul__".to_string(), builtin_fn("__rmul__", mul)),
                ("__truediv__".to_string(), builtin_fn("__truediv__", truediv)),
            ],
            class_methods: Vec::new(),
            class_attrs: std::cell::RefCell::new(Vec::new()),
            base_classes: Vec::new(),
            constructor: Some(constructor),
            is_builtin: true,
        }
    })
}

fn date_class(timedelta_def: Rc<ClassDef>) -> Rc<ClassDef> {
    Rc::new_cyclic(|weak: &Weak<ClassDef>| {
        let ctor_weak = weak.clone();
        let constructor: NativeFn = Rc::new(move |positional, keyword, _ns| {
            let year = bind_int(positional, keyword, 0, "year", None)?;
            let month = bind_int(positional, keyword, 1, "month", None)?;
            let day = bind_int(positional, keyword, 2, "day", None)?;
            let date = to_naive_date(year, month, day)?;
            Ok(make_instance(&upgrade(&ctor_weak), date_fields(date)))
        });

        let isoformat: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "date")?;
            let date = to_naive_date(field(inst, "year"), field(inst, "month"), field(inst, "day"))?;
            Ok(sv(&date.format("%Y-%m-%d").to_string()))
        });

        let strftime: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "date")?;
            let date = to_naive_date(field(inst, "year"), field(inst, "month"), field(inst, "day"))?;
            let fmt = crate::value::string::native(&args[1]);
            Ok(sv(&date.format(&fmt).to_string()))
        });

        let weekday: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "date")?;
            let date = to_naive_date(field(inst, "year"), field(inst, "month"), field(inst, "day"))?;
            Ok(iv(i64::from(date.weekday().num_days_from_monday())))
        });

        let replace_weak = weak.clone();
        let replace: NativeFn = Rc::new(move |args, kw, _ns| {
            let inst = instance_of(&args[0], "date")?;
            let parts = replace_fields(inst, kw, &["year", "month", "day"]);
            let date = to_naive_date(parts[0], parts[1], parts[2])?;
            Ok(make_instance(&upgrade(&replace_weak), date_fields(date)))
        });

        let fromiso_weak = weak.clone();
        let fromisoformat: NativeFn = Rc::new(move |args, _kw, _ns| {
            let s = crate::value::string::native(&args[0]);
            let date = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|e| ExceptionKind::ValueError(format!("invalid isoformat date: {e}")))?;
            Ok(make_instance(&upgrade(&fromiso_weak), date_fields(date)))
        });

        let add_weak = weak.clone();
        let add: NativeFn = Rc::new(move |args, _kw, _ns| {
            let this = instance_of(&args[0], "date")?;
            let other = instance_of(&args[1], "timedelta")?;
            let date = to_naive_date(field(this, "year"), field(this, "month"), field(this, "day"))?;
            let shifted = date + chrono::Duration::days(field(other, "days"));
            Ok(make_instance(&upgrade(&add_weak), date_fields(shifted)))
        });

        let sub_weak = weak.clone();
        let sub: NativeFn = Rc::new(move |args, _kw, _ns| {
            let this = instance_of(&args[0], "date")?;
            let date = to_naive_date(field(this, "year"), field(this, "month"), field(this, "day"))?;
            match args[1].raw() {
                Raw::ClassInstance(rhs) if rhs.class.name == "date" => {
                    let other = to_naive_date(field(rhs, "year"), field(rhs, "month"), field(rhs, "day"))?;
                    let days = (date - other).num_days();
                    Ok(timedelta_value(&timedelta_def, i128::from(days) * 86_400_000_000))
                }
                Raw::ClassInstance(rhs) if rhs.class.name == "timedelta" => {
                    let shifted = date - chrono::Duration::days(field(rhs, "days"));
                    Ok(make_instance(&upgrade(&sub_weak), date_fields(shifted)))
                }
                _ => Err(ExceptionKind::TypeError("date.__sub__ expects a date or timedelta".to_string())),
            }
        });

        ClassDef {
            name: "date".to_string(),
            fields: vec!["year".to_string(), "month".to_string(), "day".to_string()],
            field_types: vec![
                ("year".to_string(), "int".to_string()),
                ("month".to_string(), "int".to_string()),
                ("day".to_string(), "int".to_string()),
            ],
            methods: vec![
                ("isoformat".to_string(), builtin_fn("isoformat", isoformat)),
                ("strftime".to_string(), builtin_fn("strftime", strftime)),
                ("weekday".to_string(), builtin_fn("weekday", weekday)),
                ("replace".to_string(), builtin_fn("replace", replace)),
                ("__add__".to_string(), builtin_fn("__add__", add.clone())),
                ("__radd__".to_string(), builtin_fn("__radd__", add)),
                ("__sub__".to_string(), builtin_fn("__sub__", sub)),
            ],
            class_methods: vec![("fromisoformat".to_string(), builtin_fn("fromisoformat", fromisoformat))],
            class_attrs: std::cell::RefCell::new(Vec::new()),
            base_classes: Vec::new(),
            constructor: Some(constructor),
            is_builtin: true,
        }
    })
}

fn time_class() -> Rc<ClassDef> {
    Rc::new_cyclic(|weak: &Weak<ClassDef>| {
        let ctor_weak = weak.clone();
        let constructor: NativeFn = Rc::new(move |positional, keyword, _ns| {
            let hour = bind_int(positional, keyword, 0, "hour", Some(0))?;
            let minute = bind_int(positional, keyword, 1, "minute", Some(0))?;
            let second = bind_int(positional, keyword, 2, "second", Some(0))?;
            let microsecond = bind_int(positional, keyword, 3, "microsecond", Some(0))?;
            let time = to_naive_time(hour, minute, second, microsecond)?;
            Ok(make_instance(&upgrade(&ctor_weak), time_fields(time)))
        });

        let isoformat: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "time")?;
            let time = to_naive_time(field(inst, "hour"), field(inst, "minute"), field(inst, "second"), field(inst, "microsecond"))?;
            let text = if field(inst, "microsecond") == 0 {
                time.format("%H:%M:%S").to_string()
            } else {
                time.format("%H:%M:%S%.6f").to_string()
            };
            Ok(sv(&text))
        });

        let strftime: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "time")?;
            let time = to_naive_time(field(inst, "hour"), field(inst, "minute"), field(inst, "second"), field(inst, "microsecond"))?;
            let fmt = crate::value::string::native(&args[1]);
            Ok(sv(&time.format(&fmt).to_string()))
        });

        let replace_weak = weak.clone();
        let replace: NativeFn = Rc::new(move |args, kw, _ns| {
            let inst = instance_of(&args[0], "time")?;
            let parts = replace_fields(inst, kw, &["hour", "minute", "second", "microsecond"]);
            let time = to_naive_time(parts[0], parts[1], parts[2], parts[3])?;
            Ok(make_instance(&upgrade(&replace_weak), time_fields(time)))
        });

        let fromiso_weak = weak.clone();
        let fromisoformat: NativeFn = Rc::new(move |args, _kw, _ns| {
            let s = crate::value::string::native(&args[0]);
            let time = chrono::NaiveTime::parse_from_str(&s, "%H:%M:%S%.f")
                .or_else(|_| chrono::NaiveTime::parse_from_str(&s, "%H:%M:%S"))
                .map_err(|e| ExceptionKind::ValueError(format!("invalid isoformat time: {e}")))?;
            Ok(make_instance(&upgrade(&fromiso_weak), time_fields(time)))
        });

        ClassDef {
            name: "time".to_string(),
            fields: vec!["hour".to_string(), "minute".to_string(), "second".to_string(), "microsecond".to_string()],
            field_types: vec![
                ("hour".to_string(), "int".to_string()),
                ("minute".to_string(), "int".to_string()),
                ("second".to_string(), "int".to_string()),
                ("microsecond".to_string(), "int".to_string()),
            ],
            methods: vec![
                ("isoformat".to_string(), builtin_fn("isoformat", isoformat)),
                ("strftime".to_string(), builtin_fn("strftime", strftime)),
                ("replace".to_string(), builtin_fn("replace", replace)),
            ],
            class_methods: vec![("fromisoformat".to_string(), builtin_fn("fromisoformat", fromisoformat))],
            class_attrs: std::cell::RefCell::new(Vec::new()),
            base_classes: Vec::new(),
            constructor: Some(constructor),
            is_builtin: true,
        }
    })
}

fn datetime_fields(dt: chrono::NaiveDateTime) -> Vec<(&'static str, Value)> {
    let mut fields = date_fields(dt.date());
    fields.extend(time_fields(dt.time()));
    fields
}

fn datetime_as_naive(inst: &ClassInstance) -> Result<chrono::NaiveDateTime, ExceptionKind> {
    let date = to_naive_date(field(inst, "year"), field(inst, "month"), field(inst, "day"))?;
    let time = to_naive_time(field(inst, "hour"), field(inst, "minute"), field(inst, "second"), field(inst, "microsecond"))?;
    Ok(chrono::NaiveDateTime::new(date, time))
}

fn datetime_class(date_def: Rc<ClassDef>, time_def: Rc<ClassDef>, timedelta_def: Rc<ClassDef>) -> Rc<ClassDef> {
    Rc::new_cyclic(|weak: &Weak<ClassDef>| {
        let ctor_weak = weak.clone();
        let constructor: NativeFn = Rc::new(move |positional, keyword, _ns| {
            let year = bind_int(positional, keyword, 0, "year", None)?;
            let month = bind_int(positional, keyword, 1, "month", None)?;
            let day = bind_int(positional, keyword, 2, "day", None)?;
            let hour = bind_int(positional, keyword, 3, "hour", Some(0))?;
            let minute = bind_int(positional, keyword, 4, "minute", Some(0))?;
            let second = bind_int(positional, keyword, 5, "second", Some(0))?;
            let microsecond = bind_int(positional, keyword, 6, "microsecond", Some(0))?;
            let date = to_naive_date(year, month, day)?;
            let time = to_naive_time(hour, minute, second, microsecond)?;
            Ok(make_instance(&upgrade(&ctor_weak), datetime_fields(chrono::NaiveDateTime::new(date, time))))
        });

        let isoformat: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "datetime")?;
            let dt = datetime_as_naive(inst)?;
            let text = if field(inst, "microsecond") == 0 {
                dt.format("%Y-%m-%dT%H:%M:%S").to_string()
            } else {
                dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
            };
            Ok(sv(&text))
        });

        let strftime: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "datetime")?;
            let dt = datetime_as_naive(inst)?;
            let fmt = crate::value::string::native(&args[1]);
            Ok(sv(&dt.format(&fmt).to_string()))
        });

        let weekday: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "datetime")?;
            let dt = datetime_as_naive(inst)?;
            Ok(iv(i64::from(dt.weekday().num_days_from_monday())))
        });

        let replace_weak = weak.clone();
        let replace: NativeFn = Rc::new(move |args, kw, _ns| {
            let inst = instance_of(&args[0], "datetime")?;
            let parts = replace_fields(inst, kw, &["year", "month", "day", "hour", "minute", "second", "microsecond"]);
            let date = to_naive_date(parts[0], parts[1], parts[2])?;
            let time = to_naive_time(parts[3], parts[4], parts[5], parts[6])?;
            Ok(make_instance(&upgrade(&replace_weak), datetime_fields(chrono::NaiveDateTime::new(date, time))))
        });

        let date_def_for_method = date_def.clone();
        let date_method: NativeFn = Rc::new(move |args, _kw, _ns| {
            let inst = instance_of(&args[0], "datetime")?;
            Ok(make_instance(&date_def_for_method, date_fields(datetime_as_naive(inst)?.date())))
        });

        let time_def_for_method = time_def.clone();
        let time_method: NativeFn = Rc::new(move |args, _kw, _ns| {
            let inst = instance_of(&args[0], "datetime")?;
            Ok(make_instance(&time_def_for_method, time_fields(datetime_as_naive(inst)?.time())))
        });

        let fromiso_weak = weak.clone();
        let fromisoformat: NativeFn = Rc::new(move |args, _kw, _ns| {
            let s = crate::value::string::native(&args[0]);
            let dt = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S"))
                .map_err(|e| ExceptionKind::ValueError(format!("invalid isoformat datetime: {e}")))?;
            Ok(make_instance(&upgrade(&fromiso_weak), datetime_fields(dt)))
        });

        let strptime_weak = weak.clone();
        let strptime: NativeFn = Rc::new(move |args, _kw, _ns| {
            let s = crate::value::string::native(&args[0]);
            let fmt = crate::value::string::native(&args[1]);
            let dt = chrono::NaiveDateTime::parse_from_str(&s, &fmt)
                .map_err(|e| ExceptionKind::ValueError(format!("time data did not match format: {e}")))?;
            Ok(make_instance(&upgrade(&strptime_weak), datetime_fields(dt)))
        });

        let combine_weak = weak.clone();
        let combine: NativeFn = Rc::new(move |args, _kw, _ns| {
            let date_part = instance_of(&args[0], "date")?;
            let time_part = instance_of(&args[1], "time")?;
            let date = to_naive_date(field(date_part, "year"), field(date_part, "month"), field(date_part, "day"))?;
            let time = to_naive_time(
                field(time_part, "hour"),
                field(time_part, "minute"),
                field(time_part, "second"),
                field(time_part, "microsecond"),
            )?;
            Ok(make_instance(&upgrade(&combine_weak), datetime_fields(chrono::NaiveDateTime::new(date, time))))
        });

        let add_weak = weak.clone();
        let add: NativeFn = Rc::new(move |args, _kw, _ns| {
            let this = instance_of(&args[0], "datetime")?;
            let other = instance_of(&args[1], "timedelta")?;
            let dt = datetime_as_naive(this)? + chrono::Duration::microseconds(i64::try_from(timedelta_total_micros(other)).unwrap_or(0));
            Ok(make_instance(&upgrade(&add_weak), datetime_fields(dt)))
        });

        let td_for_sub = timedelta_def.clone();
        let sub_weak = weak.clone();
        let sub: NativeFn = Rc::new(move |args, _kw, _ns| {
            let this = instance_of(&args[0], "datetime")?;
            let dt = datetime_as_naive(this)?;
            match args[1].raw() {
                Raw::ClassInstance(rhs) if rhs.class.name == "datetime" => {
                    let other = datetime_as_naive(rhs)?;
                    let delta = dt - other;
                    Ok(timedelta_value(&td_for_sub, i128::from(delta.num_microseconds().unwrap_or(0))))
                }
                Raw::ClassInstance(rhs) if rhs.class.name == "timedelta" => {
                    let shifted = dt - chrono::Duration::microseconds(i64::try_from(timedelta_total_micros(rhs)).unwrap_or(0));
                    Ok(make_instance(&upgrade(&sub_weak), datetime_fields(shifted)))
                }
                _ => Err(ExceptionKind::TypeError("datetime.__sub__ expects a datetime or timedelta".to_string())),
            }
        });

        ClassDef {
            name: "datetime".to_string(),
            fields: vec![
                "year".to_string(),
                "month".to_string(),
                "day".to_string(),
                "hour".to_string(),
                "minute".to_string(),
                "second".to_string(),
                "microsecond".to_string(),
            ],
            field_types: vec![
                ("year".to_string(), "int".to_string()),
                ("month".to_string(), "int".to_string()),
                ("day".to_string(), "int".to_string()),
                ("hour".to_string(), "int".to_string()),
                ("minute".to_string(), "int".to_string()),
                ("second".to_string(), "int".to_string()),
                ("microsecond".to_string(), "int".to_string()),
            ],
            methods: vec![
                ("isoformat".to_string(), builtin_fn("isoformat", isoformat)),
                ("strftime".to_string(), builtin_fn("strftime", strftime)),
                ("weekday".to_string(), builtin_fn("weekday", weekday)),
                ("replace".to_string(), builtin_fn("replace", replace)),
                ("date".to_string(), builtin_fn("date", date_method)),
                ("time".to_string(), builtin_fn("time", time_method)),
                ("__add__".to_string(), builtin_fn("__add__", add.clone())),
                ("__radd__".to_string(), builtin_fn("__radd__", add)),
                ("__sub__".to_string(), builtin_fn("__sub__", sub)),
            ],
            class_methods: vec![
                ("fromisoformat".to_string(), builtin_fn("fromisoformat", fromisoformat)),
                ("strptime".to_string(), builtin_fn("strptime", strptime)),
                ("combine".to_string(), builtin_fn("combine", combine)),
            ],
            class_attrs: std::cell::RefCell::new(Vec::new()),
            base_classes: Vec::new(),
            constructor: Some(constructor),
            is_builtin: true,
        }
    })
}

fn timezone_class(timedelta_def: Rc<ClassDef>) -> Rc<ClassDef> {
    Rc::new_cyclic(|weak: &Weak<ClassDef>| {
        let ctor_weak = weak.clone();
        let constructor: NativeFn = Rc::new(move |positional, keyword, _ns| {
            let offset = positional.first().ok_or_else(|| {
                ExceptionKind::TypeError("missing required argument: 'offset'".to_string())
            })?;
            let offset_inst = instance_of(offset, "timedelta")?;
            let offset_seconds = i64::try_from(timedelta_total_micros(offset_inst) / 1_000_000).unwrap_or(0);
            let name = keyword
                .iter()
                .find(|(k, _)| k == "name")
                .map(|(_, v)| crate::value::string::native(v))
                .unwrap_or_default();
            Ok(make_instance(
                &upgrade(&ctor_weak),
                vec![("offset_seconds", iv(offset_seconds)), ("name", sv(&name))],
            ))
        });

        let td_for_utcoffset = timedelta_def;
        let utcoffset: NativeFn = Rc::new(move |args, _kw, _ns| {
            let inst = instance_of(&args[0], "timezone")?;
            Ok(timedelta_value(&td_for_utcoffset, i128::from(field(inst, "offset_seconds")) * 1_000_000))
        });

        let tzname: NativeFn = Rc::new(|args, _kw, _ns| {
            let inst = instance_of(&args[0], "timezone")?;
            let name = field_str(inst, "name");
            if !name.is_empty() {
                return Ok(sv(&name));
            }
            let offset = field(inst, "offset_seconds");
            let sign = if offset < 0 { '-' } else { '+' };
            let abs = offset.unsigned_abs();
            Ok(sv(&format!("UTC{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)))
        });

        let dst: NativeFn = Rc::new(|_args, _kw, _ns| Ok(Value::none(Capabilities::camel(), vec![])));

        ClassDef {
            name: "timezone".to_string(),
            fields: vec!["offset_seconds".to_string(), "name".to_string()],
            field_types: vec![
                ("offset_seconds".to_string(), "int".to_string()),
                ("name".to_string(), "str".to_string()),
            ],
            methods: vec![
                ("utcoffset".to_string(), builtin_fn("utcoffset", utcoffset)),
                ("tzname".to_string(), builtin_fn("tzname", tzname)),
                ("dst".to_string(), builtin_fn("dst", dst)),
            ],
            class_methods: Vec::new(),
            class_attrs: std::cell::RefCell::new(Vec::new()),
            base_classes: Vec::new(),
            constructor: Some(constructor),
            is_builtin: true,
        }
    })
}

/// The fixed set of built-in classes added to every fresh namespace
/// alongside the free-function built-ins in [`crate::builtins::all`].
#[must_use]
pub fn all() -> Vec<(String, Value)> {
    let timedelta_def = timedelta_class();
    let date_def = date_class(timedelta_def.clone());
    let time_def = time_class();
    let datetime_def = datetime_class(date_def.clone(), time_def.clone(), timedelta_def.clone());
    let timezone_def = timezone_class(timedelta_def.clone());

    vec![
        ("ValueError".to_string(), error_class("ValueError", ExceptionKind::ValueError)),
        (
            "NotEnoughInformationError".to_string(),
            error_class("NotEnoughInformationError", ExceptionKind::NotEnoughInformation),
        ),
        ("Enum".to_string(), marker_class("Enum", Vec::new())),
        ("BaseModel".to_string(), base_model_class()),
        ("timedelta".to_string(), class_value(timedelta_def)),
        ("date".to_string(), class_value(date_def)),
        ("time".to_string(), class_value(time_def)),
        ("datetime".to_string(), class_value(datetime_def)),
        ("timezone".to_string(), class_value(timezone_def)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(classes: &'a [(String, Value)], name: &str) -> &'a Value {
        &classes.iter().find(|(n, _)| n == name).unwrap().1
    }

    fn construct(class: &Value, positional: &[Value]) -> Value {
        let Raw::Class(def) = class.raw() else { panic!("not a class") };
        (def.constructor.as_ref().unwrap())(positional, &[], &crate::namespace::Namespace::with_builtins()).unwrap()
    }

    #[test]
    fn date_constructs_and_formats() {
        let classes = all();
        let date_class = find(&classes, "date");
        let d = construct(date_class, &[iv(2024), iv(3), iv(5)]);
        let Raw::Class(def) = date_class.raw() else { unreachable!() };
        assert!(def.class_method("fromisoformat").is_some());
        let inst = instance_of(&d, "date").unwrap();
        assert_eq!(field(inst, "year"), 2024);
        assert_eq!(field(inst, "month"), 3);
        assert_eq!(field(inst, "day"), 5);
    }

    #[test]
    fn invalid_date_is_a_value_error() {
        let classes = all();
        let date_class = find(&classes, "date");
        let Raw::Class(def) = date_class.raw() else { unreachable!() };
        let err = (def.constructor.as_ref().unwrap())(
            &[iv(2024), iv(2), iv(30)],
            &[],
            &crate::namespace::Namespace::with_builtins(),
        )
        .unwrap_err();
        assert!(matches!(err, ExceptionKind::ValueError(_)));
    }

    #[test]
    fn timedelta_normalizes_overflow() {
        let classes = all();
        let td_class = find(&classes, "timedelta");
        let d = construct(td_class, &[iv(0), iv(90_000), iv(0)]);
        let inst = instance_of(&d, "timedelta").unwrap();
        assert_eq!(field(inst, "days"), 1);
        assert_eq!(field(inst, "seconds"), 3_600);
    }

    #[test]
    fn enum_is_a_marker_with_no_members_of_its_own() {
        let classes = all();
        let enum_class = find(&classes, "Enum");
        let Raw::Class(def) = enum_class.raw() else { unreachable!() };
        assert!(def.derives_from_enum());
    }

    #[test]
    fn base_model_is_detected_by_subclasses() {
        let classes = all();
        let model_class = find(&classes, "BaseModel");
        let Raw::Class(def) = model_class.raw() else { unreachable!() };
        assert!(def.derives_from_model());
    }
}
