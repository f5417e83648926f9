//! Expression evaluation (§4.2, §4.3).

use camel_core::value::{collection, numeric, string};
use camel_core::{Namespace, Raw, Value};
use camel_types::{Capabilities, ExceptionKind};
use rustpython_ast::{self as ast, Ranged};

use super::{ops, truthy, Interpreter, TextRange};

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &ast::Expr, ns: &Namespace) -> Result<Value, Value> {
        match expr {
            ast::Expr::Constant(c) => self
                .eval_constant(&c.value)
                .map_err(|e| self.raise(e, expr.range(), vec![])),
            ast::Expr::Name(n) => ns
                .get(n.id.as_str())
                .ok_or_else(|| self.raise(ExceptionKind::NameError(n.id.to_string()), expr.range(), vec![])),
            ast::Expr::Tuple(t) => self.eval_sequence(&t.elts, ns).map(|(items, deps)| {
                Value::new(Raw::Tuple(items), Capabilities::camel(), deps)
            }),
            ast::Expr::List(l) => self.eval_sequence(&l.elts, ns).map(|(items, deps)| {
                Value::new(
                    Raw::List(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    deps,
                )
            }),
            ast::Expr::Set(s) => {
                let (raw_items, _) = self.eval_sequence(&s.elts, ns)?;
                let mut items: Vec<Value> = Vec::new();
                for item in raw_items {
                    if !items.iter().any(|i| i.raw_eq(&item)) {
                        items.push(item);
                    }
                }
                Ok(Value::new(
                    Raw::Set(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }
            ast::Expr::Dict(d) => {
                let mut entries = Vec::with_capacity(d.values.len());
                let mut deps = Vec::new();
                for (key_expr, value_expr) in d.keys.iter().zip(d.values.iter()) {
                    let value = self.eval_expr(value_expr, ns)?;
                    match key_expr {
                        Some(key_expr) => {
                            let key = self.eval_expr(key_expr, ns)?;
                            deps.push(key.clone());
                            deps.push(value.clone());
                            if let Some(slot) = entries.iter_mut().find(|(k, _): &&mut (Value, Value)| k.raw_eq(&key))
                            {
                                *slot = (key, value);
                            } else {
                                entries.push((key, value));
                            }
                        }
                        None => {
                            // `**other` merge inside a dict display.
                            for (k, v) in collection::dict_items(&value)
                                .map_err(|e| self.raise(e, expr.range(), vec![]))?
                            {
                                deps.push(k.clone());
                                deps.push(v.clone());
                                entries.push((k, v));
                            }
                        }
                    }
                }
                Ok(Value::new(
                    Raw::Dict(std::cell::RefCell::new(entries)),
                    Capabilities::camel(),
                    deps,
                ))
            }
            ast::Expr::IfExp(i) => {
                let test = self.eval_expr(&i.test, ns)?;
                if truthy(&test) {
                    self.eval_expr(&i.body, ns)
                } else {
                    self.eval_expr(&i.orelse, ns)
                }
            }
            ast::Expr::NamedExpr(n) => {
                let value = self.eval_expr(&n.value, ns)?;
                self.assign_target(&n.target, value.clone(), ns)?;
                Ok(value)
            }
            ast::Expr::BoolOp(b) => self.eval_bool_op(b, ns),
            ast::Expr::UnaryOp(u) => {
                let operand = self.eval_expr(&u.operand, ns)?;
                numeric::unary_numeric(ops::unary_op(u.op), &operand)
                    .or_else(|_| match u.op {
                        ast::UnaryOp::Not => Ok(Value::bool(
                            !truthy(&operand),
                            Capabilities::camel(),
                            vec![operand.clone()],
                        )),
                        _ => Err(ExceptionKind::TypeError(format!(
                            "bad operand type for unary operator: '{}'",
                            operand.type_name()
                        ))),
                    })
                    .map_err(|e| self.raise(e, expr.range(), vec![]))
            }
            ast::Expr::BinOp(b) => {
                let lhs = self.eval_expr(&b.left, ns)?;
                let rhs = self.eval_expr(&b.right, ns)?;
                self.apply_bin_op(ops::bin_op(b.op), &lhs, &rhs, expr.range(), ns)
            }
            ast::Expr::Compare(c) => self.eval_compare(c, ns),
            ast::Expr::Attribute(a) => {
                let recv = self.eval_expr(&a.value, ns)?;
                self.get_attribute(&recv, a.attr.as_str(), expr.range())
            }
            ast::Expr::Subscript(s) => self.eval_subscript(s, ns),
            ast::Expr::Call(call) => self.eval_call(call, ns),
            ast::Expr::ListComp(c) => {
                let items = self.eval_comprehension(&c.generators, &c.elt, ns)?;
                let deps = items.clone();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items)),
                    Capabilities::camel(),
                    deps,
                ))
            }
            ast::Expr::SetComp(c) => {
                let raw_items = self.eval_comprehension(&c.generators, &c.elt, ns)?;
                let mut items: Vec<Value> = Vec::new();
                for item in raw_items {
                    if !items.iter().any(|i| i.raw_eq(&item)) {
                        items.push(item);
                    }
                }
                Ok(Value::new(
                    Raw::Set(std::cell::RefCell::new(items.clone())),
                    Capabilities::camel(),
                    items,
                ))
            }
            ast::Expr::GeneratorExp(c) => {
                // No lazy iterator objects: generator expressions are
                // materialized eagerly, same as a list comprehension.
                let items = self.eval_comprehension(&c.generators, &c.elt, ns)?;
                let deps = items.clone();
                Ok(Value::new(
                    Raw::List(std::cell::RefCell::new(items)),
                    Capabilities::camel(),
                    deps,
                ))
            }
            ast::Expr::DictComp(c) => {
                let mut entries = Vec::new();
                self.eval_dict_comprehension(&c.generators, &c.key, &c.value, ns, &mut entries)?;
                let mut deps = Vec::new();
                for (k, v) in &entries {
                    deps.push(k.clone());
                    deps.push(v.clone());
                }
                Ok(Value::new(
                    Raw::Dict(std::cell::RefCell::new(entries)),
                    Capabilities::camel(),
                    deps,
                ))
            }
            ast::Expr::Starred(s) => self.eval_expr(&s.value, ns),
            ast::Expr::Lambda(_) | ast::Expr::Await(_) | ast::Expr::Yield(_) | ast::Expr::YieldFrom(_) => self.err(
                ExceptionKind::ParseError("unsupported expression kind".to_string()),
                expr.range(),
                vec![],
            ),
            _ => self.err(
                ExceptionKind::ParseError("unsupported expression kind".to_string()),
                expr.range(),
                vec![],
            ),
        }
    }

    fn eval_constant(&self, c: &ast::Constant) -> Result<Value, ExceptionKind> {
        let (meta, deps) = self.literal_meta();
        match c {
            ast::Constant::None => Ok(Value::none(meta, deps)),
            ast::Constant::Bool(b) => Ok(Value::bool(*b, meta, deps)),
            ast::Constant::Int(i) => {
                let parsed: i64 = i.to_string().parse().unwrap_or(i64::MAX);
                Ok(Value::int(parsed, meta, deps))
            }
            ast::Constant::Float(f) => Ok(Value::float(*f, meta, deps)),
            ast::Constant::Str(s) => Ok(Value::str(s, meta, deps)),
            ast::Constant::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_constant(item)?);
                }
                Ok(Value::new(Raw::Tuple(values), meta, deps))
            }
            ast::Constant::Bytes(_) | ast::Constant::Complex { .. } | ast::Constant::Ellipsis => Err(
                ExceptionKind::TypeError("unsupported literal kind".to_string()),
            ),
        }
    }

    fn eval_sequence(&mut self, elts: &[ast::Expr], ns: &Namespace) -> Result<(Vec<Value>, Vec<Value>), Value> {
        let mut items = Vec::with_capacity(elts.len());
        for e in elts {
            if let ast::Expr::Starred(s) = e {
                let spread = self.eval_expr(&s.value, ns)?;
                items.extend(collection::elements(&spread));
            } else {
                items.push(self.eval_expr(e, ns)?);
            }
        }
        let deps = items.clone();
        Ok((items, deps))
    }

    /// `and`/`or` short-circuit and return the actual deciding operand
    /// value, never a synthesized bool, matching Python semantics.
    fn eval_bool_op(&mut self, b: &ast::ExprBoolOp, ns: &Namespace) -> Result<Value, Value> {
        let mut last = Value::bool(matches!(b.op, ast::BoolOp::And), Capabilities::camel(), vec![]);
        for value_expr in &b.values {
            let value = self.eval_expr(value_expr, ns)?;
            let stop = match b.op {
                ast::BoolOp::And => !truthy(&value),
                ast::BoolOp::Or => truthy(&value),
            };
            last = value;
            if stop {
                break;
            }
        }
        Ok(last)
    }

    fn eval_compare(&mut self, c: &ast::ExprCompare, ns: &Namespace) -> Result<Value, Value> {
        let mut prev = self.eval_expr(&c.left, ns)?;
        let mut deps = vec![prev.clone()];
        for (op, comparator) in c.ops.iter().zip(c.comparators.iter()) {
            let rhs = self.eval_expr(comparator, ns)?;
            deps.push(rhs.clone());
            let holds = self
                .compare_pair(*op, &prev, &rhs, c.range())
                .map(|v| truthy(&v))?;
            if !holds {
                return Ok(Value::bool(false, Capabilities::camel(), deps));
            }
            prev = rhs;
        }
        Ok(Value::bool(true, Capabilities::camel(), deps))
    }

    fn compare_pair(&self, op: ast::CmpOp, lhs: &Value, rhs: &Value, range: TextRange) -> Result<Value, Value> {
        let deps = vec![lhs.clone(), rhs.clone()];
        let result = match op {
            ast::CmpOp::Eq => Ok(lhs.raw_eq(rhs)),
            ast::CmpOp::NotEq => Ok(!lhs.raw_eq(rhs)),
            ast::CmpOp::In => {
                return self.contains(lhs, rhs, range).map(|(b, d)| Value::bool(b, Capabilities::camel(), d))
            }
            ast::CmpOp::NotIn => {
                return self
                    .contains(lhs, rhs, range)
                    .map(|(b, d)| Value::bool(!b, Capabilities::camel(), d))
            }
            ast::CmpOp::Is => Ok(lhs.ptr_eq(rhs) || lhs.raw_eq(rhs) && matches!(lhs.raw(), Raw::None)),
            ast::CmpOp::IsNot => Ok(!(lhs.ptr_eq(rhs) || lhs.raw_eq(rhs) && matches!(lhs.raw(), Raw::None))),
            ast::CmpOp::Lt | ast::CmpOp::LtE | ast::CmpOp::Gt | ast::CmpOp::GtE => {
                self.order(op, lhs, rhs).map_err(|e| self.raise(e, range, deps.clone()))
            }
        };
        result.map(|b| Value::bool(b, Capabilities::camel(), deps))
    }

    fn order(&self, op: ast::CmpOp, lhs: &Value, rhs: &Value) -> Result<bool, ExceptionKind> {
        let ord = if let (Raw::Str(_), Raw::Str(_)) = (lhs.raw(), rhs.raw()) {
            string::native(lhs).cmp(&string::native(rhs))
        } else {
            numeric::compare_numeric(lhs, rhs).ok_or_else(|| {
                ExceptionKind::TypeError(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    cmp_symbol(op),
                    lhs.type_name(),
                    rhs.type_name()
                ))
            })?
        };
        Ok(match op {
            ast::CmpOp::Lt => ord.is_lt(),
            ast::CmpOp::LtE => ord.is_le(),
            ast::CmpOp::Gt => ord.is_gt(),
            ast::CmpOp::GtE => ord.is_ge(),
            _ => unreachable!(),
        })
    }

    fn contains(&self, container: &Value, needle: &Value, range: TextRange) -> Result<(bool, Vec<Value>), Value> {
        let result = match container.raw() {
            Raw::Str(_) => string::contains(container, needle),
            _ => collection::contains(container, needle),
        }
        .map_err(|e| self.raise(e, range, vec![]))?;
        let holds = truthy(&result);
        Ok((holds, result.dependencies().to_vec()))
    }

    pub(crate) fn apply_bin_op(
        &self,
        op: numeric::BinOp,
        lhs: &Value,
        rhs: &Value,
        range: TextRange,
        ns: &Namespace,
    ) -> Result<Value, Value> {
        if let Some(result) = self.try_class_bin_op(op, lhs, rhs, ns) {
            return result.map_err(|e| self.raise(e, range, vec![lhs.clone(), rhs.clone()]));
        }
        let result = match (lhs.raw(), rhs.raw(), op) {
            (Raw::Str(_), Raw::Str(_), numeric::BinOp::Add) => string::concat(lhs, rhs),
            (Raw::Str(_), Raw::Int(_), numeric::BinOp::Mult) => string::repeat(lhs, rhs),
            (Raw::Int(_), Raw::Str(_), numeric::BinOp::Mult) => string::repeat(rhs, lhs),
            (Raw::List(_) | Raw::Tuple(_), Raw::List(_) | Raw::Tuple(_), numeric::BinOp::Add) => {
                collection::concat(lhs, rhs)
            }
            _ => numeric::binary_numeric(op, lhs, rhs),
        };
        result.map_err(|e| self.raise(e, range, vec![lhs.clone(), rhs.clone()]))
    }

    /// Dispatch to a `__add__`/`__sub__`/`__mul__`/`__truediv__` (or its
    /// reflected `__r*__`) instance method when an operand is a
    /// `ClassInstance` that defines one, mirroring Python operator overload
    /// resolution for the built-in datetime-family classes (§3.4).
    fn try_class_bin_op(
        &self,
        op: numeric::BinOp,
        lhs: &Value,
        rhs: &Value,
        ns: &Namespace,
    ) -> Option<Result<Value, ExceptionKind>> {
        let name = dunder_name(op)?;
        if let Raw::ClassInstance(inst) = lhs.raw() {
            if let Some(method) = inst.class.method(name) {
                return Some(method.call(&[lhs.clone(), rhs.clone()], &[], ns));
            }
        }
        if let Raw::ClassInstance(inst) = rhs.raw() {
            if let Some(method) = inst.class.method(reflected_dunder_name(op)?) {
                return Some(method.call(&[rhs.clone(), lhs.clone()], &[], ns));
            }
        }
        None
    }

    fn get_attribute(&self, recv: &Value, attr: &str, range: TextRange) -> Result<Value, Value> {
        if let Some(method) = camel_core::builtins::method_for(recv, attr) {
            return Ok(method);
        }
        if let Raw::ClassInstance(inst) = recv.raw() {
            if let Some(field) = inst.get_field(attr) {
                return Ok(field);
            }
            if let Some(method) = inst.class.method(attr) {
                let bound = camel_core::Callable::BuiltinMethod {
                    name: attr.to_string(),
                    receiver: Box::new(recv.clone()),
                    func: method_native_fn(method),
                };
                return Ok(Value::new(Raw::Callable(bound), Capabilities::camel(), vec![recv.clone()]));
            }
        }
        if let Raw::Class(def) = recv.raw() {
            if let Some(member) = def.class_attr(attr) {
                return Ok(member);
            }
            if let Some(method) = def.class_method(attr) {
                let bound = camel_core::Callable::Builtin {
                    name: attr.to_string(),
                    func: method_native_fn(method),
                };
                return Ok(Value::new(Raw::Callable(bound), Capabilities::camel(), vec![recv.clone()]));
            }
        }
        self.err(
            ExceptionKind::AttributeError {
                type_name: recv.type_name(),
                attr: attr.to_string(),
            },
            range,
            vec![],
        )
    }

    fn eval_subscript(&mut self, s: &ast::ExprSubscript, ns: &Namespace) -> Result<Value, Value> {
        let recv = self.eval_expr(&s.value, ns)?;
        if let ast::Expr::Slice(slice) = s.slice.as_ref() {
            let start = self.eval_opt_index(&slice.lower, ns)?;
            let stop = self.eval_opt_index(&slice.upper, ns)?;
            let step = self.eval_opt_index(&slice.step, ns)?;
            let result = match recv.raw() {
                Raw::Str(_) | Raw::Char(_) => string::slice(&recv, start, stop, step),
                _ => collection::slice(&recv, start, stop, step),
            };
            return result.map_err(|e| self.raise(e, s.range(), vec![recv.clone()]));
        }

        let key = self.eval_expr(&s.slice, ns)?;
        let result = match recv.raw() {
            Raw::Dict(_) => collection::dict_index(&recv, &key),
            Raw::Str(_) | Raw::Char(_) => match key.raw() {
                Raw::Int(i) => string::index(&recv, *i),
                _ => Err(ExceptionKind::TypeError("string indices must be integers".to_string())),
            },
            Raw::List(_) | Raw::Tuple(_) => match key.raw() {
                Raw::Int(i) => collection::index(&recv, *i),
                _ => Err(ExceptionKind::TypeError("list indices must be integers".to_string())),
            },
            _ => Err(ExceptionKind::TypeError(format!(
                "'{}' object is not subscriptable",
                recv.type_name()
            ))),
        };
        result.map_err(|e| self.raise(e, s.range(), vec![recv.clone(), key]))
    }

    fn eval_opt_index(&mut self, e: &Option<Box<ast::Expr>>, ns: &Namespace) -> Result<Option<i64>, Value> {
        let Some(e) = e else { return Ok(None) };
        let v = self.eval_expr(e, ns)?;
        match v.raw() {
            Raw::Int(i) => Ok(Some(*i)),
            _ => self.err(
                ExceptionKind::TypeError("slice indices must be integers or None".to_string()),
                e.range(),
                vec![],
            ),
        }
    }

    /// Evaluate nested `for`/`if` generator clauses, collecting the mapped
    /// element expression. Materializes eagerly, so a comprehension over an
    /// infinite iterator is not representable (consistent with the absence
    /// of lazy iterator objects in this language subset).
    fn eval_comprehension(
        &mut self,
        generators: &[ast::Comprehension],
        elt: &ast::Expr,
        ns: &Namespace,
    ) -> Result<Vec<Value>, Value> {
        let mut out = Vec::new();
        self.walk_comprehension(generators, 0, ns, &mut |slf, scope| {
            let v = slf.eval_expr(elt, scope)?;
            out.push(v);
            Ok(())
        })?;
        Ok(out)
    }

    fn eval_dict_comprehension(
        &mut self,
        generators: &[ast::Comprehension],
        key: &ast::Expr,
        value: &ast::Expr,
        ns: &Namespace,
        out: &mut Vec<(Value, Value)>,
    ) -> Result<(), Value> {
        self.walk_comprehension(generators, 0, ns, &mut |slf, scope| {
            let k = slf.eval_expr(key, scope)?;
            let v = slf.eval_expr(value, scope)?;
            out.push((k, v));
            Ok(())
        })
    }

    fn walk_comprehension(
        &mut self,
        generators: &[ast::Comprehension],
        depth: usize,
        ns: &Namespace,
        body: &mut dyn FnMut(&mut Self, &Namespace) -> Result<(), Value>,
    ) -> Result<(), Value> {
        let Some(gen) = generators.get(depth) else {
            return body(self, ns);
        };
        let iterable = self.eval_expr(&gen.iter, ns)?;
        let cursor = collection::iterate(&iterable);
        while let Some(item) = collection::iterator_next(&cursor) {
            let scope = ns.add_variables([]);
            self.assign_target(&gen.target, item, &scope)?;
            let mut keep = true;
            for cond in &gen.ifs {
                let v = self.eval_expr(cond, &scope)?;
                if !truthy(&v) {
                    keep = false;
                    break;
                }
            }
            if keep {
                self.walk_comprehension(generators, depth + 1, &scope, body)?;
            }
        }
        Ok(())
    }
}

fn cmp_symbol(op: ast::CmpOp) -> &'static str {
    match op {
        ast::CmpOp::Lt => "<",
        ast::CmpOp::LtE => "<=",
        ast::CmpOp::Gt => ">",
        ast::CmpOp::GtE => ">=",
        ast::CmpOp::Eq => "==",
        ast::CmpOp::NotEq => "!=",
        ast::CmpOp::Is => "is",
        ast::CmpOp::IsNot => "is not",
        ast::CmpOp::In => "in",
        ast::CmpOp::NotIn => "not in",
    }
}

fn dunder_name(op: numeric::BinOp) -> Option<&'static str> {
    match op {
        numeric::BinOp::Add => Some("__add__"),
        numeric::BinOp::Sub => Some("__sub__"),
        numeric::BinOp::Mult => Some("__mul__"),
        numeric::BinOp::TrueDiv => Some("__truediv__"),
        _ => None,
    }
}

fn reflected_dunder_name(op: numeric::BinOp) -> Option<&'static str> {
    match op {
        numeric::BinOp::Add => Some("__radd__"),
        numeric::BinOp::Sub => Some("__rsub__"),
        numeric::BinOp::Mult => Some("__rmul__"),
        numeric::BinOp::TrueDiv => Some("__rtruediv__"),
        _ => None,
    }
}

/// Wrap a resolved class method as a `NativeFn`, so attribute access can
/// hand back an ordinary bound-method callable.
fn method_native_fn(method: &camel_core::Callable) -> camel_core::value::callable::NativeFn {
    let method = method.clone();
    std::rc::Rc::new(move |args, kwargs, ns| method.call(args, kwargs, ns))
}
