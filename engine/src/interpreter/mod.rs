//! Tree-walking evaluation over the parsed AST (§4.3).
//!
//! The interpreter never defines functions or classes with method bodies of
//! its own; every capability a program has comes from calling a built-in or
//! a registered tool. [`Interpreter::exec_block`] drives `for`/`while`/`if`
//! control flow with [`Flow`]; every expression result and raised exception
//! is an ordinary capability-tracked [`camel_core::Value`], never a bare Rust
//! error, so trust decisions about a failure read exactly like trust
//! decisions about a successful value (§4.7).

pub mod call;
pub mod expr;
pub mod ops;

use std::rc::Rc;

use camel_core::value::class::ClassDef;
use camel_core::{Namespace, Raw, Value};
use camel_types::{Capabilities, ExceptionKind};
use rustpython_ast::{self as ast, Ranged};

pub use call::FunctionCall;

use crate::eval_mode::EvalMode;

pub(crate) type TextRange = rustpython_ast::text_size::TextRange;

/// How a block finished: fell through, or unwound through a loop boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
}

/// Tree-walking evaluator for one `run()` call. Not reused across runs: a
/// fresh `Interpreter` is built per invocation so the tool-call log and
/// dependency trace start empty.
pub struct Interpreter {
    pub(crate) mode: EvalMode,
    pub(crate) source: String,
    pub(crate) initial_deps: Vec<Value>,
    pub(crate) tool_call_log: Vec<FunctionCall>,
    pub(crate) aggregated_deps: Vec<Value>,
    /// The most recent top-level expression-statement's value, i.e. what a
    /// run "returns" to its caller (§6.1). `None` for a program with no
    /// top-level expression statements.
    pub(crate) last_value: Option<Value>,
    /// Declared parameter names per registered tool, so a call site can
    /// reject unknown keyword arguments before dispatch (§6.2). Empty for a
    /// tool that was never registered with a schema.
    pub(crate) tool_params: std::collections::BTreeMap<String, Vec<String>>,
}

impl Interpreter {
    #[must_use]
    pub fn new(mode: EvalMode, source: String, initial_deps: Vec<Value>) -> Self {
        Self {
            mode,
            source,
            initial_deps,
            tool_call_log: Vec::new(),
            aggregated_deps: Vec::new(),
            last_value: None,
            tool_params: std::collections::BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_tool_params(mut self, tool_params: std::collections::BTreeMap<String, Vec<String>>) -> Self {
        self.tool_params = tool_params;
        self
    }

    pub fn into_log_and_deps(self) -> (Vec<FunctionCall>, Vec<Value>, Option<Value>) {
        (self.tool_call_log, self.aggregated_deps, self.last_value)
    }

    /// Metadata used for a fresh literal: `default()` capabilities, carrying
    /// the run's initial dependencies so a program's own provenance survives
    /// into every value it produces (§3.3, §6.1).
    fn literal_meta(&self) -> (Capabilities, Vec<Value>) {
        (Capabilities::default(), self.initial_deps.clone())
    }

    fn remember(&mut self, v: &Value, ns: &Namespace) {
        self.aggregated_deps.push(v.clone());
        ns.record_dependency(v);
        self.last_value = Some(v.clone());
    }

    fn raise(&self, kind: ExceptionKind, range: TextRange, deps: Vec<Value>) -> Value {
        let (line, col) = line_col(&self.source, u32::from(range.start()) as usize);
        camel_core::exception::make(kind, Some(line), Some(col), deps)
    }

    fn err<T>(&self, kind: ExceptionKind, range: TextRange, deps: Vec<Value>) -> Result<T, Value> {
        Err(self.raise(kind, range, deps))
    }

    /// Run every statement in `body` in order, stopping early on the first
    /// unresolved `break`/`continue` (handled by the enclosing loop) or on
    /// the first raised exception.
    pub fn exec_block(&mut self, body: &[ast::Stmt], ns: &Namespace) -> Result<Flow, Value> {
        for stmt in body {
            match self.exec_stmt(stmt, ns)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &ast::Stmt, ns: &Namespace) -> Result<Flow, Value> {
        match stmt {
            ast::Stmt::Expr(s) => {
                let v = self.eval_expr(&s.value, ns)?;
                self.remember(&v, ns);
                Ok(Flow::Normal)
            }
            ast::Stmt::Pass(_) => Ok(Flow::Normal),
            ast::Stmt::Break(_) => Ok(Flow::Break),
            ast::Stmt::Continue(_) => Ok(Flow::Continue),
            ast::Stmt::Assign(s) => {
                let value = self.eval_expr(&s.value, ns)?;
                for target in &s.targets {
                    self.assign_target(target, value.clone(), ns)?;
                }
                Ok(Flow::Normal)
            }
            ast::Stmt::AugAssign(s) => {
                let current = self.eval_expr(&s.target, ns)?;
                let rhs = self.eval_expr(&s.value, ns)?;
                let result = self.apply_bin_op(ops::bin_op(s.op), &current, &rhs, s.range(), ns)?;
                self.assign_target(&s.target, result, ns)?;
                Ok(Flow::Normal)
            }
            ast::Stmt::AnnAssign(s) => {
                if let Some(value) = &s.value {
                    let v = self.eval_expr(value, ns)?;
                    self.assign_target(&s.target, v, ns)?;
                }
                Ok(Flow::Normal)
            }
            ast::Stmt::If(s) => {
                let test = self.eval_expr(&s.test, ns)?;
                if truthy(&test) {
                    self.exec_block(&s.body, ns)
                } else {
                    self.exec_block(&s.orelse, ns)
                }
            }
            ast::Stmt::While(s) => {
                let mut broke = false;
                loop {
                    let test = self.eval_expr(&s.test, ns)?;
                    if !truthy(&test) {
                        break;
                    }
                    match self.exec_block(&s.body, ns)? {
                        Flow::Break => {
                            broke = true;
                            break;
                        }
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                if !broke {
                    self.exec_block(&s.orelse, ns)?;
                }
                Ok(Flow::Normal)
            }
            ast::Stmt::For(s) => {
                let iterable = self.eval_expr(&s.iter, ns)?;
                let cursor = camel_core::value::collection::iterate(&iterable);
                let mut broke = false;
                while let Some(item) = camel_core::value::collection::iterator_next(&cursor) {
                    self.assign_target(&s.target, item, ns)?;
                    match self.exec_block(&s.body, ns)? {
                        Flow::Break => {
                            broke = true;
                            break;
                        }
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                if !broke {
                    self.exec_block(&s.orelse, ns)?;
                }
                Ok(Flow::Normal)
            }
            ast::Stmt::Raise(s) => {
                let Some(exc_expr) = &s.exc else {
                    return self.err(
                        ExceptionKind::ValueError("bare raise outside an exception handler".to_string()),
                        stmt.range(),
                        vec![],
                    );
                };
                let v = self.eval_expr(exc_expr, ns)?;
                Err(v)
            }
            ast::Stmt::ClassDef(s) => self.exec_class_def(s, ns),
            ast::Stmt::FunctionDef(_)
            | ast::Stmt::AsyncFunctionDef(_)
            | ast::Stmt::Import(_)
            | ast::Stmt::ImportFrom(_)
            | ast::Stmt::Global(_)
            | ast::Stmt::Nonlocal(_)
            | ast::Stmt::Try(_)
            | ast::Stmt::TryStar(_)
            | ast::Stmt::With(_)
            | ast::Stmt::AsyncWith(_)
            | ast::Stmt::Match(_)
            | ast::Stmt::Delete(_)
            | ast::Stmt::Assert(_)
            | ast::Stmt::TypeAlias(_) => self.err(
                ExceptionKind::ParseError(format!("unsupported statement kind: {}", stmt_name(stmt))),
                stmt.range(),
                vec![],
            ),
        }
    }

    /// A `class Foo(Base): ...` body: annotated assignments become fields,
    /// everything else is rejected since only built-in classes carry methods
    /// (§4.3). A class deriving from the built-in `Enum` wrapper is the one
    /// exception: its body assigns members instead of declaring fields
    /// (§3.4, §4.3).
    fn exec_class_def(&mut self, s: &ast::StmtClassDef, ns: &Namespace) -> Result<Flow, Value> {
        let mut bases = Vec::new();
        for base in &s.bases {
            let ast::Expr::Name(n) = base else {
                return self.err(
                    ExceptionKind::ParseError("base class must be a name".to_string()),
                    base.range(),
                    vec![],
                );
            };
            let Some(base_val) = ns.get(n.id.as_str()) else {
                return self.err(ExceptionKind::UndefinedClass(n.id.to_string()), base.range(), vec![]);
            };
            let Raw::Class(def) = base_val.raw() else {
                return self.err(ExceptionKind::UndefinedClass(n.id.to_string()), base.range(), vec![]);
            };
            bases.push(def.clone());
        }

        if bases.iter().any(|b| b.derives_from_enum()) {
            return self.exec_enum_def(s, bases, ns);
        }

        let mut fields = Vec::new();
        let mut field_types = Vec::new();
        for base in &bases {
            for name in &base.fields {
                if !fields.contains(name) {
                    fields.push(name.clone());
                    field_types.push((name.clone(), base.field_type(name).to_string()));
                }
            }
        }
        for stmt in &s.body {
            match stmt {
                ast::Stmt::AnnAssign(a) => {
                    let ast::Expr::Name(n) = a.target.as_ref() else {
                        return self.err(
                            ExceptionKind::ParseError("class field must be a plain name".to_string()),
                            a.range(),
                            vec![],
                        );
                    };
                    let field_type = match a.annotation.as_ref() {
                        ast::Expr::Name(t) => t.id.to_string(),
                        _ => camel_core::value::class::ANY_FIELD_TYPE.to_string(),
                    };
                    if !fields.contains(&n.id.to_string()) {
                        fields.push(n.id.to_string());
                    }
                    field_types.retain(|(name, _)| *name != n.id.as_str());
                    field_types.push((n.id.to_string(), field_type));
                }
                ast::Stmt::Pass(_) => {}
                _ => {
                    return self.err(
                        ExceptionKind::ParseError(
                            "class bodies may only declare annotated fields".to_string(),
                        ),
                        stmt.range(),
                        vec![],
                    )
                }
            }
        }

        let def = Rc::new(ClassDef {
            name: s.name.to_string(),
            fields,
            field_types,
            methods: Vec::new(),
            class_methods: Vec::new(),
            class_attrs: std::cell::RefCell::new(Vec::new()),
            base_classes: bases,
            constructor: None,
            is_builtin: false,
        });
        let value = Value::new(Raw::Class(def), Capabilities::camel(), vec![]);
        ns.set_variable(s.name.as_str(), value);
        Ok(Flow::Normal)
    }

    /// A class deriving from the built-in `Enum` wrapper: each top-level
    /// `NAME = value` assignment becomes a member reachable as `Foo.NAME`,
    /// a `ClassInstance` carrying its own member name and wrapped value.
    fn exec_enum_def(
        &mut self,
        s: &ast::StmtClassDef,
        bases: Vec<Rc<ClassDef>>,
        ns: &Namespace,
    ) -> Result<Flow, Value> {
        let def = Rc::new(ClassDef {
            name: s.name.to_string(),
            fields: vec!["name".to_string(), "value".to_string()],
            field_types: vec![
                ("name".to_string(), "str".to_string()),
                ("value".to_string(), camel_core::value::class::ANY_FIELD_TYPE.to_string()),
            ],
            methods: Vec::new(),
            class_methods: Vec::new(),
            class_attrs: std::cell::RefCell::new(Vec::new()),
            base_classes: bases,
            constructor: None,
            is_builtin: false,
        });

        for stmt in &s.body {
            match stmt {
                ast::Stmt::Assign(a) => {
                    let [ast::Expr::Name(target)] = a.targets.as_slice() else {
                        return self.err(
                            ExceptionKind::ParseError("enum member must be a plain name".to_string()),
                            a.range(),
                            vec![],
                        );
                    };
                    let member_value = self.eval_expr(&a.value, ns)?;
                    let instance = camel_core::value::class::ClassInstance::new(
                        def.clone(),
                        vec![
                            (
                                "name".to_string(),
                                Value::str(target.id.as_str(), Capabilities::camel(), vec![]),
                            ),
                            ("value".to_string(), member_value.clone()),
                        ],
                    );
                    instance.freeze();
                    let wrapped = Value::new(
                        Raw::ClassInstance(instance),
                        Capabilities::camel(),
                        vec![member_value],
                    );
                    def.class_attrs.borrow_mut().push((target.id.to_string(), wrapped));
                }
                ast::Stmt::Pass(_) => {}
                _ => {
                    return self.err(
                        ExceptionKind::ParseError(
                            "an Enum body may only assign members".to_string(),
                        ),
                        stmt.range(),
                        vec![],
                    )
                }
            }
        }

        let value = Value::new(Raw::Class(def), Capabilities::camel(), vec![]);
        ns.set_variable(s.name.as_str(), value);
        Ok(Flow::Normal)
    }

    /// Bind `value` into `target`, handling simple names, tuple/list
    /// unpacking, subscript assignment (`d[k] = v`, `l[i] = v`), and
    /// attribute assignment on a class instance.
    pub(crate) fn assign_target(&mut self, target: &ast::Expr, value: Value, ns: &Namespace) -> Result<(), Value> {
        match target {
            ast::Expr::Name(n) => {
                ns.set_variable(n.id.as_str(), value);
                Ok(())
            }
            ast::Expr::Tuple(t) => self.unpack(&t.elts, value, target.range(), ns),
            ast::Expr::List(l) => self.unpack(&l.elts, value, target.range(), ns),
            ast::Expr::Starred(s) => self.assign_target(&s.value, value, ns),
            ast::Expr::Subscript(s) => {
                let recv = self.eval_expr(&s.value, ns)?;
                let key = self.eval_expr(&s.slice, ns)?;
                match recv.raw() {
                    Raw::Dict(_) => {
                        camel_core::value::collection::dict_set(&recv, key, value)
                            .map_err(|e| self.raise(e, target.range(), vec![]))
                    }
                    Raw::List(_) => {
                        let Raw::Int(i) = key.raw() else {
                            return self.err(
                                ExceptionKind::TypeError("list indices must be integers".to_string()),
                                target.range(),
                                vec![],
                            );
                        };
                        camel_core::value::collection::set_index(&recv, *i, value)
                            .map_err(|e| self.raise(e, target.range(), vec![]))
                    }
                    _ => self.err(
                        ExceptionKind::TypeError(format!(
                            "'{}' object does not support item assignment",
                            recv.type_name()
                        )),
                        target.range(),
                        vec![],
                    ),
                }
            }
            ast::Expr::Attribute(a) => {
                let recv = self.eval_expr(&a.value, ns)?;
                let Raw::ClassInstance(inst) = recv.raw() else {
                    return self.err(
                        ExceptionKind::AttributeError {
                            type_name: recv.type_name(),
                            attr: a.attr.to_string(),
                        },
                        target.range(),
                        vec![],
                    );
                };
                inst.set_field(a.attr.as_str(), value)
                    .map_err(|e| self.raise(e, target.range(), vec![]))
            }
            _ => self.err(
                ExceptionKind::ParseError("unsupported assignment target".to_string()),
                target.range(),
                vec![],
            ),
        }
    }

    fn unpack(
        &mut self,
        targets: &[ast::Expr],
        value: Value,
        range: TextRange,
        ns: &Namespace,
    ) -> Result<(), Value> {
        let items = camel_core::value::collection::elements(&value);
        if items.len() != targets.len() {
            return self.err(
                ExceptionKind::ValueError(format!(
                    "expected {} values to unpack, got {}",
                    targets.len(),
                    items.len()
                )),
                range,
                vec![],
            );
        }
        for (target, item) in targets.iter().zip(items) {
            self.assign_target(target, item, ns)?;
        }
        Ok(())
    }
}

pub(crate) fn truthy(v: &Value) -> bool {
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

fn stmt_name(stmt: &ast::Stmt) -> &'static str {
    match stmt {
        ast::Stmt::FunctionDef(_) => "def",
        ast::Stmt::AsyncFunctionDef(_) => "async def",
        ast::Stmt::Import(_) => "import",
        ast::Stmt::ImportFrom(_) => "from-import",
        ast::Stmt::Global(_) => "global",
        ast::Stmt::Nonlocal(_) => "nonlocal",
        ast::Stmt::Try(_) | ast::Stmt::TryStar(_) => "try",
        ast::Stmt::With(_) | ast::Stmt::AsyncWith(_) => "with",
        ast::Stmt::Match(_) => "match",
        ast::Stmt::Delete(_) => "del",
        ast::Stmt::Assert(_) => "assert",
        ast::Stmt::TypeAlias(_) => "type alias",
        _ => "statement",
    }
}

/// 1-indexed (line, column) for a byte offset into `source`.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
