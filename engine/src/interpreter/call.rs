//! Call evaluation: argument binding, the tool boundary, and the call log
//! (§4.4, §6.4).

use camel_core::value::class::ClassInstance;
use camel_core::{Namespace, Plain, Raw, Value};
use camel_types::{Capabilities, ExceptionKind};
use rustpython_ast::{self as ast, Ranged};

use super::Interpreter;

/// One recorded invocation, the sole record of a run's side effects (§6.4).
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub function: String,
    pub object_type: Option<String>,
    pub args: Vec<(String, Plain)>,
    pub output: Result<Plain, String>,
    pub is_builtin: bool,
}

impl Interpreter {
    /// Evaluate a `Call` node: resolve the callee, bind positional/keyword
    /// arguments, and dispatch to a builtin/tool callable or a class
    /// constructor.
    pub(super) fn eval_call(&mut self, call: &ast::ExprCall, ns: &Namespace) -> Result<Value, Value> {
        let callee = self.eval_expr(&call.func, ns)?;

        let mut positional = Vec::with_capacity(call.args.len());
        for a in &call.args {
            if let ast::Expr::Starred(s) = a {
                let spread = self.eval_expr(&s.value, ns)?;
                positional.extend(camel_core::value::collection::elements(&spread));
            } else {
                positional.push(self.eval_expr(a, ns)?);
            }
        }

        let mut keyword = Vec::with_capacity(call.keywords.len());
        for kw in &call.keywords {
            let value = self.eval_expr(&kw.value, ns)?;
            match &kw.arg {
                Some(name) => keyword.push((name.to_string(), value)),
                None => {
                    // `**kwargs` splat: value must be a dict.
                    let Raw::Dict(entries) = value.raw() else {
                        return self.err(
                            ExceptionKind::TypeError("argument after ** must be a mapping".to_string()),
                            call.range(),
                            vec![],
                        );
                    };
                    for (k, v) in entries.borrow().iter() {
                        keyword.push((camel_core::value::string::native(k), v.clone()));
                    }
                }
            }
        }

        match callee.raw() {
            Raw::Class(def) => {
                if let Some(constructor) = &def.constructor {
                    let result = constructor(&positional, &keyword, ns);
                    return result.map_err(|e| self.raise(e, call.range(), positional));
                }
                if positional.len() > def.fields.len() {
                    return self.err(
                        ExceptionKind::TypeError(format!(
                            "{} takes at most {} positional arguments",
                            def.name,
                            def.fields.len()
                        )),
                        call.range(),
                        vec![],
                    );
                }
                let mut fields = Vec::new();
                for (name, value) in def.fields.iter().zip(positional.iter().cloned()) {
                    fields.push((name.clone(), value));
                }
                for (name, value) in &keyword {
                    if !def.fields.contains(name) {
                        return self.err(
                            ExceptionKind::TypeError(format!(
                                "{} got an unexpected keyword argument '{name}'",
                                def.name
                            )),
                            call.range(),
                            vec![],
                        );
                    }
                    if let Some(slot) = fields.iter_mut().find(|(n, _)| n == name) {
                        slot.1 = value.clone();
                    } else {
                        fields.push((name.clone(), value.clone()));
                    }
                }
                let missing: Vec<&String> =
                    def.fields.iter().filter(|f| !fields.iter().any(|(n, _)| n == *f)).collect();
                if !missing.is_empty() {
                    return self.err(
                        ExceptionKind::TypeError(format!(
                            "{} missing required argument(s): {}",
                            def.name,
                            missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
                        )),
                        call.range(),
                        vec![],
                    );
                }
                if def.derives_from_model() {
                    for (name, value) in &fields {
                        let expected = def.field_type(name);
                        if expected != camel_core::value::class::ANY_FIELD_TYPE
                            && expected != value.type_name()
                        {
                            return self.err(
                                ExceptionKind::TypeError(format!(
                                    "{}.{name} expected {expected}, got {}",
                                    def.name,
                                    value.type_name()
                                )),
                                call.range(),
                                vec![],
                            );
                        }
                    }
                }
                let instance = ClassInstance::new(def.clone(), fields);
                Ok(Value::new(
                    Raw::ClassInstance(instance),
                    Capabilities::camel(),
                    vec![callee.clone()],
                ))
            }
            Raw::Callable(callable) => {
                let callable = callable.clone();
                let is_builtin = !matches!(callable, camel_core::Callable::Tool { .. });
                let name = callable.name().to_string();

                if let Some(params) = self.tool_params.get(&name) {
                    for (kw_name, _) in &keyword {
                        if !params.contains(kw_name) {
                            return self.err(
                                ExceptionKind::TypeError(format!(
                                    "{name}() got an unexpected keyword argument '{kw_name}'"
                                )),
                                call.range(),
                                vec![],
                            );
                        }
                    }
                }

                // Zip positionals against the declared parameter schema so a
                // positionally-called tool still logs a complete args map
                // (§6.4); builtins have no such schema and keep logging only
                // their keyword arguments, as before.
                let mut logged_args: Vec<(String, Plain)> = match self.tool_params.get(&name) {
                    Some(params) => positional
                        .iter()
                        .zip(params)
                        .map(|(v, param_name)| (param_name.clone(), v.to_plain()))
                        .collect(),
                    None => Vec::new(),
                };
                logged_args.extend(keyword.iter().map(|(k, v)| (k.clone(), v.to_plain())));

                let mut args = positional;
                if let Some(receiver) = callable.receiver() {
                    args.insert(0, receiver.clone());
                }
                let result = callable.call(&args, &keyword, ns);
                self.tool_call_log.push(FunctionCall {
                    function: name,
                    object_type: None,
                    args: logged_args,
                    output: result
                        .as_ref()
                        .map(Value::to_plain)
                        .map_err(std::string::ToString::to_string),
                    is_builtin,
                });
                result.map_err(|e| self.raise(e, call.range(), args))
            }
            _ => self.err(
                ExceptionKind::TypeError(format!("'{}' object is not callable", callee.type_name())),
                call.range(),
                vec![],
            ),
        }
    }
}
