//! Tree-walking evaluation of the sandboxed language: parsing, the
//! capability-propagating interpreter, and the single `run` entry point a
//! host embeds (§4, §6.1).

pub mod eval_mode;
pub mod interpreter;
pub mod parser;
pub mod run;

pub use eval_mode::{EvalArgs, EvalMode};
pub use interpreter::{FunctionCall, Interpreter};
pub use parser::{extract_code_block, parse_program, ParseError};
pub use run::{namespace_with_builtins, run};
