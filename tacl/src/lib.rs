//! tacl: an embeddable interpreter for a Tcl-style command language.
//!
//! Everything is a command, every value has a canonical string form, and
//! the control structures (`if`, `while`, `for`, `foreach`, `proc`,
//! `catch`, `return`, `break`, `continue`) are commands like any other.
//! Applications embed the language by creating an [`Interp`], binding
//! native commands, and evaluating scripts; see the [`interp`] module for
//! the full embedding story.
//!
//! ```
//! use tacl::Interp;
//!
//! let mut ctx = ();
//! let mut interp = Interp::new();
//!
//! let value = interp
//!     .eval("proc fives {n} { * $n 5 }; fives 9", &mut ctx)
//!     .unwrap();
//! assert_eq!(value.as_str(), "45");
//! ```
//!
//! Values ([`Value`]) are immutable and carry cached views of their string
//! form (integer, list, parsed script, parsed expression), so a loop body
//! or condition is parsed once no matter how often it runs.  Evaluation
//! results are `Result<Value, Exception>`, where an
//! [`Exception`](types::Exception) is an error or one of the `return` /
//! `break` / `continue` control-flow signals.

mod chans;
mod commands;
mod expr;
mod glob;
mod list;
mod parser;
mod scope;
mod tokenizer;

pub mod interp;
pub mod types;
pub mod value;

pub use glob::glob_match;
pub use interp::Interp;
pub use types::*;
pub use value::Value;

/// Returns `Ok(Value)` from a command or evaluation: `tacl_ok!()` for the
/// empty value, `tacl_ok!(x)` to convert a value, or a format string with
/// arguments.
#[macro_export]
macro_rules! tacl_ok {
    () => {
        Ok($crate::Value::empty())
    };
    ($arg:expr) => {
        Ok($crate::Value::from($arg))
    };
    ($($args:expr),+) => {
        Ok($crate::Value::from(format!($($args),+)))
    };
}

/// Returns an error: `tacl_err!(msg)` or a format string with arguments.
#[macro_export]
macro_rules! tacl_err {
    ($arg:expr) => {
        Err($crate::types::Exception::tacl_err($crate::Value::from($arg)))
    };
    ($($args:expr),+) => {
        Err($crate::types::Exception::tacl_err($crate::Value::from(format!($($args),+))))
    };
}

/// Returns `Ok(Some(Value))` from a command handler; the `Option` form of
/// [`tacl_ok!`].
#[macro_export]
macro_rules! tacl_opt_ok {
    () => {
        Ok(Some($crate::Value::empty()))
    };
    ($arg:expr) => {
        Ok(Some($crate::Value::from($arg)))
    };
    ($($args:expr),+) => {
        Ok(Some($crate::Value::from(format!($($args),+))))
    };
}
