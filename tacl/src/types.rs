//! Public types used throughout the crate.
//!
//! The most important of these is [`Exception`], which represents every kind
//! of non-OK outcome a script fragment can produce: real errors, but also the
//! `return`, `break`, and `continue` control-flow signals.  Evaluation
//! results are `Result<Value, Exception>` everywhere, so control flow
//! propagates with `?` until something consumes it: a loop consumes
//! `Break`/`Continue`, a procedure boundary consumes `Return`, and `catch`
//! consumes anything.

use crate::interp::Interp;
use std::hash::BuildHasherDefault;

pub use crate::value::Value;

/// The integer type used by the language.
pub type TaclInt = i64;

/// A list of values, the internal form of the language's list type.
pub type TaclList = Vec<Value>;

/// The outcome of evaluating a script fragment.
pub type TaclResult = Result<Value, Exception>;

/// The outcome of a command handler.  `Ok(None)` is shorthand for returning
/// the empty value.
pub type TaclOptResult = Result<Option<Value>, Exception>;

/// The function type for native command handlers.  `argv[0]` is the command
/// name as written; the remaining entries are the evaluated arguments.
pub type CommandFunc<Ctx> = fn(&mut Interp<Ctx>, &[Value], &mut Ctx) -> TaclOptResult;

/// The hasher used for all of the interpreter's maps.
pub type TaclHasher = BuildHasherDefault<rustc_hash::FxHasher>;

/// The kinds of result a script fragment can produce.  The numeric values
/// are script-visible: `catch` returns them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultCode {
    Okay,
    Error,
    Return,
    Break,
    Continue,
}

impl ResultCode {
    /// The script-visible number of the code, as returned by `catch`.
    pub fn as_int(self) -> TaclInt {
        match self {
            ResultCode::Okay => 0,
            ResultCode::Error => 1,
            ResultCode::Return => 2,
            ResultCode::Break => 3,
            ResultCode::Continue => 4,
        }
    }
}

/// A non-OK result: an error, or one of the control-flow signals.
///
/// An `Exception` always carries a value: the error message for `Error`, the
/// returned value for `Return`, and the empty value otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Exception {
    code: ResultCode,
    value: Value,
}

impl Exception {
    /// Creates an error exception with the given message value.
    pub fn tacl_err(value: Value) -> Self {
        Self {
            code: ResultCode::Error,
            value,
        }
    }

    /// Creates a `return` exception carrying the returned value.
    pub fn tacl_return(value: Value) -> Self {
        Self {
            code: ResultCode::Return,
            value,
        }
    }

    /// Creates a `break` exception.
    pub fn tacl_break() -> Self {
        Self {
            code: ResultCode::Break,
            value: Value::empty(),
        }
    }

    /// Creates a `continue` exception.
    pub fn tacl_continue() -> Self {
        Self {
            code: ResultCode::Continue,
            value: Value::empty(),
        }
    }

    /// The exception's result code.
    pub fn code(&self) -> ResultCode {
        self.code
    }

    /// The exception's value: the error message or returned value.
    pub fn value(&self) -> Value {
        self.value.clone()
    }

    /// Whether this is a real error rather than a control-flow signal.
    pub fn is_error(&self) -> bool {
        self.code == ResultCode::Error
    }
}

/// Checks a command's argument count, producing the standard
/// `wrong # args: should be "..."` error if it is out of range.
///
/// `namec` is the number of leading words that name the command (1 for plain
/// commands, 2 for subcommands of an ensemble).  `min` and `max` bound the
/// acceptable length of `argv` including those words; `max` of 0 means no
/// upper bound.  `argsig` is the human-readable signature of the arguments
/// proper.
///
/// # Example
///
/// ```
/// use tacl::check_args;
/// use tacl::Value;
///
/// let argv: Vec<Value> = vec![Value::from("set")];
/// let err = check_args(1, &argv, 2, 3, "varName ?newValue?").unwrap_err();
/// assert_eq!(
///     err.value().as_str(),
///     "wrong # args: should be \"set varName ?newValue?\""
/// );
/// ```
pub fn check_args(
    namec: usize,
    argv: &[Value],
    min: usize,
    max: usize,
    argsig: &str,
) -> Result<(), Exception> {
    debug_assert!(namec >= 1 && namec <= argv.len());

    if argv.len() >= min && (max == 0 || argv.len() <= max) {
        Ok(())
    } else {
        let mut msg = String::from("wrong # args: should be \"");
        for (i, word) in argv[0..namec].iter().enumerate() {
            if i > 0 {
                msg.push(' ');
            }
            msg.push_str(word.as_str());
        }
        if !argsig.is_empty() {
            msg.push(' ');
            msg.push_str(argsig);
        }
        msg.push('"');
        Err(Exception::tacl_err(Value::from(msg)))
    }
}

/// A subcommand of an ensemble command: a name and the handler to invoke.
#[derive(Debug)]
pub struct Subcommand<Ctx>(pub &'static str, pub CommandFunc<Ctx>);

impl<Ctx> Subcommand<Ctx> {
    /// Looks up a subcommand by name, producing the standard error listing
    /// the valid subcommands if the name is unknown.
    pub fn find<'a>(
        subcommands: &'a [Subcommand<Ctx>],
        name: &str,
    ) -> Result<&'a Subcommand<Ctx>, Exception> {
        if let Some(rec) = subcommands.iter().find(|rec| rec.0 == name) {
            return Ok(rec);
        }

        let mut names: Vec<&str> = subcommands.iter().map(|rec| rec.0).collect();
        names.sort_unstable();

        let listing = match names.len() {
            0 => String::new(),
            1 => names[0].to_string(),
            n => format!("{}, or {}", names[0..n - 1].join(", "), names[n - 1]),
        };

        Err(Exception::tacl_err(Value::from(format!(
            "unknown or ambiguous subcommand \"{}\". Must be {}.",
            name, listing
        ))))
    }
}
