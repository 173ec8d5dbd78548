//! The tacl Interpreter
//!
//! The [`Interp`] struct is the primary API for embedding tacl into a Rust
//! application.  Given an `Interp`, the application may:
//!
//! * Evaluate scripts and expressions
//! * Check scripts for completeness
//! * Extend the language by defining new commands in Rust
//! * Set and get variables
//!
//! # Interp is not Sync!
//!
//! An `Interp` (and the rest of the crate) is intended for use in a single
//! thread.  It is safe to have `Interp`s in different threads, but use
//! `String` (or another `Sync` type) when passing data between them; in
//! particular, [`Value`] is not `Sync`.  The channel commands follow this
//! rule themselves: a value sent over a channel travels as its string form.
//!
//! # Creating an Interpreter
//!
//! [`Interp::new`] creates an interpreter populated with the standard
//! commands; the application can then add its own.  [`Interp::empty`]
//! creates one with no commands at all, which is a useful base for small
//! configuration languages.
//!
//! The `Ctx` type parameter is the application's context type: every command
//! receives a `&mut Ctx` alongside the interpreter, which is how native
//! commands reach application data without globals.  Applications that don't
//! need a context use `()`.
//!
//! # Evaluating Scripts
//!
//! ```
//! use tacl::Interp;
//! use tacl::types::*;
//! use tacl::tacl_ok;
//! # let _ = dummy();
//! # fn dummy() -> TaclResult {
//! let mut glob_ctx = ();
//! let mut interp = Interp::new();
//!
//! let val = interp.eval("expr {2 + 2}", &mut glob_ctx)?;
//! assert_eq!(val.as_str(), "4");
//! assert_eq!(val.as_int()?, 4);
//! # tacl_ok!()
//! # }
//! ```
//!
//! Prefer [`Interp::eval_value`] when the script is already held in a
//! [`Value`]: the parsed form is cached on the value, so repeated
//! evaluation reparses nothing.
//!
//! # Defining New Commands
//!
//! A command is a Rust function of type [`CommandFunc`], registered with
//! [`Interp::add_command`].  It receives the interpreter, the evaluated
//! words of the command (`argv[0]` is the command name), and the
//! application context.
//!
//! ```
//! use tacl::check_args;
//! use tacl::types::*;
//! use tacl::{tacl_opt_ok, tacl_ok, Interp};
//! # let _ = dummy();
//! # fn dummy() -> TaclResult {
//! let mut glob_ctx = ();
//! let mut interp = Interp::new();
//! interp.add_command("square", cmd_square);
//!
//! let val = interp.eval("square 5", &mut glob_ctx)?;
//! assert_eq!(val.as_str(), "25");
//! # tacl_ok!()
//! # }
//!
//! // The command: square intValue
//! fn cmd_square(_: &mut Interp, argv: &[Value], _ctx: &mut ()) -> TaclOptResult {
//!     check_args(1, argv, 2, 2, "intValue")?;
//!     let int_value = argv[1].as_int()?;
//!     tacl_opt_ok!(int_value * int_value)
//! }
//! ```
//!
//! If a script names a command that isn't bound but a command called
//! `unknown` is, `unknown` is invoked with the entire word vector, which is
//! how applications implement catch-all dispatch.
//!
//! # Variables
//!
//! Variable names may carry a `::` prefix (forcing the global scope) and an
//! `(index)` suffix (naming an array element).  [`Interp::var`] and
//! [`Interp::set_var`] accept names in this form; [`Interp::scalar`] and
//! [`Interp::element`] work on the current scope directly.

use crate::chans;
use crate::check_args;
use crate::commands;
use crate::expr;
use crate::list;
use crate::parser;
use crate::parser::{Script, Word};
use crate::scope::ScopeStack;
use crate::types::*;
use crate::value::Value;
use crate::{tacl_err, tacl_ok};
use indexmap::IndexMap;
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, Write};
use std::rc::Rc;

/// The tacl interpreter.  See the [module level documentation](index.html)
/// for an overview.
pub struct Interp<Ctx = ()> {
    // Command table
    commands: IndexMap<String, Rc<Command<Ctx>>, TaclHasher>,

    // Variable frames
    scopes: ScopeStack,

    // Channel table: the standard channels plus any opened files
    chans: IndexMap<String, Channel, TaclHasher>,

    // Counter behind the generated fileN channel names
    next_chan_id: usize,

    // Defines the recursion limit for Interp::eval().
    recursion_limit: usize,

    // Current number of eval levels.
    num_levels: usize,
}

/// A command defined in the interpreter.
enum Command<Ctx> {
    /// A binary command implemented as a Rust CommandFunc.
    Native(CommandFunc<Ctx>),

    /// A procedure defined by the `proc` command.
    Proc(Procedure),
}

impl<Ctx> Command<Ctx> {
    fn execute(&self, interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclResult {
        match self {
            Command::Native(func) => Ok(func(interp, argv, ctx)?.unwrap_or_default()),
            Command::Proc(proc) => proc.execute(interp, argv, ctx),
        }
    }

    fn is_proc(&self) -> bool {
        matches!(self, Command::Proc(_))
    }
}

impl<Ctx> Interp<Ctx> {
    //--------------------------------------------------------------------------------------------
    // Constructors

    /// Creates an interpreter with no commands defined.  Use this when
    /// crafting command languages that shouldn't include the standard
    /// commands, or as a base to which specific command sets can be added.
    ///
    /// The standard channels are still registered.
    ///
    /// # Example
    ///
    /// ```
    /// # use tacl::Interp;
    /// let interp = Interp::<()>::empty();
    /// assert!(interp.command_names().is_empty());
    /// ```
    pub fn empty() -> Self {
        let mut chans = IndexMap::default();
        chans.insert("stdin".to_string(), Channel::Stdin);
        chans.insert("stdout".to_string(), Channel::Stdout);
        chans.insert("stderr".to_string(), Channel::Stderr);

        Self {
            commands: IndexMap::default(),
            scopes: ScopeStack::new(),
            chans,
            next_chan_id: 0,
            recursion_limit: 1000,
            num_levels: 0,
        }
    }

    /// Creates an interpreter pre-populated with the standard commands.
    /// Use [`command_names`](#method.command_names) (or the `info commands`
    /// command) to retrieve the full list, and
    /// [`add_command`](#method.add_command) to extend it.
    ///
    /// ```
    /// # use tacl::types::*;
    /// # use tacl::Interp;
    /// # use tacl::tacl_ok;
    /// # fn dummy() -> TaclResult {
    /// let mut glob_ctx = ();
    /// let mut interp = Interp::new();
    /// let four = interp.eval("expr {2 + 2}", &mut glob_ctx)?;
    /// assert_eq!(four, Value::from(4));
    /// # tacl_ok!()
    /// # }
    /// # let _ = dummy();
    /// ```
    pub fn new() -> Self {
        let mut interp = Interp::empty();

        for (name, func) in commands::commands::<Ctx>() {
            interp.add_command(name, func);
        }
        for (name, func) in chans::commands::<Ctx>() {
            interp.add_command(name, func);
        }

        interp.populate_env();
        interp
    }

    /// Populates the `env()` array with the process's environment.
    /// Changes to the array are not mirrored back into the environment.
    fn populate_env(&mut self) {
        for (key, value) in std::env::vars() {
            let _ = self.set_element("env", &key, value.into());
        }
    }

    //--------------------------------------------------------------------------------------------
    // Script and Expression Evaluation

    /// Evaluates a script one command at a time, returning the value of the
    /// last command, the value of any explicit `return`, or the first error
    /// thrown.  At this, the top level, an escaped `break` or `continue`
    /// becomes an `uncaught error: N` error carrying the signal number.
    pub fn eval(&mut self, script: &str, ctx: &mut Ctx) -> TaclResult {
        let value = Value::from(script);
        self.eval_value(&value, ctx)
    }

    /// Reads a script from a reader and evaluates it as
    /// [`eval`](#method.eval) does.
    pub fn run<R: io::Read>(&mut self, mut reader: R, ctx: &mut Ctx) -> TaclResult {
        let mut source = String::new();
        if let Err(e) = reader.read_to_string(&mut source) {
            return tacl_err!("{}", e);
        }
        self.eval(&source, ctx)
    }

    /// Evaluates the string form of a [`Value`] as a script.  Equivalent to
    /// [`eval`](#method.eval), but the parsed script is cached on the
    /// value, making repeated evaluation cheap.  Use this for
    /// control-structure bodies.
    pub fn eval_value(&mut self, value: &Value, ctx: &mut Ctx) -> TaclResult {
        // FIRST, check the number of nesting levels.
        self.num_levels += 1;

        if self.num_levels > self.recursion_limit {
            self.num_levels -= 1;
            return tacl_err!("too many nested calls to Interp::eval (infinite loop?)");
        }

        // NEXT, parse (or retrieve the cached parse) and evaluate.
        let mut result = value
            .as_script()
            .and_then(|script| self.eval_script(&script, ctx));

        self.num_levels -= 1;

        // NEXT, finalise the result at the top level: a return yields its
        // value, while loop-control signals have escaped every loop.
        if self.num_levels == 0 {
            if let Err(exception) = result {
                result = match exception.code() {
                    ResultCode::Okay => Ok(exception.value()),
                    ResultCode::Error => Err(exception),
                    ResultCode::Return => Ok(exception.value()),
                    ResultCode::Break | ResultCode::Continue => {
                        tacl_err!("uncaught error: {}", exception.code().as_int())
                    }
                };
            }
        }

        result
    }

    /// Evaluates a parsed script.  Also used by the control-flow commands.
    pub(crate) fn eval_script(&mut self, script: &Script, ctx: &mut Ctx) -> TaclResult {
        let mut result_value = None;

        for command in script.commands() {
            let words = self.eval_word_vec(command.words(), ctx)?;

            if words.is_empty() {
                break;
            }

            let name = words[0].as_str();
            let cmd = match self.commands.get(name) {
                Some(cmd) => Rc::clone(cmd),
                // Catch-all dispatch: hand the whole word vector to
                // `unknown` if one is bound.
                None => match self.commands.get("unknown") {
                    Some(cmd) => Rc::clone(cmd),
                    None => return tacl_err!("command not found: {}", name),
                },
            };

            result_value = Some(cmd.execute(self, words.as_slice(), ctx)?);
        }

        Ok(result_value.unwrap_or_default())
    }

    /// Evaluates a word vector, producing the argument values.  The
    /// expansion operator is handled as a special case: the inner word must
    /// produce a list, whose elements are spliced in at that position.
    fn eval_word_vec(&mut self, words: &[Word], ctx: &mut Ctx) -> Result<TaclList, Exception> {
        let mut list: TaclList = Vec::new();

        for word in words {
            if let Word::Expand(word_to_expand) = word {
                let value = self.eval_word(word_to_expand, ctx)?;
                for val in &*value.as_list()? {
                    list.push(val.clone());
                }
            } else {
                list.push(self.eval_word(word, ctx)?);
            }
        }

        Ok(list)
    }

    /// Evaluates a single word, producing a value.  Also used by expr.rs.
    pub(crate) fn eval_word(&mut self, word: &Word, ctx: &mut Ctx) -> TaclResult {
        match word {
            Word::Value(val) => Ok(val.clone()),
            Word::VarRef(vref) => self.scopes.get(&vref.name, vref.global),
            Word::ArrayRef(vref, index_word) => {
                let index = self.eval_word(index_word, ctx)?;
                self.scopes
                    .get_elem(&vref.name, vref.global, index.as_str())
            }
            Word::Script(script) => self.eval_script(script, ctx),
            Word::Tokens(tokens) => {
                let tlist = self.eval_word_vec(tokens, ctx)?;
                let string: String = tlist.iter().map(|v| v.as_str()).collect();
                Ok(Value::from(string))
            }
            Word::Expand(_) => panic!("recursive Expand!"),
        }
    }

    /// Evaluates a body in the caller's scope by detaching the current
    /// frame for the duration.  At the global scope the body simply runs in
    /// place.  This is the mechanism behind `uplevel`.
    pub(crate) fn eval_in_parent(&mut self, body: &Value, ctx: &mut Ctx) -> TaclResult {
        match self.scopes.pop_detached() {
            Some(frame) => {
                let result = self.eval_value(body, ctx);
                self.scopes.push_detached(frame);
                result
            }
            None => self.eval_value(body, ctx),
        }
    }

    /// Determines whether the script is syntactically complete, e.g., has
    /// no unmatched quotes, brackets, or braces.  REPLs use this to decide
    /// whether to ask for another line of input.
    ///
    /// # Example
    ///
    /// ```
    /// # use tacl::Interp;
    /// let interp = Interp::<()>::new();
    /// assert!(interp.complete("set a [expr {1+1}]"));
    /// assert!(!interp.complete("set a [expr {1+1"));
    /// ```
    pub fn complete(&self, script: &str) -> bool {
        parser::parse(script).is_ok()
    }

    /// Evaluates an expression given as a `Value` and returns its value.
    /// The parsed expression is cached on the value.
    ///
    /// # Example
    ///
    /// ```
    /// use tacl::types::*;
    /// use tacl::Interp;
    /// # fn dummy() -> Result<String, Exception> {
    /// let mut glob_ctx = ();
    /// let mut interp = Interp::new();
    /// let sum = interp.expr(&Value::from("2 + 2"), &mut glob_ctx)?.as_int()?;
    /// assert_eq!(sum, 4);
    /// # Ok("dummy".to_string())
    /// # }
    /// # let _ = dummy();
    /// ```
    pub fn expr(&mut self, expr: &Value, ctx: &mut Ctx) -> TaclResult {
        let node = expr.as_expr()?;
        expr::eval_node(self, &node, ctx)
    }

    /// Evaluates an expression and coerces the result to a boolean.
    pub fn expr_bool(&mut self, expr: &Value, ctx: &mut Ctx) -> Result<bool, Exception> {
        Ok(self.expr(expr, ctx)?.as_bool())
    }

    /// Evaluates an expression and returns the result as an integer, or an
    /// error if it isn't one.
    pub fn expr_int(&mut self, expr: &Value, ctx: &mut Ctx) -> Result<TaclInt, Exception> {
        self.expr(expr, ctx)?.as_int()
    }

    //--------------------------------------------------------------------------------------------
    // Variable Handling

    /// Retrieves the value of the named variable.  The name may carry a
    /// `::` prefix or an `(index)` suffix; this is the normal way to read a
    /// variable named by a command argument.
    ///
    /// # Example
    ///
    /// ```
    /// use tacl::types::*;
    /// use tacl::Interp;
    /// use tacl::tacl_ok;
    /// # fn dummy() -> TaclResult {
    /// let mut glob_ctx = ();
    /// let mut interp = Interp::new();
    ///
    /// interp.eval("set a 1", &mut glob_ctx)?;
    /// assert_eq!(interp.var(&Value::from("a"))?.as_str(), "1");
    ///
    /// interp.eval("set b(1) Howdy", &mut glob_ctx)?;
    /// assert_eq!(interp.var(&Value::from("b(1)"))?.as_str(), "Howdy");
    /// # tacl_ok!()
    /// # }
    /// # let _ = dummy();
    /// ```
    pub fn var(&self, var_name: &Value) -> TaclResult {
        let var_name = var_name.as_var_name();
        match var_name.index() {
            Some(index) => self
                .scopes
                .get_elem(var_name.name(), var_name.is_global(), index),
            None => self.scopes.get(var_name.name(), var_name.is_global()),
        }
    }

    /// Returns true if the named variable exists.
    pub fn var_exists(&self, var_name: &Value) -> bool {
        let var_name = var_name.as_var_name();
        match var_name.index() {
            Some(index) => self
                .scopes
                .get_elem(var_name.name(), var_name.is_global(), index)
                .is_ok(),
            None => self.scopes.exists(var_name.name(), var_name.is_global()),
        }
    }

    /// Sets the value of the named variable, creating it if necessary.
    /// The name is interpreted as for [`var`](#method.var).
    pub fn set_var(&mut self, var_name: &Value, value: Value) -> Result<(), Exception> {
        let var_name = var_name.as_var_name();
        match var_name.index() {
            Some(index) => {
                self.scopes
                    .set_elem(var_name.name(), var_name.is_global(), index, value)
            }
            None => self
                .scopes
                .set(var_name.name(), var_name.is_global(), value),
        }
    }

    /// Sets the value of the named variable and returns the value, which is
    /// convenient for commands that return what they assigned.
    pub fn set_var_return(&mut self, var_name: &Value, value: Value) -> TaclResult {
        self.set_var(var_name, value.clone())?;
        Ok(value)
    }

    /// Retrieves a scalar variable from the current scope by bare name.
    pub fn scalar(&self, name: &str) -> TaclResult {
        self.scopes.get(name, false)
    }

    /// Sets a scalar variable in the current scope, creating it if
    /// necessary.
    pub fn set_scalar(&mut self, name: &str, value: Value) -> Result<(), Exception> {
        self.scopes.set(name, false, value)
    }

    /// Retrieves an array element from the current scope.
    pub fn element(&self, name: &str, index: &str) -> TaclResult {
        self.scopes.get_elem(name, false, index)
    }

    /// Sets an array element in the current scope, creating the array if
    /// necessary.
    pub fn set_element(&mut self, name: &str, index: &str, value: Value) -> Result<(), Exception> {
        self.scopes.set_elem(name, false, index, value)
    }

    /// Unsets a variable by name.  It is not an error to unset a variable
    /// that doesn't exist.
    pub fn unset_var(&mut self, var_name: &Value) {
        let var_name = var_name.as_var_name();
        match var_name.index() {
            Some(index) => self
                .scopes
                .unset_elem(var_name.name(), var_name.is_global(), index),
            None => self.scopes.unset(var_name.name(), var_name.is_global()),
        }
    }

    /// Gets the names of the variables visible in the current scope.
    pub fn vars_in_scope(&self) -> TaclList {
        self.scopes.vars_in_scope()
    }

    /// Gets the names of the variables defined in the global scope.
    pub fn vars_in_global_scope(&self) -> TaclList {
        self.scopes.vars_in_global_scope()
    }

    /// Links the name `mine` in the current scope to the variable `theirs`
    /// in the scope at the given absolute level (0 is the global scope).
    /// This is the mechanism behind the `upvar` and `global` commands;
    /// client code rarely needs it directly.
    pub fn upvar(&mut self, level: usize, theirs: &str, mine: &str) {
        assert!(level <= self.scopes.current(), "invalid scope level");
        self.scopes.upvar(level, theirs, mine);
    }

    /// Pushes a variable scope onto the scope stack.  Procs use this to
    /// create their local scope.  A command that pushes a scope must pop it
    /// before returning.
    pub fn push_scope(&mut self) {
        self.scopes.push();
    }

    /// Pops a variable scope off the stack; the pair to
    /// [`push_scope`](#method.push_scope).
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// The current scope level; the global scope is level 0.
    pub fn scope_level(&self) -> usize {
        self.scopes.current()
    }

    //--------------------------------------------------------------------------------------------
    // Command Definition and Handling

    /// Adds a native command to the interpreter.
    pub fn add_command(&mut self, name: &str, func: CommandFunc<Ctx>) {
        self.commands
            .insert(name.into(), Rc::new(Command::Native(func)));
    }

    /// Adds a procedure to the interpreter.  The arguments are those of the
    /// `proc` command, which validates the parameter list before calling
    /// this.
    pub(crate) fn add_proc(&mut self, name: &str, parms: &[Value], body: &Value) {
        let proc = Procedure {
            parms: parms.to_owned(),
            body: body.clone(),
        };

        self.commands
            .insert(name.into(), Rc::new(Command::Proc(proc)));
    }

    /// Determines whether the interpreter contains a command with the
    /// given name.
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Renames a command.  Procedures that call the command under its old
    /// name are not updated; renaming an existing command and installing a
    /// wrapper under the old name is the usual way to intercept it.
    pub fn rename_command(&mut self, old_name: &str, new_name: &str) {
        if let Some(cmd) = self.commands.get(old_name) {
            let cmd = Rc::clone(cmd);
            self.commands.remove(old_name);
            self.commands.insert(new_name.into(), cmd);
        }
    }

    /// Removes the command with the given name.
    pub fn remove_command(&mut self, name: &str) {
        self.commands.remove(name);
    }

    /// Gets the names of the bound commands.
    pub fn command_names(&self) -> TaclList {
        self.commands.keys().map(Value::from).collect()
    }

    /// Gets the names of the bound procedures.
    pub fn proc_names(&self) -> TaclList {
        self.commands
            .iter()
            .filter(|(_, cmd)| cmd.is_proc())
            .map(|(name, _)| Value::from(name))
            .collect()
    }

    /// Returns the body of the named procedure, or an error if the name
    /// doesn't name a procedure.
    pub fn proc_body(&self, procname: &str) -> TaclResult {
        if let Some(cmd) = self.commands.get(procname) {
            if let Command::Proc(proc) = &**cmd {
                return tacl_ok!(proc.body.clone());
            }
        }

        tacl_err!("\"{}\" isn't a procedure", procname)
    }

    /// Returns the argument names of the named procedure, or an error if
    /// the name doesn't name a procedure.
    pub fn proc_args(&self, procname: &str) -> TaclResult {
        if let Some(cmd) = self.commands.get(procname) {
            if let Command::Proc(proc) = &**cmd {
                // Each spec is a list of one or two elements; cmd_proc
                // validated that at definition time.
                let mut vec: TaclList = Vec::new();
                for item in &proc.parms {
                    vec.push(item.as_list()?[0].clone());
                }
                return tacl_ok!(Value::from(vec));
            }
        }

        tacl_err!("\"{}\" isn't a procedure", procname)
    }

    /// Returns the default value of the named argument of the named
    /// procedure, if it has one.
    pub fn proc_default(&self, procname: &str, arg: &str) -> Result<Option<Value>, Exception> {
        if let Some(cmd) = self.commands.get(procname) {
            if let Command::Proc(proc) = &**cmd {
                for argvec in &proc.parms {
                    let argvec = argvec.as_list()?;
                    if argvec[0].as_str() == arg {
                        if argvec.len() == 2 {
                            return Ok(Some(argvec[1].clone()));
                        } else {
                            return Ok(None);
                        }
                    }
                }
                return tacl_err!(
                    "procedure \"{}\" doesn't have an argument \"{}\"",
                    procname,
                    arg
                );
            }
        }

        tacl_err!("\"{}\" isn't a procedure", procname)
    }

    /// The definitions of the bound procedures as
    /// `(name, parameter list, body)` strings.  Used to carry procedures
    /// into a spawned evaluator thread.
    pub(crate) fn proc_definitions(&self) -> Vec<(String, String, String)> {
        self.commands
            .iter()
            .filter_map(|(name, cmd)| match &**cmd {
                Command::Proc(proc) => Some((
                    name.clone(),
                    list::list_to_string(&proc.parms),
                    proc.body.as_str().to_string(),
                )),
                Command::Native(_) => None,
            })
            .collect()
    }

    /// Calls a subcommand of an ensemble command, looking its name up in
    /// `subcommands`.  `subc` is the index of the subcommand name in
    /// `argv`, usually 1.  An unknown name produces the standard error
    /// listing the valid subcommands.
    pub fn call_subcommand(
        &mut self,
        argv: &[Value],
        subc: usize,
        subcommands: &[Subcommand<Ctx>],
        ctx: &mut Ctx,
    ) -> TaclOptResult {
        check_args(subc, argv, subc + 1, 0, "subcommand ?arg ...?")?;
        let rec = Subcommand::find(subcommands, argv[subc].as_str())?;
        (rec.1)(self, argv, ctx)
    }

    //--------------------------------------------------------------------------------------------
    // Channels

    pub(crate) fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.chans.get_mut(name)
    }

    pub(crate) fn add_channel(&mut self, name: &str, chan: Channel) {
        self.chans.insert(name.to_string(), chan);
    }

    /// The next generated name for a file channel.
    pub(crate) fn next_file_channel(&mut self) -> String {
        let id = self.next_chan_id;
        self.next_chan_id += 1;
        format!("file{}", id)
    }

    //--------------------------------------------------------------------------------------------
    // Interpreter Configuration

    /// Gets the interpreter's recursion limit: how deep the stack of nested
    /// script evaluations may be.
    ///
    /// # Example
    /// ```
    /// # use tacl::Interp;
    /// let interp = Interp::<()>::new();
    /// assert_eq!(interp.recursion_limit(), 1000);
    /// ```
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Sets the interpreter's recursion limit.  The default is 1000.
    pub fn set_recursion_limit(&mut self, limit: usize) {
        self.recursion_limit = limit;
    }
}

impl Default for Interp<()> {
    fn default() -> Self {
        Interp::new()
    }
}

/// An entry in the interpreter's channel table.
pub(crate) enum Channel {
    Stdin,
    Stdout,
    Stderr,
    FileRead(BufReader<File>),
}

impl Channel {
    pub(crate) fn write_text(&mut self, text: &str, newline: bool) -> Result<(), Exception> {
        let result = match self {
            Channel::Stdout => {
                let mut out = io::stdout().lock();
                if newline {
                    writeln!(out, "{}", text)
                } else {
                    write!(out, "{}", text)
                }
            }
            Channel::Stderr => {
                let mut out = io::stderr().lock();
                if newline {
                    writeln!(out, "{}", text)
                } else {
                    write!(out, "{}", text)
                }
            }
            _ => return tacl_err!("channel wasn't opened for writing"),
        };
        result.map_err(|e| Exception::tacl_err(Value::from(e.to_string())))
    }

    /// Reads one line, without its terminator.  `None` means end of input.
    pub(crate) fn read_line(&mut self) -> Result<Option<String>, Exception> {
        let mut buf = String::new();
        let count = match self {
            Channel::Stdin => io::stdin().lock().read_line(&mut buf),
            Channel::FileRead(reader) => reader.read_line(&mut buf),
            _ => return tacl_err!("channel wasn't opened for reading"),
        }
        .map_err(|e| Exception::tacl_err(Value::from(e.to_string())))?;

        if count == 0 {
            return Ok(None);
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Ok(Some(buf))
    }

    pub(crate) fn flush(&mut self) -> Result<(), Exception> {
        let result = match self {
            Channel::Stdout => io::stdout().flush(),
            Channel::Stderr => io::stderr().flush(),
            _ => Ok(()),
        };
        result.map_err(|e| Exception::tacl_err(Value::from(e.to_string())))
    }
}

/// How a procedure is defined: as an argument list and a body script.  Each
/// retains its parsed form through the value cache.
///
/// NOTE: a procedure does not know its own name; the name exists only in
/// the command table and can be changed there freely.
pub(crate) struct Procedure {
    /// The parameter list.  Each item is a name or a name/default pair,
    /// verified by the `proc` command.
    pub(crate) parms: TaclList,

    /// The body, as a `Value` that caches its parsed script.
    pub(crate) body: Value,
}

impl Procedure {
    pub(crate) fn execute<Ctx>(
        &self,
        interp: &mut Interp<Ctx>,
        argv: &[Value],
        ctx: &mut Ctx,
    ) -> TaclResult {
        // FIRST, push the proc's local scope onto the stack.
        interp.push_scope();

        // NEXT, bind the arguments and evaluate the body.
        let result = self
            .bind_args(interp, argv)
            .and_then(|_| interp.eval_value(&self.body, ctx));

        // NEXT, pop the scope; we're done with it.
        interp.pop_scope();

        // NEXT, swallow a `return` at the procedure boundary; loop-control
        // signals escaping the body are errors here.
        match result {
            Err(exception) => match exception.code() {
                ResultCode::Return => Ok(exception.value()),
                ResultCode::Break => tacl_err!("invoked \"break\" outside of a loop"),
                ResultCode::Continue => tacl_err!("invoked \"continue\" outside of a loop"),
                _ => Err(exception),
            },
            ok => ok,
        }
    }

    fn bind_args<Ctx>(&self, interp: &mut Interp<Ctx>, argv: &[Value]) -> Result<(), Exception> {
        let mut argi = 1; // Skip the proc's name

        for (speci, spec) in self.parms.iter().enumerate() {
            let vec = spec.as_list()?;
            debug_assert!(vec.len() == 1 || vec.len() == 2);

            // "args" has special meaning only as the final spec: it
            // collects the remaining arguments as a list.
            if vec[0].as_str() == "args" && speci == self.parms.len() - 1 {
                interp.set_scalar("args", Value::from(&argv[argi..]))?;
                argi = argv.len();
                break;
            }

            if argi < argv.len() {
                interp.set_scalar(vec[0].as_str(), argv[argi].clone())?;
                argi += 1;
                continue;
            }

            if vec.len() == 2 {
                interp.set_scalar(vec[0].as_str(), vec[1].clone())?;
            } else {
                // Missing a required argument.
                return Err(self.wrong_num_args(&argv[0]));
            }
        }

        // Any arguments left over?
        if argi != argv.len() {
            return Err(self.wrong_num_args(&argv[0]));
        }

        Ok(())
    }

    // The wrong # args message for the proc.  The name is taken from the
    // call, because `rename` can change it.
    fn wrong_num_args(&self, name: &Value) -> Exception {
        let mut msg = String::new();
        msg.push_str("wrong # args: should be \"");
        msg.push_str(name.as_str());

        for (i, arg) in self.parms.iter().enumerate() {
            msg.push(' ');

            if arg.as_str() == "args" && i == self.parms.len() - 1 {
                msg.push_str("?arg ...?");
                break;
            }

            let vec = arg.as_list().expect("proc arglist was validated");

            if vec.len() == 1 {
                msg.push_str(vec[0].as_str());
            } else {
                msg.push('?');
                msg.push_str(vec[0].as_str());
                msg.push('?');
            }
        }
        msg.push('"');

        Exception::tacl_err(Value::from(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let interp = Interp::<()>::empty();
        assert!(interp.command_names().is_empty());
    }

    #[test]
    fn test_new() {
        let interp = Interp::<()>::new();
        assert!(!interp.command_names().is_empty());
        assert!(interp.has_command("set"));
        assert!(interp.has_command("proc"));
    }

    // Shows that the result matches the given exception.
    fn ex_match(r: &TaclResult, expected: Exception) -> bool {
        if let Err(e) = r {
            e.code() == expected.code() && e.value() == expected.value()
        } else {
            false
        }
    }

    #[test]
    fn test_eval() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();

        assert_eq!(interp.eval("set a 1", &mut glob_ctx), Ok(Value::from("1")));
        assert!(ex_match(
            &interp.eval("error 2", &mut glob_ctx),
            Exception::tacl_err(Value::from("2"))
        ));
        assert_eq!(interp.eval("return 3", &mut glob_ctx), Ok(Value::from("3")));
        assert!(ex_match(
            &interp.eval("break", &mut glob_ctx),
            Exception::tacl_err(Value::from("uncaught error: 3"))
        ));
        assert!(ex_match(
            &interp.eval("continue", &mut glob_ctx),
            Exception::tacl_err(Value::from("uncaught error: 4"))
        ));
    }

    #[test]
    fn test_command_not_found() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();
        assert!(ex_match(
            &interp.eval("nosuchcommand a b", &mut glob_ctx),
            Exception::tacl_err(Value::from("command not found: nosuchcommand"))
        ));
    }

    #[test]
    fn test_unknown_fallback() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();

        fn cmd_unknown(_: &mut Interp, argv: &[Value], _: &mut ()) -> TaclOptResult {
            // Receives the full word vector, including the unknown name.
            Ok(Some(Value::from(argv)))
        }
        interp.add_command("unknown", cmd_unknown);

        let result = interp.eval("nosuch a b", &mut glob_ctx).unwrap();
        assert_eq!(result.as_str(), "nosuch a b");
    }

    #[test]
    fn test_complete() {
        let interp = Interp::<()>::new();

        assert!(interp.complete("abc"));
        assert!(interp.complete("a {bc} [def] \"ghi\" xyz"));

        assert!(!interp.complete("a {bc"));
        assert!(!interp.complete("a [bc"));
        assert!(!interp.complete("a \"bc"));
    }

    #[test]
    fn test_expr() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();
        assert_eq!(
            interp.expr(&Value::from("1 + 2"), &mut glob_ctx),
            Ok(Value::from(3))
        );
        assert_eq!(
            interp.expr(&Value::from("a + b"), &mut glob_ctx),
            Err(Exception::tacl_err(Value::from(
                "expected integer but got \"a\""
            )))
        );
    }

    #[test]
    fn test_expr_bool() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();
        assert_eq!(interp.expr_bool(&Value::from("1"), &mut glob_ctx), Ok(true));
        assert_eq!(
            interp.expr_bool(&Value::from("0"), &mut glob_ctx),
            Ok(false)
        );
    }

    #[test]
    fn test_recursion_limit() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();

        assert_eq!(interp.recursion_limit(), 1000);
        interp.set_recursion_limit(100);
        assert_eq!(interp.recursion_limit(), 100);

        assert!(interp
            .eval("proc myproc {} { myproc }", &mut glob_ctx)
            .is_ok());
        assert!(ex_match(
            &interp.eval("myproc", &mut glob_ctx),
            Exception::tacl_err(Value::from(
                "too many nested calls to Interp::eval (infinite loop?)"
            ))
        ));
    }

    #[test]
    fn test_procs() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();

        interp
            .eval(
                "proc greet {name {greeting hello}} { list $greeting $name }",
                &mut glob_ctx,
            )
            .unwrap();

        assert_eq!(
            interp.eval("greet world", &mut glob_ctx).unwrap().as_str(),
            "hello world"
        );
        assert_eq!(
            interp
                .eval("greet world hey", &mut glob_ctx)
                .unwrap()
                .as_str(),
            "hey world"
        );
        assert!(ex_match(
            &interp.eval("greet", &mut glob_ctx),
            Exception::tacl_err(Value::from(
                "wrong # args: should be \"greet name ?greeting?\""
            ))
        ));
        assert!(ex_match(
            &interp.eval("greet a b c", &mut glob_ctx),
            Exception::tacl_err(Value::from(
                "wrong # args: should be \"greet name ?greeting?\""
            ))
        ));

        assert_eq!(interp.proc_names().len(), 1);
        assert_eq!(
            interp.proc_args("greet").unwrap().as_str(),
            "name greeting"
        );
        assert_eq!(
            interp.proc_default("greet", "greeting").unwrap(),
            Some(Value::from("hello"))
        );
        assert_eq!(interp.proc_default("greet", "name").unwrap(), None);
        assert!(interp.proc_body("greet").is_ok());
        assert!(interp.proc_body("set").is_err());
    }

    #[test]
    fn test_variadic_args() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();

        interp
            .eval("proc tail {first args} { return $args }", &mut glob_ctx)
            .unwrap();
        assert_eq!(
            interp.eval("tail a b c d", &mut glob_ctx).unwrap().as_str(),
            "b c d"
        );
        assert_eq!(interp.eval("tail a", &mut glob_ctx).unwrap().as_str(), "");
    }

    #[test]
    fn test_expand() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();

        interp.eval("set parts {b c d}", &mut glob_ctx).unwrap();
        assert_eq!(
            interp
                .eval("list a {*}$parts e", &mut glob_ctx)
                .unwrap()
                .as_str(),
            "a b c d e"
        );
    }

    #[test]
    fn test_rename() {
        let mut glob_ctx = ();
        let mut interp = Interp::new();

        interp.rename_command("expr", "=");
        let sum = interp.eval("= {1 + 1}", &mut glob_ctx).unwrap();
        assert_eq!(sum.as_int().unwrap(), 2);
        assert!(!interp.has_command("expr"));
    }
}
