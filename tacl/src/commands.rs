//! The standard command set.
//!
//! Each command is a [`CommandFunc`]: it receives the full evaluated word
//! vector with the command name at `argv[0]`.  Control-flow commands signal
//! through [`Exception`] result codes rather than doing anything special
//! themselves; the loops here are the places those signals get consumed.

use crate::glob;
use crate::interp::{Channel, Interp, Procedure};
use crate::tacl_err;
use crate::types::*;
use crate::value::Value;
use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

/// The standard commands, minus the channel set.
pub(crate) fn commands<Ctx>() -> Vec<(&'static str, CommandFunc<Ctx>)> {
    vec![
        ("+", cmd_plus),
        ("-", cmd_minus),
        ("*", cmd_times),
        ("/", cmd_divide),
        ("==", cmd_int_eq),
        ("!=", cmd_int_ne),
        ("<", cmd_int_lt),
        ("<=", cmd_int_le),
        (">", cmd_int_gt),
        (">=", cmd_int_ge),
        ("eq", cmd_str_eq),
        ("ne", cmd_str_ne),
        ("apply", cmd_apply),
        ("break", cmd_break),
        ("catch", cmd_catch),
        ("concat", cmd_concat),
        ("continue", cmd_continue),
        ("error", cmd_error),
        ("eval", cmd_eval),
        ("exit", cmd_exit),
        ("expr", cmd_expr),
        ("flush", cmd_flush),
        ("for", cmd_for),
        ("foreach", cmd_foreach),
        ("gets", cmd_gets),
        ("global", cmd_global),
        ("if", cmd_if),
        ("incr", cmd_incr),
        ("info", cmd_info),
        ("lappend", cmd_lappend),
        ("lindex", cmd_lindex),
        ("list", cmd_list),
        ("llength", cmd_llength),
        ("lsearch", cmd_lsearch),
        ("open", cmd_open),
        ("proc", cmd_proc),
        ("puts", cmd_puts),
        ("rename", cmd_rename),
        ("return", cmd_return),
        ("set", cmd_set),
        ("source", cmd_source),
        ("split", cmd_split),
        ("string", cmd_string),
        ("time", cmd_time),
        ("unset", cmd_unset),
        ("uplevel", cmd_uplevel),
        ("upvar", cmd_upvar),
        ("while", cmd_while),
    ]
}

//------------------------------------------------------------------------------------------------
// Variables

/// set varName ?newValue?
pub fn cmd_set<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 3, "varName ?newValue?")?;

    if argv.len() == 3 {
        Ok(Some(interp.set_var_return(&argv[1], argv[2].clone())?))
    } else {
        Ok(Some(interp.var(&argv[1])?))
    }
}

/// unset varName
pub fn cmd_unset<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 2, "varName")?;
    interp.unset_var(&argv[1]);
    Ok(None)
}

/// incr varName ?increment?: a missing variable starts at 0.
pub fn cmd_incr<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 3, "varName ?increment?")?;

    let increment = if argv.len() == 3 { argv[2].as_int()? } else { 1 };
    let current = match interp.var(&argv[1]) {
        Ok(value) => value.as_int()?,
        Err(_) => 0,
    };
    Ok(Some(interp.set_var_return(
        &argv[1],
        Value::from(current.wrapping_add(increment)),
    )?))
}

/// global varName ?varName ...?
pub fn cmd_global<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 0, "varName ?varName ...?")?;

    // A no-op at the global scope; a link to itself would be a cycle.
    if interp.scope_level() > 0 {
        for name in &argv[1..] {
            interp.upvar(0, name.as_str(), name.as_str());
        }
    }
    Ok(None)
}

/// upvar ?level? otherVar myVar
pub fn cmd_upvar<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 4, "?level? otherVar myVar")?;

    let mut args = &argv[1..];
    let mut level: TaclInt = 1;
    if args.len() == 3 {
        level = args[0].as_int()?;
        args = &args[1..];
    }

    let target = interp.scope_level().saturating_sub(level.max(0) as usize);
    interp.upvar(target, args[0].as_str(), args[1].as_str());
    Ok(None)
}

//------------------------------------------------------------------------------------------------
// Control flow

/// return ?value?
pub fn cmd_return<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 1, 2, "?value?")?;
    let value = argv.get(1).cloned().unwrap_or_default();
    Err(Exception::tacl_return(value))
}

/// break
pub fn cmd_break<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 1, 1, "")?;
    Err(Exception::tacl_break())
}

/// continue
pub fn cmd_continue<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(1, argv, 1, 1, "")?;
    Err(Exception::tacl_continue())
}

/// error message
pub fn cmd_error<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 2, "message")?;
    Err(Exception::tacl_err(argv[1].clone()))
}

/// catch script ?resultVarName?: always returns the numeric result code,
/// consuming whatever the body signalled.
pub fn cmd_catch<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 3, "script ?resultVarName?")?;

    let result = interp.eval_value(&argv[1], ctx);
    let code = match &result {
        Ok(_) => ResultCode::Okay,
        Err(e) => e.code(),
    };

    if argv.len() == 3 {
        let captured = match &result {
            Ok(value) => value.clone(),
            Err(e) if e.is_error() => e.value(),
            Err(_) => Value::empty(),
        };
        interp.set_var(&argv[2], captured)?;
    }

    Ok(Some(Value::from(code.as_int())))
}

/// if test ?then? script ?else? ?script?
pub fn cmd_if<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 0, "test ?then? script ?else? ?script?")?;

    let test = &argv[1];
    let mut rest = &argv[2..];

    if rest[0].as_str() == "then" {
        rest = &rest[1..];
        if rest.is_empty() {
            return tacl_err!("wrong # args: no script following \"then\" argument");
        }
    }
    let body = &rest[0];
    rest = &rest[1..];

    let mut else_block = None;
    if !rest.is_empty() {
        if rest[0].as_str() == "else" {
            if rest.len() == 1 {
                return tacl_err!("wrong # args: no script following \"else\" argument");
            }
            rest = &rest[1..];
        }
        else_block = Some(&rest[0]);
    }

    if interp.expr_bool(test, ctx)? {
        Ok(Some(interp.eval_value(body, ctx)?))
    } else if let Some(else_body) = else_block {
        Ok(Some(interp.eval_value(else_body, ctx)?))
    } else {
        Ok(None)
    }
}

/// while test command
pub fn cmd_while<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "test command")?;

    while interp.expr_bool(&argv[1], ctx)? {
        match interp.eval_value(&argv[2], ctx) {
            Ok(_) => (),
            Err(e) => match e.code() {
                ResultCode::Break => break,
                ResultCode::Continue => continue,
                _ => return Err(e),
            },
        }
    }
    Ok(None)
}

/// for start test next command
pub fn cmd_for<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 5, 5, "start test next command")?;

    interp.eval_value(&argv[1], ctx)?;
    while interp.expr_bool(&argv[2], ctx)? {
        match interp.eval_value(&argv[4], ctx) {
            Ok(_) => (),
            Err(e) => match e.code() {
                ResultCode::Break => break,
                ResultCode::Continue => (),
                _ => return Err(e),
            },
        }
        interp.eval_value(&argv[3], ctx)?;
    }
    Ok(None)
}

/// foreach varList list command: iterates the list in chunks the size of
/// the variable list, stopping when fewer items remain than variables.
pub fn cmd_foreach<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 4, 4, "varList list command")?;

    let vlist = argv[1].as_list()?;
    let items = argv[2].as_list()?;
    let chunk = vlist.len();
    if chunk == 0 {
        return tacl_err!("foreach varlist is empty");
    }

    let mut i = 0;
    while i + chunk <= items.len() {
        for (k, var) in vlist.iter().enumerate() {
            interp.set_var(var, items[i + k].clone())?;
        }
        i += chunk;

        match interp.eval_value(&argv[3], ctx) {
            Ok(_) => (),
            Err(e) => match e.code() {
                ResultCode::Break => break,
                ResultCode::Continue => continue,
                _ => return Err(e),
            },
        }
    }
    Ok(None)
}

//------------------------------------------------------------------------------------------------
// Procedures

/// proc name args body
pub fn cmd_proc<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 4, 4, "name args body")?;

    let parms = argv[2].as_list()?;
    for spec in parms.iter() {
        let vec = spec.as_list()?;
        if vec.is_empty() || vec[0].as_str().is_empty() {
            return tacl_err!("argument with no name");
        }
        if vec.len() > 2 {
            return tacl_err!("too many fields in argument specifier \"{}\"", spec.as_str());
        }
    }

    interp.add_proc(argv[1].as_str(), parms.as_slice(), &argv[3]);
    Ok(None)
}

/// apply lambdaExpr ?arg ...?: the lambda is a two-element list of
/// parameters and body, run like an anonymous procedure.
pub fn cmd_apply<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 0, "lambdaExpr ?arg ...?")?;

    let lambda = argv[1].as_list()?;
    if lambda.len() != 2 {
        return tacl_err!("invalid lambda");
    }
    let parms = lambda[0].as_list()?;
    for spec in parms.iter() {
        let vec = spec.as_list()?;
        if vec.is_empty() || vec[0].as_str().is_empty() || vec.len() > 2 {
            return tacl_err!("invalid lambda");
        }
    }

    let proc = Procedure {
        parms: parms.as_slice().to_vec(),
        body: lambda[1].clone(),
    };
    // The lambda itself stands in the name position for error messages.
    Ok(Some(proc.execute(interp, &argv[1..], ctx)?))
}

/// rename oldName newName: renaming to "" deletes the command.
pub fn cmd_rename<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "oldName newName")?;

    let old_name = argv[1].as_str();
    let new_name = argv[2].as_str();

    if !interp.has_command(old_name) {
        return if new_name.is_empty() {
            tacl_err!("can't delete command, doesn't exist")
        } else {
            tacl_err!("can't rename command, doesn't exist")
        };
    }

    if new_name.is_empty() {
        interp.remove_command(old_name);
    } else {
        interp.rename_command(old_name, new_name);
    }
    Ok(None)
}

//------------------------------------------------------------------------------------------------
// Evaluation

/// eval arg ?arg ...?
pub fn cmd_eval<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 0, "arg ?arg ...?")?;

    if argv.len() == 2 {
        Ok(Some(interp.eval_value(&argv[1], ctx)?))
    } else {
        Ok(Some(interp.eval_value(&concat_values(&argv[1..]), ctx)?))
    }
}

/// expr arg ?arg ...?
pub fn cmd_expr<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 0, "arg ?arg ...?")?;

    if argv.len() == 2 {
        Ok(Some(interp.expr(&argv[1], ctx)?))
    } else {
        Ok(Some(interp.expr(&concat_values(&argv[1..]), ctx)?))
    }
}

/// uplevel command: evaluates the command in the caller's scope.
pub fn cmd_uplevel<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 2, "command")?;
    Ok(Some(interp.eval_in_parent(&argv[1], ctx)?))
}

/// concat ?arg ...?
pub fn cmd_concat<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    Ok(Some(concat_values(&argv[1..])))
}

pub(crate) fn concat_values(values: &[Value]) -> Value {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(value.as_str().trim());
    }
    Value::from(out)
}

/// source fileName
pub fn cmd_source<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 2, "fileName")?;

    let text = match std::fs::read_to_string(argv[1].as_str()) {
        Ok(text) => text,
        Err(e) => return tacl_err!("{}", e),
    };
    Ok(Some(interp.eval_value(&Value::from(text), ctx)?))
}

/// exit ?returnCode?
pub fn cmd_exit<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 1, 2, "?returnCode?")?;
    let code = match argv.get(1) {
        Some(value) => value.as_int()?,
        None => 0,
    };
    std::process::exit(code as i32);
}

/// time command ?count?
pub fn cmd_time<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 3, "command ?count?")?;

    if argv.len() == 2 {
        let start = Instant::now();
        interp.eval_value(&argv[1], ctx)?;
        Ok(Some(Value::from(format_time(start.elapsed().as_nanos()))))
    } else {
        let count = argv[2].as_int()?;
        if count <= 0 {
            return tacl_err!("count must be positive");
        }
        let start = Instant::now();
        for _ in 0..count {
            interp.eval_value(&argv[1], ctx)?;
        }
        let avg = start.elapsed().as_nanos() / count as u128;
        Ok(Some(Value::from(format!(
            "{} per iteration",
            format_time(avg)
        ))))
    }
}

fn format_time(nanos: u128) -> String {
    let micros = nanos as f64 / 1000.0;
    if micros < 1000.0 {
        format!("{} µs", micros)
    } else {
        format!("{} ms", micros / 1000.0)
    }
}

//------------------------------------------------------------------------------------------------
// Lists

/// list ?value ...?
pub fn cmd_list<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    Ok(Some(Value::from(argv[1..].to_vec())))
}

/// llength list
pub fn cmd_llength<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 2, "list")?;
    Ok(Some(Value::from(argv[1].as_list()?.len() as TaclInt)))
}

/// lindex list index
pub fn cmd_lindex<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "list index")?;

    let list = argv[1].as_list()?;
    let index = argv[2].as_int()?;
    if index < 0 || index as usize >= list.len() {
        return tacl_err!("out of bounds");
    }
    Ok(Some(list[index as usize].clone()))
}

/// lappend varName ?value ...?: creates the variable if missing.
pub fn cmd_lappend<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 0, "varName ?value ...?")?;

    let mut items: TaclList = match interp.var(&argv[1]) {
        Ok(value) => value.as_list()?.as_slice().to_vec(),
        Err(_) => Vec::new(),
    };
    items.extend(argv[2..].iter().cloned());

    Ok(Some(interp.set_var_return(&argv[1], Value::from(items))?))
}

/// lsearch list value: exact matching; returns the index or -1.
pub fn cmd_lsearch<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "list value")?;

    let list = argv[1].as_list()?;
    let needle = argv[2].as_str();
    for (i, item) in list.iter().enumerate() {
        if item.as_str() == needle {
            return Ok(Some(Value::from(i as TaclInt)));
        }
    }
    Ok(Some(Value::from(-1)))
}

/// split string ?splitChars?: an empty splitChars splits into characters.
pub fn cmd_split<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 3, "string ?splitChars?")?;

    let text = argv[1].as_str();
    let parts: TaclList = if argv.len() == 2 {
        text.split(char::is_whitespace).map(Value::from).collect()
    } else {
        let chars = argv[2].as_str();
        if chars.is_empty() {
            text.chars().map(|ch| Value::from(ch.to_string())).collect()
        } else {
            text.split(|ch| chars.contains(ch)).map(Value::from).collect()
        }
    };
    Ok(Some(Value::from(parts)))
}

//------------------------------------------------------------------------------------------------
// Channels

/// puts ?-nonewline? ?channelId? string
pub fn cmd_puts<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 4, "?-nonewline? ?channelId? string")?;

    let mut args = &argv[1..];
    let mut newline = true;
    if args.len() > 1 && args[0].as_str() == "-nonewline" {
        newline = false;
        args = &args[1..];
    }

    let (chan_name, text) = match args.len() {
        1 => ("stdout", args[0].as_str()),
        2 => (args[0].as_str(), args[1].as_str()),
        _ => return tacl_err!("wrong # args: should be \"puts ?-nonewline? ?channelId? string\""),
    };

    match interp.channel_mut(chan_name) {
        Some(chan) => {
            chan.write_text(text, newline)?;
            Ok(None)
        }
        None => tacl_err!("invalid channel: {}", chan_name),
    }
}

/// gets channelId ?varName?: with a variable, returns the line length or
/// -1 at end of input.
pub fn cmd_gets<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 3, "channelId ?varName?")?;

    let name = argv[1].as_str();
    let line = match interp.channel_mut(name) {
        Some(chan) => chan.read_line()?,
        None => return tacl_err!("invalid channel: {}", name),
    };

    if argv.len() == 3 {
        match line {
            Some(text) => {
                let len = text.chars().count() as TaclInt;
                interp.set_var(&argv[2], Value::from(text))?;
                Ok(Some(Value::from(len)))
            }
            None => {
                interp.set_var(&argv[2], Value::empty())?;
                Ok(Some(Value::from(-1)))
            }
        }
    } else {
        Ok(Some(line.map(Value::from).unwrap_or_default()))
    }
}

/// flush channelId
pub fn cmd_flush<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 2, "channelId")?;

    match interp.channel_mut(argv[1].as_str()) {
        Some(chan) => {
            chan.flush()?;
            Ok(None)
        }
        None => tacl_err!("no such channel"),
    }
}

/// open fileName: read-only; returns the generated channel name.
pub fn cmd_open<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 2, "fileName")?;

    let file = match File::open(argv[1].as_str()) {
        Ok(file) => file,
        Err(e) => return tacl_err!("{}", e),
    };
    let name = interp.next_file_channel();
    interp.add_channel(&name, Channel::FileRead(BufReader::new(file)));
    Ok(Some(Value::from(name)))
}

//------------------------------------------------------------------------------------------------
// Ensembles

/// info subcommand ?arg ...?
pub fn cmd_info<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    let subcommands: [Subcommand<Ctx>; 4] = [
        Subcommand("commands", cmd_info_commands),
        Subcommand("exists", cmd_info_exists),
        Subcommand("globals", cmd_info_globals),
        Subcommand("vars", cmd_info_vars),
    ];
    interp.call_subcommand(argv, 1, &subcommands, ctx)
}

fn cmd_info_exists<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(2, argv, 3, 3, "varName")?;
    Ok(Some(Value::from(interp.var_exists(&argv[2]))))
}

fn cmd_info_vars<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from(interp.vars_in_scope())))
}

fn cmd_info_globals<Ctx>(
    interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from(interp.vars_in_global_scope())))
}

fn cmd_info_commands<Ctx>(
    interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from(interp.command_names())))
}

/// string subcommand ?arg ...?
pub fn cmd_string<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    let subcommands: [Subcommand<Ctx>; 5] = [
        Subcommand("bytelength", cmd_string_bytelength),
        Subcommand("index", cmd_string_index),
        Subcommand("length", cmd_string_length),
        Subcommand("match", cmd_string_match),
        Subcommand("trim", cmd_string_trim),
    ];
    interp.call_subcommand(argv, 1, &subcommands, ctx)
}

fn cmd_string_length<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(2, argv, 3, 3, "string")?;
    Ok(Some(Value::from(argv[2].as_str().chars().count() as TaclInt)))
}

fn cmd_string_bytelength<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(2, argv, 3, 3, "string")?;
    Ok(Some(Value::from(argv[2].as_str().len() as TaclInt)))
}

fn cmd_string_trim<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(2, argv, 3, 3, "string")?;
    Ok(Some(Value::from(argv[2].as_str().trim())))
}

fn cmd_string_match<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(2, argv, 4, 4, "pattern string")?;
    Ok(Some(Value::from(glob::glob_match(
        argv[2].as_str(),
        argv[3].as_str(),
    ))))
}

fn cmd_string_index<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(2, argv, 4, 4, "string charIndex")?;

    let text = argv[2].as_str();
    let index = match argv[3].as_int() {
        Ok(index) => index,
        Err(e) => {
            if argv[3].as_str() == "end" {
                text.chars().count() as TaclInt - 1
            } else {
                return Err(e);
            }
        }
    };

    if index < 0 {
        return Ok(Some(Value::empty()));
    }
    Ok(Some(match text.chars().nth(index as usize) {
        Some(ch) => Value::from(ch.to_string()),
        None => Value::empty(),
    }))
}

//------------------------------------------------------------------------------------------------
// Operators as commands

/// + a b
pub fn cmd_plus<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(
        argv[1].as_int()?.wrapping_add(argv[2].as_int()?),
    )))
}

/// - a b
pub fn cmd_minus<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(
        argv[1].as_int()?.wrapping_sub(argv[2].as_int()?),
    )))
}

/// * a b
pub fn cmd_times<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(
        argv[1].as_int()?.wrapping_mul(argv[2].as_int()?),
    )))
}

/// / a b
pub fn cmd_divide<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    let a = argv[1].as_int()?;
    let b = argv[2].as_int()?;
    if b == 0 {
        return tacl_err!("divide by zero");
    }
    Ok(Some(Value::from(a.wrapping_div(b))))
}

fn cmd_int_eq<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_int()? == argv[2].as_int()?)))
}

fn cmd_int_ne<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_int()? != argv[2].as_int()?)))
}

fn cmd_int_lt<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_int()? < argv[2].as_int()?)))
}

fn cmd_int_le<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_int()? <= argv[2].as_int()?)))
}

fn cmd_int_gt<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_int()? > argv[2].as_int()?)))
}

fn cmd_int_ge<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_int()? >= argv[2].as_int()?)))
}

fn cmd_str_eq<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_str() == argv[2].as_str())))
}

fn cmd_str_ne<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 3, 3, "a b")?;
    Ok(Some(Value::from(argv[1].as_str() != argv[2].as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(interp: &mut Interp<()>, script: &str) -> TaclResult {
        let mut ctx = ();
        interp.eval(script, &mut ctx)
    }

    fn eval_ok(interp: &mut Interp<()>, script: &str) -> String {
        match eval(interp, script) {
            Ok(value) => value.as_str().to_string(),
            Err(e) => panic!("{:?} failed: {}", script, e.value()),
        }
    }

    #[test]
    fn test_set() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "set a 1"), "1");
        assert_eq!(eval_ok(&mut interp, "set a"), "1");
        assert_eq!(
            eval(&mut interp, "set b").unwrap_err().value().as_str(),
            "variable not found: b"
        );
        assert_eq!(
            eval(&mut interp, "set").unwrap_err().value().as_str(),
            "wrong # args: should be \"set varName ?newValue?\""
        );
    }

    #[test]
    fn test_set_with_braced_name() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "set {a b c} 44"), "44");
        assert_eq!(eval_ok(&mut interp, "return ${a b c}"), "44");
    }

    #[test]
    fn test_arrays() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "set a(1) x"), "x");
        assert_eq!(eval_ok(&mut interp, "set a(2) y"), "y");
        assert_eq!(eval_ok(&mut interp, "set a(1)"), "x");
        assert_eq!(eval_ok(&mut interp, "return $a(2)"), "y");

        // The index is a word of its own, evaluated at reference time.
        assert_eq!(eval_ok(&mut interp, "set k 2; return $a($k)"), "y");

        assert_eq!(eval_ok(&mut interp, "unset a(1); info exists a(1)"), "0");
        assert_eq!(eval_ok(&mut interp, "info exists a(2)"), "1");
    }

    #[test]
    fn test_unset_and_exists() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set x 1");
        assert_eq!(eval_ok(&mut interp, "info exists x"), "1");
        eval_ok(&mut interp, "unset x");
        assert_eq!(eval_ok(&mut interp, "info exists x"), "0");
        // Unsetting a missing variable is not an error.
        eval_ok(&mut interp, "unset x");
    }

    #[test]
    fn test_incr() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "set i 5; incr i"), "6");
        assert_eq!(eval_ok(&mut interp, "incr i 10"), "16");
        assert_eq!(eval_ok(&mut interp, "incr i -1"), "15");
        // A missing variable starts at zero.
        assert_eq!(eval_ok(&mut interp, "incr fresh 3"), "3");
    }

    #[test]
    fn test_if() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "if {1 < 2} {set r yes}"), "yes");
        assert_eq!(eval_ok(&mut interp, "if {1 > 2} {set r yes}"), "");
        assert_eq!(
            eval_ok(&mut interp, "if {1 > 2} {set r yes} {set r no}"),
            "no"
        );
        assert_eq!(
            eval_ok(&mut interp, "if {0} then {set r yes} else {set r no}"),
            "no"
        );
    }

    #[test]
    fn test_while() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(&mut interp, "set i 0; while {$i < 5} {incr i}; set i"),
            "5"
        );
        assert_eq!(
            eval_ok(
                &mut interp,
                "set i 0; while {1} {incr i; if {$i >= 3} {break}}; set i"
            ),
            "3"
        );
        assert_eq!(
            eval_ok(
                &mut interp,
                "set n 0
                 set i 0
                 while {$i < 5} {
                     incr i
                     if {$i == 2} {continue}
                     incr n
                 }
                 set n"
            ),
            "4"
        );
    }

    #[test]
    fn test_for() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(
                &mut interp,
                "set sum 0; for {set i 0} {$i < 5} {incr i} {incr sum $i}; set sum"
            ),
            "10"
        );
    }

    #[test]
    fn test_foreach() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(&mut interp, "foreach x {1 2 3} {lappend out $x}; set out"),
            "1 2 3"
        );

        // Chunked binding; the final partial chunk is dropped.
        assert_eq!(
            eval_ok(
                &mut interp,
                "foreach {a b} {1 2 3 4 5} {lappend pairs [list $a $b]}; set pairs"
            ),
            "{1 2} {3 4}"
        );

        assert_eq!(
            eval(&mut interp, "foreach {} {1 2} {set x 1}")
                .unwrap_err()
                .value()
                .as_str(),
            "foreach varlist is empty"
        );
    }

    #[test]
    fn test_catch() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "catch {set x 5} msg"), "0");
        assert_eq!(eval_ok(&mut interp, "set msg"), "5");

        assert_eq!(eval_ok(&mut interp, "catch {error boom} msg"), "1");
        assert_eq!(eval_ok(&mut interp, "set msg"), "boom");

        assert_eq!(eval_ok(&mut interp, "catch {return r} msg"), "2");
        assert_eq!(eval_ok(&mut interp, "catch {break}"), "3");
        assert_eq!(eval_ok(&mut interp, "catch {continue}"), "4");
    }

    #[test]
    fn test_error() {
        let mut interp = Interp::new();
        let e = eval(&mut interp, "error boom").unwrap_err();
        assert!(e.is_error());
        assert_eq!(e.value().as_str(), "boom");
    }

    #[test]
    fn test_list_commands() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "set L {1 2 3 4 5}; llength $L"), "5");
        assert_eq!(eval_ok(&mut interp, "lindex $L 2"), "3");
        assert_eq!(
            eval(&mut interp, "lindex $L 9").unwrap_err().value().as_str(),
            "out of bounds"
        );
        assert_eq!(eval_ok(&mut interp, "list a {b c} d"), "a {b c} d");
        assert_eq!(eval_ok(&mut interp, "llength [list]"), "0");
        assert_eq!(eval_ok(&mut interp, "lsearch {a b c} b"), "1");
        assert_eq!(eval_ok(&mut interp, "lsearch {a b c} z"), "-1");
        assert_eq!(eval_ok(&mut interp, "lappend fresh a b"), "a b");
        assert_eq!(eval_ok(&mut interp, "lappend fresh {c d}"), "a b {c d}");
    }

    #[test]
    fn test_split_and_concat() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "split \"a b c\""), "a b c");
        assert_eq!(eval_ok(&mut interp, "split a,b,,c ,"), "a b {} c");
        assert_eq!(eval_ok(&mut interp, "split abc {}"), "a b c");
        assert_eq!(eval_ok(&mut interp, "concat a {b c}  d"), "a b c d");
        assert_eq!(eval_ok(&mut interp, "concat \"  a  \" b"), "a b");
    }

    #[test]
    fn test_string_ensemble() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "string length hello"), "5");
        assert_eq!(eval_ok(&mut interp, "string length λλ"), "2");
        assert_eq!(eval_ok(&mut interp, "string bytelength λλ"), "4");
        assert_eq!(eval_ok(&mut interp, "string trim \"  hi  \""), "hi");
        assert_eq!(eval_ok(&mut interp, "string match c?t cat"), "1");
        assert_eq!(eval_ok(&mut interp, "string match c?t dog"), "0");
        assert_eq!(eval_ok(&mut interp, "string index hello 1"), "e");
        assert_eq!(eval_ok(&mut interp, "string index hello end"), "o");
        assert_eq!(eval_ok(&mut interp, "string index hello 99"), "");

        let e = eval(&mut interp, "string bogus x").unwrap_err();
        assert_eq!(
            e.value().as_str(),
            "unknown or ambiguous subcommand \"bogus\". Must be bytelength, index, length, match, or trim."
        );
    }

    #[test]
    fn test_info_ensemble() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set visible 1");
        assert_eq!(eval_ok(&mut interp, "info exists visible"), "1");
        assert_eq!(eval_ok(&mut interp, "info exists hidden"), "0");

        let vars = eval_ok(&mut interp, "info vars");
        assert!(vars.contains("visible"));

        let cmds = eval_ok(&mut interp, "info commands");
        assert!(cmds.contains("set"));
        assert!(cmds.contains("foreach"));
    }

    #[test]
    fn test_operator_commands() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "+ 1 1"), "2");
        assert_eq!(eval_ok(&mut interp, "- 5 7"), "-2");
        assert_eq!(eval_ok(&mut interp, "* 6 7"), "42");
        assert_eq!(eval_ok(&mut interp, "/ 7 2"), "3");
        assert_eq!(eval_ok(&mut interp, "== 2 2"), "1");
        assert_eq!(eval_ok(&mut interp, "!= 2 2"), "0");
        assert_eq!(eval_ok(&mut interp, "< 1 2"), "1");
        assert_eq!(eval_ok(&mut interp, "eq abc abc"), "1");
        assert_eq!(eval_ok(&mut interp, "ne abc abd"), "1");
        assert_eq!(
            eval(&mut interp, "/ 1 0").unwrap_err().value().as_str(),
            "divide by zero"
        );
    }

    #[test]
    fn test_eval_and_expr_commands() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "eval {set x 3}"), "3");
        assert_eq!(eval_ok(&mut interp, "eval set y 4"), "4");
        assert_eq!(eval_ok(&mut interp, "expr {1 + 2 * 3}"), "7");
        assert_eq!(eval_ok(&mut interp, "expr 1 + 2"), "3");
        assert_eq!(eval_ok(&mut interp, "set v 5; expr {$v == 5}"), "1");
    }

    #[test]
    fn test_apply() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "apply {{a b} {+ $a $b}} 3 4"), "7");
        assert_eq!(
            eval(&mut interp, "apply {x} 1").unwrap_err().value().as_str(),
            "invalid lambda"
        );
    }

    #[test]
    fn test_uplevel() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(
                &mut interp,
                "proc setter {} { uplevel {set here 1} }
                 setter
                 info exists here"
            ),
            "1"
        );
    }

    #[test]
    fn test_upvar() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(
                &mut interp,
                "proc plus2 {varname} { upvar $varname v; incr v 2 }
                 set count 3
                 plus2 count
                 set count"
            ),
            "5"
        );
    }

    #[test]
    fn test_global() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(
                &mut interp,
                "set g 1
                 proc bump {} { global g; incr g }
                 bump
                 bump
                 set g"
            ),
            "3"
        );
    }

    #[test]
    fn test_global_via_qualifier() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(
                &mut interp,
                "set g 10
                 proc read_it {} { return $::g }
                 read_it"
            ),
            "10"
        );
        assert_eq!(
            eval_ok(
                &mut interp,
                "proc write_it {} { set ::g 20 }
                 write_it
                 set g"
            ),
            "20"
        );
    }

    #[test]
    fn test_rename_command() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "proc hi {} {return hello}");
        assert_eq!(eval_ok(&mut interp, "rename hi greet; greet"), "hello");
        assert!(eval(&mut interp, "hi").is_err());

        eval_ok(&mut interp, "rename greet \"\"");
        assert!(eval(&mut interp, "greet").is_err());

        assert_eq!(
            eval(&mut interp, "rename nope \"\"").unwrap_err().value().as_str(),
            "can't delete command, doesn't exist"
        );
    }

    #[test]
    fn test_time() {
        let mut interp = Interp::new();
        let report = eval_ok(&mut interp, "time {set x 1}");
        assert!(report.contains("µs") || report.contains("ms"));
        let report = eval_ok(&mut interp, "time {set x 1} 10");
        assert!(report.ends_with("per iteration"));
    }
}
