//! REPL and script execution for the tacl command language.
//!
//! The two entry points are [`repl`], an interactive read-eval-print loop
//! with `rustyline` line editing, and [`script`], which executes a script
//! file given command-line style arguments.  Both work on an interpreter
//! the caller has created and configured, so applications can add their
//! own commands before handing control over.

use rustyline::{error::ReadlineError, history::MemHistory, Config, Editor};
use std::fs;
use tacl::{Interp, TaclInt, TaclList, Value};

/// Invokes an interactive REPL for the given interpreter.
///
/// The REPL prompts with `> `, echoes each non-empty result, and prefixes
/// errors with `Error:`.  Press `^C` or `^D` to terminate the loop,
/// returning control to the caller; entering `exit` normally terminates
/// the application (though the `exit` command can be removed or
/// redefined).
///
/// # Example
///
/// ```no_run
/// use tacl::Interp;
///
/// // FIRST, create and initialize the interpreter.
/// let mut glob_ctx = ();
/// let mut interp = Interp::new();
///
/// // NOTE: commands can be added to the interpreter here.
///
/// // NEXT, invoke the REPL.
/// tacl_shell::repl(&mut interp, &mut glob_ctx);
/// ```
pub fn repl<Ctx>(interp: &mut Interp<Ctx>, glob_ctx: &mut Ctx) {
    let mut rl = Editor::<(), MemHistory>::with_history(Config::default(), MemHistory::new())
        .expect("failed to init rustyline");

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    match interp.eval(line, glob_ctx) {
                        Ok(value) => {
                            if let Err(e) = rl.add_history_entry(line) {
                                eprintln!("History error: {e}");
                            }

                            // Don't echo empty values.
                            if !value.as_str().is_empty() {
                                println!("{}", value);
                            }
                        }
                        Err(exception) => {
                            println!("Error: {}", exception.value());
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("I/O Error: {:?}", err);
                break;
            }
        }
    }
}

/// Executes a script from a set of command line arguments.
///
/// `args[0]` is the name of a script file; subsequent arguments are passed
/// to the script through the `argv` variable.  On an error the message is
/// printed to stderr with an `Error:` prefix and the process exits with a
/// non-zero status.
///
/// # Example
///
/// ```no_run
/// use tacl::Interp;
/// use std::env;
///
/// let args: Vec<String> = env::args().collect();
///
/// let mut glob_ctx = ();
/// let mut interp = Interp::new();
///
/// if args.len() > 1 {
///     tacl_shell::script(&mut interp, &args[1..], &mut glob_ctx);
/// } else {
///     eprintln!("Usage: myshell filename.tcl");
/// }
/// ```
pub fn script<Ctx>(interp: &mut Interp<Ctx>, args: &[String], glob_ctx: &mut Ctx) {
    match fs::read_to_string(&args[0]) {
        Ok(text) => execute_script(interp, text, &args[0], &args[1..], glob_ctx),
        Err(e) => println!("{}", e),
    }
}

fn execute_script<Ctx>(
    interp: &mut Interp<Ctx>,
    script: String,
    argv0: &str,
    argv: &[String],
    ctx: &mut Ctx,
) {
    set_startup_vars(interp, argv0, argv, false);

    match interp.eval(&script, ctx) {
        Ok(_) => (),
        Err(exception) => {
            eprintln!("Error: {}", exception.value());
            std::process::exit(1);
        }
    }
}

/// Sets the variables scripts expect at startup: `argc`, `argv0`, `argv`,
/// and `tcl_interactive`.
pub fn set_startup_vars<Ctx>(
    interp: &mut Interp<Ctx>,
    argv0: &str,
    argv: &[String],
    interactive: bool,
) {
    let list: TaclList = argv.iter().map(Value::from).collect();
    interp
        .set_scalar("argc", Value::from(argv.len() as TaclInt))
        .expect("argc predefined as array!");
    interp
        .set_scalar("argv0", Value::from(argv0))
        .expect("argv0 predefined as array!");
    interp
        .set_scalar("argv", Value::from(list))
        .expect("argv predefined as array!");
    interp
        .set_scalar("tcl_interactive", Value::from(interactive))
        .expect("tcl_interactive predefined as array!");
}
