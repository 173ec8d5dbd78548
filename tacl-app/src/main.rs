//! The tacl shell: `tacl [script.tcl ?arg ...?]`.
//!
//! With a script path, executes it and exits; without one, enters the
//! interactive REPL.

use std::env;
use tacl::Interp;

fn main() {
    // --nogc is accepted for compatibility with hosts whose runtime has a
    // collector to tune; this one doesn't.
    let args: Vec<String> = env::args().skip(1).filter(|arg| arg != "--nogc").collect();

    let mut glob_ctx = ();
    let mut interp = Interp::new();

    if args.is_empty() {
        let argv0 = env::args().next().unwrap_or_else(|| "tacl".to_string());
        tacl_shell::set_startup_vars(&mut interp, &argv0, &[], true);
        tacl_shell::repl(&mut interp, &mut glob_ctx);
    } else {
        tacl_shell::script(&mut interp, &args, &mut glob_ctx);
    }
}
