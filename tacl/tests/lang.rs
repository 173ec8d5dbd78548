//! End-to-end language tests driving the public API with real scripts.

use tacl::types::*;
use tacl::{Interp, Value};

fn eval(interp: &mut Interp<()>, script: &str) -> TaclResult {
    let mut ctx = ();
    interp.eval(script, &mut ctx)
}

fn eval_ok(interp: &mut Interp<()>, script: &str) -> String {
    match eval(interp, script) {
        Ok(value) => value.as_str().to_string(),
        Err(e) => panic!("script failed: {}\nscript was: {}", e.value(), script),
    }
}

#[test]
fn test_sum_loop_in_proc() {
    let mut interp = Interp::new();
    let script = "
proc sumto max {
    set sum 0
    for {set i 0} {$i < $max} {incr i} {
        incr sum $i
    }
    return $sum
}
sumto 5000";
    assert_eq!(eval_ok(&mut interp, script), "12497500");
}

#[test]
fn test_return_stops_proc_body() {
    let mut interp = Interp::new();
    let script = "
proc say_hello {} {
    return 5
    error {This should not be reached!}
}
set v [say_hello]
expr {$v == 5}";
    assert_eq!(eval_ok(&mut interp, script), "1");
}

#[test]
fn test_list_access() {
    let mut interp = Interp::new();
    eval_ok(&mut interp, "set L {1 2 3 4 5}");
    assert_eq!(eval_ok(&mut interp, "llength $L"), "5");
    assert_eq!(eval_ok(&mut interp, "lindex $L 2"), "3");
}

#[test]
fn test_catch_stores_message() {
    let mut interp = Interp::new();
    assert_eq!(eval_ok(&mut interp, "catch {error boom} msg"), "1");
    assert_eq!(eval_ok(&mut interp, "set msg"), "boom");
}

#[test]
fn test_variable_names_with_spaces() {
    let mut interp = Interp::new();
    let script = "
set {a b c} 44
return ${a b c}";
    assert_eq!(eval_ok(&mut interp, script), "44");

    let script = r#"set msg "It is ${a b c}.""#;
    assert_eq!(eval_ok(&mut interp, script), "It is 44.");
}

#[test]
fn test_foreach_chunked() {
    let mut interp = Interp::new();
    let script = "
foreach {x y} {1 2 3 4} { incr sum $x }
set sum";
    assert_eq!(eval_ok(&mut interp, script), "4");
}

#[test]
fn test_interpolation_and_subcommands() {
    let mut interp = Interp::new();
    assert_eq!(
        eval_ok(&mut interp, r#"concat "Hi" " Mom!""#),
        "Hi Mom!"
    );
    eval_ok(&mut interp, "set x 95");
    assert_eq!(
        eval_ok(&mut interp, r#"set out "Number: $x yay""#),
        "Number: 95 yay"
    );
    assert_eq!(
        eval_ok(&mut interp, r#"set out "10 plus 10 is [+ 10 10]!""#),
        "10 plus 10 is 20!"
    );
    assert_eq!(eval_ok(&mut interp, r#"set x "foo[]bar""#), "foobar");
}

#[test]
fn test_comments_are_skipped() {
    let mut interp = Interp::new();
    let script = "
set x 1
# set x 2
set x";
    assert_eq!(eval_ok(&mut interp, script), "1");
}

#[test]
fn test_loop_control_outside_proc_boundary() {
    let mut interp = Interp::new();

    // A procedure boundary turns an escaped break into an error...
    eval_ok(&mut interp, "proc escapee {} { break }");
    let e = eval(&mut interp, "escapee").unwrap_err();
    assert_eq!(e.value().as_str(), "invoked \"break\" outside of a loop");

    // ...which a loop around the call does not consume.
    let e = eval(&mut interp, "while {1} { escapee }").unwrap_err();
    assert_eq!(e.value().as_str(), "invoked \"break\" outside of a loop");

    // At the script top the raw signal number surfaces.
    let e = eval(&mut interp, "break").unwrap_err();
    assert_eq!(e.value().as_str(), "uncaught error: 3");
    let e = eval(&mut interp, "continue").unwrap_err();
    assert_eq!(e.value().as_str(), "uncaught error: 4");
}

#[test]
fn test_return_at_top_level_yields_value() {
    let mut interp = Interp::new();
    assert_eq!(eval_ok(&mut interp, "return 7"), "7");
    assert_eq!(eval_ok(&mut interp, "return"), "");
}

#[test]
fn test_nested_procs_and_defaults() {
    let mut interp = Interp::new();
    let script = "
proc clamp {value {low 0} {high 100}} {
    if {$value < $low} { return $low }
    if {$value > $high} { return $high }
    return $value
}
list [clamp -5] [clamp 42] [clamp 200] [clamp 7 5 6]";
    assert_eq!(eval_ok(&mut interp, script), "0 42 100 6");
}

#[test]
fn test_recursion() {
    let mut interp = Interp::new();
    let script = "
proc fib {n} {
    if {$n < 2} { return $n }
    + [fib [- $n 1]] [fib [- $n 2]]
}
fib 15";
    assert_eq!(eval_ok(&mut interp, script), "610");
}

#[test]
fn test_expand_splices_arguments() {
    let mut interp = Interp::new();
    let script = "
set mid {b c}
llength [list a {*}$mid d]";
    assert_eq!(eval_ok(&mut interp, script), "4");
}

#[test]
fn test_upvar_accumulator() {
    let mut interp = Interp::new();
    let script = "
proc tally {varname args} {
    upvar $varname total
    foreach n $args { incr total $n }
    return $total
}
set total 0
tally total 1 2 3
tally total 10
set total";
    assert_eq!(eval_ok(&mut interp, script), "16");
}

#[test]
fn test_string_match_from_scripts() {
    let mut interp = Interp::new();
    assert_eq!(eval_ok(&mut interp, "string match {a*cd} abdddddbdbdbdbdbdbdbcd"), "1");
    assert_eq!(eval_ok(&mut interp, "string match {a*dc} abdddddbdbdbdbdbdbdbcd"), "0");
    assert_eq!(eval_ok(&mut interp, "string match λ?λ λλλ"), "1");
}

#[test]
fn test_value_equality_is_by_string_form() {
    assert_eq!(Value::from(42), Value::from("42"));
    assert_eq!(
        Value::from(vec![Value::from("a"), Value::from("b c")]).as_str(),
        "a {b c}"
    );
}

#[test]
fn test_embedding_with_context() {
    struct Counter {
        count: i64,
    }

    fn cmd_bump(_: &mut Interp<Counter>, argv: &[Value], ctx: &mut Counter) -> TaclOptResult {
        check_args(1, argv, 1, 2, "?amount?")?;
        let amount = match argv.get(1) {
            Some(value) => value.as_int()?,
            None => 1,
        };
        ctx.count += amount;
        Ok(Some(Value::from(ctx.count)))
    }

    let mut ctx = Counter { count: 0 };
    let mut interp: Interp<Counter> = Interp::new();
    interp.add_command("bump", cmd_bump);

    interp.eval("bump; bump 10", &mut ctx).unwrap();
    assert_eq!(ctx.count, 11);
}

#[test]
fn test_host_variable_api() {
    let mut interp = Interp::<()>::new();

    interp.set_var(&Value::from("x"), Value::from(5)).unwrap();
    assert_eq!(interp.var(&Value::from("x")).unwrap().as_int().unwrap(), 5);

    interp
        .set_var(&Value::from("arr(k)"), Value::from("elem"))
        .unwrap();
    assert_eq!(
        interp.var(&Value::from("arr(k)")).unwrap().as_str(),
        "elem"
    );

    interp
        .set_var(&Value::from("::g"), Value::from("global"))
        .unwrap();
    assert!(interp.var_exists(&Value::from("g")));

    interp.unset_var(&Value::from("x"));
    assert!(!interp.var_exists(&Value::from("x")));
}

#[test]
fn test_run_from_reader() {
    let mut ctx = ();
    let mut interp = Interp::<()>::new();
    let script: &[u8] = b"set a 3\nset b 4\n+ $a $b";
    assert_eq!(interp.run(script, &mut ctx).unwrap().as_str(), "7");
}
