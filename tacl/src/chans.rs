//! Typed rendezvous channels and the `go` command.
//!
//! Channels live in a process-wide registry guarded by a single mutex, so
//! every evaluator thread sees the same names; the rendezvous itself
//! happens outside the lock.  A channel carries the canonical string form
//! of the value sent, which keeps the values themselves single-threaded.
//!
//! `go` spawns a detached evaluator thread: a fresh interpreter with the
//! standard command set and the parent's procedures re-installed from
//! their string forms.  Install procedures before spawning; definitions
//! made afterwards are not seen by running threads.

use crate::commands::concat_values;
use crate::interp::Interp;
use crate::tacl_err;
use crate::types::*;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;

/// The channel command set.
pub(crate) fn commands<Ctx>() -> Vec<(&'static str, CommandFunc<Ctx>)> {
    vec![
        ("newchan", cmd_newchan),
        ("closechan", cmd_closechan),
        ("sendchan", cmd_sendchan),
        ("<-", cmd_recvchan),
        ("forchan", cmd_forchan),
        ("go", cmd_go),
    ]
}

struct ChanEntry {
    // None once the channel is closed; receives then drain to end-of-channel.
    tx: Option<SyncSender<String>>,
    rx: Arc<Mutex<Receiver<String>>>,
}

fn registry() -> &'static Mutex<HashMap<String, ChanEntry>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, ChanEntry>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

static CHAN_INDEX: AtomicUsize = AtomicUsize::new(0);

fn make_chan() -> String {
    let index = CHAN_INDEX.fetch_add(1, Ordering::Relaxed) + 1;
    let name = format!("chan{}", index);
    let (tx, rx) = sync_channel(0);
    registry().lock().expect("channel registry poisoned").insert(
        name.clone(),
        ChanEntry {
            tx: Some(tx),
            rx: Arc::new(Mutex::new(rx)),
        },
    );
    name
}

fn sender_for(name: &str) -> Result<SyncSender<String>, Exception> {
    let registry = registry().lock().expect("channel registry poisoned");
    match registry.get(name) {
        Some(ChanEntry { tx: Some(tx), .. }) => Ok(tx.clone()),
        Some(_) => tacl_err!("chan is closed: {}", name),
        None => tacl_err!("not a chan: {}", name),
    }
}

/// Receives one value, blocking until a sender arrives.  `None` means the
/// channel is closed and drained.
fn recv(name: &str) -> Result<Option<String>, Exception> {
    let rx = {
        let registry = registry().lock().expect("channel registry poisoned");
        match registry.get(name) {
            Some(entry) => entry.rx.clone(),
            None => return tacl_err!("not a chan: {}", name),
        }
    };
    let rx = rx.lock().expect("channel receiver poisoned");
    Ok(rx.recv().ok())
}

/// newchan: creates an anonymous channel and returns its name.
pub fn cmd_newchan<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 1, 1, "")?;
    Ok(Some(Value::from(make_chan())))
}

/// closechan channelName: subsequent receives yield the empty value.
pub fn cmd_closechan<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(1, argv, 2, 2, "channelName")?;

    let name = argv[1].as_str();
    let mut registry = registry().lock().expect("channel registry poisoned");
    match registry.get_mut(name) {
        Some(entry) => {
            entry.tx = None;
            Ok(None)
        }
        None => tacl_err!("not a chan: {}", name),
    }
}

/// sendchan channelName value: blocks until a receiver takes the value.
pub fn cmd_sendchan<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(1, argv, 3, 3, "channelName value")?;

    let name = argv[1].as_str();
    let tx = sender_for(name)?;
    if tx.send(argv[2].as_str().to_string()).is_err() {
        return tacl_err!("not a chan: {}", name);
    }
    Ok(None)
}

/// <- channelName: blocks until a sender supplies a value.
pub fn cmd_recvchan<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TaclOptResult {
    check_args(1, argv, 2, 2, "channelName")?;
    Ok(Some(
        recv(argv[1].as_str())?.map(Value::from).unwrap_or_default(),
    ))
}

/// forchan varName channelName command: iterates received values until
/// the channel closes.
pub fn cmd_forchan<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 4, 4, "varName channelName command")?;

    loop {
        let value = match recv(argv[2].as_str())? {
            Some(text) => Value::from(text),
            None => break,
        };
        interp.set_var(&argv[1], value)?;

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

/// go command ?arg ...?: spawns a detached evaluator thread.
pub fn cmd_go<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TaclOptResult {
    check_args(1, argv, 2, 0, "command ?arg ...?")?;

    let script = if argv.len() == 2 {
        argv[1].as_str().to_string()
    } else {
        concat_values(&argv[1..]).as_str().to_string()
    };
    let procs = interp.proc_definitions();

    thread::spawn(move || {
        let mut ctx = ();
        let mut interp = Interp::<()>::new();
        for (name, parms, body) in &procs {
            if let Ok(parms) = Value::from(parms).as_list() {
                interp.add_proc(name, parms.as_slice(), &Value::from(body));
            }
        }
        if let Err(e) = interp.eval(&script, &mut ctx) {
            eprintln!("{}", e.value());
        }
    });

    Ok(None)
}
