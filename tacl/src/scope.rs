//! Variable storage: a stack of frames, each mapping names to entries.
//!
//! An entry holds a scalar value, an array of elements, or a link to an
//! entry in another frame (the mechanism behind `upvar` and `global`).
//! Links are resolved transitively on both reads and writes; writing
//! through a link creates the target entry if it doesn't exist yet.

use crate::tacl_err;
use crate::types::{Exception, TaclHasher, TaclList};
use crate::value::Value;
use indexmap::IndexMap;

/// Link chains are expected to be short; the guard only exists to turn an
/// accidental cycle into an error.
const MAX_LINK_HOPS: usize = 64;

pub(crate) struct ScopeStack {
    stack: Vec<Scope>,
}

#[derive(Default)]
pub(crate) struct Scope {
    map: IndexMap<String, Var, TaclHasher>,
}

enum Var {
    Scalar(Value),
    Array(IndexMap<String, Value, TaclHasher>),
    Link { level: usize, name: String },
}

impl ScopeStack {
    /// Creates a stack holding only the global frame.
    pub fn new() -> Self {
        Self {
            stack: vec![Scope::default()],
        }
    }

    pub fn push(&mut self) {
        self.stack.push(Scope::default());
    }

    pub fn pop(&mut self) {
        assert!(self.stack.len() > 1, "popped the global scope");
        self.stack.pop();
    }

    /// The current frame level; the global frame is level 0.
    pub fn current(&self) -> usize {
        self.stack.len() - 1
    }

    fn base(&self, global: bool) -> usize {
        if global {
            0
        } else {
            self.current()
        }
    }

    /// Follows link entries from `(level, name)` to the entry they target.
    fn resolve(&self, mut level: usize, name: &str) -> Result<(usize, String), Exception> {
        let mut name = name.to_string();
        let mut hops = 0;
        loop {
            match self.stack[level].map.get(&name) {
                Some(Var::Link {
                    level: target_level,
                    name: target_name,
                }) => {
                    hops += 1;
                    if hops > MAX_LINK_HOPS {
                        return tacl_err!("too many levels of indirection for \"{}\"", name);
                    }
                    level = *target_level;
                    name = target_name.clone();
                }
                _ => return Ok((level, name)),
            }
        }
    }

    pub fn get(&self, name: &str, global: bool) -> Result<Value, Exception> {
        let (level, name) = self.resolve(self.base(global), name)?;
        match self.stack[level].map.get(&name) {
            Some(Var::Scalar(value)) => Ok(value.clone()),
            Some(Var::Array(_)) => tacl_err!("can't read \"{}\": variable is array", name),
            Some(Var::Link { .. }) => unreachable!("resolve returned a link"),
            None => tacl_err!("variable not found: {}", name),
        }
    }

    pub fn set(&mut self, name: &str, global: bool, value: Value) -> Result<(), Exception> {
        let (level, name) = self.resolve(self.base(global), name)?;
        let map = &mut self.stack[level].map;
        if let Some(Var::Array(_)) = map.get(&name) {
            return tacl_err!("can't set \"{}\": variable is array", name);
        }
        map.insert(name, Var::Scalar(value));
        Ok(())
    }

    pub fn get_elem(&self, name: &str, global: bool, index: &str) -> Result<Value, Exception> {
        let (level, name) = self.resolve(self.base(global), name)?;
        match self.stack[level].map.get(&name) {
            Some(Var::Array(elems)) => match elems.get(index) {
                Some(value) => Ok(value.clone()),
                None => tacl_err!("variable not found: {}({})", name, index),
            },
            Some(Var::Scalar(_)) => {
                tacl_err!("can't read \"{}\": variable isn't array", name)
            }
            Some(Var::Link { .. }) => unreachable!("resolve returned a link"),
            None => tacl_err!("variable not found: {}({})", name, index),
        }
    }

    pub fn set_elem(
        &mut self,
        name: &str,
        global: bool,
        index: &str,
        value: Value,
    ) -> Result<(), Exception> {
        let (level, name) = self.resolve(self.base(global), name)?;
        let map = &mut self.stack[level].map;
        if let Some(Var::Scalar(_)) = map.get(&name) {
            return tacl_err!("can't set \"{}\": variable isn't array", name);
        }
        let entry = map
            .entry(name)
            .or_insert_with(|| Var::Array(IndexMap::default()));
        if let Var::Array(elems) = entry {
            elems.insert(index.to_string(), value);
        }
        Ok(())
    }

    /// Removes the entry under its local name; a link is removed without
    /// touching its target.
    pub fn unset(&mut self, name: &str, global: bool) {
        let level = self.base(global);
        self.stack[level].map.remove(name);
    }

    pub fn unset_elem(&mut self, name: &str, global: bool, index: &str) {
        let level = self.base(global);
        if let Some(Var::Array(elems)) = self.stack[level].map.get_mut(name) {
            elems.remove(index);
        }
    }

    pub fn exists(&self, name: &str, global: bool) -> bool {
        match self.resolve(self.base(global), name) {
            Ok((level, name)) => self.stack[level].map.contains_key(&name),
            Err(_) => false,
        }
    }

    /// Installs a link named `mine` in the current frame, targeting the
    /// entry `theirs` in the frame at the given absolute level.
    /// Reassigning an existing link re-binds it.
    pub fn upvar(&mut self, level: usize, theirs: &str, mine: &str) {
        let top = self.current();
        self.stack[top].map.insert(
            mine.to_string(),
            Var::Link {
                level,
                name: theirs.to_string(),
            },
        );
    }

    /// Names visible in the current frame.
    pub fn vars_in_scope(&self) -> TaclList {
        self.stack[self.current()]
            .map
            .keys()
            .map(|name| Value::from(name))
            .collect()
    }

    /// Names defined in the global frame.
    pub fn vars_in_global_scope(&self) -> TaclList {
        self.stack[0].map.keys().map(Value::from).collect()
    }

    /// Detaches the current frame so a body can run in the caller's scope;
    /// returns `None` when already at the global frame.
    pub fn pop_detached(&mut self) -> Option<Scope> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    pub fn push_detached(&mut self, scope: Scope) {
        self.stack.push(scope);
    }
}
