//! The `Value` type: the universal value of the language.
//!
//! Every value has a canonical string form, and may carry lazily computed
//! views of that string: an integer, a list, a parsed script, a parsed
//! expression, or a parsed variable name.  A view is computed at most once
//! and cached on the value, so evaluating a loop body or condition reparses
//! nothing after the first iteration.
//!
//! Values are immutable and cheap to clone; clones share the cached views.
//! At least one representation is always populated, and the string form,
//! once materialised, never changes.
//!
//! # Example
//!
//! ```
//! use tacl::Value;
//!
//! let value = Value::from("5");
//! assert_eq!(value.as_str(), "5");
//! assert_eq!(value.as_int().unwrap(), 5);
//! assert!(value.as_bool());
//!
//! let value = Value::from(7);
//! assert_eq!(value.as_str(), "7");
//! ```

use crate::expr::ExprNode;
use crate::list;
use crate::parser::Script;
use crate::tacl_err;
use crate::types::{Exception, TaclInt, TaclList};
use crate::{expr, parser};
use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

/// A language value.  See the [module documentation](index.html).
#[derive(Clone)]
pub struct Value {
    inner: Rc<Inner>,
}

#[derive(Default)]
struct Inner {
    string_rep: OnceCell<String>,
    int_rep: Cell<Option<TaclInt>>,
    list_rep: OnceCell<Rc<TaclList>>,
    script_rep: OnceCell<Rc<Script>>,
    expr_rep: OnceCell<Rc<ExprNode>>,
    var_rep: OnceCell<Rc<VarName>>,
}

/// A variable name as used by the host API and the `set` family of
/// commands: a bare name, optionally qualified by a leading `::` and
/// optionally carrying an `(index)` suffix naming an array element.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VarName {
    name: String,
    global: bool,
    index: Option<String>,
}

impl VarName {
    fn parse(raw: &str) -> Self {
        let (name, global) = match raw.strip_prefix("::") {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if name.ends_with(')') {
            if let Some(open) = name.find('(') {
                return Self {
                    name: name[..open].to_string(),
                    global,
                    index: Some(name[open + 1..name.len() - 1].to_string()),
                };
            }
        }
        Self {
            name: name.to_string(),
            global,
            index: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

// Shared instances: the empty value and the small integers.  Booleans reuse
// the 0/1 integers.
thread_local! {
    static INTERNED: Interned = Interned::new();
}

struct Interned {
    empty: Value,
    small_ints: Vec<Value>,
}

impl Interned {
    fn new() -> Self {
        Self {
            empty: Value::new_string(String::new()),
            small_ints: (0..=255).map(Value::new_int).collect(),
        }
    }
}

impl Value {
    fn new_string(s: String) -> Self {
        let inner = Inner::default();
        let _ = inner.string_rep.set(s);
        Self {
            inner: Rc::new(inner),
        }
    }

    fn new_int(int: TaclInt) -> Self {
        let inner = Inner::default();
        inner.int_rep.set(Some(int));
        Self {
            inner: Rc::new(inner),
        }
    }

    fn new_list(list: TaclList) -> Self {
        let inner = Inner::default();
        let _ = inner.list_rep.set(Rc::new(list));
        Self {
            inner: Rc::new(inner),
        }
    }

    /// The shared empty value.
    pub fn empty() -> Self {
        INTERNED.with(|interned| interned.empty.clone())
    }

    /// The canonical string form, rendering it from another view on first
    /// use.
    pub fn as_str(&self) -> &str {
        self.inner
            .string_rep
            .get_or_init(|| {
                if let Some(int) = self.inner.int_rep.get() {
                    return int.to_string();
                }
                if let Some(list) = self.inner.list_rep.get() {
                    return list::list_to_string(list);
                }
                unreachable!("value with no representation")
            })
            .as_str()
    }

    /// The value as an integer, or an error if its string form doesn't
    /// parse as one.
    pub fn as_int(&self) -> Result<TaclInt, Exception> {
        if let Some(int) = self.inner.int_rep.get() {
            return Ok(int);
        }
        let s = self.as_str();
        match s.parse::<TaclInt>() {
            Ok(int) => {
                self.inner.int_rep.set(Some(int));
                Ok(int)
            }
            Err(_) => tacl_err!("expected integer but got \"{}\"", s),
        }
    }

    /// The value's truth: false iff it is the integer 0 or the exact string
    /// `false` or `no`.
    pub fn as_bool(&self) -> bool {
        if let Ok(int) = self.as_int() {
            return int != 0;
        }
        let s = self.as_str();
        !(s == "false" || s == "no")
    }

    /// The value as a list, parsing the string form as a word list on first
    /// use.
    pub fn as_list(&self) -> Result<Rc<TaclList>, Exception> {
        if let Some(list) = self.inner.list_rep.get() {
            return Ok(list.clone());
        }
        let parsed = Rc::new(list::get_list(self.as_str())?);
        let _ = self.inner.list_rep.set(parsed.clone());
        Ok(parsed)
    }

    /// The value as a parsed script.
    pub(crate) fn as_script(&self) -> Result<Rc<Script>, Exception> {
        if let Some(script) = self.inner.script_rep.get() {
            return Ok(script.clone());
        }
        let parsed = Rc::new(parser::parse(self.as_str())?);
        let _ = self.inner.script_rep.set(parsed.clone());
        Ok(parsed)
    }

    /// The value as a parsed expression.
    pub(crate) fn as_expr(&self) -> Result<Rc<ExprNode>, Exception> {
        if let Some(node) = self.inner.expr_rep.get() {
            return Ok(node.clone());
        }
        let parsed = Rc::new(expr::parse(self.as_str())?);
        let _ = self.inner.expr_rep.set(parsed.clone());
        Ok(parsed)
    }

    /// The value as a variable name.
    pub(crate) fn as_var_name(&self) -> Rc<VarName> {
        if let Some(name) = self.inner.var_rep.get() {
            return name.clone();
        }
        let parsed = Rc::new(VarName::parse(self.as_str()));
        let _ = self.inner.var_rep.set(parsed.clone());
        parsed
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::empty()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({:?})", self.as_str())
    }
}

/// Values compare equal by string form.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) || self.as_str() == other.as_str()
    }
}

impl Eq for Value {}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new_string(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new_string(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::new_string(s.clone())
    }
}

impl From<TaclInt> for Value {
    fn from(int: TaclInt) -> Self {
        if (0..=255).contains(&int) {
            INTERNED.with(|interned| interned.small_ints[int as usize].clone())
        } else {
            Value::new_int(int)
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::from(if flag { 1 } else { 0 })
    }
}

impl From<TaclList> for Value {
    fn from(list: TaclList) -> Self {
        Value::new_list(list)
    }
}

impl From<&[Value]> for Value {
    fn from(list: &[Value]) -> Self {
        Value::new_list(list.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_form() {
        assert_eq!(Value::from("abc").as_str(), "abc");
        assert_eq!(Value::from(42).as_str(), "42");
        assert_eq!(
            Value::from(vec![Value::from("a"), Value::from("b c")]).as_str(),
            "a {b c}"
        );
        assert_eq!(Value::empty().as_str(), "");
    }

    #[test]
    fn test_as_int() {
        assert_eq!(Value::from("42").as_int().unwrap(), 42);
        assert_eq!(Value::from("-7").as_int().unwrap(), -7);

        let err = Value::from("xyz").as_int().unwrap_err();
        assert_eq!(err.value().as_str(), "expected integer but got \"xyz\"");
    }

    #[test]
    fn test_as_bool() {
        assert!(!Value::from(0).as_bool());
        assert!(!Value::from("false").as_bool());
        assert!(!Value::from("no").as_bool());
        assert!(Value::from(1).as_bool());
        assert!(Value::from(-3).as_bool());
        assert!(Value::from("anything else").as_bool());
        assert!(Value::from("").as_bool());
    }

    #[test]
    fn test_as_list() {
        let list = Value::from("{x}").as_list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].as_str(), "x");

        assert!(Value::from("a \" b").as_list().is_err());
    }

    #[test]
    fn test_interning() {
        let a = Value::from(5);
        let b = Value::from(5);
        assert!(Rc::ptr_eq(&a.inner, &b.inner));

        let t = Value::from(true);
        assert!(Rc::ptr_eq(&t.inner, &Value::from(1).inner));

        let big_a = Value::from(1000);
        let big_b = Value::from(1000);
        assert!(!Rc::ptr_eq(&big_a.inner, &big_b.inner));
        assert_eq!(big_a, big_b);
    }

    #[test]
    fn test_equality_by_string() {
        assert_eq!(Value::from("42"), Value::from(42));
        assert_ne!(Value::from("42"), Value::from("43"));
    }

    #[test]
    fn test_var_names() {
        let name = Value::from("x").as_var_name();
        assert_eq!(name.name(), "x");
        assert!(!name.is_global());
        assert_eq!(name.index(), None);

        let name = Value::from("::x").as_var_name();
        assert_eq!(name.name(), "x");
        assert!(name.is_global());

        let name = Value::from("arr(k)").as_var_name();
        assert_eq!(name.name(), "arr");
        assert_eq!(name.index(), Some("k"));

        let name = Value::from("a b c").as_var_name();
        assert_eq!(name.name(), "a b c");
    }

    #[test]
    fn test_cached_views_agree() {
        // A value built as a list renders its string form from the list.
        let value = Value::from(vec![Value::from("a"), Value::from("b")]);
        assert_eq!(value.as_str(), "a b");

        // Parsing the rendered form recovers the same list.
        let reparsed = Value::from(value.as_str()).as_list().unwrap();
        assert_eq!(*reparsed, *value.as_list().unwrap());
    }
}
