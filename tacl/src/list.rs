//! List parsing and rendering.

use crate::parser;
use crate::types::{Exception, TaclList};
use crate::value::Value;

/// Parses a string as a word list.
pub(crate) fn get_list(s: &str) -> Result<TaclList, Exception> {
    Ok(parser::parse_list(s)?.into_iter().map(Value::from).collect())
}

/// Renders a list in its canonical string form: elements joined by single
/// spaces, with empty or whitespace-containing elements brace-wrapped.
pub(crate) fn list_to_string(list: &[Value]) -> String {
    let mut out = String::new();
    for (i, item) in list.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let s = item.as_str();
        let bracket = s.is_empty() || s.chars().any(|ch| matches!(ch, ' ' | '\t' | '\n' | '\u{b}'));
        if bracket {
            out.push('{');
            out.push_str(s);
            out.push('}');
        } else {
            out.push_str(s);
        }
    }
    out
}
