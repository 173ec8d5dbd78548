//! The script parser: turns source text into a [`Script`], a sequence of
//! commands whose words are evaluated lazily.
//!
//! Three grammars share the lexer in [`crate::tokenizer`]: scripts (here),
//! word lists (here, used for list coercion), and expressions (in
//! [`crate::expr`], which extends [`Parser`] with the expression grammar).

use crate::tokenizer::{escaped, is_word_char, Tokenizer};
use crate::types::Exception;
use crate::value::Value;
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;

/// A parsed script: a sequence of commands.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Script {
    commands: Vec<Command>,
}

impl Script {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// One command: a non-empty sequence of words, the first naming the handler.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Command {
    words: Vec<Word>,
}

impl Command {
    pub fn words(&self) -> &[Word] {
        &self.words
    }
}

/// A word of a command, in its unevaluated form.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Word {
    /// A constant: a braced block, a plain word, or a quoted string with no
    /// substitutions.
    Value(Value),

    /// A variable reference: `$name`, `$::name`, or `${any name}`.
    VarRef(VarRef),

    /// An array element reference: `$name(index)`.  The index is itself a
    /// word, evaluated at reference time.
    ArrayRef(VarRef, Box<Word>),

    /// A command substitution: `[command ...]`.
    Script(Rc<Script>),

    /// A quoted string with substitutions; the parts are concatenated.
    Tokens(Vec<Word>),

    /// `{*}word`: the word's list elements are spliced into the command.
    Expand(Box<Word>),
}

/// A variable name as written, with its `::` global qualifier resolved.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VarRef {
    pub name: String,
    pub global: bool,
}

impl VarRef {
    /// Builds a reference from a raw name, stripping a leading `::`.
    pub fn new(name: &str) -> Self {
        match name.strip_prefix("::") {
            Some(rest) => Self {
                name: rest.to_string(),
                global: true,
            },
            None => Self {
                name: name.to_string(),
                global: false,
            },
        }
    }
}

/// Parses a script.
pub(crate) fn parse(input: &str) -> Result<Script, Exception> {
    Parser::new(input).parse_commands()
}

/// Parses a string as a word list, yielding the element strings.
pub(crate) fn parse_list(input: &str) -> Result<Vec<String>, Exception> {
    Parser::new(input).parse_list_tokens()
}

pub(crate) fn parse_err(msg: &str) -> Exception {
    Exception::tacl_err(Value::from(msg))
}

pub(crate) struct Parser<'a> {
    pub(crate) tok: Tokenizer<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tok: Tokenizer::new(input),
        }
    }

    //----------------------------------------------------------------------
    // Lexer primitives

    /// Consumes and returns the current character; EOF here is an error.
    pub fn advance(&mut self) -> Result<char, Exception> {
        self.tok.next().ok_or_else(|| parse_err("unexpected EOF"))
    }

    /// Requires the current character to be `ch` and consumes it.
    pub fn consume(&mut self, ch: char) -> Result<(), Exception> {
        match self.tok.peek() {
            Some(got) if got == ch => {
                self.tok.next();
                Ok(())
            }
            Some(got) => Err(parse_err(&format!("expected '{}', got '{}'", ch, got))),
            None => Err(parse_err(&format!("expected '{}', got EOF", ch))),
        }
    }

    /// Accumulates characters while the predicate holds; an empty match is
    /// an error described by `desc`.
    pub fn consume_while1(
        &mut self,
        pred: impl Fn(char) -> bool,
        desc: &str,
    ) -> Result<String, Exception> {
        let mut buf = String::new();
        while let Some(ch) = self.tok.peek() {
            if !pred(ch) {
                break;
            }
            buf.push(ch);
            self.tok.next();
        }
        if buf.is_empty() {
            let got = match self.tok.peek() {
                Some(ch) => ch.to_string(),
                None => "EOF".to_string(),
            };
            return Err(parse_err(&format!("expected {}, got {}", desc, got)));
        }
        Ok(buf)
    }

    //----------------------------------------------------------------------
    // The script grammar

    fn parse_commands(&mut self) -> Result<Script, Exception> {
        let mut commands = Vec::new();
        self.tok.skip_space();
        while !self.tok.at_end() {
            if self.tok.is('#') {
                self.parse_comment();
            } else {
                commands.push(self.parse_command()?);
            }
            self.eat_extra();
        }
        Ok(Script { commands })
    }

    fn parse_command(&mut self) -> Result<Command, Exception> {
        let mut words = vec![self.parse_token(None)?];
        self.tok.skip_sep_space();
        while !self.at_eol() {
            words.push(self.parse_token(None)?);
            self.tok.skip_sep_space();
        }
        Ok(Command { words })
    }

    fn at_eol(&mut self) -> bool {
        matches!(self.tok.peek(), None | Some(';') | Some('\n') | Some('\r'))
    }

    /// Skips command separators: whitespace and semicolons.
    fn eat_extra(&mut self) {
        self.tok.skip_space();
        while self.tok.is(';') {
            self.tok.next();
            self.tok.skip_space();
        }
    }

    fn parse_comment(&mut self) {
        self.tok.next();
        self.tok.skip_while(|ch| ch != '\n');
    }

    /// Parses one word.  `term` is the closing character of the surrounding
    /// construct, if any (`]` inside command substitution, `)` inside an
    /// array index).
    pub fn parse_token(&mut self, term: Option<char>) -> Result<Word, Exception> {
        match self.tok.peek() {
            Some('[') => self.parse_subcommand(),
            Some('{') => self.parse_block(term),
            Some('"') => self.parse_quoted(),
            Some('$') => self.parse_var_ref(),
            _ => Ok(Word::Value(Value::from(self.parse_simple_word()?))),
        }
    }

    /// The verbatim content of a braced block, with matched-brace nesting.
    /// A backslash escapes exactly the next character; both are kept.
    pub fn parse_block_data(&mut self) -> Result<String, Exception> {
        self.consume('{')?;
        let mut nest = 0u32;
        let mut buf = String::new();
        loop {
            match self.tok.peek() {
                None => return Err(parse_err("unclosed block")),
                Some('\\') => {
                    buf.push(self.advance()?);
                    if self.tok.at_end() {
                        return Err(parse_err("unclosed block"));
                    }
                    buf.push(self.advance()?);
                }
                Some('{') => {
                    nest += 1;
                    buf.push(self.advance()?);
                }
                Some('}') => {
                    self.advance()?;
                    if nest == 0 {
                        return Ok(buf);
                    }
                    nest -= 1;
                    buf.push('}');
                }
                Some(_) => buf.push(self.advance()?),
            }
        }
    }

    fn parse_block(&mut self, term: Option<char>) -> Result<Word, Exception> {
        let data = self.parse_block_data()?;

        // {*} immediately followed by another token is the expansion form.
        if data == "*" {
            if let Some(ch) = self.tok.peek() {
                if !ch.is_whitespace() && !is_block_end(ch, term) {
                    return Ok(Word::Expand(Box::new(self.parse_token(term)?)));
                }
            }
        }

        match self.tok.peek() {
            Some(ch) if !ch.is_whitespace() && !is_block_end(ch, term) => {
                Err(parse_err("extra characters after close-brace"))
            }
            _ => Ok(Word::Value(Value::from(data))),
        }
    }

    pub fn parse_subcommand(&mut self) -> Result<Word, Exception> {
        self.consume('[')?;
        let mut words = Vec::new();
        loop {
            self.tok.skip_space();
            match self.tok.peek() {
                None => return Err(parse_err("unexpected EOF, wanted ]")),
                Some(']') => {
                    self.advance()?;
                    break;
                }
                _ => words.push(self.parse_token(Some(']'))?),
            }
        }
        let commands = if words.is_empty() {
            Vec::new()
        } else {
            vec![Command { words }]
        };
        Ok(Word::Script(Rc::new(Script { commands })))
    }

    pub fn parse_var_ref(&mut self) -> Result<Word, Exception> {
        self.consume('$')?;

        // ${any name}: the braces delimit an arbitrary name.
        if self.tok.is('{') {
            let name = self.parse_block_data()?;
            return Ok(Word::VarRef(VarRef::new(&name)));
        }

        let mut global = false;
        if self.tok.is(':') {
            self.advance()?;
            self.consume(':')?;
            global = true;
        }
        let name = self.consume_while1(is_word_char, "variable name")?;

        if self.tok.is('(') {
            self.advance()?;
            let index = self.parse_token(Some(')'))?;
            self.consume(')')?;
            return Ok(Word::ArrayRef(VarRef { name, global }, Box::new(index)));
        }
        Ok(Word::VarRef(VarRef { name, global }))
    }

    pub fn parse_quoted(&mut self) -> Result<Word, Exception> {
        self.consume('"')?;
        let mut parts: Vec<Word> = Vec::new();
        let mut accum = String::new();
        loop {
            match self.tok.peek() {
                None => return Err(parse_err("unexpected EOF, wanted \"")),
                Some('"') => {
                    self.advance()?;
                    if !accum.is_empty() || parts.is_empty() {
                        parts.push(Word::Value(Value::from(accum)));
                    }
                    break;
                }
                Some('$') => {
                    if !accum.is_empty() {
                        parts.push(Word::Value(Value::from(std::mem::take(&mut accum))));
                    }
                    parts.push(self.parse_var_ref()?);
                }
                Some('[') => {
                    if !accum.is_empty() {
                        parts.push(Word::Value(Value::from(std::mem::take(&mut accum))));
                    }
                    parts.push(self.parse_subcommand()?);
                }
                Some('\\') => {
                    self.advance()?;
                    let ch = self.advance()?;
                    accum.push(escaped(ch));
                }
                Some(_) => accum.push(self.advance()?),
            }
        }

        // A string with no substitutions is just a constant.
        if parts.len() == 1 && matches!(parts[0], Word::Value(_)) {
            return Ok(parts.pop().expect("parts is non-empty"));
        }
        Ok(Word::Tokens(parts))
    }

    fn parse_simple_word(&mut self) -> Result<String, Exception> {
        let mut buf = String::new();
        loop {
            match self.tok.peek() {
                Some('\\') => {
                    self.advance()?;
                    let ch = self.advance()?;
                    buf.push(escaped(ch));
                }
                Some(ch) if is_word_char(ch) => {
                    buf.push(ch);
                    self.tok.next();
                }
                _ => break,
            }
        }
        if buf.is_empty() {
            let got = match self.tok.peek() {
                Some(ch) => ch.to_string(),
                None => "EOF".to_string(),
            };
            return Err(parse_err(&format!("expected word, got {}", got)));
        }
        Ok(buf)
    }

    //----------------------------------------------------------------------
    // The word-list grammar

    fn parse_list_tokens(&mut self) -> Result<Vec<String>, Exception> {
        let mut items = Vec::new();
        loop {
            self.tok.skip_space();
            match self.tok.peek() {
                None => break,
                Some('{') => items.push(self.parse_block_data()?),
                Some('"') => items.push(self.parse_quoted_raw()?),
                Some(_) => {
                    items.push(self.consume_while1(|ch| !ch.is_whitespace(), "word")?)
                }
            }
        }
        Ok(items)
    }

    /// A quoted list element: substitution characters are literal here, but
    /// backslash escapes still apply.
    fn parse_quoted_raw(&mut self) -> Result<String, Exception> {
        self.consume('"')?;
        let mut buf = String::new();
        loop {
            match self.tok.peek() {
                None => return Err(parse_err("unexpected EOF, wanted \"")),
                Some('"') => {
                    self.advance()?;
                    return Ok(buf);
                }
                Some('\\') => {
                    self.advance()?;
                    let ch = self.advance()?;
                    buf.push(escaped(ch));
                }
                Some(_) => buf.push(self.advance()?),
            }
        }
    }
}

fn is_block_end(ch: char, term: Option<char>) -> bool {
    ch == ';' || Some(ch) == term
}

//--------------------------------------------------------------------------
// Rendering.  A rendered script reparses to a structurally equal one.

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            write!(f, "{}", cmd)?;
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{}", word)?;
        }
        Ok(())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Value(value) => write_word(f, value.as_str()),
            Word::VarRef(vref) => write!(f, "{}", vref),
            Word::ArrayRef(vref, index) => write!(f, "{}({})", vref, index),
            Word::Script(script) => {
                f.write_char('[')?;
                for (i, cmd) in script.commands.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", cmd)?;
                }
                f.write_char(']')
            }
            Word::Tokens(parts) => {
                f.write_char('"')?;
                for part in parts {
                    match part {
                        Word::Value(value) => write_quoted_part(f, value.as_str())?,
                        other => write!(f, "{}", other)?,
                    }
                }
                f.write_char('"')
            }
            Word::Expand(word) => write!(f, "{{*}}{}", word),
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let qualifier = if self.global { "::" } else { "" };
        if !self.name.is_empty() && self.name.chars().all(is_word_char) {
            write!(f, "${}{}", qualifier, self.name)
        } else {
            write!(f, "${{{}{}}}", qualifier, self.name)
        }
    }
}

/// Writes a constant word, brace-wrapping or backslash-escaping as needed so
/// that reparsing recovers the same text.
fn write_word(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let plain = !s.is_empty() && s.chars().all(is_word_char) && !s.contains('\\');
    if plain {
        return f.write_str(s);
    }
    if brace_safe(s) {
        return write!(f, "{{{}}}", s);
    }
    for ch in s.chars() {
        if !is_word_char(ch) || ch == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    Ok(())
}

/// Writes the raw-text part of a quoted string, escaping the characters that
/// are special inside quotes.
fn write_quoted_part(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for ch in s.chars() {
        if matches!(ch, '\\' | '"' | '$' | '[') {
            f.write_char('\\')?;
        }
        f.write_char(ch)?;
    }
    Ok(())
}

/// True if the text can be wrapped in braces without changing its content:
/// braces balance and no backslash dangles at the end.
fn brace_safe(s: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if chars.next().is_none() {
                    return false;
                }
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
