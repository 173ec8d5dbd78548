//! The expression parser and evaluator, used by `expr` and the conditions
//! of `if`, `while`, and `for`.
//!
//! Terms are parsed right-recursively; `balance` then rotates the tree left
//! wherever the right child's operator binds no tighter than the current
//! one, which yields left-to-right evaluation within a precedence level
//! without a separate operator stack.  All arithmetic is integer arithmetic.

use crate::interp::Interp;
use crate::parser::{parse_err, Parser, Word};
use crate::tacl_err;
use crate::types::{Exception, TaclInt, TaclResult};
use crate::value::Value;
use rand::Rng;

/// A binary operator.  Higher precedence binds tighter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinOp {
    Shl,
    Shr,
    Mul,
    Div,
    Xor,
    Add,
    Sub,
    Eq,
    Ne,
    StrEq,
    StrNe,
    And,
    Or,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    fn prec(self) -> i32 {
        use BinOp::*;
        match self {
            Shl | Shr => 4,
            Mul | Div | Xor => 3,
            Add | Sub => 2,
            Eq | Ne | StrEq | StrNe => 1,
            And | Or => 0,
            Lt | Le | Gt | Ge => -1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Complement,
}

/// A parsed expression.
#[derive(Debug, PartialEq)]
pub(crate) enum ExprNode {
    /// A literal run or braced literal.
    Literal(Value),
    /// A substitution term: variable, command, or quoted string.
    Term(Word),
    Unary(UnaryOp, Box<ExprNode>),
    Binary(BinOp, Box<ExprNode>, Box<ExprNode>),
    Ternary(Box<ExprNode>, Box<ExprNode>, Box<ExprNode>),
    /// A math function call: `name(args...)`.
    Func(String, Vec<ExprNode>),
    Paren(Box<ExprNode>),
}

/// Parses a string as an expression.
pub(crate) fn parse(input: &str) -> Result<ExprNode, Exception> {
    Parser::new(input).parse_expr()
}

fn is_term_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '.' || ch == '-'
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Result<ExprNode, Exception> {
        let term = self.parse_expr_term()?;
        self.tok.skip_space();
        match self.tok.peek() {
            // An expression ends at EOF or at the delimiters of the
            // surrounding construct: a paren, a ternary colon, an argument
            // comma.
            None | Some(')') | Some(':') | Some(',') => Ok(term),
            Some('?') => {
                self.advance()?;
                let yes = self.parse_expr()?;
                self.consume(':')?;
                let no = self.parse_expr()?;
                Ok(ExprNode::Ternary(
                    Box::new(term),
                    Box::new(yes),
                    Box::new(no),
                ))
            }
            Some(_) => self.parse_bin_op(term),
        }
    }

    fn parse_bin_op(&mut self, lhs: ExprNode) -> Result<ExprNode, Exception> {
        let op = self.parse_op()?;
        self.tok.skip_space();
        let rhs = self.parse_expr()?;
        Ok(balance(ExprNode::Binary(op, Box::new(lhs), Box::new(rhs))))
    }

    fn parse_expr_term(&mut self) -> Result<ExprNode, Exception> {
        self.tok.skip_space();
        match self.tok.peek() {
            Some('(') => {
                self.advance()?;
                let inner = self.parse_expr()?;
                self.consume(')')?;
                Ok(ExprNode::Paren(Box::new(inner)))
            }
            Some('$') => Ok(ExprNode::Term(self.parse_var_ref()?)),
            Some('!') => {
                self.advance()?;
                Ok(ExprNode::Unary(
                    UnaryOp::Not,
                    Box::new(self.parse_expr_term()?),
                ))
            }
            Some('~') => {
                self.advance()?;
                Ok(ExprNode::Unary(
                    UnaryOp::Complement,
                    Box::new(self.parse_expr_term()?),
                ))
            }
            Some('{') => Ok(ExprNode::Literal(Value::from(self.parse_block_data()?))),
            Some('"') => Ok(ExprNode::Term(self.parse_quoted()?)),
            Some('[') => Ok(ExprNode::Term(self.parse_subcommand()?)),
            _ => {
                let text = self.consume_while1(is_term_char, "term")?;
                if self.tok.is('(') {
                    self.parse_func_call(text)
                } else {
                    Ok(ExprNode::Literal(Value::from(text)))
                }
            }
        }
    }

    fn parse_func_call(&mut self, name: String) -> Result<ExprNode, Exception> {
        self.consume('(')?;
        let mut args = Vec::new();
        self.tok.skip_space();
        if self.tok.is(')') {
            self.advance()?;
            return Ok(ExprNode::Func(name, args));
        }
        loop {
            args.push(self.parse_expr()?);
            if self.tok.is(',') {
                self.advance()?;
                continue;
            }
            break;
        }
        self.consume(')')?;
        Ok(ExprNode::Func(name, args))
    }

    fn parse_op(&mut self) -> Result<BinOp, Exception> {
        use BinOp::*;
        let op = match self.tok.peek() {
            Some('*') => Mul,
            Some('/') => Div,
            Some('^') => Xor,
            Some('+') => Add,
            Some('-') => Sub,
            Some('|') => {
                self.advance()?;
                self.consume('|')?;
                return Ok(Or);
            }
            Some('&') => {
                self.advance()?;
                self.consume('&')?;
                return Ok(And);
            }
            Some('!') => {
                self.advance()?;
                self.consume('=')?;
                return Ok(Ne);
            }
            Some('=') => {
                self.advance()?;
                self.consume('=')?;
                return Ok(Eq);
            }
            Some('>') => {
                self.advance()?;
                return Ok(match self.tok.peek() {
                    Some('=') => {
                        self.advance()?;
                        Ge
                    }
                    Some('>') => {
                        self.advance()?;
                        Shr
                    }
                    _ => Gt,
                });
            }
            Some('<') => {
                self.advance()?;
                return Ok(match self.tok.peek() {
                    Some('=') => {
                        self.advance()?;
                        Le
                    }
                    Some('<') => {
                        self.advance()?;
                        Shl
                    }
                    _ => Lt,
                });
            }
            Some(ch) if ch.is_alphabetic() => {
                let word = self.consume_while1(char::is_alphabetic, "operator")?;
                return match word.as_str() {
                    "eq" => Ok(StrEq),
                    "ne" => Ok(StrNe),
                    _ => Err(parse_err(&format!("invalid operator \"{}\"", word))),
                };
            }
            Some(_) => return Err(parse_err("expected operator")),
            None => return Err(parse_err("unexpected EOF")),
        };
        self.advance()?;
        Ok(op)
    }
}

fn gbalance(node: ExprNode) -> ExprNode {
    if matches!(node, ExprNode::Binary(..)) {
        balance(node)
    } else {
        node
    }
}

/// Rotates `op1 a (op2 ba bb)` into `op2 (op1 a ba) bb` when `op1` binds at
/// least as tightly as `op2`, recursing into the subtrees.  Applied after
/// each right-recursive binary parse.
fn balance(node: ExprNode) -> ExprNode {
    match node {
        ExprNode::Binary(op, a, b) => match *b {
            ExprNode::Binary(op2, ba, bb) if op.prec() >= op2.prec() => {
                let left = ExprNode::Binary(op, Box::new(gbalance(*a)), Box::new(gbalance(*ba)));
                ExprNode::Binary(op2, Box::new(left), Box::new(gbalance(*bb)))
            }
            other => ExprNode::Binary(op, a, Box::new(other)),
        },
        other => other,
    }
}

/// Evaluates a parsed expression.
pub(crate) fn eval_node<Ctx>(
    interp: &mut Interp<Ctx>,
    node: &ExprNode,
    ctx: &mut Ctx,
) -> TaclResult {
    match node {
        ExprNode::Literal(value) => Ok(value.clone()),
        ExprNode::Term(word) => interp.eval_word(word, ctx),
        ExprNode::Paren(inner) => eval_node(interp, inner, ctx),
        ExprNode::Unary(op, operand) => {
            let value = eval_node(interp, operand, ctx)?;
            match op {
                UnaryOp::Not => Ok(Value::from(!value.as_bool())),
                UnaryOp::Complement => Ok(Value::from(!value.as_int()?)),
            }
        }
        ExprNode::Ternary(cond, yes, no) => {
            if eval_node(interp, cond, ctx)?.as_bool() {
                eval_node(interp, yes, ctx)
            } else {
                eval_node(interp, no, ctx)
            }
        }
        ExprNode::Binary(op, a, b) => {
            let a = eval_node(interp, a, ctx)?;
            let b = eval_node(interp, b, ctx)?;
            eval_bin_op(*op, &a, &b)
        }
        ExprNode::Func(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_node(interp, arg, ctx)?);
            }
            eval_func(name, &values)
        }
    }
}

fn eval_bin_op(op: BinOp, a: &Value, b: &Value) -> TaclResult {
    use BinOp::*;
    match op {
        And => Ok(Value::from(a.as_bool() && b.as_bool())),
        Or => Ok(Value::from(a.as_bool() || b.as_bool())),
        StrEq => Ok(Value::from(a.as_str() == b.as_str())),
        StrNe => Ok(Value::from(a.as_str() != b.as_str())),
        _ => {
            let x = a.as_int()?;
            let y = b.as_int()?;
            match op {
                Add => Ok(Value::from(x.wrapping_add(y))),
                Sub => Ok(Value::from(x.wrapping_sub(y))),
                Mul => Ok(Value::from(x.wrapping_mul(y))),
                Div => {
                    if y == 0 {
                        tacl_err!("divide by zero")
                    } else {
                        Ok(Value::from(x.wrapping_div(y)))
                    }
                }
                Xor => Ok(Value::from(x ^ y)),
                // The right operand is taken as an unsigned amount; shifting
                // out the whole word yields 0 (or the sign for >>).
                Shl => {
                    let amount = y as u64;
                    Ok(Value::from(if amount >= 64 {
                        0
                    } else {
                        x.wrapping_shl(amount as u32)
                    }))
                }
                Shr => {
                    let amount = y as u64;
                    Ok(Value::from(if amount >= 64 {
                        if x < 0 {
                            -1
                        } else {
                            0
                        }
                    } else {
                        x >> amount
                    }))
                }
                Eq => Ok(Value::from(x == y)),
                Ne => Ok(Value::from(x != y)),
                Lt => Ok(Value::from(x < y)),
                Le => Ok(Value::from(x <= y)),
                Gt => Ok(Value::from(x > y)),
                Ge => Ok(Value::from(x >= y)),
                And | Or | StrEq | StrNe => unreachable!(),
            }
        }
    }
}

fn eval_func(name: &str, args: &[Value]) -> TaclResult {
    match name {
        "min" | "max" => {
            if args.is_empty() {
                return tacl_err!("too few arguments to math function \"{}\"", name);
            }
            let mut best = args[0].as_int()?;
            for arg in &args[1..] {
                let v = arg.as_int()?;
                if (name == "min" && v < best) || (name == "max" && v > best) {
                    best = v;
                }
            }
            Ok(Value::from(best))
        }
        "pow" => {
            if args.len() != 2 {
                return tacl_err!("wrong # args for math function \"pow\"");
            }
            let x = args[0].as_int()?;
            let y = args[1].as_int()?;
            if y < 0 {
                return tacl_err!("exponent must be non-negative");
            }
            Ok(Value::from(x.wrapping_pow(y.min(u32::MAX as TaclInt) as u32)))
        }
        "rand" => {
            if !args.is_empty() {
                return tacl_err!("too many arguments for math function \"rand\"");
            }
            Ok(Value::from(rand::thread_rng().gen_range(0..TaclInt::MAX)))
        }
        _ => tacl_err!("unknown math function \"{}\"", name),
    }
}
