//! Expression sandbox.
//!
//! Parses the user's source text into an AST over a fixed numeric namespace
//! and evaluates it once per visible cell. Both steps are fallible by
//! construction: a malformed source yields a `CompileError` (the session
//! falls back to the constant-zero program) and a non-finite sample yields an
//! `EvalError` (the grid evaluator maps it to 0), so nothing the user types
//! can take down the frame loop.

use std::f64::consts::{E, PI, TAU};
use std::fmt;

/// Per-cell argument set handed to a compiled program.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Env {
    /// Seconds since the program was (re)compiled.
    pub t: f64,
    /// 1-based row-major index of the cell within this frame.
    pub i: f64,
    pub x: f64,
    pub y: f64,
    /// Pointer position in function space.
    pub mx: f64,
    pub my: f64,
    /// Total visible-cell count this frame.
    pub c: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    message: String,
    position: usize,
}

impl CompileError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// The expression produced NaN or an infinity for this cell.
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Var {
    T,
    I,
    X,
    Y,
    Mx,
    My,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Abs,
    Acos,
    Asin,
    Atan,
    Atan2,
    Cbrt,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Floor,
    Hypot,
    Log,
    Log2,
    Log10,
    Max,
    Min,
    Pow,
    Random,
    Round,
    Sign,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
    Trunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone)]
enum Node {
    Number(f64),
    Var(Var),
    Neg(Box<Node>),
    Add(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    Div(Box<Node>, Box<Node>),
    Rem(Box<Node>, Box<Node>),
    Pow(Box<Node>, Box<Node>),
    Cmp(CmpOp, Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

impl Node {
    fn eval(&self, env: &Env) -> f64 {
        match self {
            Node::Number(v) => *v,
            Node::Var(var) => match var {
                Var::T => env.t,
                Var::I => env.i,
                Var::X => env.x,
                Var::Y => env.y,
                Var::Mx => env.mx,
                Var::My => env.my,
                Var::C => env.c,
            },
            Node::Neg(inner) => -inner.eval(env),
            Node::Add(a, b) => a.eval(env) + b.eval(env),
            Node::Sub(a, b) => a.eval(env) - b.eval(env),
            Node::Mul(a, b) => a.eval(env) * b.eval(env),
            Node::Div(a, b) => a.eval(env) / b.eval(env),
            Node::Rem(a, b) => a.eval(env) % b.eval(env),
            Node::Pow(a, b) => a.eval(env).powf(b.eval(env)),
            Node::Cmp(op, a, b) => {
                let (a, b) = (a.eval(env), b.eval(env));
                let hit = match op {
                    CmpOp::Lt => a < b,
                    CmpOp::Le => a <= b,
                    CmpOp::Gt => a > b,
                    CmpOp::Ge => a >= b,
                    CmpOp::Eq => a == b,
                    CmpOp::Ne => a != b,
                };
                if hit { 1.0 } else { 0.0 }
            }
            Node::Call(func, args) => {
                let first = || args[0].eval(env);
                match func {
                    Func::Abs => first().abs(),
                    Func::Acos => first().acos(),
                    Func::Asin => first().asin(),
                    Func::Atan => first().atan(),
                    Func::Atan2 => first().atan2(args[1].eval(env)),
                    Func::Cbrt => first().cbrt(),
                    Func::Ceil => first().ceil(),
                    Func::Cos => first().cos(),
                    Func::Cosh => first().cosh(),
                    Func::Exp => first().exp(),
                    Func::Floor => first().floor(),
                    Func::Hypot => first().hypot(args[1].eval(env)),
                    Func::Log => first().ln(),
                    Func::Log2 => first().log2(),
                    Func::Log10 => first().log10(),
                    Func::Max => args
                        .iter()
                        .map(|a| a.eval(env))
                        .fold(f64::NEG_INFINITY, f64::max),
                    Func::Min => args
                        .iter()
                        .map(|a| a.eval(env))
                        .fold(f64::INFINITY, f64::min),
                    Func::Pow => first().powf(args[1].eval(env)),
                    Func::Random => js_sys::Math::random(),
                    Func::Round => first().round(),
                    Func::Sign => {
                        let v = first();
                        if v == 0.0 { 0.0 } else { v.signum() }
                    }
                    Func::Sin => first().sin(),
                    Func::Sinh => first().sinh(),
                    Func::Sqrt => first().sqrt(),
                    Func::Tan => first().tan(),
                    Func::Tanh => first().tanh(),
                    Func::Trunc => first().trunc(),
                }
            }
        }
    }
}

fn lookup_var(name: &str) -> Option<Var> {
    Some(match name {
        "t" => Var::T,
        "i" => Var::I,
        "x" => Var::X,
        "y" => Var::Y,
        "mx" => Var::Mx,
        "my" => Var::My,
        "c" => Var::C,
        _ => return None,
    })
}

fn lookup_const(name: &str) -> Option<f64> {
    Some(match name {
        "pi" => PI,
        "tau" => TAU,
        "e" => E,
        _ => return None,
    })
}

fn lookup_func(name: &str) -> Option<Func> {
    Some(match name {
        "abs" => Func::Abs,
        "acos" => Func::Acos,
        "asin" => Func::Asin,
        "atan" => Func::Atan,
        "atan2" => Func::Atan2,
        "cbrt" => Func::Cbrt,
        "ceil" => Func::Ceil,
        "cos" => Func::Cos,
        "cosh" => Func::Cosh,
        "exp" => Func::Exp,
        "floor" => Func::Floor,
        "hypot" => Func::Hypot,
        "log" => Func::Log,
        "log2" => Func::Log2,
        "log10" => Func::Log10,
        "max" => Func::Max,
        "min" => Func::Min,
        "pow" => Func::Pow,
        "random" => Func::Random,
        "round" => Func::Round,
        "sign" => Func::Sign,
        "sin" => Func::Sin,
        "sinh" => Func::Sinh,
        "sqrt" => Func::Sqrt,
        "tan" => Func::Tan,
        "tanh" => Func::Tanh,
        "trunc" => Func::Trunc,
        _ => return None,
    })
}

/// Expected argument counts; `None` means two or more.
fn check_arity(func: Func, got: usize, position: usize) -> Result<(), CompileError> {
    let expected: Option<usize> = match func {
        Func::Atan2 | Func::Hypot | Func::Pow => Some(2),
        Func::Random => Some(0),
        Func::Min | Func::Max => None,
        _ => Some(1),
    };
    match expected {
        Some(n) if got != n => Err(CompileError::new(
            format!("expected {n} argument(s), found {got}"),
            position,
        )),
        None if got < 2 => Err(CompileError::new(
            format!("expected at least 2 arguments, found {got}"),
            position,
        )),
        _ => Ok(()),
    }
}

/// A compiled, reusable expression.
#[derive(Debug, Clone)]
pub struct Program {
    root: Node,
}

impl Program {
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let root = Parser::new(source).parse()?;
        Ok(Self { root })
    }

    /// The constant-zero fallback installed when compilation fails.
    pub fn zero() -> Self {
        Self {
            root: Node::Number(0.0),
        }
    }

    pub fn sample(&self, env: &Env) -> Result<f64, EvalError> {
        let value = self.root.eval(env);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite)
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            index: 0,
        }
    }

    fn parse(mut self) -> Result<Node, CompileError> {
        let node = self.parse_comparison()?;
        self.skip_whitespace();
        if self.index != self.bytes.len() {
            return Err(CompileError::new(
                format!("unexpected token '{}'", self.peek_char().unwrap_or('?')),
                self.index,
            ));
        }
        Ok(node)
    }

    fn parse_comparison(&mut self) -> Result<Node, CompileError> {
        let mut node = self.parse_add_sub()?;
        loop {
            self.skip_whitespace();
            let op = match (self.peek_char(), self.peek_char_at(1)) {
                (Some('<'), Some('=')) => (CmpOp::Le, 2),
                (Some('>'), Some('=')) => (CmpOp::Ge, 2),
                (Some('='), Some('=')) => (CmpOp::Eq, 2),
                (Some('!'), Some('=')) => (CmpOp::Ne, 2),
                (Some('<'), _) => (CmpOp::Lt, 1),
                (Some('>'), _) => (CmpOp::Gt, 1),
                _ => return Ok(node),
            };
            self.index += op.1;
            let right = self.parse_add_sub()?;
            node = Node::Cmp(op.0, Box::new(node), Box::new(right));
        }
    }

    fn parse_add_sub(&mut self) -> Result<Node, CompileError> {
        let mut node = self.parse_mul_div_rem()?;
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('+') => {
                    self.index += 1;
                    let right = self.parse_mul_div_rem()?;
                    node = Node::Add(Box::new(node), Box::new(right));
                }
                Some('-') => {
                    self.index += 1;
                    let right = self.parse_mul_div_rem()?;
                    node = Node::Sub(Box::new(node), Box::new(right));
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_mul_div_rem(&mut self) -> Result<Node, CompileError> {
        let mut node = self.parse_power()?;
        loop {
            self.skip_whitespace();
            match self.peek_char() {
                Some('*') => {
                    self.index += 1;
                    let right = self.parse_power()?;
                    node = Node::Mul(Box::new(node), Box::new(right));
                }
                Some('/') => {
                    self.index += 1;
                    let right = self.parse_power()?;
                    node = Node::Div(Box::new(node), Box::new(right));
                }
                Some('%') => {
                    self.index += 1;
                    let right = self.parse_power()?;
                    node = Node::Rem(Box::new(node), Box::new(right));
                }
                _ => return Ok(node),
            }
        }
    }

    // Right-associative: 2^3^2 parses as 2^(3^2).
    fn parse_power(&mut self) -> Result<Node, CompileError> {
        let left = self.parse_unary()?;
        self.skip_whitespace();
        if self.peek_char() == Some('^') {
            self.index += 1;
            let right = self.parse_power()?;
            Ok(Node::Pow(Box::new(left), Box::new(right)))
        } else {
            Ok(left)
        }
    }

    fn parse_unary(&mut self) -> Result<Node, CompileError> {
        self.skip_whitespace();
        match self.peek_char() {
            Some('+') => {
                self.index += 1;
                self.parse_unary()
            }
            Some('-') => {
                self.index += 1;
                Ok(Node::Neg(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Node, CompileError> {
        self.skip_whitespace();
        match self.peek_char() {
            Some('(') => {
                self.index += 1;
                let node = self.parse_comparison()?;
                self.expect(')')?;
                Ok(node)
            }
            Some('0'..='9') | Some('.') => self.parse_number(),
            Some('a'..='z') | Some('A'..='Z') | Some('_') => self.parse_identifier(),
            Some(token) => Err(CompileError::new(
                format!("unexpected token '{token}'"),
                self.index,
            )),
            None => Err(CompileError::new("unexpected end of expression", self.index)),
        }
    }

    fn parse_number(&mut self) -> Result<Node, CompileError> {
        let start = self.index;

        while matches!(self.peek_char(), Some('0'..='9')) {
            self.index += 1;
        }
        if self.peek_char() == Some('.') {
            self.index += 1;
            while matches!(self.peek_char(), Some('0'..='9')) {
                self.index += 1;
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            self.index += 1;
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.index += 1;
            }
            let exponent_start = self.index;
            while matches!(self.peek_char(), Some('0'..='9')) {
                self.index += 1;
            }
            if exponent_start == self.index {
                return Err(CompileError::new("invalid exponent", self.index));
            }
        }

        let token = &self.source[start..self.index];
        let value = token
            .parse::<f64>()
            .map_err(|_| CompileError::new(format!("invalid number '{token}'"), start))?;
        Ok(Node::Number(value))
    }

    fn parse_identifier(&mut self) -> Result<Node, CompileError> {
        let start = self.index;
        while matches!(
            self.peek_char(),
            Some('a'..='z') | Some('A'..='Z') | Some('_') | Some('0'..='9')
        ) {
            self.index += 1;
        }
        let name = &self.source[start..self.index];

        self.skip_whitespace();
        if self.peek_char() == Some('(') {
            let Some(func) = lookup_func(name) else {
                return Err(CompileError::new(format!("unknown function '{name}'"), start));
            };
            self.index += 1;
            let args = self.parse_args()?;
            check_arity(func, args.len(), start)?;
            return Ok(Node::Call(func, args));
        }

        if let Some(var) = lookup_var(name) {
            Ok(Node::Var(var))
        } else if let Some(value) = lookup_const(name) {
            Ok(Node::Number(value))
        } else {
            Err(CompileError::new(format!("unknown name '{name}'"), start))
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Node>, CompileError> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek_char() == Some(')') {
            self.index += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_comparison()?);
            self.skip_whitespace();
            match self.peek_char() {
                Some(',') => {
                    self.index += 1;
                }
                Some(')') => {
                    self.index += 1;
                    return Ok(args);
                }
                _ => {
                    return Err(CompileError::new("expected ',' or ')'", self.index));
                }
            }
        }
    }

    fn expect(&mut self, token: char) -> Result<(), CompileError> {
        self.skip_whitespace();
        if self.peek_char() != Some(token) {
            return Err(CompileError::new(format!("expected '{token}'"), self.index));
        }
        self.index += 1;
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(' ' | '\t' | '\n' | '\r')) {
            self.index += 1;
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.peek_char_at(0)
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.bytes.get(self.index + offset).map(|byte| *byte as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> f64 {
        Program::compile(source)
            .unwrap()
            .sample(&Env::default())
            .unwrap()
    }

    fn eval_with(source: &str, env: Env) -> f64 {
        Program::compile(source).unwrap().sample(&env).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1+2*3"), 7.0);
        assert_eq!(eval("(1+2)*3"), 9.0);
        assert_eq!(eval("10-4-3"), 3.0);
        assert_eq!(eval("7%4*2"), 6.0);
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(eval("2^3^2"), 512.0);
        assert_eq!(eval("2^2*3"), 12.0);
        // Unary minus binds tighter than the power operator.
        assert_eq!(eval("-2^2"), 4.0);
        assert_eq!(eval("0-2^2"), -4.0);
    }

    #[test]
    fn test_unary_chains() {
        assert_eq!(eval("--5"), 5.0);
        assert_eq!(eval("+-+3"), -3.0);
        assert_eq!(eval("2--3"), 5.0);
    }

    #[test]
    fn test_comparisons_yield_unit_values() {
        assert_eq!(eval("1<2"), 1.0);
        assert_eq!(eval("2<=1"), 0.0);
        assert_eq!(eval("3==3"), 1.0);
        assert_eq!(eval("3!=3"), 0.0);
        assert_eq!(eval("1+1>=2"), 1.0);
    }

    #[test]
    fn test_variables_and_constants() {
        let env = Env {
            t: 1.5,
            i: 7.0,
            x: 3.0,
            y: -2.0,
            mx: 0.5,
            my: 0.25,
            c: 100.0,
        };
        assert_eq!(eval_with("t", env), 1.5);
        assert_eq!(eval_with("i+c", env), 107.0);
        assert_eq!(eval_with("x*y", env), -6.0);
        assert_eq!(eval_with("mx+my", env), 0.75);
        assert!((eval("pi") - std::f64::consts::PI).abs() < 1e-12);
        assert!((eval("tau/pi") - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(eval("sin(0)"), 0.0);
        assert!((eval("cos(0)") - 1.0).abs() < 1e-12);
        assert_eq!(eval("abs(-4)"), 4.0);
        assert_eq!(eval("max(1, 2, 3)"), 3.0);
        assert_eq!(eval("min(1, -2, 3)"), -2.0);
        assert!((eval("atan2(1, 1)") - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(eval("pow(2, 10)"), 1024.0);
        assert_eq!(eval("hypot(3, 4)"), 5.0);
        assert_eq!(eval("floor(1.9) + ceil(0.1)"), 2.0);
        assert_eq!(eval("sign(-9)"), -1.0);
        assert_eq!(eval("sign(0)"), 0.0);
        assert!((eval("log(e)") - 1.0).abs() < 1e-12);
        assert_eq!(eval("sqrt((3-0)^2+(4-0)^2)"), 5.0);
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(eval("  1 +  2\t*\n3 "), 7.0);
        assert_eq!(eval("max ( 1 , 2 )"), 2.0);
    }

    #[test]
    fn test_compile_failures() {
        assert!(Program::compile("").is_err());
        assert!(Program::compile("{{{").is_err());
        assert!(Program::compile("undefinedVar").is_err());
        assert!(Program::compile("1+").is_err());
        assert!(Program::compile("(1+2").is_err());
        assert!(Program::compile("nosuchfn(1)").is_err());
        assert!(Program::compile("1 2").is_err());
    }

    #[test]
    fn test_arity_errors() {
        assert!(Program::compile("sin()").is_err());
        assert!(Program::compile("sin(1, 2)").is_err());
        assert!(Program::compile("atan2(1)").is_err());
        assert!(Program::compile("max(1)").is_err());
        assert!(Program::compile("random(1)").is_err());
    }

    #[test]
    fn test_non_finite_results_are_errors() {
        let div = Program::compile("1/0").unwrap();
        assert_eq!(div.sample(&Env::default()), Err(EvalError::NonFinite));
        let nan = Program::compile("0/0").unwrap();
        assert_eq!(nan.sample(&Env::default()), Err(EvalError::NonFinite));
        let log = Program::compile("log(0)").unwrap();
        assert_eq!(log.sample(&Env::default()), Err(EvalError::NonFinite));
    }

    #[test]
    fn test_zero_fallback() {
        assert_eq!(Program::zero().sample(&Env::default()), Ok(0.0));
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(eval("1e3"), 1000.0);
        assert_eq!(eval("2.5e-1"), 0.25);
        assert!(Program::compile("1e").is_err());
    }
}
