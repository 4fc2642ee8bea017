use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use ordered_float::OrderedFloat;

/// A location in the source text, as recorded by the parser
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Pos {
    pub offset_in_line: usize,
    pub line: usize,
}

impl Pos {
    pub fn new(line: usize, offset_in_line: usize) -> Pos {
        Pos {
            offset_in_line,
            line,
        }
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.offset_in_line)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Program(pub Vec<Stmt>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunDecl {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stmt {
    pub pos: Pos,
    pub inner: StmtInner,
}

impl Stmt {
    pub fn new(pos: Pos, inner: StmtInner) -> Stmt {
        Stmt { pos, inner }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StmtInner {
    VarDecl {
        name: String,
        init: Option<Expr>,
    },
    // Shared so that every evaluation of the declaration hands out the same body
    FunDecl(Rc<FunDecl>),
    Expr(Expr),
    Print(Expr),
    Block(Vec<Stmt>),
    If {
        expr: Expr,
        then: Box<Stmt>,
        or_else: Option<Box<Stmt>>,
    },
    Loop {
        expr: Expr,
        body: Box<Stmt>,
    },
    Break,
    Return(Option<Expr>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expr {
    // For operators this is the operator token, for calls the closing paren
    pub pos: Pos,
    pub inner: ExprInner,
}

impl Expr {
    pub fn new(pos: Pos, inner: ExprInner) -> Expr {
        Expr { pos, inner }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprInner {
    Ternary {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Postfix {
        op: PostfixOp,
        expr: Box<Expr>,
    },
    Group(Box<Expr>),
    Literal(Literal),
    Variable {
        name: String,
    },
    Assignment {
        target: String,
        expr: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ExprInner::Literal(lit) => write!(f, "{}", lit),
            ExprInner::Group(expr) => write!(f, "(group {})", expr),
            ExprInner::Unary { op, expr } => write!(f, "({} {})", op, expr),
            ExprInner::Postfix { op, expr } => write!(f, "(post{} {})", op, expr),
            ExprInner::Binary { left, op, right } => write!(f, "({} {} {})", op, left, right),
            ExprInner::Ternary {
                test,
                if_true,
                if_false,
            } => write!(f, "(? {} : {} {})", test, if_true, if_false),
            ExprInner::Variable { name } => write!(f, "(ident {})", name),
            ExprInner::Assignment { target, expr } => write!(f, "(= {} {})", target, expr),
            ExprInner::Logical { left, op, right } => write!(f, "({} {} {})", op, left, right),
            ExprInner::Call { callee, arguments } => {
                write!(f, "(call {}", callee)?;
                for arg in arguments {
                    write!(f, " {}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Equal => f.write_str("=="),
            BinaryOp::NotEqual => f.write_str("!="),
            BinaryOp::LessThan => f.write_str("<"),
            BinaryOp::LessThanEqual => f.write_str("<="),
            BinaryOp::GreaterThan => f.write_str(">"),
            BinaryOp::GreaterThanEqual => f.write_str(">="),
            BinaryOp::Add => f.write_str("+"),
            BinaryOp::Subtract => f.write_str("-"),
            BinaryOp::Multiply => f.write_str("*"),
            BinaryOp::Divide => f.write_str("/"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negative,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => f.write_str("!"),
            UnaryOp::Negative => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

impl PostfixOp {
    pub fn delta(self) -> f64 {
        match self {
            PostfixOp::Increment => 1f64,
            PostfixOp::Decrement => -1f64,
        }
    }
}

impl Display for PostfixOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PostfixOp::Increment => f.write_str("++"),
            PostfixOp::Decrement => f.write_str("--"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => f.write_str("and"),
            LogicalOp::Or => f.write_str("or"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(OrderedFloat<f64>),
    String(String),
    Boolean(bool),
    Nil,
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(OrderedFloat(dbl)) => write!(f, "{}", dbl),
            Literal::String(s) => f.write_str(s),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Nil => f.write_str("nil"),
        }
    }
}

/// Terse constructors for assembling programs by hand in tests.
/// Every node is placed on line 1 unless a position is given explicitly.
#[cfg(test)]
pub mod build {
    use super::*;

    fn at() -> Pos {
        Pos::new(1, 0)
    }

    fn expr(inner: ExprInner) -> Expr {
        Expr::new(at(), inner)
    }

    fn stmt(inner: StmtInner) -> Stmt {
        Stmt::new(at(), inner)
    }

    pub fn num(n: f64) -> Expr {
        expr(ExprInner::Literal(Literal::Number(OrderedFloat(n))))
    }

    pub fn text(s: &str) -> Expr {
        expr(ExprInner::Literal(Literal::String(s.to_string())))
    }

    pub fn boolean(b: bool) -> Expr {
        expr(ExprInner::Literal(Literal::Boolean(b)))
    }

    pub fn nil() -> Expr {
        expr(ExprInner::Literal(Literal::Nil))
    }

    pub fn var(name: &str) -> Expr {
        expr(ExprInner::Variable {
            name: name.to_string(),
        })
    }

    pub fn group(inner: Expr) -> Expr {
        expr(ExprInner::Group(Box::new(inner)))
    }

    pub fn assign(target: &str, value: Expr) -> Expr {
        expr(ExprInner::Assignment {
            target: target.to_string(),
            expr: Box::new(value),
        })
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
        expr(ExprInner::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        expr(ExprInner::Unary {
            op,
            expr: Box::new(operand),
        })
    }

    pub fn postfix(operand: Expr, op: PostfixOp) -> Expr {
        expr(ExprInner::Postfix {
            op,
            expr: Box::new(operand),
        })
    }

    pub fn logical(left: Expr, op: LogicalOp, right: Expr) -> Expr {
        expr(ExprInner::Logical {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn ternary(test: Expr, if_true: Expr, if_false: Expr) -> Expr {
        expr(ExprInner::Ternary {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    pub fn call(callee: Expr, arguments: Vec<Expr>) -> Expr {
        expr(ExprInner::Call {
            callee: Box::new(callee),
            arguments,
        })
    }

    pub fn at_pos(pos: Pos, mut node: Expr) -> Expr {
        node.pos = pos;
        node
    }

    pub fn expr_stmt(e: Expr) -> Stmt {
        stmt(StmtInner::Expr(e))
    }

    pub fn print(e: Expr) -> Stmt {
        stmt(StmtInner::Print(e))
    }

    pub fn var_decl(name: &str, init: Option<Expr>) -> Stmt {
        stmt(StmtInner::VarDecl {
            name: name.to_string(),
            init,
        })
    }

    pub fn block(stmts: Vec<Stmt>) -> Stmt {
        stmt(StmtInner::Block(stmts))
    }

    pub fn if_stmt(test: Expr, then: Stmt, or_else: Option<Stmt>) -> Stmt {
        stmt(StmtInner::If {
            expr: test,
            then: Box::new(then),
            or_else: or_else.map(Box::new),
        })
    }

    pub fn while_loop(test: Expr, body: Stmt) -> Stmt {
        stmt(StmtInner::Loop {
            expr: test,
            body: Box::new(body),
        })
    }

    pub fn brk() -> Stmt {
        stmt(StmtInner::Break)
    }

    pub fn ret(value: Option<Expr>) -> Stmt {
        stmt(StmtInner::Return(value))
    }

    pub fn fun(name: &str, parameters: &[&str], body: Vec<Stmt>) -> Stmt {
        stmt(StmtInner::FunDecl(Rc::new(FunDecl {
            name: name.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            body,
        })))
    }

    pub fn program(stmts: Vec<Stmt>) -> Program {
        Program(stmts)
    }
}
