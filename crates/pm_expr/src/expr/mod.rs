//! Provide the symbolic expression tree.
//!
//! An [`Expr`] is an immutable tagged tree. Trees are built with the
//! constructors and operator overloads below, inspected through
//! [`ExprVisitor`](crate::ExprVisitor), and transformed into new trees
//! through [`ExprRewriter`](crate::ExprRewriter).

mod lambda;
mod param;

pub use lambda::{Function, Lambda};
pub use param::Param;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::ops;

use crate::{MemberRef, Type, Value};

// -----------------------------------------------------------------------------
// Operators

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Boolean negation.
    Not,
    /// Arithmetic negation.
    Negate,
}

impl UnaryOp {
    /// Returns the operator symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
        }
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Returns the operator symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "^",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// Returns `true` for `&&`, `||` and `^`.
    #[inline]
    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }

    /// Returns `true` for the six comparison operators.
    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// The operator used to fold predicates in
/// [`merge_expressions`](crate::merge_expressions).
///
/// Only associative boolean operators are offered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeOperator {
    #[default]
    And,
    Or,
    Xor,
}

impl From<MergeOperator> for BinaryOp {
    #[inline]
    fn from(op: MergeOperator) -> Self {
        match op {
            MergeOperator::And => BinaryOp::And,
            MergeOperator::Or => BinaryOp::Or,
            MergeOperator::Xor => BinaryOp::Xor,
        }
    }
}

// -----------------------------------------------------------------------------
// MemberAccess

/// A read of `member` on the value produced by `target`.
#[derive(Clone)]
pub struct MemberAccess {
    target: Box<Expr>,
    member: MemberRef,
}

impl MemberAccess {
    /// Creates a member access node.
    #[inline]
    pub fn new(target: Expr, member: MemberRef) -> Self {
        Self {
            target: Box::new(target),
            member,
        }
    }

    /// Returns the expression producing the owner instance.
    #[inline(always)]
    pub fn target(&self) -> &Expr {
        &self.target
    }

    /// Returns the member descriptor.
    #[inline(always)]
    pub fn member(&self) -> &MemberRef {
        &self.member
    }
}

impl PartialEq for MemberAccess {
    fn eq(&self, other: &Self) -> bool {
        self.member.id() == other.member.id() && self.target == other.target
    }
}

impl fmt::Debug for MemberAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberAccess")
            .field("target", &self.target)
            .field("member", &self.member.id())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Expr

/// A node of a symbolic expression tree.
///
/// Equality is structural. Parameters compare by identity, members by
/// [`MemberId`](crate::MemberId), and constants by kind and value.
#[derive(Clone, Debug)]
pub enum Expr {
    Constant(Value),
    Parameter(Param),
    Member(MemberAccess),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
    Lambda(Lambda),
    Assign {
        target: MemberAccess,
        value: Box<Expr>,
    },
}

impl Expr {
    /// A constant node.
    #[inline]
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// A read of `member` on `self`.
    #[inline]
    pub fn member(self, member: &MemberRef) -> Self {
        Expr::Member(MemberAccess::new(self, member.clone()))
    }

    /// A unary node.
    #[inline]
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// A binary node.
    #[inline]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// A conditional node, `if test { if_true } else { if_false }`.
    #[inline]
    pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// A call of a host function.
    #[inline]
    pub fn call(function: Function, args: impl IntoIterator<Item = Expr>) -> Self {
        Expr::Call {
            function,
            args: args.into_iter().collect(),
        }
    }

    /// An assignment of `value` to a member.
    #[inline]
    pub fn assign(target: MemberAccess, value: Expr) -> Self {
        Expr::Assign {
            target,
            value: Box::new(value),
        }
    }

    /// `self == other`.
    #[inline]
    pub fn equals(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    /// `self != other`.
    #[inline]
    pub fn not_equals(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Ne, self, other)
    }

    /// `self < other`.
    #[inline]
    pub fn less_than(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    /// `self <= other`.
    #[inline]
    pub fn less_or_equal(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Le, self, other)
    }

    /// `self > other`.
    #[inline]
    pub fn greater_than(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    /// `self >= other`.
    #[inline]
    pub fn greater_or_equal(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Ge, self, other)
    }

    /// Returns the type this expression evaluates to.
    ///
    /// Derived structurally: comparisons and logical operators produce
    /// `bool`, arithmetic keeps the type of its left operand, a call
    /// produces the declared return type of its function.
    pub fn static_type(&self) -> Type {
        match self {
            Expr::Constant(value) => value.ty(),
            Expr::Parameter(param) => param.ty(),
            Expr::Member(access) => access.member().value_type(),
            Expr::Unary { op: UnaryOp::Not, .. } => Type::of::<bool>(),
            Expr::Unary { operand, .. } => operand.static_type(),
            Expr::Binary { op, left, .. } => {
                if op.is_logical() || op.is_comparison() {
                    Type::of::<bool>()
                } else {
                    left.static_type()
                }
            }
            Expr::Conditional { if_true, .. } => if_true.static_type(),
            Expr::Call { function, .. } => function.return_type(),
            Expr::Lambda(_) => Type::of::<Lambda>(),
            Expr::Assign { .. } => Type::of::<()>(),
        }
    }

    /// Calls `f` on every direct child, in evaluation order.
    ///
    /// The body of a nested lambda counts as its only child.
    pub fn for_each_child(&self, mut f: impl FnMut(&Expr)) {
        match self {
            Expr::Constant(_) | Expr::Parameter(_) => {}
            Expr::Member(access) => f(access.target()),
            Expr::Unary { operand, .. } => f(operand),
            Expr::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                f(test);
                f(if_true);
                f(if_false);
            }
            Expr::Call { args, .. } => args.iter().for_each(f),
            Expr::Lambda(lambda) => f(lambda.body()),
            Expr::Assign { target, value } => {
                f(target.target());
                f(value);
            }
        }
    }

    /// Returns `true` if the node is a member read.
    #[inline]
    pub fn is_member(&self) -> bool {
        matches!(self, Expr::Member(_))
    }

    /// Returns the member access, if the node is one.
    #[inline]
    pub fn as_member(&self) -> Option<&MemberAccess> {
        match self {
            Expr::Member(access) => Some(access),
            _ => None,
        }
    }

    /// Returns the parameter, if the node is one.
    #[inline]
    pub fn as_parameter(&self) -> Option<&Param> {
        match self {
            Expr::Parameter(param) => Some(param),
            _ => None,
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Constant(a), Expr::Constant(b)) => a.kind() == b.kind() && a == b,
            (Expr::Parameter(a), Expr::Parameter(b)) => a == b,
            (Expr::Member(a), Expr::Member(b)) => a == b,
            (
                Expr::Unary { op, operand },
                Expr::Unary {
                    op: op2,
                    operand: operand2,
                },
            ) => op == op2 && operand == operand2,
            (
                Expr::Binary { op, left, right },
                Expr::Binary {
                    op: op2,
                    left: left2,
                    right: right2,
                },
            ) => op == op2 && left == left2 && right == right2,
            (
                Expr::Conditional {
                    test,
                    if_true,
                    if_false,
                },
                Expr::Conditional {
                    test: test2,
                    if_true: if_true2,
                    if_false: if_false2,
                },
            ) => test == test2 && if_true == if_true2 && if_false == if_false2,
            (
                Expr::Call { function, args },
                Expr::Call {
                    function: function2,
                    args: args2,
                },
            ) => function == function2 && args == args2,
            (Expr::Lambda(a), Expr::Lambda(b)) => a == b,
            (
                Expr::Assign { target, value },
                Expr::Assign {
                    target: target2,
                    value: value2,
                },
            ) => target == target2 && value == value2,
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Parameter(param) => write!(f, "{param}"),
            Expr::Member(access) => write!(f, "{}.{}", access.target(), access.member().name()),
            Expr::Unary { op, operand } => write!(f, "{}{operand}", op.symbol()),
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "(if {test} {{ {if_true} }} else {{ {if_false} }})"),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Lambda(lambda) => write!(f, "{lambda}"),
            Expr::Assign { target, value } => {
                write!(f, "{}.{} = {value}", target.target(), target.member().name())
            }
        }
    }
}

impl From<Lambda> for Expr {
    #[inline]
    fn from(lambda: Lambda) -> Self {
        Expr::Lambda(lambda)
    }
}

impl From<Value> for Expr {
    #[inline]
    fn from(value: Value) -> Self {
        Expr::Constant(value)
    }
}

// -----------------------------------------------------------------------------
// Operator overloads

impl ops::Not for Expr {
    type Output = Expr;

    #[inline]
    fn not(self) -> Expr {
        Expr::unary(UnaryOp::Not, self)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    #[inline]
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Negate, self)
    }
}

macro_rules! impl_binary_ops {
    ($($trait:ident :: $method:ident => $op:ident;)*) => {
        $(
            impl ops::$trait for Expr {
                type Output = Expr;

                #[inline]
                fn $method(self, rhs: Expr) -> Expr {
                    Expr::binary(BinaryOp::$op, self, rhs)
                }
            }
        )*
    };
}

impl_binary_ops! {
    BitAnd::bitand => And;
    BitOr::bitor => Or;
    BitXor::bitxor => Xor;
    Add::add => Add;
    Sub::sub => Sub;
    Mul::mul => Mul;
    Div::div => Div;
    Rem::rem => Rem;
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use super::{BinaryOp, Expr, Lambda, MergeOperator, Param};
    use crate::{MemberRef, Type, Value, property};

    struct Host {
        name: String,
        port: u16,
    }

    fn port() -> MemberRef {
        property!(Host, port: u16).into_ref()
    }

    #[test]
    fn operators_build_nodes() {
        let expr = Expr::constant(true) & !Expr::constant(false);
        assert_eq!(expr.to_string(), "(true && !false)");
        assert_eq!(expr.static_type(), Type::of::<bool>());

        let sum = Expr::constant(1_i64) + Expr::constant(2_i64) * Expr::constant(3_i64);
        assert_eq!(sum.to_string(), "(1 + (2 * 3))");
        assert_eq!(sum.static_type(), Type::of::<i64>());
    }

    #[test]
    fn member_nodes_use_descriptor_identity() {
        let h = Param::new::<Host>("h");
        let a = h.member(&port());
        let b = h.member(&port());
        assert_eq!(a, b);
        assert_eq!(a.static_type(), Type::of::<u16>());
        assert_eq!(a.to_string(), "h.port");

        let other = Param::new::<Host>("h");
        assert_ne!(a, other.member(&port()));
        let name: MemberRef = property!(Host, name: String).into_ref();
        assert_ne!(a, h.member(&name));
    }

    #[test]
    fn constants_compare_by_kind() {
        assert_eq!(Expr::constant(1_i64), Expr::constant(1_i32));
        assert_ne!(Expr::constant(1_i64), Expr::constant(1_u64));
        assert_ne!(Expr::constant(1_i64), Expr::Constant(Value::Float(1.0)));
    }

    #[test]
    fn children_in_evaluation_order() {
        let c = Expr::conditional(
            Expr::constant(true),
            Expr::constant(1_i64),
            Expr::constant(2_i64),
        );
        let mut seen = alloc::vec::Vec::new();
        c.for_each_child(|child| seen.push(child.to_string()));
        assert_eq!(seen, ["true", "1", "2"]);
        assert_eq!(c.static_type(), Type::of::<i64>());
    }

    #[test]
    fn lambda_display_and_type() {
        let h = Param::new::<Host>("h");
        let lambda = Lambda::new(
            [h.clone()],
            h.member(&port()).greater_or_equal(Expr::constant(1024_u64)),
        );
        assert_eq!(lambda.to_string(), "|h: Host| (h.port >= 1024)");
        assert_eq!(Expr::from(lambda).static_type(), Type::of::<Lambda>());
    }

    #[test]
    fn merge_operator_maps_to_logical_ops() {
        assert_eq!(MergeOperator::default(), MergeOperator::And);
        assert_eq!(BinaryOp::from(MergeOperator::Xor), BinaryOp::Xor);
        assert!(BinaryOp::from(MergeOperator::Or).is_logical());
        assert!(BinaryOp::Le.is_comparison());
    }
}
