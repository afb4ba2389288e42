//! Provide read-only and transforming traversals of [`Expr`] trees.

use alloc::boxed::Box;

use crate::{Expr, Lambda, MemberAccess, Param};

// -----------------------------------------------------------------------------
// ExprVisitor

/// A read-only visitor of expression nodes.
///
/// [`Expr::walk`] calls [`visit_expr`](ExprVisitor::visit_expr) for every node
/// in pre-order and descends unless the visitor returns `false`.
///
/// ```
/// use pm_expr::{Expr, ExprVisitor, Param};
///
/// struct CountParams(usize);
///
/// impl ExprVisitor for CountParams {
///     fn visit_expr(&mut self, expr: &Expr) -> bool {
///         if matches!(expr, Expr::Parameter(_)) {
///             self.0 += 1;
///         }
///         true
///     }
/// }
///
/// let x = Param::new::<i64>("x");
/// let expr = x.to_expr() + x.to_expr() * Expr::constant(2_i64);
///
/// let mut counter = CountParams(0);
/// expr.walk(&mut counter);
/// assert_eq!(counter.0, 2);
/// ```
pub trait ExprVisitor {
    /// Visits one node, returns `false` to skip its children.
    fn visit_expr(&mut self, expr: &Expr) -> bool;
}

impl Expr {
    /// Walks the tree in pre-order with `visitor`.
    pub fn walk<V: ExprVisitor + ?Sized>(&self, visitor: &mut V) {
        if visitor.visit_expr(self) {
            self.for_each_child(|child| child.walk(visitor));
        }
    }

    /// Returns `true` if `param` is referenced anywhere in the tree.
    pub fn references(&self, param: &Param) -> bool {
        struct Finder<'a> {
            param: &'a Param,
            found: bool,
        }

        impl ExprVisitor for Finder<'_> {
            fn visit_expr(&mut self, expr: &Expr) -> bool {
                if let Expr::Parameter(p) = expr {
                    self.found |= p == self.param;
                }
                !self.found
            }
        }

        let mut finder = Finder { param, found: false };
        self.walk(&mut finder);
        finder.found
    }
}

// -----------------------------------------------------------------------------
// ExprRewriter

/// A transforming visitor producing a new tree.
///
/// The default methods copy the tree unchanged. Implementors override the
/// hooks they care about and call [`rewrite_children`] to keep recursing.
pub trait ExprRewriter {
    /// Rewrites any node. The default rebuilds it from rewritten children.
    fn rewrite(&mut self, expr: &Expr) -> Expr {
        rewrite_children(self, expr)
    }

    /// Rewrites a parameter reference.
    fn rewrite_parameter(&mut self, param: &Param) -> Expr {
        Expr::Parameter(param.clone())
    }

    /// Rewrites a binder in a lambda parameter list.
    fn rewrite_binder(&mut self, param: &Param) -> Param {
        param.clone()
    }
}

/// Rebuilds `expr` from its rewritten children.
///
/// Parameters are passed to [`ExprRewriter::rewrite_parameter`], nested
/// lambdas to [`rewrite_lambda`].
pub fn rewrite_children<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> Expr {
    match expr {
        Expr::Constant(value) => Expr::Constant(value.clone()),
        Expr::Parameter(param) => rewriter.rewrite_parameter(param),
        Expr::Member(access) => Expr::Member(rewrite_member(rewriter, access)),
        Expr::Unary { op, operand } => Expr::Unary {
            op: *op,
            operand: Box::new(rewriter.rewrite(operand)),
        },
        Expr::Binary { op, left, right } => Expr::Binary {
            op: *op,
            left: Box::new(rewriter.rewrite(left)),
            right: Box::new(rewriter.rewrite(right)),
        },
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => Expr::Conditional {
            test: Box::new(rewriter.rewrite(test)),
            if_true: Box::new(rewriter.rewrite(if_true)),
            if_false: Box::new(rewriter.rewrite(if_false)),
        },
        Expr::Call { function, args } => Expr::Call {
            function: function.clone(),
            args: args.iter().map(|arg| rewriter.rewrite(arg)).collect(),
        },
        Expr::Lambda(lambda) => Expr::Lambda(rewrite_lambda(rewriter, lambda)),
        Expr::Assign { target, value } => Expr::Assign {
            target: rewrite_member(rewriter, target),
            value: Box::new(rewriter.rewrite(value)),
        },
    }
}

/// Rewrites the parameter list and the body of a lambda.
pub fn rewrite_lambda<R: ExprRewriter + ?Sized>(rewriter: &mut R, lambda: &Lambda) -> Lambda {
    let params: alloc::vec::Vec<Param> = lambda
        .params()
        .iter()
        .map(|param| rewriter.rewrite_binder(param))
        .collect();
    let body = rewriter.rewrite(lambda.body());
    Lambda::new(params, body)
}

fn rewrite_member<R: ExprRewriter + ?Sized>(rewriter: &mut R, access: &MemberAccess) -> MemberAccess {
    MemberAccess::new(rewriter.rewrite(access.target()), access.member().clone())
}

// -----------------------------------------------------------------------------
// Tests
