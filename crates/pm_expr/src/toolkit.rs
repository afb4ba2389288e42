//! Provide parameter substitution and predicate merging.

use core::borrow::Borrow;

use crate::visit::{ExprRewriter, rewrite_lambda};
use crate::{ArgumentError, BinaryOp, Expr, Lambda, MergeOperator, Param, Type};

// -----------------------------------------------------------------------------
// Parameter replacement

/// Replaces parameters whose type matches.
struct ReplaceByType<'a> {
    ty: Type,
    replacement: &'a Param,
}

impl ExprRewriter for ReplaceByType<'_> {
    fn rewrite_parameter(&mut self, param: &Param) -> Expr {
        Expr::Parameter(self.rewrite_binder(param))
    }

    fn rewrite_binder(&mut self, param: &Param) -> Param {
        if param.ty() == self.ty {
            self.replacement.clone()
        } else {
            param.clone()
        }
    }
}

/// Replaces one parameter, matched by identity.
struct Rebind<'a> {
    from: &'a Param,
    to: &'a Param,
}

impl ExprRewriter for Rebind<'_> {
    fn rewrite_parameter(&mut self, param: &Param) -> Expr {
        Expr::Parameter(self.rewrite_binder(param))
    }

    fn rewrite_binder(&mut self, param: &Param) -> Param {
        if param == self.from {
            self.to.clone()
        } else {
            param.clone()
        }
    }
}

/// Returns a copy of `expr` where every parameter of type `ty` is replaced by
/// `replacement`.
///
/// Every node kind is rewritten, including the binders of nested lambdas.
/// The input is left untouched.
///
/// ```
/// use pm_expr::{Expr, Param, Type, replace_parameter};
///
/// let old = Param::new::<i64>("old");
/// let new = Param::new::<i64>("new");
/// let expr = old.to_expr() + Expr::constant(1_i64);
///
/// let replaced = replace_parameter(&expr, Type::of::<i64>(), &new);
/// assert_eq!(replaced.to_string(), "(new + 1)");
/// assert!(replaced.references(&new));
/// assert!(!replaced.references(&old));
/// ```
pub fn replace_parameter(expr: &Expr, ty: Type, replacement: &Param) -> Expr {
    ReplaceByType { ty, replacement }.rewrite(expr)
}

impl Lambda {
    /// Returns a copy of the lambda where every parameter of type `ty`,
    /// in the parameter list and in the body, is replaced by `replacement`.
    pub fn replace_parameter(&self, ty: Type, replacement: &Param) -> Lambda {
        rewrite_lambda(&mut ReplaceByType { ty, replacement }, self)
    }

    /// Returns a copy of the lambda where `from` is replaced by `to`.
    pub fn rebind(&self, from: &Param, to: &Param) -> Lambda {
        rewrite_lambda(&mut Rebind { from, to }, self)
    }
}

// -----------------------------------------------------------------------------
// Merging

fn single_param(lambda: &Lambda) -> Result<&Param, ArgumentError> {
    match lambda.params() {
        [param] => Ok(param),
        params => Err(ArgumentError::ParameterCount {
            argument: "expressions",
            expected: 1,
            found: params.len(),
        }),
    }
}

fn check_predicate(lambda: &Lambda) -> Result<(), ArgumentError> {
    let found = lambda.static_type();
    if found == Type::of::<bool>() {
        Ok(())
    } else {
        Err(ArgumentError::ResultType {
            argument: "expressions",
            expected: Type::of::<bool>(),
            found,
        })
    }
}

/// Folds single-parameter predicates left to right with `op`.
///
/// The result binds the parameter of the first predicate; the bodies of the
/// others are rebound onto it so the merged lambda can be evaluated.
///
/// # Errors
///
/// - [`ArgumentError::Empty`] when `exprs` yields nothing.
/// - [`ArgumentError::ParameterCount`] when a lambda does not take exactly one
///   parameter.
/// - [`ArgumentError::IncompatibleParameter`] when parameter types differ.
/// - [`ArgumentError::ResultType`] when a body is not boolean.
///
/// ```
/// use pm_expr::{Expr, Lambda, MergeOperator, Param, merge_expressions};
///
/// let a = Param::new::<i64>("a");
/// let b = Param::new::<i64>("b");
/// let positive = Lambda::new([a.clone()], a.to_expr().greater_than(Expr::constant(0_i64)));
/// let small = Lambda::new([b.clone()], b.to_expr().less_than(Expr::constant(10_i64)));
///
/// let both = merge_expressions([positive, small], MergeOperator::And).unwrap();
/// assert_eq!(both.to_string(), "|a: i64| ((a > 0) && (a < 10))");
///
/// let none: [Lambda; 0] = [];
/// assert!(merge_expressions(none, MergeOperator::Or).is_err());
/// ```
pub fn merge_expressions<I>(exprs: I, op: MergeOperator) -> Result<Lambda, ArgumentError>
where
    I: IntoIterator,
    I::Item: Borrow<Lambda>,
{
    let mut iter = exprs.into_iter();
    let first = iter.next().ok_or(ArgumentError::Empty {
        argument: "expressions",
    })?;
    let first = first.borrow();
    let param = single_param(first)?;
    check_predicate(first)?;

    let op = BinaryOp::from(op);
    let mut body = first.body().clone();
    for next in iter {
        let next = next.borrow();
        let next_param = single_param(next)?;
        if next_param.ty() != param.ty() {
            return Err(ArgumentError::IncompatibleParameter {
                argument: "expressions",
                expected: param.ty(),
                found: next_param.ty(),
            });
        }
        check_predicate(next)?;

        let right = if next_param == param {
            next.body().clone()
        } else {
            Rebind {
                from: next_param,
                to: param,
            }
            .rewrite(next.body())
        };
        body = Expr::binary(op, body, right);
    }
    Ok(Lambda::new([param.clone()], body))
}

/// Folds predicates with [`MergeOperator::And`].
#[inline]
pub fn merge_all<I>(exprs: I) -> Result<Lambda, ArgumentError>
where
    I: IntoIterator,
    I::Item: Borrow<Lambda>,
{
    merge_expressions(exprs, MergeOperator::And)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    use super::{merge_all, merge_expressions, replace_parameter};
    use crate::{ArgumentError, Expr, Lambda, MergeOperator, Param, Type, property};

    struct Endpoint {
        host: String,
        port: u16,
    }

    fn gt(param: &Param, n: i64) -> Lambda {
        Lambda::new([param.clone()], param.to_expr().greater_than(Expr::constant(n)))
    }

    #[test]
    fn replace_reaches_nested_lambdas() {
        let outer = Param::new::<i64>("x");
        let inner = Param::new::<i64>("y");
        let other = Param::new::<u8>("z");
        let nested = Lambda::new(
            [inner.clone(), other.clone()],
            inner.to_expr() + outer.to_expr(),
        );
        let expr = Expr::from(nested);
        let fresh = Param::new::<i64>("n");

        let replaced = replace_parameter(&expr, Type::of::<i64>(), &fresh);
        assert_eq!(replaced.to_string(), "|n: i64, z: u8| (n + n)");
        assert!(replaced.references(&fresh));
        assert!(!replaced.references(&outer));
        assert_eq!(expr.to_string(), "|y: i64, z: u8| (y + x)");
    }

    #[test]
    fn replace_reaches_member_targets() {
        let port = property!(Endpoint, port: u16).into_ref();
        let host = property!(Endpoint, host: String).into_ref();
        let e = Param::new::<Endpoint>("e");
        let lambda = Lambda::new(
            [e.clone()],
            e.member(&port).equals(Expr::constant(80_u64)) | e.member(&host).equals(Expr::constant("a")),
        );
        let fresh = Param::new::<Endpoint>("target");
        let replaced = lambda.replace_parameter(Type::of::<Endpoint>(), &fresh);
        assert_eq!(replaced.params(), [fresh.clone()]);
        assert_eq!(
            replaced.to_string(),
            "|target: Endpoint| ((target.port == 80) || (target.host == \"a\"))"
        );
    }

    #[test]
    fn merge_of_one_is_identity() {
        let p = Param::new::<i64>("p");
        let single = gt(&p, 3);
        let merged = merge_expressions([&single], MergeOperator::Xor).unwrap();
        assert_eq!(merged, single);
    }

    #[test]
    fn merge_rebinds_onto_first_parameter() {
        let [a, b, c] = ["a", "b", "c"].map(Param::new::<i64>);
        let merged = merge_all([gt(&a, 1), gt(&b, 2), gt(&c, 3)]).unwrap();
        assert_eq!(merged.params(), [a.clone()]);
        assert!(!merged.body().references(&b));
        assert!(!merged.body().references(&c));
        assert_eq!(merged.to_string(), "|a: i64| (((a > 1) && (a > 2)) && (a > 3))");
    }

    #[test]
    fn merge_rejects_bad_input() {
        let empty: Vec<Lambda> = Vec::new();
        assert_eq!(
            merge_all(&empty).unwrap_err(),
            ArgumentError::Empty {
                argument: "expressions"
            }
        );

        let p = Param::new::<i64>("p");
        let q = Param::new::<u8>("q");
        let wrong_type = Lambda::new([q.clone()], q.to_expr().equals(Expr::constant(1_u8)));
        assert!(matches!(
            merge_all([gt(&p, 0), wrong_type]),
            Err(ArgumentError::IncompatibleParameter { .. })
        ));

        let not_bool = Lambda::new([p.clone()], p.to_expr() + Expr::constant(1_i64));
        assert!(matches!(
            merge_all([not_bool]),
            Err(ArgumentError::ResultType { .. })
        ));

        let two = Lambda::new([p.clone(), p.clone()], Expr::constant(true));
        assert!(matches!(
            merge_all([two]),
            Err(ArgumentError::ParameterCount { found: 2, .. })
        ));
    }
}
