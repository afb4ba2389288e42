//! Compile lambdas into evaluable closures.
//!
//! Compilation resolves every parameter to its argument slot and checks
//! member targets against the static type of their owner expression.
//! Evaluation works on [`Value`]s, borrowing the arguments for member reads.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use crate::{
    AnyValue, BinaryOp, CompileError, EvalError, Expr, Lambda, Member, Param, Type, UnaryOp, Value,
};

// -----------------------------------------------------------------------------
// Operand

/// An intermediate result.
enum Operand<'a> {
    Borrowed(&'a dyn Any, Type),
    Owned(AnyValue),
    Value(Value),
}

impl Operand<'_> {
    fn into_value(self) -> Result<Value, EvalError> {
        match self {
            Operand::Borrowed(value, ty) => {
                Value::from_ref(value).ok_or(EvalError::BorrowedArgument { ty })
            }
            Operand::Owned(value) => Ok(Value::from_any(value)),
            Operand::Value(value) => Ok(value),
        }
    }

    fn read_member(&self, member: &dyn Member) -> Result<AnyValue, EvalError> {
        let result = match self {
            Operand::Borrowed(value, _) => member.get_any(*value),
            Operand::Owned(value) => member.get_any(value.as_any()),
            Operand::Value(value) => member.get_any(value.clone().into_any().as_any()),
        };
        result.map_err(|_| EvalError::MemberTarget {
            member: member.id().name_cow(),
            owner: member.owner(),
        })
    }

    fn truth(self) -> Result<bool, EvalError> {
        match self.into_value()? {
            Value::Bool(value) => Ok(value),
            other => Err(EvalError::NotBoolean {
                found: other.kind(),
            }),
        }
    }
}

type Thunk = Box<dyn for<'a> Fn(&'a [&'a dyn Any]) -> Result<Operand<'a>, EvalError> + Send + Sync>;

#[inline]
fn thunk<F>(f: F) -> Thunk
where
    F: for<'a> Fn(&'a [&'a dyn Any]) -> Result<Operand<'a>, EvalError> + Send + Sync + 'static,
{
    Box::new(f)
}

// -----------------------------------------------------------------------------
// Compiler

struct Compiler<'p> {
    params: &'p [Param],
}

impl Compiler<'_> {
    fn compile(&self, expr: &Expr) -> Result<Thunk, CompileError> {
        match expr {
            Expr::Constant(value) => {
                let value = value.clone();
                Ok(thunk(move |_| Ok(Operand::Value(value.clone()))))
            }
            Expr::Parameter(param) => {
                let index = self.params.iter().position(|p| p == param).ok_or_else(|| {
                    CompileError::UnboundParameter {
                        name: param.name_cow(),
                        ty: param.ty(),
                    }
                })?;
                let ty = param.ty();
                let arity = self.params.len();
                Ok(thunk(move |frame| match frame.get(index) {
                    Some(arg) => Ok(Operand::Borrowed(*arg, ty)),
                    None => Err(EvalError::ArgumentCount {
                        expected: arity,
                        found: frame.len(),
                    }),
                }))
            }
            Expr::Member(access) => {
                let member = access.member().clone();
                let found = access.target().static_type();
                if found != member.owner() {
                    return Err(CompileError::InvalidTarget {
                        member: member.id().name_cow(),
                        owner: member.owner(),
                        found,
                    });
                }
                let target = self.compile(access.target())?;
                Ok(thunk(move |frame| {
                    let value = target(frame)?.read_member(&*member)?;
                    Ok(Operand::Owned(value))
                }))
            }
            Expr::Unary { op, operand } => {
                let operand = self.compile(operand)?;
                Ok(match op {
                    UnaryOp::Not => thunk(move |frame| {
                        match operand(frame)?.into_value()? {
                            Value::Bool(value) => Ok(Operand::Value(Value::Bool(!value))),
                            other => Err(operand_error("!", &other)),
                        }
                    }),
                    UnaryOp::Negate => {
                        thunk(move |frame| negate(operand(frame)?.into_value()?).map(Operand::Value))
                    }
                })
            }
            Expr::Binary { op, left, right } => {
                let op = *op;
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(match op {
                    BinaryOp::And => thunk(move |frame| {
                        let value = left(frame)?.truth()? && right(frame)?.truth()?;
                        Ok(Operand::Value(Value::Bool(value)))
                    }),
                    BinaryOp::Or => thunk(move |frame| {
                        let value = left(frame)?.truth()? || right(frame)?.truth()?;
                        Ok(Operand::Value(Value::Bool(value)))
                    }),
                    _ => thunk(move |frame| {
                        let l = left(frame)?.into_value()?;
                        let r = right(frame)?.into_value()?;
                        apply(op, l, r).map(Operand::Value)
                    }),
                })
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let test = self.compile(test)?;
                let if_true = self.compile(if_true)?;
                let if_false = self.compile(if_false)?;
                Ok(thunk(move |frame| {
                    if test(frame)?.truth()? {
                        if_true(frame)
                    } else {
                        if_false(frame)
                    }
                }))
            }
            Expr::Call { function, args } => {
                let function = function.clone();
                let args = args
                    .iter()
                    .map(|arg| self.compile(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(thunk(move |frame| {
                    let values = args
                        .iter()
                        .map(|arg| arg(frame).and_then(Operand::into_value))
                        .collect::<Result<Vec<_>, _>>()?;
                    function.call(&values).map(Operand::Value)
                }))
            }
            Expr::Lambda(_) => Err(CompileError::Unsupported { node: "lambda" }),
            Expr::Assign { .. } => Err(CompileError::Unsupported { node: "assign" }),
        }
    }
}

// -----------------------------------------------------------------------------
// Operators

fn operand_error(op: &'static str, value: &Value) -> EvalError {
    EvalError::Operand {
        op,
        found: format!("a {} value", value.kind()),
    }
}

fn operands_error(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::Operand {
        op: op.symbol(),
        found: format!("{} and {} values", left.kind(), right.kind()),
    }
}

fn negate(value: Value) -> Result<Value, EvalError> {
    let overflow = EvalError::Overflow { op: "-" };
    match value {
        Value::Int(v) => v.checked_neg().map(Value::Int).ok_or(overflow),
        Value::UInt(v) => i64::try_from(v)
            .ok()
            .and_then(i64::checked_neg)
            .map(Value::Int)
            .ok_or(overflow),
        Value::Float(v) => Ok(Value::Float(-v)),
        other => Err(operand_error("-", &other)),
    }
}

fn apply(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    if op.is_comparison() {
        let ordering = left.compare(&right).ok_or(EvalError::Incomparable {
            left: left.kind(),
            right: right.kind(),
        })?;
        let value = match op {
            BinaryOp::Eq => ordering.is_eq(),
            BinaryOp::Ne => ordering.is_ne(),
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            _ => ordering.is_ge(),
        };
        return Ok(Value::Bool(value));
    }
    if op.is_logical() {
        return match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
                BinaryOp::And => *a && *b,
                BinaryOp::Or => *a || *b,
                _ => *a ^ *b,
            })),
            _ => Err(operands_error(op, &left, &right)),
        };
    }
    arithmetic(op, left, right)
}

fn as_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Int(v) => Some(i128::from(*v)),
        Value::UInt(v) => Some(i128::from(*v)),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::UInt(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    if let (BinaryOp::Add, Value::Text(a), Value::Text(b)) = (op, &left, &right) {
        let mut text = a.clone();
        text.push_str(b);
        return Ok(Value::Text(text));
    }
    if let (Some(a), Some(b)) = (as_integer(&left), as_integer(&right)) {
        let overflow = EvalError::Overflow { op: op.symbol() };
        if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
            return Err(EvalError::DivideByZero);
        }
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        }
        .ok_or_else(|| overflow.clone())?;
        return if matches!((&left, &right), (Value::UInt(_), Value::UInt(_))) {
            u64::try_from(result).map(Value::UInt).map_err(|_| overflow)
        } else {
            i64::try_from(result).map(Value::Int).map_err(|_| overflow)
        };
    }
    if let (Some(a), Some(b)) = (as_float(&left), as_float(&right)) {
        return Ok(Value::Float(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            _ => a % b,
        }));
    }
    Err(operands_error(op, &left, &right))
}

// -----------------------------------------------------------------------------
// CompiledLambda

/// An evaluable form of a [`Lambda`].
///
/// Arguments are passed as `&dyn Any` and checked against the parameter
/// types on every call.
///
/// ```
/// use pm_expr::{Expr, Lambda, Param, Value};
///
/// let a = Param::new::<i64>("a");
/// let b = Param::new::<i64>("b");
/// let sum = Lambda::new([a.clone(), b.clone()], a.to_expr() + b.to_expr())
///     .compile()
///     .unwrap();
///
/// assert_eq!(sum.invoke(&[&2_i64, &40_i64]).unwrap(), Value::Int(42));
/// assert!(sum.invoke(&[&2_i64]).is_err());
/// ```
pub struct CompiledLambda {
    lambda: Lambda,
    body: Thunk,
}

impl CompiledLambda {
    /// Returns the source lambda.
    #[inline(always)]
    pub fn lambda(&self) -> &Lambda {
        &self.lambda
    }

    /// Returns the number of parameters.
    #[inline]
    pub fn arity(&self) -> usize {
        self.lambda.arity()
    }

    /// Evaluates the lambda with `args` bound to its parameters.
    pub fn invoke(&self, args: &[&dyn Any]) -> Result<Value, EvalError> {
        let params = self.lambda.params();
        if args.len() != params.len() {
            return Err(EvalError::ArgumentCount {
                expected: params.len(),
                found: args.len(),
            });
        }
        for (index, (arg, param)) in args.iter().zip(params).enumerate() {
            if Any::type_id(*arg) != param.ty().id() {
                return Err(EvalError::ArgumentType {
                    index,
                    expected: param.ty(),
                });
            }
        }
        (self.body)(args)?.into_value()
    }
}

impl fmt::Debug for CompiledLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledLambda")
            .field(&format_args!("{}", self.lambda))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Predicate

/// A compiled boolean test over `T`.
///
/// ```
/// use pm_expr::{Expr, Lambda, Param, property};
///
/// struct Reply { latency_ms: u32 }
///
/// let latency = property!(Reply, latency_ms: u32).into_ref();
/// let r = Param::new::<Reply>("r");
/// let fast = Lambda::new([r.clone()], r.member(&latency).less_than(Expr::constant(100_u64)))
///     .compile_predicate::<Reply>()
///     .unwrap();
///
/// assert!(fast.test(&Reply { latency_ms: 12 }).unwrap());
/// assert!(!fast.test(&Reply { latency_ms: 480 }).unwrap());
/// ```
pub struct Predicate<T> {
    compiled: CompiledLambda,
    marker: PhantomData<fn(&T) -> bool>,
}

impl<T: Any> Predicate<T> {
    /// Evaluates the predicate on `target`.
    pub fn test(&self, target: &T) -> Result<bool, EvalError> {
        match self.compiled.invoke(&[target as &dyn Any])? {
            Value::Bool(value) => Ok(value),
            other => Err(EvalError::NotBoolean {
                found: other.kind(),
            }),
        }
    }

    /// Returns the items for which the predicate holds, stopping at the
    /// first evaluation error.
    pub fn filter<'a>(
        &self,
        items: impl IntoIterator<Item = &'a T>,
    ) -> Result<Vec<&'a T>, EvalError> {
        let mut kept = Vec::new();
        for item in items {
            if self.test(item)? {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Returns the source lambda.
    #[inline]
    pub fn lambda(&self) -> &Lambda {
        self.compiled.lambda()
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate")
            .field(&format_args!("{}", self.compiled.lambda))
            .finish()
    }
}

impl Lambda {
    /// Compiles the lambda into an evaluable closure.
    ///
    /// # Errors
    ///
    /// Fails on parameters not bound by this lambda, on member reads whose
    /// target is not of the owner type, and on nested lambda or assignment
    /// nodes.
    pub fn compile(&self) -> Result<CompiledLambda, CompileError> {
        let body = Compiler {
            params: self.params(),
        }
        .compile(self.body())?;
        log::trace!("compiled lambda `{self}`");
        Ok(CompiledLambda {
            lambda: self.clone(),
            body,
        })
    }

    /// Compiles the lambda into a [`Predicate`] over `T`.
    ///
    /// The lambda must take exactly one `T` and produce a `bool`.
    pub fn compile_predicate<T: Any>(&self) -> Result<Predicate<T>, CompileError> {
        let expected = Type::of::<T>();
        match self.params() {
            [param] if param.ty() == expected => {}
            [param] => {
                return Err(CompileError::TypeMismatch {
                    context: "predicate parameter",
                    expected,
                    found: param.ty(),
                });
            }
            params => {
                return Err(CompileError::Arity {
                    expected: 1,
                    found: params.len(),
                });
            }
        }
        let found = self.static_type();
        if found != Type::of::<bool>() {
            return Err(CompileError::TypeMismatch {
                context: "predicate result",
                expected: Type::of::<bool>(),
                found,
            });
        }
        Ok(Predicate {
            compiled: self.compile()?,
            marker: PhantomData,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use crate::{
        CompileError, EvalError, Expr, Function, Lambda, MemberRef, Param, Type, Value, merge_all,
        property,
    };

    #[derive(Clone)]
    struct Sample {
        host: String,
        rtt_ms: u32,
        lost: u8,
    }

    fn sample(host: &str, rtt_ms: u32, lost: u8) -> Sample {
        Sample {
            host: host.into(),
            rtt_ms,
            lost,
        }
    }

    fn rtt() -> MemberRef {
        property!(Sample, rtt_ms: u32).into_ref()
    }

    fn lost() -> MemberRef {
        property!(Sample, lost: u8).into_ref()
    }

    #[test]
    fn merged_predicates_evaluate_as_conjunction() {
        let [a, b, c] = ["a", "b", "c"].map(Param::new::<Sample>);
        let host: MemberRef = property!(Sample, host: String).into_ref();
        let merged = merge_all([
            Lambda::new([a.clone()], a.member(&rtt()).less_than(Expr::constant(50_u64))),
            Lambda::new([b.clone()], b.member(&lost()).equals(Expr::constant(0_u64))),
            Lambda::new([c.clone()], c.member(&host).not_equals(Expr::constant(""))),
        ])
        .unwrap();
        let predicate = merged.compile_predicate::<Sample>().unwrap();

        assert!(predicate.test(&sample("gw", 10, 0)).unwrap());
        assert!(!predicate.test(&sample("gw", 90, 0)).unwrap());
        assert!(!predicate.test(&sample("gw", 10, 1)).unwrap());
        assert!(!predicate.test(&sample("", 10, 0)).unwrap());

        let samples = [sample("a", 1, 0), sample("b", 99, 0), sample("c", 2, 0)];
        let kept: Vec<_> = predicate
            .filter(&samples)
            .unwrap()
            .into_iter()
            .map(|s| s.host.as_str())
            .collect();
        assert_eq!(kept, ["a", "c"]);
    }

    #[test]
    fn logical_operators_short_circuit() {
        let fail = Function::new("fail", Type::of::<bool>(), |_| {
            Err(EvalError::Function {
                name: "fail".into(),
                message: "should not run".into(),
            })
        });
        let s = Param::new::<Sample>("s");
        let guarded = Lambda::new(
            [s.clone()],
            s.member(&lost()).greater_than(Expr::constant(0_u64))
                & Expr::call(fail, Vec::new()),
        )
        .compile_predicate::<Sample>()
        .unwrap();
        assert_eq!(guarded.test(&sample("x", 1, 0)), Ok(false));
        assert!(matches!(
            guarded.test(&sample("x", 1, 3)),
            Err(EvalError::Function { .. })
        ));
    }

    #[test]
    fn arithmetic_and_conditionals() {
        let s = Param::new::<Sample>("s");
        let score = Lambda::new(
            [s.clone()],
            Expr::conditional(
                s.member(&lost()).equals(Expr::constant(0_u64)),
                s.member(&rtt()) * Expr::constant(2_i64),
                Expr::constant(-1_i64),
            ),
        )
        .compile()
        .unwrap();
        assert_eq!(score.invoke(&[&sample("x", 21, 0)]).unwrap(), Value::Int(42));
        assert_eq!(score.invoke(&[&sample("x", 21, 2)]).unwrap(), Value::Int(-1));
    }

    #[test]
    fn evaluation_errors_are_reported() {
        let n = Param::new::<i64>("n");
        let divide = Lambda::new([n.clone()], Expr::constant(10_i64) / n.to_expr())
            .compile()
            .unwrap();
        assert_eq!(divide.invoke(&[&0_i64]), Err(EvalError::DivideByZero));
        assert_eq!(divide.invoke(&[&5_i64]), Ok(Value::Int(2)));
        assert!(matches!(
            divide.invoke(&[&5_u8]),
            Err(EvalError::ArgumentType { index: 0, .. })
        ));

        let big = Lambda::new([n.clone()], n.to_expr() * Expr::constant(i64::MAX))
            .compile()
            .unwrap();
        assert!(matches!(big.invoke(&[&2_i64]), Err(EvalError::Overflow { .. })));

        let s = Param::new::<Sample>("s");
        let identity = Lambda::new([s.clone()], s.to_expr()).compile().unwrap();
        assert!(matches!(
            identity.invoke(&[&sample("x", 0, 0)]),
            Err(EvalError::BorrowedArgument { .. })
        ));
    }

    #[test]
    fn compile_errors_are_reported() {
        let s = Param::new::<Sample>("s");
        let stray = Param::new::<Sample>("stray");
        let unbound = Lambda::new([s.clone()], stray.member(&rtt()).equals(Expr::constant(1_u64)));
        assert!(matches!(
            unbound.compile(),
            Err(CompileError::UnboundParameter { .. })
        ));

        let n = Param::new::<i64>("n");
        let wrong_target = Lambda::new([n.clone()], n.member(&rtt()));
        assert!(matches!(
            wrong_target.compile(),
            Err(CompileError::InvalidTarget { .. })
        ));

        let nested = Lambda::new(
            [n.clone()],
            Expr::from(Lambda::new([n.clone()], Expr::constant(true))),
        );
        assert_eq!(
            nested.compile().unwrap_err(),
            CompileError::Unsupported { node: "lambda" }
        );

        let not_bool = Lambda::new([s.clone()], s.member(&rtt()));
        assert!(matches!(
            not_bool.compile_predicate::<Sample>(),
            Err(CompileError::TypeMismatch {
                context: "predicate result",
                ..
            })
        ));
        assert!(matches!(
            Lambda::new([n.clone()], Expr::constant(true)).compile_predicate::<Sample>(),
            Err(CompileError::TypeMismatch {
                context: "predicate parameter",
                ..
            })
        ));
    }
}
