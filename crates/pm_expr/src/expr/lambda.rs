use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use super::{Expr, Param};
use crate::{EvalError, Type, Value};

// -----------------------------------------------------------------------------
// Lambda

/// A parameter list plus a body.
///
/// The body may reference the parameters through [`Expr::Parameter`]. A lambda
/// is immutable; every transformation returns a new one.
///
/// ```
/// use pm_expr::{Expr, Lambda, Param, Type};
///
/// let n = Param::new::<i64>("n");
/// let positive = Lambda::new([n.clone()], n.to_expr().greater_than(Expr::constant(0_i64)));
///
/// assert_eq!(positive.arity(), 1);
/// assert_eq!(positive.static_type(), Type::of::<bool>());
/// assert_eq!(positive.to_string(), "|n: i64| (n > 0)");
/// ```
#[derive(Clone, PartialEq)]
pub struct Lambda {
    params: Vec<Param>,
    body: Box<Expr>,
}

impl Lambda {
    /// Creates a lambda.
    pub fn new(params: impl IntoIterator<Item = Param>, body: Expr) -> Self {
        Self {
            params: params.into_iter().collect(),
            body: Box::new(body),
        }
    }

    /// Returns the parameters in declaration order.
    #[inline(always)]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the parameter at `index`.
    #[inline]
    pub fn param(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    /// Returns the number of parameters.
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Returns the body.
    #[inline(always)]
    pub fn body(&self) -> &Expr {
        &self.body
    }

    /// Consumes the lambda, returning its parameters and body.
    pub fn into_parts(self) -> (Vec<Param>, Expr) {
        (self.params, *self.body)
    }

    /// Returns the type the body evaluates to.
    #[inline]
    pub fn static_type(&self) -> Type {
        self.body.static_type()
    }
}

impl fmt::Debug for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish()
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("|")?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", param.name(), param.ty().name())?;
        }
        write!(f, "| {}", self.body)
    }
}

// -----------------------------------------------------------------------------
// Function

type FunctionBody = dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A named host function callable from an [`Expr::Call`] node.
///
/// Functions compare equal only when they share the same body.
///
/// ```
/// use pm_expr::{Expr, Function, Lambda, Param, Type, Value};
///
/// let len = Function::new("len", Type::of::<u64>(), |args| match args {
///     [Value::Text(text)] => Ok(Value::UInt(text.len() as u64)),
///     _ => Ok(Value::UInt(0)),
/// });
/// let s = Param::new::<String>("s");
/// let lambda = Lambda::new([s.clone()], Expr::call(len, [s.to_expr()]));
///
/// assert_eq!(lambda.to_string(), "|s: String| len(s)");
/// ```
#[derive(Clone)]
pub struct Function {
    name: Cow<'static, str>,
    return_type: Type,
    body: Arc<FunctionBody>,
}

impl Function {
    /// Creates a function returning values of `return_type`.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        return_type: Type,
        body: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            body: Arc::new(body),
        }
    }

    /// Returns the function name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared return type.
    #[inline(always)]
    pub fn return_type(&self) -> Type {
        self.return_type
    }

    /// Invokes the function.
    #[inline]
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.body)(args)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(..) -> {}", self.name, self.return_type.name())
    }
}
