//! Validate accessor lambdas and compile them into typed functions.

use alloc::string::ToString;
use alloc::sync::Arc;
use core::any::Any;

use pm_expr::{AnyValue, CompileError, Expr, Lambda, MemberAccess, MemberRef, Param, Property, Type};

use crate::{BuildError, ShapeError};

/// Checks that `lambda` is `|p: T| p.member` and returns the member access.
pub(crate) fn member_access<T: Any>(lambda: &Lambda) -> Result<(&Param, &MemberAccess), ShapeError> {
    let param = match lambda.params() {
        [param] => param,
        params => return Err(ShapeError::ParameterCount { found: params.len() }),
    };
    let expected = Type::of::<T>();
    if param.ty() != expected {
        return Err(ShapeError::ParameterType {
            expected,
            found: param.ty(),
        });
    }
    let access = match lambda.body() {
        Expr::Member(access) if access.target().as_parameter() == Some(param) => access,
        body => {
            return Err(ShapeError::NotMemberAccess {
                body: body.to_string(),
            });
        }
    };
    let member = access.member();
    if member.owner() != expected {
        return Err(ShapeError::ForeignMember {
            member: member.id().name_cow(),
            owner: member.owner(),
            expected,
        });
    }
    Ok((param, access))
}

/// A compiled getter.
pub(crate) type Getter<T, V> = Arc<dyn Fn(&T) -> V + Send + Sync>;

/// A compiled setter.
pub(crate) type Setter<T, V> = Arc<dyn Fn(&mut T, V) + Send + Sync>;

fn check_value_type<V: Any>(member: &MemberRef) -> Result<(), CompileError> {
    let found = member.value_type();
    if found == Type::of::<V>() {
        Ok(())
    } else {
        Err(CompileError::MemberType {
            member: member.id().name_cow(),
            expected: Type::of::<V>(),
            found,
        })
    }
}

/// Compiles `|p: T| p.member` into the getter of the member.
///
/// A [`Property<T, V>`] yields its own getter. Other descriptors are read
/// through [`Member::get_any`](pm_expr::Member::get_any).
pub(crate) fn compile_getter<T, V>(lambda: &Lambda) -> Result<Getter<T, V>, BuildError>
where
    T: Any,
    V: Any + Clone + Send + Sync,
{
    let (_, access) = member_access::<T>(lambda)?;
    let member = access.member();
    check_value_type::<V>(member)?;
    if let Some(property) = member.downcast_ref::<Property<T, V>>() {
        return Ok(Arc::new(property.getter()));
    }
    let member = member.clone();
    Ok(Arc::new(move |target: &T| {
        let value = match member.get_any(target) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        };
        match value.take::<V>() {
            Ok(value) => value,
            Err(value) => panic!(
                "member `{}` declares `{}` but read a `{}`",
                member.id(),
                Type::of::<V>(),
                value.ty(),
            ),
        }
    }))
}

/// Compiles `|p: T, v: V| p.member = v` into the setter of the member.
///
/// A [`Property<T, V>`] yields its own setter. Other descriptors are written
/// through [`Member::set_any`](pm_expr::Member::set_any).
pub(crate) fn compile_setter<T, V>(lambda: &Lambda) -> Result<Setter<T, V>, BuildError>
where
    T: Any,
    V: Any + Clone + Send + Sync,
{
    let [target, value] = lambda.params() else {
        return Err(ShapeError::ParameterCount {
            found: lambda.arity(),
        }
        .into());
    };
    let access = match lambda.body() {
        Expr::Assign {
            target: access,
            value: assigned,
        } if access.target().as_parameter() == Some(target)
            && assigned.as_parameter() == Some(value) =>
        {
            access
        }
        body => {
            return Err(ShapeError::NotMemberAccess {
                body: body.to_string(),
            }
            .into());
        }
    };
    if target.ty() != Type::of::<T>() {
        return Err(ShapeError::ParameterType {
            expected: Type::of::<T>(),
            found: target.ty(),
        }
        .into());
    }
    let member = access.member();
    if value.ty() != Type::of::<V>() {
        return Err(CompileError::MemberType {
            member: member.id().name_cow(),
            expected: Type::of::<V>(),
            found: value.ty(),
        }
        .into());
    }
    check_value_type::<V>(member)?;
    if !member.is_writable() {
        return Err(CompileError::ReadOnly {
            member: member.id().name_cow(),
        }
        .into());
    }
    if let Some(property) = member.downcast_ref::<Property<T, V>>()
        && let Some(set) = property.setter()
    {
        return Ok(Arc::new(set));
    }
    let member = member.clone();
    Ok(Arc::new(move |target: &mut T, value: V| {
        if let Err(err) = member.set_any(target, AnyValue::new(value)) {
            panic!("{err}");
        }
    }))
}

/// Builds `|target: T, value: V| target.member = value` from a getter
/// lambda, sharing its member target.
pub(crate) fn assign_lambda<V: Any>(target: &Param, access: &MemberAccess) -> Lambda {
    let value = Param::new::<V>("value");
    Lambda::new(
        [target.clone(), value.clone()],
        Expr::assign(access.clone(), value.to_expr()),
    )
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use pm_expr::{CompileError, Expr, Lambda, Param, Property, property};

    use super::{assign_lambda, compile_getter, compile_setter, member_access};
    use crate::{BuildError, ShapeError};

    struct Link {
        name: String,
        mtu: u32,
    }

    #[test]
    fn shape_is_checked() {
        let mtu = property!(Link, mtu: u32).into_ref();
        let l = Param::new::<Link>("l");
        let other = Param::new::<Link>("other");

        let two = Lambda::new([l.clone(), other.clone()], l.member(&mtu));
        assert_eq!(
            member_access::<Link>(&two).unwrap_err(),
            ShapeError::ParameterCount { found: 2 }
        );

        let foreign = Lambda::new([l.clone()], other.member(&mtu));
        assert!(matches!(
            member_access::<Link>(&foreign),
            Err(ShapeError::NotMemberAccess { .. })
        ));

        let constant = Lambda::new([l.clone()], Expr::constant(1_u32));
        assert!(matches!(
            member_access::<Link>(&constant),
            Err(ShapeError::NotMemberAccess { .. })
        ));

        let ok = Lambda::new([l.clone()], l.member(&mtu));
        assert!(matches!(
            member_access::<u32>(&ok),
            Err(ShapeError::ParameterType { .. })
        ));
        assert!(member_access::<Link>(&ok).is_ok());
    }

    #[test]
    fn setter_is_compiled_from_a_synthesized_assignment() {
        let mtu = property!(Link, mtu: u32).into_ref();
        let l = Param::new::<Link>("l");
        let getter = Lambda::new([l.clone()], l.member(&mtu));
        let (param, access) = member_access::<Link>(&getter).unwrap();
        let assign = assign_lambda::<u32>(param, access);
        assert_eq!(assign.to_string(), "|l: Link, value: u32| l.mtu = value");

        let set = compile_setter::<Link, u32>(&assign).unwrap();
        let get = compile_getter::<Link, u32>(&getter).unwrap();
        let mut link = Link {
            name: String::new(),
            mtu: 1500,
        };
        set(&mut link, 9000);
        assert_eq!(get(&link), 9000);
    }

    #[test]
    fn typed_failures_are_compile_errors() {
        let l = Param::new::<Link>("l");
        let mtu = property!(Link, mtu: u32).into_ref();
        let getter = Lambda::new([l.clone()], l.member(&mtu));
        assert!(matches!(
            compile_getter::<Link, u64>(&getter),
            Err(BuildError::Compile(CompileError::MemberType { .. }))
        ));

        let name = Property::<Link, String>::read_only("name", |l| l.name.clone()).into_ref();
        let getter = Lambda::new([l.clone()], l.member(&name));
        let (param, access) = member_access::<Link>(&getter).unwrap();
        assert!(matches!(
            compile_setter::<Link, String>(&assign_lambda::<String>(param, access)),
            Err(BuildError::Compile(CompileError::ReadOnly { .. }))
        ));
    }
}
