//! Deciding subtyping by searching for a derivation.
//!
//! The search never applies transitivity; a relaxed derivation is always a wrapped strict one.
//! Structural rules are tried before the selection rules, so reflexivity never consults the
//! environment.

use tracing::trace;

use crate::config::{Config, Fuel};
use crate::derivation::{Derivation, Mode, Relaxed, Strict};
use crate::env::Env;
use crate::error::{Result, SubtypeError};
use crate::syntax::Type;

/// Returns true if `t1 <: t2` under `env`.
pub fn subtype(env: &Env, t1: &Type, t2: &Type) -> bool {
    stp(Mode::Strict, env, t1, t2).is_ok()
}

/// Searches for a derivation of `t1 <: t2` in the given mode.
pub fn stp(mode: Mode, env: &Env, t1: &Type, t2: &Type) -> Result<Derivation> {
    stp_with(mode, env, t1, t2, &Config::default())
}

pub fn stp_with(
    mode: Mode,
    env: &Env,
    t1: &Type,
    t2: &Type,
    config: &Config,
) -> Result<Derivation> {
    let d = strict(env, t1, t2, config)?;
    Ok(match mode {
        Mode::Strict => Derivation::Strict(d),
        Mode::Relaxed => Derivation::Relaxed(d.relax()),
    })
}

/// Searches for a strict derivation of `t1 <: t2`.
pub fn strict(env: &Env, t1: &Type, t2: &Type, config: &Config) -> Result<Strict> {
    for t in &[t1, t2] {
        if !t.is_closed() {
            return Err(SubtypeError::Unclosed((*t).clone()));
        }
    }
    env.check_well_scoped()?;
    strict_fuel(env, t1, t2, config.fuel())
}

macro_rules! attempt {
    ($err:ident, $e:expr) => {
        match $e {
            Ok(d) => return Ok(d),
            Err(e) => {
                if e.is_fatal() {
                    return Err(e);
                }
                $err = e;
            }
        }
    };
}

pub(crate) fn strict_fuel(env: &Env, t1: &Type, t2: &Type, fuel: Fuel) -> Result<Strict> {
    use self::Type::*;
    let fuel = fuel.spend()?;
    trace!(lhs = %t1, rhs = %t2, "strict subtyping");
    match (t1, t2) {
        (_, &Top) => return Ok(Strict::Top(t1.clone())),
        (&Bottom, _) => return Ok(Strict::Bottom(t2.clone())),
        (&Boolean, &Boolean) => return Ok(Strict::Boolean),
        (&NoMembers, &NoMembers) => return Ok(Strict::NoMembers),
        (&Selection(x), &Selection(y)) if x == y => return Ok(Strict::SelRefl(x)),
        _ => (),
    }
    let mut err = SubtypeError::ShapeMismatch(t1.clone(), t2.clone());
    match (t1, t2) {
        (&Function(m, ref t11, ref t12), &Function(n, ref t21, ref t22)) if m == n => {
            attempt!(err, function(env, m, t11, t12, t21, t22, fuel))
        }
        (&Member(ref t11, ref t12), &Member(ref t21, ref t22)) => {
            attempt!(err, member(env, t11, t12, t21, t22, fuel))
        }
        (&And(ref t11, ref t12), &And(ref t21, ref t22)) => {
            attempt!(err, and(env, t11, t12, t21, t22, fuel))
        }
        (&Bind(ref t1), &Bind(ref t2)) => attempt!(err, bind(env, t1, t2, fuel)),
        _ => (),
    }
    if let Selection(y) = *t2 {
        attempt!(err, sel_lower(env, t1, y, fuel));
    }
    if let Selection(x) = *t1 {
        attempt!(err, sel_upper(env, x, t2, fuel));
    }
    trace!(lhs = %t1, rhs = %t2, error = %err, "no derivation");
    Err(err)
}

fn relaxed_fuel(env: &Env, t1: &Type, t2: &Type, fuel: Fuel) -> Result<Relaxed> {
    strict_fuel(env, t1, t2, fuel).map(Strict::relax)
}

fn function(
    env: &Env,
    m: usize,
    t11: &Type,
    t12: &Type,
    t21: &Type,
    t22: &Type,
    fuel: Fuel,
) -> Result<Strict> {
    let arg = relaxed_fuel(env, t21, t11, fuel)?;
    let res = strict_fuel(env, t12, t22, fuel)?;
    Ok(Strict::Function(m, Box::new(arg), Box::new(res)))
}

fn member(env: &Env, t11: &Type, t12: &Type, t21: &Type, t22: &Type, fuel: Fuel) -> Result<Strict> {
    let lower = relaxed_fuel(env, t21, t11, fuel)?;
    let upper = strict_fuel(env, t12, t22, fuel)?;
    Ok(Strict::Member(Box::new(lower), Box::new(upper)))
}

fn and(env: &Env, t11: &Type, t12: &Type, t21: &Type, t22: &Type, fuel: Fuel) -> Result<Strict> {
    let d1 = strict_fuel(env, t11, t21, fuel)?;
    let d2 = strict_fuel(env, t12, t22, fuel)?;
    Ok(Strict::And(Box::new(d1), Box::new(d2)))
}

/// Both bodies are opened with the same fresh variable, bound to the opened subtype.
fn bind(env: &Env, t1: &Type, t2: &Type, fuel: Fuel) -> Result<Strict> {
    let z = env.fresh();
    let t1z = t1.clone().open(z);
    let t2z = t2.clone().open(z);
    let premise = strict_fuel(&env.extend(t1z.clone()), &t1z, &t2z, fuel)?;
    Ok(Strict::Bind {
        lhs: t1.clone(),
        rhs: t2.clone(),
        premise: Box::new(premise),
    })
}

fn sel_lower(env: &Env, t1: &Type, y: usize, fuel: Fuel) -> Result<Strict> {
    let ty = env.index(y)?;
    let premise = strict_fuel(env, ty, &Type::mem(t1.clone(), Type::Top), fuel)?;
    Ok(Strict::SelLower {
        var: y,
        lower: t1.clone(),
        premise: Box::new(premise),
    })
}

fn sel_upper(env: &Env, x: usize, t2: &Type, fuel: Fuel) -> Result<Strict> {
    let tx = env.index(x)?;
    let premise = strict_fuel(env, tx, &Type::mem(Type::Bottom, t2.clone()), fuel)?;
    Ok(Strict::SelUpper {
        var: x,
        upper: t2.clone(),
        premise: Box::new(premise),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use quickcheck_macros::quickcheck;

    use crate::syntax::tests::FREE_VARS;
    use crate::syntax::Type::*;

    fn sample_env() -> Env {
        Env::from(vec![
            Type::mem(Bottom, Type::mem(Bottom, Top)),
            Type::mem(Boolean, Boolean),
            Type::mem(Selection(1), Top),
            Boolean,
        ])
    }

    fn derive(env: &Env, t1: &Type, t2: &Type) -> Result<Strict> {
        let d = strict(env, t1, t2, &Config::default())?;
        assert_eq!(d.lhs(), *t1);
        assert_eq!(d.rhs(), *t2);
        assert_eq!(d.check(env), Ok(()));
        Ok(d)
    }

    #[test]
    fn test_selection_below_top() {
        let env = Env::from(vec![Type::mem(Bottom, Type::mem(Bottom, Top))]);
        assert_eq!(derive(&env, &Selection(0), &Top), Ok(Strict::Top(Selection(0))));

        // The same judgment through the upper bound of x0.
        let premise = derive(&env, env.lookup(0).unwrap(), &Type::mem(Bottom, Top)).unwrap();
        let d = Strict::SelUpper {
            var: 0,
            upper: Top,
            premise: Box::new(premise),
        };
        assert_eq!(d.check(&env), Ok(()));
        assert_eq!(d.lhs(), Selection(0));
        assert_eq!(d.rhs(), Top);
    }

    #[test]
    fn test_function() {
        let env = Env::new();
        let f = Type::fun(0, Boolean, Boolean);
        let d = derive(&env, &f, &f).unwrap();
        assert!(d.size() <= 3);

        let g = Type::fun(1, Boolean, Boolean);
        assert_eq!(
            derive(&env, &f, &g),
            Err(SubtypeError::ShapeMismatch(f.clone(), g.clone()))
        );

        // Contravariant argument, covariant result.
        assert!(subtype(&env, &Type::fun(0, Top, Bottom), &Type::fun(0, Boolean, Boolean)));
        assert!(!subtype(&env, &Type::fun(0, Boolean, Top), &Type::fun(0, Top, Top)));
    }

    #[test]
    fn test_member() {
        let env = Env::new();
        assert!(subtype(&env, &Type::mem(Boolean, Boolean), &Type::mem(Bottom, Top)));
        assert!(!subtype(&env, &Type::mem(Bottom, Top), &Type::mem(Boolean, Boolean)));
        assert!(!subtype(&env, &Type::mem(Bottom, Top), &Type::fun(0, Bottom, Top)));
    }

    #[test]
    fn test_selection() {
        let env = sample_env();
        assert!(derive(&env, &Boolean, &Selection(1)).is_ok());
        assert!(derive(&env, &Selection(1), &Boolean).is_ok());
        assert!(derive(&env, &Selection(1), &Selection(2)).is_ok());
        assert!(derive(&env, &Boolean, &Selection(2)).is_ok());
        assert!(!subtype(&env, &Selection(2), &Selection(1)));
        assert!(!subtype(&env, &Boolean, &Selection(0)));
        assert!(!subtype(&env, &Selection(0), &Boolean));

        // x3 is not bound at a type member.
        assert!(!subtype(&env, &Boolean, &Selection(3)));
        assert_eq!(
            strict(&env, &Boolean, &Selection(9), &Config::default()),
            Err(SubtypeError::UnboundVariable(9))
        );
    }

    #[test]
    fn test_bind() {
        let env = Env::new();
        let t1 = Type::bind(Type::mem(
            BoundSelection(0),
            Type::mem(BoundSelection(0), Top),
        ));
        let t2 = Type::bind(Type::mem(Bottom, Top));
        let d = derive(&env, &t1, &t2).unwrap();
        match d {
            Strict::Bind { .. } => (),
            _ => panic!("expected a binder rule, got {:?}", d),
        }

        // The self variable is bound to an intersection, which has no member to select.
        let t1 = Type::bind(Type::and(
            Type::mem(Boolean, Boolean),
            Type::fun(0, Top, BoundSelection(0)),
        ));
        let t2 = Type::bind(Type::and(Type::mem(Boolean, Top), Type::fun(0, Top, Boolean)));
        assert!(!subtype(&env, &t1, &t2));
        let t1 = Type::bind(Type::mem(Boolean, Boolean));
        let t2 = Type::bind(Type::mem(Bottom, Top));
        assert!(derive(&env, &t1, &t2).is_ok());
    }

    #[test]
    fn test_unclosed() {
        let env = Env::new();
        assert_eq!(
            stp(Mode::Strict, &env, &BoundSelection(0), &Top),
            Err(SubtypeError::Unclosed(BoundSelection(0)))
        );
    }

    #[test]
    fn test_cycle() {
        let env = Env::from(vec![Type::mem(Selection(0), Selection(0))]);
        let config = Config::default().with_max_depth(32);
        assert_eq!(
            strict(&env, &Boolean, &Selection(0), &config),
            Err(SubtypeError::BudgetExceeded)
        );
    }

    #[test]
    fn test_relaxed_mode() {
        let env = Env::new();
        let d = stp(Mode::Relaxed, &env, &Boolean, &Top).unwrap();
        assert_eq!(d.mode(), Mode::Relaxed);
        assert_eq!(d, Derivation::Relaxed(Strict::Top(Boolean).relax()));
    }

    #[quickcheck]
    fn reflexivity(t: Type) -> bool {
        let env = sample_env();
        assert_eq!(env.len(), FREE_VARS);
        match strict(&env, &t, &t, &Config::default()) {
            Ok(d) => d.lhs() == t && d.rhs() == t && d.check(&env).is_ok(),
            Err(_) => false,
        }
    }

    #[quickcheck]
    fn derivations_check(t1: Type, t2: Type) -> bool {
        let env = sample_env();
        match strict(&env, &t1, &t2, &Config::default()) {
            Ok(d) => d.lhs() == t1 && d.rhs() == t2 && d.check(&env).is_ok(),
            Err(_) => true,
        }
    }
}
