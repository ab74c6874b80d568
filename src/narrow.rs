//! Narrowing: re-deriving a judgment after strengthening one environment entry.
//!
//! Only the selection rules that look up the narrowed position change; their premise gets the
//! supplied bound prepended through transitivity elimination. Under a binder both environments
//! grow by the same self binding, and since `update` keeps positions, the narrowed position
//! stays put.

use tracing::debug;

use crate::config::{Config, Fuel};
use crate::derivation::{Derivation, Relaxed, Strict};
use crate::env::Env;
use crate::error::{Result, SubtypeError};
use crate::syntax::Type;
use crate::trans::Eliminator;
use crate::Shift;

/// Turns `d`, valid in `env`, into a derivation of the same judgment and mode valid in
/// `env.update(x, ty)`.
///
/// `bound` must derive `ty <: env[x]` and be valid in the updated environment.
pub fn narrow(
    env: &Env,
    d: &Derivation,
    x: usize,
    ty: &Type,
    bound: &Strict,
    config: &Config,
) -> Result<Derivation> {
    let old = env.lookup(x).ok_or(SubtypeError::NarrowingUnsupported(x))?;
    if bound.lhs() != *ty || bound.rhs() != *old {
        return Err(SubtypeError::InvalidDerivation(format!(
            "expected a derivation of {} <: {}, found {} <: {}",
            ty,
            old,
            bound.lhs(),
            bound.rhs()
        )));
    }
    d.check(env)?;
    bound.check(&env.update(x, ty.clone()))?;
    debug!(var = x, from = %old, to = %ty, "narrowing");

    let e = Eliminator { config };
    let fuel = config.fuel();
    match *d {
        Derivation::Strict(ref d) => {
            narrow_strict(&e, env, d, x, ty, bound, fuel).map(Derivation::Strict)
        }
        Derivation::Relaxed(ref d) => {
            narrow_relaxed(&e, env, d, x, ty, bound, fuel).map(Derivation::Relaxed)
        }
    }
}

pub(crate) fn narrow_strict(
    e: &Eliminator,
    env: &Env,
    d: &Strict,
    x: usize,
    ty: &Type,
    bound: &Strict,
    fuel: Fuel,
) -> Result<Strict> {
    use self::Strict::*;
    let fuel = fuel.spend()?;
    macro_rules! narrow {
        ($d:expr) => {
            Box::new(narrow_strict(e, env, $d, x, ty, bound, fuel)?)
        };
    }
    macro_rules! narrow_relaxed {
        ($d:expr) => {
            Box::new(narrow_relaxed(e, env, $d, x, ty, bound, fuel)?)
        };
    }
    Ok(match *d {
        Bottom(_) | Top(_) | Boolean | NoMembers | SelRefl(_) => d.clone(),
        Function(m, ref d1, ref d2) => Function(m, narrow_relaxed!(d1), narrow!(d2)),
        Member(ref d1, ref d2) => Member(narrow_relaxed!(d1), narrow!(d2)),
        And(ref d1, ref d2) => And(narrow!(d1), narrow!(d2)),
        SelLower {
            var,
            ref lower,
            ref premise,
        } => {
            let mut premise = narrow!(premise);
            if var == x {
                premise = Box::new(e.compose(&env.update(x, ty.clone()), bound, &premise, fuel)?);
            }
            SelLower {
                var,
                lower: lower.clone(),
                premise,
            }
        }
        SelUpper {
            var,
            ref upper,
            ref premise,
        } => {
            let mut premise = narrow!(premise);
            if var == x {
                premise = Box::new(e.compose(&env.update(x, ty.clone()), bound, &premise, fuel)?);
            }
            SelUpper {
                var,
                upper: upper.clone(),
                premise,
            }
        }
        Bind {
            ref lhs,
            ref rhs,
            ref premise,
        } => {
            let z = env.fresh();
            let env1 = env.extend(lhs.clone().open(z));
            // The bound now lives one entry deeper.
            let bound = bound.clone().shift_above(z, 1);
            Bind {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
                premise: Box::new(narrow_strict(e, &env1, premise, x, ty, &bound, fuel)?),
            }
        }
    })
}

fn narrow_relaxed(
    e: &Eliminator,
    env: &Env,
    d: &Relaxed,
    x: usize,
    ty: &Type,
    bound: &Strict,
    fuel: Fuel,
) -> Result<Relaxed> {
    Ok(match *d {
        Relaxed::Wrap(ref d) => Relaxed::Wrap(narrow_strict(e, env, d, x, ty, bound, fuel)?),
        Relaxed::Trans(ref d1, ref d2) => Relaxed::Trans(
            narrow_strict(e, env, d1, x, ty, bound, fuel)?,
            Box::new(narrow_relaxed(e, env, d2, x, ty, bound, fuel)?),
        ),
    })
}
