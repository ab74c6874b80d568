//! Expansion of a type to the bounds of its type member.

use tracing::trace;

use crate::config::{Config, Fuel};
use crate::env::Env;
use crate::error::{Result, SubtypeError};
use crate::syntax::Type;

/// Computes the member bounds `(L, U)` of `ty` under `env`.
///
/// `Member(L, U)` expands to itself. `x.Type` expands to the expansion of the upper bound of
/// the expansion of `x`'s declared type. Nothing else expands.
pub fn expand(env: &Env, ty: &Type) -> Result<(Type, Type)> {
    expand_with(env, ty, &Config::default())
}

pub fn expand_with(env: &Env, ty: &Type, config: &Config) -> Result<(Type, Type)> {
    if !ty.is_closed() {
        return Err(SubtypeError::Unclosed(ty.clone()));
    }
    expand_fuel(env, ty, config.fuel())
}

pub(crate) fn expand_fuel(env: &Env, ty: &Type, fuel: Fuel) -> Result<(Type, Type)> {
    match *ty {
        Type::Member(ref lower, ref upper) => Ok(((**lower).clone(), (**upper).clone())),
        Type::Selection(x) => {
            let fuel = fuel.spend()?;
            trace!(var = x, "expanding selection");
            let tx = env.index(x)?;
            let (_, upper) = expand_fuel(env, tx, fuel)?;
            expand_fuel(env, &upper, fuel)
        }
        _ => Err(SubtypeError::NotExpandable(ty.clone())),
    }
}
