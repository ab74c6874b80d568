//! Transitivity elimination.
//!
//! Given `D1 : T1 <: T2` (strict) and `D2 : T2 <: T3`, `trans` builds a derivation of
//! `T1 <: T3` that uses no transitivity step. Recursion is bounded by the configured depth.
//!
//! Composing `T1 <: x.Type` with `x.Type <: T3` needs the bounds `L` and `U` of `x` to satisfy
//! `L <: U`. That is searched for within `Config::realizability_budget`; if it is not found,
//! elimination stops with `RealizabilityViolation`. Whether every realizable environment admits
//! elimination is an open question; the check makes the gap explicit instead of looping.

use tracing::{debug, warn};

use crate::config::{Config, Fuel};
use crate::derivation::{Derivation, Relaxed, Strict};
use crate::env::Env;
use crate::error::{Result, SubtypeError};
use crate::expand::expand_fuel;
use crate::narrow;
use crate::subtype;
use crate::syntax::Type;

/// Composes a strict derivation of `T1 <: T2` with a derivation of `T2 <: T3`. The result has
/// the mode of `d2`; a relaxed result is a wrapped strict derivation.
pub fn trans(env: &Env, d1: &Strict, d2: &Derivation, config: &Config) -> Result<Derivation> {
    if d1.rhs() != d2.lhs() {
        return Err(SubtypeError::InvalidDerivation(format!(
            "cannot compose {} <: {} with {} <: {}",
            d1.lhs(),
            d1.rhs(),
            d2.lhs(),
            d2.rhs()
        )));
    }
    d1.check(env)?;
    d2.check(env)?;
    debug!(lhs = %d1.lhs(), mid = %d1.rhs(), rhs = %d2.rhs(), "eliminating transitivity");
    let e = Eliminator { config };
    let fuel = config.fuel();
    match *d2 {
        Derivation::Strict(ref d2) => e.compose(env, d1, d2, fuel).map(Derivation::Strict),
        Derivation::Relaxed(ref d2) => {
            let d2 = e.normalize(env, d2, fuel)?;
            let d = e.compose(env, d1, &d2, fuel)?;
            Ok(Derivation::Relaxed(d.relax()))
        }
    }
}

/// Removes every transitivity step from a relaxed derivation.
pub fn normalize(env: &Env, d: &Relaxed, config: &Config) -> Result<Strict> {
    d.check(env)?;
    Eliminator { config }.normalize(env, d, config.fuel())
}

/// Inverts a strict derivation of `T <: Member(L', U')` into one of `Member(L, U) <:
/// Member(L', U')`, where `(L, U)` is the expansion of `T`. The result is a subderivation of the
/// input, so it is no larger.
pub fn invert(env: &Env, d: &Strict, config: &Config) -> Result<Strict> {
    d.check(env)?;
    Eliminator { config }.invert(d, config.fuel())
}

/// Finds evidence `L <: U` for the bounds `(L, U)` of the declared type of `x`.
pub fn witness(env: &Env, x: usize, config: &Config) -> Result<Strict> {
    let tx = env.index(x)?;
    let (lower, upper) = match expand_fuel(env, tx, config.fuel()) {
        Ok(b) => b,
        Err(SubtypeError::NotExpandable(_)) => return Err(SubtypeError::RealizabilityViolation(x)),
        Err(e) => return Err(e),
    };
    Eliminator { config }.realize(env, x, &lower, &upper, config.fuel())
}

/// Checks that every entry of `env` declared at a type member has consistent bounds.
///
/// Entries whose declared type has no members are accepted unless they are `Bottom`, which
/// would give their selection every type as a bound.
pub fn check_realizable(env: &Env, config: &Config) -> Result<()> {
    for (x, tx) in env.iter() {
        match expand_fuel(env, tx, config.fuel()) {
            Ok((lower, upper)) => {
                Eliminator { config }.realize(env, x, &lower, &upper, config.fuel())?;
            }
            Err(SubtypeError::NotExpandable(ref t)) if *t == Type::Bottom => {
                warn!(var = x, "variable declared at Bottom");
                return Err(SubtypeError::RealizabilityViolation(x));
            }
            Err(SubtypeError::NotExpandable(_)) => (),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn meet_error(d1: &Strict, d2: &Strict) -> SubtypeError {
    SubtypeError::InvalidDerivation(format!(
        "{} <: {} does not continue with {} <: {}",
        d1.lhs(),
        d1.rhs(),
        d2.lhs(),
        d2.rhs()
    ))
}

pub(crate) struct Eliminator<'a> {
    pub(crate) config: &'a Config,
}

impl<'a> Eliminator<'a> {
    /// `T1 <: T2` and `T2 <: T3` to `T1 <: T3`, all strict and valid in `env`.
    pub(crate) fn compose(
        &self,
        env: &Env,
        d1: &Strict,
        d2: &Strict,
        fuel: Fuel,
    ) -> Result<Strict> {
        use self::Strict::*;
        let fuel = fuel.spend()?;
        match (d1, d2) {
            (&Bottom(_), _) => Ok(Bottom(d2.rhs())),
            (&SelUpper { var, ref premise, .. }, _) => {
                // Member(Bottom, T2) <: Member(Bottom, T3)
                let bridge = Member(
                    Box::new(Bottom(Type::Bottom).relax()),
                    Box::new(d2.clone()),
                );
                let premise = self.compose(env, premise, &bridge, fuel)?;
                Ok(SelUpper {
                    var,
                    upper: d2.rhs(),
                    premise: Box::new(premise),
                })
            }
            (_, &Top(_)) => Ok(Top(d1.lhs())),
            (_, &SelLower { var, ref premise, .. }) => {
                // Member(T2, Top) <: Member(T1, Top)
                let bridge = Member(
                    Box::new(d1.clone().relax()),
                    Box::new(Top(Type::Top)),
                );
                let premise = self.compose(env, premise, &bridge, fuel)?;
                Ok(SelLower {
                    var,
                    lower: d1.lhs(),
                    premise: Box::new(premise),
                })
            }
            (&SelRefl(_), _) => Ok(d2.clone()),
            (_, &SelRefl(_)) => Ok(d1.clone()),
            (
                &SelLower {
                    var: x,
                    premise: ref p1,
                    ..
                },
                &SelUpper {
                    var: y,
                    premise: ref p2,
                    ..
                },
            ) if x == y => self.cross(env, x, p1, p2, fuel),
            (&Boolean, &Boolean) | (&NoMembers, &NoMembers) => Ok(d1.clone()),
            (&Function(m, ref a1, ref r1), &Function(n, ref a2, ref r2)) if m == n => {
                let arg = self.compose_relaxed(env, a2, a1, fuel)?;
                let res = self.compose(env, r1, r2, fuel)?;
                Ok(Function(m, Box::new(arg), Box::new(res)))
            }
            (&Member(ref l1, ref u1), &Member(ref l2, ref u2)) => {
                let lower = self.compose_relaxed(env, l2, l1, fuel)?;
                let upper = self.compose(env, u1, u2, fuel)?;
                Ok(Member(Box::new(lower), Box::new(upper)))
            }
            (&And(ref a1, ref b1), &And(ref a2, ref b2)) => {
                let a = self.compose(env, a1, a2, fuel)?;
                let b = self.compose(env, b1, b2, fuel)?;
                Ok(And(Box::new(a), Box::new(b)))
            }
            (
                &Bind {
                    ref lhs,
                    premise: ref p1,
                    ..
                },
                &Bind {
                    lhs: ref mid,
                    ref rhs,
                    premise: ref p2,
                },
            ) => {
                // p2 assumes the self variable has the middle type; p1 shows the left one is
                // below it.
                let z = env.fresh();
                let t1 = lhs.clone().open(z);
                let p2 = self.narrow(&env.extend(mid.clone().open(z)), p2, z, &t1, p1, fuel)?;
                let premise = self.compose(&env.extend(t1), p1, &p2, fuel)?;
                Ok(Bind {
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                    premise: Box::new(premise),
                })
            }
            _ => Err(meet_error(d1, d2)),
        }
    }

    /// `T1 <: x.Type` from `p1 : Tx <: Member(T1, Top)` and `x.Type <: T3` from
    /// `p2 : Tx <: Member(Bottom, T3)`, to `T1 <: T3` through the bounds of `x`.
    fn cross(&self, env: &Env, x: usize, p1: &Strict, p2: &Strict, fuel: Fuel) -> Result<Strict> {
        let unrealizable = |e: SubtypeError| match e {
            SubtypeError::NotExpandable(_) => SubtypeError::RealizabilityViolation(x),
            e => e,
        };
        // Member(L, U) <: Member(T1, Top) and Member(L, U) <: Member(Bottom, T3).
        let (below, lower, upper) = match self.invert(p1, fuel).map_err(unrealizable)? {
            Strict::Member(ref l, ref u) => (self.normalize(env, l, fuel)?, l.rhs(), u.lhs()),
            ref d => return Err(meet_error(p1, d)),
        };
        let above = match self.invert(p2, fuel).map_err(unrealizable)? {
            Strict::Member(_, u) => *u,
            ref d => return Err(meet_error(p2, d)),
        };
        let bounds = self.realize(env, x, &lower, &upper, fuel)?;
        let d = self.compose(env, &below, &bounds, fuel)?;
        self.compose(env, &d, &above, fuel)
    }

    pub(crate) fn realize(
        &self,
        env: &Env,
        x: usize,
        lower: &Type,
        upper: &Type,
        fuel: Fuel,
    ) -> Result<Strict> {
        match subtype::strict_fuel(env, lower, upper, fuel) {
            Ok(ref d) if d.size() <= self.config.realizability_budget => Ok(d.clone()),
            Ok(_) | Err(SubtypeError::ShapeMismatch(..)) | Err(SubtypeError::NotExpandable(_)) => {
                warn!(var = x, lower = %lower, upper = %upper, "bounds are not realizable");
                Err(SubtypeError::RealizabilityViolation(x))
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn invert(&self, d: &Strict, fuel: Fuel) -> Result<Strict> {
        let fuel = fuel.spend()?;
        match *d {
            Strict::Member(..) => Ok(d.clone()),
            Strict::SelUpper { ref premise, .. } => match self.invert(premise, fuel)? {
                Strict::Member(_, ref upper) => self.invert(upper, fuel),
                ref e => Err(meet_error(premise, e)),
            },
            _ => match d.rhs() {
                Type::Member(..) => Err(SubtypeError::NotExpandable(d.lhs())),
                t => Err(SubtypeError::InvalidDerivation(format!(
                    "{} is not a type member",
                    t
                ))),
            },
        }
    }

    /// `T1 <: T2` and `T2 <: T3` to `T1 <: T3`, with the relaxed premises of contravariant
    /// positions.
    fn compose_relaxed(
        &self,
        env: &Env,
        d1: &Relaxed,
        d2: &Relaxed,
        fuel: Fuel,
    ) -> Result<Relaxed> {
        let d1 = self.normalize(env, d1, fuel)?;
        let d2 = self.normalize(env, d2, fuel)?;
        Ok(self.compose(env, &d1, &d2, fuel)?.relax())
    }

    pub(crate) fn normalize(&self, env: &Env, d: &Relaxed, fuel: Fuel) -> Result<Strict> {
        match *d {
            Relaxed::Wrap(ref d) => Ok(d.clone()),
            Relaxed::Trans(ref d1, ref d2) => {
                let fuel = fuel.spend()?;
                let d2 = self.normalize(env, d2, fuel)?;
                self.compose(env, d1, &d2, fuel)
            }
        }
    }

    fn narrow(
        &self,
        env: &Env,
        d: &Strict,
        x: usize,
        ty: &Type,
        bound: &Strict,
        fuel: Fuel,
    ) -> Result<Strict> {
        narrow::narrow_strict(self, env, d, x, ty, bound, fuel)
    }
}
