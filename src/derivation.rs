//! Subtyping derivations.
//!
//! A [`Strict`] derivation never ends in a transitivity step; a [`Relaxed`] one may. Premises
//! determine the judgment of most rules; the selection and binder rules also record the types
//! their premises cannot reconstruct.

use crate::env::Env;
use crate::error::{Result, SubtypeError};
use crate::syntax::Type;
use crate::{shift_var, Shift};

/// Whether a derivation may end in a transitivity step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// No trailing transitivity.
    Strict,
    /// May end in one transitivity step.
    Relaxed,
}

/// A derivation whose last rule is not transitivity.
#[derive(Clone, Debug, PartialEq)]
pub enum Strict {
    /// `Bottom <: T`.
    Bottom(Type),
    /// `T <: Top`.
    Top(Type),
    /// `Boolean <: Boolean`.
    Boolean,
    /// `NoMembers <: NoMembers`.
    NoMembers,
    /// `m(T11): T12 <: m(T21): T22` from `T21 <: T11` and `T12 <: T22`.
    Function(usize, Box<Relaxed>, Box<Strict>),
    /// `Member(T11, T12) <: Member(T21, T22)` from `T21 <: T11` and `T12 <: T22`.
    Member(Box<Relaxed>, Box<Strict>),
    /// `T11 & T12 <: T21 & T22` from `T11 <: T21` and `T12 <: T22`.
    And(Box<Strict>, Box<Strict>),
    /// `T1 <: x.Type` from `Tx <: Member(T1, Top)`.
    SelLower {
        /// The selected variable.
        var: usize,
        /// `T1`.
        lower: Type,
        /// The derivation of `Tx <: Member(T1, Top)`.
        premise: Box<Strict>,
    },
    /// `x.Type <: T2` from `Tx <: Member(Bottom, T2)`.
    SelUpper {
        /// The selected variable.
        var: usize,
        /// `T2`.
        upper: Type,
        /// The derivation of `Tx <: Member(Bottom, T2)`.
        premise: Box<Strict>,
    },
    /// `x.Type <: x.Type`.
    SelRefl(usize),
    /// `Bind(T1) <: Bind(T2)`.
    ///
    /// With `z` the length of the environment the conclusion lives in, the premise derives
    /// `T1^z <: T2^z` in that environment extended with `T1^z`.
    Bind {
        /// The body `T1`.
        lhs: Type,
        /// The body `T2`.
        rhs: Type,
        /// The derivation under the extended environment.
        premise: Box<Strict>,
    },
}

/// A derivation which may end in a transitivity step.
#[derive(Clone, Debug, PartialEq)]
pub enum Relaxed {
    /// A strict derivation.
    Wrap(Strict),
    /// `T1 <: T3` from `T1 <: T2` and `T2 <: T3`.
    Trans(Strict, Box<Relaxed>),
}

/// A derivation of either mode.
#[derive(Clone, Debug, PartialEq)]
pub enum Derivation {
    /// A strict derivation.
    Strict(Strict),
    /// A relaxed derivation.
    Relaxed(Relaxed),
}

fn mismatch(what: &str, expected: &Type, found: &Type) -> SubtypeError {
    SubtypeError::InvalidDerivation(format!(
        "{}: expected {}, found {}",
        what, expected, found
    ))
}

fn expect(what: &str, expected: &Type, found: &Type) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(mismatch(what, expected, found))
    }
}

impl Strict {
    /// The subtype.
    pub fn lhs(&self) -> Type {
        use self::Strict::*;
        match *self {
            Bottom(_) => Type::Bottom,
            Top(ref t) => t.clone(),
            Boolean => Type::Boolean,
            NoMembers => Type::NoMembers,
            Function(m, ref arg, ref res) => Type::fun(m, arg.rhs(), res.lhs()),
            Member(ref lower, ref upper) => Type::mem(lower.rhs(), upper.lhs()),
            And(ref d1, ref d2) => Type::and(d1.lhs(), d2.lhs()),
            SelLower { ref lower, .. } => lower.clone(),
            SelUpper { var, .. } | SelRefl(var) => Type::Selection(var),
            Bind { ref lhs, .. } => Type::bind(lhs.clone()),
        }
    }

    /// The supertype.
    pub fn rhs(&self) -> Type {
        use self::Strict::*;
        match *self {
            Bottom(ref t) => t.clone(),
            Top(_) => Type::Top,
            Boolean => Type::Boolean,
            NoMembers => Type::NoMembers,
            Function(m, ref arg, ref res) => Type::fun(m, arg.lhs(), res.rhs()),
            Member(ref lower, ref upper) => Type::mem(lower.lhs(), upper.rhs()),
            And(ref d1, ref d2) => Type::and(d1.rhs(), d2.rhs()),
            SelUpper { ref upper, .. } => upper.clone(),
            SelLower { var, .. } | SelRefl(var) => Type::Selection(var),
            Bind { ref rhs, .. } => Type::bind(rhs.clone()),
        }
    }

    /// Number of rule applications; `Wrap` is free.
    pub fn size(&self) -> usize {
        use self::Strict::*;
        match *self {
            Bottom(_) | Top(_) | Boolean | NoMembers | SelRefl(_) => 1,
            Function(_, ref d1, ref d2) | Member(ref d1, ref d2) => d1.size() + d2.size() + 1,
            And(ref d1, ref d2) => d1.size() + d2.size() + 1,
            SelLower { ref premise, .. }
            | SelUpper { ref premise, .. }
            | Bind { ref premise, .. } => premise.size() + 1,
        }
    }

    /// Lifts `self` to a relaxed derivation.
    pub fn relax(self) -> Relaxed {
        Relaxed::Wrap(self)
    }

    /// Checks every rule application of `self` against `env`.
    pub fn check(&self, env: &Env) -> Result<()> {
        use self::Strict::*;
        match *self {
            Bottom(_) | Top(_) | Boolean | NoMembers | SelRefl(_) => Ok(()),
            Function(_, ref d1, ref d2) | Member(ref d1, ref d2) => {
                d1.check(env)?;
                d2.check(env)
            }
            And(ref d1, ref d2) => {
                d1.check(env)?;
                d2.check(env)
            }
            SelLower {
                var,
                ref lower,
                ref premise,
            } => {
                expect("declared type", env.index(var)?, &premise.lhs())?;
                expect(
                    "lower bound premise",
                    &Type::mem(lower.clone(), Type::Top),
                    &premise.rhs(),
                )?;
                premise.check(env)
            }
            SelUpper {
                var,
                ref upper,
                ref premise,
            } => {
                expect("declared type", env.index(var)?, &premise.lhs())?;
                expect(
                    "upper bound premise",
                    &Type::mem(Type::Bottom, upper.clone()),
                    &premise.rhs(),
                )?;
                premise.check(env)
            }
            Bind {
                ref lhs,
                ref rhs,
                ref premise,
            } => {
                let z = env.fresh();
                let t1 = lhs.clone().open(z);
                expect("opened self type", &t1, &premise.lhs())?;
                expect("opened self type", &rhs.clone().open(z), &premise.rhs())?;
                premise.check(&env.extend(t1))
            }
        }
    }
}

impl Relaxed {
    /// The subtype.
    pub fn lhs(&self) -> Type {
        match *self {
            Relaxed::Wrap(ref d) | Relaxed::Trans(ref d, _) => d.lhs(),
        }
    }

    /// The supertype.
    pub fn rhs(&self) -> Type {
        match *self {
            Relaxed::Wrap(ref d) => d.rhs(),
            Relaxed::Trans(_, ref d) => d.rhs(),
        }
    }

    /// Number of rule applications; `Wrap` is free.
    pub fn size(&self) -> usize {
        match *self {
            Relaxed::Wrap(ref d) => d.size(),
            Relaxed::Trans(ref d1, ref d2) => d1.size() + d2.size() + 1,
        }
    }

    /// Checks every rule application of `self` against `env`.
    pub fn check(&self, env: &Env) -> Result<()> {
        match *self {
            Relaxed::Wrap(ref d) => d.check(env),
            Relaxed::Trans(ref d1, ref d2) => {
                expect("intermediate type", &d1.rhs(), &d2.lhs())?;
                d1.check(env)?;
                d2.check(env)
            }
        }
    }

    /// Number of explicit transitivity steps.
    pub fn transitivity_steps(&self) -> usize {
        match *self {
            Relaxed::Wrap(_) => 0,
            Relaxed::Trans(_, ref d) => d.transitivity_steps() + 1,
        }
    }
}

impl Derivation {
    /// The mode of `self`.
    pub fn mode(&self) -> Mode {
        match *self {
            Derivation::Strict(_) => Mode::Strict,
            Derivation::Relaxed(_) => Mode::Relaxed,
        }
    }

    /// The subtype.
    pub fn lhs(&self) -> Type {
        match *self {
            Derivation::Strict(ref d) => d.lhs(),
            Derivation::Relaxed(ref d) => d.lhs(),
        }
    }

    /// The supertype.
    pub fn rhs(&self) -> Type {
        match *self {
            Derivation::Strict(ref d) => d.rhs(),
            Derivation::Relaxed(ref d) => d.rhs(),
        }
    }

    /// Number of rule applications.
    pub fn size(&self) -> usize {
        match *self {
            Derivation::Strict(ref d) => d.size(),
            Derivation::Relaxed(ref d) => d.size(),
        }
    }

    /// Checks every rule application of `self` against `env`.
    pub fn check(&self, env: &Env) -> Result<()> {
        match *self {
            Derivation::Strict(ref d) => d.check(env),
            Derivation::Relaxed(ref d) => d.check(env),
        }
    }
}

impl From<Strict> for Derivation {
    fn from(d: Strict) -> Derivation {
        Derivation::Strict(d)
    }
}

impl From<Relaxed> for Derivation {
    fn from(d: Relaxed) -> Derivation {
        Derivation::Relaxed(d)
    }
}

/// With `c` the length of the environment a derivation is valid in, `shift_above(c, 1)` yields
/// a derivation valid in that environment extended by one entry: variables introduced by
/// binder rules move up by one.
impl Shift for Strict {
    fn shift_above(self, c: usize, d: isize) -> Self {
        use self::Strict::*;
        let var = |x: usize| {
            if x >= c {
                shift_var(x, d)
            } else {
                x
            }
        };
        match self {
            Bottom(t) => Bottom(t.shift_above(c, d)),
            Top(t) => Top(t.shift_above(c, d)),
            Boolean => Boolean,
            NoMembers => NoMembers,
            Function(m, d1, d2) => Function(
                m,
                Box::new(d1.shift_above(c, d)),
                Box::new(d2.shift_above(c, d)),
            ),
            Member(d1, d2) => Member(
                Box::new(d1.shift_above(c, d)),
                Box::new(d2.shift_above(c, d)),
            ),
            And(d1, d2) => And(Box::new(d1.shift_above(c, d)), Box::new(d2.shift_above(c, d))),
            SelLower {
                var: x,
                lower,
                premise,
            } => SelLower {
                var: var(x),
                lower: lower.shift_above(c, d),
                premise: Box::new(premise.shift_above(c, d)),
            },
            SelUpper {
                var: x,
                upper,
                premise,
            } => SelUpper {
                var: var(x),
                upper: upper.shift_above(c, d),
                premise: Box::new(premise.shift_above(c, d)),
            },
            SelRefl(x) => SelRefl(var(x)),
            Bind { lhs, rhs, premise } => Bind {
                lhs: lhs.shift_above(c, d),
                rhs: rhs.shift_above(c, d),
                premise: Box::new(premise.shift_above(c, d)),
            },
        }
    }
}

impl Shift for Relaxed {
    fn shift_above(self, c: usize, d: isize) -> Self {
        match self {
            Relaxed::Wrap(d1) => Relaxed::Wrap(d1.shift_above(c, d)),
            Relaxed::Trans(d1, d2) => {
                Relaxed::Trans(d1.shift_above(c, d), Box::new(d2.shift_above(c, d)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::syntax::Type::Selection;

    fn bool_fun() -> Strict {
        Strict::Function(0, Box::new(Strict::Boolean.relax()), Box::new(Strict::Boolean))
    }

    #[test]
    fn test_judgment() {
        let d = bool_fun();
        assert_eq!(d.lhs(), Type::fun(0, Type::Boolean, Type::Boolean));
        assert_eq!(d.rhs(), Type::fun(0, Type::Boolean, Type::Boolean));
        assert_eq!(d.size(), 3);

        // Member(Bool, Top) <: Member(Bottom, Top)
        let d = Strict::Member(
            Box::new(Strict::Bottom(Type::Boolean).relax()),
            Box::new(Strict::Top(Type::Top)),
        );
        assert_eq!(d.lhs(), Type::mem(Type::Boolean, Type::Top));
        assert_eq!(d.rhs(), Type::mem(Type::Bottom, Type::Top));
    }

    #[test]
    fn test_check_selection() {
        let env = Env::from(vec![Type::mem(Type::Bottom, Type::Boolean)]);
        let premise = Strict::Member(
            Box::new(Strict::Bottom(Type::Bottom).relax()),
            Box::new(Strict::Boolean),
        );
        let d = Strict::SelUpper {
            var: 0,
            upper: Type::Boolean,
            premise: Box::new(premise.clone()),
        };
        assert_eq!(d.lhs(), Selection(0));
        assert_eq!(d.check(&env), Ok(()));

        // The recorded bound must agree with the premise.
        let d = Strict::SelUpper {
            var: 0,
            upper: Type::Top,
            premise: Box::new(premise.clone()),
        };
        assert!(d.check(&env).is_err());

        let d = Strict::SelUpper {
            var: 1,
            upper: Type::Boolean,
            premise: Box::new(premise),
        };
        assert_eq!(d.check(&env), Err(SubtypeError::UnboundVariable(1)));
    }

    #[test]
    fn test_check_trans() {
        let env = Env::new();
        let d = Relaxed::Trans(
            Strict::Bottom(Type::Boolean),
            Box::new(Strict::Top(Type::Boolean).relax()),
        );
        assert_eq!(d.check(&env), Ok(()));
        assert_eq!(d.lhs(), Type::Bottom);
        assert_eq!(d.rhs(), Type::Top);
        assert_eq!(d.size(), 3);
        assert_eq!(d.transitivity_steps(), 1);

        let d = Relaxed::Trans(
            Strict::Bottom(Type::Boolean),
            Box::new(Strict::Top(Type::Top).relax()),
        );
        assert!(d.check(&env).is_err());
    }

    #[test]
    fn test_weakening() {
        // {z => Member(Bottom, z.Type)} <: {z => Member(Bottom, z.Type)} in an environment of
        // length 1, then weakened to length 2.
        let body = Type::mem(Type::Bottom, Type::BoundSelection(0));
        let premise = Strict::Member(
            Box::new(Strict::Bottom(Type::Bottom).relax()),
            Box::new(Strict::SelRefl(1)),
        );
        let d = Strict::Bind {
            lhs: body.clone(),
            rhs: body,
            premise: Box::new(premise),
        };
        let env = Env::from(vec![Type::Boolean]);
        assert_eq!(d.check(&env), Ok(()));

        let d = d.shift_above(1, 1);
        assert_eq!(d.check(&env.extend(Type::Top)), Ok(()));
    }

    #[test]
    #[should_panic(expected = "cannot shift x0 by -1")]
    fn test_shift_below_zero() {
        Strict::SelRefl(0).shift(-1);
    }
}
