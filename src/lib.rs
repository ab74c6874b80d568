//! Subtyping for a dependent object calculus.
//!
//! Types carry abstract type members, path-dependent selections `x.Type`, recursive self types
//! and intersections. Subtyping is decided without a transitivity rule in the search; explicit
//! transitivity steps in user-built derivations can be eliminated with [`trans::normalize`].

pub mod config;
pub mod derivation;
pub mod env;
pub mod error;
pub mod expand;
pub mod narrow;
pub mod subtype;
pub mod syntax;
pub mod trans;

pub use config::Config;
pub use derivation::{Derivation, Mode, Relaxed, Strict};
pub use env::Env;
pub use error::{Result, SubtypeError};
pub use expand::expand;
pub use narrow::narrow;
pub use subtype::{stp, subtype};
pub use syntax::{Def, Term, Type};
pub use trans::{check_realizable, trans};

/// Shifts free variables at or above a cutoff.
///
/// # Panics
///
/// Shifting a variable below position 0 panics.
pub trait Shift: Sized {
    /// Adds `d` to every free variable `x >= c`.
    fn shift_above(self, c: usize, d: isize) -> Self;

    /// Adds `d` to every free variable.
    fn shift(self, d: isize) -> Self {
        self.shift_above(0, d)
    }
}

pub(crate) fn shift_var(x: usize, d: isize) -> usize {
    x.checked_add_signed(d).unwrap_or_else(|| panic!("cannot shift x{} by {}", x, d))
}
