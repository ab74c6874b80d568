use crate::error::{Result, SubtypeError};

/// Limits for subtyping queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum recursion depth of the subtyping search, expansion and transitivity elimination.
    pub max_depth: usize,
    /// Maximum size of a derivation `L <: U` accepted as evidence that a variable's bounds are
    /// consistent.
    pub realizability_budget: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: 256,
            realizability_budget: 64,
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    pub fn with_realizability_budget(mut self, n: usize) -> Self {
        self.realizability_budget = n;
        self
    }

    pub(crate) fn fuel(&self) -> Fuel {
        Fuel(self.max_depth)
    }
}

/// Remaining recursion depth. Each recursive step spends one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Fuel(usize);

impl Fuel {
    pub(crate) fn spend(self) -> Result<Fuel> {
        if self.0 == 0 {
            Err(SubtypeError::BudgetExceeded)
        } else {
            Ok(Fuel(self.0 - 1))
        }
    }
}
