//! Environments: stacks of declared types with stable absolute positions.

use crate::error::{Result, SubtypeError};
use crate::syntax::Type;

/// An environment. The entry pushed onto an environment of length `n` lives at position `n`
/// forever; `update` replaces a type in place and never changes the length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Env(Vec<(usize, Type)>);

impl Env {
    pub fn new() -> Env {
        Env(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The position the next `extend` will bind.
    pub fn fresh(&self) -> usize {
        self.len()
    }

    pub fn lookup(&self, x: usize) -> Option<&Type> {
        self.0.iter().find(|&&(p, _)| p == x).map(|(_, t)| t)
    }

    /// Like `lookup`, failing with `UnboundVariable`.
    pub fn index(&self, x: usize) -> Result<&Type> {
        self.lookup(x).ok_or(SubtypeError::UnboundVariable(x))
    }

    /// Replaces the type at `x`. Returns an unchanged copy if `x` is unbound.
    pub fn update(&self, x: usize, ty: Type) -> Env {
        let mut v = self.0.clone();
        if let Some(e) = v.iter_mut().find(|e| e.0 == x) {
            e.1 = ty;
        }
        Env(v)
    }

    pub fn extend(&self, ty: Type) -> Env {
        let mut v = self.0.clone();
        v.push((self.len(), ty));
        Env(v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Type)> {
        self.0.iter().map(|&(p, ref t)| (p, t))
    }

    /// Checks that every entry is closed and every selection in it refers to an entry.
    pub fn check_well_scoped(&self) -> Result<()> {
        for (_, t) in self.iter() {
            if !t.is_closed() {
                return Err(SubtypeError::Unclosed(t.clone()));
            }
            for x in t.free_vars() {
                self.index(x)?;
            }
        }
        Ok(())
    }

    pub fn is_well_scoped(&self) -> bool {
        self.check_well_scoped().is_ok()
    }
}

impl From<Vec<Type>> for Env {
    fn from(v: Vec<Type>) -> Env {
        Env(v.into_iter().enumerate().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::syntax::Type::*;

    #[test]
    fn test_lookup() {
        let env = Env::new().extend(Boolean).extend(Top);
        assert_eq!(env.len(), 2);
        assert_eq!(env.lookup(0), Some(&Boolean));
        assert_eq!(env.lookup(1), Some(&Top));
        assert_eq!(env.lookup(2), None);
        assert_eq!(env.index(5), Err(SubtypeError::UnboundVariable(5)));
        assert_eq!(env, Env::from(vec![Boolean, Top]));
    }

    #[test]
    fn test_update() {
        let env = Env::from(vec![Boolean, Top]);
        let env1 = env.update(0, Bottom);
        assert_eq!(env1.len(), 2);
        assert_eq!(env1.lookup(0), Some(&Bottom));
        assert_eq!(env1.lookup(1), Some(&Top));
        assert_eq!(env.lookup(0), Some(&Boolean));

        assert_eq!(env.update(7, Bottom), env);
    }

    #[test]
    fn test_update_commutes_with_extend() {
        let env = Env::from(vec![Boolean, Top]);
        assert_eq!(
            env.extend(NoMembers).update(0, Bottom),
            env.update(0, Bottom).extend(NoMembers)
        );
        assert_eq!(env.extend(NoMembers).fresh(), 3);
    }

    #[test]
    fn test_well_scoped() {
        let env = Env::from(vec![Type::mem(Bottom, Top), Type::mem(Selection(0), Top)]);
        assert!(env.is_well_scoped());

        // A self-referential entry is fine.
        let env = Env::from(vec![Type::mem(Bottom, Type::fun(0, Selection(0), Top))]);
        assert!(env.is_well_scoped());

        let env = Env::from(vec![Type::mem(Selection(1), Top)]);
        assert_eq!(env.check_well_scoped(), Err(SubtypeError::UnboundVariable(1)));

        let env = Env::from(vec![BoundSelection(0)]);
        assert_eq!(env.check_well_scoped(), Err(SubtypeError::Unclosed(BoundSelection(0))));
    }
}
