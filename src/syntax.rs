//! Types and terms in locally nameless form.
//!
//! Free variables are positions in an [`Env`](crate::env::Env); variables bound by an enclosing
//! recursive binder are de Bruijn indices counting binders outward.

use std::collections::BTreeSet;
use std::fmt;

use crate::{shift_var, Shift};

/// A type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// The greatest type.
    Top,
    /// The least type.
    Bottom,
    /// The type of booleans.
    Boolean,
    /// An intersection.
    And(Box<Type>, Box<Type>),
    /// A method declaration `m(T1): T2`, where `m` is a label.
    Function(usize, Box<Type>, Box<Type>),
    /// An abstract type member with its lower and upper bounds.
    Member(Box<Type>, Box<Type>),
    /// `x.Type` for a free variable `x`.
    Selection(usize),
    /// `x.Type` for a variable bound by an enclosing `Bind`.
    BoundSelection(usize),
    /// A recursive self type `{ z => T^z }`.
    Bind(Box<Type>),
    /// The end of a declaration list.
    NoMembers,
}

impl Type {
    /// Creates an intersection.
    pub fn and(t1: Type, t2: Type) -> Type {
        Type::And(Box::new(t1), Box::new(t2))
    }

    /// Creates a method declaration.
    pub fn fun(m: usize, t1: Type, t2: Type) -> Type {
        Type::Function(m, Box::new(t1), Box::new(t2))
    }

    /// Creates a type member.
    pub fn mem(lower: Type, upper: Type) -> Type {
        Type::Member(Box::new(lower), Box::new(upper))
    }

    /// Creates a recursive self type whose body is `t`.
    pub fn bind(t: Type) -> Type {
        Type::Bind(Box::new(t))
    }

    /// Builds an object type body from a list of declarations: `d1 & (d2 & (... & NoMembers))`.
    pub fn from_decls<I>(decls: I) -> Type
    where
        I: IntoIterator<Item = Type>,
        I::IntoIter: DoubleEndedIterator,
    {
        decls
            .into_iter()
            .rev()
            .fold(Type::NoMembers, |acc, d| Type::and(d, acc))
    }

    /// Returns the declarations of a list built by `from_decls`, if `self` is one.
    pub fn decls(&self) -> Option<Vec<&Type>> {
        let mut v = Vec::new();
        let mut t = self;
        loop {
            match *t {
                Type::NoMembers => return Some(v),
                Type::And(ref d, ref rest) => {
                    v.push(&**d);
                    t = rest;
                }
                _ => return None,
            }
        }
    }

    fn map<F>(self, onsel: &F, c: usize) -> Type
    where
        F: Fn(usize, Type) -> Type,
    {
        use self::Type::*;
        match self {
            Selection(_) | BoundSelection(_) => onsel(c, self),
            And(t1, t2) => Type::and(t1.map(onsel, c), t2.map(onsel, c)),
            Function(m, t1, t2) => Type::fun(m, t1.map(onsel, c), t2.map(onsel, c)),
            Member(t1, t2) => Type::mem(t1.map(onsel, c), t2.map(onsel, c)),
            Bind(t) => Type::bind(t.map(onsel, c + 1)),
            Top | Bottom | Boolean | NoMembers => self,
        }
    }

    /// Returns true if every bound selection refers to one of `k` enclosing binders.
    pub fn closed_at(&self, k: usize) -> bool {
        use self::Type::*;
        match *self {
            BoundSelection(i) => i < k,
            Bind(ref t) => t.closed_at(k + 1),
            And(ref t1, ref t2) | Function(_, ref t1, ref t2) | Member(ref t1, ref t2) => {
                t1.closed_at(k) && t2.closed_at(k)
            }
            Top | Bottom | Boolean | NoMembers | Selection(_) => true,
        }
    }

    /// Returns true if `self` has no dangling bound selection.
    pub fn is_closed(&self) -> bool {
        self.closed_at(0)
    }

    /// Replaces the outermost bound selection with `x.Type`.
    ///
    /// Intended for the body of a `Bind`. Opening a closed type returns it unchanged.
    pub fn open(self, x: usize) -> Type {
        self.open_at(0, x)
    }

    fn open_at(self, k: usize, x: usize) -> Type {
        let f = |c, t| match t {
            Type::BoundSelection(i) if i == c => Type::Selection(x),
            t => t,
        };
        self.map(&f, k)
    }

    /// Abstracts `x.Type` into the outermost bound selection. Inverse of `open`.
    pub fn close(self, x: usize) -> Type {
        let f = |c, t| match t {
            Type::Selection(y) if y == x => Type::BoundSelection(c),
            t => t,
        };
        self.map(&f, 0)
    }

    /// The free variables of `self`.
    pub fn free_vars(&self) -> BTreeSet<usize> {
        let mut s = BTreeSet::new();
        self.collect_free_vars(&mut s);
        s
    }

    fn collect_free_vars(&self, s: &mut BTreeSet<usize>) {
        use self::Type::*;
        match *self {
            Selection(x) => {
                s.insert(x);
            }
            Bind(ref t) => t.collect_free_vars(s),
            And(ref t1, ref t2) | Function(_, ref t1, ref t2) | Member(ref t1, ref t2) => {
                t1.collect_free_vars(s);
                t2.collect_free_vars(s);
            }
            Top | Bottom | Boolean | NoMembers | BoundSelection(_) => (),
        }
    }

    /// The number of constructors in `self`.
    pub fn size(&self) -> usize {
        use self::Type::*;
        match *self {
            Bind(ref t) => t.size() + 1,
            And(ref t1, ref t2) | Function(_, ref t1, ref t2) | Member(ref t1, ref t2) => {
                t1.size() + t2.size() + 1
            }
            Top | Bottom | Boolean | NoMembers | Selection(_) | BoundSelection(_) => 1,
        }
    }
}

impl Shift for Type {
    fn shift_above(self, c: usize, d: isize) -> Self {
        let f = |_, t| match t {
            Type::Selection(x) if x >= c => Type::Selection(shift_var(x, d)),
            t => t,
        };
        self.map(&f, 0)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Type::*;
        match *self {
            Top => write!(f, "Top"),
            Bottom => write!(f, "Bot"),
            Boolean => write!(f, "Bool"),
            And(ref t1, ref t2) => write!(f, "({} & {})", t1, t2),
            Function(m, ref t1, ref t2) => write!(f, "m{}({}): {}", m, t1, t2),
            Member(ref t1, ref t2) => write!(f, "{{type >: {} <: {}}}", t1, t2),
            Selection(x) => write!(f, "x{}.Type", x),
            BoundSelection(i) => write!(f, "#{}.Type", i),
            Bind(ref t) => write!(f, "{{z => {}}}", t),
            NoMembers => write!(f, "{{}}"),
        }
    }
}

/// A term.
#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    /// A free variable.
    Var(usize),
    /// A variable bound by an enclosing object or method.
    BoundVar(usize),
    /// A method call `t1.m(t2)`.
    App(Box<Term>, usize, Box<Term>),
    /// An object `new { z: T => defs }`. Both `T` and the definitions see the self variable.
    Obj(Type, Vec<Def>),
}

/// A member definition in an object.
#[derive(Clone, Debug, PartialEq)]
pub enum Def {
    /// `def m(x: T1): T2 = t`. The body additionally sees the parameter.
    Fun(usize, Type, Type, Box<Term>),
    /// `type = T`.
    Mem(Type),
}

impl Def {
    /// The declaration this definition contributes to its object's type.
    pub fn decl(&self) -> Type {
        match *self {
            Def::Fun(m, ref t1, ref t2, _) => Type::fun(m, t1.clone(), t2.clone()),
            Def::Mem(ref t) => Type::mem(t.clone(), t.clone()),
        }
    }

    fn open_at(self, k: usize, x: usize) -> Def {
        match self {
            Def::Fun(m, t1, t2, t) => Def::Fun(
                m,
                t1.open_at(k, x),
                t2.open_at(k, x),
                Box::new(t.open_at(k + 1, x)),
            ),
            Def::Mem(t) => Def::Mem(t.open_at(k, x)),
        }
    }

    fn closed_at(&self, k: usize) -> bool {
        match *self {
            Def::Fun(_, ref t1, ref t2, ref t) => {
                t1.closed_at(k) && t2.closed_at(k) && t.closed_at(k + 1)
            }
            Def::Mem(ref t) => t.closed_at(k),
        }
    }
}

impl Term {
    /// Creates an object whose self type is assembled from the declarations of `defs`.
    pub fn obj(defs: Vec<Def>) -> Term {
        let ty = Type::from_decls(defs.iter().map(Def::decl).collect::<Vec<_>>());
        Term::Obj(ty, defs)
    }

    /// The recursive self type of an object.
    pub fn self_type(&self) -> Option<Type> {
        match *self {
            Term::Obj(ref t, _) => Some(Type::bind(t.clone())),
            _ => None,
        }
    }

    /// Replaces the outermost bound variable with `x`, both in terms and in the types they
    /// carry.
    pub fn open(self, x: usize) -> Term {
        self.open_at(0, x)
    }

    fn open_at(self, k: usize, x: usize) -> Term {
        use self::Term::*;
        match self {
            BoundVar(i) if i == k => Var(x),
            Var(_) | BoundVar(_) => self,
            App(t1, m, t2) => App(Box::new(t1.open_at(k, x)), m, Box::new(t2.open_at(k, x))),
            Obj(t, ds) => Obj(
                t.open_at(k + 1, x),
                ds.into_iter().map(|d| d.open_at(k + 1, x)).collect(),
            ),
        }
    }

    /// Returns true if every bound variable refers to one of `k` enclosing binders.
    pub fn closed_at(&self, k: usize) -> bool {
        use self::Term::*;
        match *self {
            Var(_) => true,
            BoundVar(i) => i < k,
            App(ref t1, _, ref t2) => t1.closed_at(k) && t2.closed_at(k),
            Obj(ref t, ref ds) => t.closed_at(k + 1) && ds.iter().all(|d| d.closed_at(k + 1)),
        }
    }
}

impl Shift for Term {
    fn shift_above(self, c: usize, d: isize) -> Self {
        use self::Term::*;
        match self {
            Var(x) if x >= c => Var(shift_var(x, d)),
            Var(_) | BoundVar(_) => self,
            App(t1, m, t2) => App(
                Box::new(t1.shift_above(c, d)),
                m,
                Box::new(t2.shift_above(c, d)),
            ),
            Obj(t, ds) => Obj(
                t.shift_above(c, d),
                ds.into_iter()
                    .map(|def| match def {
                        Def::Fun(m, t1, t2, t) => Def::Fun(
                            m,
                            t1.shift_above(c, d),
                            t2.shift_above(c, d),
                            Box::new(t.shift_above(c, d)),
                        ),
                        Def::Mem(t) => Def::Mem(t.shift_above(c, d)),
                    })
                    .collect(),
            ),
        }
    }
}
