//! Selection language for atom collections.
//!
//! ```text
//! element B and z >= 0 and not within 1.5 of id 4 5 6 9
//! within Cylinder(p1=[0,-15,0], p2=[0,25,0], r=15) and molid 1 2
//! ```
//!
//! Terms: `all`, `none`, `id`, `molid`, `type`, `element` lists, `x|y|z <op> value`
//! with `<`, `<=`, `>`, `>=`, `==`, `!=`, `within R of <term>`, `exwithin R of <term>`
//! and `within Shape(key=value, ...)` for Sphere, Cylinder, Parallelepiped, Cuboid
//! and Ellipsoid. `not` binds tighter than `and`, which binds tighter than `or`.

pub mod lexer;
pub mod parser;
pub mod predicate;

use crate::error::Result;
use crate::model::atoms::AtomCollection;
use crate::physics::neighbors::SpatialIndex;
use predicate::EvalContext;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use predicate::{CmpOp, Predicate, Region};

/// A compiled selection string. Parsing happens once; evaluation never
/// mutates the collection it runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    source: String,
    predicate: Predicate,
}

impl Selection {
    pub fn parse(selstr: &str) -> Result<Self> {
        let predicate = parser::parse(selstr)?;
        Ok(Self {
            source: selstr.to_string(),
            predicate,
        })
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Ids of the matching atoms. A prebuilt `index` is used when it is still
    /// current for `atoms`; otherwise one is built on demand.
    pub fn evaluate(&self, atoms: &AtomCollection, index: Option<&SpatialIndex>) -> Result<BTreeSet<usize>> {
        let ids = EvalContext::new(atoms, index).eval(&self.predicate)?;
        log::debug!("selection '{}' matched {} of {} atoms", self.source, ids.len(), atoms.len());
        Ok(ids)
    }

    /// Matching atoms as a new collection, in their original order.
    pub fn select(&self, atoms: &AtomCollection, index: Option<&SpatialIndex>) -> Result<AtomCollection> {
        let ids = self.evaluate(atoms, index)?;
        Ok(atoms.filter(ids, false))
    }
}

impl FromStr for Selection {
    type Err = crate::error::NanoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
