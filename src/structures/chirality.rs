// src/structures/chirality.rs

use crate::error::{NanoError, Result};
use crate::selection::CmpOp;
use crate::utils::linalg::gcd;
use nalgebra::DMatrix;
use std::f64::consts::{FRAC_PI_6, PI};
use std::fmt;
use std::str::FromStr;

/// Carbon-carbon bond length in graphene (Å).
pub const CC_BOND: f64 = 1.42;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChiralType {
    Armchair,
    Zigzag,
    Chiral,
}

impl ChiralType {
    pub fn is_achiral(self) -> bool {
        !matches!(self, ChiralType::Chiral)
    }
}

impl fmt::Display for ChiralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChiralType::Armchair => "armchair",
            ChiralType::Zigzag => "zigzag",
            ChiralType::Chiral => "chiral",
        })
    }
}

impl FromStr for ChiralType {
    type Err = NanoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "armchair" | "a" => Ok(ChiralType::Armchair),
            "zigzag" | "z" => Ok(ChiralType::Zigzag),
            "chiral" | "c" => Ok(ChiralType::Chiral),
            other => Err(NanoError::config("chiral type", format!("unknown type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    /// m <= n
    Right,
    /// m >= n
    Left,
}

impl FromStr for Handedness {
    type Err = NanoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "right" | "r" => Ok(Handedness::Right),
            "left" | "l" => Ok(Handedness::Left),
            other => Err(NanoError::config("handedness", format!("expected left or right, got '{}'", other))),
        }
    }
}

/// Chiral indices (n, m) of a rolled graphene sheet.
///
/// Integer invariants (`d_r`, `t1`, `t2`, `nhex`, `symmetry_vector`, ...) depend
/// only on (n, m); lengths additionally take the bond length in Å.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chirality {
    pub n: u32,
    pub m: u32,
}

impl Chirality {
    pub fn new(n: u32, m: u32) -> Result<Self> {
        if n == 0 && m == 0 {
            return Err(NanoError::config("chirality", "(0, 0) does not define a tube"));
        }
        Ok(Self { n, m })
    }

    fn nm(&self) -> (i64, i64) {
        (self.n as i64, self.m as i64)
    }

    pub fn chiral_type(&self) -> ChiralType {
        if self.n == self.m {
            ChiralType::Armchair
        } else if self.n == 0 || self.m == 0 {
            ChiralType::Zigzag
        } else {
            ChiralType::Chiral
        }
    }

    /// gcd(2n + m, 2m + n)
    pub fn d_r(&self) -> i64 {
        let (n, m) = self.nm();
        gcd(2 * n + m, 2 * m + n)
    }

    pub fn t1(&self) -> i64 {
        let (n, m) = self.nm();
        (2 * m + n) / self.d_r()
    }

    pub fn t2(&self) -> i64 {
        let (n, m) = self.nm();
        -(2 * n + m) / self.d_r()
    }

    /// Number of graphene hexagons per tube unit cell (2N atoms).
    pub fn nhex(&self) -> i64 {
        let (n, m) = self.nm();
        2 * (n * n + m * m + n * m) / self.d_r()
    }

    pub fn natoms_per_cell(&self) -> usize {
        2 * self.nhex() as usize
    }

    /// Chiral angle in radians, 0 for zigzag (n, 0) and pi/6 for armchair.
    pub fn chiral_angle(&self) -> f64 {
        let (n, m) = (self.n as f64, self.m as f64);
        (3f64.sqrt() * m / (2.0 * n + m)).atan()
    }

    /// |Ch| in Å.
    pub fn circumference(&self, bond: f64) -> f64 {
        let (n, m) = (self.n as f64, self.m as f64);
        3f64.sqrt() * bond * (n * n + m * m + n * m).sqrt()
    }

    pub fn dt(&self, bond: f64) -> f64 {
        self.circumference(bond) / PI
    }

    pub fn rt(&self, bond: f64) -> f64 {
        self.circumference(bond) / (2.0 * PI)
    }

    /// Length of the translation vector T (tube unit-cell length) in Å.
    pub fn translation_length(&self, bond: f64) -> f64 {
        3f64.sqrt() * self.circumference(bond) / self.d_r() as f64
    }

    /// Symmetry vector R = (p, q): the first solution of t1*q - t2*p = 1
    /// scanning p upward from 0 and q from -N to N.
    pub fn symmetry_vector(&self) -> (i64, i64) {
        let (t1, t2, nhex) = (self.t1(), self.t2(), self.nhex());
        for p in 0..=nhex {
            for q in -nhex..=nhex {
                if t1 * q - t2 * p == 1 {
                    return (p, q);
                }
            }
        }
        // t1 and t2 are coprime, so the scan above always succeeds
        (0, 0)
    }

    /// M = m*p - n*q
    pub fn m_sym(&self) -> i64 {
        let (n, m) = self.nm();
        let (p, q) = self.symmetry_vector();
        m * p - n * q
    }

    /// Rotation angle of the screw operation R (radians).
    pub fn psi(&self) -> f64 {
        2.0 * PI / self.nhex() as f64
    }

    /// Axial translation of the screw operation R (Å).
    pub fn tau(&self, bond: f64) -> f64 {
        self.m_sym() as f64 * self.translation_length(bond) / self.nhex() as f64
    }

    /// Angular offset of the second basis atom (radians).
    pub fn dpsi(&self, bond: f64) -> f64 {
        bond * (FRAC_PI_6 - self.chiral_angle()).cos() / self.rt(bond)
    }

    /// Axial offset of the second basis atom (Å).
    pub fn dtau(&self, bond: f64) -> f64 {
        bond * (FRAC_PI_6 - self.chiral_angle()).sin()
    }

    pub fn mirror(&self) -> Self {
        Self { n: self.m, m: self.n }
    }
}

impl fmt::Display for Chirality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.n, self.m)
    }
}

impl FromStr for Chirality {
    type Err = NanoError;

    /// Accepts "n,m", "(n,m)" or "n m".
    fn from_str(s: &str) -> Result<Self> {
        let bad = || NanoError::config("chirality", format!("cannot parse '{}' as (n, m)", s));
        let inner = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = inner
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        let [n, m] = parts.as_slice() else {
            return Err(bad());
        };
        let n = n.parse().map_err(|_| bad())?;
        let m = m.parse().map_err(|_| bad())?;
        Chirality::new(n, m)
    }
}

/// A numeric tube property usable in filters and property grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChProperty {
    N,
    M,
    Dt,
    Rt,
    Ch,
    T,
    Nhex,
    Natoms,
    /// degrees
    ChiralAngle,
    DR,
}

impl ChProperty {
    pub fn compute(self, ch: &Chirality, bond: f64) -> f64 {
        match self {
            ChProperty::N => ch.n as f64,
            ChProperty::M => ch.m as f64,
            ChProperty::Dt => ch.dt(bond),
            ChProperty::Rt => ch.rt(bond),
            ChProperty::Ch => ch.circumference(bond),
            ChProperty::T => ch.translation_length(bond),
            ChProperty::Nhex => ch.nhex() as f64,
            ChProperty::Natoms => ch.natoms_per_cell() as f64,
            ChProperty::ChiralAngle => ch.chiral_angle().to_degrees(),
            ChProperty::DR => ch.d_r() as f64,
        }
    }
}

impl FromStr for ChProperty {
    type Err = NanoError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "n" => ChProperty::N,
            "m" => ChProperty::M,
            "dt" => ChProperty::Dt,
            "rt" => ChProperty::Rt,
            "Ch" => ChProperty::Ch,
            "T" => ChProperty::T,
            "N" => ChProperty::Nhex,
            "Natoms" => ChProperty::Natoms,
            "chiral_angle" => ChProperty::ChiralAngle,
            "dR" => ChProperty::DR,
            other => return Err(NanoError::config("chirality property", format!("unknown property '{}'", other))),
        })
    }
}

/// One `(property, op, value)` condition for [`filter_ch_list`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyFilter {
    pub property: ChProperty,
    pub op: CmpOp,
    pub value: f64,
}

impl PropertyFilter {
    pub fn new(property: ChProperty, op: CmpOp, value: f64) -> Self {
        Self { property, op, value }
    }

    pub fn accepts(&self, ch: &Chirality, bond: f64) -> bool {
        self.op.apply(self.property.compute(ch, bond), self.value)
    }
}

impl FromStr for PropertyFilter {
    type Err = NanoError;

    /// `"dt>=1.2"`, `"chiral_angle < 20"`.
    fn from_str(s: &str) -> Result<Self> {
        const OPS: [(&str, CmpOp); 7] = [
            ("<=", CmpOp::Le),
            (">=", CmpOp::Ge),
            ("!=", CmpOp::Ne),
            ("==", CmpOp::Eq),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
            ("=", CmpOp::Eq),
        ];
        let (idx, sym, op) = OPS
            .iter()
            .filter_map(|(sym, op)| s.find(sym).map(|idx| (idx, *sym, *op)))
            .min_by_key(|(idx, sym, _)| (*idx, usize::MAX - sym.len()))
            .ok_or_else(|| NanoError::config("property filter", format!("no comparison in '{}'", s)))?;
        let property: ChProperty = s[..idx].trim().parse()?;
        let rhs = s[idx + sym.len()..].trim();
        let value: f64 = rhs
            .parse()
            .map_err(|_| NanoError::config("property filter", format!("invalid value '{}'", rhs)))?;
        Ok(Self::new(property, op, value))
    }
}

/// All chiralities with n in `ni..=nf` and m in `mi..=mf`.
///
/// With a handedness only that half is kept (right: m <= n). Without one,
/// each (n, m) is followed by its mirror (m, n), duplicates dropped.
/// `chiral_types` keeps only the listed kinds. (0, 0) is skipped.
pub fn generate_ch_list(
    ni: u32,
    nf: u32,
    mi: u32,
    mf: u32,
    handedness: Option<Handedness>,
    chiral_types: Option<&[ChiralType]>,
) -> Vec<Chirality> {
    let mut out: Vec<Chirality> = Vec::new();
    let push = |ch: Chirality, out: &mut Vec<Chirality>| {
        let wanted = chiral_types.map_or(true, |types| types.contains(&ch.chiral_type()));
        if wanted && !out.contains(&ch) {
            out.push(ch);
        }
    };

    for n in ni..=nf {
        for m in mi..=mf {
            let Ok(ch) = Chirality::new(n, m) else {
                continue;
            };
            match handedness {
                Some(Handedness::Right) if m > n => continue,
                Some(Handedness::Left) if m < n => continue,
                Some(_) => push(ch, &mut out),
                None => {
                    push(ch, &mut out);
                    push(ch.mirror(), &mut out);
                }
            }
        }
    }
    out
}

/// Same as [`generate_ch_list`] with both indices bounded by `imax`
/// (n from `ni`, m from 0).
pub fn generate_ch_list_imax(
    ni: u32,
    imax: u32,
    handedness: Option<Handedness>,
    chiral_types: Option<&[ChiralType]>,
) -> Vec<Chirality> {
    generate_ch_list(ni, imax, 0, imax, handedness, chiral_types)
}

/// Keep the chiralities passing every filter, in order.
pub fn filter_ch_list(list: &[Chirality], filters: &[PropertyFilter], bond: f64) -> Vec<Chirality> {
    list.iter()
        .filter(|ch| filters.iter().all(|f| f.accepts(ch, bond)))
        .copied()
        .collect()
}

/// `(imax + 1) x (imax + 1)` grid of `property(n, m)` indexed `[n, m]`;
/// NaN at (0, 0).
pub fn generate_ch_property_grid(property: ChProperty, imax: u32, bond: f64) -> DMatrix<f64> {
    let size = imax as usize + 1;
    DMatrix::from_fn(size, size, |n, m| match Chirality::new(n as u32, m as u32) {
        Ok(ch) => property.compute(&ch, bond),
        Err(_) => f64::NAN,
    })
}
