//! Nearest-neighbor and radius search over atom positions.
//!
//! The index is a snapshot: it records the collection revision it was built
//! from and reports itself stale once the collection has been edited.

use crate::error::{NanoError, Result};
use crate::model::atoms::AtomCollection;
use crate::utils::geometry::Point;
use kdtree::KdTree;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Minkowski p-norm used for neighbor distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Norm {
    /// p = 1
    Manhattan,
    /// p = 2
    #[default]
    Euclidean,
    /// p = infinity
    Chebyshev,
    Minkowski(f64),
}

impl Norm {
    pub fn from_p(p: f64) -> Result<Self> {
        if p.is_nan() || p < 1.0 {
            return Err(NanoError::config("p-norm", format!("p must satisfy 1 <= p <= inf, got {}", p)));
        }
        Ok(if p == 1.0 {
            Norm::Manhattan
        } else if p == 2.0 {
            Norm::Euclidean
        } else if p.is_infinite() {
            Norm::Chebyshev
        } else {
            Norm::Minkowski(p)
        })
    }

    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let diffs = a.iter().zip(b).map(|(x, y)| (x - y).abs());
        match *self {
            Norm::Manhattan => diffs.sum(),
            Norm::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            Norm::Chebyshev => diffs.fold(0.0, f64::max),
            Norm::Minkowski(p) => diffs.map(|d| d.powf(p)).sum::<f64>().powf(1.0 / p),
        }
    }
}

/// Per-atom neighbor distances and indices, ascending by distance, self excluded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborQuery {
    pub distances: Vec<Vec<f64>>,
    pub indices: Vec<Vec<usize>>,
}

impl NeighborQuery {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of neighbors of atom `i` strictly closer than `cutoff`.
    pub fn count_within(&self, i: usize, cutoff: f64) -> usize {
        self.distances[i].iter().filter(|&&d| d < cutoff).count()
    }
}

pub struct SpatialIndex {
    tree: KdTree<f64, usize, [f64; 3]>,
    points: Vec<[f64; 3]>,
    norm: Norm,
    revision: u64,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.points.len())
            .field("norm", &self.norm)
            .field("revision", &self.revision)
            .finish()
    }
}

impl SpatialIndex {
    /// Index the current positions of `atoms`. Returns `None` for an empty collection.
    pub fn build(atoms: &AtomCollection) -> Result<Option<Self>> {
        Self::from_points(&atoms.positions(), atoms.norm(), atoms.revision())
    }

    pub fn from_points(positions: &[Point], norm: Norm, revision: u64) -> Result<Option<Self>> {
        if positions.is_empty() {
            return Ok(None);
        }
        let mut tree = KdTree::new(3);
        let mut points = Vec::with_capacity(positions.len());
        for (i, p) in positions.iter().enumerate() {
            let coords = [p.x, p.y, p.z];
            tree.add(coords, i)
                .map_err(|e| NanoError::SpatialIndex(format!("atom {}: {:?}", i, e)))?;
            points.push(coords);
        }
        log::debug!("built spatial index over {} points ({:?})", points.len(), norm);
        Ok(Some(Self {
            tree,
            points,
            norm,
            revision,
        }))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }

    /// True once `atoms` has been edited (or swapped) since this index was built.
    pub fn is_stale(&self, atoms: &AtomCollection) -> bool {
        self.revision != atoms.revision() || self.points.len() != atoms.len()
    }

    /// Up to `n` neighbors per indexed point, excluding the point itself and
    /// anything at or beyond `cutoff`.
    pub fn query(&self, n: usize, cutoff: f64) -> Result<NeighborQuery> {
        let norm = self.norm;
        let dist = move |a: &[f64], b: &[f64]| norm.distance(a, b);

        let rows: Vec<(Vec<f64>, Vec<usize>)> = (0..self.points.len())
            .into_par_iter()
            .map(|i| -> Result<(Vec<f64>, Vec<usize>)> {
                if n == 0 {
                    return Ok((Vec::new(), Vec::new()));
                }
                let found = self
                    .tree
                    .nearest(&self.points[i], n + 1, &dist)
                    .map_err(|e| NanoError::SpatialIndex(format!("query for atom {}: {:?}", i, e)))?;

                let mut row: Vec<(f64, usize)> = found.into_iter().map(|(d, &j)| (d, j)).collect();
                match row.iter().position(|&(_, j)| j == i) {
                    Some(self_pos) => {
                        row.remove(self_pos);
                    }
                    // coincident duplicates pushed self out of the result
                    None => row.truncate(n),
                }
                row.retain(|&(d, _)| d < cutoff);
                Ok(row.into_iter().unzip())
            })
            .collect::<Result<_>>()?;

        let (distances, indices) = rows.into_iter().unzip();
        Ok(NeighborQuery { distances, indices })
    }

    /// Indices of all points within `radius` (inclusive) of `point`, ascending by distance.
    pub fn within(&self, point: &Point, radius: f64) -> Result<Vec<(f64, usize)>> {
        if radius < 0.0 {
            return Ok(Vec::new());
        }
        let norm = self.norm;
        let dist = move |a: &[f64], b: &[f64]| norm.distance(a, b);
        // widen the tree search slightly; the exact inclusive test is applied below
        let search = radius * (1.0 + 1e-9) + 1e-12;
        let mut hits: Vec<(f64, usize)> = self
            .tree
            .within(&[point.x, point.y, point.z], search, &dist)
            .map_err(|e| NanoError::SpatialIndex(format!("radius query: {:?}", e)))?
            .into_iter()
            .map(|(d, &j)| (d, j))
            .filter(|&(d, _)| d <= radius)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits)
    }
}
