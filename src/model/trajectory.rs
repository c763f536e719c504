// src/model/trajectory.rs

use crate::error::{NanoError, Result};
use crate::model::atom::TrajectoryFields;
use crate::model::atoms::AtomCollection;
use std::collections::HashMap;

/// Ordered sequence of frames for the same set of atoms.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    frames: Vec<AtomCollection>,
    reference: Option<usize>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<AtomCollection>) -> Self {
        Self { frames, reference: None }
    }

    pub fn push(&mut self, frame: AtomCollection) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, i: usize) -> Option<&AtomCollection> {
        self.frames.get(i)
    }

    pub fn frames(&self) -> &[AtomCollection] {
        &self.frames
    }

    pub fn reference_frame(&self) -> Option<usize> {
        self.reference
    }

    /// Link every atom to the same-id atom of frame `index`, recording its
    /// position there as `r0`. Atoms with no counterpart get an empty link.
    pub fn set_reference_frame(&mut self, index: usize) -> Result<()> {
        let reference = self.frames.get(index).ok_or_else(|| {
            NanoError::config("reference frame", format!("index {} out of range (0..{})", index, self.frames.len()))
        })?;
        let r0: HashMap<usize, _> = reference.iter().map(|a| (a.id, a.r)).collect();

        for frame in &mut self.frames {
            // iter_mut drops neighbor caches; trajectory links do not depend on them
            for atom in frame.iter_mut() {
                atom.trajectory = Some(match r0.get(&atom.id) {
                    Some(&r) => TrajectoryFields {
                        reference_id: Some(atom.id),
                        r0: Some(r),
                    },
                    None => TrajectoryFields::default(),
                });
            }
        }
        self.reference = Some(index);
        log::debug!("trajectory reference frame set to {}", index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use nalgebra::Vector3;

    fn frame(shift: f64) -> AtomCollection {
        let mut atoms: AtomCollection = (0..3)
            .map(|i| Atom::builder("C").xyz(i as f64 + shift, 0.0, 0.0).build())
            .collect();
        atoms.assign_unique_ids(1);
        atoms
    }

    #[test]
    fn test_reference_links_displacements() {
        let mut traj = Trajectory::from_frames(vec![frame(0.0), frame(0.5)]);
        traj.set_reference_frame(0).unwrap();
        let moved = traj.frame(1).unwrap().get(2).unwrap();
        assert_eq!(moved.displacement(), Some(Vector3::new(0.5, 0.0, 0.0)));
        assert_eq!(traj.reference_frame(), Some(0));
    }

    #[test]
    fn test_out_of_range_reference() {
        let mut traj = Trajectory::new();
        assert!(traj.set_reference_frame(0).is_err());
    }
}
