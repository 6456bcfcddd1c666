//! Zero-copy scaled views over a [`SparseVector`].
//!
//! A view owns no entries. Reads multiply the backing value by the scale,
//! writes divide by it, so the backing vector always holds the unscaled value.

use crate::error::{SpaceError, SpaceResult};
use crate::vector::{SparseVector, Vector, VectorMut};

use std::borrow::{Borrow, BorrowMut};


/// Fails unless `scale` is a usable, non-zero factor.
pub(crate) fn check_scale(scale: f64) -> SpaceResult<()> {
    if scale == 0.0 || !scale.is_finite() {
        return Err(SpaceError::configuration(format!("cannot scale a vector by {}", scale)));
    }
    Ok(())
}

/// A vector that reads and writes through a backing [`SparseVector`] times `scale`.
///
/// `B` is anything that borrows a sparse vector: `&SparseVector` for a read only
/// view, `&mut SparseVector` for a writable one, or an owned `SparseVector`.
#[derive(Debug)]
pub struct ScaledSparseVector<B> {
    backing: B,
    scale: f64
}

impl<B: Borrow<SparseVector>> ScaledSparseVector<B> {

    pub fn new(backing: B, scale: f64) -> SpaceResult<ScaledSparseVector<B>> {
        check_scale(scale)?;
        Ok(Self { backing, scale })
    }

    pub fn backing(&self) -> &SparseVector {
        self.backing.borrow()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn into_backing(self) -> B {
        self.backing
    }

}

impl<B: Borrow<SparseVector>> Vector for ScaledSparseVector<B> {

    fn len(&self) -> usize {
        self.backing().len()
    }

    fn get(&self, index: usize) -> f64 {
        self.backing().get(index) * self.scale
    }

    fn non_zero_indices(&self) -> Vec<usize> {
        self.backing().non_zero_indices()
    }

    fn magnitude(&self) -> f64 {
        self.backing().magnitude() * self.scale.abs()
    }
}

impl<B: BorrowMut<SparseVector>> VectorMut for ScaledSparseVector<B> {

    fn set(&mut self, index: usize, value: f64) {
        let backing: &mut SparseVector = self.backing.borrow_mut();
        backing.set(index, value / self.scale);
    }

    fn add(&mut self, index: usize, delta: f64) -> f64 {
        let backing: &mut SparseVector = self.backing.borrow_mut();
        backing.add(index, delta / self.scale) * self.scale
    }
}
