//! Stack of 2-D projections sharing a single detector layout.

use ndarray::{Array3, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::grid::DetectorGrid;
use crate::utils::{element_count, try_zeros};
use units::todo::Intensityf32;

/// Pixel values indexed `[projection, row (v), column (u)]`, so that each
/// detector row is contiguous in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionStack {
    pub grid: DetectorGrid,
    data: Array3<Intensityf32>,
}

impl ProjectionStack {

    pub fn new(grid: DetectorGrid, data: Array3<Intensityf32>) -> Result<Self> {
        let (_, rows, columns) = data.dim();
        if [columns, rows] != grid.n {
            return Err(Error::Configuration(format!(
                "projections are {columns}x{rows} pixels, detector is {}x{}",
                grid.n[0], grid.n[1])))
        }
        Ok(Self { grid, data })
    }

    /// Stack of `count` all-zero projections
    pub fn zeros(grid: DetectorGrid, count: usize) -> Result<Self> {
        let shape = (count, grid.n[1], grid.n[0]);
        let elements = element_count(&[count, grid.n[1], grid.n[0]], "projection stack")?;
        let buffer = try_zeros(elements, "projection stack")?;
        let data = Array3::from_shape_vec(shape, buffer)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        Ok(Self { grid, data })
    }

    /// Build a stack from raw data in `[projection, row, column]` order
    pub fn from_vec(grid: DetectorGrid, count: usize, data: Vec<Intensityf32>) -> Result<Self> {
        let shape = (count, grid.n[1], grid.n[0]);
        let data = Array3::from_shape_vec(shape, data)
            .map_err(|e| Error::Configuration(format!("projection data does not match {shape:?}: {e}")))?;
        Ok(Self { grid, data })
    }

    /// Stack whose pixel values are given by `f(projection, [column, row])`
    pub fn from_fn(grid: DetectorGrid, count: usize, f: impl Fn(usize, [usize; 2]) -> Intensityf32) -> Self {
        let data = Array3::from_shape_fn((count, grid.n[1], grid.n[0]), |(p, row, column)| f(p, [column, row]));
        Self { grid, data }
    }

    /// Copy of this stack, reporting allocation failure instead of aborting
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::zeros(self.grid, self.count())?;
        copy.data.assign(&self.data);
        Ok(copy)
    }

    /// A stack with the same layout whose values come from `f(value)`
    pub fn map(&self, f: impl Fn(Intensityf32) -> Intensityf32) -> Self {
        Self { grid: self.grid, data: self.data.mapv(f) }
    }

    pub fn count(&self) -> usize { self.data.len_of(Axis(0)) }

    pub fn projection(&self, i: usize) -> ArrayView2<Intensityf32> { self.data.index_axis(Axis(0), i) }

    pub fn data    (&    self) -> &    Array3<Intensityf32> { &    self.data }
    pub fn data_mut(&mut self) -> &mut Array3<Intensityf32> { &mut self.data }
    pub fn into_data(self) -> Array3<Intensityf32> { self.data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use units::mm;

    fn grid() -> DetectorGrid { DetectorGrid::centred([4, 3], [mm(1.0), mm(1.0)]).unwrap() }

    #[test]
    fn layout_is_projection_row_column() -> Result<()> {
        let stack = ProjectionStack::from_fn(grid(), 2, |p, [c, r]| (100 * p + 10 * r + c) as f32);
        assert_eq!(stack.count(), 2);
        assert_eq!(stack.data()[[1, 2, 3]], 123.0);
        assert_eq!(stack.projection(1)[[0, 3]], 103.0);
        Ok(())
    }

    #[test]
    fn mismatched_shape_is_rejected() {
        let data = Array3::zeros((2, 4, 3)); // rows and columns swapped
        assert!(matches!(ProjectionStack::new(grid(), data), Err(Error::Configuration(_))));
        assert!(ProjectionStack::from_vec(grid(), 2, vec![0.0; 23]).is_err());
    }

    #[test]
    fn zeros_has_requested_shape() -> Result<()> {
        let stack = ProjectionStack::zeros(grid(), 5)?;
        assert_eq!(stack.data().dim(), (5, 3, 4));
        assert!(stack.data().iter().all(|&x| x == 0.0));
        Ok(())
    }

    #[test]
    fn fallible_clone_is_a_copy() -> Result<()> {
        let stack = ProjectionStack::from_fn(grid(), 2, |p, [c, r]| (p + r * c) as f32);
        assert_eq!(stack.try_clone()?, stack);
        Ok(())
    }
}
