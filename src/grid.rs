//! Sampling grids of the detector and of the reconstructed volume.
//!
//! Both follow the usual medical imaging convention: `origin` is the position
//! of the centre of the first sample, not the corner of the grid.

use crate::error::{Error, Result};
use crate::index::{BoxDim_u, Index1_u, Index3_u, index1_to_3};
use units::todo::Lengthf32;
use units::{Length, mm_};

/// The size and granularity of the volume in which images are reconstructed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeGrid {
    pub n: BoxDim_u,
    pub spacing: [Lengthf32; 3],
    pub origin: [Lengthf32; 3],
}

impl VolumeGrid {

    pub fn new(n: BoxDim_u, spacing: [Length; 3], origin: [Length; 3]) -> Result<Self> {
        let spacing = spacing.map(mm_);
        let origin  = origin .map(mm_);
        if n.iter().any(|&n| n == 0) {
            return Err(Error::InvalidParameter(format!("volume dimensions must be non-zero: {n:?}")));
        }
        if spacing.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(Error::InvalidParameter(format!("voxel spacing must be positive: {spacing:?} mm")));
        }
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(Error::InvalidParameter(format!("volume origin must be finite: {origin:?} mm")));
        }
        Ok(Self { n, spacing, origin })
    }

    /// Grid of `n` voxels of size `spacing`, centred on the isocentre
    pub fn centred(n: BoxDim_u, spacing: [Length; 3]) -> Result<Self> {
        let half_extent = |i: usize| -spacing[i] * (n[i] as f32 - 1.0) / 2.0;
        Self::new(n, spacing, [half_extent(0), half_extent(1), half_extent(2)])
    }

    /// Saturates at `usize::MAX` for grids too large to be addressed
    pub fn voxel_count(&self) -> usize { self.n.iter().fold(1, |acc, &n| acc.saturating_mul(n)) }

    /// Voxels in one `z` slice
    pub fn slice_len(&self) -> usize { self.n[0].saturating_mul(self.n[1]) }

    /// Find centre of voxel with given 3D index, in mm
    pub fn voxel_centre(&self, i: Index3_u) -> [f64; 3] {
        let c = |d: usize| self.origin[d] as f64 + i[d] as f64 * self.spacing[d] as f64;
        [c(0), c(1), c(2)]
    }

    /// Find centre of voxel with given 1D index, in mm
    pub fn voxel_centre1(&self, i: Index1_u) -> [f64; 3] {
        self.voxel_centre(index1_to_3(i, self.n))
    }
}

/// Pixel layout shared by every projection in a stack. `u` is the in-plane
/// (filtered) direction, `v` is parallel to the rotation axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorGrid {
    /// Number of `[columns (u), rows (v)]`
    pub n: [usize; 2],
    pub spacing: [Lengthf32; 2],
    pub origin: [Lengthf32; 2],
}

impl DetectorGrid {

    pub fn new(n: [usize; 2], spacing: [Length; 2], origin: [Length; 2]) -> Result<Self> {
        let spacing = spacing.map(mm_);
        let origin  = origin .map(mm_);
        if n.iter().any(|&n| n == 0) {
            return Err(Error::InvalidParameter(format!("detector dimensions must be non-zero: {n:?}")));
        }
        if spacing.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(Error::InvalidParameter(format!("pixel spacing must be positive: {spacing:?} mm")));
        }
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(Error::InvalidParameter(format!("detector origin must be finite: {origin:?} mm")));
        }
        Ok(Self { n, spacing, origin })
    }

    /// Detector of `n` pixels of size `spacing`, centred on the central ray
    pub fn centred(n: [usize; 2], spacing: [Length; 2]) -> Result<Self> {
        let half_extent = |i: usize| -spacing[i] * (n[i] as f32 - 1.0) / 2.0;
        Self::new(n, spacing, [half_extent(0), half_extent(1)])
    }

    pub fn width (&self) -> usize { self.n[0] }
    pub fn height(&self) -> usize { self.n[1] }
    pub fn pixel_count(&self) -> usize { self.n[0] * self.n[1] }

    /// Detector coordinates (mm) of the centre of pixel `[column, row]`
    pub fn pixel_position(&self, [column, row]: [usize; 2]) -> [f64; 2] {
        [self.origin[0] as f64 + column as f64 * self.spacing[0] as f64,
         self.origin[1] as f64 + row    as f64 * self.spacing[1] as f64]
    }

    /// Fractional `[column, row]` index corresponding to detector coordinates
    #[inline]
    pub fn continuous_index(&self, u: f64, v: f64) -> [f64; 2] {
        [(u - self.origin[0] as f64) / self.spacing[0] as f64,
         (v - self.origin[1] as f64) / self.spacing[1] as f64]
    }
}
