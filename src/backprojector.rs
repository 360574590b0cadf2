//! Voxel-driven backprojection of filtered projections into a volume.
//!
//! For each voxel and each projection, the voxel centre is projected through
//! the source onto the detector, the filtered projection is sampled there by
//! bilinear interpolation, and the sample is added to the voxel scaled by
//!
//! + `(SID / D)²`, where `D` is the voxel's distance from the source along the
//!   central ray, correcting for the divergence of the beam,
//!
//! + `Δθ / 2`, half the angular interval attributed to the projection, which
//!   is `π / n` for `n` projections equally spaced over a full circle.
//!
//! Samples falling outside the detector, beyond the outer edge of its border
//! pixels, contribute zero. Within the outer half of a border pixel that
//! pixel's value is used as is: there is no wraparound and no extrapolation.
//!
//! The same traversal backprojects variances, through the `Backprojectable`
//! trait: every factor is squared, and the two pixels of a row mixed by the
//! interpolation bring their covariance along.
//!
//! The work is split across `z` slices. Each slice owns its voxels and
//! accumulates all projections into them, in `f64`, before storing the result.

/// Filtered data which can be sampled by the backprojector.
pub trait Backprojectable: Sync {

    fn detector(&self) -> &DetectorGrid;

    fn count(&self) -> usize;

    /// Value of projection `p` at the fractional pixel index `[column, row]`
    fn sample(&self, p: usize, at: [f64; 2]) -> f64;

    /// Factor applied to each sample, given the voxel's inverse magnification
    /// and the projection's angular weight
    fn scale(inverse_magnification: f64, angular_weight: f64) -> f64;
}

pub struct Backprojector {
    grid: VolumeGrid,
    frames: Vec<Frame>,
    angular_weights: Vec<f64>,
}

impl Backprojector {

    pub fn new(grid: VolumeGrid, geometry: &Geometry) -> Self {
        let frames = geometry.frames();
        let angular_weights = geometry.angular_gaps().into_iter().map(|gap| gap / 2.0).collect();
        Self { grid, frames, angular_weights }
    }

    pub fn grid(&self) -> &VolumeGrid { &self.grid }

    pub fn backproject<B: Backprojectable>(&self, input: &B) -> Result<Volume> {
        if input.count() != self.frames.len() {
            return Err(Error::Configuration(format!(
                "backprojector built for {} projections, got {}", self.frames.len(), input.count())))
        }
        let mut volume = Volume::zeros(self.grid)?;
        let [nx, _, _] = self.grid.n;
        let slice_len = self.grid.slice_len();
        let detector = input.detector();

        volume.data
            .par_chunks_mut(slice_len)
            .enumerate()
            .for_each(|(z, slice)| {
                let mut accumulator = vec![0.0_f64; slice_len];
                for (p, (frame, &weight)) in self.frames.iter().zip(&self.angular_weights).enumerate() {
                    for (i, sum) in accumulator.iter_mut().enumerate() {
                        let centre = self.grid.voxel_centre([i % nx, i / nx, z]);
                        let Some(projected) = frame.project(centre) else { continue };
                        let at = detector.continuous_index(projected.u, projected.v);
                        let value = input.sample(p, at);
                        if value != 0.0 {
                            *sum += value * B::scale(projected.inverse_magnification, weight);
                        }
                    }
                }
                for (voxel, sum) in slice.iter_mut().zip(accumulator) {
                    *voxel = sum as f32;
                }
            });
        Ok(volume)
    }
}

impl Stage for Backprojector {
    type Input  = ProjectionStack;
    type Output = Volume;
    fn compute(&self, filtered: ProjectionStack) -> Result<Volume> { self.backproject(&filtered) }
}

/// Backprojects `FilteredVariance` with squared geometric factors
pub struct VarianceBackprojector(pub Backprojector);

impl VarianceBackprojector {
    pub fn new(grid: VolumeGrid, geometry: &Geometry) -> Self { Self(Backprojector::new(grid, geometry)) }
}

impl Stage for VarianceBackprojector {
    type Input  = FilteredVariance;
    type Output = Volume;
    fn compute(&self, filtered: FilteredVariance) -> Result<Volume> { self.0.backproject(&filtered) }
}

impl Backprojectable for ProjectionStack {
    fn detector(&self) -> &DetectorGrid { &self.grid }
    fn count(&self) -> usize { ProjectionStack::count(self) }

    #[inline]
    fn sample(&self, p: usize, at: [f64; 2]) -> f64 {
        let Some(Bilinear { columns, rows }) = Bilinear::at(at, self.grid.n) else { return 0.0 };
        let data = self.data();
        let mut value = 0.0;
        for &(r, a) in rows.iter().flatten() {
            for &(c, b) in columns.iter().flatten() {
                value += a * b * data[[p, r, c]] as f64;
            }
        }
        value
    }

    #[inline]
    fn scale(inverse_magnification: f64, angular_weight: f64) -> f64 {
        inverse_magnification.powi(2) * angular_weight
    }
}

impl Backprojectable for FilteredVariance {
    fn detector(&self) -> &DetectorGrid { &self.variance.grid }
    fn count(&self) -> usize { FilteredVariance::count(self) }

    /// `Var(Σ aᵣbᶜ yᵣᶜ)`. Different rows are uncorrelated, as rows are filtered
    /// independently; neighbouring columns of a row are not.
    #[inline]
    fn sample(&self, p: usize, at: [f64; 2]) -> f64 {
        let Some(Bilinear { columns, rows }) = Bilinear::at(at, self.variance.grid.n) else { return 0.0 };
        let (variance, covariance) = (self.variance.data(), self.covariance.data());
        let mut value = 0.0;
        for &(r, a) in rows.iter().flatten() {
            let mut row = 0.0;
            for &(c, b) in columns.iter().flatten() {
                row += b * b * variance[[p, r, c]] as f64;
            }
            if let [Some((c, b0)), Some((_, b1))] = columns {
                row += 2.0 * b0 * b1 * covariance[[p, r, c]] as f64;
            }
            value += a * a * row;
        }
        value
    }

    #[inline]
    fn scale(inverse_magnification: f64, angular_weight: f64) -> f64 {
        inverse_magnification.powi(4) * angular_weight.powi(2)
    }
}

/// Pixels and weights of a bilinear interpolation. Pixels lying off the
/// detector are `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bilinear {
    columns: [Option<(usize, f64)>; 2],
    rows:    [Option<(usize, f64)>; 2],
}

impl Bilinear {
    #[inline]
    fn at([column, row]: [f64; 2], [width, height]: [usize; 2]) -> Option<Self> {
        Some(Self { columns: linear(column, width)?, rows: linear(row, height)? })
    }
}

/// The two samples bracketing `x` on a line of `n`, with their weights.
/// `None` when `x` lies beyond the outer edge of the first or last sample.
/// Within the outer half of an edge sample, that sample is used alone.
#[inline]
fn linear(x: f64, n: usize) -> Option<[Option<(usize, f64)>; 2]> {
    let last = n as f64 - 1.0;
    if !(x >= -0.5 && x <= last + 0.5) { return None }
    let x = x.clamp(0.0, last);
    let below = x.floor();
    let f = x - below;
    let below = below as usize;
    let above = (below + 1 < n).then_some((below + 1, f));
    Some([Some((below, 1.0 - f)), above])
}

// ----- Imports ------------------------------------------------------------------------------------------
use rayon::prelude::*;

use crate::{
    error::{Error, Result},
    filter::FilteredVariance,
    geometry::{Frame, Geometry},
    grid::{DetectorGrid, VolumeGrid},
    projections::ProjectionStack,
    stage::Stage,
    volume::Volume,
};
