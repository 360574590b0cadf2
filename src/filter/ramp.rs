//! The ramp filter stage of FDK.
//!
//! Each detector row is zero-padded, transformed, multiplied by the ramp
//! kernel, transformed back and truncated to its original width. Zero padding
//! is the only treatment of truncated projections: nothing is extrapolated
//! beyond the edges of the detector.
//!
//! The kernel works in cycles per sample; the result is divided by the pixel
//! spacing on the virtual detector through the isocentre, so that it
//! approximates the continuous ramp convolution in mm⁻¹.

pub struct RampFilter {
    kernel: RampKernel,
    convolution: RowConvolution,
    width: usize,
    row_scale: Vec<f64>,
}

impl RampFilter {

    /// Build the kernel once for all projections acquired with `geometry` on
    /// a detector laid out as `grid`.
    pub fn new(config: FilterConfig, grid: &DetectorGrid, geometry: &Geometry) -> Result<Self> {
        let kernel = RampKernel::new(config, grid.width())?;
        let convolution = kernel.convolution();
        let row_scale = isocentre_spacing(grid, geometry).into_iter().map(|d| 1.0 / d).collect();
        debug!(window = %config.window, cutoff = config.cutoff, length = kernel.len(), "ramp kernel built");
        Ok(Self { kernel, convolution, width: grid.width(), row_scale })
    }

    pub fn kernel(&self) -> &RampKernel { &self.kernel }
}

impl Stage for RampFilter {
    type Input  = ProjectionStack;
    type Output = ProjectionStack;

    fn compute(&self, mut projections: ProjectionStack) -> Result<ProjectionStack> {
        check_layout(&projections, self.width, self.row_scale.len())?;
        self.convolution.convolve_rows(projections.data_mut(), &self.row_scale);
        Ok(projections)
    }
}

/// Pixel spacing in `u` of each projection, scaled to the isocentre plane
pub(crate) fn isocentre_spacing(grid: &DetectorGrid, geometry: &Geometry) -> Vec<f64> {
    geometry.iter()
        .map(|record| grid.spacing[0] as f64 * record.frame().to_isocentre())
        .collect()
}

/// The stack must match the detector and geometry the filter was built for
pub(crate) fn check_layout(projections: &ProjectionStack, width: usize, count: usize) -> Result<()> {
    if projections.grid.width() != width {
        return Err(Error::Configuration(format!(
            "filter built for {width} detector columns, projections have {}", projections.grid.width())))
    }
    if projections.count() != count {
        return Err(Error::Configuration(format!(
            "filter built for {count} projections, stack has {}", projections.count())))
    }
    Ok(())
}

// ----- Imports ------------------------------------------------------------------------------------------
use tracing::debug;

use crate::{
    error::{Error, Result},
    geometry::Geometry,
    grid::DetectorGrid,
    projections::ProjectionStack,
    stage::Stage,
};
use super::{FilterConfig, RampKernel, RowConvolution};
