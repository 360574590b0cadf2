//! Propagation of pixel variances through the ramp filter.
//!
//! Pixel noise is assumed independent. Filtering a row with taps `g` then
//! turns variances `σ²` into `g² * σ²`, and makes neighbouring filtered pixels
//! correlated, with covariance `(g[m]·g[m+1]) * σ²`. Both are computed, as the
//! backprojector's linear interpolation mixes neighbouring pixels.
//!
//! The kernels are derived from the very `RampKernel` used to filter the
//! signal, never rebuilt from the configuration.

/// Variances of the ramp filtered projections, together with the covariance
/// of each pixel with its neighbour in the next column.
#[derive(Clone, Debug, PartialEq)]
pub struct FilteredVariance {
    pub variance: ProjectionStack,
    /// `covariance[[p, r, c]] = Cov(y[p, r, c], y[p, r, c+1])`
    pub covariance: ProjectionStack,
}

impl FilteredVariance {
    pub fn count(&self) -> usize { self.variance.count() }
}

pub struct VarianceRampFilter {
    variance: RowConvolution,
    covariance: RowConvolution,
    width: usize,
    row_scale: Vec<f64>,
}

impl VarianceRampFilter {

    pub fn new(ramp: &RampKernel, grid: &DetectorGrid, geometry: &Geometry) -> Result<Self> {
        if ramp.len() < 2 * grid.width() {
            return Err(Error::Configuration(format!(
                "ramp kernel of length {} cannot filter rows of {} pixels", ramp.len(), grid.width())))
        }
        let variance   =   VarianceKernel::from_ramp(ramp).convolution();
        let covariance = CovarianceKernel::from_ramp(ramp).convolution();
        // The signal is divided by the isocentre spacing, its variance by its square
        let row_scale = isocentre_spacing(grid, geometry).into_iter().map(|d| 1.0 / (d * d)).collect();
        Ok(Self { variance, covariance, width: grid.width(), row_scale })
    }
}

impl Stage for VarianceRampFilter {
    type Input  = ProjectionStack;
    type Output = FilteredVariance;

    fn compute(&self, mut variance: ProjectionStack) -> Result<FilteredVariance> {
        check_layout(&variance, self.width, self.row_scale.len())?;
        let mut covariance = variance.try_clone()?;
        self.covariance.convolve_rows(covariance.data_mut(), &self.row_scale);
        self.variance  .convolve_rows(  variance.data_mut(), &self.row_scale);
        Ok(FilteredVariance { variance, covariance })
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use crate::{
    error::{Error, Result},
    geometry::Geometry,
    grid::DetectorGrid,
    projections::ProjectionStack,
    stage::Stage,
};
use super::{
    RampKernel, VarianceKernel, CovarianceKernel, RowConvolution,
    ramp::{check_layout, isocentre_spacing},
};
