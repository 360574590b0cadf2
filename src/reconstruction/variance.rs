//! Analytic variance of an FDK reconstruction.
//!
//! Every stage of FDK is linear, so independent pixel noise propagates through
//! it with squared coefficients. Feeding the per-pixel variance of the
//! projections (equal to their mean signal for shot noise) through the
//! squared pipeline gives the variance of each reconstructed voxel, aligned
//! voxel for voxel with the FDK volume.

pub struct VarianceReconstruction<'g> {
    geometry: &'g Geometry,
    grid: VolumeGrid,
    config: ReconConfig,
    progress: Progress,
}

impl<'g> VarianceReconstruction<'g> {

    pub fn new(geometry: &'g Geometry, grid: VolumeGrid, config: ReconConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { geometry, grid, config, progress: Progress::new("variance") })
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.progress.set_cancel(token);
        self
    }

    pub fn state(&self) -> State { self.progress.state() }

    /// Variance volume of the FDK reconstruction of projections whose pixels
    /// have independent noise with the given variances.
    pub fn run(&mut self, variance: ProjectionStack) -> Result<Volume> {
        let (geometry, config) = (self.geometry, self.config);
        self.progress.bind(geometry, variance.count())?;
        let detector = variance.grid;
        info!(projections = variance.count(), detector = ?detector.n, volume = ?self.grid.n, "variance reconstruction");

        self.progress.advance(State::Weighting)?;
        let weighted = ConeBeamWeighting::new(&detector, geometry, config.short_scan)
            .for_variance()
            .compute(variance)?;

        self.progress.advance(State::RampFiltering)?;
        let ramp = RampKernel::new(config.filter, detector.width())?;
        let filtered = VarianceRampFilter::new(&ramp, &detector, geometry)?.compute(weighted)?;

        self.progress.advance(State::Backprojecting)?;
        let volume = VarianceBackprojector::new(self.grid, geometry).compute(filtered)?;

        self.progress.advance(State::Complete)?;
        Ok(volume)
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use tracing::info;

use crate::{
    backprojector::VarianceBackprojector,
    error::Result,
    filter::{RampKernel, VarianceRampFilter},
    geometry::Geometry,
    grid::VolumeGrid,
    projections::ProjectionStack,
    stage::Stage,
    volume::Volume,
    weighting::ConeBeamWeighting,
};
use super::{CancelToken, Progress, ReconConfig, State};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::grid::DetectorGrid;
    use float_eq::assert_float_eq;
    use units::{deg, mm};

    fn setup() -> Result<(Geometry, DetectorGrid, VolumeGrid)> {
        let geometry = Geometry::circular(10, deg(0.0), deg(360.0), mm(500.0), mm(1000.0))?;
        let detector = DetectorGrid::centred([24, 3], [mm(1.0), mm(1.0)])?;
        let volume = VolumeGrid::centred([6, 1, 6], [mm(1.0); 3])?;
        Ok((geometry, detector, volume))
    }

    #[test]
    fn zero_variance_gives_zero_volume() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let mut variance = VarianceReconstruction::new(&geometry, grid, ReconConfig::default())?;
        let volume = variance.run(ProjectionStack::zeros(detector, 10)?)?;
        assert_eq!(variance.state(), State::Complete);
        assert!(volume.data.iter().all(|&x| x == 0.0));
        Ok(())
    }

    #[test]
    fn variance_is_positive() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let mut variance = VarianceReconstruction::new(&geometry, grid, ReconConfig::default())?;
        let volume = variance.run(ProjectionStack::from_fn(detector, 10, |_, _| 100.0))?;
        assert!(volume.data.iter().all(|&x| x > 0.0), "{:?}", volume.data);
        Ok(())
    }

    #[test]
    fn variance_scales_with_pixel_variance() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let input = ProjectionStack::from_fn(detector, 10, |p, [c, r]| 50.0 + (p + 3 * c + r) as f32);
        let once   = VarianceReconstruction::new(&geometry, grid, ReconConfig::default())?.run(input.clone())?;
        let scaled = VarianceReconstruction::new(&geometry, grid, ReconConfig::default())?.run(input.map(|x| 7.0 * x))?;
        for (a, b) in once.data.iter().zip(&scaled.data) {
            assert_float_eq!(7.0 * a, *b, rmax <= 1e-4);
        }
        Ok(())
    }

    #[test]
    fn count_mismatch_fails() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let mut variance = VarianceReconstruction::new(&geometry, grid, ReconConfig::default())?;
        assert!(matches!(variance.run(ProjectionStack::zeros(detector, 9)?), Err(Error::Configuration(_))));
        assert_eq!(variance.state(), State::Uninitialized);
        Ok(())
    }
}
