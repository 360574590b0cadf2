//! Feldkamp-Davis-Kress reconstruction of circular cone-beam projections.

/// One FDK run: weighting, ramp filtering and backprojection, in that order,
/// each stage consuming the complete output of the previous one.
pub struct FdkReconstruction<'g> {
    geometry: &'g Geometry,
    grid: VolumeGrid,
    config: ReconConfig,
    progress: Progress,
}

impl<'g> FdkReconstruction<'g> {

    /// Fails with `InvalidParameter` on a malformed filter configuration,
    /// before any projection is seen.
    pub fn new(geometry: &'g Geometry, grid: VolumeGrid, config: ReconConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { geometry, grid, config, progress: Progress::new("fdk") })
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.progress.set_cancel(token);
        self
    }

    pub fn state(&self) -> State { self.progress.state() }

    /// Reconstruct `projections`, which must correspond one to one with the
    /// records of the geometry.
    pub fn run(&mut self, projections: ProjectionStack) -> Result<Volume> {
        let (geometry, config) = (self.geometry, self.config);
        self.progress.bind(geometry, projections.count())?;
        let detector = projections.grid;
        info!(projections = projections.count(), detector = ?detector.n, volume = ?self.grid.n, "FDK reconstruction");

        self.progress.advance(State::Weighting)?;
        let weighted = ConeBeamWeighting::new(&detector, geometry, config.short_scan).compute(projections)?;

        self.progress.advance(State::RampFiltering)?;
        let filtered = RampFilter::new(config.filter, &detector, geometry)?.compute(weighted)?;

        self.progress.advance(State::Backprojecting)?;
        let volume = Backprojector::new(self.grid, geometry).compute(filtered)?;

        self.progress.advance(State::Complete)?;
        Ok(volume)
    }
}

// ----- Imports ------------------------------------------------------------------------------------------
use tracing::info;

use crate::{
    backprojector::Backprojector,
    error::Result,
    filter::RampFilter,
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
    use crate::filter::{FilterConfig, Window};
    use crate::grid::DetectorGrid;
    use units::{deg, mm};

    fn setup() -> Result<(Geometry, DetectorGrid, VolumeGrid)> {
        let geometry = Geometry::circular(12, deg(0.0), deg(360.0), mm(500.0), mm(1000.0))?;
        let detector = DetectorGrid::centred([32, 4], [mm(1.0), mm(1.0)])?;
        let volume = VolumeGrid::centred([8, 2, 8], [mm(0.5); 3])?;
        Ok((geometry, detector, volume))
    }

    #[test]
    fn zero_projections_give_zero_volume() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let mut fdk = FdkReconstruction::new(&geometry, grid, ReconConfig::default())?;
        assert_eq!(fdk.state(), State::Uninitialized);
        let volume = fdk.run(ProjectionStack::zeros(detector, 12)?)?;
        assert_eq!(fdk.state(), State::Complete);
        assert_eq!(volume.grid, grid);
        assert!(volume.data.iter().all(|&x| x == 0.0));
        Ok(())
    }

    #[test]
    fn count_mismatch_fails_before_any_stage() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let mut fdk = FdkReconstruction::new(&geometry, grid, ReconConfig::default())?;
        let result = fdk.run(ProjectionStack::zeros(detector, 11)?);
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(fdk.state(), State::Uninitialized);
        Ok(())
    }

    #[test]
    fn bad_cutoff_is_rejected_up_front() -> Result<()> {
        let (geometry, _, grid) = setup()?;
        let config = ReconConfig { filter: FilterConfig { window: Window::Hann, cutoff: 2.0 }, short_scan: false };
        assert!(matches!(FdkReconstruction::new(&geometry, grid, config), Err(Error::InvalidParameter(_))));
        Ok(())
    }

    #[test]
    fn cancelled_run_returns_no_volume() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let token = CancelToken::new();
        token.cancel();
        let mut fdk = FdkReconstruction::new(&geometry, grid, ReconConfig::default())?.with_cancel(token);
        let result = fdk.run(ProjectionStack::zeros(detector, 12)?);
        assert!(matches!(result, Err(Error::Cancelled(State::Uninitialized))));
        Ok(())
    }

    #[test]
    fn a_run_cannot_be_repeated() -> Result<()> {
        let (geometry, detector, grid) = setup()?;
        let mut fdk = FdkReconstruction::new(&geometry, grid, ReconConfig::default())?;
        fdk.run(ProjectionStack::zeros(detector, 12)?)?;
        assert!(matches!(fdk.run(ProjectionStack::zeros(detector, 12)?), Err(Error::Configuration(_))));
        Ok(())
    }
}
