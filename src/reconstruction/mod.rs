//! Orchestration of the FDK and variance pipelines.
//!
//! + `fdk`: weighting, ramp filtering and backprojection of projections
//!
//! + `variance`: the same chain, acting on pixel variances with squared
//!   coefficients
//!
//! Both orchestrators borrow the same immutable `Geometry` and own their
//! buffers, so they may run at the same time: see `reconstruct_with_variance`.

pub mod fdk;
pub mod variance;

pub use fdk::FdkReconstruction;
pub use variance::VarianceReconstruction;

/// Progress of a reconstruction run. Transitions are strictly sequential and
/// no state is revisited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    Uninitialized,
    /// Geometry and projections have been checked against each other
    GeometryBound,
    Weighting,
    RampFiltering,
    Backprojecting,
    Complete,
}

/// Reconstruction options recognized by both orchestrators
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReconConfig {
    pub filter: FilterConfig,
    /// Apply Parker weights when the scan does not cover a full circle
    pub short_scan: bool,
}

impl ReconConfig {
    pub fn validate(&self) -> Result<()> { self.filter.validate() }
}

/// Shared flag through which a caller can abort runs in progress. Checked
/// between state transitions only.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }
    pub fn cancel(&self) { self.0.store(true, Ordering::Relaxed) }
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

/// State machine common to both orchestrators
#[derive(Debug)]
pub(crate) struct Progress {
    pipeline: &'static str,
    state: State,
    cancel: Option<CancelToken>,
    entered: Instant,
}

impl Progress {

    pub(crate) fn new(pipeline: &'static str) -> Self {
        Self { pipeline, state: State::Uninitialized, cancel: None, entered: Instant::now() }
    }

    pub(crate) fn state(&self) -> State { self.state }

    pub(crate) fn set_cancel(&mut self, token: CancelToken) { self.cancel = Some(token) }

    /// Check that a run may start and that the geometry describes exactly
    /// the projections supplied.
    pub(crate) fn bind(&mut self, geometry: &Geometry, projections: usize) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(Error::Configuration(format!(
                "{} reconstruction has already been run (state {:?})", self.pipeline, self.state)))
        }
        if geometry.is_empty() {
            return Err(Error::Configuration("geometry contains no projections".into()))
        }
        if geometry.record_count() != projections {
            return Err(Error::Configuration(format!(
                "geometry has {} records but there are {projections} projections",
                geometry.record_count())))
        }
        self.advance(State::GeometryBound)
    }

    pub(crate) fn advance(&mut self, next: State) -> Result<()> {
        if self.cancel.as_ref().map_or(false, CancelToken::is_cancelled) {
            info!(pipeline = self.pipeline, state = ?self.state, "reconstruction cancelled");
            return Err(Error::Cancelled(self.state))
        }
        debug!(pipeline = self.pipeline, from = ?self.state, to = ?next,
               elapsed_ms = self.entered.elapsed().as_millis() as u64, "stage transition");
        self.state = next;
        self.entered = Instant::now();
        Ok(())
    }
}

/// Run the FDK and variance pipelines concurrently on the same geometry.
/// Returns the reconstructed volume and its variance.
pub fn reconstruct_with_variance(
    geometry   : &Geometry,
    grid       : VolumeGrid,
    config     : ReconConfig,
    projections: ProjectionStack,
    variance   : ProjectionStack,
) -> Result<(Volume, Volume)> {
    let mut fdk = FdkReconstruction::new(geometry, grid, config)?;
    let mut var = VarianceReconstruction::new(geometry, grid, config)?;
    let (volume, variance) = rayon::join(
        || fdk.run(projections),
        || var.run(variance),
    );
    Ok((volume?, variance?))
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::Instant;

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    filter::FilterConfig,
    geometry::Geometry,
    grid::VolumeGrid,
    projections::ProjectionStack,
    volume::Volume,
};

#[cfg(test)]
mod tests {
    use super::*;
    use units::{deg, mm};

    fn geometry(n: usize) -> Geometry {
        Geometry::circular(n, deg(0.0), deg(360.0), mm(500.0), mm(1000.0)).unwrap()
    }

    #[test]
    fn states_are_ordered() {
        assert!(State::Uninitialized < State::GeometryBound);
        assert!(State::Backprojecting < State::Complete);
    }

    #[test]
    fn binding_checks_counts() {
        let mut progress = Progress::new("test");
        assert!(matches!(progress.bind(&geometry(3), 4), Err(Error::Configuration(_))));
        assert_eq!(progress.state(), State::Uninitialized);
        assert!(progress.bind(&geometry(3), 3).is_ok());
        assert_eq!(progress.state(), State::GeometryBound);
        // No second run
        assert!(matches!(progress.bind(&geometry(3), 3), Err(Error::Configuration(_))));
    }

    #[test]
    fn empty_geometry_is_a_configuration_error() {
        let mut progress = Progress::new("test");
        assert!(matches!(progress.bind(&Geometry::new(), 0), Err(Error::Configuration(_))));
    }

    #[test]
    fn cancellation_stops_the_next_transition() -> Result<()> {
        let token = CancelToken::new();
        let mut progress = Progress::new("test");
        progress.set_cancel(token.clone());
        progress.bind(&geometry(2), 2)?;
        token.cancel();
        assert!(matches!(progress.advance(State::Weighting), Err(Error::Cancelled(State::GeometryBound))));
        assert_eq!(progress.state(), State::GeometryBound);
        Ok(())
    }
}
