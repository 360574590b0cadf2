//! Pre-filter weighting of projections.
//!
//! Every pixel is multiplied by the cosine of the angle between its ray and
//! the central ray, `SDD / sqrt(SDD² + u² + v²)`, with `(u, v)` measured from
//! the point where the central ray pierces the detector.
//!
//! Short scans are additionally weighted with Parker's redundancy weights, so
//! that each line integral measured twice contributes once in total. Parker
//! weighting is skipped only for full 360° scans, where redundancy is
//! uniform. A scan longer than 180° plus the fan angle but short of a full
//! circle still measures some rays twice and others once, so it is weighted.
//!
//! In variance mode each weight is squared, as `Var(w·x) = w²·Var(x)`.

pub struct ConeBeamWeighting {
    grid: DetectorGrid,
    projections: Vec<ProjectionWeighting>,
    squared: bool,
}

impl ConeBeamWeighting {

    /// Weighting for projections acquired with `geometry` on `grid`. Parker
    /// weights are applied when `short_scan` is requested and the geometry
    /// does not cover a full circle.
    pub fn new(grid: &DetectorGrid, geometry: &Geometry, short_scan: bool) -> Self {
        let parker = short_scan && !geometry.is_full_scan() && !geometry.is_empty();
        let arc = parker.then(|| geometry.short_scan_arc());
        if let Some((start, span)) = arc {
            let fan = half_fan_angle(grid, geometry);
            if span < PI + 2.0 * fan {
                warn!(span_deg = span.to_degrees(), needed_deg = (PI + 2.0 * fan).to_degrees(),
                      "short scan is shorter than 180° plus the fan angle: some rays are never measured");
            }
            debug!(start_deg = start.to_degrees(), span_deg = span.to_degrees(), "Parker weighting enabled");
        } else if short_scan {
            debug!("Parker weighting skipped: scan covers a full circle");
        }
        let projections = geometry.iter()
            .map(|record| {
                let parker = arc.map(|(start, span)| Parker {
                    beta: (radian_(record.angle) as f64 - start).rem_euclid(TAU),
                    delta: (span - PI) / 2.0,
                });
                ProjectionWeighting { frame: record.frame(), parker }
            })
            .collect();
        Self { grid: *grid, projections, squared: false }
    }

    /// The same weighting, acting on variances
    pub fn for_variance(mut self) -> Self {
        self.squared = true;
        self
    }

    pub fn uses_parker(&self) -> bool { self.projections.iter().any(|p| p.parker.is_some()) }

    /// Weight applied to pixel `[column, row]` of the given projection
    pub fn weight(&self, projection: usize, pixel: [usize; 2]) -> f64 {
        let w = self.projections[projection].weight(&self.grid, pixel);
        if self.squared { w * w } else { w }
    }
}

impl Stage for ConeBeamWeighting {
    type Input  = ProjectionStack;
    type Output = ProjectionStack;

    fn compute(&self, mut projections: ProjectionStack) -> Result<ProjectionStack> {
        if projections.count() != self.projections.len() || projections.grid.n != self.grid.n {
            return Err(Error::Configuration(format!(
                "weighting built for {} projections of {:?} pixels, got {} of {:?}",
                self.projections.len(), self.grid.n, projections.count(), projections.grid.n)))
        }
        let squared = self.squared;
        projections.data_mut()
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(self.projections.par_iter())
            .for_each(|(mut image, weighting)| {
                for ((row, column), x) in image.indexed_iter_mut() {
                    let w = weighting.weight(&self.grid, [column, row]);
                    let w = if squared { w * w } else { w };
                    *x *= w as f32;
                }
            });
        Ok(projections)
    }
}

#[derive(Clone, Copy, Debug)]
struct ProjectionWeighting {
    frame: Frame,
    parker: Option<Parker>,
}

impl ProjectionWeighting {
    #[inline]
    fn weight(&self, grid: &DetectorGrid, pixel: [usize; 2]) -> f64 {
        let f = &self.frame;
        let [u, v] = grid.pixel_position(pixel);
        let (u, v) = (u + f.offset_u, v + f.offset_v);
        let cone = f.sdd / (f.sdd * f.sdd + u * u + v * v).sqrt();
        let redundancy = self.parker.map_or(1.0, |p| p.weight((u / f.sdd).atan()));
        cone * redundancy
    }
}

/// Position of one projection within a short scan
#[derive(Clone, Copy, Debug, PartialEq)]
struct Parker {
    /// Angle swept since the start of the scan
    beta: f64,
    /// Half the overscan beyond 180°
    delta: f64,
}

impl Parker {

    /// Weight of the ray at fan angle `gamma`. The ray conjugate to `(β, γ)` is
    /// `(β + π - 2γ, -γ)`: the weights of both add up to 2.
    fn weight(&self, gamma: f64) -> f64 {
        let Parker { beta, delta } = *self;
        let quarter_sin2 = |x: f64| (FRAC_PI_4 * x).sin().powi(2);
        let w = if beta < 2.0 * (delta + gamma) {
            quarter_sin2(beta / (delta + gamma))
        } else if beta < PI + 2.0 * gamma {
            1.0
        } else if beta < PI + 2.0 * delta {
            quarter_sin2((PI + 2.0 * delta - beta) / (delta - gamma))
        } else {
            0.0
        };
        2.0 * w
    }
}

/// Largest fan angle reached by any pixel of any projection
fn half_fan_angle(grid: &DetectorGrid, geometry: &Geometry) -> f64 {
    let [left, _] = grid.pixel_position([0, 0]);
    let [right, _] = grid.pixel_position([grid.width() - 1, 0]);
    geometry.iter()
        .map(|record| {
            let f = record.frame();
            let reach = (left + f.offset_u).abs().max((right + f.offset_u).abs());
            (reach / f.sdd).atan()
        })
        .fold(0.0, f64::max)
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::f64::consts::{FRAC_PI_4, PI, TAU};

use ndarray::Axis;
use rayon::prelude::*;
use tracing::{debug, warn};

use units::radian_;

use crate::{
    error::{Error, Result},
    geometry::{Frame, Geometry},
    grid::DetectorGrid,
    projections::ProjectionStack,
    stage::Stage,
};

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use float_eq::assert_float_eq;
    use proptest::prelude::*;
    use units::{deg, mm};

    fn detector() -> DetectorGrid { DetectorGrid::centred([65, 33], [mm(2.0), mm(2.0)]).unwrap() }

    fn full_scan() -> Geometry {
        Geometry::circular(90, deg(0.0), deg(360.0), mm(500.0), mm(1000.0)).unwrap()
    }

    #[test]
    fn central_pixel_is_untouched() -> Result<()> {
        let weighting = ConeBeamWeighting::new(&detector(), &full_scan(), false);
        assert_float_eq!(weighting.weight(7, [32, 16]), 1.0, ulps <= 1);
        Ok(())
    }

    #[rstest(/**/ pixel   , u    , v    ,
             case([ 0, 16], -64.0,   0.0),
             case([64,  0],  64.0, -32.0),
             case([40, 20],  16.0,   8.0),
    )]
    fn cone_weight_is_cosine_of_ray_angle(pixel: [usize; 2], u: f64, v: f64) {
        let weighting = ConeBeamWeighting::new(&detector(), &full_scan(), false);
        let expected = 1000.0 / (1000.0_f64.powi(2) + u * u + v * v).sqrt();
        assert_float_eq!(weighting.weight(0, pixel), expected, rmax <= 1e-12);
        assert_float_eq!(weighting.for_variance().weight(0, pixel), expected * expected, rmax <= 1e-12);
    }

    #[test]
    fn detector_offset_moves_the_central_ray() -> Result<()> {
        let mut geometry = Geometry::new();
        // Pixel 40 sits at u = 16 mm, which is where the central ray now lands
        geometry.add_projection(deg(0.0), mm(500.0), mm(1000.0), mm(-16.0), mm(0.0))?;
        let weighting = ConeBeamWeighting::new(&detector(), &geometry, false);
        assert_float_eq!(weighting.weight(0, [40, 16]), 1.0, ulps <= 1);
        Ok(())
    }

    #[test]
    fn full_scan_ignores_short_scan_request() -> Result<()> {
        let weighting = ConeBeamWeighting::new(&detector(), &full_scan(), true);
        assert!(!weighting.uses_parker());
        let plain = ConeBeamWeighting::new(&detector(), &full_scan(), false);
        let stack = ProjectionStack::from_fn(detector(), 90, |p, [c, r]| (p + c + r) as f32);
        assert_eq!(weighting.compute(stack.clone())?, plain.compute(stack)?);
        Ok(())
    }

    #[test]
    fn short_scan_uses_parker() -> Result<()> {
        let geometry = Geometry::circular(220, deg(0.0), deg(220.0), mm(500.0), mm(1000.0))?;
        let weighting = ConeBeamWeighting::new(&detector(), &geometry, true);
        assert!(weighting.uses_parker());
        // First projection: only rays on one side of the fan are kept
        assert_float_eq!(weighting.weight(0, [ 0, 16]), 0.0, abs <= 1e-12);
        // Middle of the scan: redundancy weight 2 (conjugate ray is never measured)
        let middle = weighting.weight(100, [32, 16]);
        assert_float_eq!(middle, 2.0, abs <= 1e-12);
        Ok(())
    }

    #[test]
    fn variance_squares_parker_weights_too() -> Result<()> {
        let geometry = Geometry::circular(220, deg(0.0), deg(220.0), mm(500.0), mm(1000.0))?;
        let weighting = ConeBeamWeighting::new(&detector(), &geometry, true);
        let variance  = ConeBeamWeighting::new(&detector(), &geometry, true).for_variance();
        assert!(variance.uses_parker());
        // Early in the scan, on the rising edge of the Parker weight
        let (p, pixel) = (10, [10, 16]);
        let w = weighting.weight(p, pixel);
        assert!(w > 0.1 && w < 1.9, "{w}");
        assert_float_eq!(variance.weight(p, pixel), w * w, rmax <= 1e-12);
        assert_float_eq!(variance.weight(100, [32, 16]), 4.0, abs <= 1e-12);
        let weighted = variance.compute(ProjectionStack::from_fn(detector(), 220, |_, _| 1.0))?;
        assert_float_eq!(weighted.data()[[p, pixel[1], pixel[0]]] as f64, w * w, rmax <= 1e-6);
        Ok(())
    }

    #[test]
    fn weighting_checks_stack_layout() -> Result<()> {
        let weighting = ConeBeamWeighting::new(&detector(), &full_scan(), false);
        let stack = ProjectionStack::zeros(detector(), 89)?;
        assert!(matches!(weighting.compute(stack), Err(Error::Configuration(_))));
        Ok(())
    }

    proptest! {
        #[test]
        fn conjugate_parker_weights_sum_to_two(
            // Before `π + 2γ`, so that the conjugate comes later in the scan
            beta  in 0.0..2.7_f64,
            gamma in -0.2..0.2_f64,
            delta in  0.21..0.5_f64,
        ) {
            let here      = Parker { beta,                         delta }.weight( gamma);
            let conjugate = Parker { beta: beta + PI - 2.0 * gamma, delta }.weight(-gamma);
            let sum = here + conjugate;
            prop_assert!((sum - 2.0).abs() < 1e-9, "{here} + {conjugate} = {sum}");
        }
    }
}
