//! Circular cone-beam acquisition geometry.
//!
//! The rotation axis is the volume's `y` axis. For gantry angle `θ`:
//!
//! + the source sits at `SID · (sin θ, 0, cos θ)`,
//!
//! + the detector's `u` axis points along `(cos θ, 0, -sin θ)`,
//!
//! + the detector's `v` axis is parallel to `y`,
//!
//! + the detector plane is perpendicular to the central ray, at distance `SDD`
//!   from the source.
//!
//! A point with detector coordinates `(u, v)` lies at `(u + offset_u, v +
//! offset_v)` from the point where the central ray pierces the detector.

/// Acquisition parameters of a single projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryRecord {
    /// Gantry rotation angle
    pub angle: Angle,
    /// Source to isocentre distance
    pub sid: Length,
    /// Source to detector distance
    pub sdd: Length,
    pub offset_u: Length,
    pub offset_v: Length,
}

impl GeometryRecord {

    pub fn new(angle: Angle, sid: Length, sdd: Length, offset_u: Length, offset_v: Length) -> Result<Self> {
        let (s, d) = (mm_(sid), mm_(sdd));
        if !(s.is_finite() && d.is_finite() && s > 0.0) {
            return Err(Error::InvalidGeometry(format!("SID must be positive, got {s} mm")));
        }
        if d <= s {
            return Err(Error::InvalidGeometry(format!("SDD ({d} mm) must exceed SID ({s} mm)")));
        }
        let finite = [radian_(angle), mm_(offset_u), mm_(offset_v)].iter().all(|x| x.is_finite());
        if !finite {
            return Err(Error::InvalidGeometry("angle and detector offsets must be finite".into()));
        }
        Ok(Self { angle, sid, sdd, offset_u, offset_v })
    }

    /// Raw-float view of this record, for use in the inner loops
    pub fn frame(&self) -> Frame {
        let theta = radian_(self.angle) as f64;
        Frame {
            sin: theta.sin(),
            cos: theta.cos(),
            sid: mm_(self.sid) as f64,
            sdd: mm_(self.sdd) as f64,
            offset_u: mm_(self.offset_u) as f64,
            offset_v: mm_(self.offset_v) as f64,
        }
    }
}

/// Precomputed trigonometry and distances (mm) of one `GeometryRecord`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub sin: f64,
    pub cos: f64,
    pub sid: f64,
    pub sdd: f64,
    pub offset_u: f64,
    pub offset_v: f64,
}

/// Where a point lands on the detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    /// Detector coordinates in mm
    pub u: f64,
    pub v: f64,
    /// `SID / D`, where `D` is the point's distance from the source along the
    /// central ray
    pub inverse_magnification: f64,
}

impl Frame {

    /// Perspective projection of `[x, y, z]` (mm) through the source onto the
    /// detector. `None` if the point is not in front of the source.
    #[inline]
    pub fn project(&self, [x, y, z]: [f64; 3]) -> Option<Projected> {
        let along_u =  x * self.cos - z * self.sin;
        let towards_source = x * self.sin + z * self.cos;
        let distance = self.sid - towards_source;
        if distance <= 0.0 { return None }
        let magnification = self.sdd / distance;
        Some(Projected {
            u: along_u * magnification - self.offset_u,
            v: y       * magnification - self.offset_v,
            inverse_magnification: self.sid / distance,
        })
    }

    /// Scale factor from the physical detector to the virtual detector through
    /// the isocentre.
    #[inline]
    pub fn to_isocentre(&self) -> f64 { self.sid / self.sdd }
}

/// Ordered, append-only sequence of projection geometries. The order defines
/// the correspondence with the projections in a `ProjectionStack`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    records: Vec<GeometryRecord>,
}

impl Geometry {

    pub fn new() -> Self { Self::default() }

    /// Append one projection's parameters. Rejects `SID <= 0` or `SDD <= SID`.
    pub fn add_projection(
        &mut self,
        angle: Angle,
        sid: Length,
        sdd: Length,
        offset_u: Length,
        offset_v: Length,
    ) -> Result<()> {
        self.records.push(GeometryRecord::new(angle, sid, sdd, offset_u, offset_v)?);
        Ok(())
    }

    /// `n` equally spaced projections starting at `first`, spanning `arc`
    /// (exclusive of the end point, so `arc = 360°` gives no duplicate).
    pub fn circular(n: usize, first: Angle, arc: Angle, sid: Length, sdd: Length) -> Result<Self> {
        let mut geometry = Self::new();
        let step = arc / n as f32;
        for i in 0..n {
            geometry.add_projection(first + step * i as f32, sid, sdd, mm(0.0), mm(0.0))?;
        }
        Ok(geometry)
    }

    pub fn record_count(&self) -> usize { self.records.len() }
    pub fn is_empty    (&self) -> bool  { self.records.is_empty() }

    pub fn record(&self, i: usize) -> Option<&GeometryRecord> { self.records.get(i) }
    pub fn records(&self) -> &[GeometryRecord] { &self.records }
    pub fn iter(&self) -> std::slice::Iter<GeometryRecord> { self.records.iter() }

    pub fn frames(&self) -> Vec<Frame> { self.iter().map(GeometryRecord::frame).collect() }

    /// Angular sampling interval attributed to each projection: half the
    /// angular distance between its two neighbours. Gaps much wider than the
    /// typical step (the missing arc of a short scan) are replaced by the
    /// projection's other neighbouring step.
    pub fn angular_gaps(&self) -> Vec<f64> {
        let n = self.records.len();
        if n == 0 { return vec![] }
        if n == 1 { return vec![TAU] }
        let Sorted { order, steps, typical, .. } = self.sorted();
        let is_wide = |step: f64| step > MAX_STEP_RATIO * typical;
        let mut gaps = vec![0.0; n];
        for (position, &index) in order.iter().enumerate() {
            let before = steps[(position + n - 1) % n];
            let after  = steps[position];
            gaps[index] = match (is_wide(before), is_wide(after)) {
                (false, false) => (before + after) / 2.0,
                (true , false) => after,
                (false, true ) => before,
                (true , true ) => typical,
            };
        }
        gaps
    }

    /// Arc covered by the projections, each one credited with one typical
    /// angular step.
    pub fn angular_range(&self) -> f64 {
        match self.records.len() {
            0 => 0.0,
            1 => TAU,
            _ => {
                let Sorted { typical, widest, .. } = self.sorted();
                (TAU - widest + typical).min(TAU)
            },
        }
    }

    /// Whether the projections go all the way round, so that every ray is
    /// measured twice with uniform redundancy.
    pub fn is_full_scan(&self) -> bool {
        match self.records.len() {
            0 => false,
            1 => false,
            _ => {
                let Sorted { typical, widest, .. } = self.sorted();
                widest <= MAX_STEP_RATIO * typical
            },
        }
    }

    /// Angle at which a short scan starts (the projection following the
    /// widest gap) and the angle swept from there to the last projection.
    pub fn short_scan_arc(&self) -> (f64, f64) {
        if self.records.len() < 2 { return (self.start_angle_or_zero(), 0.0) }
        let Sorted { order, angles, steps, widest, .. } = self.sorted();
        let n = order.len();
        let after_widest = steps.iter().position(|&s| s == widest).unwrap_or(n - 1);
        let start = angles[order[(after_widest + 1) % n]];
        (start, TAU - widest)
    }

    fn start_angle_or_zero(&self) -> f64 {
        self.records.first().map_or(0.0, |r| normalize_angle(radian_(r.angle) as f64))
    }

    fn sorted(&self) -> Sorted {
        let angles: Vec<f64> = self.iter().map(|r| normalize_angle(radian_(r.angle) as f64)).collect();
        let order: Vec<usize> = (0..angles.len())
            .sorted_by(|&a, &b| angles[a].total_cmp(&angles[b]))
            .collect();
        let n = order.len();
        let steps: Vec<f64> = order.iter()
            .circular_tuple_windows()
            .enumerate()
            .map(|(i, (&this, &next))| {
                let step = angles[next] - angles[this];
                if i + 1 < n { step } else { step + TAU }
            })
            .collect();
        let sorted_steps: Vec<f64> = steps.iter().copied().sorted_by(f64::total_cmp).collect();
        let typical = sorted_steps[n / 2];
        let widest  = sorted_steps[n - 1];
        Sorted { order, angles, steps, typical, widest }
    }
}

impl std::ops::Index<usize> for Geometry {
    type Output = GeometryRecord;
    fn index(&self, i: usize) -> &Self::Output { &self.records[i] }
}

impl<'a> IntoIterator for &'a Geometry {
    type Item = &'a GeometryRecord;
    type IntoIter = std::slice::Iter<'a, GeometryRecord>;
    fn into_iter(self) -> Self::IntoIter { self.records.iter() }
}

struct Sorted {
    /// Projection indices in order of increasing angle
    order: Vec<usize>,
    /// Angles in [0, 2π), indexed by projection index
    angles: Vec<f64>,
    /// `steps[i]`: angle from `order[i]` to the next projection round the circle
    steps: Vec<f64>,
    /// Median step
    typical: f64,
    widest: f64,
}

/// Steps wider than this multiple of the median step are considered to be
/// missing arc rather than angular sampling.
const MAX_STEP_RATIO: f64 = 3.0;

fn normalize_angle(a: f64) -> f64 { a.rem_euclid(TAU) }

// ----- Imports ------------------------------------------------------------------------------------------
use std::f64::consts::TAU;

use itertools::Itertools;

use units::{Angle, Length, mm, mm_, radian_};

use crate::error::{Error, Result};
