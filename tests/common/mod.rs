//! Analytic projections of phantoms made of uniform balls.

#![allow(dead_code)]

use conebeam::{DetectorGrid, Geometry, ProjectionStack};

/// Uniformly attenuating ball, in mm and mm⁻¹
#[derive(Clone, Copy, Debug)]
pub struct Ball {
    pub centre: [f64; 3],
    pub radius: f64,
    pub mu: f64,
}

impl Ball {
    pub fn new(centre: [f64; 3], radius: f64, mu: f64) -> Self { Self { centre, radius, mu } }

    /// Line integral of attenuation along the line through `source` with unit
    /// direction `direction`
    pub fn line_integral(&self, source: [f64; 3], direction: [f64; 3]) -> f64 {
        let to_centre = sub(self.centre, source);
        let along = dot(to_centre, direction);
        let d2 = dot(to_centre, to_centre) - along * along;
        let r2 = self.radius * self.radius;
        if d2 >= r2 { 0.0 } else { 2.0 * (r2 - d2).sqrt() * self.mu }
    }
}

/// Exact cone-beam projections of the `balls`
pub fn project(balls: &[Ball], geometry: &Geometry, detector: DetectorGrid) -> ProjectionStack {
    let frames = geometry.frames();
    ProjectionStack::from_fn(detector, geometry.record_count(), |p, pixel| {
        let f = frames[p];
        let source = [f.sid * f.sin, 0.0, f.sid * f.cos];
        let [u, v] = detector.pixel_position(pixel);
        let (u, v) = (u + f.offset_u, v + f.offset_v);
        // Where the central ray meets the detector, and the detector axes
        let (dx, dz) = (source[0] - f.sdd * f.sin, source[2] - f.sdd * f.cos);
        let target = [dx + u * f.cos, v, dz - u * f.sin];
        let direction = normalize(sub(target, source));
        balls.iter().map(|b| b.line_integral(source, direction)).sum::<f64>() as f32
    })
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] { [a[0] - b[0], a[1] - b[1], a[2] - b[2]] }
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 { a[0] * b[0] + a[1] * b[1] + a[2] * b[2] }
fn normalize(a: [f64; 3]) -> [f64; 3] {
    let n = dot(a, a).sqrt();
    [a[0] / n, a[1] / n, a[2] / n]
}

/// Distance of a voxel centre from the axis of rotation, in the `xz` plane
pub fn radius([x, _, z]: [f64; 3]) -> f64 { (x * x + z * z).sqrt() }
