//! Configuration file parser for FDK reconstruction

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {

    #[serde(default)]
    pub filter: Filter,

    pub geometry: Circular,

    pub detector: Detector,

    pub volume: Volume,

    /// Maximum number of worker threads; all available cores if absent
    #[serde(default)]
    pub threads: Option<usize>,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    /// One of `RamLak`, `Hann`, `Hamming`, `Cosine`
    #[serde(default = "default_window")]
    pub window: String,

    /// Fraction of Nyquist
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,

    #[serde(default)]
    pub short_scan: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self { window: default_window(), cutoff: default_cutoff(), short_scan: false }
    }
}

/// Equally spaced projections on a circular trajectory
#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Circular {
    pub projections: usize,

    #[serde(default = "zero_angle")]
    #[serde(deserialize_with = "deserialize_angle")]
    pub first: Angle,

    #[serde(default = "full_circle")]
    #[serde(deserialize_with = "deserialize_angle")]
    pub arc: Angle,

    #[serde(deserialize_with = "deserialize_uom")]
    pub sid: Length,

    #[serde(deserialize_with = "deserialize_uom")]
    pub sdd: Length,

    /// Detector offset `(u, v)`
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_2d_opt")]
    pub offset: Option<(Length, Length)>,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Detector {
    /// `(columns, rows)`
    pub pixels: (usize, usize),

    #[serde(deserialize_with = "deserialize_uom_2d")]
    pub spacing: (Length, Length),

    /// Centre of the first pixel. The detector is centred on the central ray
    /// if absent.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_2d_opt")]
    pub origin: Option<(Length, Length)>,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Volume {
    pub voxels: (usize, usize, usize),

    #[serde(deserialize_with = "deserialize_uom_3d")]
    pub spacing: (Length, Length, Length),

    /// Centre of the first voxel. The volume is centred on the isocentre if
    /// absent.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_opt")]
    pub origin: Option<(Length, Length, Length)>,
}

impl Filter {
    pub fn recon_config(&self) -> Result<ReconConfig> {
        let filter = FilterConfig::new(self.window.parse::<Window>()?, self.cutoff)?;
        Ok(ReconConfig { filter, short_scan: self.short_scan })
    }
}

impl Circular {
    pub fn geometry(&self) -> Result<Geometry> {
        if self.projections == 0 {
            return Err(Error::Configuration("geometry must contain at least one projection".into()))
        }
        let (offset_u, offset_v) = self.offset.unwrap_or((mm(0.0), mm(0.0)));
        let step = self.arc / self.projections as f32;
        let mut geometry = Geometry::new();
        for i in 0..self.projections {
            geometry.add_projection(self.first + step * i as f32, self.sid, self.sdd, offset_u, offset_v)?;
        }
        Ok(geometry)
    }
}

impl Detector {
    pub fn grid(&self) -> Result<DetectorGrid> {
        let n = [self.pixels.0, self.pixels.1];
        let spacing = [self.spacing.0, self.spacing.1];
        match self.origin {
            Some((u, v)) => DetectorGrid::new(n, spacing, [u, v]),
            None         => DetectorGrid::centred(n, spacing),
        }
    }
}

impl Volume {
    pub fn grid(&self) -> Result<VolumeGrid> {
        let (nx, ny, nz) = self.voxels;
        let (dx, dy, dz) = self.spacing;
        match self.origin {
            Some((x, y, z)) => VolumeGrid::new([nx, ny, nz], [dx, dy, dz], [x, y, z]),
            None            => VolumeGrid::centred([nx, ny, nz], [dx, dy, dz]),
        }
    }
}

fn default_window() -> String { Window::RamLak.to_string() }
fn default_cutoff() -> f64 { 1.0 }
fn zero_angle() -> Angle { deg(0.0) }
fn full_circle() -> Angle { TWOPI }

pub fn read_config_file(path: &Path) -> Result<Config> {
    let config = fs::read_to_string(path)?;
    Ok(toml::from_str(&config)?)
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::{fs, path::Path};

use serde::Deserialize;

use units::{Angle, Length, TWOPI, deg, mm};

use crate::{
    error::{Error, Result},
    filter::{FilterConfig, Window},
    geometry::Geometry,
    grid::{DetectorGrid, VolumeGrid},
    reconstruction::ReconConfig,
};
use super::{deserialize_angle, deserialize_uom, deserialize_uom_2d, deserialize_uom_2d_opt,
            deserialize_uom_3d, deserialize_uom_3d_opt};
