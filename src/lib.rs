//! Analytic cone-beam CT reconstruction.
//!
//! + `reconstruction::FdkReconstruction`: Feldkamp-Davis-Kress filtered
//!   backprojection of circular cone-beam projections
//!
//! + `reconstruction::VarianceReconstruction`: the per-voxel variance of that
//!   reconstruction, propagated analytically from the variance of the
//!   projection pixels

mod exports;
pub use exports::*;

pub mod backprojector;
pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod grid;
pub mod index;
pub mod io;
pub mod projections;
pub mod reconstruction;
pub mod stage;
pub mod utils;
pub mod volume;
pub mod weighting;
