//! Projections and volumes on disk.
//!
//! Files hold bare `f32` values: the grids describing them come from the
//! configuration. Projection files are laid out `[projection, row, column]`,
//! volume files `[z, y, x]`, the last index varying fastest.

pub mod raw;

pub fn read_projections(path: &Path, grid: DetectorGrid, count: usize) -> Result<ProjectionStack> {
    let data = raw::read(path)?;
    let expected = element_count(&[count, grid.height(), grid.width()], "projection stack")?;
    if data.len() != expected {
        return Err(Error::Configuration(format!(
            "{} holds {} values: {count} projections of {}x{} pixels need {expected}",
            path.display(), data.len(), grid.width(), grid.height())))
    }
    ProjectionStack::from_vec(grid, count, data)
}

pub fn write_projections(projections: &ProjectionStack, path: &Path) -> Result<()> {
    Ok(raw::write(projections.data().iter().copied(), path)?)
}

pub fn read_volume(path: &Path, grid: VolumeGrid) -> Result<Volume> {
    Volume::new(grid, raw::read(path)?)
}

pub fn write_volume(volume: &Volume, path: &Path) -> Result<()> {
    Ok(raw::write(volume.data.iter().copied(), path)?)
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::path::Path;

use crate::{
    error::{Error, Result},
    grid::{DetectorGrid, VolumeGrid},
    projections::ProjectionStack,
    utils::element_count,
    volume::Volume,
};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use units::mm;

    #[test]
    fn projections_survive_a_trip_to_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("projections.raw");
        let grid = DetectorGrid::centred([5, 2], [mm(1.0), mm(1.0)])?;
        let stack = ProjectionStack::from_fn(grid, 3, |p, [c, r]| (p * 100 + r * 10 + c) as f32);
        write_projections(&stack, &path)?;
        assert_eq!(read_projections(&path, grid, 3)?, stack);
        // Too many values for two projections
        assert!(matches!(read_projections(&path, grid, 2), Err(Error::Configuration(_))));
        Ok(())
    }

    #[test]
    fn volumes_survive_a_trip_to_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("volume.raw");
        let grid = VolumeGrid::centred([2, 3, 4], [mm(1.0); 3])?;
        let volume = Volume::new(grid, (0..24).map(|i| i as f32 / 3.0).collect())?;
        write_volume(&volume, &path)?;
        assert_eq!(read_volume(&path, grid)?, volume);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let grid = VolumeGrid::centred([2, 2, 2], [mm(1.0); 3]).unwrap();
        assert!(matches!(read_volume("/no/such/volume.raw".as_ref(), grid), Err(Error::Io(_))));
    }
}
