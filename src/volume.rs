use crate::error::{Error, Result};
use crate::grid::VolumeGrid;
use crate::index::{Index1_u, Index3_u, index3_to_1};
use crate::utils::{element_count, try_zeros};
use units::todo::Intensityf32;

pub type VolumeData = Vec<Intensityf32>;

/// Reconstructed voxel values (attenuation, or variance of attenuation) on a
/// regular grid. `x` varies fastest in `data`.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    pub grid: VolumeGrid,
    pub data: VolumeData,
}

impl Volume {

    pub fn new(grid: VolumeGrid, data: VolumeData) -> Result<Self> {
        if data.len() != grid.voxel_count() {
            return Err(Error::Configuration(format!(
                "volume data has {} voxels, grid {:?} needs {}",
                data.len(), grid.n, grid.voxel_count())))
        }
        Ok(Self { grid, data })
    }

    pub fn zeros(grid: VolumeGrid) -> Result<Self> {
        let elements = element_count(&grid.n, "volume")?;
        Ok(Self { grid, data: try_zeros(elements, "volume")? })
    }

    pub fn len(&self) -> usize { self.data.len() }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Largest absolute voxel value
    pub fn max_abs(&self) -> Intensityf32 {
        self.data.iter().fold(0.0, |m, x| m.max(x.abs()))
    }
}

impl core::ops::IndexMut<Index1_u> for Volume {
    #[inline]
    fn index_mut(&mut self, i: Index1_u) -> &mut Self::Output { &mut self.data[i] }
}

impl core::ops::Index<Index1_u> for Volume {
    type Output = Intensityf32;
    #[inline]
    fn index(&self, i: Index1_u) -> &Self::Output { &self.data[i] }
}

impl core::ops::IndexMut<Index3_u> for Volume {
    fn index_mut(&mut self, i3: Index3_u) -> &mut Self::Output {
        let i1 = index3_to_1(i3, self.grid.n);
        &mut self.data[i1]
    }
}

impl core::ops::Index<Index3_u> for Volume {
    type Output = Intensityf32;
    fn index(&self, i3: Index3_u) -> &Self::Output {
        let i1 = index3_to_1(i3, self.grid.n);
        &self.data[i1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use units::mm;

    #[test]
    fn indexing_agrees_in_1d_and_3d() -> Result<()> {
        let grid = VolumeGrid::centred([3, 2, 4], [mm(1.0); 3])?;
        let mut volume = Volume::zeros(grid)?;
        volume[[2, 1, 3]] = 7.0;
        assert_eq!(volume[2 + 3 * (1 + 2 * 3)], 7.0);
        assert_eq!(volume.max_abs(), 7.0);
        Ok(())
    }

    #[test]
    fn data_must_fill_grid() -> Result<()> {
        let grid = VolumeGrid::centred([3, 2, 4], [mm(1.0); 3])?;
        assert!(matches!(Volume::new(grid, vec![0.0; 23]), Err(Error::Configuration(_))));
        assert!(Volume::new(grid, vec![0.0; 24]).is_ok());
        Ok(())
    }

    #[test]
    fn oversized_volume_is_resource_exhausted() -> Result<()> {
        let grid = VolumeGrid::centred([1 << 32, 1 << 32, 4], [mm(1.0); 3])?;
        assert!(matches!(Volume::zeros(grid), Err(Error::ResourceExhausted { what: "volume", .. })));
        let grid = VolumeGrid::centred([usize::MAX / 8, 2, 2], [mm(1.0); 3])?;
        assert!(matches!(Volume::zeros(grid), Err(Error::ResourceExhausted { what: "volume", .. })));
        Ok(())
    }
}
