
pub use crate::error::{Error, Result};
pub use crate::filter::{FilterConfig, Window};
pub use crate::geometry::{Geometry, GeometryRecord};
pub use crate::grid::{DetectorGrid, VolumeGrid};
pub use crate::index::{BoxDim_u, Index1_u, Index3_u};
pub use crate::projections::ProjectionStack;
pub use crate::reconstruction::{
    CancelToken, FdkReconstruction, ReconConfig, State, VarianceReconstruction, reconstruct_with_variance,
};
pub use crate::stage::Stage;
pub use crate::volume::Volume;
