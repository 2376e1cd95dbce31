pub mod brep_io;
pub mod connect;
pub mod mock_kernel;
pub mod primitives;
pub mod tessellation;
pub mod traits;
pub mod truck_introspect;
pub mod truck_kernel;
pub mod types;

pub use connect::{connect_shells, CompressedBoundary};
pub use mock_kernel::{MockKernel, MockOperation, MockShape};
pub use traits::*;
pub use truck_introspect::solid_stats;
pub use truck_kernel::TruckKernel;
pub use types::*;
