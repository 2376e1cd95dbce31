pub mod connect;
pub mod export;
pub mod fuse;
pub mod import;
pub mod kernel_ext;
pub mod pipeline;
pub mod types;

pub use connect::execute_make_connected;
pub use export::execute_export;
pub use fuse::execute_fuse;
pub use import::execute_import;
pub use kernel_ext::KernelBundle;
pub use pipeline::{run_pipeline, FuseJob, PipelineReport};
pub use types::*;
