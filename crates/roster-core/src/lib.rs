pub mod columns;
pub mod config;
pub mod error;
pub mod export;
pub mod identity;
pub mod import;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod row;
pub mod status;

pub use error::EtlError;
pub use pipeline::PooledRun;
