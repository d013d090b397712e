pub mod cli;
pub mod config;
mod db;
pub mod descriptor;
pub mod error;
pub mod frame;
pub mod framedb;
mod metrics;
pub mod ranker;
pub mod record;
pub mod sampler;
mod server;
pub mod source;
pub mod store;
pub mod utils;

pub use config::Opts;
pub use descriptor::Descriptor;
pub use error::{Error, Result, StoreError};
pub use frame::RasterFrame;
pub use framedb::{FrameDB, FrameDBBuilder, IngestReport};
pub use record::{FrameRecord, SimilarityResult};
pub use store::{DescriptorStore, MemoryStore, SqliteStore};
