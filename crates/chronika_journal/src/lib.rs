pub mod allocate;
pub mod batch;
pub mod config;
pub mod datastore;
mod db;
pub mod dedup;
pub mod deltas;
pub mod migration;
pub mod normalize;
pub mod plan;
pub mod replay;
pub mod snapshot;
pub mod store;

pub use chronika_core::*;

pub use allocate::{allocate, Interval};
pub use batch::run_batch;
pub use config::{DatabaseConfig, JournalConfig, PoolConfig, ReplayConfig};
pub use datastore::{default_sqlite_path, load_or_init_config, open_store};
pub use normalize::{effective_timestamp, normalize, OrderedEvent};
pub use plan::build_plan;
pub use replay::{replay_entity, ReplayOptions};
pub use store::{BackendCapabilities, JournalStore};
