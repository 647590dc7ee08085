//! Infrastructure layer: configuration, broker connections, background workers.

pub mod broker;
pub mod config;
pub mod workers;

pub use broker::{ConnectError, connect};
pub use config::{BrokerKind, ConfigError, StreamConfig};
pub use workers::{FunctionWorker, SupplierWorker, WorkerError, WorkerHandle};
