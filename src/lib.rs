pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod decode;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{DataSource, DataSourceError, MockDataSource, SolanaRpcDataSource};
pub use db::{init_db, Repository};
pub use domain::{
    Address, Decimal, DerivedTrade, Direction, PersistedTrade, RawTransaction, Side, Symbol,
    TimeMs, TradeStatus,
};
pub use engine::{ProgramFilter, TradeDeriver};
pub use error::AppError;
pub use orchestration::{Ingestor, Reconciler, SyncResult, TradeSyncService};
