//! Wallet sync pipeline: ingest, derive, reconcile.

pub mod ingest;
pub mod reconcile;
pub mod sync;

pub use ingest::{IngestionError, IngestionResult, Ingestor};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use sync::{SyncError, SyncResult, TradeSyncService};
