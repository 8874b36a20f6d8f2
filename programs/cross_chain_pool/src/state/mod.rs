//! Program state accounts.
//!
//! The primary pool owns the ledger, the registry and the request accounts;
//! satellite deployments only use `SatellitePool` and `ProcessedMessage`.

pub mod config;
pub mod deposit_request;
pub mod ledger;
pub mod primary_pool;
pub mod processed_message;
pub mod registry;
pub mod satellite_pool;
pub mod tickets;
pub mod withdrawal_request;

pub use config::{Config, PinnedLogic};
pub use deposit_request::{DepositQuote, DepositRequest, DepositStatus};
pub use ledger::Ledger;
pub use primary_pool::PrimaryPool;
pub use processed_message::ProcessedMessage;
pub use registry::{Registry, SatelliteEntry};
pub use satellite_pool::{LiquiditySnapshot, SatellitePool};
pub use tickets::{AggregationTicket, RebalanceTicket};
pub use withdrawal_request::{WithdrawalRequest, WithdrawalStatus};
