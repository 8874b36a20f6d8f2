//! Instruction handlers for the cross-chain pool.
//!
//! Primary-chain handlers own the ledger and the request accounts; satellite
//! handlers only touch `SatellitePool`. Both deploy from the same program.

pub mod admin;
pub mod common;
pub mod complete_deposit;
pub mod draw_loan;
pub mod expire_deposit;
pub mod fulfill_deposit_aggregation;
pub mod fulfill_withdrawal_aggregation;
pub mod initialize_config;
pub mod initialize_primary_pool;
pub mod initialize_satellite;
pub mod receive_rebalance_funds;
pub mod receive_transport_message;
pub mod reissue_deposit_aggregation;
pub mod repay_loan;
pub mod report_rebalance_outcome;
pub mod report_satellite_liquidity;
pub mod request_withdrawal;
pub mod retry_withdrawal;
pub mod satellite_loan;
pub mod start_deposit;
pub mod supply_satellite_liquidity;
pub mod views;

pub use admin::*;
pub use complete_deposit::*;
pub use draw_loan::*;
pub use expire_deposit::*;
pub use fulfill_deposit_aggregation::*;
pub use fulfill_withdrawal_aggregation::*;
pub use initialize_config::*;
pub use initialize_primary_pool::*;
pub use initialize_satellite::*;
pub use receive_rebalance_funds::*;
pub use receive_transport_message::*;
pub use reissue_deposit_aggregation::*;
pub use repay_loan::*;
pub use report_rebalance_outcome::*;
pub use report_satellite_liquidity::*;
pub use request_withdrawal::*;
pub use retry_withdrawal::*;
pub use satellite_loan::*;
pub use start_deposit::*;
pub use supply_satellite_liquidity::*;
pub use views::*;
