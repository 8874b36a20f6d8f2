//! Admin-gated instructions.

pub mod cancel_withdrawal;
pub mod migrate_satellite_liquidity;
pub mod pool_settings;
pub mod protocol_settings;
pub mod registry;
pub mod reset_retry_budget;

pub use cancel_withdrawal::*;
pub use migrate_satellite_liquidity::*;
pub use pool_settings::*;
pub use protocol_settings::*;
pub use registry::*;
pub use reset_retry_budget::*;
