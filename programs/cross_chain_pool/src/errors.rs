//! Program errors. Codes are stable so relayers, the aggregator executors and
//! the automation service can branch on them.

use anchor_lang::prelude::*;

#[error_code]
pub enum PoolError {
    #[msg("Pool or protocol is paused")]
    PoolPaused,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Deposit would exceed the pool cap")]
    CapExceeded,

    #[msg("Request id does not match the supplied request account")]
    RequestNotFound,

    #[msg("Request already completed")]
    AlreadyCompleted,

    #[msg("No aggregator result recorded for this request")]
    AggregatorResultMissing,

    #[msg("Request is not in a status that allows this transition")]
    InvalidRequestStatus,

    #[msg("Aggregator response does not match the outstanding attempt")]
    StaleAggregatorResponse,

    #[msg("Aggregator logic hash does not match the pinned hash")]
    LogicHashMismatch,

    #[msg("Aggregator response is malformed")]
    InvalidAggregatorResponse,

    #[msg("Satellite registry changed since the aggregation was issued")]
    RegistryVersionMismatch,

    #[msg("Registry removal blocked while aggregations are in flight")]
    RegistryFenced,

    #[msg("Satellite not registered")]
    SatelliteNotFound,

    #[msg("Satellite already registered and active")]
    SatelliteAlreadyRegistered,

    #[msg("Satellite registry is full")]
    RegistryFull,

    #[msg("Migration source and destination must be distinct active satellites")]
    InvalidMigration,

    #[msg("Unauthorized: admin required")]
    UnauthorizedAdmin,

    #[msg("Unauthorized: aggregator oracle required")]
    UnauthorizedOracle,

    #[msg("Unauthorized: transport authority required")]
    UnauthorizedTransport,

    #[msg("Unauthorized: automation or admin required")]
    UnauthorizedAutomation,

    #[msg("Unauthorized: lender required")]
    UnauthorizedLender,

    #[msg("Transport sender is not on the allow-list")]
    UnauthorizedSender,

    #[msg("Transport payload is malformed")]
    InvalidPayload,

    #[msg("Transport instruction kind not accepted by this pool")]
    UnexpectedInstructionKind,

    #[msg("Insufficient local liquidity")]
    InsufficientLiquidity,

    #[msg("Insufficient share balance")]
    InsufficientShares,

    #[msg("Repayment exceeds loans in use")]
    ExceedsOutstandingLoans,

    #[msg("Retry budget exhausted; operator intervention required")]
    RetryBudgetExhausted,

    #[msg("Request is terminal and cannot be retried")]
    NotRetryable,

    #[msg("Timeout has not elapsed")]
    TimeoutNotElapsed,

    #[msg("Rebalance amount does not match the committed payout")]
    RebalanceAmountMismatch,

    #[msg("Deposit too small to mint any shares")]
    ZeroShares,

    #[msg("Pool value is zero while shares are outstanding")]
    PoolValueDepleted,

    #[msg("Retry policy timeouts and budget must be positive")]
    InvalidRetryPolicy,

    #[msg("Arithmetic overflow or underflow")]
    MathOverflow,
}
