//! Off-chain aggregator contract.
//!
//! The on-chain half encodes requests into the `AggregationRequested` event
//! and verifies fulfillments. The off-chain half (`sum_satellites`,
//! `execute`, `respond`, `classify_submission_error`) is what the executors
//! run; it never goes through the transport, only direct chain reads.
//!
//! Request layout, one 32-byte big-endian word per field:
//!
//! ```text
//! logic_hash | library_hash | kind | request_id | attempt | registry_version
//! | kind params... | satellite_count | (chain_selector | pool_address)*
//! ```

use anchor_lang::prelude::*;
use thiserror::Error;

use crate::codec::{push_bytes32, push_u64, WordReader, WORD_LEN};
use crate::errors::PoolError;
use crate::state::{
    AggregationTicket, Ledger, LiquiditySnapshot, PinnedLogic, Registry, SatelliteEntry,
};

const KIND_TOTAL_BALANCE: u64 = 1;
const KIND_WITHDRAWABLE_AMOUNT: u64 = 2;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Sum of every registered satellite's accounted value.
    TotalBalance,
    /// Asset amount owed for the escrowed shares of a withdrawal request.
    WithdrawableAmountForRequest {
        request_id: [u8; 32],
        share_amount: u64,
    },
}

impl RequestKind {
    fn discriminant(&self) -> u64 {
        match self {
            Self::TotalBalance => KIND_TOTAL_BALANCE,
            Self::WithdrawableAmountForRequest { .. } => KIND_WITHDRAWABLE_AMOUNT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregationRequest {
    /// Correlation token: the deposit or withdrawal request id.
    pub request_id: [u8; 32],
    pub attempt: u32,
    pub registry_version: u64,
    pub kind: RequestKind,
}

impl AggregationRequest {
    pub fn for_ticket(request_id: [u8; 32], ticket: &AggregationTicket, kind: RequestKind) -> Self {
        Self {
            request_id,
            attempt: ticket.attempt,
            registry_version: ticket.registry_version,
            kind,
        }
    }
}

pub fn encode_request<'a>(
    request: &AggregationRequest,
    pinned: &PinnedLogic,
    satellites: impl Iterator<Item = &'a SatelliteEntry>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(WORD_LEN * 12);
    push_bytes32(&mut out, &pinned.logic_hash);
    push_bytes32(&mut out, &pinned.library_hash);
    push_u64(&mut out, request.kind.discriminant());
    push_bytes32(&mut out, &request.request_id);
    push_u64(&mut out, request.attempt as u64);
    push_u64(&mut out, request.registry_version);

    if let RequestKind::WithdrawableAmountForRequest {
        request_id,
        share_amount,
    } = &request.kind
    {
        push_bytes32(&mut out, request_id);
        push_u64(&mut out, *share_amount);
    }

    let satellites: Vec<&SatelliteEntry> = satellites.collect();
    push_u64(&mut out, satellites.len() as u64);
    for satellite in satellites {
        push_u64(&mut out, satellite.chain_selector);
        push_bytes32(&mut out, &satellite.pool_address);
    }
    out
}

/// Response as delivered by the oracle: a result word and an error channel.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregatorResponse {
    pub result: Vec<u8>,
    pub error: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregationOutcome {
    Value(u64),
    /// Error channel was set. Transient: the request stays where it is.
    Failed(Vec<u8>),
}

impl AggregatorResponse {
    pub fn success(value: u64) -> Self {
        let mut result = Vec::with_capacity(WORD_LEN);
        push_u64(&mut result, value);
        Self {
            result,
            error: Vec::new(),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            result: Vec::new(),
            error: message.as_bytes().to_vec(),
        }
    }

    pub fn outcome(&self) -> Result<AggregationOutcome> {
        if !self.error.is_empty() {
            return Ok(AggregationOutcome::Failed(self.error.clone()));
        }
        require!(
            self.result.len() == WORD_LEN,
            PoolError::InvalidAggregatorResponse
        );
        let value = WordReader::new(&self.result)
            .read_u64()
            .ok_or(error!(PoolError::InvalidAggregatorResponse))?;
        Ok(AggregationOutcome::Value(value))
    }
}

/// Fulfillment argument of the oracle callbacks.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Fulfillment {
    /// Attempt number copied from the request event.
    pub attempt: u32,
    /// Content hash of the logic that produced the result.
    pub logic_hash: [u8; 32],
    pub response: AggregatorResponse,
}

/// Checks a fulfillment against the request's outstanding ticket. Any error
/// here leaves the request pending; only the returned outcome may be applied.
pub fn verify_fulfillment(
    ticket: &AggregationTicket,
    registry: &Registry,
    pinned: &PinnedLogic,
    fulfillment: &Fulfillment,
) -> Result<AggregationOutcome> {
    ticket.check_attempt(fulfillment.attempt)?;
    pinned.verify(&fulfillment.logic_hash)?;
    registry.check_version(ticket)?;
    fulfillment.response.outcome()
}

// ---------------------------------------------------------------------------
// Off-chain execution
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationFailure {
    #[error("chain {chain_selector} could not be read: {reason}")]
    PartialFailure { chain_selector: u64, reason: String },

    #[error("no satellite chain could be read")]
    TotalFailure,

    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),

    #[error("pricing failed: {0}")]
    Pricing(String),

    #[error("transfer submission failed: {0}")]
    Submission(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedRequest {
    pub logic_hash: [u8; 32],
    pub library_hash: [u8; 32],
    pub request: AggregationRequest,
    /// `(chain_selector, pool_address)` of every satellite to read.
    pub satellites: Vec<(u64, [u8; 32])>,
}

pub fn decode_request(bytes: &[u8]) -> std::result::Result<DecodedRequest, AggregationFailure> {
    let short = AggregationFailure::MalformedRequest("truncated request");
    let mut reader = WordReader::new(bytes);

    let logic_hash = reader.read_bytes32().ok_or(short.clone())?;
    let library_hash = reader.read_bytes32().ok_or(short.clone())?;
    let discriminant = reader.read_u64().ok_or(short.clone())?;
    let request_id = reader.read_bytes32().ok_or(short.clone())?;
    let attempt = reader
        .read_u64()
        .and_then(|a| u32::try_from(a).ok())
        .ok_or(short.clone())?;
    let registry_version = reader.read_u64().ok_or(short.clone())?;

    let kind = match discriminant {
        KIND_TOTAL_BALANCE => RequestKind::TotalBalance,
        KIND_WITHDRAWABLE_AMOUNT => RequestKind::WithdrawableAmountForRequest {
            request_id: reader.read_bytes32().ok_or(short.clone())?,
            share_amount: reader.read_u64().ok_or(short.clone())?,
        },
        _ => return Err(AggregationFailure::MalformedRequest("unknown request kind")),
    };

    let count = reader.read_u64().ok_or(short.clone())?;
    let mut satellites = Vec::new();
    for _ in 0..count {
        let chain_selector = reader.read_u64().ok_or(short.clone())?;
        let pool_address = reader.read_bytes32().ok_or(short.clone())?;
        satellites.push((chain_selector, pool_address));
    }
    if !reader.is_exhausted() {
        return Err(AggregationFailure::MalformedRequest("trailing bytes"));
    }

    Ok(DecodedRequest {
        logic_hash,
        library_hash,
        request: AggregationRequest {
            request_id,
            attempt,
            registry_version,
            kind,
        },
        satellites,
    })
}

/// Result of reading one satellite chain directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainRead {
    Settled {
        chain_selector: u64,
        snapshot: LiquiditySnapshot,
    },
    /// Every RPC endpoint for the chain failed.
    Unreachable { chain_selector: u64, reason: String },
}

impl ChainRead {
    fn chain_selector(&self) -> u64 {
        match self {
            Self::Settled { chain_selector, .. } | Self::Unreachable { chain_selector, .. } => {
                *chain_selector
            }
        }
    }
}

/// Sums accounted value over the expected satellites. A chain that could not
/// be read fails the whole sum; it is never counted as zero.
pub fn sum_satellites(
    expected: &[u64],
    reads: &[ChainRead],
) -> std::result::Result<u64, AggregationFailure> {
    if !expected.is_empty()
        && expected.iter().all(|selector| {
            !reads.iter().any(|read| {
                matches!(read, ChainRead::Settled { chain_selector, .. } if chain_selector == selector)
            })
        })
    {
        return Err(AggregationFailure::TotalFailure);
    }

    let mut total: u64 = 0;
    for selector in expected {
        let read = reads
            .iter()
            .find(|read| read.chain_selector() == *selector)
            .ok_or_else(|| AggregationFailure::PartialFailure {
                chain_selector: *selector,
                reason: "no read performed".to_string(),
            })?;
        match read {
            ChainRead::Settled { snapshot, .. } => {
                let value = snapshot.accounted_value().ok_or_else(|| {
                    AggregationFailure::Pricing(format!(
                        "inconsistent counters on chain {selector}"
                    ))
                })?;
                total = total
                    .checked_add(value)
                    .ok_or_else(|| AggregationFailure::Pricing("satellite sum overflow".into()))?;
            }
            ChainRead::Unreachable {
                chain_selector,
                reason,
            } => {
                return Err(AggregationFailure::PartialFailure {
                    chain_selector: *chain_selector,
                    reason: reason.clone(),
                })
            }
        }
    }
    Ok(total)
}

/// Runs a decoded request against the primary ledger snapshot and the
/// satellite reads.
pub fn execute(
    request: &DecodedRequest,
    ledger: &Ledger,
    reads: &[ChainRead],
) -> std::result::Result<u64, AggregationFailure> {
    let expected: Vec<u64> = request.satellites.iter().map(|(s, _)| *s).collect();
    let satellite_value = sum_satellites(&expected, reads)?;
    match request.request.kind {
        RequestKind::TotalBalance => Ok(satellite_value),
        RequestKind::WithdrawableAmountForRequest { share_amount, .. } => ledger
            .redeemable_assets(share_amount, satellite_value)
            .map_err(|e| AggregationFailure::Pricing(e.to_string())),
    }
}

pub fn respond(result: std::result::Result<u64, AggregationFailure>) -> AggregatorResponse {
    match result {
        Ok(value) => AggregatorResponse::success(value),
        Err(failure) => AggregatorResponse::failure(&failure.to_string()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionErrorClass {
    /// The target chain already has this transfer (nonce collision, already
    /// known, replacement). A prior attempt is presumed to have landed.
    DuplicateSubmission,
    Failure,
}

const DUPLICATE_SUBMISSION_MARKERS: &[&str] = &[
    "nonce too low",
    "nonce has already been used",
    "already known",
    "known transaction",
    "replacement transaction underpriced",
    "transaction already imported",
    "already been processed",
];

pub fn classify_submission_error(message: &str) -> SubmissionErrorClass {
    let message = message.to_ascii_lowercase();
    if DUPLICATE_SUBMISSION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
    {
        SubmissionErrorClass::DuplicateSubmission
    } else {
        SubmissionErrorClass::Failure
    }
}

/// Maps the outcome of submitting an asset move to what the executor reports:
/// duplicates count as success and are not retried.
pub fn settle_submission(
    result: std::result::Result<(), String>,
) -> std::result::Result<(), AggregationFailure> {
    match result {
        Ok(()) => Ok(()),
        Err(message) => match classify_submission_error(&message) {
            SubmissionErrorClass::DuplicateSubmission => Ok(()),
            SubmissionErrorClass::Failure => Err(AggregationFailure::Submission(message)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned() -> PinnedLogic {
        PinnedLogic {
            logic_hash: [0x11; 32],
            library_hash: [0x22; 32],
        }
    }

    fn registry_with(satellites: &[(u64, u8)]) -> Registry {
        let mut registry = Registry {
            pool: Pubkey::new_unique(),
            version: 0,
            pending_aggregations: 0,
            satellites: Vec::new(),
            bump: 255,
        };
        for (selector, byte) in satellites {
            registry.add_satellite(*selector, [*byte; 32], true).unwrap();
        }
        registry
    }

    fn settled(chain_selector: u64, local_balance: u64, loans_in_use: u64) -> ChainRead {
        ChainRead::Settled {
            chain_selector,
            snapshot: LiquiditySnapshot {
                local_balance,
                loans_in_use,
                ..LiquiditySnapshot::default()
            },
        }
    }

    #[test]
    fn test_withdrawal_request_decodes_with_satellites() {
        let mut registry = registry_with(&[(10, 1), (20, 2), (30, 3)]);
        registry.remove_satellite(20).unwrap();

        let request = AggregationRequest {
            request_id: [7u8; 32],
            attempt: 3,
            registry_version: registry.version,
            kind: RequestKind::WithdrawableAmountForRequest {
                request_id: [7u8; 32],
                share_amount: 100,
            },
        };
        let bytes = encode_request(&request, &pinned(), registry.valuation_set());
        let decoded = decode_request(&bytes).unwrap();

        assert_eq!(decoded.request, request);
        assert_eq!(decoded.logic_hash, [0x11; 32]);
        // Removed satellites stay in the sum.
        assert_eq!(
            decoded.satellites,
            vec![(10, [1u8; 32]), (20, [2u8; 32]), (30, [3u8; 32])]
        );
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let request = AggregationRequest {
            request_id: [1u8; 32],
            attempt: 1,
            registry_version: 0,
            kind: RequestKind::TotalBalance,
        };
        let mut bytes = encode_request(&request, &pinned(), std::iter::empty());
        bytes.push(0);
        assert!(matches!(
            decode_request(&bytes),
            Err(AggregationFailure::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_partial_failure_fails_whole_sum() {
        let reads = vec![
            settled(1, 500, 100),
            ChainRead::Unreachable {
                chain_selector: 2,
                reason: "all endpoints timed out".into(),
            },
        ];
        assert_eq!(
            sum_satellites(&[1, 2], &reads),
            Err(AggregationFailure::PartialFailure {
                chain_selector: 2,
                reason: "all endpoints timed out".into(),
            })
        );
    }

    #[test]
    fn test_missing_read_is_not_zero() {
        let reads = vec![settled(1, 500, 100)];
        assert!(matches!(
            sum_satellites(&[1, 2], &reads),
            Err(AggregationFailure::PartialFailure { chain_selector: 2, .. })
        ));
    }

    #[test]
    fn test_total_failure() {
        let reads = vec![ChainRead::Unreachable {
            chain_selector: 1,
            reason: "down".into(),
        }];
        assert_eq!(sum_satellites(&[1], &reads), Err(AggregationFailure::TotalFailure));
    }

    #[test]
    fn test_sum_includes_loans_in_use() {
        let reads = vec![settled(1, 500, 100), settled(2, 0, 400)];
        assert_eq!(sum_satellites(&[1, 2], &reads), Ok(1_000));
        assert_eq!(sum_satellites(&[], &[]), Ok(0));
    }

    #[test]
    fn test_sum_counts_transfer_in_transit_once() {
        // 300 left chain 1 for chain 2 and has not been credited yet.
        let sent = ChainRead::Settled {
            chain_selector: 1,
            snapshot: LiquiditySnapshot {
                local_balance: 700,
                sent_to_satellites: 300,
                ..LiquiditySnapshot::default()
            },
        };
        assert_eq!(sum_satellites(&[1, 2], &[sent.clone(), settled(2, 500, 0)]), Ok(1_500));

        let credited = ChainRead::Settled {
            chain_selector: 2,
            snapshot: LiquiditySnapshot {
                local_balance: 800,
                received_from_satellites: 300,
                ..LiquiditySnapshot::default()
            },
        };
        assert_eq!(sum_satellites(&[1, 2], &[sent, credited]), Ok(1_500));

        let inconsistent = ChainRead::Settled {
            chain_selector: 3,
            snapshot: LiquiditySnapshot {
                received_from_satellites: 1,
                ..LiquiditySnapshot::default()
            },
        };
        assert!(matches!(
            sum_satellites(&[3], &[inconsistent]),
            Err(AggregationFailure::Pricing(_))
        ));
    }

    #[test]
    fn test_failure_travels_through_error_channel() {
        let response = respond(Err(AggregationFailure::TotalFailure));
        assert!(response.result.is_empty());
        assert!(matches!(response.outcome().unwrap(), AggregationOutcome::Failed(_)));

        let response = respond(Ok(2_000));
        assert_eq!(response.outcome().unwrap(), AggregationOutcome::Value(2_000));
    }

    #[test]
    fn test_empty_result_without_error_is_malformed() {
        let response = AggregatorResponse::default();
        assert_eq!(
            response.outcome().unwrap_err(),
            error!(PoolError::InvalidAggregatorResponse)
        );
    }

    #[test]
    fn test_verification_order() {
        let mut registry = registry_with(&[(1, 1)]);
        let mut ticket = AggregationTicket::default();
        registry.begin_aggregation(&mut ticket, 0).unwrap();

        let good = Fulfillment {
            attempt: 1,
            logic_hash: [0x11; 32],
            response: AggregatorResponse::success(5),
        };
        assert_eq!(
            verify_fulfillment(&ticket, &registry, &pinned(), &good).unwrap(),
            AggregationOutcome::Value(5)
        );

        let tampered = Fulfillment {
            logic_hash: [0x99; 32],
            ..good.clone()
        };
        assert_eq!(
            verify_fulfillment(&ticket, &registry, &pinned(), &tampered).unwrap_err(),
            error!(PoolError::LogicHashMismatch)
        );

        let stale = Fulfillment {
            attempt: 0,
            ..good.clone()
        };
        assert_eq!(
            verify_fulfillment(&ticket, &registry, &pinned(), &stale).unwrap_err(),
            error!(PoolError::StaleAggregatorResponse)
        );

        registry.add_satellite(2, [2u8; 32], true).unwrap();
        assert_eq!(
            verify_fulfillment(&ticket, &registry, &pinned(), &good).unwrap_err(),
            error!(PoolError::RegistryVersionMismatch)
        );
    }

    #[test]
    fn test_duplicate_submission_is_success() {
        assert_eq!(
            classify_submission_error("Nonce too low: next nonce 12, tx nonce 11"),
            SubmissionErrorClass::DuplicateSubmission
        );
        assert_eq!(
            classify_submission_error("replacement transaction underpriced"),
            SubmissionErrorClass::DuplicateSubmission
        );
        assert_eq!(
            classify_submission_error("insufficient funds for gas"),
            SubmissionErrorClass::Failure
        );

        assert_eq!(settle_submission(Err("already known".into())), Ok(()));
        assert!(matches!(
            settle_submission(Err("execution reverted".into())),
            Err(AggregationFailure::Submission(_))
        ));
    }

    #[test]
    fn test_execute_prices_withdrawal_from_ledger() {
        let ledger = Ledger::with_balances(1_000, 1_000);

        let request = DecodedRequest {
            logic_hash: [0x11; 32],
            library_hash: [0x22; 32],
            request: AggregationRequest {
                request_id: [1u8; 32],
                attempt: 1,
                registry_version: 0,
                kind: RequestKind::WithdrawableAmountForRequest {
                    request_id: [1u8; 32],
                    share_amount: 100,
                },
            },
            satellites: vec![(5, [5u8; 32])],
        };
        // 1_000 local + 1_000 on the satellite backing 1_000 shares.
        let reads = vec![settled(5, 600, 400)];
        assert_eq!(execute(&request, &ledger, &reads), Ok(200));
    }
}
