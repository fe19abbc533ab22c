use anchor_lang::prelude::Pubkey;
use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::state::InvestmentStatus;

/// Error codes for user-supplied currency amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is not a decimal number: {0}")]
    NotANumber(String),

    #[error("Amount must not be negative")]
    Negative,

    #[error("Amount must be greater than zero")]
    Zero,

    #[error("Amount has {scale} fractional digits - at most {max} are supported")]
    TooPrecise { scale: u32, max: u32 },

    #[error("Amount exceeds the representable range")]
    Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReitIdError {
    #[error("REIT id is not a UUID: {0}")]
    Malformed(String),
}

/// Transport and decoding failures at the RPC boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("RPC returned {got} accounts for {requested} addresses")]
    BatchLength { requested: usize, got: usize },

    #[error("Account {address} could not be decoded as {kind}: {reason}")]
    Decode {
        address: Pubkey,
        kind: &'static str,
        reason: String,
    },

    #[error("Wallet rejected or failed to send the transaction: {0}")]
    Send(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger row not found: {0}")]
    NotFound(String),

    #[error("Ledger rejected the write: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Metadata upload failed: {0}")]
    Upload(String),

    #[error("Metadata could not be encoded: {0}")]
    Encode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("{name} is not a valid public key: {value}")]
    InvalidPubkey { name: &'static str, value: String },
}

/// Which kind of on-chain account a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Fundraiser,
    Investor,
    InvestorFundraiser,
    Investment,
    ReitMint,
    Metadata,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AccountKind::Fundraiser => "Fundraiser",
            AccountKind::Investor => "Investor",
            AccountKind::InvestorFundraiser => "InvestorFundraiser",
            AccountKind::Investment => "Investment",
            AccountKind::ReitMint => "REIT mint",
            AccountKind::Metadata => "Metadata",
        };
        f.write_str(name)
    }
}

/// Error taxonomy of a user action. Each variant is scoped to the single
/// action that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any I/O
    Precondition,
    /// Signer mismatch, rejected before the transaction is built
    Authorization,
    /// Dependent account absent or in the wrong status
    AccountState,
    /// Chain reported the transaction failed
    ChainSubmission,
    /// No terminal status within the poll budget; funds may or may not have moved
    UnknownOutcome,
    /// Chain effect is final but the ledger write failed
    Reconciliation,
    /// RPC, ledger or storage could not be reached before submission
    Infrastructure,
}

/// Error returned by every orchestrator recipe
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error(transparent)]
    InvalidReitId(#[from] ReitIdError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Admin wallet is not configured - admin actions are disabled")]
    AdminWalletNotConfigured,

    #[error("Only the authorized admin wallet can {action}")]
    NotConfiguredAdmin { action: &'static str },

    #[error("Signer {signer} is not the fundraiser admin {authority}")]
    NotFundraiserAdmin { signer: Pubkey, authority: Pubkey },

    #[error("No currency mint configured for this cluster")]
    CurrencyMintNotConfigured,

    #[error("{kind} not found at {address}")]
    AccountNotFound { kind: AccountKind, address: Pubkey },

    #[error("{kind} already exists at {address}")]
    AccountAlreadyExists { kind: AccountKind, address: Pubkey },

    #[error("Investment {address} is {actual:?}, expected {expected:?}")]
    InvalidStatus {
        address: Pubkey,
        expected: InvestmentStatus,
        actual: InvestmentStatus,
    },

    #[error("Investment {investment} belongs to fundraiser {actual}, not {expected}")]
    FundraiserMismatch {
        investment: Pubkey,
        expected: Pubkey,
        actual: Pubkey,
    },

    #[error("REIT mint not created yet")]
    ReitMintMissing,

    #[error("REIT mint already exists: {0} - use update instead")]
    MintAlreadyExists(Pubkey),

    #[error("REIT {0} is not in the ledger")]
    UnknownReit(String),

    #[error("Transaction {signature} failed: {reason}")]
    TransactionFailed { signature: Signature, reason: String },

    /// Refused before a signature existed: wallet decline or preflight
    /// simulation error. Nothing reached the chain.
    #[error("Transaction rejected before submission: {reason}")]
    TransactionRejected { reason: String },

    #[error("Transaction {signature} was not confirmed in time - outcome unknown, do not assume it failed")]
    UnknownOutcome { signature: Signature },

    #[error("Transaction {signature} is final but the ledger write failed: {source} - manual follow-up required")]
    Reconciliation {
        signature: Signature,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ActionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ActionError::WalletNotConnected
            | ActionError::MissingField(_)
            | ActionError::InvalidAmount(_)
            | ActionError::InvalidReitId(_)
            | ActionError::InvalidInput(_) => ErrorCategory::Precondition,
            ActionError::AdminWalletNotConfigured
            | ActionError::NotConfiguredAdmin { .. }
            | ActionError::NotFundraiserAdmin { .. } => ErrorCategory::Authorization,
            ActionError::AccountNotFound { .. }
            | ActionError::AccountAlreadyExists { .. }
            | ActionError::InvalidStatus { .. }
            | ActionError::FundraiserMismatch { .. }
            | ActionError::ReitMintMissing
            | ActionError::MintAlreadyExists(_)
            | ActionError::UnknownReit(_) => ErrorCategory::AccountState,
            ActionError::TransactionFailed { .. } | ActionError::TransactionRejected { .. } => {
                ErrorCategory::ChainSubmission
            }
            ActionError::UnknownOutcome { .. } => ErrorCategory::UnknownOutcome,
            ActionError::Reconciliation { .. } => ErrorCategory::Reconciliation,
            ActionError::CurrencyMintNotConfigured | ActionError::Config(_) => {
                ErrorCategory::Precondition
            }
            ActionError::Chain(_) | ActionError::Ledger(_) | ActionError::Metadata(_) => {
                ErrorCategory::Infrastructure
            }
        }
    }
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;
