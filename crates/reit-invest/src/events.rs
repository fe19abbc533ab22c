use anchor_lang::prelude::Pubkey;
use solana_sdk::signature::Signature;

use crate::config::Cluster;
use crate::reit_id::ReitId;
use crate::state::InvestmentStatus;

/// Confirmed transaction plus where to look at it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub signature: Signature,
    pub explorer_url: String,
    pub timestamp: i64,
}

impl TransactionReceipt {
    pub fn new(signature: Signature, cluster: Cluster) -> Self {
        Self {
            signature,
            explorer_url: cluster.explorer_tx_url(&signature),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Emitted when a fundraiser and its escrow vault are created
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundraiserInitialized {
    pub reit_id: ReitId,
    pub fundraiser: Pubkey,
    pub escrow_vault: Pubkey,
    pub usdc_mint: Pubkey,
    pub receipt: TransactionReceipt,
}

/// Emitted when an investor profile is created or closed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvestorProfileChanged {
    pub wallet: Pubkey,
    pub investor: Pubkey,
    pub open: bool,
    pub receipt: TransactionReceipt,
}

/// Emitted when an investment lands in escrow
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invested {
    pub reit_id: ReitId,
    pub investment: Pubkey,
    /// Index of the investment under (wallet, fundraiser)
    pub counter: u64,
    pub usdc_amount: u64,
    pub receipt: TransactionReceipt,
}

/// Emitted by release, wire, refund and issue-share
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvestmentTransitioned {
    pub investment: Pubkey,
    pub from: InvestmentStatus,
    pub to: InvestmentStatus,
    /// Status read back after confirmation; `None` if the re-fetch failed
    pub observed: Option<InvestmentStatus>,
    pub receipt: TransactionReceipt,
}

/// Emitted when a dividend is paid to a shareholder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DividendIssued {
    pub investment: Pubkey,
    pub investor: Pubkey,
    pub usdc_amount: u64,
    pub receipt: TransactionReceipt,
}

/// Emitted when a REIT mint is created or its metadata rewritten
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintPublished {
    pub reit_id: ReitId,
    pub mint: Pubkey,
    pub metadata_uri: String,
    pub created: bool,
    pub receipt: TransactionReceipt,
}
