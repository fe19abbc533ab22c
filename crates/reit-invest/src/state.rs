use anchor_lang::prelude::*;

/// Fundraiser for a single REIT capital raise
///
/// Seeds: [b"fundraiser", reit_id_hash]
/// - `reit_mint` stays `Pubkey::default()` until the REIT mint is created
/// - totals are in currency minor units
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Fundraiser {
    /// Admin authority allowed to release, wire, refund and issue
    pub admin: Pubkey,              // 32 bytes

    /// Accepted currency mint
    pub usdc_mint: Pubkey,          // 32 bytes

    /// REIT share token mint
    pub reit_mint: Pubkey,          // 32 bytes

    /// Escrow token account holding invested currency until release
    pub escrow_vault: Pubkey,       // 32 bytes

    pub total_raised: u64,          // 8 bytes

    pub released_amount: u64,       // 8 bytes

    pub bump: u8,                   // 1 byte

    /// ISO currency code, e.g. b"CAD"
    pub reit_accepted_currency: [u8; 3],
}

/// Investor profile, one per wallet
///
/// Seeds: [b"investor", investor_pubkey]
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Investor {
    pub investor_pubkey: Pubkey,
    pub investment_counter: u64,
    pub bump: u8,
}

/// Counter scoping investment indices to one (investor, fundraiser) pair
///
/// Seeds: [b"investor_fundraiser", investor_pubkey, fundraiser]
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct InvestorFundraiser {
    pub investor: Pubkey,
    pub fundraiser: Pubkey,
    /// Index the next investment will be created at
    pub investment_counter: u64,
    pub bump: u8,
}

/// A single contribution of one investor to one fundraiser
///
/// Seeds: [b"investment", investor_pubkey, fundraiser, investment_counter.to_le_bytes()]
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct Investment {
    pub investor: Pubkey,
    pub fundraiser: Pubkey,
    pub usdc_amount: u64,
    pub reit_amount: u32,
    pub status: InvestmentStatus,
    pub bump: u8,
}

/// Investment lifecycle, stored on-chain as a one-byte Borsh enum.
///
/// Pending -> Released -> Wired -> ShareIssued, with Refunded reachable from
/// Released. Variant order is the on-chain encoding and must not change.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvestmentStatus {
    Pending,
    Released,
    Refunded,
    Wired,
    ShareIssued,
    ShareSold,
}

impl InvestmentStatus {
    pub const ALL: [InvestmentStatus; 6] = [
        InvestmentStatus::Pending,
        InvestmentStatus::Released,
        InvestmentStatus::Refunded,
        InvestmentStatus::Wired,
        InvestmentStatus::ShareIssued,
        InvestmentStatus::ShareSold,
    ];

    /// Refunded money is no longer part of the raise
    pub fn counts_toward_raise(&self) -> bool {
        !matches!(self, InvestmentStatus::Refunded)
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvestmentStatus::Pending => "Pending",
            InvestmentStatus::Released => "Released",
            InvestmentStatus::Refunded => "Refunded",
            InvestmentStatus::Wired => "Wired",
            InvestmentStatus::ShareIssued => "Share Issued",
            InvestmentStatus::ShareSold => "Share Sold",
        }
    }
}

impl Fundraiser {
    pub fn has_reit_mint(&self) -> bool {
        self.reit_mint != Pubkey::default()
    }

    pub fn accepted_currency(&self) -> String {
        String::from_utf8_lossy(&self.reit_accepted_currency).into_owned()
    }

    /// Currency raised but not yet released to the admin
    pub fn held_in_escrow(&self) -> u64 {
        self.total_raised.saturating_sub(self.released_amount)
    }
}
