//! Program Derived Address (PDA) helpers
//!
//! Seeds must match the fundraising program byte for byte: label first, then
//! the variable components in declared order, counters as u64 little-endian.
//! A mismatch never panics here; it yields an address that does not exist and
//! surfaces downstream as a "not found" lookup.

use anchor_lang::prelude::*;
use anchor_spl::associated_token::get_associated_token_address;

use crate::constants::*;
use crate::reit_id::ReitId;

/// Fundraiser PDA for a REIT: [b"fundraiser", reit_id_hash]
pub fn find_fundraiser_address(reit_id_hash: &[u8; REIT_ID_HASH_LEN]) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[FUNDRAISER_SEED, reit_id_hash.as_ref()], &crate::ID)
}

/// Escrow vault PDA: [b"escrow_vault", fundraiser]
pub fn find_escrow_vault_address(fundraiser: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ESCROW_VAULT_SEED, fundraiser.as_ref()], &crate::ID)
}

/// Investor profile PDA: [b"investor", wallet]
pub fn find_investor_address(wallet: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[INVESTOR_SEED, wallet.as_ref()], &crate::ID)
}

/// Per-fundraiser counter PDA: [b"investor_fundraiser", wallet, fundraiser]
pub fn find_investor_fundraiser_address(wallet: &Pubkey, fundraiser: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[INVESTOR_FUNDRAISER_SEED, wallet.as_ref(), fundraiser.as_ref()],
        &crate::ID,
    )
}

/// Investment PDA: [b"investment", wallet, fundraiser, counter as u64 LE]
pub fn find_investment_address(wallet: &Pubkey, fundraiser: &Pubkey, counter: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            INVESTMENT_SEED,
            wallet.as_ref(),
            fundraiser.as_ref(),
            &counter.to_le_bytes(),
        ],
        &crate::ID,
    )
}

/// Metaplex metadata PDA for a mint
pub fn find_metadata_address(mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
}

/// Associated token account of `wallet` for `mint` under the SPL Token program
pub fn associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(wallet, mint)
}

/// Addresses every REIT-scoped recipe starts from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReitAddresses {
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
    pub fundraiser: Pubkey,
    pub fundraiser_bump: u8,
    pub escrow_vault: Pubkey,
}

impl ReitAddresses {
    pub fn derive(reit_id: &ReitId) -> Self {
        let reit_id_hash = reit_id.seed_bytes();
        let (fundraiser, fundraiser_bump) = find_fundraiser_address(&reit_id_hash);
        let (escrow_vault, _) = find_escrow_vault_address(&fundraiser);
        Self {
            reit_id_hash,
            fundraiser,
            fundraiser_bump,
            escrow_vault,
        }
    }
}

/// Addresses scoped to one investor wallet inside one fundraiser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvestorAddresses {
    pub wallet: Pubkey,
    pub investor: Pubkey,
    pub investor_fundraiser: Pubkey,
}

impl InvestorAddresses {
    pub fn derive(wallet: &Pubkey, fundraiser: &Pubkey) -> Self {
        Self {
            wallet: *wallet,
            investor: find_investor_address(wallet).0,
            investor_fundraiser: find_investor_fundraiser_address(wallet, fundraiser).0,
        }
    }

    pub fn investment(&self, fundraiser: &Pubkey, counter: u64) -> Pubkey {
        find_investment_address(&self.wallet, fundraiser, counter).0
    }
}
