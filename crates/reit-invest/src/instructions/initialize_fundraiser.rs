use anchor_lang::prelude::*;
use anchor_lang::solana_program::{instruction::AccountMeta, sysvar};
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::constants::REIT_ID_HASH_LEN;
use crate::pda::ReitAddresses;

/// Create the fundraiser PDA and its escrow vault for a REIT
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InitializeFundraiserArgs {
    /// Canonical REIT id, stored as-is by the program
    pub reit_id: String,
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
}

impl Discriminator for InitializeFundraiserArgs {
    const DISCRIMINATOR: &'static [u8] = &[10, 33, 110, 191, 226, 23, 151, 31];
}

impl InstructionData for InitializeFundraiserArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitializeFundraiserAccounts {
    pub fundraiser: Pubkey,
    /// Admin, pays for both accounts
    pub admin: Pubkey,
    pub escrow_vault: Pubkey,
    pub usdc_mint: Pubkey,
}

impl InitializeFundraiserAccounts {
    pub fn new(addresses: &ReitAddresses, admin: Pubkey, usdc_mint: Pubkey) -> Self {
        Self {
            fundraiser: addresses.fundraiser,
            admin,
            escrow_vault: addresses.escrow_vault,
            usdc_mint,
        }
    }
}

impl ToAccountMetas for InitializeFundraiserAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.fundraiser, false),
            writable(self.admin, true),
            writable(self.escrow_vault, false),
            readonly(self.usdc_mint),
            readonly(anchor_spl::token::ID),
            readonly(anchor_lang::system_program::ID),
            readonly(sysvar::rent::ID),
        ]
    }
}
