use anchor_lang::prelude::*;
use anchor_lang::solana_program::{instruction::AccountMeta, sysvar};
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::constants::REIT_ID_HASH_LEN;
use crate::pda::{associated_token_address, ReitAddresses};

/// Release one Pending investment's currency from escrow to the admin
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReleaseArgs {
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
}

impl Discriminator for ReleaseArgs {
    const DISCRIMINATOR: &'static [u8] = &[253, 249, 15, 206, 28, 127, 193, 241];
}

impl InstructionData for ReleaseArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseAccounts {
    pub admin: Pubkey,
    pub fundraiser: Pubkey,
    pub investment: Pubkey,
    pub admin_usdc_ata: Pubkey,
    pub usdc_mint: Pubkey,
    pub escrow_vault: Pubkey,
}

impl ReleaseAccounts {
    pub fn new(reit: &ReitAddresses, admin: Pubkey, investment: Pubkey, usdc_mint: Pubkey) -> Self {
        Self {
            admin,
            fundraiser: reit.fundraiser,
            investment,
            admin_usdc_ata: associated_token_address(&admin, &usdc_mint),
            usdc_mint,
            escrow_vault: reit.escrow_vault,
        }
    }
}

impl ToAccountMetas for ReleaseAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.admin, true),
            writable(self.fundraiser, false),
            writable(self.investment, false),
            writable(self.admin_usdc_ata, false),
            readonly(self.usdc_mint),
            writable(self.escrow_vault, false),
            readonly(anchor_spl::token::ID),
            readonly(anchor_spl::associated_token::ID),
            readonly(anchor_lang::system_program::ID),
            readonly(sysvar::rent::ID),
        ]
    }
}
