use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::AccountMeta;
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::constants::REIT_ID_HASH_LEN;
use crate::pda::ReitAddresses;

/// Mark a Released investment as Wired (funds sent off-chain to the REIT)
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct WireArgs {
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
}

impl Discriminator for WireArgs {
    const DISCRIMINATOR: &'static [u8] = &[133, 22, 177, 204, 246, 158, 29, 40];
}

impl InstructionData for WireArgs {}

/// Account list shared by `wire` and `refund`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChangeAccounts {
    pub admin: Pubkey,
    pub fundraiser: Pubkey,
    pub investment: Pubkey,
}

impl StatusChangeAccounts {
    pub fn new(reit: &ReitAddresses, admin: Pubkey, investment: Pubkey) -> Self {
        Self {
            admin,
            fundraiser: reit.fundraiser,
            investment,
        }
    }
}

impl ToAccountMetas for StatusChangeAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.admin, true),
            readonly(self.fundraiser),
            writable(self.investment, false),
        ]
    }
}
