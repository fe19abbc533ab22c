use anchor_lang::prelude::*;
use anchor_lang::solana_program::{instruction::AccountMeta, sysvar};
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::constants::{REIT_ID_HASH_LEN, TOKEN_METADATA_PROGRAM_ID};
use crate::pda::{find_metadata_address, ReitAddresses};

/// Rewrite the Metaplex metadata of an existing REIT mint
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpdateReitMintArgs {
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
    pub name: String,
    pub symbol: String,
    pub metadata_uri: String,
}

impl Discriminator for UpdateReitMintArgs {
    const DISCRIMINATOR: &'static [u8] = &[195, 217, 220, 63, 44, 24, 150, 45];
}

impl InstructionData for UpdateReitMintArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateReitMintAccounts {
    pub admin: Pubkey,
    pub fundraiser: Pubkey,
    pub reit_mint: Pubkey,
    pub metadata: Pubkey,
}

impl UpdateReitMintAccounts {
    pub fn new(reit: &ReitAddresses, admin: Pubkey, reit_mint: Pubkey) -> Self {
        Self {
            admin,
            fundraiser: reit.fundraiser,
            reit_mint,
            metadata: find_metadata_address(&reit_mint).0,
        }
    }
}

impl ToAccountMetas for UpdateReitMintAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.admin, true),
            readonly(self.fundraiser),
            readonly(self.reit_mint),
            readonly(anchor_lang::system_program::ID),
            readonly(sysvar::instructions::ID),
            writable(self.metadata, false),
            readonly(TOKEN_METADATA_PROGRAM_ID),
        ]
    }
}
