use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::AccountMeta;
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::constants::REIT_ID_HASH_LEN;
use crate::pda::{associated_token_address, ReitAddresses};

/// Mint REIT share tokens to the investor for a Wired investment
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct IssueShareArgs {
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
}

impl Discriminator for IssueShareArgs {
    const DISCRIMINATOR: &'static [u8] = &[195, 99, 172, 255, 224, 56, 233, 24];
}

impl InstructionData for IssueShareArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssueShareAccounts {
    pub admin: Pubkey,
    pub fundraiser: Pubkey,
    pub investment: Pubkey,
    pub reit_mint: Pubkey,
    /// Investor's REIT-token ATA
    pub investor_ata: Pubkey,
}

impl IssueShareAccounts {
    pub fn new(
        reit: &ReitAddresses,
        admin: Pubkey,
        investment: Pubkey,
        investor_wallet: Pubkey,
        reit_mint: Pubkey,
    ) -> Self {
        Self {
            admin,
            fundraiser: reit.fundraiser,
            investment,
            reit_mint,
            investor_ata: associated_token_address(&investor_wallet, &reit_mint),
        }
    }
}

impl ToAccountMetas for IssueShareAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.admin, true),
            readonly(self.fundraiser),
            writable(self.investment, false),
            writable(self.reit_mint, false),
            writable(self.investor_ata, false),
            readonly(anchor_spl::token::ID),
        ]
    }
}
