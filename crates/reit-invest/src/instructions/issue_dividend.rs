use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::AccountMeta;
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::pda::associated_token_address;

/// Pay `amount` currency minor units from the admin to a shareholder
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct IssueDividendArgs {
    pub amount: u64,
}

impl Discriminator for IssueDividendArgs {
    const DISCRIMINATOR: &'static [u8] = &[143, 141, 2, 140, 130, 248, 167, 67];
}

impl InstructionData for IssueDividendArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssueDividendAccounts {
    pub admin: Pubkey,
    pub investment: Pubkey,
    /// Investor wallet recorded on the investment
    pub investor: Pubkey,
    pub fundraiser: Pubkey,
    pub admin_usdc_ata: Pubkey,
    pub investor_usdc_ata: Pubkey,
    pub usdc_mint: Pubkey,
}

impl IssueDividendAccounts {
    pub fn new(
        admin: Pubkey,
        investment: Pubkey,
        investor: Pubkey,
        fundraiser: Pubkey,
        usdc_mint: Pubkey,
    ) -> Self {
        Self {
            admin,
            investment,
            investor,
            fundraiser,
            admin_usdc_ata: associated_token_address(&admin, &usdc_mint),
            investor_usdc_ata: associated_token_address(&investor, &usdc_mint),
            usdc_mint,
        }
    }
}

impl ToAccountMetas for IssueDividendAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.admin, true),
            readonly(self.investment),
            readonly(self.investor),
            readonly(self.fundraiser),
            writable(self.admin_usdc_ata, false),
            writable(self.investor_usdc_ata, false),
            readonly(self.usdc_mint),
            readonly(anchor_spl::token::ID),
        ]
    }
}
