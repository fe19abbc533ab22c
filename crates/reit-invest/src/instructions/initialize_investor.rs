use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::AccountMeta;
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::pda::find_investor_address;

/// Create the investor profile PDA for the signing wallet
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InitializeInvestorArgs;

impl Discriminator for InitializeInvestorArgs {
    const DISCRIMINATOR: &'static [u8] = &[12, 105, 129, 28, 138, 149, 223, 135];
}

impl InstructionData for InitializeInvestorArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitializeInvestorAccounts {
    pub signer: Pubkey,
    pub investor: Pubkey,
}

impl InitializeInvestorAccounts {
    pub fn new(wallet: Pubkey) -> Self {
        Self {
            signer: wallet,
            investor: find_investor_address(&wallet).0,
        }
    }
}

impl ToAccountMetas for InitializeInvestorAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.signer, true),
            writable(self.investor, false),
            readonly(anchor_lang::system_program::ID),
        ]
    }
}
