use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::AccountMeta;
use anchor_lang::InstructionData;

use super::writable;
use crate::pda::find_investor_address;

/// Close the investor profile PDA, returning rent to the signer
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CloseInvestorArgs;

impl Discriminator for CloseInvestorArgs {
    const DISCRIMINATOR: &'static [u8] = &[243, 111, 117, 71, 42, 130, 10, 195];
}

impl InstructionData for CloseInvestorArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloseInvestorAccounts {
    pub signer: Pubkey,
    pub investor: Pubkey,
}

impl CloseInvestorAccounts {
    pub fn new(wallet: Pubkey) -> Self {
        Self {
            signer: wallet,
            investor: find_investor_address(&wallet).0,
        }
    }
}

impl ToAccountMetas for CloseInvestorAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![writable(self.signer, true), writable(self.investor, false)]
    }
}
