use anchor_lang::prelude::*;
use anchor_lang::solana_program::{instruction::AccountMeta, sysvar};
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::constants::REIT_ID_HASH_LEN;
use crate::pda::{associated_token_address, InvestorAddresses, ReitAddresses};

/// Move `amount` currency minor units from the investor's ATA into escrow and
/// open a Pending investment at the current counter index
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InvestArgs {
    pub amount: u64,
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
}

impl Discriminator for InvestArgs {
    const DISCRIMINATOR: &'static [u8] = &[13, 245, 180, 103, 254, 182, 121, 4];
}

impl InstructionData for InvestArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvestAccounts {
    pub investor_signer: Pubkey,
    pub investor: Pubkey,
    pub fundraiser: Pubkey,
    /// Counter PDA, created by the program on first investment
    pub investor_fundraiser: Pubkey,
    pub investment: Pubkey,
    pub usdc_mint: Pubkey,
    pub investor_usdc_ata: Pubkey,
    pub escrow_vault: Pubkey,
}

impl InvestAccounts {
    /// `counter` is the index the new investment will be created at
    pub fn new(
        reit: &ReitAddresses,
        investor: &InvestorAddresses,
        usdc_mint: Pubkey,
        counter: u64,
    ) -> Self {
        Self {
            investor_signer: investor.wallet,
            investor: investor.investor,
            fundraiser: reit.fundraiser,
            investor_fundraiser: investor.investor_fundraiser,
            investment: investor.investment(&reit.fundraiser, counter),
            usdc_mint,
            investor_usdc_ata: associated_token_address(&investor.wallet, &usdc_mint),
            escrow_vault: reit.escrow_vault,
        }
    }
}

impl ToAccountMetas for InvestAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.investor_signer, true),
            writable(self.investor, false),
            writable(self.fundraiser, false),
            writable(self.investor_fundraiser, false),
            writable(self.investment, false),
            readonly(self.usdc_mint),
            writable(self.investor_usdc_ata, false),
            writable(self.escrow_vault, false),
            readonly(anchor_spl::token::ID),
            readonly(anchor_spl::associated_token::ID),
            readonly(anchor_lang::system_program::ID),
            readonly(sysvar::rent::ID),
        ]
    }
}
