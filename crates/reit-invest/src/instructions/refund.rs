use anchor_lang::prelude::*;
use anchor_lang::InstructionData;

use crate::constants::REIT_ID_HASH_LEN;

/// Mark a Released investment as Refunded. Accounts: [`super::StatusChangeAccounts`]
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RefundArgs {
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
}

impl Discriminator for RefundArgs {
    const DISCRIMINATOR: &'static [u8] = &[2, 96, 183, 251, 63, 208, 46, 46];
}

impl InstructionData for RefundArgs {}
