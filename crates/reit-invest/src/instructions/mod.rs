//! Instruction encoders for the fundraising program
//!
//! Each instruction has an args struct (Anchor discriminator + Borsh args) and
//! an accounts struct whose `ToAccountMetas` order matches the program's
//! account list exactly.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::{InstructionData, ToAccountMetas};

pub mod close_investor;
pub mod create_reit_mint;
pub mod initialize_fundraiser;
pub mod initialize_investor;
pub mod invest;
pub mod issue_dividend;
pub mod issue_share;
pub mod refund;
pub mod release;
pub mod update_reit_mint;
pub mod wire;

pub use close_investor::*;
pub use create_reit_mint::*;
pub use initialize_fundraiser::*;
pub use initialize_investor::*;
pub use invest::*;
pub use issue_dividend::*;
pub use issue_share::*;
pub use refund::*;
pub use release::*;
pub use update_reit_mint::*;
pub use wire::*;

/// Assemble a program instruction from its accounts and args
pub fn build_instruction<A, D>(accounts: &A, args: &D) -> Instruction
where
    A: ToAccountMetas,
    D: InstructionData,
{
    Instruction {
        program_id: crate::ID,
        accounts: accounts.to_account_metas(None),
        data: args.data(),
    }
}

pub(crate) fn writable(pubkey: Pubkey, is_signer: bool) -> AccountMeta {
    AccountMeta::new(pubkey, is_signer)
}

pub(crate) fn readonly(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(pubkey, false)
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use anchor_lang::solana_program::instruction::Instruction;

    /// (is_signer, is_writable) per account, in order
    pub fn flags(ix: &Instruction) -> Vec<(bool, bool)> {
        ix.accounts
            .iter()
            .map(|m| (m.is_signer, m.is_writable))
            .collect()
    }
}
