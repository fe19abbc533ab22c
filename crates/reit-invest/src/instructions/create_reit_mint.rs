use anchor_lang::prelude::*;
use anchor_lang::solana_program::{instruction::AccountMeta, sysvar};
use anchor_lang::InstructionData;

use super::{readonly, writable};
use crate::constants::{REIT_ID_HASH_LEN, TOKEN_METADATA_PROGRAM_ID};
use crate::pda::{find_metadata_address, ReitAddresses};

/// Create the REIT share mint with Metaplex metadata. The mint is a fresh
/// keypair that co-signs the transaction.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct CreateReitMintArgs {
    pub reit_id_hash: [u8; REIT_ID_HASH_LEN],
    pub name: String,
    pub symbol: String,
    pub metadata_uri: String,
}

impl Discriminator for CreateReitMintArgs {
    const DISCRIMINATOR: &'static [u8] = &[232, 51, 175, 47, 142, 150, 194, 219];
}

impl InstructionData for CreateReitMintArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateReitMintAccounts {
    pub admin: Pubkey,
    pub fundraiser: Pubkey,
    pub reit_mint: Pubkey,
    pub metadata: Pubkey,
}

impl CreateReitMintAccounts {
    pub fn new(reit: &ReitAddresses, admin: Pubkey, reit_mint: Pubkey) -> Self {
        Self {
            admin,
            fundraiser: reit.fundraiser,
            reit_mint,
            metadata: find_metadata_address(&reit_mint).0,
        }
    }
}

impl ToAccountMetas for CreateReitMintAccounts {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            writable(self.admin, true),
            writable(self.fundraiser, false),
            writable(self.reit_mint, true),
            readonly(anchor_spl::token::ID),
            readonly(anchor_lang::system_program::ID),
            readonly(sysvar::rent::ID),
            readonly(sysvar::instructions::ID),
            writable(self.metadata, false),
            readonly(TOKEN_METADATA_PROGRAM_ID),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::{build_instruction, test_helpers::flags};

    #[test]
    fn test_mint_cosigns_and_metadata_is_derived() {
        let reit = ReitAddresses::derive(&crate::ReitId::from_seed_bytes([1; 16]));
        let mint = Pubkey::new_unique();
        let accounts = CreateReitMintAccounts::new(&reit, Pubkey::new_unique(), mint);
        let args = CreateReitMintArgs {
            reit_id_hash: [1; 16],
            name: "Maple REIT".to_string(),
            symbol: "MPL".to_string(),
            metadata_uri: "https://example.test/m.json".to_string(),
        };
        let ix = build_instruction(&accounts, &args);

        assert_eq!(&ix.data[..8], &[232, 51, 175, 47, 142, 150, 194, 219]);
        assert_eq!(&ix.data[8..24], &[1; 16]);
        assert_eq!(&ix.data[24..28], &10u32.to_le_bytes());
        assert_eq!(ix.accounts[2].pubkey, mint);
        assert_eq!(ix.accounts[7].pubkey, find_metadata_address(&mint).0);
        assert_eq!(
            flags(&ix).iter().filter(|(signer, _)| *signer).count(),
            2,
            "admin and mint both sign"
        );
    }
}
