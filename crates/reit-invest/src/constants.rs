// Constants shared with the on-chain fundraising program

use anchor_lang::prelude::*;
use std::time::Duration;

/// Seed for fundraiser PDA
pub const FUNDRAISER_SEED: &[u8] = b"fundraiser";

/// Seed for the fundraiser's escrow vault PDA
pub const ESCROW_VAULT_SEED: &[u8] = b"escrow_vault";

/// Seed for investor profile PDA
pub const INVESTOR_SEED: &[u8] = b"investor";

/// Seed for the per-(investor, fundraiser) counter PDA
pub const INVESTOR_FUNDRAISER_SEED: &[u8] = b"investor_fundraiser";

/// Seed for investment PDA
pub const INVESTMENT_SEED: &[u8] = b"investment";

/// Seed used by the Metaplex token metadata program
pub const METADATA_SEED: &[u8] = b"metadata";

/// Metaplex Token Metadata program
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Default currency mint on devnet. Localnet mints are created per deployment.
pub const DEVNET_USDC_MINT: Pubkey = pubkey!("4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU");

/// Decimals of the accepted currency mint
pub const USDC_DECIMALS: u32 = 6;

/// 10^USDC_DECIMALS
pub const USDC_MINOR_PER_UNIT: u64 = 1_000_000;

/// REIT share tokens are whole units
pub const REIT_MINT_DECIMALS: u8 = 0;

/// Max addresses per getMultipleAccounts call
pub const ACCOUNT_FETCH_CHUNK_SIZE: usize = 100;

/// Signature status poll interval
pub const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Signature status polls before the outcome is declared unknown
pub const CONFIRMATION_MAX_ATTEMPTS: u32 = 30;

/// Listing views are considered fresh for this long
pub const VIEW_STALE_AFTER: Duration = Duration::from_secs(10);

/// Background refresh period of listing views
pub const VIEW_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Byte length of the REIT id seed (raw UUID bytes)
pub const REIT_ID_HASH_LEN: usize = 16;

/// Max Metaplex name length
pub const MAX_MINT_NAME_LEN: usize = 32;

/// Max Metaplex symbol length
pub const MAX_MINT_SYMBOL_LEN: usize = 10;
