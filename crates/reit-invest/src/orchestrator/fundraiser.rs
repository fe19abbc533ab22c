use anchor_lang::prelude::Pubkey;
use chrono::Utc;
use solana_sdk::signature::{Keypair, Signer};
use tracing::{debug, info};

use super::Orchestrator;
use crate::chain::{recover_pending, ChainRpc, PendingTransaction, WalletSigner};
use crate::config::ConfigSource;
use crate::errors::{AccountKind, ActionError, ActionResult};
use crate::events::{FundraiserInitialized, MintPublished};
use crate::instructions::*;
use crate::ledger::{Ledger, ReitRecord};
use crate::metadata::{MetadataStore, ReitMetadata};
use crate::notify::Notifier;
use crate::pda::{find_metadata_address, ReitAddresses};
use crate::reit_id::ReitId;
use crate::state::Fundraiser;
use crate::views::ViewKind;

/// Input for opening a fundraiser
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewFundraiser {
    pub reit_id: ReitId,
    pub reit_name: String,
    /// Falls back to the configured or cluster-default currency mint
    pub usdc_mint: Option<Pubkey>,
}

impl<R, L, M, C, N> Orchestrator<R, L, M, C, N>
where
    R: ChainRpc,
    L: Ledger,
    M: MetadataStore,
    C: ConfigSource,
    N: Notifier,
{
    /// Create the fundraiser and escrow for a REIT, then record the REIT row
    pub async fn initialize_fundraiser<W: WalletSigner>(
        &self,
        wallet: &W,
        input: NewFundraiser,
    ) -> ActionResult<FundraiserInitialized> {
        let result = self.initialize_fundraiser_inner(wallet, input).await;
        self.finish("Initialize fundraiser", result, |e| {
            format!("Fundraiser {} created for REIT {}", e.fundraiser, e.reit_id)
        })
    }

    async fn initialize_fundraiser_inner<W: WalletSigner>(
        &self,
        wallet: &W,
        input: NewFundraiser,
    ) -> ActionResult<FundraiserInitialized> {
        let admin = Self::signer(wallet)?;
        let reit_name = Self::require_field(&input.reit_name, "reit_name")?.to_string();
        self.require_configured_admin(&admin, "initialize a fundraiser")?;
        let usdc_mint = match input.usdc_mint {
            Some(mint) => mint,
            None => self
                .config
                .usdc_mint()?
                .ok_or(ActionError::CurrencyMintNotConfigured)?,
        };
        info!(reit_id = %input.reit_id, %usdc_mint, "Initializing fundraiser");

        let reit = ReitAddresses::derive(&input.reit_id);
        debug!(fundraiser = %reit.fundraiser, escrow = %reit.escrow_vault, "Derived fundraiser");

        if self.reader.fetch_account::<Fundraiser>(&reit.fundraiser).await?.is_some() {
            return Err(ActionError::AccountAlreadyExists {
                kind: AccountKind::Fundraiser,
                address: reit.fundraiser,
            });
        }
        let existing = self.ledger.get_reit(&input.reit_id).await?;

        let ix = build_instruction(
            &InitializeFundraiserAccounts::new(&reit, admin, usdc_mint),
            &InitializeFundraiserArgs {
                reit_id: input.reit_id.to_string(),
                reit_id_hash: reit.reit_id_hash,
            },
        );
        let receipt = self.submit_confirmed(wallet, &[ix], &[]).await?;

        let record = match existing {
            Some(mut row) => {
                row.reit_name = reit_name;
                row
            }
            None => ReitRecord {
                id: input.reit_id,
                reit_name,
                reit_mint_token_address: None,
                metadata_uri: None,
                created_at: Utc::now(),
            },
        };
        self.reconciled(&receipt.signature, self.ledger.upsert_reit(record).await)?;
        self.invalidate(&[ViewKind::Reits]);

        Ok(FundraiserInitialized {
            reit_id: input.reit_id,
            fundraiser: reit.fundraiser,
            escrow_vault: reit.escrow_vault,
            usdc_mint,
            receipt,
        })
    }

    /// Create the REIT share mint. Refuses if the fundraiser already has one.
    pub async fn create_mint<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        metadata: ReitMetadata,
    ) -> ActionResult<MintPublished> {
        let result = self.create_mint_inner(wallet, reit_id, metadata).await;
        self.finish("Create REIT mint", result, |e| format!("REIT mint {} created", e.mint))
    }

    async fn create_mint_inner<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        metadata: ReitMetadata,
    ) -> ActionResult<MintPublished> {
        let admin = Self::signer(wallet)?;
        metadata.check_limits().map_err(ActionError::InvalidInput)?;
        self.require_configured_admin(&admin, "create a REIT mint")?;

        let reit = ReitAddresses::derive(&reit_id);
        let fundraiser = self.load_fundraiser(&reit).await?;
        Self::require_fundraiser_admin(&admin, &fundraiser)?;
        if fundraiser.has_reit_mint() {
            return Err(ActionError::MintAlreadyExists(fundraiser.reit_mint));
        }
        if self.ledger.get_reit(&reit_id).await?.is_none() {
            return Err(ActionError::UnknownReit(reit_id.to_string()));
        }

        let metadata_uri = self.metadata.upload(&reit_id, &metadata, None).await?;
        info!(%reit_id, %metadata_uri, "Metadata uploaded");

        let mint_keypair = Keypair::new();
        let mint = Pubkey::new_from_array(mint_keypair.pubkey().to_bytes());
        debug!(%mint, metadata = %find_metadata_address(&mint).0, "Generated REIT mint");

        let ix = build_instruction(
            &CreateReitMintAccounts::new(&reit, admin, mint),
            &CreateReitMintArgs {
                reit_id_hash: reit.reit_id_hash,
                name: metadata.name.clone(),
                symbol: metadata.symbol.clone(),
                metadata_uri: metadata_uri.clone(),
            },
        );
        let receipt = self.submit_confirmed(wallet, &[ix], &[&mint_keypair]).await?;

        self.reconciled(
            &receipt.signature,
            self.ledger
                .set_reit_mint(&reit_id, mint, Some(metadata_uri.clone()))
                .await,
        )?;
        self.invalidate(&[ViewKind::Reits]);

        Ok(MintPublished {
            reit_id,
            mint,
            metadata_uri,
            created: true,
            receipt,
        })
    }

    /// Rewrite the mint's metadata. The upload is versioned so caches miss;
    /// the ledger URI is last-write-wins.
    pub async fn update_mint<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        metadata: ReitMetadata,
    ) -> ActionResult<MintPublished> {
        let result = self.update_mint_inner(wallet, reit_id, metadata).await;
        self.finish("Update REIT mint", result, |e| {
            format!("Metadata of {} now at {}", e.mint, e.metadata_uri)
        })
    }

    async fn update_mint_inner<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        metadata: ReitMetadata,
    ) -> ActionResult<MintPublished> {
        let admin = Self::signer(wallet)?;
        metadata.check_limits().map_err(ActionError::InvalidInput)?;
        self.require_configured_admin(&admin, "update a REIT mint")?;

        let reit = ReitAddresses::derive(&reit_id);
        let fundraiser = self.load_fundraiser(&reit).await?;
        Self::require_fundraiser_admin(&admin, &fundraiser)?;
        if !fundraiser.has_reit_mint() {
            return Err(ActionError::ReitMintMissing);
        }
        let mint = fundraiser.reit_mint;

        let version = Utc::now().timestamp_millis();
        let metadata_uri = self
            .metadata
            .upload(&reit_id, &metadata, Some(version))
            .await?;
        info!(%reit_id, %metadata_uri, "Versioned metadata uploaded");

        let ix = build_instruction(
            &UpdateReitMintAccounts::new(&reit, admin, mint),
            &UpdateReitMintArgs {
                reit_id_hash: reit.reit_id_hash,
                name: metadata.name.clone(),
                symbol: metadata.symbol.clone(),
                metadata_uri: metadata_uri.clone(),
            },
        );
        let receipt = self.submit_confirmed(wallet, &[ix], &[]).await?;

        self.reconciled(
            &receipt.signature,
            self.ledger
                .set_reit_metadata_uri(&reit_id, metadata_uri.clone())
                .await,
        )?;
        self.invalidate(&[ViewKind::Reits]);

        Ok(MintPublished {
            reit_id,
            mint,
            metadata_uri,
            created: false,
            receipt,
        })
    }

    /// Latest unfinalized transaction on the REIT mint's metadata account,
    /// if any. `None` when the REIT has no mint yet.
    pub async fn recover_mint_update(&self, reit_id: ReitId) -> ActionResult<Option<PendingTransaction>> {
        let reit = ReitAddresses::derive(&reit_id);
        let fundraiser = self.load_fundraiser(&reit).await?;
        if !fundraiser.has_reit_mint() {
            return Ok(None);
        }
        let (metadata, _) = find_metadata_address(&fundraiser.reit_mint);
        let pending = recover_pending(self.reader.rpc(), &metadata).await?;
        if let Some(tx) = &pending {
            info!(%reit_id, signature = %tx.signature(), "Found unfinalized metadata update");
        }
        Ok(pending)
    }
}
