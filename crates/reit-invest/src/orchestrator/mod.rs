//! Reconciliation orchestrator
//!
//! One recipe per user action, each in the same order:
//! 1. local preconditions (wallet, fields, amounts)
//! 2. derive addresses
//! 3. read chain state: dependent accounts, authority, investment status
//! 4. submit and poll; Failed and TimedOut abort with distinct errors
//! 5. ledger write, only after confirmation
//! 6. invalidate cached views
//!
//! Nothing here serializes recipes against each other. Two concurrent
//! invests from one wallet race on the counter read in step 3; the program
//! decides the winner.

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::chain::{ChainReader, ChainRpc, Confirmation, TransactionSubmitter, WalletSigner};
use crate::config::{ConfigSource, ConfirmationPolicy};
use crate::errors::{AccountKind, ActionError, ActionResult, ChainError, ErrorCategory, LedgerError};
use crate::events::TransactionReceipt;
use crate::ledger::Ledger;
use crate::metadata::MetadataStore;
use crate::notify::{Notifier, TracingNotifier};
use crate::pda::ReitAddresses;
use crate::projector::StatusProjector;
use crate::state::{Fundraiser, Investment, InvestmentStatus};
use crate::views::{ViewCache, ViewKind};

mod fundraiser;
mod investor;
mod lifecycle;
mod reconcile;

pub use fundraiser::NewFundraiser;
pub use reconcile::UnledgeredInvestment;

/// Shared context for every recipe: chain, ledger, metadata storage, config
/// and notifications. Constructed once by the host.
pub struct Orchestrator<R, L, M, C, N = TracingNotifier> {
    reader: ChainReader<R>,
    submitter: TransactionSubmitter,
    ledger: L,
    metadata: M,
    config: C,
    notifier: N,
    views: Arc<ViewCache>,
}

impl<R, L, M, C> Orchestrator<R, L, M, C>
where
    R: ChainRpc,
    L: Ledger,
    M: MetadataStore,
    C: ConfigSource,
{
    pub fn new(rpc: R, ledger: L, metadata: M, config: C) -> Self {
        Self {
            reader: ChainReader::new(rpc),
            submitter: TransactionSubmitter::default(),
            ledger,
            metadata,
            config,
            notifier: TracingNotifier,
            views: Arc::new(ViewCache::new()),
        }
    }
}

impl<R, L, M, C, N> Orchestrator<R, L, M, C, N>
where
    R: ChainRpc,
    L: Ledger,
    M: MetadataStore,
    C: ConfigSource,
    N: Notifier,
{
    pub fn with_notifier<N2: Notifier>(self, notifier: N2) -> Orchestrator<R, L, M, C, N2> {
        Orchestrator {
            reader: self.reader,
            submitter: self.submitter,
            ledger: self.ledger,
            metadata: self.metadata,
            config: self.config,
            notifier,
            views: self.views,
        }
    }

    pub fn with_confirmation_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.submitter = TransactionSubmitter::new(policy);
        self
    }

    pub fn with_view_cache(mut self, views: Arc<ViewCache>) -> Self {
        self.views = views;
        self
    }

    pub fn view_cache(&self) -> Arc<ViewCache> {
        self.views.clone()
    }

    pub fn reader(&self) -> &ChainReader<R> {
        &self.reader
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn projector(&self) -> StatusProjector<'_, R, L> {
        StatusProjector::new(&self.reader, &self.ledger)
    }

    // -- preconditions --------------------------------------------------

    fn signer<W: WalletSigner>(wallet: &W) -> ActionResult<Pubkey> {
        wallet.pubkey().ok_or(ActionError::WalletNotConnected)
    }

    fn require_field<'a>(value: &'a str, field: &'static str) -> ActionResult<&'a str> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ActionError::MissingField(field));
        }
        Ok(trimmed)
    }

    /// First half of the admin double check: the statically configured wallet.
    /// Read on every call.
    fn require_configured_admin(&self, signer: &Pubkey, action: &'static str) -> ActionResult<()> {
        let admin = self
            .config
            .admin_wallet()?
            .ok_or(ActionError::AdminWalletNotConfigured)?;
        if admin != *signer {
            return Err(ActionError::NotConfiguredAdmin { action });
        }
        Ok(())
    }

    /// Second half: the authority recorded on the fundraiser
    fn require_fundraiser_admin(signer: &Pubkey, fundraiser: &Fundraiser) -> ActionResult<()> {
        if fundraiser.admin != *signer {
            return Err(ActionError::NotFundraiserAdmin {
                signer: *signer,
                authority: fundraiser.admin,
            });
        }
        Ok(())
    }

    fn require_status(
        address: &Pubkey,
        investment: &Investment,
        expected: InvestmentStatus,
    ) -> ActionResult<()> {
        if investment.status != expected {
            return Err(ActionError::InvalidStatus {
                address: *address,
                expected,
                actual: investment.status,
            });
        }
        Ok(())
    }

    // -- chain reads ----------------------------------------------------

    async fn load_fundraiser_at(&self, address: &Pubkey) -> ActionResult<Fundraiser> {
        self.reader
            .fetch_account::<Fundraiser>(address)
            .await?
            .ok_or(ActionError::AccountNotFound {
                kind: AccountKind::Fundraiser,
                address: *address,
            })
    }

    async fn load_fundraiser(&self, reit: &ReitAddresses) -> ActionResult<Fundraiser> {
        debug!(fundraiser = %reit.fundraiser, "Loading fundraiser");
        self.load_fundraiser_at(&reit.fundraiser).await
    }

    async fn load_investment(&self, address: &Pubkey) -> ActionResult<Investment> {
        self.reader
            .fetch_account::<Investment>(address)
            .await?
            .ok_or(ActionError::AccountNotFound {
                kind: AccountKind::Investment,
                address: *address,
            })
    }

    /// Investment must exist, belong to `fundraiser` and be in `expected`
    async fn load_investment_in(
        &self,
        address: &Pubkey,
        fundraiser: &Pubkey,
        expected: InvestmentStatus,
    ) -> ActionResult<Investment> {
        let investment = self.load_investment(address).await?;
        if investment.fundraiser != *fundraiser {
            return Err(ActionError::FundraiserMismatch {
                investment: *address,
                expected: *fundraiser,
                actual: investment.fundraiser,
            });
        }
        Self::require_status(address, &investment, expected)?;
        Ok(investment)
    }

    // -- submission -----------------------------------------------------

    /// Submit and classify. Only a confirmed transaction yields a receipt.
    async fn submit_confirmed<W: WalletSigner>(
        &self,
        wallet: &W,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> ActionResult<TransactionReceipt> {
        let cluster = self.config.cluster()?;
        let (signature, confirmation) = self
            .submitter
            .submit_and_confirm(wallet, self.reader.rpc(), instructions, co_signers)
            .await
            .map_err(|e| match e {
                ChainError::Send(reason) => ActionError::TransactionRejected { reason },
                other => ActionError::Chain(other),
            })?;
        match confirmation {
            Confirmation::Confirmed(_) => Ok(TransactionReceipt::new(signature, cluster)),
            Confirmation::Failed(reason) => Err(ActionError::TransactionFailed { signature, reason }),
            Confirmation::TimedOut => Err(ActionError::UnknownOutcome { signature }),
        }
    }

    /// Ledger writes after confirmation: the chain effect is final, so a
    /// failure here is a reconciliation error, never retried
    fn reconciled<T>(&self, signature: &Signature, result: Result<T, LedgerError>) -> ActionResult<T> {
        result.map_err(|source| {
            error!(
                %signature,
                error = %source,
                "Chain transaction is final but the ledger write failed - manual repair needed"
            );
            ActionError::Reconciliation {
                signature: *signature,
                source,
            }
        })
    }

    fn invalidate(&self, kinds: &[ViewKind]) {
        for kind in kinds {
            self.views.invalidate(*kind);
        }
    }

    /// Report the outcome to the user; errors are returned unchanged
    fn finish<T>(
        &self,
        action: &str,
        result: ActionResult<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> ActionResult<T> {
        match &result {
            Ok(value) => {
                let detail = describe(value);
                info!(action, %detail, "Action complete");
                self.notifier.success(action, &detail);
            }
            Err(e) => {
                let detail = e.to_string();
                match e.category() {
                    ErrorCategory::UnknownOutcome => {
                        warn!(action, category = ?e.category(), %detail);
                        self.notifier.warning(action, &detail);
                    }
                    ErrorCategory::Reconciliation | ErrorCategory::Infrastructure => {
                        error!(action, category = ?e.category(), %detail);
                        self.notifier.error(action, &detail);
                    }
                    _ => {
                        warn!(action, category = ?e.category(), %detail);
                        self.notifier.error(action, &detail);
                    }
                }
            }
        }
        result
    }
}
