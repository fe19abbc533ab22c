use chrono::Utc;
use tracing::{debug, info};

use super::Orchestrator;
use crate::amount::to_positive_minor_units;
use crate::chain::{ChainRpc, WalletSigner};
use crate::config::ConfigSource;
use crate::errors::{AccountKind, ActionError, ActionResult};
use crate::events::{Invested, InvestorProfileChanged};
use crate::instructions::*;
use crate::ledger::{InvestmentRecord, Ledger};
use crate::metadata::MetadataStore;
use crate::notify::Notifier;
use crate::pda::{find_investor_address, InvestorAddresses, ReitAddresses};
use crate::reit_id::ReitId;
use crate::state::{Investor, InvestorFundraiser};
use crate::views::ViewKind;

impl<R, L, M, C, N> Orchestrator<R, L, M, C, N>
where
    R: ChainRpc,
    L: Ledger,
    M: MetadataStore,
    C: ConfigSource,
    N: Notifier,
{
    /// Create the investor profile and cache its address on the user row
    pub async fn initialize_investor<W: WalletSigner>(
        &self,
        wallet: &W,
        user_id: &str,
    ) -> ActionResult<InvestorProfileChanged> {
        let result = self.initialize_investor_inner(wallet, user_id).await;
        self.finish("Initialize investor", result, |e| {
            format!("Investor profile {} created", e.investor)
        })
    }

    async fn initialize_investor_inner<W: WalletSigner>(
        &self,
        wallet: &W,
        user_id: &str,
    ) -> ActionResult<InvestorProfileChanged> {
        let signer = Self::signer(wallet)?;
        let user_id = Self::require_field(user_id, "user_id")?;

        let (investor, _) = find_investor_address(&signer);
        debug!(%investor, "Derived investor profile");
        if self.reader.fetch_account::<Investor>(&investor).await?.is_some() {
            return Err(ActionError::AccountAlreadyExists {
                kind: AccountKind::Investor,
                address: investor,
            });
        }

        let ix = build_instruction(&InitializeInvestorAccounts::new(signer), &InitializeInvestorArgs);
        let receipt = self.submit_confirmed(wallet, &[ix], &[]).await?;

        self.reconciled(
            &receipt.signature,
            self.ledger.set_investor_pda(user_id, Some(investor)).await,
        )?;

        Ok(InvestorProfileChanged {
            wallet: signer,
            investor,
            open: true,
            receipt,
        })
    }

    /// Close the investor profile and clear the cached address
    pub async fn close_investor<W: WalletSigner>(
        &self,
        wallet: &W,
        user_id: &str,
    ) -> ActionResult<InvestorProfileChanged> {
        let result = self.close_investor_inner(wallet, user_id).await;
        self.finish("Close investor", result, |e| {
            format!("Investor profile {} closed", e.investor)
        })
    }

    async fn close_investor_inner<W: WalletSigner>(
        &self,
        wallet: &W,
        user_id: &str,
    ) -> ActionResult<InvestorProfileChanged> {
        let signer = Self::signer(wallet)?;
        let user_id = Self::require_field(user_id, "user_id")?;

        let (investor, _) = find_investor_address(&signer);
        if self.reader.fetch_account::<Investor>(&investor).await?.is_none() {
            return Err(ActionError::AccountNotFound {
                kind: AccountKind::Investor,
                address: investor,
            });
        }

        let ix = build_instruction(&CloseInvestorAccounts::new(signer), &CloseInvestorArgs);
        let receipt = self.submit_confirmed(wallet, &[ix], &[]).await?;

        self.reconciled(
            &receipt.signature,
            self.ledger.set_investor_pda(user_id, None).await,
        )?;

        Ok(InvestorProfileChanged {
            wallet: signer,
            investor,
            open: false,
            receipt,
        })
    }

    /// Invest `amount` (display units, at most 6 decimals) into a REIT.
    ///
    /// The new investment lives at I(wallet, fundraiser, counter) where
    /// counter is read from the InvestorFundraiser account just before
    /// submission (absent means 0).
    pub async fn invest<W: WalletSigner>(
        &self,
        wallet: &W,
        user_id: &str,
        reit_id: ReitId,
        amount: &str,
    ) -> ActionResult<Invested> {
        let result = self.invest_inner(wallet, user_id, reit_id, amount).await;
        self.finish("Invest", result, |e| {
            format!(
                "Invested {} into REIT {}",
                crate::amount::format_minor_units(e.usdc_amount),
                e.reit_id
            )
        })
    }

    async fn invest_inner<W: WalletSigner>(
        &self,
        wallet: &W,
        user_id: &str,
        reit_id: ReitId,
        amount: &str,
    ) -> ActionResult<Invested> {
        let signer = Self::signer(wallet)?;
        let user_id = Self::require_field(user_id, "user_id")?;
        let usdc_amount = to_positive_minor_units(amount)?;
        info!(%reit_id, %signer, usdc_amount, "Investing");

        let reit = ReitAddresses::derive(&reit_id);
        let investor = InvestorAddresses::derive(&signer, &reit.fundraiser);

        let fundraiser = self.load_fundraiser(&reit).await?;
        if self.ledger.get_reit(&reit_id).await?.is_none() {
            return Err(ActionError::UnknownReit(reit_id.to_string()));
        }
        let counter = self
            .reader
            .fetch_account::<InvestorFundraiser>(&investor.investor_fundraiser)
            .await?
            .map_or(0, |c| c.investment_counter);

        let accounts = InvestAccounts::new(&reit, &investor, fundraiser.usdc_mint, counter);
        debug!(investment = %accounts.investment, counter, "Derived investment");
        let ix = build_instruction(
            &accounts,
            &InvestArgs {
                amount: usdc_amount,
                reit_id_hash: reit.reit_id_hash,
            },
        );
        let receipt = self.submit_confirmed(wallet, &[ix], &[]).await?;

        let record = InvestmentRecord {
            investment_pda: accounts.investment,
            investor_user_id: user_id.to_string(),
            reit_id,
            created_at: Utc::now(),
        };
        self.reconciled(&receipt.signature, self.ledger.upsert_investment(record).await)?;
        self.invalidate(&[ViewKind::Investments, ViewKind::Reits]);

        Ok(Invested {
            reit_id,
            investment: accounts.investment,
            counter,
            usdc_amount,
            receipt,
        })
    }
}
