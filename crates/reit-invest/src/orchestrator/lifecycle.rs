use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use tracing::{info, warn};

use super::Orchestrator;
use crate::amount::{format_minor_units, to_positive_minor_units};
use crate::chain::{ChainRpc, WalletSigner};
use crate::config::ConfigSource;
use crate::errors::{ActionError, ActionResult};
use crate::events::{DividendIssued, InvestmentTransitioned};
use crate::instructions::*;
use crate::ledger::Ledger;
use crate::metadata::MetadataStore;
use crate::notify::Notifier;
use crate::pda::ReitAddresses;
use crate::reit_id::ReitId;
use crate::state::{Fundraiser, Investment, InvestmentStatus};
use crate::views::ViewKind;

impl<R, L, M, C, N> Orchestrator<R, L, M, C, N>
where
    R: ChainRpc,
    L: Ledger,
    M: MetadataStore,
    C: ConfigSource,
    N: Notifier,
{
    /// Pending -> Released: escrowed currency moves to the admin
    pub async fn release<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        investment: Pubkey,
    ) -> ActionResult<InvestmentTransitioned> {
        let result = self
            .transition(
                wallet,
                reit_id,
                investment,
                (InvestmentStatus::Pending, InvestmentStatus::Released),
                "release an investment",
                |reit, admin, fundraiser, _| {
                    build_instruction(
                        &ReleaseAccounts::new(reit, admin, investment, fundraiser.usdc_mint),
                        &ReleaseArgs {
                            reit_id_hash: reit.reit_id_hash,
                        },
                    )
                },
            )
            .await;
        self.finish("Release", result, describe_transition)
    }

    /// Released -> Wired: funds sent to the REIT off-chain
    pub async fn wire<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        investment: Pubkey,
    ) -> ActionResult<InvestmentTransitioned> {
        let result = self
            .transition(
                wallet,
                reit_id,
                investment,
                (InvestmentStatus::Released, InvestmentStatus::Wired),
                "wire an investment",
                |reit, admin, _, _| {
                    build_instruction(
                        &StatusChangeAccounts::new(reit, admin, investment),
                        &WireArgs {
                            reit_id_hash: reit.reit_id_hash,
                        },
                    )
                },
            )
            .await;
        self.finish("Wire", result, describe_transition)
    }

    /// Released -> Refunded. Refunded investments leave the raise total.
    pub async fn refund<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        investment: Pubkey,
    ) -> ActionResult<InvestmentTransitioned> {
        let result = self
            .transition(
                wallet,
                reit_id,
                investment,
                (InvestmentStatus::Released, InvestmentStatus::Refunded),
                "refund an investment",
                |reit, admin, _, _| {
                    build_instruction(
                        &StatusChangeAccounts::new(reit, admin, investment),
                        &RefundArgs {
                            reit_id_hash: reit.reit_id_hash,
                        },
                    )
                },
            )
            .await;
        self.finish("Refund", result, describe_transition)
    }

    /// Wired -> ShareIssued: REIT tokens minted to the investor's ATA.
    /// Requires the fundraiser's REIT mint.
    pub async fn issue_share<W: WalletSigner>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        investment: Pubkey,
    ) -> ActionResult<InvestmentTransitioned> {
        let result = self
            .transition(
                wallet,
                reit_id,
                investment,
                (InvestmentStatus::Wired, InvestmentStatus::ShareIssued),
                "issue shares",
                |reit, admin, fundraiser, snapshot| {
                    build_instruction(
                        &IssueShareAccounts::new(
                            reit,
                            admin,
                            investment,
                            snapshot.investor,
                            fundraiser.reit_mint,
                        ),
                        &IssueShareArgs {
                            reit_id_hash: reit.reit_id_hash,
                        },
                    )
                },
            )
            .await;
        self.finish("Issue share", result, describe_transition)
    }

    /// Shared shape of the admin status transitions
    async fn transition<W, B>(
        &self,
        wallet: &W,
        reit_id: ReitId,
        address: Pubkey,
        (from, to): (InvestmentStatus, InvestmentStatus),
        action: &'static str,
        build: B,
    ) -> ActionResult<InvestmentTransitioned>
    where
        W: WalletSigner,
        B: FnOnce(&ReitAddresses, Pubkey, &Fundraiser, &Investment) -> Instruction,
    {
        let admin = Self::signer(wallet)?;
        self.require_configured_admin(&admin, action)?;
        info!(%reit_id, investment = %address, ?from, ?to, "Transitioning investment");

        let reit = ReitAddresses::derive(&reit_id);
        let fundraiser = self.load_fundraiser(&reit).await?;
        Self::require_fundraiser_admin(&admin, &fundraiser)?;
        let investment = self
            .load_investment_in(&address, &reit.fundraiser, from)
            .await?;
        if to == InvestmentStatus::ShareIssued && !fundraiser.has_reit_mint() {
            return Err(ActionError::ReitMintMissing);
        }

        let ix = build(&reit, admin, &fundraiser, &investment);
        let receipt = self.submit_confirmed(wallet, &[ix], &[]).await?;

        // Confirmation does not prove the status moved; read it back
        let observed = match self.reader.fetch_account::<Investment>(&address).await {
            Ok(Some(after)) => {
                if after.status != to {
                    warn!(
                        investment = %address,
                        expected = ?to,
                        actual = ?after.status,
                        signature = %receipt.signature,
                        "Status did not advance after confirmation"
                    );
                }
                Some(after.status)
            }
            Ok(None) => {
                warn!(investment = %address, "Investment vanished after confirmation");
                None
            }
            Err(e) => {
                warn!(investment = %address, error = %e, "Post-confirmation read failed");
                None
            }
        };
        self.invalidate(&[ViewKind::Investments, ViewKind::Reits]);

        Ok(InvestmentTransitioned {
            investment: address,
            from,
            to,
            observed,
            receipt,
        })
    }

    /// Pay a dividend to the holder of a ShareIssued investment. The
    /// fundraiser is taken from the investment itself.
    pub async fn issue_dividend<W: WalletSigner>(
        &self,
        wallet: &W,
        investment: Pubkey,
        amount: &str,
    ) -> ActionResult<DividendIssued> {
        let result = self.issue_dividend_inner(wallet, investment, amount).await;
        self.finish("Issue dividend", result, |e| {
            format!(
                "Paid {} to {}",
                format_minor_units(e.usdc_amount),
                e.investor
            )
        })
    }

    async fn issue_dividend_inner<W: WalletSigner>(
        &self,
        wallet: &W,
        address: Pubkey,
        amount: &str,
    ) -> ActionResult<DividendIssued> {
        let admin = Self::signer(wallet)?;
        let usdc_amount = to_positive_minor_units(amount)?;
        self.require_configured_admin(&admin, "issue dividends")?;

        let investment = self.load_investment(&address).await?;
        Self::require_status(&address, &investment, InvestmentStatus::ShareIssued)?;
        let fundraiser = self.load_fundraiser_at(&investment.fundraiser).await?;
        Self::require_fundraiser_admin(&admin, &fundraiser)?;
        info!(investment = %address, investor = %investment.investor, usdc_amount, "Issuing dividend");

        let ix = build_instruction(
            &IssueDividendAccounts::new(
                admin,
                address,
                investment.investor,
                investment.fundraiser,
                fundraiser.usdc_mint,
            ),
            &IssueDividendArgs {
                amount: usdc_amount,
            },
        );
        let receipt = self.submit_confirmed(wallet, &[ix], &[]).await?;
        self.invalidate(&[ViewKind::Investments]);

        Ok(DividendIssued {
            investment: address,
            investor: investment.investor,
            usdc_amount,
            receipt,
        })
    }
}

fn describe_transition(e: &InvestmentTransitioned) -> String {
    format!("Investment {} is now {}", e.investment, e.to.label())
}
