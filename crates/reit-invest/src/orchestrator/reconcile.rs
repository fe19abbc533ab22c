//! Repair of the chain/ledger dual write
//!
//! Chain writes are final before the ledger write happens. When that second
//! write fails the investment exists on-chain with no ledger row. These
//! recipes enumerate every I(wallet, fundraiser, 0..counter) and report or
//! re-insert the rows that are missing. Re-insertion is idempotent.

use anchor_lang::prelude::Pubkey;
use chrono::Utc;
use std::collections::HashSet;
use tracing::{info, warn};

use super::Orchestrator;
use crate::chain::{ChainRpc, Lookup};
use crate::config::ConfigSource;
use crate::errors::ActionResult;
use crate::ledger::{InvestmentFilter, InvestmentRecord, Ledger};
use crate::metadata::MetadataStore;
use crate::notify::Notifier;
use crate::pda::{InvestorAddresses, ReitAddresses};
use crate::reit_id::ReitId;
use crate::state::{Investment, InvestorFundraiser};
use crate::views::ViewKind;

/// On-chain investment with no ledger row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnledgeredInvestment {
    pub reit_id: ReitId,
    pub investment_pda: Pubkey,
    pub counter: u64,
    pub snapshot: Investment,
}

impl<R, L, M, C, N> Orchestrator<R, L, M, C, N>
where
    R: ChainRpc,
    L: Ledger,
    M: MetadataStore,
    C: ConfigSource,
    N: Notifier,
{
    /// Read-only. Investments and REIT counters whose chain read is
    /// unavailable are skipped, not reported.
    pub async fn find_unledgered_investments(
        &self,
        wallet: Pubkey,
    ) -> ActionResult<Vec<UnledgeredInvestment>> {
        let mut missing = Vec::new();
        for reit_row in self.ledger.list_reits().await? {
            let reit = ReitAddresses::derive(&reit_row.id);
            let investor = InvestorAddresses::derive(&wallet, &reit.fundraiser);
            // one REIT's unreadable counter must not hide orphans in the others
            let counter = match self
                .reader
                .fetch_accounts::<InvestorFundraiser>(std::slice::from_ref(&investor.investor_fundraiser))
                .await
                .pop()
            {
                Some(Lookup::Found(counter)) => counter,
                Some(Lookup::Unavailable) => {
                    warn!(
                        reit_id = %reit_row.id,
                        counter = %investor.investor_fundraiser,
                        "Skipping REIT with unreadable investment counter"
                    );
                    continue;
                }
                Some(Lookup::Missing) | None => continue,
            };

            let ledgered: HashSet<Pubkey> = self
                .ledger
                .list_investments(&InvestmentFilter::for_reit(reit_row.id))
                .await?
                .into_iter()
                .map(|r| r.investment_pda)
                .collect();

            let addresses: Vec<Pubkey> = (0..counter.investment_counter)
                .map(|i| investor.investment(&reit.fundraiser, i))
                .collect();
            let lookups = self.reader.fetch_accounts::<Investment>(&addresses).await;

            for (index, (address, lookup)) in addresses.into_iter().zip(lookups).enumerate() {
                match lookup {
                    Lookup::Found(snapshot) if !ledgered.contains(&address) => {
                        missing.push(UnledgeredInvestment {
                            reit_id: reit_row.id,
                            investment_pda: address,
                            counter: index as u64,
                            snapshot,
                        });
                    }
                    Lookup::Unavailable => {
                        warn!(investment = %address, "Skipping investment with no chain data");
                    }
                    _ => {}
                }
            }
        }
        info!(%wallet, count = missing.len(), "Unledgered investments");
        Ok(missing)
    }

    /// Insert ledger rows for every unledgered investment of `wallet`,
    /// attributed to `user_id`. Returns the repaired addresses.
    pub async fn repair_unledgered(&self, wallet: Pubkey, user_id: &str) -> ActionResult<Vec<Pubkey>> {
        let result = self.repair_unledgered_inner(wallet, user_id).await;
        self.finish("Repair ledger", result, |repaired| {
            format!("{} investment row(s) restored", repaired.len())
        })
    }

    async fn repair_unledgered_inner(&self, wallet: Pubkey, user_id: &str) -> ActionResult<Vec<Pubkey>> {
        let user_id = Self::require_field(user_id, "user_id")?;
        let mut repaired = Vec::new();
        for row in self.find_unledgered_investments(wallet).await? {
            self.ledger
                .upsert_investment(InvestmentRecord {
                    investment_pda: row.investment_pda,
                    investor_user_id: user_id.to_string(),
                    reit_id: row.reit_id,
                    created_at: Utc::now(),
                })
                .await?;
            repaired.push(row.investment_pda);
        }
        if !repaired.is_empty() {
            self.invalidate(&[ViewKind::Investments, ViewKind::Reits]);
        }
        Ok(repaired)
    }
}
