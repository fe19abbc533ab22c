//! Status projection: ledger rows joined with on-chain snapshots
//!
//! Read-only and idempotent. The chain is authoritative for amounts and
//! status; ledger rows only say which accounts to look at.

use anchor_lang::prelude::Pubkey;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::chain::{ChainReader, ChainRpc, Lookup};
use crate::errors::LedgerError;
use crate::ledger::{InvestmentFilter, InvestmentRecord, Ledger, ReitRecord, UserRecord};
use crate::pda::ReitAddresses;
use crate::reit_id::ReitId;
use crate::state::{Fundraiser, Investment};

/// REIT listing row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReitView {
    pub record: ReitRecord,
    pub fundraiser_address: Pubkey,
    pub fundraiser: Lookup<Fundraiser>,
    /// Sum over this REIT's investments, excluding Refunded
    pub total_raised: u64,
    pub investment_count: usize,
}

/// Investment listing row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvestmentView {
    pub record: InvestmentRecord,
    pub reit_name: Option<String>,
    pub investor_name: Option<String>,
    pub investor_email: Option<String>,
    pub investment: Lookup<Investment>,
}

/// Total raised over a set of investment snapshots
pub fn total_raised<'a, I>(investments: I) -> u64
where
    I: IntoIterator<Item = &'a Investment>,
{
    investments
        .into_iter()
        .filter(|i| i.status.counts_toward_raise())
        .fold(0u64, |acc, i| acc.saturating_add(i.usdc_amount))
}

/// Join REIT rows with their fundraiser snapshots and investment snapshots.
/// `fundraisers` is parallel to `reits`.
pub fn merge_reits(
    reits: Vec<ReitRecord>,
    fundraisers: Vec<Lookup<Fundraiser>>,
    investments: &[(InvestmentRecord, Lookup<Investment>)],
) -> Vec<ReitView> {
    let mut by_reit: HashMap<ReitId, Vec<&Investment>> = HashMap::new();
    for (record, lookup) in investments {
        let entry = by_reit.entry(record.reit_id).or_default();
        if let Lookup::Found(investment) = lookup {
            entry.push(investment);
        }
    }

    reits
        .into_iter()
        .zip(fundraisers)
        .map(|(record, fundraiser)| {
            let snapshots = by_reit.get(&record.id).map(Vec::as_slice).unwrap_or(&[]);
            ReitView {
                fundraiser_address: ReitAddresses::derive(&record.id).fundraiser,
                total_raised: total_raised(snapshots.iter().copied()),
                investment_count: investments
                    .iter()
                    .filter(|(r, _)| r.reit_id == record.id)
                    .count(),
                record,
                fundraiser,
            }
        })
        .collect()
}

/// Join investment rows with snapshots, REIT names and (optionally) users
pub fn merge_investments(
    rows: Vec<(InvestmentRecord, Lookup<Investment>)>,
    reits: &[ReitRecord],
    users: &[UserRecord],
) -> Vec<InvestmentView> {
    let names: HashMap<ReitId, &str> = reits
        .iter()
        .map(|r| (r.id, r.reit_name.as_str()))
        .collect();
    let users: HashMap<&str, &UserRecord> = users.iter().map(|u| (u.user_id.as_str(), u)).collect();

    rows.into_iter()
        .map(|(record, investment)| {
            let user = users.get(record.investor_user_id.as_str());
            InvestmentView {
                reit_name: names.get(&record.reit_id).map(|n| n.to_string()),
                investor_name: user.and_then(|u| u.name.clone()),
                investor_email: user.and_then(|u| u.email.clone()),
                record,
                investment,
            }
        })
        .collect()
}

/// Gathers ledger rows and chain snapshots for the merge functions
pub struct StatusProjector<'a, R, L> {
    reader: &'a ChainReader<R>,
    ledger: &'a L,
}

impl<'a, R: ChainRpc, L: Ledger> StatusProjector<'a, R, L> {
    pub fn new(reader: &'a ChainReader<R>, ledger: &'a L) -> Self {
        Self { reader, ledger }
    }

    pub async fn project_reits(&self) -> Result<Vec<ReitView>, LedgerError> {
        let reits = self.ledger.list_reits().await?;
        let addresses: Vec<Pubkey> = reits
            .iter()
            .map(|r| ReitAddresses::derive(&r.id).fundraiser)
            .collect();
        let fundraisers = self.reader.fetch_accounts::<Fundraiser>(&addresses).await;
        let investments = self.snapshots(&InvestmentFilter::all()).await?;
        debug!(reits = reits.len(), investments = investments.len(), "Projected REITs");
        Ok(merge_reits(reits, fundraisers, &investments))
    }

    /// `with_users` joins user name and email (admin listings)
    pub async fn project_investments(
        &self,
        filter: &InvestmentFilter,
        with_users: bool,
    ) -> Result<Vec<InvestmentView>, LedgerError> {
        let rows = self.snapshots(filter).await?;
        let reits = self.ledger.list_reits().await?;
        let users = if with_users {
            let ids: Vec<String> = rows
                .iter()
                .map(|(r, _)| r.investor_user_id.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            self.ledger.get_users(&ids).await?
        } else {
            Vec::new()
        };
        Ok(merge_investments(rows, &reits, &users))
    }

    async fn snapshots(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<Vec<(InvestmentRecord, Lookup<Investment>)>, LedgerError> {
        let records = self.ledger.list_investments(filter).await?;
        let addresses: Vec<Pubkey> = records.iter().map(|r| r.investment_pda).collect();
        let lookups = self.reader.fetch_accounts::<Investment>(&addresses).await;
        Ok(records.into_iter().zip(lookups).collect())
    }
}
