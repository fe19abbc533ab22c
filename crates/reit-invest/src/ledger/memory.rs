use anchor_lang::prelude::Pubkey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::LedgerError;
use crate::ledger::{InvestmentFilter, InvestmentRecord, Ledger, ReitRecord, UserRecord};
use crate::reit_id::ReitId;

#[derive(Default)]
struct Tables {
    reits: HashMap<ReitId, ReitRecord>,
    investments: HashMap<Pubkey, InvestmentRecord>,
    users: HashMap<String, UserRecord>,
}

/// In-process ledger. `fail_writes` makes every write return
/// `LedgerError::Unavailable`, for exercising reconciliation paths.
#[derive(Default)]
pub struct InMemoryLedger {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a user row directly (sign-up happens outside this crate)
    pub async fn insert_user(&self, user: UserRecord) {
        self.tables.write().await.users.insert(user.user_id.clone(), user);
    }

    fn check_writable(&self) -> Result<(), LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl Ledger for InMemoryLedger {
    async fn list_reits(&self) -> Result<Vec<ReitRecord>, LedgerError> {
        let tables = self.tables.read().await;
        let mut reits: Vec<_> = tables.reits.values().cloned().collect();
        reits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(reits)
    }

    async fn get_reit(&self, id: &ReitId) -> Result<Option<ReitRecord>, LedgerError> {
        Ok(self.tables.read().await.reits.get(id).cloned())
    }

    async fn upsert_reit(&self, record: ReitRecord) -> Result<(), LedgerError> {
        self.check_writable()?;
        debug!(reit_id = %record.id, "Upserting REIT row");
        self.tables.write().await.reits.insert(record.id, record);
        Ok(())
    }

    async fn set_reit_mint(
        &self,
        id: &ReitId,
        mint: Pubkey,
        metadata_uri: Option<String>,
    ) -> Result<(), LedgerError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let reit = tables
            .reits
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(format!("reit {id}")))?;
        reit.reit_mint_token_address = Some(mint);
        if metadata_uri.is_some() {
            reit.metadata_uri = metadata_uri;
        }
        Ok(())
    }

    async fn set_reit_metadata_uri(
        &self,
        id: &ReitId,
        metadata_uri: String,
    ) -> Result<(), LedgerError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let reit = tables
            .reits
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(format!("reit {id}")))?;
        reit.metadata_uri = Some(metadata_uri);
        Ok(())
    }

    async fn list_investments(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<Vec<InvestmentRecord>, LedgerError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .investments
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.investment_pda.cmp(&b.investment_pda))
        });
        Ok(rows)
    }

    async fn upsert_investment(&self, record: InvestmentRecord) -> Result<(), LedgerError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        match tables.investments.get_mut(&record.investment_pda) {
            Some(existing) => {
                existing.investor_user_id = record.investor_user_id;
                existing.reit_id = record.reit_id;
            }
            None => {
                debug!(investment = %record.investment_pda, "Inserting investment row");
                tables.investments.insert(record.investment_pda, record);
            }
        }
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, LedgerError> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<UserRecord>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn set_investor_pda(
        &self,
        user_id: &str,
        investor_pda: Option<Pubkey>,
    ) -> Result<(), LedgerError> {
        self.check_writable()?;
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::NotFound(format!("user {user_id}")))?;
        user.investor_pda = investor_pda;
        Ok(())
    }
}
