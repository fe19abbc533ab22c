//! Off-chain ledger: the relational store used for discovery and user
//! bookkeeping. Subordinate to the chain for amounts and status.

use anchor_lang::prelude::Pubkey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::LedgerError;
use crate::reit_id::ReitId;

pub mod memory;

pub use memory::InMemoryLedger;

/// `reits` row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReitRecord {
    pub id: ReitId,
    pub reit_name: String,
    /// Set once the REIT mint is created
    #[serde(default, with = "pubkey_string::option")]
    pub reit_mint_token_address: Option<Pubkey>,
    #[serde(default)]
    pub metadata_uri: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `investments` row, keyed by `investment_pda`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    #[serde(with = "pubkey_string")]
    pub investment_pda: Pubkey,
    pub investor_user_id: String,
    pub reit_id: ReitId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Investor,
}

/// `users` row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub role: Role,
    /// Cached investor profile PDA
    #[serde(default, with = "pubkey_string::option")]
    pub investor_pda: Option<Pubkey>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Filter for investment listings
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InvestmentFilter {
    pub investor_user_id: Option<String>,
    pub reit_id: Option<ReitId>,
}

impl InvestmentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_investor(user_id: impl Into<String>) -> Self {
        Self {
            investor_user_id: Some(user_id.into()),
            reit_id: None,
        }
    }

    pub fn for_reit(reit_id: ReitId) -> Self {
        Self {
            investor_user_id: None,
            reit_id: Some(reit_id),
        }
    }

    pub fn matches(&self, record: &InvestmentRecord) -> bool {
        self.investor_user_id
            .as_ref()
            .map_or(true, |id| *id == record.investor_user_id)
            && self.reit_id.map_or(true, |id| id == record.reit_id)
    }
}

/// Row-level CRUD over the ledger tables. No cross-row transactions;
/// concurrent writers are last-write-wins.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    async fn list_reits(&self) -> Result<Vec<ReitRecord>, LedgerError>;

    async fn get_reit(&self, id: &ReitId) -> Result<Option<ReitRecord>, LedgerError>;

    /// Insert or replace by `id`
    async fn upsert_reit(&self, record: ReitRecord) -> Result<(), LedgerError>;

    async fn set_reit_mint(
        &self,
        id: &ReitId,
        mint: Pubkey,
        metadata_uri: Option<String>,
    ) -> Result<(), LedgerError>;

    async fn set_reit_metadata_uri(&self, id: &ReitId, metadata_uri: String)
        -> Result<(), LedgerError>;

    /// Newest first
    async fn list_investments(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<Vec<InvestmentRecord>, LedgerError>;

    /// Idempotent by `investment_pda`; a repeat write keeps the first `created_at`
    async fn upsert_investment(&self, record: InvestmentRecord) -> Result<(), LedgerError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, LedgerError>;

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<UserRecord>, LedgerError>;

    async fn set_investor_pda(
        &self,
        user_id: &str,
        investor_pda: Option<Pubkey>,
    ) -> Result<(), LedgerError>;
}

impl<T: Ledger> Ledger for Arc<T> {
    async fn list_reits(&self) -> Result<Vec<ReitRecord>, LedgerError> {
        (**self).list_reits().await
    }

    async fn get_reit(&self, id: &ReitId) -> Result<Option<ReitRecord>, LedgerError> {
        (**self).get_reit(id).await
    }

    async fn upsert_reit(&self, record: ReitRecord) -> Result<(), LedgerError> {
        (**self).upsert_reit(record).await
    }

    async fn set_reit_mint(
        &self,
        id: &ReitId,
        mint: Pubkey,
        metadata_uri: Option<String>,
    ) -> Result<(), LedgerError> {
        (**self).set_reit_mint(id, mint, metadata_uri).await
    }

    async fn set_reit_metadata_uri(
        &self,
        id: &ReitId,
        metadata_uri: String,
    ) -> Result<(), LedgerError> {
        (**self).set_reit_metadata_uri(id, metadata_uri).await
    }

    async fn list_investments(
        &self,
        filter: &InvestmentFilter,
    ) -> Result<Vec<InvestmentRecord>, LedgerError> {
        (**self).list_investments(filter).await
    }

    async fn upsert_investment(&self, record: InvestmentRecord) -> Result<(), LedgerError> {
        (**self).upsert_investment(record).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, LedgerError> {
        (**self).get_user(user_id).await
    }

    async fn get_users(&self, user_ids: &[String]) -> Result<Vec<UserRecord>, LedgerError> {
        (**self).get_users(user_ids).await
    }

    async fn set_investor_pda(
        &self,
        user_id: &str,
        investor_pda: Option<Pubkey>,
    ) -> Result<(), LedgerError> {
        (**self).set_investor_pda(user_id, investor_pda).await
    }
}

/// Pubkeys are stored as base58 text columns
pub(crate) mod pubkey_string {
    use anchor_lang::prelude::Pubkey;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&key.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Pubkey, D::Error> {
        let raw = String::deserialize(d)?;
        Pubkey::from_str(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(key: &Option<Pubkey>, s: S) -> Result<S::Ok, S::Error> {
            match key {
                Some(key) => s.serialize_some(&key.to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Pubkey>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| Pubkey::from_str(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}
