//! REIT token metadata documents and their storage

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::amount::format_minor_units;
use crate::constants::{MAX_MINT_NAME_LEN, MAX_MINT_SYMBOL_LEN};
use crate::errors::MetadataError;
use crate::reit_id::ReitId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

/// Off-chain JSON referenced by the mint's Metaplex `uri`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReitMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Vec<MetadataAttribute>,
}

impl ReitMetadata {
    /// `share_price` in currency minor units
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        description: impl Into<String>,
        share_price: u64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            description: description.into(),
            image: None,
            attributes: vec![
                MetadataAttribute {
                    trait_type: "share_price".to_string(),
                    value: format_minor_units(share_price),
                },
                MetadataAttribute {
                    trait_type: "currency".to_string(),
                    value: currency.into(),
                },
            ],
        }
    }

    /// Name and symbol limits enforced by the metadata program
    pub fn check_limits(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is empty".to_string());
        }
        if self.name.len() > MAX_MINT_NAME_LEN {
            return Err(format!("name is longer than {MAX_MINT_NAME_LEN} bytes"));
        }
        if self.symbol.trim().is_empty() {
            return Err("symbol is empty".to_string());
        }
        if self.symbol.len() > MAX_MINT_SYMBOL_LEN {
            return Err(format!("symbol is longer than {MAX_MINT_SYMBOL_LEN} bytes"));
        }
        Ok(())
    }

    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| a.value.as_str())
    }

    pub fn to_json(&self) -> Result<String, MetadataError> {
        serde_json::to_string_pretty(self).map_err(|e| MetadataError::Encode(e.to_string()))
    }
}

/// Public storage for metadata JSON, one object per REIT
#[allow(async_fn_in_trait)]
pub trait MetadataStore {
    /// Overwrite `{reit_id}/metadata.json` and return its public URI. With a
    /// `version` the URI carries `?v=<version>` so CDN caches miss.
    async fn upload(
        &self,
        reit_id: &ReitId,
        metadata: &ReitMetadata,
        version: Option<i64>,
    ) -> Result<String, MetadataError>;
}

impl<T: MetadataStore> MetadataStore for Arc<T> {
    async fn upload(
        &self,
        reit_id: &ReitId,
        metadata: &ReitMetadata,
        version: Option<i64>,
    ) -> Result<String, MetadataError> {
        (**self).upload(reit_id, metadata, version).await
    }
}

pub fn object_path(reit_id: &ReitId) -> String {
    format!("{reit_id}/metadata.json")
}

/// In-process store for tests and local hosts
pub struct InMemoryMetadataStore {
    base_url: String,
    objects: Mutex<HashMap<String, String>>,
    fail_uploads: AtomicBool,
}

impl InMemoryMetadataStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, reit_id: &ReitId) -> Option<ReitMetadata> {
        let objects = self.objects.lock().ok()?;
        let raw = objects.get(&object_path(reit_id))?;
        serde_json::from_str(raw).ok()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    async fn upload(
        &self,
        reit_id: &ReitId,
        metadata: &ReitMetadata,
        version: Option<i64>,
    ) -> Result<String, MetadataError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MetadataError::Upload("storage unavailable".to_string()));
        }
        let path = object_path(reit_id);
        let body = metadata.to_json()?;
        self.objects
            .lock()
            .map_err(|_| MetadataError::Upload("store poisoned".to_string()))?
            .insert(path.clone(), body);

        let uri = format!("{}/{}", self.base_url, path);
        Ok(match version {
            Some(v) => format!("{uri}?v={v}"),
            None => uri,
        })
    }
}
