use anchor_lang::prelude::*;
use tracing::{debug, warn};

use crate::chain::rpc::ChainRpc;
use crate::constants::ACCOUNT_FETCH_CHUNK_SIZE;
use crate::errors::ChainError;

/// Outcome of one entry in a batched read
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    /// Account does not exist (not initialized yet)
    Missing,
    /// Transport or decoding failure; no on-chain data for this row
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_found(&self) -> Option<&T> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Lookup::Unavailable)
    }
}

/// Typed account reads over a [`ChainRpc`]
pub struct ChainReader<R> {
    rpc: R,
    chunk_size: usize,
}

impl<R: ChainRpc> ChainReader<R> {
    pub fn new(rpc: R) -> Self {
        Self {
            rpc,
            chunk_size: ACCOUNT_FETCH_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Single account read. A missing account is `Ok(None)`; transport and
    /// decoding failures are errors because the caller is about to act on it.
    pub async fn fetch_account<T: AccountDeserialize>(
        &self,
        address: &Pubkey,
    ) -> std::result::Result<Option<T>, ChainError> {
        let mut entries = self.rpc.get_multiple_accounts(&[*address]).await?;
        if entries.len() != 1 {
            return Err(ChainError::BatchLength {
                requested: 1,
                got: entries.len(),
            });
        }
        match entries.pop().flatten() {
            Some(data) => decode::<T>(address, &data).map(Some),
            None => Ok(None),
        }
    }

    /// Raw existence check, for accounts not owned by the program (mints)
    pub async fn account_exists(&self, address: &Pubkey) -> std::result::Result<bool, ChainError> {
        let entries = self.rpc.get_multiple_accounts(&[*address]).await?;
        Ok(matches!(entries.first(), Some(Some(_))))
    }

    /// Batched read preserving input order. A failed chunk marks only its own
    /// rows `Unavailable`; other chunks are unaffected.
    pub async fn fetch_accounts<T: AccountDeserialize>(&self, addresses: &[Pubkey]) -> Vec<Lookup<T>> {
        let mut out = Vec::with_capacity(addresses.len());
        for (index, chunk) in addresses.chunks(self.chunk_size).enumerate() {
            match self.rpc.get_multiple_accounts(chunk).await {
                Ok(entries) if entries.len() == chunk.len() => {
                    for (address, entry) in chunk.iter().zip(entries) {
                        out.push(match entry {
                            None => Lookup::Missing,
                            Some(data) => match decode::<T>(address, &data) {
                                Ok(value) => Lookup::Found(value),
                                Err(e) => {
                                    warn!(%address, error = %e, "Skipping undecodable account");
                                    Lookup::Unavailable
                                }
                            },
                        });
                    }
                }
                Ok(entries) => {
                    let e = ChainError::BatchLength {
                        requested: chunk.len(),
                        got: entries.len(),
                    };
                    warn!(chunk = index, error = %e, "Batch fetch returned a short result");
                    out.extend(chunk.iter().map(|_| Lookup::Unavailable));
                }
                Err(e) => {
                    warn!(chunk = index, size = chunk.len(), error = %e, "Batch fetch failed");
                    out.extend(chunk.iter().map(|_| Lookup::Unavailable));
                }
            }
        }
        debug!(requested = addresses.len(), "Batch fetch complete");
        out
    }
}

fn decode<T: AccountDeserialize>(address: &Pubkey, data: &[u8]) -> std::result::Result<T, ChainError> {
    let mut slice = data;
    T::try_deserialize(&mut slice).map_err(|e| ChainError::Decode {
        address: *address,
        kind: short_type_name::<T>(),
        reason: e.to_string(),
    })
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
