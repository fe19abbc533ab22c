use anchor_lang::prelude::Pubkey;
use solana_sdk::signature::Signature;
use tracing::debug;

use crate::chain::rpc::{ChainRpc, Commitment};
use crate::errors::ChainError;

/// A transaction touching an address that has not reached finality
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingTransaction {
    InFlight {
        signature: Signature,
        commitment: Option<Commitment>,
    },
    Failed {
        signature: Signature,
        reason: String,
    },
}

impl PendingTransaction {
    pub fn signature(&self) -> &Signature {
        match self {
            PendingTransaction::InFlight { signature, .. } => signature,
            PendingTransaction::Failed { signature, .. } => signature,
        }
    }
}

/// Inspect the most recent signature touching `address`. Used to rediscover
/// an in-flight mint update after the host restarted mid-confirmation.
pub async fn recover_pending<R: ChainRpc>(
    rpc: &R,
    address: &Pubkey,
) -> Result<Option<PendingTransaction>, ChainError> {
    let Some(info) = rpc.latest_signature_for_address(address).await? else {
        return Ok(None);
    };
    debug!(%address, signature = %info.signature, commitment = ?info.commitment, "Latest signature");

    if let Some(reason) = info.err {
        return Ok(Some(PendingTransaction::Failed {
            signature: info.signature,
            reason,
        }));
    }
    match info.commitment {
        Some(Commitment::Finalized) => Ok(None),
        commitment => Ok(Some(PendingTransaction::InFlight {
            signature: info.signature,
            commitment,
        })),
    }
}
