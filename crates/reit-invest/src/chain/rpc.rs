use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use std::sync::Arc;

use crate::errors::ChainError;

/// Commitment level reported for a signature, weakest first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    /// Confirmed or stronger
    pub fn is_settled(&self) -> bool {
        *self >= Commitment::Confirmed
    }
}

/// `getSignatureStatuses` entry for one signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureStatus {
    pub commitment: Option<Commitment>,
    /// Chain-reported failure, verbatim
    pub err: Option<String>,
}

impl SignatureStatus {
    pub fn settled(commitment: Commitment) -> Self {
        Self {
            commitment: Some(commitment),
            err: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            commitment: Some(Commitment::Processed),
            err: Some(reason.into()),
        }
    }
}

/// `getSignaturesForAddress` entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: Signature,
    pub commitment: Option<Commitment>,
    pub err: Option<String>,
    pub block_time: Option<i64>,
}

/// JSON-RPC methods the workflow depends on
#[allow(async_fn_in_trait)]
pub trait ChainRpc {
    /// One entry per address, in input order; `None` for accounts that do not exist
    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, ChainError>;

    /// `None` while the cluster has not seen the signature
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, ChainError>;

    async fn latest_signature_for_address(
        &self,
        address: &Pubkey,
    ) -> Result<Option<SignatureInfo>, ChainError>;
}

impl<T: ChainRpc> ChainRpc for Arc<T> {
    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, ChainError> {
        (**self).get_multiple_accounts(addresses).await
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, ChainError> {
        (**self).get_signature_status(signature).await
    }

    async fn latest_signature_for_address(
        &self,
        address: &Pubkey,
    ) -> Result<Option<SignatureInfo>, ChainError> {
        (**self).latest_signature_for_address(address).await
    }
}

/// Wallet adapter. Signs with the user's key plus any extra keypairs
/// (e.g. a fresh mint) and sends; returns as soon as the cluster accepts it.
#[allow(async_fn_in_trait)]
pub trait WalletSigner {
    /// `None` while no wallet is connected
    fn pubkey(&self) -> Option<Pubkey>;

    async fn sign_and_send(
        &self,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> Result<Signature, ChainError>;
}

impl<T: WalletSigner> WalletSigner for Arc<T> {
    fn pubkey(&self) -> Option<Pubkey> {
        (**self).pubkey()
    }

    async fn sign_and_send(
        &self,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> Result<Signature, ChainError> {
        (**self).sign_and_send(instructions, co_signers).await
    }
}
