use anchor_lang::solana_program::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature};
use tracing::{debug, info, warn};

use crate::chain::rpc::{ChainRpc, Commitment, WalletSigner};
use crate::config::ConfirmationPolicy;
use crate::errors::ChainError;

/// Terminal classification of a submitted transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed(Commitment),
    /// Chain-reported error; the signature must not be retried
    Failed(String),
    /// No terminal status within the poll budget. The transaction may still
    /// land; callers must not assume funds did or did not move.
    TimedOut,
}

/// Sends instructions through the wallet and polls for a terminal status
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionSubmitter {
    policy: ConfirmationPolicy,
}

impl TransactionSubmitter {
    pub fn new(policy: ConfirmationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        self.policy
    }

    pub async fn submit<W: WalletSigner>(
        &self,
        wallet: &W,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> Result<Signature, ChainError> {
        let signature = wallet.sign_and_send(instructions, co_signers).await?;
        info!(%signature, signer = ?wallet.pubkey(), "Transaction sent");
        Ok(signature)
    }

    /// Poll at `poll_interval` for at most `max_attempts` ticks. An RPC error
    /// on a tick is logged and counts as an attempt.
    pub async fn await_confirmation<R: ChainRpc>(
        &self,
        rpc: &R,
        signature: &Signature,
    ) -> Confirmation {
        for attempt in 1..=self.policy.max_attempts {
            match rpc.get_signature_status(signature).await {
                Ok(Some(status)) => {
                    if let Some(reason) = status.err {
                        warn!(%signature, attempt, %reason, "Transaction failed");
                        return Confirmation::Failed(reason);
                    }
                    match status.commitment {
                        Some(commitment) if commitment.is_settled() => {
                            info!(%signature, attempt, ?commitment, "Transaction confirmed");
                            return Confirmation::Confirmed(commitment);
                        }
                        commitment => debug!(%signature, attempt, ?commitment, "Not settled yet"),
                    }
                }
                Ok(None) => debug!(%signature, attempt, "Signature not seen yet"),
                Err(e) => warn!(%signature, attempt, error = %e, "Status poll failed"),
            }
            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.poll_interval).await;
            }
        }
        warn!(
            %signature,
            attempts = self.policy.max_attempts,
            "No terminal status - outcome unknown"
        );
        Confirmation::TimedOut
    }

    pub async fn submit_and_confirm<W: WalletSigner, R: ChainRpc>(
        &self,
        wallet: &W,
        rpc: &R,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> Result<(Signature, Confirmation), ChainError> {
        let signature = self.submit(wallet, instructions, co_signers).await?;
        let confirmation = self.await_confirmation(rpc, &signature).await;
        Ok((signature, confirmation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::rpc::{SignatureInfo, SignatureStatus};
    use anchor_lang::prelude::Pubkey;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays a fixed script of status responses, then `None` forever
    struct ScriptedRpc {
        script: Mutex<VecDeque<Result<Option<SignatureStatus>, ChainError>>>,
        polls: Mutex<u32>,
    }

    impl ScriptedRpc {
        fn new(script: Vec<Result<Option<SignatureStatus>, ChainError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                polls: Mutex::new(0),
            }
        }

        fn polls(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    impl ChainRpc for ScriptedRpc {
        async fn get_multiple_accounts(
            &self,
            addresses: &[Pubkey],
        ) -> Result<Vec<Option<Vec<u8>>>, ChainError> {
            Ok(vec![None; addresses.len()])
        }

        async fn get_signature_status(
            &self,
            _signature: &Signature,
        ) -> Result<Option<SignatureStatus>, ChainError> {
            *self.polls.lock().unwrap() += 1;
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }

        async fn latest_signature_for_address(
            &self,
            _address: &Pubkey,
        ) -> Result<Option<SignatureInfo>, ChainError> {
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_processed() {
        let rpc = ScriptedRpc::new(vec![
            Ok(None),
            Ok(Some(SignatureStatus {
                commitment: Some(Commitment::Processed),
                err: None,
            })),
            Ok(Some(SignatureStatus::settled(Commitment::Confirmed))),
        ]);
        let outcome = TransactionSubmitter::default()
            .await_confirmation(&rpc, &Signature::new_unique())
            .await;
        assert_eq!(outcome, Confirmation::Confirmed(Commitment::Confirmed));
        assert_eq!(rpc.polls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_fails_immediately() {
        let rpc = ScriptedRpc::new(vec![Ok(Some(SignatureStatus::failed(
            "custom program error: 0x1770",
        )))]);
        let outcome = TransactionSubmitter::default()
            .await_confirmation(&rpc, &Signature::new_unique())
            .await;
        assert_eq!(
            outcome,
            Confirmation::Failed("custom program error: 0x1770".to_string())
        );
        assert_eq!(rpc.polls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_budget() {
        let rpc = ScriptedRpc::new(vec![]);
        let start = tokio::time::Instant::now();
        let outcome = TransactionSubmitter::default()
            .await_confirmation(&rpc, &Signature::new_unique())
            .await;
        assert_eq!(outcome, Confirmation::TimedOut);
        assert_eq!(rpc.polls(), 30);
        // 29 sleeps between 30 polls
        assert_eq!(start.elapsed(), Duration::from_secs(29));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rpc_errors_count_as_attempts() {
        let rpc = ScriptedRpc::new(vec![
            Err(ChainError::Rpc("timeout".to_string())),
            Err(ChainError::Rpc("timeout".to_string())),
        ]);
        let policy = ConfirmationPolicy {
            poll_interval: Duration::from_millis(10),
            max_attempts: 2,
        };
        let outcome = TransactionSubmitter::new(policy)
            .await_confirmation(&rpc, &Signature::new_unique())
            .await;
        assert_eq!(outcome, Confirmation::TimedOut);
        assert_eq!(rpc.polls(), 2);
    }
}
