//! Chain boundary: RPC and wallet seams, batched account reads, and
//! submit-then-poll confirmation

pub mod reader;
pub mod recovery;
pub mod rpc;
pub mod submitter;

pub use reader::{ChainReader, Lookup};
pub use recovery::{recover_pending, PendingTransaction};
pub use rpc::{ChainRpc, Commitment, SignatureInfo, SignatureStatus, WalletSigner};
pub use submitter::{Confirmation, TransactionSubmitter};
