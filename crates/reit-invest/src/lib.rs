// REIT Invest - client-side workflow for the Canadian REIT fundraising program
// Architecture: derive -> read chain -> validate -> submit -> confirm -> write ledger
// The chain is authoritative for amounts and status; the ledger only for discovery

use anchor_lang::prelude::*;

pub mod amount;
pub mod chain;
pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod metadata;
pub mod notify;
pub mod orchestrator;
pub mod pda;
pub mod projector;
pub mod reit_id;
pub mod session;
pub mod state;
pub mod views;

pub use errors::{ActionError, ErrorCategory};
pub use orchestrator::Orchestrator;
pub use reit_id::ReitId;

declare_id!("FuEhMFWU9Ui35a9mpavfy7AYGqEX8diUSk1CZonEUivH");
