// Local chain double shared by the integration tests
//
// Executes the fundraising program's state transitions in memory, keyed by
// instruction discriminator, and reports signature statuses according to a
// configurable submit mode. Every transaction is all-or-nothing.

#![allow(dead_code)]

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use reit_invest::chain::{ChainRpc, Commitment, SignatureInfo, SignatureStatus, WalletSigner};
use reit_invest::config::{Cluster, StaticConfig};
use reit_invest::errors::{ChainError, LedgerError};
use reit_invest::instructions::*;
use reit_invest::ledger::{
    InMemoryLedger, InvestmentFilter, InvestmentRecord, Ledger, ReitRecord, Role, UserRecord,
};
use reit_invest::metadata::{InMemoryMetadataStore, ReitMetadata};
use reit_invest::notify::Notifier;
use reit_invest::pda::{find_investment_address, ReitAddresses};
use reit_invest::state::{Fundraiser, Investment, InvestmentStatus, Investor, InvestorFundraiser};
use reit_invest::{Orchestrator, ReitId};
use solana_sdk::signature::{Keypair, Signature, Signer};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Fixed share price used by the program's issue_share (100.00 per token)
pub const SHARE_PRICE: u64 = 100_000_000;

pub const REIT_ID: &str = "3f2a9c4e-1b7d-4e8a-9c0f-5a6b7c8d9e0f";
pub const ADMIN_USER: &str = "admin-user";
pub const INVESTOR_USER: &str = "investor-user";

/// How the next submissions resolve
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitMode {
    /// Execute and report `commitment`; program errors report a failed status
    Land(Commitment),
    /// Reject with this error without executing
    Fail(String),
    /// Accepted but never reported
    Vanish,
    /// Refused by the wallet before sending, e.g. a failed preflight
    Reject(String),
}

struct ChainState {
    accounts: HashMap<Pubkey, Vec<u8>>,
    statuses: HashMap<Signature, SignatureStatus>,
    latest_by_address: HashMap<Pubkey, SignatureInfo>,
    mode: SubmitMode,
    poisoned: HashSet<Pubkey>,
    submissions: usize,
    dividends: Vec<(Pubkey, u64)>,
}

pub struct LocalChain {
    state: Mutex<ChainState>,
}

impl Default for LocalChain {
    fn default() -> Self {
        Self {
            state: Mutex::new(ChainState {
                accounts: HashMap::new(),
                statuses: HashMap::new(),
                latest_by_address: HashMap::new(),
                mode: SubmitMode::Land(Commitment::Confirmed),
                poisoned: HashSet::new(),
                submissions: 0,
                dividends: Vec::new(),
            }),
        }
    }
}

fn encode<T: AccountSerialize>(value: &T) -> Vec<u8> {
    let mut data = Vec::new();
    value.try_serialize(&mut data).unwrap();
    data
}

fn decode<T: AccountDeserialize>(data: &[u8]) -> Option<T> {
    let mut slice = data;
    T::try_deserialize(&mut slice).ok()
}

impl LocalChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_mode(&self, mode: SubmitMode) {
        self.state.lock().unwrap().mode = mode;
    }

    /// Batch reads containing this address fail at the transport level
    pub fn poison(&self, address: Pubkey) {
        self.state.lock().unwrap().poisoned.insert(address);
    }

    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions
    }

    pub fn dividends(&self) -> Vec<(Pubkey, u64)> {
        self.state.lock().unwrap().dividends.clone()
    }

    pub fn put<T: AccountSerialize>(&self, address: Pubkey, value: &T) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(address, encode(value));
    }

    pub fn put_raw(&self, address: Pubkey, data: Vec<u8>) {
        self.state.lock().unwrap().accounts.insert(address, data);
    }

    pub fn get<T: AccountDeserialize>(&self, address: &Pubkey) -> Option<T> {
        let state = self.state.lock().unwrap();
        state.accounts.get(address).and_then(|d| decode(d))
    }

    pub fn fundraiser(&self, reit_id: &ReitId) -> Option<Fundraiser> {
        self.get(&ReitAddresses::derive(reit_id).fundraiser)
    }

    pub fn investment(&self, address: &Pubkey) -> Option<Investment> {
        self.get(address)
    }

    /// Seed an investment directly, bypassing `invest`
    pub fn seed_investment(
        &self,
        reit_id: &ReitId,
        wallet: Pubkey,
        counter: u64,
        usdc_amount: u64,
        status: InvestmentStatus,
    ) -> Pubkey {
        let fundraiser = ReitAddresses::derive(reit_id).fundraiser;
        let (address, bump) = find_investment_address(&wallet, &fundraiser, counter);
        self.put(
            address,
            &Investment {
                investor: wallet,
                fundraiser,
                usdc_amount,
                reit_amount: 0,
                status,
                bump,
            },
        );
        address
    }

    /// Sign, "send" and execute according to the current mode
    pub fn process(
        &self,
        signer: Pubkey,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> std::result::Result<Signature, ChainError> {
        let mut signers: HashSet<Pubkey> = co_signers
            .iter()
            .map(|k| Pubkey::new_from_array(k.pubkey().to_bytes()))
            .collect();
        signers.insert(signer);
        for ix in instructions {
            for meta in ix.accounts.iter().filter(|m| m.is_signer) {
                if !signers.contains(&meta.pubkey) {
                    return Err(ChainError::Send(format!("missing signature for {}", meta.pubkey)));
                }
            }
        }

        let mut state = self.state.lock().unwrap();
        if let SubmitMode::Reject(reason) = &state.mode {
            return Err(ChainError::Send(reason.clone()));
        }
        let signature = Signature::new_unique();
        state.submissions += 1;

        let status = match state.mode.clone() {
            SubmitMode::Vanish => return Ok(signature),
            SubmitMode::Reject(_) => unreachable!("rejected before submission"),
            SubmitMode::Fail(reason) => SignatureStatus::failed(reason),
            SubmitMode::Land(commitment) => {
                let mut working = state.accounts.clone();
                let mut dividends = Vec::new();
                let outcome = instructions
                    .iter()
                    .try_for_each(|ix| execute(&mut working, &mut dividends, ix));
                match outcome {
                    Ok(()) => {
                        state.accounts = working;
                        state.dividends.extend(dividends);
                        SignatureStatus::settled(commitment)
                    }
                    Err(reason) => SignatureStatus::failed(reason),
                }
            }
        };

        for ix in instructions {
            for meta in ix.accounts.iter().filter(|m| m.is_writable) {
                state.latest_by_address.insert(
                    meta.pubkey,
                    SignatureInfo {
                        signature,
                        commitment: status.commitment,
                        err: status.err.clone(),
                        block_time: None,
                    },
                );
            }
        }
        state.statuses.insert(signature, status);
        Ok(signature)
    }
}

type Exec = std::result::Result<(), String>;

fn load<T: AccountDeserialize>(accounts: &HashMap<Pubkey, Vec<u8>>, address: &Pubkey) -> std::result::Result<T, String> {
    accounts
        .get(address)
        .and_then(|d| decode(d))
        .ok_or_else(|| format!("AccountNotInitialized: {address}"))
}

fn args<T: AnchorDeserialize>(ix: &Instruction) -> std::result::Result<T, String> {
    T::deserialize(&mut &ix.data[8..]).map_err(|e| format!("InstructionDidNotDeserialize: {e}"))
}

fn advance(
    accounts: &mut HashMap<Pubkey, Vec<u8>>,
    ix: &Instruction,
    admin_index: usize,
    fundraiser_index: usize,
    investment_index: usize,
    from: InvestmentStatus,
    to: InvestmentStatus,
) -> std::result::Result<Investment, String> {
    let admin = ix.accounts[admin_index].pubkey;
    let fundraiser: Fundraiser = load(accounts, &ix.accounts[fundraiser_index].pubkey)?;
    if fundraiser.admin != admin {
        return Err("InvalidAuthority".to_string());
    }
    let address = ix.accounts[investment_index].pubkey;
    let mut investment: Investment = load(accounts, &address)?;
    if investment.status != from {
        return Err("InvalidInvestmentStatus".to_string());
    }
    investment.status = to;
    accounts.insert(address, encode(&investment));
    Ok(investment)
}

fn execute(accounts: &mut HashMap<Pubkey, Vec<u8>>, dividends: &mut Vec<(Pubkey, u64)>, ix: &Instruction) -> Exec {
    if ix.program_id != reit_invest::ID {
        return Err("IncorrectProgramId".to_string());
    }
    let key = |i: usize| ix.accounts[i].pubkey;
    let disc = &ix.data[..8];

    if disc == InitializeFundraiserArgs::DISCRIMINATOR {
        let a: InitializeFundraiserArgs = args(ix)?;
        let reit = ReitAddresses::derive(&ReitId::from_seed_bytes(a.reit_id_hash));
        if key(0) != reit.fundraiser || key(2) != reit.escrow_vault {
            return Err("ConstraintSeeds".to_string());
        }
        if accounts.contains_key(&key(0)) {
            return Err("already in use".to_string());
        }
        accounts.insert(
            key(0),
            encode(&Fundraiser {
                admin: key(1),
                usdc_mint: key(3),
                reit_mint: Pubkey::default(),
                escrow_vault: key(2),
                total_raised: 0,
                released_amount: 0,
                bump: reit.fundraiser_bump,
                reit_accepted_currency: *b"CAD",
            }),
        );
        accounts.insert(key(2), vec![0; 165]);
    } else if disc == InitializeInvestorArgs::DISCRIMINATOR {
        if accounts.contains_key(&key(1)) {
            return Err("already in use".to_string());
        }
        accounts.insert(
            key(1),
            encode(&Investor {
                investor_pubkey: key(0),
                investment_counter: 0,
                bump: 255,
            }),
        );
    } else if disc == CloseInvestorArgs::DISCRIMINATOR {
        let _: Investor = load(accounts, &key(1))?;
        accounts.remove(&key(1));
    } else if disc == InvestArgs::DISCRIMINATOR {
        let a: InvestArgs = args(ix)?;
        if a.amount == 0 {
            return Err("InvalidAmount".to_string());
        }
        let wallet = key(0);
        let mut fundraiser: Fundraiser = load(accounts, &key(2))?;
        let mut investor: Investor = load(accounts, &key(1)).unwrap_or(Investor {
            investor_pubkey: wallet,
            investment_counter: 0,
            bump: 255,
        });
        let mut counter: InvestorFundraiser = load(accounts, &key(3)).unwrap_or(InvestorFundraiser {
            investor: wallet,
            fundraiser: key(2),
            investment_counter: 0,
            bump: 255,
        });
        let (expected, bump) = find_investment_address(&wallet, &key(2), counter.investment_counter);
        if key(4) != expected {
            return Err("ConstraintSeeds: investment".to_string());
        }
        if accounts.contains_key(&expected) {
            return Err("already in use".to_string());
        }
        accounts.insert(
            expected,
            encode(&Investment {
                investor: wallet,
                fundraiser: key(2),
                usdc_amount: a.amount,
                reit_amount: 0,
                status: InvestmentStatus::Pending,
                bump,
            }),
        );
        investor.investment_counter += 1;
        counter.investment_counter += 1;
        fundraiser.total_raised += a.amount;
        accounts.insert(key(1), encode(&investor));
        accounts.insert(key(3), encode(&counter));
        accounts.insert(key(2), encode(&fundraiser));
    } else if disc == ReleaseArgs::DISCRIMINATOR {
        let investment = advance(accounts, ix, 0, 1, 2, InvestmentStatus::Pending, InvestmentStatus::Released)?;
        let mut fundraiser: Fundraiser = load(accounts, &key(1))?;
        fundraiser.released_amount += investment.usdc_amount;
        accounts.insert(key(1), encode(&fundraiser));
    } else if disc == WireArgs::DISCRIMINATOR {
        advance(accounts, ix, 0, 1, 2, InvestmentStatus::Released, InvestmentStatus::Wired)?;
    } else if disc == RefundArgs::DISCRIMINATOR {
        advance(accounts, ix, 0, 1, 2, InvestmentStatus::Released, InvestmentStatus::Refunded)?;
    } else if disc == IssueShareArgs::DISCRIMINATOR {
        let fundraiser: Fundraiser = load(accounts, &key(1))?;
        if fundraiser.reit_mint != key(3) {
            return Err("InvalidMint".to_string());
        }
        let mut investment =
            advance(accounts, ix, 0, 1, 2, InvestmentStatus::Wired, InvestmentStatus::ShareIssued)?;
        investment.reit_amount = (investment.usdc_amount / SHARE_PRICE) as u32;
        accounts.insert(key(2), encode(&investment));
    } else if disc == IssueDividendArgs::DISCRIMINATOR {
        let a: IssueDividendArgs = args(ix)?;
        let investment: Investment = load(accounts, &key(1))?;
        if investment.status != InvestmentStatus::ShareIssued {
            return Err("InvalidInvestmentStatus".to_string());
        }
        let fundraiser: Fundraiser = load(accounts, &key(3))?;
        if fundraiser.admin != key(0) {
            return Err("InvalidAuthority".to_string());
        }
        dividends.push((key(2), a.amount));
    } else if disc == CreateReitMintArgs::DISCRIMINATOR {
        let a: CreateReitMintArgs = args(ix)?;
        let mut fundraiser: Fundraiser = load(accounts, &key(1))?;
        if fundraiser.admin != key(0) {
            return Err("InvalidAuthority".to_string());
        }
        fundraiser.reit_mint = key(2);
        accounts.insert(key(1), encode(&fundraiser));
        accounts.insert(key(2), vec![0; 82]);
        accounts.insert(key(7), a.metadata_uri.into_bytes());
    } else if disc == UpdateReitMintArgs::DISCRIMINATOR {
        let a: UpdateReitMintArgs = args(ix)?;
        let fundraiser: Fundraiser = load(accounts, &key(1))?;
        if fundraiser.admin != key(0) || fundraiser.reit_mint != key(2) {
            return Err("InvalidAuthority".to_string());
        }
        accounts.insert(key(5), a.metadata_uri.into_bytes());
    } else {
        return Err("InstructionFallbackNotFound".to_string());
    }
    Ok(())
}

impl ChainRpc for LocalChain {
    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> std::result::Result<Vec<Option<Vec<u8>>>, ChainError> {
        let state = self.state.lock().unwrap();
        if addresses.iter().any(|a| state.poisoned.contains(a)) {
            return Err(ChainError::Rpc("503 Service Unavailable".to_string()));
        }
        Ok(addresses
            .iter()
            .map(|a| state.accounts.get(a).cloned())
            .collect())
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> std::result::Result<Option<SignatureStatus>, ChainError> {
        Ok(self.state.lock().unwrap().statuses.get(signature).cloned())
    }

    async fn latest_signature_for_address(
        &self,
        address: &Pubkey,
    ) -> std::result::Result<Option<SignatureInfo>, ChainError> {
        Ok(self.state.lock().unwrap().latest_by_address.get(address).cloned())
    }
}

/// Wallet adapter bound to the local chain
pub struct LocalWallet {
    pubkey: Option<Pubkey>,
    chain: Arc<LocalChain>,
}

impl LocalWallet {
    pub fn new(chain: &Arc<LocalChain>) -> Self {
        Self {
            pubkey: Some(Pubkey::new_unique()),
            chain: chain.clone(),
        }
    }

    pub fn disconnected(chain: &Arc<LocalChain>) -> Self {
        Self {
            pubkey: None,
            chain: chain.clone(),
        }
    }

    pub fn key(&self) -> Pubkey {
        self.pubkey.unwrap()
    }
}

impl WalletSigner for LocalWallet {
    fn pubkey(&self) -> Option<Pubkey> {
        self.pubkey
    }

    async fn sign_and_send(
        &self,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> std::result::Result<Signature, ChainError> {
        let signer = self
            .pubkey
            .ok_or_else(|| ChainError::Send("wallet not connected".to_string()))?;
        self.chain.process(signer, instructions, co_signers)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// Captures notifications for assertions
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(Level, String, String)>>,
}

impl RecordingNotifier {
    pub fn levels(&self) -> Vec<Level> {
        self.events.lock().unwrap().iter().map(|(l, _, _)| l.clone()).collect()
    }

    pub fn last(&self) -> Option<(Level, String, String)> {
        self.events.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, title: &str, detail: &str) {
        self.events
            .lock()
            .unwrap()
            .push((Level::Success, title.to_string(), detail.to_string()));
    }

    fn warning(&self, title: &str, detail: &str) {
        self.events
            .lock()
            .unwrap()
            .push((Level::Warning, title.to_string(), detail.to_string()));
    }

    fn error(&self, title: &str, detail: &str) {
        self.events
            .lock()
            .unwrap()
            .push((Level::Error, title.to_string(), detail.to_string()));
    }
}

/// Ledger that, once armed, pauses the next `list_investments` after it has
/// read its rows, until released
pub struct GatedLedger {
    inner: Arc<InMemoryLedger>,
    armed: AtomicBool,
    entered: Notify,
    released: Notify,
}

impl GatedLedger {
    pub fn new(inner: Arc<InMemoryLedger>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Resolves once a gated read is parked
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

impl Ledger for GatedLedger {
    async fn list_reits(&self) -> std::result::Result<Vec<ReitRecord>, LedgerError> {
        self.inner.list_reits().await
    }

    async fn get_reit(&self, id: &ReitId) -> std::result::Result<Option<ReitRecord>, LedgerError> {
        self.inner.get_reit(id).await
    }

    async fn upsert_reit(&self, record: ReitRecord) -> std::result::Result<(), LedgerError> {
        self.inner.upsert_reit(record).await
    }

    async fn set_reit_mint(
        &self,
        id: &ReitId,
        mint: Pubkey,
        metadata_uri: Option<String>,
    ) -> std::result::Result<(), LedgerError> {
        self.inner.set_reit_mint(id, mint, metadata_uri).await
    }

    async fn set_reit_metadata_uri(
        &self,
        id: &ReitId,
        metadata_uri: String,
    ) -> std::result::Result<(), LedgerError> {
        self.inner.set_reit_metadata_uri(id, metadata_uri).await
    }

    async fn list_investments(
        &self,
        filter: &InvestmentFilter,
    ) -> std::result::Result<Vec<InvestmentRecord>, LedgerError> {
        let rows = self.inner.list_investments(filter).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.released.notified().await;
        }
        rows
    }

    async fn upsert_investment(&self, record: InvestmentRecord) -> std::result::Result<(), LedgerError> {
        self.inner.upsert_investment(record).await
    }

    async fn get_user(&self, user_id: &str) -> std::result::Result<Option<UserRecord>, LedgerError> {
        self.inner.get_user(user_id).await
    }

    async fn get_users(&self, user_ids: &[String]) -> std::result::Result<Vec<UserRecord>, LedgerError> {
        self.inner.get_users(user_ids).await
    }

    async fn set_investor_pda(
        &self,
        user_id: &str,
        investor_pda: Option<Pubkey>,
    ) -> std::result::Result<(), LedgerError> {
        self.inner.set_investor_pda(user_id, investor_pda).await
    }
}

pub type TestOrchestrator = Orchestrator<
    Arc<LocalChain>,
    Arc<InMemoryLedger>,
    Arc<InMemoryMetadataStore>,
    StaticConfig,
    Arc<RecordingNotifier>,
>;

pub struct Harness {
    pub chain: Arc<LocalChain>,
    pub ledger: Arc<InMemoryLedger>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub admin: LocalWallet,
    pub investor: LocalWallet,
    pub usdc_mint: Pubkey,
    pub reit_id: ReitId,
    pub orchestrator: TestOrchestrator,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_admin_config(true).await
    }

    /// `configured = false` leaves the admin wallet unset
    pub async fn with_admin_config(configured: bool) -> Self {
        let chain = LocalChain::new();
        let ledger = Arc::new(InMemoryLedger::new());
        let metadata = Arc::new(InMemoryMetadataStore::new("https://storage.test/reit-metadata"));
        let notifier = Arc::new(RecordingNotifier::default());
        let admin = LocalWallet::new(&chain);
        let investor = LocalWallet::new(&chain);
        let usdc_mint = Pubkey::new_unique();

        ledger
            .insert_user(UserRecord {
                user_id: ADMIN_USER.to_string(),
                role: Role::Admin,
                investor_pda: None,
                email: Some("admin@example.test".to_string()),
                name: Some("Admin".to_string()),
            })
            .await;
        ledger
            .insert_user(UserRecord {
                user_id: INVESTOR_USER.to_string(),
                role: Role::Investor,
                investor_pda: None,
                email: Some("ada@example.test".to_string()),
                name: Some("Ada Investor".to_string()),
            })
            .await;

        let config = StaticConfig {
            admin_wallet: configured.then(|| admin.key()),
            cluster: Cluster::Localnet,
            usdc_mint: Some(usdc_mint),
        };
        let orchestrator = Orchestrator::new(chain.clone(), ledger.clone(), metadata.clone(), config)
            .with_notifier(notifier.clone());

        Self {
            chain,
            ledger,
            metadata,
            notifier,
            admin,
            investor,
            usdc_mint,
            reit_id: ReitId::parse(REIT_ID).unwrap(),
            orchestrator,
        }
    }

    pub fn fundraiser_address(&self) -> Pubkey {
        ReitAddresses::derive(&self.reit_id).fundraiser
    }

    /// Admin opens the fundraiser for `reit_id`
    pub async fn open_fundraiser(&self) {
        self.orchestrator
            .initialize_fundraiser(
                &self.admin,
                reit_invest::orchestrator::NewFundraiser {
                    reit_id: self.reit_id,
                    reit_name: "Maple Residential REIT".to_string(),
                    usdc_mint: None,
                },
            )
            .await
            .unwrap();
    }

    /// Fundraiser plus REIT mint
    pub async fn open_fundraiser_with_mint(&self) -> Pubkey {
        self.open_fundraiser().await;
        self.orchestrator
            .create_mint(&self.admin, self.reit_id, sample_metadata())
            .await
            .unwrap()
            .mint
    }
}

pub fn sample_metadata() -> ReitMetadata {
    ReitMetadata::new(
        "Maple Residential",
        "MAPLE",
        "Purpose-built rentals in Ontario",
        SHARE_PRICE,
        "CAD",
    )
}
