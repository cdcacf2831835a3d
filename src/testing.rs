//! In-memory stand-ins for the injected capabilities.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc,
    },
};

use alloy_primitives::{Address, LogData, U256};
use alloy_sol_types::SolEvent;
use parking_lot::Mutex;

use crate::{
    automation::{AutomationRegistrar, FundingToken, UpkeepRequest},
    host::Host,
    ledger::{AssetLedger, LedgerDeployer},
};

pub(crate) type TransferHook = Arc<dyn Fn(Address, U256) -> Result<(), Vec<u8>> + Send + Sync>;

/// Records logs and native balances; recipients can be made to reject value.
#[derive(Default)]
pub(crate) struct MockHost {
    logs: Mutex<Vec<(Address, LogData)>>,
    balances: Mutex<HashMap<Address, U256>>,
    rejecting: Mutex<HashSet<Address>>,
    hook: Mutex<Option<TransferHook>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reject(&self, recipient: Address) {
        self.rejecting.lock().insert(recipient);
    }

    pub fn accept(&self, recipient: Address) {
        self.rejecting.lock().remove(&recipient);
    }

    /// Runs `hook` as the recipient's code on every value transfer, before the
    /// value is credited. An `Err` from the hook rejects the transfer.
    pub fn on_transfer(
        &self,
        hook: impl Fn(Address, U256) -> Result<(), Vec<u8>> + Send + Sync + 'static,
    ) {
        *self.hook.lock() = Some(Arc::new(hook));
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.balances.lock().get(&account).copied().unwrap_or_default()
    }

    /// Decoded logs of type `E`, in emission order.
    pub fn events<E: SolEvent>(&self) -> Vec<E> {
        self.logs
            .lock()
            .iter()
            .filter(|(_, log)| log.topics().first() == Some(&E::SIGNATURE_HASH))
            .map(|(_, log)| E::decode_log_data(log, true).unwrap())
            .collect()
    }

    pub fn count<E: SolEvent>(&self) -> usize {
        self.events::<E>().len()
    }
}

impl Host for MockHost {
    fn transfer_value(&self, _from: Address, to: Address, amount: U256) -> Result<(), Vec<u8>> {
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(to, amount)?;
        }
        if self.rejecting.lock().contains(&to) {
            return Err(b"recipient rejected value".to_vec());
        }
        *self.balances.lock().entry(to).or_default() += amount;
        Ok(())
    }

    fn emit_log(&self, emitter: Address, log: LogData) {
        self.logs.lock().push((emitter, log));
    }
}

/// A token whose every call comes from its owner.
pub(crate) struct MockLedger {
    address: Address,
    owner: Address,
    balances: Mutex<HashMap<Address, U256>>,
    total_supply: Mutex<U256>,
    burned: Mutex<U256>,
    rejecting: Mutex<HashSet<Address>>,
    fail_mints: AtomicBool,
    fail_burns: AtomicBool,
}

impl MockLedger {
    pub fn new(address: Address, owner: Address) -> Arc<Self> {
        Arc::new(Self {
            address,
            owner,
            balances: Mutex::default(),
            total_supply: Mutex::default(),
            burned: Mutex::default(),
            rejecting: Mutex::default(),
            fail_mints: AtomicBool::new(false),
            fail_burns: AtomicBool::new(false),
        })
    }

    pub fn reject(&self, recipient: Address) {
        self.rejecting.lock().insert(recipient);
    }

    pub fn accept(&self, recipient: Address) {
        self.rejecting.lock().remove(&recipient);
    }

    pub fn fail_mints(&self, fail: bool) {
        self.fail_mints.store(fail, Ordering::Relaxed);
    }

    pub fn fail_burns(&self, fail: bool) {
        self.fail_burns.store(fail, Ordering::Relaxed);
    }

    pub fn burned(&self) -> U256 {
        *self.burned.lock()
    }
}

impl AssetLedger for MockLedger {
    fn address(&self) -> Address {
        self.address
    }

    fn mint(&self, to: Address, amount: U256) -> Result<(), Vec<u8>> {
        if self.fail_mints.load(Ordering::Relaxed) {
            return Err(b"mint disabled".to_vec());
        }
        *self.balances.lock().entry(to).or_default() += amount;
        *self.total_supply.lock() += amount;
        Ok(())
    }

    fn burn(&self, amount: U256) -> Result<(), Vec<u8>> {
        if self.fail_burns.load(Ordering::Relaxed) {
            return Err(b"burn disabled".to_vec());
        }
        let mut balances = self.balances.lock();
        let balance = balances.entry(self.owner).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or_else(|| b"burn exceeds balance".to_vec())?;
        *self.total_supply.lock() -= amount;
        *self.burned.lock() += amount;
        Ok(())
    }

    fn transfer(&self, to: Address, amount: U256) -> Result<(), Vec<u8>> {
        if self.rejecting.lock().contains(&to) {
            return Err(b"recipient rejected tokens".to_vec());
        }
        let mut balances = self.balances.lock();
        let balance = balances.entry(self.owner).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or_else(|| b"transfer exceeds balance".to_vec())?;
        *balances.entry(to).or_default() += amount;
        Ok(())
    }

    fn balance_of(&self, owner: Address) -> U256 {
        self.balances.lock().get(&owner).copied().unwrap_or_default()
    }

    fn total_supply(&self) -> U256 {
        *self.total_supply.lock()
    }
}

#[derive(Default)]
pub(crate) struct MockDeployer {
    ledgers: Mutex<Vec<(String, Arc<MockLedger>)>>,
    next: AtomicU8,
    fail: AtomicBool,
    fail_mints: AtomicBool,
}

impl MockDeployer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    /// Ledgers deployed from now on reject every mint.
    pub fn fail_mints(&self, fail: bool) {
        self.fail_mints.store(fail, Ordering::Relaxed);
    }

    pub fn deployed(&self) -> usize {
        self.ledgers.lock().len()
    }

    /// The most recent ledger deployed under `symbol`.
    pub fn ledger(&self, symbol: &str) -> Arc<MockLedger> {
        self.ledgers
            .lock()
            .iter()
            .rev()
            .find(|(deployed, _)| deployed == symbol)
            .map(|(_, ledger)| ledger.clone())
            .unwrap()
    }
}

impl LedgerDeployer for MockDeployer {
    fn deploy(
        &self,
        _name: &str,
        symbol: &str,
        owner: Address,
    ) -> Result<Arc<dyn AssetLedger>, Vec<u8>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(b"deployment reverted".to_vec());
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let address = Address::with_last_byte(index);
        let ledger = MockLedger::new(address, owner);
        ledger.fail_mints(self.fail_mints.load(Ordering::Relaxed));
        self.ledgers.lock().push((symbol.to_owned(), ledger.clone()));
        Ok(ledger)
    }
}

#[derive(Default)]
pub(crate) struct MockFundingToken {
    balances: Mutex<HashMap<Address, U256>>,
    allowances: Mutex<HashMap<(Address, Address), U256>>,
    fail_transfers: AtomicBool,
}

impl MockFundingToken {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mint(&self, to: Address, amount: U256) {
        *self.balances.lock().entry(to).or_default() += amount;
    }

    /// Rejects plain transfers; `transfer_from` keeps working.
    pub fn fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::Relaxed);
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .lock()
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn debit(&self, from: Address, amount: U256) -> Result<(), Vec<u8>> {
        let mut balances = self.balances.lock();
        let balance = balances.entry(from).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or_else(|| b"insufficient balance".to_vec())?;
        Ok(())
    }
}

impl FundingToken for MockFundingToken {
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Vec<u8>> {
        {
            let mut allowances = self.allowances.lock();
            let allowance = allowances.entry((from, spender)).or_default();
            *allowance = allowance
                .checked_sub(amount)
                .ok_or_else(|| b"insufficient allowance".to_vec())?;
        }
        if let Err(err) = self.debit(from, amount) {
            *self.allowances.lock().entry((from, spender)).or_default() += amount;
            return Err(err);
        }
        *self.balances.lock().entry(to).or_default() += amount;
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: U256) -> Result<(), Vec<u8>> {
        if self.fail_transfers.load(Ordering::Relaxed) {
            return Err(b"transfers frozen".to_vec());
        }
        self.debit(from, amount)?;
        *self.balances.lock().entry(to).or_default() += amount;
        Ok(())
    }

    fn approve(&self, owner: Address, spender: Address, amount: U256) -> Result<(), Vec<u8>> {
        self.allowances.lock().insert((owner, spender), amount);
        Ok(())
    }

    fn balance_of(&self, owner: Address) -> U256 {
        self.balances.lock().get(&owner).copied().unwrap_or_default()
    }
}

/// Pulls funding from the caller's allowance, like the on-chain registrar.
pub(crate) struct MockRegistrar {
    address: Address,
    token: Arc<MockFundingToken>,
    registrations: Mutex<Vec<UpkeepRequest>>,
    budgets: Mutex<HashMap<U256, U256>>,
    cancelled: Mutex<Vec<U256>>,
    fail: AtomicBool,
}

impl MockRegistrar {
    pub fn new(address: Address, token: Arc<MockFundingToken>) -> Arc<Self> {
        Arc::new(Self {
            address,
            token,
            registrations: Mutex::default(),
            budgets: Mutex::default(),
            cancelled: Mutex::default(),
            fail: AtomicBool::new(false),
        })
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn registrations(&self) -> Vec<UpkeepRequest> {
        self.registrations.lock().clone()
    }

    pub fn cancelled(&self) -> Vec<U256> {
        self.cancelled.lock().clone()
    }

    pub fn budget(&self, upkeep_id: U256) -> U256 {
        self.budgets
            .lock()
            .get(&upkeep_id)
            .copied()
            .unwrap_or_default()
    }
}

impl AutomationRegistrar for MockRegistrar {
    fn address(&self) -> Address {
        self.address
    }

    fn register_upkeep(&self, caller: Address, request: &UpkeepRequest) -> Result<U256, Vec<u8>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(b"registration closed".to_vec());
        }
        self.token
            .transfer_from(self.address, caller, self.address, request.amount)?;
        let mut registrations = self.registrations.lock();
        registrations.push(request.clone());
        let upkeep_id = U256::from(registrations.len());
        self.budgets.lock().insert(upkeep_id, request.amount);
        Ok(upkeep_id)
    }

    fn add_funds(&self, caller: Address, upkeep_id: U256, amount: U256) -> Result<(), Vec<u8>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(b"registration closed".to_vec());
        }
        let mut budgets = self.budgets.lock();
        let budget = budgets
            .get_mut(&upkeep_id)
            .ok_or_else(|| b"unknown upkeep".to_vec())?;
        self.token
            .transfer_from(self.address, caller, self.address, amount)?;
        *budget += amount;
        Ok(())
    }

    fn cancel_upkeep(&self, caller: Address, upkeep_id: U256) -> Result<U256, Vec<u8>> {
        let budget = self
            .budgets
            .lock()
            .remove(&upkeep_id)
            .ok_or_else(|| b"unknown upkeep".to_vec())?;
        self.token.transfer(self.address, caller, budget)?;
        self.cancelled.lock().push(upkeep_id);
        Ok(budget)
    }
}
