//! In-memory chain doubles for tests and offline runs.

use super::contracts::decode_collect_fees_target;
use super::{ChainError, ChainReader, PoolStateRecord, Receipt, Signer, VestingTotals};
use crate::domain::{Address, Amount, PoolId, TxHash};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Chain reader that serves predefined state.
#[derive(Debug, Default)]
pub struct MockChainReader {
    vesting: HashMap<Address, Result<VestingTotals, ChainError>>,
    pools: HashMap<Address, Result<PoolStateRecord, ChainError>>,
    calls: AtomicUsize,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vesting totals returned for `token`, whatever account is asked for.
    pub fn with_vesting(mut self, token: Address, total: u128, released: u128) -> Self {
        let totals = VestingTotals {
            total: Amount::from_raw(total).unwrap_or_default(),
            released: Amount::from_raw(released).unwrap_or_default(),
        };
        self.vesting.insert(token, Ok(totals));
        self
    }

    pub fn with_vesting_error(mut self, token: Address, err: ChainError) -> Self {
        self.vesting.insert(token, Err(err));
        self
    }

    pub fn with_pool(mut self, asset: Address, record: PoolStateRecord) -> Self {
        self.pools.insert(asset, Ok(record));
        self
    }

    pub fn with_pool_error(mut self, asset: Address, err: ChainError) -> Self {
        self.pools.insert(asset, Err(err));
        self
    }

    /// Total read calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn vesting_data(
        &self,
        token: &Address,
        _account: &Address,
    ) -> Result<VestingTotals, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vesting.get(token).cloned().unwrap_or_else(|| {
            Err(ChainError::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            })
        })
    }

    async fn pool_state(&self, asset: &Address) -> Result<PoolStateRecord, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pools.get(asset).cloned().unwrap_or_else(|| {
            Err(ChainError::Rpc {
                code: 3,
                message: "execution reverted".to_string(),
            })
        })
    }
}

/// Scripted failure for a claim targeting one pool.
#[derive(Debug, Clone)]
pub enum SignerFailure {
    Submit(ChainError),
    Receipt(ChainError),
    Revert,
}

/// A transaction handed to [`MockSigner::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTx {
    pub to: Address,
    pub data: Vec<u8>,
    pub value: u128,
    pub tx_hash: TxHash,
}

/// Signer that records submissions and confirms them at increasing blocks.
#[derive(Debug)]
pub struct MockSigner {
    account: Address,
    failures: HashMap<PoolId, SignerFailure>,
    submitted: Mutex<Vec<SubmittedTx>>,
    next_block: AtomicUsize,
    receipt_delay: Duration,
}

impl MockSigner {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            failures: HashMap::new(),
            submitted: Mutex::new(Vec::new()),
            next_block: AtomicUsize::new(100),
            receipt_delay: Duration::ZERO,
        }
    }

    /// Hold every receipt back for `delay`, like a slow block time.
    pub fn with_receipt_delay(mut self, delay: Duration) -> Self {
        self.receipt_delay = delay;
        self
    }

    pub fn failing_for(mut self, pool_id: PoolId, failure: SignerFailure) -> Self {
        self.failures.insert(pool_id, failure);
        self
    }

    pub fn submissions(&self) -> Vec<SubmittedTx> {
        self.submitted
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn failure_for_tx(&self, tx_hash: &TxHash) -> Option<SignerFailure> {
        let submitted = self.submitted.lock().ok()?;
        let tx = submitted.iter().find(|t| &t.tx_hash == tx_hash)?;
        let pool_id = decode_collect_fees_target(&tx.data)?;
        self.failures.get(&pool_id).cloned()
    }
}

#[async_trait]
impl Signer for MockSigner {
    fn account(&self) -> &Address {
        &self.account
    }

    async fn submit(
        &self,
        to: &Address,
        data: Vec<u8>,
        value: u128,
    ) -> Result<TxHash, ChainError> {
        if let Some(SignerFailure::Submit(err)) =
            decode_collect_fees_target(&data).and_then(|id| self.failures.get(&id))
        {
            return Err(err.clone());
        }
        let mut submitted = self
            .submitted
            .lock()
            .map_err(|_| ChainError::Network("mock signer poisoned".to_string()))?;
        let tx_hash = TxHash::new(format!("0x{:064x}", submitted.len() + 1));
        submitted.push(SubmittedTx {
            to: to.clone(),
            data,
            value,
            tx_hash: tx_hash.clone(),
        });
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError> {
        if !self.receipt_delay.is_zero() {
            tokio::time::sleep(self.receipt_delay).await;
        }
        let block_number = self.next_block.fetch_add(1, Ordering::SeqCst) as u64;
        match self.failure_for_tx(tx_hash) {
            Some(SignerFailure::Receipt(err)) => Err(err),
            Some(SignerFailure::Revert) => Ok(Receipt {
                block_number,
                success: false,
            }),
            _ => Ok(Receipt {
                block_number,
                success: true,
            }),
        }
    }
}
