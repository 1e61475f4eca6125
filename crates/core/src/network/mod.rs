//! Test network boundary
//!
//! Everything the playground does on chain goes through the [`Network`]
//! trait. [`RpcNetwork`] talks JSON-RPC to a node with unlocked accounts,
//! either one it spawned itself or one given by URL.

use crate::error::NetworkError;
use async_trait::async_trait;
use ethers::{
    types::{Address, Bytes, TxHash, U256},
    utils::format_ether,
};

mod rpc;

#[cfg(test)]
pub(crate) mod mock;

pub use rpc::RpcNetwork;

/// A funded account of the test network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub balance: U256,
}

impl Account {
    /// Balance in ether, for display
    pub fn balance_ether(&self) -> String {
        format_ether(self.balance)
    }
}

/// Outcome of a confirmed contract creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub tx_hash: TxHash,
    pub address: Address,
}

/// Operations the playground needs from a node
#[async_trait]
pub trait Network: Send + Sync {
    /// Display name of the network
    fn name(&self) -> &str;

    /// Unlocked accounts with their current balances
    async fn accounts(&self) -> Result<Vec<Account>, NetworkError>;

    async fn balance(&self, address: Address) -> Result<U256, NetworkError>;

    /// Sends a creation transaction and waits for its receipt
    async fn deploy(&self, from: Address, creation_code: Bytes)
        -> Result<Deployment, NetworkError>;

    /// Executes a call without creating a transaction
    async fn call(&self, from: Address, to: Address, data: Bytes) -> Result<Bytes, NetworkError>;

    /// Sends a transaction and waits until it is mined
    async fn transact(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TxHash, NetworkError>;
}
