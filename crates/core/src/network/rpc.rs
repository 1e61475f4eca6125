//! JSON-RPC network backed by `ethers` providers

use super::{Account, Deployment, Network};
use crate::{config::NetworkConfig, error::NetworkError};
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, PendingTransaction, Provider},
    types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash, U256, U64},
    utils::{Anvil, AnvilInstance},
};
use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    path::Path,
    process::{Command, Stdio},
    time::Duration,
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const ANVIL_BINARY: &str = "anvil";

/// Node reached over HTTP, using the node's unlocked accounts
pub struct RpcNetwork {
    name: String,
    provider: Provider<Http>,
    /// Keeps a spawned node alive for as long as the session runs
    _node: Option<AnvilInstance>,
}

impl RpcNetwork {
    /// Connects to `rpc_url` when configured, otherwise spawns a local anvil
    pub fn connect(config: &NetworkConfig) -> Result<Self, NetworkError> {
        match &config.rpc_url {
            Some(url) => {
                tracing::info!("Connecting to {} at {}", config.name, url);
                Ok(Self {
                    name: config.name.clone(),
                    provider: provider(url)?,
                    _node: None,
                })
            }
            None => Self::spawn_local(&config.name, config.chain_id),
        }
    }

    /// Spawns an anvil node with funded, unlocked accounts
    pub fn spawn_local(name: &str, chain_id: u64) -> Result<Self, NetworkError> {
        Self::spawn_with(Path::new(ANVIL_BINARY), name, chain_id)
    }

    fn spawn_with(binary: &Path, name: &str, chain_id: u64) -> Result<Self, NetworkError> {
        check_binary(binary)?;

        // `Anvil::spawn` panics when the node does not come up
        let anvil = Anvil::at(binary).chain_id(chain_id);
        let node = panic::catch_unwind(AssertUnwindSafe(move || anvil.spawn()))
            .map_err(|payload| NetworkError::Node(panic_message(payload.as_ref())))?;
        tracing::info!("Spawned local node at {}", node.endpoint());

        Ok(Self {
            name: name.to_string(),
            provider: provider(&node.endpoint())?,
            _node: Some(node),
        })
    }

    pub fn endpoint(&self) -> String {
        self.provider.url().to_string()
    }

    async fn confirm(
        &self,
        pending: PendingTransaction<'_, Http>,
    ) -> Result<TransactionReceipt, NetworkError> {
        let tx_hash = format!("{:?}", pending.tx_hash());
        let receipt = pending
            .await
            .map_err(provider_error)?
            .ok_or_else(|| NetworkError::Dropped(tx_hash.clone()))?;

        if receipt.status == Some(U64::zero()) {
            return Err(NetworkError::Reverted(tx_hash));
        }
        Ok(receipt)
    }
}

/// Confirms the node binary runs before handing it to `Anvil`
fn check_binary(binary: &Path) -> Result<(), NetworkError> {
    let status = Command::new(binary)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => NetworkError::Node(format!(
                "{} was not found. Install Foundry (https://getfoundry.sh) to use the playground.",
                binary.display()
            )),
            _ => NetworkError::Node(format!("cannot run {}: {e}", binary.display())),
        })?;

    if !status.success() {
        return Err(NetworkError::Node(format!(
            "{} --version exited with {status}",
            binary.display()
        )));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "node did not start".to_string())
}

fn provider(url: &str) -> Result<Provider<Http>, NetworkError> {
    Provider::<Http>::try_from(url)
        .map(|p| p.interval(POLL_INTERVAL))
        .map_err(|e| NetworkError::Provider(format!("invalid RPC URL '{url}': {e}")))
}

fn provider_error(e: impl std::fmt::Display) -> NetworkError {
    NetworkError::Provider(e.to_string())
}

#[async_trait]
impl Network for RpcNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    async fn accounts(&self) -> Result<Vec<Account>, NetworkError> {
        let addresses = self.provider.get_accounts().await.map_err(provider_error)?;

        let mut accounts = Vec::with_capacity(addresses.len());
        for address in addresses {
            let balance = self.balance(address).await?;
            accounts.push(Account { address, balance });
        }
        Ok(accounts)
    }

    async fn balance(&self, address: Address) -> Result<U256, NetworkError> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(provider_error)
    }

    async fn deploy(
        &self,
        from: Address,
        creation_code: Bytes,
    ) -> Result<Deployment, NetworkError> {
        let tx = TransactionRequest::new().from(from).data(creation_code);
        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(provider_error)?;
        let tx_hash = pending.tx_hash();

        let receipt = self.confirm(pending).await?;
        let address = receipt
            .contract_address
            .ok_or_else(|| NetworkError::MissingAddress(format!("{tx_hash:?}")))?;

        tracing::debug!("Creation tx {:?} mined in block {:?}", tx_hash, receipt.block_number);
        Ok(Deployment { tx_hash, address })
    }

    async fn call(&self, from: Address, to: Address, data: Bytes) -> Result<Bytes, NetworkError> {
        let tx = TransactionRequest::new().from(from).to(to).data(data);
        self.provider
            .call(&tx.into(), None)
            .await
            .map_err(provider_error)
    }

    async fn transact(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TxHash, NetworkError> {
        let tx = TransactionRequest::new()
            .from(from)
            .to(to)
            .data(data)
            .value(value);
        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(provider_error)?;
        let tx_hash = pending.tx_hash();

        self.confirm(pending).await?;
        Ok(tx_hash)
    }
}
