//! In-memory network double for session level tests

use super::{Account, Deployment, Network};
use crate::error::NetworkError;
use async_trait::async_trait;
use ethers::types::{Address, Bytes, TxHash, U256};
use std::sync::Mutex;

/// Records every request and answers from canned data
#[derive(Default)]
pub(crate) struct MockNetwork {
    pub accounts: Vec<Account>,
    /// Returned by every `call`
    pub call_output: Bytes,
    /// When set, `deploy` fails with this revert
    pub fail_deploy: bool,
    pub state: Mutex<MockState>,
}

#[derive(Default)]
pub(crate) struct MockState {
    pub deployed_code: Vec<Bytes>,
    pub calls: Vec<(Address, Address, Bytes)>,
    pub transactions: Vec<(Address, Address, Bytes, U256)>,
}

pub(crate) const CONTRACT_ADDRESS: Address = Address::repeat_byte(0xcc);

impl MockNetwork {
    pub fn with_accounts(count: u8) -> Self {
        Self {
            accounts: (1..=count)
                .map(|i| Account {
                    address: Address::repeat_byte(i),
                    balance: U256::exp10(22),
                })
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Network for MockNetwork {
    fn name(&self) -> &str {
        "mock"
    }

    async fn accounts(&self) -> Result<Vec<Account>, NetworkError> {
        Ok(self.accounts.clone())
    }

    async fn balance(&self, address: Address) -> Result<U256, NetworkError> {
        let state = self.state.lock().unwrap();
        let received = state
            .transactions
            .iter()
            .filter(|(_, to, _, _)| *to == address)
            .fold(U256::zero(), |acc, (_, _, _, value)| acc + *value);
        Ok(received)
    }

    async fn deploy(
        &self,
        _from: Address,
        creation_code: Bytes,
    ) -> Result<Deployment, NetworkError> {
        if self.fail_deploy {
            return Err(NetworkError::Reverted("0xdead".to_string()));
        }
        self.state.lock().unwrap().deployed_code.push(creation_code);
        Ok(Deployment {
            tx_hash: TxHash::repeat_byte(0x11),
            address: CONTRACT_ADDRESS,
        })
    }

    async fn call(&self, from: Address, to: Address, data: Bytes) -> Result<Bytes, NetworkError> {
        self.state.lock().unwrap().calls.push((from, to, data));
        Ok(self.call_output.clone())
    }

    async fn transact(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<TxHash, NetworkError> {
        self.state
            .lock()
            .unwrap()
            .transactions
            .push((from, to, data, value));
        Ok(TxHash::repeat_byte(0x22))
    }
}
