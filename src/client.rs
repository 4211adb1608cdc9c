//! Signing and broadcasting.
//!
//! The submission loop only talks to [`InscriptionClient`]; [`EthersClient`]
//! is the production implementation on top of ethers-rs.

use crate::accounts::{self, Account, AccountError};
use crate::config::{Chain, RunConfig};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("cannot connect to RPC: {0}")]
    Connect(String),
    #[error("{0}")]
    Send(String),
}

/// One zero-value transaction carrying `data` from `account` to `to`.
#[derive(Debug, Clone)]
pub struct InscriptionRequest<'a> {
    pub account: &'a Account,
    pub to: Address,
    pub data: Bytes,
}

/// Capability to derive signing identities and submit inscription transactions.
#[async_trait]
pub trait InscriptionClient: Send + Sync {
    /// Derive an account from a private key or mnemonic
    fn derive_account(&self, secret: &str) -> Result<Account, AccountError> {
        accounts::derive_account(secret)
    }

    /// Sign and broadcast, returning the transaction hash once the RPC accepts it
    async fn send_inscription(&self, request: InscriptionRequest<'_>) -> Result<TxHash, ClientError>;
}

/// Build the unsigned transaction for an inscription. Gas, fees and nonce are
/// left for the signer middleware to fill.
pub fn build_inscription_tx(chain: &Chain, from: Address, to: Address, data: Bytes) -> TypedTransaction {
    if chain.supports_eip1559() {
        Eip1559TransactionRequest::new()
            .from(from)
            .to(to)
            .value(U256::zero())
            .data(data)
            .chain_id(chain.chain_id)
            .into()
    } else {
        TransactionRequest::new()
            .from(from)
            .to(to)
            .value(U256::zero())
            .data(data)
            .chain_id(chain.chain_id)
            .into()
    }
}

/// ethers-rs backed client bound to one chain and RPC endpoint
pub struct EthersClient {
    provider: Provider<Http>,
    chain: &'static Chain,
}

impl EthersClient {
    pub fn connect(config: &RunConfig) -> Result<Self, ClientError> {
        let provider = config
            .get_provider()
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        info!(
            "Inscription client bound to {} (chain_id={}) via {}",
            config.chain.label, config.chain.chain_id, config.rpc_url
        );
        Ok(Self {
            provider: provider.as_ref().clone(),
            chain: config.chain,
        })
    }

    pub fn chain(&self) -> &'static Chain {
        self.chain
    }
}

#[async_trait]
impl InscriptionClient for EthersClient {
    async fn send_inscription(&self, request: InscriptionRequest<'_>) -> Result<TxHash, ClientError> {
        let from = request.account.address();
        let wallet = request.account.wallet().clone().with_chain_id(self.chain.chain_id);
        let signer = SignerMiddleware::new(self.provider.clone(), wallet);

        let tx = build_inscription_tx(self.chain, from, request.to, request.data);
        debug!("Sending inscription from {:?} to {:?}", from, request.to);

        let pending = signer
            .send_transaction(tx, None)
            .await
            .map_err(|e| ClientError::Send(e.to_string()))?;
        Ok(pending.tx_hash())
    }
}

/// What an RPC endpoint reports about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcProbe {
    pub chain_id: u64,
    pub block_number: u64,
    pub latency_ms: u64,
}

impl RpcProbe {
    /// True when the endpoint serves the chain the user selected
    pub fn matches(&self, chain: &Chain) -> bool {
        self.chain_id == chain.chain_id
    }
}

/// Query chain id and head block from the configured endpoint
pub async fn probe_rpc(config: &RunConfig) -> Result<RpcProbe> {
    let provider = config.get_provider()?;
    let start = Instant::now();
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| anyhow!("eth_chainId failed: {}", e))?;
    let block_number = provider
        .get_block_number()
        .await
        .map_err(|e| anyhow!("eth_blockNumber failed: {}", e))?;
    Ok(RpcProbe {
        chain_id: chain_id.as_u64(),
        block_number: block_number.as_u64(),
        latency_ms: start.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::accounts::tests::KEY_0;
    use crate::config::{default_chain, find_chain_by_key};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Test double: answers every submission the same way, optionally after a delay.
    pub(crate) struct MockClient {
        reject_with: Option<String>,
        delay: Option<Duration>,
        pub(crate) calls: AtomicUsize,
        pub(crate) requests: Mutex<Vec<(Address, Address, Bytes)>>,
    }

    impl MockClient {
        pub(crate) fn accepting() -> Self {
            Self {
                reject_with: None,
                delay: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn rejecting(message: &str) -> Self {
            Self {
                reject_with: Some(message.to_string()),
                ..Self::accepting()
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InscriptionClient for MockClient {
        async fn send_inscription(&self, request: InscriptionRequest<'_>) -> Result<TxHash, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((request.account.address(), request.to, request.data.clone()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.reject_with {
                Some(msg) => Err(ClientError::Send(msg.clone())),
                None => Ok(TxHash::from_low_u64_be(n as u64 + 1)),
            }
        }
    }

    // ==================== build_inscription_tx tests ====================

    #[test]
    fn test_build_tx_eip1559_chain() {
        let from = Address::repeat_byte(1);
        let to = Address::repeat_byte(2);
        let tx = build_inscription_tx(default_chain(), from, to, Bytes::from(b"hi".to_vec()));
        assert!(matches!(tx, TypedTransaction::Eip1559(_)));
        assert_eq!(tx.from(), Some(&from));
        assert_eq!(tx.to_addr(), Some(&to));
        assert_eq!(tx.value(), Some(&U256::zero()));
        assert_eq!(tx.data().map(|d| d.to_vec()), Some(b"hi".to_vec()));
        assert_eq!(tx.chain_id(), Some(U64::from(1)));
    }

    #[test]
    fn test_build_tx_legacy_chain() {
        let bsc = find_chain_by_key("bsc").unwrap();
        let tx = build_inscription_tx(bsc, Address::zero(), Address::zero(), Bytes::default());
        assert!(matches!(tx, TypedTransaction::Legacy(_)));
        assert_eq!(tx.chain_id(), Some(U64::from(56)));
    }

    // ==================== client tests ====================

    #[test]
    fn test_default_derive_account() {
        let client = MockClient::accepting();
        assert!(client.derive_account(KEY_0).is_ok());
        assert!(client.derive_account("nope").is_err());
    }

    #[test]
    fn test_ethers_client_connect_bad_url() {
        let config = RunConfig::new(default_chain(), Some("::::"), 1000);
        let err = EthersClient::connect(&config).err().unwrap();
        assert!(matches!(err, ClientError::Connect(_)));
    }

    #[test]
    fn test_ethers_client_connect() {
        let config = RunConfig::new(default_chain(), Some("http://127.0.0.1:8545"), 1000);
        let client = EthersClient::connect(&config).unwrap();
        assert_eq!(client.chain().key, "eth");
    }

    #[tokio::test]
    async fn test_mock_client_rejects() {
        let account = crate::accounts::derive_account(KEY_0).unwrap();
        let client = MockClient::rejecting("X");
        let request = InscriptionRequest {
            account: &account,
            to: account.address(),
            data: Bytes::default(),
        };
        let err = client.send_inscription(request).await.unwrap_err();
        assert_eq!(err.to_string(), "X");
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_rpc_probe_matches() {
        let probe = RpcProbe {
            chain_id: 56,
            block_number: 1,
            latency_ms: 10,
        };
        assert!(probe.matches(find_chain_by_key("bsc").unwrap()));
        assert!(!probe.matches(default_chain()));
    }
}
