use anyhow::{anyhow, Result};
use ethers::providers::{Http, Provider};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default tick interval when neither settings nor environment say otherwise.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Environment variable that overrides [`DEFAULT_INTERVAL_MS`].
pub const INTERVAL_ENV_VAR: &str = "INSCRIBER_INTERVAL_MS";

/// Upper bound on ticks allowed in flight at once.
pub const MAX_IN_FLIGHT_TICKS: usize = 8;

/// Clamp an overlap cap into `1..=MAX_IN_FLIGHT_TICKS`.
pub fn clamp_in_flight_ticks(max: usize) -> usize {
    max.clamp(1, MAX_IN_FLIGHT_TICKS)
}

/// A supported EVM chain: short key, display label, chain ID, native token,
/// default RPC and block explorer base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chain {
    pub key: &'static str,
    pub label: &'static str,
    pub chain_id: u64,
    pub native_token: &'static str,
    pub default_rpc: &'static str,
    pub explorer_url: &'static str,
}

impl Chain {
    pub const fn new(
        key: &'static str,
        label: &'static str,
        chain_id: u64,
        native_token: &'static str,
        default_rpc: &'static str,
        explorer_url: &'static str,
    ) -> Self {
        Self {
            key,
            label,
            chain_id,
            native_token,
            default_rpc,
            explorer_url,
        }
    }

    /// Full URL to view a transaction on this chain's explorer
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }

    /// Full URL to view an address on this chain's explorer
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url, address)
    }

    pub fn supports_eip1559(&self) -> bool {
        chain_supports_eip1559(self.chain_id)
    }
}

/// The chains an inscription run can target.
pub const CHAINS: &[Chain] = &[
    Chain::new("eth", "Ethereum", 1, "ETH", "https://ethereum-rpc.publicnode.com", "https://etherscan.io"),
    Chain::new("bsc", "BNB Smart Chain", 56, "BNB", "https://bsc-dataseed.binance.org", "https://bscscan.com"),
    Chain::new("polygon", "Polygon", 137, "POL", "https://polygon-rpc.com", "https://polygonscan.com"),
    Chain::new("avalanche", "Avalanche", 43114, "AVAX", "https://api.avax.network/ext/bc/C/rpc", "https://snowtrace.io"),
    Chain::new("base", "Base", 8453, "ETH", "https://mainnet.base.org", "https://basescan.org"),
    Chain::new("arbitrum", "Arbitrum One", 42161, "ETH", "https://arb1.arbitrum.io/rpc", "https://arbiscan.io"),
    Chain::new("zksync", "zkSync Era", 324, "ETH", "https://mainnet.era.zksync.io", "https://explorer.zksync.io"),
    Chain::new("linea", "Linea", 59144, "ETH", "https://rpc.linea.build", "https://lineascan.build"),
    Chain::new("okc", "OKC", 66, "OKT", "https://exchainrpc.okex.org", "https://www.oklink.com/okc"),
    Chain::new("fantom", "Fantom", 250, "FTM", "https://rpc.ankr.com/fantom", "https://ftmscan.com"),
    Chain::new("opbnb", "opBNB", 204, "BNB", "https://opbnb-mainnet-rpc.bnbchain.org", "https://opbnb.bscscan.com"),
    Chain::new("celo", "Celo", 42220, "CELO", "https://forno.celo.org", "https://celoscan.io"),
];

/// The chain selected when nothing else is configured
pub fn default_chain() -> &'static Chain {
    &CHAINS[0]
}

/// Find a chain by its short key (e.g. "bsc")
pub fn find_chain_by_key(key: &str) -> Option<&'static Chain> {
    CHAINS.iter().find(|c| c.key.eq_ignore_ascii_case(key))
}

/// Find a chain by chain ID
pub fn find_chain_by_chain_id(chain_id: u64) -> Option<&'static Chain> {
    CHAINS.iter().find(|c| c.chain_id == chain_id)
}

/// Find the index of a chain in CHAINS by key
pub fn find_chain_index(key: &str) -> Option<usize> {
    CHAINS.iter().position(|c| c.key.eq_ignore_ascii_case(key))
}

/// Get the full URL to view a transaction on the block explorer
pub fn get_tx_explorer_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    find_chain_by_chain_id(chain_id).map(|c| c.tx_url(tx_hash))
}

/// Get the full URL to view an address on the block explorer
pub fn get_address_explorer_url(chain_id: u64, address: &str) -> Option<String> {
    find_chain_by_chain_id(chain_id).map(|c| c.address_url(address))
}

/// Check if a chain supports EIP-1559 (Type 2 transactions)
pub fn chain_supports_eip1559(chain_id: u64) -> bool {
    match chain_id {
        // Chains that still price gas the legacy way
        56 => false,  // BNB Smart Chain
        66 => false,  // OKC
        250 => false, // Fantom
        // Everything else in the table is post-London or an OP/zk rollup
        _ => true,
    }
}

/// Interval to use when the user has not typed one. `INSCRIBER_INTERVAL_MS`
/// wins over the built-in default; zero and garbage are ignored.
pub fn default_interval_ms() -> u64 {
    env::var(INTERVAL_ENV_VAR)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(DEFAULT_INTERVAL_MS)
}

/// Everything the submission loop needs to know about where and how often to send.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub chain: &'static Chain,
    pub rpc_url: String,
    pub interval: Duration,
    /// Maximum number of ticks allowed to be in flight at once (1 = strictly serial)
    pub max_in_flight_ticks: usize,
}

impl RunConfig {
    /// Build a run config. An empty or whitespace `rpc_override` falls back to
    /// the chain's default RPC.
    pub fn new(chain: &'static Chain, rpc_override: Option<&str>, interval_ms: u64) -> Self {
        Self {
            chain,
            rpc_url: effective_rpc(chain, rpc_override),
            interval: Duration::from_millis(interval_ms.max(1)),
            max_in_flight_ticks: 1,
        }
    }

    pub fn with_max_in_flight_ticks(mut self, max: usize) -> Self {
        self.max_in_flight_ticks = clamp_in_flight_ticks(max);
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain.chain_id
    }

    pub fn get_provider(&self) -> Result<Arc<Provider<Http>>> {
        let url = Url::parse(&self.rpc_url)
            .map_err(|e| anyhow!("Invalid RPC URL '{}': {}", self.rpc_url, e))?;
        let provider = Provider::<Http>::try_from(url.as_str())?;
        Ok(Arc::new(provider))
    }
}

/// Resolve the RPC endpoint: explicit override if non-empty, else the chain default.
pub fn effective_rpc(chain: &Chain, rpc_override: Option<&str>) -> String {
    match rpc_override.map(str::trim) {
        Some(rpc) if !rpc.is_empty() => rpc.to_string(),
        _ => chain.default_rpc.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== registry tests ====================

    #[test]
    fn test_registry_has_twelve_chains() {
        assert_eq!(CHAINS.len(), 12);
    }

    #[test]
    fn test_registry_keys_and_chain_ids_unique() {
        for (i, a) in CHAINS.iter().enumerate() {
            for b in &CHAINS[i + 1..] {
                assert_ne!(a.key, b.key);
                assert_ne!(a.chain_id, b.chain_id);
            }
        }
    }

    #[test]
    fn test_default_chain_is_ethereum() {
        let chain = default_chain();
        assert_eq!(chain.key, "eth");
        assert_eq!(chain.chain_id, 1);
    }

    #[test]
    fn test_find_chain_by_key() {
        let chain = find_chain_by_key("bsc").unwrap();
        assert_eq!(chain.chain_id, 56);
        assert_eq!(chain.native_token, "BNB");
        assert_eq!(find_chain_by_key("zkSync").unwrap().chain_id, 324);
        assert!(find_chain_by_key("solana").is_none());
    }

    #[test]
    fn test_find_chain_by_chain_id() {
        assert_eq!(find_chain_by_chain_id(42161).unwrap().label, "Arbitrum One");
        assert!(find_chain_by_chain_id(999999).is_none());
    }

    #[test]
    fn test_find_chain_index() {
        assert_eq!(find_chain_index("eth"), Some(0));
        assert_eq!(find_chain_index("celo"), Some(CHAINS.len() - 1));
        assert_eq!(find_chain_index("nope"), None);
    }

    // ==================== explorer tests ====================

    #[test]
    fn test_tx_explorer_url() {
        let url = get_tx_explorer_url(8453, "0xabc").unwrap();
        assert_eq!(url, "https://basescan.org/tx/0xabc");
    }

    #[test]
    fn test_address_explorer_url() {
        let url = get_address_explorer_url(66, "0xdef").unwrap();
        assert_eq!(url, "https://www.oklink.com/okc/address/0xdef");
    }

    #[test]
    fn test_explorer_url_unknown_chain() {
        assert!(get_tx_explorer_url(31337, "0xabc").is_none());
    }

    // ==================== chain_supports_eip1559 tests ====================

    #[test]
    fn test_chain_supports_eip1559() {
        assert!(chain_supports_eip1559(1));
        assert!(chain_supports_eip1559(42161));
        assert!(chain_supports_eip1559(204));
        assert!(!chain_supports_eip1559(56));
        assert!(!chain_supports_eip1559(66));
        assert!(!chain_supports_eip1559(250));
    }

    // ==================== RunConfig tests ====================

    #[test]
    fn test_effective_rpc_falls_back_to_default() {
        let chain = find_chain_by_key("celo").unwrap();
        assert_eq!(effective_rpc(chain, None), "https://forno.celo.org");
        assert_eq!(effective_rpc(chain, Some("   ")), "https://forno.celo.org");
    }

    #[test]
    fn test_effective_rpc_uses_override() {
        let chain = default_chain();
        assert_eq!(
            effective_rpc(chain, Some(" http://localhost:8545 ")),
            "http://localhost:8545"
        );
    }

    #[test]
    fn test_run_config_new() {
        let config = RunConfig::new(default_chain(), None, 2500);
        assert_eq!(config.interval, Duration::from_millis(2500));
        assert_eq!(config.max_in_flight_ticks, 1);
        assert_eq!(config.chain_id(), 1);
    }

    #[test]
    fn test_run_config_in_flight_floor() {
        let config = RunConfig::new(default_chain(), None, 1000).with_max_in_flight_ticks(0);
        assert_eq!(config.max_in_flight_ticks, 1);
    }

    #[test]
    fn test_run_config_in_flight_ceiling() {
        let config = RunConfig::new(default_chain(), None, 1000).with_max_in_flight_ticks((1 << 32) + 1);
        assert_eq!(config.max_in_flight_ticks, MAX_IN_FLIGHT_TICKS);

        let config = RunConfig::new(default_chain(), None, 1000).with_max_in_flight_ticks(usize::MAX);
        assert_eq!(config.max_in_flight_ticks, MAX_IN_FLIGHT_TICKS);
        assert_eq!(clamp_in_flight_ticks(3), 3);
    }

    #[test]
    fn test_get_provider_rejects_bad_url() {
        let config = RunConfig::new(default_chain(), Some("not a url"), 1000);
        let err = config.get_provider().unwrap_err();
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[test]
    fn test_get_provider_accepts_default() {
        let config = RunConfig::new(default_chain(), None, 1000);
        assert!(config.get_provider().is_ok());
    }
}
