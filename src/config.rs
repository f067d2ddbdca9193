use anyhow::{Context, Result};
use std::env;

/// Polymarket Data API 默认地址
pub const DEFAULT_DATA_API_URL: &str = "https://data-api.polymarket.com";
/// Polygon 公共 RPC
pub const DEFAULT_RPC_URL: &str = "https://polygon-rpc.com";
/// Polygon 上的 USDC.e 合约
pub const DEFAULT_USDC_CONTRACT_ADDRESS: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// 校验以太坊地址格式：0x + 40 位十六进制
pub fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone)]
pub struct Config {
    /// 自己的代理钱包地址（Email/Magic 或浏览器钱包登录时 Polymarket 分配的 Proxy 地址）
    pub proxy_wallet: String,
    pub data_api_url: String,
    pub rpc_url: String,
    pub usdc_contract_address: String,
    /// 单次 HTTP 请求超时（毫秒）
    pub request_timeout_ms: u64,
}

impl Config {
    /// 用指定的代理钱包地址构建配置，其余字段取默认值
    pub fn new(proxy_wallet: impl Into<String>) -> Self {
        Self {
            proxy_wallet: proxy_wallet.into(),
            data_api_url: DEFAULT_DATA_API_URL.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            usdc_contract_address: DEFAULT_USDC_CONTRACT_ADDRESS.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let proxy_wallet = env::var("PROXY_WALLET").context("PROXY_WALLET 未设置")?;
        let proxy_wallet = proxy_wallet.trim().to_string();
        if !is_valid_address(&proxy_wallet) {
            anyhow::bail!(
                "PROXY_WALLET 格式无效: {}（应为 0x 开头的 40 位十六进制）",
                proxy_wallet
            );
        }

        let usdc_contract_address = env::var("USDC_CONTRACT_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_USDC_CONTRACT_ADDRESS.to_string());
        if !is_valid_address(&usdc_contract_address) {
            anyhow::bail!(
                "USDC_CONTRACT_ADDRESS 格式无效: {}（默认值 {}）",
                usdc_contract_address,
                DEFAULT_USDC_CONTRACT_ADDRESS
            );
        }

        Ok(Config {
            proxy_wallet,
            data_api_url: env::var("DATA_API_URL")
                .unwrap_or_else(|_| DEFAULT_DATA_API_URL.to_string()),
            rpc_url: env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            usdc_contract_address,
            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_MS.to_string())
                .parse()
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        assert!(is_valid_address("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0"));
        assert!(is_valid_address(DEFAULT_USDC_CONTRACT_ADDRESS));
        assert!(!is_valid_address("742d35Cc6634C0532925a3b844Bc9e7595f0bEb0"));
        assert!(!is_valid_address("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb"));
        assert!(!is_valid_address("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEbZ"));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = Config::new("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0");
        assert_eq!(config.data_api_url, DEFAULT_DATA_API_URL);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }
}
