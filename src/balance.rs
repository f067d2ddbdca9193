//! 查询钱包的 USDC 余额（链上 balanceOf）

use alloy::primitives::utils::format_units;
use alloy::primitives::{Address, U256};
use alloy::providers::ProviderBuilder;
use alloy::sol;
use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::future::Future;
use tracing::debug;

use crate::config::Config;

/// USDC 精度为 6 位小数
const USDC_DECIMALS: u32 = 6;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// 查询地址的代币余额
pub trait BalanceProvider {
    fn get_balance(&self, address: &str) -> impl Future<Output = Result<f64>> + Send;
}

pub struct UsdcBalanceProvider {
    rpc_url: String,
    usdc_contract: Address,
}

impl UsdcBalanceProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let usdc_contract: Address = config
            .usdc_contract_address
            .parse()
            .context("USDC_CONTRACT_ADDRESS 格式无效")?;
        Ok(Self {
            rpc_url: config.rpc_url.clone(),
            usdc_contract,
        })
    }
}

impl BalanceProvider for UsdcBalanceProvider {
    async fn get_balance(&self, address: &str) -> Result<f64> {
        let owner: Address = address
            .parse()
            .with_context(|| format!("钱包地址格式无效: {}", address))?;
        let rpc_url: reqwest::Url = self.rpc_url.parse().context("RPC_URL 格式无效")?;

        let provider = ProviderBuilder::new().connect_http(rpc_url);
        let contract = IERC20::new(self.usdc_contract, &provider);
        let raw: U256 = contract
            .balanceOf(owner)
            .call()
            .await
            .context("RPC 调用 balanceOf 失败")?;

        let balance = usdc_from_raw(raw)?;
        debug!(address, raw = %raw, balance, "USDC 余额");
        Ok(balance)
    }
}

/// 把链上最小单位的整数余额换算成 USDC。超出 i128 / Decimal 范围时用 format_units 换算
fn usdc_from_raw(raw: U256) -> Result<f64> {
    if let Ok(units) = i128::try_from(raw) {
        if let Some(value) = Decimal::try_from_i128_with_scale(units, USDC_DECIMALS)
            .ok()
            .and_then(|d| d.to_f64())
        {
            return Ok(value);
        }
    }
    let formatted = format_units(raw, USDC_DECIMALS as u8).context("换算 USDC 余额失败")?;
    formatted
        .parse()
        .with_context(|| format!("无法解析余额: {}", formatted))
}
