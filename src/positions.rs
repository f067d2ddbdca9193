//! 用户持仓（Data API）的获取、统计与查找

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::balance::BalanceProvider;
use crate::config::Config;
use crate::fetch::DataFetcher;

/// Data API 返回的单条持仓。字段都可能缺失，缺失的数值只在汇总时按 0 处理。
/// 字段类型不符时只把该字段置空，不丢弃整条持仓
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(default, deserialize_with = "lenient_string")]
    pub condition_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub asset: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub outcome: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub size: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub avg_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cur_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub initial_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cash_pnl: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percent_pnl: Option<f64>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64())
}

/// 一组持仓的汇总统计
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionStats {
    pub total_value: f64,
    pub initial_value: f64,
    /// Σ current_value × percent_pnl
    pub weighted_pnl: f64,
    /// weighted_pnl / total_value，total_value <= 0 时为 0
    pub overall_pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPositions {
    pub positions: Vec<Position>,
    /// 持仓当前价值之和
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MyPositions {
    pub positions: Vec<Position>,
    pub usdc_balance: f64,
    /// USDC 余额 + 持仓当前价值
    pub total_balance: f64,
}

/// 计算持仓统计；空列表时全部为 0
pub fn calculate_position_stats(positions: &[Position]) -> PositionStats {
    let mut stats = PositionStats::default();

    for pos in positions {
        let value = pos.current_value.unwrap_or(0.0);
        stats.total_value += value;
        stats.initial_value += pos.initial_value.unwrap_or(0.0);
        stats.weighted_pnl += value * pos.percent_pnl.unwrap_or(0.0);
    }

    stats.overall_pnl = if stats.total_value > 0.0 {
        stats.weighted_pnl / stats.total_value
    } else {
        0.0
    };
    stats
}

/// 持仓当前价值之和，空列表为 +0
pub fn total_current_value(positions: &[Position]) -> f64 {
    positions
        .iter()
        .map(|p| p.current_value.unwrap_or(0.0))
        .fold(0.0, |acc, v| acc + v)
}

/// 按 condition_id 精确匹配，有重复时返回第一个
pub fn find_position_by_condition_id<'a>(
    positions: &'a [Position],
    condition_id: &str,
) -> Option<&'a Position> {
    positions
        .iter()
        .find(|p| p.condition_id.as_deref() == Some(condition_id))
}

/// 把 Data API 的响应解析为持仓列表。
/// 响应不是数组时按空列表处理；数组中不是对象的元素跳过。
pub fn parse_positions(data: Value) -> Vec<Position> {
    let items = match data {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        _ => {
            warn!("持仓响应不是数组，按空持仓处理");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Position>(item) {
            Ok(pos) => Some(pos),
            Err(e) => {
                warn!(index, error = %e, "跳过无法解析的持仓");
                None
            }
        })
        .collect()
}

/// 构建持仓查询 URL：`{base}/positions?user=<address>`，地址做 URL 编码
pub fn positions_url(data_api_url: &str, user_address: &str) -> Result<String> {
    let mut url = Url::parse(&format!("{}/positions", data_api_url.trim_end_matches('/')))
        .with_context(|| format!("Data API 地址无效: {}", data_api_url))?;
    url.query_pairs_mut().append_pair("user", user_address);
    Ok(url.into())
}

/// 组合持仓查询与余额查询。每次调用都重新请求，不做缓存
pub struct PositionClient<F, B> {
    fetcher: F,
    balances: B,
    proxy_wallet: String,
    data_api_url: String,
}

impl<F: DataFetcher, B: BalanceProvider> PositionClient<F, B> {
    pub fn new(config: &Config, fetcher: F, balances: B) -> Self {
        Self {
            fetcher,
            balances,
            proxy_wallet: config.proxy_wallet.clone(),
            data_api_url: config.data_api_url.clone(),
        }
    }

    pub fn proxy_wallet(&self) -> &str {
        &self.proxy_wallet
    }

    async fn fetch_positions(&self, user_address: &str) -> Result<Vec<Position>> {
        let url = positions_url(&self.data_api_url, user_address)?;
        let data = self.fetcher.fetch(&url).await?;
        let positions = parse_positions(data);
        debug!(user = user_address, count = positions.len(), "获取持仓");
        Ok(positions)
    }

    /// 获取指定用户的持仓，balance 为持仓当前价值之和
    pub async fn fetch_user_positions_and_balance(
        &self,
        user_address: &str,
    ) -> Result<UserPositions> {
        let positions = self.fetch_positions(user_address).await?;
        let balance = total_current_value(&positions);
        Ok(UserPositions { positions, balance })
    }

    /// 获取自己（代理钱包）的持仓和 USDC 余额。先查持仓，再查余额
    pub async fn fetch_my_positions_and_balance(&self) -> Result<MyPositions> {
        let positions = self.fetch_positions(&self.proxy_wallet).await?;
        let usdc_balance = self.balances.get_balance(&self.proxy_wallet).await?;
        let total_balance = usdc_balance + total_current_value(&positions);

        debug!(
            usdc_balance,
            total_balance,
            count = positions.len(),
            "获取我的持仓和余额"
        );
        Ok(MyPositions {
            positions,
            usdc_balance,
            total_balance,
        })
    }
}
