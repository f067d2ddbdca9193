//! Polymarket 持仓与余额查询工具：错误信息提取、持仓统计、持仓/余额组合查询。

pub mod balance;
pub mod config;
pub mod fetch;
pub mod positions;
pub mod utils;

pub use balance::{BalanceProvider, UsdcBalanceProvider};
pub use config::Config;
pub use fetch::{DataFetcher, HttpFetcher};
pub use positions::{
    calculate_position_stats, find_position_by_condition_id, MyPositions, Position,
    PositionClient, PositionStats, UserPositions,
};
