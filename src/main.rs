//! 查询持仓与余额。
//!
//! 用法示例：
//!   cargo run                         # 代理钱包（PROXY_WALLET）的持仓、USDC 余额与总资产
//!   cargo run -- --user 0xabc...      # 任意用户的持仓与持仓总价值

use anyhow::{Context, Result};
use std::env;
use tracing::{error, info, warn};

use poly_positions::config::{is_valid_address, Config};
use poly_positions::positions::{calculate_position_stats, Position, PositionClient};
use poly_positions::utils::error_helpers::{
    format_error, get_error_stack, is_insufficient_balance_or_allowance_error,
};
use poly_positions::utils::logger::init_logger;
use poly_positions::{HttpFetcher, UsdcBalanceProvider};

fn parse_user_arg() -> Result<Option<String>> {
    let args: Vec<String> = env::args().collect();
    let mut user: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user" => {
                i += 1;
                let addr = args.get(i).context("--user 需要参数")?.trim().to_string();
                if !is_valid_address(&addr) {
                    anyhow::bail!("--user 地址格式无效: {}", addr);
                }
                user = Some(addr);
                i += 1;
            }
            _ => {
                eprintln!("用法: poly_positions [--user <address>]");
                eprintln!("  --user ADDR  查询指定用户的持仓，不指定则查询 PROXY_WALLET");
                std::process::exit(1);
            }
        }
    }
    Ok(user)
}

fn log_positions(positions: &[Position]) {
    for p in positions {
        info!(
            condition_id = p.condition_id.as_deref().unwrap_or("-"),
            outcome = p.outcome.as_deref().unwrap_or("-"),
            size = p.size.unwrap_or(0.0),
            current_value = p.current_value.unwrap_or(0.0),
            percent_pnl = p.percent_pnl.unwrap_or(0.0),
            "{}",
            p.title.as_deref().unwrap_or("未知市场")
        );
    }

    let stats = calculate_position_stats(positions);
    info!(
        count = positions.len(),
        total_value = stats.total_value,
        initial_value = stats.initial_value,
        weighted_pnl = stats.weighted_pnl,
        overall_pnl = stats.overall_pnl,
        "📊 持仓统计"
    );
}

async fn run() -> Result<()> {
    let user = parse_user_arg()?;
    let config = Config::from_env()?;

    let client = PositionClient::new(
        &config,
        HttpFetcher::new(&config)?,
        UsdcBalanceProvider::new(&config)?,
    );

    match user {
        Some(user) => {
            let result = client.fetch_user_positions_and_balance(&user).await?;
            log_positions(&result.positions);
            info!(user = %user, balance = result.balance, "用户持仓总价值");
        }
        None => {
            let result = client.fetch_my_positions_and_balance().await?;
            log_positions(&result.positions);
            info!(
                wallet = client.proxy_wallet(),
                usdc_balance = result.usdc_balance,
                total_balance = result.total_balance,
                "💰 USDC 余额 {:.2}，总资产 {:.2}",
                result.usdc_balance,
                result.total_balance
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = init_logger() {
        eprintln!("初始化日志失败: {}", e);
    }

    if let Err(e) = run().await {
        let message = format_error(&e);
        let chain = format!("{:#}", e);
        error!(error = %message, cause = %chain, "❌ 查询失败");
        if let Some(stack) = get_error_stack(&e) {
            error!("{}", stack);
        }
        if is_insufficient_balance_or_allowance_error(Some(chain.as_str())) {
            warn!("余额或授权不足，请检查钱包 USDC 余额与合约授权");
        }
        std::process::exit(1);
    }
}
