// ==========================================
// 经销商车场运营系统 - 主入口
// ==========================================
// 启动流程:
// 1. 初始化日志
// 2. 打开 SQLite 文档存储与配置
// 3. 清扫残留交付意图
// 4. 审计每个车场并输出汇总
// ==========================================

use anyhow::{Context, Result};
use dealer_yard_ops::app::{get_default_db_path, AppState};
use dealer_yard_ops::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", dealer_yard_ops::APP_NAME);
    tracing::info!("系统版本: {}", dealer_yard_ops::VERSION);
    tracing::info!("==================================================");

    // 数据库路径: 命令行第一个参数 > 环境变量 > 用户数据目录
    let db_path = std::env::args()
        .nth(1)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)
        .await
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    // ==========================================
    // 启动清扫: 残留交付意图
    // ==========================================
    let sweep = state
        .yard_api
        .recover_pending_dispatches()
        .await
        .context("交付意图清扫失败")?;
    tracing::info!(
        scanned = sweep.scanned,
        completed = sweep.completed.len(),
        rolled_back = sweep.rolled_back.len(),
        already_done = sweep.already_done.len(),
        failed = sweep.failed.len(),
        "启动清扫完成"
    );
    for (key, reason) in &sweep.failed {
        tracing::error!(key = %key, "交付意图未能恢复: {}", reason);
    }

    // ==========================================
    // 车场审计
    // ==========================================
    let dealers = state
        .yard_api
        .list_yard_dealers()
        .await
        .context("读取车场列表失败")?;

    let mut inconsistent = 0usize;
    for dealer in &dealers {
        match state.yard_api.audit_yard(dealer).await {
            Ok(report) => {
                if !report.is_consistent() {
                    inconsistent += 1;
                }
                tracing::info!(
                    dealer = %report.dealer,
                    yard_count = report.yard_count,
                    also_in_transit = report.also_in_transit.len(),
                    also_handed_over = report.also_handed_over.len(),
                    pending_intents = report.pending_intents.len(),
                    "车场审计"
                );
            }
            Err(e) => {
                inconsistent += 1;
                tracing::error!(dealer = %dealer, "车场审计失败: {}", e.to_failure().reason);
            }
        }
    }

    tracing::info!(
        dealers = dealers.len(),
        inconsistent = inconsistent,
        "审计汇总"
    );
    Ok(())
}
