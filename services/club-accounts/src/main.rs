//! Club Accounts - 运维命令入口
//!
//! 用法：
//! - `club-accounts backfill [limit]`：为未分配销售的客户执行一轮分配，
//!   未指定 limit 时使用 `seller_assignment.batch_size`
//! - `club-accounts request-reset <email>`：签发重置令牌并发送邮件
//! - `club-accounts reset-password <token>`：从标准输入读取新密码并完成重置

use anyhow::{Context, bail};
use club_accounts::application::commands::assignment::BackfillSellerAssignmentsCommand;
use club_accounts::application::commands::auth::{
    RequestPasswordResetCommand, ResetPasswordCommand,
};
use club_accounts::composition::AccountsServices;
use club_bootstrap::{Infrastructure, RuntimeConfig};
use club_cqrs_core::{CommandHandler, Logged};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

const USAGE: &str = "usage: club-accounts <backfill [limit] | request-reset <email> | reset-password <token>>";

#[derive(Debug, PartialEq, Eq)]
enum CliCommand {
    Backfill { limit: Option<u32> },
    RequestReset { email: String },
    ResetPassword { token: String },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<CliCommand> {
    let command = match args.next().as_deref() {
        Some("backfill") => CliCommand::Backfill {
            limit: args
                .next()
                .map(|arg| arg.parse::<u32>())
                .transpose()
                .context("limit must be a non-negative integer")?,
        },
        Some("request-reset") => CliCommand::RequestReset {
            email: args.next().context(USAGE)?,
        },
        Some("reset-password") => CliCommand::ResetPassword {
            token: args.next().context(USAGE)?,
        },
        _ => bail!(USAGE),
    };

    if args.next().is_some() {
        bail!(USAGE);
    }
    Ok(command)
}

async fn read_new_password() -> anyhow::Result<String> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read new password from stdin")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = parse_args(std::env::args().skip(1))?;

    // 本地开发时从 .env 读取 CLUB_ 变量
    dotenvy::dotenv().ok();

    let infra = Infrastructure::start(RuntimeConfig::default()).await?;

    sqlx::migrate!("./migrations")
        .run(&infra.postgres_pool())
        .await
        .context("Failed to run migrations")?;

    let services = AccountsServices::from_infrastructure(&infra)?;

    match command {
        CliCommand::Backfill { limit } => {
            let handler = Logged::new(
                "BackfillSellerAssignments",
                services.backfill_seller_assignments,
            );
            let report = handler
                .handle(BackfillSellerAssignmentsCommand { limit })
                .await?;

            info!(
                assigned = report.assigned,
                skipped_no_candidate = report.skipped_no_candidate,
                lost_race = report.lost_race,
                "Backfill complete"
            );
            println!("{}", serde_json::to_string(&report)?);
        }
        CliCommand::RequestReset { email } => {
            Logged::new("RequestPasswordReset", services.request_password_reset)
                .handle(RequestPasswordResetCommand::new(email))
                .await?;
        }
        CliCommand::ResetPassword { token } => {
            let new_password = read_new_password().await?;
            Logged::new("ResetPassword", services.reset_password)
                .handle(ResetPasswordCommand::new(token, new_password))
                .await?;
            info!("Password updated");
        }
    }

    // 一次性任务没有抓取端点，结束前输出一次指标快照
    debug!(metrics = %infra.render_metrics(), "Metrics snapshot");

    Ok(())
}
