//! 리소스 그룹 마이그레이션 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 의존성 그래프 출력 (Mermaid)
//! relocator graph --snapshot inventory.json --format mermaid
//!
//! # 선택 배치의 이동 순서
//! relocator order --snapshot inventory.json --ids "$NIC,$VNET"
//!
//! # 누락 의존성 검사 (누락 시 종료 코드 1)
//! relocator check --snapshot inventory.json --ids "$NIC"
//!
//! # 이동 실행 (ARM 호출 없이)
//! relocator migrate --snapshot inventory.json --source-group rg-src \
//!     --target-group-id /subscriptions/sub1/resourceGroups/rg-dst --ids "$NIC,$VNET" --dry-run
//! ```

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod commands;
mod config;

use commands::{
    check::{run_check, CheckConfig},
    graph::{run_graph, GraphConfig, GraphFormat},
    migrate::{run_migrate, MigrateConfig},
    order::{run_order, OrderConfig},
    parse_ids,
    plan::run_plan,
};
use config::RelocatorConfig;

#[derive(Parser)]
#[command(name = "relocator")]
#[command(about = "Azure 리소스 그룹 마이그레이션 도구", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// JSON 형식 로그 출력
    #[arg(long, default_value = "false", global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 스냅샷 의존성 그래프 출력
    Graph {
        /// 인벤토리 스냅샷 JSON 파일
        #[arg(short, long)]
        snapshot: PathBuf,

        /// 출력 형식 (text, mermaid, dot)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// 의존 대상이 먼저 오는 이동 순서 출력
    Order {
        #[arg(short, long)]
        snapshot: PathBuf,

        /// 쉼표로 구분된 리소스 ID
        #[arg(short, long)]
        ids: String,
    },

    /// 누락된 직접 의존성 검사
    Check {
        #[arg(short, long)]
        snapshot: PathBuf,

        /// 쉼표로 구분된 리소스 ID
        #[arg(short, long)]
        ids: String,
    },

    /// 리소스 이동 실행
    Migrate {
        #[arg(short, long)]
        snapshot: PathBuf,

        /// 원본 리소스 그룹 이름
        #[arg(long)]
        source_group: String,

        /// 대상 리소스 그룹 ARM ID
        #[arg(long)]
        target_group_id: String,

        /// 쉼표로 구분된 리소스 ID
        #[arg(short, long)]
        ids: String,

        /// ARM 호출 없이 실행
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// 저장된 계획 조회 (PostgreSQL 저장소)
    Plan {
        /// 계획 ID
        #[arg(long)]
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 로깅 초기화
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "relocator_cli={},relocator_execution={},relocator_provider={},relocator_core={}",
            cli.log_level, cli.log_level, cli.log_level, cli.log_level
        )
        .into()
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(cli.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    let result = run(cli.command).await;
    if let Err(e) = &result {
        error!(error = %e, "명령 실패");
    }
    result
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Graph { snapshot, format } => {
            let format = GraphFormat::parse(&format)
                .ok_or_else(|| anyhow!("지원하지 않는 그래프 형식: {}", format))?;
            let output = run_graph(&GraphConfig { snapshot, format })?;
            println!("{}", output);
        }

        Commands::Order { snapshot, ids } => {
            let output = run_order(&OrderConfig {
                snapshot,
                ids: parse_ids(&ids),
            })?;
            print!("{}", output);
        }

        Commands::Check { snapshot, ids } => {
            run_check(&CheckConfig {
                snapshot,
                ids: parse_ids(&ids),
            })?;
        }

        Commands::Migrate {
            snapshot,
            source_group,
            target_group_id,
            ids,
            dry_run,
        } => {
            let settings = RelocatorConfig::from_env()?;
            info!(
                endpoint = %settings.arm.endpoint,
                max_concurrent = settings.max_concurrent,
                dry_run,
                "마이그레이션 시작"
            );
            let output = run_migrate(
                &MigrateConfig {
                    snapshot,
                    source_group,
                    target_group_id,
                    ids: parse_ids(&ids),
                    dry_run,
                },
                &settings,
            )
            .await?;
            println!("{}", output);
        }

        Commands::Plan { id } => {
            let settings = RelocatorConfig::from_env()?;
            println!("{}", run_plan(id, &settings).await?);
        }
    }

    Ok(())
}
