//! ingest - ワーカーの起動とオーケストレーター操作の CLI
//!
//! ```text
//! ingest worker --jobs batches.json --drain
//! ingest decisions
//! ingest approve <JOB_ID> <CHOICE>
//! ingest create --name t1 --type standard --path /home/t1
//! ingest status --type SIP
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ingest_core::app::WorkerBuilder;
use ingest_core::client::{self, CallerContext, RpcClient};
use ingest_core::config::{Backend, Settings};
use ingest_core::domain::{
    CreatePackage, HandlerError, Job, JobBatch, JobId, PackageType, TransferType, UnitId,
};
use ingest_core::impls::{InMemoryJobSource, InMemoryMetrics};
use ingest_core::observability::init_logging;
use ingest_core::registry::{JobHandler, StaticLoader};

#[derive(Debug, Parser)]
#[command(name = "ingest", version, about = "Ingest worker and orchestrator client")]
struct Cli {
    /// 設定ファイル（省略時は ./ingest.toml があれば読む）
    #[arg(long, global = true, env = "INGEST_CONFIG")]
    config: Option<PathBuf>,

    /// client.backend を上書き
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<Backend>,

    #[arg(long, global = true, env = "INGEST_USER_ID", default_value_t = 1)]
    user_id: u64,

    /// client.lang を上書き
    #[arg(long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the dispatch loop against an in-memory job source.
    Worker(WorkerArgs),
    /// Approve one pending decision.
    Approve { job_id: String, choice: String },
    /// Print the decisions awaiting approval (legacy XML).
    Decisions,
    /// Start a new transfer.
    Create(CreateArgs),
    /// Approve a transfer that is waiting in a watched directory.
    ApprovePath {
        path: String,
        #[arg(long = "type", default_value = "standard", value_parser = parse_transfer_type)]
        transfer_type: TransferType,
    },
    /// Approve a partial reingest of a SIP.
    Reingest { sip_id: String },
    /// List packages of one type.
    Status {
        #[arg(long = "type", default_value = "Transfer", value_parser = parse_package_type)]
        package_type: PackageType,
    },
    /// Show one package.
    Package { id: String },
    /// List processing configuration fields.
    Fields,
}

#[derive(Debug, Args)]
struct WorkerArgs {
    /// バッチ定義（JSON 配列）を起動時に投入する
    #[arg(long)]
    jobs: Option<PathBuf>,

    /// 投入したバッチを処理し終えたら終了する
    #[arg(long)]
    drain: bool,

    /// worker.pool_size を上書き
    #[arg(long)]
    pool_size: Option<usize>,

    /// 起動時にロードできていなければならない task
    #[arg(long = "expect", value_delimiter = ',')]
    expect: Vec<String>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long = "type", default_value = "standard", value_parser = parse_transfer_type)]
    transfer_type: TransferType,
    /// 複数指定可
    #[arg(long = "path", required = true)]
    paths: Vec<String>,
    #[arg(long, default_value = "")]
    accession: String,
    #[arg(long, default_value = "")]
    access_system_id: String,
    #[arg(long, default_value = "")]
    metadata_set_id: String,
    #[arg(long)]
    processing_config: Option<String>,
    #[arg(long)]
    no_auto_approve: bool,
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    match s {
        "queue" => Ok(Backend::Queue),
        "streaming" => Ok(Backend::Streaming),
        other => Err(format!("unknown backend {other:?} (queue|streaming)")),
    }
}

fn parse_transfer_type(s: &str) -> Result<TransferType, String> {
    s.parse().map_err(|e: ingest_core::domain::ValidationError| e.0)
}

fn parse_package_type(s: &str) -> Result<PackageType, String> {
    s.parse().map_err(|e: ingest_core::domain::ValidationError| e.0)
}

/// `--jobs` ファイルの 1 要素
#[derive(Debug, Deserialize)]
struct SeedBatch {
    task: String,
    #[serde(default)]
    unit_id: Option<String>,
    /// Job ごとの引数
    jobs: Vec<Vec<String>>,
}

/// 引数をそのまま出力する開発用 handler（`test_v0.0`）
struct CmdTest;

#[async_trait]
impl JobHandler for CmdTest {
    async fn call(&self, jobs: &mut JobBatch) -> Result<(), HandlerError> {
        for job in jobs.iter_mut() {
            let line = job.arguments.join(" ");
            job.write_output(&line);
            job.set_exit_code(0);
        }
        Ok(())
    }
}

fn linked_handlers() -> Result<StaticLoader> {
    let mut loader = StaticLoader::new();
    loader.register_handler("cmd_test", Arc::new(CmdTest))?;
    Ok(loader)
}

fn read_seed(path: &Path) -> Result<Vec<SeedBatch>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn seed_batch(seed: SeedBatch) -> Result<(String, JobBatch)> {
    let unit_id = match seed.unit_id {
        Some(raw) => UnitId::parse(&raw).map_err(anyhow::Error::msg)?,
        None => UnitId::generate(),
    };
    let jobs = seed
        .jobs
        .into_iter()
        .map(|args| Job::new(JobId::generate(), seed.task.clone(), args, unit_id))
        .collect();
    Ok((seed.task, JobBatch::new(jobs)))
}

#[derive(Debug, Serialize)]
struct WorkerReport {
    tasks: std::collections::BTreeMap<String, ingest_core::observability::TaskCounts>,
}

async fn run_worker(settings: &Settings, args: WorkerArgs) -> Result<()> {
    let metrics = Arc::new(InMemoryMetrics::new());
    let expected: Vec<&str> = args.expect.iter().map(String::as_str).collect();
    let mut builder = WorkerBuilder::new(linked_handlers()?).metrics(metrics.clone());
    if !expected.is_empty() {
        builder = builder.expect_tasks(&expected);
    }
    let worker = builder.build()?;
    info!(
        tasks = worker.registry().len(),
        available = worker.registry().available_count(),
        "handler registry loaded"
    );

    let source = Arc::new(InMemoryJobSource::new());
    if let Some(path) = &args.jobs {
        for seed in read_seed(path)? {
            let (task, batch) = seed_batch(seed)?;
            source.push(task, batch).await;
        }
    }
    if args.drain {
        source.close().await;
    }

    let pool_size = args.pool_size.unwrap_or(settings.worker.pool_size).max(1);
    let pool = worker.spawn(pool_size, source, settings.worker.poll_interval());
    info!(pool_size, "worker pool started");

    if args.drain {
        pool.join().await;
    } else {
        tokio::signal::ctrl_c()
            .await
            .context("waiting for ctrl-c")?;
        info!("shutdown requested");
        pool.shutdown_and_join().await;
    }

    let report = WorkerReport {
        tasks: metrics.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_client_command(client: &dyn RpcClient, command: Command) -> Result<()> {
    match command {
        Command::Worker(_) => bail!("worker is not a client command"),
        Command::Approve { job_id, choice } => {
            let job_id = JobId::parse(&job_id).map_err(anyhow::Error::msg)?;
            println!("{}", client.approve_job(job_id, &choice).await?);
        }
        Command::Decisions => {
            print!("{}", client.list_jobs_awaiting_approval().await?);
        }
        Command::Create(args) => {
            let mut request = CreatePackage::new(args.name, args.transfer_type, args.paths)
                .accession(args.accession)
                .access_system_id(args.access_system_id)
                .metadata_set_id(args.metadata_set_id)
                .auto_approve(!args.no_auto_approve);
            if let Some(config) = args.processing_config {
                request = request.processing_config(config);
            }
            println!("{}", client.create_package(&request).await?);
        }
        Command::ApprovePath {
            path,
            transfer_type,
        } => {
            println!(
                "{}",
                client.approve_transfer_by_path(&path, transfer_type).await?
            );
        }
        Command::Reingest { sip_id } => {
            let sip_id = UnitId::parse(&sip_id).map_err(anyhow::Error::msg)?;
            client.approve_partial_reingest(sip_id).await?;
        }
        Command::Status { package_type } => {
            print_json(&client.get_packages_status(package_type).await?)?;
        }
        Command::Package { id } => {
            let id = UnitId::parse(&id).map_err(anyhow::Error::msg)?;
            print_json(&client.get_package_status(id).await?)?;
        }
        Command::Fields => {
            print_json(&client.get_processing_config_fields().await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: ignoring .env: {e}");
        }
    }

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(backend) = cli.backend {
        settings.client.backend = backend;
    }
    if let Some(lang) = cli.lang {
        settings.client.lang = lang;
    }
    init_logging(&settings.log);

    let command = match cli.command {
        Command::Worker(args) => return run_worker(&settings, args).await,
        other => other,
    };

    let context = CallerContext::new(cli.user_id, settings.client.lang.clone());
    let client = client::connect(&settings.client, context)?;
    let result = run_client_command(client.as_ref(), command).await;
    if let Err(e) = client.close().await {
        warn!(error = %e, "closing client failed");
    }
    result
}
