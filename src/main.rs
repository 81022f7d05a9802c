use std::process::ExitCode;

use boot_core::constants::EXIT_ABORTED;
use boot_core::{AbortSignal, RoleInput};
use bootflow::app::{self, HostMode, PlanView};
use bootflow::config::AppConfig;
use bootflow::errors::AppError;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "bootflow=info,boot_core=info,boot_adapters=info";

/// Bootstrap idempotente de nodos k3s.
#[derive(Debug, Parser)]
#[command(name = "bootflow", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ejecuta el plan del rol contra este host.
    Run(RunArgs),
    /// Muestra el plan resuelto sin ejecutarlo.
    Plan(PlanArgs),
    /// Lista el catálogo de steps.
    Steps {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// server | agent (por defecto BOOTFLOW_ROLE).
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    join_url: Option<String>,
    #[arg(long)]
    join_token: Option<String>,
    /// Namespace a crear; repetible. Reemplaza la lista por defecto.
    #[arg(long = "namespace", value_name = "NS")]
    namespaces: Vec<String>,
    #[arg(long, overrides_with = "no_dashboard")]
    dashboard: bool,
    #[arg(long)]
    no_dashboard: bool,
    #[arg(long, overrides_with = "no_gitops")]
    gitops: bool,
    #[arg(long)]
    no_gitops: bool,
}

impl TargetArgs {
    fn into_input(self) -> RoleInput {
        RoleInput { role: self.role.unwrap_or_default(),
                    join_url: self.join_url,
                    join_token: self.join_token,
                    namespaces: (!self.namespaces.is_empty()).then_some(self.namespaces),
                    dashboard: flag_pair(self.dashboard, self.no_dashboard),
                    gitops: flag_pair(self.gitops, self.no_gitops) }
    }
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Registra las acciones sin ejecutarlas.
    #[arg(long, conflicts_with = "simulate")]
    dry_run: bool,
    /// Ejecuta contra un host simulado en memoria.
    #[arg(long)]
    simulate: bool,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match dispatch(cli.command).await {
        Ok(code) => exit_code(code),
        Err(e) => {
            tracing::error!("{e}");
            exit_code(e.exit_code())
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn dispatch(command: Command) -> Result<i32, AppError> {
    match command {
        Command::Steps { json } => {
            let steps = app::catalog()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&steps)?);
            } else {
                for step in &steps {
                    println!("{step}  [{}]", step.roles.join(","));
                }
            }
            Ok(0)
        }
        Command::Plan(args) => {
            let app_config = AppConfig::from_env()?;
            let prepared = app::prepare(&app_config, args.target.into_input())?;
            let view = PlanView::of(&prepared.plan);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{view}");
            }
            Ok(0)
        }
        Command::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<i32, AppError> {
    let app_config = AppConfig::from_env()?;
    let mode = if args.dry_run {
        HostMode::DryRun
    } else if args.simulate {
        HostMode::Simulated
    } else {
        HostMode::Shell
    };
    let prepared = app::prepare(&app_config, args.target.into_input())?;
    tracing::info!(role = %prepared.config.role, steps = prepared.plan.len(), ?mode, "starting bootstrap");

    let abort = AbortSignal::new();
    let watcher = {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::warn!("interrupt received, stopping after the current step (press Ctrl-C again to exit now)");
            abort.raise();
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::error!("second interrupt, exiting without waiting for the current step");
                std::process::exit(EXIT_ABORTED);
            }
        })
    };
    let report = tokio::task::spawn_blocking(move || app::execute(&prepared, mode, abort)).await?;
    watcher.abort();

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{report}");
    }
    Ok(report.exit_code())
}
