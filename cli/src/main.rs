mod logging;
mod output;
mod render;
mod shell;

use clap::{Parser, Subcommand, ValueEnum};
use common::{ActionKind, JobId, Route};
use jobctl_client::theme::{self, ThemePreference};
use jobctl_client::{Config, Dispatch, FormField, RegisterForm, Session};
use output::OutputFormat;
use render::Renderer;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Inspect and control jobs on a job orchestrator", long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Orchestrator base URL, e.g. http://localhost:8080
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Acting user recorded on mutating calls
    #[arg(short, long, global = true)]
    user: Option<String>,
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    #[arg(long, global = true, value_enum)]
    theme: Option<ThemeArg>,
    #[arg(long, global = true)]
    no_color: bool,
    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for ThemePreference {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => ThemePreference::Light,
            ThemeArg::Dark => ThemePreference::Dark,
            ThemeArg::System => ThemePreference::System,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List all jobs
    List,
    /// Show job details and execution history
    Show { id: JobId },
    /// Run a job
    Run { id: JobId },
    /// Kill a running job
    Kill { id: JobId },
    /// Clean a job
    Clean { id: JobId },
    /// Put a job into manual mode
    Manual { id: JobId },
    /// Force a job to run
    ForceRun { id: JobId },
    /// Register a new job
    Register {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long = "type")]
        job_type: Option<String>,
        #[arg(short, long)]
        payload: Option<String>,
    },
    /// View execution history for a job
    Executions {
        /// Defaults to `executions.default_job_id` from the config
        #[arg(short, long)]
        job: Option<JobId>,
    },
    /// Open a route such as /jobs, /jobs/3 or /executions
    Open { route: String },
    /// Interactive session
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(theme) = cli.theme {
        config.ui.theme = theme.into();
    }
    logging::setup_logging(&config.logging, cli.verbose, cli.quiet)?;
    log::debug!("Effective config: {:?}", config);

    let theme = theme::init(config.ui.theme);
    let color = !cli.no_color && cli.format == OutputFormat::Table && std::io::stdout().is_terminal();
    let mut renderer = Renderer::new(theme, color);

    let session = Session::connect(config)?;
    let user = cli.user.as_deref();

    let ok = match cli.command {
        Commands::List => show_route(&session, &renderer, cli.format, Route::Jobs).await?,
        Commands::Show { id } => show_route(&session, &renderer, cli.format, Route::JobDetail(id)).await?,
        Commands::Run { id } => act(&session, &renderer, cli.format, user, id, ActionKind::Run).await?,
        Commands::Kill { id } => act(&session, &renderer, cli.format, user, id, ActionKind::Kill).await?,
        Commands::Clean { id } => act(&session, &renderer, cli.format, user, id, ActionKind::Clean).await?,
        Commands::Manual { id } => act(&session, &renderer, cli.format, user, id, ActionKind::Manual).await?,
        Commands::ForceRun { id } => act(&session, &renderer, cli.format, user, id, ActionKind::ForceRun).await?,
        Commands::Register { name, description, job_type, payload } => {
            let mut form = RegisterForm::new();
            form.set_field(FormField::Name, name);
            form.set_field(FormField::Description, description.unwrap_or_default());
            form.set_field(FormField::Type, job_type.unwrap_or_default());
            form.set_field(FormField::Payload, payload.unwrap_or_default());
            form.set_field(FormField::User, resolve_user_text(&session.config, user));
            register(&session, &renderer, cli.format, form).await?
        }
        Commands::Executions { job } => {
            let page = session.executions(job);
            page.mount().await;
            let state = page.snapshot();
            print_view(cli.format, &state.executions, || renderer.executions_view(&state), output::executions_csv)?;
            report(state.error.as_deref())
        }
        Commands::Open { route } => match Route::parse(&route) {
            Some(route) => show_route(&session, &renderer, cli.format, route).await?,
            None => report(Some(format!("Unknown route: {}", route).as_str())),
        },
        Commands::Shell => {
            shell::run(session, &mut renderer, cli.user).await?;
            true
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Flag, then `JOBCTL_USER`/config; empty when none so the form reports it.
fn resolve_user_text(config: &Config, flag: Option<&str>) -> String {
    flag.or(config.user.as_deref()).unwrap_or_default().to_string()
}

/// Prints an error banner; returns whether the view ended cleanly.
fn report(error: Option<&str>) -> bool {
    match error {
        Some(msg) => {
            eprintln!("Error: {}", msg);
            false
        }
        None => true,
    }
}

fn print_view<T: serde::Serialize>(
    format: OutputFormat,
    rows: &[T],
    table: impl FnOnce() -> String,
    csv: impl FnOnce(&[T]) -> anyhow::Result<String>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!("{}", table()),
        OutputFormat::Json => println!("{}", output::json(rows)?),
        OutputFormat::Csv => print!("{}", csv(rows)?),
    }
    Ok(())
}

async fn show_route(session: &Session, renderer: &Renderer, format: OutputFormat, route: Route) -> anyhow::Result<bool> {
    match route {
        Route::Jobs => {
            let page = session.jobs();
            page.mount().await;
            let state = page.snapshot();
            print_view(format, &state.jobs, || renderer.jobs_view(&state), output::jobs_csv)?;
            Ok(report(state.error.as_deref()))
        }
        Route::JobDetail(id) => {
            let page = session.job_detail(id);
            page.mount().await;
            print_detail(renderer, format, &page.snapshot())
        }
        Route::Executions => {
            let page = session.executions(None);
            page.mount().await;
            let state = page.snapshot();
            print_view(format, &state.executions, || renderer.executions_view(&state), output::executions_csv)?;
            Ok(report(state.error.as_deref()))
        }
    }
}

fn print_detail(
    renderer: &Renderer,
    format: OutputFormat,
    state: &jobctl_client::controllers::JobDetailState,
) -> anyhow::Result<bool> {
    let ok = report(state.error.as_deref());
    match format {
        OutputFormat::Table => println!("{}", renderer.detail_view(state)),
        OutputFormat::Json => println!(
            "{}",
            output::json(&serde_json::json!({"job": state.job, "executions": state.executions}))?
        ),
        OutputFormat::Csv => print!("{}", output::executions_csv(&state.executions)?),
    }
    Ok(ok && state.job.is_some())
}

async fn act(
    session: &Session,
    renderer: &Renderer,
    format: OutputFormat,
    user: Option<&str>,
    id: JobId,
    action: ActionKind,
) -> anyhow::Result<bool> {
    let user = match session.config.acting_user(user) {
        Ok(user) => user,
        Err(e) => return Ok(report(Some(e.to_string().as_str()))),
    };

    let page = session.job_detail(id);
    page.mount().await;

    let outcome = page.dispatch(action, &user).await;
    log::info!("{} on job {}: {:?}", action, id, outcome);
    let ok = print_detail(renderer, format, &page.snapshot())?;
    Ok(ok && outcome == Dispatch::Completed)
}

async fn register(session: &Session, renderer: &Renderer, format: OutputFormat, mut form: RegisterForm) -> anyhow::Result<bool> {
    let page = session.jobs();
    page.open_register();

    if !form.submit(&page).await {
        return Ok(report(form.error.as_deref()));
    }

    eprintln!("Job registered.");
    let state = page.snapshot();
    print_view(format, &state.jobs, || renderer.jobs_view(&state), output::jobs_csv)?;
    Ok(report(state.error.as_deref()))
}
