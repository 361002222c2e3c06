use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use s2water::session::TaskKind;
use s2water::{
    AppConfig, CatalogClient, Coordinator, Event, GptEngine, NotificationKind, ProcessingJob,
    ReqwestTransport,
};

use super::args::{CliArgs, Command, Credentials, ProcessArgs, SearchArgs};
use super::errors::AppError;

type Runner = Coordinator<GptEngine>;

fn print_event(event: &Event, echo_logs: bool) {
    match event {
        Event::Log(entry) if echo_logs => println!("{}", entry),
        Event::Notify {
            kind,
            title,
            message,
        } => match kind {
            NotificationKind::Info => println!("[{}] {}: {}", kind, title, message),
            NotificationKind::Error => eprintln!("[{}] {}: {}", kind, title, message),
        },
        _ => {}
    }
}

/// Print events until every task has finished; returns the number of error notifications.
fn drain(coordinator: &mut Runner, echo_logs: bool) -> usize {
    let mut errors = 0;
    while let Some(event) = coordinator.next_event() {
        if matches!(
            event,
            Event::Notify {
                kind: NotificationKind::Error,
                ..
            }
        ) {
            errors += 1;
        }
        print_event(&event, echo_logs);
    }
    errors
}

/// Start a task, wait for it, and fail if it raised an error notification.
fn run_task<F>(
    coordinator: &mut Runner,
    kind: TaskKind,
    echo_logs: bool,
    start: F,
) -> Result<(), AppError>
where
    F: FnOnce(&mut Runner) -> s2water::Result<()>,
{
    let started = start(coordinator);
    let errors = drain(coordinator, echo_logs);
    started?;
    if errors > 0 {
        return Err(AppError::TaskFailed {
            task: kind.to_string(),
        });
    }
    Ok(())
}

fn login(
    coordinator: &mut Runner,
    credentials: &Credentials,
    echo_logs: bool,
) -> Result<(), AppError> {
    let result = coordinator.login(&credentials.username, &credentials.password);
    drain(coordinator, echo_logs);
    Ok(result?)
}

fn search(coordinator: &mut Runner, args: &SearchArgs, echo_logs: bool) -> Result<(), AppError> {
    login(coordinator, &args.credentials, echo_logs)?;
    let raw = args.raw_inputs();
    run_task(coordinator, TaskKind::Search, echo_logs, |c| c.start_search(raw))?;
    info!("{} products in the current list", coordinator.products().len());
    Ok(())
}

fn download(coordinator: &mut Runner, args: &SearchArgs, echo_logs: bool) -> Result<(), AppError> {
    search(coordinator, args, echo_logs)?;
    if !coordinator.download_enabled() {
        debug!("Nothing to download");
        return Ok(());
    }
    run_task(coordinator, TaskKind::Download, echo_logs, |c| c.start_download())?;
    match coordinator.last_download() {
        Some(report) if !report.failed.is_empty() => Err(AppError::PartialDownload {
            failed: report.failed.len(),
            total: report.failed.len() + report.saved.len(),
        }),
        _ => Ok(()),
    }
}

fn process(coordinator: &mut Runner, args: &ProcessArgs, echo_logs: bool) -> Result<(), AppError> {
    let job = ProcessingJob {
        input_dir: args.input_dir.clone(),
        output_dir: args.output_dir.clone(),
        aoi: args.aoi.clone(),
        layers: args.layers(),
    };
    run_task(coordinator, TaskKind::Processing, echo_logs, |c| {
        c.start_processing(job)
    })
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    // With tracing enabled the reporter already mirrors every log line
    let echo_logs = !args.log;

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    debug!("Configuration: {:?}", config);

    let mut processing = config.processing.clone();
    if let Command::Process(p) = &args.command {
        processing.continue_on_error |= p.continue_on_error;
    }

    let transport =
        ReqwestTransport::new(config.catalog.timeout_secs.map(Duration::from_secs))
            .map_err(AppError::from)?;
    let client = CatalogClient::new(
        Arc::new(transport),
        config.catalog.clone(),
        config.download.clone(),
    );
    let engine = GptEngine::new(&config.engine);
    let mut coordinator = Coordinator::new(client, engine, processing);

    match &args.command {
        Command::Search(a) => search(&mut coordinator, a, echo_logs)?,
        Command::Download(a) => download(&mut coordinator, a, echo_logs)?,
        Command::Process(a) => process(&mut coordinator, a, echo_logs)?,
    }

    Ok(())
}
