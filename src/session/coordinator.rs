use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{self, DownloadReport};
use crate::core::params::ProcessingParams;
use crate::core::processing::{ProcessingJob, ProcessingReport};
use crate::core::validate::{RawSearchInputs, validate_search_inputs};
use crate::error::{Error, Result};
use crate::io::catalog::{BearerToken, CatalogClient, CatalogError, ProductRecord};
use crate::io::engine::ProcessingEngine;
use crate::session::events::{Event, Reporter, TaskKind};
use crate::types::NotificationKind;

/// State owned by the foreground coordinator. Workers only ever see snapshots.
#[derive(Debug, Default)]
struct Session {
    token: Option<Arc<BearerToken>>,
    products: Arc<Vec<ProductRecord>>,
    download_dir: Option<PathBuf>,
    download_enabled: bool,
}

enum TaskOutput {
    Search(Result<Vec<ProductRecord>>),
    Download(Result<DownloadReport>),
    Processing(Result<ProcessingReport>),
}

/// Foreground coordinator: starts one worker per long-running task and applies their
/// results. All session mutation happens here, on the caller's thread.
pub struct Coordinator<E: ProcessingEngine + 'static> {
    client: CatalogClient,
    engine: Arc<E>,
    processing: ProcessingParams,
    session: Session,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    tasks: HashMap<TaskKind, JoinHandle<TaskOutput>>,
    /// Events already applied but not yet handed to the caller
    pending: VecDeque<Event>,
    last_processing: Option<ProcessingReport>,
    last_download: Option<DownloadReport>,
}

impl<E: ProcessingEngine + 'static> Coordinator<E> {
    pub fn new(client: CatalogClient, engine: E, processing: ProcessingParams) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            engine: Arc::new(engine),
            processing,
            session: Session::default(),
            tx,
            rx,
            tasks: HashMap::new(),
            pending: VecDeque::new(),
            last_processing: None,
            last_download: None,
        }
    }

    fn reporter(&self) -> Reporter {
        Reporter::new(self.tx.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.token.is_some()
    }

    /// Products of the most recent completed search
    pub fn products(&self) -> &[ProductRecord] {
        &self.session.products
    }

    pub fn download_enabled(&self) -> bool {
        self.session.download_enabled
    }

    pub fn last_download(&self) -> Option<&DownloadReport> {
        self.last_download.as_ref()
    }

    pub fn last_processing(&self) -> Option<&ProcessingReport> {
        self.last_processing.as_ref()
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.tasks
            .get(&kind)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn has_running_tasks(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Exchange credentials for a bearer token, replacing any previous one.
    ///
    /// Running workers keep the token they were started with.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let reporter = self.reporter();
        match self.client.authenticate(username, password) {
            Ok(token) => {
                self.session.token = Some(Arc::new(token));
                reporter.info("Login successful");
                Ok(())
            }
            Err(e) => {
                self.session.token = None;
                reporter.error(e.to_string());
                reporter.notify(NotificationKind::Error, "Login failed", e.to_string());
                Err(e.into())
            }
        }
    }

    fn token(&self) -> Result<Arc<BearerToken>> {
        match &self.session.token {
            Some(token) => Ok(Arc::clone(token)),
            None => {
                self.reporter().notify(
                    NotificationKind::Error,
                    "Not logged in",
                    Error::NotAuthenticated.to_string(),
                );
                Err(Error::NotAuthenticated)
            }
        }
    }

    /// Reject a second task of the same kind; reap it first if it already finished.
    fn ensure_idle(&mut self, kind: TaskKind) -> Result<()> {
        if self.is_running(kind) {
            warn!("Rejected {} request: task still running", kind);
            return Err(Error::TaskBusy(kind));
        }
        if self.tasks.contains_key(&kind) {
            // A finished worker has already queued its TaskFinished event
            self.pump();
            self.collect(kind);
        }
        Ok(())
    }

    fn spawn<F>(&mut self, kind: TaskKind, work: F) -> Result<()>
    where
        F: FnOnce(&Reporter) -> TaskOutput + Send + 'static,
    {
        let reporter = self.reporter();
        let handle = std::thread::Builder::new()
            .name(format!("s2water-{}", kind))
            .spawn(move || {
                let output = work(&reporter);
                reporter.send(Event::TaskFinished(kind));
                output
            })?;
        debug!("Started {} task", kind);
        self.tasks.insert(kind, handle);
        Ok(())
    }

    /// Validate the inputs and start a catalog search in the background.
    ///
    /// The previous product list is discarded before the search starts.
    pub fn start_search(&mut self, raw: RawSearchInputs) -> Result<()> {
        self.ensure_idle(TaskKind::Search)?;
        let token = self.token()?;
        let today = chrono::Local::now().date_naive();
        let criteria = match validate_search_inputs(&raw, today) {
            Ok(criteria) => criteria,
            Err(errors) => {
                self.reporter()
                    .notify(NotificationKind::Error, "Invalid input", errors.to_string());
                return Err(errors.into());
            }
        };

        self.session.products = Arc::new(Vec::new());
        self.session.download_enabled = false;
        self.session.download_dir = Some(criteria.output_dir.clone());

        let client = self.client.clone();
        self.spawn(TaskKind::Search, move |reporter| {
            TaskOutput::Search(api::search_products(&client, &token, &criteria, reporter))
        })
    }

    /// Download every product of the last search into its output folder.
    pub fn start_download(&mut self) -> Result<()> {
        self.ensure_idle(TaskKind::Download)?;
        let folder = match (&self.session.download_dir, self.session.products.is_empty()) {
            (Some(folder), false) => folder.clone(),
            _ => {
                self.reporter().notify(
                    NotificationKind::Error,
                    "Download",
                    Error::NoProducts.to_string(),
                );
                return Err(Error::NoProducts);
            }
        };
        let token = self.token()?;
        let products = Arc::clone(&self.session.products);
        let client = self.client.clone();
        self.spawn(TaskKind::Download, move |reporter| {
            TaskOutput::Download(api::download_products(
                &client, &token, &products, &folder, reporter,
            ))
        })
    }

    /// Start processing `job` in the background.
    pub fn start_processing(&mut self, job: ProcessingJob) -> Result<()> {
        self.ensure_idle(TaskKind::Processing)?;
        let engine = Arc::clone(&self.engine);
        let params = self.processing.clone();
        self.spawn(TaskKind::Processing, move |reporter| {
            TaskOutput::Processing(api::process_directory(&*engine, &job, &params, reporter))
        })
    }

    fn expire_session(&mut self) {
        if self.session.token.take().is_some() {
            warn!("Session rejected by the catalog; log in again");
        }
    }

    /// Join a finished worker and apply its result to the session.
    fn collect(&mut self, kind: TaskKind) {
        let Some(handle) = self.tasks.remove(&kind) else {
            return;
        };
        let output = match handle.join() {
            Ok(output) => output,
            Err(_) => {
                let reporter = self.reporter();
                reporter.error(format!("The {} task terminated unexpectedly", kind));
                reporter.notify(
                    NotificationKind::Error,
                    "Error",
                    format!("The {} task terminated unexpectedly", kind),
                );
                return;
            }
        };

        match output {
            TaskOutput::Search(Ok(products)) => {
                info!("Search finished with {} products", products.len());
                self.session.download_enabled = !products.is_empty();
                self.session.products = Arc::new(products);
            }
            TaskOutput::Search(Err(e)) => {
                self.session.download_enabled = false;
                if matches!(e, Error::Catalog(CatalogError::Unauthorized(_))) {
                    self.expire_session();
                }
            }
            TaskOutput::Download(Ok(report)) => {
                if report.session_expired {
                    self.expire_session();
                }
                self.last_download = Some(report);
            }
            TaskOutput::Download(Err(e)) => debug!("Download task ended with {}", e),
            TaskOutput::Processing(Ok(report)) => self.last_processing = Some(report),
            TaskOutput::Processing(Err(e)) => debug!("Processing task ended with {}", e),
        }
    }

    fn apply(&mut self, event: &Event) {
        match event {
            Event::DownloadEnabled(enabled) => self.session.download_enabled = *enabled,
            Event::TaskFinished(kind) => self.collect(*kind),
            Event::Log(_) | Event::Notify { .. } => {}
        }
    }

    fn pump(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.apply(&event);
            self.pending.push_back(event);
        }
    }

    fn reap_finished(&mut self) {
        let finished: Vec<TaskKind> = self
            .tasks
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(kind, _)| *kind)
            .collect();
        if finished.is_empty() {
            return;
        }
        self.pump();
        for kind in finished {
            self.collect(kind);
        }
        // collect may have reported a dead worker
        self.pump();
    }

    /// Drain pending events without blocking.
    pub fn poll(&mut self) -> Vec<Event> {
        self.pump();
        self.reap_finished();
        self.pending.drain(..).collect()
    }

    /// Block until the next event arrives. Returns `None` once the queue is empty and no
    /// task is left running.
    pub fn next_event(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            match self.rx.recv_timeout(Duration::from_millis(100)) {
                Ok(event) => {
                    self.apply(&event);
                    return Some(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    // a worker that panicked never sends TaskFinished
                    self.reap_finished();
                    if self.tasks.is_empty() && self.pending.is_empty() {
                        return None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}
