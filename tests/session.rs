mod common;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use common::*;
use s2water::core::params::ProcessingParams;
use s2water::core::validate::RawSearchInputs;
use s2water::io::engine::{EngineError, OperatorParams, ProcessingEngine};
use s2water::session::TaskKind;
use s2water::{
    Coordinator, Error, Event, NotificationKind, OutputLayers, ProcessingJob, ProductLevel,
};

const CATALOG: &str = "https://catalogue.dataspace.copernicus.eu/odata/v1/Products";
const IDENTITY: &str =
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";

fn drain<E: ProcessingEngine + 'static>(coordinator: &mut Coordinator<E>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = coordinator.next_event() {
        events.push(event);
    }
    events
}

fn raw_inputs(dir: &Path) -> RawSearchInputs {
    RawSearchInputs {
        level: ProductLevel::Level2A,
        date_from: "2024-05-01".to_string(),
        date_to: "2024-05-10".to_string(),
        cloud_cover: "20,5".to_string(),
        aoi_path: write_wgs84_aoi(dir),
        output_dir: dir.to_path_buf(),
    }
}

fn catalog_transport() -> MockTransport {
    MockTransport::new()
        .route(IDENTITY, || respond(200, r#"{"access_token":"session-1"}"#))
        .route(CATALOG, || {
            respond(
                200,
                r#"{"value": [{"Id": "1", "Name": "S2A_one.SAFE"}, {"Id": "2", "Name": "S2B_two.SAFE"}]}"#,
            )
        })
        .route(&format!("{}(1)/$value", CATALOG), || respond(200, "one"))
        .route(&format!("{}(2)/$value", CATALOG), || respond(200, "two"))
}

fn coordinator(transport: Arc<MockTransport>) -> Coordinator<MockEngine> {
    Coordinator::new(client(transport), MockEngine::default(), ProcessingParams::default())
}

#[test]
fn search_requires_login() {
    let transport = Arc::new(catalog_transport());
    let mut c = coordinator(transport.clone());
    let dir = tempfile::tempdir().unwrap();

    let err = c.start_search(raw_inputs(dir.path())).unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));
    let events = drain(&mut c);
    assert_eq!(notifications(&events)[0].0, NotificationKind::Error);
    assert!(transport.recorded().is_empty());
}

#[test]
fn failed_login_is_notified() {
    let transport = Arc::new(
        MockTransport::new().route(IDENTITY, || respond(401, "Invalid user credentials")),
    );
    let mut c = coordinator(transport);
    assert!(c.login("jane", "nope").is_err());
    assert!(!c.is_authenticated());
    let notes = notifications(&drain(&mut c));
    assert_eq!(notes.len(), 1);
    assert!(notes[0].2.contains("Invalid user credentials"));
}

#[test]
fn search_then_download_through_the_coordinator() {
    let transport = Arc::new(catalog_transport());
    let mut c = coordinator(transport.clone());
    let dir = tempfile::tempdir().unwrap();

    c.login("jane", "secret").unwrap();
    c.start_search(raw_inputs(dir.path())).unwrap();
    let events = drain(&mut c);
    assert!(events.contains(&Event::TaskFinished(TaskKind::Search)));
    assert_eq!(c.products().len(), 2);
    assert!(c.download_enabled());

    c.start_download().unwrap();
    let events = drain(&mut c);
    assert!(events.contains(&Event::TaskFinished(TaskKind::Download)));
    let report = c.last_download().unwrap();
    assert_eq!(report.saved.len(), 2);
    assert_eq!(std::fs::read(dir.path().join("S2A_one.zip")).unwrap(), b"one");
    assert_eq!(std::fs::read(dir.path().join("S2B_two.zip")).unwrap(), b"two");

    assert!(
        transport
            .recorded()
            .iter()
            .filter(|r| r.method == "GET")
            .all(|r| r.bearer.as_deref() == Some("session-1"))
    );
}

#[test]
fn invalid_inputs_produce_one_aggregated_notification() {
    let transport = Arc::new(catalog_transport());
    let mut c = coordinator(transport.clone());
    let dir = tempfile::tempdir().unwrap();
    c.login("jane", "secret").unwrap();

    let raw = RawSearchInputs {
        date_from: "2099-01-01".to_string(),
        date_to: "2099-01-02".to_string(),
        cloud_cover: "abc".to_string(),
        ..raw_inputs(dir.path())
    };
    let err = c.start_search(raw).unwrap_err();
    match err {
        Error::Validation(errors) => assert_eq!(errors.messages().len(), 3),
        other => panic!("unexpected error {:?}", other),
    }

    let notes = notifications(&drain(&mut c));
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].2.lines().count(), 3);
    // only the login request went out
    assert_eq!(transport.recorded().len(), 1);
}

#[test]
fn new_search_discards_previous_products() {
    let transport = Arc::new(catalog_transport());
    let mut c = coordinator(transport);
    let dir = tempfile::tempdir().unwrap();
    c.login("jane", "secret").unwrap();
    c.start_search(raw_inputs(dir.path())).unwrap();
    drain(&mut c);
    assert_eq!(c.products().len(), 2);

    c.start_search(raw_inputs(dir.path())).unwrap();
    assert!(c.products().is_empty());
    assert!(!c.download_enabled());
    drain(&mut c);
    assert_eq!(c.products().len(), 2);
}

#[test]
fn rejected_token_ends_the_session() {
    let transport = Arc::new(
        MockTransport::new()
            .route(IDENTITY, || respond(200, r#"{"access_token":"stale"}"#))
            .route(CATALOG, || respond(401, "")),
    );
    let mut c = coordinator(transport);
    let dir = tempfile::tempdir().unwrap();
    c.login("jane", "secret").unwrap();
    c.start_search(raw_inputs(dir.path())).unwrap();
    drain(&mut c);

    assert!(!c.is_authenticated());
    assert!(!c.download_enabled());
    assert!(matches!(c.start_download(), Err(Error::NoProducts)));
}

/// Engine whose first read blocks until the test releases it
struct GatedEngine {
    gate: Mutex<Receiver<()>>,
}

impl GatedEngine {
    fn new() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (Self { gate: Mutex::new(rx) }, tx)
    }
}

impl ProcessingEngine for GatedEngine {
    type Product = ();

    fn read_product(&self, _descriptor: &Path) -> Result<(), EngineError> {
        let _ = self.gate.lock().unwrap().recv();
        Ok(())
    }

    fn create_product(&self, _: &str, _: &OperatorParams, _: ()) -> Result<(), EngineError> {
        Ok(())
    }

    fn write_product(&self, _: (), target: &Path, _format: &str) -> Result<PathBuf, EngineError> {
        Ok(target.to_path_buf())
    }
}

#[test]
fn second_processing_run_is_rejected_while_the_first_is_running() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    make_product_dir(input.path(), "P.SAFE");
    let job = ProcessingJob {
        input_dir: input.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        aoi: None,
        layers: OutputLayers::default(),
    };

    let (engine, release) = GatedEngine::new();
    let transport = Arc::new(MockTransport::new());
    let mut c = Coordinator::new(client(transport), engine, ProcessingParams::default());

    c.start_processing(job.clone()).unwrap();
    assert!(c.is_running(TaskKind::Processing));
    assert!(matches!(
        c.start_processing(job.clone()),
        Err(Error::TaskBusy(TaskKind::Processing))
    ));

    release.send(()).unwrap();
    let events = drain(&mut c);
    assert!(events.contains(&Event::TaskFinished(TaskKind::Processing)));
    assert_eq!(c.last_processing().unwrap().processed.len(), 1);

    // the slot is free again once the first run has been collected
    release.send(()).unwrap();
    c.start_processing(job).unwrap();
    drain(&mut c);
    assert!(!c.has_running_tasks());
}

/// Engine that dies inside the worker thread
struct PanickingEngine;

impl ProcessingEngine for PanickingEngine {
    type Product = ();

    fn read_product(&self, _descriptor: &Path) -> Result<(), EngineError> {
        panic!("engine crashed");
    }

    fn create_product(&self, _: &str, _: &OperatorParams, _: ()) -> Result<(), EngineError> {
        Ok(())
    }

    fn write_product(&self, _: (), target: &Path, _format: &str) -> Result<PathBuf, EngineError> {
        Ok(target.to_path_buf())
    }
}

#[test]
fn crashed_worker_is_reported_before_the_event_stream_ends() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    make_product_dir(input.path(), "P.SAFE");
    let job = ProcessingJob {
        input_dir: input.path().to_path_buf(),
        output_dir: output.path().to_path_buf(),
        aoi: None,
        layers: OutputLayers::default(),
    };

    let transport = Arc::new(MockTransport::new());
    let mut c = Coordinator::new(client(transport), PanickingEngine, ProcessingParams::default());
    c.start_processing(job).unwrap();

    let events = drain(&mut c);
    assert!(!c.has_running_tasks());
    assert!(c.last_processing().is_none());
    let errors: Vec<_> = notifications(&events)
        .into_iter()
        .filter(|(kind, _, _)| *kind == NotificationKind::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].2.contains("processing task terminated unexpectedly"));
    assert!(c.poll().is_empty());
}
