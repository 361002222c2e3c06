#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use s2water::core::params::{CatalogConfig, DownloadConfig};
use s2water::io::engine::{EngineError, OperatorParams, ProcessingEngine};
use s2water::io::http::{HttpResponse, HttpTransport, TransportError};
use s2water::{CatalogClient, Event, ProductRecord, Reporter};

/// One request seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub bearer: Option<String>,
}

type Reply = Box<dyn Fn() -> HttpResponse + Send + Sync>;

/// Transport answering from a fixed url -> reply table and recording every request
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, Reply>,
    pub requests: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(mut self, url: &str, reply: F) -> Self
    where
        F: Fn() -> HttpResponse + Send + Sync + 'static,
    {
        self.routes.insert(url.to_string(), Box::new(reply));
        self
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(&self, recorded: Recorded) -> Result<HttpResponse, TransportError> {
        let url = recorded.url.clone();
        self.requests.lock().unwrap().push(recorded);
        match self.routes.get(&url) {
            Some(reply) => Ok(reply()),
            None => Err(TransportError::Request {
                url,
                reason: "no route".to_string(),
            }),
        }
    }
}

impl HttpTransport for MockTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        self.answer(Recorded {
            method: "POST",
            url: url.to_string(),
            query: Vec::new(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            bearer: None,
        })
    }

    fn get_with_bearer(
        &self,
        url: &str,
        query: &[(&str, String)],
        bearer_token: &str,
    ) -> Result<HttpResponse, TransportError> {
        self.answer(Recorded {
            method: "GET",
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            form: Vec::new(),
            bearer: Some(bearer_token.to_string()),
        })
    }
}

pub fn respond(status: u16, body: impl Into<Vec<u8>>) -> HttpResponse {
    HttpResponse {
        status,
        location: None,
        body: Box::new(Cursor::new(body.into())),
    }
}

pub fn redirect(status: u16, location: &str) -> HttpResponse {
    HttpResponse {
        status,
        location: Some(location.to_string()),
        body: Box::new(Cursor::new(Vec::new())),
    }
}

/// Body that yields `prefix` and then fails like a dropped connection
pub struct BrokenBody {
    prefix: Vec<u8>,
    sent: bool,
}

impl BrokenBody {
    pub fn new(prefix: &[u8]) -> Self {
        Self {
            prefix: prefix.to_vec(),
            sent: false,
        }
    }
}

impl Read for BrokenBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.sent {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        self.sent = true;
        let n = self.prefix.len().min(buf.len());
        buf[..n].copy_from_slice(&self.prefix[..n]);
        Ok(n)
    }
}

pub fn client(transport: Arc<MockTransport>) -> CatalogClient {
    CatalogClient::new(transport, CatalogConfig::default(), DownloadConfig::default())
}

pub fn product(id: &str, name: &str) -> ProductRecord {
    ProductRecord {
        id: id.to_string(),
        name: name.to_string(),
        content_length: None,
        content_date: None,
        online: Some(true),
    }
}

pub fn reporter() -> (Reporter, Receiver<Event>) {
    let (tx, rx) = mpsc::channel();
    (Reporter::new(tx), rx)
}

pub fn notifications(events: &[Event]) -> Vec<(s2water::NotificationKind, String, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Notify {
                kind,
                title,
                message,
            } => Some((*kind, title.clone(), message.clone())),
            _ => None,
        })
        .collect()
}

pub fn log_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Log(entry) => Some(entry.message.clone()),
            _ => None,
        })
        .collect()
}

/// GeoJSON polygon in WGS-84 covering a small lake
pub fn write_wgs84_aoi(dir: &Path) -> PathBuf {
    let path = dir.join("aoi.geojson");
    std::fs::write(
        &path,
        r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "properties": {},
    "geometry": {
      "type": "Polygon",
      "coordinates": [[[14.0, 49.5], [14.5, 49.5], [14.5, 50.0], [14.0, 50.0], [14.0, 49.5]]]
    }
  }]
}"#,
    )
    .unwrap();
    path
}

/// One call seen by [`MockEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Read(PathBuf),
    Create(String, OperatorParams),
    Write(PathBuf, String),
}

/// Engine recording the operator chain; products are plain call counters
#[derive(Default)]
pub struct MockEngine {
    pub calls: Mutex<Vec<EngineCall>>,
    /// Descriptor paths containing this text fail on read
    pub fail_on: Option<String>,
}

impl MockEngine {
    pub fn failing_on(pattern: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(pattern.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operators(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Create(op, _) => Some(op),
                _ => None,
            })
            .collect()
    }
}

impl ProcessingEngine for MockEngine {
    type Product = usize;

    fn read_product(&self, descriptor: &Path) -> Result<usize, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push(EngineCall::Read(descriptor.to_path_buf()));
        if let Some(pattern) = &self.fail_on {
            if descriptor.to_string_lossy().contains(pattern.as_str()) {
                return Err(EngineError::Operator {
                    operator: "Read".to_string(),
                    reason: "corrupt product".to_string(),
                });
            }
        }
        Ok(1)
    }

    fn create_product(
        &self,
        operator: &str,
        params: &OperatorParams,
        source: usize,
    ) -> Result<usize, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push(EngineCall::Create(operator.to_string(), params.clone()));
        Ok(source + 1)
    }

    fn write_product(
        &self,
        _product: usize,
        target: &Path,
        format: &str,
    ) -> Result<PathBuf, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push(EngineCall::Write(target.to_path_buf(), format.to_string()));
        let written = s2water::io::engine::written_path(target, format);
        std::fs::write(&written, b"DIMAP")?;
        Ok(written)
    }
}

/// Create `<root>/<name>` with a metadata descriptor inside
pub fn make_product_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("MTD_MSIL1C.xml"), "<n1:Level-1C_User_Product/>").unwrap();
    dir
}
