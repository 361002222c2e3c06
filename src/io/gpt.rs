//! SNAP Graph Processing Tool (`gpt`) backend for [`ProcessingEngine`].
//!
//! Product handles are processing graphs under construction. Nothing runs until
//! `write_product`, which serializes the graph with a trailing `Write` node and hands it
//! to `gpt` in one invocation.
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::{debug, info, warn};

use crate::core::params::EngineConfig;
use crate::io::engine::{EngineError, OperatorParams, ParamValue, ProcessingEngine, written_path};

#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub operator: String,
    pub source: Option<String>,
    pub params: OperatorParams,
}

/// Linear processing graph: each node consumes the previous one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapGraph {
    nodes: Vec<GraphNode>,
}

impl SnapGraph {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    fn push(mut self, operator: &str, params: OperatorParams) -> Self {
        let stem: String = operator
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let taken = self.nodes.iter().filter(|n| n.id.starts_with(&stem)).count();
        let id = if taken == 0 {
            stem
        } else {
            format!("{}_{}", stem, taken + 1)
        };
        let source = self.nodes.last().map(|n| n.id.clone());
        self.nodes.push(GraphNode {
            id,
            operator: operator.to_string(),
            source,
            params,
        });
        self
    }

    /// Serialize to gpt's graph XML.
    pub fn to_xml(&self) -> Result<String, EngineError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_graph(&mut writer, &self.nodes).map_err(|e| EngineError::Graph(e.to_string()))?;
        String::from_utf8(writer.into_inner()).map_err(|e| EngineError::Graph(e.to_string()))
    }
}

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn write_graph<W: std::io::Write>(
    writer: &mut Writer<W>,
    nodes: &[GraphNode],
) -> quick_xml::Result<()> {
    let mut graph = BytesStart::new("graph");
    graph.push_attribute(("id", "s2water"));
    writer.write_event(Event::Start(graph))?;
    text_element(writer, "version", "1.0")?;

    for node in nodes {
        let mut start = BytesStart::new("node");
        start.push_attribute(("id", node.id.as_str()));
        writer.write_event(Event::Start(start))?;
        text_element(writer, "operator", &node.operator)?;

        match &node.source {
            Some(source) => {
                writer.write_event(Event::Start(BytesStart::new("sources")))?;
                let mut src = BytesStart::new("sourceProduct");
                src.push_attribute(("refid", source.as_str()));
                writer.write_event(Event::Empty(src))?;
                writer.write_event(Event::End(BytesEnd::new("sources")))?;
            }
            None => writer.write_event(Event::Empty(BytesStart::new("sources")))?,
        }

        writer.write_event(Event::Start(BytesStart::new("parameters")))?;
        for (name, value) in node.params.iter() {
            text_element(writer, name, &value.to_string())?;
        }
        writer.write_event(Event::End(BytesEnd::new("parameters")))?;
        writer.write_event(Event::End(BytesEnd::new("node")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("graph")))
}

/// Runs SNAP graphs through the `gpt` command-line tool
#[derive(Debug, Clone)]
pub struct GptEngine {
    gpt_path: PathBuf,
    extra_args: Vec<String>,
}

impl GptEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            gpt_path: config.gpt_path.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    fn run_graph(&self, graph: &SnapGraph) -> Result<(), EngineError> {
        let xml = graph.to_xml()?;
        let mut file = tempfile::Builder::new()
            .prefix("s2water-graph-")
            .suffix(".xml")
            .tempfile()?;
        file.write_all(xml.as_bytes())?;
        file.flush()?;
        debug!("Graph written to {:?}:\n{}", file.path(), xml);

        let program = self.gpt_path.display().to_string();
        info!("Running {} on {} graph nodes", program, graph.nodes().len());
        let output = Command::new(&self.gpt_path)
            .args(&self.extra_args)
            .arg(file.path())
            .output()
            .map_err(|e| EngineError::Launch {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!("gpt: {}", line);
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("gpt failed with {}", output.status);
            return Err(EngineError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(())
    }
}

impl ProcessingEngine for GptEngine {
    type Product = SnapGraph;

    fn read_product(&self, descriptor: &Path) -> Result<SnapGraph, EngineError> {
        let params = OperatorParams::new().with(
            "file",
            ParamValue::Text(descriptor.display().to_string()),
        );
        Ok(SnapGraph::default().push("Read", params))
    }

    fn create_product(
        &self,
        operator: &str,
        params: &OperatorParams,
        source: SnapGraph,
    ) -> Result<SnapGraph, EngineError> {
        Ok(source.push(operator, params.clone()))
    }

    fn write_product(
        &self,
        product: SnapGraph,
        target: &Path,
        format: &str,
    ) -> Result<PathBuf, EngineError> {
        let params = OperatorParams::new()
            .with("file", ParamValue::Text(target.display().to_string()))
            .with("formatName", ParamValue::Text(format.to_string()));
        let graph = product.push("Write", params);
        self.run_graph(&graph)?;
        Ok(written_path(target, format))
    }
}
