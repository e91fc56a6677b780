use crate::error::{Error, Result};
use crate::resolver::Topology;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    LeftRight,
    RightLeft,
    TopBottom,
    BottomTop,
}

impl Direction {
    fn rankdir(self) -> &'static str {
        match self {
            Direction::LeftRight => "LR",
            Direction::RightLeft => "RL",
            Direction::TopBottom => "TB",
            Direction::BottomTop => "BT",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LR" => Ok(Direction::LeftRight),
            "RL" => Ok(Direction::RightLeft),
            "TB" => Ok(Direction::TopBottom),
            "BT" => Ok(Direction::BottomTop),
            _ => Err(format!("unknown direction '{}', expected LR, RL, TB or BT", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpg,
    Svg,
    Pdf,
    Dot,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Dot => "dot",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            "dot" | "gv" => Ok(OutputFormat::Dot),
            _ => Err(format!("unsupported output format '{}'", s)),
        }
    }
}

/// Layout choices that do not change which resources are associated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagramOptions {
    pub group_by_namespace: bool,
    pub include_endpoints: bool,
    pub include_replica_sets: bool,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Pod,
    Service,
    Endpoints,
    Deployment,
    ReplicaSet,
}

impl NodeKind {
    fn prefix(self) -> &'static str {
        match self {
            NodeKind::Pod => "pod",
            NodeKind::Service => "svc",
            NodeKind::Endpoints => "ep",
            NodeKind::Deployment => "deploy",
            NodeKind::ReplicaSet => "rs",
        }
    }

    fn shape(self) -> &'static str {
        match self {
            NodeKind::Pod => "box",
            NodeKind::Service => "ellipse",
            NodeKind::Endpoints => "point",
            NodeKind::Deployment => "box3d",
            NodeKind::ReplicaSet => "component",
        }
    }

    fn color(self) -> &'static str {
        match self {
            NodeKind::Pod => "#326ce5",
            NodeKind::Service => "#2e8b57",
            NodeKind::Endpoints => "#2e8b57",
            NodeKind::Deployment => "#c71585",
            NodeKind::ReplicaSet => "#b8860b",
        }
    }
}

/// Handle to a node registered on a [`Diagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Diagram {
    pub label: String,
    pub cluster: Option<String>,
    pub direction: Direction,
    nodes: Vec<Node>,
    edges: Vec<(NodeId, NodeId)>,
    index: HashMap<(NodeKind, String), NodeId>,
}

impl Diagram {
    pub fn new(label: impl Into<String>, direction: Direction) -> Self {
        Self {
            label: label.into(),
            cluster: None,
            direction,
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a node, returning the existing handle if the same resource
    /// was added before.
    pub fn add_node(&mut self, kind: NodeKind, name: &str) -> NodeId {
        if let Some(id) = self.find(kind, name) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            name: name.to_string(),
        });
        self.index.insert((kind, name.to_string()), id);
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if !self.edges.contains(&(from, to)) {
            self.edges.push((from, to));
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    pub fn find(&self, kind: NodeKind, name: &str) -> Option<NodeId> {
        self.index.get(&(kind, name.to_string())).copied()
    }

    fn dot_id(&self, id: NodeId) -> String {
        format!("{}_{}", self.node(id).kind.prefix(), id.0)
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        let _ = self.write_dot(&mut out);
        out
    }

    fn write_dot(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "digraph {} {{", quote(&self.label))?;
        writeln!(out, "  label={};", quote(&self.label))?;
        writeln!(out, "  labelloc=\"t\";")?;
        writeln!(out, "  rankdir={};", self.direction.rankdir())?;
        writeln!(out, "  fontname=\"Sans-Serif\";")?;
        writeln!(out, "  node [fontname=\"Sans-Serif\", fontsize=12];")?;
        writeln!(out, "  edge [color=\"#7b8894\"];")?;

        let indent = if let Some(ns) = &self.cluster {
            writeln!(out, "  subgraph \"cluster_namespace\" {{")?;
            writeln!(out, "    label={};", quote(ns))?;
            writeln!(out, "    style=\"dashed\";")?;
            "    "
        } else {
            "  "
        };

        for (i, node) in self.nodes.iter().enumerate() {
            let label = match node.kind {
                NodeKind::Endpoints => format!("{} endpoints", node.name),
                _ => node.name.clone(),
            };
            writeln!(
                out,
                "{}{} [label={}, shape={}, color={}];",
                indent,
                self.dot_id(NodeId(i)),
                quote(&label),
                node.kind.shape(),
                quote(node.kind.color()),
            )?;
        }

        if self.cluster.is_some() {
            writeln!(out, "  }}")?;
        }

        for (from, to) in &self.edges {
            writeln!(out, "  {} -> {};", self.dot_id(*from), self.dot_id(*to))?;
        }
        writeln!(out, "}}")
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Register every resolved resource and relationship on a new diagram.
pub fn build_diagram(label: &str, topology: &Topology<'_>, options: &DiagramOptions) -> Diagram {
    let mut diagram = Diagram::new(label, options.direction);
    if options.group_by_namespace {
        diagram.cluster = Some(topology.namespace.to_string());
    }

    for group in &topology.services {
        let svc = diagram.add_node(NodeKind::Service, &group.service.name);
        let upstream = if options.include_endpoints {
            let ep = diagram.add_node(NodeKind::Endpoints, &group.service.name);
            diagram.add_edge(svc, ep);
            ep
        } else {
            svc
        };
        for pod in &group.pods {
            let pod = diagram.add_node(NodeKind::Pod, &pod.name);
            diagram.add_edge(upstream, pod);
        }
    }

    for group in &topology.deployments {
        let deploy = diagram.add_node(NodeKind::Deployment, &group.deployment.name);
        if options.include_replica_sets && !group.replica_sets.is_empty() {
            for rs in &group.replica_sets {
                let rs = diagram.add_node(NodeKind::ReplicaSet, &rs.name);
                diagram.add_edge(deploy, rs);
                for pod in &group.pods {
                    let pod = diagram.add_node(NodeKind::Pod, &pod.name);
                    diagram.add_edge(rs, pod);
                }
            }
        } else {
            for pod in &group.pods {
                let pod = diagram.add_node(NodeKind::Pod, &pod.name);
                diagram.add_edge(deploy, pod);
            }
        }
    }

    for pod in topology.pods {
        diagram.add_node(NodeKind::Pod, &pod.name);
    }

    debug!(
        "Built diagram with {} nodes and {} edges",
        diagram.nodes().len(),
        diagram.edges().len()
    );
    diagram
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub filename: String,
    pub format: OutputFormat,
}

impl OutputTarget {
    pub fn path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.filename, self.format.extension()))
    }
}

/// Renders diagrams by piping DOT into a Graphviz program.
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    program: PathBuf,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self::new("dot")
    }
}

impl GraphvizRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn render(&self, diagram: &Diagram, target: &OutputTarget) -> Result<PathBuf> {
        let path = target.path();
        let unavailable = |reason: String| Error::RenderingUnavailable {
            path: path.clone(),
            reason,
        };

        std::fs::create_dir_all(&target.directory).map_err(|e| {
            unavailable(format!(
                "cannot create directory {}: {}",
                target.directory.display(),
                e
            ))
        })?;

        let dot = diagram.to_dot();
        if target.format == OutputFormat::Dot {
            std::fs::write(&path, dot).map_err(|e| unavailable(e.to_string()))?;
        } else {
            self.run_graphviz(&dot, target.format, &path)
                .map_err(unavailable)?;
        }

        info!("Diagram written to {}", path.display());
        Ok(path)
    }

    fn run_graphviz(
        &self,
        dot: &str,
        format: OutputFormat,
        path: &Path,
    ) -> std::result::Result<(), String> {
        debug!(
            "Running {} -T{} -o {}",
            self.program.display(),
            format.extension(),
            path.display()
        );
        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", format.extension()))
            .arg("-o")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("cannot run {}: {}", self.program.display(), e))?;

        // stdin is dropped before waiting so the child sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(dot.as_bytes()),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|e| format!("waiting for {}: {}", self.program.display(), e))?;
        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        written.map_err(|e| format!("writing to {}: {}", self.program.display(), e))
    }
}
