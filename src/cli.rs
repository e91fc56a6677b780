use crate::diagram::{DiagramOptions, Direction, OutputFormat, OutputTarget};
use crate::error::{Error, Result};
use crate::kubernetes::ClusterConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "k8s-diagrams")]
#[command(about = "Create Graphviz diagrams of a namespace from the Kubernetes API")]
pub struct Cli {
    /// Namespace
    #[arg(short = 'n', long, default_value = "default")]
    pub namespace: String,

    /// Path to the kubeconfig file (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(short = 'k', long)]
    pub kubeconfig: Option<PathBuf>,

    /// Context
    #[arg(long)]
    pub context: Option<String>,

    /// Output filename, without extension
    #[arg(short = 'f', long, default_value = "k8s")]
    pub filename: String,

    /// Output directory
    #[arg(short = 'd', long, default_value = "diagrams")]
    pub directory: PathBuf,

    /// Diagram label
    #[arg(short = 'l', long, default_value = "Kubernetes")]
    pub label: String,

    /// Output format (png, jpg, svg, pdf, dot)
    #[arg(long, default_value = "png")]
    pub format: OutputFormat,

    /// Layout direction (LR, RL, TB, BT)
    #[arg(long, default_value = "LR")]
    pub direction: Direction,

    /// Draw all resources inside a namespace cluster
    #[arg(long)]
    pub group_by_namespace: bool,

    /// Draw an endpoints node between each service and its pods
    #[arg(long)]
    pub include_endpoints: bool,

    /// Fetch replica sets and draw them between deployments and pods
    #[arg(long)]
    pub include_replica_sets: bool,

    /// Graphviz program used for rendering
    #[arg(long, env = "GRAPHVIZ_DOT", default_value = "dot")]
    pub graphviz: PathBuf,

    /// Print the resolved resources as YAML instead of rendering a diagram
    #[arg(long)]
    pub print: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramConfig {
    pub namespace: String,
    pub cluster: ClusterConfig,
    pub label: String,
    pub output: OutputTarget,
    pub options: DiagramOptions,
    pub graphviz: PathBuf,
    pub print_only: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<DiagramConfig> {
        if self.namespace.trim().is_empty() {
            return Err(Error::InvalidConfig("namespace must not be empty".into()));
        }
        if self.filename.trim().is_empty() {
            return Err(Error::InvalidConfig("filename must not be empty".into()));
        }
        if self.filename.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "filename '{}' must not contain a path separator, use --directory",
                self.filename
            )));
        }

        Ok(DiagramConfig {
            namespace: self.namespace,
            cluster: ClusterConfig {
                kubeconfig: self.kubeconfig,
                context: self.context,
            },
            label: self.label,
            output: OutputTarget {
                directory: self.directory,
                filename: self.filename,
                format: self.format,
            },
            options: DiagramOptions {
                group_by_namespace: self.group_by_namespace,
                include_endpoints: self.include_endpoints,
                include_replica_sets: self.include_replica_sets,
                direction: self.direction,
            },
            graphviz: self.graphviz,
            print_only: self.print,
        })
    }
}
