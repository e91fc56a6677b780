use crate::cli::DiagramConfig;
use crate::diagram::{GraphvizRenderer, build_diagram};
use crate::error::Result;
use crate::kubernetes::ClusterSource;
use crate::resolver::{Topology, resolve};
use crate::types::Inventory;
use std::path::PathBuf;
use tracing::{debug, info};

/// Fetch every list the diagram needs. Nothing is written until all succeed.
pub async fn fetch_inventory<S: ClusterSource>(
    source: &S,
    namespace: &str,
    include_replica_sets: bool,
) -> Result<Inventory> {
    let pods = source.list_pods(namespace).await?;
    let services = source.list_services(namespace).await?;
    let deployments = source.list_deployments(namespace).await?;
    let replica_sets = if include_replica_sets {
        source.list_replica_sets(namespace).await?
    } else {
        Vec::new()
    };

    info!(
        "Found {} pods, {} services, {} deployments, {} replica sets in namespace {}",
        pods.len(),
        services.len(),
        deployments.len(),
        replica_sets.len(),
        namespace
    );

    Ok(Inventory {
        namespace: namespace.to_string(),
        pods,
        services,
        deployments,
        replica_sets,
    })
}

pub enum Outcome {
    Rendered(PathBuf),
    Printed(String),
}

pub async fn run<S: ClusterSource>(source: &S, config: &DiagramConfig) -> Result<Outcome> {
    let inventory = fetch_inventory(
        source,
        &config.namespace,
        config.options.include_replica_sets,
    )
    .await?;
    let topology = resolve(&inventory);
    log_topology(&topology);

    if config.print_only {
        return Ok(Outcome::Printed(serde_yaml::to_string(&topology)?));
    }

    let diagram = build_diagram(&config.label, &topology, &config.options);
    let path = GraphvizRenderer::new(&config.graphviz).render(&diagram, &config.output)?;
    Ok(Outcome::Rendered(path))
}

fn log_topology(topology: &Topology<'_>) {
    for group in &topology.services {
        debug!(
            "service {} -> [{}]",
            group.service.name,
            group.pods.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
        );
    }
    for group in &topology.deployments {
        debug!(
            "deployment {} -> {} replica sets, {} pods",
            group.deployment.name,
            group.replica_sets.len(),
            group.pods.len()
        );
    }
    if !topology.unassociated.is_empty() {
        debug!(
            "pods without a service: [{}]",
            topology
                .unassociated
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
