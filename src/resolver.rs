//! Label based association between pods, services, deployments and replica sets.
//!
//! Two resources are associated when both carry the `app` label and the values
//! are equal. A missing `app` never matches anything, including another missing
//! `app`.

use crate::types::{DeploymentInfo, Inventory, Labels, PodInfo, ReplicaSetInfo, ServiceInfo};
use serde::Serialize;
use std::collections::HashSet;

pub const APP_LABEL: &str = "app";

pub fn app_of(labels: &Labels) -> Option<&str> {
    labels.get(APP_LABEL).map(String::as_str)
}

fn same_app(a: &Labels, b: &Labels) -> bool {
    matches!((app_of(a), app_of(b)), (Some(x), Some(y)) if x == y)
}

pub fn resolve_pods_for_service<'a>(
    pods: &'a [PodInfo],
    service: &ServiceInfo,
) -> Vec<&'a PodInfo> {
    pods.iter()
        .filter(|pod| same_app(&pod.labels, &service.selector))
        .collect()
}

/// Pods not selected by any of `services`, compared by name.
pub fn resolve_unassociated_pods<'a>(
    pods: &'a [PodInfo],
    services: &[ServiceInfo],
) -> Vec<&'a PodInfo> {
    let associated: HashSet<&str> = services
        .iter()
        .flat_map(|svc| resolve_pods_for_service(pods, svc))
        .map(|pod| pod.name.as_str())
        .collect();

    pods.iter()
        .filter(|pod| !associated.contains(pod.name.as_str()))
        .collect()
}

pub fn resolve_replica_sets_for_deployment<'a>(
    replica_sets: &'a [ReplicaSetInfo],
    deployment: &DeploymentInfo,
) -> Vec<&'a ReplicaSetInfo> {
    replica_sets
        .iter()
        .filter(|rs| same_app(&rs.labels, &deployment.labels))
        .collect()
}

pub fn resolve_pods_for_deployment<'a>(
    pods: &'a [PodInfo],
    deployment: &DeploymentInfo,
) -> Vec<&'a PodInfo> {
    pods.iter()
        .filter(|pod| same_app(&pod.labels, &deployment.labels))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceGroup<'a> {
    pub service: &'a ServiceInfo,
    pub pods: Vec<&'a PodInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentGroup<'a> {
    pub deployment: &'a DeploymentInfo,
    pub replica_sets: Vec<&'a ReplicaSetInfo>,
    pub pods: Vec<&'a PodInfo>,
}

/// Resolved view of an [`Inventory`], borrowed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology<'a> {
    pub namespace: &'a str,
    pub pods: &'a [PodInfo],
    pub services: Vec<ServiceGroup<'a>>,
    pub deployments: Vec<DeploymentGroup<'a>>,
    pub unassociated: Vec<&'a PodInfo>,
}

pub fn resolve(inventory: &Inventory) -> Topology<'_> {
    let services = inventory
        .services
        .iter()
        .map(|service| ServiceGroup {
            service,
            pods: resolve_pods_for_service(&inventory.pods, service),
        })
        .collect();

    let deployments = inventory
        .deployments
        .iter()
        .map(|deployment| DeploymentGroup {
            deployment,
            replica_sets: resolve_replica_sets_for_deployment(&inventory.replica_sets, deployment),
            pods: resolve_pods_for_deployment(&inventory.pods, deployment),
        })
        .collect();

    Topology {
        namespace: &inventory.namespace,
        pods: &inventory.pods,
        services,
        deployments,
        unassociated: resolve_unassociated_pods(&inventory.pods, &inventory.services),
    }
}
