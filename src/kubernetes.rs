use crate::error::{Error, Result};
use crate::types::{DeploymentInfo, PodInfo, ReplicaSetInfo, ServiceInfo};
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::ListParams;
use kube::config::{self, KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, ResourceExt};
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where to find cluster credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterConfig {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

/// Namespace scoped, read-only listing of the resources a diagram is built from.
pub trait ClusterSource {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>>;
    async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceInfo>>;
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<DeploymentInfo>>;
    async fn list_replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSetInfo>>;
}

pub struct ClusterClient {
    client: Client,
}

impl ClusterClient {
    pub async fn connect(cfg: &ClusterConfig) -> Result<Self> {
        let options = KubeConfigOptions {
            context: cfg.context.clone(),
            ..Default::default()
        };

        let config = match (&cfg.kubeconfig, &cfg.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    Error::unreachable(format!("reading kubeconfig {}: {}", path.display(), e))
                })?;
                info!("Using kubeconfig: {}", path.display());
                config::Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(Error::unreachable)?
            }
            (None, Some(ctx)) => config::Config::from_kubeconfig(&options)
                .await
                .map_err(|e| {
                    Error::unreachable(format!("context '{}' not found in kubeconfig: {}", ctx, e))
                })?,
            (None, None) => config::Config::infer().await.map_err(Error::unreachable)?,
        };

        debug!("Connecting to cluster at {}", config.cluster_url);
        let client = Client::try_from(config).map_err(Error::unreachable)?;
        Ok(Self { client })
    }

    async fn list<K>(&self, resource: &'static str, namespace: &str) -> Result<Vec<K>>
    where
        K: k8s_openapi::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + k8s_openapi::Metadata<Ty = k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta>
            + serde::de::DeserializeOwned
            + serde::Serialize
            + Clone
            + Debug
            + Send
            + Sync,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| Error::from_list(resource, namespace, e))?;
        debug!("Listed {} {} in namespace {}", list.items.len(), resource, namespace);
        Ok(list.items)
    }
}

impl ClusterSource for ClusterClient {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>> {
        let pods: Vec<Pod> = self.list("pods", namespace).await?;
        Ok(pods
            .iter()
            .map(|pod| PodInfo {
                name: pod.name_any(),
                labels: pod.labels().clone(),
            })
            .collect())
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceInfo>> {
        let services: Vec<Service> = self.list("services", namespace).await?;
        Ok(services
            .iter()
            .map(|svc| ServiceInfo {
                name: svc.name_any(),
                selector: svc
                    .spec
                    .as_ref()
                    .and_then(|s| s.selector.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<DeploymentInfo>> {
        let deployments: Vec<Deployment> = self.list("deployments", namespace).await?;
        Ok(deployments
            .iter()
            .map(|deploy| DeploymentInfo {
                name: deploy.name_any(),
                labels: deploy.labels().clone(),
            })
            .collect())
    }

    async fn list_replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSetInfo>> {
        let replica_sets: Vec<ReplicaSet> = self.list("replicasets", namespace).await?;
        Ok(replica_sets
            .iter()
            .map(|rs| ReplicaSetInfo {
                name: rs.name_any(),
                labels: rs.labels().clone(),
            })
            .collect())
    }
}
