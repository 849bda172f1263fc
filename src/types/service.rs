//!
//! Swarm service, as returned by `/services?status=true`
//!
use serde::Deserialize;
use std::collections::HashMap;

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Service {
    #[serde(rename = "ID", deserialize_with = "super::lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub spec: ServiceSpec,
    #[serde(deserialize_with = "super::lenient")]
    pub service_status: Option<ServiceStatus>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceSpec {
    #[serde(deserialize_with = "super::lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(deserialize_with = "super::lenient")]
    pub task_template: TaskTemplate,
    #[serde(deserialize_with = "super::lenient")]
    pub mode: Option<ServiceMode>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskTemplate {
    #[serde(deserialize_with = "super::lenient")]
    pub container_spec: ContainerSpec,
}

/// Container part of the task template
#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSpec {
    #[serde(deserialize_with = "super::lenient")]
    pub image: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub labels: Option<HashMap<String, String>>,
    /// `KEY=value` entries
    #[serde(deserialize_with = "super::lenient")]
    pub env: Option<Vec<String>>,
    #[serde(deserialize_with = "super::lenient")]
    pub mounts: Option<Vec<Mount>>,
    #[serde(deserialize_with = "super::lenient")]
    pub configs: Option<Vec<ConfigReference>>,
    #[serde(deserialize_with = "super::lenient")]
    pub secrets: Option<Vec<SecretReference>>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Mount {
    #[serde(deserialize_with = "super::lenient")]
    pub source: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub target: Option<String>,
    #[serde(rename = "Type", deserialize_with = "super::lenient")]
    pub mount_type: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ConfigReference {
    #[serde(deserialize_with = "super::lenient")]
    pub config_name: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub file: Option<FileTarget>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecretReference {
    #[serde(deserialize_with = "super::lenient")]
    pub secret_name: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub file: Option<FileTarget>,
}

/// Where a config or secret is placed in the container
#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileTarget {
    #[serde(deserialize_with = "super::lenient")]
    pub name: Option<String>,
}

/// Exactly one of the members is set by Docker
#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceMode {
    #[serde(deserialize_with = "super::lenient")]
    pub replicated: Option<Replicated>,
    #[serde(deserialize_with = "super::lenient")]
    pub global: Option<serde_json::Value>,
    #[serde(deserialize_with = "super::lenient")]
    pub replicated_job: Option<serde_json::Value>,
    #[serde(deserialize_with = "super::lenient")]
    pub global_job: Option<serde_json::Value>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Replicated {
    #[serde(deserialize_with = "super::lenient")]
    pub replicas: Option<u64>,
}

/// Task counts, only present when listing with `status=true`
#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceStatus {
    #[serde(deserialize_with = "super::lenient")]
    pub running_tasks: Option<u64>,
    #[serde(deserialize_with = "super::lenient")]
    pub desired_tasks: Option<u64>,
}

impl ServiceMode {
    /// Mode name as shown by `docker service ls`
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        if self.replicated.is_some() {
            Some("replicated")
        } else if self.global.is_some() {
            Some("global")
        } else if self.replicated_job.is_some() {
            Some("replicated-job")
        } else if self.global_job.is_some() {
            Some("global-job")
        } else {
            None
        }
    }
}
