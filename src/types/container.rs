//!
//! Containers and their one-shot stats
//!
use serde::Deserialize;
use std::collections::HashMap;

/// Entry of `/containers/json`. The collector attaches the stats payload
/// under `Stats` before extraction.
#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSummary {
    #[serde(deserialize_with = "super::lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub names: Option<Vec<String>>,
    #[serde(deserialize_with = "super::lenient")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(deserialize_with = "super::lenient")]
    pub stats: Option<ContainerStats>,
}

/// Returned from `/containers/{id}/stats?stream=false`
#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContainerStats {
    #[serde(deserialize_with = "super::lenient")]
    pub cpu_stats: Option<CpuStats>,
    #[serde(deserialize_with = "super::lenient")]
    pub precpu_stats: Option<CpuStats>,
    #[serde(deserialize_with = "super::lenient")]
    pub memory_stats: Option<MemoryStats>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CpuStats {
    #[serde(deserialize_with = "super::lenient")]
    pub cpu_usage: Option<CpuUsage>,
    #[serde(deserialize_with = "super::lenient")]
    pub system_cpu_usage: Option<u64>,
    #[serde(deserialize_with = "super::lenient")]
    pub online_cpus: Option<u64>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CpuUsage {
    #[serde(deserialize_with = "super::lenient")]
    pub total_usage: Option<u64>,
    /// Only reported on cgroup v1 hosts
    #[serde(deserialize_with = "super::lenient")]
    pub percpu_usage: Option<Vec<u64>>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemoryStats {
    #[serde(deserialize_with = "super::lenient")]
    pub usage: Option<u64>,
    #[serde(deserialize_with = "super::lenient")]
    pub limit: Option<u64>,
    #[serde(deserialize_with = "super::lenient")]
    pub stats: Option<HashMap<String, u64>>,
}
