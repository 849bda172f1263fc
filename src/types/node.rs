//!
//! Swarm node
//!

#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Node {
    #[serde(rename = "ID", deserialize_with = "super::lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub description: NodeDescription,
    #[serde(deserialize_with = "super::lenient")]
    pub spec: NodeSpec,
    #[serde(deserialize_with = "super::lenient")]
    pub status: NodeStatus,
}

#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeDescription {
    #[serde(deserialize_with = "super::lenient")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub engine: Option<Engine>,
    #[serde(deserialize_with = "super::lenient")]
    pub resources: Option<Resources>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Engine {
    #[serde(deserialize_with = "super::lenient")]
    pub engine_version: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Resources {
    #[serde(rename = "NanoCPUs", deserialize_with = "super::lenient")]
    pub nano_cpus: Option<u64>,
    #[serde(deserialize_with = "super::lenient")]
    pub memory_bytes: Option<u64>,
}

/// `manager` or `worker`, `active`/`pause`/`drain`
#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeSpec {
    #[serde(deserialize_with = "super::lenient")]
    pub role: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub availability: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NodeStatus {
    #[serde(deserialize_with = "super::lenient")]
    pub state: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub addr: Option<String>,
}
