//!
//! Collection of types returned from the Portainer and Docker APIs.
//!
//! NOTE: The types here are not exhaustive to the APIs. Docker payload fields
//! are decoded one by one through [`lenient`]: a field that is missing or has
//! an unexpected type decodes to its default and the rest of the object is kept.
use serde::Deserialize;

pub mod container;
pub mod node;
pub mod secret;
pub mod service;

pub use container::{ContainerStats, ContainerSummary};
pub use node::Node;
pub use secret::Secret;
pub use service::Service;

/// Returned from `/api/endpoints`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Endpoint {
    /// Endpoint id
    pub id: u64,
    /// Endpoint name
    pub name: String,
    /// Group the endpoint belongs to, Portainer puts ungrouped endpoints in group 1
    #[serde(default = "default_group")]
    pub group_id: u64,
    /// Docker API URL of the endpoint
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

fn default_group() -> u64 {
    1
}

/// Returned from `/api/endpoint_groups`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointGroup {
    /// Group id
    pub id: u64,
    /// Group name
    pub name: String,
}

/// Field deserializer that never fails the enclosing struct. A value of the
/// wrong type becomes `T::default()`, which is `None` for optional leaves.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(&value).unwrap_or_else(|e| {
        tracing::debug!("ignoring unexpected value {}: {}", value, e);
        T::default()
    }))
}

/// Decode a raw object, falling back to the default when the payload has an
/// unexpected shape. The caller still gets a row, only with empty cells.
pub(crate) fn decode_lenient<T>(what: &str, raw: &serde_json::Value) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    T::deserialize(raw).unwrap_or_else(|e| {
        tracing::warn!("unexpected {} payload: {}", what, e);
        T::default()
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn endpoint_defaults() {
        let endpoint: Endpoint =
            serde_json::from_value(serde_json::json!({"Id": 3, "Name": "edge"})).unwrap();
        assert_eq!(endpoint.id, 3);
        assert_eq!(endpoint.group_id, 1);
        assert!(endpoint.url.is_none());
    }

    #[test]
    fn non_object_payload_falls_back() {
        let service: Service = decode_lenient("service", &serde_json::json!([1, 2]));
        assert!(service.spec.name.is_none());
    }

    #[test]
    fn bad_field_keeps_its_siblings() {
        let raw = serde_json::json!({
            "Spec": {
                "Name": "web",
                "Mode": {"Replicated": {"Replicas": 1.5}},
                "TaskTemplate": {"ContainerSpec": {"Image": "nginx:1", "Env": ["A=1"], "Mounts": "none"}}
            }
        });
        let service: Service = decode_lenient("service", &raw);
        assert_eq!(service.spec.name.as_deref(), Some("web"));
        let container = &service.spec.task_template.container_spec;
        assert_eq!(container.image.as_deref(), Some("nginx:1"));
        assert_eq!(container.env.as_deref(), Some(&["A=1".to_string()][..]));
        assert!(container.mounts.is_none());
        let mode = service.spec.mode.unwrap();
        assert!(mode.replicated.unwrap().replicas.is_none());

        let raw = serde_json::json!({"Spec": "not an object", "ID": "s1"});
        let service: Service = decode_lenient("service", &raw);
        assert_eq!(service.id.as_deref(), Some("s1"));
        assert!(service.spec.name.is_none());
    }
}
