//!
//! Swarm secret metadata. The API never returns secret data.
//!

#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Secret {
    #[serde(rename = "ID", deserialize_with = "super::lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "super::lenient")]
    pub spec: SecretSpec,
}

#[allow(missing_docs)]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecretSpec {
    #[serde(deserialize_with = "super::lenient")]
    pub name: Option<String>,
}
