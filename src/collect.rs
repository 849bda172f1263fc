//!
//! Walk every endpoint and assemble the report
//!
use crate::extract::{self, Context, ResourceRecord};
use crate::types::{Endpoint, EndpointGroup};
use crate::{Category, Client, Config, Error, Report};
use std::collections::{HashMap, HashSet};

const UNKNOWN_GROUP: &str = "Unknown Group";

/// Name of the sheet listing failed requests
pub const REQUEST_ERRORS_SHEET: &str = "Request Errors";

/// Name of the sheet listing endpoints
pub const ENDPOINTS_SHEET: &str = "Endpoints";

/// What to collect
#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    /// Read one-shot stats for every container, one request per container
    pub container_stats: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            container_stats: true,
        }
    }
}

/// A request that failed during collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    /// Requested URL
    pub url: String,
    /// HTTP status, if the server answered
    pub status: Option<u16>,
    /// Error description
    pub message: String,
}

impl From<Error> for RequestError {
    fn from(err: Error) -> Self {
        match err {
            Error::Api {
                url,
                status,
                message,
            } => Self {
                url,
                status,
                message,
            },
            e => Self {
                url: String::new(),
                status: e.status(),
                message: e.to_string(),
            },
        }
    }
}

#[derive(Default)]
struct Collector {
    records: HashMap<Category, Vec<ResourceRecord>>,
    endpoints: Vec<ResourceRecord>,
    errors: Vec<RequestError>,
    seen_nodes: HashSet<String>,
}

impl Collector {
    fn failed(&mut self, err: Error) {
        self.errors.push(err.into());
    }

    fn push(&mut self, category: Category, ctx: &Context<'_>, raw: &serde_json::Value) {
        self.records
            .entry(category)
            .or_default()
            .push(extract::normalize(category, ctx, raw));
    }

    async fn process_endpoint(
        &mut self,
        client: &Client,
        options: &CollectOptions,
        endpoint: &Endpoint,
        group: &str,
    ) {
        tracing::info!(
            "Processing endpoint {} (id {}, group {})",
            endpoint.name,
            endpoint.id,
            group
        );
        self.endpoints.push(extract::endpoint(endpoint, group));

        let ctx = Context {
            endpoint_id: endpoint.id,
            endpoint: &endpoint.name,
            group,
        };

        for category in Category::ALL {
            let items = match client.fetch(category, endpoint.id).await {
                Ok(items) => items,
                Err(e) => {
                    self.failed(e);
                    continue;
                }
            };
            tracing::debug!("{}: {} {}", endpoint.name, items.len(), category);

            match category {
                Category::Nodes => {
                    for raw in &items {
                        if self.first_sighting(raw) {
                            self.push(category, &ctx, raw);
                        }
                    }
                }
                Category::ContainerStats => {
                    for raw in items {
                        self.container(client, options, &ctx, raw).await;
                    }
                }
                Category::Services | Category::Secrets => {
                    for raw in &items {
                        self.push(category, &ctx, raw);
                    }
                }
            }
        }
    }

    /// A node shared by several endpoints is only reported for the first one
    fn first_sighting(&mut self, raw: &serde_json::Value) -> bool {
        match raw.pointer("/Description/Hostname").and_then(|h| h.as_str()) {
            Some(hostname) => self.seen_nodes.insert(hostname.to_string()),
            None => true,
        }
    }

    async fn container(
        &mut self,
        client: &Client,
        options: &CollectOptions,
        ctx: &Context<'_>,
        mut raw: serde_json::Value,
    ) {
        let id = raw
            .get("Id")
            .and_then(|id| id.as_str())
            .map(str::to_string);
        match (options.container_stats, id) {
            (false, _) => {}
            (true, None) => {
                tracing::warn!("container without id on {}, no stats read", ctx.endpoint);
            }
            (true, Some(id)) => match client.container_stats(ctx.endpoint_id, &id).await {
                Ok(stats) => {
                    if let Some(obj) = raw.as_object_mut() {
                        obj.insert("Stats".to_string(), stats);
                    }
                }
                Err(e) => {
                    self.failed(e);
                    return;
                }
            },
        }
        self.push(Category::ContainerStats, ctx, &raw);
    }

    fn into_report(mut self) -> Report {
        let mut report = Report::new();
        for category in Category::ALL {
            report.add_sheet(
                category.sheet_name(),
                extract::schema(category),
                self.records.remove(&category).unwrap_or_default(),
            );
        }
        report.add_sheet(
            REQUEST_ERRORS_SHEET,
            extract::REQUEST_ERROR_COLUMNS,
            self.errors.iter().map(extract::request_error).collect(),
        );
        report.add_sheet(ENDPOINTS_SHEET, extract::ENDPOINT_COLUMNS, self.endpoints);
        report
    }
}

/// Endpoints bucketed by group id, groups and members in first-seen order
fn by_group(endpoints: Vec<Endpoint>) -> Vec<(u64, Vec<Endpoint>)> {
    let mut groups: Vec<(u64, Vec<Endpoint>)> = Vec::new();
    for endpoint in endpoints {
        match groups.iter_mut().find(|(id, _)| *id == endpoint.group_id) {
            Some((_, members)) => members.push(endpoint),
            None => groups.push((endpoint.group_id, vec![endpoint])),
        }
    }
    groups
}

/// Read every category from every endpoint. Failed requests do not stop the
/// run, they end up on the request errors sheet.
pub async fn collect(client: &Client, options: &CollectOptions) -> Report {
    let mut collector = Collector::default();

    let group_names: HashMap<u64, String> = match client.endpoint_groups().await {
        Ok(groups) => groups
            .into_iter()
            .map(|EndpointGroup { id, name }| (id, name))
            .collect(),
        Err(e) => {
            collector.failed(e);
            HashMap::new()
        }
    };

    let endpoints = match client.endpoints().await {
        Ok(endpoints) => endpoints,
        Err(e) => {
            collector.failed(e);
            Vec::new()
        }
    };
    tracing::info!("Found {} endpoints", endpoints.len());

    for (group_id, members) in by_group(endpoints) {
        let group = group_names
            .get(&group_id)
            .map_or(UNKNOWN_GROUP, String::as_str);
        for endpoint in &members {
            collector
                .process_endpoint(client, options, endpoint, group)
                .await;
        }
    }

    if !collector.errors.is_empty() {
        tracing::warn!("{} requests failed", collector.errors.len());
    }
    collector.into_report()
}

/// Log in, collect and write the report. Returns the written path.
pub async fn run(config: &Config) -> crate::Result<std::path::PathBuf> {
    let builder = config.client_builder().await?;
    let client = builder
        .login(&config.host, &config.username, &config.password)
        .await?;

    let report = collect(&client, &config.collect_options()).await;
    report.save(&config.output_path)?;
    Ok(config.output_path.clone())
}

#[cfg(test)]
mod test {
    use super::*;

    fn endpoint(id: u64, group_id: u64) -> Endpoint {
        Endpoint {
            id,
            name: format!("ep{id}"),
            group_id,
            url: None,
        }
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let groups = by_group(vec![
            endpoint(1, 2),
            endpoint(2, 1),
            endpoint(3, 2),
            endpoint(4, 1),
        ]);
        let ids: Vec<(u64, Vec<u64>)> = groups
            .iter()
            .map(|(g, members)| (*g, members.iter().map(|e| e.id).collect()))
            .collect();
        assert_eq!(ids, vec![(2, vec![1, 3]), (1, vec![2, 4])]);
    }

    #[test]
    fn nodes_are_deduplicated_by_hostname() {
        let mut collector = Collector::default();
        let node = serde_json::json!({"Description": {"Hostname": "worker-1"}});
        assert!(collector.first_sighting(&node));
        assert!(!collector.first_sighting(&node));
        assert!(collector.first_sighting(&serde_json::json!({})));
    }

    #[test]
    fn empty_collection_still_has_every_sheet() {
        let report = Collector::default().into_report();
        let names: Vec<_> = report.sheets().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            [
                "Services",
                "Secrets",
                "Nodes",
                "Container Statistics",
                "Request Errors",
                "Endpoints"
            ]
        );
        assert!(report.sheets().iter().all(|s| s.rows().is_empty()));
    }

    #[test]
    fn request_error_from_api_error() {
        let err = Error::Api {
            url: "https://p/api/endpoints".into(),
            status: Some(500),
            message: "HTTP 500".into(),
        };
        let req: RequestError = err.into();
        assert_eq!(req.status, Some(500));
        assert_eq!(req.url, "https://p/api/endpoints");
    }
}
