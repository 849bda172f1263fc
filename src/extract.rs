//!
//! Flatten raw API objects into fixed-schema rows.
//!
//! Every record built here has exactly as many cells as its category's schema;
//! data the API left out becomes [`Cell::Empty`].
use crate::types::{self, ContainerStats, ContainerSummary, Node, Secret, Service};
use crate::{Category, RequestError};

/// Separator between items of a flattened list
pub const LIST_SEPARATOR: &str = "; ";

const STACK_LABEL: &str = "com.docker.stack.namespace";
const SERVICE_LABEL: &str = "com.docker.swarm.service.name";
const UNKNOWN: &str = "Unknown";

/// Columns of the services sheet
pub const SERVICE_COLUMNS: &[&str] = &[
    "Endpoint_Id",
    "Endpoint",
    "Group",
    "Stack",
    "Name",
    "Image",
    "Mode",
    "Replicas",
    "Running_Tasks",
    "Desired_Tasks",
    "Environment_Variables",
    "Configurations",
    "Secrets",
    "Mounts",
];

/// Columns of the secrets sheet
pub const SECRET_COLUMNS: &[&str] = &["Endpoint", "ID", "Name", "Created_At", "Updated_At"];

/// Columns of the nodes sheet
pub const NODE_COLUMNS: &[&str] = &[
    "Endpoint",
    "Hostname",
    "Role",
    "Availability",
    "State",
    "Address",
    "Engine_Version",
    "NanoCPUs",
    "MemoryBytes",
];

/// Columns of the container statistics sheet
pub const CONTAINER_STATS_COLUMNS: &[&str] = &[
    "Endpoint",
    "Stack",
    "Service",
    "Container_Id",
    "Container_Name",
    "CPU_Percent",
    "Memory_Usage",
    "Memory_Limit",
    "Memory_Percent",
];

/// Columns of the endpoints sheet
pub const ENDPOINT_COLUMNS: &[&str] = &["Endpoint_Id", "Endpoint_Name", "Group_Id", "Group_Name", "URL"];

/// Columns of the request errors sheet
pub const REQUEST_ERROR_COLUMNS: &[&str] = &["URL", "Status", "Error"];

/// Fixed column schema of a category
#[must_use]
pub const fn schema(category: Category) -> &'static [&'static str] {
    match category {
        Category::Services => SERVICE_COLUMNS,
        Category::Secrets => SECRET_COLUMNS,
        Category::Nodes => NODE_COLUMNS,
        Category::ContainerStats => CONTAINER_STATS_COLUMNS,
    }
}

/// A single spreadsheet value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value
    Empty,
    /// Text
    Text(String),
    /// Integer
    Integer(i64),
    /// Floating point
    Float(f64),
}

impl Cell {
    /// Text cell, empty for `None`
    pub fn text<S: Into<String>>(value: Option<S>) -> Self {
        value.map_or(Self::Empty, |v| Self::Text(v.into()))
    }

    /// Integer cell, empty for `None` or values out of range
    #[must_use]
    pub fn integer(value: Option<u64>) -> Self {
        value
            .and_then(|v| i64::try_from(v).ok())
            .map_or(Self::Empty, Self::Integer)
    }

    /// Float cell, empty for `None`
    #[must_use]
    pub fn float(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::Float)
    }

    /// Text cell joining `items`, empty when there are none
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = items
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);
        if joined.is_empty() {
            Self::Empty
        } else {
            Self::Text(joined)
        }
    }

    /// True for [`Cell::Empty`]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One flattened row. Only the extractor builds records, so the width always
/// matches the schema of the sheet it goes to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    cells: Vec<Cell>,
}

impl ResourceRecord {
    fn new(columns: &[&str], cells: Vec<Cell>) -> Self {
        debug_assert_eq!(columns.len(), cells.len());
        Self { cells }
    }

    /// Cells in schema order
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the record has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell of a named column of `columns`
    #[must_use]
    pub fn get(&self, columns: &[&str], column: &str) -> Option<&Cell> {
        columns
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.cells.get(i))
    }
}

/// Endpoint a raw object was read from
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// Endpoint id
    pub endpoint_id: u64,
    /// Endpoint name
    pub endpoint: &'a str,
    /// Name of the endpoint's group
    pub group: &'a str,
}

/// Turn one raw API object of `category` into a record
#[must_use]
pub fn normalize(category: Category, ctx: &Context<'_>, raw: &serde_json::Value) -> ResourceRecord {
    match category {
        Category::Services => service(ctx, &types::decode_lenient("service", raw)),
        Category::Secrets => secret(ctx, &types::decode_lenient("secret", raw)),
        Category::Nodes => node(ctx, &types::decode_lenient("node", raw)),
        Category::ContainerStats => container_stats(ctx, &types::decode_lenient("container", raw)),
    }
}

fn service(ctx: &Context<'_>, service: &Service) -> ResourceRecord {
    let spec = &service.spec;
    let container = &spec.task_template.container_spec;
    let mode = spec.mode.as_ref();

    // Stack deploys label both the service and the container spec
    let stack = [spec.labels.as_ref(), container.labels.as_ref()]
        .into_iter()
        .flatten()
        .find_map(|labels| labels.get(STACK_LABEL).cloned());

    let env_keys = container
        .env
        .iter()
        .flatten()
        .map(|env| env.split_once('=').map_or(env.as_str(), |(key, _)| key));

    let configs = container.configs.iter().flatten().map(|c| {
        file_reference(
            c.config_name.as_deref(),
            c.file.as_ref().and_then(|f| f.name.as_deref()),
        )
    });

    let secrets = container.secrets.iter().flatten().map(|s| {
        file_reference(
            s.secret_name.as_deref(),
            s.file.as_ref().and_then(|f| f.name.as_deref()),
        )
    });

    let mounts = container.mounts.iter().flatten().map(|m| {
        format!(
            "{}:{} ({})",
            m.source.as_deref().unwrap_or_default(),
            m.target.as_deref().unwrap_or_default(),
            m.mount_type.as_deref().unwrap_or_default()
        )
    });

    let status = service.service_status.as_ref();

    ResourceRecord::new(
        SERVICE_COLUMNS,
        vec![
            Cell::integer(Some(ctx.endpoint_id)),
            Cell::text(Some(ctx.endpoint)),
            Cell::text(Some(ctx.group)),
            Cell::text(stack),
            Cell::text(spec.name.as_deref()),
            Cell::text(container.image.as_deref().map(strip_digest)),
            Cell::text(mode.and_then(types::service::ServiceMode::name)),
            Cell::integer(mode.and_then(|m| m.replicated.as_ref()).and_then(|r| r.replicas)),
            Cell::integer(status.and_then(|s| s.running_tasks)),
            Cell::integer(status.and_then(|s| s.desired_tasks)),
            Cell::list(env_keys),
            Cell::list(configs),
            Cell::list(secrets),
            Cell::list(mounts),
        ],
    )
}

fn secret(ctx: &Context<'_>, secret: &Secret) -> ResourceRecord {
    ResourceRecord::new(
        SECRET_COLUMNS,
        vec![
            Cell::text(Some(ctx.endpoint)),
            Cell::text(secret.id.as_deref()),
            Cell::text(secret.spec.name.as_deref()),
            Cell::text(secret.created_at.as_deref().map(timestamp)),
            Cell::text(secret.updated_at.as_deref().map(timestamp)),
        ],
    )
}

fn node(ctx: &Context<'_>, node: &Node) -> ResourceRecord {
    let description = &node.description;
    let resources = description.resources.as_ref();
    ResourceRecord::new(
        NODE_COLUMNS,
        vec![
            Cell::text(Some(ctx.endpoint)),
            Cell::text(description.hostname.as_deref()),
            Cell::text(node.spec.role.as_deref()),
            Cell::text(node.spec.availability.as_deref()),
            Cell::text(node.status.state.as_deref()),
            Cell::text(node.status.addr.as_deref()),
            Cell::text(
                description
                    .engine
                    .as_ref()
                    .and_then(|e| e.engine_version.as_deref()),
            ),
            Cell::integer(resources.and_then(|r| r.nano_cpus)),
            Cell::integer(resources.and_then(|r| r.memory_bytes)),
        ],
    )
}

fn container_stats(ctx: &Context<'_>, container: &ContainerSummary) -> ResourceRecord {
    let label = |key: &str| {
        container
            .labels
            .as_ref()
            .and_then(|l| l.get(key))
            .map_or(UNKNOWN, String::as_str)
    };
    let name = container
        .names
        .iter()
        .flatten()
        .next()
        .map(|n| n.trim_start_matches('/'));
    let stats = container.stats.as_ref();
    let memory = stats.and_then(|s| s.memory_stats.as_ref());

    ResourceRecord::new(
        CONTAINER_STATS_COLUMNS,
        vec![
            Cell::text(Some(ctx.endpoint)),
            Cell::text(Some(label(STACK_LABEL))),
            Cell::text(Some(label(SERVICE_LABEL))),
            Cell::text(container.id.as_deref()),
            Cell::text(name),
            Cell::float(stats.and_then(cpu_percent)),
            Cell::integer(stats.and_then(memory_usage)),
            Cell::integer(memory.and_then(|m| m.limit)),
            Cell::float(stats.and_then(memory_percent)),
        ],
    )
}

/// Row of the endpoints sheet
#[must_use]
pub fn endpoint(endpoint: &types::Endpoint, group_name: &str) -> ResourceRecord {
    ResourceRecord::new(
        ENDPOINT_COLUMNS,
        vec![
            Cell::integer(Some(endpoint.id)),
            Cell::text(Some(endpoint.name.as_str())),
            Cell::integer(Some(endpoint.group_id)),
            Cell::text(Some(group_name)),
            Cell::text(endpoint.url.as_deref()),
        ],
    )
}

/// Row of the request errors sheet
#[must_use]
pub fn request_error(error: &RequestError) -> ResourceRecord {
    ResourceRecord::new(
        REQUEST_ERROR_COLUMNS,
        vec![
            Cell::text(Some(error.url.as_str())),
            Cell::integer(error.status.map(u64::from)),
            Cell::text(Some(error.message.as_str())),
        ],
    )
}

/// `nginx:1.25@sha256:...` -> `nginx:1.25`
fn strip_digest(image: &str) -> &str {
    image.split('@').next().unwrap_or(image)
}

fn file_reference(name: Option<&str>, file: Option<&str>) -> String {
    match (name, file) {
        (Some(name), Some(file)) => format!("{name}:{file}"),
        (Some(name), None) => name.to_string(),
        (None, Some(file)) => format!(":{file}"),
        (None, None) => String::new(),
    }
}

/// RFC 3339 timestamps are rendered in UTC, anything else is kept verbatim
fn timestamp(value: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(value).map_or_else(
        |_| value.to_string(),
        |t| {
            t.with_timezone(&chrono::Utc)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Same computation as `docker stats`
#[allow(clippy::cast_precision_loss)]
fn cpu_percent(stats: &ContainerStats) -> Option<f64> {
    let cpu = stats.cpu_stats.as_ref()?;
    let usage = cpu.cpu_usage.as_ref()?;
    let total = usage.total_usage?;
    let system = cpu.system_cpu_usage?;

    let precpu = stats.precpu_stats.as_ref();
    let pre_total = precpu
        .and_then(|p| p.cpu_usage.as_ref())
        .and_then(|u| u.total_usage)
        .unwrap_or(0);
    let pre_system = precpu.and_then(|p| p.system_cpu_usage).unwrap_or(0);

    let online = cpu
        .online_cpus
        .or_else(|| usage.percpu_usage.as_ref().map(|p| p.len() as u64))
        .filter(|n| *n > 0)
        .unwrap_or(1);

    let cpu_delta = total.saturating_sub(pre_total) as f64;
    let system_delta = system.saturating_sub(pre_system) as f64;
    if system_delta > 0.0 {
        Some(round2(cpu_delta / system_delta * online as f64 * 100.0))
    } else {
        Some(0.0)
    }
}

/// Usage minus page cache, like `docker stats`. Older engines only report `cache`.
fn memory_usage(stats: &ContainerStats) -> Option<u64> {
    let memory = stats.memory_stats.as_ref()?;
    let usage = memory.usage?;
    let cache = memory.stats.as_ref().and_then(|s| {
        ["total_inactive_file", "inactive_file", "cache"]
            .iter()
            .find_map(|key| s.get(*key).copied())
            .filter(|cache| *cache < usage)
    });
    Some(usage - cache.unwrap_or(0))
}

#[allow(clippy::cast_precision_loss)]
fn memory_percent(stats: &ContainerStats) -> Option<f64> {
    let limit = stats.memory_stats.as_ref()?.limit.filter(|l| *l > 0)?;
    let used = memory_usage(stats)?;
    Some(round2(used as f64 / limit as f64 * 100.0))
}
