//! Host environment collaborators consulted during resolution.

use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable that forces encryption on when a connection string turns it off.
pub const FORCE_ENCRYPTION_VAR: &str = "SQLFRONT_FORCE_ENCRYPTION";

/// Environment variable naming the root substituted for `|DataDirectory|`.
pub const DATA_DIRECTORY_VAR: &str = "SQLFRONT_DATA_DIRECTORY";

const LOCAL_DB_PREFIX: &str = "(localdb)\\";

/// Facts about the process and machine that resolution depends on.
///
/// Resolution reads nothing else from the outside world, so a deterministic
/// implementation makes every resolution deterministic.
pub trait HostEnvironment: Send + Sync {
    /// Whether an administrative policy forces encryption on.
    fn legacy_encryption_override(&self) -> bool;

    /// The local database instance named by a data source, if any.
    fn local_db_instance(&self, data_source: &str) -> Option<String> {
        local_db_instance_name(data_source)
    }

    /// Root directory substituted for `|DataDirectory|`.
    fn data_directory(&self) -> Option<PathBuf>;

    /// Fully qualified name of this machine.
    fn machine_name(&self) -> String;

    /// Whether the caller runs inside the database engine.
    fn in_process(&self) -> bool {
        false
    }
}

/// Extract the instance from a `(localdb)\instance` data source.
pub fn local_db_instance_name(data_source: &str) -> Option<String> {
    let trimmed = data_source.trim();
    let prefix = trimmed.get(..LOCAL_DB_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(LOCAL_DB_PREFIX) {
        return None;
    }
    let instance = trimmed[LOCAL_DB_PREFIX.len()..].trim();
    (!instance.is_empty()).then(|| instance.to_string())
}

/// Host backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostEnvironment for SystemHost {
    fn legacy_encryption_override(&self) -> bool {
        std::env::var(FORCE_ENCRYPTION_VAR)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }

    fn data_directory(&self) -> Option<PathBuf> {
        std::env::var_os(DATA_DIRECTORY_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
    }

    fn machine_name(&self) -> String {
        std::env::var("COMPUTERNAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| "localhost".to_string())
    }
}

/// Host with fixed answers.
///
/// ```rust
/// use sqlfront_options::{HostEnvironment, StaticHost};
///
/// let host = StaticHost::new()
///     .machine_name("build01.corp.example")
///     .data_directory("/srv/data")
///     .force_encryption(true);
/// assert!(host.legacy_encryption_override());
/// assert_eq!(HostEnvironment::machine_name(&host), "build01.corp.example");
/// ```
#[derive(Debug, Clone)]
pub struct StaticHost {
    force_encryption: bool,
    data_directory: Option<PathBuf>,
    machine_name: String,
    in_process: bool,
    local_instances: HashMap<String, String>,
}

impl Default for StaticHost {
    fn default() -> Self {
        Self {
            force_encryption: false,
            data_directory: None,
            machine_name: "localhost".to_string(),
            in_process: false,
            local_instances: HashMap::new(),
        }
    }
}

impl StaticHost {
    /// Create a host with no override, no data directory and machine name `localhost`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the legacy encryption override.
    pub fn force_encryption(mut self, force: bool) -> Self {
        self.force_encryption = force;
        self
    }

    /// Set the `|DataDirectory|` root.
    pub fn data_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_directory = Some(dir.into());
        self
    }

    /// Set the machine name.
    pub fn machine_name(mut self, name: impl Into<String>) -> Self {
        self.machine_name = name.into();
        self
    }

    /// Mark the host as running inside the database engine.
    pub fn in_process(mut self, in_process: bool) -> Self {
        self.in_process = in_process;
        self
    }

    /// Map an exact data source (case-insensitive) to a local database instance.
    ///
    /// Data sources not registered here fall back to the `(localdb)\name` rule.
    pub fn local_instance(mut self, data_source: &str, instance: impl Into<String>) -> Self {
        self.local_instances
            .insert(data_source.trim().to_lowercase(), instance.into());
        self
    }
}

impl HostEnvironment for StaticHost {
    fn legacy_encryption_override(&self) -> bool {
        self.force_encryption
    }

    fn local_db_instance(&self, data_source: &str) -> Option<String> {
        self.local_instances
            .get(&data_source.trim().to_lowercase())
            .cloned()
            .or_else(|| local_db_instance_name(data_source))
    }

    fn data_directory(&self) -> Option<PathBuf> {
        self.data_directory.clone()
    }

    fn machine_name(&self) -> String {
        self.machine_name.clone()
    }

    fn in_process(&self) -> bool {
        self.in_process
    }
}

impl<H: HostEnvironment + ?Sized> HostEnvironment for &H {
    fn legacy_encryption_override(&self) -> bool {
        (**self).legacy_encryption_override()
    }

    fn local_db_instance(&self, data_source: &str) -> Option<String> {
        (**self).local_db_instance(data_source)
    }

    fn data_directory(&self) -> Option<PathBuf> {
        (**self).data_directory()
    }

    fn machine_name(&self) -> String {
        (**self).machine_name()
    }

    fn in_process(&self) -> bool {
        (**self).in_process()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_db_instance_name() {
        assert_eq!(local_db_instance_name("(localdb)\\MSSQLLocalDB"), Some("MSSQLLocalDB".to_string()));
        assert_eq!(local_db_instance_name("  (LocalDB)\\ v11.0 "), Some("v11.0".to_string()));
        assert_eq!(local_db_instance_name("(localdb)\\"), None);
        assert_eq!(local_db_instance_name("server\\inst"), None);
        assert_eq!(local_db_instance_name("(local)"), None);
    }

    #[test]
    fn test_static_host() {
        let host = StaticHost::new()
            .local_instance("devbox", "Shared")
            .in_process(true);
        assert_eq!(host.local_db_instance("DEVBOX"), Some("Shared".to_string()));
        assert_eq!(host.local_db_instance("(localdb)\\a"), Some("a".to_string()));
        assert_eq!(host.local_db_instance("other"), None);
        assert!(HostEnvironment::in_process(&host));
        assert!(!host.legacy_encryption_override());
        assert!(HostEnvironment::data_directory(&host).is_none());
    }

    #[test]
    fn test_system_host_is_out_of_process() {
        assert!(!SystemHost.in_process());
        assert!(!SystemHost.machine_name().is_empty());
    }
}
