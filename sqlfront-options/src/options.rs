//! The resolved, immutable connection options value.

use serde::Serialize;

use crate::error::{OptionsError, OptionsResult};
use crate::grammar::{self, keys, limits};
use crate::host::{HostEnvironment, SystemHost};
use crate::keyvalue::write_pair;
use crate::resolver::Resolver;
use crate::values::{
    ApplicationIntent, AttestationProtocol, AuthenticationMethod, ColumnEncryptionSetting,
    IpAddressPreference, NetworkProtocol, PoolBlockingPeriod, TransactionBinding, TypeSystem,
};

/// Environment variable read by [`ResolvedConnectionOptions::from_default_env`].
pub const CONNECTION_STRING_VAR: &str = "SQLFRONT_CONNECTION_STRING";

/// Fully validated connection options.
///
/// Built once by a [`Resolver`] and never mutated.
///
/// Equality and hashing follow the pairs as written: key spelling is
/// canonicalized, but the order of keys and the value literals are kept.
/// `Server=a;Database=b` and `Database=b;Server=a` are different pool keys,
/// and so are `Encrypt=yes` and `Encrypt=true`, even though every typed
/// getter agrees.
///
/// ```rust
/// use sqlfront_options::ResolvedConnectionOptions;
///
/// let opts = ResolvedConnectionOptions::parse("Server=db1;Database=sales;Max Pool Size=20").unwrap();
/// assert_eq!(opts.data_source(), "db1");
/// assert_eq!(opts.initial_catalog(), "sales");
/// assert_eq!(opts.max_pool_size(), 20);
/// assert_eq!(opts.connect_timeout(), 15);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedConnectionOptions {
    pub(crate) application_intent: ApplicationIntent,
    pub(crate) application_name: String,
    pub(crate) attach_db_filename: String,
    pub(crate) expanded_attach_db_filename: Option<String>,
    pub(crate) pool_blocking_period: PoolBlockingPeriod,
    pub(crate) column_encryption_setting: ColumnEncryptionSetting,
    pub(crate) enclave_attestation_url: String,
    pub(crate) attestation_protocol: AttestationProtocol,
    pub(crate) ip_address_preference: IpAddressPreference,
    pub(crate) connect_timeout: i32,
    pub(crate) command_timeout: i32,
    pub(crate) context_connection: bool,
    pub(crate) current_language: String,
    pub(crate) data_source: String,
    pub(crate) local_db_instance: Option<String>,
    pub(crate) encrypt: bool,
    pub(crate) enlist: bool,
    pub(crate) failover_partner: String,
    pub(crate) initial_catalog: String,
    pub(crate) integrated_security: bool,
    pub(crate) load_balance_timeout: i32,
    pub(crate) multiple_active_result_sets: bool,
    pub(crate) max_pool_size: i32,
    pub(crate) min_pool_size: i32,
    pub(crate) multi_subnet_failover: bool,
    pub(crate) transparent_network_ip_resolution: bool,
    pub(crate) network_library: Option<NetworkProtocol>,
    pub(crate) packet_size: i32,
    #[serde(skip)]
    pub(crate) password: String,
    pub(crate) persist_security_info: bool,
    pub(crate) pooling: bool,
    pub(crate) replication: bool,
    pub(crate) transaction_binding: TransactionBinding,
    pub(crate) trust_server_certificate: bool,
    pub(crate) type_system_version: TypeSystem,
    pub(crate) user_id: String,
    pub(crate) user_instance: bool,
    pub(crate) workstation_id: Option<String>,
    pub(crate) connect_retry_count: i32,
    pub(crate) connect_retry_interval: i32,
    pub(crate) authentication: AuthenticationMethod,
    #[serde(skip)]
    pub(crate) entries: Vec<(&'static str, String)>,
}

impl ResolvedConnectionOptions {
    /// Resolve against the process environment.
    pub fn parse(raw: &str) -> OptionsResult<Self> {
        Resolver::new().resolve(raw)
    }

    /// Resolve the connection string stored in environment variable `var`.
    pub fn from_env(var: &str) -> OptionsResult<Self> {
        let raw = std::env::var(var).map_err(|_| OptionsError::EnvNotFound(var.to_string()))?;
        Self::parse(&raw)
    }

    /// Resolve the connection string stored in `SQLFRONT_CONNECTION_STRING`.
    pub fn from_default_env() -> OptionsResult<Self> {
        Self::from_env(CONNECTION_STRING_VAR)
    }

    pub fn application_intent(&self) -> ApplicationIntent {
        self.application_intent
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// The attach file as written, before `|DataDirectory|` expansion.
    pub fn attach_db_filename(&self) -> &str {
        &self.attach_db_filename
    }

    /// The attach file with `|DataDirectory|` expanded, if it used the macro.
    pub fn expanded_attach_db_filename(&self) -> Option<&str> {
        self.expanded_attach_db_filename.as_deref()
    }

    pub fn pool_blocking_period(&self) -> PoolBlockingPeriod {
        self.pool_blocking_period
    }

    pub fn column_encryption_setting(&self) -> ColumnEncryptionSetting {
        self.column_encryption_setting
    }

    pub fn enclave_attestation_url(&self) -> &str {
        &self.enclave_attestation_url
    }

    pub fn attestation_protocol(&self) -> AttestationProtocol {
        self.attestation_protocol
    }

    pub fn ip_address_preference(&self) -> IpAddressPreference {
        self.ip_address_preference
    }

    /// Login timeout in seconds. Zero waits forever.
    pub fn connect_timeout(&self) -> i32 {
        self.connect_timeout
    }

    /// Default command timeout in seconds.
    pub fn command_timeout(&self) -> i32 {
        self.command_timeout
    }

    /// Pooled connections are always reset before reuse.
    pub fn connection_reset(&self) -> bool {
        true
    }

    pub fn context_connection(&self) -> bool {
        self.context_connection
    }

    pub fn current_language(&self) -> &str {
        &self.current_language
    }

    pub fn data_source(&self) -> &str {
        &self.data_source
    }

    /// Local database instance named by the data source.
    pub fn local_db_instance(&self) -> Option<&str> {
        self.local_db_instance.as_deref()
    }

    /// Whether the connection is encrypted, after any administrative override.
    pub fn encrypt(&self) -> bool {
        self.encrypt
    }

    pub fn enlist(&self) -> bool {
        self.enlist
    }

    pub fn failover_partner(&self) -> &str {
        &self.failover_partner
    }

    pub fn initial_catalog(&self) -> &str {
        &self.initial_catalog
    }

    pub fn integrated_security(&self) -> bool {
        self.integrated_security
    }

    pub fn load_balance_timeout(&self) -> i32 {
        self.load_balance_timeout
    }

    pub fn multiple_active_result_sets(&self) -> bool {
        self.multiple_active_result_sets
    }

    pub fn max_pool_size(&self) -> i32 {
        self.max_pool_size
    }

    pub fn min_pool_size(&self) -> i32 {
        self.min_pool_size
    }

    pub fn multi_subnet_failover(&self) -> bool {
        self.multi_subnet_failover
    }

    pub fn transparent_network_ip_resolution(&self) -> bool {
        self.transparent_network_ip_resolution
    }

    /// Protocol selected through a legacy network library name.
    pub fn network_library(&self) -> Option<NetworkProtocol> {
        self.network_library
    }

    /// Packet size in bytes.
    pub fn packet_size(&self) -> i32 {
        self.packet_size
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn persist_security_info(&self) -> bool {
        self.persist_security_info
    }

    pub fn pooling(&self) -> bool {
        self.pooling
    }

    pub fn replication(&self) -> bool {
        self.replication
    }

    pub fn transaction_binding(&self) -> TransactionBinding {
        self.transaction_binding
    }

    pub fn trust_server_certificate(&self) -> bool {
        self.trust_server_certificate
    }

    pub fn type_system_version(&self) -> TypeSystem {
        self.type_system_version
    }

    /// Version of the server types assembly matching the type system.
    pub fn type_system_assembly_version(&self) -> (u16, u16, u16, u16) {
        self.type_system_version.assembly_version()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_instance(&self) -> bool {
        self.user_instance
    }

    /// Workstation id given in the string, if any.
    pub fn workstation_id(&self) -> Option<&str> {
        self.workstation_id.as_deref()
    }

    pub fn connect_retry_count(&self) -> i32 {
        self.connect_retry_count
    }

    pub fn connect_retry_interval(&self) -> i32 {
        self.connect_retry_interval
    }

    pub fn authentication(&self) -> AuthenticationMethod {
        self.authentication
    }

    /// Whether the data source must be checked against this machine at connect time.
    pub fn enforce_local_host(&self) -> bool {
        self.expanded_attach_db_filename.is_some() && self.local_db_instance.is_none()
    }

    /// Workstation id, falling back to the host's machine name.
    pub fn obtain_workstation_id(&self, host: &impl HostEnvironment) -> OptionsResult<String> {
        match &self.workstation_id {
            Some(id) => Ok(id.clone()),
            None => {
                let name = host.machine_name();
                if name.chars().count() > limits::HOST_NAME {
                    return Err(OptionsError::value_length(keys::WORKSTATION_ID, limits::HOST_NAME));
                }
                Ok(name)
            }
        }
    }

    /// Iterate the recognized keys and values in the order they were written.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Re-serialize the recognized keys using their display spelling.
    ///
    /// Resolving the result with the same host yields an equal value.
    pub fn to_connection_string(&self) -> String {
        self.render(|_, value| Some(value))
    }

    /// Like [`to_connection_string`](Self::to_connection_string), without the
    /// password unless `Persist Security Info` is on.
    pub fn to_redacted_string(&self) -> String {
        let keep_password = self.persist_security_info;
        self.render(|key, value| (keep_password || key != keys::PASSWORD).then_some(value))
    }

    /// Re-serialize with the attach file replaced by its expanded path.
    pub fn expanded_connection_string(&self) -> String {
        match self.expanded_attach_db_filename.as_deref() {
            Some(expanded) => self.render(|key, value| {
                Some(if key == keys::ATTACH_DB_FILENAME { expanded } else { value })
            }),
            None => self.to_connection_string(),
        }
    }

    fn render<'a>(&'a self, mut pick: impl FnMut(&'static str, &'a str) -> Option<&'a str>) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            let Some(option) = grammar::canonical(key) else {
                continue;
            };
            if let Some(value) = pick(*key, value) {
                write_pair(&mut out, option.display, value);
            }
        }
        out
    }

    pub(crate) fn set_entry(&mut self, key: &'static str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

impl Default for ResolvedConnectionOptions {
    fn default() -> Self {
        Self {
            application_intent: ApplicationIntent::default(),
            application_name: grammar::DEFAULT_APPLICATION_NAME.to_string(),
            attach_db_filename: String::new(),
            expanded_attach_db_filename: None,
            pool_blocking_period: PoolBlockingPeriod::default(),
            column_encryption_setting: ColumnEncryptionSetting::default(),
            enclave_attestation_url: String::new(),
            attestation_protocol: AttestationProtocol::default(),
            ip_address_preference: IpAddressPreference::default(),
            connect_timeout: 15,
            command_timeout: 30,
            context_connection: false,
            current_language: String::new(),
            data_source: String::new(),
            local_db_instance: None,
            encrypt: true,
            enlist: true,
            failover_partner: String::new(),
            initial_catalog: String::new(),
            integrated_security: false,
            load_balance_timeout: 0,
            multiple_active_result_sets: false,
            max_pool_size: 100,
            min_pool_size: 0,
            multi_subnet_failover: false,
            transparent_network_ip_resolution: true,
            network_library: None,
            packet_size: 8000,
            password: String::new(),
            persist_security_info: false,
            pooling: true,
            replication: false,
            transaction_binding: TransactionBinding::default(),
            trust_server_certificate: false,
            type_system_version: TypeSystem::default(),
            user_id: String::new(),
            user_instance: false,
            workstation_id: None,
            connect_retry_count: 1,
            connect_retry_interval: 10,
            authentication: AuthenticationMethod::default(),
            entries: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ResolvedConnectionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConnectionOptions")
            .field("data_source", &self.data_source)
            .field("initial_catalog", &self.initial_catalog)
            .field("user_id", &self.user_id)
            .field("authentication", &self.authentication)
            .field("integrated_security", &self.integrated_security)
            .field("encrypt", &self.encrypt)
            .field("pooling", &self.pooling)
            .field("max_pool_size", &self.max_pool_size)
            .field("min_pool_size", &self.min_pool_size)
            .finish_non_exhaustive()
    }
}

impl std::str::FromStr for ResolvedConnectionOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolver::with_host(SystemHost).resolve(s)
    }
}
