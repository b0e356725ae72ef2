//! Connection option resolution.
//!
//! Resolution runs in three phases: tokenize, coerce every key to its typed
//! value (absent keys take their defaults), then validate across fields.
//! Validation is fail-fast and always runs in the same order, so an input
//! that breaks several rules reports the same error every time.

use tracing::{debug, warn};

use crate::attach::{expand_data_directory, is_local_host};
use crate::error::{ContextViolation, OptionsError, OptionsResult};
use crate::grammar::{self, keys, limits};
use crate::host::{HostEnvironment, SystemHost};
use crate::keyvalue::KeyValueTable;
use crate::options::ResolvedConnectionOptions;
use crate::values::{
    self, ApplicationIntent, AttestationProtocol, AuthenticationMethod, ColumnEncryptionSetting,
    IpAddressPreference, NetworkProtocol, PoolBlockingPeriod, TransactionBinding, TypeSystem,
};

/// Turns connection strings into [`ResolvedConnectionOptions`].
///
/// ```rust
/// use sqlfront_options::{OptionsError, Resolver, StaticHost};
///
/// let resolver = Resolver::with_host(StaticHost::new());
/// let opts = resolver.resolve("Data Source=srv;Connect Retry Count=255").unwrap();
/// assert_eq!(opts.connect_retry_count(), 255);
///
/// let err = resolver.resolve("Data Source=srv;Connect Retry Count=256").unwrap_err();
/// assert_eq!(err, OptionsError::invalid_value("connect retry count"));
/// ```
#[derive(Debug, Clone)]
pub struct Resolver<H: HostEnvironment = SystemHost> {
    host: H,
}

impl Resolver<SystemHost> {
    /// Create a resolver backed by the process environment.
    pub fn new() -> Self {
        Self { host: SystemHost }
    }
}

impl Default for Resolver<SystemHost> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HostEnvironment> Resolver<H> {
    /// Create a resolver with a custom host.
    pub fn with_host(host: H) -> Self {
        Self { host }
    }

    /// The host consulted during resolution.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Tokenize and resolve a raw connection string.
    pub fn resolve(&self, raw: &str) -> OptionsResult<ResolvedConnectionOptions> {
        let table = KeyValueTable::parse(raw)?;
        self.resolve_table(&table)
    }

    /// Resolve an already tokenized table.
    pub fn resolve_table(&self, table: &KeyValueTable) -> OptionsResult<ResolvedConnectionOptions> {
        debug!(keys = table.len(), "resolving connection options");
        let result = self.build(table);
        if let Err(err) = &result {
            debug!(key = err.key().unwrap_or(""), error = %err, "connection options rejected");
        }
        result
    }

    /// Copy `options` with a different data source and user instance flag.
    ///
    /// The local database instance is re-derived and the new data source is
    /// length-checked. Every other field is kept as resolved.
    pub fn rebind(
        &self,
        options: &ResolvedConnectionOptions,
        data_source: &str,
        user_instance: bool,
        enlist: Option<bool>,
    ) -> OptionsResult<ResolvedConnectionOptions> {
        check_length(data_source, limits::SERVER_NAME, keys::DATA_SOURCE)?;

        let mut rebound = options.clone();
        rebound.data_source = data_source.to_string();
        rebound.user_instance = user_instance;
        rebound.local_db_instance = self.host.local_db_instance(data_source);
        rebound.set_entry(keys::DATA_SOURCE, data_source.to_string());
        rebound.set_entry(keys::USER_INSTANCE, user_instance.to_string());
        if let Some(enlist) = enlist {
            rebound.enlist = enlist;
            rebound.set_entry(keys::ENLIST, enlist.to_string());
        }
        Ok(rebound)
    }

    fn build(&self, table: &KeyValueTable) -> OptionsResult<ResolvedConnectionOptions> {
        let c = Coercer { table };

        c.boolean(keys::CONNECTION_RESET)?;
        let data_source = c.text(keys::DATA_SOURCE);
        let mut opts = ResolvedConnectionOptions {
            application_intent: c.enumeration(keys::APPLICATION_INTENT, ApplicationIntent::parse)?,
            application_name: c.text(keys::APPLICATION_NAME),
            attach_db_filename: c.text(keys::ATTACH_DB_FILENAME),
            expanded_attach_db_filename: None,
            pool_blocking_period: c.enumeration(keys::POOL_BLOCKING_PERIOD, PoolBlockingPeriod::parse)?,
            column_encryption_setting: c
                .enumeration(keys::COLUMN_ENCRYPTION_SETTING, ColumnEncryptionSetting::parse)?,
            enclave_attestation_url: c.text(keys::ENCLAVE_ATTESTATION_URL),
            attestation_protocol: c.enumeration(keys::ATTESTATION_PROTOCOL, AttestationProtocol::parse)?,
            ip_address_preference: c.enumeration(keys::IP_ADDRESS_PREFERENCE, IpAddressPreference::parse)?,
            connect_timeout: c.integer(keys::CONNECT_TIMEOUT)?,
            command_timeout: c.integer(keys::COMMAND_TIMEOUT)?,
            context_connection: c.boolean(keys::CONTEXT_CONNECTION)?,
            current_language: c.text(keys::CURRENT_LANGUAGE),
            local_db_instance: self.host.local_db_instance(&data_source),
            data_source,
            encrypt: c.boolean(keys::ENCRYPT)?,
            enlist: c.boolean(keys::ENLIST)?,
            failover_partner: c.text(keys::FAILOVER_PARTNER),
            initial_catalog: c.text(keys::INITIAL_CATALOG),
            integrated_security: c.integrated_security()?,
            load_balance_timeout: c.integer(keys::LOAD_BALANCE_TIMEOUT)?,
            multiple_active_result_sets: c.boolean(keys::MARS)?,
            max_pool_size: c.integer(keys::MAX_POOL_SIZE)?,
            min_pool_size: c.integer(keys::MIN_POOL_SIZE)?,
            multi_subnet_failover: c.boolean(keys::MULTI_SUBNET_FAILOVER)?,
            transparent_network_ip_resolution: c.boolean(keys::TRANSPARENT_NETWORK_IP_RESOLUTION)?,
            network_library: None,
            packet_size: c.integer(keys::PACKET_SIZE)?,
            password: c.text(keys::PASSWORD),
            persist_security_info: c.boolean(keys::PERSIST_SECURITY_INFO)?,
            pooling: c.boolean(keys::POOLING)?,
            replication: c.boolean(keys::REPLICATION)?,
            transaction_binding: TransactionBinding::default(),
            trust_server_certificate: c.boolean(keys::TRUST_SERVER_CERTIFICATE)?,
            type_system_version: TypeSystem::default(),
            user_id: c.text(keys::USER_ID),
            user_instance: c.boolean(keys::USER_INSTANCE)?,
            workstation_id: table.value(keys::WORKSTATION_ID).map(str::to_string),
            connect_retry_count: c.integer(keys::CONNECT_RETRY_COUNT)?,
            connect_retry_interval: c.integer(keys::CONNECT_RETRY_INTERVAL)?,
            authentication: c.enumeration(keys::AUTHENTICATION, AuthenticationMethod::parse)?,
            entries: table.iter().map(|(k, v)| (k, v.to_string())).collect(),
        };

        check_ranges(&opts)?;
        opts.network_library = resolve_network_library(table)?;
        check_lengths(&opts)?;
        self.check_context_connection(&opts, table)?;
        self.apply_encryption_override(&mut opts);
        check_failover(&opts)?;
        self.expand_attach_file(&mut opts)?;

        if opts.user_instance && !opts.failover_partner.is_empty() {
            return Err(OptionsError::incompatible(keys::USER_INSTANCE, keys::FAILOVER_PARTNER));
        }

        opts.type_system_version = c.text_enumeration(keys::TYPE_SYSTEM_VERSION, TypeSystem::parse)?;
        if opts.context_connection && opts.type_system_version == TypeSystem::SqlServer2000 {
            return Err(OptionsError::ContextModeViolation(ContextViolation::TypeSystem2000));
        }

        opts.transaction_binding = c.text_enumeration(keys::TRANSACTION_BINDING, TransactionBinding::parse)?;

        if !(0..=255).contains(&opts.connect_retry_count) {
            return Err(OptionsError::invalid_value(keys::CONNECT_RETRY_COUNT));
        }
        if !(1..=60).contains(&opts.connect_retry_interval) {
            return Err(OptionsError::invalid_value(keys::CONNECT_RETRY_INTERVAL));
        }

        let credentials = Credentials {
            authentication: opts.authentication,
            integrated_security: opts.integrated_security,
            has_user_id: table.contains(keys::USER_ID),
            has_password: table.contains(keys::PASSWORD),
        };
        for rule in AuthenticationRule::ALL {
            rule.check(&credentials)?;
        }

        Ok(opts)
    }

    fn check_context_connection(
        &self,
        opts: &ResolvedConnectionOptions,
        table: &KeyValueTable,
    ) -> OptionsResult<()> {
        if !opts.context_connection {
            return Ok(());
        }
        if !self.host.in_process() {
            return Err(OptionsError::ContextModeViolation(ContextViolation::OutOfProcess));
        }
        match table
            .keys()
            .find(|key| *key != keys::CONTEXT_CONNECTION && *key != keys::TYPE_SYSTEM_VERSION)
        {
            Some(key) => Err(OptionsError::ContextModeViolation(ContextViolation::DisallowedKeyword(key))),
            None => Ok(()),
        }
    }

    fn apply_encryption_override(&self, opts: &mut ResolvedConnectionOptions) {
        if !opts.encrypt && self.host.legacy_encryption_override() {
            warn!(data_source = %opts.data_source, "encryption forced on by host policy");
            opts.encrypt = true;
        }
    }

    fn expand_attach_file(&self, opts: &mut ResolvedConnectionOptions) -> OptionsResult<()> {
        let root = self.host.data_directory();
        opts.expanded_attach_db_filename = expand_data_directory(&opts.attach_db_filename, root.as_deref())?;

        let path = opts
            .expanded_attach_db_filename
            .as_deref()
            .unwrap_or(&opts.attach_db_filename);
        if path.contains('|') {
            return Err(OptionsError::invalid_value(keys::ATTACH_DB_FILENAME));
        }
        check_length(path, limits::ATTACH_DB_FILE, keys::ATTACH_DB_FILENAME)?;

        if opts.enforce_local_host() && !is_local_host(&opts.data_source, &self.host.machine_name()) {
            return Err(OptionsError::invalid_value(keys::ATTACH_DB_FILENAME));
        }
        Ok(())
    }
}

/// Typed reads from a tokenized table. Absent and empty values take the default.
struct Coercer<'a> {
    table: &'a KeyValueTable,
}

impl Coercer<'_> {
    fn raw(&self, key: &'static str) -> &str {
        self.table
            .value(key)
            .unwrap_or_else(|| grammar::canonical(key).map_or("", |o| o.default))
    }

    fn text(&self, key: &'static str) -> String {
        self.raw(key).to_string()
    }

    fn boolean(&self, key: &'static str) -> OptionsResult<bool> {
        values::parse_bool(self.raw(key)).ok_or(OptionsError::invalid_value(key))
    }

    fn integrated_security(&self) -> OptionsResult<bool> {
        values::parse_integrated_security(self.raw(keys::INTEGRATED_SECURITY))
            .ok_or(OptionsError::invalid_value(keys::INTEGRATED_SECURITY))
    }

    fn integer(&self, key: &'static str) -> OptionsResult<i32> {
        self.raw(key)
            .trim()
            .parse::<i32>()
            .map_err(|_| OptionsError::invalid_value(key))
    }

    fn enumeration<T: Default>(&self, key: &'static str, parse: fn(&str) -> Option<T>) -> OptionsResult<T> {
        match self.table.value(key) {
            Some(value) => parse(value).ok_or(OptionsError::invalid_value(key)),
            None => Ok(T::default()),
        }
    }

    /// Text options whose literal is resolved late in validation.
    fn text_enumeration<T>(&self, key: &'static str, parse: fn(&str) -> Option<T>) -> OptionsResult<T> {
        parse(self.raw(key)).ok_or(OptionsError::invalid_value(key))
    }
}

fn check_length(value: &str, limit: usize, key: &'static str) -> OptionsResult<()> {
    if value.chars().count() > limit {
        return Err(OptionsError::value_length(key, limit));
    }
    Ok(())
}

fn check_ranges(opts: &ResolvedConnectionOptions) -> OptionsResult<()> {
    let non_negative = [
        (keys::LOAD_BALANCE_TIMEOUT, opts.load_balance_timeout),
        (keys::CONNECT_TIMEOUT, opts.connect_timeout),
        (keys::COMMAND_TIMEOUT, opts.command_timeout),
        (keys::MAX_POOL_SIZE, opts.max_pool_size),
        (keys::MIN_POOL_SIZE, opts.min_pool_size),
    ];
    if let Some((key, _)) = non_negative.iter().find(|(_, value)| *value < 0) {
        return Err(OptionsError::invalid_value(key));
    }

    if opts.max_pool_size < opts.min_pool_size {
        return Err(OptionsError::incompatible(keys::MIN_POOL_SIZE, keys::MAX_POOL_SIZE));
    }

    if !(limits::MIN_PACKET_SIZE..=limits::MAX_PACKET_SIZE).contains(&opts.packet_size) {
        return Err(OptionsError::invalid_value(keys::PACKET_SIZE));
    }
    Ok(())
}

fn resolve_network_library(table: &KeyValueTable) -> OptionsResult<Option<NetworkProtocol>> {
    match table.value(keys::NETWORK_LIBRARY) {
        Some(name) => NetworkProtocol::from_library(name)
            .map(Some)
            .ok_or(OptionsError::invalid_value(keys::NETWORK_LIBRARY)),
        None => Ok(None),
    }
}

fn check_lengths(opts: &ResolvedConnectionOptions) -> OptionsResult<()> {
    check_length(&opts.application_name, limits::APPLICATION_NAME, keys::APPLICATION_NAME)?;
    check_length(&opts.current_language, limits::LANGUAGE, keys::CURRENT_LANGUAGE)?;
    check_length(&opts.data_source, limits::SERVER_NAME, keys::DATA_SOURCE)?;
    check_length(&opts.failover_partner, limits::SERVER_NAME, keys::FAILOVER_PARTNER)?;
    check_length(&opts.initial_catalog, limits::DATABASE, keys::INITIAL_CATALOG)?;
    check_length(&opts.password, limits::CLIENT_SECRET, keys::PASSWORD)?;
    check_length(&opts.user_id, limits::CLIENT_ID, keys::USER_ID)?;
    if let Some(id) = &opts.workstation_id {
        check_length(id, limits::HOST_NAME, keys::WORKSTATION_ID)?;
    }
    Ok(())
}

fn check_failover(opts: &ResolvedConnectionOptions) -> OptionsResult<()> {
    if opts.failover_partner.is_empty() {
        return Ok(());
    }
    if opts.multi_subnet_failover {
        return Err(OptionsError::incompatible(keys::FAILOVER_PARTNER, keys::MULTI_SUBNET_FAILOVER));
    }
    if opts.initial_catalog.is_empty() {
        return Err(OptionsError::missing_dependent(keys::FAILOVER_PARTNER, keys::INITIAL_CATALOG));
    }
    Ok(())
}

/// The credential facts the authentication rules look at.
#[derive(Debug, Clone, Copy)]
pub struct Credentials {
    /// Resolved authentication mode.
    pub authentication: AuthenticationMethod,
    /// Resolved integrated security flag.
    pub integrated_security: bool,
    /// `user id` was written, even if empty.
    pub has_user_id: bool,
    /// `password` was written, even if empty.
    pub has_password: bool,
}

/// Forbidden combinations of authentication mode and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationRule {
    /// An explicit mode cannot be combined with integrated security.
    ExplicitWithIntegratedSecurity,
    /// Directory integrated takes neither user id nor password.
    IntegratedWithCredentials,
    /// Interactive sign-in takes no password.
    InteractiveWithPassword,
    /// Device code flow takes neither user id nor password.
    DeviceCodeFlowWithCredentials,
    /// Managed identity, MSI and default credentials take no password.
    NonInteractiveWithPassword,
}

impl AuthenticationRule {
    /// Every rule in evaluation order.
    pub const ALL: [Self; 5] = [
        Self::ExplicitWithIntegratedSecurity,
        Self::IntegratedWithCredentials,
        Self::InteractiveWithPassword,
        Self::DeviceCodeFlowWithCredentials,
        Self::NonInteractiveWithPassword,
    ];

    /// Fail with `IncompatibleOptions` if `credentials` break this rule.
    pub fn check(&self, credentials: &Credentials) -> OptionsResult<()> {
        use AuthenticationMethod as M;

        let auth = credentials.authentication;
        let user_or_password = || {
            if credentials.has_user_id {
                Some(keys::USER_ID)
            } else if credentials.has_password {
                Some(keys::PASSWORD)
            } else {
                None
            }
        };
        let password = || credentials.has_password.then_some(keys::PASSWORD);

        let conflict = match self {
            Self::ExplicitWithIntegratedSecurity => (auth != M::NotSpecified
                && credentials.integrated_security)
                .then_some(keys::INTEGRATED_SECURITY),
            Self::IntegratedWithCredentials if auth == M::ActiveDirectoryIntegrated => user_or_password(),
            Self::InteractiveWithPassword if auth == M::ActiveDirectoryInteractive => password(),
            Self::DeviceCodeFlowWithCredentials if auth == M::ActiveDirectoryDeviceCodeFlow => {
                user_or_password()
            }
            Self::NonInteractiveWithPassword if auth.is_non_interactive() => password(),
            _ => None,
        };

        match conflict {
            Some(other) => Err(OptionsError::incompatible(keys::AUTHENTICATION, other)),
            None => Ok(()),
        }
    }
}
