//! The connection string grammar: canonical keys, synonyms and defaults.
//!
//! The table is constant data. The synonym index built from it is created
//! once on first use and shared for the lifetime of the process.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical option keys. All keys are lower case.
pub mod keys {
    pub const APPLICATION_INTENT: &str = "application intent";
    pub const APPLICATION_NAME: &str = "application name";
    pub const ATTACH_DB_FILENAME: &str = "attachdbfilename";
    pub const POOL_BLOCKING_PERIOD: &str = "pool blocking period";
    pub const COLUMN_ENCRYPTION_SETTING: &str = "column encryption setting";
    pub const ENCLAVE_ATTESTATION_URL: &str = "enclave attestation url";
    pub const ATTESTATION_PROTOCOL: &str = "attestation protocol";
    pub const IP_ADDRESS_PREFERENCE: &str = "ip address preference";
    pub const CONNECT_TIMEOUT: &str = "connect timeout";
    pub const COMMAND_TIMEOUT: &str = "command timeout";
    pub const CONNECTION_RESET: &str = "connection reset";
    pub const CONTEXT_CONNECTION: &str = "context connection";
    pub const CURRENT_LANGUAGE: &str = "current language";
    pub const DATA_SOURCE: &str = "data source";
    pub const ENCRYPT: &str = "encrypt";
    pub const ENLIST: &str = "enlist";
    pub const FAILOVER_PARTNER: &str = "failover partner";
    pub const INITIAL_CATALOG: &str = "initial catalog";
    pub const INTEGRATED_SECURITY: &str = "integrated security";
    pub const LOAD_BALANCE_TIMEOUT: &str = "load balance timeout";
    pub const MARS: &str = "multiple active result sets";
    pub const MAX_POOL_SIZE: &str = "max pool size";
    pub const MIN_POOL_SIZE: &str = "min pool size";
    pub const MULTI_SUBNET_FAILOVER: &str = "multi subnet failover";
    pub const TRANSPARENT_NETWORK_IP_RESOLUTION: &str = "transparent network ip resolution";
    pub const NETWORK_LIBRARY: &str = "network library";
    pub const PACKET_SIZE: &str = "packet size";
    pub const PASSWORD: &str = "password";
    pub const PERSIST_SECURITY_INFO: &str = "persist security info";
    pub const POOLING: &str = "pooling";
    pub const REPLICATION: &str = "replication";
    pub const TRANSACTION_BINDING: &str = "transaction binding";
    pub const TRUST_SERVER_CERTIFICATE: &str = "trust server certificate";
    pub const TYPE_SYSTEM_VERSION: &str = "type system version";
    pub const USER_ID: &str = "user id";
    pub const USER_INSTANCE: &str = "user instance";
    pub const WORKSTATION_ID: &str = "workstation id";
    pub const CONNECT_RETRY_COUNT: &str = "connect retry count";
    pub const CONNECT_RETRY_INTERVAL: &str = "connect retry interval";
    pub const AUTHENTICATION: &str = "authentication";
}

/// Protocol-defined maximum string lengths.
pub mod limits {
    pub const APPLICATION_NAME: usize = 128;
    pub const LANGUAGE: usize = 128;
    pub const SERVER_NAME: usize = 128;
    pub const DATABASE: usize = 128;
    pub const CLIENT_SECRET: usize = 128;
    pub const CLIENT_ID: usize = 128;
    pub const HOST_NAME: usize = 128;
    pub const ATTACH_DB_FILE: usize = 260;

    pub const MIN_PACKET_SIZE: i32 = 512;
    pub const MAX_PACKET_SIZE: i32 = 32768;
}

/// Default application name reported to the server.
pub const DEFAULT_APPLICATION_NAME: &str = "sqlfront";

/// One row of the grammar table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Canonical lower-case key.
    pub key: &'static str,
    /// Spelling used when re-serializing.
    pub display: &'static str,
    /// Default value as it would be written in a connection string.
    pub default: &'static str,
    /// Alternative spellings, all lower case.
    pub synonyms: &'static [&'static str],
}

const fn spec(
    key: &'static str,
    display: &'static str,
    default: &'static str,
    synonyms: &'static [&'static str],
) -> OptionSpec {
    OptionSpec {
        key,
        display,
        default,
        synonyms,
    }
}

/// Every option the resolver understands.
pub static OPTIONS: [OptionSpec; 40] = [
    spec(keys::APPLICATION_INTENT, "Application Intent", "ReadWrite", &["applicationintent"]),
    spec(keys::APPLICATION_NAME, "Application Name", DEFAULT_APPLICATION_NAME, &["app"]),
    spec(keys::ATTACH_DB_FILENAME, "AttachDbFilename", "", &["extended properties", "initial file name"]),
    spec(keys::POOL_BLOCKING_PERIOD, "Pool Blocking Period", "Auto", &["poolblockingperiod"]),
    spec(keys::COLUMN_ENCRYPTION_SETTING, "Column Encryption Setting", "Disabled", &[]),
    spec(keys::ENCLAVE_ATTESTATION_URL, "Enclave Attestation Url", "", &[]),
    spec(keys::ATTESTATION_PROTOCOL, "Attestation Protocol", "NotSpecified", &[]),
    spec(keys::IP_ADDRESS_PREFERENCE, "IP Address Preference", "IPv4First", &["ipaddresspreference"]),
    spec(keys::CONNECT_TIMEOUT, "Connect Timeout", "15", &["connection timeout", "timeout"]),
    spec(keys::COMMAND_TIMEOUT, "Command Timeout", "30", &[]),
    spec(keys::CONNECTION_RESET, "Connection Reset", "true", &[]),
    spec(keys::CONTEXT_CONNECTION, "Context Connection", "false", &[]),
    spec(keys::CURRENT_LANGUAGE, "Current Language", "", &["language"]),
    spec(keys::DATA_SOURCE, "Data Source", "", &["addr", "address", "server", "network address"]),
    spec(keys::ENCRYPT, "Encrypt", "true", &[]),
    spec(keys::ENLIST, "Enlist", "true", &[]),
    spec(keys::FAILOVER_PARTNER, "Failover Partner", "", &[]),
    spec(keys::INITIAL_CATALOG, "Initial Catalog", "", &["database"]),
    spec(keys::INTEGRATED_SECURITY, "Integrated Security", "false", &["trusted_connection"]),
    spec(keys::LOAD_BALANCE_TIMEOUT, "Load Balance Timeout", "0", &["connection lifetime"]),
    spec(keys::MARS, "Multiple Active Result Sets", "false", &["multipleactiveresultsets"]),
    spec(keys::MAX_POOL_SIZE, "Max Pool Size", "100", &[]),
    spec(keys::MIN_POOL_SIZE, "Min Pool Size", "0", &[]),
    spec(keys::MULTI_SUBNET_FAILOVER, "Multi Subnet Failover", "false", &["multisubnetfailover"]),
    spec(keys::TRANSPARENT_NETWORK_IP_RESOLUTION, "Transparent Network IP Resolution", "true", &["transparentnetworkipresolution"]),
    spec(keys::NETWORK_LIBRARY, "Network Library", "", &["net", "network"]),
    spec(keys::PACKET_SIZE, "Packet Size", "8000", &[]),
    spec(keys::PASSWORD, "Password", "", &["pwd"]),
    spec(keys::PERSIST_SECURITY_INFO, "Persist Security Info", "false", &["persistsecurityinfo"]),
    spec(keys::POOLING, "Pooling", "true", &[]),
    spec(keys::REPLICATION, "Replication", "false", &[]),
    spec(keys::TRANSACTION_BINDING, "Transaction Binding", "Implicit Unbind", &[]),
    spec(keys::TRUST_SERVER_CERTIFICATE, "Trust Server Certificate", "false", &["trustservercertificate"]),
    spec(keys::TYPE_SYSTEM_VERSION, "Type System Version", "Latest", &[]),
    spec(keys::USER_ID, "User ID", "", &["uid", "user"]),
    spec(keys::USER_INSTANCE, "User Instance", "false", &[]),
    spec(keys::WORKSTATION_ID, "Workstation ID", "", &["wsid"]),
    spec(keys::CONNECT_RETRY_COUNT, "Connect Retry Count", "1", &["connectretrycount"]),
    spec(keys::CONNECT_RETRY_INTERVAL, "Connect Retry Interval", "10", &["connectretryinterval"]),
    spec(keys::AUTHENTICATION, "Authentication", "NotSpecified", &[]),
];

/// Number of synonym spellings in [`OPTIONS`].
pub const SYNONYM_COUNT: usize = 29;

static SYNONYMS: OnceLock<HashMap<&'static str, &'static OptionSpec>> = OnceLock::new();

/// Map from every accepted spelling (canonical or synonym) to its option.
pub fn synonyms() -> &'static HashMap<&'static str, &'static OptionSpec> {
    SYNONYMS.get_or_init(|| {
        let mut map = HashMap::with_capacity(OPTIONS.len() + SYNONYM_COUNT);
        for option in OPTIONS.iter() {
            map.insert(option.key, option);
            for synonym in option.synonyms {
                map.insert(*synonym, option);
            }
        }
        debug_assert_eq!(map.len(), OPTIONS.len() + SYNONYM_COUNT, "grammar table has overlapping spellings");
        map
    })
}

/// Look up an option by any spelling. `key` must already be lower case.
pub fn lookup(key: &str) -> Option<&'static OptionSpec> {
    synonyms().get(key).copied()
}

/// Look up an option by its canonical key.
pub fn canonical(key: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|option| option.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_keys_are_distinct_and_lower_case() {
        let mut seen = HashSet::new();
        for option in OPTIONS.iter() {
            assert!(seen.insert(option.key), "duplicate key {}", option.key);
            assert_eq!(option.key, option.key.to_lowercase());
            assert_eq!(option.key, option.display.to_lowercase());
        }
    }

    #[test]
    fn test_synonym_count() {
        let total: usize = OPTIONS.iter().map(|o| o.synonyms.len()).sum();
        assert_eq!(total, SYNONYM_COUNT);
        assert_eq!(synonyms().len(), OPTIONS.len() + SYNONYM_COUNT);
    }

    #[test]
    fn test_every_synonym_maps_to_one_key() {
        for option in OPTIONS.iter() {
            for synonym in option.synonyms {
                assert_eq!(lookup(synonym).map(|o| o.key), Some(option.key));
            }
        }
        assert_eq!(lookup("server").map(|o| o.key), Some(keys::DATA_SOURCE));
        assert_eq!(lookup("pwd").map(|o| o.key), Some(keys::PASSWORD));
        assert!(lookup("colour").is_none());
    }

    #[test]
    fn test_table_is_shared() {
        assert!(std::ptr::eq(synonyms(), synonyms()));
    }

    #[test]
    fn test_canonical_lookup() {
        assert_eq!(canonical(keys::PACKET_SIZE).map(|o| o.default), Some("8000"));
        assert!(canonical("server").is_none());
    }
}
