//! Integration tests for connection string resolution.
//!
//! These tests drive the resolver through the facade crate the way a driver
//! would: raw strings in, resolved options or a typed error out.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::select;

use sqlfront::options::grammar::{self, OptionSpec, keys};
use sqlfront::options::{
    AuthenticationMethod, ContextViolation, KeyValueTable, OptionsError, ResolvedConnectionOptions,
    Resolver, StaticHost,
};

fn resolver() -> Resolver<StaticHost> {
    Resolver::with_host(
        StaticHost::new()
            .machine_name("app01.corp.example")
            .data_directory("/var/lib/app"),
    )
}

/// A valid value for every option, different from its default where possible.
fn sample_value(option: &OptionSpec) -> &'static str {
    match option.key {
        keys::CONNECT_TIMEOUT => "20",
        keys::COMMAND_TIMEOUT => "45",
        keys::LOAD_BALANCE_TIMEOUT => "5",
        keys::MAX_POOL_SIZE => "50",
        keys::MIN_POOL_SIZE => "1",
        keys::PACKET_SIZE => "4096",
        keys::CONNECT_RETRY_COUNT => "3",
        keys::CONNECT_RETRY_INTERVAL => "5",
        keys::CONTEXT_CONNECTION => "false",
        keys::NETWORK_LIBRARY => "dbmssocn",
        keys::TRANSACTION_BINDING => "Explicit Unbind",
        keys::TYPE_SYSTEM_VERSION => "SQL Server 2012",
        keys::APPLICATION_INTENT => "ReadOnly",
        keys::POOL_BLOCKING_PERIOD => "NeverBlock",
        keys::COLUMN_ENCRYPTION_SETTING => "Enabled",
        keys::ATTESTATION_PROTOCOL => "HGS",
        keys::IP_ADDRESS_PREFERENCE => "IPv6First",
        keys::AUTHENTICATION => "Active Directory Password",
        _ if matches!(option.default, "true" | "false") => "true",
        _ => "value",
    }
}

#[test]
fn test_every_synonym_resolves_like_its_canonical_key() {
    let resolver = resolver();
    for option in grammar::OPTIONS.iter() {
        let value = sample_value(option);
        let canonical = resolver.resolve(&format!("{}={value}", option.key));
        for synonym in option.synonyms {
            let via_synonym = resolver.resolve(&format!("{synonym}={value}"));
            assert_eq!(via_synonym, canonical, "synonym '{synonym}' of '{}'", option.key);
        }
        if option.key != keys::FAILOVER_PARTNER {
            assert!(canonical.is_ok(), "{} = {value}: {canonical:?}", option.key);
        }
    }
}

#[test]
fn test_keys_are_case_insensitive() {
    let a = resolver().resolve("DATA SOURCE=srv;INITIAL CATALOG=db").unwrap();
    let b = resolver().resolve("data source=srv;initial catalog=db").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_unknown_option_reports_written_key() {
    assert_eq!(
        resolver().resolve("Server=srv;Provider=SQLOLEDB").unwrap_err(),
        OptionsError::UnknownOption("Provider".to_string())
    );
}

#[test]
fn test_pool_size_boundaries() {
    let opts = resolver().resolve("Min Pool Size=0;Max Pool Size=0").unwrap();
    assert_eq!((opts.min_pool_size(), opts.max_pool_size()), (0, 0));

    assert_eq!(
        resolver().resolve("Min Pool Size=5;Max Pool Size=4").unwrap_err(),
        OptionsError::incompatible(keys::MIN_POOL_SIZE, keys::MAX_POOL_SIZE)
    );
}

#[test]
fn test_retry_count_boundaries() {
    assert_eq!(resolver().resolve("Connect Retry Count=0").unwrap().connect_retry_count(), 0);
    assert_eq!(resolver().resolve("Connect Retry Count=255").unwrap().connect_retry_count(), 255);
    assert_eq!(
        resolver().resolve("Connect Retry Count=256").unwrap_err(),
        OptionsError::invalid_value(keys::CONNECT_RETRY_COUNT)
    );
}

#[test]
fn test_multi_subnet_failover_reported_before_missing_catalog() {
    let err = resolver()
        .resolve("Data Source=srv;Failover Partner=fp;Initial Catalog=;MultiSubnetFailover=true")
        .unwrap_err();
    assert_eq!(
        err,
        OptionsError::IncompatibleOptions {
            a: keys::FAILOVER_PARTNER,
            b: keys::MULTI_SUBNET_FAILOVER,
        }
    );
}

#[test]
fn test_validation_order_is_fixed() {
    // Packet size is checked before string lengths.
    let raw = format!("Packet Size=1;Server={}", "s".repeat(200));
    assert_eq!(
        resolver().resolve(&raw).unwrap_err(),
        OptionsError::invalid_value(keys::PACKET_SIZE)
    );

    // Context connection is checked before the failover partner.
    assert_eq!(
        resolver()
            .resolve("Context Connection=true;Failover Partner=fp")
            .unwrap_err(),
        OptionsError::ContextModeViolation(ContextViolation::OutOfProcess)
    );

    // Attach file is checked before authentication.
    assert_eq!(
        resolver()
            .resolve("Server=far;AttachDbFilename=|DataDirectory|x.mdf;Authentication=Active Directory MSI;Pwd=p")
            .unwrap_err(),
        OptionsError::invalid_value(keys::ATTACH_DB_FILENAME)
    );
}

#[test]
fn test_attach_file_on_local_machine() {
    for data_source in ["", ".", "(local)", "app01", "APP01\\SQLEXPRESS", "app01.corp.example"] {
        let raw = format!("Data Source={data_source};AttachDbFilename=|DataDirectory|\\orders.mdf");
        let opts = resolver().resolve(&raw).unwrap();
        assert_eq!(opts.expanded_attach_db_filename(), Some("/var/lib/app/orders.mdf"));
        assert!(opts.enforce_local_host());
    }
}

#[test]
fn test_quoted_secrets_survive_reserialization() {
    let opts = resolver()
        .resolve(r#"Server=srv;UID=app;PWD="semi;colon 'and' ""double"" ";Persist Security Info=true"#)
        .unwrap();
    assert_eq!(opts.password(), r#"semi;colon 'and' "double" "#);

    let again = resolver().resolve(&opts.to_connection_string()).unwrap();
    assert_eq!(again, opts);
    assert_eq!(again.password(), opts.password());
}

#[test]
fn test_authentication_modes_resolve() {
    let opts = resolver()
        .resolve("Server=srv;Authentication=ActiveDirectoryServicePrincipal;User ID=client;Password=secret")
        .unwrap();
    assert_eq!(opts.authentication(), AuthenticationMethod::ActiveDirectoryServicePrincipal);

    assert_eq!(
        resolver()
            .resolve("Authentication=Active Directory Device Code Flow;Pwd=x")
            .unwrap_err(),
        OptionsError::incompatible(keys::AUTHENTICATION, keys::PASSWORD)
    );
}

#[test]
fn test_tokenized_table_resolves_like_raw_string() {
    let raw = "Server=srv;Database=db;App=reporting";
    let table = KeyValueTable::parse(raw).unwrap();
    assert_eq!(resolver().resolve_table(&table).unwrap(), resolver().resolve(raw).unwrap());
}

#[test]
fn test_from_env() {
    let var = "SQLFRONT_TEST_OPTIONS_INTEGRATION_CONNECTION";
    assert_eq!(
        ResolvedConnectionOptions::from_env(var).unwrap_err(),
        OptionsError::EnvNotFound(var.to_string())
    );

    // SAFETY: the variable name is unique to this test.
    unsafe { std::env::set_var(var, "Server=envhost;Database=envdb") };
    let opts = ResolvedConnectionOptions::from_env(var).unwrap();
    assert_eq!(opts.data_source(), "envhost");
    assert_eq!(opts.initial_catalog(), "envdb");
    unsafe { std::env::remove_var(var) };
}

#[test]
fn test_options_as_hash_key() {
    use std::collections::HashMap;

    let mut pools = HashMap::new();
    pools.insert(resolver().resolve("Server=a;Max Pool Size=10").unwrap(), "pool-a");
    pools.insert(resolver().resolve("Server=b").unwrap(), "pool-b");

    let lookup = resolver().resolve("server=a;max pool size=10").unwrap();
    assert_eq!(pools.get(&lookup), Some(&"pool-a"));
}

fn pair() -> impl Strategy<Value = String> {
    prop_oneof![
        (select(vec!["Data Source", "Server", "Addr", "Address", "Network Address"]), "[a-z][a-z0-9.]{0,20}")
            .prop_map(|(k, v)| format!("{k}={v}")),
        (select(vec!["Initial Catalog", "Database"]), "[A-Za-z_][A-Za-z0-9_]{0,30}")
            .prop_map(|(k, v)| format!("{k}={v}")),
        (select(vec!["Connect Timeout", "Timeout", "Connection Timeout"]), 0..1000i32)
            .prop_map(|(k, v)| format!("{k}={v}")),
        (
            select(vec!["Encrypt", "Pooling", "MultipleActiveResultSets", "TrustServerCertificate"]),
            select(vec!["true", "false", "yes", "no", "True"])
        )
            .prop_map(|(k, v)| format!("{k}={v}")),
        (512..=32768i32, select(vec!["ApplicationIntent=ReadOnly", "Application Intent=readwrite"]))
            .prop_map(|(size, intent)| format!("Packet Size={size};{intent}")),
        (select(vec!["Application Name", "App"]), "[a-zA-Z0-9 =._-]{0,40}")
            .prop_map(|(k, v)| format!("{k}={v}")),
        (select(vec!["Password", "Pwd"]), "[a-zA-Z0-9!@#$%^&*()=]{0,30}")
            .prop_map(|(k, v)| format!("{k}={v}")),
        (select(vec!["User ID", "UID", "User"]), "[a-z]{1,20}").prop_map(|(k, v)| format!("{k}={v}")),
        (0..100i32, 100..200i32).prop_map(|(min, max)| format!("Min Pool Size={min};Max Pool Size={max}")),
        (0..=255i32, 1..=60i32)
            .prop_map(|(count, interval)| format!("ConnectRetryCount={count};ConnectRetryInterval={interval}")),
    ]
}

fn connection_string() -> impl Strategy<Value = String> {
    prop::collection::vec(pair(), 0..8).prop_map(|pairs| pairs.join(";"))
}

proptest! {
    #[test]
    fn test_resolve_is_deterministic(raw in connection_string()) {
        let first = resolver().resolve(&raw);
        let second = resolver().resolve(&raw);
        prop_assert!(first.is_ok(), "{raw}: {first:?}");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_reserialization_is_idempotent(raw in connection_string()) {
        let opts = resolver().resolve(&raw).unwrap();
        let again = resolver().resolve(&opts.to_connection_string()).unwrap();
        prop_assert_eq!(&again, &opts);
        prop_assert_eq!(again.to_connection_string(), opts.to_connection_string());
    }

    #[test]
    fn test_retry_count_above_range_fails(count in 256..=i32::MAX) {
        let err = resolver().resolve(&format!("ConnectRetryCount={count}")).unwrap_err();
        prop_assert_eq!(err, OptionsError::invalid_value(keys::CONNECT_RETRY_COUNT));
    }

    #[test]
    fn test_resolve_never_panics(raw in "\\PC{0,80}") {
        let _ = resolver().resolve(&raw);
    }
}
