//! Typed option values and their literal spellings.

use serde::{Deserialize, Serialize};

/// Parse a boolean option literal.
///
/// Accepts `true`/`yes` and `false`/`no`, case-insensitive.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parse the `integrated security` literal, which also accepts `sspi`.
pub fn parse_integrated_security(value: &str) -> Option<bool> {
    if value.trim().eq_ignore_ascii_case("sspi") {
        Some(true)
    } else {
        parse_bool(value)
    }
}

/// Compare ignoring ASCII case and spaces, so `Sql Password` matches `SqlPassword`.
fn loose_eq(value: &str, literal: &str) -> bool {
    let squash = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    squash(value) == squash(literal)
}

/// Workload type declared when connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplicationIntent {
    /// Read-write workload.
    #[default]
    ReadWrite,
    /// Read-only workload, eligible for secondary replicas.
    ReadOnly,
}

impl ApplicationIntent {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "readwrite" => Some(Self::ReadWrite),
            "readonly" => Some(Self::ReadOnly),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadWrite => "ReadWrite",
            Self::ReadOnly => "ReadOnly",
        }
    }
}

/// Pool behaviour while a connection attempt is failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PoolBlockingPeriod {
    /// Block for Azure endpoints only.
    #[default]
    Auto,
    /// Always block.
    AlwaysBlock,
    /// Never block.
    NeverBlock,
}

impl PoolBlockingPeriod {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "alwaysblock" => Some(Self::AlwaysBlock),
            "neverblock" => Some(Self::NeverBlock),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::AlwaysBlock => "AlwaysBlock",
            Self::NeverBlock => "NeverBlock",
        }
    }
}

/// Connection-level column encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnEncryptionSetting {
    /// Always Encrypted is off.
    #[default]
    Disabled,
    /// Always Encrypted is on.
    Enabled,
}

impl ColumnEncryptionSetting {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "disabled" => Some(Self::Disabled),
            "enabled" => Some(Self::Enabled),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Enabled => "Enabled",
        }
    }
}

/// Enclave attestation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttestationProtocol {
    /// Not given.
    #[default]
    NotSpecified,
    /// Azure Attestation Service.
    Aas,
    /// Host Guardian Service.
    Hgs,
    /// No attestation.
    None,
}

impl AttestationProtocol {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "aas" => Some(Self::Aas),
            "hgs" => Some(Self::Hgs),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSpecified => "NotSpecified",
            Self::Aas => "AAS",
            Self::Hgs => "HGS",
            Self::None => "None",
        }
    }
}

/// Address family preference when the server name resolves to several addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IpAddressPreference {
    /// Try IPv4 addresses first.
    #[default]
    IPv4First,
    /// Try IPv6 addresses first.
    IPv6First,
    /// Keep the resolver's order.
    UsePlatformDefault,
}

impl IpAddressPreference {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ipv4first" => Some(Self::IPv4First),
            "ipv6first" => Some(Self::IPv6First),
            "useplatformdefault" => Some(Self::UsePlatformDefault),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IPv4First => "IPv4First",
            Self::IPv6First => "IPv6First",
            Self::UsePlatformDefault => "UsePlatformDefault",
        }
    }
}

/// Authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthenticationMethod {
    /// No explicit mode; SQL or integrated authentication applies.
    #[default]
    NotSpecified,
    /// SQL Server login.
    SqlPassword,
    /// Directory user name and password.
    ActiveDirectoryPassword,
    /// Directory integrated (Kerberos/SSO).
    ActiveDirectoryIntegrated,
    /// Interactive browser sign-in.
    ActiveDirectoryInteractive,
    /// Service principal client credentials.
    ActiveDirectoryServicePrincipal,
    /// Device code flow.
    ActiveDirectoryDeviceCodeFlow,
    /// Managed identity.
    ActiveDirectoryManagedIdentity,
    /// Managed service identity (legacy name for managed identity).
    ActiveDirectoryMsi,
    /// Default credential chain.
    ActiveDirectoryDefault,
}

impl AuthenticationMethod {
    const ALL: [Self; 9] = [
        Self::SqlPassword,
        Self::ActiveDirectoryPassword,
        Self::ActiveDirectoryIntegrated,
        Self::ActiveDirectoryInteractive,
        Self::ActiveDirectoryServicePrincipal,
        Self::ActiveDirectoryDeviceCodeFlow,
        Self::ActiveDirectoryManagedIdentity,
        Self::ActiveDirectoryMsi,
        Self::ActiveDirectoryDefault,
    ];

    /// Parse from string. Inner spaces are optional.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| loose_eq(s, m.as_str()))
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSpecified => "NotSpecified",
            Self::SqlPassword => "Sql Password",
            Self::ActiveDirectoryPassword => "Active Directory Password",
            Self::ActiveDirectoryIntegrated => "Active Directory Integrated",
            Self::ActiveDirectoryInteractive => "Active Directory Interactive",
            Self::ActiveDirectoryServicePrincipal => "Active Directory Service Principal",
            Self::ActiveDirectoryDeviceCodeFlow => "Active Directory Device Code Flow",
            Self::ActiveDirectoryManagedIdentity => "Active Directory Managed Identity",
            Self::ActiveDirectoryMsi => "Active Directory MSI",
            Self::ActiveDirectoryDefault => "Active Directory Default",
        }
    }

    /// Modes that acquire tokens without a user-supplied secret.
    pub fn is_non_interactive(&self) -> bool {
        matches!(
            self,
            Self::ActiveDirectoryManagedIdentity | Self::ActiveDirectoryMsi | Self::ActiveDirectoryDefault
        )
    }
}

impl std::fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server type system the client presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeSystem {
    /// SQL Server 2000 types.
    SqlServer2000,
    /// SQL Server 2005 types.
    SqlServer2005,
    /// SQL Server 2008 types, also selected by `Latest`.
    #[default]
    SqlServer2008,
    /// SQL Server 2012 types.
    SqlServer2012,
}

impl TypeSystem {
    /// Parse from string. `Latest` maps to [`TypeSystem::SqlServer2008`].
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "latest" | "sql server 2008" => Some(Self::SqlServer2008),
            "sql server 2000" => Some(Self::SqlServer2000),
            "sql server 2005" => Some(Self::SqlServer2005),
            "sql server 2012" => Some(Self::SqlServer2012),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlServer2000 => "SQL Server 2000",
            Self::SqlServer2005 => "SQL Server 2005",
            Self::SqlServer2008 => "SQL Server 2008",
            Self::SqlServer2012 => "SQL Server 2012",
        }
    }

    /// Numeric version year.
    pub fn year(&self) -> u16 {
        match self {
            Self::SqlServer2000 => 2000,
            Self::SqlServer2005 => 2005,
            Self::SqlServer2008 => 2008,
            Self::SqlServer2012 => 2012,
        }
    }

    /// Version of the server type assembly this type system loads.
    pub fn assembly_version(&self) -> (u16, u16, u16, u16) {
        match self {
            Self::SqlServer2012 => (11, 0, 0, 0),
            _ => (10, 0, 0, 0),
        }
    }
}

/// How a connection follows an ambient transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransactionBinding {
    /// Detach when the transaction ends.
    #[default]
    ImplicitUnbind,
    /// Stay attached until explicitly unbound.
    ExplicitUnbind,
}

impl TransactionBinding {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "implicit unbind" => Some(Self::ImplicitUnbind),
            "explicit unbind" => Some(Self::ExplicitUnbind),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImplicitUnbind => "Implicit Unbind",
            Self::ExplicitUnbind => "Explicit Unbind",
        }
    }
}

/// Transport protocol named by a legacy network library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkProtocol {
    /// TCP/IP (`dbmssocn`).
    Tcp,
    /// Named pipes (`dbnmpntw`).
    NamedPipes,
    /// Multiprotocol RPC (`dbmsrpcn`).
    Rpc,
    /// Banyan Vines (`dbmsvinn`).
    BanyanVines,
    /// AppleTalk (`dbmsadsn`).
    AppleTalk,
    /// IPX/SPX (`dbmsspxn`).
    IpxSpx,
    /// VIA (`dbmsgnet`).
    Via,
    /// Shared memory (`dbmslpcn`).
    SharedMemory,
}

impl NetworkProtocol {
    const LIBRARIES: [(&'static str, Self); 8] = [
        ("dbmssocn", Self::Tcp),
        ("dbnmpntw", Self::NamedPipes),
        ("dbmsrpcn", Self::Rpc),
        ("dbmsvinn", Self::BanyanVines),
        ("dbmsadsn", Self::AppleTalk),
        ("dbmsspxn", Self::IpxSpx),
        ("dbmsgnet", Self::Via),
        ("dbmslpcn", Self::SharedMemory),
    ];

    /// Resolve a network library name such as `dbmssocn`.
    pub fn from_library(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::LIBRARIES
            .iter()
            .find(|(library, _)| *library == name)
            .map(|(_, protocol)| *protocol)
    }

    /// The library name this protocol is selected by.
    pub fn library(&self) -> &'static str {
        Self::LIBRARIES
            .iter()
            .find(|(_, protocol)| protocol == self)
            .map_or("", |(library, _)| library)
    }

    /// Short protocol name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::NamedPipes => "np",
            Self::Rpc => "rpc",
            Self::BanyanVines => "bv",
            Self::AppleTalk => "adsp",
            Self::IpxSpx => "spx",
            Self::Via => "via",
            Self::SharedMemory => "lpc",
        }
    }

    /// Whether a connection can actually be opened over this protocol.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Tcp | Self::NamedPipes | Self::Via | Self::SharedMemory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" yes "), Some(true));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("1"), None);
        assert_eq!(parse_bool("sspi"), None);
        assert_eq!(parse_integrated_security("SSPI"), Some(true));
        assert_eq!(parse_integrated_security("false"), Some(false));
    }

    #[test]
    fn test_authentication_parse() {
        assert_eq!(
            AuthenticationMethod::parse("Active Directory Integrated"),
            Some(AuthenticationMethod::ActiveDirectoryIntegrated)
        );
        assert_eq!(
            AuthenticationMethod::parse("activedirectorydevicecodeflow"),
            Some(AuthenticationMethod::ActiveDirectoryDeviceCodeFlow)
        );
        assert_eq!(
            AuthenticationMethod::parse("sqlpassword"),
            Some(AuthenticationMethod::SqlPassword)
        );
        assert_eq!(AuthenticationMethod::parse("NotSpecified"), None);
        assert_eq!(AuthenticationMethod::parse("kerberos"), None);
        assert!(AuthenticationMethod::ActiveDirectoryMsi.is_non_interactive());
        assert!(!AuthenticationMethod::ActiveDirectoryInteractive.is_non_interactive());
    }

    #[test]
    fn test_type_system() {
        assert_eq!(TypeSystem::parse("Latest"), Some(TypeSystem::SqlServer2008));
        assert_eq!(TypeSystem::parse("sql server 2012"), Some(TypeSystem::SqlServer2012));
        assert_eq!(TypeSystem::parse("2012"), None);
        assert_eq!(TypeSystem::SqlServer2012.assembly_version(), (11, 0, 0, 0));
        assert_eq!(TypeSystem::SqlServer2005.assembly_version(), (10, 0, 0, 0));
        assert_eq!(TypeSystem::parse(TypeSystem::SqlServer2000.as_str()), Some(TypeSystem::SqlServer2000));
    }

    #[test]
    fn test_enum_round_trips_through_literal() {
        for intent in [ApplicationIntent::ReadWrite, ApplicationIntent::ReadOnly] {
            assert_eq!(ApplicationIntent::parse(intent.as_str()), Some(intent));
        }
        for period in [PoolBlockingPeriod::Auto, PoolBlockingPeriod::AlwaysBlock, PoolBlockingPeriod::NeverBlock] {
            assert_eq!(PoolBlockingPeriod::parse(period.as_str()), Some(period));
        }
        assert_eq!(IpAddressPreference::parse("ipv6first"), Some(IpAddressPreference::IPv6First));
        assert_eq!(AttestationProtocol::parse("HGS"), Some(AttestationProtocol::Hgs));
        assert_eq!(TransactionBinding::parse("explicit UNBIND"), Some(TransactionBinding::ExplicitUnbind));
    }

    #[test]
    fn test_network_library() {
        assert_eq!(NetworkProtocol::from_library(" DBMSSOCN "), Some(NetworkProtocol::Tcp));
        assert_eq!(NetworkProtocol::from_library("dbmslpcn"), Some(NetworkProtocol::SharedMemory));
        assert_eq!(NetworkProtocol::from_library("tcp"), None);
        assert_eq!(NetworkProtocol::Tcp.library(), "dbmssocn");
        assert!(NetworkProtocol::Via.is_supported());
        assert!(!NetworkProtocol::Rpc.is_supported());
    }
}
