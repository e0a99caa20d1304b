// # equipzone
//
// Thin command around equipzone-core:
//
// 1. Reading configuration from environment variables
// 2. Registering collaborators (transports, fetchers)
// 3. Loading an inventory from zone transfers or a remote snapshot
// 4. Filtering it and printing the result as JSON on stdout
//
// Logs go to stderr so the JSON output stays clean.
//
// ## Configuration
//
// ### Directory
// - `EQUIPZONE_SERVER`: Directory server, optionally `host:port`
// - `EQUIPZONE_PORT`: Port when the server carries none (default 53)
// - `EQUIPZONE_TRANSPORT`: Registered transport name (default memory)
//
// The built-in memory transport serves no zones, so `local` needs a network
// transport registered in `registry()`.
// - `EQUIPZONE_KEY_NAME`, `EQUIPZONE_KEY_SECRET`: Update signing key
// - `EQUIPZONE_KEY_ALGORITHM`: hmac-md5 (default), hmac-sha1, hmac-sha256
//
// ### Inventory Source
// - `EQUIPZONE_SOURCE`: remote (default) or local
// - `EQUIPZONE_FORWARD_ZONES`, `EQUIPZONE_REVERSE_ZONES`: Comma-separated zones (local)
// - `EQUIPZONE_URL`: Snapshot URL, absolute or relative to the server (remote)
// - `EQUIPZONE_REMOTE_PORT`: Port for relative URLs (default 9001)
//
// ### Filters
// - `EQUIPZONE_MATCH_NAME`: Regular expression on device names
// - `EQUIPZONE_MODEL`, `EQUIPZONE_CODE`, `EQUIPZONE_PLACE`: Exact (code/place ignore case)
// - `EQUIPZONE_NETWORK`: CIDR the primary or a reverse address must fall in
//
// ## Example
//
// ```bash
// export EQUIPZONE_SERVER=inventory.example.com
// export EQUIPZONE_URL=/devices
// export EQUIPZONE_CODE=WGTN
//
// equipzone
// ```

use anyhow::{Context, Result};
use equipzone_core::config::{
    DirectoryConfig, InventorySourceConfig, ReconcileConfig, TsigConfig, ZoneConfig,
};
use equipzone_core::traits::TsigAlgorithm;
use equipzone_core::{DirectoryService, Inventory, Registry};
use ipnetwork::IpNetwork;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Inventory printed
/// - 1: Configuration or startup error
/// - 2: Runtime error (transfer, fetch, output)
#[derive(Debug, Clone, Copy)]
enum EquipzoneExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<EquipzoneExitCode> for ExitCode {
    fn from(code: EquipzoneExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Inventory filters, all optional and combined with AND
#[derive(Debug, Default)]
struct Filters {
    name_pattern: Option<String>,
    model: Option<String>,
    code: Option<String>,
    place: Option<String>,
    network: Option<IpNetwork>,
}

impl Filters {
    fn apply(&self, mut inventory: Inventory) -> Result<Inventory> {
        if let Some(pattern) = &self.name_pattern {
            inventory = inventory.match_by_name(pattern)?;
        }
        if let Some(model) = &self.model {
            inventory = inventory.list_by_model(model);
        }
        if let Some(code) = &self.code {
            inventory = inventory.list_by_code(code);
        }
        if let Some(place) = &self.place {
            inventory = inventory.list_by_place(place);
        }
        if let Some(network) = &self.network {
            inventory = inventory.list_by_network(network);
        }
        Ok(inventory)
    }
}

/// Application configuration
struct Config {
    zone: ZoneConfig,
    filters: Filters,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut directory = DirectoryConfig::new(var("EQUIPZONE_SERVER").unwrap_or_default());
        directory.port = var("EQUIPZONE_PORT")
            .map(|s| s.parse().context("EQUIPZONE_PORT must be a port number"))
            .transpose()?;
        if let Some(transport) = var("EQUIPZONE_TRANSPORT") {
            directory.transport = transport;
        }

        if let (Some(name), Some(secret)) = (var("EQUIPZONE_KEY_NAME"), var("EQUIPZONE_KEY_SECRET")) {
            let algorithm = match var("EQUIPZONE_KEY_ALGORITHM").as_deref() {
                None | Some("hmac-md5") => TsigAlgorithm::HmacMd5,
                Some("hmac-sha1") => TsigAlgorithm::HmacSha1,
                Some("hmac-sha256") => TsigAlgorithm::HmacSha256,
                Some(other) => anyhow::bail!(
                    "EQUIPZONE_KEY_ALGORITHM '{}' is not valid. \
                    Valid algorithms: hmac-md5, hmac-sha1, hmac-sha256",
                    other
                ),
            };
            directory = directory.with_key(TsigConfig {
                name,
                secret,
                algorithm,
            });
        }

        let inventory = match var("EQUIPZONE_SOURCE").as_deref().unwrap_or("remote") {
            "local" => InventorySourceConfig::Local {
                forward_zones: split_list(var("EQUIPZONE_FORWARD_ZONES")),
                reverse_zones: split_list(var("EQUIPZONE_REVERSE_ZONES")),
            },
            "remote" => InventorySourceConfig::Remote {
                url: var("EQUIPZONE_URL").unwrap_or_default(),
                port: var("EQUIPZONE_REMOTE_PORT")
                    .map(|s| s.parse().context("EQUIPZONE_REMOTE_PORT must be a port number"))
                    .transpose()?,
                fetcher: "http".to_string(),
            },
            other => anyhow::bail!(
                "EQUIPZONE_SOURCE '{}' is not supported. Supported sources: local, remote",
                other
            ),
        };

        let filters = Filters {
            name_pattern: var("EQUIPZONE_MATCH_NAME"),
            model: var("EQUIPZONE_MODEL"),
            code: var("EQUIPZONE_CODE"),
            place: var("EQUIPZONE_PLACE"),
            network: var("EQUIPZONE_NETWORK")
                .map(|s| s.parse().context("EQUIPZONE_NETWORK must be a CIDR network"))
                .transpose()?,
        };

        Ok(Self {
            zone: ZoneConfig {
                directory,
                inventory,
                reconcile: ReconcileConfig::default(),
            },
            filters,
            log_level: var("EQUIPZONE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration against the collaborators in `registry`
    fn validate(&self, registry: &Registry) -> Result<()> {
        self.zone.validate()?;

        match &self.zone.inventory {
            InventorySourceConfig::Local { .. } => {
                let transport = &self.zone.directory.transport;
                if transport == "memory" {
                    anyhow::bail!(
                        "EQUIPZONE_SOURCE=local needs a network transport; the built-in \
                        memory transport serves no zones. Registered transports: {}",
                        registry.list_transports().join(", ")
                    );
                }
                if !registry.has_transport(transport) {
                    anyhow::bail!(
                        "EQUIPZONE_TRANSPORT '{}' is not registered. Registered transports: {}",
                        transport,
                        registry.list_transports().join(", ")
                    );
                }
            }
            InventorySourceConfig::Remote { fetcher, .. } => {
                if !registry.has_fetch(fetcher) {
                    anyhow::bail!(
                        "Remote fetcher '{}' is not available in this build",
                        fetcher
                    );
                }
            }
        }

        if let InventorySourceConfig::Remote { url, .. } = &self.zone.inventory
            && !url.starts_with("http://")
            && !url.starts_with("https://")
            && self.zone.directory.server.trim().is_empty()
        {
            anyhow::bail!(
                "EQUIPZONE_SERVER is required for a relative EQUIPZONE_URL. \
                Set it via: export EQUIPZONE_SERVER=inventory.example.com"
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "EQUIPZONE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping blanks
fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Registry holding every collaborator this build provides
fn registry() -> Registry {
    let registry = Registry::with_defaults();

    #[cfg(feature = "http")]
    equipzone_fetch_http::register(&registry);

    registry
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return EquipzoneExitCode::ConfigError.into();
        }
    };

    let registry = registry();

    // Validate configuration
    if let Err(e) = config.validate(&registry) {
        eprintln!("Configuration validation error: {:#}", e);
        return EquipzoneExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return EquipzoneExitCode::ConfigError.into();
    }

    info!("Loading {} inventory", config.zone.inventory.type_name());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return EquipzoneExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config, registry).await {
            Ok(()) => EquipzoneExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                EquipzoneExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Load, filter and print the inventory
async fn run(config: Config, registry: Registry) -> Result<()> {
    let inventory = match &config.zone.inventory {
        InventorySourceConfig::Local {
            forward_zones,
            reverse_zones,
        } => {
            let transport = registry.create_transport(&config.zone.directory)?;
            let directory = DirectoryService::from_config(&config.zone.directory, transport)?;
            Inventory::load_local(&directory, forward_zones, reverse_zones).await?
        }
        source @ InventorySourceConfig::Remote { .. } => {
            let fetch = registry.create_fetch(source)?;
            let url = source.remote_url(&config.zone.directory.server)?;
            Inventory::load_remote(fetch.as_ref(), &url).await?
        }
    };

    let total = inventory.len();
    let inventory = config.filters.apply(inventory)?;
    info!("Selected {} of {} devices", inventory.len(), total);

    let json = serde_json::to_string_pretty(&inventory).context("encoding inventory")?;
    println!("{}", json);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use equipzone_core::Device;
    use equipzone_core::transport::{MemoryTransport, MemoryTransportFactory};
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_remote_defaults() {
        let config = config(&[
            ("EQUIPZONE_SERVER", "inventory.example.com"),
            ("EQUIPZONE_URL", "/devices"),
        ])
        .unwrap();
        config.validate(&registry()).unwrap();

        assert_eq!(
            config
                .zone
                .inventory
                .remote_url(&config.zone.directory.server)
                .unwrap(),
            "http://inventory.example.com:9001/devices"
        );
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_local_source_with_key() {
        let config = config(&[
            ("EQUIPZONE_SOURCE", "local"),
            ("EQUIPZONE_SERVER", "ns1.example.com:5353"),
            ("EQUIPZONE_FORWARD_ZONES", "example.com., example.net."),
            ("EQUIPZONE_REVERSE_ZONES", "168.192.in-addr.arpa.,,"),
            ("EQUIPZONE_KEY_NAME", "update-key"),
            ("EQUIPZONE_KEY_SECRET", "c2VjcmV0"),
            ("EQUIPZONE_KEY_ALGORITHM", "hmac-sha256"),
            ("EQUIPZONE_TRANSPORT", "udp"),
        ])
        .unwrap();

        let registry = registry();
        registry.register_transport(
            "udp",
            Box::new(MemoryTransportFactory::new(MemoryTransport::new())),
        );
        config.validate(&registry).unwrap();

        match &config.zone.inventory {
            InventorySourceConfig::Local {
                forward_zones,
                reverse_zones,
            } => {
                assert_eq!(forward_zones, &vec!["example.com.", "example.net."]);
                assert_eq!(reverse_zones, &vec!["168.192.in-addr.arpa."]);
            }
            other => panic!("unexpected source {:?}", other),
        }
        let key = config.zone.directory.key.as_ref().unwrap();
        assert_eq!(key.algorithm, TsigAlgorithm::HmacSha256);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(config(&[("EQUIPZONE_SOURCE", "ldap")]).is_err());
        assert!(config(&[("EQUIPZONE_PORT", "dns")]).is_err());
        assert!(config(&[("EQUIPZONE_NETWORK", "10.0.0.0/40")]).is_err());

        let relative_without_server = config(&[("EQUIPZONE_URL", "/devices")]).unwrap();
        assert!(relative_without_server.validate(&registry()).is_err());

        let bad_level = config(&[
            ("EQUIPZONE_URL", "https://example.com/devices"),
            ("EQUIPZONE_LOG_LEVEL", "loud"),
        ])
        .unwrap();
        assert!(bad_level.validate(&registry()).is_err());
    }

    #[test]
    fn test_local_source_needs_network_transport() {
        let local = |transport: Option<&str>| {
            let mut vars = vec![
                ("EQUIPZONE_SOURCE", "local"),
                ("EQUIPZONE_SERVER", "ns1.example.com"),
                ("EQUIPZONE_FORWARD_ZONES", "example.com."),
            ];
            if let Some(transport) = transport {
                vars.push(("EQUIPZONE_TRANSPORT", transport));
            }
            config(&vars).unwrap()
        };

        let err = local(None).validate(&registry()).unwrap_err();
        assert!(err.to_string().contains("network transport"), "{}", err);

        let err = local(Some("udp")).validate(&registry()).unwrap_err();
        assert!(err.to_string().contains("not registered"), "{}", err);
    }

    #[test]
    fn test_filters_combine() {
        let mut a = Device::new("wgtn-gps.example.com.", "10.1.0.1".parse().unwrap());
        a.code = "WGTN".to_string();
        a.model = "NetR9".to_string();
        let mut b = Device::new("wgtn-seis.example.com.", "192.168.1.7".parse().unwrap());
        b.code = "WGTN".to_string();
        b.model = "Q330".to_string();
        let inventory = Inventory::new(vec![a, b]);

        let filters = Filters {
            name_pattern: Some("^wgtn-".to_string()),
            code: Some("wgtn".to_string()),
            network: Some("10.0.0.0/8".parse().unwrap()),
            ..Filters::default()
        };
        let selected = filters.apply(inventory.clone()).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.devices()[0].model, "NetR9");

        assert_eq!(Filters::default().apply(inventory).unwrap().len(), 2);
    }
}
