//! Configuration for compilers, the test network and generated files

use crate::artifacts::script::DEFAULT_SCRIPT_PATH;
use crate::scaffold::DEFAULT_PROJECT_NAME;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "sneko.toml";

/// Main session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory shown when no path argument is given
    pub contracts_dir: PathBuf,

    /// External compiler settings
    pub compilers: CompilerConfig,

    /// Test network settings
    pub network: NetworkConfig,

    /// Where the generated deployment script is written
    pub script_path: PathBuf,

    /// Directory name of scaffolded Ape projects
    pub project_name: String,

    /// Log destination; logs are discarded when unset
    pub log_file: Option<PathBuf>,
}

/// Settings for the external compilers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompilerConfig {
    /// solc executable
    pub solc: PathBuf,

    /// vyper executable
    pub vyper: PathBuf,

    /// Solidity import remappings, `prefix=target`
    pub remappings: Vec<String>,
}

/// Network configuration for the playground
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name shown in the UI
    pub name: String,
    /// RPC endpoint; `None` spawns a local anvil node
    pub rpc_url: Option<String>,
    /// Chain ID of the spawned node
    pub chain_id: u64,
}

impl NetworkConfig {
    /// Local anvil node spawned for the session
    pub fn local() -> Self {
        Self {
            name: "local".to_string(),
            rpc_url: None,
            chain_id: 31337,
        }
    }

    /// Existing node reachable over HTTP
    pub fn custom(name: impl Into<String>, rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            rpc_url: Some(rpc_url.into()),
            chain_id,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            solc: PathBuf::from("solc"),
            vyper: PathBuf::from("vyper"),
            remappings: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contracts_dir: PathBuf::from("contracts"),
            compilers: CompilerConfig::default(),
            network: NetworkConfig::default(),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Loads `sneko.toml` from `dir` when present, then applies environment overrides
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Applies `SNEKO_*` overrides from the given lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SNEKO_RPC_URL").filter(|v| !v.is_empty()) {
            self.network.rpc_url = Some(url);
        }
        if let Some(solc) = lookup("SNEKO_SOLC").filter(|v| !v.is_empty()) {
            self.compilers.solc = PathBuf::from(solc);
        }
        if let Some(vyper) = lookup("SNEKO_VYPER").filter(|v| !v.is_empty()) {
            self.compilers.vyper = PathBuf::from(vyper);
        }
        if let Some(log_file) = lookup("SNEKO_LOG_FILE").filter(|v| !v.is_empty()) {
            self.log_file = Some(PathBuf::from(log_file));
        }
    }

    /// Remappings handed to solc; falls back to the bundled OpenZeppelin copy
    pub fn solidity_remappings(&self) -> Vec<String> {
        if !self.compilers.remappings.is_empty() {
            return self.compilers.remappings.clone();
        }
        let openzeppelin = self
            .contracts_dir
            .join("solidity")
            .join("OpenZeppelin")
            .join("v5.0.2");
        vec![format!("@openzeppelin/contracts={}", openzeppelin.display())]
    }

    /// Validates the entire configuration
    pub fn validate(&self) -> Result<()> {
        if self.project_name.is_empty() || self.project_name.contains(['/', '\\']) {
            return Err(eyre::eyre!(
                "Invalid project_name '{}': expected a plain directory name",
                self.project_name
            ));
        }

        for remapping in &self.compilers.remappings {
            if !remapping.contains('=') {
                return Err(eyre::eyre!(
                    "Invalid remapping '{}': expected prefix=target",
                    remapping
                ));
            }
        }

        Ok(())
    }

    /// Create a new builder for Config
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for creating Config with a fluent API
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn contracts_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.contracts_dir = path.into();
        self
    }

    pub fn solc(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.compilers.solc = path.into();
        self
    }

    pub fn vyper(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.compilers.vyper = path.into();
        self
    }

    /// Add a single `prefix=target` remapping
    pub fn remapping(mut self, remapping: impl Into<String>) -> Self {
        self.config.compilers.remappings.push(remapping.into());
        self
    }

    pub fn network(mut self, network: NetworkConfig) -> Self {
        self.config.network = network;
        self
    }

    pub fn script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.script_path = path.into();
        self
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.config.project_name = name.into();
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.script_path, PathBuf::from("output.py"));
        assert_eq!(config.project_name, "sneko-ape-project");
        assert_eq!(config.network.rpc_url, None);
        assert_eq!(config.compilers.vyper, PathBuf::from("vyper"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_basic() {
        let config = Config::builder()
            .contracts_dir("/contracts")
            .solc("/opt/solc-0.8.26")
            .remapping("@oz=/lib/oz")
            .network(NetworkConfig::custom("dev", "http://127.0.0.1:8545", 1337))
            .build()
            .unwrap();

        assert_eq!(config.contracts_dir, PathBuf::from("/contracts"));
        assert_eq!(config.compilers.solc, PathBuf::from("/opt/solc-0.8.26"));
        assert_eq!(config.solidity_remappings(), vec!["@oz=/lib/oz"]);
        assert_eq!(config.network.chain_id, 1337);
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(Config::builder().remapping("no-equals").build().is_err());
        assert!(Config::builder().project_name("a/b").build().is_err());
        assert!(Config::builder().project_name("").build().is_err());
    }

    #[test]
    fn test_default_remapping_points_at_bundled_openzeppelin() {
        let config = Config::builder().contracts_dir("/c").build().unwrap();
        let remappings = config.solidity_remappings();
        assert_eq!(remappings.len(), 1);
        assert!(remappings[0].starts_with("@openzeppelin/contracts=/c"));
        assert!(remappings[0].ends_with("v5.0.2"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SNEKO_RPC_URL", "http://node:8545"),
            ("SNEKO_VYPER", "/usr/local/bin/vyper"),
            ("SNEKO_SOLC", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.network.rpc_url.as_deref(), Some("http://node:8545"));
        assert_eq!(config.compilers.vyper, PathBuf::from("/usr/local/bin/vyper"));
        assert_eq!(config.compilers.solc, PathBuf::from("solc"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
contracts_dir = "my-contracts"
script_path = "deploy_me.py"

[compilers]
solc = "solc-0.8.26"

[network]
name = "devnet"
rpc_url = "http://localhost:9545"
chain_id = 5
"#,
        )
        .unwrap();

        let config = Config::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config.contracts_dir, PathBuf::from("my-contracts"));
        assert_eq!(config.script_path, PathBuf::from("deploy_me.py"));
        assert_eq!(config.compilers.solc, PathBuf::from("solc-0.8.26"));
        assert_eq!(config.compilers.vyper, PathBuf::from("vyper"));
        assert_eq!(config.network.name, "devnet");
        assert_eq!(config.network.chain_id, 5);
        assert_eq!(config.project_name, "sneko-ape-project");
    }

    #[test]
    fn test_from_file_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_file(&dir.path().join(CONFIG_FILE_NAME));
        assert!(config.is_err());
    }
}
