//! Contract compilation and playground library behind the `sneko` terminal UI
pub mod args;
pub mod artifacts;
pub mod compiler;
pub mod config;
pub mod controls;
pub mod deploy;
pub mod error;
pub mod files;
pub mod language;
pub mod network;
pub mod scaffold;
pub mod session;

pub use artifacts::{CompiledArtifact, InterfaceDescription};
pub use compiler::{compile, Compiler, Toolchain};
pub use config::{Config, ConfigBuilder, NetworkConfig};
pub use controls::{ControlGroup, Invocation};
pub use deploy::DeployedContract;
pub use files::{ActiveFile, DirectoryTree, SourceBuffer};
pub use language::Language;
pub use network::{Account, Network, RpcNetwork};
pub use session::{Notification, Session, Severity};
