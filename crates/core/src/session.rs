//! Session state shared by every view of the UI
//!
//! A [`Session`] owns the active file, the compiled artifact, the deployed
//! contract with its generated controls and the test accounts. Each user
//! action is a named transition that resets dependent state first, then
//! reports its outcome as a [`Notification`]. No transition fails: errors
//! end up in the notification log.

use crate::{
    artifacts::{script, CompiledArtifact},
    compiler::{self, Toolchain},
    controls::{self, ControlGroup, Invocation},
    deploy::{self, DeployedContract},
    error::{CallError, DeployError, ScaffoldError, ScriptError},
    files::ActiveFile,
    network::{Account, Network},
    scaffold,
};
use chrono::{DateTime, Local};
use ethers::types::{Address, U256};
use std::{
    collections::VecDeque,
    fmt,
    path::{Path, PathBuf},
};

/// Notifications kept before the oldest are dropped
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub at: DateTime<Local>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    active_file: Option<ActiveFile>,
    compiler_label: Option<String>,
    artifact: Option<CompiledArtifact>,
    /// Full text of the last failed compile
    diagnostics: Option<String>,
    deployed: Option<DeployedContract>,
    controls: Vec<ControlGroup>,
    /// Last rendered result per control, aligned with `controls`
    results: Vec<Option<String>>,
    contract_balance: Option<U256>,
    accounts: Vec<Account>,
    active_account: usize,
    /// Text of the constructor argument field
    pub constructor_args: String,
    notifications: VecDeque<Notification>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::warn!("{}", message),
            _ => tracing::info!("{}", message),
        }
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            severity,
            message,
            at: Local::now(),
        });
    }

    /// Makes `path` the active file, discarding everything derived from the previous one
    pub fn select_file(&mut self, path: &Path, toolchain: &Toolchain) -> bool {
        self.active_file = None;
        self.compiler_label = None;
        self.artifact = None;
        self.diagnostics = None;
        self.clear_playground();
        self.constructor_args.clear();

        match ActiveFile::load(path) {
            Ok(file) => {
                self.compiler_label = file.language.map(|l| toolchain.label(l));
                self.active_file = Some(file);
                true
            }
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                false
            }
        }
    }

    /// Compiles the active buffer
    ///
    /// The previous artifact and deployment are dropped before the compiler
    /// runs, so a failed compile leaves nothing stale behind.
    pub fn compile(&mut self, toolchain: &Toolchain) -> bool {
        self.artifact = None;
        self.diagnostics = None;
        self.clear_playground();

        let Some(file) = &self.active_file else {
            self.notify(Severity::Error, "Select a contract file first");
            return false;
        };

        match compiler::compile(&file.path, &file.buffer.text(), toolchain) {
            Ok(artifact) => {
                let message = format!(
                    "Compiled {} ({} bytes)",
                    artifact.contract_name,
                    artifact.bytecode_len()
                );
                self.artifact = Some(artifact);
                self.notify(Severity::Info, message);
                true
            }
            Err(e) => {
                let text = e.to_string();
                self.diagnostics = Some(text.clone());
                self.notify(Severity::Error, text);
                false
            }
        }
    }

    /// Deploys the current artifact from the active account
    pub async fn deploy(&mut self, network: &dyn Network) -> bool {
        self.clear_playground();

        let result = match (&self.artifact, self.active_account()) {
            (None, _) => Err(DeployError::NotCompiled),
            (Some(_), None) => Err(DeployError::NoAccount),
            (Some(artifact), Some(account)) => {
                deploy::deploy(network, account.address, artifact, &self.constructor_args).await
            }
        };

        match result {
            Ok(contract) => {
                let message = format!(
                    "{} deployed at {:?}",
                    contract.contract_name, contract.address
                );
                self.controls = controls::generate_controls(&contract.interface);
                self.results = vec![None; self.controls.len()];
                self.deployed = Some(contract);
                self.constructor_args.clear();
                self.notify(Severity::Info, message);
                self.refresh_accounts(network).await;
                true
            }
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                false
            }
        }
    }

    /// Invokes control `index`; controls keep their input on failure
    pub async fn invoke(&mut self, network: &dyn Network, index: usize) -> Option<Invocation> {
        let result = match (&self.deployed, self.controls.get(index), self.active_account()) {
            (None, _, _) => Err(CallError::NotDeployed),
            (Some(_), None, _) => Err(CallError::UnknownControl(index)),
            (Some(_), Some(_), None) => Err(CallError::NoAccount),
            (Some(contract), Some(control), Some(account)) => {
                controls::invoke(network, account.address, contract, control).await
            }
        };

        match result {
            Ok(invocation) => {
                let label = self.controls[index].label();
                self.notify(Severity::Info, format!("{label}: {invocation}"));
                match &invocation {
                    Invocation::Read(value) => self.results[index] = Some(value.clone()),
                    Invocation::Transaction(_) => {
                        self.results[index] = Some(invocation.to_string());
                        self.refresh_accounts(network).await;
                    }
                }
                Some(invocation)
            }
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                None
            }
        }
    }

    /// Reloads account balances and, when deployed, the contract balance
    pub async fn refresh_accounts(&mut self, network: &dyn Network) -> bool {
        match network.accounts().await {
            Ok(accounts) => {
                self.accounts = accounts;
                if self.active_account >= self.accounts.len() {
                    self.active_account = 0;
                }
            }
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                return false;
            }
        }

        if let Some(address) = self.deployed_address() {
            match network.balance(address).await {
                Ok(balance) => self.contract_balance = Some(balance),
                Err(e) => {
                    self.notify(Severity::Warning, e.to_string());
                    return false;
                }
            }
        }
        true
    }

    pub fn select_account(&mut self, index: usize) -> bool {
        if index < self.accounts.len() {
            self.active_account = index;
            true
        } else {
            false
        }
    }

    /// Writes the standalone deployment script for the current artifact
    pub fn generate_script(&mut self, dest: &Path) -> bool {
        let result = match &self.artifact {
            Some(artifact) => script::generate_script(artifact, dest),
            None => Err(ScriptError::NotCompiled),
        };
        match result {
            Ok(()) => {
                self.notify(
                    Severity::Info,
                    format!("Deployment script written to {}", dest.display()),
                );
                true
            }
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                false
            }
        }
    }

    /// Scaffolds an Ape project around the compiled active file below `parent`
    pub fn scaffold(&mut self, parent: &Path, project_name: &str) -> Option<PathBuf> {
        let result = match (&self.active_file, &self.artifact) {
            (Some(file), Some(_)) => scaffold::build_ape_project(
                parent,
                project_name,
                &file.name,
                &file.buffer.text(),
            ),
            _ => Err(ScaffoldError::NothingToScaffold),
        };
        match result {
            Ok(root) => {
                self.notify(
                    Severity::Info,
                    format!("Ape project created in directory: {project_name}"),
                );
                Some(root)
            }
            Err(e) => {
                self.notify(Severity::Error, e.to_string());
                None
            }
        }
    }

    fn clear_playground(&mut self) {
        self.deployed = None;
        self.controls.clear();
        self.results.clear();
        self.contract_balance = None;
    }

    pub fn active_file(&self) -> Option<&ActiveFile> {
        self.active_file.as_ref()
    }

    pub fn active_file_mut(&mut self) -> Option<&mut ActiveFile> {
        self.active_file.as_mut()
    }

    pub fn compiler_label(&self) -> Option<&str> {
        self.compiler_label.as_deref()
    }

    pub fn artifact(&self) -> Option<&CompiledArtifact> {
        self.artifact.as_ref()
    }

    /// Compiler output of the last failed compile, verbatim
    pub fn diagnostics(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }

    pub fn deployed(&self) -> Option<&DeployedContract> {
        self.deployed.as_ref()
    }

    pub fn deployed_address(&self) -> Option<Address> {
        self.deployed.as_ref().map(|d| d.address)
    }

    pub fn contract_balance(&self) -> Option<U256> {
        self.contract_balance
    }

    pub fn controls(&self) -> &[ControlGroup] {
        &self.controls
    }

    pub fn control_mut(&mut self, index: usize) -> Option<&mut ControlGroup> {
        self.controls.get_mut(index)
    }

    pub fn result(&self, index: usize) -> Option<&str> {
        self.results.get(index).and_then(|r| r.as_deref())
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn active_account_index(&self) -> usize {
        self.active_account
    }

    pub fn active_account(&self) -> Option<&Account> {
        self.accounts.get(self.active_account)
    }

    pub fn notifications(&self) -> impl DoubleEndedIterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn can_compile(&self) -> bool {
        self.active_file
            .as_ref()
            .is_some_and(|f| f.language.is_some())
    }

    pub fn can_deploy(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn abi_view(&self) -> &str {
        self.artifact.as_ref().map_or("", |a| a.abi_json.as_str())
    }

    pub fn bytecode_view(&self) -> &str {
        self.artifact.as_ref().map_or("", |a| a.bytecode.as_str())
    }

    pub fn interface_view(&self) -> String {
        self.artifact
            .as_ref()
            .map(CompiledArtifact::render_interface)
            .unwrap_or_default()
    }

    /// Placeholder of the constructor argument field
    pub fn constructor_placeholder(&self) -> String {
        match &self.artifact {
            None => "(Compile contract first!)".to_string(),
            Some(a) if a.constructor_signature.is_empty() => "(no constructor args)".to_string(),
            Some(a) => a.constructor_signature.clone(),
        }
    }
}
