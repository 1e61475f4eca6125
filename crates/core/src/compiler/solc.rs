//! Solidity compilation through the `solc` executable

use super::{query_version, spawn_error, stderr_text, Compiler, CompilerOutput, SourceInput};
use crate::{error::CompileError, language::Language};
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

/// Key prefix solc gives to contracts read from stdin
const STDIN_PREFIX: &str = "<stdin>:";

/// `solc` invoked with the source on stdin and `--combined-json` output
pub struct Solc {
    binary: PathBuf,
    remappings: Vec<String>,
    version: OnceLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct CombinedJson {
    #[serde(default)]
    contracts: BTreeMap<String, CombinedContract>,
}

#[derive(Debug, Deserialize)]
struct CombinedContract {
    /// Array in recent releases, JSON encoded string in older ones
    abi: Value,
    #[serde(default)]
    bin: String,
    #[serde(rename = "bin-runtime", default)]
    bin_runtime: String,
}

impl Solc {
    pub fn new(binary: impl Into<PathBuf>, remappings: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            remappings,
            version: OnceLock::new(),
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--combined-json", "abi,bin,bin-runtime"]);
        cmd.args(&self.remappings);

        let mut allowed: Vec<String> = self
            .remappings
            .iter()
            .filter_map(|r| r.split_once('=').map(|(_, target)| target.to_string()))
            .collect();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.arg("--base-path").arg(dir);
            allowed.push(dir.display().to_string());
        }
        if !allowed.is_empty() {
            cmd.arg("--allow-paths").arg(allowed.join(","));
        }

        cmd.arg("-");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Compiler for Solc {
    fn language(&self) -> Language {
        Language::Solidity
    }

    fn version(&self) -> Option<String> {
        self.version
            .get_or_init(|| query_version(&self.binary))
            .clone()
    }

    fn compile(&self, input: &SourceInput<'_>) -> Result<CompilerOutput, CompileError> {
        let mut cmd = self.command(input.path);
        tracing::debug!("Running {:?}", cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| spawn_error(&self.binary, Language::Solidity, e))?;

        // stdin must be closed before solc starts compiling
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.text.as_bytes())
                .map_err(|source| CompileError::Spawn {
                    tool: self.binary.display().to_string(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|source| CompileError::Spawn {
                tool: self.binary.display().to_string(),
                source,
            })?;

        let stem = input
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        read_output(&output, &stem)
    }
}

/// Turns a finished solc process into the primary contract
///
/// Diagnostics on a failed run become the error; on success they are
/// warnings and only logged.
fn read_output(output: &Output, file_stem: &str) -> Result<CompilerOutput, CompileError> {
    let stderr = stderr_text(output);
    if !output.status.success() {
        return Err(CompileError::Diagnostics(if stderr.is_empty() {
            format!("solc exited with {}", output.status)
        } else {
            stderr
        }));
    }
    if !stderr.is_empty() {
        tracing::warn!("solc reported warnings:\n{}", stderr);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_combined_json(&stdout, file_stem)
}

/// Picks the primary contract out of solc's combined JSON
///
/// Only contracts declared in the compiled source itself are candidates;
/// imported files are ignored unless the source declares nothing. A single
/// candidate always wins. Otherwise contracts without creation code are
/// dropped, then the one named after the file is preferred.
pub fn parse_combined_json(stdout: &str, file_stem: &str) -> Result<CompilerOutput, CompileError> {
    let combined: CombinedJson = serde_json::from_str(stdout.trim())
        .map_err(|e| CompileError::MalformedOutput(e.to_string()))?;

    let (local, imported): (Vec<_>, Vec<_>) = combined
        .contracts
        .into_iter()
        .partition(|(key, _)| key.starts_with(STDIN_PREFIX));
    let declared = if local.is_empty() { imported } else { local };
    let mut candidates: Vec<(String, CombinedContract)> = declared
        .into_iter()
        .map(|(key, contract)| (contract_name(&key).to_string(), contract))
        .collect();

    if candidates.len() > 1 {
        candidates.retain(|(_, c)| !c.bin.trim().is_empty());
    }
    if candidates.len() > 1 {
        if let Some(idx) = candidates.iter().position(|(name, _)| name == file_stem) {
            candidates = vec![candidates.swap_remove(idx)];
        }
    }

    let (contract_name, contract) = match candidates.len() {
        0 => return Err(CompileError::NoContract),
        1 => candidates.remove(0),
        _ => {
            return Err(CompileError::AmbiguousContract(
                candidates.into_iter().map(|(name, _)| name).collect(),
            ))
        }
    };

    let abi_json = match contract.abi {
        Value::String(s) => s,
        other => other.to_string(),
    };

    Ok(CompilerOutput {
        contract_name,
        abi_json,
        bytecode: contract.bin,
        runtime_bytecode: Some(contract.bin_runtime),
    })
}

/// `<stdin>:Greeter` and `contracts/Greeter.sol:Greeter` both name `Greeter`
fn contract_name(key: &str) -> &str {
    key.rsplit_once(':').map(|(_, name)| name).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract(bin: &str) -> Value {
        json!({"abi": [], "bin": bin, "bin-runtime": bin})
    }

    #[test]
    fn test_single_contract_wins() {
        let out = json!({"contracts": {"<stdin>:Greeter": contract("6080")}, "version": "0.8.26"});
        let parsed = parse_combined_json(&out.to_string(), "Anything").unwrap();
        assert_eq!(parsed.contract_name, "Greeter");
        assert_eq!(parsed.bytecode, "6080");
        assert_eq!(parsed.abi_json, "[]");
    }

    #[test]
    fn test_interfaces_and_libraries_without_code_are_skipped() {
        let out = json!({"contracts": {
            "<stdin>:IERC20": contract(""),
            "<stdin>:Token": contract("6080"),
        }});
        let parsed = parse_combined_json(&out.to_string(), "Main").unwrap();
        assert_eq!(parsed.contract_name, "Token");
    }

    #[test]
    fn test_imported_contracts_are_not_candidates() {
        let out = json!({"contracts": {
            "<stdin>:MyNft": contract("6080"),
            "@openzeppelin/contracts/utils/Strings.sol:Strings": contract("6055"),
            "@openzeppelin/contracts/utils/math/Math.sol:Math": contract("6056"),
        }});
        let parsed = parse_combined_json(&out.to_string(), "Token").unwrap();
        assert_eq!(parsed.contract_name, "MyNft");
        assert_eq!(parsed.bytecode, "6080");
    }

    #[test]
    fn test_imports_used_when_source_declares_nothing() {
        let out = json!({"contracts": {"lib/Math.sol:Math": contract("6056")}});
        let parsed = parse_combined_json(&out.to_string(), "Token").unwrap();
        assert_eq!(parsed.contract_name, "Math");
    }

    #[cfg(unix)]
    fn finished(code: i32, stdout: &str, stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_warnings_on_success_are_logged() {
        use std::sync::{Arc, Mutex};

        let logs = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || LogSink(sink.clone()))
            .finish();

        let stdout = json!({"contracts": {"<stdin>:Greeter": contract("6080")}}).to_string();
        let output = finished(
            0,
            &stdout,
            "Warning: SPDX license identifier not provided in source file.",
        );
        let parsed = tracing::subscriber::with_default(subscriber, || {
            read_output(&output, "Greeter").unwrap()
        });

        assert_eq!(parsed.contract_name, "Greeter");
        let logs = String::from_utf8(logs.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("SPDX license identifier not provided"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_run_returns_stderr_verbatim() {
        let stderr = "ParserError: Expected ';' but got '}'\n --> <stdin>:4:1:";
        match read_output(&finished(1, "", stderr), "Broken") {
            Err(CompileError::Diagnostics(text)) => assert_eq!(text, stderr),
            other => panic!("expected diagnostics, got {other:?}"),
        }
        match read_output(&finished(1, "", ""), "Broken") {
            Err(CompileError::Diagnostics(text)) => assert!(text.starts_with("solc exited with")),
            other => panic!("expected diagnostics, got {other:?}"),
        }
    }

    struct LogSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_file_stem_breaks_ties() {
        let out = json!({"contracts": {
            "<stdin>:Helper": contract("60"),
            "<stdin>:Vault": contract("6080"),
        }});
        let parsed = parse_combined_json(&out.to_string(), "Vault").unwrap();
        assert_eq!(parsed.contract_name, "Vault");

        let err = parse_combined_json(&out.to_string(), "Other").unwrap_err();
        match err {
            CompileError::AmbiguousContract(names) => assert_eq!(names, vec!["Helper", "Vault"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_string_encoded_abi() {
        let out = json!({"contracts": {"<stdin>:Old": {
            "abi": "[{\"type\":\"fallback\"}]",
            "bin": "60",
        }}});
        let parsed = parse_combined_json(&out.to_string(), "Old").unwrap();
        assert_eq!(parsed.abi_json, "[{\"type\":\"fallback\"}]");
        assert_eq!(parsed.runtime_bytecode.as_deref(), Some(""));
    }

    #[test]
    fn test_empty_and_malformed_output() {
        assert!(matches!(
            parse_combined_json(r#"{"contracts":{}}"#, "X"),
            Err(CompileError::NoContract)
        ));
        assert!(matches!(
            parse_combined_json("not json", "X"),
            Err(CompileError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_command_line() {
        let solc = Solc::new("solc", vec!["@oz/=/lib/oz/".to_string()]);
        let cmd = solc.command(Path::new("/work/Token.sol"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--combined-json",
                "abi,bin,bin-runtime",
                "@oz/=/lib/oz/",
                "--base-path",
                "/work",
                "--allow-paths",
                "/lib/oz/,/work",
                "-",
            ]
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let solc = Solc::new("solc", Vec::new());
        if solc.version().is_none() {
            eprintln!("solc not installed, skipping");
            return;
        }

        let source = "// SPDX-License-Identifier: MIT\npragma solidity >=0.8.0;\ncontract Greeter {\n    string public greeting = \"hi\";\n}\n";
        let input = SourceInput {
            path: Path::new("Greeter.sol"),
            text: source,
        };
        let first = solc.compile(&input).unwrap();
        let second = solc.compile(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.contract_name, "Greeter");
    }

    #[test]
    fn test_syntax_errors_become_diagnostics() {
        let solc = Solc::new("solc", Vec::new());
        if solc.version().is_none() {
            eprintln!("solc not installed, skipping");
            return;
        }

        let input = SourceInput {
            path: Path::new("Broken.sol"),
            text: "pragma solidity >=0.8.0;\ncontract Broken {\n    uint x\n}\n",
        };
        match solc.compile(&input) {
            Err(CompileError::Diagnostics(text)) => assert!(text.contains("Error")),
            other => panic!("expected diagnostics, got {other:?}"),
        }
    }
}
