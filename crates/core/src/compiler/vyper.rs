//! Vyper compilation through the `vyper` executable

use super::{query_version, spawn_error, stderr_text, Compiler, CompilerOutput, SourceInput};
use crate::{error::CompileError, language::Language};
use std::{
    path::{Path, PathBuf},
    process::Command,
    sync::OnceLock,
};

/// `vyper <file> -f abi,bytecode`
///
/// Vyper files are compiled from disk, so edits must be saved first.
pub struct Vyper {
    binary: PathBuf,
    version: OnceLock<Option<String>>,
}

impl Vyper {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            version: OnceLock::new(),
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(path).args(["-f", "abi,bytecode"]);
        cmd
    }
}

impl Compiler for Vyper {
    fn language(&self) -> Language {
        Language::Vyper
    }

    fn version(&self) -> Option<String> {
        self.version
            .get_or_init(|| query_version(&self.binary))
            .clone()
    }

    fn compile(&self, input: &SourceInput<'_>) -> Result<CompilerOutput, CompileError> {
        let mut cmd = self.command(input.path);
        tracing::debug!("Running {:?}", cmd);

        let output = cmd
            .output()
            .map_err(|e| spawn_error(&self.binary, Language::Vyper, e))?;

        // vyper reports warnings and errors alike on stderr
        let stderr = stderr_text(&output);
        if !stderr.is_empty() {
            return Err(CompileError::Diagnostics(stderr));
        }
        if !output.status.success() {
            return Err(CompileError::Diagnostics(format!(
                "vyper exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (abi_json, bytecode) = parse_records(&stdout)?;

        let contract_name = input
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Contract".to_string());

        Ok(CompilerOutput {
            contract_name,
            abi_json,
            bytecode,
            runtime_bytecode: None,
        })
    }
}

/// Splits stdout into the ABI line and the bytecode line
pub fn parse_records(stdout: &str) -> Result<(String, String), CompileError> {
    let records: Vec<&str> = stdout.trim_end().split('\n').map(str::trim).collect();
    match records.as_slice() {
        [abi, bytecode] if !abi.is_empty() && !bytecode.is_empty() => {
            Ok((abi.to_string(), bytecode.to_string()))
        }
        _ => Err(CompileError::MalformedOutput(format!(
            "expected 2 records from vyper (abi, bytecode), got {}",
            records.iter().filter(|r| !r.is_empty()).count()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_two_records() {
        let (abi, bytecode) = parse_records("[{\"type\":\"fallback\"}]\n0x6100\n").unwrap();
        assert_eq!(abi, "[{\"type\":\"fallback\"}]");
        assert_eq!(bytecode, "0x6100");
    }

    #[test]
    fn test_rejects_wrong_record_count() {
        for stdout in ["", "[]\n", "[]\n0x60\n0x61\n", "[]\n\n"] {
            assert!(
                matches!(parse_records(stdout), Err(CompileError::MalformedOutput(_))),
                "{stdout:?}"
            );
        }
    }

    #[test]
    fn test_command_line() {
        let cmd = Vyper::new("vyper").command(Path::new("/c/token.vy"));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["/c/token.vy", "-f", "abi,bytecode"]);
    }

    #[test]
    fn test_missing_binary_reports_install_hint() {
        let vyper = Vyper::new("sneko-test-missing-vyper");
        let input = SourceInput {
            path: Path::new("token.vy"),
            text: "",
        };
        let err = vyper.compile(&input).unwrap_err();
        assert!(matches!(err, CompileError::ToolNotFound { .. }));
        assert!(err
            .to_string()
            .contains("A local installation of Vyper is required to compile Vyper contracts."));
        assert_eq!(vyper.version(), None);
    }

    #[test]
    fn test_compile_real_contract() {
        let vyper = Vyper::new("vyper");
        if vyper.version().is_none() {
            eprintln!("vyper not installed, skipping");
            return;
        }

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.vy");
        let text = "stored: public(uint256)\n\n@external\ndef set(x: uint256):\n    self.stored = x\n";
        std::fs::write(&path, text).unwrap();

        let output = vyper.compile(&SourceInput { path: &path, text }).unwrap();
        assert_eq!(output.contract_name, "store");
        assert!(output.abi_json.starts_with('['));
        assert!(output.bytecode.starts_with("0x"));
    }
}
