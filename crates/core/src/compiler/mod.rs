//! Compiler dispatch
//!
//! Both supported languages are compiled by external tools. Each tool is
//! wrapped in a [`Compiler`] and the dispatcher normalizes whatever it
//! returns into a [`CompiledArtifact`].

use crate::{
    artifacts::{strip_hex_prefix, with_hex_prefix, CompiledArtifact, InterfaceDescription},
    config::Config,
    error::CompileError,
    language::Language,
};
use std::{path::Path, process::Output, time::Instant};

mod solc;
mod vyper;

pub use solc::Solc;
pub use vyper::Vyper;

/// Source handed to a compiler
#[derive(Debug, Clone, Copy)]
pub struct SourceInput<'a> {
    /// Path of the file on disk
    pub path: &'a Path,
    /// Current buffer contents, possibly edited
    pub text: &'a str,
}

/// Raw output of a single compiler run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOutput {
    pub contract_name: String,
    pub abi_json: String,
    pub bytecode: String,
    pub runtime_bytecode: Option<String>,
}

/// An external compiler for one language
pub trait Compiler {
    fn language(&self) -> Language;

    /// Version string reported by the tool, if it can be queried
    fn version(&self) -> Option<String>;

    fn compile(&self, input: &SourceInput<'_>) -> Result<CompilerOutput, CompileError>;
}

/// One compiler per supported language
pub struct Toolchain {
    solidity: Box<dyn Compiler>,
    vyper: Box<dyn Compiler>,
}

impl Toolchain {
    pub fn new(solidity: Box<dyn Compiler>, vyper: Box<dyn Compiler>) -> Self {
        Self { solidity, vyper }
    }

    /// Real `solc` and `vyper` executables from the configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(Solc::new(
                config.compilers.solc.clone(),
                config.solidity_remappings(),
            )),
            Box::new(Vyper::new(config.compilers.vyper.clone())),
        )
    }

    pub fn compiler_for(&self, language: Language) -> &dyn Compiler {
        match language {
            Language::Solidity => self.solidity.as_ref(),
            Language::Vyper => self.vyper.as_ref(),
        }
    }

    /// Label shown next to the compile button, e.g. `solidity 0.8.26`
    pub fn label(&self, language: Language) -> String {
        match self.compiler_for(language).version() {
            Some(version) => format!("{language} {version}"),
            None => format!("{language} (compiler not found)"),
        }
    }
}

/// Compiles a source file and normalizes the result
///
/// The language is resolved from the extension before any tool runs.
pub fn compile(
    path: &Path,
    text: &str,
    toolchain: &Toolchain,
) -> Result<CompiledArtifact, CompileError> {
    let language = Language::from_path(path)?;
    let compiler = toolchain.compiler_for(language);

    tracing::info!("Compiling {} as {}", path.display(), language);
    let start = Instant::now();

    let output = compiler.compile(&SourceInput { path, text })?;
    let artifact = normalize(language, output)?;

    tracing::info!(
        "Compiled {} in {:.2}s ({} bytes of bytecode, {} ABI entries)",
        artifact.contract_name,
        start.elapsed().as_secs_f64(),
        artifact.bytecode_len(),
        artifact.interface.entries().len()
    );

    Ok(artifact)
}

/// Turns raw compiler output into the common artifact shape
pub fn normalize(language: Language, output: CompilerOutput) -> Result<CompiledArtifact, CompileError> {
    let interface = InterfaceDescription::from_json(&output.abi_json)?;

    let bytecode = with_hex_prefix(&output.bytecode);
    if let Err(e) = hex::decode(strip_hex_prefix(&bytecode)) {
        return Err(CompileError::MalformedOutput(format!(
            "bytecode is not valid hex ({e}); unlinked library references are not supported"
        )));
    }

    let runtime_bytecode = output
        .runtime_bytecode
        .filter(|b| !b.trim().is_empty())
        .map(|b| with_hex_prefix(&b));

    Ok(CompiledArtifact {
        contract_name: output.contract_name,
        language,
        abi_json: interface.to_json(),
        constructor_signature: interface.constructor_signature(),
        interface,
        bytecode,
        runtime_bytecode,
    })
}

/// Maps a spawn failure, singling out a missing executable
fn spawn_error(tool: &Path, language: Language, source: std::io::Error) -> CompileError {
    let tool = tool.display().to_string();
    if source.kind() == std::io::ErrorKind::NotFound {
        let hint = match language {
            Language::Solidity => {
                "A local installation of solc is required to compile Solidity contracts."
            }
            Language::Vyper => {
                "A local installation of Vyper is required to compile Vyper contracts."
            }
        };
        CompileError::ToolNotFound {
            tool,
            hint: hint.to_string(),
        }
    } else {
        CompileError::Spawn { tool, source }
    }
}

/// Runs `<tool> --version` and returns its first non-empty line
fn query_version(tool: &Path) -> Option<String> {
    let output = std::process::Command::new(tool)
        .arg("--version")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_version(&stdout)
}

/// Extracts `0.8.26` from either `Version: 0.8.26+commit...` or `0.4.0+commit...`
fn parse_version(text: &str) -> Option<String> {
    let line = text
        .lines()
        .find_map(|l| l.trim().strip_prefix("Version:"))
        .or_else(|| text.lines().map(str::trim).find(|l| !l.is_empty()))?;
    let version = line.trim().split(['+', ' ']).next()?;
    (!version.is_empty()).then(|| version.to_string())
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Compiler double that records how often it ran
    pub(crate) struct ScriptedCompiler {
        pub language: Language,
        pub result: Result<CompilerOutput, String>,
        pub calls: Rc<Cell<usize>>,
    }

    impl Compiler for ScriptedCompiler {
        fn language(&self) -> Language {
            self.language
        }

        fn version(&self) -> Option<String> {
            Some("0.0.0-test".to_string())
        }

        fn compile(&self, _input: &SourceInput<'_>) -> Result<CompilerOutput, CompileError> {
            self.calls.set(self.calls.get() + 1);
            self.result.clone().map_err(CompileError::Diagnostics)
        }
    }

    pub(crate) fn counter_output() -> CompilerOutput {
        CompilerOutput {
            contract_name: "Counter".to_string(),
            abi_json: r#"[
                {"type":"constructor","stateMutability":"nonpayable","inputs":[{"name":"start","type":"uint256"}]},
                {"type":"function","name":"count","stateMutability":"view","inputs":[],"outputs":[{"name":"","type":"uint256"}]},
                {"type":"function","name":"add","stateMutability":"nonpayable","inputs":[{"name":"by","type":"uint256"}],"outputs":[]},
                {"type":"function","name":"fund","stateMutability":"payable","inputs":[],"outputs":[]}
            ]"#
            .to_string(),
            bytecode: "6080604052".to_string(),
            runtime_bytecode: Some("60806040".to_string()),
        }
    }

    pub(crate) fn scripted_toolchain(
        result: Result<CompilerOutput, String>,
    ) -> (Toolchain, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let toolchain = Toolchain::new(
            Box::new(ScriptedCompiler {
                language: Language::Solidity,
                result: result.clone(),
                calls: calls.clone(),
            }),
            Box::new(ScriptedCompiler {
                language: Language::Vyper,
                result,
                calls: calls.clone(),
            }),
        );
        (toolchain, calls)
    }

    #[test]
    fn test_unsupported_extension_fails_before_invocation() {
        let (toolchain, calls) = scripted_toolchain(Ok(counter_output()));
        for name in ["notes.txt", "Counter.rs", "Makefile", "Counter.sol.bak"] {
            let err = compile(Path::new(name), "contract C {}", &toolchain).unwrap_err();
            assert!(matches!(err, CompileError::Source(_)), "{name}: {err}");
        }
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_compile_normalizes_output() {
        let (toolchain, calls) = scripted_toolchain(Ok(counter_output()));
        let artifact = compile(Path::new("Counter.sol"), "", &toolchain).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(artifact.language, Language::Solidity);
        assert_eq!(artifact.contract_name, "Counter");
        assert_eq!(artifact.bytecode, "0x6080604052");
        assert_eq!(artifact.runtime_bytecode.as_deref(), Some("0x60806040"));
        assert_eq!(artifact.constructor_signature, "uint256 start");
        assert!(!artifact.abi_json.contains('\n'));
        assert_eq!(artifact.interface.functions().count(), 3);
    }

    #[test]
    fn test_compile_routes_by_extension() {
        let (toolchain, _) = scripted_toolchain(Ok(counter_output()));
        let artifact = compile(Path::new("counter.vy"), "", &toolchain).unwrap();
        assert_eq!(artifact.language, Language::Vyper);
    }

    #[test]
    fn test_diagnostics_surface_verbatim() {
        let text = "Error: Expected ';' but got '}'";
        let (toolchain, _) = scripted_toolchain(Err(text.to_string()));
        let err = compile(Path::new("Broken.sol"), "", &toolchain).unwrap_err();
        assert_eq!(err.to_string(), text);
    }

    #[test]
    fn test_normalize_rejects_unlinked_bytecode() {
        let mut output = counter_output();
        output.bytecode = "6080__$3f1b2d$__6040".to_string();
        let err = normalize(Language::Solidity, output).unwrap_err();
        assert!(matches!(err, CompileError::MalformedOutput(_)));
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(
            parse_version("solc, the solidity compiler commandline interface\nVersion: 0.8.26+commit.8a97fa7a.Linux.g++\n"),
            Some("0.8.26".to_string())
        );
        assert_eq!(parse_version("0.4.0+commit.e9db8d9f\n"), Some("0.4.0".to_string()));
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_missing_tool_hint() {
        let err = spawn_error(
            Path::new("vyper"),
            Language::Vyper,
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err
            .to_string()
            .contains("A local installation of Vyper is required"));

        let err = spawn_error(
            Path::new("solc"),
            Language::Solidity,
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, CompileError::Spawn { .. }));
    }
}
