//! Standalone deployment script generation

use super::CompiledArtifact;
use crate::error::ScriptError;
use std::path::Path;

/// Fixed web3.py template appended after the embedded ABI and bytecode
pub const SCRIPT_TEMPLATE: &str = include_str!("../../snippets/script.py");

/// Default output path, relative to the working directory
pub const DEFAULT_SCRIPT_PATH: &str = "output.py";

/// Renders the script text for an artifact
pub fn render_script(artifact: &CompiledArtifact) -> String {
    format!(
        "ABI={}\nBYTECODE=\"{}\"\n\n{}",
        artifact.abi_json, artifact.bytecode, SCRIPT_TEMPLATE
    )
}

/// Writes the deployment script to `dest`, replacing any previous one
pub fn generate_script(artifact: &CompiledArtifact, dest: &Path) -> Result<(), ScriptError> {
    std::fs::write(dest, render_script(artifact)).map_err(|source| ScriptError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "Deployment script for {} written to {}",
        artifact.contract_name,
        dest.display()
    );
    Ok(())
}
