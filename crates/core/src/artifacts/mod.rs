//! Compiled artifacts and the files generated from them

use crate::language::Language;

pub mod abi;
pub mod interface;
pub mod script;

pub use abi::{
    Abi, AbiEntry, AbiParam, EntryKind, InterfaceDescription, Mutability, MutabilityClass,
};

/// Normalized result of a successful compile
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArtifact {
    /// Name of the primary contract
    pub contract_name: String,
    pub language: Language,
    pub interface: InterfaceDescription,
    /// Compact ABI JSON as produced by the compiler
    pub abi_json: String,
    /// Creation bytecode, `0x` prefixed hex
    pub bytecode: String,
    /// Runtime bytecode when the compiler reports it
    pub runtime_bytecode: Option<String>,
    /// Constructor parameters, e.g. `uint256 x, address y`
    pub constructor_signature: String,
}

impl CompiledArtifact {
    /// Creation bytecode as raw bytes
    pub fn bytecode_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(strip_hex_prefix(&self.bytecode))
    }

    /// Bytecode size in bytes, as shown next to the bytecode view
    pub fn bytecode_len(&self) -> usize {
        strip_hex_prefix(&self.bytecode).len() / 2
    }

    /// Solidity interface rendering of the ABI
    pub fn render_interface(&self) -> String {
        interface::render(&self.contract_name, &self.interface)
    }
}

/// Removes a leading `0x`/`0X`, if any
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Ensures a hex string carries the `0x` prefix
pub fn with_hex_prefix(value: &str) -> String {
    format!("0x{}", strip_hex_prefix(value.trim()))
}
