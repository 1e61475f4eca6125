//! Interface description (ABI) model
//!
//! Compilers hand back the ABI as JSON. This module keeps the declaration
//! order of that JSON, classifies each entry's mutability and derives the
//! strings the UI needs (constructor prompt, parameter placeholders).

use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha3::{Digest, Keccak256};
use std::fmt;

/// Raw ABI as JSON values, in declaration order
pub type Abi = Vec<Value>;

/// Kind of a top-level ABI declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Function,
    Constructor,
    Event,
    Error,
    Fallback,
    Receive,
}

impl EntryKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "function" => Some(EntryKind::Function),
            "constructor" => Some(EntryKind::Constructor),
            "event" => Some(EntryKind::Event),
            "error" => Some(EntryKind::Error),
            "fallback" => Some(EntryKind::Fallback),
            "receive" => Some(EntryKind::Receive),
            _ => None,
        }
    }
}

/// Declared state mutability of a function or constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl Mutability {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pure" => Some(Mutability::Pure),
            "view" => Some(Mutability::View),
            "nonpayable" => Some(Mutability::NonPayable),
            "payable" => Some(Mutability::Payable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mutability::Pure => "pure",
            Mutability::View => "view",
            Mutability::NonPayable => "nonpayable",
            Mutability::Payable => "payable",
        }
    }

    pub fn class(&self) -> MutabilityClass {
        match self {
            Mutability::Pure | Mutability::View => MutabilityClass::ReadOnly,
            Mutability::NonPayable => MutabilityClass::StateChanging,
            Mutability::Payable => MutabilityClass::Payable,
        }
    }
}

/// How an invocation reaches the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutabilityClass {
    /// Synchronous call, nothing is mined
    ReadOnly,
    /// Transaction sent from the active account
    StateChanging,
    /// Transaction that may carry value
    Payable,
}

impl MutabilityClass {
    pub fn is_transaction(&self) -> bool {
        !matches!(self, MutabilityClass::ReadOnly)
    }

    pub fn is_payable(&self) -> bool {
        matches!(self, MutabilityClass::Payable)
    }
}

/// A single input or output parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,

    /// ABI type string, e.g. `uint256`, `address[]`, `tuple`
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(
        rename = "internalType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            internal_type: None,
            components: Vec::new(),
        }
    }

    /// Canonical type used in signatures; tuples expand to their components
    pub fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let inner = self
                    .components
                    .iter()
                    .map(AbiParam::canonical_type)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("({inner}){suffix}")
            }
            None => self.kind.clone(),
        }
    }

    /// `type name` as shown in input placeholders
    pub fn declaration(&self) -> String {
        if self.name.is_empty() {
            self.kind.clone()
        } else {
            format!("{} {}", self.kind, self.name)
        }
    }

    /// Scalar integer types get numeric coercion; arrays of them do not
    pub fn is_integer(&self) -> bool {
        self.kind.contains("int") && !self.kind.ends_with(']')
    }

    pub fn is_signed_integer(&self) -> bool {
        self.is_integer() && self.kind.starts_with("int")
    }
}

/// One declaration of the interface description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiEntry {
    pub kind: EntryKind,
    pub name: String,
    pub inputs: Vec<AbiParam>,
    pub outputs: Vec<AbiParam>,
    pub state_mutability: Mutability,
}

impl AbiEntry {
    pub fn class(&self) -> MutabilityClass {
        self.state_mutability.class()
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> String {
        let types = self
            .inputs
            .iter()
            .map(AbiParam::canonical_type)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.name, types)
    }

    /// First four bytes of the Keccak-256 hash of the signature
    pub fn selector(&self) -> [u8; 4] {
        let hash = Keccak256::digest(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector()))
    }

    /// Comma separated `type name` list used to prompt for arguments
    pub fn parameter_list(&self) -> String {
        self.inputs
            .iter()
            .map(AbiParam::declaration)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default = "default_entry_kind")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
    #[serde(default)]
    outputs: Vec<AbiParam>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<String>,
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
}

fn default_entry_kind() -> String {
    "function".to_string()
}

impl RawEntry {
    fn into_entry(self) -> Result<AbiEntry, CompileError> {
        let kind = EntryKind::parse(&self.kind)
            .ok_or_else(|| CompileError::InvalidAbi(format!("unknown entry type '{}'", self.kind)))?;

        let state_mutability = match self.state_mutability.as_deref() {
            Some(value) => Mutability::parse(value).ok_or_else(|| {
                CompileError::InvalidAbi(format!("unknown state mutability '{value}'"))
            })?,
            // Pre-0.4.16 style ABIs only carry the legacy flags
            None if self.constant == Some(true) => Mutability::View,
            None if self.payable == Some(true) => Mutability::Payable,
            None => Mutability::NonPayable,
        };

        Ok(AbiEntry {
            kind,
            name: self.name,
            inputs: self.inputs,
            outputs: self.outputs,
            state_mutability,
        })
    }
}

/// Ordered interface description of a compiled contract
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDescription {
    entries: Vec<AbiEntry>,
    raw: Abi,
}

impl InterfaceDescription {
    /// Parses a JSON ABI array
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let value: Value = serde_json::from_str(json.trim())
            .map_err(|e| CompileError::InvalidAbi(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CompileError> {
        let raw = match value {
            Value::Array(items) => items,
            other => {
                return Err(CompileError::InvalidAbi(format!(
                    "expected a JSON array, got {other}"
                )))
            }
        };

        let entries = raw
            .iter()
            .map(|item| {
                serde_json::from_value::<RawEntry>(item.clone())
                    .map_err(|e| CompileError::InvalidAbi(e.to_string()))
                    .and_then(RawEntry::into_entry)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries, raw })
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    pub fn raw(&self) -> &Abi {
        &self.raw
    }

    pub fn constructor(&self) -> Option<&AbiEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Constructor)
    }

    /// Callable functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = &AbiEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Function)
    }

    /// Human readable constructor parameters; empty when there are none
    pub fn constructor_signature(&self) -> String {
        self.constructor()
            .map(AbiEntry::parameter_list)
            .unwrap_or_default()
    }

    /// Compact JSON, as shown in the ABI view and embedded in scripts
    pub fn to_json(&self) -> String {
        Value::Array(self.raw.clone()).to_string()
    }

    /// The same ABI parsed by `ethers`, used for encoding and decoding
    pub fn to_ethers(&self) -> Result<ethers::abi::Abi, serde_json::Error> {
        serde_json::from_value(Value::Array(self.raw.clone()))
    }
}

impl fmt::Display for InterfaceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
