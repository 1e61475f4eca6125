//! Per-function controls for a deployed contract
//!
//! One [`ControlGroup`] is generated for every function of the interface,
//! overloads included. A group carries the user's input text; invoking it
//! either runs a local call or sends a transaction, depending on the
//! function's state mutability.

use crate::{
    args::{format_tokens, parse_arguments, parse_value, tokenize},
    artifacts::{AbiParam, InterfaceDescription, MutabilityClass},
    deploy::DeployedContract,
    error::CallError,
    network::Network,
};
use ethers::{
    abi::ParamType,
    types::{Address, Bytes, TxHash, U256},
};
use std::fmt;

/// Input widgets and button for one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlGroup {
    /// Position in declaration order
    pub id: usize,
    pub name: String,
    /// Index among functions sharing this name
    pub overload: usize,
    pub selector: [u8; 4],
    pub class: MutabilityClass,
    pub inputs: Vec<AbiParam>,
    /// Shown in the argument field; present only when the function takes parameters
    pub args_placeholder: Option<String>,
    /// Payable functions get a value field
    pub has_value_field: bool,
    pub args_input: String,
    pub value_input: String,
}

impl ControlGroup {
    /// Button text; overloads are told apart by their parameter types
    pub fn label(&self) -> String {
        if self.overload == 0 {
            self.name.clone()
        } else {
            let types = self
                .inputs
                .iter()
                .map(AbiParam::canonical_type)
                .collect::<Vec<_>>()
                .join(",");
            format!("{}({})", self.name, types)
        }
    }
}

/// What happened when a control was invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Decoded return value of a read-only call
    Read(String),
    /// Hash of the mined transaction
    Transaction(TxHash),
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Read(value) => f.write_str(value),
            Invocation::Transaction(hash) => write!(f, "Transaction {hash:?} mined"),
        }
    }
}

/// Builds one control group per function, in declaration order
pub fn generate_controls(interface: &InterfaceDescription) -> Vec<ControlGroup> {
    let mut controls: Vec<ControlGroup> = Vec::new();

    for function in interface.functions() {
        let overload = controls.iter().filter(|c| c.name == function.name).count();
        let class = function.class();
        controls.push(ControlGroup {
            id: controls.len(),
            name: function.name.clone(),
            overload,
            selector: function.selector(),
            class,
            inputs: function.inputs.clone(),
            args_placeholder: (!function.inputs.is_empty()).then(|| function.parameter_list()),
            has_value_field: class.is_payable(),
            args_input: String::new(),
            value_input: String::new(),
        });
    }

    controls
}

/// Runs the function behind `control` against the deployed contract
pub async fn invoke(
    network: &dyn Network,
    from: Address,
    contract: &DeployedContract,
    control: &ControlGroup,
) -> Result<Invocation, CallError> {
    let encoding_error = |reason: String| CallError::Encoding {
        function: control.name.clone(),
        reason,
    };

    let values = parse_arguments(&control.args_input, &control.inputs)?;
    let value = if control.has_value_field {
        parse_value(&control.value_input)?
    } else {
        U256::zero()
    };

    let abi = contract
        .interface
        .to_ethers()
        .map_err(|e| encoding_error(e.to_string()))?;
    let function = abi
        .functions_by_name(&control.name)
        .map_err(|e| encoding_error(e.to_string()))?
        .iter()
        .find(|f| f.short_signature() == control.selector)
        .ok_or_else(|| encoding_error("function not found in ABI".to_string()))?;

    let kinds: Vec<ParamType> = function.inputs.iter().map(|p| p.kind.clone()).collect();
    let tokens = tokenize(&values, &kinds)?;
    let data = Bytes::from(
        function
            .encode_input(&tokens)
            .map_err(|e| encoding_error(e.to_string()))?,
    );

    if !control.class.is_transaction() {
        tracing::debug!("Calling {} on {:?}", control.label(), contract.address);
        let output = network.call(from, contract.address, data).await?;
        let decoded = function
            .decode_output(&output)
            .map_err(|e| CallError::Decoding {
                function: control.name.clone(),
                reason: e.to_string(),
            })?;
        return Ok(Invocation::Read(format_tokens(&decoded)));
    }

    tracing::info!(
        "Sending {} to {:?} with value {}",
        control.label(),
        contract.address,
        value
    );
    let tx_hash = network.transact(from, contract.address, data, value).await?;
    Ok(Invocation::Transaction(tx_hash))
}
