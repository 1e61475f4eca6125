//! Contract deployment

use crate::{
    args::{parse_arguments, tokenize},
    artifacts::{CompiledArtifact, InterfaceDescription},
    error::DeployError,
    network::Network,
};
use ethers::{
    abi::ParamType,
    types::{Address, Bytes, TxHash},
};

/// Handle on a contract deployed during this session
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedContract {
    pub contract_name: String,
    pub address: Address,
    pub interface: InterfaceDescription,
    pub tx_hash: TxHash,
}

/// Creation bytecode followed by the encoded constructor arguments
pub fn creation_code(
    artifact: &CompiledArtifact,
    constructor_args: &str,
) -> Result<Bytes, DeployError> {
    let bytecode = artifact
        .bytecode_bytes()
        .map_err(|e| DeployError::Bytecode(e.to_string()))?;
    if bytecode.is_empty() {
        return Err(DeployError::Bytecode(format!(
            "{} has no creation code",
            artifact.contract_name
        )));
    }

    let params = artifact
        .interface
        .constructor()
        .map(|c| c.inputs.as_slice())
        .unwrap_or_default();
    let values = parse_arguments(constructor_args, params)?;
    if values.is_empty() {
        return Ok(bytecode.into());
    }

    let abi = artifact
        .interface
        .to_ethers()
        .map_err(|e| DeployError::Encoding(e.to_string()))?;
    let constructor = abi
        .constructor()
        .ok_or_else(|| DeployError::Encoding("ABI has no constructor".to_string()))?;
    let kinds: Vec<ParamType> = constructor.inputs.iter().map(|p| p.kind.clone()).collect();
    let tokens = tokenize(&values, &kinds)?;

    constructor
        .encode_input(bytecode, &tokens)
        .map(Bytes::from)
        .map_err(|e| DeployError::Encoding(e.to_string()))
}

/// Deploys `artifact` from `from` and waits for the receipt
pub async fn deploy(
    network: &dyn Network,
    from: Address,
    artifact: &CompiledArtifact,
    constructor_args: &str,
) -> Result<DeployedContract, DeployError> {
    let code = creation_code(artifact, constructor_args)?;

    tracing::info!(
        "Deploying {} from {:?} ({} bytes)",
        artifact.contract_name,
        from,
        code.len()
    );
    let deployment = network.deploy(from, code).await?;
    tracing::info!(
        "{} deployed at {:?} (tx {:?})",
        artifact.contract_name,
        deployment.address,
        deployment.tx_hash
    );

    Ok(DeployedContract {
        contract_name: artifact.contract_name.clone(),
        address: deployment.address,
        interface: artifact.interface.clone(),
        tx_hash: deployment.tx_hash,
    })
}
