// src/blockchain/registry.rs

use std::collections::HashMap;

use ethers_core::abi::{Abi, ParamType, StateMutability};
use thiserror::Error;

/// Construction-time failures of the interface registry. These are fatal at
/// startup; a malformed interface description must not be served from.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate function name in interface description: {0}")]
    DuplicateFunction(String),
    #[error("unsupported parameter type '{ty}' on function '{function}'")]
    UnsupportedType { function: String, ty: String },
    #[error("invalid ABI JSON: {0}")]
    InvalidAbi(#[from] serde_json::Error),
}

/// A single callable function of the contract interface: name, ordered
/// typed inputs, ordered output types and state mutability.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    /// Ordered (parameter name, type) pairs.
    pub inputs: Vec<(String, ParamType)>,
    pub outputs: Vec<ParamType>,
    pub mutability: StateMutability,
}

impl FunctionSignature {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<(&str, ParamType)>,
        outputs: Vec<ParamType>,
        mutability: StateMutability,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: inputs
                .into_iter()
                .map(|(n, ty)| (n.to_string(), ty))
                .collect(),
            outputs,
            mutability,
        }
    }

    /// Whether the function only reads chain state (view or pure).
    pub fn is_read_only(&self) -> bool {
        matches!(
            self.mutability,
            StateMutability::View | StateMutability::Pure
        )
    }

    pub fn is_payable(&self) -> bool {
        matches!(self.mutability, StateMutability::Payable)
    }
}

/// Immutable description of the contract's callable surface. Built once at
/// startup and validated; lookup by name is the sole read operation.
#[derive(Debug, Clone)]
pub struct InterfaceRegistry {
    functions: HashMap<String, FunctionSignature>,
}

impl InterfaceRegistry {
    /// Build a registry from an ordered list of function descriptors.
    /// Duplicate names and type tags outside the supported set are rejected
    /// rather than silently shadowed or trusted.
    pub fn new(functions: Vec<FunctionSignature>) -> Result<Self, RegistryError> {
        let mut map = HashMap::with_capacity(functions.len());
        for sig in functions {
            for (_, ty) in &sig.inputs {
                ensure_supported(&sig.name, ty)?;
            }
            for ty in &sig.outputs {
                ensure_supported(&sig.name, ty)?;
            }
            let name = sig.name.clone();
            if map.insert(name.clone(), sig).is_some() {
                return Err(RegistryError::DuplicateFunction(name));
            }
        }
        Ok(Self { functions: map })
    }

    /// Parse a standard contract ABI JSON document into a registry, applying
    /// the same duplicate-name and unknown-type validation.
    pub fn from_abi_json(abi_json: &str) -> Result<Self, RegistryError> {
        let abi: Abi = serde_json::from_str(abi_json)?;
        let mut functions = Vec::new();
        for function in abi.functions() {
            functions.push(FunctionSignature {
                name: function.name.clone(),
                inputs: function
                    .inputs
                    .iter()
                    .map(|p| (p.name.clone(), p.kind.clone()))
                    .collect(),
                outputs: function.outputs.iter().map(|p| p.kind.clone()).collect(),
                mutability: function.state_mutability,
            });
        }
        Self::new(functions)
    }

    pub fn lookup(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// The Crosschain ERC-20 interface: a standard token surface extended
    /// with agent-gated `crosschainMint`/`crosschainBurn` and a payable
    /// `deposit`.
    pub fn crosschain_token() -> Self {
        use ParamType::{Address, Bool, String as Str, Uint};
        use StateMutability::{NonPayable, Payable, View};

        let f = FunctionSignature::new;
        let functions = vec![
            f("aiAgent", vec![], vec![Address], View),
            f(
                "allowance",
                vec![("owner", Address), ("spender", Address)],
                vec![Uint(256)],
                View,
            ),
            f(
                "approve",
                vec![("spender", Address), ("value", Uint(256))],
                vec![Bool],
                NonPayable,
            ),
            f(
                "balanceOf",
                vec![("account", Address)],
                vec![Uint(256)],
                View,
            ),
            f(
                "crosschainBurn",
                vec![("from", Address), ("amount", Uint(256))],
                vec![],
                NonPayable,
            ),
            f(
                "crosschainMint",
                vec![("to", Address), ("amount", Uint(256))],
                vec![],
                NonPayable,
            ),
            f("decimals", vec![], vec![Uint(8)], View),
            f("deposit", vec![], vec![], Payable),
            f("name", vec![], vec![Str], View),
            f("owner", vec![], vec![Address], View),
            f("renounceOwnership", vec![], vec![], NonPayable),
            f("symbol", vec![], vec![Str], View),
            f("totalSupply", vec![], vec![Uint(256)], View),
            f(
                "transfer",
                vec![("to", Address), ("value", Uint(256))],
                vec![Bool],
                NonPayable,
            ),
            f(
                "transferFrom",
                vec![("from", Address), ("to", Address), ("value", Uint(256))],
                vec![Bool],
                NonPayable,
            ),
            f(
                "transferOwnership",
                vec![("newOwner", Address)],
                vec![],
                NonPayable,
            ),
            f("withdraw", vec![("amount", Uint(256))], vec![], NonPayable),
        ];

        Self::new(functions).expect("crosschain token interface description is valid")
    }
}

fn ensure_supported(function: &str, ty: &ParamType) -> Result<(), RegistryError> {
    match ty {
        ParamType::Address
        | ParamType::Uint(_)
        | ParamType::Bool
        | ParamType::String
        | ParamType::Bytes => Ok(()),
        other => Err(RegistryError::UnsupportedType {
            function: function.to_string(),
            ty: format!("{other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_registered_functions() {
        let registry = InterfaceRegistry::crosschain_token();
        let balance_of = registry.lookup("balanceOf").unwrap();
        assert!(balance_of.is_read_only());
        assert_eq!(balance_of.inputs.len(), 1);
        assert_eq!(balance_of.outputs, vec![ParamType::Uint(256)]);

        let deposit = registry.lookup("deposit").unwrap();
        assert!(deposit.is_payable());

        assert!(registry.lookup("selfdestruct").is_none());
    }

    #[test]
    fn duplicate_names_fail_construction() {
        let dup = FunctionSignature::new("mint", vec![], vec![], StateMutability::NonPayable);
        let err = InterfaceRegistry::new(vec![dup.clone(), dup]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateFunction(name) if name == "mint"));
    }

    #[test]
    fn unsupported_types_fail_construction() {
        let sig = FunctionSignature::new(
            "configure",
            vec![("rates", ParamType::Array(Box::new(ParamType::Uint(256))))],
            vec![],
            StateMutability::NonPayable,
        );
        let err = InterfaceRegistry::new(vec![sig]).unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedType { function, .. } if function == "configure"));
    }

    #[test]
    fn abi_json_parses_into_registry() {
        let abi = r#"[
            {
                "type": "function",
                "name": "balanceOf",
                "inputs": [{"name": "account", "type": "address"}],
                "outputs": [{"name": "", "type": "uint256"}],
                "stateMutability": "view"
            },
            {
                "type": "function",
                "name": "deposit",
                "inputs": [],
                "outputs": [],
                "stateMutability": "payable"
            }
        ]"#;
        let registry = InterfaceRegistry::from_abi_json(abi).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("balanceOf").unwrap().is_read_only());
        assert!(registry.lookup("deposit").unwrap().is_payable());
    }

    #[test]
    fn malformed_abi_json_is_rejected() {
        assert!(InterfaceRegistry::from_abi_json("not json").is_err());
    }
}
