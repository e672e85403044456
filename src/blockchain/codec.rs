// src/blockchain/codec.rs

use ethers_core::abi::{decode as abi_decode, encode as abi_encode, ParamType, Token};
use ethers_core::types::Bytes;
use ethers_core::utils::keccak256;

use super::models::InvokeError;
use super::registry::FunctionSignature;

/// First four bytes of the keccak-256 hash of a canonical signature string.
pub fn selector(canonical: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(canonical.as_bytes())[0..4]);
    sel
}

/// Canonical `name(type,type,...)` rendering used for selector derivation.
pub fn canonical_signature(signature: &FunctionSignature) -> String {
    let types: Vec<String> = signature
        .inputs
        .iter()
        .map(|(_, ty)| type_name(ty))
        .collect();
    format!("{}({})", signature.name, types.join(","))
}

/// Encode a call payload: the function selector followed by the ABI head/tail
/// encoding of each argument in declaration order. Pure and deterministic;
/// identical inputs always produce byte-identical output.
///
/// Registry membership is not re-validated here; the signature handed in is
/// expected to come from a registry lookup.
pub fn encode(signature: &FunctionSignature, args: &[Token]) -> Bytes {
    let mut payload = selector(&canonical_signature(signature)).to_vec();
    payload.extend(abi_encode(args));
    Bytes::from(payload)
}

/// Decode raw return bytes strictly in the order and widths implied by the
/// declared outputs. Insufficient or malformed bytes are an
/// interface-description mismatch, surfaced as `InvokeError::Decode`.
pub fn decode(outputs: &[ParamType], data: &[u8]) -> Result<Vec<Token>, InvokeError> {
    abi_decode(outputs, data).map_err(|e| {
        InvokeError::Decode(format!("return data does not match declared outputs: {e}"))
    })
}

fn type_name(ty: &ParamType) -> String {
    match ty {
        ParamType::Address => "address".to_string(),
        ParamType::Bytes => "bytes".to_string(),
        ParamType::FixedBytes(n) => format!("bytes{n}"),
        ParamType::Int(n) => format!("int{n}"),
        ParamType::Uint(n) => format!("uint{n}"),
        ParamType::Bool => "bool".to_string(),
        ParamType::String => "string".to_string(),
        ParamType::Array(inner) => format!("{}[]", type_name(inner)),
        ParamType::FixedArray(inner, n) => format!("{}[{}]", type_name(inner), n),
        ParamType::Tuple(parts) => {
            let inner: Vec<String> = parts.iter().map(type_name).collect();
            format!("({})", inner.join(","))
        }
    }
}
