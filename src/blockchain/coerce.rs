// src/blockchain/coerce.rs

use std::str::FromStr;

use ethers_core::abi::{ParamType, Token};
use ethers_core::types::{Address, U256};

use super::models::{ArgumentErrorReason, InvokeError};
use super::registry::FunctionSignature;

fn invalid(reason: ArgumentErrorReason, message: String) -> InvokeError {
    InvokeError::InvalidArgument { reason, message }
}

/// Convert the raw caller-supplied argument strings into the typed values a
/// function's parameter list requires. Performs no I/O and never blocks.
pub fn coerce(
    signature: &FunctionSignature,
    raw_args: &[String],
) -> Result<Vec<Token>, InvokeError> {
    if raw_args.len() != signature.inputs.len() {
        return Err(invalid(
            ArgumentErrorReason::Arity,
            format!(
                "{} takes {} argument(s), got {}",
                signature.name,
                signature.inputs.len(),
                raw_args.len()
            ),
        ));
    }

    signature
        .inputs
        .iter()
        .zip(raw_args)
        .map(|((name, ty), raw)| coerce_one(name, ty, raw))
        .collect()
}

fn coerce_one(name: &str, ty: &ParamType, raw: &str) -> Result<Token, InvokeError> {
    match ty {
        ParamType::Address => parse_address(raw).map(Token::Address).ok_or_else(|| {
            invalid(
                ArgumentErrorReason::AddressFormat,
                format!("'{name}' must be a 0x-prefixed 40-hex-digit address, got '{raw}'"),
            )
        }),
        ParamType::Uint(bits) => parse_uint(name, *bits, raw),
        ParamType::Bool => match raw {
            "true" => Ok(Token::Bool(true)),
            "false" => Ok(Token::Bool(false)),
            _ => Err(invalid(
                ArgumentErrorReason::Type,
                format!("'{name}' must be 'true' or 'false', got '{raw}'"),
            )),
        },
        ParamType::String => Ok(Token::String(raw.to_string())),
        ParamType::Bytes => match raw.strip_prefix("0x") {
            Some(h) => hex::decode(h).map(Token::Bytes).map_err(|_| {
                invalid(
                    ArgumentErrorReason::Type,
                    format!("'{name}' is not valid 0x-prefixed hex"),
                )
            }),
            None => Ok(Token::Bytes(raw.as_bytes().to_vec())),
        },
        // The registry rejects anything else at construction time.
        other => Err(invalid(
            ArgumentErrorReason::Type,
            format!("'{name}' has unsupported parameter type {other:?}"),
        )),
    }
}

/// Canonical textual address form: `0x` plus 40 hex digits, any case.
/// No checksum correction; the raw form is passed through unchanged.
fn parse_address(raw: &str) -> Option<Address> {
    let digits = raw.strip_prefix("0x")?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Address::from_str(raw).ok()
}

fn parse_uint(name: &str, bits: usize, raw: &str) -> Result<Token, InvokeError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(
            ArgumentErrorReason::Type,
            format!("'{name}' must be a non-negative base-10 integer, got '{raw}'"),
        ));
    }
    let value = U256::from_dec_str(raw).map_err(|_| {
        invalid(
            ArgumentErrorReason::Overflow,
            format!("'{name}' does not fit in uint{bits}"),
        )
    })?;
    if bits < 256 && value.bits() > bits {
        return Err(invalid(
            ArgumentErrorReason::Overflow,
            format!("'{name}' does not fit in uint{bits}"),
        ));
    }
    Ok(Token::Uint(value))
}

/// Convert a human-entered decimal amount of the native currency into its
/// integer base unit (wei), scaling by 10^18 and truncating fractional
/// digits past the 18th.
///
/// Only the attached value of a payable call goes through this conversion;
/// typed integer parameters must already be base-unit integer strings.
pub fn parse_native_amount(raw: &str) -> Result<U256, InvokeError> {
    let trimmed = raw.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    let all_digits =
        |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(invalid(
            ArgumentErrorReason::ValueFormat,
            format!("attached value must be a non-negative decimal amount, got '{raw}'"),
        ));
    }

    let overflow = || {
        invalid(
            ArgumentErrorReason::Overflow,
            format!("attached value '{raw}' overflows the base unit"),
        )
    };

    let whole_wei = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole)
            .map_err(|_| overflow())?
            .checked_mul(U256::exp10(18))
            .ok_or_else(overflow)?
    };

    let frac = &frac[..frac.len().min(18)];
    let frac_wei = if frac.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(frac)
            .map_err(|_| overflow())?
            .checked_mul(U256::exp10(18 - frac.len()))
            .ok_or_else(overflow)?
    };

    whole_wei.checked_add(frac_wei).ok_or_else(overflow)
}
