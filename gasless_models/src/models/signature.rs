use alloy::primitives::U256;
use error_stack::report;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

use crate::error::{Error, ModelResult};

/// secp256k1 curve order n.
const SECP256K1_N: U256 = U256::from_limbs([
    0xbfd25e8cd0364141,
    0xbaaedce6af48a03b,
    0xfffffffffffffffe,
    0xffffffffffffffff,
]);

/// n / 2; anything above this is a non-canonical (high-s) signature.
const SECP256K1_N_HALF: U256 = U256::from_limbs([
    0xdfe92f46681b20a0,
    0x5d576e7357a4501d,
    0xffffffffffffffff,
    0x7fffffffffffffff,
]);

/// Raw 65-byte ECDSA signature: `r (32) || s (32) || v (1)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature65(pub [u8; 65]);

impl Signature65 {
    pub fn from_slice(bytes: &[u8]) -> ModelResult<Self> {
        let raw: [u8; 65] = bytes.try_into().map_err(|_| {
            report!(Error::InvalidSignatureEncoding(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )))
        })?;
        Ok(Signature65(raw))
    }

    pub fn from_hex(hex_str: &str) -> ModelResult<Self> {
        let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(stripped).map_err(|e| {
            report!(Error::InvalidSignatureEncoding(format!(
                "invalid hex: {e}"
            )))
        })?;
        Self::from_slice(&bytes)
    }

    pub fn r_bytes(&self) -> &[u8] {
        &self.0[0..32]
    }

    pub fn s_bytes(&self) -> &[u8] {
        &self.0[32..64]
    }

    pub fn raw_v(&self) -> u8 {
        self.0[64]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature65({})", self.to_hex())
    }
}

/// Signature kind tag carried in the submit payload. The documented values
/// are `2` for EIP-712 typed-data signatures and `3` for EIP-1271 contract
/// signatures; the splitter never infers this, callers supply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SignatureType {
    Eip712 = 2,
    Eip1271 = 3,
}

/// The `(r, s, v)` decomposition expected by the submit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SplitSignature {
    pub signature_type: SignatureType,
    pub v: u8,
    pub r: String,
    pub s: String,
}

/// Splits a 65-byte signature into its submit-payload form.
///
/// `v` is normalized to the EVM convention: a raw parity bit of `0`/`1` maps
/// to `27`/`28`, and `27`/`28` pass through. A high-s signature fails with
/// `NonCanonicalSignature` instead of being flipped, because flipping also
/// changes `v` and would diverge from what the signer produced.
pub fn split_signature(
    signature: &Signature65,
    signature_type: SignatureType,
) -> ModelResult<SplitSignature> {
    let r = U256::from_be_slice(signature.r_bytes());
    let s = U256::from_be_slice(signature.s_bytes());

    if r.is_zero() || r >= SECP256K1_N {
        return Err(report!(Error::InvalidSignatureEncoding(
            "r is out of range for secp256k1".to_string()
        )));
    }
    if s.is_zero() || s >= SECP256K1_N {
        return Err(report!(Error::InvalidSignatureEncoding(
            "s is out of range for secp256k1".to_string()
        )));
    }
    if s > SECP256K1_N_HALF {
        return Err(report!(Error::NonCanonicalSignature));
    }

    let v = match signature.raw_v() {
        0 => 27,
        1 => 28,
        v @ (27 | 28) => v,
        other => {
            return Err(report!(Error::InvalidSignatureEncoding(format!(
                "unexpected recovery byte {other}"
            ))));
        }
    };

    Ok(SplitSignature {
        signature_type,
        v,
        r: format!("0x{}", hex::encode(signature.r_bytes())),
        s: format!("0x{}", hex::encode(signature.s_bytes())),
    })
}
