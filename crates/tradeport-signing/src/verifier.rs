//! secp256k1 signer recovery.
//!
//! Accepts the 65-byte `r ‖ s ‖ v` form (`v` as 27/28 or 0/1) and the
//! 64-byte EIP-2098 compact form `r ‖ vs`, where the top bit of `vs` is the
//! y-parity and the remaining 255 bits are `s`. Both normalize to
//! `(r, s, yParity)` before recovery. High-`s` signatures are rejected.

use alloy_primitives::{Address, B256, keccak256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use tradeport_types::constants::{COMPACT_SIGNATURE_LENGTH, SIGNATURE_LENGTH};
use tradeport_types::{Result, TradeportError};

fn invalid(reason: impl Into<String>) -> TradeportError {
    TradeportError::InvalidSignature {
        reason: reason.into(),
    }
}

/// Split raw signature bytes into `(r ‖ s, yParity)`.
fn normalize(signature: &[u8]) -> Result<([u8; 64], u8)> {
    let mut rs = [0u8; 64];
    match signature.len() {
        SIGNATURE_LENGTH => {
            rs.copy_from_slice(&signature[..64]);
            let parity = match signature[64] {
                0 | 27 => 0,
                1 | 28 => 1,
                v => return Err(invalid(format!("bad recovery byte {v}"))),
            };
            Ok((rs, parity))
        }
        COMPACT_SIGNATURE_LENGTH => {
            rs.copy_from_slice(signature);
            let parity = rs[32] >> 7;
            rs[32] &= 0x7f;
            Ok((rs, parity))
        }
        len => Err(invalid(format!(
            "length {len}, expected {SIGNATURE_LENGTH} or {COMPACT_SIGNATURE_LENGTH}"
        ))),
    }
}

/// Ledger identity of a public key: the last 20 bytes of
/// `keccak256(uncompressed point without prefix)`.
#[must_use]
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.as_affine().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Recover the signer of `digest`.
///
/// # Errors
/// [`TradeportError::InvalidSignature`] on a bad length or recovery byte, a
/// zero or out-of-range scalar, a high `s`, or a failed recovery.
pub fn recover(digest: B256, signature: &[u8]) -> Result<Address> {
    let (rs, parity) = normalize(signature)?;

    let sig = Signature::from_slice(&rs).map_err(|e| invalid(e.to_string()))?;
    if sig.normalize_s().is_some() {
        return Err(invalid("non-canonical high s"));
    }
    let recovery_id =
        RecoveryId::from_byte(parity).ok_or_else(|| invalid("bad recovery id"))?;

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|e| {
            tracing::debug!(digest = %digest, error = %e, "signature recovery failed");
            invalid("unrecoverable signature")
        })?;

    let signer = address_of(&key);
    if signer == Address::ZERO {
        return Err(invalid("recovered zero address"));
    }
    Ok(signer)
}

/// Recover and compare against `expected`.
///
/// # Errors
/// As [`recover`], plus [`TradeportError::InvalidSigner`] on a mismatch.
pub fn verify_signer(digest: B256, signature: &[u8], expected: Address) -> Result<()> {
    let recovered = recover(digest, signature)?;
    if recovered != expected {
        return Err(TradeportError::InvalidSigner {
            expected,
            recovered,
        });
    }
    Ok(())
}
