//! Password hashing, request signatures and exchange token decryption.

use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, KeyInit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha512};
use sha3::Sha3_512;

use super::error::GatewayError;

pub const PASSWORD_CRYPTO_TYPE: &str = "SHA-512";
pub const SIGNATURE_CRYPTO_TYPE: &str = "SHA3-512";

/// Timestamp format inside request signatures.
pub const SIGNATURE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

const AES_BLOCK: usize = 16;

fn upper_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// SHA-512 of the password, upper-case hex.
pub fn password_hash(password: &str) -> String {
    upper_hex(&Sha512::digest(password.as_bytes()))
}

/// SHA3-512 of the input, upper-case hex.
pub fn sha3_hex(input: &str) -> String {
    upper_hex(&Sha3_512::digest(input.as_bytes()))
}

/// Request signature of token exchange and status queries.
pub fn request_signature(request_id: &str, timestamp: DateTime<Utc>, sign_key: &str) -> String {
    sha3_hex(&signature_base(request_id, timestamp, sign_key))
}

/// Request signature of manageInvoice: the partial signature base is extended
/// with the hash of every operation followed by its base64 invoice data.
pub fn manage_invoice_signature<'a>(
    request_id: &str,
    timestamp: DateTime<Utc>,
    sign_key: &str,
    operations: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let mut base = signature_base(request_id, timestamp, sign_key);
    for (operation, data) in operations {
        base.push_str(&sha3_hex(&format!("{operation}{data}")));
    }
    sha3_hex(&base)
}

fn signature_base(request_id: &str, timestamp: DateTime<Utc>, sign_key: &str) -> String {
    format!(
        "{request_id}{}{sign_key}",
        timestamp.format(SIGNATURE_TIME_FORMAT)
    )
}

/// Decrypt a base64 exchange token with AES-128-ECB and strip PKCS#7 padding.
pub fn decrypt_token(encoded: &str, exchange_key: &str) -> Result<String, GatewayError> {
    let mut data = BASE64
        .decode(encoded.trim())
        .map_err(|e| GatewayError::Decrypt(format!("invalid base64: {e}")))?;
    if data.is_empty() || data.len() % AES_BLOCK != 0 {
        return Err(GatewayError::Decrypt(format!(
            "ciphertext length {} is not a multiple of {AES_BLOCK}",
            data.len()
        )));
    }

    let cipher = Aes128::new_from_slice(exchange_key.as_bytes())
        .map_err(|_| GatewayError::Decrypt("exchange key must be 16 bytes".into()))?;
    for block in data.chunks_exact_mut(AES_BLOCK) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }

    let plain = unpad(&data)?;
    String::from_utf8(plain.to_vec())
        .map_err(|e| GatewayError::Decrypt(format!("token is not UTF-8: {e}")))
}

fn unpad(data: &[u8]) -> Result<&[u8], GatewayError> {
    let invalid = || GatewayError::Decrypt("invalid PKCS#7 padding".into());
    let pad = *data.last().ok_or_else(invalid)? as usize;
    if pad == 0 || pad > AES_BLOCK || pad > data.len() {
        return Err(invalid());
    }
    let (plain, padding) = data.split_at(data.len() - pad);
    if padding.iter().any(|&b| b as usize != pad) {
        return Err(invalid());
    }
    Ok(plain)
}
