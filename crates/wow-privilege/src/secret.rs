//! Passphrase hashes and ephemeral secrets.
//!
//! The stored passphrase hash doubles as the token-MAC key. When no
//! passphrase is configured, a 32-byte ephemeral secret is generated per
//! session so tokens are still unforgeable across processes but die with
//! the secret file.
//!
//! On-disk hash format: `<salt_hex>$<sha512(salt || passphrase)_hex>`.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha512};
use std::io::Write as _;
use std::path::Path;
use subtle::ConstantTimeEq;

use crate::error::PrivilegeResult;

/// Salt length in bytes.
const SALT_LEN: usize = 16;
/// Ephemeral secret length in bytes.
const EPHEMERAL_LEN: usize = 32;

/// Hash a passphrase with a fresh random salt and store it at `path`.
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub(crate) fn store_passphrase(path: &Path, passphrase: &str) -> PrivilegeResult<()> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let digest = salted_digest(&salt, passphrase);
    let line = format!("{}${}", hex::encode(salt), hex::encode(digest));
    write_private(path, line.as_bytes())?;
    Ok(())
}

/// Verify a passphrase against the stored hash, in constant time.
///
/// Returns `false` for a missing or malformed hash file (fail-secure) and
/// when the digests differ. The comparison runs over the full digest
/// regardless of where the first mismatching byte sits.
#[must_use]
pub(crate) fn verify_passphrase(path: &Path, passphrase: &str) -> bool {
    let Ok(stored) = std::fs::read_to_string(path) else {
        return false;
    };
    let Some((salt_hex, digest_hex)) = stored.trim().split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(digest)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    let computed = salted_digest(&salt, passphrase);
    computed.as_slice().ct_eq(&digest).into()
}

/// Whether a passphrase hash is configured.
#[must_use]
pub(crate) fn has_passphrase(path: &Path) -> bool {
    path.is_file()
}

/// The token-MAC key: the stored hash digest, or the ephemeral secret.
///
/// When no passphrase is configured, reads the ephemeral secret file or
/// generates it from 32 cryptographically random bytes.
///
/// # Errors
///
/// Returns an IO error if the ephemeral secret cannot be created.
pub(crate) fn signing_secret(hash_file: &Path, ephemeral_file: &Path) -> PrivilegeResult<Vec<u8>> {
    if let Ok(stored) = std::fs::read_to_string(hash_file) {
        if let Some((_, digest_hex)) = stored.trim().split_once('$') {
            if let Ok(digest) = hex::decode(digest_hex) {
                return Ok(digest);
            }
        }
    }

    if let Ok(existing) = std::fs::read(ephemeral_file) {
        if existing.len() == EPHEMERAL_LEN {
            return Ok(existing);
        }
    }

    let mut secret = vec![0u8; EPHEMERAL_LEN];
    OsRng.fill_bytes(&mut secret);
    write_private(ephemeral_file, &secret)?;
    Ok(secret)
}

/// Write a privilege file atomically with mode `0600`.
pub(crate) fn write_private(path: &Path, contents: &[u8]) -> PrivilegeResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().map_or_else(
        || std::ffi::OsString::from("privilege"),
        std::ffi::OsStr::to_os_string,
    );
    tmp_name.push(format!(".tmp.{}", std::process::id()));
    let tmp = path.with_file_name(tmp_name);

    let result = (|| {
        let mut file = std::fs::File::create(&tmp)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(contents)?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn salted_digest(salt: &[u8], passphrase: &str) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(salt);
    hasher.update(passphrase.as_bytes());
    hasher.finalize().to_vec()
}
