use ring::digest;
use shared::error::{Error, Result};

/// Computes the `a=fingerprint` value of a PEM encoded certificate: the digest
/// of its DER contents as upper-case, colon separated hex.
pub fn compute_fingerprint(pem_certificate: &str, hash_function: &str) -> Result<String> {
    let algorithm = match hash_function.to_ascii_lowercase().as_str() {
        "sha-1" => &digest::SHA1_FOR_LEGACY_USE_ONLY,
        "sha-256" => &digest::SHA256,
        "sha-384" => &digest::SHA384,
        "sha-512" => &digest::SHA512,
        _ => {
            return Err(Error::ErrCryptoAlgorithmUnavailable(
                hash_function.to_owned(),
            ));
        }
    };

    let certificate =
        pem::parse(pem_certificate).map_err(|e| Error::ErrInvalidPem(e.to_string()))?;
    let hashed = digest::digest(algorithm, certificate.contents());
    let values: Vec<String> = hashed
        .as_ref()
        .iter()
        .map(|x| format!("{x:02X}"))
        .collect();

    Ok(values.join(":"))
}
