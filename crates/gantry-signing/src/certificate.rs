//! Developer-certificate trust installation
//!
//! Drives a [`Keychain`] through the full provisioning protocol for a
//! base64-encoded developer certificate secret. The steps run strictly
//! in order and the first failure aborts the rest; a partially
//! configured store is an accepted outcome, torn down by the caller or
//! by the next run's ephemeral-store lifecycle.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::{debug, info};

use crate::error::{ProvisionError, Result};
use crate::keychain::{ImportOptions, Keychain};
use crate::process::CommandRunner;

/// Apple's WWDR intermediate CA, needed to complete the trust chain for
/// a leaf developer certificate.
const APPLE_CERTIFICATE_AUTHORITY_URL: &str =
    "https://www.apple.com/certificateauthority/AppleWWDRCAG3.cer";

/// Common name carried by certificates minted with
/// [`generate_test_certificate`].
pub const TEST_COMMON_NAME: &str = "Apple Development: Created via API (DEADBEEFACID)";

/// Provision a keychain with a developer certificate.
///
/// Decodes `secret_value` (base64 of a PEM certificate, optionally
/// concatenated with its private key), then: create the store
/// (idempotent), register it in the search list, unlock it, import the
/// certificate with the code-signing ACL, fetch Apple's intermediate CA
/// and import it the same way.
pub async fn prepare_keychain_with_developer_certificate<R: CommandRunner>(
    secret_value: &str,
    keychain: &Keychain<R>,
) -> Result<()> {
    let decoded = BASE64.decode(secret_value.trim())?;
    let certificate = String::from_utf8(decoded)?;

    keychain.create().await?;
    keychain.add_to_search_list().await?;
    keychain.unlock().await?;
    keychain
        .import_certificate_from_pem(
            &certificate,
            ImportOptions {
                for_code_signing: true,
            },
        )
        .await?;

    let intermediate = fetch_certificate(APPLE_CERTIFICATE_AUTHORITY_URL).await?;
    keychain
        .import_certificate_from_der(
            &intermediate,
            ImportOptions {
                for_code_signing: true,
            },
        )
        .await?;

    info!(keychain = %keychain.canonical_name(), "keychain provisioned for code signing");
    Ok(())
}

async fn fetch_certificate(url: &str) -> Result<Vec<u8>> {
    debug!(url, "fetching intermediate certificate");

    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(ProvisionError::IntermediateFetch {
            status: response.status().as_u16(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

/// Concatenate a PEM certificate and private key into one blob.
pub fn combine_pem_cert_and_key(certificate: &str, private_key: &str) -> String {
    format!("{certificate}\n{private_key}")
}

/// Mint a self-signed RSA certificate/key pair with openssl and return
/// the combined PEM blob base64-encoded, as a developer-certificate
/// secret would arrive from CI.
///
/// Both intermediate files are deleted on every exit path. Intended for
/// pipeline smoke tests.
pub async fn generate_test_certificate<R: CommandRunner>(
    runner: &R,
    key_path: &Path,
    crt_path: &Path,
) -> Result<String> {
    let result = mint_certificate(runner, key_path, crt_path).await;

    let _ = tokio::fs::remove_file(key_path).await;
    let _ = tokio::fs::remove_file(crt_path).await;

    result
}

async fn mint_certificate<R: CommandRunner>(
    runner: &R,
    key_path: &Path,
    crt_path: &Path,
) -> Result<String> {
    let key = key_path.to_string_lossy();
    let crt = crt_path.to_string_lossy();

    let generate_key = runner
        .run("openssl", &["genrsa", "-out", &key, "2048"])
        .await?;
    if !generate_key.success() {
        return Err(ProvisionError::CertificateGeneration {
            stderr: generate_key.stderr,
        });
    }

    let subject = format!("/UID=DEADBEEFACID/CN={TEST_COMMON_NAME}/OU=DEADBEEF/O=Gantry/C=US");
    let generate_certificate = runner
        .run(
            "openssl",
            &[
                "req", "-new", "-x509", "-key", &key, "-out", &crt, "-days", "365", "-sha256",
                "-subj", &subject,
            ],
        )
        .await?;
    if !generate_certificate.success() {
        return Err(ProvisionError::CertificateGeneration {
            stderr: generate_certificate.stderr,
        });
    }

    let certificate = tokio::fs::read_to_string(crt_path).await?;
    let private_key = tokio::fs::read_to_string(key_path).await?;

    Ok(BASE64.encode(combine_pem_cert_and_key(&certificate, &private_key)))
}
