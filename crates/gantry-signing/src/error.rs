//! Error types for provisioning operations

use thiserror::Error;

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Provisioning-related errors
///
/// External command failures are detected by exit code alone; the
/// captured stderr text rides along as payload and is never inspected.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Keychain creation failed
    #[error("Failed to create keychain: {stderr}")]
    StoreCreation { stderr: String },

    /// Reading or writing the keychain search list failed
    #[error("Failed to update keychain search list: {stderr}")]
    SearchList { stderr: String },

    /// Certificate import failed
    #[error("Failed to import certificate: {stderr}")]
    Import { stderr: String },

    /// Granting the code-signing ACL failed
    #[error("Failed to set key partition list: {stderr}")]
    Acl { stderr: String },

    /// Keychain deletion failed
    #[error("Failed to delete keychain: {stderr}")]
    StoreDeletion { stderr: String },

    /// Fetching the intermediate CA certificate returned a non-success status
    #[error("Failed to fetch intermediate certificate: HTTP {status}")]
    IntermediateFetch { status: u16 },

    /// The API key transport envelope could not be decoded
    #[error("Failed to decode API key envelope: {0}")]
    EnvelopeDecode(String),

    /// A base64 secret could not be decoded
    #[error("Failed to decode base64 secret: {0}")]
    SecretDecode(#[from] base64::DecodeError),

    /// A decoded secret was expected to be text but is not UTF-8
    #[error("Decoded secret is not valid UTF-8: {0}")]
    SecretUtf8(#[from] std::string::FromUtf8Error),

    /// A required directory or credential field is unset
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// openssl key or certificate generation failed
    #[error("Failed to generate certificate material: {stderr}")]
    CertificateGeneration { stderr: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
