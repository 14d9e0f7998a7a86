//! Gantry Signing - macOS code-signing trust material for CI runs
//!
//! This crate provisions the credentials a headless signing job needs:
//! - Keychain: ephemeral credential-store lifecycle (create, search
//!   list, unlock, import, delete) driven through the `security` tool
//! - Certificate: the full trust-installation protocol for a developer
//!   certificate, including Apple's intermediate CA
//! - API key: the App Store Connect key envelope codec and its on-disk
//!   materialization
//! - Profile: provisioning-profile installation
//!
//! Everything is non-interactive by design; operations either succeed
//! or fail with a typed error carrying the failing tool's stderr.

pub mod api_key;
pub mod certificate;
pub mod error;
pub mod keychain;
pub mod process;
pub mod profile;

pub use api_key::{ApiKeyRecord, KeyLayout, MaterializedKey};
pub use certificate::{
    combine_pem_cert_and_key, generate_test_certificate,
    prepare_keychain_with_developer_certificate,
};
pub use error::{ProvisionError, Result};
pub use keychain::{ImportOptions, Keychain};
pub use process::{CommandOutput, CommandRunner, SystemRunner};
pub use profile::install_provisioning_profile;
