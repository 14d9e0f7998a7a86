//! Ephemeral keychain lifecycle against the macOS `security` tool
//!
//! A [`Keychain`] is an in-memory handle: constructing one has no OS
//! side effect, and existence is always re-derived from the filesystem
//! so the handle stays valid for a store deleted out-of-band. Two
//! handles targeting the same path are not coordinated here; concurrent
//! CI jobs must use distinct store names.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ProvisionError, Result};
use crate::process::{CommandOutput, CommandRunner, SystemRunner};

const KEYCHAIN_SUFFIX: &str = ".keychain-db";
const SECURITY: &str = "security";

/// Options for importing a certificate into a keychain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Pre-authorize codesign and security to use the imported identity
    /// without an interactive prompt. Adds trust-anchor flags to the
    /// import and issues the follow-up key-partition-list ACL grant.
    pub for_code_signing: bool,
}

/// Handle to one named, password-protected OS keychain.
pub struct Keychain<R: CommandRunner = SystemRunner> {
    name: String,
    password: String,
    directory: PathBuf,
    runner: R,
}

impl Keychain<SystemRunner> {
    /// Create a handle in the platform's per-user keychain directory.
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let directory = dirs::home_dir()
            .ok_or_else(|| {
                ProvisionError::MissingConfiguration("home directory is not set".to_string())
            })?
            .join("Library/Keychains");

        Ok(Self::with_runner(name, password, directory, SystemRunner))
    }
}

impl<R: CommandRunner> Keychain<R> {
    /// Create a handle with an explicit directory and command runner.
    pub fn with_runner(
        name: impl Into<String>,
        password: impl Into<String>,
        directory: impl Into<PathBuf>,
        runner: R,
    ) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            directory: directory.into(),
            runner,
        }
    }

    /// Logical name as supplied by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub(crate) fn runner(&self) -> &R {
        &self.runner
    }

    /// On-disk identifier: the name with the `.keychain-db` suffix.
    ///
    /// Idempotent: a name that already carries the suffix is returned
    /// unchanged.
    pub fn canonical_name(&self) -> String {
        if self.name.ends_with(KEYCHAIN_SUFFIX) {
            self.name.clone()
        } else {
            format!("{}{}", self.name, KEYCHAIN_SUFFIX)
        }
    }

    /// Full path to the keychain file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(self.canonical_name())
    }

    /// Whether the keychain currently exists on disk.
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    async fn run_security(&self, args: &[&str]) -> Result<CommandOutput> {
        Ok(self.runner.run(SECURITY, args).await?)
    }

    /// Create the keychain if it does not exist.
    ///
    /// A no-op when the keychain file is already present; no command is
    /// issued in that case.
    pub async fn create(&self) -> Result<()> {
        if self.exists() {
            debug!(keychain = %self.canonical_name(), "keychain already exists");
            return Ok(());
        }

        let canonical = self.canonical_name();
        let output = self
            .run_security(&["create-keychain", "-p", &self.password, &canonical])
            .await?;

        if !output.success() {
            return Err(ProvisionError::StoreCreation {
                stderr: output.stderr,
            });
        }

        info!(keychain = %canonical, "created keychain");
        Ok(())
    }

    /// Import a certificate file into the keychain.
    ///
    /// With [`ImportOptions::for_code_signing`] the import alone still
    /// leaves the private key behind an interactive ACL prompt, so a
    /// second `set-key-partition-list` step grants codesign and
    /// security non-interactive access. Both steps must succeed.
    pub async fn import_certificate(
        &self,
        certificate: &Path,
        options: ImportOptions,
    ) -> Result<()> {
        let keychain_path = self.path();
        let keychain_path = keychain_path.to_string_lossy();
        let certificate = certificate.to_string_lossy();

        let mut args = vec!["import", certificate.as_ref(), "-k", keychain_path.as_ref()];
        if options.for_code_signing {
            args.extend_from_slice(&["-T", "/usr/bin/codesign", "-T", "/usr/bin/security"]);
        }

        let output = self.run_security(&args).await?;
        if !output.success() {
            return Err(ProvisionError::Import {
                stderr: output.stderr,
            });
        }

        if options.for_code_signing {
            let canonical = self.canonical_name();
            let output = self
                .run_security(&[
                    "set-key-partition-list",
                    "-S",
                    "apple-tool:,apple:",
                    "-k",
                    &self.password,
                    &canonical,
                ])
                .await?;

            if !output.success() {
                return Err(ProvisionError::Acl {
                    stderr: output.stderr,
                });
            }
        }

        debug!(keychain = %self.canonical_name(), "imported certificate");
        Ok(())
    }

    /// Import PEM certificate text.
    ///
    /// The text is staged in a freshly created temporary directory that
    /// is removed on every exit path, including failures.
    pub async fn import_certificate_from_pem(
        &self,
        certificate: &str,
        options: ImportOptions,
    ) -> Result<()> {
        let staging = tempfile::Builder::new().prefix("certificate-").tempdir()?;
        let certificate_path = staging.path().join("certificate.pem");
        tokio::fs::write(&certificate_path, certificate).await?;

        self.import_certificate(&certificate_path, options).await
    }

    /// Import raw certificate bytes (DER).
    ///
    /// Staged and cleaned up the same way as the PEM variant.
    pub async fn import_certificate_from_der(
        &self,
        certificate: &[u8],
        options: ImportOptions,
    ) -> Result<()> {
        let staging = tempfile::Builder::new().prefix("certificate-").tempdir()?;
        let certificate_path = staging.path().join("certificate.cer");
        tokio::fs::write(&certificate_path, certificate).await?;

        self.import_certificate(&certificate_path, options).await
    }

    /// Read the ordered keychain search list.
    ///
    /// Blank lines are dropped; order and duplicates are preserved as
    /// reported by the OS.
    pub async fn get_search_list(&self) -> Result<Vec<String>> {
        let output = self.run_security(&["list-keychains"]).await?;
        if !output.success() {
            return Err(ProvisionError::SearchList {
                stderr: output.stderr,
            });
        }

        Ok(output
            .stdout
            .lines()
            .map(|line| line.trim().trim_matches('"').to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Append this keychain to the search list if it is not present.
    ///
    /// The existing list keeps its order and this keychain goes last,
    /// so stores earlier in precedence keep winning ambiguous lookups.
    pub async fn add_to_search_list(&self) -> Result<()> {
        let current = self.get_search_list().await?;
        let own_path = self.path().to_string_lossy().to_string();

        if current.iter().any(|entry| entry == &own_path) {
            debug!(keychain = %self.canonical_name(), "already in search list");
            return Ok(());
        }

        let mut args: Vec<String> = vec!["list-keychains".into(), "-s".into(), "user".into()];
        args.extend(current);
        args.push(own_path);

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run(SECURITY, &arg_refs).await?;
        if !output.success() {
            return Err(ProvisionError::SearchList {
                stderr: output.stderr,
            });
        }

        info!(keychain = %self.canonical_name(), "added to search list");
        Ok(())
    }

    /// Unlock the keychain and disable auto-relock.
    ///
    /// Best-effort by contract: both steps are attempted regardless of
    /// the first one's exit code and the call itself never fails on a
    /// non-zero exit, tolerating already-unlocked stores on CI. Callers
    /// needing strict guarantees inspect the returned outputs.
    pub async fn unlock(&self) -> Result<(CommandOutput, CommandOutput)> {
        let keychain_path = self.path();
        let keychain_path = keychain_path.to_string_lossy();

        let unlock = self
            .run_security(&["unlock-keychain", "-p", &self.password, &keychain_path])
            .await?;
        if !unlock.success() {
            warn!(
                keychain = %self.canonical_name(),
                exit_code = unlock.exit_code,
                "unlock-keychain returned non-zero"
            );
        }

        let settings = self
            .run_security(&["set-keychain-settings", &keychain_path])
            .await?;
        if !settings.success() {
            warn!(
                keychain = %self.canonical_name(),
                exit_code = settings.exit_code,
                "set-keychain-settings returned non-zero"
            );
        }

        Ok((unlock, settings))
    }

    /// Look up a certificate by common name.
    ///
    /// Query-only; returns the raw command result for the caller to
    /// inspect.
    pub async fn find_certificate(&self, common_name: &str) -> Result<CommandOutput> {
        let keychain_path = self.path();
        let keychain_path = keychain_path.to_string_lossy();

        self.run_security(&[
            "find-certificate",
            "-c",
            common_name,
            "-a",
            "-Z",
            &keychain_path,
        ])
        .await
    }

    /// Delete the keychain. Teardown for ephemeral CI stores.
    pub async fn delete_keychain(&self) -> Result<()> {
        let keychain_path = self.path();
        let keychain_path = keychain_path.to_string_lossy();

        let output = self
            .run_security(&["delete-keychain", &keychain_path])
            .await?;
        if !output.success() {
            return Err(ProvisionError::StoreDeletion {
                stderr: output.stderr,
            });
        }

        info!(keychain = %self.canonical_name(), "deleted keychain");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::ScriptedRunner;

    fn keychain_in(dir: &Path, runner: ScriptedRunner) -> Keychain<ScriptedRunner> {
        Keychain::with_runner("ci", "hunter2", dir, runner)
    }

    #[test]
    fn test_canonical_name_appends_suffix_once() {
        let runner = ScriptedRunner::succeeding();
        let keychain = Keychain::with_runner("ci", "pw", "/tmp", runner);
        assert_eq!(keychain.canonical_name(), "ci.keychain-db");

        let runner = ScriptedRunner::succeeding();
        let keychain = Keychain::with_runner("ci.keychain-db", "pw", "/tmp", runner);
        assert_eq!(keychain.canonical_name(), "ci.keychain-db");
    }

    #[test]
    fn test_path_joins_directory_and_canonical_name() {
        let runner = ScriptedRunner::succeeding();
        let keychain = Keychain::with_runner("ci", "pw", "/var/keychains", runner);
        assert_eq!(
            keychain.path(),
            PathBuf::from("/var/keychains/ci.keychain-db")
        );
    }

    #[tokio::test]
    async fn test_create_issues_create_keychain_command() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(dir.path(), ScriptedRunner::succeeding());

        keychain.create().await.unwrap();

        let calls = keychain.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "security");
        assert_eq!(
            calls[0].1,
            vec!["create-keychain", "-p", "hunter2", "ci.keychain-db"]
        );
    }

    #[tokio::test]
    async fn test_create_is_a_no_op_when_keychain_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ci.keychain-db"), b"").unwrap();
        let keychain = keychain_in(dir.path(), ScriptedRunner::succeeding());

        assert!(keychain.exists());
        keychain.create().await.unwrap();

        assert!(keychain.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::failed("already exists")]),
        );

        let err = keychain.create().await.unwrap_err();
        match err {
            ProvisionError::StoreCreation { stderr } => assert_eq!(stderr, "already exists"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_import_for_code_signing_runs_acl_step() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(dir.path(), ScriptedRunner::succeeding());

        keychain
            .import_certificate(
                Path::new("/tmp/cert.pem"),
                ImportOptions {
                    for_code_signing: true,
                },
            )
            .await
            .unwrap();

        let calls = keychain.runner.calls();
        assert_eq!(calls.len(), 2);

        let expected_path = dir.path().join("ci.keychain-db");
        assert_eq!(
            calls[0].1,
            vec![
                "import",
                "/tmp/cert.pem",
                "-k",
                expected_path.to_str().unwrap(),
                "-T",
                "/usr/bin/codesign",
                "-T",
                "/usr/bin/security",
            ]
        );
        assert_eq!(
            calls[1].1,
            vec![
                "set-key-partition-list",
                "-S",
                "apple-tool:,apple:",
                "-k",
                "hunter2",
                "ci.keychain-db",
            ]
        );
    }

    #[tokio::test]
    async fn test_import_without_code_signing_skips_acl_step() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(dir.path(), ScriptedRunner::succeeding());

        keychain
            .import_certificate(Path::new("/tmp/cert.cer"), ImportOptions::default())
            .await
            .unwrap();

        let calls = keychain.runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].1.contains(&"-T".to_string()));
    }

    #[tokio::test]
    async fn test_acl_failure_maps_to_acl_error() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![
                ScriptedRunner::ok(),
                ScriptedRunner::failed("The specified keychain could not be found."),
            ]),
        );

        let err = keychain
            .import_certificate(
                Path::new("/tmp/cert.pem"),
                ImportOptions {
                    for_code_signing: true,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Acl { .. }));
    }

    #[tokio::test]
    async fn test_import_from_pem_stages_a_file_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(dir.path(), ScriptedRunner::succeeding());

        keychain
            .import_certificate_from_pem("-----BEGIN CERTIFICATE-----", ImportOptions::default())
            .await
            .unwrap();

        let calls = keychain.runner.calls();
        assert_eq!(calls.len(), 1);

        // The staged file was named certificate.pem and no longer exists.
        let staged = PathBuf::from(&calls[0].1[1]);
        assert_eq!(staged.file_name().unwrap(), "certificate.pem");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_staging_cleanup_on_import_failure() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::failed("bad cert")]),
        );

        let err = keychain
            .import_certificate_from_der(&[0x30, 0x82], ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Import { .. }));

        let calls = keychain.runner.calls();
        let staged = PathBuf::from(&calls[0].1[1]);
        assert_eq!(staged.file_name().unwrap(), "certificate.cer");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn test_get_search_list_parses_quoted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let stdout = "    \"/Users/runner/Library/Keychains/login.keychain-db\"\n\n    \"/Library/Keychains/System.keychain\"\n";
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::ok_with_stdout(stdout)]),
        );

        let list = keychain.get_search_list().await.unwrap();
        assert_eq!(
            list,
            vec![
                "/Users/runner/Library/Keychains/login.keychain-db",
                "/Library/Keychains/System.keychain",
            ]
        );
    }

    #[tokio::test]
    async fn test_get_search_list_failure() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::failed("denied")]),
        );

        let err = keychain.get_search_list().await.unwrap_err();
        assert!(matches!(err, ProvisionError::SearchList { .. }));
    }

    #[tokio::test]
    async fn test_add_to_search_list_appends_at_the_end() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::ok_with_stdout(
                "    \"/existing/a.keychain-db\"\n    \"/existing/b.keychain-db\"\n",
            )]),
        );

        keychain.add_to_search_list().await.unwrap();

        let calls = keychain.runner.calls();
        assert_eq!(calls.len(), 2);

        let own_path = dir.path().join("ci.keychain-db");
        assert_eq!(
            calls[1].1,
            vec![
                "list-keychains",
                "-s",
                "user",
                "/existing/a.keychain-db",
                "/existing/b.keychain-db",
                own_path.to_str().unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_add_to_search_list_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let own_path = dir.path().join("ci.keychain-db");
        let stdout = format!("    \"{}\"\n", own_path.display());
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::ok_with_stdout(&stdout)]),
        );

        keychain.add_to_search_list().await.unwrap();

        // Only the read happened; no write-back was issued.
        let calls = keychain.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, vec!["list-keychains"]);
    }

    // unlock() deliberately does not fail on non-zero exits, unlike every
    // other lifecycle operation. The asymmetry is part of the contract.
    #[tokio::test]
    async fn test_unlock_is_best_effort_and_attempts_both_steps() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![
                ScriptedRunner::failed("user interaction is not allowed"),
                ScriptedRunner::ok(),
            ]),
        );

        let (unlock, settings) = keychain.unlock().await.unwrap();
        assert_eq!(unlock.exit_code, 1);
        assert!(settings.success());

        let calls = keychain.runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1[0], "unlock-keychain");
        assert_eq!(calls[1].1[0], "set-keychain-settings");
    }

    #[tokio::test]
    async fn test_find_certificate_returns_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::ok_with_stdout("SHA-1 hash: AB12")]),
        );

        let output = keychain.find_certificate("Apple Development").await.unwrap();
        assert!(output.success());
        assert!(output.stdout.contains("AB12"));

        let calls = keychain.runner.calls();
        assert_eq!(calls[0].1[..3], ["find-certificate", "-c", "Apple Development"]);
    }

    #[tokio::test]
    async fn test_delete_keychain_failure() {
        let dir = tempfile::tempdir().unwrap();
        let keychain = keychain_in(
            dir.path(),
            ScriptedRunner::new(vec![ScriptedRunner::failed("no such keychain")]),
        );

        let err = keychain.delete_keychain().await.unwrap_err();
        assert!(matches!(err, ProvisionError::StoreDeletion { .. }));
    }
}
