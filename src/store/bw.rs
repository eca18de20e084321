//! Bitwarden CLI store backend.
//!
//! Shells out to the `bw` CLI (Vaultwarden compatible). A session token is
//! obtained via login + unlock and passed to every later command through
//! the `BW_SESSION` environment variable.

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Stdio};

use super::{StoreError, StoreResult, VaultStore};
use crate::item::VaultItem;

/// Vault store backed by the `bw` CLI.
pub struct BwCli {
    bw_cmd: String,
    session: Option<String>,
}

// Manual impl: the session token must never reach logs or error output.
impl std::fmt::Debug for BwCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BwCli")
            .field("bw_cmd", &self.bw_cmd)
            .field("session", &self.session.as_ref().map(|_| "********"))
            .finish()
    }
}

impl BwCli {
    /// Wrap a `bw` binary. `bw_cmd` may be a bare name or a path, which is
    /// how two differently-configured CLIs (source and destination) can
    /// coexist on one machine.
    pub fn new(bw_cmd: impl Into<String>) -> Self {
        BwCli {
            bw_cmd: bw_cmd.into(),
            session: None,
        }
    }

    /// Wrap a `bw` binary and point it at a specific server first.
    pub fn with_server(bw_cmd: impl Into<String>, server: &str) -> StoreResult<Self> {
        let client = Self::new(bw_cmd);
        debug!("Configuring bw server: {server}");
        client.run(&["config", "server", server]).map_err(|e| {
            StoreError::Unavailable(format!("failed to configure server {server}: {e}"))
        })?;
        Ok(client)
    }

    /// Log in non-interactively with an API key. The credentials are passed
    /// to the child process environment, never on the command line.
    pub fn login_api_key(&mut self, client_id: &str, client_secret: &str) -> StoreResult<()> {
        info!("Logging in via API key");
        let output = Command::new(&self.bw_cmd)
            .args(["login", "--apikey"])
            .env("BW_CLIENTID", client_id)
            .env("BW_CLIENTSECRET", client_secret)
            .output()
            .map_err(|e| StoreError::Unavailable(format!("failed to run {}: {e}", self.bw_cmd)))?;

        if !output.status.success() {
            return Err(StoreError::Unavailable(format!(
                "bw login failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        self.session = Some(String::from_utf8_lossy(&output.stdout).trim().to_string());
        Ok(())
    }

    /// Log in with email and password, capturing the raw session token.
    pub fn login_password(&mut self, email: &str, password: &str) -> StoreResult<()> {
        info!("Logging in via email/password");
        let session = self.run(&["login", email, "--password", password, "--raw"])?;
        self.session = Some(session);
        Ok(())
    }

    /// Unlock the vault with the master password and store the returned
    /// session token for all later commands.
    pub fn unlock(&mut self, password: &str) -> StoreResult<()> {
        let session = self.run(&["unlock", password, "--raw"])?;
        self.session = Some(session);
        info!("Vault unlocked");
        Ok(())
    }

    /// Log out and clear the session token.
    pub fn logout(&mut self) -> StoreResult<()> {
        self.run(&["logout"])?;
        self.session = None;
        info!("Logged out");
        Ok(())
    }

    /// Current session status as reported by the CLI.
    pub fn status(&self) -> StoreResult<Value> {
        self.run_json(&["status"])
    }

    /// Run a bw command and return trimmed stdout.
    fn run(&self, args: &[&str]) -> StoreResult<String> {
        let mut cmd = Command::new(&self.bw_cmd);
        cmd.args(args);
        if let Some(session) = &self.session {
            cmd.env("BW_SESSION", session);
        }
        debug!("Running: {} {}", self.bw_cmd, args.join(" "));

        let output = cmd
            .output()
            .map_err(|e| StoreError::Unavailable(format!("failed to run {}: {e}", self.bw_cmd)))?;

        if !output.status.success() {
            return Err(StoreError::Unavailable(format!(
                "bw {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a bw command and parse stdout as JSON.
    fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> StoreResult<T> {
        let stdout = self.run(args)?;
        serde_json::from_str(&stdout)
            .map_err(|e| StoreError::Protocol(format!("failed to parse bw output: {e}")))
    }

    /// Run a bw command with a JSON payload piped over stdin.
    fn run_with_payload<T: DeserializeOwned>(
        &self,
        args: &[&str],
        payload: &VaultItem,
    ) -> StoreResult<T> {
        let body = serde_json::to_string(payload)
            .map_err(|e| StoreError::Protocol(format!("failed to encode payload: {e}")))?;

        let mut cmd = Command::new(&self.bw_cmd);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(session) = &self.session {
            cmd.env("BW_SESSION", session);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| StoreError::Unavailable(format!("failed to run {}: {e}", self.bw_cmd)))?;
        child
            .stdin
            .take()
            .ok_or_else(|| StoreError::Protocol("bw child has no stdin".to_string()))?
            .write_all(body.as_bytes())?;

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(StoreError::Unavailable(format!(
                "bw {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| StoreError::Protocol(format!("failed to parse bw output: {e}")))
    }
}

impl VaultStore for BwCli {
    fn list_items(&self) -> StoreResult<Vec<VaultItem>> {
        self.run_json(&["list", "items"])
    }

    fn get_item(&self, id: &str) -> StoreResult<VaultItem> {
        self.run_json(&["get", "item", id])
    }

    fn create_item(&self, item: &VaultItem) -> StoreResult<VaultItem> {
        self.run_with_payload(&["create", "item", "--raw"], item)
    }

    fn edit_item(&self, id: &str, item: &VaultItem) -> StoreResult<VaultItem> {
        self.run_with_payload(&["edit", "item", id, "--raw"], item)
    }

    fn delete_item(&self, id: &str) -> StoreResult<()> {
        self.run(&["delete", "item", id])?;
        info!("Deleted item {id}");
        Ok(())
    }
}
