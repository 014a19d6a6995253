// ── Capability checking ──
//
// The client is useless without its four server-side actions, so the set
// of required action names ships as a newline-delimited manifest loaded
// once at startup. Each time the socket comes up the session queries the
// server's action catalog and compares it against the manifest: exact,
// case-sensitive string match, once per connection.

use tracing::debug;

use titlecast_api::protocol::ActionDescriptor;

use crate::error::CoreError;

/// Names of the server-side actions this client depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredActionSet {
    names: Vec<String>,
}

impl RequiredActionSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Parse a newline-delimited manifest.
    ///
    /// Lines are trimmed and blank lines dropped, so a trailing newline
    /// does not produce a phantom empty requirement.
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        Self { names }
    }

    /// Load the manifest from a local path or an `http(s)://` URL.
    pub async fn load(origin: &str) -> Result<Self, CoreError> {
        let text = if origin.starts_with("http://") || origin.starts_with("https://") {
            let response = reqwest::get(origin)
                .await
                .map_err(|e| manifest_error(origin, &e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(manifest_error(origin, &format!("HTTP {status}")));
            }
            response
                .text()
                .await
                .map_err(|e| manifest_error(origin, &e.to_string()))?
        } else {
            tokio::fs::read_to_string(origin)
                .await
                .map_err(|e| manifest_error(origin, &e.to_string()))?
        };

        let set = Self::parse(&text);
        debug!(origin, count = set.len(), "Loaded required-actions manifest");
        Ok(set)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Required names absent from the server's catalog, in manifest order.
    ///
    /// Matching is exact and case-sensitive. Actions the server has beyond
    /// the required set are irrelevant.
    pub fn missing_from(&self, catalog: &[ActionDescriptor]) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| !catalog.iter().any(|action| action.name == **name))
            .cloned()
            .collect()
    }

    pub fn is_satisfied_by(&self, catalog: &[ActionDescriptor]) -> bool {
        self.missing_from(catalog).is_empty()
    }
}

fn manifest_error(origin: &str, reason: &str) -> CoreError {
    CoreError::ManifestLoad {
        origin: origin.to_owned(),
        reason: reason.to_owned(),
    }
}

/// Outcome of the capability check for the current connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CapabilityState {
    /// No catalog reply has been checked yet on this connection.
    #[default]
    Unknown,
    /// Every required action exists on the server.
    Satisfied,
    /// One or more required actions are absent, in manifest order.
    Missing(Vec<String>),
    /// The manifest never loaded, so the check can never pass.
    ManifestUnavailable,
}

impl CapabilityState {
    /// Whether broadcast management is allowed to run.
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    /// Whether the missing-setup panel should be shown.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_) | Self::ManifestUnavailable)
    }
}
