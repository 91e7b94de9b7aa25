//! Configuration for the orchestrator.
//!
//! `from_file` checks on Unix that the file is a regular file, is not
//! world-writable, and is not world-readable when it holds an API key.

use copilot_agents::AgentsConfig;
use copilot_llm::LlmConfig;
use copilot_records::RecordsConfig;
use copilot_retrieval::RetrievalConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Main orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Overall deadline for one analysis
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    /// Optional cap on each agent's individual timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_timeout_ms: Option<u64>,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub agents: AgentsConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub records: RecordsConfig,
}

fn default_deadline_ms() -> u64 {
    30_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            agent_timeout_ms: None,
            llm: LlmConfig::default(),
            agents: AgentsConfig::default(),
            retrieval: RetrievalConfig::default(),
            records: RecordsConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout_ms.map(Duration::from_millis)
    }

    /// Whether any collaborator key is stored in the file itself.
    fn has_inline_api_key(&self) -> bool {
        [
            &self.llm.api_key,
            &self.retrieval.api_key,
            &self.records.api_key,
        ]
        .iter()
        .any(|k| k.as_deref().is_some_and(|k| !k.is_empty()))
    }

    /// Load configuration from a TOML file, validating its permissions.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = Self::from_file_unchecked(path)?;

        #[cfg(unix)]
        validate_config_file_permissions(path, config.has_inline_api_key())?;

        if config.has_inline_api_key() {
            warn!(
                "API key found in config file '{}'. For better security, use environment \
                 variables instead (OPENAI_API_KEY, AZURE_OPENAI_API_KEY, SEARCH_API_KEY, CRM_API_KEY).",
                path.display()
            );
        }

        Ok(config)
    }

    /// Load configuration from a TOML file without permission checks.
    pub fn from_file_unchecked(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(unix)]
fn validate_config_file_permissions(path: &std::path::Path, has_api_key: bool) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::symlink_metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!(
            "Config path '{}' is not a regular file. Symlinks and directories are not allowed.",
            path.display()
        );
    }

    let permission_bits = metadata.permissions().mode() & 0o777;

    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_api_key && permission_bits & 0o004 != 0 {
        anyhow::bail!(
            "Config file '{}' contains an API key but is world-readable (mode {:04o}). \
             Fix with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    if has_api_key && permission_bits & 0o040 != 0 {
        warn!(
            "Config file '{}' contains an API key and is group-readable (mode {:04o}). \
             Consider restricting access with: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let config = OrchestratorConfig::from_file_unchecked(file.path()).unwrap();
        assert_eq!(config.deadline(), Duration::from_secs(30));
        assert!(config.agent_timeout().is_none());
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.agents.max_tokens, 800);
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn parses_all_sections() {
        let file = write_config(
            r#"
deadline_ms = 5000
agent_timeout_ms = 2000

[llm]
provider = "azure"
model = "gpt-4o"
api_url = "https://example.openai.azure.com"

[agents]
temperature = 0.2

[agents.retry]
max_retries = 2

[retrieval]
top_k = 3

[[retrieval.documents]]
content = "Enterprise tier includes a dedicated TAM"

[records]
endpoint = "https://crm.example.net"
"#,
        );
        let config = OrchestratorConfig::from_file_unchecked(file.path()).unwrap();
        assert_eq!(config.deadline_ms, 5000);
        assert_eq!(config.agent_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(config.llm.provider, "azure");
        assert_eq!(config.agents.temperature, 0.2);
        assert_eq!(config.agents.retry.max_retries, 2);
        assert_eq!(config.retrieval.documents.len(), 1);
        assert_eq!(config.records.endpoint.as_deref(), Some("https://crm.example.net"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(OrchestratorConfig::from_file("/nonexistent/copilot.toml").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn rejects_world_readable_file_with_key() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_config("[llm]\napi_key = \"sk-test\"\n");
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644)).unwrap();
        let err = OrchestratorConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-readable"));

        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600)).unwrap();
        let config = OrchestratorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_world_writable_file() {
        use std::os::unix::fs::PermissionsExt;

        let file = write_config("deadline_ms = 1000\n");
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o666)).unwrap();
        let err = OrchestratorConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-writable"));
    }
}
