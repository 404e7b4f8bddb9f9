//! Sealights configuration: selection, back-compat merge, defaults, warnings.
//!
//! Pure functions only; no I/O. Resolution never fails: every problem in the
//! binding document degrades to "not configured" or to a defaulted field, and
//! is logged at debug level.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::binding::{CredentialField, Credentials, ServiceBinding, ServiceBindingSet, field};

// ── Constants ────────────────────────────────────────────────────────────────

/// Substring identifying the Sealights binding by name.
pub const SERVICE_IDENTIFIER: &str = "sealights";

/// Agent verb used when neither `verb` nor `usePic` is configured.
pub const DEFAULT_VERB: &str = "startBackgroundTestListener";

pub const DEFAULT_LAB_ID: &str = "agents";
pub const DEFAULT_AGENT_VERSION: &str = "latest";

/// Credential keys consumed by the injector itself; never forwarded as agent
/// arguments by the back-compat merge.
pub const RESERVED_KEYS: &[&str] = &[
    "version",
    "verb",
    "customAgentUrl",
    "customCommand",
    "usePic",
    "cli",
    "env",
];

/// Argument keys accepted by the agent but rejected in this environment.
pub const UNSUPPORTED_ARGUMENTS: &[&str] = &["testListenerSessionKey"];

// ── Resolved configuration ───────────────────────────────────────────────────

/// Validated, merged Sealights configuration. Created once per build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub version: Option<String>,
    pub verb: Option<String>,
    pub custom_agent_url: Option<String>,
    pub custom_command: Option<String>,
    pub proxy: Option<String>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    pub use_pic: bool,
    /// Agent command-line options: the `cli` section plus, for old-style
    /// bindings, every unreserved flat credential.
    pub arguments: BTreeMap<String, String>,
    /// Environment for the launched process (the `env` section).
    pub environment: BTreeMap<String, String>,
}

/// Advisory findings about a resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    MissingToken,
    MissingBuildSession,
    UnsupportedOption(String),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "Sealights access token isn't provided"),
            Self::MissingBuildSession => write!(f, "Sealights build session id isn't provided"),
            Self::UnsupportedOption(key) => write!(
                f,
                "Sealights. Option '{key}' isn't supported in this environment"
            ),
        }
    }
}

/// HTTP proxy used for the agent download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Resolve the Sealights configuration from a raw binding document.
///
/// Returns `None` when the document is malformed or holds no binding whose
/// name contains [`SERVICE_IDENTIFIER`]. `tool_name` is called at most once,
/// only when `tools` or `tags` needs a default.
#[must_use]
pub fn resolve(raw: &str, tool_name: impl FnOnce() -> String) -> Option<ResolvedConfig> {
    let bindings = match ServiceBindingSet::parse(raw) {
        Ok(bindings) => bindings,
        Err(e) => {
            tracing::debug!(error = %e, "Sealights. Service bindings ignored");
            return None;
        }
    };

    let Some(binding) = bindings.find(SERVICE_IDENTIFIER) else {
        tracing::debug!("Sealights. No matching service binding");
        return None;
    };

    tracing::debug!(name = %binding.name, "Sealights. Service binding selected");
    Some(ResolvedConfig::from_binding(binding, tool_name))
}

impl ResolvedConfig {
    /// Build the configuration from the selected binding.
    #[must_use]
    pub fn from_binding(binding: &ServiceBinding, tool_name: impl FnOnce() -> String) -> Self {
        let credentials = &binding.credentials;

        let environment: BTreeMap<String, String> =
            lookup(credentials, "env").unwrap_or_default();
        let mut arguments: BTreeMap<String, String> =
            lookup(credentials, "cli").unwrap_or_default();

        // Old-style bindings carry agent options as flat credentials. Once
        // `env` is used the binding is new-style and flat fields stay private.
        if environment.is_empty() {
            for (key, value) in credentials {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                match value.as_str() {
                    Some(value) => {
                        arguments.insert(key.clone(), value.to_string());
                    }
                    None => tracing::debug!(key = %key, "Sealights. Skipping non-string credential"),
                }
            }
        }

        let mut tool_name = Some(tool_name);
        let mut default_tool = None::<String>;
        for key in ["tools", "tags"] {
            if !arguments.contains_key(key) {
                let value = default_tool
                    .get_or_insert_with(|| tool_name.take().map(|f| f()).unwrap_or_default())
                    .clone();
                arguments.insert(key.to_string(), value);
            }
        }

        let use_pic = lookup::<bool>(credentials, "usePic").unwrap_or(false);
        let mut verb = lookup_non_empty(credentials, "verb");
        if verb.is_none() && !use_pic {
            verb = Some(DEFAULT_VERB.to_string());
        }

        Self {
            version: lookup_non_empty(credentials, "version"),
            verb,
            custom_agent_url: lookup_non_empty(credentials, "customAgentUrl"),
            custom_command: lookup_non_empty(credentials, "customCommand"),
            proxy: lookup_non_empty(credentials, "proxy"),
            proxy_username: lookup_non_empty(credentials, "proxyUsername"),
            proxy_password: lookup_non_empty(credentials, "proxyPassword"),
            use_pic,
            arguments,
            environment,
        }
    }

    /// Advisory warnings for missing or unsupported agent options.
    #[must_use]
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if !self.has_argument("token") && !self.has_argument("tokenFile") {
            warnings.push(ConfigWarning::MissingToken);
        }
        if !self.has_argument("buildSessionId") && !self.has_argument("buildSessionIdFile") {
            warnings.push(ConfigWarning::MissingBuildSession);
        }
        for key in UNSUPPORTED_ARGUMENTS {
            if self.has_argument(key) {
                warnings.push(ConfigWarning::UnsupportedOption((*key).to_string()));
            }
        }
        warnings
    }

    /// Agent archive URL: `customAgentUrl` when set, else the lab download host.
    #[must_use]
    pub fn download_url(&self) -> String {
        if let Some(url) = &self.custom_agent_url {
            return url.clone();
        }
        let lab_id = self
            .argument("labId")
            .unwrap_or(DEFAULT_LAB_ID);
        let version = self.version.as_deref().unwrap_or(DEFAULT_AGENT_VERSION);
        format!("https://{lab_id}.sealights.co/dotnetcore/sealights-dotnet-agent-{version}.tar.gz")
    }

    /// Proxy for the agent download, if one is configured.
    #[must_use]
    pub fn proxy_settings(&self) -> Option<ProxySettings> {
        self.proxy.as_ref().map(|url| ProxySettings {
            url: url.clone(),
            username: self.proxy_username.clone(),
            password: self.proxy_password.clone(),
        })
    }

    /// A non-empty agent argument.
    #[must_use]
    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn has_argument(&self, key: &str) -> bool {
        self.arguments.contains_key(key)
    }

    /// Copy with secrets masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        const MASK: &str = "********";
        let mut copy = self.clone();
        if copy.proxy_password.is_some() {
            copy.proxy_password = Some(MASK.to_string());
        }
        for key in ["token", "proxyPassword"] {
            if let Some(value) = copy.arguments.get_mut(key) {
                *value = MASK.to_string();
            }
        }
        copy
    }
}

/// Tool identifier reported to Sealights: `sl-pcf-<buildpack version>`.
#[must_use]
pub fn tool_name(buildpack_version: Option<&str>) -> String {
    format!("sl-pcf-{}", buildpack_version.unwrap_or("unknown"))
}

fn lookup<T: CredentialField>(credentials: &Credentials, key: &str) -> Option<T> {
    field(credentials, key).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Sealights. Credential ignored");
        None
    })
}

fn lookup_non_empty(credentials: &Credentials, key: &str) -> Option<String> {
    lookup::<String>(credentials, key).filter(|v| !v.is_empty())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
