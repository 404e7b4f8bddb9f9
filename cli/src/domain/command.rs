//! Launch-command rewriting.
//!
//! The platform's start command is treated as an opaque string with a
//! recognised marker token. Everything up to the marker is preserved
//! verbatim; the remainder is the real target, which gets wrapped by the
//! agent. The marker contract lives in [`split_launch_command`] only.

use crate::domain::config::ResolvedConfig;
use crate::domain::error::RewriteError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Agent entry point inside the installation directory.
pub const AGENT_BINARY: &str = "SL.DotNet.dll";

/// Runtime that hosts both the agent and the wrapped target.
pub const RUNTIME: &str = "dotnet";

/// Agent mode used when the configuration carries no verb.
pub const FALLBACK_MODE: &str = "testListener";

/// Arguments the invocation writes itself, or that must not reach the agent.
const NON_FORWARDED_ARGUMENTS: &[&str] = &[
    "token",
    "tokenFile",
    "buildSessionId",
    "buildSessionIdFile",
    "labId",
    "proxy",
    "proxyUsername",
    "proxyPassword",
    "workingDir",
    "target",
    "targetArgs",
    "testListenerSessionKey",
];

// ── Parsing ──────────────────────────────────────────────────────────────────

/// Token separating the preserved preamble from the wrapped target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `… && exec <target>`; the `exec` stays in the preamble so the shell
    /// still replaces itself, now with the agent.
    Exec,
    /// `… dotnet <target>`; the runtime word is consumed because the agent
    /// invocation supplies it again.
    Runtime,
}

impl Marker {
    /// The literal word searched for.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Exec => "exec",
            Self::Runtime => RUNTIME,
        }
    }
}

/// A launch command split around its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchCommand<'a> {
    pub preamble: &'a str,
    pub target: &'a str,
}

/// Split `command` on the first standalone occurrence of `marker`.
///
/// The marker must start the command or follow whitespace, and must be
/// followed by whitespace (or, for the runtime marker, end the command).
///
/// # Errors
///
/// Returns `RewriteError::MalformedCommand` when the marker is absent.
pub fn split_launch_command(command: &str, marker: Marker) -> Result<LaunchCommand<'_>, RewriteError> {
    let token = marker.token();
    let malformed = || RewriteError::MalformedCommand {
        marker: token.to_string(),
        command: command.to_string(),
    };

    let start = command
        .match_indices(token)
        .map(|(i, _)| i)
        .find(|&i| {
            let before = command[..i].chars().next_back();
            let after = command[i + token.len()..].chars().next();
            let starts_word = before.is_none_or(char::is_whitespace);
            let ends_word = match marker {
                Marker::Exec => after.is_some_and(char::is_whitespace),
                Marker::Runtime => after.is_none_or(char::is_whitespace),
            };
            starts_word && ends_word
        })
        .ok_or_else(malformed)?;

    let end = start + token.len();
    let (preamble, rest) = match marker {
        Marker::Exec => {
            // keep exactly one separating space with the preamble
            let sep = command[end..].chars().next().map_or(0, char::len_utf8);
            (&command[..end + sep], &command[end + sep..])
        }
        Marker::Runtime => (&command[..start], &command[end..]),
    };

    let target = rest.trim();
    if target.is_empty() {
        return Err(malformed());
    }

    Ok(LaunchCommand { preamble, target })
}

// ── Rewriting ────────────────────────────────────────────────────────────────

/// Wrap the target of `original` with the Sealights agent.
///
/// `agent_dir` and `working_dir` are emitted verbatim so that shell variable
/// references (e.g. `${HOME}`) expand at launch time. Values that come from
/// the binding are shell-quoted when needed.
///
/// # Errors
///
/// Returns `RewriteError::MalformedCommand` when `original` lacks the marker;
/// no partially built command is returned.
pub fn rewrite(
    original: &str,
    marker: Marker,
    config: &ResolvedConfig,
    agent_dir: &str,
    working_dir: &str,
) -> Result<String, RewriteError> {
    let command = split_launch_command(original, marker)?;
    let target = config.custom_command.as_deref().unwrap_or(command.target);
    let invocation = agent_invocation(config, agent_dir, working_dir, target);
    Ok(format!("{}{invocation}", command.preamble))
}

/// Build `dotnet <agent> <mode> … --target dotnet --targetArgs "<target>"`.
#[must_use]
pub fn agent_invocation(
    config: &ResolvedConfig,
    agent_dir: &str,
    working_dir: &str,
    target: &str,
) -> String {
    let agent = format!("{}/{AGENT_BINARY}", agent_dir.trim_end_matches('/'));
    let mode = config.verb.as_deref().unwrap_or(FALLBACK_MODE);

    let mut out = format!("{RUNTIME} {agent} {mode}");

    if let Some(path) = config.argument("tokenFile") {
        push_option(&mut out, "tokenFile", path);
    } else if let Some(token) = config.argument("token") {
        push_option(&mut out, "token", token);
    }

    if let Some(path) = config.argument("buildSessionIdFile") {
        push_option(&mut out, "buildSessionIdFile", path);
    } else if let Some(id) = config.argument("buildSessionId") {
        push_option(&mut out, "buildSessionId", id);
    }

    if let Some(proxy) = config.proxy_settings() {
        push_option(&mut out, "proxy", &proxy.url);
        if let Some(user) = &proxy.username {
            push_option(&mut out, "proxyUsername", user);
        }
        if let Some(password) = &proxy.password {
            push_option(&mut out, "proxyPassword", password);
        }
    }

    for (key, value) in &config.arguments {
        if NON_FORWARDED_ARGUMENTS.contains(&key.as_str()) || value.is_empty() {
            continue;
        }
        if !is_option_name(key) {
            tracing::warn!(%key, "Sealights. Skipping agent option with an invalid name");
            continue;
        }
        push_option(&mut out, key, value);
    }

    out.push_str(&format!(
        " --workingDir {working_dir} --target {RUNTIME} --targetArgs \"{target}\""
    ));
    out
}

fn push_option(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!(" --{name} {}", shell_words::quote(value)));
}

/// Option names are emitted unquoted, so only `[A-Za-z0-9_.-]` is allowed.
fn is_option_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

// ── Unit tests ───────────────────────────────────────────────────────────────
