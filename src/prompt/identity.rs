use std::path::Path;

use super::env::RenderEnv;
use crate::git::BranchProbe;

const DIRTY_MARKER: &str = "[.]";

/// Text of the `user` segment: active environment and branch when known,
/// otherwise the `HOST\USER` identity.
pub fn user_label(env: &RenderEnv, probe: &dyn BranchProbe, workdir: &Path) -> String {
    let env_label = active_env_label(env).map(|label| label.to_uppercase());

    let branch = probe.branch_status(workdir).map(|status| {
        if status.dirty {
            format!("{} {}", status.branch, DIRTY_MARKER)
        } else {
            status.branch
        }
    });

    match (env_label, branch) {
        (Some(env_label), Some(branch)) => format!("{} | {}", env_label, branch),
        (None, Some(branch)) => branch,
        (Some(env_label), None) => env_label,
        (None, None) => system_identity(env).unwrap_or_default(),
    }
}

/// Name of the active virtual or conda environment, in priority order.
pub fn active_env_label(env: &RenderEnv) -> Option<String> {
    if let Some(label) = &env.active_label {
        return Some(label.clone());
    }
    if let Some(label) = env.virtual_env_prompt.as_deref().and_then(parse_virtual_env_prompt) {
        return Some(label);
    }
    if let Some(label) = &env.conda_default_env {
        return Some(label.clone());
    }

    env.virtual_env.as_deref().and_then(|path| {
        path.trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .map(str::trim)
            .filter(|base| !base.is_empty() && *base != ".")
            .map(String::from)
    })
}

/// `(name) ` as written by venv activators becomes `name`.
pub fn parse_virtual_env_prompt(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix('(') {
        if let Some(end) = rest.find(')') {
            let label = rest[..end].trim();
            if !label.is_empty() {
                return Some(label.to_string());
            }
        }
    }

    Some(trimmed.to_string())
}

pub fn system_identity(env: &RenderEnv) -> Option<String> {
    let user = env.user_name.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let host = env.host_name.as_deref().map(str::trim).filter(|h| !h.is_empty());

    let identity = match (user, host) {
        (Some(user), _) if user.contains('\\') || user.contains('@') => user.to_string(),
        (Some(user), Some(host)) => format!("{}\\{}", host, user),
        (Some(user), None) => user.to_string(),
        (None, Some(host)) => host.to_string(),
        (None, None) => return None,
    };

    Some(identity.to_uppercase())
}
