use std::env;

pub const UNICODE_ENV: &str = "VEIL_PROMPT_UNICODE";
pub const ACTIVE_LABEL_ENV: &str = "VEIL_ACTIVE_LABEL";
pub const VSCODE_EMPTY_ICONS_ENV: &str = "VEIL_VSCODE_EMPTY_ICONS";

/// The environment hints the renderer looks at, captured once per render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderEnv {
    pub unicode_override: Option<String>,
    pub active_label: Option<String>,
    pub virtual_env_prompt: Option<String>,
    pub conda_default_env: Option<String>,
    pub virtual_env: Option<String>,
    pub term_program: Option<String>,
    pub vscode_empty_icons: Option<String>,
    pub user_name: Option<String>,
    pub host_name: Option<String>,
}

impl RenderEnv {
    pub fn from_process() -> Self {
        Self {
            unicode_override: var(UNICODE_ENV),
            active_label: var(ACTIVE_LABEL_ENV),
            virtual_env_prompt: var("VIRTUAL_ENV_PROMPT"),
            conda_default_env: var("CONDA_DEFAULT_ENV"),
            virtual_env: var("VIRTUAL_ENV"),
            term_program: var("TERM_PROGRAM"),
            vscode_empty_icons: var(VSCODE_EMPTY_ICONS_ENV),
            user_name: var("USERNAME").or_else(|| var("USER")),
            host_name: hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().trim().to_string())
                .filter(|h| !h.is_empty()),
        }
    }

    pub fn is_vscode(&self) -> bool {
        self.term_program
            .as_deref()
            .is_some_and(|p| p.trim().eq_ignore_ascii_case("vscode"))
    }
}

/// Non-blank value of `name`, trimmed.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Interpret a yes/no style flag. `None` when the value is missing or
/// unrecognized.
pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(Some("ON")), Some(true));
        assert_eq!(parse_flag(Some(" 0 ")), Some(false));
        assert_eq!(parse_flag(Some("maybe")), None);
        assert_eq!(parse_flag(None), None);
    }

    #[test]
    fn test_is_vscode() {
        let env = RenderEnv {
            term_program: Some("VSCode".to_string()),
            ..RenderEnv::default()
        };
        assert!(env.is_vscode());
        assert!(!RenderEnv::default().is_vscode());
    }
}
