use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const RC_FILE: &str = ".edrusrc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcConfig {
    pub prompt: String,
    pub show_prompt: bool,
    pub verbose: bool,
    pub silent: bool,
}

impl Default for RcConfig {
    fn default() -> Self {
        Self {
            prompt: "*".to_string(),
            show_prompt: false,
            verbose: false,
            silent: false,
        }
    }
}

pub struct RcLoader;

impl RcLoader {
    /// Get the path to the RC file
    /// Looks for .edrusrc in:
    /// 1. Current directory
    /// 2. Home directory (~/.edrusrc)
    pub fn get_rc_path() -> Option<PathBuf> {
        let current_rc = Path::new(RC_FILE);
        if current_rc.exists() {
            return Some(current_rc.to_path_buf());
        }

        if let Ok(home) = env::var("HOME") {
            let home_rc = Path::new(&home).join(RC_FILE);
            if home_rc.exists() {
                return Some(home_rc);
            }
        }

        None
    }

    /// Load and parse the RC file
    pub fn load_config() -> RcConfig {
        let mut config = RcConfig::default();

        if let Some(rc_path) = Self::get_rc_path() {
            match fs::read_to_string(&rc_path) {
                Ok(content) => {
                    Self::parse_config_content(&content, &mut config);
                    debug!(path = %rc_path.display(), ?config, "loaded rc file");
                }
                Err(e) => {
                    // Fall back to defaults
                    warn!(path = %rc_path.display(), error = %e, "could not read rc file");
                }
            }
        }

        config
    }

    /// Parse the content of an RC file
    pub fn parse_config_content(content: &str, config: &mut RcConfig) {
        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with('"') {
                continue;
            }

            Self::parse_config_line(line, config);
        }
    }

    /// Parse a single configuration line
    fn parse_config_line(line: &str, config: &mut RcConfig) {
        let line = strip_comment(line).trim();

        // "set name", "set noname", "set name=value"
        if let Some(stripped) = line.strip_prefix("set ") {
            let setting = stripped.trim();
            if let Some((key, value)) = setting.split_once('=') {
                Self::apply_value(key.trim(), value.trim(), config);
            } else if let Some(flag) = setting.strip_prefix("no") {
                Self::apply_flag(flag, false, config);
            } else {
                Self::apply_flag(setting, true, config);
            }
        }
        // Handle direct key-value pairs
        else if let Some((key, value)) = line.split_once('=') {
            Self::apply_value(key.trim(), value.trim(), config);
        } else {
            debug!(line, "ignoring rc line");
        }
    }

    fn apply_flag(flag: &str, on: bool, config: &mut RcConfig) {
        match flag {
            "showprompt" | "sp" => config.show_prompt = on,
            "verbose" | "help" => config.verbose = on,
            "silent" | "quiet" => config.silent = on,
            _ => debug!(flag, "unknown rc flag"),
        }
    }

    fn apply_value(key: &str, value: &str, config: &mut RcConfig) {
        match key {
            "prompt" => {
                let prompt = unquote(value);
                if !prompt.is_empty() {
                    config.prompt = prompt.to_string();
                }
            }
            "showprompt" | "show_prompt" => config.show_prompt = truthy(value),
            "verbose" => config.verbose = truthy(value),
            "silent" => config.silent = truthy(value),
            _ => debug!(key, "unknown rc setting"),
        }
    }

    /// Generate a sample RC file content
    pub fn generate_sample_rc() -> String {
        r#"# ed-rus configuration file (.edrusrc)
# Lines starting with # or " are comments

set showprompt          # Print the prompt before each command
set prompt="> "         # Prompt string (default *)
set noverbose           # Print "?" only; "set verbose" prints the reason too
set nosilent            # "set silent" suppresses byte counts

# Alternative key=value syntax:
# show_prompt=true
# verbose=yes
# silent=0
"#
        .to_string()
    }
}

/// Drop a trailing `# comment`, leaving `#` inside double quotes alone.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn truthy(value: &str) -> bool {
    matches!(value, "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RcConfig::default();
        assert_eq!(config.prompt, "*");
        assert!(!config.show_prompt);
        assert!(!config.verbose);
        assert!(!config.silent);
    }

    #[test]
    fn test_parse_set_commands() {
        let mut config = RcConfig::default();
        let content = r#"
            set showprompt
            set verbose
            set silent
            set prompt=:
        "#;

        RcLoader::parse_config_content(content, &mut config);

        assert!(config.show_prompt);
        assert!(config.verbose);
        assert!(config.silent);
        assert_eq!(config.prompt, ":");
    }

    #[test]
    fn test_parse_key_value_config() {
        let mut config = RcConfig::default();
        let content = r#"
            show_prompt=yes
            verbose=1
            silent=false
            prompt="ed> "
        "#;

        RcLoader::parse_config_content(content, &mut config);

        assert!(config.show_prompt);
        assert!(config.verbose);
        assert!(!config.silent);
        assert_eq!(config.prompt, "ed> ");
    }

    #[test]
    fn test_parse_mixed_config_with_comments() {
        let mut config = RcConfig::default();
        let content = r##"
            # This is a comment
            set showprompt         # Turn the prompt on
            " This is also a comment

            prompt="#"             # Quoted hash is not a comment
            # set verbose          # This is commented out
            set nosilent
        "##;

        RcLoader::parse_config_content(content, &mut config);

        assert!(config.show_prompt);
        assert!(!config.verbose);
        assert!(!config.silent);
        assert_eq!(config.prompt, "#");
    }

    #[test]
    fn test_invalid_values_ignored() {
        let mut config = RcConfig::default();
        let content = r#"
            set nothing
            prompt=""
            unknown_setting=value
            just some words
        "#;

        RcLoader::parse_config_content(content, &mut config);

        assert_eq!(config, RcConfig::default());
    }

    #[test]
    fn test_sample_rc_parses() {
        let mut config = RcConfig::default();
        RcLoader::parse_config_content(&RcLoader::generate_sample_rc(), &mut config);
        assert!(config.show_prompt);
        assert_eq!(config.prompt, "> ");
        assert!(!config.verbose);
        assert!(!config.silent);
    }
}
