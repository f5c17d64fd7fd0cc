use std::env;

use anyhow::bail;

use crate::argv::Argv0;

pub const ARGV0_VAR: &str = "FORKSH_ARGV0";
pub const INTERACTIVE_VAR: &str = "FORKSH_INTERACTIVE";

/// Knobs read from the environment at startup. The shell takes no flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub argv0: Argv0,
    /// Forces the prompt on or off regardless of terminal detection.
    pub interactive: Option<bool>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ARGV0_VAR) {
            config.argv0 = match value.as_str() {
                "resolved" => Argv0::Resolved,
                "invoked" => Argv0::Invoked,
                other => bail!("{ARGV0_VAR}: expected `resolved` or `invoked`, got {other:?}"),
            };
        }

        if let Some(value) = lookup(INTERACTIVE_VAR) {
            config.interactive = match value.as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                other => bail!("{INTERACTIVE_VAR}: expected a boolean, got {other:?}"),
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(
            config_from(&[]).unwrap(),
            Config {
                argv0: Argv0::Resolved,
                interactive: None,
            }
        );
    }

    #[rstest]
    #[case("resolved", Argv0::Resolved)]
    #[case("invoked", Argv0::Invoked)]
    fn argv0_policy(#[case] value: &str, #[case] expected: Argv0) {
        assert_eq!(config_from(&[(ARGV0_VAR, value)]).unwrap().argv0, expected);
    }

    #[rstest]
    #[case("1", Some(true))]
    #[case("no", Some(false))]
    fn interactive_override(#[case] value: &str, #[case] expected: Option<bool>) {
        assert_eq!(
            config_from(&[(INTERACTIVE_VAR, value)]).unwrap().interactive,
            expected
        );
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(config_from(&[(ARGV0_VAR, "typed")]).is_err());
        assert!(config_from(&[(INTERACTIVE_VAR, "maybe")]).is_err());
    }
}
