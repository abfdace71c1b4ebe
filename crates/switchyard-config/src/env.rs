use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Placeholder syntax: `{{ env.NAME }}` or `{{ env.NAME | default("value") }}`
fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r#"\{\{\s*(?P<scope>[A-Za-z0-9_]+)\.(?P<name>[A-Za-z0-9_.]+)\s*(?:\|\s*default\("(?P<default>[^"]*)"\)\s*)?\}\}"#)
            .expect("placeholder pattern must compile")
    })
}

/// Substitute environment placeholders in raw config text
///
/// Runs before TOML parsing so every config struct can use plain strings.
/// Comment lines are copied through untouched, which lets a sample config
/// document variables that are not set.
pub(crate) fn expand_env(raw: &str) -> anyhow::Result<String> {
    let mut expanded = Vec::new();

    for line in raw.split('\n') {
        if line.trim_start().starts_with('#') {
            expanded.push(line.to_owned());
            continue;
        }

        let mut failure = None;
        let replaced = placeholder().replace_all(line, |caps: &Captures<'_>| {
            resolve(caps).unwrap_or_else(|err| {
                failure.get_or_insert(err);
                String::new()
            })
        });

        if let Some(err) = failure {
            return Err(err);
        }
        expanded.push(replaced.into_owned());
    }

    Ok(expanded.join("\n"))
}

fn resolve(caps: &Captures<'_>) -> anyhow::Result<String> {
    let scope = &caps["scope"];
    let name = &caps["name"];

    if scope != "env" || name.contains('.') {
        anyhow::bail!("unsupported placeholder `{scope}.{name}`: only `env.NAME` is allowed");
    }

    match (std::env::var(name), caps.name("default")) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.as_str().to_owned()),
        (Err(_), None) => anyhow::bail!("environment variable `{name}` is not set"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "[routing]\ndefault_provider = \"openai\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn substitutes_set_variable() {
        temp_env::with_var("SWITCHYARD_TEST_KEY", Some("sk-123"), || {
            let out = expand_env("api_key = \"{{ env.SWITCHYARD_TEST_KEY }}\"").unwrap();
            assert_eq!(out, "api_key = \"sk-123\"");
        });
    }

    #[test]
    fn substitutes_several_variables_on_one_line() {
        let vars = [("SY_A", Some("a")), ("SY_B", Some("b"))];
        temp_env::with_vars(vars, || {
            let out = expand_env("x = \"{{env.SY_A}}-{{ env.SY_B }}\"").unwrap();
            assert_eq!(out, "x = \"a-b\"");
        });
    }

    #[test]
    fn unset_variable_without_default_fails() {
        temp_env::with_var_unset("SY_MISSING", || {
            let err = expand_env("x = \"{{ env.SY_MISSING }}\"").unwrap_err();
            assert!(err.to_string().contains("SY_MISSING"));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("SY_REMAP", || {
            let out = expand_env("target = \"{{ env.SY_REMAP | default(\"gpt-5-reason-high\") }}\"").unwrap();
            assert_eq!(out, "target = \"gpt-5-reason-high\"");
        });
        temp_env::with_var("SY_REMAP", Some(""), || {
            let out = expand_env("target = \"{{ env.SY_REMAP | default(\"gpt-5-reason-high\") }}\"").unwrap();
            assert_eq!(out, "target = \"\"");
        });
    }

    #[test]
    fn non_env_scope_is_rejected() {
        let err = expand_env("x = \"{{ vault.TOKEN }}\"").unwrap_err();
        assert!(err.to_string().contains("only `env.NAME`"));
    }

    #[test]
    fn comment_lines_are_not_expanded() {
        temp_env::with_var_unset("SY_MISSING", || {
            let input = "  # api_key = \"{{ env.SY_MISSING }}\"\nfoo = 1";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }
}
