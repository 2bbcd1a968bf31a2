// src/exec/env.rs

//! Environment construction for child processes.

use std::collections::BTreeMap;

use crate::types::{EnvMode, EnvOverride};

/// Apply `overrides` in order to a copy of `base`.
///
/// Pure function: the engine's own environment is never modified.
pub fn build_environment<I, K, V>(base: I, overrides: &[EnvOverride]) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut env: BTreeMap<String, String> =
        base.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

    for o in overrides {
        match o.mode {
            EnvMode::Replace => {
                env.insert(o.name.clone(), o.value.clone());
            }
            EnvMode::Prepend => {
                let value = match env.get(&o.name) {
                    Some(existing) if !existing.is_empty() => {
                        format!("{}{}{}", o.value, o.separator, existing)
                    }
                    _ => o.value.clone(),
                };
                env.insert(o.name.clone(), value);
            }
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![("PATH", "/usr/bin"), ("JAVA_TOOL_OPTIONS", "-Xmx2g")]
    }

    #[test]
    fn replace_sets_or_overwrites() {
        let env = build_environment(
            base(),
            &[
                EnvOverride::replace("PATH", "/opt/bin"),
                EnvOverride::replace("TMPDIR", "/scratch"),
            ],
        );
        assert_eq!(env["PATH"], "/opt/bin");
        assert_eq!(env["TMPDIR"], "/scratch");
    }

    #[test]
    fn prepend_joins_with_separator() {
        let env = build_environment(
            base(),
            &[EnvOverride::prepend("JAVA_TOOL_OPTIONS", "-Djava.io.tmpdir=/r/.tmp", " ")],
        );
        assert_eq!(env["JAVA_TOOL_OPTIONS"], "-Djava.io.tmpdir=/r/.tmp -Xmx2g");
    }

    #[test]
    fn prepend_to_missing_or_empty_variable_sets_it() {
        let env = build_environment(
            vec![("EMPTY", "")],
            &[
                EnvOverride::prepend("EMPTY", "a", ":"),
                EnvOverride::prepend("MISSING", "b", ":"),
            ],
        );
        assert_eq!(env["EMPTY"], "a");
        assert_eq!(env["MISSING"], "b");
    }

    #[test]
    fn overrides_apply_in_order() {
        let env = build_environment(
            Vec::<(String, String)>::new(),
            &[
                EnvOverride::replace("X", "1"),
                EnvOverride::prepend("X", "0", ","),
            ],
        );
        assert_eq!(env["X"], "0,1");
    }

    #[test]
    fn java_tmpdir_points_below_folder() {
        let o = EnvOverride::java_tmpdir(std::path::Path::new("/r/0-FastQC"));
        assert_eq!(o.name, "JAVA_TOOL_OPTIONS");
        assert_eq!(o.value, "-Djava.io.tmpdir=/r/0-FastQC/.tmp");
        assert_eq!(o.mode, EnvMode::Prepend);
    }
}
