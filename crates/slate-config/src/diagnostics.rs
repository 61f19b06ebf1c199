use serde::de::DeserializeOwned;

/// Diagnostics produced while loading a `slate.toml`.
///
/// Loading is best effort: callers always get a `SlateConfig` when deserialization succeeds,
/// plus whatever was ignored or adjusted along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the input that the schema does not know, as dotted paths
    /// (for example `editor.fontsize`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A numeric value was outside its supported range and has been clamped.
    ValueClamped {
        toml_path: String,
        value: u64,
        clamped: u64,
    },
    /// `logging.level` could not be parsed as a level or filter directive.
    LoggingLevelInvalid { value: String },
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(path.to_string().trim_start_matches('.').to_owned());
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn unknown_keys_use_dotted_paths() {
        #[derive(Debug, Deserialize)]
        struct Root {
            #[allow(dead_code)]
            #[serde(default)]
            editor: Editor,
        }

        #[derive(Debug, Default, Deserialize)]
        struct Editor {
            #[allow(dead_code)]
            #[serde(default)]
            tab_width: u32,
        }

        let text = r#"
colour = "blue"

[editor]
tab_width = 4
fontsize = 12
"#;

        let (_value, unknown) = deserialize_toml_with_unknown_keys::<Root>(text).expect("parse");
        assert_eq!(unknown, vec!["colour", "editor.fontsize"]);
    }
}
