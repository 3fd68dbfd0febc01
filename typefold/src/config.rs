use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{CONFIG_FILE_NAME, MANIFEST_FILE_NAME};

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section for typefold.
    pub typefold: TypefoldConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults.
    #[serde(skip)]
    pub config_file_path: Option<std::path::PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Configuration options for typefold.
pub struct TypefoldConfig {
    /// List of folders to exclude from the walk.
    pub exclude_folders: Option<Vec<String>>,
    /// File extensions to process.
    pub extensions: Option<Vec<String>>,
    /// Whether to process only files carrying the generated-code banner.
    pub generated_only: Option<bool>,
    /// Module path prefix for injected import statements.
    pub import_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
struct CargoManifest {
    package: PackageSection,
}

#[derive(Debug, Deserialize, Clone)]
struct PackageSection {
    metadata: MetadataSection,
}

#[derive(Debug, Deserialize, Clone)]
struct MetadataSection {
    typefold: TypefoldConfig,
}

impl Config {
    /// Loads configuration from the current directory upward.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read
    /// or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// At each level a `.typefold.toml` wins; a `Cargo.toml` carrying a
    /// `[package.metadata.typefold]` section is the fallback. Manifests
    /// without the section are skipped silently.
    ///
    /// # Errors
    ///
    /// A `.typefold.toml` that exists but cannot be read or parsed is an
    /// error naming its path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let typefold_toml = current.join(CONFIG_FILE_NAME);
            if typefold_toml.exists() {
                let content = fs::read_to_string(&typefold_toml)
                    .with_context(|| format!("cannot read {}", typefold_toml.display()))?;
                let mut config: Config = toml::from_str(&content).with_context(|| {
                    format!("malformed configuration in {}", typefold_toml.display())
                })?;
                config.config_file_path = Some(typefold_toml);
                return Ok(config);
            }

            let manifest = current.join(MANIFEST_FILE_NAME);
            if manifest.exists() {
                if let Ok(content) = fs::read_to_string(&manifest) {
                    if let Ok(parsed) = toml::from_str::<CargoManifest>(&content) {
                        return Ok(Self {
                            typefold: parsed.package.metadata.typefold,
                            config_file_path: Some(manifest),
                        });
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_path_no_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path()).unwrap();
        assert!(config.typefold.exclude_folders.is_none());
        assert!(config.typefold.import_prefix.is_none());
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_load_from_path_typefold_toml() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(".typefold.toml")).unwrap();
        writeln!(
            file,
            r#"[typefold]
exclude_folders = ["fixtures"]
import_prefix = "crate::generated"
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path()).unwrap();
        assert_eq!(
            config.typefold.exclude_folders,
            Some(vec!["fixtures".to_owned()])
        );
        assert_eq!(
            config.typefold.import_prefix.as_deref(),
            Some("crate::generated")
        );
        assert!(config
            .config_file_path
            .unwrap()
            .ends_with(".typefold.toml"));
    }

    #[test]
    fn test_load_from_path_malformed_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".typefold.toml"), "[typefold\nbroken").unwrap();

        let err = Config::load_from_path(dir.path()).unwrap_err();
        assert!(err.to_string().contains(".typefold.toml"));
    }

    #[test]
    fn test_load_from_path_cargo_metadata() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("Cargo.toml")).unwrap();
        writeln!(
            file,
            r#"[package]
name = "demo"
version = "0.1.0"

[package.metadata.typefold]
generated_only = true
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path()).unwrap();
        assert_eq!(config.typefold.generated_only, Some(true));
    }

    #[test]
    fn test_manifest_without_section_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("Cargo.toml")).unwrap();
        writeln!(
            file,
            r#"[package]
name = "demo"
version = "0.1.0"
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path()).unwrap();
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_typefold_toml_wins_over_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".typefold.toml"),
            "[typefold]\ngenerated_only = false\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n\n[package.metadata.typefold]\ngenerated_only = true\n",
        )
        .unwrap();

        let config = Config::load_from_path(dir.path()).unwrap();
        assert_eq!(config.typefold.generated_only, Some(false));
    }

    #[test]
    fn test_load_from_path_traverses_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src").join("resources");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(
            dir.path().join(".typefold.toml"),
            "[typefold]\nextensions = [\"rs\", \"rs.in\"]\n",
        )
        .unwrap();

        let config = Config::load_from_path(&nested).unwrap();
        assert_eq!(
            config.typefold.extensions,
            Some(vec!["rs".to_owned(), "rs.in".to_owned()])
        );
    }

    #[test]
    fn test_load_from_file_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".typefold.toml"),
            "[typefold]\ngenerated_only = true\n",
        )
        .unwrap();
        let rs_file = dir.path().join("account.rs");
        std::fs::write(&rs_file, "pub struct Account {\n    pub id: i64,\n}\n").unwrap();

        let config = Config::load_from_path(&rs_file).unwrap();
        assert_eq!(config.typefold.generated_only, Some(true));
    }
}
