//! Configuration file discovery
//!
//! Walks a project directory and its ancestors looking for a
//! `weft.config.*` file, distinguishing a genuinely missing configuration
//! from one written in an unsupported format.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::settings::{CONFIG_BASE_NAME, SUPPORTED_EXTENSIONS, UNSUPPORTED_EXTENSIONS};

/// Outcome of a configuration file lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFileSearch {
    /// A loadable configuration file
    Found(PathBuf),
    /// A file with the right base name but a format the loader cannot read
    Unsupported(PathBuf),
    /// No configuration file anywhere up the tree
    NotFound,
}

/// Locate the configuration file for the project containing `dir`.
///
/// The supported extensions are checked through the whole ancestor chain
/// before any unsupported extension is considered, so a loadable file in a
/// parent directory wins over a misnamed file next to it.
pub fn find_config_file(dir: &Path) -> ConfigFileSearch {
    if let Some(path) = find_up(dir, &SUPPORTED_EXTENSIONS) {
        debug!("resolved configuration file: {}", path.display());
        return ConfigFileSearch::Found(path);
    }

    if let Some(path) = find_up(dir, &UNSUPPORTED_EXTENSIONS) {
        debug!(
            "found configuration file with unsupported extension: {}",
            path.display()
        );
        return ConfigFileSearch::Unsupported(path);
    }

    debug!("no configuration file found from {}", dir.display());
    ConfigFileSearch::NotFound
}

fn find_up(start: &Path, extensions: &[&str]) -> Option<PathBuf> {
    for dir in start.ancestors() {
        for ext in extensions {
            let candidate = dir.join(format!("{CONFIG_BASE_NAME}.{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_finds_config_in_start_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.config.toml");
        fs::write(&path, "").unwrap();

        assert_eq!(find_config_file(dir.path()), ConfigFileSearch::Found(path));
    }

    #[test]
    fn test_walks_up_to_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src").join("pages");
        fs::create_dir_all(&nested).unwrap();
        let path = dir.path().join("weft.config.json");
        fs::write(&path, "{}").unwrap();

        assert_eq!(find_config_file(&nested), ConfigFileSearch::Found(path));
    }

    #[test]
    fn test_toml_checked_before_json_in_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("weft.config.toml");
        fs::write(&toml_path, "").unwrap();
        fs::write(dir.path().join("weft.config.json"), "{}").unwrap();

        assert_eq!(
            find_config_file(dir.path()),
            ConfigFileSearch::Found(toml_path)
        );
    }

    #[test]
    fn test_supported_file_in_parent_beats_misnamed_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("app");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("weft.config.yaml"), "").unwrap();
        let good = dir.path().join("weft.config.toml");
        fs::write(&good, "").unwrap();

        assert_eq!(find_config_file(&nested), ConfigFileSearch::Found(good));
    }

    #[test]
    fn test_reports_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weft.config.yml");
        fs::write(&path, "").unwrap();

        assert_eq!(
            find_config_file(dir.path()),
            ConfigFileSearch::Unsupported(path)
        );
    }

    #[test]
    fn test_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("empty");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_file(&nested), ConfigFileSearch::NotFound);
    }
}
