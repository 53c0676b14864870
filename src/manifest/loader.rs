//! Manifest loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::manifest::compile::{init_manifest_regexp, Manifest};
use crate::manifest::schema::RawManifest;

/// Error type for manifest loading.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid route regex: {0}")]
    Regex(#[from] regex::Error),
}

/// Read, parse and compile a route manifest.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    let raw = RawManifest::from_json(&content)?;
    let manifest = init_manifest_regexp(&raw)?;

    tracing::debug!(
        path = ?path,
        html = manifest.html_routes.len(),
        api = manifest.api_routes.len(),
        not_found = manifest.not_found_routes.len(),
        "Manifest compiled"
    );

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_manifest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"htmlRoutes":[{{"namedRegex":"^/(?:/)?$","routeKeys":{{}},"page":"/index"}}],"apiRoutes":[],"notFoundRoutes":[]}}"#
        )
        .unwrap();

        let manifest = load_manifest(file.path()).unwrap();
        assert_eq!(manifest.html_routes.len(), 1);
    }

    #[test]
    fn test_load_reports_error_kind() {
        let missing = load_manifest(Path::new("/definitely/not/here/routes.json"));
        assert!(matches!(missing, Err(ManifestError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(load_manifest(file.path()), Err(ManifestError::Parse(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"htmlRoutes":[{{"namedRegex":"^/(","routeKeys":{{}},"page":"/x"}}],"apiRoutes":[],"notFoundRoutes":[]}}"#
        )
        .unwrap();
        assert!(matches!(load_manifest(file.path()), Err(ManifestError::Regex(_))));
    }
}
