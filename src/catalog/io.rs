use log::debug;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::catalog::model::StringCatalog;
use crate::errors::CatalogError;

/// File extension of Apple string catalogs
pub const CATALOG_EXTENSION: &str = "xcstrings";

impl StringCatalog {
    /// Load a catalog from an `.xcstrings` file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CatalogError::NotFound(path.display().to_string()));
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(CATALOG_EXTENSION) {
            return Err(CatalogError::InvalidExtension(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        debug!("Loaded {} strings from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Parse catalog JSON
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize with 2-space indentation and sorted keys
    ///
    /// Localizations with neither a string unit nor variations are dropped.
    pub fn to_json_string(&self) -> Result<String, CatalogError> {
        let mut catalog = self.clone();
        catalog.prune_empty_localizations();
        Ok(serde_json::to_string_pretty(&catalog)?)
    }

    /// Write the catalog to `path` with a trailing newline
    ///
    /// The content goes to a temporary file in the target directory first,
    /// which then replaces `path`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), CatalogError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut content = self.to_json_string()?;
        content.push('\n');

        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;
        file.persist(path).map_err(|e| CatalogError::Io(e.error))?;

        debug!("Wrote {} strings to {}", self.len(), path.display());
        Ok(())
    }
}
