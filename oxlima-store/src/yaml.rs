//! Configuration document I/O.
//!
//! An instance's declarative configuration is carried as an opaque
//! YAML document: this module loads, validates, and re-encodes it
//! without interpreting the full schema. The few keys the store core
//! needs (the backend tag) are read through accessors.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::{Result, StoreError};

/// Literal prefix delimiting a document inside a multi-document stream.
pub const DOCUMENT_START: &str = "---\n";

/// Literal suffix delimiting a document inside a multi-document stream.
pub const DOCUMENT_END: &str = "...\n";

/// Backend tag assumed when the document does not declare one.
pub const DEFAULT_VM_TYPE: &str = "qemu";

/// A loaded, validated configuration document.
///
/// The document is kept opaque: it round-trips through
/// [`ConfigDocument::save`] without semantic loss.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    path: PathBuf,
    value: Value,
}

impl ConfigDocument {
    /// Load and validate the configuration document at `path`.
    ///
    /// The path is resolved to an absolute path before reading because
    /// host socket locations may later be derived from it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let abs_path = std::path::absolute(path.as_ref())?;
        let content = std::fs::read(&abs_path)?;
        let doc = Self::parse(&content, abs_path)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Decode a document from raw bytes.
    ///
    /// An empty file is a decode error, not an empty document.
    pub fn parse(content: &[u8], path: PathBuf) -> Result<Self> {
        if content.is_empty() {
            return Err(StoreError::DocumentDecode("document is empty".to_string()));
        }
        let value: Value = serde_yaml::from_slice(content)
            .map_err(|e| StoreError::DocumentDecode(e.to_string()))?;
        if value.is_null() {
            return Err(StoreError::DocumentDecode("document is empty".to_string()));
        }
        Ok(Self { path, value })
    }

    /// Validate the decoded structure.
    ///
    /// Full schema validation is owned by the configuration layer; the
    /// store only requires the shape it depends on.
    pub fn validate(&self) -> Result<()> {
        if !self.value.is_mapping() {
            return Err(StoreError::DocumentInvalid(
                "top-level structure must be a mapping".to_string(),
            ));
        }
        if let Some(vm_type) = self.value.get("vmType") {
            if !vm_type.is_string() {
                return Err(StoreError::DocumentInvalid(
                    "vmType must be a string".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Encode the document, optionally as a self-delimited stream unit.
    ///
    /// With `stream` set, the output is wrapped with the literal
    /// `"---\n"` prefix and `"...\n"` suffix so several documents can
    /// be concatenated unambiguously. This never writes to disk; the
    /// caller persists the bytes.
    pub fn save(&self, stream: bool) -> Result<Vec<u8>> {
        let encoded = serde_yaml::to_string(&self.value)
            .map_err(|e| StoreError::DocumentEncode(e.to_string()))?;
        let bytes = if stream {
            format!("{DOCUMENT_START}{encoded}{DOCUMENT_END}").into_bytes()
        } else {
            encoded.into_bytes()
        };
        Ok(bytes)
    }

    /// The absolute path the document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The declared backend tag, defaulting to [`DEFAULT_VM_TYPE`].
    pub fn vm_type(&self) -> &str {
        self.value
            .get("vmType")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_VM_TYPE)
    }

    /// Access the underlying YAML value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "vmType: wsl2\ncpus: 4\nmemory: 4GiB\nmounts:\n- location: \"~\"\n";

    fn sample_doc() -> ConfigDocument {
        ConfigDocument::parse(SAMPLE.as_bytes(), PathBuf::from("/tmp/oxlima.yaml")).unwrap()
    }

    #[test]
    fn test_empty_document_is_decode_error() {
        let err = ConfigDocument::parse(b"", PathBuf::from("/tmp/x.yaml")).unwrap_err();
        assert!(matches!(err, StoreError::DocumentDecode(_)));

        // Whitespace-only decodes to null, which is also rejected.
        let err = ConfigDocument::parse(b"\n\n", PathBuf::from("/tmp/x.yaml")).unwrap_err();
        assert!(matches!(err, StoreError::DocumentDecode(_)));
    }

    #[test]
    fn test_malformed_document_is_decode_error() {
        let err = ConfigDocument::parse(b"{unclosed", PathBuf::from("/tmp/x.yaml")).unwrap_err();
        assert!(matches!(err, StoreError::DocumentDecode(_)));
    }

    #[test]
    fn test_non_mapping_is_validation_error() {
        let doc = ConfigDocument::parse(b"- a\n- b\n", PathBuf::from("/tmp/x.yaml")).unwrap();
        let err = doc.validate().unwrap_err();
        assert!(matches!(err, StoreError::DocumentInvalid(_)));
    }

    #[test]
    fn test_vm_type_must_be_string() {
        let doc = ConfigDocument::parse(b"vmType: 42\n", PathBuf::from("/tmp/x.yaml")).unwrap();
        let err = doc.validate().unwrap_err();
        assert!(matches!(err, StoreError::DocumentInvalid(_)));
    }

    #[test]
    fn test_vm_type_accessor() {
        assert_eq!(sample_doc().vm_type(), "wsl2");

        let doc = ConfigDocument::parse(b"cpus: 2\n", PathBuf::from("/tmp/x.yaml")).unwrap();
        assert_eq!(doc.vm_type(), DEFAULT_VM_TYPE);
    }

    #[test]
    fn test_save_round_trip() {
        let doc = sample_doc();
        let bytes = doc.save(false).unwrap();
        let reloaded = ConfigDocument::parse(&bytes, doc.path().to_path_buf()).unwrap();
        assert_eq!(doc.value(), reloaded.value());

        // Saving the reloaded document is idempotent.
        assert_eq!(bytes, reloaded.save(false).unwrap());
    }

    #[test]
    fn test_save_as_stream() {
        let doc = sample_doc();
        let plain = doc.save(false).unwrap();
        let stream = doc.save(true).unwrap();

        let text = String::from_utf8(stream).unwrap();
        assert!(text.starts_with(DOCUMENT_START));
        assert!(text.ends_with(DOCUMENT_END));

        let inner = &text[DOCUMENT_START.len()..text.len() - DOCUMENT_END.len()];
        assert_eq!(inner.as_bytes(), plain.as_slice());

        let reloaded = ConfigDocument::parse(inner.as_bytes(), doc.path().to_path_buf()).unwrap();
        assert_eq!(doc.value(), reloaded.value());
    }

    #[test]
    fn test_load_resolves_absolute_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("oxlima.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let doc = ConfigDocument::load(&path).unwrap();
        assert!(doc.path().is_absolute());
        assert_eq!(doc.vm_type(), "wsl2");
    }
}
