use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::error::{artifact_error, AppError};

/// Maps classifier output indices to class names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

#[derive(Deserialize)]
struct LabelEncoderArtifact {
    classes: Option<Vec<String>>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, AppError> {
        if classes.is_empty() {
            return Err(artifact_error("label encoder has no classes"));
        }
        let mut seen = HashSet::new();
        for class in &classes {
            if !seen.insert(class.as_str()) {
                return Err(artifact_error(format!("label encoder repeats class '{}'", class)));
            }
        }
        Ok(Self { classes })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            artifact_error(format!("failed to read label encoder {}: {}", path.display(), e))
        })?;
        let artifact: LabelEncoderArtifact = serde_json::from_str(&content).map_err(|e| {
            artifact_error(format!("invalid label encoder {}: {}", path.display(), e))
        })?;
        let classes = artifact.classes.ok_or_else(|| {
            artifact_error(format!("label encoder {} has no class list", path.display()))
        })?;

        let encoder = Self::new(classes)?;
        info!("Loaded label encoder from {}: {:?}", path.display(), encoder.classes);
        Ok(encoder)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn decode(&self, index: usize) -> Result<&str, AppError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                AppError::ModelInference(format!(
                    "class index {} outside label encoder range 0..{}",
                    index,
                    self.classes.len()
                ))
            })
    }

    pub fn index_of(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn encoder() -> LabelEncoder {
        LabelEncoder::new(vec!["Diterima".into(), "Tidak Diterima".into()]).unwrap()
    }

    #[test]
    fn decodes_indices_in_order() {
        let le = encoder();
        assert_eq!(le.decode(0).unwrap(), "Diterima");
        assert_eq!(le.decode(1).unwrap(), "Tidak Diterima");
        assert_eq!(le.index_of("Tidak Diterima"), Some(1));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        assert!(matches!(encoder().decode(2), Err(AppError::ModelInference(_))));
    }

    #[test]
    fn rejects_empty_and_duplicate_classes() {
        assert!(LabelEncoder::new(vec![]).is_err());
        assert!(LabelEncoder::new(vec!["A".into(), "A".into()]).is_err());
    }

    #[test]
    fn artifact_without_class_list_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"version\": 1}}").unwrap();
        let err = LabelEncoder::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("no class list"));
    }

    #[test]
    fn loads_class_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"classes\": [\"Diterima\", \"Tidak Diterima\"]}}").unwrap();
        assert_eq!(LabelEncoder::load(file.path()).unwrap(), encoder());
    }
}
