//! Feature schema: the ordered column list the classifier was trained on,
//! plus the layout describing how each criterion maps onto those columns.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::{artifact_error, AppError},
    types::Criterion,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalLevel {
    pub label: String,
    pub rank: i32,
}

/// Criterion encoded as a single integer-ranked column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalField {
    pub criterion: Criterion,
    pub column: String,
    pub levels: Vec<OrdinalLevel>,
}

impl OrdinalField {
    pub fn rank_of(&self, label: &str) -> Option<i32> {
        self.levels.iter().find(|l| l.label == label).map(|l| l.rank)
    }
}

/// Criterion encoded as `prefix_<value>` indicator columns, with `baseline`
/// dropped during training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotField {
    pub criterion: Criterion,
    pub prefix: String,
    pub baseline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingLayout {
    pub ordinal: Vec<OrdinalField>,
    pub one_hot: Vec<OneHotField>,
}

fn levels(pairs: &[(&str, i32)]) -> Vec<OrdinalLevel> {
    pairs
        .iter()
        .map(|(label, rank)| OrdinalLevel {
            label: label.to_string(),
            rank: *rank,
        })
        .collect()
}

impl Default for EncodingLayout {
    /// Layout the admission model was trained with.
    fn default() -> Self {
        Self {
            ordinal: vec![
                OrdinalField {
                    criterion: Criterion::ReportScore,
                    column: "Nilai_Rapor_Calistung_Encoded".to_string(),
                    levels: levels(&[("Rendah", 1), ("Sedang", 2), ("Tinggi", 3)]),
                },
                OrdinalField {
                    criterion: Criterion::Interview,
                    column: "Hasil_Wawancara_Encoded".to_string(),
                    levels: levels(&[("Kurang", 1), ("Cukup", 2), ("Baik", 3)]),
                },
                OrdinalField {
                    criterion: Criterion::Achievement,
                    column: "Prestasi_Non_Akademik_Encoded".to_string(),
                    levels: levels(&[("Ada", 1), ("Tidak Ada", 0)]),
                },
            ],
            one_hot: vec![
                OneHotField {
                    criterion: Criterion::HomeDistance,
                    prefix: "Jarak_Rumah".to_string(),
                    baseline: "Dekat".to_string(),
                },
                OneHotField {
                    criterion: Criterion::EconomicStatus,
                    prefix: "Status_Ekonomi".to_string(),
                    baseline: "Mampu".to_string(),
                },
                OneHotField {
                    criterion: Criterion::Siblings,
                    prefix: "Jumlah_Saudara".to_string(),
                    baseline: "Sedikit".to_string(),
                },
            ],
        }
    }
}

/// On-disk form of the schema. Older artifacts are a bare list of names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SchemaArtifact {
    Full {
        feature_names: Vec<String>,
        #[serde(default)]
        layout: Option<EncodingLayout>,
    },
    Names(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct FeatureSchema {
    feature_names: Arc<[String]>,
    index: HashMap<String, usize>,
    layout: EncodingLayout,
    one_hot_options: HashMap<Criterion, Vec<String>>,
}

impl FeatureSchema {
    pub fn new(feature_names: Vec<String>, layout: EncodingLayout) -> Result<Self, AppError> {
        if feature_names.is_empty() {
            return Err(artifact_error("feature name list is empty"));
        }

        let mut index = HashMap::with_capacity(feature_names.len());
        for (i, name) in feature_names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(artifact_error(format!("duplicate feature name '{}'", name)));
            }
        }

        validate_layout(&layout, &index)?;

        let feature_names: Arc<[String]> = feature_names.into();
        let one_hot_options = layout
            .one_hot
            .iter()
            .map(|field| {
                let options =
                    collect_options(&feature_names, &field.prefix, Some(&field.baseline));
                if options.len() < 2 {
                    warn!(
                        "One-hot field {} has no columns besides its baseline '{}'",
                        field.criterion, field.baseline
                    );
                }
                (field.criterion, options)
            })
            .collect();

        Ok(Self {
            feature_names,
            index,
            layout,
            one_hot_options,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            artifact_error(format!("failed to read feature schema {}: {}", path.display(), e))
        })?;
        let artifact: SchemaArtifact = serde_json::from_str(&content).map_err(|e| {
            artifact_error(format!("invalid feature schema {}: {}", path.display(), e))
        })?;

        let (feature_names, layout) = match artifact {
            SchemaArtifact::Full {
                feature_names,
                layout: Some(layout),
            } => (feature_names, layout),
            SchemaArtifact::Full {
                feature_names,
                layout: None,
            }
            | SchemaArtifact::Names(feature_names) => {
                warn!(
                    "Feature schema {} carries no encoding layout, assuming default baselines",
                    path.display()
                );
                (feature_names, EncodingLayout::default())
            }
        };

        let schema = Self::new(feature_names, layout)?;
        info!(
            "Loaded feature schema from {}: {} columns",
            path.display(),
            schema.len()
        );
        Ok(schema)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub(crate) fn shared_names(&self) -> Arc<[String]> {
        Arc::clone(&self.feature_names)
    }

    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn layout(&self) -> &EncodingLayout {
        &self.layout
    }

    pub fn ordinal(&self, criterion: Criterion) -> Option<&OrdinalField> {
        self.layout.ordinal.iter().find(|f| f.criterion == criterion)
    }

    pub fn one_hot(&self, criterion: Criterion) -> Option<&OneHotField> {
        self.layout.one_hot.iter().find(|f| f.criterion == criterion)
    }

    /// Display options for a one-hot prefix: every `prefix_<value>` suffix
    /// plus the field's baseline, sorted and deduplicated.
    pub fn options_for(&self, prefix: &str) -> Vec<String> {
        let baseline = self
            .layout
            .one_hot
            .iter()
            .find(|f| f.prefix == prefix)
            .map(|f| f.baseline.as_str());
        collect_options(&self.feature_names, prefix, baseline)
    }

    /// Options offered for a criterion. Ordinal levels keep their declared order.
    pub fn options(&self, criterion: Criterion) -> Vec<String> {
        if let Some(field) = self.ordinal(criterion) {
            return field.levels.iter().map(|l| l.label.clone()).collect();
        }
        self.one_hot(criterion)
            .map(|field| self.options_for(&field.prefix))
            .unwrap_or_default()
    }

    pub(crate) fn one_hot_options(&self, criterion: Criterion) -> &[String] {
        self.one_hot_options
            .get(&criterion)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn collect_options(
    feature_names: &[String],
    prefix: &str,
    baseline: Option<&str>,
) -> Vec<String> {
    let marker = format!("{}_", prefix);
    let mut set: BTreeSet<String> = feature_names
        .iter()
        .filter_map(|name| name.strip_prefix(&marker).map(str::to_string))
        .collect();
    set.extend(baseline.map(str::to_string));
    set.into_iter().collect()
}

fn validate_layout(
    layout: &EncodingLayout,
    index: &HashMap<String, usize>,
) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    let criteria = layout
        .ordinal
        .iter()
        .map(|f| f.criterion)
        .chain(layout.one_hot.iter().map(|f| f.criterion));
    for criterion in criteria {
        if !seen.insert(criterion) {
            return Err(artifact_error(format!(
                "criterion {} is encoded more than once",
                criterion
            )));
        }
    }
    for criterion in Criterion::ALL {
        if !seen.contains(&criterion) {
            return Err(artifact_error(format!("criterion {} has no encoding", criterion)));
        }
    }

    for field in &layout.ordinal {
        if field.levels.is_empty() {
            return Err(artifact_error(format!("ordinal field {} has no levels", field.criterion)));
        }
        let mut labels = HashSet::new();
        for level in &field.levels {
            if !labels.insert(level.label.as_str()) {
                return Err(artifact_error(format!(
                    "ordinal field {} repeats level '{}'",
                    field.criterion, level.label
                )));
            }
        }
        if !index.contains_key(&field.column) {
            return Err(artifact_error(format!(
                "encoded column '{}' for {} is not a model feature",
                field.column, field.criterion
            )));
        }
    }

    for field in &layout.one_hot {
        if field.prefix.is_empty() || field.baseline.is_empty() {
            return Err(artifact_error(format!(
                "one-hot field {} needs a prefix and a baseline",
                field.criterion
            )));
        }
        let baseline_column = format!("{}_{}", field.prefix, field.baseline);
        if index.contains_key(&baseline_column) {
            return Err(artifact_error(format!(
                "baseline '{}' for {} has its own column '{}'; it cannot be the dropped category",
                field.baseline, field.criterion, baseline_column
            )));
        }
    }

    validate_column_ownership(layout)
}

/// Every column must be written by exactly one field, or the encoder would
/// overwrite one field's value with another's.
fn validate_column_ownership(layout: &EncodingLayout) -> Result<(), AppError> {
    let mut columns = HashSet::new();
    for field in &layout.ordinal {
        if !columns.insert(field.column.as_str()) {
            return Err(artifact_error(format!(
                "encoded column '{}' is shared by more than one ordinal field",
                field.column
            )));
        }
    }

    for one_hot in &layout.one_hot {
        let marker = format!("{}_", one_hot.prefix);
        if let Some(field) = layout.ordinal.iter().find(|f| f.column.starts_with(&marker)) {
            return Err(artifact_error(format!(
                "encoded column '{}' for {} falls under one-hot prefix '{}'",
                field.column, field.criterion, one_hot.prefix
            )));
        }
        if let Some(other) = layout
            .one_hot
            .iter()
            .find(|o| o.criterion != one_hot.criterion && o.prefix.starts_with(&marker))
        {
            return Err(artifact_error(format!(
                "one-hot prefix '{}' for {} overlaps prefix '{}' for {}",
                other.prefix, other.criterion, one_hot.prefix, one_hot.criterion
            )));
        }
        if layout
            .one_hot
            .iter()
            .any(|o| o.criterion != one_hot.criterion && o.prefix == one_hot.prefix)
        {
            return Err(artifact_error(format!(
                "one-hot prefix '{}' is used by more than one field",
                one_hot.prefix
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Six-column schema with English labels throughout.
    pub(crate) fn english_schema() -> FeatureSchema {
        let names = [
            "ReportScore_Encoded",
            "Interview_Encoded",
            "Achievement_Encoded",
            "Jarak_Rumah_Far",
            "Status_Ekonomi_LessAble",
            "Jumlah_Saudara_Many",
        ];
        FeatureSchema::new(names.iter().map(|s| s.to_string()).collect(), english_layout()).unwrap()
    }

    pub(crate) fn english_layout() -> EncodingLayout {
        EncodingLayout {
            ordinal: vec![
                OrdinalField {
                    criterion: Criterion::ReportScore,
                    column: "ReportScore_Encoded".to_string(),
                    levels: levels(&[("Low", 1), ("Medium", 2), ("High", 3)]),
                },
                OrdinalField {
                    criterion: Criterion::Interview,
                    column: "Interview_Encoded".to_string(),
                    levels: levels(&[("Poor", 1), ("Fair", 2), ("Good", 3)]),
                },
                OrdinalField {
                    criterion: Criterion::Achievement,
                    column: "Achievement_Encoded".to_string(),
                    levels: levels(&[("Yes", 1), ("No", 0)]),
                },
            ],
            one_hot: vec![
                OneHotField {
                    criterion: Criterion::HomeDistance,
                    prefix: "Jarak_Rumah".to_string(),
                    baseline: "Near".to_string(),
                },
                OneHotField {
                    criterion: Criterion::EconomicStatus,
                    prefix: "Status_Ekonomi".to_string(),
                    baseline: "Able".to_string(),
                },
                OneHotField {
                    criterion: Criterion::Siblings,
                    prefix: "Jumlah_Saudara".to_string(),
                    baseline: "Few".to_string(),
                },
            ],
        }
    }

    /// Columns as produced by the training run.
    pub(crate) fn trained_names() -> Vec<String> {
        [
            "Nilai_Rapor_Calistung_Encoded",
            "Hasil_Wawancara_Encoded",
            "Prestasi_Non_Akademik_Encoded",
            "Jarak_Rumah_Jauh",
            "Status_Ekonomi_KurangMampu",
            "Jumlah_Saudara_Banyak",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub(crate) fn trained_schema() -> FeatureSchema {
        FeatureSchema::new(trained_names(), EncodingLayout::default()).unwrap()
    }
}
