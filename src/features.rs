use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    error::AppError,
    schema::FeatureSchema,
    types::{ApplicantCriteria, Criterion},
};

/// Numeric row in the exact column order of the feature schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Turns raw applicant answers into the classifier's input row.
pub struct FeatureEncoder<'a> {
    schema: &'a FeatureSchema,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn encode(&self, criteria: &ApplicantCriteria) -> Result<FeatureVector, AppError> {
        let mut features: HashMap<&str, f64> = HashMap::with_capacity(self.schema.len());

        self.encode_ordinal(criteria, &mut features)?;
        self.encode_one_hot(criteria, &mut features)?;

        // Columns nobody wrote (dropped baselines included) stay at zero.
        let values = self
            .schema
            .feature_names()
            .iter()
            .map(|name| features.get(name.as_str()).copied().unwrap_or(0.0))
            .collect::<Vec<_>>();

        debug!("Encoded applicant into {} features", values.len());

        Ok(FeatureVector {
            names: self.schema.shared_names(),
            values,
        })
    }

    fn encode_ordinal<'s>(
        &'s self,
        criteria: &ApplicantCriteria,
        features: &mut HashMap<&'s str, f64>,
    ) -> Result<(), AppError> {
        for field in &self.schema.layout().ordinal {
            let raw = criteria.value(field.criterion);
            let rank = field.rank_of(raw).ok_or_else(|| unknown_option(field.criterion, raw))?;
            features.insert(field.column.as_str(), rank as f64);
        }
        Ok(())
    }

    fn encode_one_hot<'s>(
        &'s self,
        criteria: &ApplicantCriteria,
        features: &mut HashMap<&'s str, f64>,
    ) -> Result<(), AppError> {
        for field in &self.schema.layout().one_hot {
            let raw = criteria.value(field.criterion);
            let options = self.schema.one_hot_options(field.criterion);
            if !options.iter().any(|o| o == raw) {
                return Err(unknown_option(field.criterion, raw));
            }

            for option in options {
                let column = format!("{}_{}", field.prefix, option);
                if let Some(index) = self.schema.column_index(&column) {
                    let name = self.schema.feature_names()[index].as_str();
                    features.insert(name, if option == raw { 1.0 } else { 0.0 });
                }
            }
        }
        Ok(())
    }
}

fn unknown_option(criterion: Criterion, raw: &str) -> AppError {
    AppError::ContractViolation(format!("'{}' is not a valid option for {}", raw, criterion))
}
