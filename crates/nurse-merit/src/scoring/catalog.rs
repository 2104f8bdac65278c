use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::domain::{Category, EvaluationItem, EvaluationType, ItemKey};
use super::import;

/// Allowed drift when checking that category weights sum to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Validated rubric catalog with the category weight table derived from item weights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCatalog {
    items: BTreeMap<ItemKey, EvaluationItem>,
    weights: BTreeMap<EvaluationType, BTreeMap<Category, f64>>,
}

impl ItemCatalog {
    pub fn new(items: Vec<EvaluationItem>) -> Result<Self, CatalogError> {
        let mut by_key = BTreeMap::new();

        for item in items {
            if item.evaluation_types.is_empty() {
                return Err(CatalogError::NoEvaluationTypes(item.key));
            }
            if let Some(weight) = item.weight {
                if !weight.is_finite() || weight <= 0.0 || weight > 1.0 {
                    return Err(CatalogError::InvalidWeight {
                        key: item.key,
                        weight,
                    });
                }
            }
            match by_key.entry(item.key.clone()) {
                Entry::Occupied(_) => return Err(CatalogError::DuplicateItemKey(item.key)),
                Entry::Vacant(slot) => {
                    slot.insert(item);
                }
            }
        }

        let weights = derive_weights(&by_key)?;
        Ok(Self {
            items: by_key,
            weights,
        })
    }

    /// Catheterization-lab rubric used when no catalog file is configured.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(standard_items())
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        Self::new(import::read_items(reader)?)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn get(&self, key: &ItemKey) -> Option<&EvaluationItem> {
        self.items.get(key)
    }

    /// Look up an item only if it is part of the given evaluation type's rubric.
    pub fn item_for(
        &self,
        key: &ItemKey,
        evaluation_type: EvaluationType,
    ) -> Option<&EvaluationItem> {
        self.items
            .get(key)
            .filter(|item| item.applies_to(evaluation_type))
    }

    pub fn items(&self) -> impl Iterator<Item = &EvaluationItem> {
        self.items.values()
    }

    pub fn items_for(
        &self,
        evaluation_type: EvaluationType,
    ) -> impl Iterator<Item = &EvaluationItem> {
        self.items
            .values()
            .filter(move |item| item.applies_to(evaluation_type))
    }

    pub fn category_weights(
        &self,
        evaluation_type: EvaluationType,
    ) -> Option<&BTreeMap<Category, f64>> {
        self.weights.get(&evaluation_type)
    }

    pub fn category_weight(
        &self,
        evaluation_type: EvaluationType,
        category: Category,
    ) -> Option<f64> {
        self.weights
            .get(&evaluation_type)
            .and_then(|table| table.get(&category))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn derive_weights(
    items: &BTreeMap<ItemKey, EvaluationItem>,
) -> Result<BTreeMap<EvaluationType, BTreeMap<Category, f64>>, CatalogError> {
    let mut table = BTreeMap::new();

    for evaluation_type in EvaluationType::ALL
        .into_iter()
        .filter(EvaluationType::is_weighted)
    {
        let mut categories: BTreeMap<Category, f64> = BTreeMap::new();

        for item in items.values().filter(|item| item.applies_to(evaluation_type)) {
            let weight = item
                .weight
                .ok_or_else(|| CatalogError::MissingCategoryWeight {
                    key: item.key.clone(),
                    category: item.category,
                    evaluation_type,
                })?;

            match categories.entry(item.category) {
                Entry::Vacant(slot) => {
                    slot.insert(weight);
                }
                Entry::Occupied(slot) if (*slot.get() - weight).abs() > WEIGHT_TOLERANCE => {
                    return Err(CatalogError::InconsistentCategoryWeight {
                        key: item.key.clone(),
                        category: item.category,
                        expected: *slot.get(),
                        found: weight,
                    });
                }
                Entry::Occupied(_) => {}
            }
        }

        if categories.is_empty() {
            continue;
        }

        let total: f64 = categories.values().sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CatalogError::CategoryWeightsInvalid {
                evaluation_type,
                total,
            });
        }

        table.insert(evaluation_type, categories);
    }

    Ok(table)
}

/// Load-time failures for rubric catalogs.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate item key '{0}'")]
    DuplicateItemKey(ItemKey),
    #[error("item '{0}' does not apply to any evaluation type")]
    NoEvaluationTypes(ItemKey),
    #[error("item '{key}' has invalid weight {weight}")]
    InvalidWeight { key: ItemKey, weight: f64 },
    #[error("item '{key}' carries no {category} weight for {evaluation_type} evaluations")]
    MissingCategoryWeight {
        key: ItemKey,
        category: Category,
        evaluation_type: EvaluationType,
    },
    #[error("item '{key}' weighs {category} at {found} but {expected} was declared earlier")]
    InconsistentCategoryWeight {
        key: ItemKey,
        category: Category,
        expected: f64,
        found: f64,
    },
    #[error("{evaluation_type} category weights sum to {total:.4}, expected 1.0")]
    CategoryWeightsInvalid {
        evaluation_type: EvaluationType,
        total: f64,
    },
    #[error("row for '{key}' names unknown category '{value}'")]
    UnknownCategory { key: String, value: String },
    #[error("row for '{key}' names unknown evaluation type '{value}'")]
    UnknownEvaluationType { key: String, value: String },
    #[error("failed to read item catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid item catalog CSV: {0}")]
    Csv(#[from] csv::Error),
}

const TECHNICAL_WEIGHT: f64 = 0.3;
const BEHAVIORAL_WEIGHT: f64 = 0.3;
const CARE_WEIGHT: f64 = 0.3;
const INITIATIVE_WEIGHT: f64 = 0.1;

fn standard_items() -> Vec<EvaluationItem> {
    use Category::*;

    // (key, question, category, also scored weekly)
    #[rustfmt::skip]
    let rubric: [(&str, &str, Category, bool); 29] = [
        ("infection_control", "Adheres to infection control standards", Technical, true),
        ("cath_lab_preparation", "Prepares the catheterization room correctly", Technical, true),
        ("equipment_handling", "Handles devices and equipment safely", Technical, true),
        ("pre_procedure_safety", "Completes safety checks before the procedure", Technical, true),
        ("documentation_accuracy", "Documents accurately in medical records", Technical, true),
        ("cath_medications", "Knows catheterization drugs and their interactions", Technical, false),
        ("complex_case_assist", "Assists skillfully in complex cases", Technical, false),
        ("radiation_safety", "Handles radioactive materials safely", Technical, false),
        ("cpr_proficiency", "Masters cardiopulmonary resuscitation", Technical, false),
        ("uniform_appearance", "Wears the uniform and keeps a professional appearance", Behavioral, true),
        ("punctuality", "Arrives on time", Behavioral, true),
        ("team_communication", "Communicates effectively with the team", Behavioral, true),
        ("respect", "Respects patients and colleagues", Behavioral, false),
        ("confidentiality", "Keeps patient information confidential", Behavioral, false),
        ("works_under_pressure", "Works well under pressure", Behavioral, false),
        ("emergency_flexibility", "Adapts to emergency situations", Behavioral, false),
        ("professional_ethics", "Upholds professional ethics", Behavioral, false),
        ("psychological_support", "Provides psychological support to patients", Care, false),
        ("procedure_explanation", "Explains procedures to the patient clearly", Care, false),
        ("vital_signs_monitoring", "Monitors vital signs accurately", Care, false),
        ("emergency_response", "Responds quickly in emergencies", Care, true),
        ("post_procedure_care", "Cares for the patient after the procedure", Care, false),
        ("patient_concerns", "Handles patient concerns with sensitivity", Care, false),
        ("patient_comfort", "Ensures patient comfort during the procedure", Care, false),
        ("self_care_education", "Educates patients on self-care", Care, false),
        ("professional_development", "Takes part in professional development", Initiative, false),
        ("improvement_suggestions", "Suggests improvements at work", Initiative, false),
        ("helping_colleagues", "Takes the initiative to help colleagues", Initiative, false),
        ("research_participation", "Participates in research activities", Initiative, false),
    ];

    rubric
        .into_iter()
        .map(|(key, question, category, weekly)| {
            let mut evaluation_types = BTreeSet::from([EvaluationType::Monthly]);
            if weekly {
                evaluation_types.insert(EvaluationType::Weekly);
            }
            let weight = match category {
                Technical => TECHNICAL_WEIGHT,
                Behavioral => BEHAVIORAL_WEIGHT,
                Care => CARE_WEIGHT,
                Initiative => INITIATIVE_WEIGHT,
            };
            EvaluationItem {
                key: ItemKey::from(key),
                question: question.to_string(),
                category,
                evaluation_types,
                weight: Some(weight),
            }
        })
        .collect()
}
