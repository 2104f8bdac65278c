use std::collections::BTreeSet;
use std::io::Read;

use serde::Deserialize;

use super::catalog::CatalogError;
use super::domain::{Category, EvaluationItem, EvaluationType, ItemKey};

/// Row layout of an item catalog export: `key,question,category,evaluation_types,weight`.
#[derive(Debug, Deserialize)]
struct ItemRow {
    key: String,
    question: String,
    category: String,
    evaluation_types: String,
    #[serde(default)]
    weight: Option<f64>,
}

pub(crate) fn read_items<R: Read>(reader: R) -> Result<Vec<EvaluationItem>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();

    for row in csv_reader.deserialize::<ItemRow>() {
        items.push(row?.into_item()?);
    }

    Ok(items)
}

impl ItemRow {
    fn into_item(self) -> Result<EvaluationItem, CatalogError> {
        let category =
            Category::parse(&self.category).ok_or_else(|| CatalogError::UnknownCategory {
                key: self.key.clone(),
                value: self.category.clone(),
            })?;

        let mut evaluation_types = BTreeSet::new();
        for raw in self
            .evaluation_types
            .split(['|', ';'])
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        {
            let evaluation_type =
                EvaluationType::parse(raw).ok_or_else(|| CatalogError::UnknownEvaluationType {
                    key: self.key.clone(),
                    value: raw.to_string(),
                })?;
            evaluation_types.insert(evaluation_type);
        }

        Ok(EvaluationItem {
            key: ItemKey::new(self.key),
            question: self.question,
            category,
            evaluation_types,
            weight: self.weight,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ItemCatalog;
    use std::io::Cursor;

    const EXPORT: &str = "key,question,category,evaluation_types,weight\n\
        infection_control,Adheres to infection control,technical,weekly|monthly,0.5\n\
        punctuality,Arrives on time,Behavioral,weekly,\n\
        patient_comfort,Ensures patient comfort,care,monthly,0.5\n";

    #[test]
    fn reads_rows_with_optional_weights() {
        let items = read_items(Cursor::new(EXPORT)).expect("export parses");

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].evaluation_types.len(), 2);
        assert_eq!(items[1].category, Category::Behavioral);
        assert_eq!(items[1].weight, None);
        assert_eq!(items[2].weight, Some(0.5));
    }

    #[test]
    fn csv_catalog_validates_on_load() {
        let catalog = ItemCatalog::from_csv_reader(Cursor::new(EXPORT)).expect("catalog loads");
        assert_eq!(
            catalog.category_weight(EvaluationType::Monthly, Category::Care),
            Some(0.5)
        );
    }

    #[test]
    fn unknown_category_is_reported_with_its_key() {
        let export = "key,question,category,evaluation_types,weight\n\
            charting,Charts vitals,paperwork,weekly,\n";

        match read_items(Cursor::new(export)) {
            Err(CatalogError::UnknownCategory { key, value }) => {
                assert_eq!(key, "charting");
                assert_eq!(value, "paperwork");
            }
            other => panic!("expected unknown category, got {other:?}"),
        }
    }

    #[test]
    fn unknown_evaluation_type_is_rejected() {
        let export = "key,question,category,evaluation_types,weight\n\
            charting,Charts vitals,care,quarterly,\n";

        assert!(matches!(
            read_items(Cursor::new(export)),
            Err(CatalogError::UnknownEvaluationType { .. })
        ));
    }
}
