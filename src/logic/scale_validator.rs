//! Add/update rules for scales.
//!
//! 1. Name is required
//! 2. Name is no more than 200 characters
//! 3. Name is unique among scales
//! 4. Description is no more than 255 characters
//! 5. Data type is required
//! 6. Data type must be one of the known data type ids
//! 7. A categorical scale needs at least one category
//! 8. Categories are only kept for categorical scales
//! 9. Minimum and maximum are only kept for numeric scales
//! 10. When both are present, minimum must not exceed maximum
//! 11. Category names are unique within the scale
//! 12. Category descriptions are unique within the scale
//! 13. Name, data type and valid values are frozen once the scale is in use
//!
//! Rules 8 and 9 are applied by the service when it builds the domain scale.

use anyhow::Result;
use itertools::Itertools;
use std::collections::{BTreeSet, HashSet};

use crate::logic::ontology_validator::{validate_description, validate_name, OntologyValidator};
use crate::logic::validation::{
    check_length, parse_id, should_not_null_or_empty, ErrorCode, Errors, ValidationOutcome,
    DESCRIPTION_MAX_LENGTH, NAME_MAX_LENGTH,
};
use crate::model::{bounds_equal, safe_parse_f64, CvId, DataType, Scale, ScaleRequest, TermId, ValidValues};
use crate::store::traits::{ScaleStore, TermStore};

const TERM: &str = "scale";

pub struct ScaleValidator;

impl ScaleValidator {
    pub async fn validate<S: TermStore + ScaleStore>(
        store: &S,
        id: Option<&str>,
        request: &ScaleRequest,
    ) -> Result<ValidationOutcome> {
        let mut errors = Errors::new();

        let mut scale_id = None;
        if let Some(raw_id) = id {
            if !errors.merge(OntologyValidator::validate_id(store, raw_id, CvId::Scales).await?) {
                return Ok(errors.into_outcome());
            }
            scale_id = parse_id(raw_id);
        }

        let name_valid =
            errors.merge(validate_name(store, scale_id, request.name.as_deref(), CvId::Scales, TERM).await?);
        errors.merge(validate_description(TERM, request.description.as_deref()));

        let (data_type_errors, data_type) = Self::validate_data_type(request);
        let data_type_valid = errors.merge(data_type_errors);

        let empty = ValidValues::default();
        let valid_values = request.valid_values.as_ref().unwrap_or(&empty);
        match data_type {
            Some(DataType::Categorical) => {
                errors.merge(Self::validate_categories(valid_values));
            }
            Some(DataType::Numeric) => {
                errors.merge(Self::validate_range(valid_values));
            }
            _ => {}
        }

        // Description and valid-value failures must not hide the lock
        if let Some(scale_id) = scale_id.filter(|_| name_valid && data_type_valid) {
            errors.merge(Self::validate_editable(store, scale_id, request, data_type).await?);
        }

        Ok(errors.into_outcome())
    }

    fn validate_data_type(request: &ScaleRequest) -> (Errors, Option<DataType>) {
        let mut errors = Errors::new();
        let raw_id = request.data_type.as_ref().map(|d| d.id.as_str());

        if !should_not_null_or_empty(TERM, "dataType", &raw_id.map(str::to_string), &mut errors) {
            return (errors, None);
        }

        let raw_id = raw_id.unwrap_or_default();
        let data_type = parse_id(raw_id).and_then(DataType::from_id);
        if data_type.is_none() {
            errors.add_custom_error("dataType", ErrorCode::InvalidDataType, &[raw_id.trim()]);
        }
        (errors, data_type)
    }

    fn validate_categories(valid_values: &ValidValues) -> Errors {
        let mut errors = Errors::new();
        if valid_values.categories.is_empty() {
            errors.add_custom_error("validValues.categories", ErrorCode::CategoriesRequired, &[]);
            return errors;
        }

        let mut names = HashSet::new();
        let mut descriptions = HashSet::new();

        for (index, category) in valid_values.categories.iter().enumerate() {
            let name_field = format!("validValues.categories[{}].name", index);
            let description_field = format!("validValues.categories[{}].description", index);

            let name = category.name.trim();
            if should_not_null_or_empty("category", &name_field, name, &mut errors)
                && check_length("category", &name_field, name, NAME_MAX_LENGTH, &mut errors)
                && !names.insert(name)
            {
                errors.add_custom_error(name_field, ErrorCode::CategoryNameDuplicate, &[name]);
            }

            let description = category.description.trim();
            if should_not_null_or_empty("category", &description_field, description, &mut errors)
                && check_length("category", &description_field, description, DESCRIPTION_MAX_LENGTH, &mut errors)
                && !descriptions.insert(description)
            {
                errors.add_custom_error(description_field, ErrorCode::CategoryDescriptionDuplicate, &[description]);
            }
        }
        errors
    }

    fn validate_range(valid_values: &ValidValues) -> Errors {
        let mut errors = Errors::new();
        let min = Self::numeric_bound("validValues.min", "minimum", valid_values.min.as_deref(), &mut errors);
        let max = Self::numeric_bound("validValues.max", "maximum", valid_values.max.as_deref(), &mut errors);

        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                errors.add_custom_error("validValues", ErrorCode::MinMaxNotValid, &[]);
            }
        }
        errors
    }

    /// Parse an optional bound; blank counts as absent
    fn numeric_bound(field: &str, label: &str, value: Option<&str>, errors: &mut Errors) -> Option<f64> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        let parsed = safe_parse_f64(value);
        if parsed.is_none() {
            errors.add_custom_error(field, ErrorCode::ValueShouldBeNumeric, &[label, value]);
        }
        parsed
    }

    async fn validate_editable<S: TermStore + ScaleStore>(
        store: &S,
        scale_id: TermId,
        request: &ScaleRequest,
        data_type: Option<DataType>,
    ) -> Result<Errors> {
        let mut errors = Errors::new();
        if !store.is_term_referred(scale_id).await? {
            return Ok(errors);
        }
        let Some(existing) = store.get_scale(scale_id).await? else {
            return Ok(errors);
        };

        let name = request.name.as_deref().unwrap_or_default().trim();
        if existing.term.name.trim() != name {
            errors.add_custom_error("name", ErrorCode::RecordIsNotEditable, &[TERM, "name"]);
        }
        if existing.data_type != data_type {
            errors.add_custom_error("dataType", ErrorCode::RecordIsNotEditable, &[TERM, "dataType"]);
        }

        let empty = ValidValues::default();
        let valid_values = request.valid_values.as_ref().unwrap_or(&empty);
        if !valid_values_unchanged(&existing, valid_values, data_type) {
            errors.add_custom_error("validValues", ErrorCode::RecordIsNotEditable, &[TERM, "validValues"]);
        }
        Ok(errors)
    }
}

/// Compare requested valid values with a persisted scale, looking only at the
/// part of the valid values the data type keeps
fn valid_values_unchanged(existing: &Scale, requested: &ValidValues, data_type: Option<DataType>) -> bool {
    match data_type {
        Some(DataType::Numeric) => {
            bounds_equal(existing.min_value.as_deref(), requested.min.as_deref())
                && bounds_equal(existing.max_value.as_deref(), requested.max.as_deref())
        }
        Some(DataType::Categorical) => {
            let persisted: BTreeSet<(&str, &str)> = existing
                .categories
                .iter()
                .map(|c| (c.name.trim(), c.definition.trim()))
                .collect();
            let requested: BTreeSet<(&str, &str)> = requested
                .categories
                .iter()
                .map(|c| (c.name.trim(), c.description.trim()))
                .collect();
            if persisted != requested {
                log::debug!(
                    "Category set changed: [{}] -> [{}]",
                    persisted.iter().map(|(n, _)| n).join(", "),
                    requested.iter().map(|(n, _)| n).join(", ")
                );
            }
            persisted == requested
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Category, DataTypeSummary, Method, Property, Term, TermSummary, VariableInfo, VariableType,
    };
    use crate::store::memory::InMemoryMiddleware;
    use crate::store::traits::{MethodStore, PropertyStore, VariableStore};

    fn numeric_request(name: &str, min: Option<&str>, max: Option<&str>) -> ScaleRequest {
        ScaleRequest {
            name: Some(name.to_string()),
            description: Some("Numeric scale".to_string()),
            data_type: Some(DataTypeSummary {
                id: DataType::Numeric.id().to_string(),
                name: "Numeric".to_string(),
            }),
            valid_values: Some(ValidValues {
                min: min.map(str::to_string),
                max: max.map(str::to_string),
                categories: Vec::new(),
            }),
        }
    }

    fn categorical_request(name: &str, categories: &[(&str, &str)]) -> ScaleRequest {
        ScaleRequest {
            name: Some(name.to_string()),
            description: None,
            data_type: Some(DataTypeSummary {
                id: DataType::Categorical.id().to_string(),
                name: "Categorical".to_string(),
            }),
            valid_values: Some(ValidValues {
                min: None,
                max: None,
                categories: categories.iter().map(|(n, d)| Category::new(*n, *d)).collect(),
            }),
        }
    }

    /// Persist a scale and put it into use through a variable
    async fn referenced_scale(store: &InMemoryMiddleware, scale: Scale) -> TermId {
        let scale = store.add_scale(scale).await.unwrap();
        let method = store
            .add_method(Method::new(Term::new("Measured", "", CvId::Methods)))
            .await
            .unwrap();
        let property = store
            .add_property(Property::new(Term::new("Height", "", CvId::Properties)))
            .await
            .unwrap();
        store
            .add_variable(VariableInfo {
                id: None,
                name: "Height_var".to_string(),
                description: String::new(),
                alias: None,
                method_id: method.term.id,
                property_id: property.term.id,
                scale_id: scale.term.id,
                variable_types: [VariableType::Trait].into_iter().collect(),
                min_value: None,
                max_value: None,
                favourite: false,
                program_uuid: None,
            })
            .await
            .unwrap();
        scale.term.id
    }

    fn numeric_scale(name: &str, min: &str, max: &str) -> Scale {
        let mut scale = Scale::new(Term::new(name, "Numeric scale", CvId::Scales));
        scale.data_type = Some(DataType::Numeric);
        scale.min_value = Some(min.to_string());
        scale.max_value = Some(max.to_string());
        scale
    }

    #[tokio::test]
    async fn test_required_fields() {
        let store = InMemoryMiddleware::new(vec![]);
        let outcome = ScaleValidator::validate(&store, None, &ScaleRequest::default())
            .await
            .unwrap();
        assert!(outcome.has_error("name", ErrorCode::FieldIsRequired));
        assert!(outcome.has_error("dataType", ErrorCode::FieldIsRequired));
    }

    #[tokio::test]
    async fn test_unknown_data_type() {
        let store = InMemoryMiddleware::new(vec![]);
        let mut request = numeric_request("cm", None, None);
        request.data_type = Some(DataTypeSummary {
            id: "9999".to_string(),
            name: String::new(),
        });
        let outcome = ScaleValidator::validate(&store, None, &request).await.unwrap();
        assert!(outcome.has_error("dataType", ErrorCode::InvalidDataType));

        request.data_type = Some(DataTypeSummary {
            id: "numeric".to_string(),
            name: String::new(),
        });
        let outcome = ScaleValidator::validate(&store, None, &request).await.unwrap();
        assert!(outcome.has_error("dataType", ErrorCode::InvalidDataType));
    }

    #[tokio::test]
    async fn test_min_max_rules() {
        let store = InMemoryMiddleware::new(vec![]);

        let outcome = ScaleValidator::validate(&store, None, &numeric_request("cm", Some("10"), Some("5")))
            .await
            .unwrap();
        assert!(outcome.has_error("validValues", ErrorCode::MinMaxNotValid));

        let outcome = ScaleValidator::validate(&store, None, &numeric_request("cm", Some("5"), Some("5")))
            .await
            .unwrap();
        assert!(outcome.is_valid());

        let outcome = ScaleValidator::validate(&store, None, &numeric_request("cm", Some("low"), None))
            .await
            .unwrap();
        assert!(outcome.has_error("validValues.min", ErrorCode::ValueShouldBeNumeric));

        let outcome = ScaleValidator::validate(&store, None, &numeric_request("cm", None, Some("100")))
            .await
            .unwrap();
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn test_categorical_rules() {
        let store = InMemoryMiddleware::new(vec![]);

        let outcome = ScaleValidator::validate(&store, None, &categorical_request("Score", &[]))
            .await
            .unwrap();
        assert!(outcome.has_error("validValues.categories", ErrorCode::CategoriesRequired));

        let outcome = ScaleValidator::validate(
            &store,
            None,
            &categorical_request("Score", &[("1", "Low"), (" 1 ", "High")]),
        )
        .await
        .unwrap();
        assert!(outcome.has_error("validValues.categories[1].name", ErrorCode::CategoryNameDuplicate));
        assert!(!outcome.has_error("validValues.categories[0].name", ErrorCode::CategoryNameDuplicate));

        let outcome = ScaleValidator::validate(
            &store,
            None,
            &categorical_request("Score", &[("1", "Low"), ("2", "Low")]),
        )
        .await
        .unwrap();
        assert!(outcome.has_error(
            "validValues.categories[1].description",
            ErrorCode::CategoryDescriptionDuplicate
        ));
        assert_eq!(outcome.errors().len(), 1);

        // Case-sensitive: "a" and "A" are different categories
        let outcome = ScaleValidator::validate(
            &store,
            None,
            &categorical_request("Score", &[("a", "Lower"), ("A", "Upper")]),
        )
        .await
        .unwrap();
        assert!(outcome.is_valid());

        let outcome = ScaleValidator::validate(&store, None, &categorical_request("Score", &[("1", "")]))
            .await
            .unwrap();
        assert!(outcome.has_error("validValues.categories[0].description", ErrorCode::FieldIsRequired));
    }

    #[tokio::test]
    async fn test_referenced_numeric_scale_is_frozen() {
        let store = InMemoryMiddleware::new(vec![]);
        let id = referenced_scale(&store, numeric_scale("cm", "0", "300")).await.to_string();

        // Unchanged, with only representation drift and a new description
        let mut request = numeric_request("cm", Some("0.0"), Some("300.00"));
        request.description = Some("Centimetres".to_string());
        let outcome = ScaleValidator::validate(&store, Some(&id), &request).await.unwrap();
        assert!(outcome.is_valid(), "{:?}", outcome);

        let outcome = ScaleValidator::validate(&store, Some(&id), &numeric_request("mm", Some("0"), Some("300")))
            .await
            .unwrap();
        assert!(outcome.has_error("name", ErrorCode::RecordIsNotEditable));
        assert_eq!(outcome.errors().len(), 1);

        let outcome = ScaleValidator::validate(&store, Some(&id), &numeric_request("cm", Some("0"), Some("250")))
            .await
            .unwrap();
        assert!(outcome.has_error("validValues", ErrorCode::RecordIsNotEditable));

        let outcome = ScaleValidator::validate(
            &store,
            Some(&id),
            &categorical_request("cm", &[("1", "one")]),
        )
        .await
        .unwrap();
        assert!(outcome.has_error("dataType", ErrorCode::RecordIsNotEditable));
        assert!(outcome.has_error("validValues", ErrorCode::RecordIsNotEditable));
    }

    #[tokio::test]
    async fn test_unrelated_errors_do_not_hide_frozen_fields() {
        let store = InMemoryMiddleware::new(vec![]);
        let id = referenced_scale(&store, numeric_scale("cm", "0", "500")).await.to_string();

        let mut request = numeric_request("renamed", Some("0"), Some("9999"));
        request.description = Some("d".repeat(300));
        let outcome = ScaleValidator::validate(&store, Some(&id), &request).await.unwrap();
        assert!(outcome.has_error("description", ErrorCode::TextualFieldLengthExceeded));
        assert!(outcome.has_error("name", ErrorCode::RecordIsNotEditable));
        assert!(outcome.has_error("validValues", ErrorCode::RecordIsNotEditable));

        let outcome = ScaleValidator::validate(&store, Some(&id), &numeric_request("cm", Some("600"), Some("10")))
            .await
            .unwrap();
        assert!(outcome.has_error("validValues", ErrorCode::MinMaxNotValid));
        assert!(outcome.has_error("validValues", ErrorCode::RecordIsNotEditable));
    }

    #[tokio::test]
    async fn test_referenced_categorical_scale_compares_category_sets() {
        let store = InMemoryMiddleware::new(vec![]);
        let mut scale = Scale::new(Term::new("Score", "", CvId::Scales));
        scale.data_type = Some(DataType::Categorical);
        scale.categories = vec![TermSummary::new("1", "Low"), TermSummary::new("2", "High")];
        let id = referenced_scale(&store, scale).await.to_string();

        // Order does not matter
        let outcome = ScaleValidator::validate(
            &store,
            Some(&id),
            &categorical_request("Score", &[("2", "High"), ("1", "Low")]),
        )
        .await
        .unwrap();
        assert!(outcome.is_valid());

        let outcome = ScaleValidator::validate(
            &store,
            Some(&id),
            &categorical_request("Score", &[("1", "Low"), ("2", "Very high")]),
        )
        .await
        .unwrap();
        assert!(outcome.has_error("validValues", ErrorCode::RecordIsNotEditable));
    }

    #[tokio::test]
    async fn test_unreferenced_scale_is_editable() {
        let store = InMemoryMiddleware::new(vec![]);
        let scale = store.add_scale(numeric_scale("cm", "0", "300")).await.unwrap();
        let id = scale.term.id.to_string();

        let outcome = ScaleValidator::validate(&store, Some(&id), &numeric_request("mm", Some("0"), Some("3000")))
            .await
            .unwrap();
        assert!(outcome.is_valid());
    }
}
