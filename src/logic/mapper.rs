//! Translation between middleware domain objects and API shapes.
//!
//! One [`OntologyMapper`] is built at start-up and shared through the
//! application state. Mapping functions leave `metadata.editable_fields` and
//! `metadata.deletable` at their defaults: those depend on the middleware's
//! reference check and are filled in by the services.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::model::{
    BrapiCategory, BrapiMethod, BrapiScale, BrapiTrait, BrapiValidValues, Category, CvId,
    DataType, DataTypeSummary, ExpectedRange, Metadata, Method, MethodDetails, MethodRequest,
    MethodSummary, ObservationVariable, Property, PropertyDetails, PropertyRequest,
    PropertySummary, Scale, ScaleDetails, ScaleRequest, ScaleSummary, Term, TermId,
    TermReference, TermSummary, ValidValues, Variable, VariableDetails, VariableInfo,
    VariableRequest, VariableSummary, VariableType, VariableTypeSummary,
};
use crate::model::safe_parse_f64;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, PartialEq)]
pub struct OntologyMapper {
    date_format: String,
}

impl Default for OntologyMapper {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

impl OntologyMapper {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    fn format_date(&self, date: Option<DateTime<Utc>>) -> Option<String> {
        date.map(|d| d.format(&self.date_format).to_string())
    }

    fn metadata(&self, created: Option<DateTime<Utc>>, modified: Option<DateTime<Utc>>) -> Metadata {
        Metadata {
            date_created: self.format_date(created),
            last_modified: self.format_date(modified),
            editable_fields: Vec::new(),
            deletable: false,
        }
    }

    fn term_reference(term: &Term) -> TermReference {
        TermReference {
            id: term.id.to_string(),
            name: term.name.clone(),
            description: term.definition.clone(),
        }
    }

    /// Build a term for the write side; blank descriptions become empty strings
    fn request_term(id: TermId, name: Option<&str>, description: Option<&str>, cv: CvId) -> Term {
        let mut term = Term::new(
            name.unwrap_or_default().trim(),
            description.unwrap_or_default().trim(),
            cv,
        );
        term.id = id;
        term
    }

    // Methods

    pub fn method_summary(&self, method: &Method) -> MethodSummary {
        MethodSummary {
            id: method.term.id.to_string(),
            name: method.term.name.clone(),
            description: method.term.definition.clone(),
        }
    }

    pub fn method_details(&self, method: &Method) -> MethodDetails {
        MethodDetails {
            id: method.term.id.to_string(),
            name: method.term.name.clone(),
            description: method.term.definition.clone(),
            metadata: self.metadata(method.date_created, method.date_last_modified),
        }
    }

    pub fn method_from_request(&self, id: TermId, request: &MethodRequest) -> Method {
        Method::new(Self::request_term(
            id,
            request.name.as_deref(),
            request.description.as_deref(),
            CvId::Methods,
        ))
    }

    // Properties

    pub fn property_summary(&self, property: &Property) -> PropertySummary {
        PropertySummary {
            id: property.term.id.to_string(),
            name: property.term.name.clone(),
            description: property.term.definition.clone(),
            crop_ontology_id: property.crop_ontology_id.clone(),
            classes: property.classes.clone(),
        }
    }

    pub fn property_details(&self, property: &Property) -> PropertyDetails {
        PropertyDetails {
            id: property.term.id.to_string(),
            name: property.term.name.clone(),
            description: property.term.definition.clone(),
            crop_ontology_id: property.crop_ontology_id.clone(),
            classes: property.classes.clone(),
            metadata: self.metadata(property.date_created, property.date_last_modified),
        }
    }

    pub fn property_from_request(&self, id: TermId, request: &PropertyRequest) -> Property {
        let mut property = Property::new(Self::request_term(
            id,
            request.name.as_deref(),
            request.description.as_deref(),
            CvId::Properties,
        ));
        property.crop_ontology_id = trimmed(request.crop_ontology_id.as_deref());
        property.classes = request
            .classes
            .iter()
            .flatten()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>();
        property
    }

    // Scales

    pub fn data_type_summary(&self, data_type: DataType) -> DataTypeSummary {
        DataTypeSummary {
            id: data_type.id().to_string(),
            name: data_type.name().to_string(),
        }
    }

    fn valid_values(scale: &Scale) -> ValidValues {
        ValidValues {
            min: scale.min_value.clone(),
            max: scale.max_value.clone(),
            categories: scale
                .categories
                .iter()
                .map(|c| Category::new(c.name.clone(), c.definition.clone()))
                .collect(),
        }
    }

    pub fn scale_summary(&self, scale: &Scale) -> ScaleSummary {
        ScaleSummary {
            id: scale.term.id.to_string(),
            name: scale.term.name.clone(),
            description: scale.term.definition.clone(),
            data_type: scale.data_type.map(|d| self.data_type_summary(d)),
            valid_values: Self::valid_values(scale),
        }
    }

    pub fn scale_details(&self, scale: &Scale) -> ScaleDetails {
        ScaleDetails {
            id: scale.term.id.to_string(),
            name: scale.term.name.clone(),
            description: scale.term.definition.clone(),
            data_type: scale.data_type.map(|d| self.data_type_summary(d)),
            valid_values: Self::valid_values(scale),
            metadata: self.metadata(scale.date_created, scale.date_last_modified),
        }
    }

    /// Build a scale from a validated request. Only the valid values the data
    /// type uses are kept: bounds for numeric, categories for categorical.
    pub fn scale_from_request(&self, id: TermId, request: &ScaleRequest) -> Scale {
        let mut scale = Scale::new(Self::request_term(
            id,
            request.name.as_deref(),
            request.description.as_deref(),
            CvId::Scales,
        ));
        scale.data_type = request
            .data_type
            .as_ref()
            .and_then(|d| d.id.trim().parse().ok())
            .and_then(DataType::from_id);

        let Some(valid_values) = request.valid_values.as_ref() else {
            return scale;
        };
        match scale.data_type {
            Some(DataType::Numeric) => {
                scale.min_value = trimmed(valid_values.min.as_deref());
                scale.max_value = trimmed(valid_values.max.as_deref());
            }
            Some(DataType::Categorical) => {
                scale.categories = valid_values
                    .categories
                    .iter()
                    .map(|c| TermSummary::new(c.name.trim(), c.description.trim()))
                    .collect();
            }
            _ => {}
        }
        scale
    }

    // Variables

    pub fn variable_type_summary(&self, variable_type: VariableType) -> VariableTypeSummary {
        VariableTypeSummary {
            id: variable_type.id().to_string(),
            name: variable_type.name().to_string(),
            description: variable_type.description().to_string(),
        }
    }

    fn expected_range(variable: &Variable) -> ExpectedRange {
        ExpectedRange {
            min: variable.min_value.clone(),
            max: variable.max_value.clone(),
        }
    }

    pub fn variable_summary(&self, variable: &Variable) -> VariableSummary {
        VariableSummary {
            id: variable.term.id.to_string(),
            name: variable.term.name.clone(),
            alias: variable.alias.clone(),
            description: variable.term.definition.clone(),
            property_summary: Self::term_reference(&variable.property.term),
            method_summary: Self::term_reference(&variable.method.term),
            scale_summary: Self::term_reference(&variable.scale.term),
            data_type: variable.scale.data_type.map(|d| self.data_type_summary(d)),
            variable_types: variable
                .variable_types
                .iter()
                .map(|t| self.variable_type_summary(*t))
                .collect(),
            favourite: variable.favourite,
            expected_range: Self::expected_range(variable),
        }
    }

    pub fn variable_details(&self, variable: &Variable) -> VariableDetails {
        VariableDetails {
            id: variable.term.id.to_string(),
            name: variable.term.name.clone(),
            alias: variable.alias.clone(),
            description: variable.term.definition.clone(),
            property: self.property_summary(&variable.property),
            method: self.method_summary(&variable.method),
            scale: self.scale_summary(&variable.scale),
            variable_types: variable
                .variable_types
                .iter()
                .map(|t| self.variable_type_summary(*t))
                .collect(),
            favourite: variable.favourite,
            expected_range: Self::expected_range(variable),
            metadata: self.metadata(variable.date_created, variable.date_last_modified),
        }
    }

    /// Build the write-side variable from a validated request. Ids that fail to
    /// parse map to 0, which validation has already ruled out.
    pub fn variable_from_request(
        &self,
        id: Option<TermId>,
        program_uuid: Option<String>,
        request: &VariableRequest,
    ) -> VariableInfo {
        let parse = |value: Option<&str>| value.and_then(|v| v.trim().parse().ok()).unwrap_or(0);
        let range = request.expected_range.clone().unwrap_or_default();

        VariableInfo {
            id,
            name: request.name.as_deref().unwrap_or_default().trim().to_string(),
            description: request.description.as_deref().unwrap_or_default().trim().to_string(),
            alias: trimmed(request.alias.as_deref()),
            method_id: parse(request.method_id.as_deref()),
            property_id: parse(request.property_id.as_deref()),
            scale_id: parse(request.scale_id.as_deref()),
            variable_types: request
                .variable_type_ids
                .iter()
                .flatten()
                .filter_map(|v| v.trim().parse().ok())
                .filter_map(VariableType::from_id)
                .collect(),
            min_value: trimmed(range.min.as_deref()),
            max_value: trimmed(range.max.as_deref()),
            favourite: request.favourite.unwrap_or(false),
            program_uuid,
        }
    }

    // BrAPI

    pub fn observation_variable(&self, variable: &Variable, crop: &str) -> ObservationVariable {
        let scale = &variable.scale;
        ObservationVariable {
            observation_variable_db_id: variable.term.id.to_string(),
            observation_variable_name: variable.term.name.clone(),
            name: variable.term.name.clone(),
            synonyms: variable.alias.iter().cloned().collect(),
            context_of_use: variable
                .variable_types
                .iter()
                .map(|t| t.name().to_string())
                .collect(),
            crop: crop.to_string(),
            trait_: BrapiTrait {
                trait_db_id: variable.property.term.id.to_string(),
                name: variable.property.term.name.clone(),
                description: variable.property.term.definition.clone(),
                class: variable.property.classes.iter().next().cloned(),
            },
            method: BrapiMethod {
                method_db_id: variable.method.term.id.to_string(),
                name: variable.method.term.name.clone(),
                description: variable.method.term.definition.clone(),
            },
            scale: BrapiScale {
                scale_db_id: scale.term.id.to_string(),
                name: scale.term.name.clone(),
                data_type: scale.data_type.map(|d| d.name().to_string()),
                valid_values: BrapiValidValues {
                    min: scale.min_value.as_deref().and_then(safe_parse_f64),
                    max: scale.max_value.as_deref().and_then(safe_parse_f64),
                    categories: scale
                        .categories
                        .iter()
                        .map(|c| BrapiCategory {
                            value: c.name.clone(),
                            label: c.definition.clone(),
                        })
                        .collect(),
                },
            },
            default_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn numeric_scale() -> Scale {
        let mut term = Term::new("cm", "Centimetres", CvId::Scales);
        term.id = 20010;
        let mut scale = Scale::new(term);
        scale.data_type = Some(DataType::Numeric);
        scale.min_value = Some("0".to_string());
        scale.max_value = Some("300".to_string());
        scale
    }

    fn categorical_scale() -> Scale {
        let mut term = Term::new("Score 1-3", "Visual score", CvId::Scales);
        term.id = 20011;
        let mut scale = Scale::new(term);
        scale.data_type = Some(DataType::Categorical);
        scale.categories = vec![
            TermSummary::new("1", "Low"),
            TermSummary::new("2", "Medium"),
            TermSummary::new("3", "High"),
        ];
        scale
    }

    #[test]
    fn test_numeric_scale_summary() {
        let mapper = OntologyMapper::default();
        let scale = numeric_scale();
        let summary = mapper.scale_summary(&scale);

        assert_eq!(summary.id, "20010");
        assert_eq!(summary.name, scale.term.name);
        assert_eq!(summary.description, scale.term.definition);
        assert_eq!(summary.valid_values.min.as_deref(), Some("0"));
        assert_eq!(summary.valid_values.max.as_deref(), Some("300"));
        assert!(summary.valid_values.categories.is_empty());
        assert_eq!(
            summary.data_type,
            Some(DataTypeSummary {
                id: "1110".to_string(),
                name: "Numeric".to_string()
            })
        );
    }

    #[test]
    fn test_categorical_scale_summary() {
        let mapper = OntologyMapper::default();
        let scale = categorical_scale();
        let summary = mapper.scale_summary(&scale);

        assert_eq!(summary.id, "20011");
        assert_eq!(summary.name, "Score 1-3");
        assert_eq!(summary.description, "Visual score");
        assert!(summary.valid_values.min.is_none());
        assert!(summary.valid_values.max.is_none());
        assert_eq!(summary.valid_values.categories.len(), scale.categories.len());
        for (category, term) in summary.valid_values.categories.iter().zip(&scale.categories) {
            assert_eq!(category.name, term.name);
            assert_eq!(category.description, term.definition);
        }
    }

    #[test]
    fn test_scale_from_request_keeps_only_relevant_values() {
        let mapper = OntologyMapper::default();
        let request = ScaleRequest {
            name: Some("  kg/ha ".to_string()),
            description: None,
            data_type: Some(DataTypeSummary {
                id: "1110".to_string(),
                name: String::new(),
            }),
            valid_values: Some(ValidValues {
                min: Some("0".to_string()),
                max: Some(" ".to_string()),
                categories: vec![Category::new("1", "ignored")],
            }),
        };

        let scale = mapper.scale_from_request(7, &request);
        assert_eq!(scale.term.id, 7);
        assert_eq!(scale.term.name, "kg/ha");
        assert_eq!(scale.term.definition, "");
        assert_eq!(scale.min_value.as_deref(), Some("0"));
        assert!(scale.max_value.is_none());
        assert!(scale.categories.is_empty());

        let mut request = request;
        request.data_type = Some(DataTypeSummary {
            id: "1130".to_string(),
            name: String::new(),
        });
        let scale = mapper.scale_from_request(7, &request);
        assert!(scale.min_value.is_none());
        assert_eq!(scale.categories, vec![TermSummary::new("1", "ignored")]);
    }

    #[test]
    fn test_details_leave_editability_to_caller() {
        let mapper = OntologyMapper::new("%Y-%m-%d");
        let mut method = Method::new(Term::new("Visual", "Visual assessment", CvId::Methods));
        method.term.id = 5;
        method.date_created = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single();

        let details = mapper.method_details(&method);
        assert_eq!(details.id, "5");
        assert_eq!(details.metadata.date_created.as_deref(), Some("2024-03-01"));
        assert!(details.metadata.last_modified.is_none());
        assert!(details.metadata.editable_fields.is_empty());
        assert!(!details.metadata.deletable);
    }

    #[test]
    fn test_variable_from_request() {
        let mapper = OntologyMapper::default();
        let request = VariableRequest {
            name: Some(" PH_cm ".to_string()),
            description: None,
            alias: Some("  ".to_string()),
            property_id: Some("1".to_string()),
            method_id: Some("2".to_string()),
            scale_id: Some("3".to_string()),
            variable_type_ids: Some(vec!["1808".to_string(), "1808".to_string(), "1811".to_string()]),
            expected_range: Some(ExpectedRange {
                min: Some("5".to_string()),
                max: None,
            }),
            favourite: Some(true),
        };

        let info = mapper.variable_from_request(None, Some("p1".to_string()), &request);
        assert_eq!(info.name, "PH_cm");
        assert!(info.alias.is_none());
        assert_eq!((info.property_id, info.method_id, info.scale_id), (1, 2, 3));
        assert_eq!(info.variable_types.len(), 2);
        assert_eq!(info.min_value.as_deref(), Some("5"));
        assert!(info.favourite);
        assert_eq!(info.program_uuid.as_deref(), Some("p1"));
    }
}
