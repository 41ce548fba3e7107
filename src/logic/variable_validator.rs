use anyhow::Result;
use itertools::Itertools;
use regex::Regex;
use std::sync::OnceLock;

use crate::logic::ontology_validator::{validate_description, OntologyValidator};
use crate::logic::validation::{
    check_length, check_number_field, parse_id, should_not_null_or_empty, ErrorCode, Errors,
    ValidationOutcome,
};
use crate::model::{
    safe_parse_f64, CvId, Scale, TermId, VariableFilter, VariableRequest, VariableType,
};
use crate::store::traits::Middleware;

const TERM: &str = "variable";
pub const VARIABLE_NAME_MAX_LENGTH: usize = 32;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z_%][a-zA-Z_0-9%]*$").expect("identifier pattern is valid"))
}

/// Add/update rules for variables.
///
/// Name and alias are short identifiers; property, method and scale must exist
/// and their combination must not already be taken by another variable; at
/// least one known variable type; the expected range is only allowed on a
/// numeric scale and must sit inside the scale's own range. A variable in use
/// keeps its name, property, method and scale.
pub struct VariableValidator;

impl VariableValidator {
    pub async fn validate<S: Middleware>(
        store: &S,
        id: Option<&str>,
        request: &VariableRequest,
    ) -> Result<ValidationOutcome> {
        let mut errors = Errors::new();

        let mut variable_id = None;
        if let Some(raw_id) = id {
            if !errors.merge(OntologyValidator::validate_id(store, raw_id, CvId::Variables).await?) {
                return Ok(errors.into_outcome());
            }
            variable_id = parse_id(raw_id);
        }

        let name_valid = errors.merge(Self::validate_name(store, variable_id, request.name.as_deref()).await?);
        errors.merge(Self::validate_alias(request.alias.as_deref()));
        errors.merge(validate_description(TERM, request.description.as_deref()));

        let (reference_errors, property_id) =
            Self::validate_reference(store, "propertyId", request.property_id.as_deref(), CvId::Properties).await?;
        let mut references_valid = errors.merge(reference_errors);
        let (reference_errors, method_id) =
            Self::validate_reference(store, "methodId", request.method_id.as_deref(), CvId::Methods).await?;
        references_valid &= errors.merge(reference_errors);
        let (reference_errors, scale_id) =
            Self::validate_reference(store, "scaleId", request.scale_id.as_deref(), CvId::Scales).await?;
        references_valid &= errors.merge(reference_errors);

        errors.merge(Self::validate_variable_types(request.variable_type_ids.as_deref()));

        if let Some(scale_id) = scale_id {
            if let Some(scale) = store.get_scale(scale_id).await? {
                errors.merge(Self::validate_expected_range(request, &scale));
            }
        }

        if let (Some(property_id), Some(method_id), Some(scale_id)) = (property_id, method_id, scale_id) {
            errors.merge(
                Self::validate_combination(store, variable_id, property_id, method_id, scale_id).await?,
            );
        }

        if let Some(variable_id) = variable_id.filter(|_| name_valid && references_valid) {
            errors.merge(
                Self::validate_editable(store, variable_id, request, property_id, method_id, scale_id).await?,
            );
        }

        Ok(errors.into_outcome())
    }

    async fn validate_name<S: Middleware>(store: &S, id: Option<TermId>, name: Option<&str>) -> Result<Errors> {
        let mut errors = Errors::new();
        let name = name.unwrap_or_default().trim();

        if !should_not_null_or_empty(TERM, "name", name, &mut errors)
            || !check_length(TERM, "name", name, VARIABLE_NAME_MAX_LENGTH, &mut errors)
        {
            return Ok(errors);
        }
        if !identifier_pattern().is_match(name) {
            errors.add_custom_error("name", ErrorCode::InvalidVariableName, &["name", name]);
            return Ok(errors);
        }
        OntologyValidator::check_term_uniqueness(store, id, name, CvId::Variables, &mut errors).await?;
        Ok(errors)
    }

    fn validate_alias(alias: Option<&str>) -> Errors {
        let mut errors = Errors::new();
        let Some(alias) = alias.map(str::trim).filter(|a| !a.is_empty()) else {
            return errors;
        };
        if check_length(TERM, "alias", alias, VARIABLE_NAME_MAX_LENGTH, &mut errors)
            && !identifier_pattern().is_match(alias)
        {
            errors.add_custom_error("alias", ErrorCode::InvalidVariableName, &["alias", alias]);
        }
        errors
    }

    /// Required numeric id of an existing term; returns the id when usable
    async fn validate_reference<S: Middleware>(
        store: &S,
        field: &str,
        raw_id: Option<&str>,
        cv: CvId,
    ) -> Result<(Errors, Option<TermId>)> {
        let mut errors = Errors::new();
        let raw_id = raw_id.unwrap_or_default();

        if !should_not_null_or_empty(TERM, field, raw_id, &mut errors)
            || !check_number_field(field, raw_id, &mut errors)
        {
            return Ok((errors, None));
        }
        let Some(id) = parse_id(raw_id) else {
            return Ok((errors, None));
        };
        let exists = OntologyValidator::check_term_exist(store, field, id, cv, &mut errors).await?;
        Ok((errors, exists.then_some(id)))
    }

    fn validate_variable_types(raw_ids: Option<&[String]>) -> Errors {
        let mut errors = Errors::new();
        let raw_ids = raw_ids.unwrap_or_default();
        if !should_not_null_or_empty(TERM, "variableTypeIds", raw_ids, &mut errors) {
            return errors;
        }

        for raw_id in raw_ids.iter().map(|id| id.trim()).unique() {
            if parse_id(raw_id).and_then(VariableType::from_id).is_none() {
                errors.add_custom_error("variableTypeIds", ErrorCode::InvalidVariableType, &[raw_id]);
            }
        }
        errors
    }

    fn validate_expected_range(request: &VariableRequest, scale: &Scale) -> Errors {
        let mut errors = Errors::new();
        let Some(range) = request.expected_range.as_ref() else {
            return errors;
        };
        let min = range.min.as_deref().map(str::trim).filter(|v| !v.is_empty());
        let max = range.max.as_deref().map(str::trim).filter(|v| !v.is_empty());
        if min.is_none() && max.is_none() {
            return errors;
        }

        if !scale.is_numeric() {
            errors.add_custom_error("expectedRange", ErrorCode::ExpectedRangeNotAllowed, &[]);
            return errors;
        }

        let mut parse = |field: &str, label: &str, value: Option<&str>| {
            let value = value?;
            let parsed = safe_parse_f64(value);
            if parsed.is_none() {
                errors.add_custom_error(field, ErrorCode::ValueShouldBeNumeric, &[label, value]);
            }
            parsed
        };
        let min = parse("expectedRange.min", "minimum", min);
        let max = parse("expectedRange.max", "maximum", max);

        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                errors.add_custom_error("expectedRange", ErrorCode::MinMaxNotValid, &[]);
                return errors;
            }
        }

        let scale_min = scale.min_value.as_deref().and_then(safe_parse_f64);
        let scale_max = scale.max_value.as_deref().and_then(safe_parse_f64);
        let below = matches!((min, scale_min), (Some(v), Some(lower)) if v < lower)
            || matches!((max, scale_min), (Some(v), Some(lower)) if v < lower);
        let above = matches!((max, scale_max), (Some(v), Some(upper)) if v > upper)
            || matches!((min, scale_max), (Some(v), Some(upper)) if v > upper);
        if below || above {
            errors.add_custom_error(
                "expectedRange",
                ErrorCode::ExpectedRangeOutOfScale,
                &[
                    scale.min_value.as_deref().unwrap_or("-"),
                    scale.max_value.as_deref().unwrap_or("-"),
                ],
            );
        }
        errors
    }

    async fn validate_combination<S: Middleware>(
        store: &S,
        variable_id: Option<TermId>,
        property_id: TermId,
        method_id: TermId,
        scale_id: TermId,
    ) -> Result<Errors> {
        let mut errors = Errors::new();
        let filter = VariableFilter {
            property_ids: vec![property_id],
            method_ids: vec![method_id],
            scale_ids: vec![scale_id],
            ..Default::default()
        };

        let taken_by = store
            .get_variables(&filter)
            .await?
            .into_iter()
            .find(|v| Some(v.term.id) != variable_id);
        if let Some(other) = taken_by {
            errors.add_default_error(ErrorCode::VariableCombinationExists, &[&other.term.name]);
        }
        Ok(errors)
    }

    async fn validate_editable<S: Middleware>(
        store: &S,
        variable_id: TermId,
        request: &VariableRequest,
        property_id: Option<TermId>,
        method_id: Option<TermId>,
        scale_id: Option<TermId>,
    ) -> Result<Errors> {
        let mut errors = Errors::new();
        if !store.is_term_referred(variable_id).await? {
            return Ok(errors);
        }
        let Some(existing) = store.get_variable(None, variable_id).await? else {
            return Ok(errors);
        };

        let name = request.name.as_deref().unwrap_or_default().trim();
        if existing.term.name.trim() != name {
            errors.add_custom_error("name", ErrorCode::RecordIsNotEditable, &[TERM, "name"]);
        }
        for (field, requested, persisted) in [
            ("propertyId", property_id, existing.property.term.id),
            ("methodId", method_id, existing.method.term.id),
            ("scaleId", scale_id, existing.scale.term.id),
        ] {
            if requested != Some(persisted) {
                errors.add_custom_error(field, ErrorCode::RecordIsNotEditable, &[TERM, field]);
            }
        }
        Ok(errors)
    }
}
