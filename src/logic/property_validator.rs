use anyhow::Result;
use std::collections::BTreeSet;

use crate::logic::ontology_validator::{validate_description, validate_name, OntologyValidator};
use crate::logic::validation::{
    check_length, parse_id, should_not_null_or_empty, ErrorCode, Errors, ValidationOutcome,
    NAME_MAX_LENGTH,
};
use crate::model::{CvId, PropertyRequest, TermId};
use crate::store::traits::{PropertyStore, TermStore};

const TERM: &str = "property";

/// Add/update rules for properties.
///
/// On top of the shared name/description rules a property needs at least one
/// trait class, every class name non-blank and at most 200 characters, and a
/// crop ontology id of at most 200 characters. A property in use keeps its
/// name, classes and crop ontology id.
pub struct PropertyValidator;

impl PropertyValidator {
    pub async fn validate<S: TermStore + PropertyStore>(
        store: &S,
        id: Option<&str>,
        request: &PropertyRequest,
    ) -> Result<ValidationOutcome> {
        let mut errors = Errors::new();

        let mut property_id = None;
        if let Some(raw_id) = id {
            if !errors.merge(OntologyValidator::validate_id(store, raw_id, CvId::Properties).await?) {
                return Ok(errors.into_outcome());
            }
            property_id = parse_id(raw_id);
        }

        let name_valid =
            errors.merge(validate_name(store, property_id, request.name.as_deref(), CvId::Properties, TERM).await?);
        errors.merge(validate_description(TERM, request.description.as_deref()));
        let classes_valid = errors.merge(Self::validate_classes(request));

        if let Some(crop_ontology_id) = request.crop_ontology_id.as_deref() {
            check_length(TERM, "cropOntologyId", crop_ontology_id, NAME_MAX_LENGTH, &mut errors);
        }

        if let Some(property_id) = property_id.filter(|_| name_valid && classes_valid) {
            errors.merge(Self::validate_editable(store, property_id, request).await?);
        }

        Ok(errors.into_outcome())
    }

    /// Only the description of a property in use may change
    async fn validate_editable<S: TermStore + PropertyStore>(
        store: &S,
        property_id: TermId,
        request: &PropertyRequest,
    ) -> Result<Errors> {
        let mut errors = Errors::new();
        if !store.is_term_referred(property_id).await? {
            return Ok(errors);
        }
        let Some(existing) = store.get_property(property_id).await? else {
            return Ok(errors);
        };

        let name = request.name.as_deref().unwrap_or_default().trim();
        if existing.term.name.trim() != name {
            errors.add_custom_error("name", ErrorCode::RecordIsNotEditable, &[TERM, "name"]);
        }

        let classes: BTreeSet<&str> = request.classes.iter().flatten().map(|c| c.trim()).collect();
        if existing.classes.iter().map(|c| c.trim()).collect::<BTreeSet<_>>() != classes {
            errors.add_custom_error("classes", ErrorCode::RecordIsNotEditable, &[TERM, "classes"]);
        }

        if non_blank(existing.crop_ontology_id.as_deref()) != non_blank(request.crop_ontology_id.as_deref()) {
            errors.add_custom_error("cropOntologyId", ErrorCode::RecordIsNotEditable, &[TERM, "cropOntologyId"]);
        }
        Ok(errors)
    }

    fn validate_classes(request: &PropertyRequest) -> Errors {
        let mut errors = Errors::new();
        if !should_not_null_or_empty(TERM, "classes", &request.classes, &mut errors) {
            return errors;
        }

        for (index, class_name) in request.classes.iter().flatten().enumerate() {
            let field = format!("classes[{}]", index);
            if should_not_null_or_empty(TERM, &field, class_name, &mut errors) {
                check_length(TERM, &field, class_name, NAME_MAX_LENGTH, &mut errors);
            }
        }
        errors
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
