use anyhow::Result;

use crate::logic::validation::{
    check_length, check_number_field, parse_id, should_not_null_or_empty, ErrorCode, Errors,
    DESCRIPTION_MAX_LENGTH, NAME_MAX_LENGTH,
};
use crate::model::{CvId, TermId};
use crate::store::traits::TermStore;

/// Term-level checks that need the middleware
pub struct OntologyValidator;

impl OntologyValidator {
    /// Reject ids with no term, or whose term belongs to another vocabulary
    pub async fn check_term_exist<S: TermStore + ?Sized>(
        store: &S,
        field: &str,
        id: TermId,
        cv: CvId,
        errors: &mut Errors,
    ) -> Result<bool> {
        let exists = store
            .get_term_by_id(id)
            .await?
            .map(|term| term.vocabulary == cv)
            .unwrap_or(false);

        if !exists {
            errors.add_custom_error(field, ErrorCode::DoesNotExist, &[&cv.to_string(), &id.to_string()]);
        }
        Ok(exists)
    }

    /// Reject a name already owned by a different term of the same vocabulary
    pub async fn check_term_uniqueness<S: TermStore + ?Sized>(
        store: &S,
        id: Option<TermId>,
        name: &str,
        cv: CvId,
        errors: &mut Errors,
    ) -> Result<bool> {
        let Some(existing) = store.get_term_by_name_and_cv(name.trim(), cv).await? else {
            return Ok(true);
        };
        if Some(existing.id) == id {
            return Ok(true);
        }

        errors.add_custom_error("name", ErrorCode::NameAlreadyExists, &[&cv.to_string(), name.trim()]);
        Ok(false)
    }

    /// Validate a raw id from a path: numeric, then existing in `cv`
    pub async fn validate_id<S: TermStore + ?Sized>(store: &S, raw_id: &str, cv: CvId) -> Result<Errors> {
        let mut errors = Errors::new();
        if !check_number_field("id", raw_id, &mut errors) {
            return Ok(errors);
        }
        if let Some(id) = parse_id(raw_id) {
            Self::check_term_exist(store, "id", id, cv, &mut errors).await?;
        }
        Ok(errors)
    }

    /// A term may be deleted when it exists and nothing refers to it
    pub async fn validate_deletable<S: TermStore + ?Sized>(store: &S, raw_id: &str, cv: CvId) -> Result<Errors> {
        let mut errors = Self::validate_id(store, raw_id, cv).await?;
        if errors.has_errors() {
            return Ok(errors);
        }

        if let Some(id) = parse_id(raw_id) {
            if store.is_term_referred(id).await? {
                errors.add_custom_error(
                    "id",
                    ErrorCode::CanNotDeleteReferredTerm,
                    &[&cv.to_string(), &id.to_string()],
                );
            }
        }
        Ok(errors)
    }
}

/// Name rule shared by methods, properties and scales: required, bounded, unique
pub(crate) async fn validate_name<S: TermStore + ?Sized>(
    store: &S,
    id: Option<TermId>,
    name: Option<&str>,
    cv: CvId,
    term_name: &str,
) -> Result<Errors> {
    let mut errors = Errors::new();
    let name = name.unwrap_or_default();

    if !should_not_null_or_empty(term_name, "name", name, &mut errors) {
        return Ok(errors);
    }
    if !check_length(term_name, "name", name, NAME_MAX_LENGTH, &mut errors) {
        return Ok(errors);
    }
    OntologyValidator::check_term_uniqueness(store, id, name, cv, &mut errors).await?;
    Ok(errors)
}

/// Description is optional; a missing one is treated as empty
pub(crate) fn validate_description(term_name: &str, description: Option<&str>) -> Errors {
    let mut errors = Errors::new();
    let description = description.map(str::trim).unwrap_or_default();
    check_length(term_name, "description", description, DESCRIPTION_MAX_LENGTH, &mut errors);
    errors
}
