use anyhow::Result;

use crate::logic::ontology_validator::{validate_description, validate_name, OntologyValidator};
use crate::logic::validation::{parse_id, ErrorCode, Errors, ValidationOutcome};
use crate::model::{CvId, MethodRequest};
use crate::store::traits::{MethodStore, TermStore};

const TERM: &str = "method";

/// Add/update rules for methods:
/// name required, at most 200 characters and unique; description at most 255
/// characters; a method in use keeps its name.
pub struct MethodValidator;

impl MethodValidator {
    pub async fn validate<S: TermStore + MethodStore>(
        store: &S,
        id: Option<&str>,
        request: &MethodRequest,
    ) -> Result<ValidationOutcome> {
        let mut errors = Errors::new();

        let mut method_id = None;
        if let Some(raw_id) = id {
            if !errors.merge(OntologyValidator::validate_id(store, raw_id, CvId::Methods).await?) {
                return Ok(errors.into_outcome());
            }
            method_id = parse_id(raw_id);
        }

        let name_valid =
            errors.merge(validate_name(store, method_id, request.name.as_deref(), CvId::Methods, TERM).await?);
        errors.merge(validate_description(TERM, request.description.as_deref()));

        // The lock only depends on the name; other failures must not hide it
        if let Some(method_id) = method_id.filter(|_| name_valid) {
            if store.is_term_referred(method_id).await? {
                if let Some(existing) = store.get_method(method_id).await? {
                    let name = request.name.as_deref().unwrap_or_default().trim();
                    if existing.term.name.trim() != name {
                        errors.add_custom_error("name", ErrorCode::RecordIsNotEditable, &[TERM, "name"]);
                    }
                }
            }
        }

        Ok(errors.into_outcome())
    }
}
