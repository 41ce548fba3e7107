//! Error collection and the field-level predicates every ontology validator uses.
//!
//! Validation stages build their own [`Errors`] and the entity validators fold
//! them together, stopping where later stages depend on earlier ones. Nothing
//! here fails fast: a request with several problems reports all of them.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::ApiError;
use crate::model::TermId;

pub const NAME_MAX_LENGTH: usize = 200;
pub const DESCRIPTION_MAX_LENGTH: usize = 255;

/// Stable error codes with their message templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FieldIsRequired,
    TextualFieldLengthExceeded,
    InvalidId,
    DoesNotExist,
    NameAlreadyExists,
    CanNotDeleteReferredTerm,
    RecordIsNotEditable,
    InvalidDataType,
    CategoriesRequired,
    CategoryNameDuplicate,
    CategoryDescriptionDuplicate,
    ValueShouldBeNumeric,
    MinMaxNotValid,
    InvalidVariableName,
    InvalidVariableType,
    ExpectedRangeNotAllowed,
    ExpectedRangeOutOfScale,
    VariableCombinationExists,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::FieldIsRequired => "FIELD_IS_REQUIRED",
            ErrorCode::TextualFieldLengthExceeded => "TEXTUAL_FIELD_LENGTH_EXCEEDED",
            ErrorCode::InvalidId => "INVALID_ID",
            ErrorCode::DoesNotExist => "DOES_NOT_EXIST",
            ErrorCode::NameAlreadyExists => "NAME_ALREADY_EXISTS",
            ErrorCode::CanNotDeleteReferredTerm => "CAN_NOT_DELETE_REFERRED_TERM",
            ErrorCode::RecordIsNotEditable => "RECORD_IS_NOT_EDITABLE",
            ErrorCode::InvalidDataType => "INVALID_DATA_TYPE",
            ErrorCode::CategoriesRequired => "CATEGORIES_REQUIRED",
            ErrorCode::CategoryNameDuplicate => "CATEGORY_NAME_DUPLICATE",
            ErrorCode::CategoryDescriptionDuplicate => "CATEGORY_DESCRIPTION_DUPLICATE",
            ErrorCode::ValueShouldBeNumeric => "VALUE_SHOULD_BE_NUMERIC",
            ErrorCode::MinMaxNotValid => "MIN_MAX_NOT_VALID",
            ErrorCode::InvalidVariableName => "INVALID_VARIABLE_NAME",
            ErrorCode::InvalidVariableType => "INVALID_VARIABLE_TYPE",
            ErrorCode::ExpectedRangeNotAllowed => "EXPECTED_RANGE_NOT_ALLOWED",
            ErrorCode::ExpectedRangeOutOfScale => "EXPECTED_RANGE_OUT_OF_SCALE",
            ErrorCode::VariableCombinationExists => "VARIABLE_COMBINATION_EXISTS",
        }
    }

    /// Template with positional `{n}` placeholders
    pub fn template(&self) -> &'static str {
        match self {
            ErrorCode::FieldIsRequired => "The {0} {1} is required.",
            ErrorCode::TextualFieldLengthExceeded => "The {0} {1} must not exceed {2} characters.",
            ErrorCode::InvalidId => "'{0}' is not a valid id; ids must be numeric.",
            ErrorCode::DoesNotExist => "The {0} with id {1} does not exist.",
            ErrorCode::NameAlreadyExists => "A {0} with the name '{1}' already exists.",
            ErrorCode::CanNotDeleteReferredTerm => {
                "The {0} with id {1} is in use and cannot be deleted."
            }
            ErrorCode::RecordIsNotEditable => {
                "The {0} {1} cannot be changed because the {0} is already in use."
            }
            ErrorCode::InvalidDataType => "'{0}' is not a valid data type id.",
            ErrorCode::CategoriesRequired => "At least one category is required for a categorical scale.",
            ErrorCode::CategoryNameDuplicate => "The category name '{0}' is used more than once.",
            ErrorCode::CategoryDescriptionDuplicate => {
                "The category description '{0}' is used more than once."
            }
            ErrorCode::ValueShouldBeNumeric => "The {0} value '{1}' must be numeric.",
            ErrorCode::MinMaxNotValid => {
                "The minimum value must be less than or equal to the maximum value."
            }
            ErrorCode::InvalidVariableName => {
                "The {0} '{1}' must start with a letter, '_' or '%' and contain only letters, digits, '_' or '%'."
            }
            ErrorCode::InvalidVariableType => "'{0}' is not a valid variable type id.",
            ErrorCode::ExpectedRangeNotAllowed => {
                "An expected range can only be set on a variable with a numeric scale."
            }
            ErrorCode::ExpectedRangeOutOfScale => {
                "The expected range must fall within the scale's valid range ({0} to {1})."
            }
            ErrorCode::VariableCombinationExists => {
                "The variable '{0}' already uses the same property, method and scale."
            }
        }
    }
}

/// A single validation failure, optionally scoped to a request field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: Option<String>,
    pub code: ErrorCode,
    pub args: Vec<String>,
}

impl FieldError {
    pub fn field(field: impl Into<String>, code: ErrorCode, args: Vec<String>) -> Self {
        Self {
            field: Some(field.into()),
            code,
            args,
        }
    }

    pub fn global(code: ErrorCode, args: Vec<String>) -> Self {
        Self {
            field: None,
            code,
            args,
        }
    }

    /// Render the message template with this error's arguments
    pub fn message(&self) -> String {
        let mut message = self.code.template().to_string();
        for (index, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{}}}", index), arg);
        }
        message
    }
}

/// Ordered collection of validation failures
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Errors {
    errors: Vec<FieldError>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_custom_error(&mut self, field: impl Into<String>, code: ErrorCode, args: &[&str]) {
        self.errors.push(FieldError::field(
            field,
            code,
            args.iter().map(|a| a.to_string()).collect(),
        ));
    }

    pub fn add_default_error(&mut self, code: ErrorCode, args: &[&str]) {
        self.errors.push(FieldError::global(
            code,
            args.iter().map(|a| a.to_string()).collect(),
        ));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_field_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field.as_deref() == Some(field))
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Fold a stage's errors into this collection; true when the stage was clean
    pub fn merge(&mut self, stage: Errors) -> bool {
        let clean = !stage.has_errors();
        self.errors.extend(stage.errors);
        clean
    }

    pub fn into_outcome(self) -> ValidationOutcome {
        if self.errors.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(self.errors)
        }
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        self.into_outcome().into_result()
    }
}

/// Aggregate result of a validation pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<FieldError>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(errors) => errors,
        }
    }

    pub fn has_error(&self, field: &str, code: ErrorCode) -> bool {
        self.errors()
            .iter()
            .any(|e| e.field.as_deref() == Some(field) && e.code == code)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            ValidationOutcome::Valid => Ok(()),
            ValidationOutcome::Invalid(errors) => Err(ApiError::Validation(errors)),
        }
    }
}

impl From<Errors> for ValidationOutcome {
    fn from(errors: Errors) -> Self {
        errors.into_outcome()
    }
}

/// Values that can be absent or empty
pub trait NullOrEmpty {
    fn is_null_or_empty(&self) -> bool;
}

impl NullOrEmpty for str {
    fn is_null_or_empty(&self) -> bool {
        self.trim().is_empty()
    }
}

impl NullOrEmpty for String {
    fn is_null_or_empty(&self) -> bool {
        self.as_str().is_null_or_empty()
    }
}

impl<T> NullOrEmpty for Vec<T> {
    fn is_null_or_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<T> NullOrEmpty for [T] {
    fn is_null_or_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<T> NullOrEmpty for BTreeSet<T> {
    fn is_null_or_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> NullOrEmpty for HashSet<T, S> {
    fn is_null_or_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> NullOrEmpty for BTreeMap<K, V> {
    fn is_null_or_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> NullOrEmpty for HashMap<K, V, S> {
    fn is_null_or_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<T: NullOrEmpty> NullOrEmpty for Option<T> {
    fn is_null_or_empty(&self) -> bool {
        match self {
            None => true,
            Some(value) => value.is_null_or_empty(),
        }
    }
}

pub fn is_null_or_empty<T: NullOrEmpty + ?Sized>(value: &T) -> bool {
    value.is_null_or_empty()
}

/// Parse a path or body id; only plain digit strings are ids
pub fn parse_id(value: &str) -> Option<TermId> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Reject values that are not digit strings with `INVALID_ID`
pub fn check_number_field(field: &str, value: &str, errors: &mut Errors) -> bool {
    if parse_id(value).is_some() {
        return true;
    }
    errors.add_custom_error(field, ErrorCode::InvalidId, &[value]);
    false
}

/// Reject absent or blank values with `FIELD_IS_REQUIRED`
pub fn should_not_null_or_empty<T: NullOrEmpty + ?Sized>(
    term_name: &str,
    field: &str,
    value: &T,
    errors: &mut Errors,
) -> bool {
    if value.is_null_or_empty() {
        errors.add_custom_error(field, ErrorCode::FieldIsRequired, &[term_name, field]);
        return false;
    }
    true
}

/// Reject text longer than `max_length` characters (counted after trimming)
pub fn check_length(term_name: &str, field: &str, value: &str, max_length: usize, errors: &mut Errors) -> bool {
    if value.trim().chars().count() > max_length {
        errors.add_custom_error(
            field,
            ErrorCode::TextualFieldLengthExceeded,
            &[term_name, field, &max_length.to_string()],
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_or_empty() {
        assert!(is_null_or_empty(""));
        assert!(is_null_or_empty("   "));
        assert!(!is_null_or_empty("x"));
        assert!(is_null_or_empty(&None::<String>));
        assert!(is_null_or_empty(&Some("  ".to_string())));
        assert!(is_null_or_empty(&Vec::<i32>::new()));
        assert!(is_null_or_empty(&HashMap::<String, String>::new()));
        assert!(!is_null_or_empty(&vec![1]));
        assert!(is_null_or_empty(&Some(Vec::<String>::new())));
    }

    #[test]
    fn test_check_number_field() {
        let mut errors = Errors::new();
        assert!(check_number_field("id", "123", &mut errors));
        assert!(!check_number_field("id", "12a", &mut errors));
        assert!(!check_number_field("id", "-4", &mut errors));
        assert!(!check_number_field("id", "", &mut errors));
        assert_eq!(errors.error_count(), 3);
        assert!(errors.iter().all(|e| e.code == ErrorCode::InvalidId));
    }

    #[test]
    fn test_errors_accumulate_in_order() {
        let mut errors = Errors::new();
        should_not_null_or_empty("method", "name", "", &mut errors);
        check_length("method", "description", &"x".repeat(256), 255, &mut errors);
        errors.add_default_error(ErrorCode::MinMaxNotValid, &[]);

        let codes: Vec<ErrorCode> = errors.iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::FieldIsRequired,
                ErrorCode::TextualFieldLengthExceeded,
                ErrorCode::MinMaxNotValid
            ]
        );
        assert!(errors.has_field_error("description"));
        assert!(!errors.has_field_error("dataType"));
    }

    #[test]
    fn test_length_counts_characters_after_trim() {
        let mut errors = Errors::new();
        assert!(check_length("scale", "name", &format!("  {}  ", "é".repeat(200)), 200, &mut errors));
        assert!(!check_length("scale", "name", &"é".repeat(201), 200, &mut errors));
    }

    #[test]
    fn test_merge_reports_stage_cleanliness() {
        let mut errors = Errors::new();
        assert!(errors.merge(Errors::new()));

        let mut stage = Errors::new();
        stage.add_custom_error("name", ErrorCode::FieldIsRequired, &["scale", "name"]);
        assert!(!errors.merge(stage));
        assert_eq!(errors.error_count(), 1);

        let outcome = errors.into_outcome();
        assert!(!outcome.is_valid());
        assert!(outcome.has_error("name", ErrorCode::FieldIsRequired));
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn test_message_rendering() {
        let error = FieldError::field(
            "description",
            ErrorCode::TextualFieldLengthExceeded,
            vec!["scale".into(), "description".into(), "255".into()],
        );
        assert_eq!(
            error.message(),
            "The scale description must not exceed 255 characters."
        );
        assert_eq!(ErrorCode::RecordIsNotEditable.code(), "RECORD_IS_NOT_EDITABLE");
    }
}
