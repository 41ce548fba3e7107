pub mod mapper;
pub mod method_validator;
pub mod ontology_service;
pub mod ontology_validator;
pub mod property_validator;
pub mod scale_validator;
pub mod validation;
pub mod variable_service;
pub mod variable_validator;

pub use mapper::OntologyMapper;
pub use method_validator::MethodValidator;
pub use ontology_service::OntologyModelService;
pub use ontology_validator::OntologyValidator;
pub use property_validator::PropertyValidator;
pub use scale_validator::ScaleValidator;
pub use validation::{ErrorCode, Errors, FieldError, ValidationOutcome};
pub use variable_service::VariableService;
pub use variable_validator::VariableValidator;
