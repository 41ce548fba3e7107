use crate::model::{CvId, Method, Property, Scale, Term, TermId, Variable, VariableFilter, VariableInfo};
use anyhow::Result;

/// Returned by the `delete_*` operations when something started referring to
/// the term after the caller checked it
#[derive(Debug, thiserror::Error)]
#[error("Term {0} is in use")]
pub struct TermInUse(pub TermId);

/// Term lookups shared by every vocabulary
#[async_trait::async_trait]
pub trait TermStore: Send + Sync {
    async fn get_term_by_id(&self, id: TermId) -> Result<Option<Term>>;
    /// Find a term by exact name within one vocabulary
    async fn get_term_by_name_and_cv(&self, name: &str, cv: CvId) -> Result<Option<Term>>;
    /// Whether the term is used elsewhere (by variables, properties or observations)
    async fn is_term_referred(&self, id: TermId) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait MethodStore: Send + Sync {
    async fn get_all_methods(&self) -> Result<Vec<Method>>;
    async fn get_method(&self, id: TermId) -> Result<Option<Method>>;
    /// Persist a new method and return it with its generated id
    async fn add_method(&self, method: Method) -> Result<Method>;
    async fn update_method(&self, method: Method) -> Result<()>;
    async fn delete_method(&self, id: TermId) -> Result<()>;
}

#[async_trait::async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get_all_properties(&self) -> Result<Vec<Property>>;
    async fn get_properties_by_class(&self, class_name: &str) -> Result<Vec<Property>>;
    async fn get_property(&self, id: TermId) -> Result<Option<Property>>;
    /// Persist a new property, creating any trait class it names that does not exist yet
    async fn add_property(&self, property: Property) -> Result<Property>;
    async fn update_property(&self, property: Property) -> Result<()>;
    async fn delete_property(&self, id: TermId) -> Result<()>;
    async fn get_all_classes(&self) -> Result<Vec<Term>>;
}

#[async_trait::async_trait]
pub trait ScaleStore: Send + Sync {
    async fn get_all_scales(&self) -> Result<Vec<Scale>>;
    async fn get_scale(&self, id: TermId) -> Result<Option<Scale>>;
    async fn add_scale(&self, scale: Scale) -> Result<Scale>;
    async fn update_scale(&self, scale: Scale) -> Result<()>;
    async fn delete_scale(&self, id: TermId) -> Result<()>;
}

#[async_trait::async_trait]
pub trait VariableStore: Send + Sync {
    /// List variables as seen from the filter's program (favourites are per program)
    async fn get_variables(&self, filter: &VariableFilter) -> Result<Vec<Variable>>;
    async fn get_variable(&self, program_uuid: Option<&str>, id: TermId) -> Result<Option<Variable>>;
    async fn add_variable(&self, variable: VariableInfo) -> Result<TermId>;
    async fn update_variable(&self, variable: VariableInfo) -> Result<()>;
    async fn delete_variable(&self, id: TermId) -> Result<()>;
}

/// Registry of crops this installation serves
#[async_trait::async_trait]
pub trait CropStore: Send + Sync {
    async fn list_crops(&self) -> Result<Vec<String>>;
    async fn is_valid_crop(&self, crop_name: &str) -> Result<bool>;
}

/// Everything the API layer needs from the middleware
pub trait Middleware:
    TermStore + MethodStore + PropertyStore + ScaleStore + VariableStore + CropStore + Send + Sync
{
}

impl<T> Middleware for T where
    T: TermStore + MethodStore + PropertyStore + ScaleStore + VariableStore + CropStore + Send + Sync
{
}
