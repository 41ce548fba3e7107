use std::sync::Arc;

use crate::logic::{OntologyMapper, OntologyModelService, VariableService};
use crate::store::traits::Middleware;

/// Shared request state. Cloning is cheap and every clone sees the same
/// middleware and the same mapper.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub mapper: Arc<OntologyMapper>,
    pub ontology: OntologyModelService<S>,
    pub variables: VariableService<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            mapper: self.mapper.clone(),
            ontology: self.ontology.clone(),
            variables: self.variables.clone(),
        }
    }
}

impl<S: Middleware> AppState<S> {
    pub fn new(store: Arc<S>, mapper: OntologyMapper) -> Self {
        let mapper = Arc::new(mapper);
        Self {
            ontology: OntologyModelService::new(store.clone(), mapper.clone()),
            variables: VariableService::new(store.clone(), mapper.clone()),
            store,
            mapper,
        }
    }
}
