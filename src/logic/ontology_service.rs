use std::sync::Arc;

use crate::error::ApiError;
use crate::logic::mapper::OntologyMapper;
use crate::logic::method_validator::MethodValidator;
use crate::logic::ontology_validator::OntologyValidator;
use crate::logic::property_validator::PropertyValidator;
use crate::logic::scale_validator::ScaleValidator;
use crate::logic::validation::parse_id;
use crate::model::{
    CvId, DataType, DataTypeSummary, GenericResponse, MethodDetails, MethodRequest,
    MethodSummary, PropertyDetails, PropertyRequest, PropertySummary, ScaleDetails, ScaleRequest,
    ScaleSummary, TermId, VariableType, VariableTypeSummary,
};
use crate::store::traits::{Middleware, TermInUse};

pub const METHOD_EDITABLE_FIELDS: &[&str] = &["name", "description"];
pub const PROPERTY_EDITABLE_FIELDS: &[&str] = &["name", "description", "classes", "cropOntologyId"];
pub const SCALE_EDITABLE_FIELDS: &[&str] = &["name", "description", "validValues"];
/// What stays editable once another record refers to the term
pub const REFERRED_EDITABLE_FIELDS: &[&str] = &["description"];

pub(crate) fn editable_fields(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

/// Resolve a path id that validation already accepted
pub(crate) async fn require_term_id<S: Middleware>(
    store: &S,
    raw_id: &str,
    cv: CvId,
) -> Result<TermId, ApiError> {
    OntologyValidator::validate_id(store, raw_id, cv)
        .await
        .map_err(ApiError::runtime)?
        .into_result()?;
    parse_id(raw_id).ok_or_else(|| ApiError::NotFound(format!("The {} with id {} does not exist.", cv, raw_id)))
}

pub(crate) async fn require_deletable<S: Middleware>(
    store: &S,
    raw_id: &str,
    cv: CvId,
) -> Result<TermId, ApiError> {
    OntologyValidator::validate_deletable(store, raw_id, cv)
        .await
        .map_err(ApiError::runtime)?
        .into_result()?;
    parse_id(raw_id).ok_or_else(|| ApiError::NotFound(format!("The {} with id {} does not exist.", cv, raw_id)))
}

/// A delete that lost a race with a new reference is a conflict, anything else
/// is a middleware failure
pub(crate) fn delete_failed(err: anyhow::Error) -> ApiError {
    match err.downcast_ref::<TermInUse>() {
        Some(TermInUse(id)) => ApiError::Conflict(format!("The term with id {} is now in use and cannot be deleted.", id)),
        None => ApiError::runtime(err),
    }
}

/// Method, property and scale operations plus the fixed lookup lists.
///
/// Every write runs the matching validator first; a failing validation comes
/// back as [`ApiError::Validation`] and the middleware is not touched.
pub struct OntologyModelService<S> {
    store: Arc<S>,
    mapper: Arc<OntologyMapper>,
}

impl<S> Clone for OntologyModelService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            mapper: self.mapper.clone(),
        }
    }
}

impl<S: Middleware> OntologyModelService<S> {
    pub fn new(store: Arc<S>, mapper: Arc<OntologyMapper>) -> Self {
        Self { store, mapper }
    }

    async fn is_referred(&self, id: TermId) -> Result<bool, ApiError> {
        self.store.is_term_referred(id).await.map_err(ApiError::runtime)
    }

    // Methods

    pub async fn get_all_methods(&self) -> Result<Vec<MethodSummary>, ApiError> {
        let methods = self.store.get_all_methods().await.map_err(ApiError::runtime)?;
        Ok(methods.iter().map(|m| self.mapper.method_summary(m)).collect())
    }

    pub async fn get_method(&self, raw_id: &str) -> Result<Option<MethodDetails>, ApiError> {
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Methods).await?;
        let Some(method) = self.store.get_method(id).await.map_err(ApiError::runtime)? else {
            return Ok(None);
        };

        let referred = self.is_referred(id).await?;
        let mut details = self.mapper.method_details(&method);
        details.metadata.editable_fields = if referred {
            editable_fields(REFERRED_EDITABLE_FIELDS)
        } else {
            editable_fields(METHOD_EDITABLE_FIELDS)
        };
        details.metadata.deletable = !referred;
        Ok(Some(details))
    }

    pub async fn add_method(&self, request: &MethodRequest) -> Result<GenericResponse, ApiError> {
        MethodValidator::validate(self.store.as_ref(), None, request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;

        let method = self
            .store
            .add_method(self.mapper.method_from_request(0, request))
            .await
            .map_err(ApiError::runtime)?;
        log::info!("Added method {} '{}'", method.term.id, method.term.name);
        Ok(GenericResponse::new(method.term.id))
    }

    pub async fn update_method(&self, raw_id: &str, request: &MethodRequest) -> Result<(), ApiError> {
        MethodValidator::validate(self.store.as_ref(), Some(raw_id), request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Methods).await?;

        self.store
            .update_method(self.mapper.method_from_request(id, request))
            .await
            .map_err(ApiError::runtime)?;
        log::info!("Updated method {}", id);
        Ok(())
    }

    pub async fn delete_method(&self, raw_id: &str) -> Result<(), ApiError> {
        let id = require_deletable(self.store.as_ref(), raw_id, CvId::Methods).await?;
        self.store.delete_method(id).await.map_err(delete_failed)?;
        log::info!("Deleted method {}", id);
        Ok(())
    }

    // Properties

    /// All properties, or only those carrying `class_name` when one is given
    pub async fn get_all_properties(&self, class_name: Option<&str>) -> Result<Vec<PropertySummary>, ApiError> {
        let properties = match class_name.map(str::trim).filter(|c| !c.is_empty()) {
            Some(class_name) => self.store.get_properties_by_class(class_name).await,
            None => self.store.get_all_properties().await,
        }
        .map_err(ApiError::runtime)?;
        Ok(properties.iter().map(|p| self.mapper.property_summary(p)).collect())
    }

    pub async fn get_property(&self, raw_id: &str) -> Result<Option<PropertyDetails>, ApiError> {
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Properties).await?;
        let Some(property) = self.store.get_property(id).await.map_err(ApiError::runtime)? else {
            return Ok(None);
        };

        let referred = self.is_referred(id).await?;
        let mut details = self.mapper.property_details(&property);
        details.metadata.editable_fields = if referred {
            editable_fields(REFERRED_EDITABLE_FIELDS)
        } else {
            editable_fields(PROPERTY_EDITABLE_FIELDS)
        };
        details.metadata.deletable = !referred;
        Ok(Some(details))
    }

    pub async fn add_property(&self, request: &PropertyRequest) -> Result<GenericResponse, ApiError> {
        PropertyValidator::validate(self.store.as_ref(), None, request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;

        let property = self
            .store
            .add_property(self.mapper.property_from_request(0, request))
            .await
            .map_err(ApiError::runtime)?;
        log::info!("Added property {} '{}'", property.term.id, property.term.name);
        Ok(GenericResponse::new(property.term.id))
    }

    pub async fn update_property(&self, raw_id: &str, request: &PropertyRequest) -> Result<(), ApiError> {
        PropertyValidator::validate(self.store.as_ref(), Some(raw_id), request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Properties).await?;

        self.store
            .update_property(self.mapper.property_from_request(id, request))
            .await
            .map_err(ApiError::runtime)?;
        log::info!("Updated property {}", id);
        Ok(())
    }

    pub async fn delete_property(&self, raw_id: &str) -> Result<(), ApiError> {
        let id = require_deletable(self.store.as_ref(), raw_id, CvId::Properties).await?;
        self.store.delete_property(id).await.map_err(delete_failed)?;
        log::info!("Deleted property {}", id);
        Ok(())
    }

    /// Trait class names in alphabetical order
    pub async fn get_classes(&self) -> Result<Vec<String>, ApiError> {
        let mut classes: Vec<String> = self
            .store
            .get_all_classes()
            .await
            .map_err(ApiError::runtime)?
            .into_iter()
            .map(|c| c.name)
            .collect();
        classes.sort_by_key(|c| c.to_lowercase());
        Ok(classes)
    }

    // Scales

    pub async fn get_all_scales(&self) -> Result<Vec<ScaleSummary>, ApiError> {
        let scales = self.store.get_all_scales().await.map_err(ApiError::runtime)?;
        Ok(scales.iter().map(|s| self.mapper.scale_summary(s)).collect())
    }

    pub async fn get_scale(&self, raw_id: &str) -> Result<Option<ScaleDetails>, ApiError> {
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Scales).await?;
        let Some(scale) = self.store.get_scale(id).await.map_err(ApiError::runtime)? else {
            return Ok(None);
        };

        let referred = self.is_referred(id).await?;
        let mut details = self.mapper.scale_details(&scale);
        details.metadata.editable_fields = if referred {
            editable_fields(REFERRED_EDITABLE_FIELDS)
        } else {
            editable_fields(SCALE_EDITABLE_FIELDS)
        };
        details.metadata.deletable = !referred;
        Ok(Some(details))
    }

    pub async fn add_scale(&self, request: &ScaleRequest) -> Result<GenericResponse, ApiError> {
        ScaleValidator::validate(self.store.as_ref(), None, request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;

        let scale = self
            .store
            .add_scale(self.mapper.scale_from_request(0, request))
            .await
            .map_err(ApiError::runtime)?;
        log::info!("Added scale {} '{}'", scale.term.id, scale.term.name);
        Ok(GenericResponse::new(scale.term.id))
    }

    pub async fn update_scale(&self, raw_id: &str, request: &ScaleRequest) -> Result<(), ApiError> {
        ScaleValidator::validate(self.store.as_ref(), Some(raw_id), request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Scales).await?;

        self.store
            .update_scale(self.mapper.scale_from_request(id, request))
            .await
            .map_err(ApiError::runtime)?;
        log::info!("Updated scale {}", id);
        Ok(())
    }

    pub async fn delete_scale(&self, raw_id: &str) -> Result<(), ApiError> {
        let id = require_deletable(self.store.as_ref(), raw_id, CvId::Scales).await?;
        self.store.delete_scale(id).await.map_err(delete_failed)?;
        log::info!("Deleted scale {}", id);
        Ok(())
    }

    // Fixed lookups

    pub fn get_data_types(&self) -> Vec<DataTypeSummary> {
        DataType::ALL
            .iter()
            .map(|d| self.mapper.data_type_summary(*d))
            .collect()
    }

    pub fn get_variable_types(&self) -> Vec<VariableTypeSummary> {
        VariableType::ALL
            .iter()
            .map(|t| self.mapper.variable_type_summary(*t))
            .collect()
    }

    pub fn mapper(&self) -> &Arc<OntologyMapper> {
        &self.mapper
    }
}
