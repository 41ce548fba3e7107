use std::sync::Arc;

use crate::error::ApiError;
use crate::logic::mapper::OntologyMapper;
use crate::logic::ontology_service::{delete_failed, editable_fields, require_deletable, require_term_id};
use crate::logic::validation::{check_number_field, parse_id, Errors};
use crate::logic::variable_validator::VariableValidator;
use crate::model::{
    BrapiMetadata, BrapiResponse, CvId, DataList, GenericResponse, ObservationVariable,
    Pagination, VariableDetails, VariableFilter, VariableRequest, VariableSummary,
};
use crate::store::traits::Middleware;

pub const VARIABLE_EDITABLE_FIELDS: &[&str] = &[
    "name",
    "description",
    "alias",
    "property",
    "method",
    "scale",
    "variableTypes",
    "expectedRange",
    "favourite",
];
/// Observed variables keep their identity: name plus the property/method/scale triple
pub const OBSERVED_VARIABLE_EDITABLE_FIELDS: &[&str] =
    &["description", "alias", "variableTypes", "expectedRange", "favourite"];

pub const DEFAULT_BRAPI_PAGE_SIZE: usize = 1000;

/// Variable operations, seen from an optional breeding program.
///
/// Favourites are recorded per program; without a program every variable
/// reads as not favourite and favourite changes are dropped.
pub struct VariableService<S> {
    store: Arc<S>,
    mapper: Arc<OntologyMapper>,
}

impl<S> Clone for VariableService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            mapper: self.mapper.clone(),
        }
    }
}

impl<S: Middleware> VariableService<S> {
    pub fn new(store: Arc<S>, mapper: Arc<OntologyMapper>) -> Self {
        Self { store, mapper }
    }

    pub fn mapper(&self) -> &Arc<OntologyMapper> {
        &self.mapper
    }

    pub async fn get_all_variables(
        &self,
        program_uuid: Option<&str>,
        property_id: Option<&str>,
        favourites_only: bool,
    ) -> Result<Vec<VariableSummary>, ApiError> {
        let mut filter = VariableFilter::for_program(program_uuid.map(str::to_string));
        filter.favourites_only = favourites_only;

        if let Some(raw) = property_id.map(str::trim).filter(|p| !p.is_empty()) {
            let mut errors = Errors::new();
            check_number_field("propertyId", raw, &mut errors);
            errors.into_result()?;
            filter.property_ids.extend(parse_id(raw));
        }

        let variables = self.store.get_variables(&filter).await.map_err(ApiError::runtime)?;
        Ok(variables.iter().map(|v| self.mapper.variable_summary(v)).collect())
    }

    pub async fn get_variable(
        &self,
        program_uuid: Option<&str>,
        raw_id: &str,
    ) -> Result<Option<VariableDetails>, ApiError> {
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Variables).await?;
        let Some(variable) = self
            .store
            .get_variable(program_uuid, id)
            .await
            .map_err(ApiError::runtime)?
        else {
            return Ok(None);
        };

        let observed = self.store.is_term_referred(id).await.map_err(ApiError::runtime)?;
        let mut details = self.mapper.variable_details(&variable);
        details.metadata.editable_fields = if observed {
            editable_fields(OBSERVED_VARIABLE_EDITABLE_FIELDS)
        } else {
            editable_fields(VARIABLE_EDITABLE_FIELDS)
        };
        details.metadata.deletable = !observed;
        Ok(Some(details))
    }

    pub async fn add_variable(
        &self,
        program_uuid: Option<&str>,
        request: &VariableRequest,
    ) -> Result<GenericResponse, ApiError> {
        VariableValidator::validate(self.store.as_ref(), None, request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;

        let info = self
            .mapper
            .variable_from_request(None, program_uuid.map(str::to_string), request);
        let name = info.name.clone();
        let id = self.store.add_variable(info).await.map_err(ApiError::runtime)?;
        log::info!("Added variable {} '{}'", id, name);
        Ok(GenericResponse::new(id))
    }

    pub async fn update_variable(
        &self,
        program_uuid: Option<&str>,
        raw_id: &str,
        request: &VariableRequest,
    ) -> Result<(), ApiError> {
        VariableValidator::validate(self.store.as_ref(), Some(raw_id), request)
            .await
            .map_err(ApiError::runtime)?
            .into_result()?;
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Variables).await?;

        let info = self
            .mapper
            .variable_from_request(Some(id), program_uuid.map(str::to_string), request);
        self.store.update_variable(info).await.map_err(ApiError::runtime)?;
        log::info!("Updated variable {}", id);
        Ok(())
    }

    pub async fn delete_variable(&self, raw_id: &str) -> Result<(), ApiError> {
        let id = require_deletable(self.store.as_ref(), raw_id, CvId::Variables).await?;
        self.store.delete_variable(id).await.map_err(delete_failed)?;
        log::info!("Deleted variable {}", id);
        Ok(())
    }

    // BrAPI v1

    /// One zero-based page of observation variables
    pub async fn list_observation_variables(
        &self,
        crop: &str,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> Result<BrapiResponse<DataList<ObservationVariable>>, ApiError> {
        let variables = self
            .store
            .get_variables(&VariableFilter::default())
            .await
            .map_err(ApiError::runtime)?;

        let pagination = Pagination::new(
            page.unwrap_or(0),
            page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_BRAPI_PAGE_SIZE),
            variables.len(),
        );
        let data = pagination
            .slice(&variables)
            .iter()
            .map(|v| self.mapper.observation_variable(v, crop))
            .collect();

        Ok(BrapiResponse {
            metadata: BrapiMetadata {
                pagination,
                status: Vec::new(),
                datafiles: Vec::new(),
            },
            result: DataList { data },
        })
    }

    pub async fn get_observation_variable(
        &self,
        crop: &str,
        raw_id: &str,
    ) -> Result<Option<BrapiResponse<ObservationVariable>>, ApiError> {
        let id = require_term_id(self.store.as_ref(), raw_id, CvId::Variables).await?;
        let variable = self.store.get_variable(None, id).await.map_err(ApiError::runtime)?;

        Ok(variable.map(|v| BrapiResponse {
            metadata: BrapiMetadata {
                pagination: Pagination::new(0, 0, 0),
                status: Vec::new(),
                datafiles: Vec::new(),
            },
            result: self.mapper.observation_variable(&v, crop),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::validation::ErrorCode;
    use crate::model::{
        CvId, DataType, ExpectedRange, Method, Property, Scale, Term, TermId,
    };
    use crate::store::memory::InMemoryMiddleware;
    use crate::store::traits::{MethodStore, PropertyStore, ScaleStore, VariableStore};

    struct Fixture {
        store: Arc<InMemoryMiddleware>,
        service: VariableService<InMemoryMiddleware>,
        property_id: TermId,
        method_id: TermId,
        scale_id: TermId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryMiddleware::new(vec!["maize".to_string()]));
        let method = store
            .add_method(Method::new(Term::new("Measured", "", CvId::Methods)))
            .await
            .unwrap();
        let mut property = Property::new(Term::new("Plant height", "", CvId::Properties));
        property.classes.insert("Morphological".to_string());
        let property = store.add_property(property).await.unwrap();
        let mut scale = Scale::new(Term::new("cm", "", CvId::Scales));
        scale.data_type = Some(DataType::Numeric);
        scale.min_value = Some("0".to_string());
        scale.max_value = Some("500".to_string());
        let scale = store.add_scale(scale).await.unwrap();

        Fixture {
            service: VariableService::new(store.clone(), Arc::new(OntologyMapper::default())),
            store,
            property_id: property.term.id,
            method_id: method.term.id,
            scale_id: scale.term.id,
        }
    }

    fn request(f: &Fixture, name: &str, favourite: bool) -> VariableRequest {
        VariableRequest {
            name: Some(name.to_string()),
            description: Some("Plant height in cm".to_string()),
            alias: None,
            property_id: Some(f.property_id.to_string()),
            method_id: Some(f.method_id.to_string()),
            scale_id: Some(f.scale_id.to_string()),
            variable_type_ids: Some(vec!["1808".to_string()]),
            expected_range: Some(ExpectedRange {
                min: Some("10".to_string()),
                max: Some("300".to_string()),
            }),
            favourite: Some(favourite),
        }
    }

    #[tokio::test]
    async fn test_add_and_read_back() {
        let f = fixture().await;
        let created = f.service.add_variable(Some("p1"), &request(&f, "PH_cm", true)).await.unwrap();

        let details = f.service.get_variable(Some("p1"), &created.id).await.unwrap().unwrap();
        assert_eq!(details.name, "PH_cm");
        assert!(details.favourite);
        assert_eq!(details.scale.valid_values.max.as_deref(), Some("500"));
        assert_eq!(details.expected_range.min.as_deref(), Some("10"));
        assert!(details.metadata.deletable);
        assert_eq!(details.metadata.editable_fields.len(), VARIABLE_EDITABLE_FIELDS.len());

        // Favourites belong to the program that set them
        let details = f.service.get_variable(Some("p2"), &created.id).await.unwrap().unwrap();
        assert!(!details.favourite);
    }

    #[tokio::test]
    async fn test_filters() {
        let f = fixture().await;
        f.service.add_variable(Some("p1"), &request(&f, "PH_cm", true)).await.unwrap();

        assert_eq!(f.service.get_all_variables(Some("p1"), None, true).await.unwrap().len(), 1);
        assert!(f.service.get_all_variables(Some("p2"), None, true).await.unwrap().is_empty());

        let property_id = f.property_id.to_string();
        assert_eq!(f.service.get_all_variables(None, Some(&property_id), false).await.unwrap().len(), 1);
        assert!(f.service.get_all_variables(None, Some("1"), false).await.unwrap().is_empty());

        match f.service.get_all_variables(None, Some("x1"), false).await {
            Err(ApiError::Validation(errors)) => assert_eq!(errors[0].code, ErrorCode::InvalidId),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_observed_variable_cannot_be_deleted() {
        let f = fixture().await;
        let created = f.service.add_variable(None, &request(&f, "PH_cm", false)).await.unwrap();
        let id: TermId = created.id.parse().unwrap();
        f.store.mark_observed(id);

        let details = f.service.get_variable(None, &created.id).await.unwrap().unwrap();
        assert!(!details.metadata.deletable);
        assert!(!details.metadata.editable_fields.contains(&"name".to_string()));

        assert!(matches!(f.service.delete_variable(&created.id).await, Err(ApiError::Validation(_))));
        assert!(f.store.get_variable(None, id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_variable() {
        let f = fixture().await;
        let created = f.service.add_variable(Some("p1"), &request(&f, "PH_cm", true)).await.unwrap();

        let mut update = request(&f, "PH_cm", false);
        update.alias = Some("Height".to_string());
        f.service.update_variable(Some("p1"), &created.id, &update).await.unwrap();

        let details = f.service.get_variable(Some("p1"), &created.id).await.unwrap().unwrap();
        assert_eq!(details.alias.as_deref(), Some("Height"));
        assert!(!details.favourite);
    }

    #[tokio::test]
    async fn test_brapi_pages() {
        let f = fixture().await;
        let mut second_scale = Scale::new(Term::new("mm", "", CvId::Scales));
        second_scale.data_type = Some(DataType::Numeric);
        let second_scale = f.store.add_scale(second_scale).await.unwrap();

        f.service.add_variable(None, &request(&f, "PH_cm", false)).await.unwrap();
        let mut other = request(&f, "PH_mm", false);
        other.scale_id = Some(second_scale.term.id.to_string());
        other.expected_range = None;
        let created = f.service.add_variable(None, &other).await.unwrap();

        let page = f.service.list_observation_variables("maize", Some(1), Some(1)).await.unwrap();
        assert_eq!(page.metadata.pagination.total_count, 2);
        assert_eq!(page.metadata.pagination.total_pages, 2);
        assert_eq!(page.result.data.len(), 1);
        assert_eq!(page.result.data[0].observation_variable_db_id, created.id);
        assert_eq!(page.result.data[0].crop, "maize");
        assert_eq!(page.result.data[0].context_of_use, vec!["Trait"]);

        let single = f.service.get_observation_variable("maize", &created.id).await.unwrap().unwrap();
        assert_eq!(single.result.scale.name, "mm");
        assert_eq!(single.result.trait_.class.as_deref(), Some("Morphological"));
    }
}
