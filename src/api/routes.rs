use axum::{middleware, routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::api::crop_interceptor::crop_interceptor;
use crate::api::state::AppState;
use crate::api::{brapi_handlers, handlers, variable_handlers};
use crate::store::traits::Middleware;

/// Crop-scoped routes; every one of them goes through the crop interceptor
fn crop_routes<S: Middleware + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Methods
        .route(
            "/ontology/:cropname/methods",
            get(handlers::list_methods::<S>).post(handlers::add_method::<S>),
        )
        .route(
            "/ontology/:cropname/methods/:id",
            get(handlers::get_method::<S>)
                .put(handlers::update_method::<S>)
                .delete(handlers::delete_method::<S>),
        )
        // Properties
        .route(
            "/ontology/:cropname/properties",
            get(handlers::list_properties::<S>).post(handlers::add_property::<S>),
        )
        .route(
            "/ontology/:cropname/properties/:id",
            get(handlers::get_property::<S>)
                .put(handlers::update_property::<S>)
                .delete(handlers::delete_property::<S>),
        )
        // Scales
        .route(
            "/ontology/:cropname/scales",
            get(handlers::list_scales::<S>).post(handlers::add_scale::<S>),
        )
        .route(
            "/ontology/:cropname/scales/:id",
            get(handlers::get_scale::<S>)
                .put(handlers::update_scale::<S>)
                .delete(handlers::delete_scale::<S>),
        )
        // Variables
        .route(
            "/ontology/:cropname/variables",
            get(variable_handlers::list_variables::<S>).post(variable_handlers::add_variable::<S>),
        )
        .route(
            "/ontology/:cropname/variables/:id",
            get(variable_handlers::get_variable::<S>)
                .put(variable_handlers::update_variable::<S>)
                .delete(variable_handlers::delete_variable::<S>),
        )
        // Lookups
        .route("/ontology/:cropname/datatypes", get(handlers::list_data_types::<S>))
        .route("/ontology/:cropname/classes", get(handlers::list_classes::<S>))
        .route("/ontology/:cropname/variableTypes", get(handlers::list_variable_types::<S>))
        // BrAPI v1
        .route(
            "/:crop/brapi/v1/variables",
            get(brapi_handlers::list_observation_variables::<S>),
        )
        .route(
            "/:crop/brapi/v1/variables/:id",
            get(brapi_handlers::get_observation_variable::<S>),
        )
}

pub fn create_router<S: Middleware + 'static>(state: AppState<S>) -> Router {
    let crop_routes = crop_routes::<S>().route_layer(middleware::from_fn_with_state(
        state.clone(),
        crop_interceptor::<S>,
    ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/crops", get(handlers::list_crops::<S>))
        .merge(crop_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
