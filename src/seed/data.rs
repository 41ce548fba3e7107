use anyhow::Result;
use std::collections::BTreeSet;

use crate::model::{
    CvId, DataType, Method, Property, Scale, Term, TermId, TermSummary, VariableInfo,
    VariableType,
};
use crate::store::memory::InMemoryMiddleware;
use crate::store::traits::{MethodStore, PropertyStore, ScaleStore, VariableStore};

fn property(name: &str, description: &str, crop_ontology_id: &str, classes: &[&str]) -> Property {
    let mut property = Property::new(Term::new(name, description, CvId::Properties));
    property.crop_ontology_id = Some(crop_ontology_id.to_string());
    property.classes = classes.iter().map(|c| c.to_string()).collect();
    property
}

fn numeric_scale(name: &str, description: &str, min: &str, max: &str) -> Scale {
    let mut scale = Scale::new(Term::new(name, description, CvId::Scales));
    scale.data_type = Some(DataType::Numeric);
    scale.min_value = Some(min.to_string());
    scale.max_value = Some(max.to_string());
    scale
}

fn categorical_scale(name: &str, description: &str, categories: &[(&str, &str)]) -> Scale {
    let mut scale = Scale::new(Term::new(name, description, CvId::Scales));
    scale.data_type = Some(DataType::Categorical);
    scale.categories = categories
        .iter()
        .map(|(name, description)| TermSummary::new(*name, *description))
        .collect();
    scale
}

fn variable(
    name: &str,
    description: &str,
    property_id: TermId,
    method_id: TermId,
    scale_id: TermId,
    variable_types: &[VariableType],
    range: Option<(&str, &str)>,
) -> VariableInfo {
    VariableInfo {
        id: None,
        name: name.to_string(),
        description: description.to_string(),
        alias: None,
        method_id,
        property_id,
        scale_id,
        variable_types: variable_types.iter().copied().collect::<BTreeSet<_>>(),
        min_value: range.map(|(min, _)| min.to_string()),
        max_value: range.map(|(_, max)| max.to_string()),
        favourite: false,
        program_uuid: None,
    }
}

/// Load a small maize trait ontology.
///
/// `PH_M_cm` is marked as observed, so it and the terms it uses come back as
/// referenced; `Unused_score` is a scale nothing refers to.
pub async fn load_seed_data(store: &InMemoryMiddleware) -> Result<()> {
    log::info!("Loading seed ontology");

    let measured = store
        .add_method(Method::new(Term::new("Measured", "Measured with a ruler or scale", CvId::Methods)))
        .await?;
    let visual = store
        .add_method(Method::new(Term::new("Visual", "Visual assessment in the field", CvId::Methods)))
        .await?;
    let counted = store
        .add_method(Method::new(Term::new("Counted", "Counted per plot", CvId::Methods)))
        .await?;

    let plant_height = store
        .add_property(property(
            "Plant height",
            "Height from ground level to the base of the tassel",
            "CO_322:0000018",
            &["Morphological"],
        ))
        .await?;
    let grain_yield = store
        .add_property(property(
            "Grain yield",
            "Weight of shelled grain per unit area",
            "CO_322:0000396",
            &["Agronomic"],
        ))
        .await?;
    let rust = store
        .add_property(property(
            "Common rust",
            "Severity of Puccinia sorghi infection",
            "CO_322:0000125",
            &["Biotic stress"],
        ))
        .await?;
    let ear_count = store
        .add_property(property("Ear number", "Ears per plot", "CO_322:0000042", &["Agronomic"]))
        .await?;

    let cm = store.add_scale(numeric_scale("cm", "Centimetres", "0", "500")).await?;
    let t_ha = store.add_scale(numeric_scale("t/ha", "Tonnes per hectare", "0", "25")).await?;
    let count = store.add_scale(numeric_scale("Number", "Count", "0", "1000")).await?;
    let severity = store
        .add_scale(categorical_scale(
            "Rust score 1-5",
            "Rust severity score",
            &[
                ("1", "No symptoms"),
                ("2", "Few pustules"),
                ("3", "Moderate"),
                ("4", "Severe"),
                ("5", "Very severe"),
            ],
        ))
        .await?;
    store
        .add_scale(categorical_scale("Unused_score", "Score kept for testing", &[("1", "Low"), ("2", "High")]))
        .await?;

    let plant_height_id = store
        .add_variable(variable(
            "PH_M_cm",
            "Plant height measured in centimetres",
            plant_height.term.id,
            measured.term.id,
            cm.term.id,
            &[VariableType::Trait],
            Some(("50", "350")),
        ))
        .await?;
    store
        .add_variable(variable(
            "GY_M_tha",
            "Grain yield in tonnes per hectare",
            grain_yield.term.id,
            measured.term.id,
            t_ha.term.id,
            &[VariableType::Trait, VariableType::Analysis],
            None,
        ))
        .await?;
    store
        .add_variable(variable(
            "RUST_E_1to5",
            "Common rust severity score",
            rust.term.id,
            visual.term.id,
            severity.term.id,
            &[VariableType::Trait],
            None,
        ))
        .await?;
    store
        .add_variable(variable(
            "EARS_C_num",
            "Number of ears per plot",
            ear_count.term.id,
            counted.term.id,
            count.term.id,
            &[VariableType::Trait, VariableType::SelectionMethod],
            None,
        ))
        .await?;

    store.mark_observed(plant_height_id);

    log::info!("Seed ontology loaded");
    Ok(())
}
