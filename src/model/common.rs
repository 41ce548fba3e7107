use serde::{Deserialize, Serialize};

pub type TermId = i32;

/// Controlled vocabularies partitioning ontology terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CvId {
    TraitClass,
    Properties,
    Methods,
    Scales,
    Variables,
}

impl std::fmt::Display for CvId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CvId::TraitClass => write!(f, "class"),
            CvId::Properties => write!(f, "property"),
            CvId::Methods => write!(f, "method"),
            CvId::Scales => write!(f, "scale"),
            CvId::Variables => write!(f, "variable"),
        }
    }
}

/// Data types a scale can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DataType {
    Numeric,
    Date,
    Character,
    Categorical,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Categorical,
        DataType::Numeric,
        DataType::Character,
        DataType::Date,
    ];

    pub fn id(&self) -> i32 {
        match self {
            DataType::Numeric => 1110,
            DataType::Date => 1117,
            DataType::Character => 1120,
            DataType::Categorical => 1130,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Numeric => "Numeric",
            DataType::Date => "Date",
            DataType::Character => "Character",
            DataType::Categorical => "Categorical",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|data_type| data_type.id() == id)
    }
}

/// Roles a variable can play in a study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableType {
    GermplasmDescriptor,
    StudyDetail,
    EnvironmentDetail,
    EnvironmentCondition,
    Trait,
    TreatmentFactor,
    ExperimentalDesign,
    Analysis,
    SelectionMethod,
}

impl VariableType {
    pub const ALL: [VariableType; 9] = [
        VariableType::GermplasmDescriptor,
        VariableType::StudyDetail,
        VariableType::EnvironmentDetail,
        VariableType::EnvironmentCondition,
        VariableType::Trait,
        VariableType::TreatmentFactor,
        VariableType::ExperimentalDesign,
        VariableType::Analysis,
        VariableType::SelectionMethod,
    ];

    pub fn id(&self) -> i32 {
        match self {
            VariableType::GermplasmDescriptor => 1804,
            VariableType::StudyDetail => 1805,
            VariableType::EnvironmentDetail => 1806,
            VariableType::EnvironmentCondition => 1807,
            VariableType::Trait => 1808,
            VariableType::TreatmentFactor => 1809,
            VariableType::ExperimentalDesign => 1810,
            VariableType::Analysis => 1811,
            VariableType::SelectionMethod => 1812,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VariableType::GermplasmDescriptor => "Germplasm Descriptor",
            VariableType::StudyDetail => "Study Detail",
            VariableType::EnvironmentDetail => "Environment Detail",
            VariableType::EnvironmentCondition => "Environment Condition",
            VariableType::Trait => "Trait",
            VariableType::TreatmentFactor => "Treatment Factor",
            VariableType::ExperimentalDesign => "Experimental Design",
            VariableType::Analysis => "Analysis",
            VariableType::SelectionMethod => "Selection Method",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VariableType::GermplasmDescriptor => "Characteristics of germplasm to be recorded during a study",
            VariableType::StudyDetail => "Information to be recorded about the study",
            VariableType::EnvironmentDetail => "Administrative details to be tracked per environment",
            VariableType::EnvironmentCondition => "Environmental conditions that are measured",
            VariableType::Trait => "Characteristics of a germplasm to be recorded during a study",
            VariableType::TreatmentFactor => "Treatments to be applied to members of a trial",
            VariableType::ExperimentalDesign => "Experimental design variables",
            VariableType::Analysis => "Variables created as the output of analysis",
            VariableType::SelectionMethod => "How material is chosen for advancing",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|variable_type| variable_type.id() == id)
    }
}

/// Parse a string as a number, tolerating surrounding whitespace.
pub fn safe_parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Compare two optional bound values the way persisted scales are compared:
/// blank is absent, numeric values compare by value, anything else by trimmed text.
pub fn bounds_equal(left: Option<&str>, right: Option<&str>) -> bool {
    let left = left.map(str::trim).filter(|v| !v.is_empty());
    let right = right.map(str::trim).filter(|v| !v.is_empty());

    match (left, right) {
        (None, None) => true,
        (Some(l), Some(r)) => match (safe_parse_f64(l), safe_parse_f64(r)) {
            (Some(a), Some(b)) => a == b,
            _ => l == r,
        },
        _ => false,
    }
}
