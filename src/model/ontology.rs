use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{CvId, DataType, TermId, VariableType};

/// A named, vocabulary-scoped ontology term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub definition: String,
    pub vocabulary: CvId,
}

impl Term {
    /// A term that has not been persisted yet (id 0)
    pub fn new(name: impl Into<String>, definition: impl Into<String>, vocabulary: CvId) -> Self {
        Self {
            id: 0,
            name: name.into(),
            definition: definition.into(),
            vocabulary,
        }
    }
}

/// Minimal term projection, used for scale categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSummary {
    pub id: Option<TermId>,
    pub name: String,
    pub definition: String,
}

impl TermSummary {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            definition: definition.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub term: Term,
    pub date_created: Option<DateTime<Utc>>,
    pub date_last_modified: Option<DateTime<Utc>>,
}

impl Method {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            date_created: None,
            date_last_modified: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub term: Term,
    pub crop_ontology_id: Option<String>,
    pub classes: BTreeSet<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_last_modified: Option<DateTime<Utc>>,
}

impl Property {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            crop_ontology_id: None,
            classes: BTreeSet::new(),
            date_created: None,
            date_last_modified: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub term: Term,
    pub data_type: Option<DataType>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub categories: Vec<TermSummary>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_last_modified: Option<DateTime<Utc>>,
}

impl Scale {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            data_type: None,
            min_value: None,
            max_value: None,
            categories: Vec::new(),
            date_created: None,
            date_last_modified: None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.data_type == Some(DataType::Numeric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub term: Term,
    pub alias: Option<String>,
    pub method: Method,
    pub property: Property,
    pub scale: Scale,
    pub variable_types: BTreeSet<VariableType>,
    /// Expected range, only meaningful for numeric scales
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub favourite: bool,
    pub program_uuid: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub date_last_modified: Option<DateTime<Utc>>,
}

/// Write-side shape of a variable: references by id instead of embedded terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub id: Option<TermId>,
    pub name: String,
    pub description: String,
    pub alias: Option<String>,
    pub method_id: TermId,
    pub property_id: TermId,
    pub scale_id: TermId,
    pub variable_types: BTreeSet<VariableType>,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub favourite: bool,
    pub program_uuid: Option<String>,
}

/// Criteria for variable listings; empty criteria match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableFilter {
    pub program_uuid: Option<String>,
    pub favourites_only: bool,
    pub property_ids: Vec<TermId>,
    pub method_ids: Vec<TermId>,
    pub scale_ids: Vec<TermId>,
}

impl VariableFilter {
    pub fn for_program(program_uuid: Option<String>) -> Self {
        Self {
            program_uuid,
            ..Default::default()
        }
    }

    pub fn matches(&self, variable: &Variable) -> bool {
        if self.favourites_only && !variable.favourite {
            return false;
        }
        if !self.property_ids.is_empty() && !self.property_ids.contains(&variable.property.term.id) {
            return false;
        }
        if !self.method_ids.is_empty() && !self.method_ids.contains(&variable.method.term.id) {
            return false;
        }
        if !self.scale_ids.is_empty() && !self.scale_ids.contains(&variable.scale.term.id) {
            return false;
        }
        true
    }
}
