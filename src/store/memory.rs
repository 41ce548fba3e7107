use anyhow::{anyhow, Result};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::{
    CvId, Method, Property, Scale, Term, TermId, Variable, VariableFilter, VariableInfo,
    VariableType,
};
use crate::store::traits::{
    CropStore, MethodStore, PropertyStore, ScaleStore, TermInUse, TermStore, VariableStore,
};

const FIRST_TERM_ID: TermId = 20000;

#[derive(Debug, Clone)]
struct StoredVariable {
    term: Term,
    alias: Option<String>,
    method_id: TermId,
    property_id: TermId,
    scale_id: TermId,
    variable_types: BTreeSet<VariableType>,
    min_value: Option<String>,
    max_value: Option<String>,
    date_created: chrono::DateTime<Utc>,
    date_last_modified: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct OntologyData {
    next_id: TermId,
    classes: BTreeMap<TermId, Term>,
    methods: BTreeMap<TermId, Method>,
    properties: BTreeMap<TermId, Property>,
    scales: BTreeMap<TermId, Scale>,
    variables: BTreeMap<TermId, StoredVariable>,
    /// (program uuid, variable id)
    favourites: HashSet<(String, TermId)>,
    /// Variables that have observations or study usage recorded against them
    observed: HashSet<TermId>,
}

impl OntologyData {
    fn allocate_id(&mut self) -> TermId {
        if self.next_id < FIRST_TERM_ID {
            self.next_id = FIRST_TERM_ID;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn term(&self, id: TermId) -> Option<Term> {
        self.methods
            .get(&id)
            .map(|m| m.term.clone())
            .or_else(|| self.properties.get(&id).map(|p| p.term.clone()))
            .or_else(|| self.scales.get(&id).map(|s| s.term.clone()))
            .or_else(|| self.variables.get(&id).map(|v| v.term.clone()))
            .or_else(|| self.classes.get(&id).cloned())
    }

    fn terms_in(&self, cv: CvId) -> Vec<&Term> {
        match cv {
            CvId::TraitClass => self.classes.values().collect(),
            CvId::Methods => self.methods.values().map(|m| &m.term).collect(),
            CvId::Properties => self.properties.values().map(|p| &p.term).collect(),
            CvId::Scales => self.scales.values().map(|s| &s.term).collect(),
            CvId::Variables => self.variables.values().map(|v| &v.term).collect(),
        }
    }

    fn is_referred(&self, id: TermId) -> bool {
        if self.variables.contains_key(&id) {
            return self.observed.contains(&id);
        }
        if let Some(class) = self.classes.get(&id) {
            return self
                .properties
                .values()
                .any(|p| p.classes.iter().any(|c| c.eq_ignore_ascii_case(&class.name)));
        }

        self.variables
            .values()
            .any(|v| v.method_id == id || v.property_id == id || v.scale_id == id)
    }

    /// Checked under the same write lock as the removal
    fn ensure_unreferenced(&self, id: TermId) -> Result<()> {
        if self.is_referred(id) {
            return Err(TermInUse(id).into());
        }
        Ok(())
    }

    fn ensure_classes(&mut self, classes: &BTreeSet<String>) {
        for class_name in classes {
            let exists = self
                .classes
                .values()
                .any(|c| c.name.eq_ignore_ascii_case(class_name));
            if !exists {
                let id = self.allocate_id();
                let mut term = Term::new(class_name.clone(), class_name.clone(), CvId::TraitClass);
                term.id = id;
                self.classes.insert(id, term);
            }
        }
    }

    fn assemble_variable(&self, stored: &StoredVariable, program_uuid: Option<&str>) -> Result<Variable> {
        let method = self
            .methods
            .get(&stored.method_id)
            .cloned()
            .ok_or_else(|| anyhow!("Method {} of variable {} is missing", stored.method_id, stored.term.id))?;
        let property = self
            .properties
            .get(&stored.property_id)
            .cloned()
            .ok_or_else(|| anyhow!("Property {} of variable {} is missing", stored.property_id, stored.term.id))?;
        let scale = self
            .scales
            .get(&stored.scale_id)
            .cloned()
            .ok_or_else(|| anyhow!("Scale {} of variable {} is missing", stored.scale_id, stored.term.id))?;

        let favourite = program_uuid
            .map(|program| self.favourites.contains(&(program.to_string(), stored.term.id)))
            .unwrap_or(false);

        Ok(Variable {
            term: stored.term.clone(),
            alias: stored.alias.clone(),
            method,
            property,
            scale,
            variable_types: stored.variable_types.clone(),
            min_value: stored.min_value.clone(),
            max_value: stored.max_value.clone(),
            favourite,
            program_uuid: program_uuid.map(str::to_string),
            date_created: Some(stored.date_created),
            date_last_modified: stored.date_last_modified,
        })
    }

    fn set_favourite(&mut self, program_uuid: Option<&str>, id: TermId, favourite: bool) {
        let Some(program) = program_uuid else {
            return;
        };
        let key = (program.to_string(), id);
        if favourite {
            self.favourites.insert(key);
        } else {
            self.favourites.remove(&key);
        }
    }
}

/// Middleware implementation backed by process memory.
///
/// Serves development runs, seeding and tests. All methods take the lock for
/// the duration of a single call only.
#[derive(Debug)]
pub struct InMemoryMiddleware {
    data: RwLock<OntologyData>,
    crops: Vec<String>,
}

impl InMemoryMiddleware {
    pub fn new(crops: Vec<String>) -> Self {
        Self {
            data: RwLock::new(OntologyData::default()),
            crops,
        }
    }

    /// Record observation usage for a variable, which locks it against edits
    pub fn mark_observed(&self, variable_id: TermId) {
        self.data.write().observed.insert(variable_id);
    }
}

#[async_trait::async_trait]
impl TermStore for InMemoryMiddleware {
    async fn get_term_by_id(&self, id: TermId) -> Result<Option<Term>> {
        Ok(self.data.read().term(id))
    }

    async fn get_term_by_name_and_cv(&self, name: &str, cv: CvId) -> Result<Option<Term>> {
        let data = self.data.read();
        let term = data
            .terms_in(cv)
            .into_iter()
            .find(|t| t.name.trim().eq_ignore_ascii_case(name.trim()))
            .cloned();
        Ok(term)
    }

    async fn is_term_referred(&self, id: TermId) -> Result<bool> {
        Ok(self.data.read().is_referred(id))
    }
}

#[async_trait::async_trait]
impl MethodStore for InMemoryMiddleware {
    async fn get_all_methods(&self) -> Result<Vec<Method>> {
        Ok(self.data.read().methods.values().cloned().collect())
    }

    async fn get_method(&self, id: TermId) -> Result<Option<Method>> {
        Ok(self.data.read().methods.get(&id).cloned())
    }

    async fn add_method(&self, mut method: Method) -> Result<Method> {
        let mut data = self.data.write();
        method.term.id = data.allocate_id();
        method.term.vocabulary = CvId::Methods;
        method.date_created = Some(Utc::now());
        method.date_last_modified = None;
        data.methods.insert(method.term.id, method.clone());
        Ok(method)
    }

    async fn update_method(&self, mut method: Method) -> Result<()> {
        let mut data = self.data.write();
        let existing = data
            .methods
            .get(&method.term.id)
            .ok_or_else(|| anyhow!("Method {} not found", method.term.id))?;
        method.term.vocabulary = CvId::Methods;
        method.date_created = existing.date_created;
        method.date_last_modified = Some(Utc::now());
        data.methods.insert(method.term.id, method);
        Ok(())
    }

    async fn delete_method(&self, id: TermId) -> Result<()> {
        let mut data = self.data.write();
        data.ensure_unreferenced(id)?;
        data.methods
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("Method {} not found", id))
    }
}

#[async_trait::async_trait]
impl PropertyStore for InMemoryMiddleware {
    async fn get_all_properties(&self) -> Result<Vec<Property>> {
        Ok(self.data.read().properties.values().cloned().collect())
    }

    async fn get_properties_by_class(&self, class_name: &str) -> Result<Vec<Property>> {
        let data = self.data.read();
        Ok(data
            .properties
            .values()
            .filter(|p| p.classes.iter().any(|c| c.eq_ignore_ascii_case(class_name)))
            .cloned()
            .collect())
    }

    async fn get_property(&self, id: TermId) -> Result<Option<Property>> {
        Ok(self.data.read().properties.get(&id).cloned())
    }

    async fn add_property(&self, mut property: Property) -> Result<Property> {
        let mut data = self.data.write();
        data.ensure_classes(&property.classes);
        property.term.id = data.allocate_id();
        property.term.vocabulary = CvId::Properties;
        property.date_created = Some(Utc::now());
        property.date_last_modified = None;
        data.properties.insert(property.term.id, property.clone());
        Ok(property)
    }

    async fn update_property(&self, mut property: Property) -> Result<()> {
        let mut data = self.data.write();
        let date_created = data
            .properties
            .get(&property.term.id)
            .ok_or_else(|| anyhow!("Property {} not found", property.term.id))?
            .date_created;
        data.ensure_classes(&property.classes);
        property.term.vocabulary = CvId::Properties;
        property.date_created = date_created;
        property.date_last_modified = Some(Utc::now());
        data.properties.insert(property.term.id, property);
        Ok(())
    }

    async fn delete_property(&self, id: TermId) -> Result<()> {
        let mut data = self.data.write();
        data.ensure_unreferenced(id)?;
        data.properties
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("Property {} not found", id))
    }

    async fn get_all_classes(&self) -> Result<Vec<Term>> {
        Ok(self.data.read().classes.values().cloned().collect())
    }
}

#[async_trait::async_trait]
impl ScaleStore for InMemoryMiddleware {
    async fn get_all_scales(&self) -> Result<Vec<Scale>> {
        Ok(self.data.read().scales.values().cloned().collect())
    }

    async fn get_scale(&self, id: TermId) -> Result<Option<Scale>> {
        Ok(self.data.read().scales.get(&id).cloned())
    }

    async fn add_scale(&self, mut scale: Scale) -> Result<Scale> {
        let mut data = self.data.write();
        scale.term.id = data.allocate_id();
        scale.term.vocabulary = CvId::Scales;
        for category in scale.categories.iter_mut() {
            category.id = Some(data.allocate_id());
        }
        scale.date_created = Some(Utc::now());
        scale.date_last_modified = None;
        data.scales.insert(scale.term.id, scale.clone());
        Ok(scale)
    }

    async fn update_scale(&self, mut scale: Scale) -> Result<()> {
        let mut data = self.data.write();
        let existing = data
            .scales
            .get(&scale.term.id)
            .cloned()
            .ok_or_else(|| anyhow!("Scale {} not found", scale.term.id))?;

        // Categories keep their ids when their label survives the update
        for category in scale.categories.iter_mut() {
            category.id = existing
                .categories
                .iter()
                .find(|c| c.name == category.name)
                .and_then(|c| c.id);
            if category.id.is_none() {
                category.id = Some(data.allocate_id());
            }
        }

        scale.term.vocabulary = CvId::Scales;
        scale.date_created = existing.date_created;
        scale.date_last_modified = Some(Utc::now());
        data.scales.insert(scale.term.id, scale);
        Ok(())
    }

    async fn delete_scale(&self, id: TermId) -> Result<()> {
        let mut data = self.data.write();
        data.ensure_unreferenced(id)?;
        data.scales
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("Scale {} not found", id))
    }
}

#[async_trait::async_trait]
impl VariableStore for InMemoryMiddleware {
    async fn get_variables(&self, filter: &VariableFilter) -> Result<Vec<Variable>> {
        let data = self.data.read();
        let program = filter.program_uuid.as_deref();

        let mut variables = Vec::new();
        for stored in data.variables.values() {
            let variable = data.assemble_variable(stored, program)?;
            if filter.matches(&variable) {
                variables.push(variable);
            }
        }
        Ok(variables)
    }

    async fn get_variable(&self, program_uuid: Option<&str>, id: TermId) -> Result<Option<Variable>> {
        let data = self.data.read();
        data.variables
            .get(&id)
            .map(|stored| data.assemble_variable(stored, program_uuid))
            .transpose()
    }

    async fn add_variable(&self, info: VariableInfo) -> Result<TermId> {
        let mut data = self.data.write();
        for (kind, id, present) in [
            ("method", info.method_id, data.methods.contains_key(&info.method_id)),
            ("property", info.property_id, data.properties.contains_key(&info.property_id)),
            ("scale", info.scale_id, data.scales.contains_key(&info.scale_id)),
        ] {
            if !present {
                return Err(anyhow!("Cannot add variable: {} {} does not exist", kind, id));
            }
        }

        let id = data.allocate_id();
        let mut term = Term::new(info.name, info.description, CvId::Variables);
        term.id = id;
        data.variables.insert(
            id,
            StoredVariable {
                term,
                alias: info.alias,
                method_id: info.method_id,
                property_id: info.property_id,
                scale_id: info.scale_id,
                variable_types: info.variable_types,
                min_value: info.min_value,
                max_value: info.max_value,
                date_created: Utc::now(),
                date_last_modified: None,
            },
        );
        data.set_favourite(info.program_uuid.as_deref(), id, info.favourite);
        Ok(id)
    }

    async fn update_variable(&self, info: VariableInfo) -> Result<()> {
        let id = info
            .id
            .ok_or_else(|| anyhow!("Cannot update a variable without an id"))?;
        let mut data = self.data.write();
        let stored = data
            .variables
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Variable {} not found", id))?;

        stored.term.name = info.name;
        stored.term.definition = info.description;
        stored.alias = info.alias;
        stored.method_id = info.method_id;
        stored.property_id = info.property_id;
        stored.scale_id = info.scale_id;
        stored.variable_types = info.variable_types;
        stored.min_value = info.min_value;
        stored.max_value = info.max_value;
        stored.date_last_modified = Some(Utc::now());

        data.set_favourite(info.program_uuid.as_deref(), id, info.favourite);
        Ok(())
    }

    async fn delete_variable(&self, id: TermId) -> Result<()> {
        let mut data = self.data.write();
        data.ensure_unreferenced(id)?;
        data.variables
            .remove(&id)
            .ok_or_else(|| anyhow!("Variable {} not found", id))?;
        data.favourites.retain(|(_, variable_id)| *variable_id != id);
        data.observed.remove(&id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CropStore for InMemoryMiddleware {
    async fn list_crops(&self) -> Result<Vec<String>> {
        Ok(self.crops.clone())
    }

    async fn is_valid_crop(&self, crop_name: &str) -> Result<bool> {
        Ok(self.crops.iter().any(|c| c.eq_ignore_ascii_case(crop_name)))
    }
}
