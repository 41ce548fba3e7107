use serde::{Deserialize, Serialize};

/// BrAPI v1 response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrapiResponse<T> {
    pub metadata: BrapiMetadata,
    pub result: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrapiMetadata {
    pub pagination: Pagination,
    pub status: Vec<serde_json::Value>,
    pub datafiles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_size: usize,
    pub current_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

impl Pagination {
    /// Pages are zero-based, as BrAPI v1 defines them
    pub fn new(current_page: usize, page_size: usize, total_count: usize) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(page_size)
        };
        Self {
            page_size,
            current_page,
            total_count,
            total_pages,
        }
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.current_page.saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataList<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrapiTrait {
    pub trait_db_id: String,
    pub name: String,
    pub description: String,
    pub class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrapiMethod {
    pub method_db_id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrapiCategory {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrapiValidValues {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub categories: Vec<BrapiCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrapiScale {
    pub scale_db_id: String,
    pub name: String,
    pub data_type: Option<String>,
    pub valid_values: BrapiValidValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationVariable {
    pub observation_variable_db_id: String,
    pub observation_variable_name: String,
    pub name: String,
    pub synonyms: Vec<String>,
    pub context_of_use: Vec<String>,
    pub crop: String,
    #[serde(rename = "trait")]
    pub trait_: BrapiTrait,
    pub method: BrapiMethod,
    pub scale: BrapiScale,
    pub default_value: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_pages() {
        let pagination = Pagination::new(0, 2, 5);
        assert_eq!(pagination.total_pages, 3);

        let items = [1, 2, 3, 4, 5];
        assert_eq!(pagination.slice(&items), &[1, 2]);
        assert_eq!(Pagination::new(2, 2, 5).slice(&items), &[5]);
        assert!(Pagination::new(7, 2, 5).slice(&items).is_empty());
        assert_eq!(Pagination::new(0, 0, 5).total_pages, 0);
    }
}
