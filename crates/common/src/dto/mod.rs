//! Transfer objects returned by the read helpers

use crate::db::models::SourceData;
use serde::{Deserialize, Serialize};

/// Source data listing; `data` is always present, empty when nothing matched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListSourceDataDto {
    #[serde(default)]
    pub data: Vec<SourceData>,
}

impl ListSourceDataDto {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<SourceData>> for ListSourceDataDto {
    fn from(data: Vec<SourceData>) -> Self {
        Self { data }
    }
}

impl IntoIterator for ListSourceDataDto {
    type Item = SourceData;
    type IntoIter = std::vec::IntoIter<SourceData>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}
