// src/models/organization.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::OptionalField;

/// Какие необязательные колонки видит каждая организация.
///
/// Загружается один раз при старте и дальше только читается.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct OrgColumns {
    columns: BTreeMap<String, Vec<OptionalField>>,
}

impl OrgColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Задать колонки организации; повторы схлопываются, порядок сохраняется
    pub fn with_org(
        mut self,
        org_id: impl Into<String>,
        columns: impl IntoIterator<Item = OptionalField>,
    ) -> Self {
        let mut ordered = Vec::new();
        for column in columns {
            if !ordered.contains(&column) {
                ordered.push(column);
            }
        }
        self.columns.insert(org_id.into(), ordered);
        self
    }

    /// Разрешённые колонки организации. Нет записи: пустой набор.
    pub fn visible_for(&self, org_id: &str) -> &[OptionalField] {
        match self.columns.get(org_id) {
            Some(columns) => columns,
            None => &[],
        }
    }

    pub fn is_configured(&self, org_id: &str) -> bool {
        self.columns.contains_key(org_id)
    }

    pub fn organizations(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Повторно применить схлопывание повторов (после десериализации)
    pub fn normalized(self) -> Self {
        self.columns
            .into_iter()
            .fold(OrgColumns::new(), |acc, (org, cols)| acc.with_org(org, cols))
    }
}
