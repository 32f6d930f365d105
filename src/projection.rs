// src/projection.rs

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

use crate::models::{Employee, EmployeeId, EmployeeStatus, OptionalField, OrgColumns};

/// Запись в том виде, в каком её может видеть организация.
///
/// Сериализуется плоским объектом: поля идентичности, разрешённые колонки
/// (отсутствующее значение: `null`) и `visible_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedEmployee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub status: EmployeeStatus,
    pub attributes: Vec<(OptionalField, Option<String>)>,
    pub visible_columns: Vec<OptionalField>,
}

impl ProjectedEmployee {
    pub fn get(&self, field: OptionalField) -> Option<Option<&str>> {
        self.attributes
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value.as_deref())
    }

    pub fn has(&self, field: OptionalField) -> bool {
        self.get(field).is_some()
    }
}

impl Serialize for ProjectedEmployee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5 + self.attributes.len()))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("first_name", &self.first_name)?;
        map.serialize_entry("last_name", &self.last_name)?;
        map.serialize_entry("status", &self.status)?;
        for (field, value) in &self.attributes {
            map.serialize_entry(field.as_str(), value)?;
        }
        map.serialize_entry("visible_columns", &self.visible_columns)?;
        map.end()
    }
}

/// Проекция полей с учётом настроек организации
#[derive(Debug, Clone)]
pub struct FieldProjector {
    columns: Arc<OrgColumns>,
}

impl FieldProjector {
    pub fn new(columns: Arc<OrgColumns>) -> Self {
        Self { columns }
    }

    /// Разрешённые колонки организации, по порядку конфигурации
    pub fn visible_columns(&self, org_id: &str) -> &[OptionalField] {
        self.columns.visible_for(org_id)
    }

    /// Колонки, которые реально попадут в ответ.
    ///
    /// Запрошенный список только сужает разрешённый, но не расширяет его.
    pub fn effective_columns(
        &self,
        org_id: &str,
        requested: Option<&[OptionalField]>,
    ) -> Vec<OptionalField> {
        let allowed = self.visible_columns(org_id);
        match requested {
            None => allowed.to_vec(),
            Some(requested) => allowed
                .iter()
                .copied()
                .filter(|column| requested.contains(column))
                .collect(),
        }
    }

    pub fn project(&self, org_id: &str, employee: &Employee) -> ProjectedEmployee {
        self.project_columns(employee, self.effective_columns(org_id, None))
    }

    pub fn project_with(
        &self,
        org_id: &str,
        employee: &Employee,
        requested: Option<&[OptionalField]>,
    ) -> ProjectedEmployee {
        self.project_columns(employee, self.effective_columns(org_id, requested))
    }

    fn project_columns(&self, employee: &Employee, columns: Vec<OptionalField>) -> ProjectedEmployee {
        ProjectedEmployee {
            id: employee.id,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            status: employee.status,
            attributes: columns
                .iter()
                .map(|field| (*field, employee.attribute(*field).map(str::to_string)))
                .collect(),
            visible_columns: columns,
        }
    }
}
