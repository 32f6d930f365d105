// src/models/employee.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Идентификатор сотрудника, уникален только внутри организации
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Статус сотрудника; порядок вариантов задаёт порядок сортировки
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EmployeeStatus {
    #[default]
    Active,
    #[serde(rename = "Not started")]
    NotStarted,
    Terminated,
}

impl EmployeeStatus {
    pub const ALL: [EmployeeStatus; 3] = [
        EmployeeStatus::Active,
        EmployeeStatus::NotStarted,
        EmployeeStatus::Terminated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "Active",
            EmployeeStatus::NotStarted => "Not started",
            EmployeeStatus::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmployeeStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// Необязательные атрибуты, видимость которых настраивается по организации
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum OptionalField {
    Department,
    Position,
    Location,
    Company,
}

impl OptionalField {
    pub const ALL: [OptionalField; 4] = [
        OptionalField::Department,
        OptionalField::Position,
        OptionalField::Location,
        OptionalField::Company,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionalField::Department => "department",
            OptionalField::Position => "position",
            OptionalField::Location => "location",
            OptionalField::Company => "company",
        }
    }
}

impl fmt::Display for OptionalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionalField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown column '{}'", s))
    }
}

/// Запись о сотруднике.
///
/// `organization_id` назначается при создании и больше не меняется.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: EmployeeId,
    pub organization_id: String,
    pub first_name: String,
    pub last_name: String,
    pub status: EmployeeStatus,
    pub department: Option<String>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub company: Option<String>,
}

impl Employee {
    /// Значение необязательного атрибута
    pub fn attribute(&self, field: OptionalField) -> Option<&str> {
        match field {
            OptionalField::Department => self.department.as_deref(),
            OptionalField::Position => self.position.as_deref(),
            OptionalField::Location => self.location.as_deref(),
            OptionalField::Company => self.company.as_deref(),
        }
    }
}

/// Данные для создания сотрудника: без `id` и организации,
/// их назначает хранилище.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct NewEmployee {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl NewEmployee {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, field: OptionalField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            OptionalField::Department => self.department = value,
            OptionalField::Position => self.position = value,
            OptionalField::Location => self.location = value,
            OptionalField::Company => self.company = value,
        }
        self
    }

    pub fn with_status(mut self, status: EmployeeStatus) -> Self {
        self.status = status;
        self
    }

    /// Проверка обязательных полей; пустые строки в атрибутах превращаются в `None`
    pub fn validate(mut self) -> Result<Self, String> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();

        if self.first_name.is_empty() {
            return Err("first_name is required".to_string());
        }
        if self.last_name.is_empty() {
            return Err("last_name is required".to_string());
        }

        for slot in [
            &mut self.department,
            &mut self.position,
            &mut self.location,
            &mut self.company,
        ] {
            *slot = slot
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }

        Ok(self)
    }

    /// Превратить в запись с назначенными идентификаторами
    pub fn into_employee(self, id: EmployeeId, organization_id: &str) -> Employee {
        Employee {
            id,
            organization_id: organization_id.to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            status: self.status,
            department: self.department,
            position: self.position,
            location: self.location,
            company: self.company,
        }
    }
}
