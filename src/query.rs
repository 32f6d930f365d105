// src/query.rs

//! Поиск, фильтрация и пагинация записей одной организации.
//!
//! Порядок результата: по возрастанию `id`. Идентификатор уникален внутри
//! организации, поэтому порядок полный и не зависит от порядка хранения.

use serde::{Deserialize, Serialize};

use crate::models::{Employee, EmployeeStatus, OptionalField};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Атрибуты, по которым работает текстовый поиск (company не входит)
const SEARCHABLE: [OptionalField; 3] = [
    OptionalField::Department,
    OptionalField::Position,
    OptionalField::Location,
];

/// Параметры поиска сотрудников
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeQuery {
    pub search: Option<String>,
    pub statuses: Vec<String>,
    pub locations: Vec<String>,
    pub companies: Vec<String>,
    pub departments: Vec<String>,
    pub positions: Vec<String>,
    pub include_terminated: bool,
    pub page: i64,
    pub page_size: i64,
}

impl EmployeeQuery {
    /// Номер страницы; значения меньше 1 заменяются на 1
    pub fn effective_page(&self) -> u64 {
        if self.page <= 0 {
            DEFAULT_PAGE
        } else {
            self.page as u64
        }
    }

    /// Размер страницы; значения меньше 1 заменяются на 50
    pub fn effective_page_size(&self) -> u64 {
        if self.page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size as u64
        }
    }

    /// Нормализованная строка поиска; пустая считается отсутствующей
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn attribute_filters(&self) -> [(OptionalField, &[String]); 4] {
        [
            (OptionalField::Location, self.locations.as_slice()),
            (OptionalField::Company, self.companies.as_slice()),
            (OptionalField::Department, self.departments.as_slice()),
            (OptionalField::Position, self.positions.as_slice()),
        ]
    }

    /// Проходит ли запись все активные фильтры
    pub fn matches(&self, employee: &Employee) -> bool {
        self.matches_with(employee, self.needle().as_deref())
    }

    fn matches_with(&self, employee: &Employee, needle: Option<&str>) -> bool {
        if !self.include_terminated && employee.status == EmployeeStatus::Terminated {
            return false;
        }

        if !self.statuses.is_empty()
            && !self.statuses.iter().any(|s| s == employee.status.as_str())
        {
            return false;
        }

        for (field, allowed) in self.attribute_filters() {
            if allowed.is_empty() {
                continue;
            }
            match employee.attribute(field) {
                Some(value) if allowed.iter().any(|a| a == value) => {}
                _ => return false,
            }
        }

        match needle {
            None => true,
            Some(needle) => {
                let contains = |value: &str| value.to_lowercase().contains(needle);
                contains(employee.first_name.as_str())
                    || contains(employee.last_name.as_str())
                    || SEARCHABLE
                        .iter()
                        .filter_map(|field| employee.attribute(*field))
                        .any(contains)
            }
        }
    }
}

/// Результат поиска: страница и общее число совпадений до пагинации
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> QueryPage<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> QueryPage<U> {
        QueryPage {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1))
    }
}

/// Отфильтровать записи организации и вырезать запрошенную страницу.
///
/// Записи чужих организаций отбрасываются до фильтрации.
pub fn evaluate(org_id: &str, records: &[Employee], query: &EmployeeQuery) -> QueryPage<Employee> {
    let needle = query.needle();

    let mut matched: Vec<&Employee> = records
        .iter()
        .filter(|e| e.organization_id == org_id)
        .filter(|e| query.matches_with(e, needle.as_deref()))
        .collect();
    matched.sort_by_key(|e| e.id);

    let page = query.effective_page();
    let page_size = query.effective_page_size();
    let total = matched.len() as u64;

    let offset = (page - 1).saturating_mul(page_size);
    let items = if offset >= total {
        Vec::new()
    } else {
        matched
            .into_iter()
            .skip(offset as usize)
            .take(page_size as usize)
            .cloned()
            .collect()
    };

    QueryPage {
        items,
        total,
        page,
        page_size,
    }
}
