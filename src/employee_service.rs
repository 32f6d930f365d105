// src/employee_service.rs

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::audit_log;
use crate::csv_io::{self, SkippedRow};
use crate::error::{Result, ServiceError};
use crate::events::EventHub;
use crate::models::{EmployeeStatus, NewEmployee, OptionalField};
use crate::projection::{FieldProjector, ProjectedEmployee};
use crate::query::{self, EmployeeQuery, QueryPage};
use crate::store::RecordStore;

/// Значения для выпадающих фильтров организации
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilterOptions {
    pub statuses: Vec<EmployeeStatus>,
    pub locations: Vec<String>,
    pub companies: Vec<String>,
    pub departments: Vec<String>,
    pub positions: Vec<String>,
    pub visible_columns: Vec<OptionalField>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Сервис сотрудников: хранилище, поиск, проекция и аудит
pub struct EmployeeService {
    store: Arc<dyn RecordStore>,
    projector: FieldProjector,
    events: Arc<EventHub>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn RecordStore>, projector: FieldProjector, events: Arc<EventHub>) -> Self {
        Self {
            store,
            projector,
            events,
        }
    }

    pub fn projector(&self) -> &FieldProjector {
        &self.projector
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    // === ПОИСК ===

    pub fn search(
        &self,
        org_id: &str,
        query: &EmployeeQuery,
        columns: Option<&[OptionalField]>,
    ) -> Result<QueryPage<ProjectedEmployee>> {
        let records = self.store.all_for_org(org_id)?;
        let page = query::evaluate(org_id, &records, query);
        debug!(
            org = org_id,
            total = page.total,
            page = page.page,
            page_size = page.page_size,
            "employee search"
        );
        Ok(page.map(|employee| self.projector.project_with(org_id, &employee, columns)))
    }

    pub fn filter_options(&self, org_id: &str) -> Result<FilterOptions> {
        let records = self.store.all_for_org(org_id)?;

        let distinct = |field: OptionalField| -> Vec<String> {
            records
                .iter()
                .filter_map(|e| e.attribute(field))
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        };

        let statuses: Vec<EmployeeStatus> = records
            .iter()
            .map(|e| e.status)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(FilterOptions {
            statuses,
            locations: distinct(OptionalField::Location),
            companies: distinct(OptionalField::Company),
            departments: distinct(OptionalField::Department),
            positions: distinct(OptionalField::Position),
            visible_columns: self.projector.visible_columns(org_id).to_vec(),
        })
    }

    // === СОЗДАНИЕ И ИМПОРТ ===

    pub fn create(
        &self,
        org_id: &str,
        record: NewEmployee,
        client: Option<String>,
    ) -> Result<ProjectedEmployee> {
        let record = record.validate().map_err(ServiceError::Validation)?;
        let employee = self.store.insert(org_id, record)?;

        info!(org = org_id, id = %employee.id, "employee created");
        audit_log!(self.events, "employees.create", org_id, client, "id" => employee.id);

        Ok(self.projector.project(org_id, &employee))
    }

    /// Импорт CSV: плохие строки пропускаются и перечисляются в ответе
    pub fn import_csv(
        &self,
        org_id: &str,
        bytes: &[u8],
        client: Option<String>,
    ) -> Result<ImportSummary> {
        let parsed = csv_io::parse_import(bytes)?;
        let inserted = self.store.insert_many(org_id, parsed.records)?;

        info!(
            org = org_id,
            imported = inserted.len(),
            skipped = parsed.skipped.len(),
            "employees imported"
        );
        audit_log!(
            self.events,
            "employees.import",
            org_id,
            client,
            "imported" => inserted.len(),
            "skipped" => parsed.skipped.len()
        );

        Ok(ImportSummary {
            imported: inserted.len(),
            skipped: parsed.skipped,
        })
    }

    // === ЭКСПОРТ ===

    /// Полная выгрузка организации, без учёта видимых колонок
    pub fn export_csv(&self, org_id: &str, client: Option<String>) -> Result<Vec<u8>> {
        let records = self.store.all_for_org(org_id)?;
        let body = csv_io::render_export(&records)?;

        audit_log!(self.events, "employees.export", org_id, client, "rows" => records.len());
        Ok(body)
    }

    /// Заполнить пустое хранилище демонстрационными данными
    pub fn seed_demo_data(&self) -> Result<usize> {
        if !self.store.is_empty()? {
            debug!("store already contains data, skipping seed");
            return Ok(0);
        }

        let person = |first: &str, last: &str, dept: &str, pos: &str, loc: &str, company: &str| {
            NewEmployee::new(first, last)
                .with(OptionalField::Department, dept)
                .with(OptionalField::Position, pos)
                .with(OptionalField::Location, loc)
                .with(OptionalField::Company, company)
        };

        let org_1 = vec![
            person("Amelia", "Last", "asd", "Assistant Manager", "Singapore", "Sleek"),
            person("Ana", "Test", "No department", "No position", "No location", "Sleek"),
            person("Arlani", "Sosaia", "No department", "No position", "Somewhere", "Sleek")
                .with_status(EmployeeStatus::NotStarted),
            person("Terminated", "Employee", "No department", "No position", "Nowhere", "Sleek")
                .with_status(EmployeeStatus::Terminated),
        ];
        let org_2 = vec![person(
            "OtherOrg",
            "User",
            "Other Department",
            "Other Position",
            "Other City",
            "Other Co",
        )];

        let seeded = self.store.insert_many("org-1", org_1)?.len()
            + self.store.insert_many("org-2", org_2)?.len();
        info!(seeded, "🌱 demo employees seeded");
        Ok(seeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrgColumns;
    use crate::store::MemoryStore;

    fn service() -> EmployeeService {
        let columns = OrgColumns::new().with_org(
            "org-1",
            [
                OptionalField::Department,
                OptionalField::Position,
                OptionalField::Location,
            ],
        );
        EmployeeService::new(
            Arc::new(MemoryStore::new()),
            FieldProjector::new(Arc::new(columns)),
            Arc::new(EventHub::new()),
        )
    }

    #[test]
    fn seed_runs_once_and_search_is_scoped() {
        let service = service();
        assert_eq!(service.seed_demo_data().unwrap(), 5);
        assert_eq!(service.seed_demo_data().unwrap(), 0);

        let query = EmployeeQuery {
            search: Some("OtherOrg".to_string()),
            ..Default::default()
        };
        assert_eq!(service.search("org-1", &query, None).unwrap().total, 0);
        assert_eq!(service.search("org-2", &query, None).unwrap().total, 1);
    }

    #[test]
    fn create_validates_and_projects() {
        let service = service();
        let err = service
            .create("org-1", NewEmployee::new("", "Doe"), None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let created = service
            .create(
                "org-1",
                NewEmployee::new("Jane", "Doe").with(OptionalField::Company, "Acme"),
                None,
            )
            .unwrap();
        assert!(!created.has(OptionalField::Company));
        assert!(created.has(OptionalField::Department));
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let service = service();
        service.seed_demo_data().unwrap();
        let options = service.filter_options("org-1").unwrap();

        assert_eq!(
            options.statuses,
            [
                EmployeeStatus::Active,
                EmployeeStatus::NotStarted,
                EmployeeStatus::Terminated
            ]
        );
        assert_eq!(options.companies, ["Sleek"]);
        assert_eq!(options.departments, ["No department", "asd"]);
        assert_eq!(options.visible_columns.len(), 3);
        assert!(service.filter_options("org-2").unwrap().visible_columns.is_empty());
    }

    #[test]
    fn statuses_follow_declaration_order() {
        let service = service();
        service
            .store
            .insert_many(
                "org-3",
                vec![
                    NewEmployee::new("T", "One").with_status(EmployeeStatus::Terminated),
                    NewEmployee::new("N", "Two").with_status(EmployeeStatus::NotStarted),
                    NewEmployee::new("T", "Three").with_status(EmployeeStatus::Terminated),
                ],
            )
            .unwrap();

        let options = service.filter_options("org-3").unwrap();
        assert_eq!(
            options.statuses,
            [EmployeeStatus::NotStarted, EmployeeStatus::Terminated]
        );
        assert!(EmployeeStatus::Active < EmployeeStatus::NotStarted);
    }

    #[test]
    fn import_then_export_keeps_every_column() {
        let service = service();
        let summary = service
            .import_csv(
                "org-1",
                b"id,first_name,last_name,company\n42,Jane,Doe,Acme\n7,,Missing,\n",
                None,
            )
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped.len(), 1);

        let csv = String::from_utf8(service.export_csv("org-1", None).unwrap()).unwrap();
        assert!(csv.contains("1,Jane,Doe,,,,Active,Acme"));
    }

    #[test]
    fn non_utf8_upload_is_an_upload_error() {
        let err = service().import_csv("org-1", &[0xc3, 0x28], None).unwrap_err();
        assert!(matches!(err, ServiceError::Upload(_)));
    }
}
