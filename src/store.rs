// src/store.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Employee, EmployeeId, NewEmployee};
use crate::snapshot::{SnapshotError, SnapshotFile};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Хранилище записей, разбитое по организациям.
///
/// Синхронизацию обеспечивает реализация; сканирование возвращает копию,
/// поэтому параллельные вставки в неё могут и не попасть.
pub trait RecordStore: Send + Sync {
    /// Вставить запись; `id` назначается внутри организации
    fn insert(&self, org_id: &str, record: NewEmployee) -> Result<Employee, StoreError>;

    /// Вставить пачку записей одной операцией
    fn insert_many(
        &self,
        org_id: &str,
        records: Vec<NewEmployee>,
    ) -> Result<Vec<Employee>, StoreError>;

    /// Все записи организации, удовлетворяющие предикату, по возрастанию `id`
    fn scan(
        &self,
        org_id: &str,
        predicate: &dyn Fn(&Employee) -> bool,
    ) -> Result<Vec<Employee>, StoreError>;

    fn all_for_org(&self, org_id: &str) -> Result<Vec<Employee>, StoreError> {
        self.scan(org_id, &|_| true)
    }

    fn is_empty(&self) -> Result<bool, StoreError>;
}

/// Записи одной организации и счётчик идентификаторов
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct OrgRecords {
    next_id: u64,
    records: BTreeMap<EmployeeId, Employee>,
}

impl OrgRecords {
    fn push(&mut self, org_id: &str, record: NewEmployee) -> Employee {
        self.next_id += 1;
        let employee = record.into_employee(EmployeeId(self.next_id), org_id);
        self.records.insert(employee.id, employee.clone());
        employee
    }

    /// Вернуть состояние на момент, когда счётчик был равен `next_id`
    fn truncate(&mut self, next_id: u64) {
        self.records.split_off(&EmployeeId(next_id + 1));
        self.next_id = next_id;
    }
}

type Tenants = HashMap<String, OrgRecords>;

/// Хранилище в памяти с необязательным зашифрованным снимком на диске
pub struct MemoryStore {
    tenants: RwLock<Tenants>,
    snapshot: Option<SnapshotFile>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(HashMap::new()),
            snapshot: None,
        }
    }

    /// Открыть хранилище поверх снимка; состояние читается сразу
    pub fn with_snapshot(snapshot: SnapshotFile) -> Result<Self, StoreError> {
        let tenants: Tenants = snapshot.load()?.unwrap_or_default();
        debug!(
            path = %snapshot.path().display(),
            organizations = tenants.len(),
            "snapshot loaded"
        );
        Ok(Self {
            tenants: RwLock::new(tenants),
            snapshot: Some(snapshot),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Tenants> {
        match self.tenants.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tenants> {
        match self.tenants.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Сбросить состояние на диск под удерживаемой блокировкой записи
    fn persist(&self, tenants: &Tenants) -> Result<(), StoreError> {
        if let Some(snapshot) = &self.snapshot {
            snapshot.save(tenants)?;
        }
        Ok(())
    }

    /// Изменить записи организации и сохранить снимок.
    /// Если снимок не записался, изменение откатывается целиком.
    fn commit<T>(
        &self,
        org_id: &str,
        change: impl FnOnce(&mut OrgRecords) -> T,
    ) -> Result<T, StoreError> {
        let mut tenants = self.write();
        let previous_next_id = tenants.get(org_id).map(|org| org.next_id);
        let result = change(tenants.entry(org_id.to_string()).or_default());

        if let Err(e) = self.persist(&tenants) {
            match previous_next_id {
                Some(next_id) => {
                    if let Some(org) = tenants.get_mut(org_id) {
                        org.truncate(next_id);
                    }
                }
                None => {
                    tenants.remove(org_id);
                }
            }
            warn!(org = org_id, error = %e, "snapshot write failed, change rolled back");
            return Err(e);
        }
        Ok(result)
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, org_id: &str, record: NewEmployee) -> Result<Employee, StoreError> {
        self.commit(org_id, |org| org.push(org_id, record))
    }

    fn insert_many(
        &self,
        org_id: &str,
        records: Vec<NewEmployee>,
    ) -> Result<Vec<Employee>, StoreError> {
        self.commit(org_id, |org| {
            records
                .into_iter()
                .map(|record| org.push(org_id, record))
                .collect()
        })
    }

    fn scan(
        &self,
        org_id: &str,
        predicate: &dyn Fn(&Employee) -> bool,
    ) -> Result<Vec<Employee>, StoreError> {
        let tenants = self.read();
        Ok(tenants
            .get(org_id)
            .map(|org| {
                org.records
                    .values()
                    .filter(|employee| predicate(employee))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read().values().all(|org| org.records.is_empty()))
    }
}
