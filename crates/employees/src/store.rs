use std::collections::HashMap;
use std::sync::RwLock;

use crate::employee::{Employee, EmployeeId, EmployeeName};
use crate::error::EmployeeError;

/// Where created employees live.
///
/// Identity assignment belongs to the store and must be collision-free under
/// concurrent creations.
pub trait EmployeeStore: Send + Sync {
    fn create(&self, name: EmployeeName) -> Result<Employee, EmployeeError>;

    fn get(&self, id: EmployeeId) -> Result<Option<Employee>, EmployeeError>;
}

impl<S> EmployeeStore for std::sync::Arc<S>
where
    S: EmployeeStore + ?Sized,
{
    fn create(&self, name: EmployeeName) -> Result<Employee, EmployeeError> {
        (**self).create(name)
    }

    fn get(&self, id: EmployeeId) -> Result<Option<Employee>, EmployeeError> {
        (**self).get(id)
    }
}

/// In-memory employee store.
///
/// Intended for tests/dev. Ids are UUIDv7, generated without coordination.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    employees: RwLock<HashMap<EmployeeId, Employee>>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.employees.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EmployeeStore for InMemoryEmployeeStore {
    fn create(&self, name: EmployeeName) -> Result<Employee, EmployeeError> {
        let mut employees = self
            .employees
            .write()
            .map_err(|_| EmployeeError::Storage("lock poisoned".to_string()))?;

        let employee = Employee::new(EmployeeId::generate(), name);
        if employees.insert(employee.id_typed(), employee.clone()).is_some() {
            return Err(EmployeeError::Storage(format!(
                "identity collision on {}",
                employee.id_typed()
            )));
        }
        Ok(employee)
    }

    fn get(&self, id: EmployeeId) -> Result<Option<Employee>, EmployeeError> {
        let employees = self
            .employees
            .read()
            .map_err(|_| EmployeeError::Storage("lock poisoned".to_string()))?;
        Ok(employees.get(&id).cloned())
    }
}
