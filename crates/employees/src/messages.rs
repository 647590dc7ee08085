use serde::{Deserialize, Serialize};

use funcstream_events::{Command, Event, FunctionBinding};

use crate::backend::CREATE_EMPLOYEE;
use crate::employee::{Employee, EmployeeId};
use crate::frontend::EMPLOYEE_CREATED;

/// Default command topic. Producer and consumer must agree on it exactly.
pub const CREATE_EMPLOYEE_TOPIC: &str = "createEmployee";

/// Default event topic.
pub const EMPLOYEE_CREATED_TOPIC: &str = "employeeCreated";

/// Command: create an employee named `name`.
///
/// The name travels unvalidated; the backend applies the non-blank guard when
/// the command is received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEmployeeCommand {
    pub name: String,
}

impl CreateEmployeeCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Command for CreateEmployeeCommand {}

/// Event: an employee was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeCreatedEvent {
    pub id: EmployeeId,
    pub name: String,
}

impl Event for EmployeeCreatedEvent {}

impl From<&Employee> for EmployeeCreatedEvent {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id_typed(),
            name: employee.name().as_str().to_string(),
        }
    }
}

/// Topic names used by both sides of the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub create_employee: String,
    pub employee_created: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            create_employee: CREATE_EMPLOYEE_TOPIC.to_string(),
            employee_created: EMPLOYEE_CREATED_TOPIC.to_string(),
        }
    }
}

impl Topics {
    /// `createEmployee` consumes commands and answers on the event topic.
    pub fn backend_bindings(&self) -> Vec<FunctionBinding> {
        vec![
            FunctionBinding::new(CREATE_EMPLOYEE, &self.create_employee)
                .with_output(&self.employee_created),
        ]
    }

    /// `employeeCreated` observes the event topic.
    pub fn frontend_bindings(&self) -> Vec<FunctionBinding> {
        vec![FunctionBinding::new(EMPLOYEE_CREATED, &self.employee_created)]
    }
}
