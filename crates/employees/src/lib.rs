//! Employees demo: a frontend sends `CreateEmployeeCommand`, a backend creates
//! the employee and answers with `EmployeeCreatedEvent`.
//!
//! ```text
//! EmployeeBackendGateway --createEmployee--> EmployeeCreationOrchestrator
//!                                                   |
//! EmployeeCreatedLogger <--employeeCreated----------+
//! ```
//!
//! The broker in between is whatever [`MessageBroker`](funcstream_events::MessageBroker)
//! the process is wired with.

pub mod backend;
pub mod employee;
pub mod error;
pub mod frontend;
pub mod messages;
pub mod orchestrator;
pub mod store;

pub use backend::{CREATE_EMPLOYEE, TICK, register_backend, tick};
pub use employee::{Employee, EmployeeId, EmployeeName};
pub use error::EmployeeError;
pub use frontend::{EMPLOYEE_CREATED, EmployeeBackendGateway, EmployeeCreatedLogger, register_frontend};
pub use messages::{
    CREATE_EMPLOYEE_TOPIC, CreateEmployeeCommand, EMPLOYEE_CREATED_TOPIC, EmployeeCreatedEvent,
    Topics,
};
pub use orchestrator::{CreatedEmployee, EmployeeCreationOrchestrator, ReceivedCommand};
pub use store::{EmployeeStore, InMemoryEmployeeStore};
