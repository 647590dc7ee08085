//! Backend side of the exchange: command in, event out.
//!
//! Creation is a two-state machine, expressed as two types:
//!
//! ```text
//! CreateEmployeeCommand --receive (name guard)--> ReceivedCommand --create--> CreatedEmployee --> EmployeeCreatedEvent
//! ```
//!
//! A command that fails the guard never reaches `Received`, so no event can be
//! built for it.

use funcstream_events::CommandHandler;

use crate::employee::{Employee, EmployeeName};
use crate::error::EmployeeError;
use crate::messages::{CreateEmployeeCommand, EmployeeCreatedEvent};
use crate::store::EmployeeStore;

/// `Received`: the command decoded and passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedCommand {
    name: EmployeeName,
}

impl ReceivedCommand {
    /// Apply the transition guard: the name must be non-blank.
    pub fn receive(command: CreateEmployeeCommand) -> Result<Self, EmployeeError> {
        let name = EmployeeName::parse(command.name)?;
        Ok(Self { name })
    }

    pub fn name(&self) -> &EmployeeName {
        &self.name
    }

    /// Perform the creation side effect.
    pub fn create<S>(self, store: &S) -> Result<CreatedEmployee, EmployeeError>
    where
        S: EmployeeStore + ?Sized,
    {
        let employee = store.create(self.name)?;
        Ok(CreatedEmployee { employee })
    }
}

/// `Created`: the employee exists and the confirmation is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEmployee {
    employee: Employee,
}

impl CreatedEmployee {
    pub fn employee(&self) -> &Employee {
        &self.employee
    }

    pub fn into_event(self) -> EmployeeCreatedEvent {
        EmployeeCreatedEvent::from(&self.employee)
    }
}

/// Consumes `CreateEmployeeCommand`, produces exactly one `EmployeeCreatedEvent`
/// per accepted command.
///
/// Repeated identical commands are not deduplicated: each one creates a new
/// employee with a new id.
#[derive(Debug)]
pub struct EmployeeCreationOrchestrator<S> {
    store: S,
}

impl<S: EmployeeStore> EmployeeCreationOrchestrator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: EmployeeStore> CommandHandler for EmployeeCreationOrchestrator<S> {
    type Cmd = CreateEmployeeCommand;
    type Ev = EmployeeCreatedEvent;
    type Error = EmployeeError;

    fn handle(&self, command: Self::Cmd) -> Result<Self::Ev, Self::Error> {
        let created = ReceivedCommand::receive(command)?.create(&self.store)?;
        Ok(created.into_event())
    }
}
