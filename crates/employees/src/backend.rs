//! Backend wiring: the functions the backend service exposes.

use chrono::Utc;

use funcstream_events::FunctionRegistryBuilder;

use crate::orchestrator::EmployeeCreationOrchestrator;
use crate::store::EmployeeStore;

/// Registry name of the creation function.
pub const CREATE_EMPLOYEE: &str = "createEmployee";

/// Registry name of the heartbeat supplier.
pub const TICK: &str = "tick";

/// Heartbeat payload, polled by a supplier worker when one is configured.
pub fn tick() -> String {
    format!("Hello from Supplier {}", Utc::now().to_rfc3339())
}

/// Register `createEmployee` (backed by `orchestrator`) and `tick`.
pub fn register_backend<S>(
    builder: FunctionRegistryBuilder,
    orchestrator: EmployeeCreationOrchestrator<S>,
) -> FunctionRegistryBuilder
where
    S: EmployeeStore + 'static,
{
    builder
        .command_handler(CREATE_EMPLOYEE, orchestrator)
        .supplier(TICK, tick)
}
