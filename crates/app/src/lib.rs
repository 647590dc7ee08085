//! Process wiring: one registry, one broker, one worker per binding.

use std::sync::Arc;
use std::sync::mpsc;

use anyhow::Context;
use tracing::info;

use funcstream_calculator::{CalculationRequest, RoundedResult};
use funcstream_employees::{
    EmployeeCreatedEvent, EmployeeCreatedLogger, EmployeeCreationOrchestrator, EmployeeStore,
    TICK, register_backend, register_frontend,
};
use funcstream_events::{EventHandler, FunctionRegistry, MessageBroker};
use funcstream_infra::{FunctionWorker, StreamConfig, SupplierWorker, WorkerHandle};

/// Frontend confirmation handler: logs each event and forwards it to
/// whoever is waiting on the receiving end.
#[derive(Debug)]
pub struct ConfirmationNotifier {
    logger: EmployeeCreatedLogger,
    confirmations: mpsc::Sender<EmployeeCreatedEvent>,
}

impl ConfirmationNotifier {
    pub fn channel() -> (Self, mpsc::Receiver<EmployeeCreatedEvent>) {
        let (tx, rx) = mpsc::channel();
        let notifier = Self {
            logger: EmployeeCreatedLogger,
            confirmations: tx,
        };
        (notifier, rx)
    }
}

impl EventHandler for ConfirmationNotifier {
    type Ev = EmployeeCreatedEvent;

    fn on_event(&self, event: &Self::Ev) {
        self.logger.on_event(event);
        // Nobody waiting is fine.
        let _ = self.confirmations.send(event.clone());
    }
}

/// Register every function the process exposes: the calculator chain plus
/// both sides of the employee exchange.
pub fn build_registry<S, H>(store: S, handler: H) -> anyhow::Result<FunctionRegistry>
where
    S: EmployeeStore + 'static,
    H: EventHandler<Ev = EmployeeCreatedEvent> + Send + Sync + 'static,
{
    let builder = FunctionRegistry::builder();
    let builder = funcstream_calculator::register(builder);
    let builder = register_backend(builder, EmployeeCreationOrchestrator::new(store));
    let builder = register_frontend(builder, handler);
    builder.build().context("building function registry")
}

/// Evaluate the configured calculator definition (e.g. `calculate|round`).
pub fn run_calculation(
    registry: &FunctionRegistry,
    definition: &str,
    request: CalculationRequest,
) -> anyhow::Result<RoundedResult> {
    let function = registry
        .lookup(definition)
        .with_context(|| format!("resolving function definition `{definition}`"))?;
    let rounded: RoundedResult = function
        .call(&request)
        .with_context(|| format!("evaluating `{definition}`"))?;
    info!(definition, a = request.a(), b = request.b(), result = %rounded, "calculation complete");
    Ok(rounded)
}

/// Running workers. Dropping this without [`shutdown`](Self::shutdown)
/// leaves the threads running until the process exits.
#[derive(Debug)]
pub struct Workers {
    handles: Vec<WorkerHandle>,
}

impl Workers {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn shutdown(self) {
        for handle in self.handles {
            info!(worker = handle.name(), "stopping worker");
            handle.shutdown();
        }
    }
}

/// Subscribe a worker for every employee binding, plus the heartbeat
/// supplier when a tick topic is configured.
///
/// Subscriptions are in place when this returns.
pub fn spawn_workers(
    config: &StreamConfig,
    registry: &FunctionRegistry,
    broker: Arc<dyn MessageBroker>,
) -> anyhow::Result<Workers> {
    let mut handles = Vec::new();

    let bindings = config
        .topics
        .backend_bindings()
        .into_iter()
        .chain(config.topics.frontend_bindings());
    for binding in bindings {
        let function = registry.lookup(binding.function())?;
        let handle = FunctionWorker::spawn(
            &format!("fn-{}", binding.function()),
            broker.clone(),
            function,
            &binding,
        )?;
        handles.push(handle);
    }

    if let Some(topic) = &config.tick_topic {
        let handle = SupplierWorker::spawn(
            "supplier-tick",
            broker.clone(),
            registry.lookup(TICK)?,
            topic,
            config.tick_interval,
        )?;
        handles.push(handle);
    }

    Ok(Workers { handles })
}
