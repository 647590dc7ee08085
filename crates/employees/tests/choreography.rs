//! End-to-end command/event choreography over the in-memory broker.
//!
//! Frontend gateway → `createEmployee` topic → backend function →
//! `employeeCreated` topic → frontend event handler.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use funcstream_events::{ChannelError, EventHandler, FunctionRegistry, InMemoryBroker, MessageBroker};
use funcstream_employees::{
    EMPLOYEE_CREATED_TOPIC, EmployeeBackendGateway, EmployeeCreatedEvent,
    EmployeeCreationOrchestrator, EmployeeStore, InMemoryEmployeeStore, Topics, register_backend,
    register_frontend,
};

#[derive(Debug, Default)]
struct RecordingHandler {
    seen: Mutex<Vec<EmployeeCreatedEvent>>,
}

impl RecordingHandler {
    fn events(&self) -> Vec<EmployeeCreatedEvent> {
        self.seen.lock().unwrap().clone()
    }
}

impl EventHandler for RecordingHandler {
    type Ev = EmployeeCreatedEvent;

    fn on_event(&self, event: &Self::Ev) {
        self.seen.lock().unwrap().push(event.clone());
    }
}

struct Harness {
    broker: Arc<InMemoryBroker>,
    store: Arc<InMemoryEmployeeStore>,
    handler: Arc<RecordingHandler>,
}

impl Harness {
    fn new() -> Self {
        let broker = Arc::new(InMemoryBroker::new());
        let store = Arc::new(InMemoryEmployeeStore::new());
        let handler = Arc::new(RecordingHandler::default());

        let builder = FunctionRegistry::builder();
        let builder = register_backend(builder, EmployeeCreationOrchestrator::new(store.clone()));
        let builder = register_frontend(builder, handler.clone());
        let registry = builder.build().unwrap();

        let topics = Topics::default();
        for binding in topics
            .backend_bindings()
            .into_iter()
            .chain(topics.frontend_bindings())
        {
            let function = registry.lookup(binding.function()).unwrap();
            broker.bind(function, &binding).unwrap();
        }

        Self {
            broker,
            store,
            handler,
        }
    }

    fn gateway(&self) -> EmployeeBackendGateway<Arc<InMemoryBroker>> {
        EmployeeBackendGateway::new(self.broker.clone())
    }
}

#[test]
fn alice_round_trip() {
    let harness = Harness::new();

    harness.gateway().send("Alice").unwrap();

    let events = harness.handler.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Alice");

    let stored = harness.store.get(events[0].id).unwrap().unwrap();
    assert_eq!(stored.name().as_str(), "Alice");
}

#[test]
fn second_identical_command_gets_a_new_id() {
    let harness = Harness::new();
    let gateway = harness.gateway();

    gateway.send("Alice").unwrap();
    gateway.send("Alice").unwrap();

    let events = harness.handler.events();
    assert_eq!(events.len(), 2);
    assert_ne!(events[0].id, events[1].id);
    assert!(events.iter().all(|e| e.name == "Alice"));
}

#[test]
fn blank_name_emits_no_event() {
    let harness = Harness::new();
    let confirmations = harness.broker.subscribe(EMPLOYEE_CREATED_TOPIC).unwrap();

    // The sender only learns that the broker accepted the command.
    harness.gateway().send("").unwrap();

    assert!(harness.handler.events().is_empty());
    assert!(confirmations.try_recv().is_err());
    assert!(harness.store.is_empty());
}

#[test]
fn events_are_visible_to_every_observer() {
    let harness = Harness::new();
    let extra_observer = harness.broker.subscribe(EMPLOYEE_CREATED_TOPIC).unwrap();

    harness.gateway().send("Carol").unwrap();

    let envelope = extra_observer.try_recv().unwrap();
    let event: EmployeeCreatedEvent = envelope.decode().unwrap();
    assert_eq!(event, harness.handler.events()[0]);
}

#[test]
fn unreachable_broker_fails_the_send_and_nothing_happens() {
    let harness = Harness::new();
    harness.broker.disconnect();

    let err = harness.gateway().send("Dave").unwrap_err();
    assert!(matches!(err, ChannelError::Unavailable(_)));
    assert!(harness.handler.events().is_empty());
    assert!(harness.store.is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Handler invocations match successful creations: no loss, no duplicates.
    #[test]
    fn handler_sees_each_created_employee_exactly_once(
        names in prop::collection::vec(prop_oneof![Just(String::new()), "[A-Za-z ]{1,8}"], 0..16)
    ) {
        let harness = Harness::new();
        let gateway = harness.gateway();
        for name in &names {
            gateway.send(name.clone()).unwrap();
        }

        let expected: Vec<&String> = names.iter().filter(|n| !n.trim().is_empty()).collect();
        let events = harness.handler.events();

        prop_assert_eq!(events.len(), harness.store.len());
        prop_assert_eq!(events.len(), expected.len());
        for (event, name) in events.iter().zip(expected) {
            prop_assert_eq!(&event.name, name);
        }
    }
}
