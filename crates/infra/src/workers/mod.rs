//! Background workers that connect registered functions to a broker.
//!
//! Used with brokers that deliver through [`Subscription`]s (Redis, or the
//! in-memory broker when synchronous routing is not wanted).

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use funcstream_events::{
    ChannelError, FunctionBinding, FunctionKind, MessageBroker, MessageEnvelope,
    RegisteredFunction, Subscription, dispatch,
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to subscribe worker `{worker}`: {source}")]
    Subscribe {
        worker: String,
        #[source]
        source: ChannelError,
    },

    #[error("failed to spawn worker thread `{worker}`: {source}")]
    Spawn {
        worker: String,
        #[source]
        source: std::io::Error,
    },

    #[error("function `{function}` is a {actual:?}, expected {expected}")]
    WrongKind {
        function: String,
        expected: &'static str,
        actual: FunctionKind,
    },
}

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: String,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            if j.join().is_err() {
                warn!(worker = %self.name, "worker thread panicked");
            }
        }
    }
}

fn spawn_thread<F>(name: &str, body: F) -> Result<WorkerHandle, WorkerError>
where
    F: FnOnce(mpsc::Receiver<()>) + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    let join = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || body(shutdown_rx))
        .map_err(|source| WorkerError::Spawn {
            worker: name.to_string(),
            source,
        })?;

    Ok(WorkerHandle {
        name: name.to_string(),
        shutdown: shutdown_tx,
        join: Some(join),
    })
}

/// Feeds one input topic into a function or consumer.
///
/// - Subscribes before the thread starts, so nothing published after
///   `spawn` returns is missed
/// - Publishes each output on the binding's output topic
/// - Logs and skips deliveries the function rejects
#[derive(Debug)]
pub struct FunctionWorker;

impl FunctionWorker {
    pub fn spawn<B>(
        name: &str,
        broker: B,
        function: RegisteredFunction,
        binding: &FunctionBinding,
    ) -> Result<WorkerHandle, WorkerError>
    where
        B: MessageBroker + 'static,
    {
        if !function.kind().accepts_input() {
            return Err(WorkerError::WrongKind {
                function: function.name().to_string(),
                expected: "a Function or Consumer",
                actual: function.kind(),
            });
        }

        let sub = broker
            .subscribe(binding.input())
            .map_err(|source| WorkerError::Subscribe {
                worker: name.to_string(),
                source,
            })?;
        let output = binding.output().map(str::to_owned);
        let worker = name.to_string();

        info!(worker = name, function = function.name(), input = binding.input(), "starting function worker");
        spawn_thread(name, move |shutdown_rx| {
            function_loop(&worker, &broker, &function, output.as_deref(), sub, shutdown_rx)
        })
    }
}

fn function_loop<B: MessageBroker>(
    worker: &str,
    broker: &B,
    function: &RegisteredFunction,
    output: Option<&str>,
    sub: Subscription<MessageEnvelope>,
    shutdown_rx: mpsc::Receiver<()>,
) {
    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(POLL_INTERVAL) {
            Ok(envelope) => {
                if let Err(err) = dispatch(broker, function, output, &envelope) {
                    warn!(
                        worker,
                        topic = envelope.topic(),
                        message_id = %envelope.message_id(),
                        error = %err,
                        "message handling failed"
                    );
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!(worker, "function worker stopped");
}

/// Polls a supplier on a fixed interval and publishes what it produces.
#[derive(Debug)]
pub struct SupplierWorker;

impl SupplierWorker {
    pub fn spawn<B>(
        name: &str,
        broker: B,
        supplier: RegisteredFunction,
        topic: &str,
        interval: Duration,
    ) -> Result<WorkerHandle, WorkerError>
    where
        B: MessageBroker + 'static,
    {
        if supplier.kind() != FunctionKind::Supplier {
            return Err(WorkerError::WrongKind {
                function: supplier.name().to_string(),
                expected: "a Supplier",
                actual: supplier.kind(),
            });
        }

        let worker = name.to_string();
        let topic = topic.to_string();

        info!(worker = name, function = supplier.name(), topic = %topic, "starting supplier worker");
        spawn_thread(name, move |shutdown_rx| loop {
            match shutdown_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let produced = match supplier.invoke(serde_json::Value::Null) {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(err) => {
                    warn!(worker = %worker, error = %err, "supplier failed");
                    continue;
                }
            };

            if let Err(err) = broker.publish(MessageEnvelope::new(topic.as_str(), produced)) {
                warn!(worker = %worker, topic = %topic, error = %err, "failed to publish supplier output");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Arc;

    use funcstream_events::{CommandChannel, FunctionRegistry, InMemoryBroker};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    impl funcstream_events::Command for Ping {}

    fn registry() -> FunctionRegistry {
        FunctionRegistry::builder()
            .function("increment", |p: Ping| Ok::<_, Infallible>(Ping { n: p.n + 1 }))
            .supplier("pulse", || Ping { n: 7 })
            .build()
            .unwrap()
    }

    #[test]
    fn function_worker_publishes_outputs() {
        let registry = registry();
        let broker = Arc::new(InMemoryBroker::new());
        let out = broker.subscribe("out").unwrap();

        let handle = FunctionWorker::spawn(
            "increment-worker",
            broker.clone(),
            registry.lookup("increment").unwrap(),
            &FunctionBinding::new("increment", "in").with_output("out"),
        )
        .unwrap();

        broker.send("in", &Ping { n: 1 }).unwrap();
        let envelope = out.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(envelope.decode::<Ping>().unwrap(), Ping { n: 2 });

        handle.shutdown();
    }

    #[test]
    fn function_worker_skips_bad_input_and_keeps_going() {
        let registry = registry();
        let broker = Arc::new(InMemoryBroker::new());
        let out = broker.subscribe("out").unwrap();

        let handle = FunctionWorker::spawn(
            "increment-worker",
            broker.clone(),
            registry.lookup("increment").unwrap(),
            &FunctionBinding::new("increment", "in").with_output("out"),
        )
        .unwrap();

        broker
            .publish(MessageEnvelope::new("in", serde_json::json!("not a ping")))
            .unwrap();
        broker.send("in", &Ping { n: 10 }).unwrap();

        let envelope = out.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(envelope.decode::<Ping>().unwrap(), Ping { n: 11 });

        handle.shutdown();
    }

    #[test]
    fn supplier_worker_publishes_on_interval() {
        let registry = registry();
        let broker = Arc::new(InMemoryBroker::new());
        let ticks = broker.subscribe("ticks").unwrap();

        let handle = SupplierWorker::spawn(
            "pulse-worker",
            broker.clone(),
            registry.lookup("pulse").unwrap(),
            "ticks",
            Duration::from_millis(10),
        )
        .unwrap();

        for _ in 0..2 {
            let envelope = ticks.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(envelope.decode::<Ping>().unwrap(), Ping { n: 7 });
        }

        handle.shutdown();
    }

    #[test]
    fn kinds_are_checked_before_spawning() {
        let registry = registry();
        let broker = Arc::new(InMemoryBroker::new());

        let err = SupplierWorker::spawn(
            "wrong",
            broker.clone(),
            registry.lookup("increment").unwrap(),
            "ticks",
            Duration::from_millis(10),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "function `increment` is a Function, expected a Supplier"
        );

        let err = FunctionWorker::spawn(
            "wrong",
            broker,
            registry.lookup("pulse").unwrap(),
            &FunctionBinding::new("pulse", "in"),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "function `pulse` is a Supplier, expected a Function or Consumer"
        );
    }

    #[test]
    fn consumers_are_accepted_by_function_workers() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let registry = FunctionRegistry::builder()
            .consumer("record", move |p: Ping| sink.lock().unwrap().push(p))
            .build()
            .unwrap();
        let broker = Arc::new(InMemoryBroker::new());

        let handle = FunctionWorker::spawn(
            "record-worker",
            broker.clone(),
            registry.lookup("record").unwrap(),
            &FunctionBinding::new("record", "in"),
        )
        .unwrap();
        broker.send("in", &Ping { n: 3 }).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while seen.lock().unwrap().is_empty() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        handle.shutdown();
        assert_eq!(*seen.lock().unwrap(), vec![Ping { n: 3 }]);
    }
}
