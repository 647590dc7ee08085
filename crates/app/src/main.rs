use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};

use funcstream_app::{ConfirmationNotifier, build_registry, run_calculation, spawn_workers};
use funcstream_calculator::CalculationRequest;
use funcstream_employees::{EmployeeBackendGateway, InMemoryEmployeeStore};
use funcstream_infra::{StreamConfig, connect};

const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Usage: `funcstream [a b] [name...]`
///
/// Adds and rounds `a + b` (default `1 2`), then creates one employee per
/// name (default `Alice`) over the configured broker and waits for each
/// confirmation.
fn main() -> anyhow::Result<()> {
    funcstream_observability::init();

    let config = StreamConfig::from_env().context("loading configuration")?;
    tracing::info!(broker = ?config.broker, topics = ?config.topics, "starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (request, names) = parse_args(&args)?;

    let (notifier, confirmations) = ConfirmationNotifier::channel();
    let store = Arc::new(InMemoryEmployeeStore::new());
    let registry = build_registry(store.clone(), notifier)?;

    run_calculation(&registry, &config.function_definition, request)?;

    let broker = connect(&config.broker)?;
    let workers = spawn_workers(&config, &registry, broker.clone())?;

    let gateway = EmployeeBackendGateway::with_topic(broker, &config.topics.create_employee);
    for name in &names {
        gateway
            .send(name.as_str())
            .with_context(|| format!("sending create command for `{name}`"))?;
    }

    // Blank names are rejected by the backend and never confirmed.
    let expected = names.iter().filter(|n| !n.trim().is_empty()).count();
    let mut confirmed = 0;
    while confirmed < expected {
        match confirmations.recv_timeout(CONFIRMATION_TIMEOUT) {
            Ok(_) => confirmed += 1,
            Err(_) => {
                tracing::warn!(confirmed, expected, "gave up waiting for confirmations");
                break;
            }
        }
    }

    workers.shutdown();
    tracing::info!(confirmed, stored = store.len(), "done");
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<(CalculationRequest, Vec<String>)> {
    let numbers: Vec<f64> = args.iter().map_while(|a| a.parse().ok()).collect();
    let request = match numbers.as_slice() {
        [] => CalculationRequest::new(1.0, 2.0),
        [a, b] => CalculationRequest::new(*a, *b),
        _ => bail!("expected exactly two numbers, got {}", numbers.len()),
    };

    let names: Vec<String> = args[numbers.len()..].to_vec();
    let names = if names.is_empty() {
        vec!["Alice".to_string()]
    } else {
        names
    };
    Ok((request, names))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_one_plus_two_and_alice() {
        let (request, names) = parse_args(&[]).unwrap();
        assert_eq!(request, CalculationRequest::new(1.0, 2.0));
        assert_eq!(names, args(&["Alice"]));
    }

    #[test]
    fn leading_numbers_are_operands_rest_are_names() {
        let (request, names) = parse_args(&args(&["2.675", "0", "Bob", "Carol"])).unwrap();
        assert_eq!(request, CalculationRequest::new(2.675, 0.0));
        assert_eq!(names, args(&["Bob", "Carol"]));
    }

    #[test]
    fn a_single_operand_is_rejected() {
        assert!(parse_args(&args(&["5", "Bob"])).is_err());
    }
}
