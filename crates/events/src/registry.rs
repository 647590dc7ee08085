//! Process-wide function registry.
//!
//! Built once at startup and passed by reference to whatever needs to invoke
//! or bind a function. Functions are registered as typed closures and invoked
//! through JSON, the same representation the brokers carry.
//!
//! Definitions may compose registered functions with `|`:
//!
//! ```ignore
//! let registry = FunctionRegistry::builder()
//!     .function("calculate", |r: CalculationRequest| Ok::<_, Infallible>(calculate(r)))
//!     .function("round", |r: CalculationResult| Ok::<_, Infallible>(r.round()))
//!     .build()?;
//!
//! let rounded: RoundedResult = registry.lookup("calculate|round")?.call(&request)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

type Invoker = Arc<dyn Fn(JsonValue) -> Result<Option<JsonValue>, FunctionError> + Send + Sync>;

/// Shape of a registered function.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    /// Nothing in, one value out (polled).
    Supplier,
    /// One value in, one value out.
    Function,
    /// One value in, nothing out.
    Consumer,
}

impl FunctionKind {
    pub fn accepts_input(self) -> bool {
        !matches!(self, FunctionKind::Supplier)
    }

    pub fn produces_output(self) -> bool {
        !matches!(self, FunctionKind::Consumer)
    }
}

#[derive(Debug, Error)]
pub enum FunctionError {
    /// The JSON input did not match the function's input type.
    #[error("function `{function}` rejected its input: {reason}")]
    Input { function: String, reason: String },

    /// The output could not be serialized, or was missing when one was expected.
    #[error("function `{function}` produced unusable output: {reason}")]
    Output { function: String, reason: String },

    /// The function itself returned an error.
    #[error("function `{function}` failed: {source}")]
    Failed {
        function: String,
        #[source]
        source: BoxError,
    },
}

impl FunctionError {
    /// Borrow the function's own error, if it failed with one of type `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            FunctionError::Failed { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no function registered under `{0}`")]
    NotFound(String),

    #[error("function `{0}` registered more than once")]
    Duplicate(String),

    #[error("invalid function definition `{definition}`: {reason}")]
    InvalidDefinition { definition: String, reason: String },
}

/// A function resolved from the registry (possibly a composition).
///
/// Cheap to clone; clones share the underlying closure.
#[derive(Clone)]
pub struct RegisteredFunction {
    name: String,
    kind: FunctionKind,
    invoker: Invoker,
}

impl core::fmt::Debug for RegisteredFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisteredFunction")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl RegisteredFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Invoke with a JSON input.
    ///
    /// Suppliers ignore their input. Consumers return `Ok(None)`.
    ///
    /// This is the logging boundary: every call gets a `debug` span carrying
    /// the function name, and its input and outcome are recorded there. The
    /// registered closures themselves stay free of logging.
    pub fn invoke(&self, input: JsonValue) -> Result<Option<JsonValue>, FunctionError> {
        let span = tracing::debug_span!("function", name = %self.name);
        let _entered = span.enter();

        debug!(%input, "message has come");
        let result = (self.invoker)(input);
        match &result {
            Ok(Some(output)) => debug!(%output, "function completed"),
            Ok(None) => debug!("function completed without output"),
            Err(err) => debug!(error = %err, "function failed"),
        }
        result
    }

    /// Typed call for functions: serialize `input`, invoke, decode the output.
    pub fn call<I, O>(&self, input: &I) -> Result<O, FunctionError>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let input = encode(input).map_err(|reason| FunctionError::Input {
            function: self.name.clone(),
            reason,
        })?;
        self.expect_output(input)
    }

    /// Typed call for consumers.
    pub fn accept<I: Serialize>(&self, input: &I) -> Result<(), FunctionError> {
        let input = encode(input).map_err(|reason| FunctionError::Input {
            function: self.name.clone(),
            reason,
        })?;
        self.invoke(input).map(|_| ())
    }

    /// Typed call for suppliers.
    pub fn supply<O: DeserializeOwned>(&self) -> Result<O, FunctionError> {
        self.expect_output(JsonValue::Null)
    }

    fn expect_output<O: DeserializeOwned>(&self, input: JsonValue) -> Result<O, FunctionError> {
        let output = self.invoke(input)?.ok_or_else(|| FunctionError::Output {
            function: self.name.clone(),
            reason: "no output produced".to_string(),
        })?;
        O::deserialize(output).map_err(|e| FunctionError::Output {
            function: self.name.clone(),
            reason: e.to_string(),
        })
    }
}

/// Registry of named functions. See the module docs.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, RegisteredFunction>,
}

impl FunctionRegistry {
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::default()
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Resolve a definition: a single name, or names joined with `|`.
    ///
    /// In a composition every stage after the first must accept input and
    /// every stage before the last must produce output. A supplier feeding
    /// straight into a consumer has no callable shape and is rejected.
    pub fn lookup(&self, definition: &str) -> Result<RegisteredFunction, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidDefinition {
            definition: definition.to_string(),
            reason: reason.to_string(),
        };

        let mut stages = Vec::new();
        for name in definition.split('|').map(str::trim) {
            if name.is_empty() {
                return Err(invalid("empty function name"));
            }
            let function = self
                .functions
                .get(name)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
            stages.push(function.clone());
        }

        if stages.len() == 1 {
            return Ok(stages.remove(0));
        }

        let last = stages.len() - 1;
        for (idx, stage) in stages.iter().enumerate() {
            if idx > 0 && !stage.kind.accepts_input() {
                return Err(invalid(&format!("supplier `{}` must come first", stage.name)));
            }
            if idx < last && !stage.kind.produces_output() {
                return Err(invalid(&format!("consumer `{}` must come last", stage.name)));
            }
        }

        let first = stages[0].kind;
        let kind = match (first.accepts_input(), stages[last].kind.produces_output()) {
            (true, true) => FunctionKind::Function,
            (true, false) => FunctionKind::Consumer,
            (false, true) => FunctionKind::Supplier,
            (false, false) => return Err(invalid("a supplier cannot feed a consumer directly")),
        };

        let name = stages
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("|");

        let invoker: Invoker = Arc::new(move |input| {
            let mut value = Some(input);
            for stage in &stages {
                value = stage.invoke(value.take().unwrap_or(JsonValue::Null))?;
            }
            Ok(value)
        });

        Ok(RegisteredFunction { name, kind, invoker })
    }
}

/// Builder for [`FunctionRegistry`].
#[derive(Default)]
pub struct FunctionRegistryBuilder {
    functions: BTreeMap<String, RegisteredFunction>,
    duplicates: Vec<String>,
}

impl FunctionRegistryBuilder {
    /// Register a function `I -> Result<O, E>`.
    ///
    /// Infallible functions return `Ok::<_, Infallible>(..)`.
    pub fn function<I, O, E, F>(self, name: &str, f: F) -> Self
    where
        I: DeserializeOwned,
        O: Serialize,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        let function = name.to_string();
        let invoker: Invoker = Arc::new(move |input| {
            let input: I = decode(&function, input)?;
            let output = f(input).map_err(|e| FunctionError::Failed {
                function: function.clone(),
                source: Box::new(e),
            })?;
            let output = encode(&output).map_err(|reason| FunctionError::Output {
                function: function.clone(),
                reason,
            })?;
            Ok(Some(output))
        });
        self.insert(name, FunctionKind::Function, invoker)
    }

    /// Register a consumer `I -> ()`.
    pub fn consumer<I, F>(self, name: &str, f: F) -> Self
    where
        I: DeserializeOwned,
        F: Fn(I) + Send + Sync + 'static,
    {
        let function = name.to_string();
        let invoker: Invoker = Arc::new(move |input| {
            f(decode(&function, input)?);
            Ok(None)
        });
        self.insert(name, FunctionKind::Consumer, invoker)
    }

    /// Register a supplier `() -> O`.
    pub fn supplier<O, F>(self, name: &str, f: F) -> Self
    where
        O: Serialize,
        F: Fn() -> O + Send + Sync + 'static,
    {
        let function = name.to_string();
        let invoker: Invoker = Arc::new(move |_input| {
            let output = encode(&f()).map_err(|reason| FunctionError::Output {
                function: function.clone(),
                reason,
            })?;
            Ok(Some(output))
        });
        self.insert(name, FunctionKind::Supplier, invoker)
    }

    pub fn build(self) -> Result<FunctionRegistry, RegistryError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(RegistryError::Duplicate(name));
        }
        Ok(FunctionRegistry {
            functions: self.functions,
        })
    }

    fn insert(mut self, name: &str, kind: FunctionKind, invoker: Invoker) -> Self {
        let function = RegisteredFunction {
            name: name.to_string(),
            kind,
            invoker,
        };
        if self.functions.insert(name.to_string(), function).is_some() {
            self.duplicates.push(name.to_string());
        }
        self
    }
}

fn decode<I: DeserializeOwned>(function: &str, input: JsonValue) -> Result<I, FunctionError> {
    I::deserialize(input).map_err(|e| FunctionError::Input {
        function: function.to_string(),
        reason: e.to_string(),
    })
}

fn encode<O: Serialize + ?Sized>(value: &O) -> Result<JsonValue, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("negative input")]
    struct Negative;

    fn registry() -> FunctionRegistry {
        FunctionRegistry::builder()
            .function("double", |x: i64| Ok::<_, Infallible>(x * 2))
            .function("checked", |x: i64| if x < 0 { Err(Negative) } else { Ok(x) })
            .function("describe", |x: i64| Ok::<_, Infallible>(format!("value={x}")))
            .consumer("ignore", |_: String| {})
            .supplier("seven", || 7_i64)
            .build()
            .unwrap()
    }

    #[test]
    fn calls_single_function() {
        let out: i64 = registry().lookup("double").unwrap().call(&21).unwrap();
        assert_eq!(out, 42);
    }

    #[test]
    fn composes_pipe_definitions_in_order() {
        let composed = registry().lookup("double | describe").unwrap();
        assert_eq!(composed.name(), "double|describe");
        assert_eq!(composed.kind(), FunctionKind::Function);

        let out: String = composed.call(&5).unwrap();
        assert_eq!(out, "value=10");
    }

    #[test]
    fn supplier_head_makes_a_supplier() {
        let composed = registry().lookup("seven|double").unwrap();
        assert_eq!(composed.kind(), FunctionKind::Supplier);
        assert_eq!(composed.supply::<i64>().unwrap(), 14);
    }

    #[test]
    fn consumer_tail_makes_a_consumer() {
        let composed = registry().lookup("describe|ignore").unwrap();
        assert_eq!(composed.kind(), FunctionKind::Consumer);
        composed.accept(&1).unwrap();
    }

    #[test]
    fn rejects_misplaced_stages() {
        let reg = registry();
        assert!(matches!(
            reg.lookup("double|seven"),
            Err(RegistryError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            reg.lookup("ignore|double"),
            Err(RegistryError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            reg.lookup("seven|ignore"),
            Err(RegistryError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            reg.lookup("double||describe"),
            Err(RegistryError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn unknown_names_are_not_found() {
        assert_eq!(
            registry().lookup("double|triple").unwrap_err(),
            RegistryError::NotFound("triple".into())
        );
    }

    #[test]
    fn duplicate_registration_fails_build() {
        let err = FunctionRegistry::builder()
            .supplier("one", || 1)
            .supplier("one", || 2)
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("one".into()));
    }

    #[test]
    fn function_errors_keep_their_type() {
        let err = registry()
            .lookup("checked")
            .unwrap()
            .call::<_, i64>(&-1)
            .unwrap_err();
        assert!(err.downcast_ref::<Negative>().is_some());
    }

    #[test]
    fn malformed_input_is_an_input_error() {
        let err = registry()
            .lookup("double")
            .unwrap()
            .invoke(serde_json::json!("not a number"))
            .unwrap_err();
        assert!(matches!(err, FunctionError::Input { function, .. } if function == "double"));
    }

    #[test]
    fn consumers_receive_decoded_input() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reg = FunctionRegistry::builder()
            .consumer("collect", move |s: String| sink.lock().unwrap().push(s))
            .build()
            .unwrap();

        reg.lookup("collect").unwrap().accept(&"hello").unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn names_are_sorted() {
        let reg = registry();
        let names: Vec<_> = reg.names().collect();
        assert_eq!(names, vec!["checked", "describe", "double", "ignore", "seven"]);
    }
}
