use serde::{Deserialize, Serialize};

use funcstream_core::{DomainError, DomainResult, Entity, EntityId};

/// Employee identifier, assigned by the store at creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub EntityId);

impl EmployeeId {
    pub fn generate() -> Self {
        Self(EntityId::new())
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A non-blank employee name.
///
/// Validated on construction and on deserialization, so holding one is proof
/// the guard already ran.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmployeeName(String);

impl EmployeeName {
    pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::validation("employee name must not be blank"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmployeeName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmployeeName> for String {
    fn from(value: EmployeeName) -> Self {
        value.0
    }
}

impl core::fmt::Display for EmployeeName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A created employee. There is no update or delete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    id: EmployeeId,
    name: EmployeeName,
}

impl Employee {
    pub fn new(id: EmployeeId, name: EmployeeName) -> Self {
        Self { id, name }
    }

    pub fn id_typed(&self) -> EmployeeId {
        self.id
    }

    pub fn name(&self) -> &EmployeeName {
        &self.name
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
