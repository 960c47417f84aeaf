use serde::{Deserialize, Serialize};

/// One third of a unit, the small truck's capacity and the smallest batch
pub const THIRD: f64 = 1.0 / 3.0;

/// Tolerance used when comparing accumulated `f64` quantities
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Component identifier with the kind of entity it names
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId {
    pub(crate) id: String,
    pub(crate) kind: String,
}

impl ComponentId {
    /// Create a new component ID
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }

    pub fn client(id: impl Into<String>) -> Self {
        Self::new(id, "Client")
    }

    pub fn machine(id: impl Into<String>) -> Self {
        Self::new(id, "Machine")
    }

    pub fn truck(id: impl Into<String>) -> Self {
        Self::new(id, "Truck")
    }

    /// Get the raw ID string
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the entity kind
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
