use serde_json::{Map, Value};

/// Optional per-vehicle resources fetched after the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentKind {
    Info,
    Location,
    Odometer,
    Battery,
    Fuel,
}

impl EnrichmentKind {
    /// Fetch order.
    pub const ALL: [Self; 5] = [Self::Info, Self::Location, Self::Odometer, Self::Battery, Self::Fuel];

    /// Field name in the snapshot, which is also the vendor path segment.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Location => "location",
            Self::Odometer => "odometer",
            Self::Battery => "battery",
            Self::Fuel => "fuel",
        }
    }
}

/// Outcome of one optional fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Present(Value),
    Unavailable(String),
}

impl Enrichment {
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Present(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }
}

/// Everything known about one vehicle after aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub id: String,
    pub profile: Map<String, Value>,
    pub enrichments: Vec<(EnrichmentKind, Enrichment)>,
}

impl VehicleSnapshot {
    #[must_use]
    pub const fn new(id: String, profile: Map<String, Value>) -> Self {
        Self { id, profile, enrichments: Vec::new() }
    }

    pub fn record(&mut self, kind: EnrichmentKind, enrichment: Enrichment) {
        self.enrichments.retain(|(k, _)| *k != kind);
        self.enrichments.push((kind, enrichment));
    }

    #[must_use]
    pub fn enrichment(&self, kind: EnrichmentKind) -> Option<&Enrichment> {
        self.enrichments.iter().find(|(k, _)| *k == kind).map(|(_, e)| e)
    }

    /// The enrichment value when it was fetched successfully.
    #[must_use]
    pub fn get(&self, kind: EnrichmentKind) -> Option<&Value> {
        self.enrichment(kind).and_then(Enrichment::value)
    }

    /// A top-level profile attribute such as `make` or `year`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.profile.get(name)
    }

    /// Builds the response document: `id`, the profile fields and each
    /// present enrichment. Unavailable enrichments are left out unless
    /// `diagnostics` is set, in which case their reasons are listed under
    /// `unavailable`.
    #[must_use]
    pub fn to_json(&self, diagnostics: bool) -> Value {
        let mut doc = Map::new();
        doc.insert("id".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.profile {
            doc.insert(key.clone(), value.clone());
        }

        let mut unavailable = Map::new();
        for (kind, enrichment) in &self.enrichments {
            match enrichment {
                Enrichment::Present(value) => {
                    doc.insert(kind.field().to_string(), value.clone());
                }
                Enrichment::Unavailable(reason) => {
                    unavailable.insert(kind.field().to_string(), Value::String(reason.clone()));
                }
            }
        }

        if diagnostics {
            doc.insert("unavailable".to_string(), Value::Object(unavailable));
        }

        Value::Object(doc)
    }
}
