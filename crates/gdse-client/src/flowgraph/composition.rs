use crate::collection::Collection;
use crate::record::{coerce_to_string, RecordId};
use serde::Deserialize;
use std::collections::HashMap;

pub const NO_COMPOSITION: &str = "no composition defined";
pub const MATERIAL_NOT_FOUND: &str = "material not found";
pub const LINE_BREAK: &str = "<br>";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fraction {
    pub material: RecordId,
    /// Share of the total amount, `0.0..=1.0`.
    #[serde(default, deserialize_with = "super::de::fraction")]
    pub fraction: f64,
}

/// Breakdown of a flow or stock into material fractions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Composition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::de::list")]
    pub fractions: Vec<Fraction>,
}

impl Composition {
    pub fn contains(&self, material: &RecordId) -> bool {
        let key = material.key();
        self.fractions.iter().any(|f| f.material.key() == key)
    }
}

/// Material id -> display name.
#[derive(Debug, Clone, Default)]
pub struct MaterialLookup {
    names: HashMap<String, String>,
}

impl MaterialLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &RecordId, name: &str) {
        self.names.insert(id.key(), name.to_string());
    }

    pub fn with(mut self, id: impl Into<RecordId>, name: &str) -> Self {
        self.insert(&id.into(), name);
        self
    }

    pub fn name(&self, id: &RecordId) -> Option<&str> {
        self.names.get(&id.key()).map(String::as_str)
    }

    /// Records without an id are skipped.
    pub fn from_collection(materials: &Collection) -> Self {
        let mut lookup = Self::new();
        for record in materials.iter() {
            if let Some(id) = record.id() {
                lookup.insert(&id, &coerce_to_string(record.get("name")));
            }
        }
        lookup
    }
}

/// `50` for 0.5, `33.33` for 0.33333.
fn percentage(fraction: f64) -> String {
    let value = (fraction * 100.0 * 100.0).round() / 100.0;
    value.to_string()
}

/// Tooltip text of a link: classification line, then one line per material fraction.
pub fn describe(waste: bool, composition: Option<&Composition>, materials: &MaterialLookup) -> String {
    let mut text = String::from(if waste { "Waste" } else { "Product" });

    let Some(composition) = composition else {
        text.push_str(LINE_BREAK);
        text.push_str(NO_COMPOSITION);
        return text;
    };

    if let Some(name) = composition.name.as_deref().filter(|n| !n.is_empty()) {
        text.push(' ');
        text.push_str(name);
    }
    text.push_str(LINE_BREAK);

    if composition.fractions.is_empty() {
        text.push_str(NO_COMPOSITION);
        return text;
    }

    let lines: Vec<String> = composition
        .fractions
        .iter()
        .map(|fraction| {
            let material = materials
                .name(&fraction.material)
                .unwrap_or(MATERIAL_NOT_FOUND);
            format!("{}% {}", percentage(fraction.fraction), material)
        })
        .collect();
    text.push_str(&lines.join(LINE_BREAK));
    text
}
