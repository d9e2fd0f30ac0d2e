//! Rate snapshot data model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single quoted currency: display name plus current value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRate {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: Decimal,
}

impl CurrencyRate {
    pub fn new(name: impl Into<String>, value: Decimal) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One complete set of currency rates at a point in time.
///
/// Keyed by ISO-style three-letter currency code. Snapshots are
/// immutable once constructed: an update replaces the whole snapshot,
/// never a single entry. Equality is full structural equality over
/// every code, name and value, which is what change detection relies
/// on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSnapshot {
    rates: HashMap<String, CurrencyRate>,
}

impl RateSnapshot {
    /// Empty sentinel used before the first successful fetch
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyRate> {
        self.rates.get(code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CurrencyRate)> {
        self.rates.iter()
    }
}

impl FromIterator<(String, CurrencyRate)> for RateSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, CurrencyRate)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}
