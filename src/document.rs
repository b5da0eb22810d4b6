//! The meal plan document: a flat mapping from field key to field value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Token that marks a field as multi-line.
pub const MULTILINE_MARKER: &str = "ingredients";

/// Key of one editable field, e.g. `day3-meal1-ingredients`.
///
/// Keys are opaque to everything except [`FieldKey::is_multiline`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey(String);

impl FieldKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ingredients fields accept line breaks and save while typing.
    pub fn is_multiline(&self) -> bool {
        self.0.contains(MULTILINE_MARKER)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// The complete meal plan.
///
/// Values are always strings. A key that is absent reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, String>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in plan used to seed a fresh data file and as the client's
    /// last-resort fallback.
    pub fn builtin_default() -> Self {
        DEFAULT_FIELDS
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FromIterator<(String, String)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

const DEFAULT_FIELDS: &[(&str, &str)] = &[
    // Saturday 6/21
    ("day1-where", "Fazio house"),
    ("day1-meal1-title", "Soup & Sandwiches and chips"),
    ("day1-meal1-shopping", "Fazio"),
    ("day1-meal1-prep", "Fazio"),
    ("day1-meal1-eaters", "All but Paul"),
    // Sunday 6/22
    ("day2-where", "Fazio house"),
    ("day2-meal1-title", "Meat"),
    ("day2-meal1-shopping", "Fazio"),
    ("day2-meal1-prep", "Fazio"),
    ("day2-meal1-eaters", "All but paul"),
    // Monday 6/23
    ("day3-where", "Paul's house"),
    ("day3-meal1-title", "Pizza"),
    ("day3-meal1-shopping", "paul"),
    (
        "day3-meal1-ingredients",
        "Black olives, mushrooms, onions, green bell peppers, chicken, pineapple",
    ),
    ("day3-meal1-prep", "Paul"),
    ("day3-meal1-eaters", "All"),
    // Tuesday 6/24
    ("day4-context", "(Rachel's birthday)"),
    // Wednesday 6/25
    ("day5-where", "Paul's house"),
    ("day5-meal1-title", "Breakfast foods"),
    ("day5-meal1-shopping", "Fazio"),
    ("day5-meal1-ingredients", "eggs, veg sausage"),
    ("day5-meal1-prep", "Fazio"),
    ("day5-meal1-eaters", "all but Sal & Paul"),
    ("day5-meal2-title", "Breakfast foods"),
    ("day5-meal2-shopping", "Paul"),
    (
        "day5-meal2-ingredients",
        "waffles, fruit (options: blueberries, strawberries, pineapple, kiwi)",
    ),
    ("day5-meal2-prep", "Paul"),
    ("day5-meal2-eaters", "all but Sal"),
    // Thursday 6/26
    ("day6-context", "(With Sarah)"),
    ("day6-where", "[Eem on N. Williams](https://www.eempdx.com/)"),
    // Friday 6/27
    ("day7-where", "Fazio house"),
    ("day7-meal1-title", "Pad Thai"),
    ("day7-meal1-shopping", "Fazio"),
    ("day7-meal1-prep", "Fazio"),
    ("day7-meal1-eaters", "Rach, Hailey, Sal"),
    ("day7-meal2-title", "Bring food"),
    ("day7-meal2-eaters", "Mom, Dad, Paul"),
    // Saturday 6/28
    ("day8-context", "(Hailey brings leftover Pad Thai)"),
    ("day8-where", "Restaurant TBD"),
    // Sunday 6/29
    ("day9-context", "(Hailey's birthday)"),
    ("day9-where", "Fazio house"),
    ("day9-meal1-title", "Omelettes, grits, fruit, & veggie sausage"),
    ("day9-meal1-shopping", "Fazio"),
    ("day9-meal1-prep", "Fazio"),
    ("day9-meal1-eaters", "All"),
    (
        "day9-meal2-title",
        "Roasted pumpkin Thai risotto / Spiced Pumpkin muffins",
    ),
    ("day9-meal2-shopping", "Paul"),
    ("day9-meal2-prep", "Paul"),
    ("day9-meal2-eaters", "All"),
];
