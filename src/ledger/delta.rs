//! The delta ledger: how many sections differ from the synced baseline.
//!
//! The ledger is a two-level rollup. Each section has one entry whose
//! `modified_or_not_exist` flag says whether the section (or any of its
//! subsections) differs from the baseline; `delta_count` counts those
//! differences.

use crate::outline::Category;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

/// Outline level the ledger tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLevel {
    /// Top level (chapter)
    Section,
    /// Second level (sequential)
    Subsection,
}

impl SectionLevel {
    pub fn from_category(category: Category) -> Option<Self> {
        match category {
            Category::Chapter => Some(SectionLevel::Section),
            Category::Sequential => Some(SectionLevel::Subsection),
            _ => None,
        }
    }
}

/// One top-level entry of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modified_or_not_exist: bool,
}

impl SectionEntry {
    pub fn modified(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            modified_or_not_exist: true,
        }
    }

    #[cfg(test)]
    pub fn synced(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            modified_or_not_exist: false,
        }
    }
}

/// Persisted record of outline entries that differ from the baseline.
///
/// Serialized as `{"delta_count": n, "section": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaLedger {
    #[serde(default, deserialize_with = "count_from_number_or_string")]
    pub delta_count: u64,
    #[serde(rename = "section", default)]
    pub sections: Vec<SectionEntry>,
}

/// The baseline writer is not strict about the count's JSON type.
fn count_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(v)
            } else if let Some(v) = n.as_i64() {
                Ok(v.max(0) as u64)
            } else {
                Ok(n.as_f64().unwrap_or(0.0).max(0.0) as u64)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            trimmed
                .parse::<i64>()
                .map(|v| v.max(0) as u64)
                .map_err(|_| D::Error::custom(format!("invalid delta_count '{}'", s)))
        }
        other => Err(D::Error::custom(format!(
            "invalid delta_count type: {}",
            other
        ))),
    }
}

impl DeltaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, id: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|entry| entry.id == id)
    }

    fn section_mut(&mut self, id: &str) -> Option<&mut SectionEntry> {
        self.sections.iter_mut().find(|entry| entry.id == id)
    }

    /// Add one difference at `level`.
    pub fn increment(&mut self, level: SectionLevel) -> u64 {
        self.delta_count += 1;
        debug!("Ledger increment ({:?}) -> {}", level, self.delta_count);
        self.delta_count
    }

    /// Remove one difference at `level`; the count never goes below zero.
    pub fn decrement(&mut self, level: SectionLevel) -> u64 {
        self.delta_count = self.delta_count.saturating_sub(1);
        debug!("Ledger decrement ({:?}) -> {}", level, self.delta_count);
        self.delta_count
    }

    /// Account for a newly created (or duplicated) entry.
    ///
    /// A new section is always a difference. A new subsection only counts the
    /// first time its parent section turns modified. Returns whether the
    /// ledger changed.
    pub fn record_child_added(
        &mut self,
        category: Category,
        name: &str,
        id: &str,
        parent_id: &str,
    ) -> bool {
        match SectionLevel::from_category(category) {
            Some(SectionLevel::Section) => {
                self.increment(SectionLevel::Section);
                self.sections.push(SectionEntry::modified(id, name));
                true
            }
            Some(SectionLevel::Subsection) => {
                let flipped = match self.section_mut(parent_id) {
                    Some(parent) if !parent.modified_or_not_exist => {
                        parent.modified_or_not_exist = true;
                        true
                    }
                    _ => false,
                };
                if flipped {
                    self.increment(SectionLevel::Subsection);
                }
                flipped
            }
            None => false,
        }
    }

    /// Account for a deleted entry. Returns whether the ledger changed.
    ///
    /// Deleting a subsection counts a difference while its parent section is
    /// still unmodified, but leaves the parent's flag untouched.
    pub fn record_delete(&mut self, category: Category, entry_id: &str, parent_id: &str) -> bool {
        match SectionLevel::from_category(category) {
            Some(SectionLevel::Section) => {
                let Some(was_modified) = self
                    .section(entry_id)
                    .map(|entry| entry.modified_or_not_exist)
                else {
                    return false;
                };
                if was_modified {
                    self.decrement(SectionLevel::Section);
                } else {
                    self.increment(SectionLevel::Section);
                }
                self.sections.retain(|entry| entry.id != entry_id);
                true
            }
            Some(SectionLevel::Subsection) => match self.section(parent_id) {
                Some(parent) if !parent.modified_or_not_exist => {
                    self.increment(SectionLevel::Subsection);
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    /// Share of sections in sync, in percent. `None` without sections.
    pub fn progress_percent(&self) -> Option<f64> {
        let section_count = self.sections.len();
        if section_count == 0 {
            return None;
        }
        let total = section_count as f64;
        Some((total - self.delta_count as f64) / total * 100.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
