//! Sync progress shown next to the outline.

use super::delta::DeltaLedger;

/// Presentation state derived from the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressIndicator {
    pub delta_count: u64,
    /// Bar fill in percent; `None` until a ledger with sections was seen
    pub percent: Option<f64>,
    pub all_caught_up: bool,
}

impl ProgressIndicator {
    pub fn from_ledger(ledger: &DeltaLedger) -> Self {
        let mut indicator = Self::default();
        indicator.update(ledger);
        indicator
    }

    /// Refresh from a mutated ledger.
    ///
    /// Without sections the bar keeps its previous fill.
    pub fn update(&mut self, ledger: &DeltaLedger) {
        self.delta_count = ledger.delta_count;
        self.all_caught_up = ledger.delta_count == 0;
        if let Some(percent) = ledger.progress_percent() {
            self.percent = Some(percent);
        }
    }

    pub fn count_label(&self) -> String {
        if self.all_caught_up {
            "🎉".to_string()
        } else {
            self.delta_count.to_string()
        }
    }

    pub fn sync_label(&self) -> &'static str {
        if self.all_caught_up {
            "All Caught Up"
        } else {
            "Sync Course Data"
        }
    }
}
