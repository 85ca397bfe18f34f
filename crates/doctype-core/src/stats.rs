//! Usage statistics persisted as a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::round3;
use crate::error::StatsError;
use crate::models::config::StatsConfig;
use crate::models::document::{ClassificationResult, DocumentCategory};

/// Result type for stats operations.
pub type Result<T> = std::result::Result<T, StatsError>;

const DAY_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One classified document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub confidence: f64,
    /// Local time, ISO 8601 without offset.
    pub timestamp: String,
}

impl HistoryEntry {
    /// `YYYY-MM-DD` part of the timestamp.
    pub fn day(&self) -> &str {
        self.timestamp
            .split_once('T')
            .map_or(self.timestamp.as_str(), |(day, _)| day)
    }
}

/// Counters and history as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub total_uploads: u64,
    #[serde(default)]
    pub daily_stats: BTreeMap<String, u64>,
    #[serde(default = "seeded_distribution")]
    pub distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub document_history: Vec<HistoryEntry>,
}

fn seeded_distribution() -> BTreeMap<String, u64> {
    DocumentCategory::ALL
        .iter()
        .map(|c| (c.stats_key().to_string(), 0))
        .collect()
}

impl Default for UsageStats {
    fn default() -> Self {
        Self {
            total_uploads: 0,
            daily_stats: BTreeMap::new(),
            distribution: seeded_distribution(),
            document_history: Vec::new(),
        }
    }
}

impl UsageStats {
    /// Count one classification and append it to the history, keeping at
    /// most `history_limit` entries.
    pub fn record(
        &mut self,
        filename: &str,
        doc_type: &str,
        confidence: f64,
        now: NaiveDateTime,
        history_limit: usize,
    ) {
        self.total_uploads += 1;
        *self
            .daily_stats
            .entry(now.format(DAY_FORMAT).to_string())
            .or_default() += 1;
        *self.distribution.entry(doc_type.to_string()).or_default() += 1;

        self.document_history.push(HistoryEntry {
            filename: filename.to_string(),
            doc_type: doc_type.to_string(),
            confidence: round3(confidence),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        });

        if self.document_history.len() > history_limit {
            let excess = self.document_history.len() - history_limit;
            self.document_history.drain(..excess);
        }
    }

    /// Drop every history entry for `filename` and rebuild the counters
    /// from what remains. Returns the number of entries removed.
    pub fn remove(&mut self, filename: &str) -> usize {
        let before = self.document_history.len();
        self.document_history.retain(|e| e.filename != filename);
        let removed = before - self.document_history.len();
        if removed > 0 {
            self.recount();
        }
        removed
    }

    /// Rebuild totals, per-day counts and distribution from the history.
    fn recount(&mut self) {
        self.total_uploads = self.document_history.len() as u64;
        self.daily_stats.clear();
        self.distribution = seeded_distribution();
        for entry in &self.document_history {
            *self.daily_stats.entry(entry.day().to_string()).or_default() += 1;
            *self.distribution.entry(entry.doc_type.clone()).or_default() += 1;
        }
    }

    /// Mean history confidence, 3 decimals; 0.0 without history.
    pub fn avg_confidence(&self) -> f64 {
        if self.document_history.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.document_history.iter().map(|e| e.confidence).sum();
        round3(sum / self.document_history.len() as f64)
    }
}

/// Stats with derived figures, as reported to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    #[serde(flatten)]
    pub stats: UsageStats,
    pub avg_confidence: f64,
}

/// File-backed stats with serialized read-modify-write.
#[derive(Debug)]
pub struct StatsStore {
    path: PathBuf,
    history_limit: usize,
    lock: Mutex<()>,
}

impl StatsStore {
    pub fn new(path: impl Into<PathBuf>, history_limit: usize) -> Self {
        Self {
            path: path.into(),
            history_limit,
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StatsConfig) -> Self {
        Self::new(config.path.clone(), config.history_limit)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current stats. A missing or unreadable file reads as fresh stats.
    pub fn load(&self) -> UsageStats {
        if !self.path.exists() {
            return UsageStats::default();
        }

        let parsed = std::fs::read_to_string(&self.path)
            .map_err(StatsError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(StatsError::from));

        match parsed {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Failed to read stats from {}: {}", self.path.display(), e);
                UsageStats::default()
            }
        }
    }

    pub fn save(&self, stats: &UsageStats) -> Result<()> {
        let content = serde_json::to_string_pretty(stats)?;
        std::fs::write(&self.path, content)?;
        debug!("Saved stats to {}", self.path.display());
        Ok(())
    }

    /// Count a successful classification of `filename`.
    pub fn record(
        &self,
        filename: &str,
        result: &ClassificationResult,
        now: NaiveDateTime,
    ) -> Result<UsageStats> {
        let _guard = self.lock.lock().map_err(|_| StatsError::Poisoned)?;
        let mut stats = self.load();
        stats.record(
            filename,
            &result.predicted_class,
            result.confidence,
            now,
            self.history_limit,
        );
        self.save(&stats)?;
        Ok(stats)
    }

    /// Forget every history entry for `filename`.
    pub fn delete(&self, filename: &str) -> Result<UsageStats> {
        let _guard = self.lock.lock().map_err(|_| StatsError::Poisoned)?;
        let mut stats = self.load();
        if stats.remove(filename) == 0 {
            return Err(StatsError::NotFound(filename.to_string()));
        }
        self.save(&stats)?;
        Ok(stats)
    }

    pub fn summary(&self) -> StatsSummary {
        let stats = self.load();
        let avg_confidence = stats.avg_confidence();
        StatsSummary {
            stats,
            avg_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::ExtractedFields;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_micro_opt(hour, 30, 0, 250)
            .unwrap()
    }

    fn result(class: &str, confidence: f64) -> ClassificationResult {
        ClassificationResult {
            predicted_class: class.to_string(),
            confidence,
            extracted_info: ExtractedFields::new(),
            text_length: 10,
            original_text_length: 20,
        }
    }

    fn store() -> (tempfile::TempDir, StatsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::new(dir.path().join("analysis_stats.json"), 100);
        (dir, store)
    }

    #[test]
    fn test_fresh_stats_are_seeded() {
        let stats = UsageStats::default();
        assert_eq!(stats.total_uploads, 0);
        assert_eq!(stats.distribution.len(), 4);
        assert!(stats.distribution.values().all(|&n| n == 0));
        assert!(stats.distribution.contains_key("purchase order"));
    }

    #[test]
    fn test_record_updates_counters() {
        let (_dir, store) = store();

        store.record("a.pdf", &result("invoice", 0.9), at(5, 9)).unwrap();
        store.record("b.pdf", &result("invoice", 0.8), at(5, 10)).unwrap();
        store.record("c.pdf", &result("report", 0.7), at(6, 11)).unwrap();

        let stats = store.load();
        assert_eq!(stats.total_uploads, 3);
        assert_eq!(stats.daily_stats["2024-01-05"], 2);
        assert_eq!(stats.daily_stats["2024-01-06"], 1);
        assert_eq!(stats.distribution["invoice"], 2);
        assert_eq!(stats.distribution["report"], 1);
        assert_eq!(stats.distribution["shippingorder"], 0);
        assert_eq!(stats.document_history[0].timestamp, "2024-01-05T09:30:00.000250");
        assert_eq!(stats.document_history[0].day(), "2024-01-05");
    }

    #[test]
    fn test_record_rounds_confidence() {
        let mut stats = UsageStats::default();
        stats.record("a.pdf", "invoice", 0.91249, at(1, 0), 100);
        assert_eq!(stats.document_history[0].confidence, 0.912);
    }

    #[test]
    fn test_history_capped_total_not() {
        let mut stats = UsageStats::default();
        for i in 0..105 {
            stats.record(&format!("{i}.pdf"), "report", 0.5, at(1, 0), 100);
        }

        assert_eq!(stats.total_uploads, 105);
        assert_eq!(stats.document_history.len(), 100);
        assert_eq!(stats.document_history[0].filename, "5.pdf");
        assert_eq!(stats.document_history[99].filename, "104.pdf");
    }

    #[test]
    fn test_delete_recomputes_from_history() {
        let (_dir, store) = store();
        store.record("a.pdf", &result("invoice", 0.9), at(5, 9)).unwrap();
        store.record("b.pdf", &result("shippingorder", 0.6), at(6, 9)).unwrap();
        store.record("a.pdf", &result("invoice", 0.95), at(7, 9)).unwrap();

        let stats = store.delete("a.pdf").unwrap();

        assert_eq!(stats.total_uploads, 1);
        assert_eq!(stats.document_history.len(), 1);
        assert_eq!(stats.daily_stats.len(), 1);
        assert_eq!(stats.daily_stats["2024-01-06"], 1);
        assert_eq!(stats.distribution["invoice"], 0);
        assert_eq!(stats.distribution["shippingorder"], 1);
        assert_eq!(store.load(), stats);
    }

    #[test]
    fn test_delete_unknown_is_not_found() {
        let (_dir, store) = store();
        store.record("a.pdf", &result("invoice", 0.9), at(5, 9)).unwrap();

        let err = store.delete("missing.pdf").unwrap_err();

        assert!(matches!(err, StatsError::NotFound(ref f) if f == "missing.pdf"));
        assert_eq!(store.load().total_uploads, 1);
    }

    #[test]
    fn test_summary_avg_confidence() {
        let (_dir, store) = store();
        assert_eq!(store.summary().avg_confidence, 0.0);

        store.record("a.pdf", &result("invoice", 0.9), at(5, 9)).unwrap();
        store.record("b.pdf", &result("report", 0.7), at(5, 9)).unwrap();

        let summary = store.summary();
        assert_eq!(summary.avg_confidence, 0.8);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["avg_confidence"], 0.8);
        assert_eq!(json["total_uploads"], 2);
        assert_eq!(json["document_history"][0]["type"], "invoice");
    }

    #[test]
    fn test_corrupt_file_reads_as_fresh() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load(), UsageStats::default());

        store.record("a.pdf", &result("invoice", 0.9), at(5, 9)).unwrap();
        assert_eq!(store.load().total_uploads, 1);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let (_dir, store) = store();
        std::fs::write(store.path(), r#"{"total_uploads": 7}"#).unwrap();

        let stats = store.load();
        assert_eq!(stats.total_uploads, 7);
        assert_eq!(stats.distribution, seeded_distribution());
        assert!(stats.document_history.is_empty());
    }

    #[test]
    fn test_unknown_label_extends_distribution() {
        let mut stats = UsageStats::default();
        stats.record("r.pdf", "receipt", 0.5, at(1, 0), 100);
        assert_eq!(stats.distribution["receipt"], 1);
        assert_eq!(stats.distribution.len(), 5);
    }
}
