//! Query intent classification.
//!
//! Intentionally crude: pure substring containment over the lower-cased
//! query, no tokenization, no negation handling. Ties resolve by the fixed
//! priority order in `recommended_chart`.

use super::types::{ChartType, IntentSignals};

const COMPARISON_KEYWORDS: &[&str] = &["compare", "vs", "versus", "between", "difference", "across"];

const TREND_KEYWORDS: &[&str] = &[
    "trend", "over time", "yearly", "year", "growth", "change", "last", "years", "over",
];

const TOTAL_KEYWORDS: &[&str] = &[
    "total", "sum", "aggregate", "highest", "top", "which", "best", "worst",
];

/// Derive intent signals from the raw query string.
pub fn classify(query: &str) -> IntentSignals {
    let lowered = query.to_lowercase();
    IntentSignals {
        is_comparison: contains_any(&lowered, COMPARISON_KEYWORDS),
        is_trend: contains_any(&lowered, TREND_KEYWORDS),
        has_total: contains_any(&lowered, TOTAL_KEYWORDS),
    }
}

fn contains_any(lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| lowered.contains(kw))
}

impl IntentSignals {
    /// Chart-type recommendation, evaluated as a priority chain: trend wins
    /// over comparison, comparison and totals map to bar, default is line.
    pub fn recommended_chart(&self) -> ChartType {
        if self.is_trend {
            ChartType::Line
        } else if self.is_comparison {
            ChartType::Bar
        } else if self.has_total {
            ChartType::Bar
        } else {
            ChartType::Line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_takes_priority_over_comparison() {
        let signals = classify("compare Wakad and Aundh trends over last 3 years");
        assert!(signals.is_trend);
        assert!(signals.is_comparison);
        assert_eq!(signals.recommended_chart(), ChartType::Line);
    }

    #[test]
    fn comparison_without_trend_is_bar() {
        let signals = classify("compare flat rates in Wakad vs Aundh");
        assert!(signals.is_comparison);
        assert!(!signals.is_trend);
        assert_eq!(signals.recommended_chart(), ChartType::Bar);
    }

    #[test]
    fn totals_without_trend_or_comparison_are_bar() {
        let signals = classify("highest total sales by location");
        assert!(signals.has_total);
        assert!(!signals.is_trend);
        assert!(!signals.is_comparison);
        assert_eq!(signals.recommended_chart(), ChartType::Bar);

        let signals = classify("top locations by flat rate");
        assert_eq!(signals.recommended_chart(), ChartType::Bar);
    }

    #[test]
    fn default_is_line() {
        let signals = classify("tell me about Wakad");
        assert!(!signals.is_comparison);
        assert!(!signals.is_trend);
        assert!(!signals.has_total);
        assert_eq!(signals.recommended_chart(), ChartType::Line);
    }

    #[test]
    fn matching_is_substring_based() {
        // "yearly" also matches "year"; both set the trend signal.
        assert!(classify("yearly growth").is_trend);
        // Substring matching has no word boundaries.
        assert!(classify("layover prices").is_trend);
    }
}
