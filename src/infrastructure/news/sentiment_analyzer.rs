//! Lexicon-based sentiment scoring for news articles.
//!
//! Wraps VADER (Valence Aware Dictionary and sEntiment Reasoner) and boosts
//! its general-purpose lexicon with equity-market vocabulary that VADER
//! tends to score flat ("beats estimates", "downgrade", ...). Scores stay
//! in [-1, 1]; the aggregator buckets them at the +/-0.3 thresholds.

use vader_sentiment::SentimentIntensityAnalyzer;

const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("beats estimates", 0.4),
    ("beat expectations", 0.4),
    ("raises guidance", 0.5),
    ("record revenue", 0.4),
    ("record profit", 0.4),
    ("upgrade", 0.3),
    ("upgraded", 0.3),
    ("outperform", 0.3),
    ("buyback", 0.3),
    ("dividend increase", 0.3),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("surge", 0.4),
    ("surges", 0.4),
    ("soars", 0.5),
    ("all-time high", 0.5),
    ("breakout", 0.3),
    ("bullish", 0.5),
    ("strong demand", 0.3),
    ("expansion", 0.2),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("misses estimates", -0.4),
    ("missed expectations", -0.4),
    ("cuts guidance", -0.5),
    ("lowers guidance", -0.5),
    ("downgrade", -0.3),
    ("downgraded", -0.3),
    ("underperform", -0.3),
    ("layoffs", -0.4),
    ("lawsuit", -0.4),
    ("investigation", -0.3),
    ("sec probe", -0.4),
    ("recall", -0.3),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("crash", -0.5),
    ("crashes", -0.5),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("bearish", -0.5),
    ("bankruptcy", -0.6),
];

/// VADER analyzer with equity-market keyword boosting.
pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn keyword_boost(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let mut boost = 0.0;
        for (keyword, score) in BULLISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score;
            }
        }
        for (keyword, score) in BEARISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score; // already negative
            }
        }
        boost
    }

    /// Compound sentiment score in [-1, 1] for one piece of text.
    pub fn analyze(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        let compound = scores["compound"];
        (compound + self.keyword_boost(text) * 0.5).clamp(-1.0, 1.0)
    }

    /// Score one article from its concatenated title + summary, as the
    /// aggregation layer expects: one scorer call per article.
    pub fn score_article(&self, title: &str, summary: &str) -> f64 {
        self.analyze(&format!("{} {}", title, summary))
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullish_headlines() {
        let analyzer = SentimentAnalyzer::new();
        let headlines = [
            "Shares surge after company beats estimates and raises guidance",
            "Stock rallies to all-time high on record revenue",
            "Analyst upgrade sends shares higher, outlook bullish",
        ];
        for headline in headlines {
            let score = analyzer.analyze(headline);
            assert!(score > 0.0, "expected bullish score for '{headline}', got {score}");
        }
    }

    #[test]
    fn test_bearish_headlines() {
        let analyzer = SentimentAnalyzer::new();
        let headlines = [
            "Stock plunges after company misses estimates and cuts guidance",
            "Shares crash amid SEC probe and investor lawsuit",
            "Broad sell-off deepens as bankruptcy fears grow",
        ];
        for headline in headlines {
            let score = analyzer.analyze(headline);
            assert!(score < 0.0, "expected bearish score for '{headline}', got {score}");
        }
    }

    #[test]
    fn test_score_stays_in_range() {
        let analyzer = SentimentAnalyzer::new();
        let extreme = "surge rally soars breakout bullish record revenue record profit \
                       upgrade buyback all-time high beats estimates raises guidance";
        let score = analyzer.analyze(extreme);
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.analyze(""), 0.0);
        assert_eq!(analyzer.analyze("   "), 0.0);
    }

    #[test]
    fn test_article_scoring_concatenates() {
        let analyzer = SentimentAnalyzer::new();
        // A flat title with a strongly positive summary must still move the
        // score, since both parts feed one scorer call.
        let with_summary =
            analyzer.score_article("Quarterly results", "Company beats estimates, shares surge");
        let title_only = analyzer.score_article("Quarterly results", "");
        assert!(with_summary > title_only);
    }
}
