//! Pattern tables driving session analysis.
//!
//! Detection here is deliberately shallow: substring keyword rows and a
//! fixed list of anaphora regexes. Rows are data, so tuning the tables
//! never touches the analysis logic.

use once_cell::sync::Lazy;
use regex::Regex;

/// Topic rows matched against user turn text. Row order doubles as the
/// domain priority order.
pub const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "finance",
        &[
            "investment",
            "fund",
            "stock",
            "deposit",
            "interest rate",
            "loan",
            "insurance",
            "portfolio",
        ],
    ),
    (
        "technology",
        &[
            "software",
            "algorithm",
            "database",
            "network",
            "server",
            "cloud",
            "api",
            "deployment",
        ],
    ),
    (
        "healthcare",
        &[
            "health",
            "medical",
            "doctor",
            "symptom",
            "medication",
            "treatment",
            "diagnosis",
            "hospital",
        ],
    ),
    (
        "education",
        &[
            "course",
            "study",
            "exam",
            "school",
            "teacher",
            "student",
            "curriculum",
            "homework",
        ],
    ),
    (
        "general",
        &[
            "recommend",
            "compare",
            "difference",
            "explain",
            "how do i",
            "what is",
            "help me",
            "advice",
        ],
    ),
];

/// Topic rows matched against assistant responses during context
/// reconstruction. Narrower and business-aware; "general" is excluded
/// because it carries no information in a context description.
pub const RESPONSE_TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "finance",
        &[
            "investment",
            "fund",
            "stock",
            "deposit",
            "interest rate",
            "loan",
            "insurance",
            "portfolio",
        ],
    ),
    (
        "technology",
        &[
            "software",
            "algorithm",
            "database",
            "network",
            "server",
            "cloud",
            "api",
            "deployment",
        ],
    ),
    (
        "healthcare",
        &[
            "health",
            "medical",
            "doctor",
            "symptom",
            "medication",
            "treatment",
            "diagnosis",
            "hospital",
        ],
    ),
    (
        "education",
        &[
            "course",
            "study",
            "exam",
            "school",
            "teacher",
            "student",
            "curriculum",
            "homework",
        ],
    ),
    (
        "business",
        &[
            "market",
            "company",
            "strategy",
            "customer",
            "revenue",
            "growth",
            "management",
            "pricing",
        ],
    ),
];

/// Anaphora markers: phrases that only make sense with earlier
/// conversation in scope.
pub static ANAPHORA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(earlier|previously|before)\b.{0,40}\b(mentioned|said|asked|discussed)\b",
        r"(?i)\byou (mentioned|said|suggested|recommended|brought up)\b",
        r"(?i)\b(as|like) (you|i) (said|mentioned)\b",
        r"(?i)\bthe (first|second|third|last|previous|above) (one|option|item|answer|point|question)\b",
        r"(?i)\b(that one|this one|those ones|the same one)\b",
        r"(?i)\bwhat about\b",
        r"(?i)\b(tell me more|more details?|elaborate)\b",
        r"(?i)\b(again|once more)\b",
        r"(?i)\bbased on (that|this|the above|what you said)\b",
        r"(?i)\b(the above|the aforementioned)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Entity patterns used on prior user queries: quoted phrases,
/// capitalized names, and quantities with a unit. Each pattern captures
/// the entity in group 1.
pub static ENTITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""([^"]{1,60})""#,
        r"“([^”]{1,60})”",
        r"\b([A-Z][A-Za-z0-9]{2,}(?: [A-Z][A-Za-z0-9]+)*)\b",
        r"(?i)\b(\d+(?:\.\d+)?\s*(?:%|percent|dollars?|usd|eur|yen|years?|months?|weeks?|days?|hours?|points?|shares?|million|billion))\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Sentence-initial words the capitalized-name pattern would otherwise
/// report as entities.
pub const CAPITALIZED_STOPWORDS: &[&str] = &[
    "What", "How", "Why", "When", "Where", "Which", "Who", "Can", "Could", "Should", "Would",
    "Does", "The", "This", "That", "These", "Those", "Please", "Tell", "Show", "Give", "And",
    "But", "For", "Are", "Was", "Were", "Will", "Has", "Have", "With", "From", "About",
];

/// True when the text contains at least one anaphoric marker.
pub fn contains_anaphora(text: &str) -> bool {
    ANAPHORA_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Labels of the rows whose keywords appear in the text, in table
/// order. Matching is case-insensitive substring containment.
pub fn match_topics(text: &str, table: &[(&str, &[&str])]) -> Vec<String> {
    let lower = text.to_lowercase();
    table
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(label, _)| (*label).to_string())
        .collect()
}
