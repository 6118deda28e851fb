//! Compliance and safety scanning: the hard gate.
//!
//! Scans explanation text for references to protected attributes, sensitive
//! inferences, and harmful advice. Violations are never raised as errors;
//! they become flags on the report so the full detail reaches the auditor.
//! Any critical-severity match fails the compliance gate, which caps the
//! final score regardless of the other seven dimensions.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzers::{Dimension, DimensionScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Advisory,
}

/// One matched compliance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceViolation {
    /// Rule identifier, e.g. `protected:gender`.
    pub rule: String,
    /// The text fragment that matched.
    pub matched: String,
    pub severity: Severity,
}

/// Rule table: (rule id, severity, pattern).
const COMPLIANCE_RULES: &[(&str, Severity, &str)] = &[
    (
        "protected:gender",
        Severity::Critical,
        r"(?i)\bgender\b|\bfemale\b|\bmale\b|\bwoman\b|\bwomen\b",
    ),
    (
        "protected:ethnicity",
        Severity::Critical,
        r"(?i)\brace\b|\bethnic\w*\b|\bnationality\b|\bnational origin\b|\bskin colou?r\b",
    ),
    (
        "protected:religion",
        Severity::Critical,
        r"(?i)\breligio\w*\b|\bchristian\b|\bmuslim\b|\bjewish\b|\bhindu\b|\bbuddhist\b",
    ),
    (
        "protected:disability",
        Severity::Critical,
        r"(?i)\bdisabilit\w*\b|\bdisabled\b|\bhandicap\w*\b",
    ),
    (
        "protected:age",
        Severity::Critical,
        r"(?i)\byears? of age\b|\bage\b|\btoo old\b|\btoo young\b|\belderly\b",
    ),
    (
        "protected:marital_status",
        Severity::Critical,
        r"(?i)\bmarital\b|\bmarried\b|\bdivorced\b|\bwidowed\b|\bfamily status\b|\bpregnan\w*\b",
    ),
    (
        "sensitive:immigration",
        Severity::Critical,
        r"(?i)\bimmigra\w*\b|\bvisa status\b|\bcitizenship\b|\bundocumented\b",
    ),
    (
        "sensitive:sexual_orientation",
        Severity::Critical,
        r"(?i)\bsexual orientation\b|\bgay\b|\blesbian\b|\bbisexual\b|\btransgender\b",
    ),
    (
        "sensitive:political",
        Severity::Critical,
        r"(?i)\bpolitical\w*\b|\bvoting record\b|\bparty affiliation\b",
    ),
    (
        "harmful:falsification",
        Severity::Critical,
        r"(?i)\bfalsif\w*\b|\bfabricat\w*\b|\blie about\b|\bmisrepresent\w*\b|\bconceal\w*\b|\bhide your\b",
    ),
    (
        "possible_marital_status",
        Severity::Advisory,
        r"(?i)\bsingle\b|\bspouse\b",
    ),
];

/// Compiled compliance scanner. Build once, reuse across runs.
pub struct ComplianceScanner {
    rules: Vec<(String, Severity, Regex)>,
}

impl Default for ComplianceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceScanner {
    pub fn new() -> Self {
        let rules = COMPLIANCE_RULES
            .iter()
            .filter_map(|(rule, severity, pattern)| {
                Regex::new(pattern)
                    .ok()
                    .map(|re| (rule.to_string(), *severity, re))
            })
            .collect();
        Self { rules }
    }

    pub fn scan(&self, text: &str) -> Vec<ComplianceViolation> {
        let mut violations = Vec::new();
        for (rule, severity, re) in &self.rules {
            for m in re.find_iter(text) {
                violations.push(ComplianceViolation {
                    rule: rule.clone(),
                    matched: m.as_str().to_string(),
                    severity: *severity,
                });
            }
        }
        violations
    }
}

/// Result of the compliance dimension: the score, the gate verdict, and the
/// full violation detail for the report.
pub struct ComplianceOutcome {
    pub score: DimensionScore,
    pub pass: bool,
    pub violations: Vec<ComplianceViolation>,
}

pub fn analyze(text: &str, scanner: &ComplianceScanner) -> ComplianceOutcome {
    let violations = scanner.scan(text);
    let any_critical = violations.iter().any(|v| v.severity == Severity::Critical);
    let any_advisory = violations.iter().any(|v| v.severity == Severity::Advisory);

    let value = if any_critical {
        0.0
    } else if any_advisory {
        0.5
    } else {
        1.0
    };

    let mut score = DimensionScore::new(Dimension::Compliance, value);
    for v in &violations {
        let prefix = match v.severity {
            Severity::Critical => "critical",
            Severity::Advisory => "advisory",
        };
        score = score.with_flag(format!("{prefix}:{}", v.rule));
    }

    ComplianceOutcome {
        score,
        pass: !any_critical,
        violations,
    }
}
