use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Scores carry two decimal places, rounding exact halves to even
/// (50/16 = 3.125 gives 3.12).
pub fn format_score(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Outcome of one expected-output file. Fields are declared in the order
/// they are written.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestRecord {
    pub max_score: f64,
    pub name: String,
    pub output: String,
    pub score: f64,
    #[serde(skip)]
    pub passed: bool,
}

/// Gradescope-style results document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportDocument {
    pub output: String,
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<TestRecord>>,
}

impl ReportDocument {
    pub fn compile_failed(message: String) -> Self {
        Self {
            output: message,
            score: 0,
            tests: None,
        }
    }

    pub fn graded(message: String, tests: Vec<TestRecord>) -> Self {
        let total: f64 = tests.iter().map(|t| t.score).sum();
        Self {
            output: message,
            score: format_score(total).round_ties_even() as i64,
            tests: Some(tests),
        }
    }

    /// Compiled and every test passed.
    pub fn passed(&self) -> bool {
        self.tests
            .as_ref()
            .is_some_and(|tests| tests.iter().all(|t| t.passed))
    }

    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn summary(&self, total_points: f64) -> String {
        format!("score = {} out of {total_points:.1}", self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn record(name: &str, score: f64, max_score: f64) -> TestRecord {
        TestRecord {
            max_score,
            name: name.to_string(),
            output: format!("Passed {name} test.\n"),
            score,
            passed: score > 0.0,
        }
    }

    #[test]
    fn compile_failure_has_no_tests() {
        let report = ReportDocument::compile_failed("Compilation (javac Main.java) FAILED:\n".into());
        assert_eq!(report.score, 0);
        assert!(!report.passed());

        let json = report.to_json().unwrap();
        assert!(!json.contains("\"tests\""));
        assert_eq!(
            json,
            "{\n    \"output\": \"Compilation (javac Main.java) FAILED:\\n\",\n    \"score\": 0\n}"
        );
    }

    #[test]
    fn keys_sorted_with_four_space_indent() {
        let report = ReportDocument::graded("ok\n".into(), vec![record("t-1.out", 50.0, 50.0)]);
        let json = report.to_json().unwrap();
        let expected = r#"{
    "output": "ok\n",
    "score": 50,
    "tests": [
        {
            "max_score": 50.0,
            "name": "t-1.out",
            "output": "Passed t-1.out test.\n",
            "score": 50.0
        }
    ]
}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn score_rounds_sum_of_tests() {
        let tests = vec![
            record("a.out", 16.67, 16.67),
            record("b.out", 16.67, 16.67),
            record("c.out", 16.67, 16.67),
        ];
        let report = ReportDocument::graded(String::new(), tests);
        assert_eq!(report.score, 50);
        assert!(report.passed());
        assert_eq!(report.summary(50.0), "score = 50 out of 50.0");
    }

    #[test]
    fn format_score_keeps_two_decimals() {
        assert_eq!(format_score(50.0 / 3.0), 16.67);
        assert_eq!(format_score(50.0 / 16.0), 3.12);
        assert_eq!(format_score(12.5), 12.5);
    }

    #[test]
    fn sixteen_way_split_stays_within_budget() {
        let share = format_score(50.0 / 16.0);
        let total: f64 = (0..16).map(|_| share).sum();
        assert!(total <= 50.0);
        assert!((total - 50.0).abs() < 0.1);
    }

    #[test]
    fn half_point_total_rounds_to_even() {
        let tests = vec![
            record("a.out", 12.5, 12.5),
            record("b.out", 0.0, 12.5),
            record("c.out", 0.0, 12.5),
            record("d.out", 0.0, 12.5),
        ];
        assert_eq!(ReportDocument::graded(String::new(), tests).score, 12);

        let tests = vec![record("a.out", 37.5, 37.5), record("b.out", 0.0, 12.5)];
        assert_eq!(ReportDocument::graded(String::new(), tests).score, 38);
    }

    #[test]
    fn one_failure_fails_the_run() {
        let tests = vec![record("a.out", 25.0, 25.0), record("b.out", 0.0, 25.0)];
        let report = ReportDocument::graded(String::new(), tests);
        assert_eq!(report.score, 25);
        assert!(!report.passed());
    }

    #[test]
    fn write_to_creates_file() {
        let dir = TempDir::new("grade_report").unwrap();
        let path = dir.path().join("results.json");
        let report = ReportDocument::graded(String::new(), vec![]);

        report.write_to(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["score"], 0);
        assert_eq!(value["tests"], serde_json::json!([]));
    }
}
