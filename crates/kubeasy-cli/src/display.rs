//! Result rendering - human glyph output and the CI JSON document

use std::time::Duration;

use console::style;
use serde_json::json;

use kubeasy_core::Objective;
use kubeasy_kube::{ObjectiveResult, Outcome};

/// Format a duration as decimal milliseconds, e.g. `12.345ms`.
pub fn format_ms(duration: Duration) -> String {
    format!("{:.3}ms", duration.as_secs_f64() * 1000.0)
}

/// Render results for a human, one line per objective.
///
/// Under fail-fast, objectives past the stopping point were never
/// dispatched; they render as failed with a "not run" note.
pub fn render_results(objectives: &[Objective], results: &[ObjectiveResult]) {
    for result in results {
        let glyph = match result.outcome {
            Outcome::Passed => style("✓").green().bold(),
            Outcome::Failed => style("✗").red().bold(),
            Outcome::Errored => style("!").red().bold(),
            Outcome::Cancelled => style("-").yellow().bold(),
        };

        if result.passed() {
            println!(
                "{} {} {}",
                glyph,
                style(&result.title).bold(),
                style(format!("({})", format_ms(result.duration))).dim()
            );
        } else {
            println!(
                "{} {} - {} {}",
                glyph,
                style(&result.title).bold(),
                result.message,
                style(format!("({})", format_ms(result.duration))).dim()
            );
        }
    }

    for objective in &objectives[results.len()..] {
        println!(
            "{} {} - {}",
            style("✗").red().bold(),
            style(&objective.title).bold(),
            style("not run (fail-fast)").dim()
        );
    }

    let total = objectives.len();
    let passed = results.iter().filter(|r| r.passed()).count();
    println!();
    if passed == total {
        println!(
            "{} All {} objectives passed",
            style("✓").green().bold(),
            total
        );
    } else {
        println!(
            "{} {}/{} objectives passed",
            style("✗").red().bold(),
            passed,
            total
        );
    }
}

/// Build the CI JSON document for one validation run.
///
/// Objectives that fail-fast left undispatched count as failed but do
/// not appear in the results array.
pub fn json_report(
    slug: &str,
    total: usize,
    results: &[ObjectiveResult],
    duration: Duration,
) -> serde_json::Value {
    let passed = results.iter().filter(|r| r.passed()).count();

    json!({
        "slug": slug,
        "allPassed": passed == total,
        "total": total,
        "passed": passed,
        "failed": total - passed,
        "duration": format_ms(duration),
        "results": results
            .iter()
            .map(|r| {
                json!({
                    "key": r.key,
                    "type": r.objective_type,
                    "title": r.title,
                    "passed": r.passed(),
                    "message": r.message,
                    "duration": format_ms(r.duration),
                })
            })
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(key: &str, outcome: Outcome, message: &str) -> ObjectiveResult {
        ObjectiveResult {
            key: key.to_string(),
            objective_type: "status",
            title: format!("Objective {}", key),
            outcome,
            message: message.to_string(),
            duration: Duration::from_micros(12_345),
        }
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(Duration::from_micros(12_345)), "12.345ms");
        assert_eq!(format_ms(Duration::from_secs(1)), "1000.000ms");
        assert_eq!(format_ms(Duration::ZERO), "0.000ms");
    }

    #[test]
    fn test_json_report_all_passed() {
        let results = vec![
            result("a", Outcome::Passed, "All status checks passed"),
            result("b", Outcome::Passed, "No forbidden events found"),
        ];
        let report = json_report("my-challenge", 2, &results, Duration::from_millis(40));

        assert_eq!(report["slug"], "my-challenge");
        assert_eq!(report["allPassed"], true);
        assert_eq!(report["total"], 2);
        assert_eq!(report["passed"], 2);
        assert_eq!(report["failed"], 0);
        assert_eq!(report["duration"], "40.000ms");
        assert_eq!(report["results"].as_array().unwrap().len(), 2);
        assert_eq!(report["results"][0]["key"], "a");
        assert_eq!(report["results"][0]["type"], "status");
    }

    #[test]
    fn test_json_report_fail_fast_counts_unrun_as_failed() {
        // Three objectives, only the first dispatched and failed.
        let results = vec![result("a", Outcome::Failed, "nope")];
        let report = json_report("my-challenge", 3, &results, Duration::from_millis(5));

        assert_eq!(report["allPassed"], false);
        assert_eq!(report["total"], 3);
        assert_eq!(report["passed"], 0);
        assert_eq!(report["failed"], 3);
        assert_eq!(report["results"].as_array().unwrap().len(), 1);
        assert_eq!(report["results"][0]["key"], "a");
        assert_eq!(report["results"][0]["passed"], false);
    }

    #[test]
    fn test_json_report_errored_counts_as_failed() {
        let results = vec![
            result("a", Outcome::Passed, "ok"),
            result("b", Outcome::Errored, "Kubernetes API error"),
        ];
        let report = json_report("c", 2, &results, Duration::from_millis(1));
        assert_eq!(report["passed"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["allPassed"], false);
    }
}
