// crates/smoke-harness-cli/src/tests/console.rs
// ============================================================================
// Module: Console Reporter Tests
// Description: Unit tests for PASS/FAIL rendering and stream routing.
// Purpose: Pin the operator-facing line formats.
// Dependencies: smoke-harness-cli console module
// ============================================================================

//! ## Overview
//! Drives [`ConsoleReporter`] with in-memory writers and checks line content,
//! numbering across suites, and stream separation.

use std::io;
use std::io::Write;
use std::time::Duration;

use smoke_harness_core::CaseFailure;
use smoke_harness_core::CaseResult;
use smoke_harness_core::HarnessWarning;
use smoke_harness_core::ReportSink;
use smoke_harness_core::SuiteReport;

use crate::console::ConsoleReporter;
use crate::console::case_line;
use crate::console::format_elapsed;
use crate::console::summary_line;

fn pass(description: &str) -> CaseResult {
    CaseResult::passed(description, "status 200", "status 200")
}

fn fail_503(description: &str) -> CaseResult {
    CaseResult::failed(
        description,
        "status 200",
        "status 503",
        CaseFailure::Status {
            expected: 200,
            actual: 503,
        },
    )
}

/// Writer whose every write fails.
struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn pass_and_fail_lines_name_the_check() {
    assert_eq!(case_line(1, &pass("health")), "PASS [1] health (status 200)");
    assert_eq!(case_line(2, &fail_503("health")), "FAIL [2] health: expected status 200, got 503");
}

#[test]
fn results_go_to_stdout_and_warnings_to_stderr() {
    let mut reporter = ConsoleReporter::new(Vec::new(), Vec::new());
    reporter.warning(&HarnessWarning::UnvalidatedBaseUrl {
        url: "http://localhost:9080".to_string(),
    });
    reporter.case_finished(0, &pass("health"));
    let (out, err) = reporter.finish().unwrap();
    let out = String::from_utf8(out).unwrap();
    let err = String::from_utf8(err).unwrap();
    assert_eq!(out, "PASS [1] health (status 200)\n");
    assert!(err.contains("falling back to unvalidated http://localhost:9080"));
}

#[test]
fn numbering_continues_across_suites() {
    let mut reporter = ConsoleReporter::new(Vec::new(), Vec::new());
    reporter.case_finished(0, &pass("health"));
    reporter.case_finished(1, &pass("home"));
    reporter.case_finished(0, &pass("navigate /app"));
    let (out, _) = reporter.finish().unwrap();
    let out = String::from_utf8(out).unwrap();
    let numbers: Vec<&str> = out.lines().map(|line| &line[.. 8]).collect();
    assert_eq!(numbers, vec!["PASS [1]", "PASS [2]", "PASS [3]"]);
}

#[test]
fn summary_reports_failing_position() {
    let report = SuiteReport::new(
        vec![pass("a"), pass("b"), fail_503("c")],
        Duration::from_millis(1_250),
    );
    assert_eq!(summary_line(&report, 5), "Smoke test failed at check 3 of 5 after 1.250s.");
    let clean = SuiteReport::new(vec![pass("a"), pass("b")], Duration::from_millis(40));
    assert_eq!(summary_line(&clean, 2), "All 2 checks passed in 0.040s.");
}

#[test]
fn first_write_failure_is_surfaced() {
    let mut reporter = ConsoleReporter::new(BrokenPipe, Vec::new());
    reporter.case_finished(0, &pass("health"));
    reporter.line("after");
    let err = reporter.finish().err().expect("write error kept");
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}

#[test]
fn elapsed_is_rendered_in_seconds() {
    assert_eq!(format_elapsed(Duration::ZERO), "0.000s");
    assert_eq!(format_elapsed(Duration::from_secs(3)), "3.000s");
}
