// crates/smoke-harness-cli/src/console.rs
// ============================================================================
// Module: Console Reporting
// Description: Terminal rendering of smoke results and warnings.
// Purpose: Implement the core reporting seam for interactive runs.
// Dependencies: smoke-harness-core
// ============================================================================

//! ## Overview
//! [`ConsoleReporter`] writes one PASS/FAIL line per executed check to the
//! output stream and one line per warning to the error stream. Checks are
//! numbered across suites, so browser steps continue the HTTP numbering.
//! The first write failure is kept and surfaced by [`ConsoleReporter::finish`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::time::Duration;

use smoke_harness_core::CaseResult;
use smoke_harness_core::HarnessWarning;
use smoke_harness_core::ReportSink;
use smoke_harness_core::SuiteReport;

use crate::t;

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// [`ReportSink`] that renders to a pair of writers.
pub struct ConsoleReporter<O, E> {
    /// Result stream.
    out: O,
    /// Warning stream.
    err: E,
    /// Checks rendered so far.
    rendered: usize,
    /// First write failure.
    write_error: Option<io::Error>,
}

impl ConsoleReporter<io::Stdout, io::Stderr> {
    /// Reporter bound to the process stdout and stderr.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write + Send, E: Write + Send> ConsoleReporter<O, E> {
    /// Reporter bound to the given writers.
    pub const fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            rendered: 0,
            write_error: None,
        }
    }

    /// Writes the closing summary for `report`.
    ///
    /// `planned` is the number of checks the run intended to execute.
    pub fn summary(&mut self, report: &SuiteReport, planned: usize) {
        let line = summary_line(report, planned);
        let result = writeln!(self.out, "{line}");
        self.record(result);
    }

    /// Writes a free-form line to the result stream.
    pub fn line(&mut self, text: &str) {
        let result = writeln!(self.out, "{text}");
        self.record(result);
    }

    /// Flushes both streams and returns the first write failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`io::Error`] hit while rendering or flushing.
    pub fn finish(mut self) -> io::Result<(O, E)> {
        if let Some(err) = self.write_error.take() {
            return Err(err);
        }
        self.out.flush()?;
        self.err.flush()?;
        Ok((self.out, self.err))
    }

    /// Keeps the first write failure.
    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result
            && self.write_error.is_none()
        {
            self.write_error = Some(err);
        }
    }
}

impl<O: Write + Send, E: Write + Send> ReportSink for ConsoleReporter<O, E> {
    fn case_finished(&mut self, _index: usize, result: &CaseResult) {
        self.rendered += 1;
        let line = case_line(self.rendered, result);
        let written = writeln!(self.out, "{line}");
        self.record(written);
    }

    fn warning(&mut self, warning: &HarnessWarning) {
        let line = warning_line(warning);
        let written = writeln!(self.err, "{line}");
        self.record(written);
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders one check result with its one-based `number`.
#[must_use]
pub fn case_line(number: usize, result: &CaseResult) -> String {
    match result.failure() {
        None => t!(
            "smoke.case.pass",
            index = number,
            description = result.description(),
            actual = result.actual()
        ),
        Some(failure) => t!(
            "smoke.case.fail",
            index = number,
            description = result.description(),
            reason = failure
        ),
    }
}

/// Renders a warning.
#[must_use]
pub fn warning_line(warning: &HarnessWarning) -> String {
    match warning {
        HarnessWarning::UnvalidatedBaseUrl {
            url,
        } => t!("smoke.warn.unvalidated", url = url),
        HarnessWarning::SessionLeak {
            session,
            message,
        } => t!("smoke.warn.session_leak", session = session, error = message),
    }
}

/// Renders the closing summary.
#[must_use]
pub fn summary_line(report: &SuiteReport, planned: usize) -> String {
    let elapsed = format_elapsed(report.elapsed());
    match report.failure() {
        None => t!("smoke.summary.pass", count = report.results().len(), elapsed = elapsed),
        Some((position, _)) => t!(
            "smoke.summary.fail",
            index = position + 1,
            total = planned.max(position + 1),
            elapsed = elapsed
        ),
    }
}

/// Formats a duration as seconds with millisecond precision.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}
