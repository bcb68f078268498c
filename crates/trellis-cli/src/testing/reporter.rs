//! Test reporter - display a result tree

use colored::*;
use std::fmt::Write as _;
use trellis_engine::{Level, Msg, Summary, TestResult};

/// Test reporter with output configuration
pub struct TestReporter {
    /// Show every node and its messages
    verbose: bool,
    /// Disable colored output
    no_color: bool,
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TestReporter {
    /// Create a new test reporter
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            no_color: false,
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Report a run
    pub fn report(&self, root: &TestResult, summary: &Summary) {
        if self.no_color {
            colored::control::set_override(false);
        }

        print!("{}", self.render(root, summary));

        // Reset color override
        if self.no_color {
            colored::control::unset_override();
        }
    }

    /// Full report text: the tree, a summary line, then failure details
    pub fn render(&self, root: &TestResult, summary: &Summary) -> String {
        let mut out = String::new();

        // The root node is synthetic; start at the suites
        for suite in &root.subtests {
            self.render_node(&mut out, suite, 0);
        }

        out.push('\n');
        self.render_summary(&mut out, summary);
        self.render_failures(&mut out, root);
        out
    }

    fn render_node(&self, out: &mut String, node: &TestResult, depth: usize) {
        let indent = "  ".repeat(depth);
        let status = if node.passed() {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        let _ = writeln!(
            out,
            "{}{} {} ({:.2?})",
            indent,
            status,
            display_name(node),
            node.dur
        );

        // Suites are always listed; below that only in verbose mode
        if !self.verbose {
            return;
        }
        for msg in &node.msgs {
            let _ = writeln!(out, "{}    {}", indent, format_msg(msg));
        }
        for child in &node.subtests {
            self.render_node(out, child, depth + 1);
        }
    }

    fn render_summary(&self, out: &mut String, summary: &Summary) {
        let _ = writeln!(out, "{}", "─".repeat(50));

        let status = if summary.failed > 0 {
            "FAILED".red().bold()
        } else {
            "PASSED".green().bold()
        };

        let _ = writeln!(
            out,
            "Test result: {} | {} total, {} passed, {} failed",
            status,
            summary.total.to_string().bold(),
            summary.passed.to_string().green().bold(),
            if summary.failed > 0 {
                summary.failed.to_string().red().bold()
            } else {
                summary.failed.to_string().normal()
            }
        );
        let _ = writeln!(
            out,
            "Run {} started {}, took {:.2?}",
            summary.id,
            summary.truncated_timestamp().format("%Y-%m-%d %H:%M:%S UTC"),
            summary.dur
        );
    }

    fn render_failures(&self, out: &mut String, root: &TestResult) {
        let failures = root.find_failing_tests();
        if failures.is_empty() {
            return;
        }

        out.push('\n');
        let _ = writeln!(out, "{}", "Failures:".red().bold());
        out.push('\n');

        for node in failures {
            let _ = writeln!(out, "  {} {}", "●".red(), qualified_name(node).bold());
            write_errors(out, node, &node.name);
            out.push('\n');
        }
    }
}

/// Error messages of `node` and everything below it. Messages from
/// descendants are prefixed with their path relative to `top`.
fn write_errors(out: &mut String, node: &TestResult, top: &str) {
    let prefix = match node.name.strip_prefix(top) {
        Some(rest) => rest.trim_start_matches('/'),
        None => node.name.as_str(),
    };
    for msg in node.msgs.iter().filter(|m| m.is_error()) {
        for line in msg.text.lines() {
            let line = if prefix.is_empty() {
                line.to_string()
            } else {
                format!("{}: {}", prefix, line)
            };
            let _ = writeln!(out, "      {}", line.dimmed());
        }
    }
    for child in &node.subtests {
        write_errors(out, child, top);
    }
}

/// Name as shown in the tree: subtests only show their own segment.
fn display_name(node: &TestResult) -> &str {
    node.name.rsplit('/').next().unwrap_or(&node.name)
}

/// `suite :: test/subtest`, or just the suite for suite-level nodes
fn qualified_name(node: &TestResult) -> String {
    if node.suite.is_empty() || node.suite == node.name {
        node.name.clone()
    } else {
        format!("{} :: {}", node.suite, node.name)
    }
}

fn format_msg(msg: &Msg) -> ColoredString {
    match msg.level {
        Level::Info => msg.text.dimmed(),
        Level::Error => msg.text.red(),
    }
}
