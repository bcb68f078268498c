//! List command - show what a run would execute

use crate::testing::demo;
use anyhow::Result;
use colored::*;
use trellis_engine::{HookKind, Registry};

const HOOK_KINDS: [HookKind; 4] = [
    HookKind::BeforeSuite,
    HookKind::BeforeTest,
    HookKind::AfterTest,
    HookKind::AfterSuite,
];

/// Run the list command
pub fn run(with_failures: bool) -> Result<()> {
    print!("{}", render(&demo::registry(with_failures)));
    Ok(())
}

/// Suites and tests in run order, with the hooks each suite has set
pub fn render(registry: &Registry) -> String {
    let mut out = String::new();
    for suite in registry.suites() {
        let hooks: Vec<&str> = HOOK_KINDS
            .iter()
            .filter(|kind| suite.hook(**kind).is_some())
            .map(|kind| kind.as_str())
            .collect();

        out.push_str(&format!("{}", suite.id().bold()));
        if !hooks.is_empty() {
            out.push_str(&format!(" {}", format!("[{}]", hooks.join(", ")).dimmed()));
        }
        out.push('\n');

        for case in suite.tests() {
            out.push_str(&format!("  {}\n", case.name()));
        }
    }
    out.push_str(&format!(
        "\n{} tests in {} suites\n",
        registry.test_count(),
        registry.len()
    ));
    out
}
