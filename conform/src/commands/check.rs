// conform/src/commands/check.rs
//
// USE CASE: Validate configuration without touching any data.

use std::path::PathBuf;

use conform_core::domain::rules::RuleRegistry;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let project = super::load(&project_dir)?;
    let registry = RuleRegistry::with_builtin_rules();

    println!("🔎 Checking {} analytic(s)...", project.analytics.len());
    let mut failures = 0;
    for config in project.analytics.values() {
        match config.validate_against(&registry, &project.references) {
            Ok(()) => println!("   ✅ {}", config.display_name()),
            Err(e) => {
                failures += 1;
                println!("   ❌ {}", config.display_name());
                eprintln!("{:?}", miette::Report::new(e));
            }
        }
    }

    if failures > 0 {
        eprintln!("\n❌ FAILURE. {failures} analytic(s) are misconfigured.");
        std::process::exit(1);
    }
    println!("\n✨ SUCCESS! All analytics are valid.");
    Ok(())
}
