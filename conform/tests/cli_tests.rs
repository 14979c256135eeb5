use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const QA_77: &str = r#"
analytic_id: 77
analytic_name: Workpaper Approvals
analytic_description: Every workpaper must be approved
data_source:
  required_fields: [tw_id, status]
validations:
  - rule: field_equals
    description: Workpaper must be approved
    parameters:
      field: status
      value: Approved
thresholds:
  error_percentage: 25
  rationale: Tolerance agreed with QA
reporting:
  group_by: team
report_metadata:
  prepared_by: QA Analytics
"#;

const QA_78: &str = r#"
analytic_id: "78"
analytic_name: Approver Titles
reference_data:
  HR_Titles:
    max_age_days: 90
validations:
  - rule: title_based_approval
    parameters:
      approver_field: approver
      allowed_titles: [Director, Managing Director]
      title_reference: HR_Titles
thresholds:
  error_percentage: 50
reporting:
  group_by: team
"#;

const DATA_SOURCES: &str = r#"
settings:
  data_freshness_warning: 7
data_sources:
  workpapers:
    description: Workpaper export
    columns_mapping:
      - source: Audit TW ID
        aliases: [TW_ID]
        target: tw_id
      - source: Status
        target: status
      - source: Team
        target: team
        data_type: category
      - source: Approver
        target: approver
analytics_mapping:
  - data_source: workpapers
    analytics: [77, 78]
"#;

const REFERENCE_DATA: &str = r#"
default_max_age_days: 30
audit_log_path: logs/audit.jsonl
reference_files:
  HR_Titles:
    path: ref/titles.csv
    format: dictionary
    key_column: Name
    value_column: Title
    version: "2.1"
"#;

const INPUT: &str = "\
audit_tw_id,Status, Team ,Approver
A-1,Approved,Ops,Alice
A-2,Approved,Ops,Bob
A-3,Rejected,Risk,Alice
A-4,Approved,,Carol
A-5,Approved,Risk,Alice
A-6,Pending,Ops,Bob
A-7,Approved,,Alice
A-8,Approved,Risk,Alice
A-9,Rejected,Ops,Bob
A-10,Approved,Risk,Alice
";

/// A throwaway project directory with two analytics and one reference table.
struct ConformTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl ConformTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("project");

        write(&root.join("conform.yaml"), "output_dir: reports\n")?;
        write(&root.join("configs/analytics/qa_77.yaml"), QA_77)?;
        write(&root.join("configs/analytics/qa_78.yml"), QA_78)?;
        write(&root.join("configs/data_sources.yaml"), DATA_SOURCES)?;
        write(&root.join("configs/reference_data.yaml"), REFERENCE_DATA)?;
        write(
            &root.join("ref/titles.csv"),
            "Name,Title\nAlice,Director\nBob,Analyst\n",
        )?;
        write(&root.join("data/approvals.csv"), INPUT)?;

        Ok(Self { _tmp: tmp, root })
    }

    fn conform(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("conform"));
        cmd.current_dir(&self.root);
        cmd.env_remove("CONFORM_OUTPUT_DIR");
        cmd.env_remove("CONFORM_AUDIT_LOG");
        cmd
    }

    fn reports(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(self.root.join("reports"))?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    fn read_json(&self, name: &str) -> Result<serde_json::Value> {
        let content = fs::read_to_string(self.root.join("reports").join(name))
            .with_context(|| format!("report {name} not written"))?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[test]
fn test_run_writes_summary_and_detail() -> Result<()> {
    let env = ConformTestEnv::new()?;

    env.conform()
        .args(["run", "-a", "77", "-i", "data/approvals.csv", "--as-of", "2024-06-30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUCCESS"))
        .stdout(predicate::str::contains("Ungrouped"));

    let report = env.read_json("QA_77_Main_20240630_000000.json")?;
    let overall = &report["summary"]["overall"];
    assert_eq!(overall["GC"], 7);
    assert_eq!(overall["PC"], 0);
    assert_eq!(overall["DNC"], 3);
    assert_eq!(overall["DNC_Percentage"], 30.0);
    assert_eq!(overall["Exceeds_Threshold"], true);

    let groups: Vec<_> = report["summary"]["groups"]
        .as_array()
        .context("groups")?
        .iter()
        .map(|g| g["group"].clone())
        .collect();
    assert_eq!(groups, vec!["Ops".into(), "Risk".into(), serde_json::Value::Null]);

    let detail = report["detail"].as_array().context("detail")?;
    assert_eq!(detail.len(), 10);
    assert_eq!(detail[0]["values"]["tw_id"], "A-1");
    assert_eq!(detail[2]["DNC_Validated"], "TBD");
    Ok(())
}

#[test]
fn test_individual_reports_skip_ungrouped() -> Result<()> {
    let env = ConformTestEnv::new()?;

    env.conform()
        .args([
            "run",
            "-a",
            "77",
            "-i",
            "data/approvals.csv",
            "--as-of",
            "2024-06-30",
            "--individual-reports",
        ])
        .assert()
        .success();

    assert_eq!(
        env.reports()?,
        vec![
            "QA_77_Main_20240630_000000.json",
            "QA_77_Ops_20240630.json",
            "QA_77_Risk_20240630.json",
        ]
    );
    let ops = env.read_json("QA_77_Ops_20240630.json")?;
    assert_eq!(ops["records"], 4);
    assert_eq!(ops["summary"]["overall"]["DNC"], 2);
    Ok(())
}

#[test]
fn test_stale_reference_is_audited_and_still_used() -> Result<()> {
    let env = ConformTestEnv::new()?;

    env.conform()
        .args(["run", "-a", "78", "-i", "data/approvals.csv", "--as-of", "2099-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stale"));

    let audit = fs::read_to_string(env.root.join("logs/audit.jsonl"))?;
    let events: Vec<serde_json::Value> = audit
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["table"], "HR_Titles");
    assert_eq!(events[0]["version"], "2.1");
    assert_eq!(events[0]["stale"], true);

    // Alice is a Director; Bob and the unknown Carol are not allowed
    let report = env.read_json("QA_78_Main_20990101_000000.json")?;
    assert_eq!(report["summary"]["overall"]["GC"], 6);
    assert_eq!(report["summary"]["overall"]["DNC"], 4);
    assert_eq!(report["references"][0]["status"], "stale");
    Ok(())
}

#[test]
fn test_batch_run_isolates_failures() -> Result<()> {
    let env = ConformTestEnv::new()?;
    write(
        &env.root.join("configs/analytics/qa_90.yaml"),
        "analytic_id: 90\nanalytic_name: Needs owner\ndata_source: {required_fields: [owner, region]}\nthresholds: {error_percentage: 5}\nreporting: {group_by: team}\n",
    )?;

    env.conform()
        .args([
            "run", "-a", "77", "-a", "90", "-i", "data/approvals.csv", "--as-of", "2024-06-30",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("owner, region"));

    assert_eq!(env.reports()?, vec!["QA_77_Main_20240630_000000.json"]);
    Ok(())
}

#[test]
fn test_unknown_analytic_fails() -> Result<()> {
    let env = ConformTestEnv::new()?;
    env.conform()
        .args(["run", "-a", "404", "-i", "data/approvals.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));
    Ok(())
}

#[test]
fn test_check_reports_every_problem() -> Result<()> {
    let env = ConformTestEnv::new()?;
    env.conform().arg("check").assert().success();

    write(
        &env.root.join("configs/analytics/qa_91.yaml"),
        r#"
analytic_id: 91
analytic_name: Broken
validations:
  - rule: no_such_rule
  - rule: field_equals
    parameters: {field: status}
thresholds: {error_percentage: 150}
reporting: {group_by: team}
"#,
    )?;

    env.conform()
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("❌ QA-91 Broken"))
        .stderr(predicate::str::contains("no_such_rule"))
        .stderr(predicate::str::contains("error_percentage"));
    Ok(())
}

#[test]
fn test_list_and_references() -> Result<()> {
    let env = ConformTestEnv::new()?;

    env.conform()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workpaper Approvals"))
        .stdout(predicate::str::contains("workpapers"));

    env.conform()
        .args(["list", "--rules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("segregation_of_duties"))
        .stdout(predicate::str::contains("third_party_risk_validation"));

    env.conform()
        .args(["references", "--as-of", "2099-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HR_Titles"))
        .stdout(predicate::str::contains("stale"));
    assert!(!env.root.join("logs/audit.jsonl").exists());
    Ok(())
}
