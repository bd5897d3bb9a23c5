use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use fintran_cli::cli::{CheckArgs, Cli, Command, ConvertArgs, ValidateArgs, parse_key_value};
use fintran_cli::commands::{run_check, run_convert, run_validate};
use fintran_cli::exit::{ExitStatus, exit_status};
use fintran_model::ValidationReport;
use serde_json::{Value, json};

const LEDGER: &str = "date,account,amount,currency\n\
                      2024-01-15,4000,100.50,USD\n\
                      2024-01-16,4000,-20,USD\n\
                      2024-01-17,1200,-5,USD\n";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn positive_rules(dir: &Path) -> PathBuf {
    write(
        dir,
        "rules.json",
        &json!({
            "validators": [
                {"type": "positive_amounts", "params": {"account_patterns": ["^4"]}}
            ]
        })
        .to_string(),
    )
}

fn convert_args(input: PathBuf, output: PathBuf) -> ConvertArgs {
    ConvertArgs {
        input,
        output,
        rules: None,
        fail_on_error: false,
        report: None,
        dry_run: false,
        options: Vec::new(),
    }
}

#[test]
fn parses_convert_with_options() {
    let cli = Cli::try_parse_from([
        "fintran",
        "convert",
        "in.csv",
        "out.csv",
        "--rules",
        "rules.toml",
        "--fail-on-error",
        "-o",
        "delimiter=;",
        "--option",
        "skip=3",
    ])
    .expect("parse");
    let Command::Convert(args) = cli.command else {
        panic!("expected convert");
    };
    assert_eq!(args.input, PathBuf::from("in.csv"));
    assert_eq!(args.rules, Some(PathBuf::from("rules.toml")));
    assert!(args.fail_on_error);
    assert_eq!(
        args.options,
        vec![
            ("delimiter".to_string(), Value::String(";".to_string())),
            ("skip".to_string(), json!(3)),
        ]
    );
}

#[test]
fn fail_on_error_requires_rules() {
    let parsed =
        Cli::try_parse_from(["fintran", "convert", "in.csv", "out.csv", "--fail-on-error"]);
    assert!(parsed.is_err());
}

#[test]
fn key_value_parsing() {
    assert_eq!(
        parse_key_value("date_format=%d/%m/%Y").expect("parse"),
        ("date_format".to_string(), json!("%d/%m/%Y"))
    );
    assert_eq!(
        parse_key_value("strict=true").expect("parse"),
        ("strict".to_string(), json!(true))
    );
    assert_eq!(
        parse_key_value("expr=a=b").expect("parse"),
        ("expr".to_string(), json!("a=b"))
    );
    let err = parse_key_value("delimiter").unwrap_err();
    assert!(err.contains("no '=' found"));
}

#[test]
fn convert_writes_output_and_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "ledger.csv", LEDGER);
    let output = dir.path().join("out.csv");
    let report_path = dir.path().join("report.json");
    let mut args = convert_args(input, output.clone());
    args.rules = Some(positive_rules(dir.path()));
    args.report = Some(report_path.clone());

    let status = run_convert(&args).expect("convert");
    assert_eq!(status, ExitStatus::Success);

    let written = fs::read_to_string(&output).expect("output");
    assert!(written.starts_with("date,account,amount,currency\n"));
    assert_eq!(written.lines().count(), 4);

    let report = ValidationReport::from_json(&fs::read_to_string(&report_path).expect("report"))
        .expect("report json");
    assert_eq!(report.total(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.results()[0].errors().len(), 1);
}

#[test]
fn fail_on_error_stops_before_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "ledger.csv", LEDGER);
    let output = dir.path().join("out.csv");
    let mut args = convert_args(input, output.clone());
    args.rules = Some(positive_rules(dir.path()));
    args.fail_on_error = true;

    let err = run_convert(&args).unwrap_err();
    assert_eq!(exit_status(&err), ExitStatus::Validation);
    assert!(!output.exists());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "ledger.csv", LEDGER);
    let output = dir.path().join("out.csv");
    let mut args = convert_args(input, output.clone());
    args.dry_run = true;

    assert_eq!(run_convert(&args).expect("convert"), ExitStatus::Success);
    assert!(!output.exists());
}

#[test]
fn malformed_input_exits_with_reader_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(
        dir.path(),
        "ledger.csv",
        "date,account,amount,currency\n2024-13-45,4000,1,USD\n",
    );
    let args = convert_args(input, dir.path().join("out.csv"));
    let err = run_convert(&args).unwrap_err();
    assert_eq!(exit_status(&err), ExitStatus::Reader);
}

#[test]
fn check_reports_validation_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "ledger.csv", LEDGER);
    let args = CheckArgs {
        input,
        rules: positive_rules(dir.path()),
        filter: None,
        json: true,
        options: Vec::new(),
    };
    assert_eq!(run_check(&args).expect("check"), ExitStatus::Validation);
}

#[test]
fn unknown_rule_type_is_a_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "ledger.csv", LEDGER);
    let rules = write(
        dir.path(),
        "rules.json",
        r#"{"validators": [{"type": "no_such_rule"}]}"#,
    );
    let args = CheckArgs {
        input,
        rules,
        filter: None,
        json: false,
        options: Vec::new(),
    };
    let err = run_check(&args).unwrap_err();
    assert_eq!(exit_status(&err), ExitStatus::Config);
}

#[test]
fn validate_flags_missing_required_column() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = write(dir.path(), "good.csv", LEDGER);
    let bad = write(
        dir.path(),
        "bad.csv",
        "date,account,amount\n2024-01-15,4000,1\n",
    );
    let run = |input: PathBuf| {
        run_validate(&ValidateArgs {
            input,
            verbose: true,
            options: Vec::new(),
        })
    };
    assert_eq!(run(good).expect("valid"), ExitStatus::Success);
    let err = run(bad).unwrap_err();
    assert_eq!(exit_status(&err), ExitStatus::Validation);
}

#[test]
fn unsupported_extension_is_a_reader_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write(dir.path(), "ledger.parquet", LEDGER);
    let err = run_validate(&ValidateArgs {
        input,
        verbose: false,
        options: Vec::new(),
    })
    .unwrap_err();
    assert_eq!(exit_status(&err), ExitStatus::Reader);
}
