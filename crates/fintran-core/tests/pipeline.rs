//! Orchestrator behaviour with in-memory collaborators.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use fintran_core::{ConversionPipeline, execute_pipeline};
use fintran_model::{
    ErrorCategory, FintranError, FormatOptions, IrFrame, PipelineStep, Reader, Result, Transform,
    Writer,
};
use fintran_validate::{
    PositiveAmountsValidator, ValidatingTransform, ValidationMode, ValidationPipeline, Validator,
    validation_reports,
};
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series};

fn ir_frame() -> DataFrame {
    DataFrame::new(vec![
        Series::new("date".into(), &[19_723i32, 19_724])
            .cast(&DataType::Date)
            .expect("date cast")
            .into_column(),
        Series::new("account".into(), &["4000", "1000"]).into_column(),
        Series::new("amount".into(), &[-10.0f64, 25.5]).into_column(),
        Series::new("currency".into(), &["EUR", "EUR"]).into_column(),
    ])
    .expect("ir frame")
}

struct FixedReader(DataFrame);

impl Reader for FixedReader {
    fn read(&self, _path: &Path, _options: &FormatOptions) -> Result<DataFrame> {
        Ok(self.0.clone())
    }
}

struct FailingReader(fn(&Path) -> FintranError);

impl Reader for FailingReader {
    fn read(&self, path: &Path, _options: &FormatOptions) -> Result<DataFrame> {
        Err((self.0)(path))
    }
}

#[derive(Default)]
struct CapturingWriter {
    written: RefCell<Vec<(PathBuf, usize)>>,
}

impl Writer for CapturingWriter {
    fn write(&self, df: &DataFrame, path: &Path, _options: &FormatOptions) -> Result<()> {
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), df.height()));
        Ok(())
    }
}

struct BrokenWriter;

impl Writer for BrokenWriter {
    fn write(&self, _df: &DataFrame, _path: &Path, _options: &FormatOptions) -> Result<()> {
        Err(std::io::Error::other("disk full").into())
    }
}

struct RefusingWriter;

impl Writer for RefusingWriter {
    fn write(&self, _df: &DataFrame, path: &Path, _options: &FormatOptions) -> Result<()> {
        Err(FintranError::writer(path, "csv", "target is read-only"))
    }
}

struct Identity;

impl Transform for Identity {
    fn transform(&self, frame: &IrFrame) -> Result<IrFrame> {
        Ok(frame.clone())
    }
}

struct DropCurrency;

impl Transform for DropCurrency {
    fn transform(&self, frame: &IrFrame) -> Result<IrFrame> {
        Ok(frame.derive(frame.data.drop("currency")?))
    }
}

struct Rejecting;

impl Transform for Rejecting {
    fn transform(&self, _frame: &IrFrame) -> Result<IrFrame> {
        Err(FintranError::transform("Rejecting", "cannot convert"))
    }
}

struct Panicking;

impl Transform for Panicking {
    fn transform(&self, _frame: &IrFrame) -> Result<IrFrame> {
        panic!("collaborator blew up")
    }
}

fn run(
    reader: &dyn Reader,
    writer: &dyn Writer,
    transforms: Vec<Box<dyn Transform>>,
) -> Result<IrFrame> {
    execute_pipeline(
        reader,
        writer,
        Path::new("in.csv"),
        Path::new("out.csv"),
        &transforms,
        &FormatOptions::new(),
    )
}

fn pipeline_error(err: &FintranError) -> &fintran_model::PipelineError {
    match err {
        FintranError::Pipeline(inner) => inner,
        other => panic!("expected a pipeline error, got {other}"),
    }
}

#[test]
fn happy_path_writes_final_frame() {
    let writer = CapturingWriter::default();
    let frame = run(&FixedReader(ir_frame()), &writer, Vec::new()).expect("pipeline");
    assert_eq!(frame.height(), 2);
    assert_eq!(
        writer.written.borrow().as_slice(),
        [(PathBuf::from("out.csv"), 2)]
    );
}

#[test]
fn reader_errors_pass_through() {
    let reader = FailingReader(|path| FintranError::reader(path, "csv", "unterminated quote"));
    let err = run(&reader, &CapturingWriter::default(), Vec::new())
        .expect_err("reader error");
    assert_eq!(err.category(), ErrorCategory::Reader);
}

#[test]
fn other_read_failures_are_wrapped() {
    let reader = FailingReader(|_| std::io::Error::other("permission denied").into());
    let err = run(&reader, &CapturingWriter::default(), Vec::new())
        .expect_err("io error");
    let inner = pipeline_error(&err);
    assert_eq!(inner.step, PipelineStep::Read);
    assert_eq!(inner.context.input_path.as_deref(), Some(Path::new("in.csv")));
    assert!(inner.message.starts_with("Pipeline failed at read step: "));
    assert!(inner.cause().is_some());
}

#[test]
fn invalid_reader_output_is_rejected() {
    let df = ir_frame().drop("amount").expect("drop");
    let writer = CapturingWriter::default();
    let err = run(&FixedReader(df), &writer, Vec::new())
        .expect_err("schema error");
    let inner = pipeline_error(&err);
    assert_eq!(inner.step, PipelineStep::ValidateReaderOutput);
    assert_eq!(
        inner.message,
        "Pipeline failed: Reader produced invalid IR: Missing required fields: [\"amount\"]"
    );
    assert!(writer.written.borrow().is_empty());
}

#[test]
fn returning_the_input_frame_violates_immutability() {
    let err = run(
        &FixedReader(ir_frame()),
        &CapturingWriter::default(),
        vec![Box::new(Identity)],
    )
    .expect_err("immutability");
    let inner = pipeline_error(&err);
    assert_eq!(inner.step, PipelineStep::Transform(0));
    assert_eq!(inner.context.transform_type.as_deref(), Some("Identity"));
    assert!(
        inner
            .message
            .starts_with("Transform 0 violated immutability requirement")
    );
}

#[test]
fn transform_errors_pass_through() {
    let err = run(
        &FixedReader(ir_frame()),
        &CapturingWriter::default(),
        vec![Box::new(Rejecting)],
    )
    .expect_err("transform error");
    assert_eq!(err.category(), ErrorCategory::Transform);
}

#[test]
fn final_ir_is_checked() {
    let err = run(
        &FixedReader(ir_frame()),
        &CapturingWriter::default(),
        vec![Box::new(DropCurrency)],
    )
    .expect_err("final ir");
    let inner = pipeline_error(&err);
    assert_eq!(inner.step, PipelineStep::ValidateFinalIr);
    assert_eq!(inner.context.transform_count, Some(1));
}

#[test]
fn uncategorized_write_failures_are_wrapped() {
    let err = run(&FixedReader(ir_frame()), &BrokenWriter, Vec::new())
        .expect_err("write");
    let inner = pipeline_error(&err);
    assert_eq!(inner.step, PipelineStep::Write);
    assert!(inner.to_string().contains("output_path=out.csv"));
}

#[test]
fn writer_errors_pass_through() {
    let err = run(&FixedReader(ir_frame()), &RefusingWriter, Vec::new())
        .expect_err("write");
    assert_eq!(err.category(), ErrorCategory::Writer);
    let FintranError::Writer {
        path,
        format,
        message,
    } = &err
    else {
        panic!("expected the writer error unchanged, got {err}");
    };
    assert_eq!(path, Path::new("out.csv"));
    assert_eq!(format, "csv");
    assert_eq!(message, "target is read-only");
}

#[test]
fn panics_are_reported_as_unknown_step() {
    let err = run(
        &FixedReader(ir_frame()),
        &CapturingWriter::default(),
        vec![Box::new(Panicking)],
    )
    .expect_err("panic");
    let inner = pipeline_error(&err);
    assert_eq!(inner.step, PipelineStep::Unknown);
    assert_eq!(
        inner.message,
        "Pipeline failed with unexpected error: collaborator blew up"
    );
}

fn positive_amounts() -> ValidationPipeline {
    let validators: Vec<Box<dyn Validator>> =
        vec![Box::new(PositiveAmountsValidator::new(&["^4"]).expect("validator"))];
    ValidationPipeline::new(validators, ValidationMode::Continue)
}

#[test]
fn validation_reports_ride_along() {
    let reader = FixedReader(ir_frame());
    let writer = CapturingWriter::default();
    let conversion = ConversionPipeline::new(&reader, &writer)
        .add_transform(Box::new(ValidatingTransform::new(positive_amounts())));
    assert_eq!(conversion.transform_names(), ["ValidatingTransform"]);

    let frame = conversion
        .execute(Path::new("in.csv"), Path::new("out.csv"))
        .expect("pipeline");
    let reports = validation_reports(&frame, "validation_report");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].failed(), 1);
    assert_eq!(writer.written.borrow().len(), 1);
}

#[test]
fn fail_on_error_stops_before_write() {
    let writer = CapturingWriter::default();
    let err = run(
        &FixedReader(ir_frame()),
        &writer,
        vec![Box::new(
            ValidatingTransform::new(positive_amounts()).fail_on_error(true),
        )],
    )
    .expect_err("validation failure");
    let inner = pipeline_error(&err);
    assert_eq!(inner.step, PipelineStep::Transform(0));
    assert!(
        inner
            .message
            .starts_with("Pipeline failed at transform step 0: Validation failed")
    );
    assert_eq!(err.validation_report().map(|r| r.failed()), Some(1));
    assert!(writer.written.borrow().is_empty());
}
