//! The conversion orchestrator.
//!
//! # Step order
//!
//! 1. **read** - the reader parses the input into a `DataFrame`
//! 2. **validate_reader_output** - the frame must satisfy the IR contract
//! 3. **transform_N** - each transform derives a new frame from the previous one
//! 4. **validate_final_ir** - the last frame must still satisfy the contract
//! 5. **write** - the writer persists the final frame
//!
//! Errors already categorized by the collaborator that raised them (reader,
//! writer, transform) pass through unchanged; anything else is wrapped in a
//! [`PipelineError`] naming the step. There are no retries.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use fintran_model::{
    ErrorCategory, FintranError, FormatOptions, IrFrame, PipelineError, PipelineStep, Reader,
    Result, StepContext, Transform, Writer, validate_ir,
};
use tracing::{debug, info, info_span};

/// Runs one conversion from `input` to `output`.
///
/// Returns the final frame, including any reports attached by validating
/// transforms, after it has been written.
///
/// # Errors
///
/// Reader, writer and transform errors pass through; schema violations,
/// immutability violations and uncategorized failures come back as
/// [`FintranError::Pipeline`]. A panic inside a collaborator is reported at
/// step `unknown`.
pub fn execute_pipeline(
    reader: &dyn Reader,
    writer: &dyn Writer,
    input: &Path,
    output: &Path,
    transforms: &[Box<dyn Transform>],
    options: &FormatOptions,
) -> Result<IrFrame> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        run_steps(reader, writer, input, output, transforms, options)
    }))
    .unwrap_or_else(|payload| {
        Err(PipelineError::new(
            PipelineStep::Unknown,
            format!(
                "Pipeline failed with unexpected error: {}",
                panic_message(payload.as_ref())
            ),
            StepContext::default(),
        )
        .into())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "panic"
    }
}

fn run_steps(
    reader: &dyn Reader,
    writer: &dyn Writer,
    input: &Path,
    output: &Path,
    transforms: &[Box<dyn Transform>],
    options: &FormatOptions,
) -> Result<IrFrame> {
    let data = {
        let _span = info_span!("pipeline_step", step = %PipelineStep::Read).entered();
        match reader.read(input, options) {
            Ok(data) => data,
            Err(err) if err.category() == ErrorCategory::Reader => return Err(err),
            Err(err) => {
                return Err(wrap(
                    PipelineStep::Read,
                    format!("Pipeline failed at read step: {err}"),
                    StepContext::input(input),
                    err,
                ));
            }
        }
    };
    info!(rows = data.height(), path = %input.display(), "read input");

    {
        let _span =
            info_span!("pipeline_step", step = %PipelineStep::ValidateReaderOutput).entered();
        validate_ir(&data).map_err(|err| {
            wrap(
                PipelineStep::ValidateReaderOutput,
                format!("Pipeline failed: Reader produced invalid IR: {err}"),
                StepContext::input(input),
                err.into(),
            )
        })?;
    }

    let mut frame = IrFrame::new(data);
    for (index, transform) in transforms.iter().enumerate() {
        let step = PipelineStep::Transform(index);
        let _span = info_span!("pipeline_step", step = %step).entered();
        let kind = transform.type_name();
        let before = frame.id();
        let next = match transform.transform(&frame) {
            Ok(next) => next,
            Err(err)
                if matches!(
                    err.category(),
                    ErrorCategory::Transform | ErrorCategory::Pipeline
                ) =>
            {
                return Err(err);
            }
            Err(err) => {
                return Err(wrap(
                    step,
                    format!("Pipeline failed at transform step {index}: {err}"),
                    StepContext::transform(index, kind),
                    err,
                ));
            }
        };
        if next.id() == before {
            return Err(PipelineError::new(
                step,
                format!(
                    "Transform {index} violated immutability requirement: returned the same DataFrame instance instead of creating a new one"
                ),
                StepContext::transform(index, kind),
            )
            .into());
        }
        debug!(transform = kind, rows = next.height(), "transform applied");
        frame = next;
    }

    {
        let _span = info_span!("pipeline_step", step = %PipelineStep::ValidateFinalIr).entered();
        validate_ir(&frame.data).map_err(|err| {
            wrap(
                PipelineStep::ValidateFinalIr,
                format!("Pipeline failed: Final IR is invalid after transforms: {err}"),
                StepContext::transform_count(transforms.len()),
                err.into(),
            )
        })?;
    }

    {
        let _span = info_span!("pipeline_step", step = %PipelineStep::Write).entered();
        match writer.write(&frame.data, output, options) {
            Ok(()) => {}
            Err(err) if err.category() == ErrorCategory::Writer => return Err(err),
            Err(err) => {
                return Err(wrap(
                    PipelineStep::Write,
                    format!("Pipeline failed at write step: {err}"),
                    StepContext::output(output),
                    err,
                ));
            }
        }
    }
    info!(rows = frame.height(), path = %output.display(), "wrote output");
    Ok(frame)
}

fn wrap(
    step: PipelineStep,
    message: String,
    context: StepContext,
    source: FintranError,
) -> FintranError {
    PipelineError::new(step, message, context)
        .with_source(source)
        .into()
}

/// A reader, a writer and an ordered list of transforms.
pub struct ConversionPipeline<'a> {
    reader: &'a dyn Reader,
    writer: &'a dyn Writer,
    transforms: Vec<Box<dyn Transform>>,
    options: FormatOptions,
}

impl<'a> ConversionPipeline<'a> {
    pub fn new(reader: &'a dyn Reader, writer: &'a dyn Writer) -> Self {
        Self {
            reader,
            writer,
            transforms: Vec::new(),
            options: FormatOptions::new(),
        }
    }

    /// Add a transform to the end of the pipeline.
    pub fn add_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }

    /// Transform type names in execution order.
    pub fn transform_names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.type_name()).collect()
    }

    pub fn execute(&self, input: &Path, output: &Path) -> Result<IrFrame> {
        execute_pipeline(
            self.reader,
            self.writer,
            input,
            output,
            &self.transforms,
            &self.options,
        )
    }
}
