//! Batch API: run many independent documents, emit results as they finish.
//!
//! ## Why stream?
//!
//! A batch of uploads can take minutes. Yielding each result as soon as its
//! run completes lets callers persist or display partial progress instead of
//! waiting for the slowest document.
//!
//! Runs are independent: each owns its bytes and text, and only the
//! [`Pipeline`]'s read-only capabilities are shared. At most
//! `config.concurrency` runs are in flight. Results arrive in completion
//! order, tagged with the input's index.

use crate::output::PipelineResult;
use crate::pipeline::input::DocumentRef;
use crate::run::{Pipeline, RunOptions};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of `(input_index, result)` pairs.
pub type ResultStream = Pin<Box<dyn Stream<Item = (usize, PipelineResult)> + Send>>;

/// Run every input through `pipeline`, yielding results in completion order.
///
/// # Example
/// ```rust,no_run
/// use edgequake_docenrich::{run_stream, DocumentRef, Pipeline, PipelineConfig, RunOptions};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = Arc::new(Pipeline::from_config(PipelineConfig::default())?);
/// let inputs = vec![
///     (DocumentRef::url("https://example.com/cv.pdf"), RunOptions::default()),
///     (DocumentRef::url("https://example.com/letter.docx"), RunOptions::default()),
/// ];
/// let mut results = run_stream(pipeline, inputs);
/// while let Some((index, result)) = results.next().await {
///     println!("#{index}: success={} tags={:?}", result.success, result.tags);
/// }
/// # Ok(())
/// # }
/// ```
pub fn run_stream(pipeline: Arc<Pipeline>, inputs: Vec<(DocumentRef, RunOptions)>) -> ResultStream {
    let concurrency = pipeline.config().concurrency.max(1);
    info!(
        "Starting batch of {} documents (concurrency {})",
        inputs.len(),
        concurrency
    );

    let s = stream::iter(inputs.into_iter().enumerate().map(move |(index, (doc, opts))| {
        let pipeline = Arc::clone(&pipeline);
        async move {
            let result = pipeline.run(doc, &opts).await;
            (index, result)
        }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}
