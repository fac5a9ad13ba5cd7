// Assembler - ordered concatenation of uniform segments

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::errors::PipelineResult;
use crate::domain::model::{EncodeParams, Segment};
use crate::domain::rules::AssemblyPreflight;
use crate::ports::{ConcatRequest, EnginePort};

/// Concatenates the optional intro and the surviving segments, in scan
/// order, into one stream.
///
/// Segments come out of the extractor already conforming to the output
/// parameters. The intro is foreign input, so every assembly input is
/// probed and checked against the expected parameters before the engine
/// is asked to concatenate; a mismatch fails the run naming the input.
pub struct Assembler {
    engine: Arc<dyn EnginePort>,
    encode: EncodeParams,
}

impl Assembler {
    pub fn new(engine: Arc<dyn EnginePort>, encode: EncodeParams) -> Self {
        Self { engine, encode }
    }

    /// Assemble into `output` and return the resulting duration in seconds.
    pub async fn assemble(
        &self,
        intro: Option<&Path>,
        segments: &[Segment],
        output: &Path,
    ) -> PipelineResult<f64> {
        let expected = self.encode.expected_stream_params();
        let mut inputs: Vec<PathBuf> = Vec::with_capacity(segments.len() + 1);

        if let Some(intro) = intro {
            let probe = self.engine.probe(intro).await?;
            let name = intro
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| intro.display().to_string());
            AssemblyPreflight::check_input(&name, &probe.params, &expected)?;
            inputs.push(intro.to_path_buf());
        }

        for segment in segments {
            let probe = self.engine.probe(&segment.path).await?;
            AssemblyPreflight::check_input(&segment.source_name(), &probe.params, &expected)?;
            inputs.push(segment.path.clone());
        }

        debug!(inputs = inputs.len(), "concatenating assembly inputs");
        self.engine
            .concat(&ConcatRequest {
                inputs,
                output: output.to_path_buf(),
            })
            .await?;

        let assembled = self.engine.probe(output).await?;
        info!(
            output = %output.display(),
            duration = assembled.duration,
            "assembly complete"
        );
        Ok(assembled.duration)
    }
}
