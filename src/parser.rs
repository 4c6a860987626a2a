//! Grouping a token sequence into pipeline stages.
//!
//! A `|` token separates stages; everything between two pipes is one
//! command's words. Validation happens here, before any process or
//! pipe exists: an empty stage aborts the whole line.

use thiserror::Error;

/// Upper bound on the number of stages in one pipeline. Longer
/// pipelines are truncated to this many stages.
pub const MAX_STAGES: usize = 128;

/// Errors detected while grouping tokens into stages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Two adjacent pipes, or a pipe at either end of the line.
    #[error("empty command in pipeline")]
    EmptyPipelineSegment,
}

/// An ordered chain of command stages. A plain command is a pipeline
/// with a single stage.
#[derive(Debug, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Vec<String>>,
}

/// Split `tokens` on pipe tokens into a validated [`Pipeline`].
pub fn parse(tokens: Vec<String>) -> Result<Pipeline, ParseError> {
    let mut stages = Vec::new();
    let mut current = Vec::new();
    let has_pipe = tokens.iter().any(|t| t == "|");

    for token in tokens {
        if token == "|" {
            if current.is_empty() {
                return Err(ParseError::EmptyPipelineSegment);
            }
            stages.push(std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }

    if current.is_empty() {
        if has_pipe {
            // Trailing pipe: the final stage is missing.
            return Err(ParseError::EmptyPipelineSegment);
        }
    } else {
        stages.push(current);
    }

    stages.truncate(MAX_STAGES);
    Ok(Pipeline { stages })
}
