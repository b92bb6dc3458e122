//! Terminal presentation of a query outcome.

use std::io::Write;

use futures::StreamExt;
use sift_core::{AnswerStream, MatchSet, Pipeline, PipelineError};
use sift_llm::LlmProvider;

const WRAP_WIDTH: usize = 100;

fn heading(out: &mut impl Write, title: &str) -> std::io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.len()))
}

fn reason(error: &PipelineError) -> String {
    error
        .service_error()
        .map_or_else(|| error.to_string(), ToString::to_string)
}

/// Write fragments as they arrive. Leading and trailing whitespace of the
/// answer is dropped; an interruption is reported after the partial text.
///
/// Returns `false` if generation was interrupted.
pub async fn render_answer(out: &mut impl Write, mut stream: AnswerStream) -> anyhow::Result<bool> {
    heading(out, "Answer")?;
    let mut started = false;
    let mut pending_ws = String::new();
    let mut interrupted = None;

    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                let piece = if started {
                    fragment.as_str()
                } else {
                    fragment.trim_start()
                };
                if piece.is_empty() {
                    continue;
                }
                started = true;
                // Hold trailing whitespace back until more text follows.
                let body = piece.trim_end();
                if !body.is_empty() {
                    write!(out, "{pending_ws}{body}")?;
                    pending_ws.clear();
                }
                pending_ws.push_str(&piece[body.len()..]);
                out.flush()?;
            }
            Err(e) => {
                interrupted = Some(e);
                break;
            }
        }
    }

    if started {
        writeln!(out)?;
    }
    match interrupted {
        Some(e) => {
            writeln!(out, "[answer generation interrupted: {}]", reason(&e))?;
            writeln!(out)?;
            Ok(false)
        }
        None => {
            writeln!(out)?;
            Ok(true)
        }
    }
}

/// List each passage under its source caption, optionally followed by the
/// next passage of the same document.
pub async fn render_sources<E, C>(
    out: &mut impl Write,
    matches: &MatchSet,
    pipeline: &Pipeline<E, C>,
    expand: bool,
) -> anyhow::Result<()>
where
    E: LlmProvider,
    C: LlmProvider,
{
    heading(out, "Sources")?;
    if matches.is_empty() {
        writeln!(out, "(no matching passages)")?;
        return Ok(());
    }

    for passage in matches {
        writeln!(out, "{}", passage.source)?;
        writeln!(out, "{}", textwrap::fill(&passage.content, WRAP_WIDTH))?;
        if expand {
            writeln!(out, "  Show more:")?;
            match pipeline.expand(&passage.id).await {
                Ok(result) => match result.expanded_content {
                    Some(text) => writeln!(out, "{}", textwrap::fill(&text, WRAP_WIDTH))?,
                    None => writeln!(out, "(no additional content)")?,
                },
                Err(e) => {
                    if e.is_retryable() {
                        tracing::warn!(passage_id = %passage.id, "expansion failed: {e}");
                    }
                    writeln!(out, "(no additional content)")?;
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
