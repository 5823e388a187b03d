//! Subtitle event handling: finds karaoke events, runs the ruby alignment on
//! their text field and writes them back.

use std::fmt::{self, Display, Formatter};
use std::num::NonZeroUsize;
use std::thread;

use anyhow::{anyhow, bail, ensure, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::karaoke::{has_timing_tags, render_tokens, KaraokeLine};
use crate::reading::ReadingProvider;
use crate::ruby::{AlignmentEngine, KanaStrategy, RubyError};
use crate::types::ReadingPair;

const EVENT_FIELDS: usize = 10;
const TEXT_FIELD: usize = 9;
const STYLE_FIELD: usize = 3;
const EFFECT_FIELD: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Dialogue,
    Comment,
}

impl EventKind {
    fn label(self) -> &'static str {
        match self {
            Self::Dialogue => "Dialogue",
            Self::Comment => "Comment",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `Dialogue:`/`Comment:` line of the events section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLine {
    pub kind: EventKind,
    /// Raw comma-separated fields; the last one is the text and may contain commas.
    fields: Vec<String>,
}

impl EventLine {
    pub fn parse(line: &str) -> Option<Self> {
        let (label, rest) = line.split_once(':')?;
        let kind = match label {
            "Dialogue" => EventKind::Dialogue,
            "Comment" => EventKind::Comment,
            _ => return None,
        };
        let fields: Vec<String> = rest.splitn(EVENT_FIELDS, ',').map(str::to_string).collect();
        (fields.len() == EVENT_FIELDS).then_some(Self { kind, fields })
    }

    pub fn text(&self) -> &str {
        &self.fields[TEXT_FIELD]
    }

    pub fn set_text(&mut self, text: String) {
        self.fields[TEXT_FIELD] = text;
    }

    pub fn style(&self) -> &str {
        self.fields[STYLE_FIELD].trim()
    }

    pub fn set_style(&mut self, style: &str) {
        self.fields[STYLE_FIELD] = style.to_string();
    }

    pub fn effect(&self) -> &str {
        self.fields[EFFECT_FIELD].trim()
    }

    pub fn set_effect(&mut self, effect: &str) {
        self.fields[EFFECT_FIELD] = effect.to_string();
    }

    pub fn render(&self) -> String {
        format!("{}:{}", self.kind, self.fields.join(","))
    }
}

/// Run options, usually supplied as JSON on the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkOptions {
    /// Turn marked Dialogue events into Comments for the karaoke templater.
    #[serde(alias = "commentOut", alias = "comment")]
    pub comment_out: bool,
    /// Effect written on marked events when `comment_out` is set.
    pub effect: String,
    /// Optional style name forced onto marked events.
    pub style: Option<String>,
    /// Leave failing lines untouched instead of aborting the document.
    #[serde(alias = "skipErrors")]
    pub skip_errors: bool,
    #[serde(alias = "jobs", alias = "threads")]
    pub workers: usize,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            comment_out: true,
            effect: "karaoke".to_string(),
            style: None,
            skip_errors: false,
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl MarkOptions {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.workers > 0, "workers must be greater than zero");
        ensure!(
            !self.comment_out || !self.effect.trim().is_empty(),
            "effect must not be empty when comment_out is enabled"
        );
        if let Some(style) = &self.style {
            ensure!(!style.trim().is_empty(), "style override must not be empty");
            ensure!(!style.contains(','), "style override must not contain commas");
        }
        Ok(())
    }
}

/// Outcome of [`process_document`].
#[derive(Debug, Clone, Default)]
pub struct DocumentReport {
    pub output: String,
    pub marked: usize,
    pub skipped: usize,
}

/// Adds furigana to one karaoke text field.
pub fn mark_line<S, P>(text: &str, engine: &AlignmentEngine<S>, provider: &P) -> Result<String>
where
    S: KanaStrategy,
    P: ReadingProvider + ?Sized,
{
    let line = KaraokeLine::parse(text)?;
    if line.tokens.is_empty() {
        return Ok(text.to_string());
    }
    let plain = line.plain_text();
    let pairs = provider
        .readings(&plain)
        .with_context(|| format!("no readings for \"{plain}\""))?;
    let tokens = match engine.align(&line.tokens, &pairs) {
        Err(RubyError::UnsupportedConfiguration { .. }) if has_identity_runs(&pairs) => {
            debug!(text = %plain, "retrying with plain runs split per character");
            engine.align(&line.tokens, &split_identity_runs(&pairs))
        }
        result => result,
    }
    .with_context(|| format!("failed to align \"{plain}\""))?;
    Ok(render_tokens(&line.lead, &tokens))
}

fn has_identity_runs(pairs: &[ReadingPair]) -> bool {
    pairs.iter().any(|pair| pair.is_identity() && pair.char_len() > 1)
}

/// Plain runs may cross syllable boundaries that single characters never do.
fn split_identity_runs(pairs: &[ReadingPair]) -> Vec<ReadingPair> {
    pairs
        .iter()
        .flat_map(|pair| {
            if pair.is_identity() {
                pair.surface.chars().map(ReadingPair::identity).collect()
            } else {
                vec![pair.clone()]
            }
        })
        .collect()
}

/// Marks every Dialogue event with karaoke tags in a subtitle document.
///
/// Lines are handed to `options.workers` scoped threads in contiguous chunks
/// and put back by index; everything that is not a karaoke event is copied
/// verbatim.
pub fn process_document<S, P>(
    input: &str,
    engine: &AlignmentEngine<S>,
    provider: &P,
    options: &MarkOptions,
) -> Result<DocumentReport>
where
    S: KanaStrategy + Sync,
    P: ReadingProvider + Sync + ?Sized,
{
    options.validate()?;
    let (bom, body) = match input.strip_prefix('\u{feff}') {
        Some(body) => ("\u{feff}", body),
        None => ("", input),
    };

    let mut lines: Vec<String> = body.split('\n').map(str::to_string).collect();
    let jobs: Vec<(usize, EventLine)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let event = EventLine::parse(line.strip_suffix('\r').unwrap_or(line.as_str()))?;
            (event.kind == EventKind::Dialogue && has_timing_tags(event.text()))
                .then_some((idx, event))
        })
        .collect();
    info!(events = jobs.len(), workers = options.workers, "marking karaoke events");

    let results = run_jobs(&jobs, engine, provider, options.workers)?;

    let mut report = DocumentReport::default();
    for ((idx, mut event), result) in jobs.into_iter().zip(results) {
        match result {
            Ok(text) => {
                event.set_text(text);
                if options.comment_out {
                    event.kind = EventKind::Comment;
                    event.set_effect(&options.effect);
                }
                if let Some(style) = &options.style {
                    event.set_style(style);
                }
                let cr = if lines[idx].ends_with('\r') { "\r" } else { "" };
                lines[idx] = format!("{}{cr}", event.render());
                report.marked += 1;
            }
            Err(err) if options.skip_errors => {
                warn!(line = idx + 1, error = %format!("{err:#}"), "leaving line unmarked");
                report.skipped += 1;
            }
            Err(err) => return Err(err.context(format!("line {}", idx + 1))),
        }
    }

    report.output = format!("{bom}{}", lines.join("\n"));
    Ok(report)
}

fn run_jobs<S, P>(
    jobs: &[(usize, EventLine)],
    engine: &AlignmentEngine<S>,
    provider: &P,
    workers: usize,
) -> Result<Vec<Result<String>>>
where
    S: KanaStrategy + Sync,
    P: ReadingProvider + Sync + ?Sized,
{
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let workers = workers.clamp(1, jobs.len());
    let chunk_size = jobs.len().div_ceil(workers);
    if workers == 1 {
        return Ok(mark_chunk(jobs, engine, provider));
    }

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for (worker, chunk) in jobs.chunks(chunk_size).enumerate() {
            let handle = thread::Builder::new()
                .name(format!("mark-worker-{worker}"))
                .spawn_scoped(scope, move || mark_chunk(chunk, engine, provider))
                .with_context(|| format!("failed to spawn mark worker {worker}"))?;
            handles.push(handle);
        }
        let mut results = Vec::with_capacity(jobs.len());
        for handle in handles {
            let chunk = handle
                .join()
                .map_err(|_| anyhow!("mark worker panicked"))?;
            results.extend(chunk);
        }
        Ok(results)
    })
}

fn mark_chunk<S, P>(
    chunk: &[(usize, EventLine)],
    engine: &AlignmentEngine<S>,
    provider: &P,
) -> Vec<Result<String>>
where
    S: KanaStrategy,
    P: ReadingProvider + ?Sized,
{
    chunk
        .iter()
        .map(|(idx, event)| {
            debug!(line = idx + 1, "marking event");
            mark_line(event.text(), engine, provider)
        })
        .collect()
}

/// Fails when `input` holds no event lines at all, which usually means the
/// file is not a subtitle script.
pub fn ensure_has_events(input: &str) -> Result<()> {
    if !input
        .lines()
        .any(|line| EventLine::parse(line.trim_end_matches('\r')).is_some())
    {
        bail!("input contains no Dialogue or Comment events");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Lexicon;

    const DIALOGUE: &str = r"Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,{\kf10}私{\kf10}は";

    fn lexicon() -> Lexicon {
        Lexicon::from_tsv("私\tわたし\n夢\tゆめ\n").unwrap()
    }

    #[test]
    fn event_line_round_trips_commas_in_text() {
        let raw = "Dialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,a, b, c";
        let event = EventLine::parse(raw).unwrap();
        assert_eq!(event.kind, EventKind::Dialogue);
        assert_eq!(event.text(), "a, b, c");
        assert_eq!(event.style(), "Default");
        assert_eq!(event.render(), raw);
    }

    #[test]
    fn non_event_lines_are_not_parsed() {
        assert!(EventLine::parse("Style: Default,Arial,20").is_none());
        assert!(EventLine::parse("Dialogue: too,few").is_none());
    }

    #[test]
    fn mark_line_annotates_kanji() {
        let engine = AlignmentEngine::new();
        let marked = mark_line(r"{\kf30}私{\kf12}は", &engine, &lexicon()).unwrap();
        assert_eq!(marked, r"{\kf10}私|<わ{\kf10}#|<た{\kf10}#|<し{\kf12}は");
    }

    #[test]
    fn unknown_words_leave_syllables_untouched() {
        let engine = AlignmentEngine::new();
        let text = r"{\k30}ねえ{\k20}me";
        assert_eq!(mark_line(text, &engine, &lexicon()).unwrap(), text);
    }

    #[test]
    fn override_tags_survive_marking() {
        let engine = AlignmentEngine::new();
        let marked = mark_line(r"{\kf30}{\c&H0000FF&}私", &engine, &lexicon()).unwrap();
        assert_eq!(
            marked,
            r"{\kf10}{\c&H0000FF&}私|<わ{\kf10}#|<た{\kf10}#|<し"
        );
    }

    #[test]
    fn plain_run_across_syllables_is_split_when_needed() {
        let engine = AlignmentEngine::new();
        let marked = mark_line(r"{\k10}とて{\k12}も私", &engine, &lexicon()).unwrap();
        assert_eq!(
            marked,
            r"{\k10}とて{\k6}も{\k2}私|<わ{\k2}#|<た{\k2}#|<し"
        );
    }

    #[test]
    fn document_events_become_karaoke_comments() {
        let input = format!("[Events]\r\n{DIALOGUE}\r\n");
        let report =
            process_document(&input, &AlignmentEngine::new(), &lexicon(), &MarkOptions::default())
                .unwrap();
        assert_eq!(report.marked, 1);
        assert_eq!(
            report.output,
            "[Events]\r\nComment: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,karaoke,\
             {\\kf4}私|<わ{\\kf3}#|<た{\\kf3}#|<し{\\kf10}は\r\n"
        );
    }

    #[test]
    fn failing_lines_abort_or_are_skipped() {
        let bad = r"Dialogue: 0,0:00:01.00,0:00:03.00,Default,,0,0,0,,{\kf10}私";
        let input = format!("\u{feff}{bad}\n{DIALOGUE}\n");
        let provider = crate::reading::ReadingTable::default();
        let engine = AlignmentEngine::new();

        let err = process_document(&input, &engine, &provider, &MarkOptions::default())
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("line 1"));

        let options = MarkOptions {
            skip_errors: true,
            ..MarkOptions::default()
        };
        let report = process_document(&input, &engine, &provider, &options).unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.output, input);
    }

    #[test]
    fn workers_preserve_line_order() {
        let lines: Vec<String> = (0..12)
            .map(|i| format!("Dialogue: 0,0:00:0{}.00,0:00:09.00,K1,,0,0,0,,{{\\k{}}}夢", i % 9, 2 + i))
            .collect();
        let input = lines.join("\n");
        let options = MarkOptions {
            comment_out: false,
            workers: 4,
            ..MarkOptions::default()
        };
        let report =
            process_document(&input, &AlignmentEngine::new(), &lexicon(), &options).unwrap();
        assert_eq!(report.marked, 12);
        for (i, line) in report.output.lines().enumerate() {
            assert!(line.starts_with("Dialogue:"));
            assert!(line.contains("夢|<ゆ"), "line {i}: {line}");
            let first = 2 + i as u32;
            let expected = format!("{{\\k{}}}夢", first - first / 2);
            assert!(line.ends_with(&format!("{expected}|<ゆ{{\\k{}}}#|<め", first / 2)));
        }
    }

    #[test]
    fn options_parse_aliases_and_validate() {
        let options: MarkOptions =
            serde_json::from_str(r#"{"commentOut": false, "jobs": 2, "style": "K1"}"#).unwrap();
        assert!(!options.comment_out);
        assert_eq!(options.workers, 2);
        assert_eq!(options.effect, "karaoke");
        options.validate().unwrap();

        let broken = MarkOptions {
            workers: 0,
            ..MarkOptions::default()
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn detects_missing_events() {
        assert!(ensure_has_events("[Script Info]\nTitle: x\n").is_err());
        assert!(ensure_has_events(DIALOGUE).is_ok());
    }
}
