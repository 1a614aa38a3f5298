//! Purpose: Line-oriented definition parsing pipeline with explicit short-circuit control.
//! Exports: `ParseContext`, `Flow`, `run_line`, `parse`, `parse_str`, `BODY_MARKER`.
//! Role: Parsing engine binding definition lines onto a caller-supplied settings target.
//! Invariants: Stages run in fixed order; the first `Stop` ends that line's pass.
//! Invariants: The cursor is borrowed, never owned; the caller opens and closes it.
//! Invariants: A malformed line aborts the whole parse; there is no recovery mode.

use std::io::{self, BufRead};

use bstr::ByteSlice;
use tracing::{debug, trace};

use crate::core::bind::{self, SettingsTarget};
use crate::core::error::{Error, ErrorKind};

/// Exact marker line switching the pipeline into body capture.
pub const BODY_MARKER: &str = "# Body";

/// Slot name the captured body is bound to.
const BODY_SLOT: &str = "Body";

/// Control signal returned by each stage: run the rest of the pipeline for
/// this line, or stop the pass here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    Proceed,
    Stop,
}

/// Carries the read cursor, the current trimmed line, and the destination
/// being populated. Used by exactly one logical parse pass at a time.
pub struct ParseContext<'a, R, T> {
    cursor: &'a mut R,
    input: String,
    line: u64,
    state: &'a mut T,
}

impl<'a, R: BufRead, T: SettingsTarget> ParseContext<'a, R, T> {
    pub fn new(cursor: &'a mut R, state: &'a mut T) -> Self {
        Self {
            cursor,
            input: String::new(),
            line: 0,
            state,
        }
    }

    /// The current line's text, trimmed. Empty until the first pass runs.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// 1-based number of the line currently held in `input`.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn state(&self) -> &T {
        self.state
    }

    /// Positive end-of-stream test; callers must check this before running
    /// the pipeline, since asking an exhausted cursor for another line fails.
    pub fn has_input(&mut self) -> Result<bool, Error> {
        let buf = self
            .cursor
            .fill_buf()
            .map_err(|err| io_error(err, "failed to read definition stream"))?;
        Ok(!buf.is_empty())
    }
}

type Stage<R, T> = fn(&mut ParseContext<'_, R, T>) -> Result<Flow, Error>;

/// Run one full pipeline pass: read a line and take it through the stages in
/// fixed order until one of them stops the pass.
pub fn run_line<R: BufRead, T: SettingsTarget>(
    ctx: &mut ParseContext<'_, R, T>,
) -> Result<(), Error> {
    let stages: [Stage<R, T>; 4] = [read_line, skip_ignorable, read_body, bind_setting];
    for stage in stages {
        if let Flow::Stop = stage(ctx)? {
            break;
        }
    }
    Ok(())
}

/// Parse a whole definition stream onto `state`, one line per pipeline pass,
/// until the cursor is exhausted. The body stage's full-remainder read empties
/// the stream, so a parse always terminates after a body capture.
pub fn parse<R: BufRead, T: SettingsTarget>(cursor: &mut R, state: &mut T) -> Result<(), Error> {
    let mut ctx = ParseContext::new(cursor, state);
    while ctx.has_input()? {
        run_line(&mut ctx)?;
    }
    trace!(lines = ctx.line, "definition parse complete");
    Ok(())
}

/// Parse an in-memory definition.
pub fn parse_str<T: SettingsTarget>(input: &str, state: &mut T) -> Result<(), Error> {
    parse(&mut input.as_bytes(), state)
}

fn read_line<R: BufRead, T: SettingsTarget>(
    ctx: &mut ParseContext<'_, R, T>,
) -> Result<Flow, Error> {
    let mut raw = Vec::new();
    let read = ctx
        .cursor
        .read_until(b'\n', &mut raw)
        .map_err(|err| io_error(err, "failed to read definition stream"))?;
    if read == 0 {
        return Err(Error::new(ErrorKind::Argument)
            .with_message("cursor has no more data")
            .with_hint("Check for end of stream before running the pipeline."));
    }
    ctx.line += 1;
    let text = match raw.to_str() {
        Ok(text) => text,
        Err(_) => {
            return Err(Error::new(ErrorKind::Format)
                .with_message(format!("line is not valid utf-8: {}", raw.to_str_lossy()))
                .with_line(ctx.line));
        }
    };
    ctx.input.clear();
    ctx.input.push_str(text.trim());
    Ok(Flow::Proceed)
}

fn skip_ignorable<R: BufRead, T: SettingsTarget>(
    ctx: &mut ParseContext<'_, R, T>,
) -> Result<Flow, Error> {
    if ctx.input.is_empty() {
        return Ok(Flow::Stop);
    }
    // The exact body marker also starts with '#'; it belongs to the next stage.
    if ctx.input.starts_with('#') && ctx.input != BODY_MARKER {
        trace!(line = ctx.line, "skipping comment");
        return Ok(Flow::Stop);
    }
    Ok(Flow::Proceed)
}

fn read_body<R: BufRead, T: SettingsTarget>(
    ctx: &mut ParseContext<'_, R, T>,
) -> Result<Flow, Error> {
    if ctx.input != BODY_MARKER {
        return Ok(Flow::Proceed);
    }
    let mut raw = Vec::new();
    ctx.cursor
        .read_to_end(&mut raw)
        .map_err(|err| io_error(err, "failed to read definition body"))?;
    let body = match raw.to_str() {
        Ok(text) => text.to_string(),
        Err(_) => {
            return Err(Error::new(ErrorKind::Format)
                .with_message(format!("body is not valid utf-8: {}", raw.to_str_lossy()))
                .with_line(ctx.line));
        }
    };
    debug!(line = ctx.line, bytes = body.len(), "captured body");
    bind::bind(ctx.state, BODY_SLOT, body).map_err(|err| err.with_line(ctx.line))?;
    Ok(Flow::Stop)
}

fn bind_setting<R: BufRead, T: SettingsTarget>(
    ctx: &mut ParseContext<'_, R, T>,
) -> Result<Flow, Error> {
    let (name, value) = match ctx.input.split_once(':') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => return Err(format_error(&ctx.input).with_line(ctx.line)),
    };
    if name.is_empty() || value.is_empty() {
        return Err(format_error(&ctx.input).with_line(ctx.line));
    }
    bind::bind(ctx.state, name, value.to_string()).map_err(|err| err.with_line(ctx.line))?;
    debug!(line = ctx.line, setting = name, "bound setting");
    Ok(Flow::Stop)
}

fn format_error(input: &str) -> Error {
    Error::new(ErrorKind::Format)
        .with_message(format!("settings must have a name and a value: {input}"))
        .with_hint("Write settings as `name: value`.")
}

fn io_error(err: io::Error, message: &str) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(message)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use super::{ParseContext, parse, parse_str, run_line};
    use crate::core::error::ErrorKind;
    use crate::core::settings::StubSettings;

    #[test]
    fn value_splits_on_first_colon_only() {
        let mut settings = StubSettings::new();
        parse_str("Url: http://localhost:8080/pets\n", &mut settings).expect("parse");
        assert_eq!(settings.url.as_deref(), Some("http://localhost:8080/pets"));
    }

    #[test]
    fn comments_and_blank_lines_mutate_nothing() {
        let mut settings = StubSettings::new();
        parse_str("# a comment\n\n   \t\n#Url: /ignored\n", &mut settings).expect("parse");
        assert_eq!(settings, StubSettings::new());
    }

    #[test]
    fn unknown_setting_is_a_schema_error() {
        let mut settings = StubSettings::new();
        let err = parse_str("method: GET\n", &mut settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.message().expect("message").contains("method"));
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn body_marker_captures_remainder_verbatim() {
        let input = "Url: /pets\n# Body\n{ \"name\": \"rover\" }\nsecond: line\n";
        let mut settings = StubSettings::new();
        parse_str(input, &mut settings).expect("parse");
        assert_eq!(
            settings.body.as_deref(),
            Some("{ \"name\": \"rover\" }\nsecond: line\n")
        );
    }

    #[test]
    fn body_setting_line_is_not_a_marker() {
        let mut settings = StubSettings::new();
        parse_str("Body: value\n", &mut settings).expect("parse");
        assert_eq!(settings.body.as_deref(), Some("value"));
    }

    #[test]
    fn marker_lookalikes_are_plain_comments() {
        let mut settings = StubSettings::new();
        parse_str("# Body trailing\n# body\n", &mut settings).expect("parse");
        assert_eq!(settings.body, None);
    }

    #[test]
    fn line_without_colon_is_a_format_error() {
        let mut settings = StubSettings::new();
        let err = parse_str("just some text\n", &mut settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(
            err.message()
                .expect("message")
                .contains("name and a value")
        );
    }

    #[test]
    fn empty_name_or_value_is_a_format_error() {
        let mut settings = StubSettings::new();
        let err = parse_str(": GET\n", &mut settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let mut settings = StubSettings::new();
        let err = parse_str("Method:   \n", &mut settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn errors_carry_the_line_number() {
        let mut settings = StubSettings::new();
        let err = parse_str("Method: GET\n# note\nUrll: /pets\n", &mut settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn reading_an_exhausted_cursor_is_an_argument_error() {
        let mut empty: &[u8] = b"";
        let mut settings = StubSettings::new();
        let mut ctx = ParseContext::new(&mut empty, &mut settings);
        let err = run_line(&mut ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn driver_stops_at_end_of_stream_without_argument_errors() {
        let mut cursor: &[u8] = b"Method: GET\nUrl: /pets";
        let mut settings = StubSettings::new();
        parse(&mut cursor, &mut settings).expect("parse");
        assert_eq!(settings.method.as_deref(), Some("GET"));
        assert_eq!(settings.url.as_deref(), Some("/pets"));
    }

    #[test]
    fn non_utf8_line_is_a_format_error() {
        let mut cursor: &[u8] = b"Method: GET\n\xff\xfe\n";
        let mut settings = StubSettings::new();
        let err = parse(&mut cursor, &mut settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn context_exposes_the_supplied_state() {
        let mut cursor: &[u8] = b"StatusCode: 201\n";
        let mut settings = StubSettings::new();
        let mut ctx = ParseContext::new(&mut cursor, &mut settings);
        assert!(ctx.has_input().expect("has_input"));
        run_line(&mut ctx).expect("run");
        assert_eq!(ctx.state().status_code.as_deref(), Some("201"));
        assert_eq!(ctx.input(), "StatusCode: 201");
        assert_eq!(ctx.line(), 1);
        // The mutation lands on the caller's instance, not a copy.
        assert!(!ctx.has_input().expect("has_input"));
        assert_eq!(settings.status_code.as_deref(), Some("201"));
    }
}
