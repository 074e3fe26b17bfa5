//! Nom-based tokenizer for raw protocol lines.
//!
//! Servers in the wild send doubled spaces, stray line terminators and
//! prefixes on every kind of line, so the parameter scanner is hand-rolled
//! on top of the nom front half and tolerates all three.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::{context, VerboseError, VerboseErrorKind},
    sequence::preceded,
    IResult,
};

use crate::error::MessageParseError;

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// IRCv3 tags are accepted and skipped.
fn parse_tags(input: &str) -> ParseResult<&str, &str> {
    context("parsing message tags", preceded(char('@'), take_until(" ")))(input)
}

fn parse_source(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing message source",
        preceded(char(':'), take_while1(|c: char| c != ' ')),
    )(input)
}

fn parse_command(input: &str) -> ParseResult<&str, &str> {
    context(
        "parsing command",
        take_while1(|c: char| c.is_ascii_alphanumeric()),
    )(input)
}

/// Tokenized line borrowing from its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawParts<'a> {
    pub source: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
    pub has_trailing: bool,
}

fn parse_line(input: &str) -> ParseResult<&str, RawParts<'_>> {
    let (input, _) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;
    let (input, source) = opt(parse_source)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;

    let mut params = Vec::new();
    let mut has_trailing = false;
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() || rest.starts_with(['\r', '\n']) {
            break;
        }
        if let Some(after_colon) = rest.strip_prefix(':') {
            let end = after_colon.find(['\r', '\n']).unwrap_or(after_colon.len());
            params.push(&after_colon[..end]);
            has_trailing = true;
            rest = &after_colon[end..];
            break;
        }
        let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    Ok((
        rest,
        RawParts {
            source,
            command,
            params,
            has_trailing,
        },
    ))
}

pub(crate) fn tokenize(input: &str) -> Result<RawParts<'_>, MessageParseError> {
    if input.trim_matches([' ', '\r', '\n']).is_empty() {
        return Err(MessageParseError::EmptyMessage);
    }
    match parse_line(input) {
        Ok((_, parts)) => Ok(parts),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let mut position = input.len();
            let mut what = "parsing line";
            for (rest, kind) in &e.errors {
                position = input.len() - rest.len();
                if let VerboseErrorKind::Context(ctx) = kind {
                    what = *ctx;
                }
            }
            if what == "parsing command" {
                return Err(MessageParseError::InvalidCommand);
            }
            Err(MessageParseError::ParseContext {
                position,
                context: what.to_string(),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(MessageParseError::ParseContext {
            position: input.len(),
            context: "incomplete input".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_command() {
        let parts = tokenize("PING").unwrap();
        assert_eq!(parts.command, "PING");
        assert!(parts.source.is_none());
        assert!(parts.params.is_empty());
        assert!(!parts.has_trailing);
    }

    #[test]
    fn test_tokenize_with_source() {
        let parts = tokenize(":nick!user@host PRIVMSG #channel :Hello there").unwrap();
        assert_eq!(parts.source, Some("nick!user@host"));
        assert_eq!(parts.command, "PRIVMSG");
        assert_eq!(parts.params, vec!["#channel", "Hello there"]);
        assert!(parts.has_trailing);
    }

    #[test]
    fn test_tokenize_skips_tags() {
        let parts = tokenize("@time=2023-01-01T00:00:00Z :nick PRIVMSG #ch :Hi").unwrap();
        assert_eq!(parts.source, Some("nick"));
        assert_eq!(parts.params, vec!["#ch", "Hi"]);
    }

    #[test]
    fn test_tokenize_double_spaces() {
        // MODE #chan +ov  Alice Bob
        let parts = tokenize(":srv MODE #chan +ov  Alice Bob").unwrap();
        assert_eq!(parts.params, vec!["#chan", "+ov", "Alice", "Bob"]);
    }

    #[test]
    fn test_tokenize_crlf() {
        let parts = tokenize("PING :server\r\n").unwrap();
        assert_eq!(parts.params, vec!["server"]);
        let parts = tokenize("JOIN #a\r\n").unwrap();
        assert_eq!(parts.params, vec!["#a"]);
    }

    #[test]
    fn test_tokenize_colon_inside_middle() {
        let parts = tokenize(":srv 005 me MAXLIST=b:60,e:60 :are supported").unwrap();
        assert_eq!(parts.params, vec!["me", "MAXLIST=b:60,e:60", "are supported"]);
    }

    #[test]
    fn test_tokenize_empty_trailing() {
        let parts = tokenize("PRIVMSG #channel :").unwrap();
        assert_eq!(parts.params, vec!["#channel", ""]);
        assert!(parts.has_trailing);
    }

    #[test]
    fn test_tokenize_errors() {
        assert_eq!(tokenize(""), Err(MessageParseError::EmptyMessage));
        assert_eq!(tokenize("\r\n"), Err(MessageParseError::EmptyMessage));
        assert_eq!(tokenize(":source.only"), Err(MessageParseError::InvalidCommand));
        assert_eq!(tokenize(":nick!u@h :oops"), Err(MessageParseError::InvalidCommand));
    }
}
