use crate::error::{ParseError, ParseResult};
use logos::{Lexer, Logos};
use std::borrow::Cow;
use std::ops::Range;

/// Tokens between tags.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum ContentToken<'src> {
    #[token("<!--", comment)]
    Comment,

    #[regex(r"<![a-zA-Z][^>]*>")]
    Doctype,

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*", |lex| &lex.slice()[2..])]
    EndTagOpen(&'src str),

    #[regex(r"<[a-zA-Z][a-zA-Z0-9-]*", |lex| &lex.slice()[1..])]
    StartTagOpen(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside a start or end tag.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TagToken<'src> {
    #[token(">")]
    Close,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r#"'[^']*'"#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Quoted(&'src str),

    #[regex(r#"[^ \t\r\n\f"'<>=]+"#, |lex| lex.slice())]
    Name(&'src str),
}

fn comment<'src>(lex: &mut Lexer<'src, ContentToken<'src>>) -> bool {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => false,
    }
}

/// Flat token stream consumed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupToken<'src> {
    StartTag(&'src str),
    EndTag(&'src str),
    AttrName(&'src str),
    Equals,
    AttrValue(&'src str),
    TagClose,
    SelfClose,
    Text(&'src str),
}

/// Tokenize markup. Comments and doctypes are dropped.
pub fn tokenize(source: &str) -> ParseResult<Vec<(MarkupToken<'_>, Range<usize>)>> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(source);

    while let Some(result) = content.next() {
        let span = content.span();
        let name = match result {
            Ok(ContentToken::Text(text)) => {
                tokens.push((MarkupToken::Text(text), span));
                continue;
            }
            Ok(ContentToken::Comment) | Ok(ContentToken::Doctype) => continue,
            Ok(ContentToken::StartTagOpen(name)) => {
                tokens.push((MarkupToken::StartTag(name), span));
                name
            }
            Ok(ContentToken::EndTagOpen(name)) => {
                tokens.push((MarkupToken::EndTag(name), span));
                name
            }
            Err(()) => return Err(ParseError::lexer_error(span.start)),
        };

        let mut tag = content.morph::<TagToken>();
        loop {
            let token = match tag.next() {
                None => return Err(ParseError::unexpected_eof(source.len())),
                Some(Err(())) => return Err(ParseError::lexer_error(tag.span().start)),
                Some(Ok(token)) => token,
            };
            let span = tag.span();
            match token {
                TagToken::Close => {
                    tokens.push((MarkupToken::TagClose, span));
                    break;
                }
                TagToken::SelfClose => {
                    tokens.push((MarkupToken::SelfClose, span));
                    break;
                }
                TagToken::Equals => tokens.push((MarkupToken::Equals, span)),
                TagToken::Quoted(value) => tokens.push((MarkupToken::AttrValue(value), span)),
                TagToken::Name(value) => {
                    let after_equals = matches!(tokens.last(), Some((MarkupToken::Equals, _)));
                    if after_equals {
                        tokens.push((MarkupToken::AttrValue(value), span));
                    } else {
                        tokens.push((MarkupToken::AttrName(value), span));
                    }
                }
            }
        }
        tracing::trace!(tag = name, "Lexed tag");
        content = tag.morph();
    }

    Ok(tokens)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Decode character references. Unknown references are kept verbatim.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&after[..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
