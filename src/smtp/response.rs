//! SMTP reply, a 3-digit code plus the server's text

use std::{
    fmt::{Display, Formatter, Result},
    result,
    str::FromStr,
};

use nom::{
    bytes::streaming::{tag, take, take_until},
    combinator::complete,
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};

use crate::smtp::{error, error::Error};

/// A 3-digit SMTP reply code
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct Code(u16);

impl Code {
    /// The code as an integer
    pub fn value(self) -> u16 {
        self.0
    }

    /// Tells if the code indicates success or an intermediate positive state (2yz/3yz)
    pub fn is_positive(self) -> bool {
        (200..400).contains(&self.0)
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:03}", self.0)
    }
}

/// One logical server reply, possibly spanning several physical lines.
///
/// Continuation lines carry a `-` in the fourth column (`250-text`);
/// the terminal line uses a space (`250 text`). The code reported is
/// the one of the terminal line, all text lines are kept.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Response {
    code: Code,
    message: Vec<String>,
}

impl FromStr for Response {
    type Err = Error;

    fn from_str(s: &str) -> result::Result<Response, Error> {
        parse_response(s)
            .map(|(_, r)| r)
            .map_err(|e| error::response(e.to_owned().to_string()))
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.code)?;
        for line in &self.message {
            write!(f, " {line}")?;
        }
        Ok(())
    }
}

impl Response {
    /// Creates a new `Response`
    pub fn new(code: Code, message: Vec<String>) -> Response {
        Response { code, message }
    }

    /// Response code of the terminal line
    pub fn code(&self) -> Code {
        self.code
    }

    /// Tests code equality
    pub fn has_code(&self, code: u16) -> bool {
        self.code.0 == code
    }

    /// Server text, one entry per physical line
    pub fn message(&self) -> impl Iterator<Item = &str> {
        self.message.iter().map(String::as_str)
    }
}

fn parse_code(i: &str) -> IResult<&str, Code> {
    let (i, digits) = take(3usize)(i)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Digit,
        )));
    }
    let code = digits
        .bytes()
        .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
    Ok((i, Code(code)))
}

pub(crate) fn parse_response(i: &str) -> IResult<&str, Response> {
    let (i, lines) = many0(tuple((
        parse_code,
        preceded(tag("-"), take_until("\r\n")),
        tag("\r\n"),
    )))(i)?;
    let (i, (last_code, last_line)) =
        tuple((parse_code, preceded(tag(" "), take_until("\r\n"))))(i)?;
    let (i, _) = complete(tag("\r\n"))(i)?;

    // Extract text from continuation lines, and append the terminal line.
    // The reported code is the terminal line's, whatever the others said.
    let mut message: Vec<String> = lines.into_iter().map(|(_, text, _)| text.into()).collect();
    message.push(last_line.into());

    Ok((
        i,
        Response {
            code: last_code,
            message,
        },
    ))
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_single_line() {
        let response = Response::from_str("220 smtp.example.com ESMTP ready\r\n").unwrap();

        assert_eq!(response.code().value(), 220);
        assert!(response.has_code(220));
        assert_eq!(
            response.message().collect::<Vec<_>>(),
            vec!["smtp.example.com ESMTP ready"]
        );
    }

    #[test]
    fn parse_multiline_returns_terminal_code() {
        let response =
            Response::from_str("250-smtp.example.com\r\n250-8BITMIME\r\n250 AUTH LOGIN PLAIN\r\n")
                .unwrap();

        assert_eq!(response.code().value(), 250);
        assert_eq!(
            response.message().collect::<Vec<_>>(),
            vec!["smtp.example.com", "8BITMIME", "AUTH LOGIN PLAIN"]
        );
    }

    #[test]
    fn mixed_codes_take_the_last_line() {
        // not RFC-clean, but matches the lenient fourth-column convention
        let response = Response::from_str("250-first\r\n251 second\r\n").unwrap();

        assert_eq!(response.code().value(), 251);
    }

    #[test]
    fn incomplete_reply_asks_for_more_input() {
        assert!(matches!(
            parse_response("250-smtp.example.com\r\n"),
            Err(nom::Err::Incomplete(_))
        ));
        assert!(matches!(
            parse_response("250 partial line without ending"),
            Err(nom::Err::Incomplete(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Response::from_str("2x0 nope\r\n").is_err());
        assert!(Response::from_str("hello\r\n").is_err());
    }

    #[test]
    fn code_display_keeps_three_digits() {
        let response = Response::from_str("250 ok\r\n").unwrap();
        assert_eq!(response.code().to_string(), "250");
        assert_eq!(response.to_string(), "250 ok");
    }

    #[test]
    fn code_positivity() {
        assert!(Response::from_str("354 go ahead\r\n").unwrap().code().is_positive());
        assert!(!Response::from_str("554 rejected\r\n").unwrap().code().is_positive());
    }
}
