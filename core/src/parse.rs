//! Lenient parsing of raw dive log fields.
//!
//! Depths, times and severity levels reach the auditor as free text from
//! forms, legacy rows and photo extraction. These parsers accept the common
//! spellings and report anything else as a [`FieldParseError`]; the
//! `lenient_*` wrappers turn failures into `None` so a malformed field never
//! blocks an audit.
//!
//! # Accepted input
//!
//! - Depth: `45`, `45.5 m`, `60 meters`, `150ft`
//! - Duration: `240`, `240s`, `4:00`, `1:02:03`, `3m 20s`, `2 min`
//! - Level: `3`, `3/5`
//! - Flag: `true`/`false`, `yes`/`no`, `y`/`n`, `1`/`0`

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{char, digit1, multispace0, u32 as parse_u32},
    combinator::{all_consuming, opt, value},
    error::{Error, ErrorKind},
    multi::{many1, separated_list1},
    number::complete::double,
    IResult, Parser,
};
use tracing::debug;

use crate::error::FieldParseError;

const METERS_PER_FOOT: f64 = 0.3048;

/// Parse a depth into meters.
pub fn parse_depth_m(input: &str) -> Result<f64, FieldParseError> {
    let meters = run(input, depth)?;
    if !meters.is_finite() || meters < 0.0 {
        return Err(FieldParseError::OutOfRange(format!("depth {meters}")));
    }
    Ok(meters)
}

/// Parse a duration into whole seconds.
pub fn parse_duration_sec(input: &str) -> Result<i32, FieldParseError> {
    let seconds = run(input, alt((clock_duration, unit_duration, bare_seconds)))?;
    if !seconds.is_finite() || seconds < 0.0 || seconds > f64::from(i32::MAX) {
        return Err(FieldParseError::OutOfRange(format!("duration {seconds}")));
    }
    Ok(seconds.round() as i32)
}

/// Parse a severity or quality level such as `3` or `3/5`.
pub fn parse_level(input: &str) -> Result<i32, FieldParseError> {
    let n = run(input, level)?;
    i32::try_from(n).map_err(|_| FieldParseError::OutOfRange(format!("level {n}")))
}

/// Parse a yes/no style flag.
pub fn parse_flag(input: &str) -> Result<bool, FieldParseError> {
    run(input, flag)
}

pub fn lenient_depth_m(input: &str) -> Option<f64> {
    absorb(input, parse_depth_m(input))
}

pub fn lenient_duration_sec(input: &str) -> Option<i32> {
    absorb(input, parse_duration_sec(input))
}

pub fn lenient_level(input: &str) -> Option<i32> {
    absorb(input, parse_level(input))
}

pub fn lenient_flag(input: &str) -> Option<bool> {
    absorb(input, parse_flag(input))
}

fn absorb<T>(input: &str, result: Result<T, FieldParseError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(FieldParseError::Empty) => None,
        Err(err) => {
            debug!(raw = input, error = %err, "ignoring unparseable field");
            None
        }
    }
}

fn run<'a, O, P>(input: &'a str, parser: P) -> Result<O, FieldParseError>
where
    P: Parser<&'a str, Output = O, Error = Error<&'a str>>,
{
    let input = input.trim();
    if input.is_empty() {
        return Err(FieldParseError::Empty);
    }

    match all_consuming(parser).parse(input) {
        Ok((_, out)) => Ok(out),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(FieldParseError::Invalid {
            position: input.len() - e.input.len(),
            message: format!("unexpected input: '{}'", e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(FieldParseError::Invalid {
            position: input.len(),
            message: "incomplete input".to_string(),
        }),
    }
}

fn depth(input: &str) -> IResult<&str, f64> {
    let (input, amount) = double(input)?;
    let (input, _) = multispace0(input)?;
    let (input, scale) = opt(depth_unit).parse(input)?;
    Ok((input, amount * scale.unwrap_or(1.0)))
}

fn depth_unit(input: &str) -> IResult<&str, f64> {
    alt((
        value(
            METERS_PER_FOOT,
            alt((tag_no_case("feet"), tag_no_case("foot"), tag_no_case("ft"))),
        ),
        value(
            1.0,
            alt((
                tag_no_case("meters"),
                tag_no_case("metres"),
                tag_no_case("meter"),
                tag_no_case("metre"),
                tag_no_case("m"),
            )),
        ),
    ))
    .parse(input)
}

fn clock_duration(input: &str) -> IResult<&str, f64> {
    let (rest, parts) = separated_list1(char(':'), digit1).parse(input)?;
    let numbers: Vec<f64> = parts.iter().filter_map(|p| p.parse().ok()).collect();

    let seconds = match numbers.as_slice() {
        [m, s] if *s < 60.0 => m * 60.0 + s,
        [h, m, s] if *m < 60.0 && *s < 60.0 => h * 3600.0 + m * 60.0 + s,
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify))),
    };
    Ok((rest, seconds))
}

fn unit_duration(input: &str) -> IResult<&str, f64> {
    let (input, parts) = many1(duration_component).parse(input)?;
    Ok((input, parts.iter().sum()))
}

fn bare_seconds(input: &str) -> IResult<&str, f64> {
    double(input)
}

fn duration_component(input: &str) -> IResult<&str, f64> {
    let (input, amount) = double(input)?;
    let (input, _) = multispace0(input)?;
    let (input, scale) = duration_unit(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, amount * scale))
}

fn duration_unit(input: &str) -> IResult<&str, f64> {
    alt((
        value(
            3600.0,
            alt((
                tag_no_case("hours"),
                tag_no_case("hour"),
                tag_no_case("hrs"),
                tag_no_case("hr"),
                tag_no_case("h"),
            )),
        ),
        value(
            60.0,
            alt((
                tag_no_case("minutes"),
                tag_no_case("minute"),
                tag_no_case("mins"),
                tag_no_case("min"),
                tag_no_case("m"),
            )),
        ),
        value(
            1.0,
            alt((
                tag_no_case("seconds"),
                tag_no_case("second"),
                tag_no_case("secs"),
                tag_no_case("sec"),
                tag_no_case("s"),
            )),
        ),
    ))
    .parse(input)
}

fn level(input: &str) -> IResult<&str, u32> {
    let (input, n) = parse_u32(input)?;
    let (input, _) = opt((multispace0, char('/'), multispace0, parse_u32)).parse(input)?;
    Ok((input, n))
}

fn flag(input: &str) -> IResult<&str, bool> {
    alt((
        value(
            true,
            alt((tag_no_case("true"), tag_no_case("yes"), tag_no_case("y"), tag("1"))),
        ),
        value(
            false,
            alt((tag_no_case("false"), tag_no_case("no"), tag_no_case("n"), tag("0"))),
        ),
    ))
    .parse(input)
}
