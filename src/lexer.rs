//! Line-level CSV lexing: splitting a line into fields and scanning numeric
//! prefixes out of a field.

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_till, take_till1};
use nom::character::complete::{char, digit0, digit1, multispace0, one_of};
use nom::combinator::{eof, not, opt, recognize, value};
use nom::multi::fold_many0;
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::IResult;

/// Splits one line (without its terminator) into fields.
///
/// A field starting with `"` runs until a `"` that is followed by `,` or the
/// end of the line; inside it `""` stands for one `"`. Any other field runs
/// until the next `,` and is trimmed. An empty line has no fields.
///
/// A trailing comma ends the line with an empty field, so `a,b,` has three
/// fields. Scanners that stop at the end of input right after the comma would
/// report two.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    if line.is_empty() {
        return fields;
    }

    let mut rest = line;
    while let Ok((r, (text, separator))) = field(rest) {
        fields.push(text);
        rest = r;
        if separator.is_none() {
            break;
        }
    }
    fields
}

fn field(s: &str) -> IResult<&str, (String, Option<char>)> {
    pair(alt((quoted_field, unquoted_field)), opt(char(',')))(s)
}

// a lone quote is kept as is unless it closes the field
fn lone_quote(s: &str) -> IResult<&str, &str> {
    terminated(tag("\""), not(alt((tag(","), eof))))(s)
}

fn quoted_field(s: &str) -> IResult<&str, String> {
    let (s, _) = char('"')(s)?;
    let (s, text) = fold_many0(
        alt((
            take_till1(|c: char| c == '"'),
            value("\"", tag("\"\"")),
            lone_quote,
        )),
        String::new,
        |mut acc, chunk| {
            acc.push_str(chunk);
            acc
        },
    )(s)?;
    // unterminated fields end with the line
    let (s, _) = opt(char('"'))(s)?;
    Ok((s, text))
}

fn unquoted_field(s: &str) -> IResult<&str, String> {
    let (s, text) = take_till(|c: char| c == ',')(s)?;
    Ok((s, text.trim().to_owned()))
}

fn sign(s: &str) -> IResult<&str, Option<char>> {
    opt(one_of("+-"))(s)
}

fn integer_literal(s: &str) -> IResult<&str, &str> {
    preceded(multispace0, recognize(pair(sign, digit1)))(s)
}

fn float_literal(s: &str) -> IResult<&str, &str> {
    let special = alt((tag_no_case("infinity"), tag_no_case("inf"), tag_no_case("nan")));
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = tuple((one_of("eE"), sign, digit1));
    let number = recognize(tuple((mantissa, opt(exponent))));

    preceded(multispace0, recognize(pair(sign, alt((number, special)))))(s)
}

/// Parses the leading integer of `s` the way C's `atoi` reads it: leading
/// whitespace, an optional sign, then digits; anything after is ignored.
/// Values beyond the `i64` range saturate. `None` if there is no number.
pub fn integer_prefix(s: &str) -> Option<i64> {
    let (_, text) = integer_literal(s).ok()?;
    Some(text.parse().unwrap_or(if text.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

/// Parses the leading decimal number of `s` the way C's `atof` reads it.
/// `None` if there is no number.
pub fn float_prefix(s: &str) -> Option<f64> {
    let (_, text) = float_literal(s).ok()?;
    text.parse().ok()
}
