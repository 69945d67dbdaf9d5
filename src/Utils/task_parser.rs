/// parse documents with structure like
/// ```text
/// solver
///   method: sor
///   tolerance: 1e-8
///   mesh: 32, 32
/// ```
/// i.e. section titles followed by `key: value1, value2` pairs, into
/// `HashMap<title, HashMap<key, Vec<Value>>>`. Lines starting with `//`, `#` or `%` are comments.
use crate::error::{LinAlgError, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{map, recognize},
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::{self, Display};

pub type SectionMap = HashMap<String, Vec<Value>>;
pub type DocumentMap = HashMap<String, SectionMap>;

/// scalar value of a key
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// integers are accepted where a float is expected
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Value::Integer(i) if *i >= 0 => Some(*i as usize),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// identifier: letter or underscore, then letters, digits, underscores. Used for titles and keys.
fn parse_name(input: &str) -> IResult<&str, String> {
    let ident = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(ident, String::from).parse(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    let token = take_while1(|c: char| !matches!(c, ',' | ' ' | '\t' | '\r' | '\n' | ';'));
    map(token, |s: &str| {
        if let Ok(v) = s.parse::<i64>() {
            Value::Integer(v)
        } else if let Ok(v) = s.parse::<f64>() {
            Value::Float(v)
        } else if let Ok(v) = s.parse::<bool>() {
            Value::Boolean(v)
        } else {
            Value::String(s.to_string())
        }
    })
    .parse(input)
}

fn parse_value_list(input: &str) -> IResult<&str, Vec<Value>> {
    separated_list0(delimited(space0, tag(","), space0), parse_value).parse(input)
}

/// `key: v1, v2`; consumes trailing whitespace and line breaks
fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon = delimited(space0, tag(":"), space0);
    terminated(separated_pair(parse_name, colon, parse_value_list), multispace0).parse(input)
}

fn parse_section(input: &str) -> IResult<&str, (String, SectionMap)> {
    let (input, title) = terminated(parse_name, multispace0).parse(input)?;
    let (input, pairs) = many1(parse_key_value_pair).parse(input)?;
    Ok((input, (title, pairs.into_iter().collect())))
}

fn strip_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let t = line.trim();
            !(t.is_empty() || t.starts_with("//") || t.starts_with('#') || t.starts_with('%'))
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Parse the whole document. Trailing unparsed text, a repeated section title or a
/// repeated key inside a section is a `ConfigError`.
pub fn parse_document(input: &str) -> Result<DocumentMap> {
    let cleaned = strip_comments(input);
    let parsed: IResult<&str, Vec<(String, SectionMap)>> =
        delimited(multispace0, many1(parse_section), multispace0).parse(cleaned.as_str());
    let (remaining, sections) =
        parsed.map_err(|e| LinAlgError::ConfigError(format!("parsing error: {:?}", e)))?;
    if !remaining.trim().is_empty() {
        return Err(LinAlgError::ConfigError(format!(
            "failed to parse entire document, remaining: '{}'",
            remaining
        )));
    }
    let mut document = DocumentMap::new();
    for (title, section) in sections {
        if document.insert(title.clone(), section).is_some() {
            return Err(LinAlgError::ConfigError(format!(
                "section '{}' appears twice",
                title
            )));
        }
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_value() {
        let (rest, name) = parse_name("max_iterations: 10").unwrap();
        assert_eq!(name, "max_iterations");
        assert_eq!(rest, ": 10");
        assert!(parse_name("1abc").is_err());
        assert_eq!(parse_value("42").unwrap().1, Value::Integer(42));
        assert_eq!(parse_value("1e-8,").unwrap(), (",", Value::Float(1e-8)));
        assert_eq!(parse_value("true").unwrap().1, Value::Boolean(true));
        assert_eq!(
            parse_value("gauss_seidel").unwrap().1,
            Value::String("gauss_seidel".to_string())
        );
    }

    #[test]
    fn test_value_list() {
        let (_, values) = parse_value_list("32 , 16,8").unwrap();
        assert_eq!(
            values,
            vec![Value::Integer(32), Value::Integer(16), Value::Integer(8)]
        );
    }

    #[test]
    fn test_document_with_sections_and_comments() {
        let doc = "
        // solver settings
        solver
          method: sor
          tolerance: 1e-8
          mesh: 32, 32
        # second section
        output
          report: true
        ";
        let map = parse_document(doc).unwrap();
        assert_eq!(map.len(), 2);
        let solver = &map["solver"];
        assert_eq!(solver["method"][0].as_str(), Some("sor"));
        assert_eq!(solver["tolerance"][0].as_f64(), Some(1e-8));
        assert_eq!(solver["mesh"].len(), 2);
        assert_eq!(solver["mesh"][1].as_usize(), Some(32));
        assert_eq!(map["output"]["report"][0].as_bool(), Some(true));
    }

    #[test]
    fn test_single_line_document() {
        let map = parse_document("solver method: cg max_iterations: 20").unwrap();
        assert_eq!(map["solver"]["max_iterations"][0], Value::Integer(20));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_document("").is_err());
        assert!(parse_document("solver").is_err());
        assert!(matches!(
            parse_document("solver tolerance: 1 solver method: lu"),
            Err(LinAlgError::ConfigError(_))
        ));
    }
}
