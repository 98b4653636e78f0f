//! Text kernel parsing and the kernel variable pool
//!
//! Text kernels (meta-kernels, leapseconds kernels, text PCKs) alternate
//! between `\begintext` comment blocks and `\begindata` assignment blocks.
//! Only the data blocks are parsed here.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{Result, SpiceToolsError};

/// A single value stored in the kernel pool
#[derive(Debug, Clone, PartialEq)]
pub enum PoolValue {
    Number(f64),
    Text(String),
    /// An `@`-prefixed calendar date, kept verbatim without the `@`
    Date(String),
}

impl PoolValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PoolValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PoolValue::Text(s) | PoolValue::Date(s) => Some(s),
            PoolValue::Number(_) => None,
        }
    }
}

/// One `NAME = ...` or `NAME += ...` statement
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub values: Vec<PoolValue>,
    pub append: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Assign,
    Append,
    Open,
    Close,
    Value(PoolValue),
}

/// Extract the `\begindata` portions of a text kernel
fn data_sections(text: &str) -> String {
    let mut in_data = false;
    let mut data = String::new();
    for line in text.lines() {
        match line.trim() {
            "\\begindata" => in_data = true,
            "\\begintext" => in_data = false,
            _ if in_data => {
                data.push_str(line);
                data.push('\n');
            }
            _ => {}
        }
    }
    data
}

lazy_static! {
    /// Decimal number with an optional `E`/`D` exponent
    static ref NUMBER: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([EeDd][+-]?\d+)?$").expect("valid number regex");
    /// Mantissa followed by the exponent letter, before its sign
    static ref MANTISSA: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)[EeDd]$").expect("valid mantissa regex");
}

fn parse_number(raw: &str) -> Option<f64> {
    if !NUMBER.is_match(raw) {
        return None;
    }
    raw.replace(['D', 'd'], "E").parse::<f64>().ok()
}

fn tokenize(data: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = data.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == ',' => {
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push(Token::Assign);
            }
            '+' if {
                let mut ahead = chars.clone();
                ahead.next();
                ahead.peek() == Some(&'=')
            } =>
            {
                chars.next();
                chars.next();
                tokens.push(Token::Append);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            text.push('\'');
                        }
                        Some('\'') => break,
                        Some('\n') | None => {
                            return Err(SpiceToolsError::KernelPool(format!(
                                "Unterminated string starting with {:?}",
                                text
                            )))
                        }
                        Some(other) => text.push(other),
                    }
                }
                tokens.push(Token::Value(PoolValue::Text(text)));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, ',' | '(' | ')' | '=' | '\'') {
                        break;
                    }
                    // `+` only continues a word as the sign of an exponent
                    if c == '+' && !word.is_empty() {
                        let mut ahead = chars.clone();
                        ahead.next();
                        if ahead.peek() == Some(&'=') || !MANTISSA.is_match(&word) {
                            break;
                        }
                    }
                    word.push(c);
                    chars.next();
                }

                let token = if let Some(date) = word.strip_prefix('@') {
                    Token::Value(PoolValue::Date(date.to_string()))
                } else if let Some(n) = parse_number(&word) {
                    Token::Value(PoolValue::Number(n))
                } else {
                    Token::Name(word)
                };
                tokens.push(token);
            }
        }
    }

    Ok(tokens)
}

/// Parse every assignment in the data sections of a text kernel
pub fn parse_text_kernel(text: &str) -> Result<Vec<Assignment>> {
    let tokens = tokenize(&data_sections(text))?;
    let mut iter = tokens.into_iter();
    let mut assignments = Vec::new();

    while let Some(token) = iter.next() {
        let name = match token {
            Token::Name(name) => name,
            other => {
                return Err(SpiceToolsError::KernelPool(format!(
                    "Expected a variable name, found {:?}",
                    other
                )))
            }
        };

        let append = match iter.next() {
            Some(Token::Assign) => false,
            Some(Token::Append) => true,
            other => {
                return Err(SpiceToolsError::KernelPool(format!(
                    "Expected '=' or '+=' after {}, found {:?}",
                    name, other
                )))
            }
        };

        let values = match iter.next() {
            Some(Token::Value(value)) => vec![value],
            Some(Token::Open) => {
                let mut values = Vec::new();
                loop {
                    match iter.next() {
                        Some(Token::Value(value)) => values.push(value),
                        Some(Token::Close) => break,
                        other => {
                            return Err(SpiceToolsError::KernelPool(format!(
                                "Unexpected {:?} in value list of {}",
                                other, name
                            )))
                        }
                    }
                }
                values
            }
            other => {
                return Err(SpiceToolsError::KernelPool(format!(
                    "Missing value for {}, found {:?}",
                    name, other
                )))
            }
        };

        assignments.push(Assignment {
            name,
            values,
            append,
        });
    }

    Ok(assignments)
}

/// Variables loaded from text kernels
#[derive(Debug, Clone, Default)]
pub struct KernelPool {
    variables: HashMap<String, Vec<PoolValue>>,
}

impl KernelPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and load a text kernel from disk
    pub fn load_text<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = fs::read_to_string(path.as_ref())?;
        self.load_str(&text)?;
        debug!("Loaded text kernel {}", path.as_ref().display());
        Ok(())
    }

    /// Load text kernel contents already in memory
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        for assignment in parse_text_kernel(text)? {
            self.insert(assignment);
        }
        Ok(())
    }

    pub fn insert(&mut self, assignment: Assignment) {
        if assignment.append {
            self.variables
                .entry(assignment.name)
                .or_default()
                .extend(assignment.values);
        } else {
            self.variables.insert(assignment.name, assignment.values);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[PoolValue]> {
        self.variables.get(name).map(Vec::as_slice)
    }

    /// Numeric values of a variable; errors if any value is not numeric
    pub fn get_f64s(&self, name: &str) -> Result<Vec<f64>> {
        let values = self.require(name)?;
        values
            .iter()
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    SpiceToolsError::KernelPool(format!("{} holds non-numeric value {:?}", name, v))
                })
            })
            .collect()
    }

    /// The single numeric value of a variable
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.get_f64s(name)?.as_slice() {
            [value] => Ok(*value),
            other => Err(SpiceToolsError::KernelPool(format!(
                "{} holds {} values, expected one",
                name,
                other.len()
            ))),
        }
    }

    /// String values of a variable, with trailing blanks removed
    pub fn get_strings(&self, name: &str) -> Result<Vec<String>> {
        let values = self.require(name)?;
        values
            .iter()
            .map(|v| {
                v.as_str().map(|s| s.trim_end().to_string()).ok_or_else(|| {
                    SpiceToolsError::KernelPool(format!("{} holds non-string value {:?}", name, v))
                })
            })
            .collect()
    }

    /// Fetch `BODY<id>_<item>`, e.g. `bodvrd(399, "RADII")`
    pub fn bodvrd(&self, body: i32, item: &str) -> Result<Vec<f64>> {
        self.get_f64s(&format!("BODY{}_{}", body, item.to_uppercase()))
    }

    pub fn clear(&mut self) {
        self.variables.clear();
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn require(&self, name: &str) -> Result<&[PoolValue]> {
        self.get(name)
            .ok_or_else(|| SpiceToolsError::KernelPool(format!("Variable {} not found", name)))
    }
}
