//! JPL Small-Body Database query API client
//!
//! <https://ssd-api.jpl.nasa.gov/doc/sbdb_query.html>

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::query::Table;
use crate::{Result, SpiceToolsError};

/// Orbit classes valid for asteroids
pub const ASTEROID_CLASSES: [&str; 14] = [
    "IEO", "ATE", "APO", "AMO", "MCA", "IMB", "MBA", "OMB", "TJN", "AST", "CEN", "TNO", "PAA",
    "HYA",
];

/// Orbit classes valid for comets
pub const COMET_CLASSES: [&str; 8] = ["JFc", "JFC", "HTC", "ETc", "CTc", "COM", "PAR", "HYP"];

/// `sb-kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbKind {
    Asteroid,
    Comet,
}

impl SbKind {
    fn code(self) -> &'static str {
        match self {
            SbKind::Asteroid => "a",
            SbKind::Comet => "c",
        }
    }
}

/// `sb-ns`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    Numbered,
    Unnumbered,
}

impl Numbering {
    fn code(self) -> &'static str {
        match self {
            Numbering::Numbered => "n",
            Numbering::Unnumbered => "u",
        }
    }
}

/// `sb-group`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbGroup {
    Neo,
    Pha,
}

impl SbGroup {
    fn code(self) -> &'static str {
        match self {
            SbGroup::Neo => "neo",
            SbGroup::Pha => "pha",
        }
    }
}

impl fmt::Display for SbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SbKind {
    type Err = SpiceToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "a" | "asteroid" => Ok(SbKind::Asteroid),
            "c" | "comet" => Ok(SbKind::Comet),
            _ => Err(invalid(format!("sb-kind must be 'a' or 'c', got {:?}", s))),
        }
    }
}

impl FromStr for Numbering {
    type Err = SpiceToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "n" | "numbered" => Ok(Numbering::Numbered),
            "u" | "unnumbered" => Ok(Numbering::Unnumbered),
            _ => Err(invalid(format!("sb-ns must be 'n' or 'u', got {:?}", s))),
        }
    }
}

impl FromStr for SbGroup {
    type Err = SpiceToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "neo" => Ok(SbGroup::Neo),
            "pha" => Ok(SbGroup::Pha),
            _ => Err(invalid(format!("sb-group must be 'neo' or 'pha', got {:?}", s))),
        }
    }
}

fn invalid(message: String) -> SpiceToolsError {
    SpiceToolsError::InvalidParameter(message)
}

fn flag(value: bool) -> String {
    let text = if value { "1" } else { "0" };
    text.to_string()
}

/// Builder for a `sbdb_query.api` request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SbdbQuery {
    fields: Vec<String>,
    kind: Option<SbKind>,
    numbering: Option<Numbering>,
    group: Option<SbGroup>,
    classes: Vec<String>,
    satellites: Option<bool>,
    exclude_fragments: bool,
    constraint: Option<String>,
    limit: Option<u64>,
    limit_from: Option<u64>,
    full_precision: bool,
}

impl SbdbQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output fields such as `spkid`, `full_name`, `a`, `e`, `H`
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn kind(mut self, kind: SbKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn numbering(mut self, numbering: Numbering) -> Self {
        self.numbering = Some(numbering);
        self
    }

    pub fn group(mut self, group: SbGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Orbit class codes, e.g. `["APO", "ATE"]`
    pub fn classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    /// Restrict to objects with (`true`) or without (`false`) known satellites
    pub fn satellites(mut self, with_satellites: bool) -> Self {
        self.satellites = Some(with_satellites);
        self
    }

    pub fn exclude_fragments(mut self, exclude: bool) -> Self {
        self.exclude_fragments = exclude;
        self
    }

    /// Custom constraint in the API's JSON form, e.g. `{"AND":["q|LT|1.3"]}`
    pub fn constraint(mut self, cdata: impl Into<String>) -> Self {
        self.constraint = Some(cdata.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` matches; requires a limit
    pub fn limit_from(mut self, offset: u64) -> Self {
        self.limit_from = Some(offset);
        self
    }

    pub fn full_precision(mut self, full: bool) -> Self {
        self.full_precision = full;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.fields.iter().any(|f| f.trim().is_empty() || f.contains(',')) {
            return Err(invalid(format!("Invalid field list {:?}", self.fields)));
        }
        for class in &self.classes {
            let asteroid = ASTEROID_CLASSES.contains(&class.as_str());
            let comet = COMET_CLASSES.contains(&class.as_str());
            let valid = match self.kind {
                Some(SbKind::Asteroid) => asteroid,
                Some(SbKind::Comet) => comet,
                None => asteroid || comet,
            };
            if !valid {
                let kind = self
                    .kind
                    .map(|k| format!(" for sb-kind={}", k))
                    .unwrap_or_default();
                return Err(invalid(format!("Unknown orbit class {:?}{}", class, kind)));
            }
        }
        if let Some(cdata) = &self.constraint {
            match serde_json::from_str::<Value>(cdata) {
                Ok(Value::Object(_)) => {}
                _ => return Err(invalid(format!("sb-cdata must be a JSON object, got {:?}", cdata))),
            }
        }
        match (self.limit, self.limit_from) {
            (Some(0), _) => return Err(invalid("limit must be greater than zero".to_string())),
            (None, Some(_)) => return Err(invalid("limit-from requires limit".to_string())),
            _ => {}
        }
        Ok(())
    }

    /// Validated request parameters in a stable order
    pub fn params(&self) -> Result<Vec<(String, String)>> {
        self.validate()?;
        let mut params: Vec<(&str, String)> = Vec::new();

        if !self.fields.is_empty() {
            params.push(("fields", self.fields.join(",")));
        }
        if let Some(kind) = self.kind {
            params.push(("sb-kind", kind.code().to_string()));
        }
        if let Some(numbering) = self.numbering {
            params.push(("sb-ns", numbering.code().to_string()));
        }
        if let Some(group) = self.group {
            params.push(("sb-group", group.code().to_string()));
        }
        if !self.classes.is_empty() {
            params.push(("sb-class", self.classes.join(",")));
        }
        if let Some(sat) = self.satellites {
            params.push(("sb-sat", flag(sat)));
        }
        if self.exclude_fragments {
            params.push(("sb-xfrag", flag(true)));
        }
        if let Some(cdata) = &self.constraint {
            params.push(("sb-cdata", cdata.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.limit_from {
            params.push(("limit-from", offset.to_string()));
        }
        if self.full_precision {
            params.push(("full-prec", flag(true)));
        }

        Ok(params
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect())
    }

    /// Run the query with the configuration from [`Config::load`]
    pub fn fetch(&self) -> Result<Table> {
        self.fetch_with(&Config::load()?)
    }

    pub fn fetch_with(&self, config: &Config) -> Result<Table> {
        let params = self.params()?;
        info!("Querying {} with {} parameters", config.sbdb_url, params.len());
        debug!("SBDB parameters: {:?}", params);

        let response = config
            .http_client()?
            .get(&config.sbdb_url)
            .query(&params)
            .send()?;
        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(SpiceToolsError::ServiceError(format!(
                "SBDB query failed with status {}: {}",
                status,
                service_message(&text)
            )));
        }
        parse_response(&text)
    }
}

#[derive(Debug, Deserialize)]
struct SbdbResponse {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
    #[serde(default)]
    count: Option<Value>,
}

fn service_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.chars().take(200).collect())
}

fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Shape an SBDB JSON response into a table
pub fn parse_response(text: &str) -> Result<Table> {
    let response: SbdbResponse = serde_json::from_str(text)?;
    let mut table = Table::new(response.fields);
    for row in &response.data {
        table.push_row(row.iter().map(cell).collect())?;
    }

    let count = response.count.as_ref().and_then(|c| match c {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });
    debug!("SBDB returned {} rows (count={:?})", table.len(), count);
    Ok(table)
}
