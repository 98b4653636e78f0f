//! JPL Horizons API client
//!
//! <https://ssd-api.jpl.nasa.gov/doc/horizons.html>
//!
//! Requests always ask for CSV output so the ephemeris block between
//! `$$SOE` and `$$EOE` can be read as a table. The column header is the
//! line directly above the row of asterisks that precedes `$$SOE`.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;

use crate::config::Config;
use crate::query::Table;
use crate::{Result, SpiceToolsError};

lazy_static! {
    static ref TABLE_BLOCK: Regex =
        Regex::new(r"(?ms)^([^\n]*)\n\*{3,}[^\n]*\n\$\$SOE[^\n]*\n(.*?)^\$\$EOE")
            .expect("valid Horizons table regex");
}

/// `EPHEM_TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EphemType {
    Vectors,
    Observer,
    Elements,
}

impl EphemType {
    pub fn as_str(self) -> &'static str {
        match self {
            EphemType::Vectors => "VECTORS",
            EphemType::Observer => "OBSERVER",
            EphemType::Elements => "ELEMENTS",
        }
    }
}

impl fmt::Display for EphemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EphemType {
    type Err = SpiceToolsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "VECTORS" | "V" => Ok(EphemType::Vectors),
            "OBSERVER" | "O" => Ok(EphemType::Observer),
            "ELEMENTS" | "E" => Ok(EphemType::Elements),
            _ => Err(SpiceToolsError::InvalidParameter(format!(
                "EPHEM_TYPE must be VECTORS, OBSERVER or ELEMENTS, got {:?}",
                s
            ))),
        }
    }
}

/// Builder for a `horizons.api` request
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonsQuery {
    command: String,
    ephem_type: EphemType,
    center: Option<String>,
    start_time: Option<String>,
    stop_time: Option<String>,
    step_size: Option<String>,
    tlist: Vec<String>,
    quantities: Option<String>,
    ref_plane: Option<String>,
    ref_system: Option<String>,
    out_units: Option<String>,
    vec_table: Option<String>,
    vec_corr: Option<String>,
}

impl HorizonsQuery {
    /// Query for `command`, e.g. `"399"`, `"DES=2003200;"`, `"Ceres;"`
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ephem_type: EphemType::Vectors,
            center: None,
            start_time: None,
            stop_time: None,
            step_size: None,
            tlist: Vec::new(),
            quantities: None,
            ref_plane: None,
            ref_system: None,
            out_units: None,
            vec_table: None,
            vec_corr: None,
        }
    }

    pub fn ephem_type(mut self, ephem_type: EphemType) -> Self {
        self.ephem_type = ephem_type;
        self
    }

    /// Coordinate center, e.g. `"500@10"` or `"@ssb"`
    pub fn center(mut self, center: impl Into<String>) -> Self {
        self.center = Some(center.into());
        self
    }

    pub fn start_time(mut self, start: impl Into<String>) -> Self {
        self.start_time = Some(start.into());
        self
    }

    pub fn stop_time(mut self, stop: impl Into<String>) -> Self {
        self.stop_time = Some(stop.into());
        self
    }

    /// Step such as `"1 d"` or `"10m"`
    pub fn step_size(mut self, step: impl Into<String>) -> Self {
        self.step_size = Some(step.into());
        self
    }

    /// Discrete epochs instead of a start/stop range
    pub fn tlist<I, S>(mut self, times: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tlist.extend(times.into_iter().map(Into::into));
        self
    }

    /// Observer table quantity codes, e.g. `"1,9,20,23,24"`
    pub fn quantities(mut self, quantities: impl Into<String>) -> Self {
        self.quantities = Some(quantities.into());
        self
    }

    /// `ECLIPTIC`, `FRAME` or `BODY EQUATOR`
    pub fn ref_plane(mut self, plane: impl Into<String>) -> Self {
        self.ref_plane = Some(plane.into());
        self
    }

    pub fn ref_system(mut self, system: impl Into<String>) -> Self {
        self.ref_system = Some(system.into());
        self
    }

    /// `KM-S`, `AU-D` or `KM-D`
    pub fn out_units(mut self, units: impl Into<String>) -> Self {
        self.out_units = Some(units.into());
        self
    }

    pub fn vec_table(mut self, table: impl Into<String>) -> Self {
        self.vec_table = Some(table.into());
        self
    }

    /// `NONE`, `LT` or `LT+S`
    pub fn vec_corr(mut self, corr: impl Into<String>) -> Self {
        self.vec_corr = Some(corr.into());
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(SpiceToolsError::InvalidParameter(message.to_string()));
        if self.command.trim().is_empty() {
            return invalid("COMMAND must not be empty");
        }
        match (&self.start_time, &self.stop_time) {
            (Some(_), None) => return invalid("START_TIME requires STOP_TIME"),
            (None, Some(_)) => return invalid("STOP_TIME requires START_TIME"),
            _ => {}
        }
        if !self.tlist.is_empty() && (self.start_time.is_some() || self.step_size.is_some()) {
            return invalid("TLIST cannot be combined with START_TIME/STOP_TIME/STEP_SIZE");
        }
        if let Some(step) = &self.step_size {
            if step.trim().is_empty() {
                return invalid("STEP_SIZE must not be empty");
            }
        }
        let all: [Option<&String>; 11] = [
            Some(&self.command),
            self.center.as_ref(),
            self.start_time.as_ref(),
            self.stop_time.as_ref(),
            self.step_size.as_ref(),
            self.quantities.as_ref(),
            self.ref_plane.as_ref(),
            self.ref_system.as_ref(),
            self.out_units.as_ref(),
            self.vec_table.as_ref(),
            self.vec_corr.as_ref(),
        ];
        if all
            .into_iter()
            .flatten()
            .chain(self.tlist.iter())
            .any(|v| v.contains('\''))
        {
            return invalid("Horizons parameter values cannot contain single quotes");
        }
        Ok(())
    }

    /// Validated request parameters; values are single-quoted for the API
    pub fn params(&self) -> Result<Vec<(String, String)>> {
        self.validate()?;
        let quote = |v: &str| format!("'{}'", v);
        let mut params = vec![
            ("format".to_string(), "json".to_string()),
            ("COMMAND".to_string(), quote(&self.command)),
            ("OBJ_DATA".to_string(), quote("NO")),
            ("MAKE_EPHEM".to_string(), quote("YES")),
            ("EPHEM_TYPE".to_string(), quote(self.ephem_type.as_str())),
        ];
        let optional = [
            ("CENTER", &self.center),
            ("START_TIME", &self.start_time),
            ("STOP_TIME", &self.stop_time),
            ("STEP_SIZE", &self.step_size),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push((key.to_string(), quote(value)));
            }
        }
        if !self.tlist.is_empty() {
            params.push(("TLIST".to_string(), quote(&self.tlist.join(" "))));
        }
        let optional = [
            ("QUANTITIES", &self.quantities),
            ("REF_PLANE", &self.ref_plane),
            ("REF_SYSTEM", &self.ref_system),
            ("OUT_UNITS", &self.out_units),
            ("VEC_TABLE", &self.vec_table),
            ("VEC_CORR", &self.vec_corr),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.push((key.to_string(), quote(value)));
            }
        }
        params.push(("CSV_FORMAT".to_string(), quote("YES")));
        Ok(params)
    }

    /// Run the query and return the `result` text
    pub fn fetch_text(&self) -> Result<String> {
        self.fetch_text_with(&Config::load()?)
    }

    pub fn fetch_text_with(&self, config: &Config) -> Result<String> {
        let params = self.params()?;
        info!("Querying {} for COMMAND={}", config.horizons_url, self.command);
        debug!("Horizons parameters: {:?}", params);

        let response = config
            .http_client()?
            .get(&config.horizons_url)
            .query(&params)
            .send()?;
        let status = response.status();
        let text = response.text()?;
        match parse_result_json(&text) {
            Err(SpiceToolsError::Json(_)) if !status.is_success() => Err(SpiceToolsError::ServiceError(
                format!("Horizons request failed with status {}", status),
            )),
            other => other,
        }
    }

    /// Run the query and parse the ephemeris block into a table
    pub fn fetch(&self) -> Result<Table> {
        self.fetch_with(&Config::load()?)
    }

    pub fn fetch_with(&self, config: &Config) -> Result<Table> {
        parse_table(&self.fetch_text_with(config)?)
    }
}

#[derive(Debug, Deserialize)]
struct HorizonsResponse {
    result: Option<String>,
    error: Option<String>,
}

/// Extract `result` from an API response, turning `error` into an error
pub fn parse_result_json(text: &str) -> Result<String> {
    let response: HorizonsResponse = serde_json::from_str(text)?;
    match (response.error, response.result) {
        (Some(error), _) => Err(SpiceToolsError::ServiceError(error)),
        (None, Some(result)) => Ok(result),
        (None, None) => Err(SpiceToolsError::ServiceError(
            "Horizons response holds neither result nor error".to_string(),
        )),
    }
}

fn csv_fields(line: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

/// Parse the CSV ephemeris block of a Horizons result into a table
///
/// Rows end with a trailing comma, so the empty last field is dropped from
/// both the header and the rows. `n.a.` and empty cells become `None`.
pub fn parse_table(result: &str) -> Result<Table> {
    let normalized = result.replace("\r\n", "\n");
    let captures = TABLE_BLOCK.captures(&normalized).ok_or_else(|| {
        let summary: String = normalized
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(5)
            .collect::<Vec<_>>()
            .join(" / ");
        SpiceToolsError::ServiceError(format!("No $$SOE/$$EOE table in Horizons result: {}", summary))
    })?;

    let mut columns = csv_fields(&captures[1])?;
    while columns.last().is_some_and(|c| c.is_empty()) {
        columns.pop();
    }
    let mut table = Table::new(columns);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(captures[2].as_bytes());
    for record in reader.records() {
        let record = record?;
        let mut cells: Vec<Option<String>> = record
            .iter()
            .map(|cell| match cell {
                "" | "n.a." => None,
                text => Some(text.to_string()),
            })
            .collect();
        while cells.len() > table.columns.len() && cells.last().is_some_and(Option::is_none) {
            cells.pop();
        }
        cells.resize(table.columns.len().max(cells.len()), None);
        table.push_row(cells)?;
    }

    debug!(
        "Parsed Horizons table: {} columns, {} rows",
        table.columns.len(),
        table.len()
    );
    Ok(table)
}
