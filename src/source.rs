use std::future::Future;
use std::time;

use failure;
use failure::Fail;
use reqwest;
use serde_json;
use slog;

use crate::config;
use crate::model::{Factor, Reading};

/// The raw record stored under a factor's key: `{ value, min, max }`.
///
/// `value` is kept as stored since the database does not enforce a type for
/// it; use [`Record::reading`] to get a number out.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub value: Option<serde_json::Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Fail)]
pub enum SourceError {
    #[fail(display = "reading {} failed with HTTP {}: {}", factor, status, body)]
    Status {
        factor: Factor,
        status: u16,
        body: String,
    },
    #[fail(display = "no database URL configured")]
    MissingUrl,
}

/// Something the poller can fetch factor records from.
pub trait RecordSource {
    /// `Ok(None)` means nothing is stored for this factor right now.
    fn fetch(
        &self,
        factor: Factor,
    ) -> impl Future<Output = Result<Option<Record>, failure::Error>> + Send;
}

/// Realtime database reachable over its REST interface, where each factor's
/// record lives at `{url}/{factor}.json`.
pub struct RealtimeDb {
    log: slog::Logger,
    client: reqwest::Client,
    url: String,
    auth: Option<String>,
}

impl RealtimeDb {
    pub fn connect(log: slog::Logger, database: &config::Database) -> Result<Self, failure::Error> {
        if database.url.is_empty() {
            return Err(SourceError::MissingUrl.into());
        }

        let client = reqwest::Client::builder()
            .timeout(time::Duration::from_secs(database.timeout_secs))
            .build()?;

        debug!(log, "configured realtime database"; "url" => &database.url);

        Ok(RealtimeDb {
            log,
            client,
            url: database.url.clone(),
            auth: database.auth.clone(),
        })
    }
}

impl RecordSource for RealtimeDb {
    async fn fetch(&self, factor: Factor) -> Result<Option<Record>, failure::Error> {
        let mut request = self.client.get(&record_url(&self.url, factor));
        if let Some(ref auth) = self.auth {
            request = request.query(&[("auth", auth)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                factor,
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body = response.json::<serde_json::Value>().await?;
        trace!(self.log, "fetched record"; "factor" => %factor, "body" => %body);
        Ok(Record::from_json(&self.log, factor, body))
    }
}

impl Record {
    /// Interprets a fetched body. Falsy bodies (`null`, `false`, `0`, `""`)
    /// mean there is no record. Any other non-object body still counts as a
    /// record, just one without a value.
    pub fn from_json(log: &slog::Logger, factor: Factor, body: serde_json::Value) -> Option<Self> {
        match body {
            serde_json::Value::Object(mut fields) => {
                // Bounds are only shown, never coerced; non-numbers are dropped.
                let bound = |v: Option<serde_json::Value>| v.and_then(|v| v.as_f64());
                let min = bound(fields.remove("min"));
                let max = bound(fields.remove("max"));
                Some(Record {
                    value: fields.remove("value"),
                    min,
                    max,
                })
            }
            ref body if is_falsy(body) => {
                debug!(log, "no record stored"; "factor" => %factor, "body" => %body);
                None
            }
            other => {
                warn!(log, "record is not an object, reading it as NaN"; "factor" => %factor, "body" => %other);
                Some(Record {
                    value: None,
                    min: None,
                    max: None,
                })
            }
        }
    }

    pub fn reading(&self, factor: Factor) -> Reading {
        Reading::new(factor, to_number(self.value.as_ref()))
    }
}

fn is_falsy(body: &serde_json::Value) -> bool {
    match body {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !*b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
    }
}

pub fn record_url(base: &str, factor: Factor) -> String {
    format!("{}/{}.json", base.trim_end_matches('/'), factor.name())
}

/// Numeric coercion with the same results as JavaScript's `Number()` for
/// the JSON shapes a record can hold. An absent value is NaN, `null` is 0.
pub fn to_number(value: Option<&serde_json::Value>) -> f64 {
    match value {
        None => std::f64::NAN,
        Some(serde_json::Value::Null) => 0.0,
        Some(serde_json::Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(std::f64::NAN),
        Some(serde_json::Value::String(s)) => parse_number(s),
        // Arrays go through their string form: `[]` is "", `[7]` is "7" and
        // anything longer has a comma in it.
        Some(serde_json::Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [item] => match item {
                serde_json::Value::Bool(_) | serde_json::Value::Object(_) => std::f64::NAN,
                item => to_number(Some(item)),
            },
            _ => std::f64::NAN,
        },
        Some(serde_json::Value::Object(_)) => std::f64::NAN,
    }
}

fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    match text {
        "Infinity" | "+Infinity" => return std::f64::INFINITY,
        "-Infinity" => return std::f64::NEG_INFINITY,
        _ => {}
    }

    for &(prefix, radix) in &[("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            if digits.is_empty() || digits.starts_with('+') {
                return std::f64::NAN;
            }
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(std::f64::NAN);
        }
    }

    // Rust also accepts "inf" and "nan" spellings, which Number() does not.
    if text
        .chars()
        .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return std::f64::NAN;
    }

    text.parse().unwrap_or(std::f64::NAN)
}
