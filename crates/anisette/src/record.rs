//! Anisette credential record
//!
//! A provider answers with a flat JSON object of ten header values. The record
//! is built all-or-nothing from that object: one missing or malformed field
//! rejects the whole response.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use common::Secret;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

use crate::constants::*;
use crate::error::{Error, Result};

/// Parsed anisette data, ready to be attached to vendor API requests.
///
/// The machine id and one-time password are wrapped in [`Secret`] so the
/// record can be logged with `{:?}` without leaking them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    machine_id: Secret<String>,
    one_time_password: Secret<String>,
    local_user_id: String,
    routing_info: i64,
    device_unique_id: String,
    device_serial_number: String,
    device_description: String,
    client_time: DateTime<Utc>,
    locale: String,
    time_zone: String,
}

impl CredentialRecord {
    /// Build a record from a provider's JSON document.
    pub fn from_document(document: &Value) -> Result<Self> {
        let object = document.as_object().ok_or_else(|| {
            Error::Parse(format!(
                "anisette response is not a JSON object: {}",
                json_type(document)
            ))
        })?;

        // Presence and type of every field is checked before any value is
        // interpreted, so a missing key wins over a malformed one.
        let field = |key| string_field(object, key);
        let machine_id = field(MACHINE_ID_KEY)?;
        let one_time_password = field(ONE_TIME_PASSWORD_KEY)?;
        let local_user_id = field(LOCAL_USER_ID_KEY)?;
        let routing_info = field(ROUTING_INFO_KEY)?;
        let device_unique_id = field(DEVICE_UNIQUE_ID_KEY)?;
        let device_serial_number = field(DEVICE_SERIAL_NUMBER_KEY)?;
        let device_description = field(DEVICE_DESCRIPTION_KEY)?;
        let client_time = field(CLIENT_TIME_KEY)?;
        let locale = field(LOCALE_KEY)?;
        let time_zone = field(TIME_ZONE_KEY)?;

        Ok(Self {
            machine_id: Secret::new(machine_id.to_string()),
            one_time_password: Secret::new(one_time_password.to_string()),
            local_user_id: local_user_id.to_string(),
            routing_info: parse_leading_int(routing_info),
            device_unique_id: device_unique_id.to_string(),
            device_serial_number: device_serial_number.to_string(),
            device_description: device_description.to_string(),
            client_time: parse_client_time(client_time)?,
            locale: locale.to_string(),
            time_zone: time_zone.to_string(),
        })
    }

    pub fn machine_id(&self) -> &str {
        self.machine_id.expose()
    }

    pub fn one_time_password(&self) -> &str {
        self.one_time_password.expose()
    }

    pub fn local_user_id(&self) -> &str {
        &self.local_user_id
    }

    pub fn routing_info(&self) -> i64 {
        self.routing_info
    }

    pub fn device_unique_id(&self) -> &str {
        &self.device_unique_id
    }

    pub fn device_serial_number(&self) -> &str {
        &self.device_serial_number
    }

    pub fn device_description(&self) -> &str {
        &self.device_description
    }

    pub fn client_time(&self) -> DateTime<Utc> {
        self.client_time
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    /// The ten header name/value pairs, in the order providers emit them.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (MACHINE_ID_KEY, self.machine_id().to_string()),
            (ONE_TIME_PASSWORD_KEY, self.one_time_password().to_string()),
            (LOCAL_USER_ID_KEY, self.local_user_id.clone()),
            (ROUTING_INFO_KEY, self.routing_info.to_string()),
            (DEVICE_UNIQUE_ID_KEY, self.device_unique_id.clone()),
            (DEVICE_SERIAL_NUMBER_KEY, self.device_serial_number.clone()),
            (DEVICE_DESCRIPTION_KEY, self.device_description.clone()),
            (
                CLIENT_TIME_KEY,
                self.client_time.format(CLIENT_TIME_FORMAT).to_string(),
            ),
            (LOCALE_KEY, self.locale.clone()),
            (TIME_ZONE_KEY, self.time_zone.clone()),
        ]
    }

    /// Insert every anisette header, replacing existing values.
    pub fn apply_to(&self, headers: &mut HeaderMap) -> Result<()> {
        for (name, value) in self.headers() {
            let invalid = |reason: String| Error::InvalidField {
                field: name,
                reason,
            };
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| invalid(format!("not a valid header name: {e}")))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|e| invalid(format!("not a valid header value: {e}")))?;
            headers.insert(header_name, header_value);
        }
        Ok(())
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SSZ` as UTC with whole-second precision.
///
/// Every field must be zero-padded to its full width. Leap seconds are
/// rejected.
pub fn parse_client_time(raw: &str) -> Result<DateTime<Utc>> {
    let malformed = || Error::MalformedTimestamp(raw.to_string());

    if !has_client_time_shape(raw.as_bytes()) {
        return Err(malformed());
    }

    let naive =
        NaiveDateTime::parse_from_str(raw, CLIENT_TIME_FORMAT).map_err(|_| malformed())?;
    if naive.nanosecond() != 0 {
        return Err(malformed());
    }
    Ok(naive.and_utc())
}

/// `DDDD-DD-DDTDD:DD:DDZ`, where `D` is an ASCII digit.
fn has_client_time_shape(raw: &[u8]) -> bool {
    const SHAPE: &[u8; 20] = b"dddd-dd-ddTdd:dd:ddZ";
    raw.len() == SHAPE.len()
        && raw.iter().zip(SHAPE).all(|(&b, &expected)| match expected {
            b'd' => b.is_ascii_digit(),
            _ => b == expected,
        })
}

/// C `atoi` semantics: optional leading whitespace and sign, then digits up to
/// the first non-digit. No digits yields 0; overflow saturates.
pub fn parse_leading_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

fn string_field<'a>(object: &'a Map<String, Value>, key: &'static str) -> Result<&'a str> {
    match object.get(key) {
        None => Err(Error::MissingField(key)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(other) => Err(Error::InvalidField {
            field: key,
            reason: format!("expected string, got {}", json_type(other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
