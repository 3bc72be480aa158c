use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// One timestamped vitals sample from one wristband
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Reading {
    /// Identifier of the wristband that produced the reading
    pub device_id: String,

    /// Heart rate in beats per minute
    pub hr: i32,

    /// Skin temperature in degrees Celsius, 0 when the device sent none
    pub temp: f64,

    /// Blood oxygen saturation in percent
    pub spo2: i32,

    /// Systolic blood pressure estimated at ingestion
    pub bp_sys: i32,

    /// Diastolic blood pressure estimated at ingestion
    pub bp_dia: i32,

    /// Server-assigned storage time
    pub created_at: DateTime<Utc>,
}

/// A reading as submitted by a device, after parsing but before validation.
///
/// Missing or unparseable numbers are carried as zero so that validation can
/// reject them the same way as an explicit zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct IngestRequest {
    /// Device identifier, required
    #[validate(length(min = 1, message = "device id is required"))]
    pub device_id: String,

    /// Heart rate, required and non-zero
    pub hr: i32,

    /// Temperature, optional
    pub temp: f64,

    /// Blood oxygen saturation, required and non-zero
    pub spo2: i32,
}

impl IngestRequest {
    /// Build a request from raw query-string values
    pub fn from_raw(
        device_id: Option<&str>,
        hr: Option<&str>,
        temp: Option<&str>,
        spo2: Option<&str>,
    ) -> Self {
        Self {
            device_id: device_id.unwrap_or_default().to_string(),
            hr: hr.and_then(parse_int_prefix).unwrap_or(0),
            temp: temp.and_then(parse_float_prefix).unwrap_or(0.0),
            spo2: spo2.and_then(parse_int_prefix).unwrap_or(0),
        }
    }
}

/// Parse the leading integer of `value`, ignoring anything after it.
///
/// `" 72bpm"` parses as 72, `"72.9"` as 72, `"0x48"` as 72, `"abc"` as nothing.
/// Values outside the `i32` range are treated as unparseable.
pub fn parse_int_prefix(value: &str) -> Option<i32> {
    let trimmed = value.trim_start();
    let (sign, rest) = split_sign(trimmed);

    let (digits, radix) = match rest.get(..2) {
        Some("0x") | Some("0X") => (&rest[2..], 16),
        _ => (rest, 10),
    };
    let end = digits.find(|c: char| !c.is_digit(radix)).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    i32::from_str_radix(&format!("{}{}", sign, &digits[..end]), radix).ok()
}

/// Parse the leading decimal number of `value`, ignoring anything after it.
pub fn parse_float_prefix(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let (sign, rest) = split_sign(trimmed);

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, c) in rest.char_indices() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }

    format!("{}{}", sign, &rest[..end])
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn split_sign(value: &str) -> (&str, &str) {
    match value.chars().next() {
        Some('-') => ("-", &value[1..]),
        Some('+') => ("", &value[1..]),
        _ => ("", value),
    }
}
