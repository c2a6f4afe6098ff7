//! The densely packed parameter-field payload: a 1-based parameter
//! number followed by 14 `;`-delimited sub-fields, several hex-encoded.

use crate::hex::{DecodeError, TextWidth, decode_hex_text};
use serde::Serialize;

/// Decoded parameter-field record.
///
/// `parm_number` is stored 0-based (`source value - 1`). Negative values
/// are accepted uncorrected; callers must bounds-check before indexing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterField {
    /// 0-based parameter index.
    pub parm_number: i32,
    /// Current value text.
    pub current_value: String,
    /// Whether a current value was supplied.
    pub current_value_set: bool,
    /// Default value text.
    pub default_value: String,
    /// Whether a default value was supplied.
    pub default_value_set: bool,
    /// Parameter direction code.
    pub direction: i32,
    /// Edit mask text.
    pub edit_mask: String,
    /// Whether the value range is limited.
    pub is_limited: bool,
    /// Upper size bound.
    pub max_size: f64,
    /// Lower size bound.
    pub min_size: f64,
    /// Parameter name.
    pub name: String,
    /// Whether the parameter prompts for a current value.
    pub needs_current_value: bool,
    /// Prompt text.
    pub prompt: String,
    /// Owning report name.
    pub report_name: String,
}

impl ParameterField {
    /// Decode the two-field payload `<number>,<sub1;...;sub14>`.
    ///
    /// Fewer than two fields, or fewer than 14 sub-fields, is not an
    /// error: the record simply keeps its defaults (the parameter number
    /// survives in the second case). A sub-field that fails to decode is
    /// an error; partial records are never returned.
    pub fn decode(fields: &[String]) -> Result<Self, DecodeError> {
        let mut record = Self::default();
        if fields.len() < 2 {
            return Ok(record);
        }
        record.parm_number = parse_i32(&fields[0])? - 1;

        let subs: Vec<&str> = fields[1].split(';').collect();
        if subs.len() < 14 {
            return Ok(record);
        }
        record.current_value = decode_hex_text(subs[0], TextWidth::DoubleByte)?;
        record.current_value_set = parse_i32(subs[1])? > 0;
        record.default_value = decode_hex_text(subs[2], TextWidth::DoubleByte)?;
        record.default_value_set = parse_i32(subs[3])? > 0;
        record.direction = parse_i32(subs[4])?;
        record.edit_mask = decode_hex_text(subs[5], TextWidth::DoubleByte)?;
        record.is_limited = parse_i32(subs[6])? > 0;
        record.max_size = parse_f64(subs[7])?;
        record.min_size = parse_f64(subs[8])?;
        record.name = decode_hex_text(subs[9], TextWidth::DoubleByte)?;
        record.needs_current_value = parse_i32(subs[10])? > 0;
        record.prompt = decode_hex_text(subs[11], TextWidth::DoubleByte)?;
        record.report_name = decode_hex_text(subs[12], TextWidth::DoubleByte)?;
        // subs[13] is reserved padding in the source format.
        Ok(record)
    }
}

fn parse_i32(s: &str) -> Result<i32, DecodeError> {
    s.trim().parse().map_err(|_| DecodeError::BadNumber {
        value: s.to_owned(),
    })
}

fn parse_f64(s: &str) -> Result<f64, DecodeError> {
    s.trim().parse().map_err(|_| DecodeError::BadNumber {
        value: s.to_owned(),
    })
}
