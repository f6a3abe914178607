//! Attribute writes and method invocations.
//!
//! Each typed write wraps the value in the matching [`TypedValue`] and sends
//! a single SET; method calls send a single ACTION. A non-success result
//! from the meter is reported as [`Error::Rejected`].

use crate::codec::Codec;
use crate::data::{DateTime, TypedValue};
use crate::error::{Error, Result};
use crate::session::{CLOCK_CLASS_ID, CLOCK_LOGICAL_NAME, MeterSession};
use crate::transport::Connector;

/// Clock method that takes the new time as an octet-string date-time.
pub const SET_CLOCK_METHOD: i8 = 7;

fn date_time(timestamp: i64) -> Result<DateTime> {
    DateTime::from_unix(timestamp)
        .ok_or_else(|| Error::invalid_config(format!("timestamp {} cannot be represented as a date-time", timestamp)))
}

impl<C: Connector, K: Codec> MeterSession<C, K> {
    /// Writes `value` to attribute `attribute` of object `obis`.
    pub fn write(&mut self, obis: &str, class_id: u16, attribute: i8, value: TypedValue) -> Result<()> {
        let obis = self.resolve(obis)?;
        log::debug!("write {} class {} attribute {}: {:?}", obis, class_id, attribute, value);
        self.exchange(|codec| codec.write_request(class_id, &obis, attribute, &value))?;
        Ok(())
    }

    pub fn write_bool(&mut self, obis: &str, class_id: u16, attribute: i8, value: bool) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::Boolean(value))
    }

    pub fn write_i8(&mut self, obis: &str, class_id: u16, attribute: i8, value: i8) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::Integer(value))
    }

    pub fn write_i16(&mut self, obis: &str, class_id: u16, attribute: i8, value: i16) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::Long(value))
    }

    pub fn write_i32(&mut self, obis: &str, class_id: u16, attribute: i8, value: i32) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::DoubleLong(value))
    }

    pub fn write_u8(&mut self, obis: &str, class_id: u16, attribute: i8, value: u8) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::Unsigned(value))
    }

    pub fn write_u16(&mut self, obis: &str, class_id: u16, attribute: i8, value: u16) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::LongUnsigned(value))
    }

    pub fn write_u32(&mut self, obis: &str, class_id: u16, attribute: i8, value: u32) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::DoubleLongUnsigned(value))
    }

    pub fn write_f32(&mut self, obis: &str, class_id: u16, attribute: i8, value: f32) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::Float32(value))
    }

    pub fn write_f64(&mut self, obis: &str, class_id: u16, attribute: i8, value: f64) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::Float64(value))
    }

    /// Writes the text bytes as an octet string.
    pub fn write_string(&mut self, obis: &str, class_id: u16, attribute: i8, value: &str) -> Result<()> {
        self.write(obis, class_id, attribute, TypedValue::OctetString(value.as_bytes().to_vec()))
    }

    /// Writes a Unix timestamp (seconds, UTC) as a COSEM date-time.
    pub fn write_datetime(&mut self, obis: &str, class_id: u16, attribute: i8, timestamp: i64) -> Result<()> {
        let date_time = date_time(timestamp)?;
        self.write(obis, class_id, attribute, TypedValue::DateTime(Some(date_time)))
    }

    pub fn write_octet_string(&mut self, obis: &str, class_id: u16, attribute: i8, value: &[u8]) -> Result<()> {
        if value.is_empty() {
            return Err(Error::invalid_config("octet string must not be empty"));
        }
        self.write(obis, class_id, attribute, TypedValue::OctetString(value.to_vec()))
    }

    /// Invokes method `method` of object `obis` without parameters.
    pub fn call_method(&mut self, obis: &str, class_id: u16, method: i8) -> Result<()> {
        let obis = self.resolve(obis)?;
        log::debug!("call {} class {} method {}", obis, class_id, method);
        self.exchange(|codec| codec.method_request(class_id, &obis, method, None))?;
        Ok(())
    }

    /// Invokes method `method` with `data` as an octet-string parameter. An
    /// empty `data` sends no parameter.
    pub fn call_method_with_data(&mut self, obis: &str, class_id: u16, method: i8, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return self.call_method(obis, class_id, method);
        }
        let obis = self.resolve(obis)?;
        log::debug!("call {} class {} method {} with {} bytes", obis, class_id, method, data.len());
        let parameters = TypedValue::OctetString(data.to_vec());
        self.exchange(|codec| codec.method_request(class_id, &obis, method, Some(&parameters)))?;
        Ok(())
    }

    /// Sets the meter clock to a Unix timestamp (seconds, UTC).
    pub fn set_clock(&mut self, timestamp: i64) -> Result<()> {
        self.ensure_connected()?;
        let parameters = TypedValue::OctetString(date_time(timestamp)?.to_bytes());
        log::debug!("set clock to {}", timestamp);
        self.exchange(|codec| {
            codec.method_request(CLOCK_CLASS_ID, &CLOCK_LOGICAL_NAME, SET_CLOCK_METHOD, Some(&parameters))
        })?;
        Ok(())
    }
}
