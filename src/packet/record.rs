use thiserror::Error;

/// Encoded size of a [`SensorRecord`]: `2 + 8 + 4 + 4 + 4`.
pub const RECORD_LEN: usize = 22;

const SENSOR_ID_OFFSET: usize = 0;
const TIMESTAMP_OFFSET: usize = 2;
const TEMPERATURE_OFFSET: usize = 10;
const PRESSURE_OFFSET: usize = 14;
const HUMIDITY_OFFSET: usize = 18;

/// One telemetry sample as it travels on the wire.
///
/// All fields are little-endian and packed without padding. No field is range
/// checked, so implausible readings (negative humidity, NaN temperature, ...)
/// encode as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRecord {
    pub sensor_id: i16,

    /// Seconds since the Unix epoch.
    pub timestamp: i64,

    pub temperature: f32,

    pub pressure: f32,

    pub humidity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed record length: expected {expected} bytes, got {actual}")]
    MalformedLength { expected: usize, actual: usize },
}

impl SensorRecord {
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[SENSOR_ID_OFFSET..TIMESTAMP_OFFSET].copy_from_slice(&self.sensor_id.to_le_bytes());
        buf[TIMESTAMP_OFFSET..TEMPERATURE_OFFSET].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[TEMPERATURE_OFFSET..PRESSURE_OFFSET].copy_from_slice(&self.temperature.to_le_bytes());
        buf[PRESSURE_OFFSET..HUMIDITY_OFFSET].copy_from_slice(&self.pressure.to_le_bytes());
        buf[HUMIDITY_OFFSET..RECORD_LEN].copy_from_slice(&self.humidity.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let Ok(buf) = <&[u8; RECORD_LEN]>::try_from(bytes) else {
            return Err(DecodeError::MalformedLength {
                expected: RECORD_LEN,
                actual: bytes.len(),
            });
        };

        Ok(Self::decode_array(buf))
    }

    pub fn decode_array(buf: &[u8; RECORD_LEN]) -> Self {
        Self {
            sensor_id: i16::from_le_bytes([buf[0], buf[1]]),
            timestamp: i64::from_le_bytes([
                buf[2], buf[3], buf[4], buf[5], buf[6], buf[7], buf[8], buf[9],
            ]),
            temperature: f32::from_le_bytes([buf[10], buf[11], buf[12], buf[13]]),
            pressure: f32::from_le_bytes([buf[14], buf[15], buf[16], buf[17]]),
            humidity: f32::from_le_bytes([buf[18], buf[19], buf[20], buf[21]]),
        }
    }

    /// Field-wise equality on the raw float bits, so NaN payloads compare equal
    /// to themselves.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.sensor_id == other.sensor_id
            && self.timestamp == other.timestamp
            && self.temperature.to_bits() == other.temperature.to_bits()
            && self.pressure.to_bits() == other.pressure.to_bits()
            && self.humidity.to_bits() == other.humidity.to_bits()
    }
}

/// Records with arbitrary ids, timestamps and float bit patterns, NaN payloads
/// included.
#[cfg(test)]
pub(crate) fn arb_record() -> impl proptest::strategy::Strategy<Value = SensorRecord> {
    use proptest::prelude::*;

    (
        any::<i16>(),
        any::<i64>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
    )
        .prop_map(
            |(sensor_id, timestamp, temperature, pressure, humidity)| SensorRecord {
                sensor_id,
                timestamp,
                temperature: f32::from_bits(temperature),
                pressure: f32::from_bits(pressure),
                humidity: f32::from_bits(humidity),
            },
        )
}
