// ── Sensor metadata ──
//
// Units, device classes and presentation transforms for status keys whose
// meaning is known. Lookup is case-insensitive; unknown keys get empty
// metadata and are published as plain coerced values.

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::value::MetricValue;

/// Format of the device clock (`date` key), local time.
const DEVICE_TIMESTAMP_FORMAT: &str = "%Y:%m:%d-%H:%M:%S";

/// Unit of measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Unit {
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    Ampere,
    #[serde(rename = "V")]
    #[strum(serialize = "V")]
    Volt,
    #[serde(rename = "W")]
    #[strum(serialize = "W")]
    Watt,
    #[serde(rename = "Wh")]
    #[strum(serialize = "Wh")]
    WattHour,
    #[serde(rename = "kWh")]
    #[strum(serialize = "kWh")]
    KilowattHour,
    #[serde(rename = "%")]
    #[strum(serialize = "%")]
    Percent,
    #[serde(rename = "°C")]
    #[strum(serialize = "°C")]
    Celsius,
    #[serde(rename = "min")]
    #[strum(serialize = "min")]
    Minutes,
}

/// What kind of physical quantity a metric measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    Current,
    Voltage,
    Power,
    Energy,
    Battery,
    Temperature,
    Timestamp,
}

/// How consecutive values of a metric relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

/// Presentation transform applied on top of the coerced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTransform {
    /// Numeric charging mode code to its label.
    ChargingModeLabel,
    /// Device-local `YYYY:MM:DD-HH:MM:SS` to RFC 3339 UTC.
    DeviceTimestamp,
    /// Flip the sign (openWB reports PV generation as negative power).
    Negate,
}

/// Static metadata for one status key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<DeviceClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
    #[serde(skip)]
    pub transform: Option<ValueTransform>,
}

impl SensorMeta {
    const fn measured(unit: Unit, device_class: DeviceClass, state_class: StateClass) -> Self {
        Self {
            unit: Some(unit),
            device_class: Some(device_class),
            state_class: Some(state_class),
            transform: None,
        }
    }

    fn with_transform(mut self, transform: ValueTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Metadata for `key`; empty for keys without known semantics.
    pub fn for_key(key: &str) -> Self {
        use DeviceClass as D;
        use StateClass as S;
        use Unit as U;

        match key.to_lowercase().as_str() {
            "date" => Self {
                device_class: Some(D::Timestamp),
                transform: Some(ValueTransform::DeviceTimestamp),
                ..Self::default()
            },
            "lademodus" => Self::default().with_transform(ValueTransform::ChargingModeLabel),

            "minimalstromstaerke" | "maximalstromstaerke" | "llsoll" | "evua1" | "evua2"
            | "evua3" | "lla1lp1" | "lla2lp1" | "lla3lp1" | "lla1lp2" | "lla2lp2" | "lla3lp2"
            | "lla1lp3" | "lla2lp3" | "lla3lp3" | "llapl1" | "llapl2" | "llapl3" => {
                Self::measured(U::Ampere, D::Current, S::Measurement)
            }

            "evuv1" | "evuv2" | "evuv3" | "llvpl1" | "llvpl2" | "llvpl3" => {
                Self::measured(U::Volt, D::Voltage, S::Measurement)
            }

            "pvw" => Self::measured(U::Watt, D::Power, S::Measurement)
                .with_transform(ValueTransform::Negate),
            "llgesamt" | "lllp1" | "lllp2" | "lllp3" | "evuw" | "speicherleistung"
            | "speicherpower" | "hausverbrauch" => {
                Self::measured(U::Watt, D::Power, S::Measurement)
            }

            "gelkwhlp1" | "gelkwhlp2" | "gelkwhlp3" => {
                Self::measured(U::KilowattHour, D::Energy, S::Total)
            }
            "gelrlp1" | "gelrlp2" | "gelrlp3" | "llkwhlp1" | "llkwhlp2" | "llkwhlp3" => {
                Self::measured(U::KilowattHour, D::Energy, S::TotalIncreasing)
            }
            "pvwh" | "evubezugwh" | "evueinspeisungwh" => {
                Self::measured(U::WattHour, D::Energy, S::TotalIncreasing)
            }

            "speichersoc" | "soclp1" | "soclp2" | "speichersocziel" => {
                Self::measured(U::Percent, D::Battery, S::Measurement)
            }

            "wallboxtemp" | "umgebungstemperatur" | "aussentemperatur" => {
                Self::measured(U::Celsius, D::Temperature, S::Measurement)
            }

            "restzeitlp1m" | "restzeitlp2m" | "restzeitlp3m" => Self {
                unit: Some(U::Minutes),
                state_class: Some(S::Measurement),
                ..Self::default()
            },

            _ => Self::default(),
        }
    }

    /// The value to present for `value`: the transform's output when one
    /// applies, otherwise `value` unchanged.
    pub fn present(&self, value: &MetricValue) -> MetricValue {
        self.transform
            .and_then(|t| t.apply(value))
            .unwrap_or_else(|| value.clone())
    }
}

impl ValueTransform {
    /// Apply the transform; `None` when it does not fit the value.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn apply(self, value: &MetricValue) -> Option<MetricValue> {
        match self {
            Self::ChargingModeLabel => {
                let code = match value {
                    MetricValue::Integer(i) => *i,
                    MetricValue::Float(f) => f.trunc() as i64,
                    MetricValue::Text(_) => return None,
                };
                charging_mode_label(code).map(|label| MetricValue::Text(label.into()))
            }
            Self::DeviceTimestamp => {
                let raw = value.as_text()?;
                let naive = NaiveDateTime::parse_from_str(raw.trim(), DEVICE_TIMESTAMP_FORMAT).ok()?;
                let local = Local.from_local_datetime(&naive).earliest()?;
                Some(MetricValue::Text(local.with_timezone(&Utc).to_rfc3339()))
            }
            Self::Negate => match value {
                MetricValue::Integer(i) => i.checked_neg().map(MetricValue::Integer),
                MetricValue::Float(f) => Some(MetricValue::Float(-f)),
                MetricValue::Text(_) => None,
            },
        }
    }
}

/// Label of an openWB charging mode code.
pub fn charging_mode_label(code: i64) -> Option<&'static str> {
    match code {
        0 => Some("Sofortladen"),
        1 => Some("Min + PV"),
        2 => Some("PV-Überschuss"),
        3 => Some("Stop"),
        4 => Some("Standby"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::DateTime;

    use super::*;

    #[test]
    fn known_keys_carry_units() {
        let meta = SensorMeta::for_key("lllp1");
        assert_eq!(meta.unit, Some(Unit::Watt));
        assert_eq!(meta.device_class, Some(DeviceClass::Power));
        assert_eq!(meta.state_class, Some(StateClass::Measurement));

        let meta = SensorMeta::for_key("wallboxTemp");
        assert_eq!(meta.unit, Some(Unit::Celsius));
        assert_eq!(meta.unit.unwrap().to_string(), "°C");
    }

    #[test]
    fn unknown_keys_have_no_metadata() {
        assert_eq!(SensorMeta::for_key("new_sensor_42"), SensorMeta::default());
    }

    #[test]
    fn charging_mode_maps_codes_to_labels() {
        let meta = SensorMeta::for_key("lademodus");
        assert_eq!(
            meta.present(&MetricValue::Integer(2)),
            MetricValue::Text("PV-Überschuss".into())
        );
        assert_eq!(
            meta.present(&MetricValue::Float(1.0)),
            MetricValue::Text("Min + PV".into())
        );
        // Unknown codes and text pass through.
        assert_eq!(meta.present(&MetricValue::Integer(9)), MetricValue::Integer(9));
        assert_eq!(
            meta.present(&MetricValue::Text("auto".into())),
            MetricValue::Text("auto".into())
        );
    }

    #[test]
    fn pv_power_is_negated() {
        let meta = SensorMeta::for_key("pvw");
        assert_eq!(meta.present(&MetricValue::Integer(-4200)), MetricValue::Integer(4200));
        assert_eq!(meta.present(&MetricValue::Float(-1.5)), MetricValue::Float(1.5));
    }

    #[test]
    fn device_timestamp_becomes_rfc3339() {
        let meta = SensorMeta::for_key("date");
        let presented = meta.present(&MetricValue::Text("2024:01:15-10:30:00".into()));
        let text = presented.as_text().unwrap();
        assert!(DateTime::parse_from_rfc3339(text).is_ok(), "got {text}");

        let garbage = MetricValue::Text("yesterday".into());
        assert_eq!(meta.present(&garbage), garbage);
    }
}
