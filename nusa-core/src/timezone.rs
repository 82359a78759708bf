use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

use crate::{CoreError, CoreResult};

/// The three Indonesian civil time zones. All are fixed offsets; none
/// observe DST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Western Indonesia, UTC+7 (Jakarta, Surabaya).
    Wib,
    /// Central Indonesia, UTC+8 (Bali, Makassar).
    Wita,
    /// Eastern Indonesia, UTC+9 (Papua).
    Wit,
}

impl Zone {
    pub fn name(self) -> &'static str {
        match self {
            Zone::Wib => "WIB",
            Zone::Wita => "WITA",
            Zone::Wit => "WIT",
        }
    }

    pub fn offset(self) -> FixedOffset {
        let hours = match self {
            Zone::Wib => 7,
            Zone::Wita => 8,
            Zone::Wit => 9,
        };
        FixedOffset::east_opt(hours * 3600).expect("static zone offset")
    }

    /// Resolves a zone by airport IATA code. The table is a closed set;
    /// unknown codes fall back to WIB.
    pub fn of_airport(code: &str) -> Zone {
        match code.to_ascii_uppercase().as_str() {
            // WIB (UTC+7) - Western Indonesia
            "CGK" | "HLP" | "BDO" | "SUB" | "SRG" | "JOG" | "SOC" | "PLM" | "PNK" | "BTH"
            | "PKU" | "PDG" | "KNO" | "BTJ" | "TNJ" => Zone::Wib,
            // WITA (UTC+8) - Central Indonesia
            "DPS" | "LOP" | "UPG" | "BPN" | "MDC" | "KDI" | "PLW" | "TRK" => Zone::Wita,
            // WIT (UTC+9) - Eastern Indonesia
            "DJJ" | "TIM" | "BIK" | "MKQ" | "SOQ" | "AMQ" => Zone::Wit,
            _ => Zone::Wib,
        }
    }

    /// Resolves a zone by its tag or UTC-offset alias; unrecognized names
    /// fall back to WIB.
    pub fn by_name(name: &str) -> Zone {
        match name.to_ascii_uppercase().as_str() {
            "WITA" | "UTC+8" => Zone::Wita,
            "WIT" | "UTC+9" => Zone::Wit,
            _ => Zone::Wib,
        }
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a provider timestamp. Attempts, in order: an ISO-8601 instant
/// with numeric offset (colon optional) or `Z`, then a naive local
/// timestamp. A naive value is interpreted in `zone_hint` when given,
/// otherwise in UTC.
pub fn parse(value: &str, zone_hint: Option<&str>) -> CoreResult<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }

    // %z also accepts offsets written without the colon.
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }

    let offset = match zone_hint {
        Some(name) if !name.is_empty() => Zone::by_name(name).offset(),
        _ => FixedOffset::east_opt(0).expect("static zone offset"),
    };

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            if let Some(dt) = offset.from_local_datetime(&naive).single() {
                return Ok(dt);
            }
        }
    }

    Err(CoreError::TimeParse(value.to_string()))
}

/// Re-expresses an instant in the zone of the given airport. The point in
/// time is unchanged; only the presentation offset moves.
pub fn convert_to_airport_zone(
    time: DateTime<FixedOffset>,
    airport_code: &str,
) -> DateTime<FixedOffset> {
    time.with_timezone(&Zone::of_airport(airport_code).offset())
}
