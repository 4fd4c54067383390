//! Attribute extraction shared by the shapefile and `GeoJSON` readers.
//!
//! Both SPC datasets carry the same attribute table. Field lookup is
//! case-insensitive, and numeric fields stored as text are accepted.

use std::path::Path;

use geo::Geometry;
use shapefile::dbase::{self, FieldValue};
use tornado_track_tornado_models::RawTornadoRecord;

use crate::AcquisitionError;

/// Read access to one feature's attributes.
pub trait AttributeSource {
    /// The named field as text, if present and non-null.
    fn text(&self, name: &str) -> Option<String>;

    /// The named field as a number, if present, non-null and numeric.
    fn number(&self, name: &str) -> Option<f64>;
}

fn name_variants(name: &str) -> [String; 3] {
    [
        name.to_string(),
        name.to_ascii_lowercase(),
        name.to_ascii_uppercase(),
    ]
}

impl AttributeSource for dbase::Record {
    fn text(&self, name: &str) -> Option<String> {
        let value = name_variants(name).iter().find_map(|n| self.get(n))?;
        match value {
            FieldValue::Character(Some(s)) | FieldValue::Memo(s) => Some(s.trim().to_string()),
            FieldValue::Date(Some(d)) => Some(format!(
                "{:04}-{:02}-{:02}",
                d.year(),
                d.month(),
                d.day()
            )),
            FieldValue::Numeric(Some(n)) => Some(n.to_string()),
            FieldValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        let value = name_variants(name).iter().find_map(|n| self.get(n))?;
        match value {
            FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => {
                Some(*n)
            }
            FieldValue::Float(Some(f)) => Some(f64::from(*f)),
            FieldValue::Integer(i) => Some(f64::from(*i)),
            FieldValue::Character(Some(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl AttributeSource for serde_json::Map<String, serde_json::Value> {
    fn text(&self, name: &str) -> Option<String> {
        let value = self.get(name).or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })?;
        match value {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn number(&self, name: &str) -> Option<f64> {
        let value = self.get(name).or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })?;
        match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

struct FieldReader<'a, A: ?Sized> {
    attrs: &'a A,
    path: &'a Path,
    index: usize,
}

impl<A: AttributeSource + ?Sized> FieldReader<'_, A> {
    fn error(&self, field: &'static str, message: impl Into<String>) -> AcquisitionError {
        AcquisitionError::Attribute {
            path: self.path.display().to_string(),
            index: self.index,
            field,
            message: message.into(),
        }
    }

    fn number(&self, field: &'static str) -> Result<f64, AcquisitionError> {
        let value = self
            .attrs
            .number(field)
            .ok_or_else(|| self.error(field, "is missing or not numeric"))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.error(field, format!("is not finite ({value})")))
        }
    }

    fn integer(&self, field: &'static str) -> Result<i64, AcquisitionError> {
        let value = self.number(field)?;
        if value.fract() != 0.0 || value.abs() > 9.0e15 {
            return Err(self.error(field, format!("is not an integer ({value})")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(value as i64)
    }

    fn bounded<T: TryFrom<i64>>(&self, field: &'static str) -> Result<T, AcquisitionError> {
        let value = self.integer(field)?;
        T::try_from(value).map_err(|_| self.error(field, format!("is out of range ({value})")))
    }

    fn optional_number(&self, field: &'static str) -> Result<Option<f64>, AcquisitionError> {
        match self.attrs.number(field) {
            None => Ok(None),
            Some(value) if value.is_finite() => Ok(Some(value)),
            Some(value) => Err(self.error(field, format!("is not finite ({value})"))),
        }
    }

    fn text(&self, field: &'static str) -> Result<String, AcquisitionError> {
        self.attrs
            .text(field)
            .ok_or_else(|| self.error(field, "is missing"))
    }
}

/// Builds a [`RawTornadoRecord`] from one feature's attributes.
///
/// # Errors
///
/// Returns [`AcquisitionError::Attribute`] if a required field is missing
/// or has a value of the wrong kind. The start/end coordinates are
/// optional.
pub fn parse_record<A: AttributeSource + ?Sized>(
    attrs: &A,
    geometry: Option<Geometry<f64>>,
    path: &Path,
    index: usize,
) -> Result<RawTornadoRecord, AcquisitionError> {
    let fields = FieldReader { attrs, path, index };

    Ok(RawTornadoRecord {
        om: fields.integer("om")?,
        year: fields.bounded("yr")?,
        month: fields.bounded("mo")?,
        day: fields.bounded("dy")?,
        date: fields.text("date")?,
        time: fields.text("time")?,
        state: fields.text("st")?,
        magnitude: fields.bounded("mag")?,
        length_mi: fields.number("len")?,
        width_yd: fields.number("wid")?,
        injuries: fields.bounded("inj")?,
        fatalities: fields.bounded("fat")?,
        start_lat: fields.optional_number("slat")?,
        start_lon: fields.optional_number("slon")?,
        end_lat: fields.optional_number("elat")?,
        end_lon: fields.optional_number("elon")?,
        geometry,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn xenia() -> serde_json::Map<String, serde_json::Value> {
        let serde_json::Value::Object(map) = json!({
            "om": 73,
            "yr": 1974,
            "mo": 4,
            "dy": 3,
            "date": "1974-04-03",
            "time": "16:30:00",
            "st": "OH",
            "mag": 5,
            "inj": 1150,
            "fat": 34,
            "len": 31.3,
            "wid": 533,
            "slat": 39.63,
            "slon": -84.05,
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn parses_spc_attributes() {
        let record = parse_record(&xenia(), None, Path::new("tracks.geojson"), 0).unwrap();
        assert_eq!(record.om, 73);
        assert_eq!(record.year, 1974);
        assert_eq!(record.state, "OH");
        assert_eq!(record.magnitude, 5);
        assert_eq!(record.injuries, 1150);
        assert_eq!(record.fatalities, 34);
        assert!((record.length_mi - 31.3).abs() < 1e-9);
        assert!((record.width_yd - 533.0).abs() < 1e-9);
        assert_eq!(record.date, "1974-04-03");
        assert_eq!(record.start_lat, Some(39.63));
        assert_eq!(record.start_lon, Some(-84.05));
        assert_eq!(record.end_lat, None);
        assert_eq!(record.end_lon, None);
    }

    #[test]
    fn reads_end_coordinates_stored_as_text() {
        let mut attrs = xenia();
        attrs.insert("ELAT".to_string(), json!("39.8"));
        attrs.insert("elon".to_string(), json!(-83.6));
        let record = parse_record(&attrs, None, Path::new("tracks.geojson"), 0).unwrap();
        assert_eq!(record.end_lat, Some(39.8));
        assert_eq!(record.end_lon, Some(-83.6));
    }

    #[test]
    fn accepts_unrated_and_case_variants() {
        let mut attrs = serde_json::Map::new();
        for (k, v) in xenia() {
            attrs.insert(k.to_ascii_uppercase(), v);
        }
        attrs.insert("MAG".to_string(), json!(-9));
        attrs.insert("LEN".to_string(), json!("2.5"));

        let record = parse_record(&attrs, None, Path::new("tracks.geojson"), 4).unwrap();
        assert_eq!(record.magnitude, -9);
        assert!((record.length_mi - 2.5).abs() < 1e-9);
    }

    #[test]
    fn missing_field_names_the_feature() {
        let mut attrs = xenia();
        attrs.remove("fat");
        let err = parse_record(&attrs, None, Path::new("tracks.geojson"), 7).unwrap_err();
        match err {
            AcquisitionError::Attribute { index, field, .. } => {
                assert_eq!(index, 7);
                assert_eq!(field, "fat");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_counts_are_rejected() {
        let mut attrs = xenia();
        attrs.insert("inj".to_string(), json!(-1));
        let err = parse_record(&attrs, None, Path::new("tracks.geojson"), 0).unwrap_err();
        assert!(matches!(err, AcquisitionError::Attribute { field: "inj", .. }));
    }

    #[test]
    fn fractional_identifier_is_rejected() {
        let mut attrs = xenia();
        attrs.insert("om".to_string(), json!(73.5));
        let err = parse_record(&attrs, None, Path::new("tracks.geojson"), 0).unwrap_err();
        assert!(matches!(err, AcquisitionError::Attribute { field: "om", .. }));
    }

    #[test]
    fn dbase_record_lookup() {
        let mut record = dbase::Record::default();
        record.insert("om".to_string(), FieldValue::Numeric(Some(73.0)));
        record.insert(
            "date".to_string(),
            FieldValue::Character(Some("1974-04-03 ".to_string())),
        );
        record.insert("mag".to_string(), FieldValue::Numeric(None));

        assert_eq!(record.number("OM"), Some(73.0));
        assert_eq!(record.text("date").as_deref(), Some("1974-04-03"));
        assert_eq!(record.number("mag"), None);
        assert_eq!(record.number("fat"), None);
    }
}
