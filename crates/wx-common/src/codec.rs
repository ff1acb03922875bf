//! JSON serialization of fields.
//!
//! Document layout:
//!
//! ```json
//! {
//!   "coords": {"lat": [..], "lon": [..]},
//!   "variables": {
//!     "t2m": {"units": "K", "long_name": "..", "dims": ["lat", "lon"],
//!             "shape": [2, 3], "values": [1.0, null, ..], "attrs": {}}
//!   },
//!   "attrs": {}
//! }
//! ```
//!
//! Missing values are written as `null`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{WxError, WxResult};
use crate::field::{Attributes, Field, Variable, VariableMeta};

#[derive(Debug, Serialize, Deserialize)]
struct FieldDocument {
    coords: BTreeMap<String, Vec<f64>>,
    variables: BTreeMap<String, VariableDocument>,
    #[serde(default)]
    attrs: Attributes,
}

#[derive(Debug, Serialize, Deserialize)]
struct VariableDocument {
    #[serde(default)]
    units: String,
    #[serde(default)]
    long_name: String,
    dims: Vec<String>,
    shape: Vec<usize>,
    values: Vec<Option<f32>>,
    #[serde(default)]
    attrs: Attributes,
}

impl From<&Field> for FieldDocument {
    fn from(field: &Field) -> Self {
        let variables = field
            .variables()
            .map(|var| {
                let doc = VariableDocument {
                    units: var.units().to_string(),
                    long_name: var.long_name().to_string(),
                    dims: var.dims().to_vec(),
                    shape: var.shape().to_vec(),
                    values: var
                        .values()
                        .iter()
                        .map(|&v| if v.is_nan() { None } else { Some(v) })
                        .collect(),
                    attrs: var.attrs().clone(),
                };
                (var.name().to_string(), doc)
            })
            .collect();

        Self {
            coords: field.coords().clone(),
            variables,
            attrs: field.attrs().clone(),
        }
    }
}

impl TryFrom<FieldDocument> for Field {
    type Error = WxError;

    fn try_from(doc: FieldDocument) -> WxResult<Self> {
        let variables = doc
            .variables
            .into_iter()
            .map(|(name, v)| {
                let values = v.values.into_iter().map(|x| x.unwrap_or(f32::NAN)).collect();
                Variable::new(VariableMeta::new(name, v.units, v.long_name), v.dims, v.shape, values)
                    .map(|var| var.with_attrs(v.attrs))
            })
            .collect::<WxResult<Vec<_>>>()?;

        Field::new(doc.coords, variables, doc.attrs)
    }
}

/// Encode a field as a JSON string.
pub fn to_json(field: &Field) -> WxResult<String> {
    Ok(serde_json::to_string(&FieldDocument::from(field))?)
}

/// Decode a field from a JSON string.
pub fn from_json(json: &str) -> WxResult<Field> {
    let doc: FieldDocument = serde_json::from_str(json)?;
    Field::try_from(doc)
}

/// Write a field to `path`, creating parent directories.
pub fn save_field(field: &Field, path: &Path) -> WxResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &FieldDocument::from(field))?;
    writer.flush()?;

    let size = fs::metadata(path)?.len();
    info!(path = %path.display(), size_mb = size as f64 / (1024.0 * 1024.0), "Saved field");
    Ok(())
}

/// Read a field written by [`save_field`].
pub fn load_field(path: &Path) -> WxResult<Field> {
    let file = File::open(path)?;
    let doc: FieldDocument = serde_json::from_reader(BufReader::new(file))?;
    let field = Field::try_from(doc)?;

    info!(path = %path.display(), sizes = ?field.sizes(), "Loaded field");
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Field {
        let mut coords = BTreeMap::new();
        coords.insert("lat".to_string(), vec![10.0, 20.0]);
        coords.insert("lon".to_string(), vec![0.0, 1.0]);
        let var = Variable::new(
            VariableMeta::new("t2m", "K", "2 metre temperature"),
            vec!["lat".into(), "lon".into()],
            vec![2, 2],
            vec![280.0, f32::NAN, 282.5, 283.0],
        )
        .unwrap()
        .with_attr("source", "gfs");
        let mut attrs = Attributes::new();
        attrs.insert("regrid_method".into(), "bilinear".into());
        Field::new(coords, vec![var], attrs).unwrap()
    }

    #[test]
    fn test_json_round_trip_keeps_nan() {
        let field = sample();
        let json = to_json(&field).unwrap();
        assert!(json.contains("null"));

        let back = from_json(&json).unwrap();
        assert_eq!(back.coords(), field.coords());
        assert_eq!(back.attrs(), field.attrs());

        let var = back.variable("t2m").unwrap();
        assert_eq!(var.units(), "K");
        assert_eq!(var.attrs().get("source").map(String::as_str), Some("gfs"));
        assert!(var.values()[1].is_nan());
        assert_eq!(var.values()[2], 282.5);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/field.json");
        save_field(&sample(), &path).unwrap();

        let loaded = load_field(&path).unwrap();
        assert_eq!(loaded.variable_names(), vec!["t2m".to_string()]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_field(Path::new("/nonexistent/field.json")).unwrap_err();
        assert!(matches!(err, WxError::Io(_)));
    }

    #[test]
    fn test_rejects_inconsistent_document() {
        let json = r#"{"coords":{"lat":[0.0]},"variables":{"x":{"dims":["lat"],"shape":[2],"values":[1.0,2.0]}}}"#;
        assert!(from_json(json).is_err());
    }
}
