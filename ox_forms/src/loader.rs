use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, error, trace};
use serde::de::DeserializeOwned;

use crate::error::FormError;
use crate::registry::TypeMappingConfig;
use crate::schema::FormSchema;

/// Load any serde configuration from a YAML, JSON or TOML file, chosen by
/// extension.
pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T, FormError> {
    debug!("Loading config from: {:?}", path);
    trace!("File extension: {:?}", path.extension());

    if !path.exists() {
        error!("Configuration file not found at {:?}", path);
        return Err(FormError::NotFound(path.to_path_buf()));
    }

    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    trace!("Content read from config file: \n{}", contents);

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => {
            debug!("Parsing as YAML");
            serde_yaml::from_str(&contents).map_err(|e| FormError::ParseError(e.to_string()))
        }
        Some("json") => {
            debug!("Parsing as JSON");
            serde_json::from_str(&contents).map_err(|e| FormError::ParseError(e.to_string()))
        }
        Some("toml") => {
            debug!("Parsing as TOML");
            toml::from_str(&contents).map_err(|e| FormError::ParseError(e.to_string()))
        }
        other => {
            error!("Unsupported config file format: {:?}", other);
            Err(FormError::UnsupportedFormat(other.unwrap_or_default().to_string()))
        }
    }
}

/// Load a form schema and enforce its structural invariants.
pub fn load_schema_from_path(path: &Path) -> Result<FormSchema, FormError> {
    let schema: FormSchema = load_from_path(path)?;
    schema.check()?;
    Ok(schema)
}

pub fn load_type_mappings_from_path(path: &Path) -> Result<TypeMappingConfig, FormError> {
    load_from_path(path)
}
