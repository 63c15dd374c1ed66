//! Submit command implementation.

use crate::cli::SubmitArgs;
use crate::config::AegisConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::wiring;
use serde_json::{Map, Value};

/// Execute the submit command.
pub fn execute_submit(args: SubmitArgs, config: &AegisConfig, formatter: &Formatter) -> Result<()> {
    let metadata = build_metadata(args.metadata.as_deref(), args.handle)?;
    let engine = wiring::engine(config)?;
    let claim_id = engine.submit(args.text, metadata)?;

    println!("{}", formatter.claim_submitted(&claim_id));
    Ok(())
}

/// Parse `--metadata` and merge `--handle` into it.
fn build_metadata(raw: Option<&str>, handle: Option<String>) -> Result<Value> {
    let mut metadata = match raw {
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => map,
            _ => {
                return Err(CliError::InvalidInput(
                    "Metadata must be a JSON object".to_string(),
                ))
            }
        },
        None => Map::new(),
    };

    if let Some(handle) = handle {
        metadata.insert("handle".to_string(), Value::String(handle));
    }
    Ok(Value::Object(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_defaults_to_empty_object() {
        assert_eq!(build_metadata(None, None).unwrap(), json!({}));
    }

    #[test]
    fn test_handle_is_merged() {
        let metadata = build_metadata(Some(r#"{"followers": 10, "handle": "@old"}"#), Some("@new".into())).unwrap();
        assert_eq!(metadata, json!({"followers": 10, "handle": "@new"}));
    }

    #[test]
    fn test_non_object_metadata_rejected() {
        assert!(matches!(
            build_metadata(Some("[1, 2]"), None),
            Err(CliError::InvalidInput(_))
        ));
        assert!(matches!(
            build_metadata(Some("{not json"), None),
            Err(CliError::Serialization(_))
        ));
    }
}
