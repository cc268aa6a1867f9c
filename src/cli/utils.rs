use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a refusal (denied check, failed request) in the appropriate format
pub fn output_error(output_format: OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });
            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("✗ {}{}", error_code.map(|c| format!("[{}] ", c)).unwrap_or_default(), message);
        }
    }
    Ok(())
}

/// Print `key: value` lines for the scalar fields of a JSON object.
pub fn output_fields(output_format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => match value.as_object() {
            Some(object) => {
                for (key, field) in object {
                    println!("{:<22} {}", format!("{}:", key), text_value(field));
                }
            }
            None => println!("{}", text_value(value)),
        },
    }
    Ok(())
}

/// One line per row with the named columns.
pub fn output_table(output_format: OutputFormat, rows: &[Value], columns: &[&str]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("(no rows)");
                return Ok(());
            }
            println!("{}", columns.join("\t"));
            for row in rows {
                let cells: Vec<String> = columns.iter().map(|c| text_value(lookup(row, c))).collect();
                println!("{}", cells.join("\t"));
            }
        }
    }
    Ok(())
}

/// Resolve a dotted path such as `entitlement.isActive`.
fn lookup<'a>(value: &'a Value, path: &str) -> &'a Value {
    path.split('.').fold(value, |v, key| v.get(key).unwrap_or(&Value::Null))
}

pub fn text_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_lookup_and_text_rendering() {
        let row = json!({ "plan": "pro", "entitlement": { "daysRemaining": 3, "expiresAt": null } });
        assert_eq!(text_value(lookup(&row, "plan")), "pro");
        assert_eq!(text_value(lookup(&row, "entitlement.daysRemaining")), "3");
        assert_eq!(text_value(lookup(&row, "entitlement.expiresAt")), "-");
        assert_eq!(text_value(lookup(&row, "missing.path")), "-");
    }
}
