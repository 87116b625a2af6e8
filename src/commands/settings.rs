use crate::error::{Error, Result};
use crate::models::config::{
    EngineConfig, DEFAULT_CUSTOM_QUESTION_COUNT, DEFAULT_MAX_SCORE, DEFAULT_REGION_CODE_LENGTH,
    DEFAULT_UNREGISTERED_LABEL,
};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const MAX_CUSTOM_QUESTION_COUNT: u64 = 20;
const MAX_REGION_CODE_LENGTH: u64 = 10;

pub async fn get_settings(workspace_path: String) -> Result<Value> {
    load_settings_from_disk(&workspace_path)
}

pub async fn save_settings(workspace_path: String, settings: Value) -> Result<Value> {
    save_settings_to_disk(&workspace_path, settings)
}

/// Engine configuration for a workspace: defaults overlaid with the sanitised settings file.
pub fn load_engine_config(workspace_path: &str) -> Result<EngineConfig> {
    let settings = load_settings_from_disk(workspace_path)?;
    Ok(engine_config_from_settings(&settings))
}

/// Numeric keys are clamped to the same bounds as the sanitised settings file.
pub(crate) fn engine_config_from_settings(settings: &Value) -> EngineConfig {
    let mut config = EngineConfig::default();

    if let Some(max) = settings.get("maxQuestionScore").and_then(Value::as_i64) {
        config.max_score = max.clamp(1, DEFAULT_MAX_SCORE);
    }
    if let Some(count) = settings.get("customQuestionCount").and_then(Value::as_u64) {
        config.custom_question_count = count.clamp(1, MAX_CUSTOM_QUESTION_COUNT) as usize;
    }
    if let Some(length) = settings.get("regionCodeLength").and_then(Value::as_u64) {
        config.region_code_length = length.clamp(1, MAX_REGION_CODE_LENGTH) as usize;
    }
    if let Some(label) = settings.get("unregisteredLabel").and_then(Value::as_str) {
        config.unregistered_label = label.to_string();
    }
    if let Some(labels) = settings.get("questionLabels").and_then(Value::as_object) {
        for (id, label) in labels {
            if let Some(label) = label.as_str() {
                config.question_labels.insert(id.clone(), label.to_string());
            }
        }
    }

    config
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value> {
    let path = settings_path(workspace_path);
    ensure_scopelens_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read settings.json: {e}")))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON, falling back to defaults: {e}");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value> {
    let path = settings_path(workspace_path);
    ensure_scopelens_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path)
        .join(".scopelens")
        .join("settings.json")
}

fn ensure_scopelens_dir(workspace_path: &str) -> Result<()> {
    let dir = Path::new(workspace_path).join(".scopelens");
    fs::create_dir_all(&dir)
        .map_err(|e| Error::Config(format!("Failed to create .scopelens directory: {e}")))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<()> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| Error::Config(format!("Failed to serialize settings: {e}")))?;
    fs::write(path, raw).map_err(|e| Error::Config(format!("Failed to write settings.json: {e}")))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        rename_legacy_labels(&mut out);
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "maxQuestionScore": DEFAULT_MAX_SCORE,
        "customQuestionCount": DEFAULT_CUSTOM_QUESTION_COUNT,
        "regionCodeLength": DEFAULT_REGION_CODE_LENGTH,
        "unregisteredLabel": DEFAULT_UNREGISTERED_LABEL,
        "questionLabels": {}
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

/// Pre-versioned files kept label overrides under `labels`.
fn rename_legacy_labels(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(legacy) = obj.remove("labels") else {
        return;
    };
    if !obj.contains_key("questionLabels") {
        log::info!("Migrating legacy `labels` settings key to `questionLabels`");
        obj.insert("questionLabels".to_string(), legacy);
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    // Scores never exceed the default ceiling; settings may only tighten it.
    clamp_u64(obj, "maxQuestionScore", 1, DEFAULT_MAX_SCORE as u64, DEFAULT_MAX_SCORE as u64);
    clamp_u64(obj, "customQuestionCount", 1, MAX_CUSTOM_QUESTION_COUNT, DEFAULT_CUSTOM_QUESTION_COUNT as u64);
    clamp_u64(obj, "regionCodeLength", 1, MAX_REGION_CODE_LENGTH, DEFAULT_REGION_CODE_LENGTH as u64);
    ensure_label(obj, "unregisteredLabel", DEFAULT_UNREGISTERED_LABEL);

    let labels = obj
        .entry("questionLabels".to_string())
        .or_insert_with(|| json!({}));
    match labels.as_object_mut() {
        Some(label_obj) => {
            label_obj.retain(|_, value| value.as_str().is_some_and(|s| !s.trim().is_empty()));
        }
        None => *labels = json!({}),
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_label(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}
