use crate::schema::{tensorzero_functions, tensorzero_models, tensorzero_variants};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A model entry of the TensorZero routing configuration. `provider` and
/// `model_type` combine into the `provider::model_type` reference emitted
/// into the TOML config.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = tensorzero_models)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TensorZeroModel {
    pub id: Uuid,
    pub name: String,
    pub provider: String,
    pub model_type: String,
    pub api_key_field: String,
    pub max_tokens: Option<i32>,
    pub temperature: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = tensorzero_models)]
pub struct NewTensorZeroModel {
    pub name: String,
    pub provider: String,
    pub model_type: String,
    pub api_key_field: String,
    pub max_tokens: Option<i32>,
    pub temperature: Option<f64>,
    pub is_active: bool,
}

/// A named task type ("chat" or "json") dispatching to weighted variants.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = tensorzero_functions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TensorZeroFunction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub function_type: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = tensorzero_functions)]
pub struct NewTensorZeroFunction {
    pub user_id: Uuid,
    pub name: String,
    pub function_type: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// A named prompt + model + weight configuration under a routing function.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = tensorzero_variants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TensorZeroVariant {
    pub id: Uuid,
    pub function_id: Uuid,
    pub model_id: Uuid,
    pub name: String,
    pub variant_type: String,
    pub weight: f64,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub json_schema: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = tensorzero_variants)]
pub struct NewTensorZeroVariant {
    pub function_id: Uuid,
    pub model_id: Uuid,
    pub name: String,
    pub variant_type: String,
    pub weight: f64,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub json_schema: Option<Value>,
    pub is_active: bool,
}

/// Variant joined with its model and function names, the shape served by
/// GET /api/tensorzero/variants.
#[derive(Serialize, Debug, Clone)]
pub struct VariantWithRefs {
    #[serde(flatten)]
    pub variant: TensorZeroVariant,
    pub model_name: String,
    pub model_provider: String,
    pub model_type: String,
    pub function_name: String,
}

// API Request Structures

#[derive(Deserialize, Debug)]
pub struct CreateModelRequest {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub model_type: Option<String>,
    pub api_key_field: Option<String>,
    pub max_tokens: Option<i32>,
    pub temperature: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct CreateFunctionRequest {
    pub name: Option<String>,
    pub function_type: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct CreateVariantRequest {
    pub function_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub name: Option<String>,
    pub variant_type: Option<String>,
    pub weight: Option<f64>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub json_schema: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct VariantListQuery {
    pub function_id: Option<Uuid>,
}

/// Body of POST /api/tensorzero/config — write a generated config to disk.
#[derive(Deserialize, Debug)]
pub struct WriteConfigRequest {
    pub content: Option<String>,
    pub file_path: Option<String>,
}

/// Batch payload of POST /api/tensorzero/config/save: functions plus the
/// variants referencing them by name.
#[derive(Deserialize, Debug)]
pub struct SaveConfigRequest {
    pub functions: Option<Vec<SaveConfigFunction>>,
    pub variants: Option<Vec<SaveConfigVariant>>,
    #[serde(default = "default_generate_file")]
    pub generate_file: bool,
    pub file_path: Option<String>,
}

const fn default_generate_file() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
pub struct SaveConfigFunction {
    pub name: String,
    pub function_type: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SaveConfigVariant {
    pub function_name: String,
    pub name: String,
    pub variant_type: String,
    pub model_name: String,
    pub weight: Option<f64>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub json_schema: Option<Value>,
}

/// Response of POST /api/tensorzero/config/save.
#[derive(Serialize, Debug)]
pub struct SaveConfigResponse {
    pub functions: Vec<TensorZeroFunction>,
    pub variants: Vec<TensorZeroVariant>,
    pub toml_content: Option<String>,
    pub file_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_config_request_defaults_generate_file() {
        let parsed: SaveConfigRequest = serde_json::from_value(json!({
            "functions": [{"name": "summarize", "function_type": "chat"}],
            "variants": []
        }))
        .expect("deserialize save config payload");
        assert!(parsed.generate_file);
        assert_eq!(parsed.functions.unwrap()[0].name, "summarize");
    }

    #[test]
    fn test_variant_with_refs_flattens() {
        let variant = TensorZeroVariant {
            id: Uuid::new_v4(),
            function_id: Uuid::new_v4(),
            model_id: Uuid::new_v4(),
            name: "baseline".to_string(),
            variant_type: "chat_completion".to_string(),
            weight: 1.0,
            system_prompt: None,
            user_prompt: None,
            json_schema: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        let joined = VariantWithRefs {
            variant,
            model_name: "gpt4o".to_string(),
            model_provider: "openai".to_string(),
            model_type: "gpt-4o".to_string(),
            function_name: "summarize".to_string(),
        };
        let value = serde_json::to_value(&joined).expect("serialize variant");
        assert_eq!(value["name"], "baseline");
        assert_eq!(value["model_provider"], "openai");
        assert_eq!(value["function_name"], "summarize");
    }
}
