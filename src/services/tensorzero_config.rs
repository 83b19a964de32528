// src/services/tensorzero_config.rs
//
// Builds the TensorZero TOML configuration out of the models, functions and
// variants stored in the database. The builder is a value object assembled
// per invocation (load -> build -> discard); nothing survives the request.

use diesel::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::tensorzero::{
        NewTensorZeroFunction, NewTensorZeroModel, NewTensorZeroVariant, SaveConfigFunction,
        SaveConfigVariant, TensorZeroFunction, TensorZeroModel, TensorZeroVariant,
        VariantWithRefs,
    },
    schema::{tensorzero_functions, tensorzero_models, tensorzero_variants},
    state::DbPool,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub provider: String,
    pub model_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub function_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantEntry {
    pub name: String,
    pub variant_type: String,
    pub model_name: String,
    pub weight: f64,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub json_schema: Option<Value>,
}

/// Snapshot of the routing configuration: functions and models keyed by
/// name, variants grouped by function name. BTreeMap keying makes the
/// emitted TOML deterministic (name order) across runs.
#[derive(Debug, Default, Clone)]
pub struct ConfigSet {
    models: BTreeMap<String, ModelEntry>,
    functions: BTreeMap<String, FunctionEntry>,
    variants: BTreeMap<String, Vec<VariantEntry>>,
}

impl ConfigSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, name: impl Into<String>, entry: ModelEntry) {
        self.models.insert(name.into(), entry);
    }

    pub fn add_function(&mut self, name: impl Into<String>, entry: FunctionEntry) {
        self.functions.insert(name.into(), entry);
    }

    pub fn add_variant(&mut self, function_name: impl Into<String>, entry: VariantEntry) {
        self.variants
            .entry(function_name.into())
            .or_default()
            .push(entry);
    }

    /// Loads the active rows into a fresh set. Variants arrive joined with
    /// their model and function names.
    #[instrument(skip(conn), err)]
    pub fn load(conn: &mut PgConnection) -> Result<Self, AppError> {
        let mut set = Self::new();

        let models: Vec<TensorZeroModel> = tensorzero_models::table
            .filter(tensorzero_models::is_active.eq(true))
            .select(TensorZeroModel::as_select())
            .load(conn)?;
        for model in models {
            set.add_model(
                model.name,
                ModelEntry {
                    provider: model.provider,
                    model_type: model.model_type,
                },
            );
        }

        let functions: Vec<TensorZeroFunction> = tensorzero_functions::table
            .filter(tensorzero_functions::is_active.eq(true))
            .select(TensorZeroFunction::as_select())
            .load(conn)?;
        for function in functions {
            set.add_function(
                function.name,
                FunctionEntry {
                    function_type: function.function_type,
                },
            );
        }

        let variants: Vec<(TensorZeroVariant, String, String)> = tensorzero_variants::table
            .inner_join(tensorzero_models::table)
            .inner_join(tensorzero_functions::table)
            .filter(tensorzero_variants::is_active.eq(true))
            .select((
                TensorZeroVariant::as_select(),
                tensorzero_models::name,
                tensorzero_functions::name,
            ))
            .load(conn)?;
        for (variant, model_name, function_name) in variants {
            set.add_variant(
                function_name,
                VariantEntry {
                    name: variant.name,
                    variant_type: variant.variant_type,
                    model_name,
                    weight: variant.weight,
                    system_prompt: variant.system_prompt,
                    user_prompt: variant.user_prompt,
                    json_schema: variant.json_schema,
                },
            );
        }

        Ok(set)
    }

    /// Serializes the set into the TensorZero TOML text.
    ///
    /// Every function emits a header block even without variants. A variant
    /// whose model name is absent from the set is skipped silently. Prompt
    /// templates are escaped for the TOML string syntax; a json_schema is
    /// embedded as literal JSON.
    #[must_use]
    pub fn to_toml(&self) -> String {
        let mut toml = String::new();

        for (function_name, function) in &self.functions {
            toml.push_str(&format!("[functions.{function_name}]\n"));
            toml.push_str(&format!("type = \"{}\"\n\n", function.function_type));

            let Some(function_variants) = self.variants.get(function_name) else {
                continue;
            };
            for variant in function_variants {
                let Some(model) = self.models.get(&variant.model_name) else {
                    warn!(
                        function = %function_name,
                        variant = %variant.name,
                        model = %variant.model_name,
                        "Variant references an unknown model, skipping"
                    );
                    continue;
                };

                toml.push_str(&format!(
                    "[functions.{function_name}.variants.{}]\n",
                    variant.name
                ));
                toml.push_str(&format!("type = \"{}\"\n", variant.variant_type));
                toml.push_str(&format!(
                    "model = \"{}::{}\"\n",
                    model.provider, model.model_type
                ));
                toml.push_str(&format!("weight = {}\n", variant.weight));

                if let Some(system_prompt) = &variant.system_prompt {
                    toml.push_str(&format!(
                        "system_template = \"{}\"\n",
                        escape_toml_string(system_prompt)
                    ));
                }
                if let Some(user_prompt) = &variant.user_prompt {
                    toml.push_str(&format!(
                        "user_template = \"{}\"\n",
                        escape_toml_string(user_prompt)
                    ));
                }
                if let Some(json_schema) = &variant.json_schema {
                    toml.push_str(&format!("json_schema = {json_schema}\n"));
                }

                toml.push('\n');
            }
        }

        toml
    }
}

/// Escapes a string for double-quoted TOML: backslash, quote, newline and
/// carriage return.
fn escape_toml_string(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

// --- Database operations ---

#[instrument(skip(pool), err)]
pub async fn list_models(pool: &DbPool) -> Result<Vec<TensorZeroModel>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        tensorzero_models::table
            .order(tensorzero_models::created_at.desc())
            .select(TensorZeroModel::as_select())
            .load::<TensorZeroModel>(conn)
            .map_err(AppError::from)
    })
    .await?
}

#[instrument(skip(pool, new_model), err)]
pub async fn create_model(
    pool: &DbPool,
    new_model: NewTensorZeroModel,
) -> Result<TensorZeroModel, AppError> {
    let conn = pool.get().await?;
    let created = conn
        .interact(move |conn| {
            diesel::insert_into(tensorzero_models::table)
                .values(&new_model)
                .returning(TensorZeroModel::as_returning())
                .get_result::<TensorZeroModel>(conn)
                .map_err(AppError::from)
        })
        .await??;

    info!(model_id = %created.id, name = %created.name, "TensorZero model created");
    Ok(created)
}

#[instrument(skip(pool), err)]
pub async fn list_functions(pool: &DbPool) -> Result<Vec<TensorZeroFunction>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        tensorzero_functions::table
            .order(tensorzero_functions::created_at.desc())
            .select(TensorZeroFunction::as_select())
            .load::<TensorZeroFunction>(conn)
            .map_err(AppError::from)
    })
    .await?
}

#[instrument(skip(pool, new_function), err)]
pub async fn create_function(
    pool: &DbPool,
    new_function: NewTensorZeroFunction,
) -> Result<TensorZeroFunction, AppError> {
    let conn = pool.get().await?;
    let created = conn
        .interact(move |conn| {
            diesel::insert_into(tensorzero_functions::table)
                .values(&new_function)
                .returning(TensorZeroFunction::as_returning())
                .get_result::<TensorZeroFunction>(conn)
                .map_err(AppError::from)
        })
        .await??;

    info!(function_id = %created.id, name = %created.name, "TensorZero function created");
    Ok(created)
}

/// Active variants joined with their model and function names, optionally
/// restricted to one function.
#[instrument(skip(pool), err)]
pub async fn list_variants(
    pool: &DbPool,
    function_id: Option<Uuid>,
) -> Result<Vec<VariantWithRefs>, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let mut query = tensorzero_variants::table
            .inner_join(tensorzero_models::table)
            .inner_join(tensorzero_functions::table)
            .filter(tensorzero_variants::is_active.eq(true))
            .select((
                TensorZeroVariant::as_select(),
                tensorzero_models::name,
                tensorzero_models::provider,
                tensorzero_models::model_type,
                tensorzero_functions::name,
            ))
            .into_boxed();

        if let Some(function_id) = function_id {
            query = query.filter(tensorzero_variants::function_id.eq(function_id));
        }

        let rows: Vec<(TensorZeroVariant, String, String, String, String)> = query.load(conn)?;
        Ok(rows
            .into_iter()
            .map(
                |(variant, model_name, model_provider, model_type, function_name)| {
                    VariantWithRefs {
                        variant,
                        model_name,
                        model_provider,
                        model_type,
                        function_name,
                    }
                },
            )
            .collect())
    })
    .await?
}

#[instrument(skip(pool, new_variant), err)]
pub async fn create_variant(
    pool: &DbPool,
    new_variant: NewTensorZeroVariant,
) -> Result<TensorZeroVariant, AppError> {
    let conn = pool.get().await?;
    let created = conn
        .interact(move |conn| {
            diesel::insert_into(tensorzero_variants::table)
                .values(&new_variant)
                .returning(TensorZeroVariant::as_returning())
                .get_result::<TensorZeroVariant>(conn)
                .map_err(AppError::from)
        })
        .await??;

    info!(variant_id = %created.id, name = %created.name, "TensorZero variant created");
    Ok(created)
}

/// Loads the active configuration and renders it to TOML.
#[instrument(skip(pool), err)]
pub async fn generate_config(pool: &DbPool) -> Result<String, AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        let set = ConfigSet::load(conn)?;
        Ok(set.to_toml())
    })
    .await?
}

/// Creates a batch of functions and their variants in one transaction.
///
/// Variants reference their function by name within the batch and their
/// model by name in the database; an unknown reference fails the whole
/// batch with a 400 and rolls everything back.
#[instrument(skip(pool, functions, variants), err)]
pub async fn save_config_batch(
    pool: &DbPool,
    user_id: Uuid,
    functions: Vec<SaveConfigFunction>,
    variants: Vec<SaveConfigVariant>,
) -> Result<(Vec<TensorZeroFunction>, Vec<TensorZeroVariant>), AppError> {
    let conn = pool.get().await?;
    conn.interact(move |conn| {
        conn.transaction(|conn| {
            let mut saved_functions = Vec::with_capacity(functions.len());
            for function in functions {
                let created: TensorZeroFunction =
                    diesel::insert_into(tensorzero_functions::table)
                        .values(&NewTensorZeroFunction {
                            user_id,
                            name: function.name,
                            function_type: function.function_type,
                            description: function.description,
                            is_active: true,
                        })
                        .returning(TensorZeroFunction::as_returning())
                        .get_result(conn)?;
                saved_functions.push(created);
            }

            let mut saved_variants = Vec::with_capacity(variants.len());
            for variant in variants {
                let function_id = saved_functions
                    .iter()
                    .find(|f| f.name == variant.function_name)
                    .map(|f| f.id)
                    .ok_or_else(|| {
                        AppError::BadRequest(format!(
                            "Function not found for variant: {}",
                            variant.name
                        ))
                    })?;

                let model_id = tensorzero_models::table
                    .filter(tensorzero_models::name.eq(&variant.model_name))
                    .select(tensorzero_models::id)
                    .first::<Uuid>(conn)
                    .optional()?
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("Model not found: {}", variant.model_name))
                    })?;

                let created: TensorZeroVariant = diesel::insert_into(tensorzero_variants::table)
                    .values(&NewTensorZeroVariant {
                        function_id,
                        model_id,
                        name: variant.name,
                        variant_type: variant.variant_type,
                        weight: variant.weight.unwrap_or(1.0),
                        system_prompt: variant.system_prompt,
                        user_prompt: variant.user_prompt,
                        json_schema: variant.json_schema,
                        is_active: true,
                    })
                    .returning(TensorZeroVariant::as_returning())
                    .get_result(conn)?;
                saved_variants.push(created);
            }

            Ok((saved_functions, saved_variants))
        })
    })
    .await?
}

/// Writes a generated config to disk, creating parent directories. Returns
/// the absolute path written.
#[instrument(skip(content), err)]
pub async fn write_config_file(path: &Path, content: &str) -> Result<PathBuf, AppError> {
    let full_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full_path, content).await?;

    info!(path = %full_path.display(), "TensorZero config written");
    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chat_model() -> ModelEntry {
        ModelEntry {
            provider: "openai".to_string(),
            model_type: "gpt-4o".to_string(),
        }
    }

    fn variant(name: &str, model_name: &str) -> VariantEntry {
        VariantEntry {
            name: name.to_string(),
            variant_type: "chat_completion".to_string(),
            model_name: model_name.to_string(),
            weight: 1.0,
            system_prompt: None,
            user_prompt: None,
            json_schema: None,
        }
    }

    #[test]
    fn test_function_without_variants_emits_header_only() {
        let mut set = ConfigSet::new();
        set.add_function(
            "summarize",
            FunctionEntry {
                function_type: "chat".to_string(),
            },
        );

        let toml = set.to_toml();
        assert_eq!(toml, "[functions.summarize]\ntype = \"chat\"\n\n");
    }

    #[test]
    fn test_variant_block_contains_model_reference_and_weight() {
        let mut set = ConfigSet::new();
        set.add_model("gpt4o", chat_model());
        set.add_function(
            "summarize",
            FunctionEntry {
                function_type: "chat".to_string(),
            },
        );
        let mut entry = variant("baseline", "gpt4o");
        entry.weight = 0.5;
        set.add_variant("summarize", entry);

        let toml = set.to_toml();
        assert!(toml.contains("[functions.summarize.variants.baseline]\n"));
        assert!(toml.contains("type = \"chat_completion\"\n"));
        assert!(toml.contains("model = \"openai::gpt-4o\"\n"));
        assert!(toml.contains("weight = 0.5\n"));
    }

    #[test]
    fn test_integral_weight_prints_without_fraction() {
        let mut set = ConfigSet::new();
        set.add_model("gpt4o", chat_model());
        set.add_function(
            "summarize",
            FunctionEntry {
                function_type: "chat".to_string(),
            },
        );
        set.add_variant("summarize", variant("baseline", "gpt4o"));

        assert!(set.to_toml().contains("weight = 1\n"));
    }

    #[test]
    fn test_variant_with_missing_model_is_skipped_silently() {
        let mut set = ConfigSet::new();
        set.add_function(
            "summarize",
            FunctionEntry {
                function_type: "chat".to_string(),
            },
        );
        set.add_variant("summarize", variant("orphan", "deleted-model"));

        let toml = set.to_toml();
        assert!(toml.contains("[functions.summarize]\n"));
        assert!(!toml.contains("orphan"));
    }

    #[test]
    fn test_prompt_escaping_round_trips_special_characters() {
        let mut set = ConfigSet::new();
        set.add_model("gpt4o", chat_model());
        set.add_function(
            "summarize",
            FunctionEntry {
                function_type: "chat".to_string(),
            },
        );
        let mut entry = variant("baseline", "gpt4o");
        entry.system_prompt =
            Some("Say \"hello\".\nUse a back\\slash.\r\nDone.".to_string());
        set.add_variant("summarize", entry);

        let toml = set.to_toml();
        let line = toml
            .lines()
            .find(|l| l.starts_with("system_template"))
            .expect("system_template line");
        // No raw quote may terminate the string early; everything is escaped.
        assert_eq!(
            line,
            "system_template = \"Say \\\"hello\\\".\\nUse a back\\\\slash.\\r\\nDone.\""
        );
    }

    #[test]
    fn test_json_schema_is_embedded_as_literal_json() {
        let mut set = ConfigSet::new();
        set.add_model("gpt4o", chat_model());
        set.add_function(
            "extract",
            FunctionEntry {
                function_type: "json".to_string(),
            },
        );
        let mut entry = variant("structured", "gpt4o");
        entry.json_schema = Some(json!({"type": "object", "required": ["name"]}));
        set.add_variant("extract", entry);

        let toml = set.to_toml();
        let line = toml
            .lines()
            .find(|l| l.starts_with("json_schema"))
            .expect("json_schema line");
        let literal = line.trim_start_matches("json_schema = ");
        let parsed: Value = serde_json::from_str(literal).expect("embedded JSON parses");
        assert_eq!(parsed["required"][0], "name");
    }

    #[test]
    fn test_optional_templates_are_omitted() {
        let mut set = ConfigSet::new();
        set.add_model("gpt4o", chat_model());
        set.add_function(
            "summarize",
            FunctionEntry {
                function_type: "chat".to_string(),
            },
        );
        set.add_variant("summarize", variant("bare", "gpt4o"));

        let toml = set.to_toml();
        assert!(!toml.contains("system_template"));
        assert!(!toml.contains("user_template"));
        assert!(!toml.contains("json_schema"));
    }

    #[test]
    fn test_emission_order_is_deterministic_by_name() {
        let mut set = ConfigSet::new();
        set.add_function(
            "zeta",
            FunctionEntry {
                function_type: "chat".to_string(),
            },
        );
        set.add_function(
            "alpha",
            FunctionEntry {
                function_type: "json".to_string(),
            },
        );

        let toml = set.to_toml();
        let alpha = toml.find("[functions.alpha]").expect("alpha emitted");
        let zeta = toml.find("[functions.zeta]").expect("zeta emitted");
        assert!(alpha < zeta);
    }

    #[test]
    fn test_escape_handles_each_character_class() {
        assert_eq!(escape_toml_string("a\\b"), "a\\\\b");
        assert_eq!(escape_toml_string("a\"b"), "a\\\"b");
        assert_eq!(escape_toml_string("a\nb"), "a\\nb");
        assert_eq!(escape_toml_string("a\rb"), "a\\rb");
    }
}
