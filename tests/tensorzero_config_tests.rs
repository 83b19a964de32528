// Integration tests for the TensorZero config builder public API.

use compass_backend::services::tensorzero_config::{
    ConfigSet, FunctionEntry, ModelEntry, VariantEntry,
};
use serde_json::json;

fn model(provider: &str, model_type: &str) -> ModelEntry {
    ModelEntry {
        provider: provider.to_string(),
        model_type: model_type.to_string(),
    }
}

fn function(function_type: &str) -> FunctionEntry {
    FunctionEntry {
        function_type: function_type.to_string(),
    }
}

fn variant(name: &str, model_name: &str, weight: f64) -> VariantEntry {
    VariantEntry {
        name: name.to_string(),
        variant_type: "chat_completion".to_string(),
        model_name: model_name.to_string(),
        weight,
        system_prompt: None,
        user_prompt: None,
        json_schema: None,
    }
}

#[test]
fn full_config_renders_every_section() {
    let mut set = ConfigSet::new();
    set.add_model("gpt4o", model("openai", "gpt-4o"));
    set.add_model("sonnet", model("anthropic", "claude-sonnet-4"));
    set.add_function("draft_copy", function("chat"));
    set.add_function("extract_brief", function("json"));

    let mut primary = variant("primary", "gpt4o", 0.7);
    primary.system_prompt = Some("You are a copywriter.".to_string());
    primary.user_prompt = Some("Write copy for: {input}".to_string());
    set.add_variant("draft_copy", primary);
    set.add_variant("draft_copy", variant("fallback", "sonnet", 0.3));

    let mut structured = variant("structured", "gpt4o", 1.0);
    structured.json_schema = Some(json!({"type": "object"}));
    set.add_variant("extract_brief", structured);

    let toml = set.to_toml();

    assert!(toml.contains("[functions.draft_copy]\ntype = \"chat\"\n"));
    assert!(toml.contains("[functions.draft_copy.variants.primary]"));
    assert!(toml.contains("model = \"openai::gpt-4o\""));
    assert!(toml.contains("[functions.draft_copy.variants.fallback]"));
    assert!(toml.contains("model = \"anthropic::claude-sonnet-4\""));
    assert!(toml.contains("weight = 0.7"));
    assert!(toml.contains("system_template = \"You are a copywriter.\""));
    assert!(toml.contains("user_template = \"Write copy for: {input}\""));
    assert!(toml.contains("[functions.extract_brief]\ntype = \"json\"\n"));
    assert!(toml.contains("json_schema = {\"type\":\"object\"}"));
}

#[test]
fn same_inputs_produce_identical_text() {
    let build = || {
        let mut set = ConfigSet::new();
        set.add_model("gpt4o", model("openai", "gpt-4o"));
        set.add_function("draft_copy", function("chat"));
        set.add_variant("draft_copy", variant("primary", "gpt4o", 1.0));
        set.to_toml()
    };
    assert_eq!(build(), build());
}

#[test]
fn empty_set_renders_empty_text() {
    assert_eq!(ConfigSet::new().to_toml(), "");
}

#[test]
fn multiline_prompt_stays_on_a_single_toml_line() {
    let mut set = ConfigSet::new();
    set.add_model("gpt4o", model("openai", "gpt-4o"));
    set.add_function("draft_copy", function("chat"));
    let mut entry = variant("primary", "gpt4o", 1.0);
    entry.system_prompt = Some("Line one.\nLine two with \"quotes\".".to_string());
    set.add_variant("draft_copy", entry);

    let toml = set.to_toml();
    let template_lines: Vec<&str> = toml
        .lines()
        .filter(|l| l.starts_with("system_template"))
        .collect();
    assert_eq!(template_lines.len(), 1);
    assert!(template_lines[0].contains("\\n"));
    assert!(template_lines[0].contains("\\\"quotes\\\""));
}

#[test]
fn variants_of_unknown_functions_are_not_rendered() {
    // A variant grouped under a function name that has no function entry
    // never appears: emission walks functions, not variant groups.
    let mut set = ConfigSet::new();
    set.add_model("gpt4o", model("openai", "gpt-4o"));
    set.add_variant("ghost_function", variant("primary", "gpt4o", 1.0));

    assert_eq!(set.to_toml(), "");
}
