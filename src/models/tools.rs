use serde::{Deserialize, Serialize};

/// Category of an AI chat tool in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Copywriting,
    Support,
    Sales,
    Analysis,
    General,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    Window,
    Fullscreen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCustomization {
    pub primary_color: String,
    pub mode: ToolMode,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub initial_messages: Vec<String>,
    pub placeholder: String,
    pub title: String,
    pub subtitle: String,
    pub customization: ToolCustomization,
}

/// An entry in the AI tool catalog. The catalog is code-defined; chat
/// sessions reference tools by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiTool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    pub webhook_url: String,
    pub is_available: bool,
    pub features: Vec<String>,
    pub config: ToolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUsageStats {
    pub total_sessions: i64,
    pub total_messages: i64,
    pub average_session_duration: f64,
    pub most_used_features: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// The tool catalog served by GET /api/ai-tools.
#[must_use]
pub fn catalog() -> Vec<AiTool> {
    vec![
        AiTool {
            id: "copywriter".to_string(),
            name: "Copywriting Pro".to_string(),
            description: "Advanced assistant for persuasive copy, ads and high-converting marketing content".to_string(),
            category: ToolCategory::Copywriting,
            webhook_url: "https://hooks.compass.example.com/webhook/copywriter/chat".to_string(),
            is_available: true,
            features: strings(&[
                "Sales emails",
                "Social media ads",
                "Landing pages",
                "Video scripts",
                "Persuasive headlines",
            ]),
            config: ToolConfig {
                initial_messages: strings(&[
                    "Hi there! 👋",
                    "I'm your copywriting specialist. Shall we write something that converts?",
                ]),
                placeholder: "Describe what you need to create...".to_string(),
                title: "Copywriting Pro".to_string(),
                subtitle: "Copy that sells and converts".to_string(),
                customization: ToolCustomization {
                    primary_color: "#8b5cf6".to_string(),
                    mode: ToolMode::Fullscreen,
                    position: Some("bottom-right".to_string()),
                },
            },
        },
        AiTool {
            id: "customer_support".to_string(),
            name: "Support Assistant".to_string(),
            description: "Smart assistant for customer service and technical troubleshooting".to_string(),
            category: ToolCategory::Support,
            webhook_url: "https://hooks.compass.example.com/webhook/support/chat".to_string(),
            is_available: false,
            features: strings(&[
                "Automatic FAQ",
                "Ticket triage",
                "Basic technical support",
                "Smart escalation",
            ]),
            config: ToolConfig {
                initial_messages: strings(&[
                    "Hello! How can I help you today?",
                    "I'm here to resolve your questions quickly.",
                ]),
                placeholder: "Describe your problem or question...".to_string(),
                title: "Support Assistant".to_string(),
                subtitle: "Smart support, 24/7".to_string(),
                customization: ToolCustomization {
                    primary_color: "#8b5cf6".to_string(),
                    mode: ToolMode::Window,
                    position: Some("bottom-right".to_string()),
                },
            },
        },
        AiTool {
            id: "sales".to_string(),
            name: "AI Sales Consultant".to_string(),
            description: "Specialist in lead qualification and closing deals".to_string(),
            category: ToolCategory::Sales,
            webhook_url: "https://hooks.compass.example.com/webhook/sales/chat".to_string(),
            is_available: false,
            features: strings(&[
                "Lead qualification",
                "Closing techniques",
                "Common objections",
                "Sales scripts",
                "Automatic follow-up",
            ]),
            config: ToolConfig {
                initial_messages: strings(&[
                    "Hey! Ready to boost your sales?",
                    "I can help you qualify leads and close more deals.",
                ]),
                placeholder: "Tell me about your prospect or sales process...".to_string(),
                title: "AI Sales Consultant".to_string(),
                subtitle: "Maximize your conversions".to_string(),
                customization: ToolCustomization {
                    primary_color: "#f59e0b".to_string(),
                    mode: ToolMode::Fullscreen,
                    position: Some("bottom-right".to_string()),
                },
            },
        },
        AiTool {
            id: "analysis".to_string(),
            name: "AI Data Analyst".to_string(),
            description: "Assistant for data analysis, metrics and business insights".to_string(),
            category: ToolCategory::Analysis,
            webhook_url: "https://hooks.compass.example.com/webhook/analysis/chat".to_string(),
            is_available: false,
            features: strings(&[
                "Metric analysis",
                "Automatic reports",
                "Pattern detection",
                "Forecasts and trends",
            ]),
            config: ToolConfig {
                initial_messages: strings(&[
                    "Hello! Shall we dig into your data?",
                    "I can help you extract valuable insights from your numbers.",
                ]),
                placeholder: "Describe the data you want to analyze...".to_string(),
                title: "AI Data Analyst".to_string(),
                subtitle: "Insights backed by data".to_string(),
                customization: ToolCustomization {
                    primary_color: "#3b82f6".to_string(),
                    mode: ToolMode::Window,
                    position: Some("bottom-right".to_string()),
                },
            },
        },
    ]
}

/// Usage statistics per tool id, as surfaced by GET /api/ai-tools/{id}/stats.
#[must_use]
pub fn usage_stats(tool_id: &str) -> Option<ToolUsageStats> {
    match tool_id {
        "copywriter" => Some(ToolUsageStats {
            total_sessions: 1247,
            total_messages: 8934,
            average_session_duration: 12.5,
            most_used_features: strings(&[
                "Sales emails",
                "Persuasive headlines",
                "Social media ads",
            ]),
        }),
        "customer_support" => Some(ToolUsageStats {
            total_sessions: 892,
            total_messages: 5621,
            average_session_duration: 8.2,
            most_used_features: strings(&[
                "Automatic FAQ",
                "Ticket triage",
                "Basic technical support",
            ]),
        }),
        "sales" => Some(ToolUsageStats {
            total_sessions: 634,
            total_messages: 4127,
            average_session_duration: 15.8,
            most_used_features: strings(&[
                "Lead qualification",
                "Sales scripts",
                "Closing techniques",
            ]),
        }),
        "analysis" => Some(ToolUsageStats {
            total_sessions: 0,
            total_messages: 0,
            average_session_duration: 0.0,
            most_used_features: Vec::new(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        let tools = catalog();
        let mut ids: Vec<_> = tools.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), tools.len());
    }

    #[test]
    fn test_every_catalog_tool_has_stats() {
        for tool in catalog() {
            assert!(
                usage_stats(&tool.id).is_some(),
                "missing stats for tool {}",
                tool.id
            );
        }
    }

    #[test]
    fn test_unknown_tool_has_no_stats() {
        assert!(usage_stats("does-not-exist").is_none());
    }

    #[test]
    fn test_catalog_serializes_snake_case() {
        let tools = catalog();
        let value = serde_json::to_value(&tools).expect("serialize catalog");
        assert_eq!(value[0]["category"], "copywriting");
        assert_eq!(value[0]["config"]["customization"]["mode"], "fullscreen");
    }
}
