use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::ApiResponse;
use crate::models::tools::{self, AiTool, ToolCategory, ToolUsageStats};
use crate::state::AppState;

pub fn tool_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tools_handler))
        .route("/{id}/stats", get(tool_stats_handler))
}

/// Catalog payload: every tool plus availability and category summaries.
#[derive(Serialize, Debug)]
pub struct ToolCatalog {
    pub tools: Vec<AiTool>,
    pub total: usize,
    pub available: usize,
    pub categories: Vec<ToolCategory>,
}

#[instrument(err)]
pub async fn list_tools_handler() -> Result<Json<ApiResponse<ToolCatalog>>, AppError> {
    let tools = tools::catalog();
    let available = tools.iter().filter(|tool| tool.is_available).count();

    let mut categories: Vec<ToolCategory> = Vec::new();
    for tool in &tools {
        if !categories.contains(&tool.category) {
            categories.push(tool.category);
        }
    }

    let total = tools.len();
    Ok(Json(ApiResponse::new(ToolCatalog {
        tools,
        total,
        available,
        categories,
    })))
}

#[instrument(err)]
pub async fn tool_stats_handler(
    Path(tool_id): Path<String>,
) -> Result<Json<ApiResponse<ToolUsageStats>>, AppError> {
    let stats = tools::usage_stats(&tool_id)
        .ok_or_else(|| AppError::NotFound("No statistics found for this tool".to_string()))?;
    Ok(Json(ApiResponse::new(stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_tools_counts_available() {
        let response = list_tools_handler().await.expect("catalog");
        let Json(body) = response;
        assert!(body.success);
        assert_eq!(body.data.total, body.data.tools.len());
        assert!(body.data.available <= body.data.total);
        assert!(!body.data.categories.is_empty());
    }

    #[tokio::test]
    async fn test_tool_stats_unknown_id_is_404() {
        let result = tool_stats_handler(Path("nope".to_string())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
