//! Component discovery (spec §4.3 phase 4): request tools, prompts,
//! and resources independently; a failure in any one is logged and
//! treated as an empty list rather than failing registration.

use rmcp::RoleClient;
use rmcp::service::RunningService;

use crate::tool_spec::{PromptSpec, ResourceSpec, ToolSpec, qualify};

#[derive(Debug, Default, Clone)]
pub struct DiscoveredComponents {
    pub tools: Vec<ToolSpec>,
    pub prompts: Vec<PromptSpec>,
    pub resources: Vec<ResourceSpec>,
}

pub async fn discover(service: Option<&RunningService<RoleClient, ()>>) -> DiscoveredComponents {
    let Some(service) = service else {
        return DiscoveredComponents::default();
    };

    // server_id is attached by the caller once discovery returns; here we
    // qualify with a placeholder that the Host replaces in `register`.
    DiscoveredComponents {
        tools: discover_tools(service).await,
        prompts: discover_prompts(service).await,
        resources: discover_resources(service).await,
    }
}

async fn discover_tools(service: &RunningService<RoleClient, ()>) -> Vec<ToolSpec> {
    match service.list_tools(None).await {
        Ok(response) => response
            .tools
            .into_iter()
            .map(|tool| ToolSpec {
                qualified_name: tool.name.to_string(),
                original_name: tool.name.to_string(),
                server_id: String::new(),
                description: tool.description.map(|d| d.to_string()),
                input_schema: serde_json::to_value(tool.input_schema.as_ref())
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "failed to discover tools, continuing with empty set");
            Vec::new()
        }
    }
}

async fn discover_prompts(service: &RunningService<RoleClient, ()>) -> Vec<PromptSpec> {
    match service.list_prompts(None).await {
        Ok(response) => response
            .prompts
            .into_iter()
            .map(|prompt| PromptSpec {
                qualified_name: prompt.name.clone(),
                original_name: prompt.name,
                server_id: String::new(),
                description: prompt.description,
            })
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "failed to discover prompts, continuing with empty set");
            Vec::new()
        }
    }
}

async fn discover_resources(service: &RunningService<RoleClient, ()>) -> Vec<ResourceSpec> {
    match service.list_resources(None).await {
        Ok(response) => response
            .resources
            .into_iter()
            .map(|resource| ResourceSpec {
                qualified_name: resource.raw.name.clone(),
                original_name: resource.raw.name,
                server_id: String::new(),
                uri: resource.raw.uri,
                description: resource.raw.description,
            })
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "failed to discover resources, continuing with empty set");
            Vec::new()
        }
    }
}

/// Applies the `"{server_id}-"` qualification to a freshly discovered
/// batch (spec §4.3 phase 4).
pub fn qualify_components(server_id: &str, mut components: DiscoveredComponents) -> DiscoveredComponents {
    for tool in &mut components.tools {
        tool.server_id = server_id.to_string();
        tool.qualified_name = qualify(server_id, &tool.original_name);
    }
    for prompt in &mut components.prompts {
        prompt.server_id = server_id.to_string();
        prompt.qualified_name = qualify(server_id, &prompt.original_name);
    }
    for resource in &mut components.resources {
        resource.server_id = server_id.to_string();
        resource.qualified_name = qualify(server_id, &resource.original_name);
    }
    components
}
