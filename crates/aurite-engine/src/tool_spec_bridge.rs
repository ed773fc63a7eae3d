//! Narrows the Host's `ToolSpec` (which carries MCP-shaped metadata
//! like `server_id`) down to the provider-agnostic shape the Model
//! Client contract expects (spec §4.5 step 2: "filtered to
//! `agent_cfg.tool_servers` and minus `excluded_components`").

pub fn resolve_tool_specs(
    host: &aurite_mcp::Host,
    tool_servers: &[String],
    excluded_components: &[String],
) -> Vec<aurite_llm::ToolSpec> {
    host.tool_specs(tool_servers)
        .into_iter()
        .filter(|tool| {
            !excluded_components.contains(&tool.qualified_name)
                && !excluded_components.contains(&tool.original_name)
        })
        .map(|tool| aurite_llm::ToolSpec {
            name: tool.qualified_name,
            description: tool.description,
            input_schema: tool.input_schema,
        })
        .collect()
}
