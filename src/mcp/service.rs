//! MCP service implementation using rmcp.
//!
//! Tables are exposed as resources keyed by table name, and the single
//! `execute_query` tool runs arbitrary SQL.

use crate::db::ConnectionFactory;
use crate::error::DbError;
use crate::models::{QueryRequest, Resource as TableResource};
use crate::tools::{QueryToolHandler, ResourceToolHandler};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, Content, Implementation,
        ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion, RawResource,
        ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_router,
};
use std::sync::Arc;
use tracing::debug;

/// MIME type of every resource and tool payload.
pub const JSON_MIME_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct SingleStoreService {
    resources: ResourceToolHandler,
    queries: QueryToolHandler,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl SingleStoreService {
    /// Create a new service backed by `factory`.
    pub fn new(factory: Arc<ConnectionFactory>) -> Self {
        Self {
            resources: ResourceToolHandler::new(factory.clone()),
            queries: QueryToolHandler::new(factory),
            tool_router: Self::tool_router(),
        }
    }
}

/// Map a table descriptor to an MCP resource. The URI is the bare table name.
fn to_mcp_resource(table: TableResource) -> Resource {
    let mut raw = RawResource::new(table.id.clone(), table.attributes.name);
    raw.description = table.attributes.comment.filter(|c| !c.is_empty());
    raw.mime_type = Some(JSON_MIME_TYPE.to_string());
    raw.no_annotation()
}

fn json_text<T: serde::Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string(value)
        .map_err(|e| McpError::from(DbError::internal(format!("Serialization failed: {e}"))))
}

#[tool_router]
impl SingleStoreService {
    #[tool(
        description = "Execute a SQL query on the SingleStore database.\nReturns {\"data\": [...]} for statements that produce rows, or {\"affected_rows\": n} otherwise.\nUse %s or ? for positional placeholders and %(name)s for named ones; pass values in `parameters` (array, or object for named)."
    )]
    async fn execute_query(
        &self,
        Parameters(request): Parameters<QueryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = self.queries.execute(request).await.map_err(McpError::from)?;
        Ok(CallToolResult::success(vec![Content::text(json_text(
            &result,
        )?)]))
    }
}

impl ServerHandler for SingleStoreService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "singlestore-mcp-server".to_owned(),
                title: Some("SingleStore MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "SingleStore database access.\n\
                \n\
                - Each table in the current database is a resource; its URI is the table name.\n\
                - Reading a resource returns all of its rows as {\"data\": [...]}.\n\
                - `execute_query` runs any SQL statement. Binary columns are returned as\n\
                  \"<binary data length=N>\" placeholders."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let tables = self.resources.list_resources().await?;
        let resources = tables.into_iter().map(to_mcp_resource).collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri;
        let rows = self.resources.read_resource(&uri).await?;
        let text = json_text(&serde_json::json!({ "data": rows }))?;

        let mut contents = ResourceContents::text(text, uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
            *mime_type = Some(JSON_MIME_TYPE.to_string());
        }
        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_router.list_all()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if !self.tool_router.has_route(request.name.as_ref()) {
            debug!(tool = %request.name, "Rejected call to unknown tool");
            return Err(DbError::unknown_tool(request.name.as_ref()).into());
        }
        let tcc = ToolCallContext::new(self, request, context);
        self.tool_router.call(tcc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableInfo;

    #[test]
    fn test_to_mcp_resource() {
        let table = TableResource::from(TableInfo {
            name: "orders".to_string(),
            table_type: "BASE TABLE".to_string(),
            comment: Some("Customer orders".to_string()),
            created_at: None,
        });
        let resource = to_mcp_resource(table);
        assert_eq!(resource.raw.uri, "orders");
        assert_eq!(resource.raw.name, "orders");
        assert_eq!(resource.raw.description.as_deref(), Some("Customer orders"));
        assert_eq!(resource.raw.mime_type.as_deref(), Some(JSON_MIME_TYPE));
    }

    #[test]
    fn test_empty_comment_has_no_description() {
        let table = TableResource::from(TableInfo {
            name: "t".to_string(),
            table_type: "BASE TABLE".to_string(),
            comment: Some(String::new()),
            created_at: None,
        });
        assert!(to_mcp_resource(table).raw.description.is_none());
    }
}
