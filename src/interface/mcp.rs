//! MCP Server for bookshelf-mcp
//!
//! MCP Protocol (stdio) <-> application::ShelfService
//!
//! 6 tools: add_book, bookshelf, search_books, mark_completed, undo_completed, remove_book

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::confirm::{Answer, Change, ChangeOutcome};
use crate::application::error::AppError;
use crate::application::render::{book_line, render_shelf, search_summary};
use crate::application::service::ShelfService;
use crate::domain::model::book::{NewBook, Year};
use crate::domain::model::id::BookId;
use crate::infra::json_store::JsonFileStorage;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。storage_pathは本棚を保存するJSONファイル。
pub async fn run(storage_path: PathBuf) -> anyhow::Result<()> {
    tracing::info!(path = %storage_path.display(), "starting bookshelf MCP server");
    let server = BookshelfMcpServer::open(storage_path)?;
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct BookshelfMcpServer {
    shelf: Arc<Mutex<ShelfService<JsonFileStorage>>>,
    tool_router: ToolRouter<Self>,
}

impl BookshelfMcpServer {
    /// 保存済みの本棚を読み込んだServerを返す。
    /// 画面は各tool呼び出しの応答として描くので、再描画通知はログに残すだけ。
    fn open(storage_path: PathBuf) -> Result<Self, AppError> {
        let mut svc = ShelfService::new(JsonFileStorage::new(storage_path));
        svc.on_render(|| tracing::debug!("shelf changed; redraw"));
        svc.on_saved(|| tracing::debug!("shelf saved"));
        svc.start()?;

        Ok(Self {
            shelf: Arc::new(Mutex::new(svc)),
            tool_router: Self::tool_router(),
        })
    }

    fn to_mcp_error(e: AppError) -> McpError {
        McpError::internal_error(format!("{e}"), None)
    }

    /// 確認付き操作の共通処理。
    /// confirm省略時は確認内容だけを返し、何も変更しない。
    async fn apply_change(
        &self,
        req: McpChangeRequest,
        change: Change,
    ) -> Result<CallToolResult, McpError> {
        let id = parse_book_id(&req.id)?;
        let mut svc = self.shelf.lock().await;

        let Some(decision) = req.confirm else {
            let Some(book) = svc.shelf().find_by_id(id) else {
                return Ok(no_changes());
            };
            if !change.applies_to(book) {
                return Ok(no_changes());
            }
            let prompt = change.prompt();
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "{} {}\n{}\nCall again with confirm=true to proceed or confirm=false to cancel.",
                prompt.title,
                prompt.text,
                book_line(book)
            ))]));
        };

        let answer = Answer(decision);
        let outcome = match change {
            Change::MarkCompleted => svc.mark_completed(id, &answer).await,
            Change::UndoCompleted => svc.undo_completed(id, &answer).await,
            Change::Remove => svc.remove_book(id, &answer).await,
        }
        .map_err(Self::to_mcp_error)?;

        let text = match outcome {
            ChangeOutcome::Applied(notice) => {
                format!("{}\n\n{}", notice.message, render_shelf(svc.shelf(), ""))
            }
            ChangeOutcome::Declined(notice) => notice.message,
            ChangeOutcome::NotFound | ChangeOutcome::NotApplicable => return Ok(no_changes()),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for BookshelfMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bookshelf-mcp".to_string(),
                title: Some("Bookshelf MCP — To read & Completed".to_string()),
                description: Some(
                    "Personal bookshelf split into 'to read' and 'completed' sections, \
                     persisted to a local JSON file."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Track books to read and books already completed.\n\
                 \n\
                 Tools: `bookshelf` to view, `add_book` to add, `search_books` to filter by title. \
                 `mark_completed`, `undo_completed` and `remove_book` ask for confirmation first: \
                 call without `confirm` to see the question, then again with confirm=true/false."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

/// 数値または数字文字列（フォーム入力由来）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
enum IntLike {
    Number(i64),
    Text(String),
}

impl IntLike {
    fn to_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

fn parse_year(v: &IntLike) -> Result<Year, McpError> {
    v.to_text()
        .parse::<Year>()
        .map_err(|e| McpError::invalid_params(format!("{e}"), None))
}

fn parse_book_id(v: &IntLike) -> Result<BookId, McpError> {
    let s = v.to_text();
    s.parse::<BookId>()
        .map_err(|_| McpError::invalid_params(format!("Invalid book id: '{s}'"), None))
}

/// 前後の空白を除き、空なら invalid_params。
fn required_text(field: &str, value: &str) -> Result<String, McpError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params(
            format!("{field} must not be empty"),
            None,
        ));
    }
    Ok(trimmed.to_string())
}

fn no_changes() -> CallToolResult {
    CallToolResult::success(vec![Content::text("No changes.")])
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpAddBookRequest {
    #[schemars(description = "Book title (required)")]
    pub title: String,
    #[schemars(description = "Author name (required)")]
    pub author: String,
    #[schemars(description = "Publication year, as a number or numeric string (e.g. 1965)")]
    pub year: IntLike,
    #[schemars(description = "Already read? Goes to 'Completed' when true (default: false)")]
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookshelfRequest {
    #[schemars(description = "Optional title filter (case-insensitive substring)")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpSearchRequest {
    #[schemars(description = "Title filter (case-insensitive substring), e.g. 'du' matches 'Dune'")]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpChangeRequest {
    #[schemars(description = "Book id as shown in `bookshelf` output (e.g. 1700000000000)")]
    pub id: IntLike,
    #[schemars(
        description = "Omit to see the confirmation question. true = proceed, false = cancel."
    )]
    pub confirm: Option<bool>,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl BookshelfMcpServer {
    #[tool(
        name = "add_book",
        description = "Add a book to the shelf. It lands in 'To read' unless is_completed is true.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn add_book(
        &self,
        Parameters(req): Parameters<McpAddBookRequest>,
    ) -> Result<CallToolResult, McpError> {
        let new_book = NewBook {
            title: required_text("title", &req.title)?,
            author: required_text("author", &req.author)?,
            year: parse_year(&req.year)?,
            is_completed: req.is_completed,
        };

        let mut svc = self.shelf.lock().await;
        // 保存に失敗しても本はメモリ上の末尾に追加済み
        let saved = svc.add_book(new_book);
        let book = match &saved {
            Ok(id) => svc.shelf().find_by_id(*id),
            Err(_) => svc.shelf().books().last(),
        }
        .ok_or_else(|| McpError::internal_error("added book is missing", None))?;

        let section = if book.is_completed() { "Completed" } else { "To read" };
        let mut text = format!("Added to {section}: {}", book_line(book));
        if let Err(e) = saved {
            text.push_str(&format!(
                "\nWarning: not saved ({e}). The book is kept for this session only."
            ));
        }
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "bookshelf",
        description = "Show the shelf in two sections, 'To read' and 'Completed', with book ids. Optional title filter.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn bookshelf(
        &self,
        Parameters(req): Parameters<McpBookshelfRequest>,
    ) -> Result<CallToolResult, McpError> {
        let svc = self.shelf.lock().await;
        let query = req.query.unwrap_or_default();
        let output = render_shelf(svc.shelf(), &query);
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "search_books",
        description = "Filter the shelf by title (case-insensitive substring) and show matching books in both sections.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn search_books(
        &self,
        Parameters(req): Parameters<McpSearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let svc = self.shelf.lock().await;
        let view = svc.view(&req.query);
        if let Some(summary) = search_summary(&view, &req.query) {
            return Ok(CallToolResult::success(vec![Content::text(summary)]));
        }
        Ok(CallToolResult::success(vec![Content::text(render_shelf(
            svc.shelf(),
            &req.query,
        ))]))
    }

    #[tool(
        name = "mark_completed",
        description = "Move a book from 'To read' to 'Completed'. Asks for confirmation: call without `confirm` first.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn mark_completed(
        &self,
        Parameters(req): Parameters<McpChangeRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.apply_change(req, Change::MarkCompleted).await
    }

    #[tool(
        name = "undo_completed",
        description = "Move a book from 'Completed' back to 'To read'. Asks for confirmation: call without `confirm` first.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn undo_completed(
        &self,
        Parameters(req): Parameters<McpChangeRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.apply_change(req, Change::UndoCompleted).await
    }

    #[tool(
        name = "remove_book",
        description = "Delete a book from the shelf. Cannot be undone. Asks for confirmation: call without `confirm` first.",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = false,
            open_world_hint = false
        )
    )]
    async fn remove_book(
        &self,
        Parameters(req): Parameters<McpChangeRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.apply_change(req, Change::Remove).await
    }
}

// =============================================================================
// Tests
// =============================================================================
