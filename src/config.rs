use std::path::PathBuf;

use clap::Parser;

/// 起動設定。CLI引数 > 環境変数 > デフォルト の順で決まる。
#[derive(Debug, Clone, Parser)]
#[command(name = "bookshelf-mcp", version, about = "Personal bookshelf as an MCP server (stdio)")]
pub struct Config {
    /// JSON file backing the shelf storage
    #[arg(env = "BOOKSHELF_PATH", default_value = "bookshelf.json")]
    pub storage: PathBuf,

    /// tracing filter directive (RUST_LOG takes precedence when set)
    #[arg(long, default_value = "bookshelf_mcp=info")]
    pub log_filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["bookshelf-mcp"]).unwrap();
        assert_eq!(config.log_filter, "bookshelf_mcp=info");
    }

    #[test]
    fn explicit_storage_path() {
        let config =
            Config::try_parse_from(["bookshelf-mcp", "/tmp/shelf.json", "--log-filter", "debug"])
                .unwrap();
        assert_eq!(config.storage, PathBuf::from("/tmp/shelf.json"));
        assert_eq!(config.log_filter, "debug");
    }
}
