use crate::document::DocumentStore;
use serde_json::Value;
use svg_fold_core::settings::IDENTIFIER;
use svg_fold_core::{RegionCache, Settings, TextBuffer, TextDocument};
use tokio::sync::RwLock;
use tower_lsp_server::ls_types::{
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, FoldingRange, FoldingRangeParams, FoldingRangeProviderCapability,
    InitializeParams, InitializeResult, InitializedParams, MessageType, ServerCapabilities,
    ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp_server::{Client, LanguageServer, jsonrpc::Result};

pub struct Backend {
    client: Client,
    documents: DocumentStore,
    regions: RegionCache<TextBuffer>,
    settings: RwLock<Settings>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            regions: RegionCache::new(),
            settings: RwLock::new(Settings::default()),
        }
    }

    fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
            ..Default::default()
        }
    }

    async fn replace_settings(&self, value: &Value) {
        let settings = settings_from_value(value);
        tracing::debug!("loaded configuration: {:?}", settings);
        *self.settings.write().await = settings;
    }
}

/// Accepts the bare settings object or one nested under the section name.
fn settings_from_value(value: &Value) -> Settings {
    let section = value.get(IDENTIFIER).unwrap_or(value);
    Settings::load(section)
}

impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("initializing svg-fold-lsp server");

        if let Some(options) = params.initialization_options {
            self.replace_settings(&options).await;
        }

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "svg-fold-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("svg-fold-lsp server initialized");
        self.client
            .log_message(MessageType::INFO, "svg-fold-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down svg-fold-lsp server");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        tracing::info!("document opened: {:?}", document.uri);
        self.documents.open(
            document.uri,
            document.language_id,
            document.text,
            document.version,
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync: the last change carries the whole text.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.change(&uri, change.text, version);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document closed: {:?}", uri);
        self.documents.close(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        tracing::info!("configuration changed");
        self.replace_settings(&params.settings).await;
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let uri = params.text_document.uri;
        let Some(document) = self.documents.get(&uri) else {
            tracing::debug!("folding range request for unknown document: {:?}", uri);
            return Ok(Some(Vec::new()));
        };

        let supported = self.settings.read().await.supports(document.language_id());
        if !supported {
            tracing::debug!(
                "language {} not configured for svg folding",
                document.language_id()
            );
            return Ok(Some(Vec::new()));
        }

        let ranges = self.regions.get(&document).folding_ranges.clone();
        tracing::debug!("returning {} folding ranges", ranges.len());
        Ok(Some(ranges))
    }
}
