//! deadcss LSP Server - real-time unused CSS class diagnostics.
//!
//! Provides IDE integration with:
//! - Live diagnostics on stylesheet open/change
//! - Re-checks of open stylesheets when consumer files change
//! - A preferred quick fix removing the flagged rule
//!
//! Passes never run on the protocol task: each one is debounced, runs on a
//! blocking thread, and is dropped if a newer pass for the same document
//! was scheduled meanwhile.

mod convert;
mod queue;
mod settings;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, warn};

use deadcss_core::{
    analyze, init_structured_logging, load_detect_options, resolve_project_root, unused_rules,
    Dialect, ProjectSnapshot, StylesheetDocument,
};

use crate::convert::{quick_fixes, rule_diagnostic};
use crate::queue::{DetectionQueue, DEFAULT_DEBOUNCE};
use crate::settings::{parse_settings, FinderSettings};

/// State shared between protocol handlers and detection tasks.
struct ServerState {
    client: Client,
    /// Text of every open document, kept in sync (full sync).
    documents: RwLock<HashMap<Url, String>>,
    workspace_folders: RwLock<Vec<PathBuf>>,
    settings: RwLock<FinderSettings>,
    /// Diagnostics last published per document.
    published: RwLock<HashMap<Url, Vec<Diagnostic>>>,
}

/// deadcss Language Server.
struct DeadcssLsp {
    state: Arc<ServerState>,
    queue: Arc<DetectionQueue>,
}

fn is_stylesheet(uri: &Url) -> bool {
    uri.to_file_path()
        .ok()
        .is_some_and(|p| Dialect::from_path(&p).is_some())
}

fn folder_paths(folders: &[WorkspaceFolder]) -> Vec<PathBuf> {
    folders
        .iter()
        .filter_map(|f| f.uri.to_file_path().ok())
        .collect()
}

/// One detection pass over an in-memory stylesheet. `None` means skipped.
fn detect_document(
    path: PathBuf,
    text: String,
    folders: &[PathBuf],
    settings: FinderSettings,
) -> Option<Vec<Diagnostic>> {
    let root = resolve_project_root(&path, folders)?;

    let mut options = load_detect_options(&root);
    if let Some(enabled) = settings.enable_fallback_search {
        options.enable_fallback_search = enabled;
    }
    let snapshot = match ProjectSnapshot::load(&root, options) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(root = %root.display(), error = %format!("{:#}", e), "candidate discovery failed");
            return None;
        }
    };

    let document = StylesheetDocument::new(path, text);
    let report = analyze(&document, &snapshot.context())?;
    let rules = unused_rules(&document.text, report.dialect, &report.unused);
    Some(
        rules
            .iter()
            .map(|rule| rule_diagnostic(&document.text, rule))
            .collect(),
    )
}

impl ServerState {
    async fn run_pass(&self, queue: &DetectionQueue, uri: Url, generation: u64) {
        let Ok(path) = uri.to_file_path() else {
            return;
        };
        let Some(text) = self.documents.read().await.get(&uri).cloned() else {
            return;
        };
        let folders = self.workspace_folders.read().await.clone();
        let settings = *self.settings.read().await;

        let outcome =
            tokio::task::spawn_blocking(move || detect_document(path, text, &folders, settings))
                .await;
        let diagnostics = match outcome {
            Ok(Some(diagnostics)) => diagnostics,
            Ok(None) => {
                debug!(%uri, "pass skipped, keeping previous diagnostics");
                return;
            }
            Err(e) => {
                self.log_error(&format!("Detection failed for {}: {}", uri, e))
                    .await;
                return;
            }
        };

        if !queue.is_current(&uri, generation) || !self.documents.read().await.contains_key(&uri) {
            return;
        }

        self.published
            .write()
            .await
            .insert(uri.clone(), diagnostics.clone());
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    async fn log_info(&self, message: &str) {
        self.client.log_message(MessageType::INFO, message).await;
    }

    async fn log_error(&self, message: &str) {
        self.client.log_message(MessageType::ERROR, message).await;
    }
}

impl DeadcssLsp {
    fn new(client: Client) -> Self {
        Self {
            state: Arc::new(ServerState {
                client,
                documents: RwLock::new(HashMap::new()),
                workspace_folders: RwLock::new(Vec::new()),
                settings: RwLock::new(FinderSettings::default()),
                published: RwLock::new(HashMap::new()),
            }),
            queue: DetectionQueue::new(DEFAULT_DEBOUNCE),
        }
    }

    /// Schedule a pass for one stylesheet.
    fn schedule(&self, uri: Url) {
        let state = Arc::clone(&self.state);
        let queue = Arc::clone(&self.queue);
        let key = uri.clone();
        self.queue.schedule(uri, move |generation| async move {
            state.run_pass(&queue, key, generation).await;
        });
    }

    /// Schedule a pass for every open stylesheet.
    async fn schedule_open_stylesheets(&self) {
        let uris: Vec<Url> = self
            .state
            .documents
            .read()
            .await
            .keys()
            .filter(|uri| is_stylesheet(uri))
            .cloned()
            .collect();
        for uri in uris {
            self.schedule(uri);
        }
    }

    /// A document event: re-check it if it is a stylesheet, otherwise the
    /// open stylesheets that may use it.
    async fn on_document_event(&self, uri: Url) {
        if is_stylesheet(&uri) {
            self.schedule(uri);
        } else {
            self.schedule_open_stylesheets().await;
        }
    }

    async fn register_file_watcher(&self) {
        let registration = match watcher_registration() {
            Ok(registration) => registration,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "file watcher registration skipped");
                return;
            }
        };
        if let Err(e) = self.state.client.register_capability(vec![registration]).await {
            debug!(error = %e, "client declined file watching");
        }
    }
}

/// Dynamic registration for `workspace/didChangeWatchedFiles` on every file.
fn watcher_registration() -> Result<Registration> {
    let options = DidChangeWatchedFilesRegistrationOptions {
        watchers: vec![FileSystemWatcher {
            glob_pattern: GlobPattern::String("**/*".to_string()),
            kind: None,
        }],
    };
    Ok(Registration {
        id: "deadcss-watched-files".to_string(),
        method: "workspace/didChangeWatchedFiles".to_string(),
        register_options: Some(
            serde_json::to_value(options).context("Failed to encode watcher options")?,
        ),
    })
}

#[tower_lsp::async_trait]
impl LanguageServer for DeadcssLsp {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        let mut folders = params
            .workspace_folders
            .as_deref()
            .map(folder_paths)
            .unwrap_or_default();
        #[allow(deprecated)]
        let root_uri = params.root_uri;
        if folders.is_empty() {
            if let Some(path) = root_uri.and_then(|u| u.to_file_path().ok()) {
                folders.push(path);
            }
        }
        *self.state.workspace_folders.write().await = folders;

        if let Some(settings) = params.initialization_options.as_ref().and_then(parse_settings) {
            *self.state.settings.write().await = settings;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                        ..Default::default()
                    },
                )),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        ..Default::default()
                    },
                )),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "deadcss-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.register_file_watcher().await;
        self.state.log_info("deadcss LSP server initialized").await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        debug!(pending = self.queue.pending(), "cancelling detection passes");
        self.queue.cancel_all();
        self.state.published.write().await.clear();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.state
            .documents
            .write()
            .await
            .insert(uri.clone(), params.text_document.text);
        self.on_document_event(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change holds the whole text
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.state
            .documents
            .write()
            .await
            .insert(uri.clone(), change.text);
        self.on_document_event(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        // Consumer edits only reach detection through the disk
        if !is_stylesheet(&params.text_document.uri) {
            self.schedule_open_stylesheets().await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.queue.cancel(&uri);
        self.state.documents.write().await.remove(&uri);
        if self.state.published.write().await.remove(&uri).is_some() {
            self.state.client.publish_diagnostics(uri, vec![], None).await;
        }
    }

    async fn did_change_watched_files(&self, _: DidChangeWatchedFilesParams) {
        self.schedule_open_stylesheets().await;
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        {
            let removed = folder_paths(&params.event.removed);
            let mut folders = self.state.workspace_folders.write().await;
            folders.retain(|f| !removed.contains(f));
            for added in folder_paths(&params.event.added) {
                if !folders.contains(&added) {
                    folders.push(added);
                }
            }
        }
        self.schedule_open_stylesheets().await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match parse_settings(&params.settings) {
            Some(settings) => *self.state.settings.write().await = settings,
            None => return,
        }
        self.schedule_open_stylesheets().await;
    }

    async fn code_action(&self, params: CodeActionParams) -> LspResult<Option<CodeActionResponse>> {
        let actions = quick_fixes(&params.text_document.uri, &params.context.diagnostics);
        Ok((!actions.is_empty()).then_some(actions))
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadcss-lsp internal error: {}", info);
    }));

    // stdout carries the protocol; logs go to stderr
    init_structured_logging();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(DeadcssLsp::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
