//! Conversions between engine results and LSP types.

use std::collections::HashMap;

use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Diagnostic, DiagnosticSeverity,
    DiagnosticTag, NumberOrString, Position, Range, TextEdit, Url, WorkspaceEdit,
};

use deadcss_core::{
    removal_edit, SourcePosition, UnusedRule, DIAGNOSTIC_CODE, DIAGNOSTIC_MESSAGE,
    DIAGNOSTIC_SOURCE, FIX_TITLE,
};

/// 1-based engine position to 0-based LSP position (both UTF-16 columns).
pub fn to_lsp_position(pos: SourcePosition) -> Position {
    Position {
        line: pos.line.saturating_sub(1) as u32,
        character: pos.column.saturating_sub(1) as u32,
    }
}

/// Warning covering the whole rule, so deleting its range deletes the rule.
pub fn rule_diagnostic(text: &str, rule: &UnusedRule) -> Diagnostic {
    let edit = removal_edit(text, rule);
    Diagnostic {
        range: Range {
            start: to_lsp_position(edit.start),
            end: to_lsp_position(edit.end),
        },
        severity: Some(DiagnosticSeverity::WARNING),
        code: Some(NumberOrString::String(DIAGNOSTIC_CODE.to_string())),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: DIAGNOSTIC_MESSAGE.to_string(),
        related_information: None,
        tags: Some(vec![DiagnosticTag::UNNECESSARY]),
        data: None,
    }
}

fn is_unused_class_diagnostic(diagnostic: &Diagnostic) -> bool {
    matches!(&diagnostic.code, Some(NumberOrString::String(code)) if code == DIAGNOSTIC_CODE)
}

/// One preferred quick fix per unused-class diagnostic, deleting its range.
pub fn quick_fixes(uri: &Url, diagnostics: &[Diagnostic]) -> Vec<CodeActionOrCommand> {
    diagnostics
        .iter()
        .filter(|d| is_unused_class_diagnostic(d))
        .map(|diagnostic| {
            let edit = TextEdit {
                range: diagnostic.range,
                new_text: String::new(),
            };
            CodeActionOrCommand::CodeAction(CodeAction {
                title: FIX_TITLE.to_string(),
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: Some(vec![diagnostic.clone()]),
                edit: Some(WorkspaceEdit {
                    changes: Some(HashMap::from([(uri.clone(), vec![edit])])),
                    ..WorkspaceEdit::default()
                }),
                is_preferred: Some(true),
                ..CodeAction::default()
            })
        })
        .collect()
}
