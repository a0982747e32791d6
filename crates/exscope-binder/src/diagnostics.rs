//! User-facing scope diagnostics.

use crate::declarations::DeclId;
use exscope_common::diagnostics::{diagnostic_codes, get_message_template};
use exscope_common::{Diagnostic, Span, format_message};
use exscope_syntax::ExprIndex;
use serde::Serialize;

/// Why two declarations of the same name conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictReason {
    /// Both live in one region.
    SameRegion,
    /// One region encloses the other.
    EnclosingRegion,
    /// Sibling regions that can both execute.
    SequentialRegions,
}

impl ConflictReason {
    pub fn code(self) -> u32 {
        match self {
            Self::SameRegion => diagnostic_codes::DUPLICATE_DECLARATION_IN_SCOPE,
            Self::EnclosingRegion => diagnostic_codes::DECLARATION_CONFLICTS_WITH_ENCLOSING,
            Self::SequentialRegions => diagnostic_codes::DECLARATION_CONFLICTS_WITH_SEQUENTIAL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ScopeDiagnostic {
    /// `duplicate` reuses the name of the earlier `first` in an overlapping
    /// scope.
    ConflictingDeclaration {
        name: String,
        first: DeclId,
        duplicate: DeclId,
        first_span: Span,
        span: Span,
        reason: ConflictReason,
    },
    UnresolvedName {
        name: String,
        span: Span,
        expression: ExprIndex,
    },
    /// Opt-in lint: the declaration is visible far outside the nested
    /// statement that introduced it.
    NestedBleed {
        name: String,
        declaration: DeclId,
        span: Span,
        depth: u32,
    },
}

impl ScopeDiagnostic {
    pub fn code(&self) -> u32 {
        match self {
            Self::ConflictingDeclaration { reason, .. } => reason.code(),
            Self::UnresolvedName { .. } => diagnostic_codes::CANNOT_FIND_NAME,
            Self::NestedBleed { .. } => diagnostic_codes::DECLARATION_ESCAPES_NESTED_BODIES,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::ConflictingDeclaration { name, .. }
            | Self::UnresolvedName { name, .. }
            | Self::NestedBleed { name, .. } => name,
        }
    }

    /// Primary location.
    pub fn span(&self) -> Span {
        match self {
            Self::ConflictingDeclaration { span, .. }
            | Self::UnresolvedName { span, .. }
            | Self::NestedBleed { span, .. } => *span,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::NestedBleed { .. })
    }

    fn format_args(&self) -> Vec<String> {
        match self {
            Self::NestedBleed { name, depth, .. } => vec![name.clone(), depth.to_string()],
            _ => vec![self.name().to_string()],
        }
    }

    pub fn message(&self) -> String {
        let template = get_message_template(self.code()).unwrap_or("{0}");
        let args = self.format_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        format_message(template, &args)
    }

    /// Convert to a [`Diagnostic`] located in `file`.
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        let span = self.span();
        let args = self.format_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let diag = Diagnostic::from_code(file.to_string(), span.start, span.len(), self.code(), &args);
        match self {
            Self::ConflictingDeclaration {
                name, first_span, ..
            } => {
                let related = get_message_template(diagnostic_codes::FIRST_DECLARED_HERE)
                    .map(|template| format_message(template, &[name.as_str()]))
                    .unwrap_or_default();
                diag.with_related(file.to_string(), first_span.start, first_span.len(), related)
            }
            _ => diag,
        }
    }
}
