//! Diagnostic message table.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const DUPLICATE_DECLARATION_IN_SCOPE: u32 = 2001;
    pub const DECLARATION_CONFLICTS_WITH_ENCLOSING: u32 = 2002;
    pub const DECLARATION_CONFLICTS_WITH_SEQUENTIAL: u32 = 2003;
    pub const CANNOT_FIND_NAME: u32 = 2004;
    pub const DECLARATION_ESCAPES_NESTED_BODIES: u32 = 2005;
    pub const FIRST_DECLARED_HERE: u32 = 2006;
}

pub mod diagnostic_messages {
    pub const DUPLICATE_DECLARATION_IN_SCOPE: &str =
        "A local variable named '{0}' is already defined in this scope.";
    pub const DECLARATION_CONFLICTS_WITH_ENCLOSING: &str = "A local named '{0}' cannot be declared in this scope because '{0}' is already declared in an enclosing scope.";
    pub const DECLARATION_CONFLICTS_WITH_SEQUENTIAL: &str = "A local named '{0}' is already declared in a region that can execute on the same path.";
    pub const CANNOT_FIND_NAME: &str = "Cannot find name '{0}'.";
    pub const DECLARATION_ESCAPES_NESTED_BODIES: &str = "Variable '{0}' is scoped to a region {1} unbraced nested statements above its declaration.";
    pub const FIRST_DECLARED_HERE: &str = "'{0}' was also declared here.";
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_DECLARATION_IN_SCOPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::DUPLICATE_DECLARATION_IN_SCOPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DECLARATION_CONFLICTS_WITH_ENCLOSING,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::DECLARATION_CONFLICTS_WITH_ENCLOSING,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DECLARATION_CONFLICTS_WITH_SEQUENTIAL,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::DECLARATION_CONFLICTS_WITH_SEQUENTIAL,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_NAME,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_FIND_NAME,
    },
    DiagnosticMessage {
        code: diagnostic_codes::DECLARATION_ESCAPES_NESTED_BODIES,
        category: DiagnosticCategory::Warning,
        message: diagnostic_messages::DECLARATION_ESCAPES_NESTED_BODIES,
    },
    DiagnosticMessage {
        code: diagnostic_codes::FIRST_DECLARED_HERE,
        category: DiagnosticCategory::Message,
        message: diagnostic_messages::FIRST_DECLARED_HERE,
    },
];
