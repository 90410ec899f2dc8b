//! Offline API reference served by the reference endpoint and rendered
//! by the CLI's `docs` command. Built entirely from constants; asking
//! for documentation never touches the backend.

use metaforge_core::{SyntaxReference, syntax_reference};
use metaforge_ops::ErrorCode;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EndpointDoc {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorCodeDoc {
    pub code: &'static str,
    pub http_status: u16,
    pub description: &'static str,
    pub remedy: &'static str,
}

/// The whole documentation dump: endpoints, field syntax, error codes.
#[derive(Debug, Clone, Serialize)]
pub struct ApiReference {
    pub endpoints: Vec<EndpointDoc>,
    pub field_syntax: SyntaxReference,
    pub error_codes: Vec<ErrorCodeDoc>,
}

/// Assembles the reference for the current build.
pub fn api_reference() -> ApiReference {
    ApiReference {
        endpoints: vec![
            EndpointDoc {
                method: "POST",
                path: "/api/doctypes",
                description: "create a new doctype with parsed field definitions",
            },
            EndpointDoc {
                method: "POST",
                path: "/api/doctypes/:doctype/fields",
                description: "add custom fields to an existing standard doctype",
            },
            EndpointDoc {
                method: "POST",
                path: "/api/doctypes/:doctype/properties",
                description: "create a property override for a doctype or field",
            },
            EndpointDoc {
                method: "GET",
                path: "/api/reference",
                description: "this document",
            },
            EndpointDoc {
                method: "GET",
                path: "/health",
                description: "liveness probe",
            },
        ],
        field_syntax: syntax_reference(),
        error_codes: ErrorCode::ALL
            .iter()
            .map(|code| ErrorCodeDoc {
                code: code.as_str(),
                http_status: code.http_status(),
                description: code.summary(),
                remedy: code.remedy(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_covers_every_error_code() {
        let reference = api_reference();
        assert_eq!(reference.error_codes.len(), ErrorCode::ALL.len());

        let statuses: Vec<u16> = reference
            .error_codes
            .iter()
            .map(|doc| doc.http_status)
            .collect();
        assert!(statuses.contains(&403));
        assert!(statuses.contains(&409));
        assert!(statuses.contains(&500));
    }

    #[test]
    fn test_reference_lists_all_routes() {
        let reference = api_reference();
        let paths: Vec<&str> = reference.endpoints.iter().map(|e| e.path).collect();

        assert!(paths.contains(&"/api/doctypes"));
        assert!(paths.contains(&"/api/doctypes/:doctype/fields"));
        assert!(paths.contains(&"/api/doctypes/:doctype/properties"));
        assert!(paths.contains(&"/health"));
    }

    #[test]
    fn test_reference_serializes() {
        let json = serde_json::to_value(api_reference()).unwrap();
        assert!(json["field_syntax"]["version"].is_string());
        assert_eq!(json["error_codes"][0]["code"], "PERMISSION_DENIED");
    }
}
