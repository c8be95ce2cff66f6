//! Turning store results into tool results.

use minijira_core::error::{StoreError, StoreErrorClass, ToolError};
use minijira_core::tool::ToolResult;

/// Fold a store result into the tool boundary.
///
/// - success → the rendered reply
/// - violation → the violation's own text
/// - fault → logged, generic reply naming `action`
/// - infrastructure → `Err`, the turn fails
pub(crate) fn from_store<T>(
    tool_name: &str,
    action: &str,
    result: Result<T, StoreError>,
    render: impl FnOnce(T) -> String,
) -> Result<ToolResult, ToolError> {
    match result {
        Ok(value) => Ok(ToolResult::ok(render(value))),
        Err(e) => match e.class() {
            StoreErrorClass::Violation => Ok(ToolResult::rejected(e.to_string())),
            StoreErrorClass::Fault => {
                tracing::error!(tool = tool_name, error = %e, "Unexpected store fault");
                Ok(ToolResult::rejected(format!(
                    "Something went wrong while {action}. Please try again."
                )))
            }
            StoreErrorClass::Infrastructure => Err(ToolError::StoreUnavailable {
                tool_name: tool_name.to_string(),
                reason: e.to_string(),
            }),
        },
    }
}
