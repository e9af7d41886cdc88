//! Alert fragments for displaying success, warning, and error messages.
//!
//! Alerts are rendered as small HTML fragments that HTMX swaps into the
//! page, either in place of a form or into the shared alert container.

use maud::{Markup, html};

/// A message shown to the user after an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The operation succeeded.
    Success {
        /// Short headline, e.g. "Transfer complete".
        message: String,
        /// Supporting detail shown under the headline.
        details: String,
    },
    /// The operation succeeded but something needs the user's attention.
    Warning {
        /// Short headline, e.g. "Budget exceeded".
        message: String,
        /// Supporting detail shown under the headline.
        details: String,
    },
    /// The operation failed.
    Error {
        /// Short headline, e.g. "Could not delete wallet".
        message: String,
        /// Supporting detail shown under the headline.
        details: String,
    },
}

impl Alert {
    /// Create a success alert.
    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a warning alert.
    pub fn warning(message: &str, details: &str) -> Self {
        Self::Warning {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create an error alert.
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match &self {
            Alert::Success { message, details } => (
                "p-4 mb-4 rounded-lg border border-green-300 bg-green-50 \
                text-green-800 dark:bg-gray-800 dark:border-green-800 \
                dark:text-green-400",
                message,
                details,
            ),
            Alert::Warning { message, details } => (
                "p-4 mb-4 rounded-lg border border-yellow-300 bg-yellow-50 \
                text-yellow-800 dark:bg-gray-800 dark:border-yellow-800 \
                dark:text-yellow-300",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "p-4 mb-4 rounded-lg border border-red-300 bg-red-50 \
                text-red-800 dark:bg-gray-800 dark:border-red-800 \
                dark:text-red-400",
                message,
                details,
            ),
        };

        html! {
            div class=(container_style) role="alert"
            {
                p class="font-medium" { (message) }

                @if !details.is_empty() {
                    p class="text-sm" { (details) }
                }
            }
        }
    }
}
