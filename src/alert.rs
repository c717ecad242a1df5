//! Alert fragments shown in the floating alert container of the base layout.
//!
//! Form endpoints return an alert with a non-2xx status code and HTMX swaps it
//! into `#alert-container` via the response-targets extension.

use maud::{Markup, html};

/// An alert message for the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An error with a short message and a longer explanation.
    Error { message: String, details: String },
    /// An error with only a short message.
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (message, details) = match self {
            Alert::Error { message, details } => (message, Some(details)),
            Alert::ErrorSimple { message } => (message, None),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    class="flex items-start gap-3 p-4 mb-4 text-red-800 border border-red-300
                        rounded-lg bg-red-50 dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
                {
                    div class="flex-1"
                    {
                        p class="font-semibold" { (message) }

                        @if let Some(details) = details {
                            p class="text-sm mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Close"
                        class="text-red-500 hover:text-red-700 dark:hover:text-red-300"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let alert = Alert::Error {
            message: "Oh no".to_owned(),
            details: "Something broke".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        let paragraphs = html
            .select(&Selector::parse("div[role=alert] p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(paragraphs, vec!["Oh no", "Something broke"]);
    }

    #[test]
    fn simple_alert_has_no_details() {
        let alert = Alert::ErrorSimple {
            message: "Oh no".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        let paragraphs = html
            .select(&Selector::parse("div[role=alert] p").unwrap())
            .count();
        assert_eq!(paragraphs, 1);
    }
}
