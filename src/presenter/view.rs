use std::fmt;

use serde::{Deserialize, Serialize};

use crate::search::{ResultKind, ResultRecord};

const DEFAULT_HEADER: &str = "Voice Assistant";
const SKELETON_LINES: [&str; 5] = [
    "( )  ░░░░░░░░░░░░░░░░░░░░░░░░░",
    "     ░░░░░░░░░░░░░░░░░░░░",
    "░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░",
    "░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░",
    "░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░",
];

/// One rendered result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCard {
    /// Category label, only for knowledge and definition records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub title: String,
    pub content: String,
    /// Outbound "Learn more" link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl From<&ResultRecord> for ResultCard {
    fn from(record: &ResultRecord) -> Self {
        let label = match record.kind {
            ResultKind::Knowledge => Some("Knowledge"),
            ResultKind::Definition => Some("Definition"),
            ResultKind::Text | ResultKind::Link => None,
        };
        Self {
            label: label.map(str::to_string),
            title: record.title.clone(),
            content: record.content.clone(),
            link: record.url.clone(),
        }
    }
}

/// The body of the screen; exactly one applies at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum View {
    /// Nothing asked yet
    Prompt,
    /// Query in flight; content is a fixed skeleton
    Loading,
    NoResults,
    Results { cards: Vec<ResultCard> },
}

/// Header plus body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub header: String,
    pub view: View,
}

/// Select and build the screen for the given query state
pub fn render(query: &str, loading: bool, results: &[ResultRecord]) -> Screen {
    let view = if query.is_empty() && results.is_empty() {
        View::Prompt
    } else if loading {
        View::Loading
    } else if results.is_empty() {
        View::NoResults
    } else {
        View::Results {
            cards: results.iter().map(ResultCard::from).collect(),
        }
    };

    let header = if query.is_empty() {
        DEFAULT_HEADER.to_string()
    } else {
        query.to_string()
    };

    Screen { header, view }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Prompt => {
                writeln!(f, "Ask me anything")?;
                writeln!(f, "Click the microphone button and speak your question")
            }
            View::Loading => {
                for line in SKELETON_LINES {
                    writeln!(f, "{line}")?;
                }
                Ok(())
            }
            View::NoResults => {
                writeln!(f, "No results found")?;
                writeln!(f, "Try asking another question")
            }
            View::Results { cards } => {
                for (idx, card) in cards.iter().enumerate() {
                    if idx > 0 {
                        writeln!(f)?;
                    }
                    if let Some(label) = &card.label {
                        writeln!(f, "[{label}]")?;
                    }
                    writeln!(f, "{}", card.title)?;
                    writeln!(f, "{}", card.content)?;
                    if let Some(link) = &card.link {
                        writeln!(f, "Learn more: {link}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.header)?;
        write!(f, "{}", self.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ResultRecord> {
        vec![
            ResultRecord::new(ResultKind::Definition, "Artificial Intelligence (AI)", "...")
                .with_url("https://en.wikipedia.org/wiki/Artificial_intelligence"),
            ResultRecord::new(ResultKind::Knowledge, "AI Applications", "..."),
            ResultRecord::new(ResultKind::Text, "How This Works", "..."),
        ]
    }

    #[test]
    fn test_prompt_when_nothing_asked() {
        let screen = render("", false, &[]);
        assert_eq!(screen.view, View::Prompt);
        assert_eq!(screen.header, "Voice Assistant");
        assert!(screen.to_string().contains("Ask me anything"));
    }

    #[test]
    fn test_prompt_takes_precedence_over_loading() {
        assert_eq!(render("", true, &[]).view, View::Prompt);
    }

    #[test]
    fn test_loading_ignores_results() {
        let screen = render("define ai", true, &records());
        assert_eq!(screen.view, View::Loading);
        assert_eq!(screen.header, "define ai");
        assert!(!screen.to_string().contains("AI Applications"));
    }

    #[test]
    fn test_no_results() {
        let screen = render("anything", false, &[]);
        assert_eq!(screen.view, View::NoResults);
        assert!(screen.to_string().contains("No results found"));
    }

    #[test]
    fn test_results_keep_order_labels_and_links() {
        let screen = render("define ai", false, &records());
        let View::Results { cards } = &screen.view else {
            panic!("expected results, got {:?}", screen.view);
        };

        let titles: Vec<_> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Artificial Intelligence (AI)", "AI Applications", "How This Works"]
        );
        assert_eq!(cards[0].label.as_deref(), Some("Definition"));
        assert_eq!(cards[1].label.as_deref(), Some("Knowledge"));
        assert_eq!(cards[2].label, None);
        assert!(cards[0].link.is_some());
        assert!(cards[1].link.is_none());

        let text = screen.to_string();
        assert!(text.contains("[Definition]"));
        assert!(text.contains("Learn more: https://en.wikipedia.org/wiki/Artificial_intelligence"));
    }

    #[test]
    fn test_view_serialization() {
        let json = serde_json::to_string(&View::Loading).unwrap();
        assert_eq!(json, r#"{"state":"loading"}"#);
    }
}
