//! Query classification and result synthesis
//!
//! Classification is greedy: the first matching rule wins, so a query
//! mentioning both the weather and the time is a weather query.

use chrono::{DateTime, Local};

use super::record::{ResultKind, ResultRecord};

const WEATHER_KEYWORDS: [&str; 3] = ["weather", "temperature", "forecast"];
const CLOCK_KEYWORDS: [&str; 3] = ["time", "date", "day"];
/// Checked in this order; the term is whatever follows the first hit
const DEFINITION_PHRASES: [&str; 3] = ["what is", "definition of", "define"];
const AI_KEYWORDS: [&str; 2] = ["ai", "artificial intelligence"];

const AI_REFERENCE_URL: &str = "https://en.wikipedia.org/wiki/Artificial_intelligence";

/// What the user asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Weather,
    Clock,
    Definition { term: String },
    General,
}

/// Trim and lower-case a query
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Classify an already normalized query
pub fn classify(normalized: &str) -> Intent {
    if mentions_any(normalized, &WEATHER_KEYWORDS) {
        return Intent::Weather;
    }
    if mentions_any(normalized, &CLOCK_KEYWORDS) {
        return Intent::Clock;
    }

    for phrase in DEFINITION_PHRASES {
        if let Some(idx) = normalized.find(phrase) {
            let term = normalized[idx + phrase.len()..].trim();
            return Intent::Definition {
                term: term.to_string(),
            };
        }
    }

    Intent::General
}

fn mentions_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|word| text.contains(word))
}

/// Build the result sequence for `query`, using `now` for clock answers
pub fn synthesize(query: &str, now: DateTime<Local>) -> Vec<ResultRecord> {
    match classify(&normalize(query)) {
        Intent::Weather => weather_results(),
        Intent::Clock => vec![clock_result(now)],
        Intent::Definition { term } => definition_results(&term),
        Intent::General => general_results(query),
    }
}

fn weather_results() -> Vec<ResultRecord> {
    vec![
        ResultRecord::new(
            ResultKind::Knowledge,
            "Current Weather",
            "Currently 72°F (22°C) with partly cloudy skies. Humidity at 45% with a gentle breeze from the northwest.",
        ),
        ResultRecord::new(
            ResultKind::Knowledge,
            "Weather Forecast",
            "Tomorrow: Sunny with a high of 75°F (24°C). The week ahead looks clear with temperatures gradually rising to 80°F by Friday.",
        ),
    ]
}

fn clock_result(now: DateTime<Local>) -> ResultRecord {
    ResultRecord::new(
        ResultKind::Knowledge,
        "Current Time & Date",
        format!(
            "It is currently {} on {} ({}).",
            now.format("%-I:%M:%S %p"),
            now.format("%-m/%-d/%Y"),
            now.format("%A"),
        ),
    )
}

fn definition_results(term: &str) -> Vec<ResultRecord> {
    if mentions_any(term, &AI_KEYWORDS) {
        return vec![
            ResultRecord::new(
                ResultKind::Definition,
                "Artificial Intelligence (AI)",
                "Artificial Intelligence refers to computer systems designed to perform tasks that typically require human intelligence, such as visual perception, speech recognition, decision-making, and translation between languages.",
            )
            .with_url(AI_REFERENCE_URL),
            ResultRecord::new(
                ResultKind::Knowledge,
                "AI Applications",
                "AI is used in many fields including voice assistants (like Siri and Alexa), recommendation systems, autonomous vehicles, medical diagnosis, and more.",
            ),
        ];
    }

    vec![ResultRecord::new(
        ResultKind::Definition,
        format!("Definition of \"{term}\""),
        format!(
            "I found some information about \"{term}\", but please note this is simulated data for demonstration purposes."
        ),
    )]
}

fn general_results(query: &str) -> Vec<ResultRecord> {
    vec![
        ResultRecord::new(
            ResultKind::Knowledge,
            "Search Results",
            format!(
                "I found some information about \"{query}\", but please note this is simulated data for demonstration purposes."
            ),
        ),
        ResultRecord::new(
            ResultKind::Text,
            "How This Works",
            "This is a demo application that simulates voice search and internet browsing. In a production environment, this would connect to real search engines or AI APIs to retrieve accurate information.",
        ),
        ResultRecord::new(
            ResultKind::Text,
            "Try Example Queries",
            "Try asking about the weather, current time, or \"What is artificial intelligence?\" to see different types of responses.",
        ),
    ]
}
