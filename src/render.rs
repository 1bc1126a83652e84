//! HTML rendering of normalized search records.
//!
//! Every function here is pure: same input, same markup. Text coming from
//! upstream responses is escaped before it is interpolated.

use crate::search::{DisplayDirectAnswer, DisplayResult};

const CARD_SHADOW: &str = "box-shadow: 2px 2px 10px rgba(0,0,0,0.1);";
const RESULT_BACKGROUND: &str = "#f2f2f2";
const ANSWER_BACKGROUND: &str = "#ADD8E6";
const ERROR_BACKGROUND: &str = "#F8D7DA";

/// Escape HTML entities.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Neutral card for a ranked result.
pub fn render_result(result: &DisplayResult) -> String {
    let score = match &result.display_score {
        Some(score) => format!(
            r#"
    <p style="text-align: right;"><i>Score: {}</i></p>"#,
            html_escape(&score.to_string())
        ),
        None => String::new(),
    };

    format!(
        r#"<div class="result-card" style="border-radius: 5px; background-color: {bg}; padding: 10px; {shadow}">
    <div style="font-size: 18px; font-weight: bold;">{name}</div>
    <p style="margin: 10px 0;">{segment}</p>{score}
</div>"#,
        bg = RESULT_BACKGROUND,
        shadow = CARD_SHADOW,
        name = html_escape(&result.display_name),
        segment = html_escape(&result.display_segment),
        score = score,
    )
}

/// Highlighted card for a backend direct answer, with the matched span in bold.
pub fn render_direct_answer(answer: &DisplayDirectAnswer) -> String {
    let snippet = &answer.highlighted_snippet;
    format!(
        r#"<div class="direct-answer-card" style="border-radius: 5px; background-color: {bg}; padding: 10px; {shadow}">
    <div style="font-size: 18px; font-weight: bold;">{answer}</div>
    <div>
        <span>...{before}<strong>{highlighted}</strong>{after}...</span>
    </div>
    <div style="margin-top: 10px; font-size: 14px; color: #777;">
        From: <i>{source}</i>
    </div>
</div>"#,
        bg = ANSWER_BACKGROUND,
        shadow = CARD_SHADOW,
        answer = html_escape(&answer.display_answer),
        before = html_escape(&snippet.before),
        highlighted = html_escape(&snippet.highlighted),
        after = html_escape(&snippet.after),
        source = html_escape(&answer.source_name),
    )
}

/// Highlighted card for an answer produced by the conversational agent.
pub fn render_generated_answer(text: &str) -> String {
    format!(
        r#"<div class="generated-answer-card" style="border-radius: 5px; background-color: {bg}; padding: 10px; {shadow}">
    <span class="badge" style="font-size: 12px; color: #555;">Generated via conversational agent</span>
    <div style="font-size: 18px; margin-top: 6px;">{text}</div>
</div>"#,
        bg = ANSWER_BACKGROUND,
        shadow = CARD_SHADOW,
        text = html_escape(text),
    )
}

/// Visible failure state for an aborted interaction.
pub fn render_error(message: &str) -> String {
    format!(
        r#"<div class="error-card" style="border-radius: 5px; background-color: {bg}; padding: 10px; {shadow}">
    <div style="font-weight: bold;">Something went wrong</div>
    <pre style="white-space: pre-wrap;">{message}</pre>
</div>"#,
        bg = ERROR_BACKGROUND,
        shadow = CARD_SHADOW,
        message = html_escape(message),
    )
}

/// A card on the results page, in display order.
#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    DirectAnswer(DisplayDirectAnswer),
    GeneratedAnswer(String),
    Result(DisplayResult),
}

impl Card {
    pub fn render(&self) -> String {
        match self {
            Card::DirectAnswer(answer) => render_direct_answer(answer),
            Card::GeneratedAnswer(text) => render_generated_answer(text),
            Card::Result(result) => render_result(result),
        }
    }
}

/// Selector entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoOption {
    pub id: String,
    pub name: String,
}

/// Everything needed to draw one results page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    pub title: String,
    pub demos: Vec<DemoOption>,
    pub selected_demo: String,
    pub query: String,
    pub generate: bool,
    pub translate: bool,
    pub chat_available: bool,
    pub translation_available: bool,
    pub cards: Vec<Card>,
    pub raw_response: Option<String>,
    pub error: Option<String>,
}

fn checkbox(name: &str, label: &str, checked: bool, enabled: bool) -> String {
    if !enabled {
        return String::new();
    }
    format!(
        r#"<label><input type="checkbox" name="{name}" value="true"{checked}> {label}</label>"#,
        checked = if checked { " checked" } else { "" },
    )
}

/// Full HTML document: selector, query form, cards and raw response view.
pub fn render_page(view: &PageView) -> String {
    let mut options = String::new();
    for demo in &view.demos {
        let selected = if demo.id == view.selected_demo {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            html_escape(&demo.id),
            selected,
            html_escape(&demo.name)
        ));
    }

    let mut body = String::new();
    if let Some(error) = &view.error {
        body.push_str(&render_error(error));
    } else {
        for card in &view.cards {
            body.push_str(&card.render());
            body.push_str("\n<hr>\n");
        }
    }

    let raw = match &view.raw_response {
        Some(raw) => format!(
            r#"<details><summary>View Raw Response</summary><pre>{}</pre></details>"#,
            html_escape(raw)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body style="font-family: sans-serif; max-width: 960px; margin: 0 auto; padding: 20px;">
<form method="get" action="/search">
    <label>Select Demo <select name="demo">{options}</select></label>
    <label>Search Query <input type="text" name="q" value="{query}" size="60"></label>
    {generate}
    {translate}
    <button type="submit">Search</button>
</form>
<hr>
{body}
{raw}
</body>
</html>
"#,
        title = html_escape(&view.title),
        options = options,
        query = html_escape(&view.query),
        generate = checkbox("generate", "Generate answer", view.generate, view.chat_available),
        translate = checkbox(
            "translate",
            "Translate",
            view.translate,
            view.translation_available
        ),
        body = body,
        raw = raw,
    )
}
