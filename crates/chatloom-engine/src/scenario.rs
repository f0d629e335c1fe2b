//! Demo scenarios and the text that selects them.

/// Canned response scenarios. Selection is a pure function of the
/// inbound message text: first matching keyword wins, in the order the
/// variants are checked below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Echo the user message and stream the lorem paragraphs.
    Default,
    /// Fail turn production with a retryable stream error.
    Error,
    /// Emit a card widget as a single done item.
    Widget,
    /// Emit a pending client tool call.
    Tool,
    /// Emit a staged multi-task workflow followed by a narration.
    Workflow,
    /// Emit info and warning notices before a normal response.
    Notice,
    /// Stream with half-second delays between chunks.
    Slow,
    /// Stream a very long response for scroll testing.
    Long,
    /// Emit an assistant message carrying source annotations.
    Annotations,
}

impl Scenario {
    /// Select the scenario for an inbound message. Case-insensitive;
    /// the same text always selects the same scenario.
    pub fn select(text: &str) -> Scenario {
        let text = text.to_lowercase();
        if text.contains("error") {
            Scenario::Error
        } else if text.contains("widget") {
            Scenario::Widget
        } else if text.contains("tool") {
            Scenario::Tool
        } else if text.contains("workflow") {
            Scenario::Workflow
        } else if text.contains("notice") {
            Scenario::Notice
        } else if text.contains("slow") {
            Scenario::Slow
        } else if text.contains("long") {
            Scenario::Long
        } else if text.contains("annotations") {
            Scenario::Annotations
        } else {
            Scenario::Default
        }
    }
}

pub(crate) const LOREM_PARAGRAPHS: [&str; 3] = [
    "This is a test response from the chatloom dev backend. \
     The backend echoes your message and streams back a multi-paragraph \
     response to help you develop and test a streaming frontend.",
    "Each paragraph is streamed as a series of text deltas, \
     simulating how a real model backend would generate tokens incrementally. \
     You can observe how the UI handles progressive text rendering.",
    "The backend supports several test scenarios. \
     Try sending messages with keywords like 'widget', 'error', 'long', \
     'tool', 'workflow', 'notice', 'slow', or 'annotations' to trigger \
     different response types.",
];

pub(crate) const SLOW_TEXT: &str =
    "This response has artificial delays between chunks to test loading states. \
     Each chunk takes 500ms to arrive.";

pub(crate) const ERROR_TEXT: &str =
    "This is a test error from the dev backend. \
     The 'error' keyword triggered this intentional failure.";

pub(crate) const WORKFLOW_NARRATION: &str =
    "The workflow completed successfully with 3 tasks: \
     analysis, web search, and synthesis.";

pub(crate) const NOTICE_FOLLOWUP: &str =
    "Two notices were sent before this response (info and warning).";

/// Build the default scenario's text: echo plus the lorem paragraphs.
pub(crate) fn default_text(user_text: &str) -> String {
    let echo = if user_text.is_empty() {
        String::new()
    } else {
        format!("You said: *{user_text}*\n\n")
    };
    format!("{echo}{}", LOREM_PARAGRAPHS.join("\n\n"))
}

/// Build the long scenario's text: 17 generated paragraphs.
pub(crate) fn long_text() -> String {
    let paragraphs: Vec<String> = (0..17)
        .map(|i| {
            format!(
                "Paragraph {}: This is sentence {} of the long response. \
                 This is sentence {} of the long response. \
                 This is sentence {} of the long response.",
                i + 1,
                i * 3 + 1,
                i * 3 + 2,
                i * 3 + 3,
            )
        })
        .collect();
    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_keyword_priority_ordered() {
        assert_eq!(Scenario::select("please error now"), Scenario::Error);
        // "error" outranks "widget" regardless of position in the text.
        assert_eq!(Scenario::select("widget error"), Scenario::Error);
        assert_eq!(Scenario::select("show me a widget"), Scenario::Widget);
        assert_eq!(Scenario::select("tool"), Scenario::Tool);
        assert_eq!(Scenario::select("run the workflow"), Scenario::Workflow);
        assert_eq!(Scenario::select("notice me"), Scenario::Notice);
        assert_eq!(Scenario::select("slow down"), Scenario::Slow);
        assert_eq!(Scenario::select("long"), Scenario::Long);
        assert_eq!(Scenario::select("with annotations"), Scenario::Annotations);
        assert_eq!(Scenario::select("hello there"), Scenario::Default);
        assert_eq!(Scenario::select(""), Scenario::Default);
    }

    #[test]
    fn selection_is_case_insensitive_and_deterministic() {
        assert_eq!(Scenario::select("WIDGET"), Scenario::Widget);
        for _ in 0..3 {
            assert_eq!(Scenario::select("Workflow please"), Scenario::Workflow);
        }
    }

    #[test]
    fn long_text_has_seventeen_paragraphs() {
        assert_eq!(long_text().split("\n\n").count(), 17);
    }
}
