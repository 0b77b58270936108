//! Locating the discard confirmation dialog.

use crate::models::GameStrings;
use crate::services::surface::{DialogHandle, DialogSurface};
use regex::Regex;
use thiserror::Error;

/// Addon name of the yes/no confirmation prompt.
pub const DISCARD_DIALOG_NAME: &str = "SelectYesno";

/// Upper bound of dialog instances probed per search.
pub const MAX_DIALOG_INSTANCES: usize = 100;

/// Errors raised while compiling dialog text templates
#[derive(Error, Debug)]
pub enum DialogTemplateError {
    #[error("Dialog template '{0}' is empty")]
    Empty(&'static str),

    #[error("Dialog template '{name}' has an unclosed placeholder: {template}")]
    UnclosedPlaceholder {
        name: &'static str,
        template: String,
    },

    #[error("Dialog template '{name}' did not compile: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Matches dialog text against the localized discard prompts.
#[derive(Debug, Clone)]
pub struct DialogMatcher {
    patterns: Vec<Regex>,
}

impl DialogMatcher {
    pub fn new(strings: &GameStrings) -> Result<Self, DialogTemplateError> {
        let patterns = vec![
            compile_template("Discard Item", &strings.discard_item)?,
            compile_template("Discard Collectable", &strings.discard_collectable)?,
        ];
        Ok(Self { patterns })
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        self.patterns.iter().any(|pattern| pattern.is_match(text))
    }
}

/// Literal text is escaped, each `{...}` placeholder matches anything, and the
/// whole prompt must match.
fn compile_template(name: &'static str, template: &str) -> Result<Regex, DialogTemplateError> {
    let template = template.trim();
    if template.is_empty() {
        return Err(DialogTemplateError::Empty(name));
    }

    let mut pattern = String::from("(?s)^");
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..open]));
        let Some(close) = rest[open..].find('}') else {
            return Err(DialogTemplateError::UnclosedPlaceholder {
                name,
                template: template.to_string(),
            });
        };
        pattern.push_str(".*");
        rest = &rest[open + close + 1..];
    }
    pattern.push_str(&regex::escape(rest));
    pattern.push('$');

    Regex::new(&pattern).map_err(|source| DialogTemplateError::InvalidPattern { name, source })
}

/// Probe instances `1..max_instances` of `name` and return the first visible,
/// ready one showing a discard prompt. Stops at the first missing instance.
pub fn find_dialog<D>(
    surface: &D,
    name: &str,
    max_instances: usize,
    matcher: &DialogMatcher,
) -> Option<DialogHandle>
where
    D: DialogSurface + ?Sized,
{
    for index in 1..max_instances {
        let dialog = surface.dialog(name, index)?;
        if !dialog.is_visible || !dialog.is_ready {
            continue;
        }
        if matcher.matches(&dialog.text) {
            return Some(dialog.handle);
        }
        tracing::trace!("Ignoring {} #{} with text '{}'", name, index, dialog.text);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::surface::DialogInstance;

    struct Dialogs(Vec<DialogInstance>);

    impl DialogSurface for Dialogs {
        fn dialog(&self, name: &str, index: usize) -> Option<DialogInstance> {
            if name != DISCARD_DIALOG_NAME {
                return None;
            }
            self.0.get(index - 1).cloned()
        }

        fn confirm(&mut self, _handle: DialogHandle) {}
    }

    fn instance(handle: u64, visible: bool, text: &str) -> DialogInstance {
        DialogInstance {
            handle: DialogHandle(handle),
            is_visible: visible,
            is_ready: true,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_default_templates() {
        let matcher = DialogMatcher::new(&GameStrings::default()).unwrap();

        assert!(matcher.matches("Discard Copper Ore?"));
        assert!(matcher.matches(
            "Discard Rarefied Cotton? Collectables cannot be recovered once discarded."
        ));
        assert!(!matcher.matches("Sell Copper Ore?"));
        assert!(!matcher.matches("Really Discard Copper Ore?"));
    }

    #[test]
    fn test_literal_text_is_escaped() {
        let strings = GameStrings {
            discard_item: "[{item}] wegwerfen?".to_string(),
            discard_collectable: "({item}).".to_string(),
        };
        let matcher = DialogMatcher::new(&strings).unwrap();

        assert!(matcher.matches("[Kupfererz] wegwerfen?"));
        assert!(!matcher.matches("K wegwerfen?"));
        assert!(matcher.matches("(Kupfererz)."));
        assert!(!matcher.matches("(Kupfererz)x"));
    }

    #[test]
    fn test_template_errors() {
        let empty = GameStrings {
            discard_item: "  ".to_string(),
            ..GameStrings::default()
        };
        assert!(matches!(
            DialogMatcher::new(&empty),
            Err(DialogTemplateError::Empty("Discard Item"))
        ));

        let unclosed = GameStrings {
            discard_collectable: "Discard {item?".to_string(),
            ..GameStrings::default()
        };
        assert!(matches!(
            DialogMatcher::new(&unclosed),
            Err(DialogTemplateError::UnclosedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_find_skips_hidden_and_unrelated() {
        let matcher = DialogMatcher::new(&GameStrings::default()).unwrap();
        let surface = Dialogs(vec![
            instance(1, false, "Discard Copper Ore?"),
            instance(2, true, "Leave the duty?"),
            instance(3, true, "Discard Copper Ore?"),
        ]);

        let found = find_dialog(&surface, DISCARD_DIALOG_NAME, MAX_DIALOG_INSTANCES, &matcher);
        assert_eq!(found, Some(DialogHandle(3)));
    }

    #[test]
    fn test_find_stops_at_first_missing_instance() {
        let matcher = DialogMatcher::new(&GameStrings::default()).unwrap();
        let surface = Dialogs(vec![instance(1, true, "Leave the duty?")]);

        assert!(find_dialog(&surface, DISCARD_DIALOG_NAME, MAX_DIALOG_INSTANCES, &matcher).is_none());
    }

    #[test]
    fn test_find_respects_instance_bound() {
        let matcher = DialogMatcher::new(&GameStrings::default()).unwrap();
        let surface = Dialogs(vec![
            instance(1, true, "Leave the duty?"),
            instance(2, true, "Discard Copper Ore?"),
        ]);

        assert!(find_dialog(&surface, DISCARD_DIALOG_NAME, 2, &matcher).is_none());
        assert!(find_dialog(&surface, DISCARD_DIALOG_NAME, 3, &matcher).is_some());
    }
}
