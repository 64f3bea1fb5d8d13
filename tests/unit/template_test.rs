//! Unit tests for message templating and escaping

use howtank_notifier::models::{BuildOutcome, BuildResult};
use howtank_notifier::services::{
    escape_special_characters, expand_or_fallback, prepare_message, BuildTokenExpander,
    TemplateError, TokenExpander,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::context_for;

/// Expander that always fails
struct BrokenExpander;

impl TokenExpander for BrokenExpander {
    fn expand(
        &self,
        _template: &str,
        _context: &howtank_notifier::models::BuildContext,
    ) -> Result<String, TemplateError> {
        Err(TemplateError::Unterminated { position: 0 })
    }
}

// =============================================================================
// Escaping
// =============================================================================

#[test]
fn test_escape_replaces_all_reserved_characters() {
    assert_eq!(escape_special_characters("a{b}c'd"), "a\\{b\\}c\\'d");
}

#[test]
fn test_escape_empty_string() {
    assert_eq!(escape_special_characters(""), "");
}

#[test]
fn test_escape_is_not_idempotent() {
    let once = escape_special_characters("{");
    assert_eq!(once, "\\{");
    assert_eq!(escape_special_characters(&once), "\\\\{");
}

proptest! {
    #[test]
    fn test_escape_keeps_text_without_reserved_characters(input in "[^{}']*") {
        prop_assert_eq!(escape_special_characters(&input), input);
    }

    #[test]
    fn test_escape_prefixes_each_reserved_character(input in ".*") {
        let escaped = escape_special_characters(&input);
        let reserved = input.chars().filter(|c| matches!(c, '{' | '}' | '\'')).count();
        prop_assert_eq!(escaped.chars().count(), input.chars().count() + reserved);
        prop_assert_eq!(escaped.replace("\\{", "{").replace("\\}", "}").replace("\\'", "'"), input);
    }
}

// =============================================================================
// Expansion
// =============================================================================

#[test]
fn test_expand_builtin_placeholders() {
    let context = context_for(BuildOutcome::after(BuildResult::Failure, BuildResult::Success));

    let expansion = expand_or_fallback(
        &BuildTokenExpander,
        "${JOB_NAME} #${BUILD_NUMBER} is ${BUILD_STATUS} (was ${PREVIOUS_BUILD_STATUS}) ${BUILD_URL}",
        &context,
    );

    assert_eq!(
        expansion.text,
        "backend #7 is SUCCESS (was FAILURE) https://ci.example.com/job/backend/7/"
    );
    assert!(!expansion.is_fallback());
}

#[test]
fn test_expansion_failure_falls_back_to_template() {
    let context = context_for(BuildOutcome::first(BuildResult::Success));

    let expansion = expand_or_fallback(&BrokenExpander, "Build ${JOB_NAME}", &context);

    assert_eq!(expansion.text, "Build ${JOB_NAME}");
    assert!(expansion.is_fallback());
}

#[test]
fn test_macro_syntax_with_arguments_falls_back() {
    let context = context_for(BuildOutcome::first(BuildResult::Success));

    let expansion = expand_or_fallback(&BuildTokenExpander, "${ENV,var=\"HOME\"}", &context);

    assert_eq!(expansion.text, "${ENV,var=\"HOME\"}");
    assert!(expansion.diagnostic.is_some());
}

#[test]
fn test_empty_template_skips_expander() {
    let context = context_for(BuildOutcome::first(BuildResult::Success));

    let expansion = expand_or_fallback(&BrokenExpander, "", &context);

    assert_eq!(expansion.text, "");
    assert!(!expansion.is_fallback());
}

// =============================================================================
// Message Preparation
// =============================================================================

#[test]
fn test_prepare_message_escapes_substituted_values() {
    let context = context_for(BuildOutcome::first(BuildResult::Success))
        .with_variable("AUTHOR", "o'brien {bot}");

    let expansion = prepare_message(&BuildTokenExpander, "'${JOB_NAME}' by $AUTHOR", &context);

    assert_eq!(expansion.text, "\\'backend\\' by o\\'brien \\{bot\\}");
}

#[test]
fn test_prepare_message_escapes_fallback_text() {
    let context = context_for(BuildOutcome::first(BuildResult::Success));

    let expansion = prepare_message(&BuildTokenExpander, "broken ${JOB_NAME", &context);

    assert_eq!(expansion.text, "broken $\\{JOB_NAME");
    assert!(expansion.is_fallback());
}
