//! Message templating.
//!
//! Placeholders are expanded first, then the characters reserved by the
//! Howtank message grammar are escaped, so values coming from the build are
//! escaped as well.

use crate::models::BuildContext;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unterminated placeholder starting at byte {position}")]
    Unterminated { position: usize },

    #[error("Invalid placeholder name '{name}' at byte {position}")]
    InvalidName { position: usize, name: String },
}

/// Substitutes build placeholders in a template
pub trait TokenExpander: Send + Sync {
    fn expand(&self, template: &str, context: &BuildContext) -> Result<String, TemplateError>;
}

/// Expands `${NAME}` and `$NAME` from a [`BuildContext`].
///
/// Unknown names are kept verbatim and `$$` yields a literal `$`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildTokenExpander;

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn name_len(input: &str) -> usize {
    let bytes = input.as_bytes();
    match bytes.first() {
        Some(&first) if is_name_start(first) => {
            1 + bytes[1..].iter().take_while(|&&b| is_name_char(b)).count()
        }
        _ => 0,
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name_len(name) == name.len()
}

impl TokenExpander for BuildTokenExpander {
    fn expand(&self, template: &str, context: &BuildContext) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(offset) = rest.find('$') {
            output.push_str(&rest[..offset]);
            let position = template.len() - rest.len() + offset;
            let after = &rest[offset + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                output.push('$');
                rest = tail;
            } else if let Some(braced) = after.strip_prefix('{') {
                let end = braced
                    .find('}')
                    .ok_or(TemplateError::Unterminated { position })?;
                let name = &braced[..end];
                if !is_valid_name(name) {
                    return Err(TemplateError::InvalidName {
                        position,
                        name: name.to_string(),
                    });
                }
                match context.lookup(name) {
                    Some(value) => output.push_str(&value),
                    None => {
                        output.push_str("${");
                        output.push_str(name);
                        output.push('}');
                    }
                }
                rest = &braced[end + 1..];
            } else {
                let len = name_len(after);
                let name = &after[..len];
                match context.lookup(name).filter(|_| len > 0) {
                    Some(value) => output.push_str(&value),
                    None => {
                        output.push('$');
                        output.push_str(name);
                    }
                }
                rest = &after[len..];
            }
        }

        output.push_str(rest);
        Ok(output)
    }
}

/// Result of a best-effort expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    /// Set when expansion failed and `text` is the unexpanded template
    pub diagnostic: Option<String>,
}

impl Expansion {
    pub fn is_fallback(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// Expands `template`, falling back to the template itself on error
pub fn expand_or_fallback(
    expander: &dyn TokenExpander,
    template: &str,
    context: &BuildContext,
) -> Expansion {
    if template.is_empty() {
        return Expansion {
            text: String::new(),
            diagnostic: None,
        };
    }

    match expander.expand(template, context) {
        Ok(text) => Expansion {
            text,
            diagnostic: None,
        },
        Err(e) => Expansion {
            text: template.to_string(),
            diagnostic: Some(format!("Exception in token expansion: {}", e)),
        },
    }
}

/// Escapes `{`, `}` and `'` with a backslash
pub fn escape_special_characters(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\'', "\\'")
}

/// Expands then escapes a message template
pub fn prepare_message(
    expander: &dyn TokenExpander,
    template: &str,
    context: &BuildContext,
) -> Expansion {
    let expansion = expand_or_fallback(expander, template, context);
    Expansion {
        text: escape_special_characters(&expansion.text),
        diagnostic: expansion.diagnostic,
    }
}
