//! Part tree produced by the property-key parser.
//!
//! A parsed key is a rooted tree of spans over the original key string. The
//! tree drives [`ParsedKey::normalize`], which produces the two canonical
//! key forms: *specific* (override braces dropped, contents kept) and
//! *generic* (override parts dropped entirely).

/// The kinds of part a property key decomposes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PartKind {
    /// Marker part wrapping the entire key.
    Root,
    /// A dot-delimited run of parts, such as `my.property.key`.
    Whole,
    /// A plain text segment, such as `property` in `my.property.key`.
    ///
    /// A literal's span includes the dot that terminates it, when present.
    Literal,
    /// A `{…}` segment, such as in `my.{override}.key`.
    Override,
    /// A `${…}` segment, such as in `my.${placeholder}.key`.
    Placeholder,
}

/// One node of the part tree: a kind, a half-open span into the key, and
/// the child parts nested inside that span.
#[derive(Debug, Clone)]
pub(crate) struct Part {
    pub(crate) kind: PartKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) children: Vec<Part>,
}

impl Part {
    /// Unwraps this part into its canonical text.
    ///
    /// Children are spliced back into the raw span in reverse order so the
    /// earlier child offsets stay valid, then the kind-specific rule is
    /// applied to the substituted text.
    pub(crate) fn unwrap(&self, key: &[char], keep_overrides: bool) -> String {
        // Placeholders are resolved by a later expansion pass; their text
        // passes through untouched, nested parts included.
        if self.kind == PartKind::Placeholder {
            return self.raw(key);
        }

        let mut spliced: Vec<char> = key[self.start..self.end].to_vec();
        for child in self.children.iter().rev() {
            let replacement = child.unwrap(key, keep_overrides);
            spliced.splice(
                (child.start - self.start)..(child.end - self.start),
                replacement.chars(),
            );
        }
        let mut text: String = spliced.into_iter().collect();

        match self.kind {
            PartKind::Root | PartKind::Whole => {
                // A trailing separator is left behind when the final part
                // unwraps to nothing, e.g. the generic form of `a.b.{c}`.
                if text.ends_with('.') {
                    text.pop();
                }
                text
            }
            PartKind::Literal => {
                if text == "." { String::new() } else { text }
            }
            PartKind::Override => {
                if keep_overrides {
                    match text.strip_prefix('{').and_then(|inner| inner.strip_suffix('}')) {
                        Some(inner) => inner.to_owned(),
                        None => text,
                    }
                } else {
                    String::new()
                }
            }
            PartKind::Placeholder => unreachable!("handled above"),
        }
    }

    /// The raw text this part spans.
    pub(crate) fn raw(&self, key: &[char]) -> String {
        key[self.start..self.end].iter().collect()
    }
}

/// A successfully parsed property key.
///
/// Owns the original key text and the part tree over it.
#[derive(Debug, Clone)]
pub(crate) struct ParsedKey {
    chars: Vec<char>,
    root: Part,
}

impl ParsedKey {
    pub(crate) fn new(chars: Vec<char>, root: Part) -> Self {
        Self { chars, root }
    }

    /// Produces a canonical form of the key.
    ///
    /// With `keep_overrides` the *specific* form is returned: override
    /// braces are dropped but their contents kept. Without it the *generic*
    /// form is returned: override parts vanish entirely, along with the
    /// separator they trailed.
    pub(crate) fn normalize(&self, keep_overrides: bool) -> String {
        self.root.unwrap(&self.chars, keep_overrides)
    }
}
