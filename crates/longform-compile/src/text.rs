//! Text transformations shared by built-in and script steps

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

// %% obsidian comments %% and <!-- html comments -->
static COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)%%.*?%%|<!--.*?-->").expect("regex for comments")
});

// [[target|alias]] or [[target]], with an optional ! embed prefix
static WIKI_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!?\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("regex for wiki links")
});

// [label](target), not images
static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^!])\[([^\]]+)\]\([^)]*\)").expect("regex for markdown links")
});

/// Remove `%% %%` and `<!-- -->` comments
#[must_use]
pub fn remove_comments(text: &str) -> Cow<'_, str> {
    COMMENT.replace_all(text, "")
}

/// Replace links with their display text
///
/// Wiki links keep their alias when present, otherwise their target.
/// Markdown links keep their label. Images are left alone.
#[must_use]
pub fn remove_links(text: &str) -> String {
    let unwikied = WIKI_LINK.replace_all(text, |caps: &regex::Captures<'_>| {
        caps.get(2)
            .or_else(|| caps.get(1))
            .map_or_else(String::new, |m| m.as_str().to_string())
    });
    MARKDOWN_LINK.replace_all(&unwikied, "$1$2").into_owned()
}

/// Substitute `{{key}}` placeholders
///
/// Unknown keys are left as written.
#[must_use]
pub fn substitute<'a, F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<Cow<'a, str>>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        let key = rest[start + 2..start + 2 + len].trim();
        match lookup(key) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + len + 2]),
        }
        rest = &rest[start + 2 + len + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_removed() {
        let text = "Keep %%drop\nthis%% and <!-- that --> text";
        assert_eq!(remove_comments(text), "Keep  and  text");
    }

    #[test]
    fn links_reduced_to_text() {
        let text = "See [[Chapter One]] and [[notes/Plan|the plan]] or [site](http://x).";
        assert_eq!(
            remove_links(text),
            "See Chapter One and the plan or site."
        );
    }

    #[test]
    fn images_survive() {
        let text = "![cover](cover.png) [label](x)";
        assert_eq!(remove_links(text), "![cover](cover.png) label");
    }

    #[test]
    fn substitute_known_and_unknown() {
        let out = substitute("Hi {{ name }}, {{missing}}!", |k| {
            (k == "name").then(|| Cow::Borrowed("Ada"))
        });
        assert_eq!(out, "Hi Ada, {{missing}}!");
        assert_eq!(substitute("open {{ only", |_| None), "open {{ only");
    }
}
