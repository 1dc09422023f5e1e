//! Doxygen-style `@tag` extraction from source comments.

use crate::tree::DocTree;
use regex::Regex;
use std::sync::LazyLock;

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([A-Za-z_][A-Za-z0-9_]*)(?:[[:space:]]+(.*))?$").unwrap());

static RE_DECORATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*(?:/\*\*?|\*/|\*|//+)?[[:space:]]?").unwrap());

/// Tags in first-occurrence order, each with every value given for it.
/// Untagged leading text is reported under `description`.
pub fn parse_tags(comment: &str) -> Vec<(String, Vec<String>)> {
    let mut tags: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<(String, String)> = None;

    fn flush(tags: &mut Vec<(String, Vec<String>)>, entry: Option<(String, String)>) {
        let Some((tag, value)) = entry else { return };
        let value = value.trim().to_string();
        if tag == "description" && value.is_empty() {
            return;
        }
        match tags.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, values)) => values.push(value),
            None => tags.push((tag, vec![value])),
        }
    }

    for raw in comment.lines() {
        let line = RE_DECORATION.replace(raw, "");
        let line = line.trim_end().trim_end_matches("*/").trim_end();

        if let Some(caps) = RE_TAG.captures(line) {
            flush(&mut tags, current.take());
            let value = caps.get(2).map_or("", |m| m.as_str());
            current = Some((caps[1].to_string(), value.to_string()));
            continue;
        }

        if line.is_empty() {
            continue;
        }
        let entry = current.get_or_insert_with(|| ("description".to_string(), String::new()));
        if !entry.1.is_empty() {
            entry.1.push(' ');
        }
        entry.1.push_str(line.trim());
    }
    flush(&mut tags, current);
    tags
}

/// Append a `doxygen` subtree holding every parsed tag. Returns `false`
/// (appending nothing) when the comment has no tags.
pub fn append_doxygen(tree: &mut DocTree, comment: &str) -> bool {
    let tags = parse_tags(comment);
    if tags.is_empty() {
        return false;
    }
    let doxygen = tree.append_child("doxygen");
    for (tag, values) in tags {
        for value in values {
            doxygen.append_escaped(tag.as_str(), value);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DocNode;

    #[test]
    fn leading_text_becomes_description() {
        let tags = parse_tags("Adds two numbers.\n@param A first\n@param B second\n@return sum");
        assert_eq!(tags[0], ("description".to_string(), vec!["Adds two numbers.".to_string()]));
        assert_eq!(tags[1].0, "param");
        assert_eq!(tags[1].1, ["A first", "B second"]);
        assert_eq!(tags[2], ("return".to_string(), vec!["sum".to_string()]));
    }

    #[test]
    fn continuation_lines_join_current_tag() {
        let tags = parse_tags("@note first line\n  continues here");
        assert_eq!(tags, [("note".to_string(), vec!["first line continues here".to_string()])]);
    }

    #[test]
    fn comment_decorations_are_stripped() {
        let tags = parse_tags("/**\n * Opens the door.\n * @see Close\n */");
        assert_eq!(tags[0].1, ["Opens the door."]);
        assert_eq!(tags[1], ("see".to_string(), vec!["Close".to_string()]));
    }

    #[test]
    fn empty_comment_has_no_tags() {
        assert!(parse_tags("").is_empty());
        assert!(parse_tags("   \n\n").is_empty());
        let mut tree = DocTree::new();
        assert!(!append_doxygen(&mut tree, ""));
        assert!(tree.is_empty());
    }

    #[test]
    fn append_doxygen_repeats_tag_children() {
        let mut tree = DocTree::new();
        assert!(append_doxygen(&mut tree, "@param A a\n@param B b"));
        let doxygen = tree.find_child("doxygen").and_then(DocNode::as_tree).unwrap();
        assert_eq!(doxygen.find_all("param").len(), 2);
    }
}
