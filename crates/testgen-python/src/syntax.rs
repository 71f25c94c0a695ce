//! Python syntax trees via tree-sitter.

use tree_sitter::{Language, Node, Parser, Tree};

/// Statement kinds the grammar accepts that Python 3 rejects.
const PYTHON2_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

/// The tree-sitter Python grammar.
pub fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

/// Parse `source` into a syntax tree.
///
/// Returns `None` if the parser cannot be created, if the tree contains any
/// error or missing node, or if it holds a Python 2 `print`/`exec` statement.
/// Callers never see a partially valid tree.
pub fn parse_python(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&python_language()).ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() || contains_python2_statement(root) {
        None
    } else {
        Some(tree)
    }
}

/// Pre-order walk looking for statement kinds outside Python 3.
fn contains_python2_statement(root: Node<'_>) -> bool {
    let mut cursor = root.walk();
    loop {
        if PYTHON2_STATEMENTS.contains(&cursor.node().kind()) {
            return true;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return false;
            }
        }
    }
}

/// True if `source` parses as Python without syntax errors.
pub fn is_valid_python(source: &str) -> bool {
    parse_python(source).is_some()
}

/// Source text covered by `node`.
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_module() {
        assert!(is_valid_python("def f(a, b):\n    return a + b\n"));
        assert!(is_valid_python(""));
    }

    #[test]
    fn rejects_broken_module() {
        assert!(!is_valid_python("def f(:\n    pass\n"));
        assert!(!is_valid_python("class A\n    x = 1\n"));
    }

    #[test]
    fn rejects_python2_statements() {
        assert!(!is_valid_python("def test_x():\n    print \"hello\"\n"));
        assert!(!is_valid_python("exec \"x = 1\"\n"));
        assert!(!is_valid_python(
            "def test_x():\n    print \"hello\"\n    exec \"x = 1\"\n"
        ));
    }

    #[test]
    fn print_call_is_python3() {
        assert!(is_valid_python("def test_x():\n    print(\"hello\")\n"));
        assert!(is_valid_python("log = print\nlog(1)\n"));
    }

    #[test]
    fn node_text_slices_source() {
        let source = "x = 1\n";
        let tree = parse_python(source).unwrap();
        let root = tree.root_node();
        assert_eq!(node_text(root, source).trim_end(), "x = 1");
    }
}
