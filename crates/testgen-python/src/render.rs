//! Skeleton renderers.
//!
//! [`PytestRenderer`] emits function-call style tests, [`RobotRenderer`]
//! emits keyword style suites. Each rendered unit is self-contained (it
//! carries its own imports or settings) so units concatenate into a valid
//! artifact file in any order.

use testgen_core::OutputFormat;

use crate::skeleton::{CallTarget, SkeletonUnit};

/// Renders skeleton units in one output format.
pub trait SkeletonRenderer {
    /// The format this renderer produces.
    fn format(&self) -> OutputFormat;

    /// Render one unit. The result ends with a newline.
    fn render(&self, unit: &SkeletonUnit) -> String;
}

// ============================================================================
// Pytest
// ============================================================================

/// Renders pytest functions.
#[derive(Debug, Clone)]
pub struct PytestRenderer {
    /// Source root as seen from the artifact directory, `/`-separated.
    source_path: String,
}

impl PytestRenderer {
    /// Create a renderer whose artifacts put `source_path` on `sys.path`.
    pub fn new(source_path: impl Into<String>) -> Self {
        PytestRenderer {
            source_path: source_path.into(),
        }
    }

    fn preamble(&self, unit: &SkeletonUnit) -> String {
        let import = unit.target.import_name();
        let (importlib, binding) = if is_dotted_identifier(&unit.module) {
            ("", format!("from {} import {}\n", unit.module, import))
        } else {
            (
                "import importlib\n",
                format!(
                    "_mod = importlib.import_module({module})\n\
                     {import} = getattr(_mod, {name})\n",
                    module = python_string(&unit.module),
                    name = python_string(import),
                ),
            )
        };

        format!(
            "import sys\n\
             import os\n\
             {importlib}\
             import pytest\n\
             \n\
             # Add source directory to sys.path so we can import the module\n\
             src_path = os.path.abspath(os.path.join(os.path.dirname(__file__), {path}))\n\
             if src_path not in sys.path:\n    sys.path.insert(0, src_path)\n\
             \n\
             {binding}",
            path = python_string(&self.source_path),
        )
    }
}

impl SkeletonRenderer for PytestRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pytest
    }

    fn render(&self, unit: &SkeletonUnit) -> String {
        let stem = unit.target.test_stem();
        let args = unit
            .arguments
            .iter()
            .map(|a| a.python())
            .collect::<Vec<_>>()
            .join(", ");
        let argc = unit.bad_input_count;
        let marker = format!("# REQ-ID: {}", unit.requirement);

        let body = match &unit.target {
            CallTarget::Function { name } => format!(
                "{marker}\n\
                 def test_{stem}_basic():\n    \
                     # Replace placeholders with real assertions\n    \
                     result = {name}({args})\n    \
                     assert result is not None\n\
                 \n\
                 {marker}\n\
                 def test_{stem}_bad_inputs():\n    \
                     with pytest.raises(Exception):\n        \
                         {name}(*[None for _ in range({argc})])\n"
            ),
            CallTarget::Method { class_path, name } => format!(
                "{marker}\n\
                 def test_{stem}_basic():\n    \
                     obj = {class_path}()\n    \
                     result = obj.{name}({args})\n    \
                     assert result is not None\n\
                 \n\
                 {marker}\n\
                 def test_{stem}_bad_inputs():\n    \
                     obj = {class_path}()\n    \
                     with pytest.raises(Exception):\n        \
                         getattr(obj, \"{name}\")(*[None for _ in range({argc})])\n"
            ),
        };

        format!("{}\n{}", self.preamble(unit), body)
    }
}

/// Reserved words that cannot name a module segment.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// True if every `.`-separated segment of `module` is a Python identifier.
///
/// Otherwise the module is only importable through `importlib`.
pub fn is_dotted_identifier(module: &str) -> bool {
    module.split('.').all(|segment| {
        let mut chars = segment.chars();
        let starts_well = chars
            .next()
            .is_some_and(|c| c == '_' || c.is_alphabetic());
        starts_well
            && chars.all(|c| c == '_' || c.is_alphanumeric())
            && !PYTHON_KEYWORDS.contains(&segment)
    })
}

/// Quote `text` as a double-quoted Python string literal.
fn python_string(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

// ============================================================================
// Robot Framework
// ============================================================================

/// Separator between Robot cells.
const CELL: &str = "    ";

/// Renders Robot Framework suites.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobotRenderer;

impl RobotRenderer {
    fn library(unit: &SkeletonUnit) -> String {
        match &unit.target {
            CallTarget::Function { .. } => unit.module.clone(),
            CallTarget::Method { class_path, .. } => format!("{}.{}", unit.module, class_path),
        }
    }

    fn row(cells: &[&str]) -> String {
        format!("{CELL}{}\n", cells.join(CELL))
    }
}

impl SkeletonRenderer for RobotRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Robot
    }

    fn render(&self, unit: &SkeletonUnit) -> String {
        let keyword = unit.target.name();
        let title = unit.target.test_stem();
        let tags = Self::row(&["[Tags]", unit.requirement.as_str()]);

        let mut basic = vec!["${result}=", keyword];
        basic.extend(unit.arguments.iter().map(|a| a.robot()));

        let mut bad = vec!["Run Keyword And Expect Error", "*", keyword];
        bad.extend(std::iter::repeat_n("${None}", unit.bad_input_count));

        let mut out = String::new();
        out.push_str("*** Settings ***\n");
        out.push_str(&format!("Library{CELL}{}\n", Self::library(unit)));
        out.push('\n');
        out.push_str("*** Test Cases ***\n");
        out.push_str(&format!("{title} Basic\n"));
        out.push_str(&tags);
        out.push_str(&Self::row(&basic));
        out.push_str(&Self::row(&["Should Not Be Equal", "${result}", "${None}"]));
        out.push('\n');
        out.push_str(&format!("{title} Bad Inputs\n"));
        out.push_str(&tags);
        out.push_str(&Self::row(&bad));
        out
    }
}

/// Renderer for `format`.
pub fn renderer_for(format: OutputFormat, source_path: &str) -> Box<dyn SkeletonRenderer> {
    match format {
        OutputFormat::Pytest => Box::new(PytestRenderer::new(source_path)),
        OutputFormat::Robot => Box::new(RobotRenderer),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgLiteral;
    use crate::syntax::is_valid_python;
    use testgen_core::requirements::RequirementMarker;

    fn function_unit() -> SkeletonUnit {
        SkeletonUnit {
            module: "example_module".into(),
            target: CallTarget::Function { name: "add".into() },
            arguments: vec![ArgLiteral::Int, ArgLiteral::Int],
            bad_input_count: 2,
            requirement: RequirementMarker::Linked("REQ-101".into()),
        }
    }

    fn method_unit() -> SkeletonUnit {
        SkeletonUnit {
            module: "pkg.shapes".into(),
            target: CallTarget::Method {
                class_path: "Outer.Inner".into(),
                name: "area".into(),
            },
            arguments: vec![ArgLiteral::Float, ArgLiteral::Mapping],
            bad_input_count: 2,
            requirement: RequirementMarker::Unlinked,
        }
    }

    mod pytest {
        use super::*;

        #[test]
        fn function_unit_is_well_formed() {
            let text = PytestRenderer::new("../src").render(&function_unit());
            assert!(is_valid_python(&text), "{}", text);
            assert!(text.contains("from example_module import add\n"));
            assert!(text.contains("result = add(1, 1)"));
            assert!(text.contains("add(*[None for _ in range(2)])"));
            assert!(text.contains("# REQ-ID: REQ-101\ndef test_add_basic():"));
            assert!(text.contains("os.path.dirname(__file__), \"../src\""));
            assert!(text.ends_with('\n'));
        }

        #[test]
        fn method_unit_instantiates_class_path() {
            let text = PytestRenderer::new("..").render(&method_unit());
            assert!(is_valid_python(&text), "{}", text);
            assert!(text.contains("from pkg.shapes import Outer\n"));
            assert!(text.contains("obj = Outer.Inner()"));
            assert!(text.contains("result = obj.area(0.5, {})"));
            assert!(text.contains("getattr(obj, \"area\")(*[None for _ in range(2)])"));
            assert!(text.contains("def test_Outer_Inner_area_bad_inputs():"));
            assert!(text.contains("# REQ-ID: REQ-N/A"));
        }

        #[test]
        fn non_identifier_module_uses_importlib() {
            for module in ["my-pkg.util", "2fast", "pkg.class"] {
                let unit = SkeletonUnit {
                    module: module.into(),
                    ..function_unit()
                };
                let text = PytestRenderer::new("../src").render(&unit);
                assert!(is_valid_python(&text), "{}", text);
                assert!(text.contains("import importlib\n"));
                assert!(text.contains(&format!(
                    "_mod = importlib.import_module(\"{}\")\nadd = getattr(_mod, \"add\")\n",
                    module
                )));
                assert!(!text.contains(" from "));
            }
        }

        #[test]
        fn non_identifier_module_binds_outer_class() {
            let unit = SkeletonUnit {
                module: "my-pkg.shapes".into(),
                ..method_unit()
            };
            let text = PytestRenderer::new("..").render(&unit);
            assert!(is_valid_python(&text), "{}", text);
            assert!(text.contains("Outer = getattr(_mod, \"Outer\")\n"));
            assert!(text.contains("obj = Outer.Inner()"));
        }

        #[test]
        fn dotted_identifier_detection() {
            assert!(is_dotted_identifier("example_module"));
            assert!(is_dotted_identifier("pkg.sub._private"));
            assert!(!is_dotted_identifier("my-pkg.util"));
            assert!(!is_dotted_identifier("2fast"));
            assert!(!is_dotted_identifier("pkg.import"));
            assert!(!is_dotted_identifier("pkg..util"));
        }

        #[test]
        fn source_path_is_escaped() {
            let text = PytestRenderer::new("C:\\src \"x\"").render(&function_unit());
            assert!(is_valid_python(&text), "{}", text);
        }

        #[test]
        fn zero_argument_call() {
            let unit = SkeletonUnit {
                arguments: vec![],
                bad_input_count: 0,
                ..function_unit()
            };
            let text = PytestRenderer::new(".").render(&unit);
            assert!(text.contains("result = add()"));
            assert!(text.contains("range(0)"));
            assert!(is_valid_python(&text));
        }
    }

    mod robot {
        use super::*;

        #[test]
        fn function_suite_layout() {
            let text = RobotRenderer.render(&function_unit());
            let expected = "\
*** Settings ***
Library    example_module

*** Test Cases ***
add Basic
    [Tags]    REQ-101
    ${result}=    add    ${1}    ${1}
    Should Not Be Equal    ${result}    ${None}

add Bad Inputs
    [Tags]    REQ-101
    Run Keyword And Expect Error    *    add    ${None}    ${None}
";
            assert_eq!(text, expected);
        }

        #[test]
        fn method_suite_imports_class_library() {
            let text = RobotRenderer.render(&method_unit());
            assert!(text.contains("Library    pkg.shapes.Outer.Inner\n"));
            assert!(text.contains("[Tags]    REQ-N/A"));
            assert!(text.contains("area    ${0.5}    ${{ {} }}"));
        }
    }

    #[test]
    fn renderer_for_selects_format() {
        assert_eq!(renderer_for(OutputFormat::Pytest, ".").format(), OutputFormat::Pytest);
        assert_eq!(renderer_for(OutputFormat::Robot, ".").format(), OutputFormat::Robot);
    }
}
