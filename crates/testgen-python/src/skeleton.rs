//! Format-neutral skeleton model.
//!
//! A [`SkeletonUnit`] holds everything a renderer needs to emit the two test
//! cases for one declaration: what to call, with which placeholder arguments,
//! how many null arguments the bad-input case passes, and the requirement
//! marker. Both renderers consume the same unit.

use serde::Serialize;

use testgen_core::requirements::{RequirementIndex, RequirementMarker};
use testgen_core::Declaration;

use crate::args::ArgLiteral;

/// Parameter names treated as the implicit receiver of a method.
const RECEIVER_NAMES: &[&str] = &["self", "cls"];

/// What a skeleton invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallTarget {
    /// A module-level function.
    Function { name: String },
    /// A method on an instance of `class_path` (dotted for nested classes).
    Method { class_path: String, name: String },
}

impl CallTarget {
    /// The callable's own name.
    pub fn name(&self) -> &str {
        match self {
            CallTarget::Function { name } | CallTarget::Method { name, .. } => name,
        }
    }

    /// Top-level name to import from the module.
    pub fn import_name(&self) -> &str {
        match self {
            CallTarget::Function { name } => name,
            CallTarget::Method { class_path, .. } => class_path
                .split_once('.')
                .map(|(outer, _)| outer)
                .unwrap_or(class_path),
        }
    }

    /// Identifier-safe stem for test names: `add`, `Math_square`.
    pub fn test_stem(&self) -> String {
        match self {
            CallTarget::Function { name } => name.clone(),
            CallTarget::Method { class_path, name } => {
                format!("{}_{}", class_path.replace('.', "_"), name)
            }
        }
    }
}

/// One declaration's skeleton, before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkeletonUnit {
    /// Dotted module the target lives in.
    pub module: String,
    /// The callable.
    pub target: CallTarget,
    /// Placeholder arguments for the basic case, receiver excluded.
    pub arguments: Vec<ArgLiteral>,
    /// Number of null arguments in the bad-input case.
    pub bad_input_count: usize,
    /// Linked requirement, or the sentinel.
    pub requirement: RequirementMarker,
}

impl SkeletonUnit {
    /// Build the unit for `decl`, linking it against `requirements`.
    pub fn from_declaration(decl: &Declaration, requirements: &RequirementIndex) -> Self {
        let target = match decl.class_path() {
            Some(class_path) => CallTarget::Method {
                class_path: class_path.to_string(),
                name: decl.name.clone(),
            },
            None => CallTarget::Function {
                name: decl.name.clone(),
            },
        };

        let arguments: Vec<ArgLiteral> = callable_parameters(decl)
            .iter()
            .map(|param| ArgLiteral::for_annotation(decl.annotation_for(param)))
            .collect();

        SkeletonUnit {
            module: decl.module.clone(),
            target,
            bad_input_count: arguments.len(),
            arguments,
            requirement: requirements.lookup(&decl.name),
        }
    }
}

/// Parameters a caller supplies: everything except a method's receiver.
pub fn callable_parameters(decl: &Declaration) -> &[String] {
    match decl.parameters.split_first() {
        Some((first, rest)) if decl.is_method() && RECEIVER_NAMES.contains(&first.as_str()) => {
            rest
        }
        _ => &decl.parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn decl(qualified_name: &str, params: &[(&str, Option<&str>)]) -> Declaration {
        let name = qualified_name.rsplit('.').next().unwrap().to_string();
        let mut annotations = BTreeMap::new();
        for (param, annotation) in params {
            if let Some(a) = annotation {
                annotations.insert(param.to_string(), a.to_string());
            }
        }
        Declaration {
            module: "example_module".to_string(),
            qualified_name: qualified_name.to_string(),
            name,
            parameters: params.iter().map(|(p, _)| p.to_string()).collect(),
            parameter_annotations: annotations,
            return_annotation: None,
            docstring: None,
            relative_path: "example_module.py".to_string(),
        }
    }

    #[test]
    fn free_function_unit() {
        let index = RequirementIndex::from_design("REQ-101: add numbers\n");
        let unit = SkeletonUnit::from_declaration(
            &decl("add", &[("a", Some("int")), ("b", Some("int"))]),
            &index,
        );
        assert_eq!(unit.target, CallTarget::Function { name: "add".into() });
        assert_eq!(unit.arguments, vec![ArgLiteral::Int, ArgLiteral::Int]);
        assert_eq!(unit.bad_input_count, 2);
        assert_eq!(unit.requirement, RequirementMarker::Linked("REQ-101".into()));
    }

    #[test]
    fn method_receiver_is_excluded() {
        let unit = SkeletonUnit::from_declaration(
            &decl("Math.square", &[("self", None), ("n", Some("int"))]),
            &RequirementIndex::empty(),
        );
        assert_eq!(unit.arguments, vec![ArgLiteral::Int]);
        assert_eq!(unit.bad_input_count, 1);
        assert_eq!(unit.target.test_stem(), "Math_square");
        assert_eq!(unit.requirement, RequirementMarker::Unlinked);
    }

    #[test]
    fn self_on_free_function_is_an_ordinary_parameter() {
        let unit = SkeletonUnit::from_declaration(
            &decl("odd", &[("self", None)]),
            &RequirementIndex::empty(),
        );
        assert_eq!(unit.bad_input_count, 1);
    }

    #[test]
    fn static_method_keeps_all_parameters() {
        let unit = SkeletonUnit::from_declaration(
            &decl("K.make", &[("value", Some("str"))]),
            &RequirementIndex::empty(),
        );
        assert_eq!(unit.arguments, vec![ArgLiteral::Str]);
    }

    #[test]
    fn bad_input_count_matches_parameter_count() {
        for k in 0..5 {
            let params: Vec<(String, Option<&str>)> =
                (0..k).map(|i| (format!("p{}", i), None)).collect();
            let borrowed: Vec<(&str, Option<&str>)> =
                params.iter().map(|(p, a)| (p.as_str(), *a)).collect();
            let unit =
                SkeletonUnit::from_declaration(&decl("f", &borrowed), &RequirementIndex::empty());
            assert_eq!(unit.bad_input_count, k);
        }
    }

    #[test]
    fn nested_class_imports_outermost() {
        let target = CallTarget::Method {
            class_path: "Outer.Inner".into(),
            name: "run".into(),
        };
        assert_eq!(target.import_name(), "Outer");
        assert_eq!(target.test_stem(), "Outer_Inner_run");
    }
}
