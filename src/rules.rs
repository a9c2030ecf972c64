//! Built-in lint rules.
//!
//! Every rule is a stateless unit struct; [`default_rules`] lists them in
//! the order their findings are reported.

use crate::ast::{DeclarationKind, Node, NodeKind};
use crate::linter::{Finding, Rule};

/// Rules a [`Linter`](crate::Linter) starts with.
#[must_use]
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(MissingTypeAnnotation),
        Box::new(MissingReturnType),
        Box::new(MissingParamType),
        Box::new(NoLegacyFunction),
    ]
}

/// `var` and `final` declarations without a `: type`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingTypeAnnotation;

impl Rule for MissingTypeAnnotation {
    fn id(&self) -> &'static str {
        "missing-type-annotation"
    }

    fn description(&self) -> &'static str {
        "Variable declaration is missing type annotation"
    }

    fn check(&self, program: &Node) -> Vec<Finding> {
        program
            .collect(|n| {
                matches!(
                    &n.kind,
                    NodeKind::VariableDeclaration {
                        keyword,
                        type_annotation: None,
                        ..
                    } if *keyword != DeclarationKind::Const
                )
            })
            .into_iter()
            .filter_map(|n| match &n.kind {
                NodeKind::VariableDeclaration { name, .. } => Some(Finding::new(
                    format!("Variable {name} should have a type annotation"),
                    n.span,
                )),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MissingReturnType;

impl Rule for MissingReturnType {
    fn id(&self) -> &'static str {
        "missing-return-type"
    }

    fn description(&self) -> &'static str {
        "Function is missing return type annotation"
    }

    fn check(&self, program: &Node) -> Vec<Finding> {
        let mut findings = Vec::new();
        program.walk(&mut |n| {
            if let NodeKind::DefFunction {
                name,
                return_type: None,
                ..
            } = &n.kind
            {
                findings.push(Finding::new(
                    format!("Function {name} should have a return type annotation"),
                    n.span,
                ));
            }
        });
        findings
    }
}

/// Untyped `def` parameters, variadic ones included. Reported at the
/// parameter, not the function.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingParamType;

impl Rule for MissingParamType {
    fn id(&self) -> &'static str {
        "missing-param-type"
    }

    fn description(&self) -> &'static str {
        "Function parameter is missing type annotation"
    }

    fn check(&self, program: &Node) -> Vec<Finding> {
        let mut findings = Vec::new();
        program.walk(&mut |n| {
            let NodeKind::DefFunction { params, .. } = &n.kind else {
                return;
            };
            for param in params {
                if let NodeKind::Parameter {
                    name,
                    type_annotation: None,
                    ..
                } = &param.kind
                {
                    findings.push(Finding::new(
                        format!("Parameter {name} should have a type annotation"),
                        param.span,
                    ));
                }
            }
        });
        findings
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLegacyFunction;

impl Rule for NoLegacyFunction {
    fn id(&self) -> &'static str {
        "no-legacy-function"
    }

    fn description(&self) -> &'static str {
        "Legacy function syntax is not supported in vim9script-only mode"
    }

    fn check(&self, program: &Node) -> Vec<Finding> {
        program
            .collect(|n| matches!(n.kind, NodeKind::LegacyFunction { .. }))
            .into_iter()
            .map(|n| {
                Finding::new(
                    "Legacy function syntax is not allowed. Use 'def' instead of 'function'.",
                    n.span,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn run(rule: &dyn Rule, source: &str) -> Vec<Finding> {
        rule.check(&parse(tokenize(source)).program)
    }

    fn messages(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.message.as_str()).collect()
    }

    #[test]
    fn default_rule_ids_are_unique() {
        let rules = default_rules();
        let mut ids: Vec<&str> = rules.iter().map(|r| r.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn untyped_var_is_flagged() {
        let findings = run(&MissingTypeAnnotation, "vim9script\nvar count = 0");
        assert_eq!(
            messages(&findings),
            ["Variable count should have a type annotation"]
        );
        assert_eq!((findings[0].span.line, findings[0].span.column), (2, 1));
    }

    #[test]
    fn const_is_exempt_but_final_is_not() {
        let source = "vim9script\nconst A = 1\nfinal b = 2\nvar c: number = 3";
        assert_eq!(
            messages(&run(&MissingTypeAnnotation, source)),
            ["Variable b should have a type annotation"]
        );
    }

    #[test]
    fn declarations_inside_functions_are_checked() {
        let source = "vim9script\ndef F(): void\n  if true\n    var x = 1\n  endif\nenddef";
        let findings = run(&MissingTypeAnnotation, source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].span.line, 4);
    }

    #[test]
    fn missing_return_type() {
        let source = "vim9script\ndef Greet(name: string)\n  return 'x'\nenddef\ndef Ok(): number\n  return 1\nenddef";
        assert_eq!(
            messages(&run(&MissingReturnType, source)),
            ["Function Greet should have a return type annotation"]
        );
    }

    #[test]
    fn legacy_functions_are_not_def_functions() {
        let source = "vim9script\nfunction! Old(a)\n  return a:a\nendfunction";
        assert!(run(&MissingReturnType, source).is_empty());
        assert!(run(&MissingParamType, source).is_empty());
    }

    #[test]
    fn untyped_params_are_reported_at_the_param() {
        let source = "vim9script\ndef F(a: number, b, ...rest): void\nenddef";
        let findings = run(&MissingParamType, source);
        assert_eq!(
            messages(&findings),
            [
                "Parameter b should have a type annotation",
                "Parameter rest should have a type annotation",
            ]
        );
        assert_eq!(findings[0].span.line, 2);
        assert_eq!(findings[0].span.column, 18);
    }

    #[test]
    fn lambda_params_are_not_checked() {
        let source = "vim9script\nvar F: func = (x) => x + 1";
        assert!(run(&MissingParamType, source).is_empty());
    }

    #[test]
    fn legacy_function_is_flagged() {
        let source = "vim9script\nfunction! s:Helper() abort\n  echo 1\nendfunction";
        let findings = run(&NoLegacyFunction, source);
        assert_eq!(
            messages(&findings),
            ["Legacy function syntax is not allowed. Use 'def' instead of 'function'."]
        );
        assert_eq!(findings[0].span.line, 2);
    }
}
