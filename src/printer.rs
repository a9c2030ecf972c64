//! Indented debug dump of a syntax tree.
//!
//! One node per line: kind, a short summary of its own fields, and its
//! position. Children follow, indented two spaces deeper.

use std::fmt::Write as _;

use crate::ast::{ForTarget, Node, NodeKind, TypeExpr};

/// Render `node` and its descendants.
#[must_use]
pub fn print_tree(node: &Node) -> String {
    let mut out = String::new();
    let mut stack = vec![(node, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        print_node(&mut out, node, depth);
        stack.extend(node.children().into_iter().rev().map(|child| (child, depth + 1)));
    }
    out
}

fn print_node(out: &mut String, node: &Node, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(node.kind_name());
    let summary = summary(&node.kind);
    if !summary.is_empty() {
        out.push(' ');
        out.push_str(&summary);
    }
    let _ = writeln!(out, " @{}:{}", node.span.line, node.span.column);
}

fn typed(name: &str, ty: Option<&TypeExpr>) -> String {
    ty.map_or_else(|| name.to_string(), |ty| format!("{name}: {ty}"))
}

fn bang(bang: bool) -> &'static str {
    if bang { "!" } else { "" }
}

fn summary(kind: &NodeKind) -> String {
    match kind {
        NodeKind::VariableDeclaration {
            keyword,
            name,
            type_annotation,
            ..
        } => format!("{} {}", keyword.as_str(), typed(name, type_annotation.as_ref())),
        NodeKind::DefFunction {
            name, return_type, ..
        } => typed(name, return_type.as_ref()),
        NodeKind::LegacyFunction {
            name,
            bang: b,
            attributes,
            ..
        } => {
            let mut s = format!("{}{name}", bang(*b));
            for attribute in attributes {
                s.push(' ');
                s.push_str(attribute);
            }
            s
        }
        NodeKind::Parameter {
            name,
            type_annotation,
            variadic,
            ..
        } => {
            let dots = if *variadic && name != "..." { "..." } else { "" };
            format!("{dots}{}", typed(name, type_annotation.as_ref()))
        }
        NodeKind::Import {
            path,
            module,
            autoload,
            alias,
        } => {
            let mut s = String::new();
            if *autoload {
                s.push_str("autoload ");
            }
            s.push_str(path.as_deref().or(module.as_deref()).unwrap_or_default());
            if let Some(alias) = alias {
                let _ = write!(s, " as {alias}");
            }
            s
        }
        NodeKind::For { target, .. } => match target {
            ForTarget::Single(name) => name.clone(),
            ForTarget::List(names) => format!("[{}]", names.join(", ")),
            ForTarget::Tuple(names) => format!("({})", names.join(", ")),
        },
        NodeKind::Catch { pattern, .. } => pattern.clone().unwrap_or_default(),
        NodeKind::Let { operator, .. } => operator.clone().unwrap_or_default(),
        NodeKind::Assignment { operator, .. }
        | NodeKind::Binary { operator, .. }
        | NodeKind::Unary { operator, .. } => operator.clone(),
        NodeKind::Literal { kind, value } => format!("{kind:?} {value}"),
        NodeKind::Identifier { scope, name } => format!("{name} ({scope:?})"),
        NodeKind::ScopeDict { scope } => format!("{scope:?}"),
        NodeKind::Register { name } => format!("@{name}"),
        NodeKind::Lambda {
            return_type,
            legacy,
            ..
        } => {
            let style = if *legacy { "legacy" } else { "=>" };
            return_type
                .as_ref()
                .map_or_else(|| style.to_string(), |ty| format!("{style} {ty}"))
        }
        NodeKind::FunctionCall { name, builtin, .. } => {
            if *builtin {
                format!("{name} (builtin)")
            } else {
                name.clone()
            }
        }
        NodeKind::FunctionReference { function, .. } => function.clone(),
        NodeKind::MethodCall { method, .. } => format!("->{method}"),
        NodeKind::PropertyAccess { property, .. } => format!(".{property}"),
        NodeKind::Dict { entries } => entries
            .iter()
            .map(|e| e.key.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        NodeKind::Echo { command, .. } => command.clone(),
        NodeKind::Autocmd { bang: b, raw } | NodeKind::Runtime { bang: b, raw } => {
            format!("{}{raw}", bang(*b))
        }
        NodeKind::Augroup { name, .. } => name.clone(),
        NodeKind::Mapping {
            command, lhs, rhs, ..
        } => format!("{command} {lhs} {rhs}"),
        NodeKind::CommandDefinition {
            bang: b,
            name,
            implementation,
            ..
        } => format!("{}{name} {implementation}", bang(*b)),
        NodeKind::Filter {
            bang: b, pattern, ..
        } => format!("{}{pattern}", bang(*b)),
        NodeKind::Silent { bang: b, .. } => bang(*b).to_string(),
        NodeKind::ExCommand {
            name,
            bang: b,
            raw,
        } => {
            if raw.is_empty() {
                format!("{name}{}", bang(*b))
            } else {
                format!("{name}{} {raw}", bang(*b))
            }
        }
        NodeKind::Comment { text } => text.clone(),
        NodeKind::BlockEnd { keyword } => keyword.clone(),
        NodeKind::Program { .. }
        | NodeKind::Vim9Script
        | NodeKind::Export { .. }
        | NodeKind::If { .. }
        | NodeKind::While { .. }
        | NodeKind::Try { .. }
        | NodeKind::Throw { .. }
        | NodeKind::Return { .. }
        | NodeKind::Break
        | NodeKind::Continue
        | NodeKind::Ternary { .. }
        | NodeKind::Block { .. }
        | NodeKind::Call { .. }
        | NodeKind::Index { .. }
        | NodeKind::Slice { .. }
        | NodeKind::List { .. }
        | NodeKind::ListConcat { .. }
        | NodeKind::Missing
        | NodeKind::Execute { .. }
        | NodeKind::CallStatement { .. }
        | NodeKind::ExpressionStatement { .. } => String::new(),
    }
}
