use super::{MethodDecl, MethodKind, MethodLanguage, node_lines, node_text};

#[derive(Debug)]
pub struct JavaMethods;

impl MethodLanguage for JavaMethods {
    fn id(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn collect(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<MethodDecl> {
        let mut decls = Vec::new();
        walk(tree.root_node(), source, &mut decls);
        decls
    }
}

fn walk(node: tree_sitter::Node<'_>, source: &str, decls: &mut Vec<MethodDecl>) {
    if matches!(
        node.kind(),
        "class_declaration" | "interface_declaration" | "enum_declaration"
    ) {
        collect_type_members(node, source, decls);
    }

    // Recurse everywhere so nested type declarations are found; their
    // members attribute to the nested type's own name.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, decls);
    }
}

/// Methods and constructors that are direct members of a type body.
/// Declarations inside anonymous classes or lambdas are not members here
/// and are deliberately skipped.
fn collect_type_members(node: tree_sitter::Node<'_>, source: &str, decls: &mut Vec<MethodDecl>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let type_name = node_text(name_node, source);

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        let kind = match member.kind() {
            "method_declaration" => MethodKind::Method,
            "constructor_declaration" => MethodKind::Ctor,
            _ => continue,
        };
        if let Some(decl) = to_decl(member, source, type_name, kind) {
            decls.push(decl);
        }
    }
}

fn to_decl(
    node: tree_sitter::Node<'_>,
    source: &str,
    type_name: &str,
    kind: MethodKind,
) -> Option<MethodDecl> {
    let name = node_text(node.child_by_field_name("name")?, source);
    let params = node.child_by_field_name("parameters")?;

    let mut cursor = params.walk();
    let param_count = params
        .named_children(&mut cursor)
        .filter(|c| matches!(c.kind(), "formal_parameter" | "spread_parameter"))
        .count();

    let (start_line, end_line) = node_lines(node);
    Some(MethodDecl {
        kind,
        type_name: type_name.to_string(),
        method_name: name.to_string(),
        param_count,
        params_text: node_text(params, source).to_string(),
        start_line,
        end_line,
    })
}

// ── Tests ──────────────────────────────────────────────────────────
