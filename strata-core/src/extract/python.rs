use super::{MethodDecl, MethodKind, MethodLanguage, node_lines, node_text};

#[derive(Debug)]
pub struct PythonMethods;

impl MethodLanguage for PythonMethods {
    fn id(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn collect(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<MethodDecl> {
        let mut decls = Vec::new();
        walk(tree.root_node(), source, &mut decls);
        decls
    }
}

fn walk(node: tree_sitter::Node<'_>, source: &str, decls: &mut Vec<MethodDecl>) {
    if node.kind() == "class_definition" {
        collect_class_members(node, source, decls);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, decls);
    }
}

fn collect_class_members(node: tree_sitter::Node<'_>, source: &str, decls: &mut Vec<MethodDecl>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let class_name = node_text(name_node, source);

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        // Decorated methods wrap the function one level down.
        let func = match member.kind() {
            "function_definition" => member,
            "decorated_definition" => match member.child_by_field_name("definition") {
                Some(def) if def.kind() == "function_definition" => def,
                _ => continue,
            },
            _ => continue,
        };
        if let Some(decl) = to_decl(func, source, class_name) {
            decls.push(decl);
        }
    }
}

fn to_decl(node: tree_sitter::Node<'_>, source: &str, class_name: &str) -> Option<MethodDecl> {
    let name = node_text(node.child_by_field_name("name")?, source);
    let params = node.child_by_field_name("parameters")?;

    // `self`/`cls` are ordinary identifiers in the grammar and count like
    // any other parameter.
    let mut cursor = params.walk();
    let param_count = params
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .count();

    let kind = if name == "__init__" {
        MethodKind::Ctor
    } else {
        MethodKind::Method
    };

    let (start_line, end_line) = node_lines(node);
    Some(MethodDecl {
        kind,
        type_name: class_name.to_string(),
        method_name: name.to_string(),
        param_count,
        params_text: node_text(params, source).to_string(),
        start_line,
        end_line,
    })
}

// ── Tests ──────────────────────────────────────────────────────────
