use super::{MethodDecl, MethodKind, MethodLanguage, node_lines, node_text};

#[derive(Debug)]
pub struct RustMethods;

impl MethodLanguage for RustMethods {
    fn id(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn grammar(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn collect(&self, tree: &tree_sitter::Tree, source: &str) -> Vec<MethodDecl> {
        let mut decls = Vec::new();
        walk(tree.root_node(), source, &mut decls);
        decls
    }
}

fn walk(node: tree_sitter::Node<'_>, source: &str, decls: &mut Vec<MethodDecl>) {
    if node.kind() == "impl_item" {
        collect_impl_members(node, source, decls);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, source, decls);
    }
}

fn collect_impl_members(node: tree_sitter::Node<'_>, source: &str, decls: &mut Vec<MethodDecl>) {
    let Some(type_node) = node.child_by_field_name("type") else {
        return;
    };
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    // `impl Foo<T>` — identity uses the bare type name.
    let type_name = node_text(type_node, source)
        .split('<')
        .next()
        .unwrap_or_default()
        .trim();

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() != "function_item" {
            continue;
        }
        if let Some(decl) = to_decl(member, source, type_name) {
            decls.push(decl);
        }
    }
}

fn to_decl(node: tree_sitter::Node<'_>, source: &str, type_name: &str) -> Option<MethodDecl> {
    let name = node_text(node.child_by_field_name("name")?, source);
    let params = node.child_by_field_name("parameters")?;

    // `self` receivers are not counted; identity tracks the call arity.
    let mut cursor = params.walk();
    let param_count = params
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "parameter")
        .count();

    let (start_line, end_line) = node_lines(node);
    Some(MethodDecl {
        kind: MethodKind::Method,
        type_name: type_name.to_string(),
        method_name: name.to_string(),
        param_count,
        params_text: node_text(params, source).to_string(),
        start_line,
        end_line,
    })
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::extract::{MethodExtraction, MethodExtractor};
    use std::path::Path;

    fn extract(source: &str) -> Vec<crate::extract::ExtractedMethod> {
        match MethodExtractor::new()
            .extract_source(Path::new("test.rs"), source)
            .unwrap()
        {
            MethodExtraction::Methods(ms) => ms,
            other => panic!("expected methods, got {other:?}"),
        }
    }

    #[test]
    fn impl_methods_with_self_receiver() {
        let source = "struct Counter;\n\nimpl Counter {\n    fn add(&mut self, amount: u32) -> u32 {\n        amount\n    }\n\n    fn reset(&mut self) {}\n}\n";
        let methods = extract(source);
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].stable_id, "method:Counter.add(1)");
        assert_eq!(methods[1].stable_id, "method:Counter.reset(0)");
    }

    #[test]
    fn generic_impl_uses_bare_type_name() {
        let source = "struct Stack<T> { items: Vec<T> }\n\nimpl<T> Stack<T> {\n    fn push(&mut self, item: T) {\n        self.items.push(item);\n    }\n}\n";
        let methods = extract(source);
        assert_eq!(methods[0].stable_id, "method:Stack.push(1)");
    }

    #[test]
    fn free_functions_are_not_methods() {
        let methods = extract("fn main() {\n    println!(\"hi\");\n}\n");
        assert!(methods.is_empty());
    }
}
