//! Structural (syntax-tree) loader search.

use std::sync::LazyLock;

use regex::Regex;
use tree_sitter::Tree;

use super::syntax::{
    classify, meaningful_statements, node_text, walk, FunctionBody, FunctionLiteral, SyntaxNode,
    VisitFlow, Visitor,
};

/// Leading public-path reference, e.g. `n.p + ` or `__webpack_require__.p+`.
static PUBLIC_PATH_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[\w$]+\.p\s*\+\s*").expect("public path prefix regex is valid")
});

/// A loader found in the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralLoader {
    pub parameter: String,
    /// Returned expression with any leading public-path reference removed
    pub expression: String,
}

struct LoaderVisitor<'s> {
    source: &'s str,
    found: Option<StructuralLoader>,
}

impl<'t> Visitor<'t> for LoaderVisitor<'_> {
    fn visit(&mut self, node: &SyntaxNode<'t>) -> VisitFlow {
        let SyntaxNode::Assignment { left, right } = node else {
            return VisitFlow::Continue;
        };
        if !matches!(classify(*left, self.source), SyntaxNode::Member) {
            return VisitFlow::Continue;
        }
        let SyntaxNode::Function(literal) = classify(*right, self.source) else {
            return VisitFlow::Continue;
        };
        match loader_from_function(&literal, self.source) {
            Some(loader) => {
                self.found = Some(loader);
                VisitFlow::Stop
            }
            None => VisitFlow::Continue,
        }
    }
}

/// Finds the first `member = function(param) { return <...".js"...> }`
/// assignment in the tree.
pub fn find_structural_loader(tree: &Tree, source: &str) -> Option<StructuralLoader> {
    let mut visitor = LoaderVisitor {
        source,
        found: None,
    };
    walk(tree, source, &mut visitor);
    visitor.found
}

fn loader_from_function(literal: &FunctionLiteral<'_>, source: &str) -> Option<StructuralLoader> {
    let parameter = literal.params.first()?.clone();

    let returned = match literal.body {
        FunctionBody::Expression(expr) => expr,
        FunctionBody::Block(block) => {
            let statements = meaningful_statements(block);
            let [only] = statements.as_slice() else {
                return None;
            };
            match classify(*only, source) {
                SyntaxNode::Return(Some(argument)) => argument,
                _ => return None,
            }
        }
    };

    let expression = node_text(returned, source);
    if !expression.contains(".js") {
        return None;
    }
    Some(StructuralLoader {
        parameter,
        expression: strip_public_path_prefix(expression).to_string(),
    })
}

/// Removes a leading `X.p +`; reconciliation applies the public path itself.
pub fn strip_public_path_prefix(expression: &str) -> &str {
    match PUBLIC_PATH_PREFIX_RE.find(expression) {
        Some(m) => &expression[m.end()..],
        None => expression,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::syntax::parse_javascript;

    fn find(source: &str) -> Option<StructuralLoader> {
        let tree = parse_javascript(source).unwrap();
        find_structural_loader(&tree, source)
    }

    #[test]
    fn test_finds_function_expression_loader() {
        let source = r#"
            !function(){
                __x.p = "/static/";
                __x.u = function(e) { return {0:"a",1:"b"}[e] + ".js"; };
            }();
        "#;
        let loader = find(source).expect("loader");
        assert_eq!(loader.parameter, "e");
        assert_eq!(loader.expression, r#"{0:"a",1:"b"}[e] + ".js""#);
    }

    #[test]
    fn test_finds_arrow_function_loader() {
        let loader = find(r#"r.u = t => "static/js/" + t + "." + {7:"abc"}[t] + ".chunk.js";"#)
            .expect("loader");
        assert_eq!(loader.parameter, "t");
        assert!(loader.expression.starts_with(r#""static/js/""#));

        let loader = find(r#"r.u = (t) => { return t + ".js" }"#).expect("loader");
        assert_eq!(loader.expression, r#"t + ".js""#);
    }

    #[test]
    fn test_strips_public_path_prefix() {
        let loader =
            find(r#"o.x = function(e){ return o.p + "js/" + e + ".js" }"#).expect("loader");
        assert_eq!(loader.expression, r#""js/" + e + ".js""#);
    }

    #[test]
    fn test_ignores_comments_and_empty_statements() {
        let loader = find(r#"a.b = function(e){ /* map */ ; return e + ".js"; }"#);
        assert!(loader.is_some());
    }

    #[test]
    fn test_rejects_multi_statement_bodies() {
        let source = r#"a.b = function(e){ var x = 1; return e + ".js"; }"#;
        assert!(find(source).is_none());
    }

    #[test]
    fn test_rejects_non_member_targets_and_non_js_returns() {
        assert!(find(r#"x = function(e){ return e + ".js" }"#).is_none());
        assert!(find(r#"a.b = function(e){ return e + ".css" }"#).is_none());
        assert!(find(r#"a.b = function(){ return "x.js" }"#).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let source = r#"a.u = function(e){ return e + ".first.js" }; a.v = function(e){ return e + ".second.js" };"#;
        let loader = find(source).expect("loader");
        assert!(loader.expression.contains("first"));
    }

    #[test]
    fn test_finds_subscript_member_target() {
        let loader = find(r#"a["u"] = function(n){ return n + ".js" }"#).expect("loader");
        assert_eq!(loader.parameter, "n");
    }
}
