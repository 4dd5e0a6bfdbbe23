//! Typed view over the tree-sitter JavaScript syntax tree.
//!
//! The loader search only cares about a handful of node shapes. `classify`
//! folds every tree-sitter node into the closed `SyntaxNode` set and `walk`
//! drives a `Visitor` over the whole tree, depth-first, without recursion
//! (minified bundles nest deeply enough to exhaust a thread stack).

use tree_sitter::{Node, Parser, Tree};

/// Parses JavaScript source. `None` if the grammar cannot be loaded or the
/// parser gives up.
pub fn parse_javascript(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_javascript::LANGUAGE.into()) {
        log::error!("Failed to load the JavaScript grammar: {e}");
        return None;
    }
    parser.parse(source, None)
}

/// Body of a function literal.
#[derive(Debug, Clone, Copy)]
pub enum FunctionBody<'t> {
    /// `{ ... }`
    Block(Node<'t>),
    /// Arrow function shorthand `x => expr`
    Expression(Node<'t>),
}

#[derive(Debug, Clone)]
pub struct FunctionLiteral<'t> {
    /// Plain identifier parameters, in order; destructured or defaulted
    /// parameters are not included
    pub params: Vec<String>,
    pub body: FunctionBody<'t>,
}

/// The closed set of node kinds the loader search distinguishes.
#[derive(Debug, Clone)]
pub enum SyntaxNode<'t> {
    /// `left = right`
    Assignment { left: Node<'t>, right: Node<'t> },
    /// `a.b` or `a[b]`
    Member,
    /// Function expression or arrow function
    Function(FunctionLiteral<'t>),
    /// `return <argument>`; `None` for a bare `return`
    Return(Option<Node<'t>>),
    Other,
}

/// What the walker does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    Continue,
    Stop,
}

pub trait Visitor<'t> {
    fn visit(&mut self, node: &SyntaxNode<'t>) -> VisitFlow;
}

/// Maps a raw node onto the closed kind set.
pub fn classify<'t>(node: Node<'t>, source: &str) -> SyntaxNode<'t> {
    match node.kind() {
        "assignment_expression" => {
            match (node.child_by_field_name("left"), node.child_by_field_name("right")) {
                (Some(left), Some(right)) => SyntaxNode::Assignment {
                    left,
                    right: unwrap_parens(right),
                },
                _ => SyntaxNode::Other,
            }
        }
        "member_expression" | "subscript_expression" => SyntaxNode::Member,
        "function_expression" | "function" | "arrow_function" => {
            match function_literal(node, source) {
                Some(literal) => SyntaxNode::Function(literal),
                None => SyntaxNode::Other,
            }
        }
        "return_statement" => SyntaxNode::Return(
            named_children(node)
                .into_iter()
                .find(|child| child.kind() != "comment"),
        ),
        _ => SyntaxNode::Other,
    }
}

/// Walks the tree in pre-order until the visitor stops.
pub fn walk<'t, V: Visitor<'t>>(tree: &'t Tree, source: &str, visitor: &mut V) {
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if visitor.visit(&classify(node, source)) == VisitFlow::Stop {
            return;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        // Reverse so the leftmost child is visited first
        stack.extend(children.into_iter().rev());
    }
}

/// Source text of a node.
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Statements of a block other than comments and empty statements.
pub fn meaningful_statements(block: Node<'_>) -> Vec<Node<'_>> {
    named_children(block)
        .into_iter()
        .filter(|n| !matches!(n.kind(), "comment" | "empty_statement"))
        .collect()
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match named_children(node)
            .into_iter()
            .find(|child| child.kind() != "comment")
        {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn function_literal<'t>(node: Node<'t>, source: &str) -> Option<FunctionLiteral<'t>> {
    let params = if let Some(single) = node.child_by_field_name("parameter") {
        // `e => ...`
        vec![node_text(single, source).to_string()]
    } else {
        let list = node.child_by_field_name("parameters")?;
        named_children(list)
            .into_iter()
            .filter(|p| p.kind() == "identifier")
            .map(|p| node_text(p, source).to_string())
            .collect()
    };

    let body = node.child_by_field_name("body")?;
    let body = if body.kind() == "statement_block" {
        FunctionBody::Block(body)
    } else {
        FunctionBody::Expression(unwrap_parens(body))
    };
    Some(FunctionLiteral { params, body })
}
