//! Boolean query parser.
//!
//! The query line is parsed with tantivy's query grammar; the resulting
//! `UserInputAst` is then lowered into a [`QueryTree`]:
//! - unqualified leaves are bound to the parser's default field, so later
//!   stages never have to guess which field a term belongs to
//! - leaf text goes through the index's text analyzer; a word that splits
//!   into several tokens becomes a SHOULD group, a quoted literal a phrase,
//!   and a literal that analyses to nothing (stop words) is dropped
//! - a nested group holding a single clause is folded into its parent with
//!   the composed occurrence, so `dog AND NOT bark` reads `+dog -bark`
//!
//! Ranges, sets, `*`, prefix terms and boosts have no [`QueryTree`] form and
//! are parse errors.

use tantivy::query_grammar::{self, Delimiter, UserInputAst, UserInputLeaf, UserInputLiteral};
use tantivy::tokenizer::TextAnalyzer;

use qbatch_core::error::{Error, Result};
use qbatch_core::types::{Clause, Occur, QueryTree};

use crate::tantivy_utils::{analyze, build_analyzer};

pub struct QueryParser {
    default_field: String,
    analyzer: TextAnalyzer,
}

impl QueryParser {
    /// Parser over `default_field` using the index's text analyzer.
    pub fn new(default_field: impl Into<String>) -> Self {
        Self {
            default_field: default_field.into(),
            analyzer: build_analyzer(),
        }
    }

    pub fn parse(&self, input: &str) -> Result<QueryTree> {
        let ast = query_grammar::parse_query(input)
            .map_err(|_| parse_error(input, "malformed query syntax"))?;
        let mut lowering = Lowering {
            input,
            default_field: &self.default_field,
            analyzer: self.analyzer.clone(),
        };
        Ok(lowering.lower(ast)?.unwrap_or_else(QueryTree::empty))
    }
}

fn parse_error(input: &str, reason: impl Into<String>) -> Error {
    Error::Parse {
        query: input.to_string(),
        reason: reason.into(),
    }
}

fn occur(occur: Option<query_grammar::Occur>) -> Occur {
    match occur {
        Some(query_grammar::Occur::Must) => Occur::Must,
        Some(query_grammar::Occur::MustNot) => Occur::MustNot,
        Some(query_grammar::Occur::Should) | None => Occur::Should,
    }
}

/// Occurrence of a clause reached through `outer` and then `inner`.
fn compose(outer: Occur, inner: Occur) -> Occur {
    match (outer, inner) {
        (Occur::Should, inner) => inner,
        (Occur::Must, Occur::MustNot) | (Occur::MustNot, Occur::Should | Occur::Must) => {
            Occur::MustNot
        }
        (Occur::Must, _) | (Occur::MustNot, Occur::MustNot) => Occur::Must,
    }
}

struct Lowering<'a> {
    input: &'a str,
    default_field: &'a str,
    analyzer: TextAnalyzer,
}

impl Lowering<'_> {
    fn lower(&mut self, ast: UserInputAst) -> Result<Option<QueryTree>> {
        match ast {
            UserInputAst::Clause(children) => {
                let mut clauses = Vec::with_capacity(children.len());
                for (child_occur, child) in children {
                    let outer = occur(child_occur);
                    match self.lower(child)? {
                        None => {}
                        Some(QueryTree::Boolean(mut inner)) if inner.len() == 1 => {
                            if let Some(only) = inner.pop() {
                                clauses.push(Clause::new(compose(outer, only.occur), only.query));
                            }
                        }
                        Some(query) => clauses.push(Clause::new(outer, query)),
                    }
                }
                Ok(finish(clauses))
            }
            UserInputAst::Leaf(leaf) => self.leaf(*leaf),
            UserInputAst::Boost(..) => Err(self.error("boosts are not supported")),
        }
    }

    fn leaf(&mut self, leaf: UserInputLeaf) -> Result<Option<QueryTree>> {
        match leaf {
            UserInputLeaf::Literal(literal) => self.literal(literal),
            UserInputLeaf::All => Err(self.error("'*' is not supported")),
            UserInputLeaf::Range { .. } => Err(self.error("range queries are not supported")),
            UserInputLeaf::Set { .. } => Err(self.error("set queries are not supported")),
            UserInputLeaf::Exists { .. } => Err(self.error("exists queries are not supported")),
        }
    }

    fn literal(&mut self, literal: UserInputLiteral) -> Result<Option<QueryTree>> {
        if literal.prefix {
            return Err(self.error(format!("prefix term '{}*' is not supported", literal.phrase)));
        }
        let field = literal
            .field_name
            .unwrap_or_else(|| self.default_field.to_string());
        let mut terms = analyze(&mut self.analyzer, &literal.phrase);
        let quoted = !matches!(literal.delimiter, Delimiter::None);
        Ok(match terms.len() {
            0 => None,
            1 => terms.pop().map(|text| QueryTree::term(field, text)),
            _ if quoted => Some(QueryTree::Phrase { field, terms }),
            _ => Some(QueryTree::Boolean(
                terms
                    .into_iter()
                    .map(|text| Clause::should(QueryTree::term(field.clone(), text)))
                    .collect(),
            )),
        })
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        parse_error(self.input, reason)
    }
}

/// A lone SHOULD clause stands for its own query.
fn finish(mut clauses: Vec<Clause>) -> Option<QueryTree> {
    match clauses.len() {
        0 => None,
        1 if clauses[0].occur == Occur::Should => clauses.pop().map(|c| c.query),
        _ => Some(QueryTree::Boolean(clauses)),
    }
}
