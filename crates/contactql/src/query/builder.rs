//! Builds the query tree from a parse tree.

use super::ast::{BoolCombination, BoolOperator, Operator, QueryNode};
use super::error::QueryResult;
use super::parser::ParseTree;
use super::validate::{Validator, IMPLICIT_KEY};

/// Converts parse trees to validated query nodes, bottom-up.
pub(crate) struct AstBuilder<'a> {
    validator: Validator<'a>,
}

impl<'a> AstBuilder<'a> {
    pub(crate) fn new(validator: Validator<'a>) -> Self {
        Self { validator }
    }

    pub(crate) fn build(&self, tree: ParseTree) -> QueryResult<QueryNode> {
        match tree {
            ParseTree::Condition {
                property,
                operator,
                literal,
            } => {
                let condition = self.validator.condition(
                    &property.to_lowercase(),
                    operator,
                    literal.into_value(),
                )?;
                Ok(QueryNode::Condition(condition))
            }
            ParseTree::ImplicitCondition(literal) => {
                let condition =
                    self.validator
                        .condition(IMPLICIT_KEY, Operator::Equal, literal.into_value())?;
                Ok(QueryNode::Condition(condition))
            }
            ParseTree::CombinationAnd(left, right)
            | ParseTree::CombinationImplicitAnd(left, right) => {
                self.combination(BoolOperator::And, *left, *right)
            }
            ParseTree::CombinationOr(left, right) => {
                self.combination(BoolOperator::Or, *left, *right)
            }
            ParseTree::Grouping(inner) => self.build(*inner),
        }
    }

    fn combination(
        &self,
        operator: BoolOperator,
        left: ParseTree,
        right: ParseTree,
    ) -> QueryResult<QueryNode> {
        let children = vec![self.build(left)?, self.build(right)?];
        Ok(QueryNode::BoolCombination(BoolCombination::new(
            operator, children,
        )))
    }
}
