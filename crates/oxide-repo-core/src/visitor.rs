//! Double dispatch over condition trees.
//!
//! [`ConditionVisitor::visit`] routes each node to the handler for its
//! kind. Composite and relational nodes are visited post-order: children
//! first, then the parent handler receives their outputs in child order.
//! Handlers a visitor does not override fail with
//! [`Error::UnsupportedConditionKind`], so an incomplete visitor reports
//! the node it cannot handle instead of silently skipping it.

use crate::condition::{
    BinaryOp, CollectionOp, CompositeOp, Condition, ConditionKind, TernaryOp, UnaryOp,
};
use crate::error::{Error, Result};
use crate::field::FieldRef;
use crate::value::SqlValue;

pub trait ConditionVisitor {
    type Output;

    fn visit(&mut self, condition: &Condition) -> Result<Self::Output> {
        match condition {
            Condition::Unary { field, op } => self.visit_unary(field, *op),
            Condition::Binary { field, op, operand } => self.visit_binary(field, *op, operand),
            Condition::Ternary {
                field,
                op,
                first,
                second,
            } => self.visit_ternary(field, *op, first, second),
            Condition::Collection {
                field,
                op,
                operands,
            } => self.visit_collection(field, *op, operands),
            Condition::Relational {
                relation,
                condition: inner,
            } => {
                self.enter_relational(relation)?;
                let output = self.visit(inner)?;
                self.visit_relational(relation, inner, output)
            }
            Condition::Composite { op, children } => {
                let outputs = children
                    .iter()
                    .map(|child| self.visit(child))
                    .collect::<Result<Vec<_>>>()?;
                self.visit_composite(*op, children, outputs)
            }
        }
    }

    fn visit_unary(&mut self, _field: &FieldRef, _op: UnaryOp) -> Result<Self::Output> {
        Err(Error::UnsupportedConditionKind(ConditionKind::Unary))
    }

    fn visit_binary(
        &mut self,
        _field: &FieldRef,
        _op: BinaryOp,
        _operand: &SqlValue,
    ) -> Result<Self::Output> {
        Err(Error::UnsupportedConditionKind(ConditionKind::Binary))
    }

    fn visit_ternary(
        &mut self,
        _field: &FieldRef,
        _op: TernaryOp,
        _first: &SqlValue,
        _second: &SqlValue,
    ) -> Result<Self::Output> {
        Err(Error::UnsupportedConditionKind(ConditionKind::Ternary))
    }

    fn visit_collection(
        &mut self,
        _field: &FieldRef,
        _op: CollectionOp,
        _operands: &[SqlValue],
    ) -> Result<Self::Output> {
        Err(Error::UnsupportedConditionKind(ConditionKind::Collection))
    }

    /// Called before the condition under `relation` is visited.
    fn enter_relational(&mut self, _relation: &FieldRef) -> Result<()> {
        Ok(())
    }

    /// `inner` is the related condition, already visited into `output`.
    fn visit_relational(
        &mut self,
        _relation: &FieldRef,
        _inner: &Condition,
        _output: Self::Output,
    ) -> Result<Self::Output> {
        Err(Error::UnsupportedConditionKind(ConditionKind::Relational))
    }

    /// `outputs[i]` is the result of visiting `children[i]`.
    fn visit_composite(
        &mut self,
        _op: CompositeOp,
        _children: &[Condition],
        _outputs: Vec<Self::Output>,
    ) -> Result<Self::Output> {
        Err(Error::UnsupportedConditionKind(ConditionKind::Composite))
    }
}

/// Collects every field a condition tree mentions, in visit order.
#[derive(Debug, Default)]
pub struct FieldCollector {
    fields: Vec<FieldRef>,
}

impl FieldCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields of `condition`, relations included.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in node kinds.
    pub fn collect(condition: &Condition) -> Result<Vec<FieldRef>> {
        let mut collector = Self::new();
        collector.visit(condition)?;
        Ok(collector.fields)
    }
}

impl ConditionVisitor for FieldCollector {
    type Output = ();

    fn visit_unary(&mut self, field: &FieldRef, _op: UnaryOp) -> Result<()> {
        self.fields.push(*field);
        Ok(())
    }

    fn visit_binary(&mut self, field: &FieldRef, _op: BinaryOp, _operand: &SqlValue) -> Result<()> {
        self.fields.push(*field);
        Ok(())
    }

    fn visit_ternary(
        &mut self,
        field: &FieldRef,
        _op: TernaryOp,
        _first: &SqlValue,
        _second: &SqlValue,
    ) -> Result<()> {
        self.fields.push(*field);
        Ok(())
    }

    fn visit_collection(
        &mut self,
        field: &FieldRef,
        _op: CollectionOp,
        _operands: &[SqlValue],
    ) -> Result<()> {
        self.fields.push(*field);
        Ok(())
    }

    fn visit_relational(&mut self, relation: &FieldRef, _inner: &Condition, _output: ()) -> Result<()> {
        self.fields.push(*relation);
        Ok(())
    }

    fn visit_composite(&mut self, _op: CompositeOp, _children: &[Condition], _outputs: Vec<()>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{EntityMeta, FieldMeta, FieldType};

    const NAME: FieldMeta = FieldMeta::new("name", FieldType::Text);
    const AGE: FieldMeta = FieldMeta::new("age", FieldType::Integer);
    const PEOPLE: EntityMeta = EntityMeta::new("Person", "people", &[NAME, AGE]);

    fn name_eq(value: &str) -> Condition {
        Condition::Binary {
            field: FieldRef::new(&PEOPLE, &NAME),
            op: BinaryOp::Eq,
            operand: SqlValue::Text(value.to_string()),
        }
    }

    /// Renders binary equality only.
    struct EqualityPrinter;

    impl ConditionVisitor for EqualityPrinter {
        type Output = String;

        fn visit_binary(&mut self, field: &FieldRef, _op: BinaryOp, operand: &SqlValue) -> Result<String> {
            Ok(format!("{}={}", field.name(), operand.to_sql_inline()))
        }

        fn visit_composite(
            &mut self,
            op: CompositeOp,
            _children: &[Condition],
            outputs: Vec<String>,
        ) -> Result<String> {
            let sep = match op {
                CompositeOp::And => "&",
                CompositeOp::Or => "|",
            };
            Ok(outputs.join(sep))
        }
    }

    #[test]
    fn test_composite_receives_children_in_order() {
        let cond = name_eq("a").or(name_eq("b")).or(name_eq("c"));
        assert_eq!(EqualityPrinter.visit(&cond).unwrap(), "name='a'|name='b'|name='c'");
    }

    #[test]
    fn test_unhandled_kind_is_reported() {
        let cond = name_eq("a").and(Condition::Unary {
            field: FieldRef::new(&PEOPLE, &AGE),
            op: UnaryOp::IsNull,
        });
        assert_eq!(
            EqualityPrinter.visit(&cond),
            Err(Error::UnsupportedConditionKind(ConditionKind::Unary))
        );
    }

    #[test]
    fn test_field_collector_visits_every_leaf() {
        let cond = name_eq("a").and(Condition::Ternary {
            field: FieldRef::new(&PEOPLE, &AGE),
            op: TernaryOp::Between,
            first: SqlValue::Int(1),
            second: SqlValue::Int(2),
        });
        let fields = FieldCollector::collect(&cond).unwrap();
        let names: Vec<_> = fields.iter().map(FieldRef::name).collect();
        assert_eq!(names, ["name", "age"]);
    }
}
