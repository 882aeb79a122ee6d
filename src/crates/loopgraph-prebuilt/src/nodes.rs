//! Reference node kinds
//!
//! Small, host-facing building blocks that demonstrate the node contract:
//! input records hold the fan-in summed values per input port, output record
//! fields are named after the ports they feed (the constraint back-edge
//! resolution relies on), and state is touched only through the execution
//! context.
//!
//! | Node | Inputs | Output | State |
//! |------|--------|--------|-------|
//! | [`ConstantNode`] | - | `value` = configured constant | - |
//! | [`AccumulatorNode`] | `in` | `value` = sum of inputs | `{"value": last sum}` |
//! | [`GainNode`] | `in` | `value` = factor × sum of inputs | - |

use async_trait::async_trait;
use loopgraph_core::{ExecutionContext, InputRecord, Node, OutputRecord, Port, Result};
use serde_json::{json, Value};

fn value_record(value: f64) -> OutputRecord {
    let mut record = OutputRecord::new();
    record.insert("value".to_string(), json!(value));
    record
}

/// Emits a fixed value on its `value` output every iteration
///
/// The usual signal source of a diagram; it has no inputs and no state.
#[derive(Debug, Clone)]
pub struct ConstantNode {
    id: String,
    value: f64,
}

impl ConstantNode {
    /// Create a constant node emitting `value`
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        ConstantNode {
            id: id.into(),
            value,
        }
    }
}

#[async_trait]
impl Node for ConstantNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn type_tag(&self) -> &str {
        "constant"
    }

    fn input_ports(&self) -> Vec<Port> {
        vec![]
    }

    fn output_ports(&self) -> Vec<Port> {
        vec![Port::output("value", "Value")]
    }

    async fn compute(
        &self,
        _inputs: &InputRecord,
        _ctx: &mut ExecutionContext,
    ) -> Result<OutputRecord> {
        Ok(value_record(self.value))
    }
}

/// Sums everything arriving on its `in` port and records the sum
///
/// The reference accumulator: each iteration it emits the fan-in sum of its
/// resolved inputs on `value` and stores the same number in its state slot
/// as `{"value": sum}`. The configured initial value seeds the slot before
/// the first iteration.
#[derive(Debug, Clone)]
pub struct AccumulatorNode {
    id: String,
    initial: f64,
}

impl AccumulatorNode {
    /// Create an accumulator whose state slot starts at `initial`
    pub fn new(id: impl Into<String>, initial: f64) -> Self {
        AccumulatorNode {
            id: id.into(),
            initial,
        }
    }
}

#[async_trait]
impl Node for AccumulatorNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn type_tag(&self) -> &str {
        "accumulator"
    }

    fn input_ports(&self) -> Vec<Port> {
        vec![Port::input("in", "Input")]
    }

    fn output_ports(&self) -> Vec<Port> {
        vec![Port::output("value", "Value")]
    }

    fn default_state(&self) -> Value {
        json!({ "value": self.initial })
    }

    async fn compute(
        &self,
        inputs: &InputRecord,
        ctx: &mut ExecutionContext,
    ) -> Result<OutputRecord> {
        let sum: f64 = inputs.values().sum();
        ctx.set_state(json!({ "value": sum }));
        Ok(value_record(sum))
    }
}

/// Scales the sum of its inputs by a fixed factor
///
/// Stateless; a factor below 1 damps a feedback loop, which is what makes a
/// convergence-driven run settle.
#[derive(Debug, Clone)]
pub struct GainNode {
    id: String,
    factor: f64,
}

impl GainNode {
    /// Create a gain node multiplying by `factor`
    pub fn new(id: impl Into<String>, factor: f64) -> Self {
        GainNode {
            id: id.into(),
            factor,
        }
    }
}

#[async_trait]
impl Node for GainNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn type_tag(&self) -> &str {
        "gain"
    }

    fn input_ports(&self) -> Vec<Port> {
        vec![Port::input("in", "Input")]
    }

    fn output_ports(&self) -> Vec<Port> {
        vec![Port::output("value", "Value")]
    }

    async fn compute(
        &self,
        inputs: &InputRecord,
        _ctx: &mut ExecutionContext,
    ) -> Result<OutputRecord> {
        let sum: f64 = inputs.values().sum();
        Ok(value_record(self.factor * sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_for(node: &dyn Node) -> ExecutionContext {
        ExecutionContext::new(node.id().to_string(), 1, node.default_state())
    }

    #[tokio::test]
    async fn test_constant_emits_its_value() {
        let node = ConstantNode::new("c", 5.0);
        let mut ctx = ctx_for(&node);
        let record = node.compute(&InputRecord::new(), &mut ctx).await.unwrap();
        assert_eq!(record["value"], json!(5.0));
    }

    #[tokio::test]
    async fn test_accumulator_sums_and_records_state() {
        let node = AccumulatorNode::new("acc", 0.0);
        let mut ctx = ctx_for(&node);
        assert_eq!(ctx.state(), &json!({"value": 0.0}));

        let inputs: InputRecord = [("in".to_string(), 7.5)].into();
        let record = node.compute(&inputs, &mut ctx).await.unwrap();
        assert_eq!(record["value"], json!(7.5));
        assert_eq!(ctx.state(), &json!({"value": 7.5}));
    }

    #[tokio::test]
    async fn test_gain_scales_the_input_sum() {
        let node = GainNode::new("g", 0.5);
        let mut ctx = ctx_for(&node);
        let inputs: InputRecord = [("in".to_string(), 8.0)].into();
        let record = node.compute(&inputs, &mut ctx).await.unwrap();
        assert_eq!(record["value"], json!(4.0));
    }
}
