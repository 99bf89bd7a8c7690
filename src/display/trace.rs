use crate::compute::{Engine, Ledger, Value};
use crate::config::GraphConfig;
use crate::error::EvalError;
use crate::store::{GraphStore, NodeId};
use std::collections::HashMap;
use std::fmt::Write;

/// Samples `target` at base seed `base` and renders the evaluation as a tree.
///
/// A node reached along several paths is printed in full once; later
/// occurrences point back to the level where it first appeared.
pub fn trace_sample(store: &GraphStore, config: &GraphConfig, target: NodeId, base: u32) -> Result<String, EvalError> {
    let recording = GraphConfig { memoize: true, ..config.clone() };
    let mut ledger = Ledger::with_capacity(store.node_count());
    Engine::new(store, &recording).evaluate_into(target, base, &mut ledger)?;
    Ok(format_trace(store, &ledger, target, base))
}

pub fn format_trace(store: &GraphStore, ledger: &Ledger, target: NodeId, base: u32) -> String {
    let mut tracer = Tracer {
        store,
        ledger,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    if store.contains(target) {
        let _ = writeln!(tracer.output, "SAMPLE TRACE for node {} (seed {}):", target, base);
        let _ = writeln!(tracer.output, "--------------------------------------------------");
        tracer.trace_node(target, 1, "");
    } else {
        let _ = writeln!(tracer.output, "Error: Invalid Node ID {}", target);
    }
    tracer.output
}

struct Tracer<'a> {
    store: &'a GraphStore,
    ledger: &'a Ledger,
    visited_at_level: HashMap<NodeId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, node_id: NodeId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(&node_id) {
            let _ = writeln!(self.output, "{}-> {} (Ref to L{})", prefix, node_id, first_seen);
            return;
        }
        self.visited_at_level.insert(node_id, level);

        let label = self.store.kind(node_id).map(|k| k.label()).unwrap_or_else(|| "?".into());
        let _ = writeln!(
            self.output,
            "{}[L{}] {} {} = {}",
            prefix,
            level,
            node_id,
            label,
            self.format_value(node_id)
        );

        let parents = self.store.predecessors(node_id).unwrap_or_default();
        let stem = self.build_child_stem(prefix);
        for (i, &parent) in parents.iter().enumerate() {
            let connector = if i == parents.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_node(parent, level + 1, &full_prefix);
        }
    }

    fn format_value(&self, id: NodeId) -> String {
        match self.ledger.get(id) {
            Some(Value::Scalar(s)) => format!("{:.4}", s),
            Some(Value::Array(items)) => format!("[len={}]", items.len()),
            None => "?".to_string(),
        }
    }

    fn build_child_stem(&self, current_prefix: &str) -> String {
        current_prefix.replace("`--", "   ").replace("|--", "|  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::BinaryOp;
    use crate::store::{NodeKind, Sampler};

    #[test]
    fn test_trace_marks_shared_nodes() {
        let mut store = GraphStore::new();
        let x = store.add_sampler(Sampler::identity());
        let two = store.add_constant(Value::Scalar(2.0));
        let y = store.register(NodeKind::Derived(BinaryOp::Mul.into()), &[(x, 0), (two, 1)]).unwrap();
        let z = store.register(NodeKind::Derived(BinaryOp::Add.into()), &[(x, 0), (y, 1)]).unwrap();

        let out = trace_sample(&store, &GraphConfig::default(), z, 4).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "SAMPLE TRACE for node #3 (seed 4):");
        assert_eq!(lines[2], "[L1] #3 add = 15.0000");
        assert_eq!(lines[3], "|--[L2] #0 seed = 5.0000");
        assert_eq!(lines[4], "`--[L2] #2 mul = 10.0000");
        assert_eq!(lines[5], "   |---> #0 (Ref to L2)");
        assert_eq!(lines[6], "   `--[L3] #1 const 2 = 2.0000");
    }

    #[test]
    fn test_trace_of_unknown_node() {
        let store = GraphStore::new();
        let err = trace_sample(&store, &GraphConfig::default(), NodeId(1), 0).unwrap_err();
        assert_eq!(err, EvalError::NotFound(NodeId(1)));
    }
}
