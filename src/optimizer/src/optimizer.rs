use common::logical_plan::{Operation, SelectionNode};
use common::Column;
use log::debug;

/// Rule-based rewriter for logical plans.
///
/// The only rewrite implemented is selection push-down: each Selection is
/// moved as far toward the data sources as legality permits, so joins and
/// sorts above it see fewer rows. There is no cost model; the legality
/// check alone decides.
pub struct Optimizer;

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Self {}
    }

    /// Rewrites the plan, returning a new tree. The input is left intact;
    /// rewrites reconstruct parents bottom-up through `clone_with`, so the
    /// result is always a fully formed tree.
    ///
    /// # Arguments
    ///
    /// * `plan` - Root of the logical plan to rewrite.
    pub fn optimize(&self, plan: &Operation) -> Operation {
        self.push_down_selections(plan)
    }

    /// Walks the tree looking for Selection nodes to push down.
    ///
    /// A Selection's subtree is optimized before the Selection itself is
    /// pushed, so stacked selections are each pushed independently, deepest
    /// first.
    fn push_down_selections(&self, plan: &Operation) -> Operation {
        if let Operation::Selection(node) = plan {
            let child = self.push_down_selections(&node.child);
            return self.push_through(&child, node);
        }
        let children = plan
            .children()
            .iter()
            .map(|c| self.push_down_selections(c))
            .collect();
        plan.clone_with(children)
    }

    /// Attempts to sink the selection below `plan`. Recursion inserts the
    /// selection at the deepest legal point of each eligible branch; if no
    /// child admits the push, the selection settles directly above `plan`
    /// (which reproduces the original structure when nothing moved).
    fn push_through(&self, plan: &Operation, selection: &SelectionNode) -> Operation {
        let mut did_push_down = false;
        let mut children = Vec::new();
        for child in plan.children() {
            if self.can_push_through(plan, child, selection) {
                children.push(self.push_through(child, selection));
                did_push_down = true;
            } else {
                children.push(child.clone());
            }
        }
        if did_push_down {
            return plan.clone_with(children);
        }
        Operation::Selection(SelectionNode {
            child: Box::new(plan.clone()),
            requires: selection.requires.clone(),
            predicate: selection.predicate.clone(),
        })
    }

    /// The legality predicate for one branch: the selection may sink into
    /// `child` only if `plan` is one of the variants known to commute with
    /// a selection, `plan` still exposes every column the selection
    /// requires (so the swap is an equivalence), and the branch it lands on
    /// carries those columns too.
    ///
    /// Union admits the push on every leg, which replicates the selection
    /// onto each; Product and Projection pass it through the single
    /// relevant branch as a whole unit. Everything else halts the push at
    /// this level.
    fn can_push_through(&self, plan: &Operation, child: &Operation, selection: &SelectionNode) -> bool {
        match plan {
            Operation::Union(_) | Operation::Product(_) | Operation::Projection(_) => (),
            _ => {
                debug!("push-down blocked below {}: variant not eligible", plan.name());
                return false;
            }
        }
        if !contains_all(&plan.provides(), &selection.requires) {
            debug!(
                "push-down blocked below {}: required column missing",
                plan.name()
            );
            return false;
        }
        if !contains_all(&child.provides(), &selection.requires) {
            debug!(
                "push-down into {} branch blocked: required column missing",
                child.name()
            );
            return false;
        }
        debug!("push-down admitted through {}", plan.name());
        true
    }
}

/// True when every required column appears, by qualified name, among the
/// provided columns.
fn contains_all(provides: &[Column], requires: &[Column]) -> bool {
    requires.iter().all(|r| {
        provides
            .iter()
            .any(|p| p.qualified_name() == r.qualified_name())
    })
}
