//! Peripheral assignment planning.
//!
//! Each peripheral family that shares hardware resources between its
//! instances has a planner: a pure function from an ordered list of chosen
//! instances to an [`AssignmentPlan`]. The [`PlannerRegistry`] maps family
//! ids to planner kinds; families without an entry get the dedicated
//! planner. No two entries of a plan share the same (slot, bank) pair.

mod can;
mod dedicated;
mod exti;
mod pwm;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::PlanError;

pub use can::{CAN_EXTRA_BANK_BASE, CAN_FILTER_BANKS, CAN_SECONDARY_START_BANK};

/// Planning strategy of one peripheral family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlannerKind {
    /// Controllers sharing one filter-bank table and two receive FIFOs (bxCAN).
    SharedFilterBank,
    /// GPIO pins mapped onto external-interrupt lines.
    ExternalInterrupt,
    /// Timer channels driven as PWM outputs.
    PwmChannel,
    /// Instances owning their own handle and interrupt vector.
    Dedicated,
}

impl PlannerKind {
    /// Plan `instances` of `family`, in the given order.
    pub fn plan(self, family: &str, instances: &[String]) -> Result<AssignmentPlan, PlanError> {
        if instances.is_empty() {
            return Err(PlanError::NoInstances {
                family: family.to_string(),
            });
        }
        let entries = match self {
            Self::SharedFilterBank => can::plan(instances)?,
            Self::ExternalInterrupt => exti::plan(instances)?,
            Self::PwmChannel => pwm::plan(instances)?,
            Self::Dedicated => dedicated::plan(family, instances),
        };
        let plan = AssignmentPlan {
            family: family.to_string(),
            kind: self,
            entries,
        };
        debug_assert!(plan.resources_unique());
        Ok(plan)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SharedFilterBank => "shared-filter-bank",
            Self::ExternalInterrupt => "external-interrupt",
            Self::PwmChannel => "pwm-channel",
            Self::Dedicated => "dedicated",
        }
    }
}

impl std::fmt::Display for PlannerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family id to planner kind.
#[derive(Debug, Clone)]
pub struct PlannerRegistry {
    kinds: HashMap<String, PlannerKind>,
}

impl Default for PlannerRegistry {
    fn default() -> Self {
        let mut registry = PlannerRegistry {
            kinds: HashMap::new(),
        };
        registry.register("CAN", PlannerKind::SharedFilterBank);
        registry.register("EXTI", PlannerKind::ExternalInterrupt);
        registry.register("PWM", PlannerKind::PwmChannel);
        registry
    }
}

impl PlannerRegistry {
    /// Registry with the built-in families.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the planner of a family.
    pub fn register(&mut self, family: &str, kind: PlannerKind) {
        self.kinds.insert(family.to_ascii_uppercase(), kind);
    }

    /// Planner kind of a family; unregistered families are dedicated.
    pub fn kind_for(&self, family: &str) -> PlannerKind {
        self.kinds
            .get(&family.to_ascii_uppercase())
            .copied()
            .unwrap_or(PlannerKind::Dedicated)
    }

    /// Plan `instances` of `family` with its registered planner.
    pub fn plan(&self, family: &str, instances: &[String]) -> Result<AssignmentPlan, PlanError> {
        self.kind_for(family).plan(family, instances)
    }
}

/// Interrupt setup emitted for one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IrqDirective {
    /// NVIC vector name, e.g. `CAN1_RX0_IRQn`.
    pub vector: String,
    /// C statement activating the interrupt source.
    pub activation: String,
}

/// Callback registration binding an instance slot to a HAL callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchEntry {
    pub instance: String,
    pub slot: u32,
    /// HAL weak callback the entry is dispatched from.
    pub callback: String,
    /// Position among the entries sharing `callback`.
    pub ordinal: usize,
}

/// Resources assigned to one chosen instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub instance: String,
    /// C handle or pin macro the generated code refers to.
    pub handle: String,
    /// Family-specific resource slot (FIFO, EXTI line, timer channel).
    pub slot: u32,
    /// Family-specific resource bank (filter bank, timer number).
    pub bank: u32,
    /// Whether this entry configures a table shared with later entries.
    pub configures: bool,
    pub irq: Option<IrqDirective>,
    pub dispatch: Option<DispatchEntry>,
}

/// Ordered resource assignments of one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentPlan {
    pub family: String,
    pub kind: PlannerKind,
    pub entries: Vec<Assignment>,
}

impl AssignmentPlan {
    /// Interrupt directives with duplicates removed, first occurrence order.
    pub fn irq_directives(&self) -> Vec<&IrqDirective> {
        let mut seen: Vec<&IrqDirective> = Vec::new();
        for irq in self.entries.iter().filter_map(|e| e.irq.as_ref()) {
            if !seen.contains(&irq) {
                seen.push(irq);
            }
        }
        seen
    }

    /// Distinct NVIC vectors, first occurrence order.
    pub fn vectors(&self) -> Vec<&str> {
        let mut vectors: Vec<&str> = Vec::new();
        for irq in self.entries.iter().filter_map(|e| e.irq.as_ref()) {
            if !vectors.contains(&irq.vector.as_str()) {
                vectors.push(&irq.vector);
            }
        }
        vectors
    }

    pub fn dispatch_entries(&self) -> impl Iterator<Item = &DispatchEntry> {
        self.entries.iter().filter_map(|e| e.dispatch.as_ref())
    }

    /// Whether every entry holds a distinct (slot, bank) pair.
    pub fn resources_unique(&self) -> bool {
        let mut pairs: Vec<(u32, u32)> = self.entries.iter().map(|e| (e.slot, e.bank)).collect();
        pairs.sort_unstable();
        pairs.windows(2).all(|w| w[0] != w[1])
    }
}

/// Order chosen instances by their position in `available`.
///
/// Returns the ordered, de-duplicated choices and the choices `available`
/// no longer contains.
pub fn order_instances(chosen: &[String], available: &[String]) -> (Vec<String>, Vec<String>) {
    let ordered = available
        .iter()
        .filter(|a| chosen.contains(a))
        .cloned()
        .collect();
    let mut stale: Vec<String> = Vec::new();
    for c in chosen {
        if !available.contains(c) && !stale.contains(c) {
            stale.push(c.clone());
        }
    }
    (ordered, stale)
}

/// HAL handle name of a peripheral instance: `USART2` -> `huart2`, `CAN1` -> `hcan1`.
pub(crate) fn handle_name(instance: &str) -> String {
    let lower = instance.to_ascii_lowercase();
    let lower = match lower.strip_prefix("usart") {
        Some(rest) => format!("uart{rest}"),
        None => lower,
    };
    format!("h{lower}")
}

/// Attach dispatch ordinals: the n-th entry using a callback gets ordinal n.
pub(crate) fn number_callbacks(entries: &mut [Assignment]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for dispatch in entries.iter_mut().filter_map(|e| e.dispatch.as_mut()) {
        let count = counts.entry(dispatch.callback.clone()).or_default();
        dispatch.ordinal = *count;
        *count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn registry_defaults() {
        let registry = PlannerRegistry::new();
        assert_eq!(registry.kind_for("CAN"), PlannerKind::SharedFilterBank);
        assert_eq!(registry.kind_for("exti"), PlannerKind::ExternalInterrupt);
        assert_eq!(registry.kind_for("PWM"), PlannerKind::PwmChannel);
        assert_eq!(registry.kind_for("UART"), PlannerKind::Dedicated);
        assert_eq!(registry.kind_for("FDCAN"), PlannerKind::Dedicated);
    }

    #[test]
    fn registry_override() {
        let mut registry = PlannerRegistry::new();
        registry.register("CAN", PlannerKind::Dedicated);
        let plan = registry.plan("CAN", &names(&["CAN1", "CAN2"])).unwrap();
        assert_eq!(plan.kind, PlannerKind::Dedicated);
    }

    #[test]
    fn empty_instance_list_rejected() {
        for kind in [
            PlannerKind::SharedFilterBank,
            PlannerKind::ExternalInterrupt,
            PlannerKind::PwmChannel,
            PlannerKind::Dedicated,
        ] {
            assert!(matches!(
                kind.plan("X", &[]).unwrap_err(),
                PlanError::NoInstances { .. }
            ));
        }
    }

    #[test]
    fn order_follows_available() {
        let available = names(&["CAN1", "CAN2", "CAN3"]);
        let chosen = names(&["CAN3", "CAN1", "CAN9", "CAN1"]);
        let (ordered, stale) = order_instances(&chosen, &available);
        assert_eq!(ordered, names(&["CAN1", "CAN3"]));
        assert_eq!(stale, names(&["CAN9"]));
    }

    #[test]
    fn handle_names() {
        assert_eq!(handle_name("USART2"), "huart2");
        assert_eq!(handle_name("UART4"), "huart4");
        assert_eq!(handle_name("CAN1"), "hcan1");
        assert_eq!(handle_name("I2C1"), "hi2c1");
    }

    #[test]
    fn identical_input_identical_plan() {
        let registry = PlannerRegistry::new();
        let input = names(&["CAN1", "CAN2", "CAN3"]);
        assert_eq!(
            registry.plan("CAN", &input).unwrap(),
            registry.plan("CAN", &input).unwrap()
        );
    }
}
