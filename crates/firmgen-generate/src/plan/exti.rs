//! External-interrupt line planning.
//!
//! A pin drives the EXTI line matching its pin number, whatever its port,
//! so two pins with the same number cannot both interrupt. Lines 0-4 have
//! their own vectors; lines 5-9 and 10-15 share one vector each.

use crate::error::PlanError;
use crate::plan::{number_callbacks, Assignment, DispatchEntry, IrqDirective};

const FAMILY: &str = "EXTI";
const CALLBACK: &str = "HAL_GPIO_EXTI_Callback";

pub(crate) fn plan(instances: &[String]) -> Result<Vec<Assignment>, PlanError> {
    let mut claimed: Vec<(u8, &str)> = Vec::new();
    let mut entries = Vec::with_capacity(instances.len());
    for pin in instances {
        let line = pin_line(pin).ok_or_else(|| PlanError::InvalidInstance {
            family: FAMILY.to_string(),
            instance: pin.clone(),
        })?;
        if let Some((_, first)) = claimed.iter().find(|(l, _)| *l == line) {
            return Err(PlanError::ExtiLineConflict {
                line,
                first: first.to_string(),
                second: pin.clone(),
            });
        }
        claimed.push((line, pin.as_str()));

        let vector = vector(line);
        entries.push(Assignment {
            instance: pin.clone(),
            handle: format!("GPIO_PIN_{line}"),
            slot: u32::from(line),
            bank: 0,
            configures: false,
            irq: Some(IrqDirective {
                activation: format!("HAL_NVIC_EnableIRQ({vector});"),
                vector,
            }),
            dispatch: Some(DispatchEntry {
                instance: pin.clone(),
                slot: u32::from(line),
                callback: CALLBACK.to_string(),
                ordinal: 0,
            }),
        });
    }
    number_callbacks(&mut entries);
    Ok(entries)
}

/// `PC13` -> 13; the optional `-suffix` of pin names is ignored.
fn pin_line(pin: &str) -> Option<u8> {
    let base = pin.split(['-', ' ']).next()?;
    let rest = base.strip_prefix('P')?;
    let mut chars = rest.chars();
    if !chars.next()?.is_ascii_uppercase() {
        return None;
    }
    let line: u8 = chars.as_str().parse().ok()?;
    (line <= 15).then_some(line)
}

fn vector(line: u8) -> String {
    match line {
        0..=4 => format!("EXTI{line}_IRQn"),
        5..=9 => "EXTI9_5_IRQn".to_string(),
        _ => "EXTI15_10_IRQn".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannerKind;

    fn pins(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lines_follow_pin_numbers() {
        let entries = plan(&pins(&["PA0", "PC13", "PB5"])).unwrap();
        let lines: Vec<u32> = entries.iter().map(|e| e.slot).collect();
        assert_eq!(lines, vec![0, 13, 5]);
        assert_eq!(entries[1].handle, "GPIO_PIN_13");
        assert_eq!(entries[1].irq.as_ref().unwrap().vector, "EXTI15_10_IRQn");
        assert_eq!(entries[0].irq.as_ref().unwrap().vector, "EXTI0_IRQn");
    }

    #[test]
    fn same_line_on_two_ports_conflicts() {
        let err = plan(&pins(&["PA3", "PB3"])).unwrap_err();
        assert!(matches!(
            err,
            PlanError::ExtiLineConflict { line: 3, ref first, ref second }
                if first == "PA3" && second == "PB3"
        ));
    }

    #[test]
    fn shared_vectors_enabled_once() {
        let plan = PlannerKind::ExternalInterrupt
            .plan("EXTI", &pins(&["PA5", "PB6", "PC10", "PC13", "PA1"]))
            .unwrap();
        assert_eq!(
            plan.vectors(),
            vec!["EXTI9_5_IRQn", "EXTI15_10_IRQn", "EXTI1_IRQn"]
        );
        assert_eq!(plan.irq_directives().len(), 3);
        assert!(plan.resources_unique());
        let ordinals: Vec<usize> = plan.dispatch_entries().map(|d| d.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn pin_names() {
        assert_eq!(pin_line("PA0"), Some(0));
        assert_eq!(pin_line("PC13-TAMPER-RTC"), Some(13));
        assert_eq!(pin_line("PA16"), None);
        assert_eq!(pin_line("VDD"), None);
        assert!(matches!(
            plan(&pins(&["BOOT0"])).unwrap_err(),
            PlanError::InvalidInstance { .. }
        ));
    }
}
