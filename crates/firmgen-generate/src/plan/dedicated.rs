//! Planning for peripherals whose instances share nothing.

use crate::plan::{handle_name, number_callbacks, Assignment, DispatchEntry, IrqDirective};

/// Receive-complete style callback of families that dispatch interrupts.
fn callback(family: &str) -> Option<&'static str> {
    match family.to_ascii_uppercase().as_str() {
        "UART" | "USART" => Some("HAL_UART_RxCpltCallback"),
        "SPI" => Some("HAL_SPI_TxRxCpltCallback"),
        "I2C" => Some("HAL_I2C_MemRxCpltCallback"),
        "ADC" => Some("HAL_ADC_ConvCpltCallback"),
        _ => None,
    }
}

pub(crate) fn plan(family: &str, instances: &[String]) -> Vec<Assignment> {
    let callback = callback(family);
    let mut entries: Vec<Assignment> = instances
        .iter()
        .enumerate()
        .map(|(i, instance)| {
            let handle = handle_name(instance);
            Assignment {
                instance: instance.clone(),
                irq: callback.map(|_| IrqDirective {
                    vector: format!("{instance}_IRQn"),
                    activation: format!("HAL_NVIC_EnableIRQ({instance}_IRQn);"),
                }),
                dispatch: callback.map(|cb| DispatchEntry {
                    instance: instance.clone(),
                    slot: 0,
                    callback: cb.to_string(),
                    ordinal: 0,
                }),
                handle,
                slot: 0,
                bank: i as u32,
                configures: false,
            }
        })
        .collect();
    number_callbacks(&mut entries);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_instance_owns_handle_and_vector() {
        let entries = plan("UART", &["USART1".to_string(), "UART4".to_string()]);
        assert_eq!(entries[0].handle, "huart1");
        assert_eq!(entries[1].handle, "huart4");
        assert_eq!(entries[0].irq.as_ref().unwrap().vector, "USART1_IRQn");
        assert_eq!(entries[1].dispatch.as_ref().unwrap().ordinal, 1);
        assert_ne!((entries[0].slot, entries[0].bank), (entries[1].slot, entries[1].bank));
    }

    #[test]
    fn families_without_callbacks_have_no_irq() {
        let entries = plan("GPIO", &["PA5".to_string()]);
        assert!(entries[0].irq.is_none());
        assert!(entries[0].dispatch.is_none());
    }
}
