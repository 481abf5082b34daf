//! Flat `key=value` parsing and peripheral-declaration queries.
//!
//! The configuration is kept as an ordered list of entries so derived views
//! can report results in file order. Lookups by key return the last value
//! written for that key, matching how the vendor tool overrides settings.

use std::collections::HashMap;

use crate::error::{ConfigError, Result};
use crate::flash::{flash_layout, FlashLayout};

/// Peripheral family token that marks an RTOS-enabled project.
pub const RTOS_FAMILY: &str = "FREERTOS";

/// Key prefix of peripheral-declaration entries (`Mcu.IP0=USART1`).
const IP_KEY_PREFIX: &str = "Mcu.IP";

/// Families that accept more than one declaration token.
const FAMILY_ALIASES: &[(&str, &[&str])] = &[
    ("UART", &["UART", "USART"]),
    ("USART", &["UART", "USART"]),
];

/// A single `key=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Dotted key, trimmed.
    pub key: String,
    /// Raw value, trimmed.
    pub value: String,
    /// 1-based line number in the source text.
    pub line: usize,
}

/// Immutable parsed hardware configuration for one project.
#[derive(Debug, Clone, Default)]
pub struct HardwareConfig {
    entries: Vec<ConfigEntry>,
    index: HashMap<String, usize>,
}

/// Parse hardware-configuration text.
///
/// Blank lines and `#` comments are skipped. Unknown keys are retained.
pub fn parse(text: &str) -> Result<HardwareConfig> {
    let mut entries = Vec::new();
    let mut index = HashMap::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::MalformedConfig {
            line: i + 1,
            content: line.to_string(),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MalformedConfig {
                line: i + 1,
                content: line.to_string(),
            });
        }
        index.insert(key.to_string(), entries.len());
        entries.push(ConfigEntry {
            key: key.to_string(),
            value: value.trim().to_string(),
            line: i + 1,
        });
    }

    Ok(HardwareConfig { entries, index })
}

impl HardwareConfig {
    /// Look up a value by exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].value.as_str())
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the configuration has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The MCU identifier (`Mcu.UserName`, falling back to `Mcu.Name`).
    pub fn mcu_name(&self) -> Option<&str> {
        self.get("Mcu.UserName").or_else(|| self.get("Mcu.Name"))
    }

    /// Flash layout synthesized from [`HardwareConfig::mcu_name`].
    pub fn flash_layout(&self) -> Option<FlashLayout> {
        self.mcu_name().and_then(flash_layout)
    }

    /// Every peripheral declaration (`Mcu.IP<N>` values) in file order.
    pub fn declarations(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| is_ip_declaration(&e.key))
            .map(|e| e.value.as_str())
    }

    /// Declared instances of a peripheral family, unique, in first-seen order.
    ///
    /// A declaration belongs to `family` only when its token (the value with
    /// trailing instance digits removed) equals one of the family's accepted
    /// tokens exactly, so `CAN` never picks up `FDCAN1`.
    pub fn enabled_instances(&self, family: &str) -> Vec<String> {
        let accepted = family_tokens(family);
        let mut instances: Vec<String> = Vec::new();
        for value in self.declarations() {
            let token = family_token(value);
            if accepted.iter().any(|a| a.eq_ignore_ascii_case(token))
                && !instances.iter().any(|i| i == value)
            {
                instances.push(value.to_string());
            }
        }
        instances
    }

    /// Whether the RTOS middleware is enabled.
    pub fn freertos_enabled(&self) -> bool {
        let namespace = format!("{RTOS_FAMILY}.");
        self.declarations().any(|v| v == RTOS_FAMILY)
            || self.entries.iter().any(|e| e.key.starts_with(&namespace))
    }

    /// All `<INSTANCE>.<PARAM>` settings of one instance, in file order.
    pub fn instance_params(&self, instance: &str) -> Vec<(&str, &str)> {
        let prefix = format!("{instance}.");
        self.entries
            .iter()
            .filter_map(|e| {
                e.key
                    .strip_prefix(&prefix)
                    .map(|param| (param, e.value.as_str()))
            })
            .collect()
    }
}

/// `Mcu.IP<digits>`; `Mcu.IPNb` is a count, not a declaration.
fn is_ip_declaration(key: &str) -> bool {
    key.strip_prefix(IP_KEY_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Strip trailing instance digits: `USART3` -> `USART`, `I2C1` -> `I2C`.
pub(crate) fn family_token(value: &str) -> &str {
    let trimmed = value.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.is_empty() {
        value
    } else {
        trimmed
    }
}

fn family_tokens(family: &str) -> Vec<String> {
    let upper = family.to_ascii_uppercase();
    FAMILY_ALIASES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, tokens)| tokens.iter().map(|t| t.to_string()).collect())
        .unwrap_or_else(|| vec![upper])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
#MicroXplorer Configuration settings - do not modify
Mcu.Family=STM32F4
Mcu.IP0=CAN1
Mcu.IP1=CAN2
Mcu.IP2=FDCAN1
Mcu.IP3=USART1
Mcu.IP4=USART3
Mcu.IP5=LPUART1
Mcu.IP6=I2C1
Mcu.IP7=FREERTOS
Mcu.IPNb=8
Mcu.Name=STM32F407V(E-G)Tx
Mcu.UserName=STM32F407VGTx

CAN1.Prescaler=6
CAN1.Mode=CAN_MODE_NORMAL
";

    #[test]
    fn parse_keeps_unknown_keys() {
        let cfg = parse("Vendor.Custom.Thing=42\nOther=x=y\n").unwrap();
        assert_eq!(cfg.get("Vendor.Custom.Thing"), Some("42"));
        // Only the first '=' splits.
        assert_eq!(cfg.get("Other"), Some("x=y"));
        assert_eq!(cfg.len(), 2);
    }

    #[test]
    fn parse_rejects_line_without_separator() {
        let err = parse("Mcu.Name=STM32F103C8Tx\nthis line is broken\n").unwrap_err();
        match err {
            ConfigError::MalformedConfig { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "this line is broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_skips_blank_and_comment_lines() {
        let cfg = parse("\n# comment\n   \nA=1\n").unwrap();
        assert_eq!(cfg.len(), 1);
        assert_eq!(cfg.entries()[0].line, 4);
    }

    #[test]
    fn repeated_key_last_value_wins() {
        let cfg = parse("A=1\nA=2\n").unwrap();
        assert_eq!(cfg.get("A"), Some("2"));
        assert_eq!(cfg.entries().len(), 2);
    }

    #[test]
    fn uart_family_matches_usart_declarations() {
        let cfg = parse("Mcu.IP0=USART1\nMcu.IP1=USART3\n").unwrap();
        assert_eq!(cfg.enabled_instances("UART"), vec!["USART1", "USART3"]);
    }

    #[test]
    fn family_prefix_does_not_leak() {
        let cfg = parse(SAMPLE).unwrap();
        assert_eq!(cfg.enabled_instances("CAN"), vec!["CAN1", "CAN2"]);
        assert_eq!(cfg.enabled_instances("FDCAN"), vec!["FDCAN1"]);
        assert_eq!(cfg.enabled_instances("UART"), vec!["USART1", "USART3"]);
        assert_eq!(cfg.enabled_instances("LPUART"), vec!["LPUART1"]);
        assert_eq!(cfg.enabled_instances("I2C"), vec!["I2C1"]);
        assert!(cfg.enabled_instances("SPI").is_empty());
    }

    #[test]
    fn enabled_instances_unique_first_seen_order() {
        let cfg = parse("Mcu.IP0=SPI2\nMcu.IP1=SPI1\nMcu.IP2=SPI2\nMcu.IP3=SPI1\n").unwrap();
        assert_eq!(cfg.enabled_instances("spi"), vec!["SPI2", "SPI1"]);
    }

    #[test]
    fn ip_count_is_not_a_declaration() {
        let cfg = parse("Mcu.IPNb=8\nMcu.IP0=NVIC\n").unwrap();
        assert_eq!(cfg.declarations().collect::<Vec<_>>(), vec!["NVIC"]);
    }

    #[test]
    fn freertos_detection() {
        assert!(parse(SAMPLE).unwrap().freertos_enabled());
        assert!(parse("FREERTOS.Tasks01=default\n").unwrap().freertos_enabled());
        assert!(!parse("Mcu.IP0=USART1\nFREERTOSX=1\n").unwrap().freertos_enabled());
    }

    #[test]
    fn mcu_name_prefers_user_name() {
        let cfg = parse(SAMPLE).unwrap();
        assert_eq!(cfg.mcu_name(), Some("STM32F407VGTx"));
        let cfg = parse("Mcu.Name=STM32F103C8Tx\n").unwrap();
        assert_eq!(cfg.mcu_name(), Some("STM32F103C8Tx"));
        assert!(cfg.flash_layout().is_some());
    }

    #[test]
    fn instance_params_in_file_order() {
        let cfg = parse(SAMPLE).unwrap();
        assert_eq!(
            cfg.instance_params("CAN1"),
            vec![("Prescaler", "6"), ("Mode", "CAN_MODE_NORMAL")]
        );
        assert!(cfg.instance_params("CAN2").is_empty());
    }

    #[test]
    fn family_token_strips_instance_digits() {
        assert_eq!(family_token("USART3"), "USART");
        assert_eq!(family_token("I2C1"), "I2C");
        assert_eq!(family_token("TIM17"), "TIM");
        assert_eq!(family_token("USB_OTG_FS"), "USB_OTG_FS");
    }
}
