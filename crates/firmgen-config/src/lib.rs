//! Hardware configuration parsing for firmgen.
//!
//! A project is described by a vendor-tool `.ioc` file: a flat list of
//! `key=value` lines. This crate parses that text into an immutable
//! [`HardwareConfig`] and derives the typed views generation needs:
//! - **Peripheral instances** declared through `Mcu.IP<N>` keys
//! - **Flash layout** synthesized from the MCU identifier
//! - **Pin views** (PWM channels, GPIO candidates) from `<PIN>.Signal` keys

pub mod discover;
pub mod error;
pub mod flash;
pub mod parse;
pub mod pins;

pub use discover::{discover_config, load_config, ConfigDiscovery};
pub use error::{ConfigError, Result};
pub use flash::{flash_layout, FlashBank, FlashFamily, FlashLayout, FlashSector};
pub use parse::{parse, ConfigEntry, HardwareConfig, RTOS_FAMILY};
pub use pins::{GpioCandidate, PwmChannel};
