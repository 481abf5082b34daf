//! Pin-level signal views: PWM channels and GPIO candidates.

use serde::Serialize;

use crate::parse::HardwareConfig;

/// Signal prefixes that claim a pin for a non-GPIO function.
const NON_GPIO_SIGNALS: &[&str] = &[
    "RCC_", "SYS_", "USART", "UART", "LPUART", "SPI", "I2C", "I2S", "TIM", "S_TIM", "CAN",
    "FDCAN", "ADC", "DAC", "USB", "SDIO", "SDMMC", "ETH", "FMC", "QUADSPI", "SAI", "DCMI",
];

/// Signal prefix of an external-interrupt GPIO line.
const EXTI_SIGNAL: &str = "GPXTI";

/// A timer output channel assigned to a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PwmChannel {
    pub pin: String,
    pub timer: u8,
    pub channel: u8,
    /// Complementary (`CHxN`) output.
    pub complementary: bool,
    pub label: Option<String>,
}

impl PwmChannel {
    /// Instance name used for selection and planning, e.g. `TIM2_CH1`.
    pub fn instance(&self) -> String {
        format!("TIM{}_CH{}", self.timer, self.channel)
    }
}

/// A physical pin usable as plain GPIO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpioCandidate {
    /// Pin name as it appears in the key, e.g. `PC13`.
    pub pin: String,
    pub port: char,
    pub number: u8,
    pub signal: String,
    pub label: Option<String>,
    /// Whether the signal is an external-interrupt line.
    pub exti: bool,
}

impl HardwareConfig {
    /// Timer channels routed to pins, unique by (timer, channel), file order.
    pub fn pwm_channels(&self) -> Vec<PwmChannel> {
        let mut channels: Vec<PwmChannel> = Vec::new();
        for (pin, signal) in self.pin_signals() {
            let Some((timer, channel, complementary)) = parse_timer_signal(signal) else {
                continue;
            };
            if channels
                .iter()
                .any(|c| c.timer == timer && c.channel == channel)
            {
                continue;
            }
            channels.push(PwmChannel {
                pin: pin.to_string(),
                timer,
                channel,
                complementary,
                label: self.pin_label(pin),
            });
        }
        channels
    }

    /// Physical pins not claimed by a non-GPIO signal, in file order.
    ///
    /// With `require_interrupt`, only external-interrupt pins are kept.
    pub fn gpio_candidates(&self, require_interrupt: bool) -> Vec<GpioCandidate> {
        let mut pins: Vec<GpioCandidate> = Vec::new();
        for (pin, signal) in self.pin_signals() {
            let Some((port, number)) = parse_pin_name(pin) else {
                continue;
            };
            if NON_GPIO_SIGNALS.iter().any(|p| signal.starts_with(p)) {
                continue;
            }
            let exti = signal.starts_with(EXTI_SIGNAL);
            if require_interrupt && !exti {
                continue;
            }
            if pins.iter().any(|p| p.pin == pin) {
                continue;
            }
            pins.push(GpioCandidate {
                pin: pin.to_string(),
                port,
                number,
                signal: signal.to_string(),
                label: self.pin_label(pin),
                exti,
            });
        }
        pins
    }

    /// (pin, signal) pairs from `<PIN>.Signal` keys.
    fn pin_signals(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries().iter().filter_map(|e| {
            e.key
                .strip_suffix(".Signal")
                .map(|pin| (pin, e.value.as_str()))
        })
    }

    fn pin_label(&self, pin: &str) -> Option<String> {
        self.get(&format!("{pin}.GPIO_Label"))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
    }
}

/// `PA0`, `PC13`, `PC14-OSC32_IN` -> (port, number); virtual pins are rejected.
fn parse_pin_name(pin: &str) -> Option<(char, u8)> {
    let base = pin.split(['-', ' ']).next()?;
    let rest = base.strip_prefix('P')?;
    let mut chars = rest.chars();
    let port = chars.next()?;
    if !port.is_ascii_uppercase() {
        return None;
    }
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = digits.parse::<u8>().ok()?;
    Some((port, number))
}

/// `S_TIM2_CH1`, `TIM1_CH3N` -> (timer, channel, complementary).
fn parse_timer_signal(signal: &str) -> Option<(u8, u8, bool)> {
    let body = signal.strip_prefix("S_").unwrap_or(signal);
    let body = body.strip_prefix("TIM")?;
    let (timer, channel) = body.split_once("_CH")?;
    let (channel, complementary) = match channel.strip_suffix('N') {
        Some(c) => (c, true),
        None => (channel, false),
    };
    Some((timer.parse().ok()?, channel.parse().ok()?, complementary))
}

#[cfg(test)]
mod tests {
    use crate::parse::parse;

    const PINS: &str = "\
PA0-WKUP.Signal=GPXTI0
PA0-WKUP.GPIO_Label=USER_BTN
PA5.Signal=S_TIM2_CH1
PA5.GPIO_Label=LED_PWM
PA6.Signal=TIM3_CH1
PA7.Signal=TIM1_CH1N
PA9.Signal=USART1_TX
PB0.Signal=GPIO_Output
PB0.GPIO_Label=LED_GREEN
PB1.Signal=GPIO_Input
PC13-ANTI_TAMP.Signal=GPXTI13
PC14-OSC32_IN.Signal=RCC_OSC32_IN
PD12.Signal=S_TIM2_CH1
VP_SYS_VS_Systick.Signal=SYS_VS_Systick
";

    #[test]
    fn pwm_channels_unique_in_file_order() {
        let cfg = parse(PINS).unwrap();
        let channels = cfg.pwm_channels();
        let names: Vec<String> = channels.iter().map(|c| c.instance()).collect();
        assert_eq!(names, vec!["TIM2_CH1", "TIM3_CH1", "TIM1_CH1"]);
        assert_eq!(channels[0].pin, "PA5");
        assert_eq!(channels[0].label.as_deref(), Some("LED_PWM"));
        assert!(channels[2].complementary);
    }

    #[test]
    fn gpio_candidates_exclude_claimed_pins() {
        let cfg = parse(PINS).unwrap();
        let pins: Vec<String> = cfg
            .gpio_candidates(false)
            .into_iter()
            .map(|p| p.pin)
            .collect();
        assert_eq!(pins, vec!["PA0-WKUP", "PB0", "PB1", "PC13-ANTI_TAMP"]);
    }

    #[test]
    fn gpio_candidates_interrupt_only() {
        let cfg = parse(PINS).unwrap();
        let pins = cfg.gpio_candidates(true);
        assert_eq!(pins.len(), 2);
        assert!(pins.iter().all(|p| p.exti));
        assert_eq!(pins[0].port, 'A');
        assert_eq!(pins[0].number, 0);
        assert_eq!(pins[0].label.as_deref(), Some("USER_BTN"));
        assert_eq!(pins[1].number, 13);
    }

    #[test]
    fn pin_names() {
        use super::parse_pin_name;
        assert_eq!(parse_pin_name("PC13"), Some(('C', 13)));
        assert_eq!(parse_pin_name("PH0-OSC_IN"), Some(('H', 0)));
        assert_eq!(parse_pin_name("VP_SYS_VS_Systick"), None);
        assert_eq!(parse_pin_name("PB"), None);
    }
}
