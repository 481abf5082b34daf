//! Built-in module table.

use crate::catalog::ModuleCatalog;
use crate::descriptor::{
    InstanceSource, ModuleDescriptor, ModuleKind, PeripheralRequirement, TemplateRef,
};

struct Builtin {
    id: &'static str,
    kind: ModuleKind,
    description: &'static str,
    dependencies: &'static [&'static str],
    peripheral: Option<(&'static str, InstanceSource)>,
    files: &'static [&'static str],
}

const BUILTIN: &[Builtin] = &[
    Builtin {
        id: "gpio",
        kind: ModuleKind::Peripheral,
        description: "Named GPIO pin access",
        dependencies: &[],
        peripheral: Some(("GPIO", InstanceSource::Pins)),
        files: &["bsp_gpio.c", "bsp_gpio.h"],
    },
    Builtin {
        id: "exti",
        kind: ModuleKind::Peripheral,
        description: "External interrupt line dispatch",
        dependencies: &[],
        peripheral: Some(("EXTI", InstanceSource::InterruptPins)),
        files: &["bsp_exti.c", "bsp_exti.h"],
    },
    Builtin {
        id: "uart",
        kind: ModuleKind::Peripheral,
        description: "Interrupt-driven UART/USART transport",
        dependencies: &[],
        peripheral: Some(("UART", InstanceSource::Declared)),
        files: &["bsp_uart.c", "bsp_uart.h"],
    },
    Builtin {
        id: "can",
        kind: ModuleKind::Peripheral,
        description: "bxCAN driver with shared filter banks",
        dependencies: &[],
        peripheral: Some(("CAN", InstanceSource::Declared)),
        files: &["bsp_can.c", "bsp_can.h"],
    },
    Builtin {
        id: "spi",
        kind: ModuleKind::Peripheral,
        description: "Blocking and DMA SPI transfers",
        dependencies: &[],
        peripheral: Some(("SPI", InstanceSource::Declared)),
        files: &["bsp_spi.c", "bsp_spi.h"],
    },
    Builtin {
        id: "i2c",
        kind: ModuleKind::Peripheral,
        description: "I2C master register access",
        dependencies: &[],
        peripheral: Some(("I2C", InstanceSource::Declared)),
        files: &["bsp_i2c.c", "bsp_i2c.h"],
    },
    Builtin {
        id: "pwm",
        kind: ModuleKind::Peripheral,
        description: "Timer PWM outputs",
        dependencies: &[],
        peripheral: Some(("PWM", InstanceSource::PwmChannels)),
        files: &["bsp_pwm.c", "bsp_pwm.h"],
    },
    Builtin {
        id: "adc",
        kind: ModuleKind::Peripheral,
        description: "ADC sampling",
        dependencies: &[],
        peripheral: Some(("ADC", InstanceSource::Declared)),
        files: &["bsp_adc.c", "bsp_adc.h"],
    },
    Builtin {
        id: "ringbuf",
        kind: ModuleKind::Component,
        description: "Lock-free single-producer ring buffer",
        dependencies: &[],
        peripheral: None,
        files: &["ringbuf.c", "ringbuf.h"],
    },
    Builtin {
        id: "crc",
        kind: ModuleKind::Component,
        description: "CRC-16/CRC-32 helpers",
        dependencies: &[],
        peripheral: None,
        files: &["crc.c", "crc.h"],
    },
    Builtin {
        id: "log",
        kind: ModuleKind::Component,
        description: "Buffered logging over UART",
        dependencies: &["ringbuf", "uart"],
        peripheral: None,
        files: &["log.c", "log.h"],
    },
    Builtin {
        id: "shell",
        kind: ModuleKind::Component,
        description: "Line-oriented command shell",
        dependencies: &["log"],
        peripheral: None,
        files: &["shell.c", "shell.h"],
    },
    Builtin {
        id: "flash_store",
        kind: ModuleKind::Component,
        description: "Key/value settings in the last flash sector",
        dependencies: &["crc"],
        peripheral: None,
        files: &["flash_store.c", "flash_store.h"],
    },
    Builtin {
        id: "button",
        kind: ModuleKind::Device,
        description: "Debounced push buttons",
        dependencies: &["exti"],
        peripheral: None,
        files: &["button.c", "button.h"],
    },
    Builtin {
        id: "w25qxx",
        kind: ModuleKind::Device,
        description: "W25Qxx SPI NOR flash",
        dependencies: &["spi"],
        peripheral: None,
        files: &["w25qxx.c", "w25qxx.h"],
    },
    Builtin {
        id: "mpu6050",
        kind: ModuleKind::Device,
        description: "MPU6050 inertial sensor",
        dependencies: &["i2c"],
        peripheral: None,
        files: &["mpu6050.c", "mpu6050.h"],
    },
    Builtin {
        id: "ws2812",
        kind: ModuleKind::Device,
        description: "WS2812 LED strip over PWM",
        dependencies: &["pwm"],
        peripheral: None,
        files: &["ws2812.c", "ws2812.h"],
    },
    Builtin {
        id: "can_motor",
        kind: ModuleKind::Device,
        description: "CAN motor controller protocol",
        dependencies: &["can", "ringbuf"],
        peripheral: None,
        files: &["can_motor.c", "can_motor.h"],
    },
];

impl Builtin {
    fn descriptor(&self) -> ModuleDescriptor {
        let kind = self.kind.as_str();
        let out_dir = match self.kind {
            ModuleKind::Peripheral => "Peripheral",
            ModuleKind::Component => "Component",
            ModuleKind::Device => "Device",
        };
        ModuleDescriptor {
            id: self.id.to_string(),
            kind: self.kind,
            description: self.description.to_string(),
            templates: self
                .files
                .iter()
                .map(|f| TemplateRef {
                    template: format!("{kind}/{}/{f}.tpl", self.id),
                    output: format!("Modules/{out_dir}/{}/{f}", self.id),
                })
                .collect(),
            dependencies: self.dependencies.iter().map(|d| d.to_string()).collect(),
            peripheral: self.peripheral.map(|(family, source)| PeripheralRequirement {
                family: family.to_string(),
                source,
            }),
        }
    }
}

impl ModuleCatalog {
    /// The built-in module table.
    pub fn builtin() -> Self {
        let modules = BUILTIN.iter().map(Builtin::descriptor).collect();
        // Covered by `builtin_is_valid`.
        Self::new(modules).expect("built-in catalog is valid")
    }
}
