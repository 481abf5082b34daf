//! Flash sector tables synthesized from an MCU identifier.
//!
//! The identifier follows the vendor naming scheme
//! `STM32` + line (`F103`) + pin-count code + capacity code + package…,
//! e.g. `STM32F103C8Tx` is a 64 KiB part. No I/O is performed; unknown
//! prefixes, unknown capacity codes and capacities the family's sector
//! model cannot tile exactly all yield `None`.

use serde::Serialize;

/// Start of the main flash array on every supported family.
pub const FLASH_BASE: u32 = 0x0800_0000;

const KIB: u32 = 1024;
const MIB: u32 = 1024 * KIB;

/// Page-size cutoff for uniform-page parts: 1 KiB pages up to this capacity.
const PAGE_CUTOFF: u32 = 128 * KIB;
const SMALL_PAGE: u32 = KIB;
const LARGE_PAGE: u32 = 2 * KIB;

/// Non-uniform head of a mixed-sector bank, followed by uniform tail sectors.
const MIXED_HEAD_SECTORS: [u32; 5] = [16 * KIB, 16 * KIB, 16 * KIB, 16 * KIB, 64 * KIB];
const MIXED_TAIL_SECTOR: u32 = 128 * KIB;
/// Second bank of a dual-bank mixed-sector part sits at a fixed offset.
const MIXED_BANK2_OFFSET: u32 = MIB;

const UNIFORM_SECTOR: u32 = 128 * KIB;

/// Parts above this capacity are dual-bank (mixed and uniform-sector families).
const DUAL_BANK_THRESHOLD: u32 = MIB;

/// Sector model of a chip family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlashFamily {
    /// `STM32F1`: uniform pages, single bank.
    UniformPage,
    /// `STM32F2` / `STM32F4`: 16/64 KiB head sectors then 128 KiB sectors.
    MixedSector,
    /// `STM32H7`: uniform 128 KiB sectors.
    UniformSector,
}

impl FlashFamily {
    fn from_mcu(upper: &str) -> Option<Self> {
        if upper.starts_with("STM32F1") {
            Some(Self::UniformPage)
        } else if upper.starts_with("STM32F2") || upper.starts_with("STM32F4") {
            Some(Self::MixedSector)
        } else if upper.starts_with("STM32H7") {
            Some(Self::UniformSector)
        } else {
            None
        }
    }

    fn layout(self, capacity: u32) -> Option<FlashLayout> {
        let bank_sizes: Vec<(u32, Vec<u32>)> = match self {
            Self::UniformPage => {
                let page = if capacity <= PAGE_CUTOFF {
                    SMALL_PAGE
                } else {
                    LARGE_PAGE
                };
                vec![(FLASH_BASE, uniform(capacity, page)?)]
            }
            Self::MixedSector => {
                if capacity > DUAL_BANK_THRESHOLD {
                    let half = capacity / 2;
                    if half != MIXED_BANK2_OFFSET {
                        return None;
                    }
                    let pattern = mixed_pattern(half)?;
                    vec![
                        (FLASH_BASE, pattern.clone()),
                        (FLASH_BASE + MIXED_BANK2_OFFSET, pattern),
                    ]
                } else {
                    vec![(FLASH_BASE, mixed_pattern(capacity)?)]
                }
            }
            Self::UniformSector => {
                if capacity > DUAL_BANK_THRESHOLD {
                    let half = capacity / 2;
                    let sectors = uniform(half, UNIFORM_SECTOR)?;
                    vec![
                        (FLASH_BASE, sectors.clone()),
                        (FLASH_BASE + half, sectors),
                    ]
                } else {
                    vec![(FLASH_BASE, uniform(capacity, UNIFORM_SECTOR)?)]
                }
            }
        };

        let mut banks = Vec::new();
        let mut sectors = Vec::new();
        for (i, (base, sizes)) in bank_sizes.into_iter().enumerate() {
            let number = i as u8 + 1;
            let mut address = base;
            for (index, size) in sizes.iter().enumerate() {
                sectors.push(FlashSector {
                    bank: number,
                    index: index as u32,
                    address,
                    size: *size,
                });
                address += size;
            }
            banks.push(FlashBank {
                number,
                base,
                size: address - base,
                sector_count: sizes.len(),
            });
        }

        Some(FlashLayout {
            family: self,
            base: FLASH_BASE,
            total_size: capacity,
            banks,
            sectors,
        })
    }
}

/// One bank of the flash array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashBank {
    /// 1-based bank number.
    pub number: u8,
    pub base: u32,
    pub size: u32,
    pub sector_count: usize,
}

/// One erasable sector (or page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashSector {
    /// Bank the sector belongs to (1-based).
    pub bank: u8,
    /// Sector number within its bank.
    pub index: u32,
    pub address: u32,
    pub size: u32,
}

impl FlashSector {
    /// One past the last address of this sector.
    pub fn end(&self) -> u32 {
        self.address + self.size
    }
}

/// Sector table of one chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashLayout {
    pub family: FlashFamily,
    pub base: u32,
    /// Total capacity in bytes.
    pub total_size: u32,
    pub banks: Vec<FlashBank>,
    /// All sectors, ordered by address.
    pub sectors: Vec<FlashSector>,
}

impl FlashLayout {
    /// Whether the array is split into two banks.
    pub fn is_dual_bank(&self) -> bool {
        self.banks.len() > 1
    }

    /// One past the last flash address.
    pub fn end(&self) -> u32 {
        self.base + self.total_size
    }

    /// The sector containing `address`, if any.
    pub fn sector_at(&self, address: u32) -> Option<&FlashSector> {
        self.sectors
            .iter()
            .find(|s| address >= s.address && address < s.end())
    }

    /// The last sector of the array, the usual home of persisted settings.
    pub fn last_sector(&self) -> Option<&FlashSector> {
        self.sectors.last()
    }
}

/// Synthesize the flash layout for an MCU identifier.
pub fn flash_layout(mcu_name: &str) -> Option<FlashLayout> {
    let upper = mcu_name.trim().to_ascii_uppercase();
    let family = FlashFamily::from_mcu(&upper)?;
    let code = *upper.as_bytes().get(10)?;
    let capacity = capacity_from_code(code)?;
    family.layout(capacity)
}

/// Decode the capacity character of an MCU identifier.
fn capacity_from_code(code: u8) -> Option<u32> {
    let kib = match code {
        b'4' => 16,
        b'6' => 32,
        b'8' => 64,
        b'B' => 128,
        b'Z' => 192,
        b'C' => 256,
        b'D' => 384,
        b'E' => 512,
        b'F' => 768,
        b'G' => 1024,
        b'H' => 1536,
        b'I' => 2048,
        _ => return None,
    };
    Some(kib * KIB)
}

fn uniform(capacity: u32, unit: u32) -> Option<Vec<u32>> {
    if capacity == 0 || capacity % unit != 0 {
        return None;
    }
    Some(vec![unit; (capacity / unit) as usize])
}

fn mixed_pattern(bank_size: u32) -> Option<Vec<u32>> {
    let mut sizes = Vec::new();
    let mut used = 0;
    for size in MIXED_HEAD_SECTORS {
        if used + size > bank_size {
            break;
        }
        sizes.push(size);
        used += size;
    }
    let remaining = bank_size - used;
    if remaining % MIXED_TAIL_SECTOR != 0 {
        return None;
    }
    let tail = (remaining / MIXED_TAIL_SECTOR) as usize;
    sizes.extend(std::iter::repeat(MIXED_TAIL_SECTOR).take(tail));
    if sizes.is_empty() {
        return None;
    }
    Some(sizes)
}
