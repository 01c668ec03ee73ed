//! Per-slot accumulation

use crate::types::{PowerRecord, Timestamp};
use crate::units::Conversion;

/// Running totals for one slot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlotTotals {
    grid: f64,
    solar: f64,
    home: f64,
    samples: usize,
}

impl SlotTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one source row. Only grid import is accumulated; export
    /// (negative grid) is recoverable as `home - solar`.
    pub fn add(&mut self, record: &PowerRecord) {
        if record.grid > 0.0 {
            self.grid += record.grid;
        }
        self.solar += record.solar;
        self.home += record.home;
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// True when the slot is worth a row: some accumulated value is positive
    pub fn has_activity(&self) -> bool {
        self.grid > 0.0 || self.solar > 0.0 || self.home > 0.0
    }

    /// Convert the sums into the stored record for the slot starting at `start`
    pub fn finish(&self, start: Timestamp, conversion: Conversion) -> PowerRecord {
        PowerRecord {
            timestamp: start,
            grid: conversion.apply(self.grid, self.samples),
            solar: conversion.apply(self.solar, self.samples),
            home: conversion.apply(self.home, self.samples),
        }
    }
}
