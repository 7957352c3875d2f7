//! Hand-off of delivered contents to the inventory.
//!
//! A batch is fully validated when prepared, so committing it either adds
//! every entry or, if preparation failed, nothing at all.

use tracing::info;

use crate::collaborators::DeliverySink;
use crate::{AmmoTypeId, Money, Part, PartDefId, PartKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryFault {
    #[error("armor '{0}' has no points per ton")]
    ArmorWithoutPoints(PartDefId),
    #[error("ammunition '{0}' has no shots per ton")]
    AmmoWithoutShots(PartDefId),
}

#[derive(Debug, Clone, PartialEq)]
enum DeliveryEntry {
    Part { part: Part, quantity: u32 },
    Ammo { ammo_type: AmmoTypeId, shots: u32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryBatch {
    entries: Vec<DeliveryEntry>,
    charge: Money,
}

impl DeliveryBatch {
    /// Expands batched categories: ammunition to `batch_size` tons of shots,
    /// armor to `batch_size` tons of points.
    pub fn prepare(contents: &[Part], batch_size: u32, charge: Money) -> Result<Self, DeliveryFault> {
        assert!(batch_size > 0, "batch size must be positive");
        assert!(charge >= Money::ZERO, "delivery charge must be non-negative");

        let mut entries = Vec::with_capacity(contents.len());
        for part in contents {
            let entry = match &part.kind {
                PartKind::AmmoBin {
                    ammo_type,
                    shots_per_ton,
                } => {
                    if *shots_per_ton == 0 {
                        return Err(DeliveryFault::AmmoWithoutShots(part.def_id.clone()));
                    }
                    DeliveryEntry::Ammo {
                        ammo_type: ammo_type.clone(),
                        shots: shots_per_ton * batch_size,
                    }
                }
                PartKind::Armor { points_per_ton } => {
                    if *points_per_ton == 0 {
                        return Err(DeliveryFault::ArmorWithoutPoints(part.def_id.clone()));
                    }
                    DeliveryEntry::Part {
                        part: part.clone(),
                        quantity: points_per_ton * batch_size,
                    }
                }
                _ => DeliveryEntry::Part {
                    part: part.clone(),
                    quantity: 1,
                },
            };
            entries.push(entry);
        }
        Ok(Self { entries, charge })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn charge(&self) -> Money {
        self.charge
    }

    /// Applies every entry and the charge. Returns the number of entries.
    pub fn commit(self, sink: &mut impl DeliverySink, reason: &str) -> usize {
        let count = self.entries.len();
        for entry in self.entries {
            match entry {
                DeliveryEntry::Part { part, quantity } => sink.add_to_inventory(part, quantity),
                DeliveryEntry::Ammo { ammo_type, shots } => sink.add_ammo(&ammo_type, shots),
            }
        }
        if self.charge > Money::ZERO {
            sink.debit(self.charge, reason);
        }
        info!(items = count, charged = %self.charge, reason, "delivery committed");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PartQuality, SupplyCategory};

    #[derive(Default)]
    struct RecordingSink {
        parts: Vec<(String, u32)>,
        ammo: Vec<(String, u32)>,
        debits: Vec<Money>,
    }

    impl DeliverySink for RecordingSink {
        fn add_to_inventory(&mut self, part: Part, quantity: u32) {
            self.parts.push((part.name, quantity));
        }

        fn add_ammo(&mut self, ammo_type: &AmmoTypeId, shots: u32) {
            self.ammo.push((ammo_type.0.clone(), shots));
        }

        fn debit(&mut self, amount: Money, _reason: &str) {
            self.debits.push(amount);
        }
    }

    fn part(name: &str, kind: PartKind) -> Part {
        Part {
            def_id: PartDefId(name.to_lowercase()),
            name: name.to_string(),
            kind,
            tonnage: 1.0,
            value: Money(1_000),
            quality: PartQuality::C,
            brand_new: true,
        }
    }

    #[test]
    fn batched_categories_expand_fivefold() {
        let contents = vec![
            part("Armor", PartKind::Armor { points_per_ton: 16 }),
            part(
                "AC10 Ammo",
                PartKind::AmmoBin {
                    ammo_type: AmmoTypeId("ac10".to_string()),
                    shots_per_ton: 10,
                },
            ),
            part("Medium Laser", PartKind::Equipment),
        ];
        assert_eq!(contents[0].kind.category(), SupplyCategory::Armor);
        let batch = DeliveryBatch::prepare(&contents, 5, Money(500)).unwrap();
        let mut sink = RecordingSink::default();
        assert_eq!(batch.commit(&mut sink, "test"), 3);
        assert_eq!(
            sink.parts,
            vec![("Armor".to_string(), 80), ("Medium Laser".to_string(), 1)]
        );
        assert_eq!(sink.ammo, vec![("ac10".to_string(), 50)]);
        assert_eq!(sink.debits, vec![Money(500)]);
    }

    #[test]
    fn faulty_entry_rejects_whole_batch() {
        let contents = vec![
            part("Medium Laser", PartKind::Equipment),
            part("Broken Armor", PartKind::Armor { points_per_ton: 0 }),
        ];
        let fault = DeliveryBatch::prepare(&contents, 5, Money::ZERO).unwrap_err();
        assert_eq!(
            fault,
            DeliveryFault::ArmorWithoutPoints(PartDefId("broken armor".to_string()))
        );
    }

    #[test]
    fn free_delivery_does_not_debit() {
        let contents = vec![part("Medium Laser", PartKind::Equipment)];
        let batch = DeliveryBatch::prepare(&contents, 5, Money::ZERO).unwrap();
        let mut sink = RecordingSink::default();
        batch.commit(&mut sink, "test");
        assert!(sink.debits.is_empty());
    }
}
