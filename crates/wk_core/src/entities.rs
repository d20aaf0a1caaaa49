//! Per-call input shapes: participant counts and weight tables.
//!
//! `ParticipantCounts` keeps insertion order because the breakdown is
//! emitted in the order ranks were supplied. `WeightTable` is a lookup only.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tokens::RankId;

/// Ordered mapping rank → participant count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantCounts(Vec<(RankId, u32)>);

impl ParticipantCounts {
    pub fn new() -> Self { Self(Vec::new()) }

    /// Set the count for `rank`, keeping its original position if already present.
    pub fn set(&mut self, rank: RankId, count: u32) {
        match self.0.iter_mut().find(|(r, _)| *r == rank) {
            Some(slot) => slot.1 = count,
            None => self.0.push((rank, count)),
        }
    }

    pub fn get(&self, rank: &RankId) -> Option<u32> {
        self.0.iter().find(|(r, _)| r == rank).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RankId, u32)> {
        self.0.iter().map(|(r, c)| (r, *c))
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Total headcount across all ranks (saturating).
    pub fn headcount(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, (_, c)| acc.saturating_add(*c as u64))
    }
}

impl FromIterator<(RankId, u32)> for ParticipantCounts {
    fn from_iter<I: IntoIterator<Item = (RankId, u32)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (r, c) in iter {
            out.set(r, c);
        }
        out
    }
}

impl Serialize for ParticipantCounts {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut m = s.serialize_map(Some(self.0.len()))?;
        for (r, c) in &self.0 {
            m.serialize_entry(r, c)?;
        }
        m.end()
    }
}

impl<'de> Deserialize<'de> for ParticipantCounts {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct CountsVisitor;

        impl<'de> Visitor<'de> for CountsVisitor {
            type Value = ParticipantCounts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping rank → non-negative count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = ParticipantCounts::new();
                while let Some((rank, count)) = access.next_entry::<RankId, u32>()? {
                    if out.get(&rank).is_some() {
                        return Err(A::Error::custom(format!("duplicate rank `{rank}` in counts")));
                    }
                    out.set(rank, count);
                }
                Ok(out)
            }
        }

        d.deserialize_map(CountsVisitor)
    }
}

/// Rank → weight lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(BTreeMap<RankId, u32>);

impl WeightTable {
    pub fn new() -> Self { Self(BTreeMap::new()) }

    pub fn insert(&mut self, rank: RankId, weight: u32) -> Option<u32> {
        self.0.insert(rank, weight)
    }

    pub fn get(&self, rank: &RankId) -> Option<u32> {
        self.0.get(rank).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RankId, u32)> {
        self.0.iter().map(|(r, w)| (r, *w))
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Overlay `overrides` on top of `self` (override wins).
    pub fn overlay(&self, overrides: &WeightTable) -> WeightTable {
        let mut out = self.clone();
        for (r, w) in overrides.iter() {
            out.insert(r.clone(), w);
        }
        out
    }
}

impl FromIterator<(RankId, u32)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (RankId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
