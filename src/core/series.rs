pub mod align;
pub mod normalize;
pub mod stats;

use std::{
    iter::Sum,
    ops::{Range, Sub},
};

use itertools::Itertools;

pub type Point<K, V> = (K, V);
pub type Series<K, V> = Vec<Point<K, V>>;

impl<T> Deltas for T where T: ?Sized {}

pub trait Deltas {
    /// Subtract the pairwise windows and return the iterator over `(Range<K>, ΔV)`.
    fn deltas<K, V>(self) -> impl Iterator<Item = (Range<K>, <V as Sub>::Output)>
    where
        Self: Iterator<Item = (K, V)> + Sized,
        K: Copy,
        V: Copy + Sub,
    {
        self.tuple_windows().map(|((from_index, from_value), (to_index, to_value))| {
            (from_index..to_index, to_value - from_value)
        })
    }
}

impl<T> SumValues for T where T: ?Sized {}

pub trait SumValues {
    fn sum_values<K, V>(self) -> V
    where
        Self: Iterator<Item = (K, V)> + Sized,
        V: Sum,
    {
        self.map(|(_, value)| value).sum::<V>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::energy::KilowattHours;

    #[test]
    fn test_deltas() {
        let series = vec![(2, 100), (3, 200), (5, 600)];
        let diff: Vec<_> = series.into_iter().deltas().collect();
        assert_eq!(diff, vec![(2..3, 100), (3..5, 400)]);
    }

    #[test]
    fn test_sum_values() {
        let series = vec![((), KilowattHours::from(1.5)), ((), KilowattHours::from(0.5))];
        let total: KilowattHours = series.into_iter().sum_values();
        assert_eq!(total, KilowattHours::from(2.0));
    }
}
