//! `serde` support: a deque is a sequence.

use core::fmt;
use core::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, Error, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use super::Deque;
use crate::alloc::{Global, RawAlloc};

impl<T, A, const BUF: usize> Serialize for Deque<T, A, BUF>
where
    T: Serialize,
    A: RawAlloc,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self)
    }
}

struct DequeVisitor<T, const BUF: usize>(PhantomData<T>);

impl<'de, T, const BUF: usize> Visitor<'de> for DequeVisitor<T, BUF>
where
    T: Deserialize<'de>,
{
    type Value = Deque<T, Global, BUF>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a sequence")
    }

    fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
    where
        S: SeqAccess<'de>,
    {
        let mut values = Deque::try_new_in(Global).map_err(S::Error::custom)?;
        while let Some(value) = seq.next_element()? {
            values.try_push_back(value).map_err(S::Error::custom)?;
        }
        Ok(values)
    }
}

impl<'de, T, const BUF: usize> Deserialize<'de> for Deque<T, Global, BUF>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(DequeVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_across_buffers() {
        let mut d: Deque<u16, Global, 3> = (1..=7).collect();
        d.push_front(0);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "[0,1,2,3,4,5,6,7]");
        let back: Deque<u16, Global, 3> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_rejects_non_sequence() {
        let err = serde_json::from_str::<Deque<u16>>("{\"a\":1}").unwrap_err();
        assert!(err.to_string().contains("a sequence"));
    }
}
