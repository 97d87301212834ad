/// A lightweight handle to a node stored in an [`Arena`](crate::Arena).
///
/// Comparing two `NodeId`s is O(1) integer comparison and is the crate's
/// only notion of node identity: equal ids mean the same node, unequal ids
/// mean different nodes even when the nodes they point to are structurally
/// identical.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw arena index, for debugging and for identity-keyed maps.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Construct a `NodeId` from a raw arena index.
    ///
    /// Only [`Arena`](crate::Arena) should normally do this; exposed for
    /// callers that serialize/deserialize arena contents.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_raw() {
        let id = NodeId::from_raw(7);
        assert_eq!(id.as_u32(), 7);
    }

    #[test]
    fn orders_by_index() {
        assert!(NodeId::from_raw(1) < NodeId::from_raw(2));
    }
}
