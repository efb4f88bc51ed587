//! RB-002: Search error taxonomy.
//!
//! A search that finds nothing is not an error: it returns an empty result
//! list. Both variants here are fatal and raised before any partial output.

/// Errors returned by the search entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The template or config cannot drive a search
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong with the request
        reason: String,
    },

    /// No catalog item survives filtering for a slot
    #[error("slot {} ({slot_type}) has no eligible candidates", .slot + 1)]
    EmptySlot {
        /// 0-based slot index
        slot: usize,
        /// Slot-type label of that slot
        slot_type: String,
    },
}

impl SearchError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rb002_display_empty_slot_is_one_based() {
        let e = SearchError::EmptySlot {
            slot: 0,
            slot_type: "Veg".to_string(),
        };
        assert_eq!(e.to_string(), "slot 1 (Veg) has no eligible candidates");
    }

    #[test]
    fn test_rb002_display_invalid() {
        let e = SearchError::invalid("top_k must be at least 1");
        assert!(e.to_string().starts_with("invalid configuration:"));
    }
}
