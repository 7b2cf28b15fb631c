/***************************************************************************************************
 * Copyright (c) 2021-2023 Qualcomm Innovation Center, Inc. All rights reserved. See LICENSE.txt.
 **************************************************************************************************/
//! The decode-status lattice.
//!
//! Seven values, totally ordered by priority. [`DecodeStatus::join`] is the lattice join
//! ("least-strict-criteria"): the minimum of two statuses by priority. A compound item's status is
//! the join of its children's statuses.
#[cfg(feature = "trace")]
use func_trace::trace;

use crate::error::StreamError;

/// A value on the seven-point decode-status lattice. Ordered by [`DecodeStatus::priority`], lowest
/// (least strict) first: `Invalid < Unsupported < FailedSchema < WellFormed < Tokenized < Expanded
/// < Translatable < Original`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DecodeStatus {
    /// RFC violation, EOF mid-item, or other lexical/structural failure.
    Invalid,
    /// Parseable but outside this implementation's supported length/value range.
    Unsupported,
    /// A schema operation (`validate`/`expand`/`tokenize`) failed.
    FailedSchema,
    /// Parseable, but semantically dubious - duplicate keys, an unrecognised Simple value.
    WellFormed,
    /// Produced by `SchemaNode::tokenize`.
    Tokenized,
    /// Produced by `SchemaNode::expand`.
    Expanded,
    /// Reserved for items that round-trip losslessly between CBOR and JSON.
    Translatable,
    /// The initial status of a factory-built item.
    Original,
}

impl DecodeStatus {
    /// The lattice priority of this status: lower is less strict, and wins in a [`join`](Self::join).
    #[cfg_attr(feature = "trace", trace)]
    pub fn priority(self) -> u8 {
        match self {
            DecodeStatus::Invalid => 0,
            DecodeStatus::Unsupported => 1,
            DecodeStatus::FailedSchema => 2,
            DecodeStatus::WellFormed => 3,
            DecodeStatus::Tokenized => 4,
            DecodeStatus::Expanded => 5,
            DecodeStatus::Translatable => 6,
            DecodeStatus::Original => 7,
        }
    }

    /// `true` for the three failure kinds (`Invalid`, `Unsupported`, `FailedSchema`). Payload
    /// reads on a failed item are unspecified.
    #[cfg_attr(feature = "trace", trace)]
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            DecodeStatus::Invalid | DecodeStatus::Unsupported | DecodeStatus::FailedSchema
        )
    }

    /// The lattice join of `self` and `other`: the lower-priority (less strict) of the two.
    /// Commutative and associative.
    #[cfg_attr(feature = "trace", trace)]
    pub fn join(self, other: DecodeStatus) -> DecodeStatus {
        if self.priority() <= other.priority() {
            self
        } else {
            other
        }
    }

    /// Join `self` with every status in `others`, short-circuiting is left to the caller - this
    /// always folds the whole sequence.
    pub fn join_all(statuses: impl IntoIterator<Item = DecodeStatus>) -> DecodeStatus {
        statuses
            .into_iter()
            .fold(DecodeStatus::Original, DecodeStatus::join)
    }

    /// Attempt to transition from `self` to `next`. Once a failure status is assigned it cannot be
    /// un-set: assigning a non-failure status over a failure status is an illegal-state error.
    /// Assigning another failure status is always permitted.
    #[cfg_attr(feature = "trace", trace)]
    pub fn transition(self, next: DecodeStatus) -> Result<DecodeStatus, StreamError> {
        if self.is_failure() && !next.is_failure() {
            Err(StreamError::IllegalStatusTransition)
        } else {
            Ok(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DecodeStatus; 7] = [
        DecodeStatus::Invalid,
        DecodeStatus::Unsupported,
        DecodeStatus::FailedSchema,
        DecodeStatus::WellFormed,
        DecodeStatus::Tokenized,
        DecodeStatus::Expanded,
        DecodeStatus::Translatable,
    ];

    #[test]
    fn join_is_commutative() {
        for a in ALL {
            for b in ALL {
                assert_eq!(a.join(b), b.join(a));
            }
        }
    }

    #[test]
    fn join_is_associative() {
        for a in ALL {
            for b in ALL {
                for c in ALL {
                    assert_eq!(a.join(b.join(c)), a.join(b).join(c));
                }
            }
        }
    }

    #[test]
    fn join_picks_least_strict() {
        assert_eq!(
            DecodeStatus::Translatable.join(DecodeStatus::WellFormed),
            DecodeStatus::WellFormed
        );
        assert_eq!(
            DecodeStatus::Original.join(DecodeStatus::Invalid),
            DecodeStatus::Invalid
        );
    }

    #[test]
    fn failure_cannot_be_cleared() {
        assert!(DecodeStatus::Invalid
            .transition(DecodeStatus::WellFormed)
            .is_err());
        assert!(DecodeStatus::Invalid
            .transition(DecodeStatus::Unsupported)
            .is_ok());
        assert!(DecodeStatus::WellFormed
            .transition(DecodeStatus::Invalid)
            .is_ok());
    }
}
