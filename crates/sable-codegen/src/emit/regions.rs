//! Exception regions.
//!
//! A region is delimited by `nop` sentinels so its boundaries stay valid no
//! matter how the surrounding code is patched:
//!
//! ```text
//! catch only                     finally only
//!
//!     nop          ; try_start       nop          ; try_start
//!     <try body>                     <try body>
//!     leave END                      leave END
//!     nop          ; handler_start   nop          ; handler_start
//!     pop                            <finally body>
//!     <catch body>                   endfinally
//!     leave END                  END:
//! END:                               nop          ; handler_end, exit
//!     nop          ; handler_end, exit
//! ```
//!
//! With both handlers the catch region is nested in the try range of the
//! finally region. The catch handler then ends on the finally handler's
//! start marker and both regions leave to the same `END`.

use sable_core::{EmitError, Label};

use crate::bytecode::PENDING;
use crate::module::{RegionDef, RegionKind};

/// A finished region, as instruction indices. Ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub try_start: usize,
    pub try_end: usize,
    pub handler_start: usize,
    pub handler_end: usize,
    /// Index every `leave` out of the region targets.
    pub exit: usize,
    /// Type reference a catch handler accepts.
    pub catch_type: Option<u32>,
}

impl Region {
    /// Every instruction index the region refers to.
    pub fn markers(&self) -> [usize; 5] {
        [
            self.try_start,
            self.try_end,
            self.handler_start,
            self.handler_end,
            self.exit,
        ]
    }

    /// Rewrite every marker through `map`.
    pub fn remap(&mut self, map: impl Fn(usize) -> usize) {
        self.try_start = map(self.try_start);
        self.try_end = map(self.try_end);
        self.handler_start = map(self.handler_start);
        self.handler_end = map(self.handler_end);
        self.exit = map(self.exit);
    }

    /// The container form, given the byte offset of every instruction.
    pub fn to_def(&self, offsets: &[u32]) -> Result<RegionDef, EmitError> {
        let offset = |index: usize| {
            offsets.get(index).copied().ok_or_else(|| {
                EmitError::invalid(format!("region marker {index} is outside the method body"))
            })
        };
        Ok(RegionDef {
            kind: self.kind,
            try_start: offset(self.try_start)?,
            try_end: offset(self.try_end)?,
            handler_start: offset(self.handler_start)?,
            handler_end: offset(self.handler_end)?,
            exit: offset(self.exit)?,
            catch_type: self.catch_type,
        })
    }
}

/// A region whose try range is being emitted.
#[derive(Debug)]
#[must_use = "a region must be finished with `end_region`"]
pub struct OpenRegion {
    pub(super) kind: RegionKind,
    pub(super) exit: Label,
    pub(super) try_start: usize,
    pub(super) handler_start: Option<usize>,
    pub(super) catch_type: Option<u32>,
}

impl OpenRegion {
    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn exit(&self) -> Label {
        self.exit
    }

    /// Freeze into a [`Region`] ending just before `handler_end`. The exit
    /// index is filled in by fixup resolution.
    pub(super) fn close(self, handler_end: usize) -> Result<Region, EmitError> {
        let handler_start = self.handler_start.ok_or_else(|| {
            EmitError::invalid("exception region closed without a handler")
        })?;
        Ok(Region {
            kind: self.kind,
            try_start: self.try_start,
            try_end: handler_start,
            handler_start,
            handler_end,
            exit: PENDING,
            catch_type: self.catch_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region {
            kind: RegionKind::Finally,
            try_start: 0,
            try_end: 3,
            handler_start: 3,
            handler_end: 6,
            exit: 6,
            catch_type: None,
        }
    }

    #[test]
    fn markers_map_to_byte_offsets() {
        let offsets = [0, 1, 5, 10, 11, 12, 13];
        let def = region().to_def(&offsets).unwrap();
        assert_eq!(def.try_start, 0);
        assert_eq!(def.try_end, 10);
        assert_eq!(def.handler_end, 13);
        assert_eq!(def.exit, 13);
    }

    #[test]
    fn marker_past_the_end_is_invalid() {
        assert!(region().to_def(&[0, 1, 2]).is_err());
    }

    #[test]
    fn remap_moves_every_marker() {
        let mut r = region();
        r.remap(|i| i.saturating_sub(1));
        assert_eq!(r.markers(), [0, 2, 2, 5, 5]);
    }

    #[test]
    fn close_requires_a_handler() {
        let open = OpenRegion {
            kind: RegionKind::Catch,
            exit: Label(0),
            try_start: 0,
            handler_start: None,
            catch_type: Some(0),
        };
        assert!(open.close(4).is_err());
    }
}
