//! Try statements.
//!
//! Handlers catch every exception. With both handlers the catch region is
//! nested inside the try range of the finally region:
//!
//! ```text
//!     nop                ; finally try_start
//!     nop                ; catch try_start
//!     <try body>
//!     leave END
//!     nop                ; catch handler_start
//!     pop
//!     <catch body>
//!     leave END
//!     nop                ; catch handler_end, finally handler_start
//!     <finally body>
//!     endfinally
//! END:
//!     nop
//! ```

use sable_core::{BoundStmt, Label};

use crate::emit::OpenRegion;
use crate::function_compiler::{FunctionCompiler, Result};
use crate::module::RegionKind;

impl<'e, 'l> FunctionCompiler<'e, 'l> {
    pub(crate) fn compile_try(
        &mut self,
        body: &'l BoundStmt<'l>,
        catch_body: Option<&'l BoundStmt<'l>>,
        finally_body: Option<&'l BoundStmt<'l>>,
    ) -> Result<()> {
        let exit = match (catch_body, finally_body) {
            (None, None) => return self.compile_stmt(body),
            (Some(handler), None) => {
                let exit = self.fresh_label();
                self.compile_region(RegionKind::Catch, exit, body, handler)?;
                exit
            }
            (None, Some(handler)) => {
                let exit = self.fresh_label();
                self.compile_region(RegionKind::Finally, exit, body, handler)?;
                exit
            }
            (Some(catch_body), Some(finally_body)) => {
                let exit = self.fresh_label();
                let mut outer = self.enter_region(RegionKind::Finally, exit, &[body, catch_body]);
                self.compile_region(RegionKind::Catch, exit, body, catch_body)?;
                self.enter_handler(&mut outer, finally_body);
                self.compile_stmt(finally_body)?;
                self.exit_region(outer)?;
                exit
            }
        };
        self.emitter().mark_label(exit)
    }

    fn compile_region(
        &mut self,
        kind: RegionKind,
        exit: Label,
        body: &'l BoundStmt<'l>,
        handler: &'l BoundStmt<'l>,
    ) -> Result<()> {
        let mut region = self.enter_region(kind, exit, &[body]);
        self.compile_stmt(body)?;
        self.enter_handler(&mut region, handler);
        self.compile_stmt(handler)?;
        self.exit_region(region)
    }

    fn enter_region(&mut self, kind: RegionKind, exit: Label, protected: &[&'l BoundStmt<'l>]) -> OpenRegion {
        self.push_protected(protected);
        self.emitter().begin_region(kind, exit)
    }

    fn enter_handler(&mut self, region: &mut OpenRegion, handler: &'l BoundStmt<'l>) {
        self.pop_protected();
        self.emitter().begin_handler(region);
        self.push_protected(&[handler]);
    }

    fn exit_region(&mut self, region: OpenRegion) -> Result<()> {
        self.pop_protected();
        self.emitter().end_region(region)
    }
}
