//! Hook consulted before any state-changing frame is written.
//!
//! Some radios persist settings to EEPROM on every write, so applications
//! may want to rate-limit or veto writes. The session calls the configured
//! [`WritePolicy`] while holding the link, right before the frame goes out;
//! an `Err` aborts the write and is returned to the caller unchanged.

use async_trait::async_trait;

use catlink_core::Result;

use crate::commands::CommandFrame;

/// Decides whether a write frame may be sent.
#[async_trait]
pub trait WritePolicy: Send + Sync {
    /// Called once per write frame. May wait (to throttle) or fail (to veto).
    async fn before_write(&self, frame: &CommandFrame) -> Result<()>;
}

/// Policy that permits every write immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllWrites;

#[async_trait]
impl WritePolicy for AllowAllWrites {
    async fn before_write(&self, _frame: &CommandFrame) -> Result<()> {
        Ok(())
    }
}
