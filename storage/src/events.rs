//! Change-feed event types.
//!
//! Events fire after successful writes with at-least-once, best-effort
//! delivery and no ordering guarantee across tables. Consumers are expected
//! to refetch, not patch, so a lagged (dropped) event costs one extra
//! refetch at most.

/// Table an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTable {
    Conversations,
    ConversationParticipants,
    PlatformMessages,
}

/// Kind of write that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Insert,
    Update,
}

/// A single change notification. Carries no row data; consumers refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: ChangeTable,
    pub op: ChangeOp,
}

impl ChangeEvent {
    pub fn new(table: ChangeTable, op: ChangeOp) -> Self {
        Self { table, op }
    }
}
