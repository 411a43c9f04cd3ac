//! Row models mapping the SQLite tables to core types.

mod conversation_row;
mod message_row;
mod participant_row;
mod profile_row;

pub(crate) use conversation_row::ConversationRow;
pub(crate) use message_row::MessageRow;
pub(crate) use participant_row::ParticipantRow;
pub(crate) use profile_row::ProfileRow;
