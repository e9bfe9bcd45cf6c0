/// Router Module Index
///
/// Splits the HTTP surface by access requirement so the members-only gate is
/// applied as a layer on a whole router rather than remembered per handler.

/// Routes open to every session, anonymous or logged in.
/// Article views by anonymous sessions are metered inside the handler.
pub mod public;

/// Routes that require a logged-in session.
pub mod members;
