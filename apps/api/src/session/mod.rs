// Single-user session: credentials, the uploaded resume, and result history.
// Nothing here is ever written to disk.

pub mod handlers;
pub mod models;
