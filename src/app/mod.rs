pub mod dispatch;
mod edit;
pub mod status;
