pub mod comment;
pub mod common;
pub mod mongodb;
pub mod question;
pub mod respondents;
pub mod response;
pub mod roster;
pub mod store;
