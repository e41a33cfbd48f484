pub mod crypto;
pub mod slug;
pub mod token;
