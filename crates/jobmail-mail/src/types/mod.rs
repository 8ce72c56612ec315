//! Addresses and the provider-neutral message model.

mod address;
mod message;

pub use address::{
    EmailAddress, address_list_from_pairs, address_list_with, dump_address, dump_address_list,
    format_address, parse_address_list,
};
pub use message::{Attachment, Message, RESERVED_HEADERS};
