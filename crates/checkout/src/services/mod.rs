//! Collaborator traits and in-memory implementations.

pub mod address_book;
pub mod directory;
pub mod mailer;

pub use address_book::{Address, AddressBook, InMemoryAddressBook, NewAddress};
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use mailer::{Email, InMemoryMailer, LogMailer, MailError, Mailer};
