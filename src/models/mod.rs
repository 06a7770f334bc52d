pub mod account;

pub use account::{Account, AccountPatch, EdgeChange, NewAccount};
