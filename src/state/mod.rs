pub mod account_state;
