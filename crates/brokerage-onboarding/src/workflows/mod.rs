pub mod account_opening;
