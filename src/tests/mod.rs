pub mod test_train;
pub mod test_transfer;
