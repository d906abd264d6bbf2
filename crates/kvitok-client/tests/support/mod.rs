pub mod receipt_testkit;
