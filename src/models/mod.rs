pub mod random_forest;
