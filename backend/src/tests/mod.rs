pub mod common;

mod api_test;
