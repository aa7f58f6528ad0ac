pub mod churches;
