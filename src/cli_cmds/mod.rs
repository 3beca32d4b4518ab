mod sort;

pub use sort::cmd_sort;
