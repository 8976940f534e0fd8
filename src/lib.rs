pub mod bitset;
pub mod graph;
pub mod cust_error;
pub mod flow;
pub mod occ_problem;
pub mod shrink;
pub mod checkpoint;
pub mod config;
pub mod heuristics;
pub mod compression;
